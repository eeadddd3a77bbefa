use crate::lexer::LexError;
use crate::parser::ParseError;

pub fn underline(line: &str, column: usize) -> String {
    let mut marker = String::new();
    for ch in line.chars().take(column.saturating_sub(1)) {
        // keep tabs so the caret lines up under indented code
        marker.push(if ch == '\t' { '\t' } else { ' ' });
    }
    marker.push('^');
    format!("{}\n{}", line, marker)
}

/// Renders `label: message`, the source position, and the offending line
/// with a caret under `column`.
pub fn format_diagnostic(
    label: &str,
    source_label: &str,
    source: &str,
    message: &str,
    line: usize,
    column: usize,
) -> String {
    let mut out = format!("{}: {}\n--> {}:{}:{}", label, message, source_label, line, column);
    if let Some(text) = source.lines().nth(line.saturating_sub(1)) {
        out.push('\n');
        out.push_str(&underline(text, column));
    }
    out
}

pub fn format_lex_error(source_label: &str, source: &str, err: &LexError) -> String {
    format_diagnostic(
        "lex error",
        source_label,
        source,
        &err.message,
        err.line,
        err.column,
    )
}

pub fn format_parse_error(source_label: &str, source: &str, err: &ParseError) -> String {
    format_diagnostic(
        "parse error",
        source_label,
        source,
        &err.message,
        err.line,
        err.column,
    )
}

pub fn format_parse_errors(source_label: &str, source: &str, errors: &[ParseError]) -> Vec<String> {
    errors
        .iter()
        .map(|err| format_parse_error(source_label, source, err))
        .collect()
}
