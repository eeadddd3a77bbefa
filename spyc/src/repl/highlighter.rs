//! Line handling for the REPL: continuation, colouring, completion.

/// Strip trailing whitespace from every line, keeping a final line break so
/// a blank line can still close a block.
pub fn normalize_line(input: &str) -> String {
    let mut out = input
        .lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n");
    if input.ends_with('\n') {
        out.push('\n');
    }
    out
}

const ANSI_RESET: &str = "\x1b[0m";
const ANSI_KEYWORD: &str = "\x1b[94m";
const ANSI_TYPE: &str = "\x1b[96m";
const ANSI_STRING: &str = "\x1b[92m";
const ANSI_NUMBER: &str = "\x1b[93m";
const ANSI_COMMENT: &str = "\x1b[90m";

pub const KEYWORDS: &[&str] = &[
    "def", "if", "else", "while", "return", "and", "or", "true", "false",
];

const TYPE_NAMES: &[&str] = &["int", "float", "bool", "none"];

/// Whether `source` is an unfinished entry.
///
/// Open brackets, an open string, or a trailing binary operator keep the
/// entry open. So does a line ending in `:`, and so does an indented line
/// while a block is open. A blank last line closes the entry.
pub fn needs_more_input(source: &str) -> bool {
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escaped = false;
    let mut chars = source.chars().peekable();

    while let Some(ch) = chars.next() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' || ch == '\n' {
                in_string = false;
            }
            continue;
        }

        match ch {
            '#' => {
                while chars.next_if(|next| *next != '\n').is_some() {}
            }
            '"' => in_string = true,
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth -= 1,
            _ => {}
        }
    }

    if in_string || depth > 0 {
        return true;
    }

    let lines = source.split('\n').map(strip_comment).collect::<Vec<_>>();
    let Some(last) = lines.last() else {
        return false;
    };
    let last = last.trim_end();
    if last.trim().is_empty() {
        return false;
    }
    if last.ends_with(':') {
        return true;
    }

    let block_open = lines.iter().any(|line| line.trim_end().ends_with(':'));
    if block_open && last.starts_with([' ', '\t']) {
        return true;
    }

    ["+", "-", "*", "/", "%", "=", "->", ",", "and", "or"]
        .iter()
        .any(|suffix| ends_with_token(last, suffix))
}

fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    let mut escaped = false;
    for (idx, ch) in line.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
        } else if ch == '"' {
            in_string = true;
        } else if ch == '#' {
            return &line[..idx];
        }
    }
    line
}

fn ends_with_token(line: &str, suffix: &str) -> bool {
    let Some(rest) = line.strip_suffix(suffix) else {
        return false;
    };
    // `band` or `for` are identifiers, not operators
    if suffix.chars().all(|ch| ch.is_ascii_alphabetic()) {
        return rest
            .chars()
            .last()
            .map_or(true, |ch| !(ch == '_' || ch.is_ascii_alphanumeric()));
    }
    true
}

pub fn colorize(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 16);
    let chars = input.chars().collect::<Vec<_>>();
    let mut i = 0;

    while i < chars.len() {
        let ch = chars[i];

        if ch == '#' {
            out.push_str(ANSI_COMMENT);
            while i < chars.len() && chars[i] != '\n' {
                out.push(chars[i]);
                i += 1;
            }
            out.push_str(ANSI_RESET);
            continue;
        }

        if ch == '"' {
            out.push_str(ANSI_STRING);
            out.push(ch);
            i += 1;
            let mut escaped = false;
            while i < chars.len() {
                let current = chars[i];
                out.push(current);
                i += 1;
                if escaped {
                    escaped = false;
                } else if current == '\\' {
                    escaped = true;
                } else if current == '"' {
                    break;
                }
            }
            out.push_str(ANSI_RESET);
            continue;
        }

        if ch.is_ascii_digit() {
            out.push_str(ANSI_NUMBER);
            while i < chars.len() && (chars[i].is_ascii_digit() || chars[i] == '.') {
                out.push(chars[i]);
                i += 1;
            }
            out.push_str(ANSI_RESET);
            continue;
        }

        if ch == '_' || ch.is_ascii_alphabetic() {
            let start = i;
            while i < chars.len() && (chars[i] == '_' || chars[i].is_ascii_alphanumeric()) {
                i += 1;
            }
            let word = chars[start..i].iter().collect::<String>();
            let colour = if KEYWORDS.contains(&word.as_str()) {
                Some(ANSI_KEYWORD)
            } else if TYPE_NAMES.contains(&word.as_str()) {
                Some(ANSI_TYPE)
            } else {
                None
            };
            match colour {
                Some(colour) => {
                    out.push_str(colour);
                    out.push_str(&word);
                    out.push_str(ANSI_RESET);
                }
                None => out.push_str(&word),
            }
            continue;
        }

        out.push(ch);
        i += 1;
    }

    out
}

/// Keywords, type names, and known symbols starting with `prefix`.
pub fn complete(prefix: &str, symbols: &[String]) -> Vec<String> {
    let mut candidates = KEYWORDS
        .iter()
        .chain(TYPE_NAMES)
        .map(|word| word.to_string())
        .collect::<Vec<_>>();
    candidates.extend(symbols.iter().cloned());
    candidates.sort();
    candidates.dedup();
    candidates
        .into_iter()
        .filter(|candidate| candidate.starts_with(prefix))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_line_closes_an_open_block() {
        assert!(needs_more_input("while i < 3:"));
        assert!(needs_more_input("while i < 3:\n\ti = i + 1"));
        assert!(!needs_more_input("while i < 3:\n\ti = i + 1\n"));
    }

    #[test]
    fn identifiers_ending_in_operator_words_do_not_continue() {
        assert!(needs_more_input("a = b and"));
        assert!(!needs_more_input("a = band"));
        assert!(!needs_more_input("a = 1 # trailing and"));
    }

    #[test]
    fn colorize_marks_keywords_and_types() {
        let rendered = colorize("def f() -> int:");
        assert!(rendered.contains("\x1b[94mdef\x1b[0m"));
        assert!(rendered.contains("\x1b[96mint\x1b[0m"));
    }
}
