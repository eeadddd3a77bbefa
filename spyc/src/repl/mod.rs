//! Interactive compiler loop.
//!
//! Every complete entry is compiled on its own and its IR printed. Entries
//! that open a block stay in the buffer until a blank line closes them.

pub mod highlighter;

use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::history::DefaultHistory;
use rustyline::validate::{ValidationContext, ValidationResult, Validator};
use rustyline::{Context, Editor, Helper};
use std::borrow::Cow;
use std::error::Error;
use std::fs;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use crate::ir::printer;
use crate::Compiler;

const MAX_HISTORY_ENTRIES: usize = 500;
const SOURCE_LABEL: &str = "<repl>";

/// Outcome of a `:command` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandAction {
    /// Not a meta command; compile it
    NotHandled,
    /// Handled; print the message
    Handled(String),
    /// Leave the REPL
    Exit,
}

/// State that survives between entries
pub struct Session {
    compiler: Compiler,
    show_ast: bool,
    show_timing: bool,
    history: Vec<String>,
    entries: usize,
    symbols: Vec<String>,
}

impl Session {
    pub fn new(compiler: Compiler) -> Self {
        Self {
            compiler,
            show_ast: false,
            show_timing: false,
            history: Vec::new(),
            entries: 0,
            symbols: Vec::new(),
        }
    }

    fn with_history(mut self, history: Vec<String>) -> Self {
        self.history = history;
        self
    }

    pub fn show_ast(&self) -> bool {
        self.show_ast
    }

    pub fn history(&self) -> &[String] {
        &self.history
    }

    /// Function names seen in compiled entries, for completion
    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Compile one complete entry.
    ///
    /// Returns the text to print on success and a rendered diagnostic on
    /// failure.
    pub fn evaluate(&mut self, input: &str) -> Result<String, String> {
        if !input.trim().is_empty() {
            self.history.push(input.trim_end().to_string());
            trim_history(&mut self.history);
        }

        let started = Instant::now();
        let program = self
            .compiler
            .parse_source(input)
            .map_err(|err| err.render(SOURCE_LABEL, input))?;

        let module_name = format!("repl{}", self.entries);
        self.entries += 1;
        let module = self
            .compiler
            .compile_program(&program, &module_name)
            .map_err(|err| err.render(SOURCE_LABEL, input))?;

        for function in &module.functions {
            if function.name != self.compiler.options().entry_name
                && !self.symbols.contains(&function.name)
            {
                self.symbols.push(function.name.clone());
            }
        }

        let mut out = String::new();
        if self.show_ast {
            out.push_str(&program.to_string());
            out.push('\n');
        }
        out.push_str(&printer::render(&module));
        if self.show_timing {
            out.push_str(&format!(
                "time: {:.3} ms\n",
                started.elapsed().as_secs_f64() * 1000.0
            ));
        }
        Ok(out)
    }

    /// Interpret a `:command` line.
    pub fn command(&mut self, command: &str) -> CommandAction {
        if command.is_empty() {
            return CommandAction::NotHandled;
        }
        if command.eq_ignore_ascii_case("exit") || command.eq_ignore_ascii_case("quit") {
            return CommandAction::Exit;
        }
        if !command.starts_with(':') {
            return CommandAction::NotHandled;
        }

        let mut parts = command.split_whitespace();
        let directive = parts.next().unwrap_or_default();
        let message = match directive {
            ":quit" | ":exit" => return CommandAction::Exit,
            ":help" => [
                ":help                   Show this message",
                ":ast on|off             Print the parsed tree before the IR",
                ":timing on|off          Print compile time after each entry",
                ":history [n]            Show recent history (default 20)",
                ":quit                   Exit REPL",
            ]
            .join("\n"),
            ":ast" => match parts.next() {
                Some("on") => {
                    self.show_ast = true;
                    "ast: on".to_string()
                }
                Some("off") => {
                    self.show_ast = false;
                    "ast: off".to_string()
                }
                _ => "usage: :ast on|off".to_string(),
            },
            ":timing" => match parts.next() {
                Some("on") => {
                    self.show_timing = true;
                    "timing: on".to_string()
                }
                Some("off") => {
                    self.show_timing = false;
                    "timing: off".to_string()
                }
                _ => "usage: :timing on|off".to_string(),
            },
            ":history" => {
                let count = parts
                    .next()
                    .and_then(|value| value.parse::<usize>().ok())
                    .unwrap_or(20);
                let start = self.history.len().saturating_sub(count);
                self.history
                    .iter()
                    .enumerate()
                    .skip(start)
                    .map(|(idx, entry)| format!("{:>4} {}", idx + 1, highlighter::colorize(entry)))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
            other => format!("unknown command '{}'; use :help", other),
        };

        CommandAction::Handled(message)
    }

    /// Feed one raw line; returns the entry once it is complete.
    pub fn push_line(&self, buffer: &mut String, raw_line: &str) -> Option<String> {
        let normalized = highlighter::normalize_line(raw_line);
        if buffer.is_empty() && normalized.trim().is_empty() {
            return None;
        }

        if !buffer.is_empty() {
            buffer.push('\n');
        }
        buffer.push_str(&normalized);

        if highlighter::needs_more_input(buffer) {
            return None;
        }
        Some(std::mem::take(buffer))
    }
}

#[derive(Clone)]
struct ReplEditorHelper {
    symbols: Arc<Mutex<Vec<String>>>,
}

impl ReplEditorHelper {
    fn new() -> Self {
        Self {
            symbols: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn set_symbols(&self, symbols: &[String]) {
        if let Ok(mut guard) = self.symbols.lock() {
            *guard = symbols.to_vec();
        }
    }

    fn symbols(&self) -> Vec<String> {
        self.symbols
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl Helper for ReplEditorHelper {}

impl Hinter for ReplEditorHelper {
    type Hint = String;
}

impl Validator for ReplEditorHelper {
    fn validate(
        &self,
        context: &mut ValidationContext<'_>,
    ) -> Result<ValidationResult, ReadlineError> {
        if highlighter::needs_more_input(context.input()) {
            Ok(ValidationResult::Incomplete)
        } else {
            Ok(ValidationResult::Valid(None))
        }
    }
}

impl Highlighter for ReplEditorHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Owned(highlighter::colorize(line))
    }
}

impl Completer for ReplEditorHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> Result<(usize, Vec<Pair>), ReadlineError> {
        let line = &line[..pos.min(line.len())];
        let mut start = line.len();
        for (idx, ch) in line.char_indices().rev() {
            if ch == '_' || ch.is_ascii_alphanumeric() {
                start = idx;
            } else {
                break;
            }
        }

        let prefix = &line[start..];
        if prefix.is_empty() {
            return Ok((start, Vec::new()));
        }

        let pairs = highlighter::complete(prefix, &self.symbols())
            .into_iter()
            .map(|value| Pair {
                display: value.clone(),
                replacement: value,
            })
            .collect::<Vec<_>>();
        Ok((start, pairs))
    }
}

/// Run the REPL until `:quit` or end of input.
pub fn run(compiler: Compiler) -> Result<(), Box<dyn Error>> {
    let mut session = Session::new(compiler).with_history(load_history());

    println!("spyc {} REPL", crate::VERSION);
    println!("Commands: :help, :ast on|off, :timing on|off, :history, :quit");
    println!("End a block with an empty line.");

    if io::stdin().is_terminal() {
        run_editor(&mut session)?;
    } else {
        run_piped(&mut session)?;
    }

    if let Err(err) = save_history(session.history()) {
        eprintln!("failed to save repl history: {}", err);
    }
    Ok(())
}

fn run_editor(session: &mut Session) -> Result<(), Box<dyn Error>> {
    let helper = ReplEditorHelper::new();
    let mut editor = Editor::<ReplEditorHelper, DefaultHistory>::new()?;
    editor.set_helper(Some(helper.clone()));
    for entry in session.history() {
        let _ = editor.add_history_entry(entry.as_str());
    }

    let mut buffer = String::new();
    loop {
        let prompt = if buffer.is_empty() { "spy> " } else { "...> " };
        let raw_line = match editor.readline(prompt) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => return Err(err.into()),
        };

        if buffer.is_empty() {
            match session.command(raw_line.trim()) {
                CommandAction::NotHandled => {}
                CommandAction::Handled(message) => {
                    println!("{}", message);
                    continue;
                }
                CommandAction::Exit => break,
            }
        }

        let Some(input) = session.push_line(&mut buffer, &raw_line) else {
            continue;
        };
        let _ = editor.add_history_entry(input.trim_end());
        report(session.evaluate(&input));
        helper.set_symbols(session.symbols());
    }
    Ok(())
}

fn run_piped(session: &mut Session) -> Result<(), Box<dyn Error>> {
    let stdin = io::stdin();
    let mut buffer = String::new();
    let mut line = String::new();
    loop {
        let prompt = if buffer.is_empty() { "spy> " } else { "...> " };
        print!("{}", prompt);
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            // flush whatever block was still open
            if !buffer.trim().is_empty() {
                report(session.evaluate(&buffer));
            }
            break;
        }

        let raw_line = line.trim_end_matches(['\n', '\r']);
        if buffer.is_empty() {
            match session.command(raw_line.trim()) {
                CommandAction::NotHandled => {}
                CommandAction::Handled(message) => {
                    println!("{}", message);
                    continue;
                }
                CommandAction::Exit => break,
            }
        }

        if let Some(input) = session.push_line(&mut buffer, raw_line) {
            report(session.evaluate(&input));
        }
    }
    Ok(())
}

fn report(result: Result<String, String>) {
    match result {
        Ok(output) => print!("{}", output),
        Err(diagnostic) => eprintln!("{}", diagnostic),
    }
}

fn load_history() -> Vec<String> {
    let Ok(contents) = fs::read_to_string(repl_history_path()) else {
        return Vec::new();
    };
    // entries are stored one per line with embedded newlines escaped
    contents
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.replace("\\n", "\n"))
        .collect()
}

fn save_history(history: &[String]) -> io::Result<()> {
    let path = repl_history_path();
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut trimmed = history.to_vec();
    trim_history(&mut trimmed);
    let mut encoded = trimmed
        .iter()
        .map(|entry| entry.replace('\n', "\\n"))
        .collect::<Vec<_>>()
        .join("\n");
    if !encoded.is_empty() {
        encoded.push('\n');
    }
    fs::write(path, encoded)
}

fn trim_history(history: &mut Vec<String>) {
    if history.len() > MAX_HISTORY_ENTRIES {
        let drop_count = history.len() - MAX_HISTORY_ENTRIES;
        history.drain(0..drop_count);
    }
}

fn repl_history_path() -> PathBuf {
    if let Ok(path) = std::env::var("SPYC_REPL_HISTORY") {
        return PathBuf::from(path);
    }
    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home).join(".spyc").join("repl_history");
    }
    if let Ok(home) = std::env::var("USERPROFILE") {
        return PathBuf::from(home).join(".spyc").join("repl_history");
    }
    PathBuf::from(".spyc_repl_history")
}
