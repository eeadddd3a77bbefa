pub mod token;

use thiserror::Error;

use token::{Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Error)]
#[error("lex error at line {line}, column {column}: {message}")]
pub struct LexError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl LexError {
    fn new(message: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            message: message.into(),
            line,
            column,
        }
    }
}

pub fn lex(source: &str) -> Result<Vec<Token>, LexError> {
    Lexer::new(source).lex()
}

struct Lexer {
    chars: Vec<char>,
    current: usize,
    start: usize,
    line: usize,
    column: usize,
    token_line: usize,
    token_column: usize,
    depth: usize,
    at_line_start: bool,
    line_has_tokens: bool,
    tokens: Vec<Token>,
}

impl Lexer {
    fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            current: 0,
            start: 0,
            line: 1,
            column: 1,
            token_line: 1,
            token_column: 1,
            depth: 0,
            at_line_start: true,
            line_has_tokens: false,
            tokens: Vec::new(),
        }
    }

    fn lex(mut self) -> Result<Vec<Token>, LexError> {
        while !self.is_at_end() {
            self.start_token();
            self.scan_token()?;
        }

        self.tokens.push(Token::new(
            TokenKind::Eof,
            String::new(),
            self.line,
            self.column,
            0,
        ));

        Ok(self.tokens)
    }

    fn scan_token(&mut self) -> Result<(), LexError> {
        let c = self.advance();
        match c {
            ' ' | '\t' => {
                if self.at_line_start {
                    self.depth += 1;
                }
            }
            '\r' => {}
            '\n' => self.end_line(),
            '#' => self.skip_line_comment(),
            '(' => self.add_token(TokenKind::LeftParen),
            ')' => self.add_token(TokenKind::RightParen),
            '{' => self.add_token(TokenKind::LeftBrace),
            '}' => self.add_token(TokenKind::RightBrace),
            '[' => self.add_token(TokenKind::LeftBracket),
            ']' => self.add_token(TokenKind::RightBracket),
            ',' => self.add_token(TokenKind::Comma),
            ':' => self.add_token(TokenKind::Colon),
            ';' => self.add_token(TokenKind::Semicolon),
            '+' => self.add_token(TokenKind::Plus),
            '*' => self.add_token(TokenKind::Star),
            '/' => self.add_token(TokenKind::Slash),
            '%' => self.add_token(TokenKind::Percent),
            '-' => {
                if self.matches('>') {
                    self.add_token(TokenKind::Arrow);
                } else {
                    self.add_token(TokenKind::Minus);
                }
            }
            '!' => {
                if self.matches('=') {
                    self.add_token(TokenKind::BangEqual);
                } else {
                    self.add_token(TokenKind::Bang);
                }
            }
            '=' => {
                if self.matches('=') {
                    self.add_token(TokenKind::EqualEqual);
                } else {
                    self.add_token(TokenKind::Equal);
                }
            }
            '<' => {
                if self.matches('=') {
                    self.add_token(TokenKind::LessEqual);
                } else {
                    self.add_token(TokenKind::Less);
                }
            }
            '>' => {
                if self.matches('=') {
                    self.add_token(TokenKind::GreaterEqual);
                } else {
                    self.add_token(TokenKind::Greater);
                }
            }
            '"' => self.string()?,
            d if d.is_ascii_digit() => self.number()?,
            a if is_ident_start(a) => self.identifier(),
            _ => {
                return Err(LexError::new(
                    format!("unexpected character '{}'", c),
                    self.token_line,
                    self.token_column,
                ))
            }
        }

        Ok(())
    }

    fn end_line(&mut self) {
        if self.line_has_tokens {
            self.tokens.push(Token::new(
                TokenKind::Newline,
                "\\n".to_string(),
                self.token_line,
                self.token_column,
                self.depth,
            ));
        }
        self.depth = 0;
        self.at_line_start = true;
        self.line_has_tokens = false;
    }

    fn string(&mut self) -> Result<(), LexError> {
        let mut value = String::new();
        let mut closed = false;

        while !self.is_at_end() && self.peek() != '\n' {
            let c = self.advance();
            match c {
                '"' => {
                    closed = true;
                    break;
                }
                '\\' => {
                    if self.is_at_end() {
                        break;
                    }
                    match self.advance() {
                        '"' => value.push('"'),
                        '\\' => value.push('\\'),
                        'n' => value.push('\n'),
                        'r' => value.push('\r'),
                        't' => value.push('\t'),
                        other => {
                            return Err(LexError::new(
                                format!("unknown escape sequence '\\{}'", other),
                                self.line,
                                self.column - 2,
                            ))
                        }
                    }
                }
                _ => value.push(c),
            }
        }

        if !closed {
            return Err(LexError::new(
                "unterminated string literal",
                self.token_line,
                self.token_column,
            ));
        }

        self.add_token(TokenKind::String(value));
        Ok(())
    }

    fn number(&mut self) -> Result<(), LexError> {
        while self.peek().is_ascii_digit() {
            self.advance();
        }

        let mut is_float = false;
        if self.peek() == '.' && self.peek_next().is_ascii_digit() {
            is_float = true;
            self.advance();
            while self.peek().is_ascii_digit() {
                self.advance();
            }
        }

        let lexeme = self.current_lexeme();
        if is_float {
            let value = lexeme.parse::<f64>().map_err(|_| {
                LexError::new(
                    format!("invalid float literal '{}'", lexeme),
                    self.token_line,
                    self.token_column,
                )
            })?;
            self.add_token(TokenKind::Float(value));
        } else {
            let value = lexeme.parse::<i64>().map_err(|_| {
                LexError::new(
                    format!("int literal '{}' is out of range", lexeme),
                    self.token_line,
                    self.token_column,
                )
            })?;
            self.add_token(TokenKind::Int(value));
        }

        Ok(())
    }

    fn identifier(&mut self) {
        while is_ident_continue(self.peek()) {
            self.advance();
        }

        let lexeme = self.current_lexeme();
        let kind = token::keyword(&lexeme).unwrap_or(TokenKind::Identifier(lexeme));
        self.add_token(kind);
    }

    fn skip_line_comment(&mut self) {
        while !self.is_at_end() && self.peek() != '\n' {
            self.advance();
        }
    }

    fn add_token(&mut self, kind: TokenKind) {
        let lexeme = self.current_lexeme();
        self.tokens.push(Token::new(
            kind,
            lexeme,
            self.token_line,
            self.token_column,
            self.depth,
        ));
        self.line_has_tokens = true;
    }

    fn start_token(&mut self) {
        self.start = self.current;
        self.token_line = self.line;
        self.token_column = self.column;
        if !matches!(self.peek(), ' ' | '\t') {
            self.at_line_start = false;
        }
    }

    fn current_lexeme(&self) -> String {
        self.chars[self.start..self.current].iter().collect()
    }

    fn matches(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.peek() != expected {
            return false;
        }
        self.advance();
        true
    }

    fn peek(&self) -> char {
        if self.is_at_end() {
            '\0'
        } else {
            self.chars[self.current]
        }
    }

    fn peek_next(&self) -> char {
        if self.current + 1 >= self.chars.len() {
            '\0'
        } else {
            self.chars[self.current + 1]
        }
    }

    fn advance(&mut self) -> char {
        let c = self.chars[self.current];
        self.current += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        c
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.chars.len()
    }
}

fn is_ident_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

fn is_ident_continue(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn newline_after_blank_line_is_not_emitted() {
        let tokens = lex("a\n\n   \nb").expect("lex should succeed");
        let newlines = tokens
            .iter()
            .filter(|token| token.kind == TokenKind::Newline)
            .count();
        assert_eq!(newlines, 1);
    }

    #[test]
    fn newline_token_carries_line_depth() {
        let tokens = lex("\t\tx\n").expect("lex should succeed");
        assert_eq!(tokens[1].kind, TokenKind::Newline);
        assert_eq!(tokens[1].depth, 2);
        assert_eq!(tokens[2].depth, 0);
    }
}
