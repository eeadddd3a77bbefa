pub mod ast;
mod expr;

use thiserror::Error;

use crate::lexer::token::{Token, TokenKind};
use ast::{Block, Program, Span, Stmt, StmtKind};
pub use expr::Precedence;

#[derive(Debug, Clone, PartialEq, Error)]
#[error("parse error at line {line}, column {column}: {message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl ParseError {
    fn new(message: impl Into<String>, token: &Token) -> Self {
        Self {
            message: message.into(),
            line: token.line,
            column: token.column,
        }
    }
}

/// Every error collected while parsing one compilation unit.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{}", join_errors(.0))]
pub struct ParseErrors(pub Vec<ParseError>);

fn join_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn parse(tokens: Vec<Token>) -> Result<Program, ParseErrors> {
    let mut parser = Parser::new(tokens);
    let program = parser.parse_program();
    if parser.errors.is_empty() {
        Ok(program)
    } else {
        Err(ParseErrors(parser.errors))
    }
}

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    errors: Vec<ParseError>,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last(), Some(token) if token.kind == TokenKind::Eof) {
            let (line, column) = tokens
                .last()
                .map(|token| (token.line, token.column + token.lexeme.len()))
                .unwrap_or((1, 1));
            tokens.push(Token::new(TokenKind::Eof, String::new(), line, column, 0));
        }

        Self {
            tokens,
            current: 0,
            errors: Vec::new(),
        }
    }

    /// Parses to end of input. Statements that fail to parse are dropped
    /// and their errors are kept in [`Parser::errors`].
    pub fn parse_program(&mut self) -> Program {
        let mut statements = Vec::new();

        self.skip_statement_breaks();
        while !self.is_at_end() {
            if self.peek().depth != 0 {
                let err = ParseError::new("unexpected indentation", self.peek());
                self.errors.push(err);
            }
            if let Some(stmt) = self.statement_or_recover() {
                statements.push(stmt);
            }
            self.skip_statement_breaks();
        }

        Program { statements }
    }

    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    fn statement_or_recover(&mut self) -> Option<Stmt> {
        let start = self.current;
        match self.statement() {
            Ok(stmt) => Some(stmt),
            Err(err) => {
                self.errors.push(err);
                self.synchronize(start);
                None
            }
        }
    }

    // Skips the rest of the offending line, always making progress.
    fn synchronize(&mut self, start: usize) {
        if self.current == start {
            self.advance();
        }
        while !self.is_at_end() && !self.previous_is(&TokenKind::Newline) {
            self.advance();
        }
    }

    fn statement(&mut self) -> Result<Stmt, ParseError> {
        let first = self.peek();
        let depth = first.depth;
        let span = Span::new(first.line, first.column);

        let kind = if self.matches_symbol(TokenKind::Return) {
            let value = if self.at_statement_end() {
                None
            } else {
                Some(self.expression(Precedence::Lowest)?)
            };
            StmtKind::Return(value)
        } else {
            StmtKind::Expr(self.expression(Precedence::Lowest)?)
        };
        self.finish_statement()?;

        Ok(Stmt { kind, depth, span })
    }

    fn at_statement_end(&self) -> bool {
        self.check_kind(&TokenKind::Newline)
            || self.check_kind(&TokenKind::Semicolon)
            || self.is_at_end()
    }

    fn finish_statement(&mut self) -> Result<(), ParseError> {
        // block-bodied expressions already consumed their last line
        if self.previous_is(&TokenKind::Newline) {
            return Ok(());
        }
        if self.matches_symbol(TokenKind::Semicolon) {
            self.matches_symbol(TokenKind::Newline);
            return Ok(());
        }
        if self.matches_symbol(TokenKind::Newline) || self.is_at_end() {
            return Ok(());
        }

        Err(ParseError::new(
            format!("expected end of statement, got {} instead", describe(self.peek())),
            self.peek(),
        ))
    }

    /// Parses `: NEWLINE` followed by every statement indented deeper than
    /// `header_depth` and sharing the depth of the first one.
    pub(crate) fn block(&mut self, header_depth: usize) -> Result<Block, ParseError> {
        self.expect(TokenKind::Colon)?;
        self.expect(TokenKind::Newline)?;

        let depth = self.peek().depth;
        if self.is_at_end() || depth <= header_depth {
            return Err(ParseError::new("expected an indented block", self.peek()));
        }

        let mut statements = Vec::new();
        while !self.is_at_end() && self.peek().depth == depth {
            if let Some(stmt) = self.statement_or_recover() {
                statements.push(stmt);
            }
            self.skip_statement_breaks();
        }

        Ok(Block { statements, depth })
    }

    pub(crate) fn skip_statement_breaks(&mut self) {
        while self.matches_symbol(TokenKind::Newline) || self.matches_symbol(TokenKind::Semicolon)
        {
        }
    }

    pub(crate) fn matches_symbol(&mut self, kind: TokenKind) -> bool {
        if self.check_kind(&kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind) -> Result<Token, ParseError> {
        if self.check_kind(&kind) {
            let token = self.peek().clone();
            self.advance();
            Ok(token)
        } else {
            Err(ParseError::new(
                format!(
                    "expected next token to be {}, got {} instead",
                    kind,
                    describe(self.peek())
                ),
                self.peek(),
            ))
        }
    }

    pub(crate) fn consume_identifier(&mut self, message: &str) -> Result<String, ParseError> {
        match self.peek_kind() {
            TokenKind::Identifier(name) => {
                let value = name.clone();
                self.advance();
                Ok(value)
            }
            _ => Err(ParseError::new(
                format!("{}, got {} instead", message, describe(self.peek())),
                self.peek(),
            )),
        }
    }

    pub(crate) fn check_kind(&self, kind: &TokenKind) -> bool {
        self.peek_kind().same_variant(kind)
    }

    pub(crate) fn previous_is(&self, kind: &TokenKind) -> bool {
        self.current > 0 && self.tokens[self.current - 1].kind.same_variant(kind)
    }

    pub(crate) fn advance(&mut self) {
        if !self.is_at_end() {
            self.current += 1;
        }
    }

    pub(crate) fn is_at_end(&self) -> bool {
        matches!(self.peek_kind(), TokenKind::Eof)
    }

    pub(crate) fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    pub(crate) fn peek_kind(&self) -> &TokenKind {
        &self.peek().kind
    }
}

pub(crate) fn describe(token: &Token) -> String {
    match &token.kind {
        TokenKind::Identifier(_)
        | TokenKind::Int(_)
        | TokenKind::Float(_)
        | TokenKind::String(_) => format!("'{}'", token.lexeme),
        other => other.describe().to_string(),
    }
}
