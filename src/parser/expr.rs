use crate::lexer::token::{Token, TokenKind};

use super::ast::{Expr, ExprKind, FunctionLiteral, InfixOp, Param, PrefixOp, Span};
use super::{describe, ParseError, Parser};

/// Binding power of infix operators, weakest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    Assign,
    LogicGate,
    Equals,
    LessGreater,
    Sum,
    Product,
    Prefix,
    Call,
    Index,
}

impl Precedence {
    pub fn of(kind: &TokenKind) -> Self {
        match kind {
            TokenKind::Equal => Precedence::Assign,
            TokenKind::And | TokenKind::Or => Precedence::LogicGate,
            TokenKind::EqualEqual | TokenKind::BangEqual => Precedence::Equals,
            TokenKind::Less
            | TokenKind::Greater
            | TokenKind::LessEqual
            | TokenKind::GreaterEqual => Precedence::LessGreater,
            TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Precedence::Product,
            TokenKind::LeftParen => Precedence::Call,
            TokenKind::LeftBracket => Precedence::Index,
            _ => Precedence::Lowest,
        }
    }
}

fn infix_op(kind: &TokenKind) -> Option<InfixOp> {
    let op = match kind {
        TokenKind::Equal => InfixOp::Assign,
        TokenKind::Plus => InfixOp::Add,
        TokenKind::Minus => InfixOp::Subtract,
        TokenKind::Star => InfixOp::Multiply,
        TokenKind::Slash => InfixOp::Divide,
        TokenKind::Percent => InfixOp::Modulo,
        TokenKind::EqualEqual => InfixOp::Equal,
        TokenKind::BangEqual => InfixOp::NotEqual,
        TokenKind::Less => InfixOp::Less,
        TokenKind::LessEqual => InfixOp::LessEqual,
        TokenKind::Greater => InfixOp::Greater,
        TokenKind::GreaterEqual => InfixOp::GreaterEqual,
        TokenKind::And => InfixOp::And,
        TokenKind::Or => InfixOp::Or,
        _ => return None,
    };
    Some(op)
}

fn span_of(token: &Token) -> Span {
    Span::new(token.line, token.column)
}

impl Parser {
    pub(crate) fn expression(&mut self, precedence: Precedence) -> Result<Expr, ParseError> {
        let mut lhs = self.prefix()?;

        while !self.check_kind(&TokenKind::Semicolon)
            && !self.previous_is(&TokenKind::Newline)
            && precedence < Precedence::of(self.peek_kind())
        {
            let operator = self.peek().clone();
            self.advance();
            lhs = self.infix(lhs, operator)?;
        }

        Ok(lhs)
    }

    fn prefix(&mut self) -> Result<Expr, ParseError> {
        let token = self.peek().clone();
        self.advance();
        let span = span_of(&token);

        let kind = match &token.kind {
            TokenKind::Identifier(name) => ExprKind::Identifier(name.clone()),
            TokenKind::Int(value) => ExprKind::Int(*value),
            TokenKind::Float(value) => ExprKind::Float(*value),
            TokenKind::String(value) => ExprKind::String(value.clone()),
            TokenKind::True => ExprKind::Bool(true),
            TokenKind::False => ExprKind::Bool(false),
            TokenKind::Minus | TokenKind::Bang => {
                let op = if token.kind == TokenKind::Minus {
                    PrefixOp::Negate
                } else {
                    PrefixOp::Not
                };
                let rhs = self.expression(Precedence::Prefix)?;
                ExprKind::Prefix {
                    op,
                    rhs: Box::new(rhs),
                }
            }
            TokenKind::LeftParen => {
                let inner = self.expression(Precedence::Lowest)?;
                self.expect(TokenKind::RightParen)?;
                return Ok(inner);
            }
            TokenKind::LeftBracket => {
                ExprKind::Array(self.expression_list(TokenKind::RightBracket)?)
            }
            TokenKind::LeftBrace => self.hash_literal()?,
            TokenKind::If => self.if_expression(&token)?,
            TokenKind::While => self.while_expression(&token)?,
            TokenKind::Def => ExprKind::Function(self.function_literal(&token)?),
            _ => {
                return Err(ParseError::new(
                    format!("no prefix parse function for {} found", describe(&token)),
                    &token,
                ))
            }
        };

        Ok(Expr { kind, span })
    }

    fn infix(&mut self, lhs: Expr, operator: Token) -> Result<Expr, ParseError> {
        match operator.kind {
            TokenKind::LeftParen => {
                let args = self.expression_list(TokenKind::RightParen)?;
                let span = lhs.span;
                Ok(Expr {
                    kind: ExprKind::Call {
                        callee: Box::new(lhs),
                        args,
                    },
                    span,
                })
            }
            TokenKind::LeftBracket => {
                let index = self.expression(Precedence::Lowest)?;
                self.expect(TokenKind::RightBracket)?;
                let span = lhs.span;
                Ok(Expr {
                    kind: ExprKind::Index {
                        object: Box::new(lhs),
                        index: Box::new(index),
                    },
                    span,
                })
            }
            ref kind => {
                let Some(op) = infix_op(kind) else {
                    return Err(ParseError::new(
                        format!("no infix parse function for {} found", describe(&operator)),
                        &operator,
                    ));
                };
                let rhs = self.expression(Precedence::of(kind))?;
                Ok(Expr {
                    kind: ExprKind::Infix {
                        lhs: Box::new(lhs),
                        op,
                        rhs: Box::new(rhs),
                    },
                    span: span_of(&operator),
                })
            }
        }
    }

    fn expression_list(&mut self, end: TokenKind) -> Result<Vec<Expr>, ParseError> {
        let mut items = Vec::new();
        if self.matches_symbol(end.clone()) {
            return Ok(items);
        }

        loop {
            items.push(self.expression(Precedence::Lowest)?);
            if !self.matches_symbol(TokenKind::Comma) {
                break;
            }
        }
        self.expect(end)?;
        Ok(items)
    }

    fn hash_literal(&mut self) -> Result<ExprKind, ParseError> {
        let mut pairs = Vec::new();
        if !self.matches_symbol(TokenKind::RightBrace) {
            loop {
                let key = self.expression(Precedence::Lowest)?;
                self.expect(TokenKind::Colon)?;
                let value = self.expression(Precedence::Lowest)?;
                pairs.push((key, value));
                if !self.matches_symbol(TokenKind::Comma) {
                    break;
                }
            }
            self.expect(TokenKind::RightBrace)?;
        }
        Ok(ExprKind::Hash(pairs))
    }

    fn if_expression(&mut self, keyword: &Token) -> Result<ExprKind, ParseError> {
        let condition = self.expression(Precedence::Lowest)?;
        let consequence = self.block(keyword.depth)?;

        let alternative = if self.check_kind(&TokenKind::Else) && self.peek().depth == keyword.depth
        {
            self.advance();
            Some(self.block(keyword.depth)?)
        } else {
            None
        };

        Ok(ExprKind::If {
            condition: Box::new(condition),
            consequence,
            alternative,
        })
    }

    fn while_expression(&mut self, keyword: &Token) -> Result<ExprKind, ParseError> {
        let condition = self.expression(Precedence::Lowest)?;
        let body = self.block(keyword.depth)?;
        Ok(ExprKind::While {
            condition: Box::new(condition),
            body,
        })
    }

    fn function_literal(&mut self, keyword: &Token) -> Result<FunctionLiteral, ParseError> {
        let name = self.consume_identifier("expected function name after 'def'")?;
        self.expect(TokenKind::LeftParen)?;

        let mut params = Vec::new();
        if !self.check_kind(&TokenKind::RightParen) {
            loop {
                let span = span_of(self.peek());
                let param_name = self.consume_identifier("expected parameter name")?;
                self.expect(TokenKind::Colon)?;
                let type_name = self.consume_identifier("expected parameter type after ':'")?;
                let default = if self.matches_symbol(TokenKind::Equal) {
                    Some(self.expression(Precedence::Lowest)?)
                } else {
                    None
                };
                params.push(Param {
                    name: param_name,
                    type_name,
                    default,
                    span,
                });

                if !self.matches_symbol(TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RightParen)?;

        let return_type = if self.matches_symbol(TokenKind::Arrow) {
            Some(self.consume_identifier("expected return type after '->'")?)
        } else {
            None
        };

        let body = self.block(keyword.depth)?;
        Ok(FunctionLiteral {
            name,
            params,
            return_type,
            body,
        })
    }
}
