//! Front end for SPython: an indentation-aware tokenizer and a Pratt parser
//! producing an AST that renders back to canonical source.

pub mod errors;
pub mod lexer;
pub mod parser;

pub use lexer::{lex, LexError};
pub use parser::{parse, ParseError, ParseErrors};
