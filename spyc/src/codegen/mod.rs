//! Code generation orchestration
//!
//! Walks the parsed program and emits an IR module. Top-level statements
//! become the body of a synthetic entry function; every `def` becomes a
//! module function of its own.

pub mod context;
pub mod lowering;
pub mod types;

use std::fmt;

use spython::parser::ast::{Program, Span};
use thiserror::Error;

use crate::ir::builder::BuildError;
use crate::ir::Module;

pub use context::{Binding, ScopeArena, ScopeId};
pub use types::TypeCatalog;

/// Category of a code generation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unresolved or duplicated variable, function, or type name
    Name,
    /// Values whose types do not fit where they are used
    Type,
    /// Construct or operator/type pairing with no lowering
    Unsupported,
    /// Builder invariant broken by the generator itself
    Internal,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Name => write!(f, "NameError"),
            ErrorKind::Type => write!(f, "TypeError"),
            ErrorKind::Unsupported => write!(f, "UnsupportedError"),
            ErrorKind::Internal => write!(f, "InternalError"),
        }
    }
}

/// First error hit while generating code; compilation stops there.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct CodegenError {
    /// Error category
    pub kind: ErrorKind,
    /// Human readable description
    pub message: String,
    /// Where in the source the failing construct starts
    pub span: Span,
}

impl CodegenError {
    /// Unresolved or duplicated name
    pub fn name(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Name, message, span)
    }

    /// Type mismatch
    pub fn type_error(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Type, message, span)
    }

    /// Construct without a lowering
    pub fn unsupported(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Unsupported, message, span)
    }

    fn new(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span,
        }
    }
}

impl From<BuildError> for CodegenError {
    fn from(err: BuildError) -> Self {
        Self::new(ErrorKind::Internal, err.to_string(), Span::default())
    }
}

/// Knobs for code generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodegenOptions {
    /// Declare every top-level `def` before lowering any body, so calls may
    /// name functions defined further down.
    pub predeclare_functions: bool,
    /// Name of the function holding the top-level statements
    pub entry_name: String,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            predeclare_functions: true,
            entry_name: "main".to_string(),
        }
    }
}

/// Main codegen entry point.
#[derive(Debug, Clone, Default)]
pub struct CodeGenerator {
    /// Generation options
    pub options: CodegenOptions,
    /// Type names available to annotations
    pub catalog: TypeCatalog,
}

impl CodeGenerator {
    /// Create a new code generator with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the generation options.
    pub fn with_options(mut self, options: CodegenOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the type catalog.
    pub fn with_catalog(mut self, catalog: TypeCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Compile AST to IR.
    pub fn compile(&self, ast: &Program, module_name: &str) -> Result<Module, CodegenError> {
        lowering::Lowering::new(&self.options, &self.catalog, module_name).lower_program(ast)
    }
}
