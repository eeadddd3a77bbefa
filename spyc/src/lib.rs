//! spyc - IR code generator for SPython
//!
//! Lowers parsed SPython programs into a module of typed basic-block IR
//! and prints it in an LLVM-flavoured text form.

pub mod codegen;
pub mod ir;
pub mod repl;

use std::time::{Duration, Instant};

use spython::parser::ast::Program;
use spython::{LexError, ParseErrors};
use thiserror::Error;

use codegen::{CodeGenerator, CodegenError, CodegenOptions, TypeCatalog};

/// spyc version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Main compiler interface
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    generator: CodeGenerator,
}

/// Wall-clock time spent in each pipeline stage
#[derive(Debug, Clone, Copy, Default)]
pub struct StageTimings {
    /// Tokenizing
    pub lex: Duration,
    /// Parsing
    pub parse: Duration,
    /// Code generation
    pub codegen: Duration,
}

impl Compiler {
    /// Create a new compiler with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Use these code generation options
    pub fn with_options(mut self, options: CodegenOptions) -> Self {
        self.generator = self.generator.with_options(options);
        self
    }

    /// Use this type catalog
    pub fn with_catalog(mut self, catalog: TypeCatalog) -> Self {
        self.generator = self.generator.with_catalog(catalog);
        self
    }

    /// Active code generation options
    pub fn options(&self) -> &CodegenOptions {
        &self.generator.options
    }

    /// Tokenize and parse SPython source.
    pub fn parse_source(&self, source: &str) -> Result<Program, CompileError> {
        let tokens = spython::lex(source)?;
        Ok(spython::parse(tokens)?)
    }

    /// Compile SPython source text into IR.
    pub fn compile_source(
        &self,
        source: &str,
        module_name: &str,
    ) -> Result<ir::Module, CompileError> {
        self.compile_source_timed(source, module_name)
            .map(|(module, _)| module)
    }

    /// Compile SPython source text into IR, recording per-stage timings.
    pub fn compile_source_timed(
        &self,
        source: &str,
        module_name: &str,
    ) -> Result<(ir::Module, StageTimings), CompileError> {
        let mut timings = StageTimings::default();

        let started = Instant::now();
        let tokens = spython::lex(source)?;
        timings.lex = started.elapsed();

        let started = Instant::now();
        let program = spython::parse(tokens)?;
        timings.parse = started.elapsed();

        let started = Instant::now();
        let module = self.compile_program(&program, module_name)?;
        timings.codegen = started.elapsed();

        Ok((module, timings))
    }

    /// Compile a parsed program into IR.
    pub fn compile_program(
        &self,
        program: &Program,
        module_name: &str,
    ) -> Result<ir::Module, CompileError> {
        Ok(self.generator.compile(program, module_name)?)
    }
}

/// Compilation errors
#[derive(Debug, Error)]
pub enum CompileError {
    /// Tokenizer failure
    #[error(transparent)]
    Lex(#[from] LexError),
    /// One or more parse errors
    #[error(transparent)]
    Parse(#[from] ParseErrors),
    /// First code generation failure
    #[error("{}: {}", .0.kind, .0.message)]
    Codegen(#[from] CodegenError),
}

impl CompileError {
    /// Render with source context and carets for terminal output.
    pub fn render(&self, source_label: &str, source: &str) -> String {
        use spython::errors::pretty;

        match self {
            CompileError::Lex(err) => pretty::format_lex_error(source_label, source, err),
            CompileError::Parse(errors) => {
                pretty::format_parse_errors(source_label, source, &errors.0).join("\n\n")
            }
            CompileError::Codegen(err) => pretty::format_diagnostic(
                &err.kind.to_string(),
                source_label,
                source,
                &err.message,
                err.span.line,
                err.span.column,
            ),
        }
    }
}
