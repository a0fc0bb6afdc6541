//! Crate root: wires together the compilation pipeline.
//!
//! Each stage runs to completion before the next one starts:
//! - `tokenizer` performs lexical analysis and produces a flat token stream.
//! - `parser` builds the syntax tree inside an `arena::Arena`.
//! - `codegen` lowers the tree into x86-64 NASM assembly, resolving names
//!   through a block-scoped symbol table.
//! - `error` centralises the diagnostics shared by the other modules.
//!
//! `dump`, `cli` and `link` support the driver binary and are not needed to
//! compile a program in-process.

pub mod arena;
pub mod ast;
pub mod cli;
pub mod codegen;
pub mod dump;
pub mod error;
pub mod link;
pub mod parser;
pub mod tokenizer;

pub use arena::Arena;
pub use error::{CompileError, CompileResult, ErrorKind};

/// Compile a source string into NASM assembly. The first error from any
/// stage aborts the compilation; no later stage runs.
pub fn generate_assembly(source: &str) -> CompileResult<String> {
  let tokens = tokenizer::tokenize(source)?;
  let arena = Arena::new();
  let program = parser::parse(tokens, source, &arena)?;
  codegen::generate(&program, source)
}
