//! `mython` library crate.
//!
//! High-level layout:
//! - frontend: `lexer` + `parser` produce the shared AST (`ast`)
//! - `runtime`: object model (values, classes, holders) and comparisons
//! - `interpreter`: tree-walking evaluator and the `run` pipeline
pub mod ast;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod runtime;
