//! Tran Core Library
//!
//! This crate provides the core functionality for the Tran language:
//! an indentation-aware lexer, a recursive-descent parser producing a
//! [`TranUnit`], and a tree-walking interpreter.

pub mod ast;
pub mod config;
pub mod cursor;
pub mod diagnostics;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod stdlib;
pub mod value;

pub use ast::*;
pub use config::{ConfigError, RunOptions, TranConfig};
pub use diagnostics::{Diagnostic, DiagnosticSeverity, Diagnostics, DiagnosticsOutput};
pub use error::{Error, Result};
pub use interpreter::{find_entry, run, run_with, Interpreter};
pub use lexer::{lex, Lexer, Token, TokenKind};
pub use parser::{parse, Parser};
pub use span::{Position, Span};
pub use stdlib::{CaptureHost, Host, StdoutHost};
pub use value::Value;

/// Lex and parse a complete source text.
pub fn parse_source(source: &str) -> Result<TranUnit> {
    let tokens = lex(source)?;
    tracing::debug!(tokens = tokens.len(), "parsing token stream");
    parse(tokens)
}

/// Lex, parse and run a complete source text.
pub fn run_source(source: &str, options: RunOptions, host: &mut dyn Host) -> Result<()> {
    let unit = parse_source(source)?;
    run_with(&unit, host, options)
}
