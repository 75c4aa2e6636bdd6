//! Error type shared by every stage of the pipeline.
//!
//! Each stage stops at the first error it meets; there is no recovery and no
//! multi-error reporting.

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

use crate::span::Span;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A fatal lexical, syntax or runtime error.
#[derive(Debug, Clone, PartialEq, Error, Diagnostic)]
pub enum Error {
    /// Malformed character sequence in the source text.
    #[error("{span}: {message}")]
    #[diagnostic(code(tran::lex))]
    Lexical {
        message: String,
        #[label("here")]
        span: Span,
    },

    /// Grammar violation found while parsing the token stream.
    #[error("{span}: {message}")]
    #[diagnostic(code(tran::syntax))]
    Syntax {
        message: String,
        #[label("here")]
        span: Span,
    },

    /// Semantic failure while interpreting the program.
    #[error("{message}")]
    #[diagnostic(code(tran::runtime))]
    Runtime { message: String },
}

impl Error {
    pub fn lexical(message: impl Into<String>, span: Span) -> Self {
        Error::Lexical {
            message: message.into(),
            span,
        }
    }

    pub fn syntax(message: impl Into<String>, span: Span) -> Self {
        Error::Syntax {
            message: message.into(),
            span,
        }
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Error::Runtime {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Error::Lexical { message, .. }
            | Error::Syntax { message, .. }
            | Error::Runtime { message } => message,
        }
    }

    /// Source location, for the kinds that have one.
    pub fn span(&self) -> Option<Span> {
        match self {
            Error::Lexical { span, .. } | Error::Syntax { span, .. } => Some(*span),
            Error::Runtime { .. } => None,
        }
    }

    /// Stable diagnostic code.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Lexical { .. } => "tran::lex",
            Error::Syntax { .. } => "tran::syntax",
            Error::Runtime { .. } => "tran::runtime",
        }
    }

    pub fn is_lexical(&self) -> bool {
        matches!(self, Error::Lexical { .. })
    }

    pub fn is_syntax(&self) -> bool {
        matches!(self, Error::Syntax { .. })
    }

    pub fn is_runtime(&self) -> bool {
        matches!(self, Error::Runtime { .. })
    }
}

impl From<Span> for SourceSpan {
    fn from(span: Span) -> Self {
        let len = span.end.offset.saturating_sub(span.start.offset);
        (span.start.offset, len).into()
    }
}
