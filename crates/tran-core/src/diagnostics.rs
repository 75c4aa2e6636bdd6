//! Diagnostic types for error reporting.

use crate::error::Error;
use crate::span::Span;
use serde::{Deserialize, Serialize};

/// Severity level of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
}

/// A diagnostic message with source location.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity of the diagnostic
    pub severity: DiagnosticSeverity,
    /// Diagnostic code (e.g., "tran::syntax")
    pub code: String,
    /// Human-readable message
    pub message: String,
    /// Source file path
    pub file: String,
    /// Source span; runtime errors have none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub span: Option<Span>,
    /// Optional help text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub help: Option<String>,
}

impl Diagnostic {
    pub fn error(code: impl Into<String>, message: impl Into<String>) -> DiagnosticBuilder {
        DiagnosticBuilder::new(DiagnosticSeverity::Error, code.into(), message.into())
    }

    pub fn warning(code: impl Into<String>, message: impl Into<String>) -> DiagnosticBuilder {
        DiagnosticBuilder::new(DiagnosticSeverity::Warning, code.into(), message.into())
    }

    /// Describe a pipeline error found in `file`.
    pub fn from_error(error: &Error, file: &str) -> Diagnostic {
        let mut builder = Diagnostic::error(error.code(), error.message()).with_file(file);
        if let Some(span) = error.span() {
            builder = builder.with_span(span);
        }
        if let Some(help) = help_for(error) {
            builder = builder.with_help(help);
        }
        builder.build()
    }
}

fn help_for(error: &Error) -> Option<&'static str> {
    let message = error.message();
    if error.is_syntax() && message.contains("indent") {
        Some("blocks are indented by 4 spaces or one tab more than their header")
    } else if error.is_runtime() && message.starts_with("no entry method") {
        Some("add a `shared start()` method to one class")
    } else if error.is_lexical() && message == "unterminated comment" {
        Some("comments are enclosed in balanced braces: { ... }")
    } else {
        None
    }
}

/// Builder for constructing diagnostics.
pub struct DiagnosticBuilder {
    severity: DiagnosticSeverity,
    code: String,
    message: String,
    file: Option<String>,
    span: Option<Span>,
    help: Option<String>,
}

impl DiagnosticBuilder {
    pub fn new(severity: DiagnosticSeverity, code: String, message: String) -> Self {
        Self {
            severity,
            code,
            message,
            file: None,
            span: None,
            help: None,
        }
    }

    pub fn with_file(mut self, file: impl Into<String>) -> Self {
        self.file = Some(file.into());
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    pub fn build(self) -> Diagnostic {
        Diagnostic {
            severity: self.severity,
            code: self.code,
            message: self.message,
            file: self.file.unwrap_or_default(),
            span: self.span,
            help: self.help,
        }
    }
}

/// Collection of diagnostics.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct Diagnostics {
    diagnostics: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == DiagnosticSeverity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == DiagnosticSeverity::Warning)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }
}

/// JSON output format for diagnostics.
#[derive(Debug, Serialize, Deserialize)]
pub struct DiagnosticsOutput {
    pub version: String,
    pub status: String,
    pub errors: Vec<Diagnostic>,
    pub warnings: Vec<Diagnostic>,
    pub summary: DiagnosticsSummary,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DiagnosticsSummary {
    pub total_errors: usize,
    pub total_warnings: usize,
}

impl DiagnosticsOutput {
    pub fn from_diagnostics(diagnostics: &Diagnostics) -> Self {
        let errors: Vec<_> = diagnostics.errors().cloned().collect();
        let warnings: Vec<_> = diagnostics.warnings().cloned().collect();

        Self {
            version: "1.0".to_string(),
            status: if errors.is_empty() { "ok" } else { "error" }.to_string(),
            summary: DiagnosticsSummary {
                total_errors: errors.len(),
                total_warnings: warnings.len(),
            },
            errors,
            warnings,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::lex;
    use crate::parser::parse;

    #[test]
    fn test_from_syntax_error() {
        let err = parse(lex("class Foo\nnumber x\n").unwrap()).unwrap_err();
        let diagnostic = Diagnostic::from_error(&err, "foo.tran");
        assert_eq!(diagnostic.severity, DiagnosticSeverity::Error);
        assert_eq!(diagnostic.code, "tran::syntax");
        assert_eq!(diagnostic.file, "foo.tran");
        assert_eq!(diagnostic.span.unwrap().line(), 2);
        assert!(diagnostic.help.is_some());
    }

    #[test]
    fn test_runtime_error_has_no_span() {
        let err = Error::runtime("no entry method found: expected a shared, non-private method 'start()'");
        let diagnostic = Diagnostic::from_error(&err, "main.tran");
        assert!(diagnostic.span.is_none());
        assert_eq!(diagnostic.help.as_deref(), Some("add a `shared start()` method to one class"));
    }

    #[test]
    fn test_output_summary_and_json() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Diagnostic::from_error(&lex("{{}").unwrap_err(), "a.tran"));
        diagnostics.push(Diagnostic::warning("tran::entry", "no entry method").with_file("b.tran").build());

        let output = DiagnosticsOutput::from_diagnostics(&diagnostics);
        assert_eq!(output.status, "error");
        assert_eq!(output.summary.total_errors, 1);
        assert_eq!(output.summary.total_warnings, 1);

        let json: serde_json::Value = serde_json::from_str(&output.to_json().unwrap()).unwrap();
        assert_eq!(json["errors"][0]["code"], "tran::lex");
        assert_eq!(json["errors"][0]["severity"], "error");
        assert_eq!(json["warnings"][0]["file"], "b.tran");
        assert!(json["warnings"][0].get("span").is_none());
    }

    #[test]
    fn test_empty_output_is_ok() {
        let output = DiagnosticsOutput::from_diagnostics(&Diagnostics::new());
        assert_eq!(output.status, "ok");
        assert!(output.errors.is_empty());
    }
}
