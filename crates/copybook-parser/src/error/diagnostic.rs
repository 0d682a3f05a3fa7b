//! The core diagnostic type for the copybook error system.

use std::fmt;

use crate::{
    error::{Severity, error_code::ErrorCode, label::Label},
    span::Span,
};

/// A rich diagnostic message with source location information.
///
/// Diagnostics carry a severity, an optional error code, a primary message,
/// labeled source spans and optional help text.
///
/// # Example
///
/// ```text
/// error[E303]: fields `AMOUNT` and `COUNT` overlap
///    |
///  3 |        05 AMOUNT PIC 9(5).
///    |        ^^^^^^^^^^^^^^^^^^^ bytes 1-5
///  4 |        05 COUNT PIC 9(6).
///    |        ------------------ bytes 3-8
///    |
///    = help: add a REDEFINES clause if the fields share storage on purpose
/// ```
#[derive(Debug, Clone)]
pub struct Diagnostic {
    severity: Severity,
    code: Option<ErrorCode>,
    message: String,
    labels: Vec<Label>,
    help: Option<String>,
}

impl Diagnostic {
    /// Create an error diagnostic.
    ///
    /// # Example
    ///
    /// ```
    /// # use copybook_parser::error::{Diagnostic, ErrorCode};
    /// # use copybook_parser::Span;
    ///
    /// let diag = Diagnostic::error("record types differ in length")
    ///     .with_code(ErrorCode::E304)
    ///     .with_label(Span::new(0..10), "HEADER is 80 bytes")
    ///     .with_help("pad the shorter record with FILLER");
    /// ```
    pub fn error(message: impl Into<String>) -> Self {
        Self::new(Severity::Error, message)
    }

    /// Create a warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, message)
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn labels(&self) -> &[Label] {
        &self.labels
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Returns the span of the first primary label, if any.
    pub fn primary_span(&self) -> Option<Span> {
        self.labels
            .iter()
            .find(|label| label.is_primary())
            .map(Label::span)
    }

    /// Set the error code.
    pub fn with_code(mut self, code: ErrorCode) -> Self {
        self.code = Some(code);
        self
    }

    /// Replace the severity, used when strict validation promotes a warning.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    /// Add a primary label to this diagnostic.
    pub fn with_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::primary(span, message));
        self
    }

    /// Add a secondary label to this diagnostic.
    pub fn with_secondary_label(mut self, span: Span, message: impl Into<String>) -> Self {
        self.labels.push(Label::secondary(span, message));
        self
    }

    /// Set the help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    fn new(severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            code: None,
            message: message.into(),
            labels: Vec::new(),
            help: None,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Format: "error[E001]: message" or "error: message"
        write!(f, "{}", self.severity)?;
        if let Some(code) = self.code {
            write!(f, "[{}]", code)?;
        }
        write!(f, ": {}", self.message)
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_new() {
        let diag = Diagnostic::new(Severity::Error, "test error");

        assert!(diag.severity().is_error());
        assert_eq!(diag.message(), "test error");
        assert!(diag.code().is_none());
        assert!(diag.labels().is_empty());
        assert!(diag.help().is_none());
        assert!(diag.primary_span().is_none());
    }

    #[test]
    fn test_diagnostic_labels() {
        let diag = Diagnostic::error("fields overlap")
            .with_secondary_label(Span::new(5..15), "other field")
            .with_label(Span::new(10..20), "this field");

        assert_eq!(diag.labels().len(), 2);
        assert!(diag.labels()[0].is_secondary());
        assert!(diag.labels()[1].is_primary());
        assert_eq!(diag.primary_span(), Some(Span::new(10..20)));
    }

    #[test]
    fn test_diagnostic_with_severity_promotes_warning() {
        let diag = Diagnostic::warning("undefined REDEFINES target `BASE`")
            .with_code(ErrorCode::E300)
            .with_severity(Severity::Error);

        assert!(diag.severity().is_error());
        assert_eq!(diag.code(), Some(ErrorCode::E300));
    }

    #[test]
    fn test_diagnostic_display_with_code() {
        let diag = Diagnostic::error("invalid PICTURE `9(0)`").with_code(ErrorCode::E201);

        assert_eq!(diag.to_string(), "error[E201]: invalid PICTURE `9(0)`");
    }

    #[test]
    fn test_diagnostic_display_without_code() {
        let diag = Diagnostic::warning("line skipped");

        assert_eq!(diag.to_string(), "warning: line skipped");
    }

    #[test]
    fn test_diagnostic_with_help() {
        let diag = Diagnostic::warning("unknown USAGE `COMP-9`")
            .with_help("add the keyword to usage_mappings");

        assert_eq!(diag.help(), Some("add the keyword to usage_mappings"));
    }
}
