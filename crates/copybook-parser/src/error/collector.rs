//! Collector for accumulating diagnostics during compilation.
//!
//! The [`DiagnosticCollector`] lets every phase report findings instead of
//! failing on the first one encountered.

use crate::error::{Diagnostic, ParseError};

/// A collector for accumulating diagnostics.
///
/// # Example
///
/// ```
/// # use copybook_parser::error::{Diagnostic, DiagnosticCollector, ErrorCode};
/// # use copybook_parser::Span;
///
/// let mut collector = DiagnosticCollector::new();
///
/// collector.emit(
///     Diagnostic::warning("no classification rule matched")
///         .with_code(ErrorCode::E100)
///         .with_label(Span::new(0..10), "assigned DATA"),
/// );
///
/// let warnings = collector.finish().expect("warnings do not fail");
/// assert_eq!(warnings.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
    has_errors: bool,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Emit a diagnostic to this collector.
    pub fn emit(&mut self, diagnostic: Diagnostic) {
        if diagnostic.severity().is_error() {
            self.has_errors = true;
        }
        self.diagnostics.push(diagnostic);
    }

    /// Emit every diagnostic of `diagnostics`, in order.
    pub fn extend(&mut self, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        for diagnostic in diagnostics {
            self.emit(diagnostic);
        }
    }

    /// Returns `true` if an error-severity diagnostic was emitted.
    pub fn has_errors(&self) -> bool {
        self.has_errors
    }

    /// Finish collection and return a result.
    ///
    /// - If there are errors, returns `Err(ParseError)` with all diagnostics.
    /// - Otherwise returns the collected warnings.
    pub fn finish(self) -> Result<Vec<Diagnostic>, ParseError> {
        if self.has_errors {
            Err(ParseError::new(self.diagnostics))
        } else {
            Ok(self.diagnostics)
        }
    }
}
