//! Labeled source spans for diagnostic messages.

use crate::span::Span;

/// A labeled span in copybook source.
///
/// A primary label marks the entry a diagnostic is about. Secondary labels
/// point at related entries, such as the target of a REDEFINES clause or the
/// other field of an overlapping pair.
///
/// # Example
///
/// ```text
/// warning[E301]: `ALT-DATA` at level 10 redefines `BASE-DATA` at level 05
///    |
///  7 |        10 ALT-DATA REDEFINES BASE-DATA PIC X(8).
///    |        ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^ level 10 here
///    |
///  4 |        05 BASE-DATA PIC X(8).
///    |        ---------------------- target declared at level 05
/// ```
#[derive(Debug, Clone)]
pub struct Label {
    span: Span,
    message: String,
    is_primary: bool,
}

impl Label {
    /// Create a new primary label.
    pub fn primary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: true,
        }
    }

    /// Create a new secondary label.
    pub fn secondary(span: Span, message: impl Into<String>) -> Self {
        Self {
            span,
            message: message.into(),
            is_primary: false,
        }
    }

    pub fn span(&self) -> Span {
        self.span
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_primary(&self) -> bool {
        self.is_primary
    }

    pub fn is_secondary(&self) -> bool {
        !self.is_primary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_label() {
        let label = Label::primary(Span::new(10..20), "overlaps here");

        assert_eq!(label.span().start(), 10);
        assert_eq!(label.span().end(), 20);
        assert_eq!(label.message(), "overlaps here");
        assert!(label.is_primary());
        assert!(!label.is_secondary());
    }

    #[test]
    fn test_secondary_label() {
        let label = Label::secondary(Span::new(5..15), "redefined field");

        assert_eq!(label.span(), Span::new(5..15));
        assert_eq!(label.message(), "redefined field");
        assert!(label.is_secondary());
    }
}
