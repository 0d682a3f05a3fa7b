//! Byte spans into copybook source text.

use std::ops::Range;

/// A half-open byte range into the joined source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    start: usize,
    end: usize,
}

impl Span {
    /// Create a new span from a byte range.
    pub fn new(range: Range<usize>) -> Self {
        Self {
            start: range.start,
            end: range.end.max(range.start),
        }
    }

    /// Get the start offset of the span
    pub fn start(&self) -> usize {
        self.start
    }

    /// Get the end offset of the span
    pub fn end(&self) -> usize {
        self.end
    }

    /// Get the length of the span
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    /// Check if the span is empty
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Create a union of two spans (encompassing both)
    pub fn union(&self, other: Span) -> Span {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    /// Create a sub-span at `range` relative to this span's start, clamped to it.
    pub fn slice(&self, range: Range<usize>) -> Span {
        let start = (self.start + range.start).min(self.end);
        let end = (self.start + range.end).min(self.end);
        Self::new(start..end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_accessors() {
        let span = Span::new(4..10);

        assert_eq!(span.start(), 4);
        assert_eq!(span.end(), 10);
        assert_eq!(span.len(), 6);
        assert!(!span.is_empty());
    }

    #[test]
    fn test_span_union() {
        let span = Span::new(10..20).union(Span::new(4..12));

        assert_eq!(span, Span::new(4..20));
    }

    #[test]
    fn test_span_slice_is_clamped() {
        let span = Span::new(10..20);

        assert_eq!(span.slice(2..5), Span::new(12..15));
        assert_eq!(span.slice(8..40), Span::new(18..20));
        assert!(span.slice(30..40).is_empty());
    }
}
