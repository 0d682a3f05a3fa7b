//! Copybook source text and its lines.
//!
//! Input lines are joined with `\n` into one text so diagnostics can carry
//! byte spans that a report handler can render against the whole copybook.

use crate::span::Span;

/// One physical line of copybook source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    number: usize,
    text: String,
    span: Span,
}

impl SourceLine {
    /// 1-based line number.
    pub fn number(&self) -> usize {
        self.number
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Byte span of the line inside [`Source::text`].
    pub fn span(&self) -> Span {
        self.span
    }

    /// Returns `true` for blank lines and comment lines.
    ///
    /// A comment has `*` in column 7 of the fixed format, or starts with
    /// `*` or `//` once leading whitespace is removed.
    pub fn is_comment(&self) -> bool {
        let trimmed = self.text.trim();
        trimmed.is_empty()
            || self.text.chars().nth(6) == Some('*')
            || trimmed.starts_with('*')
            || trimmed.starts_with("//")
    }
}

/// Copybook source split into lines.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Source {
    text: String,
    lines: Vec<SourceLine>,
}

impl Source {
    /// Builds a source from already split lines.
    pub fn new<S: AsRef<str>>(lines: &[S]) -> Self {
        let mut text = String::new();
        let mut source_lines = Vec::with_capacity(lines.len());

        for (index, line) in lines.iter().enumerate() {
            let line = line.as_ref().trim_end_matches(['\r', '\n']);
            if index > 0 {
                text.push('\n');
            }
            let start = text.len();
            text.push_str(line);
            source_lines.push(SourceLine {
                number: index + 1,
                text: line.to_string(),
                span: Span::new(start..text.len()),
            });
        }

        Self {
            text,
            lines: source_lines,
        }
    }

    /// Builds a source by splitting `text` into lines.
    pub fn from_text(text: &str) -> Self {
        let lines: Vec<&str> = text.lines().collect();
        Self::new(&lines)
    }

    /// The joined source text that spans refer to.
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn lines(&self) -> &[SourceLine] {
        &self.lines
    }

    /// Iterates over lines that are neither blank nor comments.
    pub fn content_lines(&self) -> impl Iterator<Item = &SourceLine> {
        self.lines.iter().filter(|line| !line.is_comment())
    }
}
