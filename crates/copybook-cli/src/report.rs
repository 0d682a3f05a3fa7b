//! JSON report of a compiled copybook.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::Serialize;

use copybook::{CopybookLayout, RecordLayout};
use copybook_parser::error::Diagnostic;

/// One warning as written to the report.
#[derive(Debug, Serialize)]
pub struct WarningEntry<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
    severity: String,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    line: Option<usize>,
}

impl<'a> WarningEntry<'a> {
    fn new(diagnostic: &'a Diagnostic, source: &str) -> Self {
        Self {
            code: diagnostic.code().map(|code| code.as_str()),
            severity: diagnostic.severity().to_string(),
            message: diagnostic.message(),
            line: diagnostic
                .primary_span()
                .map(|span| line_of(source, span.start())),
        }
    }
}

/// The report written by the CLI.
#[derive(Debug, Serialize)]
pub struct Report<'a> {
    copybook_name: String,
    record_layouts: &'a IndexMap<String, RecordLayout>,
    record_counts: &'a IndexMap<String, usize>,
    unrecognized_lines: &'a [String],
    warnings: Vec<WarningEntry<'a>>,
    field_type_statistics: BTreeMap<String, usize>,
    total_fields: usize,
    total_record_types: usize,
    processing_method: &'a str,
}

impl<'a> Report<'a> {
    /// Builds the report of `copybook`, compiled from `source`.
    pub fn new(copybook_name: impl Into<String>, copybook: &'a CopybookLayout, source: &str) -> Self {
        Self {
            copybook_name: copybook_name.into(),
            record_layouts: copybook.layouts(),
            record_counts: copybook.record_counts(),
            unrecognized_lines: copybook.unrecognized_lines(),
            warnings: copybook
                .warnings()
                .iter()
                .map(|warning| WarningEntry::new(warning, source))
                .collect(),
            field_type_statistics: copybook.field_type_statistics(),
            total_fields: copybook.total_fields(),
            total_record_types: copybook.layouts().len(),
            processing_method: copybook.processing_method(),
        }
    }

    /// Serializes the report, indented unless `compact`.
    pub fn to_json(&self, compact: bool) -> serde_json::Result<String> {
        if compact {
            serde_json::to_string(self)
        } else {
            serde_json::to_string_pretty(self)
        }
    }
}

/// 1-based line number of the byte `offset` in `source`.
fn line_of(source: &str, offset: usize) -> usize {
    let end = offset.min(source.len());
    source.as_bytes()[..end].iter().filter(|&&b| b == b'\n').count() + 1
}
