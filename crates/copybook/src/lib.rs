//! Copybook - A compiler from COBOL copybooks to byte-accurate record layouts.
//!
//! Classification, field placement and layout assembly for fixed-format
//! copybooks. Each record type of a copybook becomes a [`RecordLayout`]
//! listing every field with its position, storage length and encoding.

pub mod layout;
pub mod validate;

mod error;

pub use copybook_core::{config, field};
pub use copybook_parser::error as diagnostics;

pub use error::CopybookError;
pub use layout::{LayoutAssembler, RecordLayout};

use std::collections::BTreeMap;

use indexmap::IndexMap;
use log::{debug, info, trace};
use rayon::prelude::*;

use copybook_core::field::Field;
use copybook_parser::{
    ClassificationResult, HierarchyBuilder, RecordClassifier, Rules, Source, SourceLine,
    error::{Diagnostic, DiagnosticCollector, ErrorCode, Severity},
    interpret::LayoutStrategy,
};

use config::RulesConfig;
use validate::Overlap;

/// Processing method reported when every line forms one layout.
pub const SINGLE_LAYOUT_METHOD: &str = "single_layout";

/// Compiler turning copybook source into record layouts.
///
/// # Examples
///
/// ```rust
/// use copybook::{LayoutCompiler, config::RulesConfig};
///
/// let source = "\
/// 01 REC-A.
///    05 FIELD-A PIC X(5).
///    05 FIELD-B PIC 9(3) COMP-3.";
///
/// let compiler = LayoutCompiler::new(RulesConfig::default());
/// let copybook = compiler.compile_source(source)
///     .expect("Failed to compile");
///
/// let layout = &copybook.layouts()["DATA"];
/// assert_eq!(layout.total_length(), 7);
///
/// // Or use default rules
/// let compiler = LayoutCompiler::default();
/// ```
#[derive(Default)]
pub struct LayoutCompiler {
    config: RulesConfig,
}

impl LayoutCompiler {
    /// Create a new compiler with the given rules.
    ///
    /// # Arguments
    ///
    /// * `config` - Classification, field processing, layout and validation rules
    pub fn new(config: RulesConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RulesConfig {
        &self.config
    }

    /// Compile copybook source text.
    ///
    /// # Errors
    ///
    /// See [`LayoutCompiler::compile`].
    pub fn compile_source(&self, source: &str) -> Result<CopybookLayout, CopybookError> {
        let lines: Vec<&str> = source.lines().collect();
        self.compile(&lines)
    }

    /// Compile copybook lines into one layout per record type.
    ///
    /// This interprets the rules, classifies the lines into record types,
    /// then places and assembles every record type in parallel.
    ///
    /// # Arguments
    ///
    /// * `lines` - Copybook source lines, without line terminators
    ///
    /// # Errors
    ///
    /// Returns `CopybookError::Config` for invalid rules, and
    /// `CopybookError::Parse` when any error-severity diagnostic is found.
    pub fn compile<S: AsRef<str>>(&self, lines: &[S]) -> Result<CopybookLayout, CopybookError> {
        info!(lines = lines.len(); "Compiling copybook");

        let rules = copybook_parser::interpret(&self.config)?;
        let source = Source::new(lines);

        let classified = match rules.layout_strategy() {
            LayoutStrategy::Single => ClassificationResult::single(
                rules.fallback(),
                source.lines(),
                SINGLE_LAYOUT_METHOD,
            ),
            LayoutStrategy::Multi | LayoutStrategy::Custom => {
                RecordClassifier::new(rules.strategy(), rules.fallback()).classify(source.lines())
            }
        };
        info!(
            method = classified.method(),
            record_types = classified.records().len();
            "Classified copybook"
        );

        let mut collector = DiagnosticCollector::new();
        for line in classified.unrecognized() {
            collector.emit(
                Diagnostic::warning(format!(
                    "line {} matched no record type rule, assigned to `{}`",
                    line.number(),
                    rules.fallback()
                ))
                .with_code(ErrorCode::E100)
                .with_label(line.span(), "unrecognized record type"),
            );
        }

        let records: Vec<(&String, &Vec<&SourceLine>)> = classified.records().iter().collect();
        let compiled: Vec<CompiledRecord> = records
            .par_iter()
            .map(|(label, lines)| compile_record(&rules, &source, label, lines))
            .collect();

        let mut layouts = IndexMap::new();
        for record in compiled {
            collector.extend(record.diagnostics);
            layouts.insert(record.layout.record_type().to_string(), record.layout);
        }

        if self.config.validation().uniform_record_length() {
            if let Some(diagnostic) = length_mismatch(&layouts) {
                collector.emit(diagnostic);
            }
        }

        let warnings = collector
            .finish()
            .map_err(|err| CopybookError::new_parse_error(err, source.text()))?;

        let copybook = CopybookLayout {
            layouts,
            record_counts: classified.counts(),
            unrecognized_lines: classified
                .unrecognized()
                .iter()
                .map(|line| line.text().to_string())
                .collect(),
            warnings,
            processing_method: classified.method().to_string(),
        };
        info!(
            record_types = copybook.layouts.len(),
            fields = copybook.total_fields(),
            warnings = copybook.warnings.len();
            "Copybook compiled successfully"
        );
        Ok(copybook)
    }
}

struct CompiledRecord {
    layout: RecordLayout,
    diagnostics: Vec<Diagnostic>,
}

fn compile_record(
    rules: &Rules,
    source: &Source,
    label: &str,
    lines: &[&SourceLine],
) -> CompiledRecord {
    debug!(record_type = label, lines = lines.len(); "Compiling record type");
    let config = rules.config();
    let strict = config.validation().strict_mode();

    let (fields, diagnostics) = HierarchyBuilder::new(rules)
        .build(lines.iter().copied())
        .into_parts();
    let mut diagnostics: Vec<Diagnostic> = diagnostics
        .into_iter()
        .map(|diagnostic| {
            if strict && diagnostic.code() == Some(ErrorCode::E300) {
                diagnostic.with_severity(Severity::Error)
            } else {
                diagnostic
            }
        })
        .collect();

    let assembler = LayoutAssembler::new(
        config.layout_generation().naming_convention(),
        config.validation().validate_field_overlaps(),
        config.field_processing().record_levels().to_vec(),
    );
    let (layout, overlaps) = assembler.assemble_with_overlaps(label, fields);

    let severity = if strict || !config.layout_generation().allow_overlaps() {
        Severity::Error
    } else {
        Severity::Warning
    };
    diagnostics.extend(
        overlaps
            .iter()
            .map(|overlap| overlap_diagnostic(source, layout.fields(), overlap, severity)),
    );

    trace!(record_type = label, layout:?; "Compiled record type");
    CompiledRecord {
        layout,
        diagnostics,
    }
}

fn overlap_diagnostic(
    source: &Source,
    fields: &[Field],
    overlap: &Overlap,
    severity: Severity,
) -> Diagnostic {
    let first = &fields[overlap.first.index()];
    let second = &fields[overlap.second.index()];
    let mut diagnostic = Diagnostic::error(format!(
        "fields `{}` and `{}` overlap",
        first.name(),
        second.name()
    ))
    .with_code(ErrorCode::E303)
    .with_severity(severity)
    .with_help("declare the overlay with REDEFINES or adjust the PICTURE lengths");

    if let Some(line) = source_line(source, second) {
        diagnostic = diagnostic.with_label(
            line.span(),
            format!(
                "occupies {}-{}",
                second.start_position(),
                second.end_position()
            ),
        );
    }
    if let Some(line) = source_line(source, first) {
        diagnostic = diagnostic.with_secondary_label(
            line.span(),
            format!(
                "already occupies {}-{}",
                first.start_position(),
                first.end_position()
            ),
        );
    }
    diagnostic
}

fn source_line<'s>(source: &'s Source, field: &Field) -> Option<&'s SourceLine> {
    field
        .line()
        .checked_sub(1)
        .and_then(|index| source.lines().get(index))
}

fn length_mismatch(layouts: &IndexMap<String, RecordLayout>) -> Option<Diagnostic> {
    let expected = layouts.values().next()?.total_length();
    if layouts.values().all(|layout| layout.total_length() == expected) {
        return None;
    }

    let summary = layouts
        .values()
        .map(|layout| format!("{} = {}", layout.record_type(), layout.total_length()))
        .collect::<Vec<_>>()
        .join(", ");
    Some(
        Diagnostic::error(format!("record types differ in total length ({summary})"))
            .with_code(ErrorCode::E304)
            .with_help("pad the shorter records with FILLER or disable uniform_record_length"),
    )
}

/// The compiled layouts of one copybook.
#[derive(Debug, Clone)]
pub struct CopybookLayout {
    layouts: IndexMap<String, RecordLayout>,
    record_counts: IndexMap<String, usize>,
    unrecognized_lines: Vec<String>,
    warnings: Vec<Diagnostic>,
    processing_method: String,
}

impl CopybookLayout {
    /// Layouts keyed by record type, in first-appearance order.
    pub fn layouts(&self) -> &IndexMap<String, RecordLayout> {
        &self.layouts
    }

    /// Number of source lines classified under each record type.
    pub fn record_counts(&self) -> &IndexMap<String, usize> {
        &self.record_counts
    }

    /// Lines that matched no classification rule.
    pub fn unrecognized_lines(&self) -> &[String] {
        &self.unrecognized_lines
    }

    /// Warning diagnostics collected during compilation.
    pub fn warnings(&self) -> &[Diagnostic] {
        &self.warnings
    }

    pub fn processing_method(&self) -> &str {
        &self.processing_method
    }

    /// Field counts by kind across every record type.
    pub fn field_type_statistics(&self) -> BTreeMap<String, usize> {
        let mut stats = BTreeMap::new();
        for layout in self.layouts.values() {
            for field in layout.fields() {
                *stats.entry(field.kind().as_str().to_string()).or_insert(0) += 1;
            }
        }
        stats
    }

    pub fn total_fields(&self) -> usize {
        self.layouts.values().map(RecordLayout::field_count).sum()
    }
}
