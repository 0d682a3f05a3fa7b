//! Record type classification.
//!
//! Every non-comment source line is assigned a record type label by the
//! configured [`ClassificationStrategy`]. Lines that match no rule receive
//! the fallback label and are also listed as unrecognized.

use std::{
    collections::{BTreeMap, BTreeSet},
    ops::Range,
};

use indexmap::IndexMap;
use log::{debug, trace};
use regex::Regex;

use crate::source::SourceLine;

/// Label assigned to every line by [`ClassificationStrategy::None`].
pub const NO_RECORD_TYPE_LABEL: &str = "DATA";

/// Returns the `length` characters starting at the 1-based column `start`,
/// or `None` when the line is too short.
fn columns(line: &str, start: usize, length: usize) -> Option<String> {
    let key: String = line.chars().skip(start.saturating_sub(1)).take(length).collect();
    (key.chars().count() == length).then_some(key)
}

fn normalize_case(value: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        value.to_string()
    } else {
        value.to_uppercase()
    }
}

/// Fixed-column discriminator looked up in a value map.
#[derive(Debug, Clone)]
pub struct PositionRule {
    start: usize,
    length: usize,
    values: BTreeMap<String, String>,
    trim_values: bool,
    ignore_case: bool,
}

impl PositionRule {
    /// Creates a rule reading `length` characters at the 1-based column `start`.
    pub fn new(start: usize, length: usize, values: BTreeMap<String, String>) -> Self {
        Self {
            start,
            length,
            values,
            trim_values: true,
            ignore_case: false,
        }
    }

    pub fn with_trim_values(mut self, trim_values: bool) -> Self {
        self.trim_values = trim_values;
        self
    }

    /// Upper-cases both the extracted key and the mapping keys.
    pub fn with_ignore_case(mut self, ignore_case: bool) -> Self {
        self.ignore_case = ignore_case;
        if ignore_case {
            self.values = self
                .values
                .into_iter()
                .map(|(key, label)| (key.to_uppercase(), label))
                .collect();
        }
        self
    }

    /// Extracts the lookup key from `line`.
    pub fn key(&self, line: &str) -> Option<String> {
        let key = columns(line, self.start, self.length)?;
        let key = if self.trim_values {
            key.trim().to_string()
        } else {
            key
        };
        Some(normalize_case(&key, !self.ignore_case))
    }

    fn classify(&self, line: &str) -> Option<String> {
        self.values.get(&self.key(line)?).cloned()
    }
}

/// Single-character discriminator.
#[derive(Debug, Clone)]
pub struct CharacterRule {
    start: usize,
    values: BTreeMap<String, String>,
    valid_characters: Option<BTreeSet<String>>,
    case_sensitive: bool,
}

impl CharacterRule {
    pub fn new(
        start: usize,
        values: BTreeMap<String, String>,
        valid_characters: Option<Vec<String>>,
        case_sensitive: bool,
    ) -> Self {
        Self {
            start,
            values: values
                .into_iter()
                .map(|(key, label)| (normalize_case(&key, case_sensitive), label))
                .collect(),
            valid_characters: valid_characters.map(|valid| {
                valid
                    .iter()
                    .map(|c| normalize_case(c, case_sensitive))
                    .collect()
            }),
            case_sensitive,
        }
    }

    fn classify(&self, line: &str) -> Option<String> {
        let character = normalize_case(&columns(line, self.start, 1)?, self.case_sensitive);
        match &self.valid_characters {
            Some(valid) if !valid.contains(&character) => None,
            Some(_) => Some(
                self.values
                    .get(&character)
                    .cloned()
                    .unwrap_or(character),
            ),
            None => self.values.get(&character).cloned(),
        }
    }
}

/// One `char == 'c' then LABEL` test of a conditional expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    character: char,
    label: String,
}

impl Branch {
    pub fn new(character: char, label: impl Into<String>) -> Self {
        Self {
            character,
            label: label.into(),
        }
    }
}

/// Equality tests against the character at a column, tried in order.
#[derive(Debug, Clone)]
pub struct ConditionalRule {
    start: usize,
    branches: Vec<Branch>,
    otherwise: Option<String>,
    case_sensitive: bool,
}

impl ConditionalRule {
    pub fn new(
        start: usize,
        branches: Vec<Branch>,
        otherwise: Option<String>,
        case_sensitive: bool,
    ) -> Self {
        Self {
            start,
            branches,
            otherwise,
            case_sensitive,
        }
    }

    fn classify(&self, line: &str) -> Option<String> {
        let character = line.chars().nth(self.start.saturating_sub(1))?;
        self.branches
            .iter()
            .find(|branch| {
                if self.case_sensitive {
                    branch.character == character
                } else {
                    branch.character.eq_ignore_ascii_case(&character)
                }
            })
            .map(|branch| branch.label.clone())
            .or_else(|| self.otherwise.clone())
    }
}

/// Regular expression whose capture is looked up in a mapping.
#[derive(Debug, Clone)]
pub struct PatternRule {
    regex: Regex,
    mappings: BTreeMap<String, String>,
}

impl PatternRule {
    pub fn new(regex: Regex, mappings: BTreeMap<String, String>) -> Self {
        Self { regex, mappings }
    }

    fn classify(&self, line: &str) -> Option<String> {
        let captures = self.regex.captures(line)?;
        let key = captures.get(1).or_else(|| captures.get(0))?;
        self.mappings.get(key.as_str()).cloned()
    }
}

/// One positional test of the multi-field strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldMatch {
    start: usize,
    length: usize,
    expected_value: String,
    record_type: String,
}

impl FieldMatch {
    pub fn new(
        start: usize,
        length: usize,
        expected_value: impl Into<String>,
        record_type: impl Into<String>,
    ) -> Self {
        Self {
            start,
            length,
            expected_value: expected_value.into(),
            record_type: record_type.into(),
        }
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn length(&self) -> usize {
        self.length
    }
}

/// Ordered positional tests; the first whose substring equals its expected
/// value wins.
#[derive(Debug, Clone)]
pub struct MultiFieldRule {
    matches: Vec<FieldMatch>,
    trim_values: bool,
}

impl MultiFieldRule {
    pub fn new(matches: Vec<FieldMatch>, trim_values: bool) -> Self {
        Self {
            matches,
            trim_values,
        }
    }

    fn classify(&self, line: &str) -> Option<String> {
        self.matches.iter().find_map(|rule| {
            let value = columns(line, rule.start, rule.length)?;
            let value = if self.trim_values { value.trim() } else { &value };
            (value == rule.expected_value).then(|| rule.record_type.clone())
        })
    }
}

/// How lines are assigned record types.
#[derive(Debug, Clone)]
pub enum ClassificationStrategy {
    Position(PositionRule),
    Character(CharacterRule),
    Conditional(ConditionalRule),
    Pattern(PatternRule),
    MultiField(MultiFieldRule),
    /// Every line belongs to the single record type `DATA`.
    None,
}

impl ClassificationStrategy {
    /// The canonical rule type name.
    pub fn name(&self) -> &'static str {
        match self {
            ClassificationStrategy::Position(_) => "position-based",
            ClassificationStrategy::Character(_) => "character-based",
            ClassificationStrategy::Conditional(_) => "conditional-based",
            ClassificationStrategy::Pattern(_) => "pattern-based",
            ClassificationStrategy::MultiField(_) => "multi-field",
            ClassificationStrategy::None => "no-record-type",
        }
    }

    /// Returns the label for `line`, or `None` when no rule matches.
    pub fn classify(&self, line: &str) -> Option<String> {
        match self {
            ClassificationStrategy::Position(rule) => rule.classify(line),
            ClassificationStrategy::Character(rule) => rule.classify(line),
            ClassificationStrategy::Conditional(rule) => rule.classify(line),
            ClassificationStrategy::Pattern(rule) => rule.classify(line),
            ClassificationStrategy::MultiField(rule) => rule.classify(line),
            ClassificationStrategy::None => Some(NO_RECORD_TYPE_LABEL.to_string()),
        }
    }

    /// Width in bytes of the record type discriminator at the start of a record.
    pub fn discriminator_width(&self) -> usize {
        match self {
            ClassificationStrategy::Position(rule) => rule.length,
            ClassificationStrategy::Character(_) | ClassificationStrategy::Conditional(_) => 1,
            ClassificationStrategy::MultiField(rule) => rule
                .matches
                .iter()
                .map(FieldMatch::length)
                .max()
                .unwrap_or(0),
            ClassificationStrategy::Pattern(_) | ClassificationStrategy::None => 0,
        }
    }

    /// 0-based character columns the discriminator occupies in a source line.
    pub fn discriminator_columns(&self) -> Option<Range<usize>> {
        let (start, end) = match self {
            ClassificationStrategy::Position(rule) => (rule.start, rule.start + rule.length),
            ClassificationStrategy::Character(CharacterRule { start, .. })
            | ClassificationStrategy::Conditional(ConditionalRule { start, .. }) => {
                (*start, *start + 1)
            }
            ClassificationStrategy::MultiField(rule) => {
                let start = rule.matches.iter().map(FieldMatch::start).min()?;
                let end = rule
                    .matches
                    .iter()
                    .map(|m| m.start + m.length)
                    .max()?;
                (start, end)
            }
            ClassificationStrategy::Pattern(_) | ClassificationStrategy::None => return None,
        };
        Some(start.saturating_sub(1)..end.saturating_sub(1))
    }
}

/// Lines grouped by record type.
#[derive(Debug, Clone, Default)]
pub struct ClassificationResult<'src> {
    records: IndexMap<String, Vec<&'src SourceLine>>,
    unrecognized: Vec<&'src SourceLine>,
    method: &'static str,
}

impl<'src> ClassificationResult<'src> {
    /// Creates a result holding every content line of `lines` under `label`.
    pub fn single(
        label: impl Into<String>,
        lines: impl IntoIterator<Item = &'src SourceLine>,
        method: &'static str,
    ) -> Self {
        let lines: Vec<_> = lines.into_iter().filter(|line| !line.is_comment()).collect();
        let mut records = IndexMap::new();
        if !lines.is_empty() {
            records.insert(label.into(), lines);
        }
        Self {
            records,
            unrecognized: Vec::new(),
            method,
        }
    }

    /// Record type labels mapped to their lines, in first-appearance order.
    pub fn records(&self) -> &IndexMap<String, Vec<&'src SourceLine>> {
        &self.records
    }

    /// Number of lines per record type label.
    pub fn counts(&self) -> IndexMap<String, usize> {
        self.records
            .iter()
            .map(|(label, lines)| (label.clone(), lines.len()))
            .collect()
    }

    /// Lines that matched no rule.
    pub fn unrecognized(&self) -> &[&'src SourceLine] {
        &self.unrecognized
    }

    /// Name of the strategy that produced this result.
    pub fn method(&self) -> &'static str {
        self.method
    }
}

/// Assigns record type labels to source lines.
#[derive(Debug, Clone, Copy)]
pub struct RecordClassifier<'a> {
    strategy: &'a ClassificationStrategy,
    fallback: &'a str,
}

impl<'a> RecordClassifier<'a> {
    /// Creates a classifier labelling unmatched lines with `fallback`.
    pub fn new(strategy: &'a ClassificationStrategy, fallback: &'a str) -> Self {
        Self { strategy, fallback }
    }

    /// Groups the content lines of `lines` by record type.
    ///
    /// Comment and blank lines are skipped; every other line lands in exactly
    /// one group, in source order.
    pub fn classify<'src>(
        &self,
        lines: impl IntoIterator<Item = &'src SourceLine>,
    ) -> ClassificationResult<'src> {
        let mut records: IndexMap<String, Vec<&'src SourceLine>> = IndexMap::new();
        let mut unrecognized = Vec::new();

        for line in lines.into_iter().filter(|line| !line.is_comment()) {
            let label = match self.strategy.classify(line.text()) {
                Some(label) => label,
                None => {
                    unrecognized.push(line);
                    self.fallback.to_string()
                }
            };
            trace!(line = line.number(), label = label.as_str(); "Classified line");
            records.entry(label).or_default().push(line);
        }

        let result = ClassificationResult {
            records,
            unrecognized,
            method: self.strategy.name(),
        };
        debug!(
            method = result.method,
            record_types = result.records.len(),
            unrecognized = result.unrecognized.len();
            "Classified copybook lines"
        );
        result
    }
}
