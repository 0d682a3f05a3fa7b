//! Rule configuration for copybook layout compilation.
//!
//! This module provides the configuration structures that drive record type
//! classification, field processing and layout generation. All types
//! implement [`serde::Deserialize`] so a complete rule set can be loaded from
//! TOML. Every section has defaults; an empty document is a valid
//! configuration.
//!
//! The structures are deliberately loosely typed: names such as the rule type
//! or the layout strategy are plain strings here and are checked and turned
//! into closed types by the rule interpreter before any source is processed.
//!
//! # Overview
//!
//! - [`RulesConfig`] - Top-level rule set.
//! - [`RecordTypeField`] - Parameters of the record type classification strategy.
//! - [`FieldProcessing`] - Level designations, usage mappings and field naming.
//! - [`LayoutGeneration`] - Layout strategy, naming template and start position.
//! - [`Validation`] - Structural validation switches.
//!
//! # Example
//!
//! ```
//! # use copybook_core::config::RulesConfig;
//! let config = RulesConfig::default();
//! assert_eq!(config.rule_type(), "no-record-type");
//! assert_eq!(config.layout_generation().start_position(), 1);
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;

/// Name of the record type used when no classification rule matches.
pub const DEFAULT_RECORD_TYPE: &str = "DATA";

/// Top-level rule set.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RulesConfig {
    /// Classification strategy name, e.g. `position-based`.
    rule_type: String,

    /// Parameters of the classification strategy.
    record_type_field: Option<RecordTypeField>,

    field_processing: FieldProcessing,

    layout_generation: LayoutGeneration,

    validation: Validation,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            rule_type: "no-record-type".to_string(),
            record_type_field: None,
            field_processing: FieldProcessing::default(),
            layout_generation: LayoutGeneration::default(),
            validation: Validation::default(),
        }
    }
}

impl RulesConfig {
    /// Creates a rule set using the given classification strategy name and
    /// default sections.
    pub fn new(rule_type: impl Into<String>) -> Self {
        Self {
            rule_type: rule_type.into(),
            ..Self::default()
        }
    }

    /// Sets the record type classification parameters.
    pub fn with_record_type_field(mut self, record_type_field: RecordTypeField) -> Self {
        self.record_type_field = Some(record_type_field);
        self
    }

    /// Sets the field processing section.
    pub fn with_field_processing(mut self, field_processing: FieldProcessing) -> Self {
        self.field_processing = field_processing;
        self
    }

    /// Sets the layout generation section.
    pub fn with_layout_generation(mut self, layout_generation: LayoutGeneration) -> Self {
        self.layout_generation = layout_generation;
        self
    }

    /// Sets the validation section.
    pub fn with_validation(mut self, validation: Validation) -> Self {
        self.validation = validation;
        self
    }

    pub fn rule_type(&self) -> &str {
        &self.rule_type
    }

    pub fn record_type_field(&self) -> Option<&RecordTypeField> {
        self.record_type_field.as_ref()
    }

    pub fn field_processing(&self) -> &FieldProcessing {
        &self.field_processing
    }

    pub fn layout_generation(&self) -> &LayoutGeneration {
        &self.layout_generation
    }

    pub fn validation(&self) -> &Validation {
        &self.validation
    }

    /// Returns the fallback record type label.
    pub fn default_type(&self) -> &str {
        self.record_type_field
            .as_ref()
            .map_or(DEFAULT_RECORD_TYPE, RecordTypeField::default_type)
    }
}

/// Parameters of the record type classification strategy.
///
/// Which parameters are required depends on the rule type; the rule
/// interpreter reports missing ones.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecordTypeField {
    /// 1-based column of the discriminator.
    start: Option<i64>,
    /// Width of the discriminator in characters.
    length: Option<i64>,
    /// Discriminator value to record type mapping.
    values: BTreeMap<String, String>,
    default_type: String,
    trim_values: bool,
    ignore_case: bool,
    case_sensitive: bool,
    valid_characters: Option<Vec<String>>,
    conditional_logic: Option<String>,
    conditional_expression: Option<String>,
    conditional_mappings: BTreeMap<String, String>,
    pattern: Option<String>,
    pattern_mappings: BTreeMap<String, String>,
    multi_field_rules: Vec<MultiFieldRule>,
}

impl Default for RecordTypeField {
    fn default() -> Self {
        Self {
            start: None,
            length: None,
            values: BTreeMap::new(),
            default_type: DEFAULT_RECORD_TYPE.to_string(),
            trim_values: true,
            ignore_case: false,
            case_sensitive: false,
            valid_characters: None,
            conditional_logic: None,
            conditional_expression: None,
            conditional_mappings: BTreeMap::new(),
            pattern: None,
            pattern_mappings: BTreeMap::new(),
            multi_field_rules: Vec::new(),
        }
    }
}

impl RecordTypeField {
    /// Sets the discriminator column and width.
    pub fn with_position(mut self, start: i64, length: i64) -> Self {
        self.start = Some(start);
        self.length = Some(length);
        self
    }

    /// Adds a discriminator value mapping.
    pub fn with_value(mut self, key: impl Into<String>, record_type: impl Into<String>) -> Self {
        self.values.insert(key.into(), record_type.into());
        self
    }

    /// Sets the fallback record type.
    pub fn with_default_type(mut self, default_type: impl Into<String>) -> Self {
        self.default_type = default_type.into();
        self
    }

    /// Sets the regular expression and its capture mappings.
    pub fn with_pattern(
        mut self,
        pattern: impl Into<String>,
        mappings: impl IntoIterator<Item = (String, String)>,
    ) -> Self {
        self.pattern = Some(pattern.into());
        self.pattern_mappings.extend(mappings);
        self
    }

    /// Sets the conditional expression.
    pub fn with_conditional_expression(mut self, expression: impl Into<String>) -> Self {
        self.conditional_expression = Some(expression.into());
        self
    }

    /// Appends a multi-field sub-rule.
    pub fn with_multi_field_rule(mut self, rule: MultiFieldRule) -> Self {
        self.multi_field_rules.push(rule);
        self
    }

    pub fn start(&self) -> Option<i64> {
        self.start
    }

    pub fn length(&self) -> Option<i64> {
        self.length
    }

    pub fn values(&self) -> &BTreeMap<String, String> {
        &self.values
    }

    pub fn default_type(&self) -> &str {
        &self.default_type
    }

    pub fn trim_values(&self) -> bool {
        self.trim_values
    }

    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    pub fn case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn valid_characters(&self) -> Option<&[String]> {
        self.valid_characters.as_deref()
    }

    pub fn conditional_logic(&self) -> Option<&str> {
        self.conditional_logic.as_deref()
    }

    pub fn conditional_expression(&self) -> Option<&str> {
        self.conditional_expression.as_deref()
    }

    pub fn conditional_mappings(&self) -> &BTreeMap<String, String> {
        &self.conditional_mappings
    }

    pub fn pattern(&self) -> Option<&str> {
        self.pattern.as_deref()
    }

    pub fn pattern_mappings(&self) -> &BTreeMap<String, String> {
        &self.pattern_mappings
    }

    pub fn multi_field_rules(&self) -> &[MultiFieldRule] {
        &self.multi_field_rules
    }
}

/// One sub-rule of the multi-field strategy.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MultiFieldRule {
    name: Option<String>,
    start: Option<i64>,
    length: Option<i64>,
    expected_value: Option<String>,
    record_type: Option<String>,
}

impl MultiFieldRule {
    pub fn new(
        start: i64,
        length: i64,
        expected_value: impl Into<String>,
        record_type: impl Into<String>,
    ) -> Self {
        Self {
            name: None,
            start: Some(start),
            length: Some(length),
            expected_value: Some(expected_value.into()),
            record_type: Some(record_type.into()),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn start(&self) -> Option<i64> {
        self.start
    }

    pub fn length(&self) -> Option<i64> {
        self.length
    }

    pub fn expected_value(&self) -> Option<&str> {
        self.expected_value.as_deref()
    }

    pub fn record_type(&self) -> Option<&str> {
        self.record_type.as_deref()
    }
}

/// Level designations, usage mappings and field naming.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FieldProcessing {
    record_levels: Vec<u32>,
    group_levels: Vec<u32>,
    elementary_levels: Vec<u32>,
    condition_levels: Vec<u32>,
    include_fillers: bool,
    process_conditions: bool,
    process_redefines: bool,
    /// One of `original`, `uppercase`, `lowercase`, `camelCase`.
    naming_convention: String,
    /// USAGE keyword to encoding name.
    usage_mappings: BTreeMap<String, String>,
    /// Source field name to output name.
    field_name_mappings: BTreeMap<String, String>,
    exclude_field_names: Vec<String>,
}

impl Default for FieldProcessing {
    fn default() -> Self {
        Self {
            record_levels: vec![1],
            group_levels: vec![5, 10, 15, 20, 25],
            elementary_levels: vec![30, 35, 40, 45, 49],
            condition_levels: vec![88],
            include_fillers: false,
            process_conditions: true,
            process_redefines: true,
            naming_convention: "original".to_string(),
            usage_mappings: default_usage_mappings(),
            field_name_mappings: BTreeMap::new(),
            exclude_field_names: Vec::new(),
        }
    }
}

fn default_usage_mappings() -> BTreeMap<String, String> {
    [
        ("COMP", "binary"),
        ("COMP-1", "float"),
        ("COMP-2", "double"),
        ("COMP-3", "packed_decimal"),
        ("COMP-4", "binary"),
        ("COMP-5", "native_binary"),
        ("COMPUTATIONAL", "binary"),
        ("COMPUTATIONAL-1", "float"),
        ("COMPUTATIONAL-2", "double"),
        ("COMPUTATIONAL-3", "packed_decimal"),
        ("COMPUTATIONAL-4", "binary"),
        ("COMPUTATIONAL-5", "native_binary"),
        ("DISPLAY", "character"),
        ("PACKED-DECIMAL", "packed_decimal"),
        ("BINARY", "binary"),
    ]
    .into_iter()
    .map(|(usage, encoding)| (usage.to_string(), encoding.to_string()))
    .collect()
}

impl FieldProcessing {
    /// Keeps FILLER fields in the produced layouts.
    pub fn with_include_fillers(mut self, include_fillers: bool) -> Self {
        self.include_fillers = include_fillers;
        self
    }

    /// Sets the output naming convention.
    pub fn with_naming_convention(mut self, naming_convention: impl Into<String>) -> Self {
        self.naming_convention = naming_convention.into();
        self
    }

    /// Adds or replaces a usage mapping.
    pub fn with_usage_mapping(
        mut self,
        usage: impl Into<String>,
        encoding: impl Into<String>,
    ) -> Self {
        self.usage_mappings.insert(usage.into(), encoding.into());
        self
    }

    pub fn record_levels(&self) -> &[u32] {
        &self.record_levels
    }

    pub fn group_levels(&self) -> &[u32] {
        &self.group_levels
    }

    pub fn elementary_levels(&self) -> &[u32] {
        &self.elementary_levels
    }

    pub fn condition_levels(&self) -> &[u32] {
        &self.condition_levels
    }

    pub fn include_fillers(&self) -> bool {
        self.include_fillers
    }

    pub fn process_conditions(&self) -> bool {
        self.process_conditions
    }

    pub fn process_redefines(&self) -> bool {
        self.process_redefines
    }

    pub fn naming_convention(&self) -> &str {
        &self.naming_convention
    }

    pub fn usage_mappings(&self) -> &BTreeMap<String, String> {
        &self.usage_mappings
    }

    pub fn field_name_mappings(&self) -> &BTreeMap<String, String> {
        &self.field_name_mappings
    }

    pub fn exclude_field_names(&self) -> &[String] {
        &self.exclude_field_names
    }
}

/// Layout strategy, naming template and start position.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutGeneration {
    /// One of `single_layout`, `multi_layout`, `custom`.
    strategy: String,
    /// Layout name template with `{record_type}` and `{01_level_name}`.
    naming_convention: String,
    start_position: i64,
    include_record_type: bool,
    allow_overlaps: bool,
}

impl Default for LayoutGeneration {
    fn default() -> Self {
        Self {
            strategy: "multi_layout".to_string(),
            naming_convention: "{record_type}_{01_level_name}".to_string(),
            start_position: 1,
            include_record_type: true,
            allow_overlaps: false,
        }
    }
}

impl LayoutGeneration {
    pub fn with_strategy(mut self, strategy: impl Into<String>) -> Self {
        self.strategy = strategy.into();
        self
    }

    pub fn with_start_position(mut self, start_position: i64) -> Self {
        self.start_position = start_position;
        self
    }

    pub fn with_include_record_type(mut self, include_record_type: bool) -> Self {
        self.include_record_type = include_record_type;
        self
    }

    pub fn with_allow_overlaps(mut self, allow_overlaps: bool) -> Self {
        self.allow_overlaps = allow_overlaps;
        self
    }

    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    pub fn naming_convention(&self) -> &str {
        &self.naming_convention
    }

    pub fn start_position(&self) -> i64 {
        self.start_position
    }

    pub fn include_record_type(&self) -> bool {
        self.include_record_type
    }

    pub fn allow_overlaps(&self) -> bool {
        self.allow_overlaps
    }
}

/// Structural validation switches.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Validation {
    /// Promotes overlap and unresolved REDEFINES findings to errors.
    strict_mode: bool,
    validate_field_overlaps: bool,
    validate_redefines: bool,
    /// Requires every record type to have the same total length.
    uniform_record_length: bool,
}

impl Default for Validation {
    fn default() -> Self {
        Self {
            strict_mode: false,
            validate_field_overlaps: true,
            validate_redefines: true,
            uniform_record_length: false,
        }
    }
}

impl Validation {
    pub fn with_strict_mode(mut self, strict_mode: bool) -> Self {
        self.strict_mode = strict_mode;
        self
    }

    pub fn with_uniform_record_length(mut self, uniform_record_length: bool) -> Self {
        self.uniform_record_length = uniform_record_length;
        self
    }

    pub fn strict_mode(&self) -> bool {
        self.strict_mode
    }

    pub fn validate_field_overlaps(&self) -> bool {
        self.validate_field_overlaps
    }

    pub fn validate_redefines(&self) -> bool {
        self.validate_redefines
    }

    pub fn uniform_record_length(&self) -> bool {
        self.uniform_record_length
    }
}
