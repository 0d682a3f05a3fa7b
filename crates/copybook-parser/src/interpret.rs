//! Rule interpretation.
//!
//! Turns a loosely typed [`RulesConfig`] into [`Rules`]: a closed
//! [`ClassificationStrategy`], a resolved [`UsageTable`] and the layout
//! options. Every check fails fast with a [`ConfigError`]; nothing is
//! defaulted silently.

use std::collections::{BTreeMap, HashMap};

use log::{debug, warn};
use regex::Regex;
use thiserror::Error;
use winnow::{
    Parser as _,
    ascii::Caseless,
    combinator::{alt, delimited, eof, opt, preceded, repeat},
    error::{ContextError, ErrMode},
    token::{any, literal, one_of, take_while},
};

use copybook_core::{
    config::{RecordTypeField, RulesConfig},
    field::Encoding,
};

use crate::classify::{
    Branch, CharacterRule, ClassificationStrategy, ConditionalRule, FieldMatch, MultiFieldRule,
    PatternRule, PositionRule,
};

type Input<'src> = &'src str;
type IResult<O> = std::result::Result<O, ErrMode<ContextError>>;

/// Invalid rule configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("unsupported rule type `{0}`")]
    UnsupportedStrategy(String),

    #[error("{rule_type} rules require a [record_type_field] section")]
    MissingSection { rule_type: String },

    #[error("{strategy} rules require `{parameter}`")]
    MissingParameter {
        strategy: &'static str,
        parameter: String,
    },

    #[error("invalid `{parameter}`: {reason}")]
    InvalidParameter { parameter: String, reason: String },

    #[error("at least one record level must be specified")]
    NoRecordLevels,

    #[error("level {0} is designated both as a condition level and as a data level")]
    ConflictingLevels(u32),

    #[error("usage `{usage}` maps to unknown encoding `{encoding}`")]
    UnknownEncoding { usage: String, encoding: String },

    #[error("unknown naming convention `{0}`")]
    UnknownNamingConvention(String),

    #[error("start position cannot be negative, got {0}")]
    NegativeStartPosition(i64),

    #[error("invalid layout strategy `{0}`")]
    UnsupportedLayoutStrategy(String),

    #[error("invalid pattern: {0}")]
    InvalidPattern(String),
}

/// USAGE keyword to storage encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageTable {
    encodings: HashMap<String, Encoding>,
}

impl UsageTable {
    /// Builds the table, rejecting encodings that are not known.
    pub fn new(mappings: &BTreeMap<String, String>) -> Result<Self, ConfigError> {
        let encodings = mappings
            .iter()
            .map(|(usage, encoding)| {
                encoding
                    .parse::<Encoding>()
                    .map(|parsed| (usage.to_ascii_uppercase(), parsed))
                    .map_err(|_| ConfigError::UnknownEncoding {
                        usage: usage.clone(),
                        encoding: encoding.clone(),
                    })
            })
            .collect::<Result<_, _>>()?;
        Ok(Self { encodings })
    }

    /// Returns the encoding for `usage`.
    ///
    /// A missing usage means DISPLAY; an unmapped usage returns `None`.
    pub fn resolve(&self, usage: Option<&str>) -> Option<Encoding> {
        match usage {
            None => Some(Encoding::Character),
            Some(usage) => self.encodings.get(&usage.to_ascii_uppercase()).copied(),
        }
    }
}

/// How classified lines are grouped into layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutStrategy {
    /// All lines form one layout.
    Single,
    /// One layout per record type.
    Multi,
    /// Reserved for user-defined grouping; currently grouped like [`LayoutStrategy::Multi`].
    Custom,
}

impl LayoutStrategy {
    fn parse(name: &str) -> Result<Self, ConfigError> {
        match name {
            "single_layout" => Ok(LayoutStrategy::Single),
            "multi_layout" => Ok(LayoutStrategy::Multi),
            "custom" => Ok(LayoutStrategy::Custom),
            other => Err(ConfigError::UnsupportedLayoutStrategy(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LayoutStrategy::Single => "single_layout",
            LayoutStrategy::Multi => "multi_layout",
            LayoutStrategy::Custom => "custom",
        }
    }
}

/// Output name style for fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingConvention {
    Original,
    Uppercase,
    Lowercase,
    CamelCase,
}

impl NamingConvention {
    fn parse(name: &str) -> Result<Self, ConfigError> {
        match name {
            "original" => Ok(NamingConvention::Original),
            "uppercase" => Ok(NamingConvention::Uppercase),
            "lowercase" => Ok(NamingConvention::Lowercase),
            "camelCase" => Ok(NamingConvention::CamelCase),
            other => Err(ConfigError::UnknownNamingConvention(other.to_string())),
        }
    }

    /// Renders `name` in this convention: `CUSTOMER-NAME` becomes
    /// `customerName` in camel case.
    pub fn apply(&self, name: &str) -> String {
        match self {
            NamingConvention::Original => name.to_string(),
            NamingConvention::Uppercase => name.to_uppercase(),
            NamingConvention::Lowercase => name.to_lowercase(),
            NamingConvention::CamelCase => name
                .split(['-', '_'])
                .filter(|part| !part.is_empty())
                .enumerate()
                .map(|(index, part)| {
                    let lower = part.to_lowercase();
                    if index == 0 {
                        return lower;
                    }
                    let mut chars = lower.chars();
                    match chars.next() {
                        Some(first) => first.to_uppercase().chain(chars).collect(),
                        None => String::new(),
                    }
                })
                .collect(),
        }
    }
}

/// Interpreted rules, ready to drive classification and layout.
#[derive(Debug, Clone)]
pub struct Rules {
    strategy: ClassificationStrategy,
    fallback: String,
    usage: UsageTable,
    layout_strategy: LayoutStrategy,
    naming: NamingConvention,
    start_position: usize,
    config: RulesConfig,
}

impl Rules {
    pub fn strategy(&self) -> &ClassificationStrategy {
        &self.strategy
    }

    /// Record type for lines that match no rule.
    pub fn fallback(&self) -> &str {
        &self.fallback
    }

    pub fn usage(&self) -> &UsageTable {
        &self.usage
    }

    pub fn layout_strategy(&self) -> LayoutStrategy {
        self.layout_strategy
    }

    pub fn naming(&self) -> NamingConvention {
        self.naming
    }

    /// Position of the first byte of a record.
    pub fn start_position(&self) -> usize {
        self.start_position
    }

    /// Bytes reserved for the record type discriminator at the start of a
    /// record; zero unless `include_record_type` is set.
    pub fn discriminator_width(&self) -> usize {
        if self.config.layout_generation().include_record_type() {
            self.strategy.discriminator_width()
        } else {
            0
        }
    }

    /// The configuration these rules were interpreted from.
    pub fn config(&self) -> &RulesConfig {
        &self.config
    }
}

/// Checks `config` without keeping the interpreted rules.
///
/// # Errors
///
/// Returns the first [`ConfigError`] found.
pub fn validate(config: &RulesConfig) -> Result<(), ConfigError> {
    interpret(config).map(|_| ())
}

/// Validates `config` and converts it into [`Rules`].
///
/// # Errors
///
/// Returns the first [`ConfigError`] found.
pub fn interpret(config: &RulesConfig) -> Result<Rules, ConfigError> {
    debug!(rule_type = config.rule_type(); "Interpreting rules");

    let strategy = interpret_strategy(config)?;

    let processing = config.field_processing();
    if processing.record_levels().is_empty() {
        return Err(ConfigError::NoRecordLevels);
    }
    let data_levels = processing
        .record_levels()
        .iter()
        .chain(processing.group_levels())
        .chain(processing.elementary_levels());
    for level in data_levels {
        if processing.condition_levels().contains(level) {
            return Err(ConfigError::ConflictingLevels(*level));
        }
    }
    let usage = UsageTable::new(processing.usage_mappings())?;
    let naming = NamingConvention::parse(processing.naming_convention())?;

    let generation = config.layout_generation();
    let start_position = usize::try_from(generation.start_position())
        .map_err(|_| ConfigError::NegativeStartPosition(generation.start_position()))?;
    let layout_strategy = LayoutStrategy::parse(generation.strategy())?;
    if layout_strategy == LayoutStrategy::Custom {
        warn!("Layout strategy `custom` groups records like `multi_layout`");
    }

    let rules = Rules {
        strategy,
        fallback: config.default_type().to_string(),
        usage,
        layout_strategy,
        naming,
        start_position,
        config: config.clone(),
    };
    debug!(
        strategy = rules.strategy.name(),
        layout = rules.layout_strategy.as_str(),
        start_position = rules.start_position;
        "Rules interpreted"
    );
    Ok(rules)
}

fn interpret_strategy(config: &RulesConfig) -> Result<ClassificationStrategy, ConfigError> {
    let rule_type = config.rule_type().to_ascii_lowercase();
    let section = || {
        config
            .record_type_field()
            .ok_or_else(|| ConfigError::MissingSection {
                rule_type: rule_type.clone(),
            })
    };

    match rule_type.as_str() {
        "position-based" => position_rule(section()?).map(ClassificationStrategy::Position),
        "character-based" => character_rule(section()?).map(ClassificationStrategy::Character),
        "conditional-based" => {
            conditional_rule(section()?).map(ClassificationStrategy::Conditional)
        }
        "pattern-based" => pattern_rule(section()?).map(ClassificationStrategy::Pattern),
        "multi-field" => multi_field_rule(section()?).map(ClassificationStrategy::MultiField),
        "no-record-type" => Ok(ClassificationStrategy::None),
        _ => Err(ConfigError::UnsupportedStrategy(config.rule_type().to_string())),
    }
}

fn required(
    value: Option<i64>,
    strategy: &'static str,
    parameter: &str,
) -> Result<usize, ConfigError> {
    let value = value.ok_or_else(|| ConfigError::MissingParameter {
        strategy,
        parameter: parameter.to_string(),
    })?;
    positive(value, parameter)
}

fn positive(value: i64, parameter: &str) -> Result<usize, ConfigError> {
    usize::try_from(value)
        .ok()
        .filter(|&value| value >= 1)
        .ok_or_else(|| ConfigError::InvalidParameter {
            parameter: parameter.to_string(),
            reason: format!("must be at least 1, got {value}"),
        })
}

fn position_rule(field: &RecordTypeField) -> Result<PositionRule, ConfigError> {
    const STRATEGY: &str = "position-based";
    let start = required(field.start(), STRATEGY, "start")?;
    let length = required(field.length(), STRATEGY, "length")?;
    if field.values().is_empty() {
        return Err(ConfigError::MissingParameter {
            strategy: STRATEGY,
            parameter: "values".to_string(),
        });
    }
    Ok(PositionRule::new(start, length, field.values().clone())
        .with_trim_values(field.trim_values())
        .with_ignore_case(field.ignore_case()))
}

fn character_rule(field: &RecordTypeField) -> Result<CharacterRule, ConfigError> {
    const STRATEGY: &str = "character-based";
    let start = required(field.start(), STRATEGY, "start")?;
    if field.values().is_empty() && field.valid_characters().is_none() {
        return Err(ConfigError::MissingParameter {
            strategy: STRATEGY,
            parameter: "values or valid_characters".to_string(),
        });
    }
    Ok(CharacterRule::new(
        start,
        field.values().clone(),
        field.valid_characters().map(<[String]>::to_vec),
        field.case_sensitive(),
    ))
}

fn conditional_rule(field: &RecordTypeField) -> Result<ConditionalRule, ConfigError> {
    let start = match field.start() {
        Some(start) => positive(start, "start")?,
        None => 1,
    };
    let expression = field
        .conditional_expression()
        .or(field.conditional_logic())
        .ok_or_else(|| ConfigError::MissingParameter {
            strategy: "conditional-based",
            parameter: "conditional_expression or conditional_logic".to_string(),
        })?;

    let (branches, otherwise) = match parse_conditional(expression) {
        Some(parsed) => parsed,
        None => {
            warn!(
                expression = expression;
                "Conditional expression not understood, every line falls back"
            );
            (Vec::new(), None)
        }
    };
    let branches = branches
        .into_iter()
        .map(|(character, label)| {
            let label = label
                .or_else(|| field.conditional_mappings().get(&character.to_string()).cloned())
                .unwrap_or_else(|| character.to_string());
            Branch::new(character, label)
        })
        .collect();

    Ok(ConditionalRule::new(
        start,
        branches,
        otherwise,
        field.case_sensitive(),
    ))
}

fn pattern_rule(field: &RecordTypeField) -> Result<PatternRule, ConfigError> {
    const STRATEGY: &str = "pattern-based";
    let pattern = field
        .pattern()
        .filter(|pattern| !pattern.is_empty())
        .ok_or_else(|| ConfigError::MissingParameter {
            strategy: STRATEGY,
            parameter: "pattern".to_string(),
        })?;
    let regex = Regex::new(pattern).map_err(|err| ConfigError::InvalidPattern(err.to_string()))?;
    if field.pattern_mappings().is_empty() {
        return Err(ConfigError::MissingParameter {
            strategy: STRATEGY,
            parameter: "pattern_mappings".to_string(),
        });
    }
    Ok(PatternRule::new(regex, field.pattern_mappings().clone()))
}

fn multi_field_rule(field: &RecordTypeField) -> Result<MultiFieldRule, ConfigError> {
    const STRATEGY: &str = "multi-field";
    if field.multi_field_rules().is_empty() {
        return Err(ConfigError::MissingParameter {
            strategy: STRATEGY,
            parameter: "multi_field_rules".to_string(),
        });
    }

    let matches = field
        .multi_field_rules()
        .iter()
        .enumerate()
        .map(|(index, rule)| {
            let parameter = |name: &str| format!("multi_field_rules[{index}].{name}");
            let missing = |name: &str| ConfigError::MissingParameter {
                strategy: STRATEGY,
                parameter: parameter(name),
            };
            let start = required(rule.start(), STRATEGY, &parameter("start"))?;
            let length = required(rule.length(), STRATEGY, &parameter("length"))?;
            let expected = rule.expected_value().ok_or_else(|| missing("expected_value"))?;
            let record_type = rule.record_type().ok_or_else(|| missing("record_type"))?;
            Ok::<_, ConfigError>(FieldMatch::new(start, length, expected, record_type))
        })
        .collect::<Result<Vec<_>, ConfigError>>()?;

    Ok(MultiFieldRule::new(matches, field.trim_values()))
}

fn ws(input: &mut Input<'_>) -> IResult<()> {
    take_while(0.., char::is_whitespace)
        .void()
        .parse_next(input)
}

fn label<'src>(input: &mut Input<'src>) -> IResult<&'src str> {
    take_while(1.., |c: char| c.is_alphanumeric() || c == '-' || c == '_')
        .verify(|word: &str| {
            !word.eq_ignore_ascii_case("else") && !word.eq_ignore_ascii_case("if")
        })
        .parse_next(input)
}

fn character_literal(input: &mut Input<'_>) -> IResult<char> {
    alt((
        delimited('\'', any, '\''),
        delimited('"', any, '"'),
    ))
    .parse_next(input)
}

/// `[if] (char | {char}) == 'c' [then | -> | ?] [LABEL]`
fn branch(input: &mut Input<'_>) -> IResult<(char, Option<String>)> {
    let _ = (ws, opt((literal(Caseless("if")), ws))).parse_next(input)?;
    let _ = alt((literal("{char}"), literal(Caseless("char")))).parse_next(input)?;
    let _ = (ws, literal("=="), ws).parse_next(input)?;
    let character = character_literal.parse_next(input)?;
    let _ = opt((
        ws,
        alt((literal(Caseless("then")), literal("->"), literal("?"))),
    ))
    .parse_next(input)?;
    let target = opt(preceded(ws, label)).parse_next(input)?;
    Ok((character, target.map(str::to_string)))
}

fn separator(input: &mut Input<'_>) -> IResult<()> {
    (
        ws,
        alt((literal(Caseless("else")).void(), one_of([';', ',', ':']).void())),
    )
        .void()
        .parse_next(input)
}

type ParsedConditional = (Vec<(char, Option<String>)>, Option<String>);

fn conditional(input: &mut Input<'_>) -> IResult<ParsedConditional> {
    let first = branch.parse_next(input)?;
    let rest: Vec<_> = repeat(0.., preceded(separator, branch)).parse_next(input)?;
    let otherwise = opt(preceded(
        (
            ws,
            opt(one_of([';', ',', ':'])),
            ws,
            literal(Caseless("else")),
            ws,
        ),
        label,
    ))
    .parse_next(input)?;
    let _ = (ws, eof).parse_next(input)?;

    let mut branches = vec![first];
    branches.extend(rest);
    Ok((branches, otherwise.map(str::to_string)))
}

/// Parses a conditional expression into its branches and final `else` label.
///
/// Returns `None` when the expression does not follow the grammar.
pub fn parse_conditional(expression: &str) -> Option<ParsedConditional> {
    let mut input = expression;
    conditional.parse_next(&mut input).ok()
}

#[cfg(test)]
mod tests {
    use copybook_core::config::{
        FieldProcessing, LayoutGeneration, MultiFieldRule as MultiFieldConfig,
    };

    use super::*;

    fn position_config() -> RulesConfig {
        RulesConfig::new("position-based").with_record_type_field(
            RecordTypeField::default()
                .with_position(1, 2)
                .with_value("HD", "HEADER")
                .with_value("TR", "TRAILER"),
        )
    }

    fn parse(text: &str) -> RulesConfig {
        toml::from_str(text).expect("config should parse")
    }

    #[test]
    fn test_default_config_is_valid() {
        let rules = interpret(&RulesConfig::default()).expect("default rules");

        assert!(matches!(rules.strategy(), ClassificationStrategy::None));
        assert_eq!(rules.fallback(), "DATA");
        assert_eq!(rules.start_position(), 1);
        assert_eq!(rules.layout_strategy(), LayoutStrategy::Multi);
        assert_eq!(rules.naming(), NamingConvention::Original);
        assert_eq!(rules.discriminator_width(), 0);
    }

    #[test]
    fn test_position_rules() {
        let rules = interpret(&position_config()).expect("valid rules");

        assert_eq!(rules.strategy().name(), "position-based");
        assert_eq!(rules.discriminator_width(), 2);
        assert_eq!(rules.strategy().classify("HD..."), Some("HEADER".to_string()));
    }

    #[test]
    fn test_discriminator_width_needs_include_record_type() {
        let config = position_config()
            .with_layout_generation(LayoutGeneration::default().with_include_record_type(false));

        assert_eq!(interpret(&config).expect("valid").discriminator_width(), 0);
    }

    #[test]
    fn test_unsupported_rule_type() {
        assert_eq!(
            validate(&RulesConfig::new("magic")).unwrap_err(),
            ConfigError::UnsupportedStrategy("magic".to_string())
        );
    }

    #[test]
    fn test_rule_type_is_case_insensitive() {
        assert!(validate(&RulesConfig::new("No-Record-Type")).is_ok());
    }

    #[test]
    fn test_missing_section() {
        assert!(matches!(
            validate(&RulesConfig::new("position-based")),
            Err(ConfigError::MissingSection { .. })
        ));
    }

    #[test]
    fn test_position_parameter_checks() {
        let missing = parse(
            r#"
            rule_type = "position-based"
            [record_type_field]
            start = 1
            [record_type_field.values]
            HD = "HEADER"
            "#,
        );
        assert!(matches!(
            validate(&missing),
            Err(ConfigError::MissingParameter { parameter, .. }) if parameter == "length"
        ));

        let zero = parse(
            r#"
            rule_type = "position-based"
            [record_type_field]
            start = 0
            length = 2
            [record_type_field.values]
            HD = "HEADER"
            "#,
        );
        assert!(matches!(
            validate(&zero),
            Err(ConfigError::InvalidParameter { parameter, .. }) if parameter == "start"
        ));

        let no_values = parse(
            r#"
            rule_type = "position-based"
            [record_type_field]
            start = 1
            length = 2
            "#,
        );
        assert!(matches!(
            validate(&no_values),
            Err(ConfigError::MissingParameter { parameter, .. }) if parameter == "values"
        ));
    }

    #[test]
    fn test_character_rules_need_values_or_valid_characters() {
        let config = parse(
            r#"
            rule_type = "character-based"
            [record_type_field]
            start = 1
            "#,
        );
        assert!(matches!(
            validate(&config),
            Err(ConfigError::MissingParameter { .. })
        ));

        let config = parse(
            r#"
            rule_type = "character-based"
            [record_type_field]
            start = 1
            valid_characters = ["H", "D"]
            "#,
        );
        let rules = interpret(&config).expect("valid rules");
        assert_eq!(rules.strategy().classify("D..."), Some("D".to_string()));
    }

    #[test]
    fn test_pattern_rules() {
        let config = RulesConfig::new("pattern-based").with_record_type_field(
            RecordTypeField::default()
                .with_pattern("^(HD|TR)", [("HD".to_string(), "HEADER".to_string())]),
        );
        let rules = interpret(&config).expect("valid rules");
        assert_eq!(rules.strategy().classify("HD-1"), Some("HEADER".to_string()));
        assert_eq!(rules.discriminator_width(), 0);

        let invalid = RulesConfig::new("pattern-based").with_record_type_field(
            RecordTypeField::default().with_pattern("(", [("A".to_string(), "B".to_string())]),
        );
        assert!(matches!(
            validate(&invalid),
            Err(ConfigError::InvalidPattern(_))
        ));

        let unmapped = RulesConfig::new("pattern-based")
            .with_record_type_field(RecordTypeField::default().with_pattern("^HD", []));
        assert!(matches!(
            validate(&unmapped),
            Err(ConfigError::MissingParameter { parameter, .. }) if parameter == "pattern_mappings"
        ));
    }

    #[test]
    fn test_multi_field_rules() {
        let config = RulesConfig::new("multi-field").with_record_type_field(
            RecordTypeField::default()
                .with_multi_field_rule(MultiFieldConfig::new(1, 2, "HD", "HEADER"))
                .with_multi_field_rule(MultiFieldConfig::new(3, 4, "X", "OTHER")),
        );
        let rules = interpret(&config).expect("valid rules");
        assert_eq!(rules.discriminator_width(), 4);
        assert_eq!(rules.strategy().classify("HD"), Some("HEADER".to_string()));

        let empty = RulesConfig::new("multi-field").with_record_type_field(RecordTypeField::default());
        assert!(matches!(
            validate(&empty),
            Err(ConfigError::MissingParameter { .. })
        ));

        let incomplete = parse(
            r#"
            rule_type = "multi-field"
            [[record_type_field.multi_field_rules]]
            start = 1
            length = 2
            record_type = "HEADER"
            "#,
        );
        assert!(matches!(
            validate(&incomplete),
            Err(ConfigError::MissingParameter { parameter, .. })
                if parameter == "multi_field_rules[0].expected_value"
        ));
    }

    #[test]
    fn test_conditional_rules() {
        let config = parse(
            r#"
            rule_type = "conditional-based"
            [record_type_field]
            conditional_logic = "if char == 'H' then HEADER else DATA"
            conditional_expression = "{char} == 'T'"
            [record_type_field.conditional_mappings]
            T = "TRAILER"
            "#,
        );
        let rules = interpret(&config).expect("valid rules");

        // The expression takes precedence over the logic.
        assert_eq!(rules.strategy().classify("T..."), Some("TRAILER".to_string()));
        assert_eq!(rules.strategy().classify("H..."), None);
        assert_eq!(rules.discriminator_width(), 1);
    }

    #[test]
    fn test_conditional_requires_logic_or_expression() {
        let config =
            RulesConfig::new("conditional-based").with_record_type_field(RecordTypeField::default());

        assert!(matches!(
            validate(&config),
            Err(ConfigError::MissingParameter { .. })
        ));
    }

    #[test]
    fn test_unparseable_conditional_falls_back() {
        let config = RulesConfig::new("conditional-based").with_record_type_field(
            RecordTypeField::default().with_conditional_expression("line.length > 80"),
        );
        let rules = interpret(&config).expect("still valid");

        assert_eq!(rules.strategy().classify("H..."), None);
    }

    #[test]
    fn test_parse_conditional_forms() {
        assert_eq!(
            parse_conditional("if char == 'H' then HEADER else DATA"),
            Some((vec![('H', Some("HEADER".to_string()))], Some("DATA".to_string())))
        );
        assert_eq!(
            parse_conditional(
                "char == 'H' -> HEADER; char == 'T' -> TRAILER; else DETAIL"
            ),
            Some((
                vec![
                    ('H', Some("HEADER".to_string())),
                    ('T', Some("TRAILER".to_string()))
                ],
                Some("DETAIL".to_string())
            ))
        );
        assert_eq!(
            parse_conditional(
                "IF CHAR == \"H\" THEN HEADER ELSE IF CHAR == 'T' THEN TRAILER"
            ),
            Some((
                vec![
                    ('H', Some("HEADER".to_string())),
                    ('T', Some("TRAILER".to_string()))
                ],
                None
            ))
        );
        assert_eq!(
            parse_conditional("{char} == 'T'"),
            Some((vec![('T', None)], None))
        );
        assert_eq!(parse_conditional("char == H"), None);
        assert_eq!(parse_conditional("char == 'H' then HEADER trailing junk"), None);
    }

    #[test]
    fn test_field_processing_checks() {
        let no_levels = parse(
            r#"
            [field_processing]
            record_levels = []
            "#,
        );
        assert_eq!(validate(&no_levels), Err(ConfigError::NoRecordLevels));

        let conflicting = parse(
            r#"
            [field_processing]
            group_levels = [5, 88]
            "#,
        );
        assert_eq!(validate(&conflicting), Err(ConfigError::ConflictingLevels(88)));

        let unknown = RulesConfig::default().with_field_processing(
            FieldProcessing::default().with_usage_mapping("COMP-6", "zoned"),
        );
        assert_eq!(
            validate(&unknown),
            Err(ConfigError::UnknownEncoding {
                usage: "COMP-6".to_string(),
                encoding: "zoned".to_string()
            })
        );

        let naming = RulesConfig::default().with_field_processing(
            FieldProcessing::default().with_naming_convention("kebab"),
        );
        assert_eq!(
            validate(&naming),
            Err(ConfigError::UnknownNamingConvention("kebab".to_string()))
        );
    }

    #[test]
    fn test_layout_generation_checks() {
        let negative = RulesConfig::default()
            .with_layout_generation(LayoutGeneration::default().with_start_position(-1));
        assert_eq!(validate(&negative), Err(ConfigError::NegativeStartPosition(-1)));

        let strategy = RulesConfig::default()
            .with_layout_generation(LayoutGeneration::default().with_strategy("stacked"));
        assert_eq!(
            validate(&strategy),
            Err(ConfigError::UnsupportedLayoutStrategy("stacked".to_string()))
        );

        let custom = RulesConfig::default()
            .with_layout_generation(LayoutGeneration::default().with_strategy("custom"));
        assert_eq!(
            interpret(&custom).expect("valid").layout_strategy(),
            LayoutStrategy::Custom
        );
    }

    #[test]
    fn test_usage_table() {
        let table = UsageTable::new(FieldProcessing::default().usage_mappings()).expect("valid");

        assert_eq!(table.resolve(None), Some(Encoding::Character));
        assert_eq!(table.resolve(Some("comp-3")), Some(Encoding::PackedDecimal));
        assert_eq!(table.resolve(Some("COMPUTATIONAL-5")), Some(Encoding::NativeBinary));
        assert_eq!(table.resolve(Some("POINTER")), None);
    }

    #[test]
    fn test_naming_conventions() {
        assert_eq!(NamingConvention::Original.apply("Customer-Name"), "Customer-Name");
        assert_eq!(NamingConvention::Uppercase.apply("customer-name"), "CUSTOMER-NAME");
        assert_eq!(NamingConvention::Lowercase.apply("CUSTOMER-NAME"), "customer-name");
        assert_eq!(NamingConvention::CamelCase.apply("CUSTOMER-NAME"), "customerName");
        assert_eq!(NamingConvention::CamelCase.apply("WS-ORDER-2-TOTAL"), "wsOrder2Total");
        assert_eq!(NamingConvention::CamelCase.apply("AMOUNT"), "amount");
    }
}
