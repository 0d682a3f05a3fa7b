//! Grammar of data description entries.
//!
//! A data description entry starts with a two-digit level number and a data
//! name, followed by clauses in any order and an optional terminating period:
//!
//! ```text
//! 05 AMOUNT PIC S9(7)V99 COMP-3.
//! 05 ITEMS OCCURS 10 TIMES PIC X(4).
//! 88 IS-ACTIVE VALUE 'Y'.
//! ```
//!
//! Entries may span several physical lines. [`entries`] joins continuation
//! lines onto the entry they belong to; [`scan`] then parses one joined entry
//! into a [`FieldDescriptor`].

use std::ops::Range;

use winnow::{
    Parser as _,
    combinator::{alt, delimited, opt, preceded, repeat},
    error::{ContextError, ErrMode},
    token::take_while,
};

use copybook_core::field::FieldKind;

use crate::{
    error::{Diagnostic, ErrorCode},
    picture::{PictureInfo, analyze_picture},
    source::SourceLine,
    span::Span,
};

type Input<'src> = &'src str;
type IResult<O> = std::result::Result<O, ErrMode<ContextError>>;

/// USAGE keywords recognized without a preceding `USAGE`.
const USAGE_KEYWORDS: &[&str] = &[
    "BINARY",
    "COMP",
    "COMP-1",
    "COMP-2",
    "COMP-3",
    "COMP-4",
    "COMP-5",
    "COMPUTATIONAL",
    "COMPUTATIONAL-1",
    "COMPUTATIONAL-2",
    "COMPUTATIONAL-3",
    "COMPUTATIONAL-4",
    "COMPUTATIONAL-5",
    "DISPLAY",
    "PACKED-DECIMAL",
];

/// Floating point usages never carry a PICTURE.
const FLOAT_USAGES: &[&str] = &["COMP-1", "COMP-2", "COMPUTATIONAL-1", "COMPUTATIONAL-2"];

/// The parsed form of one data description entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    level: u8,
    name: String,
    kind: FieldKind,
    picture: Option<String>,
    picture_info: Option<PictureInfo>,
    usage: Option<String>,
    occurs: Option<u32>,
    redefines: Option<String>,
    value: Option<String>,
    span: Span,
}

impl FieldDescriptor {
    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// PICTURE string as written, upper-cased.
    pub fn picture(&self) -> Option<&str> {
        self.picture.as_deref()
    }

    pub fn picture_info(&self) -> Option<&PictureInfo> {
        self.picture_info.as_ref()
    }

    /// USAGE keyword, upper-cased.
    pub fn usage(&self) -> Option<&str> {
        self.usage.as_deref()
    }

    pub fn occurs(&self) -> Option<u32> {
        self.occurs
    }

    pub fn redefines(&self) -> Option<&str> {
        self.redefines.as_deref()
    }

    /// First VALUE literal with quotes removed.
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn is_filler(&self) -> bool {
        self.name.eq_ignore_ascii_case("FILLER")
    }

    pub fn span(&self) -> Span {
        self.span
    }
}

/// One data description entry joined from its physical lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    text: String,
    span: Span,
    line: usize,
}

impl Entry {
    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn span(&self) -> Span {
        self.span
    }

    /// 1-based line number the entry starts on.
    pub fn line(&self) -> usize {
        self.line
    }

    fn is_terminated(&self) -> bool {
        self.text.trim_end().ends_with('.')
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ClauseToken<'src> {
    Word(&'src str),
    Quoted(&'src str),
}

fn spaces0(input: &mut Input<'_>) -> IResult<()> {
    take_while(0.., char::is_whitespace)
        .void()
        .parse_next(input)
}

fn spaces1(input: &mut Input<'_>) -> IResult<()> {
    take_while(1.., char::is_whitespace)
        .void()
        .parse_next(input)
}

fn level_number<'src>(input: &mut Input<'src>) -> IResult<&'src str> {
    take_while(2, |c: char| c.is_ascii_digit()).parse_next(input)
}

fn data_name<'src>(input: &mut Input<'src>) -> IResult<&'src str> {
    take_while(1.., |c: char| c.is_ascii_alphanumeric() || c == '-')
        .verify(|name: &str| name.chars().any(|c| c.is_ascii_alphabetic()))
        .parse_next(input)
}

/// Level number and data name at the start of an entry.
fn entry_head<'src>(input: &mut Input<'src>) -> IResult<(&'src str, &'src str)> {
    (preceded(spaces0, level_number), preceded(spaces1, data_name)).parse_next(input)
}

fn quoted<'src>(input: &mut Input<'src>) -> IResult<&'src str> {
    alt((
        delimited('\'', take_while(0.., |c: char| c != '\''), opt('\'')),
        delimited('"', take_while(0.., |c: char| c != '"'), opt('"')),
    ))
    .parse_next(input)
}

fn bare_word<'src>(input: &mut Input<'src>) -> IResult<&'src str> {
    take_while(1.., |c: char| !c.is_whitespace() && c != '\'' && c != '"').parse_next(input)
}

fn clause_token<'src>(input: &mut Input<'src>) -> IResult<ClauseToken<'src>> {
    preceded(
        spaces0,
        alt((
            quoted.map(ClauseToken::Quoted),
            bare_word.map(ClauseToken::Word),
        )),
    )
    .parse_next(input)
}

fn clause_tokens<'src>(input: &mut Input<'src>) -> IResult<Vec<ClauseToken<'src>>> {
    repeat(0.., clause_token).parse_next(input)
}

/// Splits the level number and data name off `text`.
///
/// Returns the level digits, the name and the clause text that follows.
fn split_head(text: &str) -> Option<(&str, &str, &str)> {
    let mut input = text;
    let (level, name) = entry_head.parse_next(&mut input).ok()?;
    let boundary = input
        .chars()
        .next()
        .is_none_or(|c| c.is_whitespace() || c == '.');
    boundary.then_some((level, name, input))
}

/// Returns `true` if `text` starts a new data description entry.
pub fn starts_entry(text: &str) -> bool {
    split_head(text).is_some()
}

fn strip_period(word: &str) -> &str {
    word.strip_suffix('.').unwrap_or(word)
}

/// Cursor over the clause tokens of one entry.
struct Clauses<'src> {
    tokens: std::iter::Peekable<std::vec::IntoIter<ClauseToken<'src>>>,
}

impl<'src> Clauses<'src> {
    fn new(tokens: Vec<ClauseToken<'src>>) -> Self {
        Self {
            tokens: tokens.into_iter().peekable(),
        }
    }

    /// Consumes the next token if it is one of `keywords`.
    fn skip_keyword(&mut self, keywords: &[&str]) {
        if let Some(ClauseToken::Word(word)) = self.tokens.peek() {
            let word = strip_period(word);
            if keywords.iter().any(|k| word.eq_ignore_ascii_case(k)) {
                self.tokens.next();
            }
        }
    }

    fn next_word(&mut self) -> Option<&'src str> {
        match self.tokens.peek() {
            Some(ClauseToken::Word(word)) => {
                let word = *word;
                self.tokens.next();
                Some(word)
            }
            _ => None,
        }
    }

    fn next_literal(&mut self) -> Option<&'src str> {
        match self.tokens.next()? {
            ClauseToken::Quoted(text) => Some(text),
            ClauseToken::Word(word) => Some(strip_period(word)),
        }
    }
}

/// Parses a joined data description entry.
///
/// Returns `Ok(None)` when the text does not start with a level number and
/// a data name. An entry that has a level number but cannot be used is
/// rejected with a warning diagnostic:
///
/// - a level outside 01-49 and 88 (`E200`)
/// - a PICTURE clause without a valid picture string (`E201`)
/// - an OCCURS count that is missing or zero (`E203`)
///
/// # Errors
///
/// Returns the warning [`Diagnostic`] describing why the entry was rejected.
pub fn scan(text: &str, span: Span) -> Result<Option<FieldDescriptor>, Diagnostic> {
    let Some((level_digits, name, rest)) = split_head(text) else {
        return Ok(None);
    };

    let level: u8 = level_digits.parse().map_err(|_| {
        Diagnostic::warning(format!("invalid level number `{level_digits}`"))
            .with_code(ErrorCode::E200)
            .with_label(span, "entry skipped")
    })?;
    if !(1..=49).contains(&level) && level != 88 {
        return Err(
            Diagnostic::warning(format!("unsupported level number {level_digits} for `{name}`"))
                .with_code(ErrorCode::E200)
                .with_label(span, "entry skipped")
                .with_help("data description entries use levels 01-49 or 88"),
        );
    }

    let mut input = rest;
    let tokens = clause_tokens.parse_next(&mut input).map_err(|_| {
        Diagnostic::warning(format!("malformed clauses in entry `{name}`"))
            .with_code(ErrorCode::E200)
            .with_label(span, "entry skipped")
    })?;

    let mut picture = None;
    let mut usage = None;
    let mut occurs = None;
    let mut redefines = None;
    let mut value = None;

    let mut clauses = Clauses::new(tokens);
    while let Some(token) = clauses.tokens.next() {
        let ClauseToken::Word(word) = token else {
            continue;
        };
        let keyword = strip_period(word).to_ascii_uppercase();
        match keyword.as_str() {
            "REDEFINES" => {
                redefines = clauses.next_word().map(|w| strip_period(w).to_string());
            }
            "PIC" | "PICTURE" => {
                clauses.skip_keyword(&["IS"]);
                let Some(raw) = clauses.next_word().map(strip_period) else {
                    return Err(Diagnostic::warning(format!(
                        "PICTURE clause of `{name}` has no picture string"
                    ))
                    .with_code(ErrorCode::E201)
                    .with_label(span, "entry skipped"));
                };
                picture = Some(raw.to_ascii_uppercase());
            }
            "USAGE" => {
                clauses.skip_keyword(&["IS"]);
                usage = clauses
                    .next_word()
                    .map(|w| strip_period(w).to_ascii_uppercase());
            }
            "OCCURS" => {
                occurs = Some(occurs_count(&mut clauses).ok_or_else(|| {
                    Diagnostic::warning(format!("invalid OCCURS count for `{name}`"))
                        .with_code(ErrorCode::E203)
                        .with_label(span, "entry skipped")
                        .with_help("OCCURS needs a positive integer count")
                })?);
            }
            "VALUE" | "VALUES" => {
                clauses.skip_keyword(&["IS", "ARE"]);
                let literal = clauses.next_literal().map(str::to_string);
                if value.is_none() {
                    value = literal;
                }
            }
            other if USAGE_KEYWORDS.contains(&other) => usage = Some(other.to_string()),
            _ => {}
        }
    }

    let picture_info = match picture.as_deref() {
        Some(raw) => Some(analyze_picture(raw).map_err(|err| {
            Diagnostic::warning(format!("invalid PICTURE `{raw}` for `{name}`: {err}"))
                .with_code(ErrorCode::E201)
                .with_label(span, "entry skipped")
        })?),
        None => None,
    };

    let kind = if level == 88 {
        FieldKind::Condition
    } else if picture.is_some()
        || usage
            .as_deref()
            .is_some_and(|usage| FLOAT_USAGES.contains(&usage))
    {
        FieldKind::Elementary
    } else {
        FieldKind::Group
    };

    Ok(Some(FieldDescriptor {
        level,
        name: name.to_string(),
        kind,
        picture,
        picture_info,
        usage,
        occurs,
        redefines,
        value,
        span,
    }))
}

/// Reads `n [TIMES]` or `m TO n [TIMES]`, returning the upper bound.
fn occurs_count(clauses: &mut Clauses<'_>) -> Option<u32> {
    let mut count: u32 = strip_period(clauses.next_word()?).parse().ok()?;
    let range = matches!(
        clauses.tokens.peek(),
        Some(ClauseToken::Word(word)) if word.eq_ignore_ascii_case("TO")
    );
    if range {
        clauses.tokens.next();
        count = strip_period(clauses.next_word()?).parse().ok()?;
    }
    clauses.skip_keyword(&["TIMES"]);
    (count > 0).then_some(count)
}

/// Removes the sequence area and inline comments from a physical line.
///
/// Returns the byte offset of the kept text inside the line with the text.
fn normalize(line: &str) -> (usize, &str) {
    let mut offset = 0;
    let mut text = line;

    let sequence_area = line.len() >= 6 && line.as_bytes()[..6].iter().all(u8::is_ascii_digit);
    if sequence_area {
        offset = line.char_indices().nth(7).map_or(line.len(), |(i, _)| i);
        text = &line[offset..];
    }

    if let Some(comment) = text.find("*>") {
        text = &text[..comment];
    }

    (offset, text.trim_end())
}

/// Parses a single physical line.
///
/// Returns `None` for lines that are not a usable data description entry.
pub fn tokenize(line: &str) -> Option<FieldDescriptor> {
    let (offset, text) = normalize(line);
    scan(text, Span::new(offset..offset + text.len()))
        .ok()
        .flatten()
}

/// Replaces the characters in the 0-based `columns` with spaces.
fn mask_columns(line: &str, columns: &Range<usize>) -> String {
    line.chars()
        .enumerate()
        .map(|(index, c)| if columns.contains(&index) { ' ' } else { c })
        .collect()
}

/// Joins physical lines into data description entries.
///
/// A line that starts with a level number and a data name begins a new entry.
/// Any other line continues the previous entry while that entry has no
/// terminating period; otherwise it forms an entry of its own, which [`scan`]
/// will not recognize.
///
/// When `discriminator` is given, a line that only starts an entry once those
/// columns are blanked is read with them blanked, so record type codes written
/// in front of the level number do not hide the entry.
pub fn entries<'a>(
    lines: impl IntoIterator<Item = &'a SourceLine>,
    discriminator: Option<Range<usize>>,
) -> Vec<Entry> {
    let mut entries: Vec<Entry> = Vec::new();
    let mut open = false;

    for line in lines {
        let masked;
        let mut raw = line.text();
        if let Some(columns) = &discriminator {
            if !starts_entry(normalize(raw).1) {
                let candidate = mask_columns(raw, columns);
                if starts_entry(normalize(&candidate).1) {
                    masked = candidate;
                    raw = &masked;
                }
            }
        }

        let (offset, text) = normalize(raw);
        if text.trim().is_empty() {
            continue;
        }
        let span = line.span().slice(offset..offset + text.len());

        if open && !starts_entry(text) {
            if let Some(last) = entries.last_mut() {
                last.text.push(' ');
                last.text.push_str(text.trim());
                last.span = last.span.union(span);
                open = !last.is_terminated();
                continue;
            }
        }

        let entry = Entry {
            text: text.to_string(),
            span,
            line: line.number(),
        };
        open = starts_entry(text) && !entry.is_terminated();
        entries.push(entry);
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Source;

    fn scan_text(text: &str) -> Result<Option<FieldDescriptor>, Diagnostic> {
        scan(text, Span::new(0..text.len()))
    }

    fn descriptor(text: &str) -> FieldDescriptor {
        scan_text(text)
            .expect("entry should be accepted")
            .expect("entry should be recognized")
    }

    #[test]
    fn test_elementary_entry() {
        let field = descriptor("           05 CUSTOMER-NAME PIC X(30).");

        assert_eq!(field.level(), 5);
        assert_eq!(field.name(), "CUSTOMER-NAME");
        assert_eq!(field.kind(), FieldKind::Elementary);
        assert_eq!(field.picture(), Some("X(30)"));
        assert_eq!(
            field.picture_info().map(PictureInfo::display_length),
            Some(30)
        );
        assert_eq!(field.usage(), None);
    }

    #[test]
    fn test_group_entry() {
        let field = descriptor("       01 CUSTOMER-RECORD.");

        assert_eq!(field.level(), 1);
        assert_eq!(field.kind(), FieldKind::Group);
        assert!(field.picture().is_none());
    }

    #[test]
    fn test_clauses_in_any_order() {
        let field = descriptor("05 AMOUNT COMP-3 OCCURS 4 TIMES PICTURE IS S9(7)V99.");

        assert_eq!(field.usage(), Some("COMP-3"));
        assert_eq!(field.occurs(), Some(4));
        assert_eq!(field.picture(), Some("S9(7)V99"));
    }

    #[test]
    fn test_usage_clause_forms() {
        assert_eq!(
            descriptor("05 A PIC 9(4) USAGE IS BINARY.").usage(),
            Some("BINARY")
        );
        assert_eq!(
            descriptor("05 A PIC 9(4) usage comp.").usage(),
            Some("COMP")
        );
        assert_eq!(
            descriptor("05 A PIC 9(4) COMPUTATIONAL-5.").usage(),
            Some("COMPUTATIONAL-5")
        );
    }

    #[test]
    fn test_float_usage_without_picture_is_elementary() {
        let field = descriptor("05 RATE COMP-2.");

        assert_eq!(field.kind(), FieldKind::Elementary);
        assert!(field.picture_info().is_none());
    }

    #[test]
    fn test_binary_usage_without_picture_is_group() {
        assert_eq!(descriptor("05 TOTALS COMP.").kind(), FieldKind::Group);
    }

    #[test]
    fn test_picture_keeps_inner_period() {
        let field = descriptor("05 PRICE PIC ZZ9.99.");

        assert_eq!(field.picture(), Some("ZZ9.99"));
    }

    #[test]
    fn test_redefines_and_value() {
        let field = descriptor("05 ALT-DATE REDEFINES BASE-DATE PIC 9(8) VALUE ZEROS.");

        assert_eq!(field.redefines(), Some("BASE-DATE"));
        assert_eq!(field.value(), Some("ZEROS"));
    }

    #[test]
    fn test_condition_entry() {
        let field = descriptor("88 IS-ACTIVE VALUE 'Y'.");

        assert_eq!(field.kind(), FieldKind::Condition);
        assert_eq!(field.value(), Some("Y"));
    }

    #[test]
    fn test_condition_first_literal_only() {
        let field = descriptor("88 VALID-CODES VALUES ARE \"A\" \"B\" \"C\".");

        assert_eq!(field.value(), Some("A"));
    }

    #[test]
    fn test_quoted_value_keeps_spaces() {
        let field = descriptor("05 GREETING PIC X(11) VALUE 'HELLO WORLD'.");

        assert_eq!(field.value(), Some("HELLO WORLD"));
    }

    #[test]
    fn test_occurs_range_uses_upper_bound() {
        let field = descriptor("05 ITEMS PIC X(2) OCCURS 1 TO 20 TIMES DEPENDING ON ITEM-COUNT.");

        assert_eq!(field.occurs(), Some(20));
    }

    #[test]
    fn test_filler() {
        assert!(descriptor("05 FILLER PIC X(5).").is_filler());
    }

    #[test]
    fn test_non_field_lines() {
        assert!(scan_text("COPY CUSTREC.").expect("not rejected").is_none());
        assert!(scan_text("").expect("not rejected").is_none());
        assert!(scan_text("05").expect("not rejected").is_none());
        assert!(scan_text("5 SHORT-LEVEL PIC X.").expect("not rejected").is_none());
        assert!(scan_text("05 123 PIC X.").expect("not rejected").is_none());
        assert!(scan_text("05 FIELD_A PIC X.").expect("not rejected").is_none());
    }

    #[test]
    fn test_unsupported_level_is_rejected() {
        let diag = scan_text("66 ALIAS RENAMES A THRU B.").unwrap_err();
        assert_eq!(diag.code(), Some(ErrorCode::E200));
        assert!(diag.severity().is_warning());

        assert_eq!(
            scan_text("77 COUNTER PIC 9.").unwrap_err().code(),
            Some(ErrorCode::E200)
        );
    }

    #[test]
    fn test_invalid_picture_is_rejected() {
        let diag = scan_text("05 BAD PIC 9(0).").unwrap_err();

        assert_eq!(diag.code(), Some(ErrorCode::E201));
    }

    #[test]
    fn test_missing_picture_string_is_rejected() {
        let diag = scan_text("05 BAD PIC.").unwrap_err();

        assert_eq!(diag.code(), Some(ErrorCode::E201));
    }

    #[test]
    fn test_invalid_occurs_is_rejected() {
        assert_eq!(
            scan_text("05 ITEMS PIC X OCCURS 0 TIMES.").unwrap_err().code(),
            Some(ErrorCode::E203)
        );
        assert_eq!(
            scan_text("05 ITEMS PIC X OCCURS MANY.").unwrap_err().code(),
            Some(ErrorCode::E203)
        );
    }

    #[test]
    fn test_tokenize_strips_sequence_area_and_comments() {
        let field = tokenize("000100 05 FIELD-A PIC X(5). *> customer code")
            .expect("line should tokenize");

        assert_eq!(field.name(), "FIELD-A");
        assert_eq!(field.picture(), Some("X(5)"));
        assert_eq!(field.span().start(), 7);
    }

    #[test]
    fn test_tokenize_rejects_invalid_entry() {
        assert!(tokenize("05 BAD PIC 9(0).").is_none());
    }

    #[test]
    fn test_entries_join_continuation_lines() {
        let source = Source::new(&[
            "       01 REC-A.",
            "          05 LONG-FIELD",
            "             PIC X(10)",
            "             VALUE SPACES.",
            "          05 NEXT-FIELD PIC 9.",
        ]);

        let entries = entries(source.lines(), None);
        assert_eq!(entries.len(), 3);
        assert_eq!(
            entries[1].text(),
            "          05 LONG-FIELD PIC X(10) VALUE SPACES."
        );
        assert_eq!(entries[1].line(), 2);
        assert_eq!(entries[1].span().start(), source.lines()[1].span().start());
        assert_eq!(entries[1].span().end(), source.lines()[3].span().end());

        let field = scan(entries[1].text(), entries[1].span())
            .expect("accepted")
            .expect("recognized");
        assert_eq!(field.picture(), Some("X(10)"));
        assert_eq!(field.value(), Some("SPACES"));
    }

    #[test]
    fn test_entries_new_level_closes_unterminated_entry() {
        let source = Source::new(&["05 FIRST PIC X", "05 SECOND PIC X."]);

        let entries = entries(source.lines(), None);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text(), "05 FIRST PIC X");
    }

    #[test]
    fn test_entries_terminated_entry_does_not_absorb_text() {
        let source = Source::new(&["05 FIRST PIC X.", "   SOME TRAILING TEXT"]);

        let entries = entries(source.lines(), None);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].text(), "05 FIRST PIC X.");
    }

    #[test]
    fn test_entries_blank_discriminator_columns() {
        let source = Source::new(&["HD01 HEADER-REC.", "HD   05 HD-DATE PIC 9(8).", "01 PLAIN-REC."]);

        let entries = entries(source.lines(), Some(0..2));
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].text(), "  01 HEADER-REC.");
        assert_eq!(entries[1].text(), "     05 HD-DATE PIC 9(8).");
        assert_eq!(entries[2].text(), "01 PLAIN-REC.");
    }
}
