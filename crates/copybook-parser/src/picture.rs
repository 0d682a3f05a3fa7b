//! PICTURE string analysis.
//!
//! A picture string describes the character positions of an elementary item.
//! It is read as runs of one symbol with a repeat count (`X(10)` is one run
//! of ten `X`), and the runs are measured and categorized without expanding
//! them.

use thiserror::Error;

use copybook_core::field::DataCategory;

/// Largest number of character positions a picture may describe.
///
/// This is the largest elementary item mainframe compilers accept.
pub const MAX_PICTURE_LENGTH: usize = 134_217_727;

/// Problems found in a picture string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PictureError {
    #[error("picture string is empty")]
    Empty,

    #[error("unknown picture symbol `{0}`")]
    InvalidSymbol(char),

    #[error("invalid repeat count `{0}`")]
    InvalidRepeat(String),

    #[error("picture describes more than {MAX_PICTURE_LENGTH} positions")]
    TooLong,
}

/// Measured attributes of a picture string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PictureInfo {
    display_length: usize,
    decimal_places: u32,
    signed: bool,
    category: DataCategory,
}

impl PictureInfo {
    /// Number of character positions in DISPLAY format.
    pub fn display_length(&self) -> usize {
        self.display_length
    }

    /// Digit positions after the implied decimal point.
    pub fn decimal_places(&self) -> u32 {
        self.decimal_places
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }

    pub fn category(&self) -> DataCategory {
        self.category
    }
}

/// Expands repeat counts: `X(3)9(2)` becomes `XXX99`.
///
/// Text that is not a well-formed repeat is kept as written, so expanding an
/// already expanded picture returns it unchanged. The result holds one
/// character per repeated position; use [`analyze_picture`] to measure
/// pictures from untrusted input.
pub fn expand_picture(picture: &str) -> String {
    let chars: Vec<char> = picture.trim().chars().collect();
    let mut expanded = String::with_capacity(chars.len());
    let mut index = 0;

    while index < chars.len() {
        let symbol = chars[index];
        index += 1;

        match repeat_at(&chars, index) {
            Some((count, consumed)) => {
                expanded.extend(std::iter::repeat_n(symbol, count));
                index += consumed;
            }
            None => expanded.push(symbol),
        }
    }

    expanded
}

/// Reads `(n)` at `index`, returning the count and the characters consumed.
fn repeat_at(chars: &[char], index: usize) -> Option<(usize, usize)> {
    if chars.get(index) != Some(&'(') {
        return None;
    }
    let close = chars[index..].iter().position(|&c| c == ')')? + index;
    let digits: String = chars[index + 1..close].iter().collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let count = digits.parse().ok()?;
    Some((count, close - index + 1))
}

/// Splits `picture` into `(symbol, count)` runs.
///
/// Every repeat count must be a positive integer no larger than
/// [`MAX_PICTURE_LENGTH`].
fn runs(picture: &str) -> Result<Vec<(char, usize)>, PictureError> {
    let mut runs = Vec::new();
    let mut chars = picture.chars().peekable();

    while let Some(symbol) = chars.next() {
        if symbol == '(' || symbol == ')' {
            return Err(PictureError::InvalidRepeat(symbol.to_string()));
        }
        if chars.next_if_eq(&'(').is_none() {
            runs.push((symbol, 1));
            continue;
        }

        let mut count = String::new();
        let mut closed = false;
        for c in chars.by_ref() {
            if c == ')' {
                closed = true;
                break;
            }
            count.push(c);
        }
        if !closed || count.is_empty() || !count.chars().all(|c| c.is_ascii_digit()) {
            let close = if closed { ")" } else { "" };
            return Err(PictureError::InvalidRepeat(format!("({count}{close}")));
        }
        match count.parse::<usize>() {
            Ok(0) => return Err(PictureError::InvalidRepeat(format!("({count})"))),
            Ok(n) if n <= MAX_PICTURE_LENGTH => runs.push((symbol, n)),
            _ => return Err(PictureError::TooLong),
        }
    }
    Ok(runs)
}

/// Measures and categorizes a picture string.
///
/// Each of `9 X A Z * + - B 0 / , . $` occupies one position, `CR` and `DB`
/// occupy two, and `V`, `P`, `S` occupy none.
///
/// # Errors
///
/// Returns [`PictureError`] for an empty picture, an unknown symbol, a
/// repeat count that is missing, zero, or not a number, or a picture longer
/// than [`MAX_PICTURE_LENGTH`] positions.
pub fn analyze_picture(picture: &str) -> Result<PictureInfo, PictureError> {
    let picture = picture.trim().to_ascii_uppercase();
    if picture.is_empty() {
        return Err(PictureError::Empty);
    }
    let runs = runs(&picture)?;

    let mut display_length: usize = 0;
    let mut digits: usize = 0;
    let mut decimal_places: usize = 0;
    let mut signed = false;
    let mut after_point = false;
    let mut has_alpha = false;
    let mut has_alphanumeric = false;
    let mut edited = false;

    let mut index = 0;
    while index < runs.len() {
        let (symbol, count) = runs[index];
        let next = runs.get(index + 1).copied();
        let positions = match symbol {
            '9' => {
                digits = digits.saturating_add(count);
                if after_point {
                    decimal_places = decimal_places.saturating_add(count);
                }
                count
            }
            'X' => {
                has_alphanumeric = true;
                count
            }
            'A' => {
                has_alpha = true;
                count
            }
            'Z' | '*' | '+' | '-' | 'B' | '0' | '/' | ',' | '.' | '$' => {
                edited = true;
                count
            }
            'C' if count == 1 && next == Some(('R', 1)) => {
                edited = true;
                index += 1;
                2
            }
            'D' if count == 1 && next == Some(('B', 1)) => {
                edited = true;
                index += 1;
                2
            }
            'V' => {
                after_point = true;
                0
            }
            'P' => {
                if after_point {
                    decimal_places = decimal_places.saturating_add(count);
                }
                0
            }
            'S' => {
                signed = true;
                0
            }
            other => return Err(PictureError::InvalidSymbol(other)),
        };
        display_length = display_length
            .checked_add(positions)
            .filter(|&length| length <= MAX_PICTURE_LENGTH)
            .ok_or(PictureError::TooLong)?;
        index += 1;
    }
    let decimal_places = u32::try_from(decimal_places)
        .ok()
        .filter(|&places| places as usize <= MAX_PICTURE_LENGTH)
        .ok_or(PictureError::TooLong)?;

    let category = if edited {
        DataCategory::Edited
    } else if has_alphanumeric || (has_alpha && digits > 0) {
        DataCategory::Alphanumeric
    } else if has_alpha {
        DataCategory::Alphabetic
    } else if after_point {
        DataCategory::Decimal
    } else {
        DataCategory::Numeric
    };

    Ok(PictureInfo {
        display_length,
        decimal_places,
        signed,
        category,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expand_picture() {
        assert_eq!(expand_picture("X(3)"), "XXX");
        assert_eq!(expand_picture("S9(3)V9(2)"), "S999V99");
        assert_eq!(expand_picture("9(2)X"), "99X");
        assert_eq!(expand_picture("XXX"), "XXX");
    }

    #[test]
    fn test_expand_keeps_malformed_repeats() {
        assert_eq!(expand_picture("X(A)"), "X(A)");
        assert_eq!(expand_picture("X(3"), "X(3");
    }

    #[test]
    fn test_display_lengths() {
        let cases = [
            ("X(10)", 10),
            ("9(5)", 5),
            ("S9(7)V99", 9),
            ("ZZ,ZZ9.99", 9),
            ("9(5)CR", 7),
            ("9(5)DB", 7),
            ("$$$,$$9.99-", 11),
            ("PPP999", 3),
            ("A(4)", 4),
        ];
        for (picture, expected) in cases {
            let info = analyze_picture(picture).expect("valid picture");
            assert_eq!(info.display_length(), expected, "picture {picture}");
        }
    }

    #[test]
    fn test_signed_and_decimal_places() {
        let info = analyze_picture("s9(7)v99").expect("valid picture");

        assert!(info.is_signed());
        assert_eq!(info.display_length(), 9);
        assert_eq!(info.decimal_places(), 2);
        assert_eq!(info.category(), DataCategory::Decimal);

        let info = analyze_picture("9V9(3)PP").expect("valid picture");
        assert_eq!(info.decimal_places(), 5);
    }

    #[test]
    fn test_categories() {
        let category = |picture| analyze_picture(picture).map(|info| info.category());

        assert_eq!(category("9(4)"), Ok(DataCategory::Numeric));
        assert_eq!(category("X(4)"), Ok(DataCategory::Alphanumeric));
        assert_eq!(category("A(4)"), Ok(DataCategory::Alphabetic));
        assert_eq!(category("A9"), Ok(DataCategory::Alphanumeric));
        assert_eq!(category("ZZ9"), Ok(DataCategory::Edited));
    }

    #[test]
    fn test_invalid_pictures() {
        assert_eq!(analyze_picture(""), Err(PictureError::Empty));
        assert_eq!(analyze_picture("9(5)Q"), Err(PictureError::InvalidSymbol('Q')));
        assert_eq!(
            analyze_picture("X(0)"),
            Err(PictureError::InvalidRepeat("(0)".to_string()))
        );
        assert!(matches!(
            analyze_picture("X(5"),
            Err(PictureError::InvalidRepeat(_))
        ));
        assert!(matches!(
            analyze_picture("(5)"),
            Err(PictureError::InvalidRepeat(_))
        ));
        assert!(matches!(
            analyze_picture("X(5))"),
            Err(PictureError::InvalidRepeat(_))
        ));
        assert_eq!(analyze_picture("CCR"), Err(PictureError::InvalidSymbol('C')));
    }

    #[test]
    fn test_oversized_pictures_are_rejected_without_expanding() {
        assert_eq!(analyze_picture("X(999999999999999)"), Err(PictureError::TooLong));
        assert_eq!(
            analyze_picture("X(99999999999999999999999999)"),
            Err(PictureError::TooLong)
        );
        assert_eq!(
            analyze_picture("X(134217727)9"),
            Err(PictureError::TooLong)
        );

        let largest = analyze_picture("X(134217727)").expect("largest picture is valid");
        assert_eq!(largest.display_length(), MAX_PICTURE_LENGTH);
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    fn symbol_strategy() -> impl Strategy<Value = char> {
        prop::sample::select(vec!['9', 'X', 'A', 'Z', 'B', '0'])
    }

    fn repeat_strategy() -> impl Strategy<Value = Vec<(char, usize)>> {
        prop::collection::vec((symbol_strategy(), 1usize..40), 1..6)
    }

    fn render(parts: &[(char, usize)]) -> String {
        parts
            .iter()
            .map(|(symbol, count)| format!("{symbol}({count})"))
            .collect()
    }

    fn check_expand_is_idempotent(parts: Vec<(char, usize)>) -> Result<(), TestCaseError> {
        let once = expand_picture(&render(&parts));
        let twice = expand_picture(&once);
        prop_assert_eq!(once, twice);
        Ok(())
    }

    fn check_display_length_sums_repeats(
        parts: Vec<(char, usize)>,
    ) -> Result<(), TestCaseError> {
        let info = analyze_picture(&render(&parts)).map_err(|err| {
            TestCaseError::fail(format!("generated picture rejected: {err}"))
        })?;
        let expected: usize = parts.iter().map(|(_, count)| count).sum();
        prop_assert_eq!(info.display_length(), expected);
        prop_assert_eq!(expand_picture(&render(&parts)).len(), expected);
        Ok(())
    }

    proptest! {
        #[test]
        fn expand_is_idempotent(parts in repeat_strategy()) {
            check_expand_is_idempotent(parts)?;
        }

        #[test]
        fn display_length_sums_repeats(parts in repeat_strategy()) {
            check_display_length_sums_repeats(parts)?;
        }
    }
}
