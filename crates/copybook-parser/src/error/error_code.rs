//! Error codes for the copybook diagnostic system.
//!
//! Error codes are organized by phase:
//! - `E1xx` - Record classification
//! - `E2xx` - Entry grammar and clause validation
//! - `E3xx` - Hierarchy and layout validation

use std::fmt;

/// Error codes for categorizing diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // =========================================================================
    // Classification (E1xx)
    // =========================================================================
    /// Unrecognized record type.
    ///
    /// No classification rule matched the line; it was assigned the fallback
    /// record type.
    E100,

    // =========================================================================
    // Entry Grammar (E2xx)
    // =========================================================================
    /// Malformed field definition.
    ///
    /// The line starts with a level number but is not a valid data
    /// description entry, or the level number is outside 01-49 and 88.
    E200,

    /// Invalid PICTURE clause.
    ///
    /// The picture string contains an unknown symbol, a zero repeat count, or
    /// more positions than an elementary item may hold.
    E201,

    /// Unknown USAGE keyword.
    ///
    /// The keyword has no usage mapping; the field is treated as character
    /// storage.
    E202,

    /// Invalid OCCURS count.
    E203,

    // =========================================================================
    // Hierarchy and Layout (E3xx)
    // =========================================================================
    /// Undefined REDEFINES target.
    ///
    /// No earlier field of the same record type has the referenced name.
    E300,

    /// REDEFINES level mismatch.
    ///
    /// A redefining entry uses a different level number than its target.
    E301,

    /// Orphan condition name.
    ///
    /// A level-88 entry has no preceding elementary field to annotate.
    E302,

    /// Overlapping fields.
    ///
    /// Two elementary fields share bytes without a REDEFINES relationship.
    E303,

    /// Record length mismatch.
    ///
    /// Record types have different total lengths while uniform record length
    /// validation is enabled.
    E304,

    /// Record too large.
    ///
    /// OCCURS repetition places bytes past the largest representable record
    /// position.
    E305,
}

impl ErrorCode {
    /// Returns the error code as a string (e.g., "E001").
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::E100 => "E100",
            ErrorCode::E200 => "E200",
            ErrorCode::E201 => "E201",
            ErrorCode::E202 => "E202",
            ErrorCode::E203 => "E203",
            ErrorCode::E300 => "E300",
            ErrorCode::E301 => "E301",
            ErrorCode::E302 => "E302",
            ErrorCode::E303 => "E303",
            ErrorCode::E304 => "E304",
            ErrorCode::E305 => "E305",
        }
    }

    /// Returns a short description of the error.
    pub fn description(&self) -> &'static str {
        match self {
            // Classification
            ErrorCode::E100 => "unrecognized record type",
            // Entry grammar
            ErrorCode::E200 => "malformed field definition",
            ErrorCode::E201 => "invalid picture clause",
            ErrorCode::E202 => "unknown usage",
            ErrorCode::E203 => "invalid occurs count",
            // Hierarchy and layout
            ErrorCode::E300 => "undefined redefines target",
            ErrorCode::E301 => "redefines level mismatch",
            ErrorCode::E302 => "orphan condition name",
            ErrorCode::E303 => "overlapping fields",
            ErrorCode::E304 => "record length mismatch",
            ErrorCode::E305 => "record too large",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
