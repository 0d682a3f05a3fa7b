//! Field definitions for copybook layouts.
//!
//! A [`Field`] is one data description entry after it has been placed in a
//! record: its level, clauses, storage encoding and computed byte position.
//! Fields of a record live in a flat arena owned by the
//! [`RecordLayout`](crate::layout::RecordLayout); all hierarchy links are
//! [`FieldIndex`] values into that arena.

use std::{fmt, str::FromStr};

use serde::Serialize;
use thiserror::Error;

/// Index of a field inside its owning layout's field arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct FieldIndex(usize);

impl FieldIndex {
    /// Creates an index pointing at arena slot `index`.
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Returns the arena slot.
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for FieldIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The structural role of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldKind {
    /// A field without a PICTURE that owns subordinate fields.
    Group,
    /// A field with storage of its own.
    Elementary,
    /// A level-88 condition name annotating an elementary field.
    Condition,
}

impl FieldKind {
    /// Returns the upper-case name used in reports.
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Group => "GROUP",
            FieldKind::Elementary => "ELEMENTARY",
            FieldKind::Condition => "CONDITION",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Storage encoding of an elementary field, selected by its USAGE clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Encoding {
    /// Zoned or character storage, one byte per picture position.
    #[default]
    Character,
    /// Big-endian binary integer.
    Binary,
    /// Single precision floating point.
    Float,
    /// Double precision floating point.
    Double,
    /// Packed decimal, two digits per byte plus a sign nibble.
    PackedDecimal,
    /// Native byte order binary integer.
    NativeBinary,
}

impl Encoding {
    /// Returns the canonical configuration name of this encoding.
    pub fn as_str(self) -> &'static str {
        match self {
            Encoding::Character => "character",
            Encoding::Binary => "binary",
            Encoding::Float => "float",
            Encoding::Double => "double",
            Encoding::PackedDecimal => "packed_decimal",
            Encoding::NativeBinary => "native_binary",
        }
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when an encoding name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown encoding `{0}`")]
pub struct UnknownEncoding(pub String);

impl FromStr for Encoding {
    type Err = UnknownEncoding;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "character" | "display" => Ok(Encoding::Character),
            "binary" => Ok(Encoding::Binary),
            "float" => Ok(Encoding::Float),
            "double" => Ok(Encoding::Double),
            "packed_decimal" | "packed-decimal" => Ok(Encoding::PackedDecimal),
            "native_binary" | "native-binary" => Ok(Encoding::NativeBinary),
            _ => Err(UnknownEncoding(s.to_string())),
        }
    }
}

/// Data category derived from a PICTURE string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataCategory {
    /// Only digit positions, no implied decimal point.
    Numeric,
    /// Digit positions with an implied decimal point.
    Decimal,
    /// Any mix that includes `X`.
    Alphanumeric,
    /// Letters only.
    Alphabetic,
    /// Contains editing symbols.
    Edited,
}

/// Membership of a field in storage shared through REDEFINES.
///
/// Both members are slots of the record's field arena as it was built, before
/// fillers and excluded names were dropped. They are not remapped by that
/// pruning, so the relationship survives it even when the base or the
/// alternative itself is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlaySlot {
    /// The entry whose bytes are redefined.
    pub base: usize,
    /// The entry occupying those bytes: the base itself or one of its redefinitions.
    pub alternative: usize,
}

impl OverlaySlot {
    /// Returns `true` if both slots lay out the same storage differently.
    pub fn is_alternative_of(self, other: OverlaySlot) -> bool {
        self.base == other.base && self.alternative != other.alternative
    }
}

/// A data description entry placed in a record layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    level: u8,
    name: String,
    output_name: String,
    kind: FieldKind,
    filler: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    picture: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    usage: Option<String>,
    encoding: Encoding,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<DataCategory>,
    signed: bool,
    decimal_places: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    occurs: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    redefines: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    redefines_target: Option<FieldIndex>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    start_position: usize,
    end_position: usize,
    storage_length: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    parent: Option<FieldIndex>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    children: Vec<FieldIndex>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    condition_names: Vec<FieldIndex>,
    #[serde(skip_serializing_if = "Option::is_none")]
    host: Option<FieldIndex>,
    #[serde(skip)]
    overlays: Vec<OverlaySlot>,
    line: usize,
}

impl Field {
    /// Creates an unplaced field.
    ///
    /// A field named `FILLER` (in any case) is flagged as filler.
    pub fn new(level: u8, name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        Self {
            level,
            filler: name.eq_ignore_ascii_case("FILLER"),
            output_name: name.clone(),
            name,
            kind,
            picture: None,
            usage: None,
            encoding: Encoding::Character,
            category: None,
            signed: false,
            decimal_places: 0,
            occurs: None,
            redefines: None,
            redefines_target: None,
            value: None,
            start_position: 0,
            end_position: 0,
            storage_length: 0,
            parent: None,
            children: Vec::new(),
            condition_names: Vec::new(),
            host: None,
            overlays: Vec::new(),
            line: 0,
        }
    }

    /// Sets the PICTURE string.
    pub fn with_picture(mut self, picture: Option<String>) -> Self {
        self.picture = picture;
        self
    }

    /// Sets the USAGE keyword and the encoding it resolved to.
    pub fn with_usage(mut self, usage: Option<String>, encoding: Encoding) -> Self {
        self.usage = usage;
        self.encoding = encoding;
        self
    }

    /// Sets the attributes derived from the PICTURE string.
    pub fn with_picture_info(
        mut self,
        category: Option<DataCategory>,
        signed: bool,
        decimal_places: u32,
    ) -> Self {
        self.category = category;
        self.signed = signed;
        self.decimal_places = decimal_places;
        self
    }

    /// Sets the OCCURS count.
    pub fn with_occurs(mut self, occurs: Option<u32>) -> Self {
        self.occurs = occurs;
        self
    }

    /// Sets the name of the field this one redefines.
    pub fn with_redefines(mut self, redefines: Option<String>) -> Self {
        self.redefines = redefines;
        self
    }

    /// Sets the VALUE literal.
    pub fn with_value(mut self, value: Option<String>) -> Self {
        self.value = value;
        self
    }

    /// Sets the 1-based source line the entry started on.
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = line;
        self
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the name after naming conventions and mappings were applied.
    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    pub fn is_group(&self) -> bool {
        self.kind == FieldKind::Group
    }

    pub fn is_elementary(&self) -> bool {
        self.kind == FieldKind::Elementary
    }

    pub fn is_condition(&self) -> bool {
        self.kind == FieldKind::Condition
    }

    pub fn is_filler(&self) -> bool {
        self.filler
    }

    pub fn picture(&self) -> Option<&str> {
        self.picture.as_deref()
    }

    pub fn usage(&self) -> Option<&str> {
        self.usage.as_deref()
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn category(&self) -> Option<DataCategory> {
        self.category
    }

    pub fn is_signed(&self) -> bool {
        self.signed
    }

    pub fn decimal_places(&self) -> u32 {
        self.decimal_places
    }

    pub fn occurs(&self) -> Option<u32> {
        self.occurs
    }

    pub fn redefines(&self) -> Option<&str> {
        self.redefines.as_deref()
    }

    /// Returns the resolved field this one overlays, if the target was found.
    pub fn redefines_target(&self) -> Option<FieldIndex> {
        self.redefines_target
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn start_position(&self) -> usize {
        self.start_position
    }

    pub fn end_position(&self) -> usize {
        self.end_position
    }

    pub fn storage_length(&self) -> usize {
        self.storage_length
    }

    /// Returns the inclusive byte span `(start, end)` this field covers.
    ///
    /// For groups this is the extent of their elementary descendants.
    pub fn extent(&self) -> (usize, usize) {
        (self.start_position, self.end_position)
    }

    pub fn parent(&self) -> Option<FieldIndex> {
        self.parent
    }

    pub fn children(&self) -> &[FieldIndex] {
        &self.children
    }

    /// Returns the level-88 condition names attached to this field.
    pub fn condition_names(&self) -> &[FieldIndex] {
        &self.condition_names
    }

    /// Returns the elementary field a condition name annotates.
    pub fn host(&self) -> Option<FieldIndex> {
        self.host
    }

    /// Returns the REDEFINES storage this field or one of its ancestors
    /// takes part in, innermost first.
    pub fn overlays(&self) -> &[OverlaySlot] {
        &self.overlays
    }

    /// Returns `true` if REDEFINES lets this field share bytes with `other`.
    pub fn shares_storage_with(&self, other: &Field) -> bool {
        self.overlays
            .iter()
            .any(|&slot| other.overlays.iter().any(|&theirs| slot.is_alternative_of(theirs)))
    }

    pub fn line(&self) -> usize {
        self.line
    }

    /// Places a field with storage of its own at `start`.
    ///
    /// The end position is `start + storage_length - 1`, or `start` for
    /// zero-length storage.
    pub fn place(&mut self, start: usize, storage_length: usize) {
        self.start_position = start;
        self.storage_length = storage_length;
        self.end_position = if storage_length > 0 {
            start + storage_length - 1
        } else {
            start
        };
    }

    /// Records a byte span without storage, used for groups and conditions.
    pub fn set_extent(&mut self, start: usize, end: usize) {
        self.start_position = start;
        self.end_position = end;
        self.storage_length = 0;
    }

    pub fn set_output_name(&mut self, output_name: impl Into<String>) {
        self.output_name = output_name.into();
    }

    pub fn set_parent(&mut self, parent: Option<FieldIndex>) {
        self.parent = parent;
    }

    pub fn set_host(&mut self, host: Option<FieldIndex>) {
        self.host = host;
    }

    pub fn set_redefines_target(&mut self, target: Option<FieldIndex>) {
        self.redefines_target = target;
    }

    pub fn set_overlays(&mut self, overlays: Vec<OverlaySlot>) {
        self.overlays = overlays;
    }

    pub fn set_children(&mut self, children: Vec<FieldIndex>) {
        self.children = children;
    }

    pub fn set_condition_names(&mut self, condition_names: Vec<FieldIndex>) {
        self.condition_names = condition_names;
    }

    pub fn push_child(&mut self, child: FieldIndex) {
        self.children.push(child);
    }

    pub fn push_condition_name(&mut self, condition: FieldIndex) {
        self.condition_names.push(condition);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filler_detection_is_case_insensitive() {
        assert!(Field::new(5, "FILLER", FieldKind::Elementary).is_filler());
        assert!(Field::new(5, "filler", FieldKind::Elementary).is_filler());
        assert!(!Field::new(5, "FILLER-X", FieldKind::Elementary).is_filler());
    }

    #[test]
    fn test_place_computes_inclusive_end() {
        let mut field = Field::new(5, "AMOUNT", FieldKind::Elementary);
        field.place(6, 2);

        assert_eq!(field.start_position(), 6);
        assert_eq!(field.end_position(), 7);
        assert_eq!(field.storage_length(), 2);
    }

    #[test]
    fn test_place_zero_length_keeps_start() {
        let mut field = Field::new(5, "EMPTY", FieldKind::Elementary);
        field.place(10, 0);

        assert_eq!(field.extent(), (10, 10));
    }

    #[test]
    fn test_set_extent_clears_storage() {
        let mut group = Field::new(1, "REC", FieldKind::Group);
        group.set_extent(1, 25);

        assert_eq!(group.extent(), (1, 25));
        assert_eq!(group.storage_length(), 0);
    }

    #[test]
    fn test_shared_storage_needs_different_alternatives() {
        let slot = |base, alternative| OverlaySlot { base, alternative };
        let mut number = Field::new(5, "DATE-NUM", FieldKind::Elementary);
        number.set_overlays(vec![slot(1, 1)]);
        let mut year = Field::new(10, "YY", FieldKind::Elementary);
        year.set_overlays(vec![slot(1, 2)]);
        let mut month = Field::new(10, "MM", FieldKind::Elementary);
        month.set_overlays(vec![slot(1, 2)]);
        let plain = Field::new(5, "OTHER", FieldKind::Elementary);

        assert!(number.shares_storage_with(&year));
        assert!(year.shares_storage_with(&number));
        assert!(!year.shares_storage_with(&month));
        assert!(!plain.shares_storage_with(&number));
    }

    #[test]
    fn test_encoding_from_str() {
        assert_eq!("binary".parse::<Encoding>(), Ok(Encoding::Binary));
        assert_eq!(
            "PACKED_DECIMAL".parse::<Encoding>(),
            Ok(Encoding::PackedDecimal)
        );
        assert_eq!("native_binary".parse::<Encoding>(), Ok(Encoding::NativeBinary));
        assert_eq!(
            "zoned".parse::<Encoding>(),
            Err(UnknownEncoding("zoned".to_string()))
        );
    }

    #[test]
    fn test_encoding_display_round_trips_names() {
        for encoding in [
            Encoding::Character,
            Encoding::Binary,
            Encoding::Float,
            Encoding::Double,
            Encoding::PackedDecimal,
            Encoding::NativeBinary,
        ] {
            assert_eq!(encoding.to_string().parse::<Encoding>(), Ok(encoding));
        }
    }

    #[test]
    fn test_field_kind_as_str() {
        assert_eq!(FieldKind::Group.as_str(), "GROUP");
        assert_eq!(FieldKind::Elementary.to_string(), "ELEMENTARY");
        assert_eq!(FieldKind::Condition.as_str(), "CONDITION");
    }
}
