//! Per-record-type layouts.
//!
//! A [`RecordLayout`] is built once by the layout assembler and never
//! mutated afterwards.

use serde::Serialize;

use crate::field::{Field, FieldIndex};

/// Aggregate statistics of a record layout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LayoutStats {
    pub field_count: usize,
    pub group_fields: usize,
    pub elementary_fields: usize,
    pub condition_fields: usize,
    pub filler_fields: usize,
    pub total_length: usize,
    pub min_length: usize,
    pub max_length: usize,
    pub has_redefines: bool,
    pub has_occurs: bool,
    pub has_conditions: bool,
}

/// The complete layout of one record type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordLayout {
    record_type: String,
    layout_name: String,
    fields: Vec<Field>,
    #[serde(flatten)]
    stats: LayoutStats,
    is_valid: bool,
    validation_messages: Vec<String>,
}

impl RecordLayout {
    /// Creates a layout. It is valid when `validation_messages` is empty.
    pub fn new(
        record_type: impl Into<String>,
        layout_name: impl Into<String>,
        fields: Vec<Field>,
        stats: LayoutStats,
        validation_messages: Vec<String>,
    ) -> Self {
        Self {
            record_type: record_type.into(),
            layout_name: layout_name.into(),
            fields,
            stats,
            is_valid: validation_messages.is_empty(),
            validation_messages,
        }
    }

    pub fn record_type(&self) -> &str {
        &self.record_type
    }

    pub fn layout_name(&self) -> &str {
        &self.layout_name
    }

    /// Returns the field arena in source order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Returns the field at `index`, if it exists.
    pub fn field(&self, index: FieldIndex) -> Option<&Field> {
        self.fields.get(index.index())
    }

    /// Finds the first field with the given source name (case-insensitive).
    pub fn find(&self, name: &str) -> Option<&Field> {
        self.fields
            .iter()
            .find(|field| field.name().eq_ignore_ascii_case(name))
    }

    /// Iterates over fields without a parent, in source order.
    pub fn roots(&self) -> impl Iterator<Item = &Field> {
        self.fields
            .iter()
            .filter(|field| field.parent().is_none() && !field.is_condition())
    }

    pub fn field_count(&self) -> usize {
        self.stats.field_count
    }

    pub fn group_fields(&self) -> usize {
        self.stats.group_fields
    }

    pub fn elementary_fields(&self) -> usize {
        self.stats.elementary_fields
    }

    pub fn condition_fields(&self) -> usize {
        self.stats.condition_fields
    }

    pub fn filler_fields(&self) -> usize {
        self.stats.filler_fields
    }

    pub fn total_length(&self) -> usize {
        self.stats.total_length
    }

    pub fn min_length(&self) -> usize {
        self.stats.min_length
    }

    pub fn max_length(&self) -> usize {
        self.stats.max_length
    }

    pub fn has_redefines(&self) -> bool {
        self.stats.has_redefines
    }

    pub fn has_occurs(&self) -> bool {
        self.stats.has_occurs
    }

    pub fn has_conditions(&self) -> bool {
        self.stats.has_conditions
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    pub fn validation_messages(&self) -> &[String] {
        &self.validation_messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::FieldKind;

    fn sample_fields() -> Vec<Field> {
        let mut root = Field::new(1, "REC-A", FieldKind::Group);
        root.set_extent(1, 5);
        root.push_child(FieldIndex::new(1));

        let mut child = Field::new(5, "FIELD-A", FieldKind::Elementary);
        child.place(1, 5);
        child.set_parent(Some(FieldIndex::new(0)));

        vec![root, child]
    }

    #[test]
    fn test_layout_is_valid_without_messages() {
        let layout = RecordLayout::new(
            "DATA",
            "DATA_REC-A",
            sample_fields(),
            LayoutStats::default(),
            vec![],
        );

        assert!(layout.is_valid());
        assert!(layout.validation_messages().is_empty());
    }

    #[test]
    fn test_layout_is_invalid_with_messages() {
        let layout = RecordLayout::new(
            "DATA",
            "DATA_REC-A",
            sample_fields(),
            LayoutStats::default(),
            vec!["overlap".to_string()],
        );

        assert!(!layout.is_valid());
        assert_eq!(layout.validation_messages(), ["overlap".to_string()]);
    }

    #[test]
    fn test_find_and_roots() {
        let layout = RecordLayout::new(
            "DATA",
            "DATA_REC-A",
            sample_fields(),
            LayoutStats::default(),
            vec![],
        );

        let child = layout.find("field-a").expect("field should be found");
        assert_eq!(child.parent(), Some(FieldIndex::new(0)));
        assert_eq!(layout.field(FieldIndex::new(0)).map(Field::name), Some("REC-A"));

        let roots: Vec<_> = layout.roots().map(Field::name).collect();
        assert_eq!(roots, vec!["REC-A"]);
    }
}
