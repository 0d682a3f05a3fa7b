//! Assembly of placed fields into record layouts.
//!
//! [`LayoutAssembler`] takes the field arena of one record type and derives
//! the aggregate statistics, the layout name and the structural validation
//! results of a [`RecordLayout`].

pub use copybook_core::layout::{LayoutStats, RecordLayout};

use log::{debug, trace};

use copybook_core::field::Field;

use crate::validate::{self, Overlap};

/// Layout name used for `{01_level_name}` when a record type has no level-01 field.
pub const DEFAULT_RECORD_NAME: &str = "RECORD";

/// Builds [`RecordLayout`]s from placed field arenas.
#[derive(Debug, Clone)]
pub struct LayoutAssembler {
    template: String,
    check_overlaps: bool,
    record_levels: Vec<u32>,
}

impl Default for LayoutAssembler {
    fn default() -> Self {
        Self::new("{record_type}_{01_level_name}", true, vec![1])
    }
}

impl LayoutAssembler {
    /// Creates an assembler.
    ///
    /// # Arguments
    ///
    /// * `template` - Layout name template with `{record_type}` and `{01_level_name}`
    /// * `check_overlaps` - Whether unexplained elementary overlaps invalidate the layout
    /// * `record_levels` - Level numbers that start a record
    pub fn new(template: impl Into<String>, check_overlaps: bool, record_levels: Vec<u32>) -> Self {
        Self {
            template: template.into(),
            check_overlaps,
            record_levels,
        }
    }

    /// Assembles the layout of `record_type`.
    ///
    /// Never fails: structural problems are reported through
    /// [`RecordLayout::validation_messages`].
    pub fn assemble(&self, record_type: &str, fields: Vec<Field>) -> RecordLayout {
        self.assemble_with_overlaps(record_type, fields).0
    }

    /// Assembles the layout of `record_type` and also returns the overlaps
    /// found, so callers can report them against the source.
    pub fn assemble_with_overlaps(
        &self,
        record_type: &str,
        fields: Vec<Field>,
    ) -> (RecordLayout, Vec<Overlap>) {
        let stats = self.stats(&fields);
        let layout_name = self.layout_name(record_type, &fields);

        let mut messages = Vec::new();
        let overlaps = if self.check_overlaps {
            validate::find_overlaps(&fields)
        } else {
            Vec::new()
        };
        messages.extend(overlaps.iter().map(|overlap| overlap.describe(&fields)));

        for field in fields.iter().filter(|field| field.is_elementary()) {
            let length = field.storage_length();
            if length > 0 && field.end_position() != field.start_position() + length - 1 {
                messages.push(format!(
                    "`{}` ends at {} but starts at {} with {} bytes",
                    field.name(),
                    field.end_position(),
                    field.start_position(),
                    length
                ));
            }
        }

        trace!(
            record_type = record_type,
            layout_name = layout_name.as_str(),
            stats:?;
            "Assembled layout"
        );
        debug!(
            record_type = record_type,
            fields = stats.field_count,
            total_length = stats.total_length,
            messages = messages.len();
            "Layout assembled"
        );

        let layout = RecordLayout::new(record_type, layout_name, fields, stats, messages);
        (layout, overlaps)
    }

    fn stats(&self, fields: &[Field]) -> LayoutStats {
        let mut stats = LayoutStats {
            field_count: fields.len(),
            ..LayoutStats::default()
        };

        for field in fields {
            if field.is_group() {
                stats.group_fields += 1;
            } else if field.is_elementary() {
                stats.elementary_fields += 1;
                if field.is_filler() {
                    stats.filler_fields += 1;
                }
            } else {
                stats.condition_fields += 1;
            }
            stats.has_redefines |= field.redefines().is_some();
            stats.has_occurs |= field.occurs().is_some();
        }
        stats.has_conditions = stats.condition_fields > 0;

        // A repeated group reaches past its last elementary descendant.
        stats.total_length = fields
            .iter()
            .filter(|field| field.is_elementary() || (field.is_group() && field.occurs().is_some()))
            .map(Field::end_position)
            .max()
            .unwrap_or(0);
        stats.max_length = stats.total_length;
        stats.min_length = fields
            .iter()
            .filter(|field| {
                field.parent().is_none()
                    && !field.is_condition()
                    && self.record_levels.contains(&u32::from(field.level()))
                    && has_storage(fields, field)
            })
            .map(Field::end_position)
            .min()
            .unwrap_or(stats.total_length);

        stats
    }

    fn layout_name(&self, record_type: &str, fields: &[Field]) -> String {
        let record_name = fields
            .iter()
            .find(|field| field.level() == 1)
            .map_or(DEFAULT_RECORD_NAME, Field::name);
        self.template
            .replace("{record_type}", record_type)
            .replace("{01_level_name}", record_name)
    }
}

fn has_storage(fields: &[Field], field: &Field) -> bool {
    if field.is_elementary() {
        return field.storage_length() > 0;
    }
    field
        .children()
        .iter()
        .filter_map(|&child| fields.get(child.index()))
        .any(|child| has_storage(fields, child))
}

#[cfg(test)]
mod tests {
    use copybook_core::field::{FieldIndex, FieldKind};

    use super::*;

    fn group(level: u8, name: &str, start: usize, end: usize, children: &[usize]) -> Field {
        let mut field = Field::new(level, name, FieldKind::Group);
        field.set_extent(start, end);
        field.set_children(children.iter().copied().map(FieldIndex::new).collect());
        field
    }

    fn elementary(name: &str, parent: usize, start: usize, length: usize) -> Field {
        let mut field = Field::new(5, name, FieldKind::Elementary);
        field.place(start, length);
        field.set_parent(Some(FieldIndex::new(parent)));
        field
    }

    fn rec_a() -> Vec<Field> {
        vec![
            group(1, "REC-A", 1, 7, &[1, 2]),
            elementary("FIELD-A", 0, 1, 5),
            elementary("FIELD-B", 0, 6, 2),
        ]
    }

    #[test]
    fn test_counts_and_lengths() {
        let layout = LayoutAssembler::default().assemble("DATA", rec_a());

        assert_eq!(layout.field_count(), 3);
        assert_eq!(layout.group_fields(), 1);
        assert_eq!(layout.elementary_fields(), 2);
        assert_eq!(layout.condition_fields(), 0);
        assert_eq!(layout.total_length(), 7);
        assert_eq!(layout.max_length(), 7);
        assert_eq!(layout.min_length(), 7);
        assert!(!layout.has_redefines());
        assert!(!layout.has_occurs());
        assert!(!layout.has_conditions());
        assert!(layout.is_valid());
    }

    #[test]
    fn test_layout_name_template() {
        let layout = LayoutAssembler::default().assemble("HEADER", rec_a());
        assert_eq!(layout.layout_name(), "HEADER_REC-A");

        let orphan = vec![Field::new(5, "LOOSE", FieldKind::Elementary)];
        let layout = LayoutAssembler::new("{01_level_name}-{record_type}", true, vec![1])
            .assemble("DATA", orphan);
        assert_eq!(layout.layout_name(), "RECORD-DATA");
    }

    #[test]
    fn test_min_length_uses_shortest_record() {
        let mut fields = rec_a();
        fields.push(group(1, "REC-SHORT", 1, 3, &[4]));
        fields.push(elementary("CODE", 3, 1, 3));
        fields.push(group(1, "EMPTY", 1, 1, &[]));

        let layout = LayoutAssembler::default().assemble("DATA", fields);
        assert_eq!(layout.total_length(), 7);
        assert_eq!(layout.min_length(), 3);
    }

    #[test]
    fn test_flags_follow_clauses() {
        let mut fields = rec_a();
        fields[1] = Field::new(5, "FIELD-A", FieldKind::Elementary).with_occurs(Some(5));
        fields[1].place(1, 5);
        fields[1].set_parent(Some(FieldIndex::new(0)));
        let mut condition = Field::new(88, "IS-OK", FieldKind::Condition);
        condition.set_extent(6, 7);
        condition.set_host(Some(FieldIndex::new(2)));
        fields.push(condition);

        let layout = LayoutAssembler::default().assemble("DATA", fields);
        assert!(layout.has_occurs());
        assert!(layout.has_conditions());
        assert_eq!(layout.condition_fields(), 1);
        assert_eq!(layout.total_length(), 7);
    }

    #[test]
    fn test_repeated_group_extends_total_length() {
        let table = group(5, "LINES", 1, 20, &[1]).with_occurs(Some(4));
        let fields = vec![table, elementary("CODE", 0, 1, 5)];

        let layout = LayoutAssembler::default().assemble("DATA", fields);
        assert_eq!(layout.total_length(), 20);
    }

    #[test]
    fn test_overlap_invalidates_layout() {
        let mut fields = rec_a();
        fields[2].place(4, 2);

        let (layout, overlaps) = LayoutAssembler::default().assemble_with_overlaps("DATA", fields);
        assert!(!layout.is_valid());
        assert_eq!(overlaps.len(), 1);
        assert_eq!(
            layout.validation_messages(),
            ["`FIELD-B` (4-5) overlaps `FIELD-A` (1-5) without REDEFINES"]
        );
    }

    #[test]
    fn test_overlap_check_can_be_disabled() {
        let mut fields = rec_a();
        fields[2].place(4, 2);

        let layout = LayoutAssembler::new("{record_type}", false, vec![1]).assemble("DATA", fields);
        assert!(layout.is_valid());
    }

    #[test]
    fn test_filler_count_covers_elementary_fields_only() {
        let mut fields = vec![group(1, "REC", 1, 6, &[1, 3]), group(5, "FILLER", 1, 4, &[2])];
        fields[1].set_parent(Some(FieldIndex::new(0)));
        let mut inner = Field::new(10, "FILLER", FieldKind::Elementary);
        inner.place(1, 4);
        inner.set_parent(Some(FieldIndex::new(1)));
        fields.push(inner);
        fields.push(elementary("CODE", 0, 5, 2));

        let layout = LayoutAssembler::default().assemble("DATA", fields);
        assert_eq!(layout.filler_fields(), 1);
        assert_eq!(layout.group_fields(), 2);
    }

    #[test]
    fn test_empty_record() {
        let layout = LayoutAssembler::default().assemble("DATA", Vec::new());

        assert_eq!(layout.field_count(), 0);
        assert_eq!(layout.total_length(), 0);
        assert_eq!(layout.min_length(), 0);
        assert!(layout.is_valid());
    }
}
