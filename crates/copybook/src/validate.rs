//! Structural validation of placed fields.
//!
//! Elementary fields of one record type must not share bytes unless a
//! REDEFINES relationship explains it. Two fields are explained when some
//! ancestor-or-self of each belongs to the same overlay, through different
//! alternatives. The relationship is read from each field's
//! [`OverlaySlot`](copybook_core::field::OverlaySlot)s, which still hold when
//! the redefining entry itself was pruned (`FILLER REDEFINES ...`).

use copybook_core::field::{Field, FieldIndex};

/// Two elementary fields sharing at least one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlap {
    /// The field placed first.
    pub first: FieldIndex,
    /// The field that starts inside `first`.
    pub second: FieldIndex,
}

impl Overlap {
    /// Describes the overlap using the fields' names and byte ranges.
    pub fn describe(&self, fields: &[Field]) -> String {
        let first = &fields[self.first.index()];
        let second = &fields[self.second.index()];
        format!(
            "`{}` ({}-{}) overlaps `{}` ({}-{}) without REDEFINES",
            second.name(),
            second.start_position(),
            second.end_position(),
            first.name(),
            first.start_position(),
            first.end_position()
        )
    }
}

/// Returns `true` if REDEFINES places `a` and `b` in the same storage.
pub fn is_explained(fields: &[Field], a: FieldIndex, b: FieldIndex) -> bool {
    fields[a.index()].shares_storage_with(&fields[b.index()])
}

/// Finds elementary fields that share bytes without a REDEFINES relationship.
///
/// Fields without storage are ignored. Results are ordered by the start
/// position of the second field.
pub fn find_overlaps(fields: &[Field]) -> Vec<Overlap> {
    let mut placed: Vec<FieldIndex> = fields
        .iter()
        .enumerate()
        .filter(|(_, field)| field.is_elementary() && field.storage_length() > 0)
        .map(|(index, _)| FieldIndex::new(index))
        .collect();
    placed.sort_by_key(|index| (fields[index.index()].start_position(), *index));

    let mut overlaps = Vec::new();
    let mut active: Vec<FieldIndex> = Vec::new();
    for index in placed {
        let start = fields[index.index()].start_position();
        active.retain(|open| fields[open.index()].end_position() >= start);
        for &open in &active {
            if !is_explained(fields, open, index) {
                overlaps.push(Overlap {
                    first: open,
                    second: index,
                });
            }
        }
        active.push(index);
    }
    overlaps
}

#[cfg(test)]
mod tests {
    use copybook_core::field::{FieldKind, OverlaySlot};

    use super::*;

    fn elementary(name: &str, start: usize, length: usize) -> Field {
        let mut field = Field::new(5, name, FieldKind::Elementary);
        field.place(start, length);
        field
    }

    fn slot(base: usize, alternative: usize) -> OverlaySlot {
        OverlaySlot { base, alternative }
    }

    #[test]
    fn test_disjoint_fields() {
        let fields = vec![elementary("A", 1, 5), elementary("B", 6, 2)];

        assert!(find_overlaps(&fields).is_empty());
    }

    #[test]
    fn test_unexplained_overlap() {
        let fields = vec![elementary("A", 1, 5), elementary("B", 3, 6)];

        let overlaps = find_overlaps(&fields);
        assert_eq!(
            overlaps,
            [Overlap {
                first: FieldIndex::new(0),
                second: FieldIndex::new(1)
            }]
        );
        assert_eq!(
            overlaps[0].describe(&fields),
            "`B` (3-8) overlaps `A` (1-5) without REDEFINES"
        );
    }

    #[test]
    fn test_redefines_explains_overlap() {
        let mut base = elementary("BASE", 1, 4);
        base.set_overlays(vec![slot(0, 0)]);
        let mut alt = elementary("ALT", 1, 8);
        alt.set_overlays(vec![slot(0, 1)]);
        let mut alt2 = elementary("ALT-2", 1, 2);
        alt2.set_overlays(vec![slot(0, 2)]);

        assert!(find_overlaps(&[base, alt, alt2]).is_empty());
    }

    #[test]
    fn test_redefines_through_dropped_group() {
        // DATE-NUM was slot 1; the FILLER group in slot 2 redefined it and
        // was pruned, leaving its children behind.
        let mut number = elementary("DATE-NUM", 1, 8);
        number.set_overlays(vec![slot(1, 1)]);
        let mut year = Field::new(10, "YY", FieldKind::Elementary);
        year.place(1, 4);
        year.set_overlays(vec![slot(1, 2)]);
        let mut month = Field::new(10, "MM", FieldKind::Elementary);
        month.place(5, 2);
        month.set_overlays(vec![slot(1, 2)]);

        let fields = vec![number, year, month];
        assert!(find_overlaps(&fields).is_empty());
        assert!(is_explained(&fields, FieldIndex::new(0), FieldIndex::new(2)));
    }

    #[test]
    fn test_siblings_inside_one_alternative_are_not_explained() {
        let mut base = elementary("BASE", 1, 4);
        base.set_overlays(vec![slot(0, 0)]);
        let mut x = Field::new(10, "X", FieldKind::Elementary);
        x.place(1, 3);
        x.set_overlays(vec![slot(0, 1)]);
        let mut y = Field::new(10, "Y", FieldKind::Elementary);
        y.place(2, 3);
        y.set_overlays(vec![slot(0, 1)]);

        let overlaps = find_overlaps(&[base, x, y]);
        assert_eq!(overlaps.len(), 1);
        assert_eq!(overlaps[0].first, FieldIndex::new(1));
        assert_eq!(overlaps[0].second, FieldIndex::new(2));
    }

    #[test]
    fn test_zero_length_fields_are_ignored() {
        let fields = vec![elementary("A", 1, 5), elementary("EMPTY", 2, 0)];

        assert!(find_overlaps(&fields).is_empty());
    }
}
