//! Storage length computation.
//!
//! The byte length of an elementary item follows from three inputs: the
//! character positions of its picture, the OCCURS count, and the storage
//! encoding selected by its USAGE. The OCCURS count multiplies the position
//! count before the encoding transform is applied.

use copybook_core::field::{Encoding, FieldKind};

use crate::picture::PictureInfo;

/// Largest byte position a record layout may reach.
pub const MAX_RECORD_LENGTH: usize = i32::MAX as usize;

/// Returns the byte length of `count` positions stored with `encoding`.
///
/// | Encoding | Bytes |
/// |----------|-------|
/// | character | `count` |
/// | binary, native binary | 2 up to 4 digits, 4 up to 9, 8 up to 18, else 16 |
/// | float | 4 |
/// | double | 8 |
/// | packed decimal | `(count + sign + 1) / 2` |
pub fn encoded_length(count: usize, encoding: Encoding, signed: bool) -> usize {
    match encoding {
        Encoding::Character => count,
        Encoding::Binary | Encoding::NativeBinary => match count {
            0..=4 => 2,
            5..=9 => 4,
            10..=18 => 8,
            _ => 16,
        },
        Encoding::Float => 4,
        Encoding::Double => 8,
        Encoding::PackedDecimal => count.saturating_add(usize::from(signed) + 1) / 2,
    }
}

/// Computes the storage length of a field.
///
/// Groups and condition names occupy no storage of their own. An OCCURS
/// count of zero is treated as absent. A length too large for `usize`
/// saturates; callers compare it against [`MAX_RECORD_LENGTH`].
pub fn storage_length(
    kind: FieldKind,
    picture: Option<&PictureInfo>,
    encoding: Encoding,
    occurs: Option<u32>,
) -> usize {
    match kind {
        FieldKind::Group | FieldKind::Condition => 0,
        FieldKind::Elementary => {
            let repeat = occurs.filter(|&n| n > 0).map_or(1, |n| n as usize);
            let count = picture
                .map_or(0, PictureInfo::display_length)
                .saturating_mul(repeat);
            let signed = picture.is_some_and(PictureInfo::is_signed);
            encoded_length(count, encoding, signed)
        }
    }
}


#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    fn check_binary_tiers_are_monotonic(count: usize) -> Result<(), TestCaseError> {
        let here = encoded_length(count, Encoding::Binary, false);
        let next = encoded_length(count + 1, Encoding::Binary, false);
        prop_assert!(here <= next);
        prop_assert!([2, 4, 8, 16].contains(&here));
        Ok(())
    }

    fn check_packed_decimal_holds_every_digit(
        count: usize,
        signed: bool,
    ) -> Result<(), TestCaseError> {
        let bytes = encoded_length(count, Encoding::PackedDecimal, signed);
        // Two digits per byte, at most one spare nibble beyond the sign.
        prop_assert!(bytes * 2 >= count);
        prop_assert!(bytes * 2 <= count + 2);
        Ok(())
    }

    proptest! {
        #[test]
        fn binary_tiers_are_monotonic(count in 0usize..64) {
            check_binary_tiers_are_monotonic(count)?;
        }

        #[test]
        fn packed_decimal_holds_every_digit(count in 1usize..64, signed in any::<bool>()) {
            check_packed_decimal_holds_every_digit(count, signed)?;
        }
    }
}
