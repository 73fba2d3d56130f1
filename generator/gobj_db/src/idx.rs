//! Slot indices into the database arenas.

use std::fmt;

/// Index of a generic definition slot.
///
/// Stable for the lifetime of one loaded database; slots are never reused,
/// so a stale index resolves to nothing rather than to a different entry.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct GenericIdx(u32);

/// Index of a shared argument descriptor slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ArgumentIdx(u32);

macro_rules! slot_index {
    ($ty:ident, $prefix:literal) => {
        impl $ty {
            #[inline]
            pub(crate) fn from_usize(index: usize) -> Self {
                Self(u32::try_from(index).unwrap_or(u32::MAX))
            }

            #[inline]
            pub(crate) const fn index(self) -> usize {
                self.0 as usize
            }

            /// The raw slot number.
            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{}"), self.0)
            }
        }
    };
}

slot_index!(GenericIdx, "g");
slot_index!(ArgumentIdx, "a");
