//! Errors raised at the database boundary.

use gobj_ident::{DurableId, TypeName};
use thiserror::Error;

use crate::{ArgumentIdx, GenericIdx};

/// A mutation the database refused.
///
/// These are programmer errors on the caller's side: the reconciliation pass
/// checks for them before mutating, and treats any that still occur as a
/// reason to drop the offending entry.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum DatabaseError {
    #[error("an instantiation of '{generic}' with arguments [{arguments}] already exists")]
    DuplicateInstantiation { generic: TypeName, arguments: String },

    #[error("generic definition '{0}' is already registered")]
    DuplicateGeneric(TypeName),

    #[error("'{generic}' takes {expected} type arguments, got {found}")]
    ArityMismatch {
        generic: TypeName,
        expected: usize,
        found: usize,
    },

    #[error("no generic definition in slot {0}")]
    UnknownGeneric(GenericIdx),

    #[error("no argument in slot {0}")]
    UnknownArgument(ArgumentIdx),

    #[error("the name '{0}' already belongs to another entry")]
    NameTaken(TypeName),

    #[error("the durable id '{0}' already belongs to another entry")]
    DurableIdTaken(DurableId),

    #[error(
        "persisted database is corrupt: {keys} generic definitions but {values} instantiation lists"
    )]
    Corruption { keys: usize, values: usize },
}
