//! Durable identifiers for source artifacts and generated modules.

use std::fmt;

/// Identity token of a source artifact that survives renames and moves.
///
/// The host issues these (a content-addressable or asset id). An empty id
/// means the host could not provide one when the type was recorded; such an
/// entry can only ever be matched by name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
pub struct DurableId(String);

impl DurableId {
    /// The id used when the host has no durable identity for a type.
    pub const EMPTY: Self = Self(String::new());

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for DurableId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("<none>")
        } else {
            f.write_str(&self.0)
        }
    }
}

/// Identifier of one generated (or adopted) code module.
///
/// Stable across renames of the module file: the generator carries the id
/// over to the new name.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
pub struct ModuleId(String);

impl ModuleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&DurableId> for ModuleId {
    /// Modules adopted from user code are identified by their source
    /// artifact's durable id.
    fn from(id: &DurableId) -> Self {
        Self(id.0.clone())
    }
}
