//! Type names as recorded by the generation database.

use std::fmt;

/// Full type name plus the name of the module that declares it.
///
/// Generic definitions use the host's arity-suffixed form, for example
/// ``Game.Inventory.Box`1``. Two names are equal only when both parts match.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
pub struct TypeName {
    full_name: String,
    module: String,
}

impl TypeName {
    /// Create a type name from its full name and declaring module.
    pub fn new(full_name: impl Into<String>, module: impl Into<String>) -> Self {
        Self {
            full_name: full_name.into(),
            module: module.into(),
        }
    }

    /// Namespace-qualified name, including any arity suffix.
    #[inline]
    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    /// Name of the declaring module.
    #[inline]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// The name without namespace and without the arity suffix.
    ///
    /// ``Game.Inventory.Box`1`` becomes `Box`.
    pub fn short_name(&self) -> &str {
        crate::naming::short_name_for_naming(&self.full_name)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}", self.full_name, self.module)
    }
}
