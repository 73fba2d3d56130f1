//! Descriptors stored by the generation database.

use crate::{DurableId, ModuleId, TypeName};

/// An open generic type definition known to the generation database.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
pub struct GenericTypeDescriptor {
    /// Current name of the definition, e.g. ``Game.Box`1``.
    pub name: TypeName,

    /// Durable id of the definition's source artifact.
    pub durable_id: DurableId,

    /// Formal type parameter names, in declaration order.
    pub type_params: Vec<String>,

    /// Selector module that lists the definition as creatable in tooling.
    ///
    /// `None` for object kinds that don't use selectors, and for
    /// definitions registered directly through an instantiation.
    pub selector_module: Option<ModuleId>,
}

impl GenericTypeDescriptor {
    pub fn new(name: TypeName, durable_id: DurableId, type_params: Vec<String>) -> Self {
        Self {
            name,
            durable_id,
            type_params,
            selector_module: None,
        }
    }

    /// Number of type parameters.
    #[inline]
    pub fn arity(&self) -> usize {
        self.type_params.len()
    }

    /// Whether two descriptors refer to the same definition under both
    /// identities.
    pub fn same_identity(&self, other: &Self) -> bool {
        self.name == other.name && self.durable_id == other.durable_id
    }
}

/// A concrete type used as a generic argument.
///
/// Shared between every instantiation that uses it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "persist", derive(serde::Serialize, serde::Deserialize))]
pub struct ArgumentDescriptor {
    pub name: TypeName,
    pub durable_id: DurableId,
}

impl ArgumentDescriptor {
    pub fn new(name: TypeName, durable_id: DurableId) -> Self {
        Self { name, durable_id }
    }
}

/// Handle to a loaded concrete implementation of an instantiation.
///
/// This is what the runtime lookup table hands out: the class the host
/// found inside the backing module, plus the module it came from.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConcreteType {
    pub name: TypeName,
    pub module: ModuleId,
}
