//! Concrete instantiations of generic definitions.

use gobj_ident::ModuleId;

use crate::ArgumentIdx;

/// Where the module backing an instantiation came from.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum InstantiationOrigin {
    /// Emitted by the module generator; regenerated on renames and deleted
    /// when the instantiation goes away.
    #[default]
    Generated,

    /// A concrete subclass the user wrote by hand. Its module is user code,
    /// so it is never regenerated or deleted.
    Discovered,
}

/// One binding of a generic definition to an ordered argument tuple.
///
/// The argument order encodes the positional binding to type parameters and
/// is never normalized.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ConcreteInstantiation {
    pub arguments: Vec<ArgumentIdx>,
    pub module: ModuleId,
    pub origin: InstantiationOrigin,
}

impl ConcreteInstantiation {
    /// Whether the instantiation uses `argument` at any position.
    #[inline]
    pub fn uses(&self, argument: ArgumentIdx) -> bool {
        self.arguments.contains(&argument)
    }

    #[inline]
    pub fn is_generated(&self) -> bool {
        self.origin == InstantiationOrigin::Generated
    }
}
