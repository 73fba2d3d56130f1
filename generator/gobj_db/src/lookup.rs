//! Runtime lookup table.
//!
//! Maps (generic definition, ordered argument types) to the concrete type
//! implementing that instantiation. The table is derived data: it is built
//! from the generation database after every change and swapped in whole,
//! never patched entry by entry.
//!
//! ```text
//! Game.Box`1
//!     [System.Int32]   --- Box_Int32
//!     [System.String]  --- Box_String
//! Game.Pair`2
//!     [System.Int32, System.Boolean] --- Pair_Int32_Boolean
//! ```

use gobj_ident::{ConcreteType, TypeName};
use rustc_hash::FxHashMap;

type ArgumentTable = FxHashMap<Vec<TypeName>, ConcreteType>;

/// Entries collected for the next [`LookupTable::initialize`].
#[derive(Clone, Debug, Default)]
pub struct LookupSnapshot {
    entries: FxHashMap<TypeName, ArgumentTable>,
}

impl LookupSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `generic` known even if it has no resolvable instantiations.
    pub fn add_generic(&mut self, generic: TypeName) {
        self.entries.entry(generic).or_default();
    }

    /// Record the concrete type for one argument tuple.
    ///
    /// Returns the entry it replaced, which the builder treats as a
    /// duplicate.
    pub fn insert(
        &mut self,
        generic: TypeName,
        arguments: Vec<TypeName>,
        concrete: ConcreteType,
    ) -> Option<ConcreteType> {
        self.entries
            .entry(generic)
            .or_default()
            .insert(arguments, concrete)
    }

    pub fn len(&self) -> usize {
        self.entries.values().map(FxHashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Read-only index used when creating assets of generic types.
#[derive(Clone, Debug, Default)]
pub struct LookupTable {
    entries: FxHashMap<TypeName, ArgumentTable>,
}

impl LookupTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole table with `snapshot`.
    pub fn initialize(&mut self, snapshot: LookupSnapshot) {
        self.entries = snapshot.entries;
    }

    /// Resolve a closed generic type to its concrete implementation.
    ///
    /// Arguments compare element-wise and in order. `None` means no concrete
    /// type exists yet; the caller decides whether to create one.
    pub fn try_resolve(&self, generic: &TypeName, arguments: &[TypeName]) -> Option<&ConcreteType> {
        self.entries.get(generic)?.get(arguments)
    }

    /// Whether `generic` was known when the table was built.
    pub fn contains_generic(&self, generic: &TypeName) -> bool {
        self.entries.contains_key(generic)
    }

    /// Number of resolvable instantiations.
    pub fn len(&self) -> usize {
        self.entries.values().map(FxHashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
