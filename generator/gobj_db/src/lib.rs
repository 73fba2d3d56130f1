//! Generation database for generic objects.
//!
//! The database records every generic definition the host knows about, the
//! concrete instantiations created for it, and the modules backing them. It
//! is the source of truth that the reconciliation pass keeps in sync with
//! the host's type system, and from which the runtime [`LookupTable`] is
//! rebuilt.
//!
//! # Layout
//!
//! ```text
//! GenerationDatabase
//!     generics:  [GenericSlot]        descriptor + instantiations, by GenericIdx
//!     arguments: [ArgumentDescriptor] shared, by ArgumentIdx
//!     secondary indices: name -> idx, durable id -> idx, argument -> users
//! ```
//!
//! Descriptors live in append-only slot arenas. Identity repair (a rename,
//! a new durable id) mutates the slot in place, so instantiations keep
//! pointing at the same indices and only the small secondary maps are
//! re-keyed.

mod database;
mod error;
mod idx;
mod instantiation;
mod lookup;
mod menu;
mod persist;

pub use database::{GenerationDatabase, RemovedGeneric};
pub use error::DatabaseError;
pub use idx::{ArgumentIdx, GenericIdx};
pub use instantiation::{ConcreteInstantiation, InstantiationOrigin};
pub use lookup::{LookupSnapshot, LookupTable};
pub use menu::MenuItem;
pub use persist::{DatabaseStore, PersistedDatabase, PersistedInstantiation, StoreError};
