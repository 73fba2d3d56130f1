//! Identity model for generic object generation.
//!
//! Everything the generation database stores is identified by values from
//! this crate, never by transient in-memory type handles. That is what lets
//! an entry survive a recompilation: the host reloads all of its types, but
//! the names and durable ids recorded here still describe them.
//!
//! # Dual identity
//!
//! Generic definitions and type arguments carry two identities:
//!
//! - a [`TypeName`] (full type name + declaring module), unique at any
//!   instant but free to change when the user renames or moves a type;
//! - a [`DurableId`], issued by the host for the source artifact, which stays
//!   fixed across renames and only disappears when the artifact is deleted.
//!
//! Reconciliation matches by name first and falls back to the durable id.
//!
//! Generated modules are identified by a [`ModuleId`], which the module
//! generator keeps stable when a module is renamed.

mod descriptor;
mod durable;
mod name;
pub mod naming;

pub use descriptor::{ArgumentDescriptor, ConcreteType, GenericTypeDescriptor};
pub use durable::{DurableId, ModuleId};
pub use name::TypeName;
