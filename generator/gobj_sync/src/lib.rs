//! Reconciliation of generated generic-object modules.
//!
//! After every recompilation the host's types may have been renamed, moved
//! or deleted. This crate brings the generation database back in line with
//! what is actually loaded, regenerating or retiring the modules it
//! generated, and rebuilds the runtime lookup table from the result.
//!
//! # Pass Overview
//!
//! ```text
//! recompile event
//!     └── GenerationSession::on_recompiled
//!         └── per object kind: reconcile()
//!             ├── discover loaded types (TypeDiscovery)
//!             ├── generic definitions: exact / name, then durable id / new / removed
//!             ├── arguments: rename by durable id / orphan
//!             ├── adopt hand-written concrete subclasses
//!             ├── menu items module
//!             └── build_lookup() -> LookupTable::initialize
//!         └── one AssetIndex::refresh, save databases
//! ```
//!
//! The host side is reached only through the traits in [`services`]; a
//! directory-backed module generator is provided by [`FsModuleStore`].

mod config;
mod creator;
mod fs_store;
mod reconcile;
pub mod services;
mod session;
mod table;

#[cfg(test)]
mod testing;

pub use config::{GenerationConfig, ObjectKind};
pub use creator::{CreateError, InstantiationAdded};
pub use fs_store::{DeclarationEmitter, FsModuleStore, ModuleEmitter};
pub use reconcile::{reconcile, PassReport};
pub use services::{
    AssetIndex, AssetMenu, DurableIdentity, GeneratorError, IdentityUnavailable, LoadedType,
    ModuleCatalog, ModuleGenerator, ModuleStore, ModuleTemplate, Services, TemplateKind,
    TypeDiscovery, TypeShape,
};
pub use session::{GenerationSession, KindReport, SessionReport};
pub use table::{build_lookup, prune_missing_modules, TableReport};
