//! Host services the engine depends on.
//!
//! Everything outside the database is reached through these traits: type
//! discovery, durable identity, module generation and the asset index. The
//! host implements them over its reflection and asset APIs; tests implement
//! them in memory.

use std::io;
use std::path::PathBuf;

use gobj_db::MenuItem;
use gobj_ident::{DurableId, ModuleId, TypeName};
use thiserror::Error;

use crate::ObjectKind;

/// Shape of a loaded type relative to the generic machinery.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TypeShape {
    /// An open generic definition with these formal parameters.
    GenericDefinition { type_params: Vec<String> },
    /// A concrete type deriving from a closed instantiation of `definition`.
    Closed {
        definition: TypeName,
        arguments: Vec<TypeName>,
    },
    /// Anything else.
    Plain,
}

/// "Create asset" menu attribute declared on a generic definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetMenu {
    pub file_name: String,
    pub menu_name: String,
    pub order: i32,
}

/// A type the host currently has loaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadedType {
    pub name: TypeName,
    pub shape: TypeShape,
    pub is_abstract: bool,
    /// Declares no members of its own. Only empty concrete subclasses can
    /// stand in for a generated module.
    pub is_empty: bool,
    pub asset_menu: Option<AssetMenu>,
}

impl LoadedType {
    /// A non-abstract open generic definition.
    pub fn generic_definition(name: TypeName, type_params: Vec<String>) -> Self {
        Self {
            name,
            shape: TypeShape::GenericDefinition { type_params },
            is_abstract: false,
            is_empty: false,
            asset_menu: None,
        }
    }

    /// An empty, non-abstract concrete subclass of `definition<arguments>`.
    pub fn closed(name: TypeName, definition: TypeName, arguments: Vec<TypeName>) -> Self {
        Self {
            name,
            shape: TypeShape::Closed {
                definition,
                arguments,
            },
            is_abstract: false,
            is_empty: true,
            asset_menu: None,
        }
    }

    /// A type that takes no part in generic generation, such as an argument.
    pub fn plain(name: TypeName) -> Self {
        Self {
            name,
            shape: TypeShape::Plain,
            is_abstract: false,
            is_empty: false,
            asset_menu: None,
        }
    }

    #[must_use]
    pub fn with_asset_menu(mut self, menu: AssetMenu) -> Self {
        self.asset_menu = Some(menu);
        self
    }

    pub fn type_params(&self) -> Option<&[String]> {
        match &self.shape {
            TypeShape::GenericDefinition { type_params } => Some(type_params),
            _ => None,
        }
    }

    /// Whether this is an empty concrete subclass of exactly
    /// `definition<arguments>`.
    pub fn is_empty_closed_of(&self, definition: &TypeName, arguments: &[TypeName]) -> bool {
        match &self.shape {
            TypeShape::Closed {
                definition: def,
                arguments: args,
            } => !self.is_abstract && self.is_empty && def == definition && args == arguments,
            _ => false,
        }
    }
}

/// Enumerates and resolves loaded types.
pub trait TypeDiscovery {
    /// Every loaded type deriving from the base type of `kind`.
    fn loaded_types(&self, kind: ObjectKind) -> Vec<LoadedType>;

    /// Look a type up by its current name.
    fn resolve_by_name(&self, name: &TypeName) -> Option<LoadedType>;
}

/// The host has no durable id for a type, usually because its source
/// artifact was deleted.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("no durable id available for '{0}'")]
pub struct IdentityUnavailable(pub TypeName);

/// Maps types to the durable ids of their source artifacts and back.
pub trait DurableIdentity {
    fn durable_id(&self, name: &TypeName) -> Result<DurableId, IdentityUnavailable>;

    /// Current name of the type declared by the artifact with this id.
    fn resolve_by_id(&self, id: &DurableId) -> Option<TypeName>;
}

/// What a generated module must contain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModuleTemplate {
    /// Lists a generic definition as attachable in tooling.
    Selector {
        generic: TypeName,
        type_params: Vec<String>,
        component_name: String,
    },
    /// An empty concrete subclass of `generic<arguments>`.
    Concrete {
        kind: ObjectKind,
        generic: TypeName,
        arguments: Vec<TypeName>,
    },
    /// Asset menu entries for every generic definition that declares one.
    MenuItems { items: Vec<MenuItem> },
}

/// Template family, picked by the emitter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TemplateKind {
    Selector,
    ConcreteBehaviour,
    ConcreteScriptableObject,
    MenuItems,
}

impl ModuleTemplate {
    pub fn kind(&self) -> TemplateKind {
        match self {
            ModuleTemplate::Selector { .. } => TemplateKind::Selector,
            ModuleTemplate::Concrete {
                kind: ObjectKind::Behaviour,
                ..
            } => TemplateKind::ConcreteBehaviour,
            ModuleTemplate::Concrete {
                kind: ObjectKind::ScriptableObject,
                ..
            } => TemplateKind::ConcreteScriptableObject,
            ModuleTemplate::MenuItems { .. } => TemplateKind::MenuItems,
        }
    }
}

/// Generating, deleting or renaming a module failed.
#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("module '{0}' does not exist")]
    MissingModule(ModuleId),

    #[error("a module named '{0}' already exists")]
    NameTaken(String),

    #[error("failed to emit module '{name}': {message}")]
    Emit { name: String, message: String },

    #[error("module I/O error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode module metadata: {0}")]
    Metadata(#[from] bincode::Error),
}

/// Writes generated modules.
pub trait ModuleGenerator {
    /// Emit a module named `output_name` from `template`.
    ///
    /// Generating over an existing module of the same name replaces its
    /// contents and keeps its id.
    fn generate_module(
        &mut self,
        template: &ModuleTemplate,
        output_name: &str,
    ) -> Result<ModuleId, GeneratorError>;

    fn delete_module(&mut self, module: &ModuleId) -> Result<(), GeneratorError>;

    /// Move a module to a new name. The module id survives.
    fn rename_module(
        &mut self,
        module: &ModuleId,
        new_name: &str,
    ) -> Result<ModuleId, GeneratorError>;
}

/// Read access to the generated modules.
pub trait ModuleCatalog {
    fn module_exists(&self, module: &ModuleId) -> bool;

    /// Current output name of a module.
    fn module_name(&self, module: &ModuleId) -> Option<String>;

    /// The class a module defines, if the module can be loaded.
    fn load_class(&self, module: &ModuleId) -> Option<TypeName>;

    /// Number of modules whose name starts with `prefix`.
    fn count_named(&self, prefix: &str) -> usize;
}

/// A module generator that can also be inspected.
pub trait ModuleStore: ModuleGenerator + ModuleCatalog {}

impl<T: ModuleGenerator + ModuleCatalog> ModuleStore for T {}

/// The host's asset index, which must be told about file changes.
pub trait AssetIndex {
    fn refresh(&mut self);
}

/// Borrowed host services for one pass or operation.
pub struct Services<'a> {
    pub discovery: &'a dyn TypeDiscovery,
    pub identity: &'a dyn DurableIdentity,
    pub modules: &'a mut dyn ModuleStore,
    pub index: &'a mut dyn AssetIndex,
}

impl Services<'_> {
    /// Durable id of `name`, or the empty id when the host has none.
    pub(crate) fn durable_id_or_empty(&self, name: &TypeName) -> DurableId {
        match self.identity.durable_id(name) {
            Ok(id) => id,
            Err(err) => {
                tracing::debug!(%err, "recording type without durable id");
                DurableId::EMPTY
            }
        }
    }
}
