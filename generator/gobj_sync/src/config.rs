//! Generation configuration and host object kinds.

use std::fmt;
use std::path::PathBuf;

/// Host object kind with its own generation database.
///
/// Behaviours are attached to scene objects and are picked through selector
/// modules. Scriptable objects are created from asset menus instead, so they
/// get menu items and no selectors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKind {
    Behaviour,
    ScriptableObject,
}

impl ObjectKind {
    pub const ALL: [ObjectKind; 2] = [ObjectKind::Behaviour, ObjectKind::ScriptableObject];

    /// Root class every discovered type of this kind derives from.
    pub fn base_type(self) -> &'static str {
        match self {
            ObjectKind::Behaviour => "UnityEngine.MonoBehaviour",
            ObjectKind::ScriptableObject => "GenericUnityObjects.GenericScriptableObject",
        }
    }

    /// File name of this kind's database inside the database directory.
    pub fn database_file_name(self) -> &'static str {
        match self {
            ObjectKind::Behaviour => "behaviours.gobjdb",
            ObjectKind::ScriptableObject => "scriptable_objects.gobjdb",
        }
    }

    /// Whether generic definitions get a generated selector module.
    pub fn uses_selectors(self) -> bool {
        matches!(self, ObjectKind::Behaviour)
    }

    /// Whether asset menu entries are compiled into a menu items module.
    pub fn uses_menu_items(self) -> bool {
        matches!(self, ObjectKind::ScriptableObject)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ObjectKind::Behaviour => "behaviour",
            ObjectKind::ScriptableObject => "scriptable-object",
        }
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where generated modules and databases live, and which kinds are managed.
#[derive(Clone, Debug)]
pub struct GenerationConfig {
    /// Directory that receives every generated module.
    pub modules_dir: PathBuf,
    /// Directory holding one database file per object kind.
    pub database_dir: PathBuf,
    /// Object kinds reconciled by a session, in pass order.
    pub kinds: Vec<ObjectKind>,
    /// Save dirty databases at the end of every pass.
    pub auto_save: bool,
}

impl GenerationConfig {
    /// Default location of generated modules, relative to the project root.
    pub const DEFAULT_MODULES_DIR: &'static str = "Assets/Plugins/GeneratedAssemblies";

    /// Default location of the databases, relative to the project root.
    pub const DEFAULT_DATABASE_DIR: &'static str = "Library/GenericObjects";

    /// Configuration rooted at a project directory, with every kind enabled.
    #[must_use]
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let root = project_root.into();
        Self {
            modules_dir: root.join(Self::DEFAULT_MODULES_DIR),
            database_dir: root.join(Self::DEFAULT_DATABASE_DIR),
            kinds: ObjectKind::ALL.to_vec(),
            auto_save: true,
        }
    }

    /// Set the generated modules directory.
    #[must_use]
    pub fn with_modules_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.modules_dir = dir.into();
        self
    }

    /// Set the database directory.
    #[must_use]
    pub fn with_database_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.database_dir = dir.into();
        self
    }

    /// Restrict the managed object kinds.
    #[must_use]
    pub fn with_kinds(mut self, kinds: impl IntoIterator<Item = ObjectKind>) -> Self {
        self.kinds = kinds.into_iter().collect();
        self.kinds.sort_unstable();
        self.kinds.dedup();
        self
    }

    /// Enable or disable saving at the end of every pass.
    #[must_use]
    pub fn with_auto_save(mut self, auto_save: bool) -> Self {
        self.auto_save = auto_save;
        self
    }

    /// Path of the database file for one kind.
    pub fn database_path(&self, kind: ObjectKind) -> PathBuf {
        self.database_dir.join(kind.database_file_name())
    }
}
