//! Directory-backed module generator.
//!
//! Every module is a binary plus a sidecar carrying its id and the class it
//! defines. Renaming moves both files, so the id (and with it every asset
//! reference to the module) survives; regenerating over an existing name
//! keeps the id already on disk.
//!
//! # File Layout
//!
//! ```text
//! <modules dir>/
//! ├── Game_Box_1.dll          # selector of Game.Box`1
//! ├── Game_Box_1.dll.meta     # bincode ModuleMeta { id, name, class }
//! ├── Box_Int32.dll
//! └── Box_Int32.dll.meta
//! ```

use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use gobj_ident::naming::class_friendly;
use gobj_ident::{ModuleId, TypeName};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::{GeneratorError, ModuleCatalog, ModuleGenerator, ModuleTemplate, TemplateKind};

const MODULE_EXTENSION: &str = ".dll";
const META_EXTENSION: &str = ".dll.meta";

/// Produces the binary of a generated module.
pub trait ModuleEmitter {
    /// Write the module for `template` to `path` and return the class it
    /// defines.
    fn emit(
        &self,
        template: &ModuleTemplate,
        output_name: &str,
        path: &Path,
    ) -> Result<TypeName, GeneratorError>;
}

/// Emits a plain-text declaration of the generated class.
///
/// Enough for tooling that only needs to know what a module defines.
#[derive(Clone, Copy, Debug, Default)]
pub struct DeclarationEmitter;

impl DeclarationEmitter {
    fn declaration(template: &ModuleTemplate, class: &str) -> String {
        let mut out = String::new();
        match template {
            ModuleTemplate::Selector {
                generic,
                component_name,
                ..
            } => {
                let _ = writeln!(out, "[AddComponentMenu(\"{component_name}\")]");
                let _ = writeln!(out, "class {class} : BehaviourSelector<{}> {{}}", generic.full_name());
            }
            ModuleTemplate::Concrete {
                generic, arguments, ..
            } => {
                let base = match template.kind() {
                    TemplateKind::ConcreteScriptableObject => "asset",
                    _ => "component",
                };
                let arguments: Vec<&str> = arguments.iter().map(TypeName::full_name).collect();
                let _ = writeln!(out, "// {base}");
                let _ = writeln!(
                    out,
                    "class {class} : {}<{}> {{}}",
                    generic.full_name(),
                    arguments.join(", ")
                );
            }
            ModuleTemplate::MenuItems { items } => {
                let _ = writeln!(out, "static class {class} {{");
                for item in items {
                    let _ = writeln!(
                        out,
                        "    [MenuItem(\"Assets/Create/{}\", priority = {})] static void Create{}() => Create<{}>(\"{}\");",
                        item.menu_name,
                        item.order,
                        class_friendly(item.generic.short_name()),
                        item.generic.full_name(),
                        item.file_name,
                    );
                }
                out.push_str("}\n");
            }
        }
        out
    }
}

impl ModuleEmitter for DeclarationEmitter {
    fn emit(
        &self,
        template: &ModuleTemplate,
        output_name: &str,
        path: &Path,
    ) -> Result<TypeName, GeneratorError> {
        let class = class_friendly(output_name);
        fs::write(path, Self::declaration(template, &class)).map_err(|source| {
            GeneratorError::Io {
                path: path.to_path_buf(),
                source,
            }
        })?;
        // One module per class; the module carries the output name.
        Ok(TypeName::new(class, output_name))
    }
}

/// Sidecar of one module.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
struct ModuleMeta {
    id: ModuleId,
    name: String,
    class: TypeName,
}

/// Generated modules in one directory.
pub struct FsModuleStore<E = DeclarationEmitter> {
    dir: PathBuf,
    emitter: E,
    modules: FxHashMap<ModuleId, ModuleMeta>,
}

impl<E> FsModuleStore<E> {
    /// Open (creating if needed) a modules directory and index its sidecars.
    ///
    /// Unreadable sidecars are skipped with a warning; their modules become
    /// invisible to the catalog and are pruned from the database later.
    pub fn open(dir: impl Into<PathBuf>, emitter: E) -> Result<Self, GeneratorError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|source| io_error(&dir, source))?;

        let mut modules = FxHashMap::default();
        let entries = fs::read_dir(&dir).map_err(|source| io_error(&dir, source))?;
        for entry in entries {
            let path = entry.map_err(|source| io_error(&dir, source))?.path();
            let is_meta = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.ends_with(META_EXTENSION));
            if !is_meta {
                continue;
            }
            match read_meta(&path) {
                Ok(meta) => {
                    modules.insert(meta.id.clone(), meta);
                }
                Err(err) => tracing::warn!(path = %path.display(), %err, "skipping module sidecar"),
            }
        }

        tracing::debug!(dir = %dir.display(), modules = modules.len(), "module store opened");
        Ok(Self {
            dir,
            emitter,
            modules,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of modules with a readable sidecar.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    fn module_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}{MODULE_EXTENSION}"))
    }

    fn meta_path(&self, name: &str) -> PathBuf {
        self.dir.join(format!("{name}{META_EXTENSION}"))
    }

    fn find_by_name(&self, name: &str) -> Option<&ModuleMeta> {
        self.modules.values().find(|meta| meta.name == name)
    }

    fn write_meta(&self, meta: &ModuleMeta) -> Result<(), GeneratorError> {
        let bytes = bincode::serialize(meta)?;
        let path = self.meta_path(&meta.name);
        fs::write(&path, bytes).map_err(|source| io_error(&path, source))
    }
}

impl<E: ModuleEmitter> ModuleGenerator for FsModuleStore<E> {
    fn generate_module(
        &mut self,
        template: &ModuleTemplate,
        output_name: &str,
    ) -> Result<ModuleId, GeneratorError> {
        let path = self.module_path(output_name);
        let class = self.emitter.emit(template, output_name, &path)?;

        let id = self.find_by_name(output_name).map_or_else(
            || ModuleId::new(Uuid::new_v4().simple().to_string()),
            |existing| existing.id.clone(),
        );
        let meta = ModuleMeta {
            id: id.clone(),
            name: output_name.to_string(),
            class,
        };
        self.write_meta(&meta)?;
        self.modules.insert(id.clone(), meta);

        tracing::debug!(module = %id, name = output_name, "module generated");
        Ok(id)
    }

    fn delete_module(&mut self, module: &ModuleId) -> Result<(), GeneratorError> {
        let meta = self
            .modules
            .remove(module)
            .ok_or_else(|| GeneratorError::MissingModule(module.clone()))?;
        remove_if_exists(&self.module_path(&meta.name))?;
        remove_if_exists(&self.meta_path(&meta.name))?;
        tracing::debug!(%module, name = %meta.name, "module deleted");
        Ok(())
    }

    fn rename_module(
        &mut self,
        module: &ModuleId,
        new_name: &str,
    ) -> Result<ModuleId, GeneratorError> {
        let old_name = match self.modules.get(module) {
            Some(meta) => meta.name.clone(),
            None => return Err(GeneratorError::MissingModule(module.clone())),
        };
        if old_name == new_name {
            return Ok(module.clone());
        }
        if self.find_by_name(new_name).is_some() {
            return Err(GeneratorError::NameTaken(new_name.to_string()));
        }

        let from = self.module_path(&old_name);
        if !from.is_file() {
            return Err(GeneratorError::MissingModule(module.clone()));
        }
        let to = self.module_path(new_name);
        fs::rename(&from, &to).map_err(|source| io_error(&to, source))?;
        remove_if_exists(&self.meta_path(&old_name))?;

        let Some(meta) = self.modules.get_mut(module) else {
            return Err(GeneratorError::MissingModule(module.clone()));
        };
        meta.name = new_name.to_string();
        let meta = meta.clone();
        self.write_meta(&meta)?;

        tracing::debug!(%module, old = %old_name, new = new_name, "module renamed");
        Ok(module.clone())
    }
}

impl<E> ModuleCatalog for FsModuleStore<E> {
    fn module_exists(&self, module: &ModuleId) -> bool {
        self.modules.get(module).is_some_and(|meta| {
            self.module_path(&meta.name).is_file()
        })
    }

    fn module_name(&self, module: &ModuleId) -> Option<String> {
        self.modules.get(module).map(|meta| meta.name.clone())
    }

    fn load_class(&self, module: &ModuleId) -> Option<TypeName> {
        if !self.module_exists(module) {
            return None;
        }
        self.modules.get(module).map(|meta| meta.class.clone())
    }

    fn count_named(&self, prefix: &str) -> usize {
        self.modules
            .values()
            .filter(|meta| meta.name.starts_with(prefix))
            .count()
    }
}

fn read_meta(path: &Path) -> Result<ModuleMeta, GeneratorError> {
    let bytes = fs::read(path).map_err(|source| io_error(path, source))?;
    Ok(bincode::deserialize(&bytes)?)
}

fn remove_if_exists(path: &Path) -> Result<(), GeneratorError> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(io_error(path, source)),
    }
}

fn io_error(path: &Path, source: io::Error) -> GeneratorError {
    GeneratorError::Io {
        path: path.to_path_buf(),
        source,
    }
}
