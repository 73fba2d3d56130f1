//! In-memory host services for tests.

use std::collections::BTreeMap;

use gobj_ident::naming::class_friendly;
use gobj_ident::{DurableId, ModuleId, TypeName};
use rustc_hash::FxHashSet;

use crate::services::{
    AssetIndex, DurableIdentity, GeneratorError, IdentityUnavailable, LoadedType, ModuleCatalog,
    ModuleGenerator, ModuleTemplate, Services, TypeDiscovery, TypeShape,
};
use crate::ObjectKind;

pub(crate) fn game(full_name: &str) -> TypeName {
    TypeName::new(full_name, "Game.Runtime")
}

pub(crate) fn int() -> TypeName {
    TypeName::new("System.Int32", "mscorlib")
}

pub(crate) fn text() -> TypeName {
    TypeName::new("System.String", "mscorlib")
}

struct HostType {
    /// Root class the type derives from, if any.
    base: Option<&'static str>,
    ty: LoadedType,
    id: Option<DurableId>,
}

/// Loaded types with their durable ids.
#[derive(Default)]
pub(crate) struct FakeHost {
    types: Vec<HostType>,
}

impl FakeHost {
    pub(crate) fn add(&mut self, kind: Option<ObjectKind>, ty: LoadedType, id: &str) {
        self.types.push(HostType {
            base: kind.map(ObjectKind::base_type),
            ty,
            id: (!id.is_empty()).then(|| DurableId::new(id)),
        });
    }

    pub(crate) fn add_generic(&mut self, kind: ObjectKind, name: &TypeName, params: &[&str], id: &str) {
        let params = params.iter().map(ToString::to_string).collect();
        self.add(Some(kind), LoadedType::generic_definition(name.clone(), params), id);
    }

    /// An argument type, such as `System.Int32`.
    pub(crate) fn add_plain(&mut self, name: &TypeName, id: &str) {
        self.add(None, LoadedType::plain(name.clone()), id);
    }

    /// Rename a type, keeping its durable id. References from closed types
    /// follow the rename.
    pub(crate) fn rename(&mut self, old: &TypeName, new: &TypeName) {
        for entry in &mut self.types {
            if &entry.ty.name == old {
                entry.ty.name = new.clone();
            }
            if let TypeShape::Closed {
                definition,
                arguments,
            } = &mut entry.ty.shape
            {
                if definition == old {
                    *definition = new.clone();
                }
                for argument in arguments.iter_mut() {
                    if argument == old {
                        *argument = new.clone();
                    }
                }
            }
        }
    }

    /// Replace the durable id of a type.
    pub(crate) fn reassign_id(&mut self, name: &TypeName, id: &str) {
        for entry in &mut self.types {
            if &entry.ty.name == name {
                entry.id = (!id.is_empty()).then(|| DurableId::new(id));
            }
        }
    }

    pub(crate) fn remove(&mut self, name: &TypeName) {
        self.types.retain(|entry| &entry.ty.name != name);
    }
}

impl TypeDiscovery for FakeHost {
    fn loaded_types(&self, kind: ObjectKind) -> Vec<LoadedType> {
        self.types
            .iter()
            .filter(|entry| entry.base == Some(kind.base_type()))
            .map(|entry| entry.ty.clone())
            .collect()
    }

    fn resolve_by_name(&self, name: &TypeName) -> Option<LoadedType> {
        self.types
            .iter()
            .find(|entry| &entry.ty.name == name)
            .map(|entry| entry.ty.clone())
    }
}

impl DurableIdentity for FakeHost {
    fn durable_id(&self, name: &TypeName) -> Result<DurableId, IdentityUnavailable> {
        self.types
            .iter()
            .find(|entry| &entry.ty.name == name)
            .and_then(|entry| entry.id.clone())
            .ok_or_else(|| IdentityUnavailable(name.clone()))
    }

    fn resolve_by_id(&self, id: &DurableId) -> Option<TypeName> {
        self.types
            .iter()
            .find(|entry| entry.id.as_ref() == Some(id))
            .map(|entry| entry.ty.name.clone())
    }
}

#[derive(Clone, Debug)]
pub(crate) struct FakeModule {
    pub(crate) name: String,
    pub(crate) template: ModuleTemplate,
}

/// Generated modules kept in memory.
#[derive(Default)]
pub(crate) struct FakeModules {
    modules: BTreeMap<ModuleId, FakeModule>,
    next_id: u32,
    failing: FxHashSet<String>,
}

impl FakeModules {
    /// Make generation of `name` fail until [`recover`](Self::recover).
    pub(crate) fn fail(&mut self, name: &str) {
        self.failing.insert(name.to_string());
    }

    pub(crate) fn recover(&mut self) {
        self.failing.clear();
    }

    /// Simulate the user deleting a module behind the engine's back.
    pub(crate) fn lose(&mut self, module: &ModuleId) {
        self.modules.remove(module);
    }

    pub(crate) fn named(&self, name: &str) -> Option<&ModuleId> {
        self.modules
            .iter()
            .find(|(_, module)| module.name == name)
            .map(|(id, _)| id)
    }

    pub(crate) fn get(&self, module: &ModuleId) -> Option<&FakeModule> {
        self.modules.get(module)
    }

    /// Output names of every module, sorted.
    pub(crate) fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.modules.values().map(|m| m.name.clone()).collect();
        names.sort();
        names
    }
}

impl ModuleGenerator for FakeModules {
    fn generate_module(
        &mut self,
        template: &ModuleTemplate,
        output_name: &str,
    ) -> Result<ModuleId, GeneratorError> {
        if self.failing.contains(output_name) {
            return Err(GeneratorError::Emit {
                name: output_name.to_string(),
                message: "compilation failed".to_string(),
            });
        }
        let id = match self.named(output_name) {
            Some(id) => id.clone(),
            None => {
                self.next_id += 1;
                ModuleId::new(format!("module-{}", self.next_id))
            }
        };
        self.modules.insert(
            id.clone(),
            FakeModule {
                name: output_name.to_string(),
                template: template.clone(),
            },
        );
        Ok(id)
    }

    fn delete_module(&mut self, module: &ModuleId) -> Result<(), GeneratorError> {
        self.modules
            .remove(module)
            .map(|_| ())
            .ok_or_else(|| GeneratorError::MissingModule(module.clone()))
    }

    fn rename_module(
        &mut self,
        module: &ModuleId,
        new_name: &str,
    ) -> Result<ModuleId, GeneratorError> {
        if self.named(new_name).is_some_and(|existing| existing != module) {
            return Err(GeneratorError::NameTaken(new_name.to_string()));
        }
        let entry = self
            .modules
            .get_mut(module)
            .ok_or_else(|| GeneratorError::MissingModule(module.clone()))?;
        entry.name = new_name.to_string();
        Ok(module.clone())
    }
}

impl ModuleCatalog for FakeModules {
    fn module_exists(&self, module: &ModuleId) -> bool {
        self.modules.contains_key(module)
    }

    fn module_name(&self, module: &ModuleId) -> Option<String> {
        self.modules.get(module).map(|m| m.name.clone())
    }

    fn load_class(&self, module: &ModuleId) -> Option<TypeName> {
        self.modules
            .get(module)
            .map(|m| TypeName::new(class_friendly(&m.name), m.name.clone()))
    }

    fn count_named(&self, prefix: &str) -> usize {
        self.modules
            .values()
            .filter(|m| m.name.starts_with(prefix))
            .count()
    }
}

#[derive(Default)]
pub(crate) struct FakeIndex {
    pub(crate) refreshes: usize,
}

impl AssetIndex for FakeIndex {
    fn refresh(&mut self) {
        self.refreshes += 1;
    }
}

/// Everything a pass needs, owned in one place.
#[derive(Default)]
pub(crate) struct Harness {
    pub(crate) host: FakeHost,
    pub(crate) modules: FakeModules,
    pub(crate) index: FakeIndex,
}

impl Harness {
    pub(crate) fn services(&mut self) -> Services<'_> {
        Services {
            discovery: &self.host,
            identity: &self.host,
            modules: &mut self.modules,
            index: &mut self.index,
        }
    }
}
