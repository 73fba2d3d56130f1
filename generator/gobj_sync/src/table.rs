//! Building the runtime lookup table from the database.

use gobj_db::{ArgumentIdx, GenerationDatabase, GenericIdx, LookupSnapshot};
use gobj_ident::{ConcreteType, DurableId, ModuleId};

use crate::services::{DurableIdentity, ModuleCatalog};

/// Outcome of one table build.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TableReport {
    /// Resolvable (generic, arguments) entries in the new table.
    pub entries: usize,
    /// Instantiations removed because their backing module is gone.
    pub pruned: usize,
    /// Modules that exist but did not yield a class.
    pub failed_modules: Vec<ModuleId>,
}

/// Remove database references to generated modules that no longer exist.
///
/// Instantiations backed by a missing module are removed; a missing
/// selector is forgotten so that the next pass regenerates it. Returns the
/// missing module ids.
pub fn prune_missing_modules<C: ModuleCatalog + ?Sized>(
    db: &mut GenerationDatabase,
    catalog: &C,
) -> Vec<ModuleId> {
    let mut missing = Vec::new();
    let mut lost_instantiations: Vec<(GenericIdx, Vec<ArgumentIdx>)> = Vec::new();
    let mut lost_selectors = Vec::new();

    for (generic, descriptor) in db.generics() {
        if let Some(selector) = &descriptor.selector_module {
            if !catalog.module_exists(selector) {
                missing.push(selector.clone());
                lost_selectors.push(generic);
            }
        }
        for inst in db.instantiations(generic) {
            if inst.is_generated() && !catalog.module_exists(&inst.module) {
                tracing::warn!(
                    generic = %descriptor.name,
                    module = %inst.module,
                    "generated module was removed, dropping instantiation"
                );
                missing.push(inst.module.clone());
                lost_instantiations.push((generic, inst.arguments.clone()));
            }
        }
    }

    for generic in lost_selectors {
        db.set_selector_module(generic, None);
    }
    for (generic, tuple) in lost_instantiations {
        db.remove_instantiation(generic, &tuple);
    }
    missing
}

/// Collect the lookup entries for every resolvable instantiation.
///
/// Heals the database on the way: instantiations whose module or
/// hand-written class is gone are removed. Modules that cannot be loaded
/// are reported instead of aborting the build.
pub fn build_lookup<C: ModuleCatalog + ?Sized>(
    db: &mut GenerationDatabase,
    catalog: &C,
    identity: &dyn DurableIdentity,
) -> (LookupSnapshot, TableReport) {
    let before = db.instantiation_count();
    prune_missing_modules(db, catalog);
    let mut report = TableReport {
        pruned: before - db.instantiation_count(),
        ..TableReport::default()
    };
    let mut snapshot = LookupSnapshot::new();
    let mut vanished: Vec<(GenericIdx, Vec<ArgumentIdx>)> = Vec::new();

    for (generic, descriptor) in db.generics() {
        if let Some(selector) = &descriptor.selector_module {
            if catalog.load_class(selector).is_none() {
                report.failed_modules.push(selector.clone());
            }
        }
        snapshot.add_generic(descriptor.name.clone());

        for inst in db.instantiations(generic) {
            let Some(arguments) = db.argument_names(inst) else {
                continue;
            };
            let class = if inst.is_generated() {
                catalog.load_class(&inst.module)
            } else {
                let Some(class) = identity.resolve_by_id(&DurableId::new(inst.module.as_str()))
                else {
                    tracing::debug!(
                        generic = %descriptor.name,
                        module = %inst.module,
                        "hand-written concrete type is gone"
                    );
                    vanished.push((generic, inst.arguments.clone()));
                    continue;
                };
                Some(class)
            };

            let Some(class) = class else {
                tracing::warn!(module = %inst.module, "module does not yield a class");
                report.failed_modules.push(inst.module.clone());
                continue;
            };
            let concrete = ConcreteType {
                name: class,
                module: inst.module.clone(),
            };
            if let Some(replaced) = snapshot.insert(descriptor.name.clone(), arguments, concrete) {
                tracing::warn!(
                    generic = %descriptor.name,
                    module = %replaced.module,
                    "two instantiations resolve to the same argument types"
                );
            }
        }
    }

    for (generic, tuple) in vanished {
        db.remove_instantiation(generic, &tuple);
        report.pruned += 1;
    }

    report.entries = snapshot.len();
    (snapshot, report)
}
