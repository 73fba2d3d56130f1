//! One reconciliation pass over a single object kind.
//!
//! The pass re-discovers the loaded types, diffs them against the database
//! and repairs both sides: database entries are renamed or removed, and the
//! generated modules behind them are regenerated or deleted. Every failure
//! is contained to the entry it happened on; that entry is dropped and the
//! pass moves on.

mod arguments;
mod discovered;
mod generics;
mod menu;

use gobj_db::GenerationDatabase;
use gobj_ident::{DurableId, ModuleId, TypeName};

use crate::services::{GeneratorError, LoadedType, ModuleTemplate, Services, TypeShape};
use crate::ObjectKind;

/// What one pass did.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PassReport {
    pub generics_added: usize,
    pub generics_renamed: usize,
    pub generics_removed: usize,
    pub arguments_renamed: usize,
    pub arguments_removed: usize,
    pub instantiations_adopted: usize,
    pub modules_regenerated: usize,
    /// Entries dropped because a module operation on them failed.
    pub dropped: usize,
    /// Whether any module file was written, moved or deleted.
    pub files_touched: bool,
}

/// How a stored type was found again.
#[derive(Debug)]
enum Retrieved {
    ByName(LoadedType),
    /// Under a new name, through its durable id.
    ByDurableId(LoadedType),
    Missing,
}

/// Bring `db` in line with the types currently loaded for `kind`.
///
/// Never fails: per-entry problems are logged and the entry is dropped.
/// The caller rebuilds the lookup table and refreshes the asset index
/// afterwards.
#[tracing::instrument(level = "debug", skip_all, fields(kind = %kind))]
pub fn reconcile(
    kind: ObjectKind,
    db: &mut GenerationDatabase,
    services: &mut Services<'_>,
) -> PassReport {
    let loaded = services.discovery.loaded_types(kind);
    let mut definitions = Vec::new();
    let mut closed = Vec::new();
    for ty in loaded {
        if ty.is_abstract {
            continue;
        }
        match ty.shape {
            TypeShape::GenericDefinition { .. } => definitions.push(ty),
            TypeShape::Closed { .. } => closed.push(ty),
            TypeShape::Plain => {}
        }
    }

    let mut pass = Pass {
        kind,
        db,
        services,
        report: PassReport::default(),
    };

    pass.diff_generics(&definitions);
    pass.diff_arguments();
    pass.adopt_discovered(&closed);
    if kind.uses_menu_items() {
        pass.sync_menu_items(&definitions);
    }

    tracing::info!(
        kind = %kind,
        added = pass.report.generics_added,
        renamed = pass.report.generics_renamed,
        removed = pass.report.generics_removed,
        arguments_renamed = pass.report.arguments_renamed,
        arguments_removed = pass.report.arguments_removed,
        regenerated = pass.report.modules_regenerated,
        dropped = pass.report.dropped,
        "reconciliation pass finished"
    );
    pass.report
}

struct Pass<'p, 's> {
    kind: ObjectKind,
    db: &'p mut GenerationDatabase,
    services: &'p mut Services<'s>,
    report: PassReport,
}

impl Pass<'_, '_> {
    /// Find a stored type again: by name first, then by durable id.
    fn retrieve(&self, name: &TypeName, durable_id: &DurableId) -> Retrieved {
        if let Some(ty) = self.services.discovery.resolve_by_name(name) {
            return Retrieved::ByName(ty);
        }
        if durable_id.is_empty() {
            return Retrieved::Missing;
        }
        self.services
            .identity
            .resolve_by_id(durable_id)
            .and_then(|renamed| self.services.discovery.resolve_by_name(&renamed))
            .map_or(Retrieved::Missing, Retrieved::ByDurableId)
    }

    fn generate(
        &mut self,
        template: &ModuleTemplate,
        output_name: &str,
    ) -> Result<ModuleId, GeneratorError> {
        self.report.files_touched = true;
        self.services.modules.generate_module(template, output_name)
    }

    /// Move `module` to `new_name` and regenerate its contents there.
    ///
    /// The module id is carried over, so references from user assets stay
    /// valid.
    fn replace_module(
        &mut self,
        module: &ModuleId,
        new_name: &str,
        template: &ModuleTemplate,
    ) -> Result<ModuleId, GeneratorError> {
        self.report.files_touched = true;
        let renamed = self.services.modules.rename_module(module, new_name)?;
        let regenerated = self.services.modules.generate_module(template, new_name)?;
        if regenerated != renamed {
            tracing::warn!(
                old = %renamed,
                new = %regenerated,
                "regenerated module changed its id"
            );
        }
        self.report.modules_regenerated += 1;
        Ok(regenerated)
    }

    fn delete_modules<'m>(&mut self, modules: impl IntoIterator<Item = &'m ModuleId>) {
        for module in modules {
            self.report.files_touched = true;
            if let Err(err) = self.services.modules.delete_module(module) {
                tracing::warn!(%module, %err, "failed to delete generated module");
            }
        }
    }
}
