//! Generic definitions and the modules generated from them.

use gobj_db::{ArgumentIdx, GenericIdx};
use gobj_ident::naming::{concrete_module_name, selector_component_name, selector_module_name};
use gobj_ident::{GenericTypeDescriptor, ModuleId, TypeName};

use super::{Pass, Retrieved};
use crate::services::{GeneratorError, LoadedType, ModuleTemplate};

impl Pass<'_, '_> {
    /// Diff the loaded generic definitions against the stored ones.
    ///
    /// Exact matches are left alone. Of the rest, a name match wins over a
    /// durable id match; whatever is still unmatched is new or gone. A
    /// definition whose name and durable id both changed therefore counts as
    /// removed and re-added.
    pub(super) fn diff_generics(&mut self, definitions: &[LoadedType]) {
        let mut fresh: Vec<GenericTypeDescriptor> =
            definitions.iter().map(|ty| self.describe(ty)).collect();
        let mut stale = Vec::new();

        for generic in self.db.generic_indices() {
            let Some(stored) = self.db.generic(generic) else {
                continue;
            };
            if let Some(position) = fresh.iter().position(|new| new.same_identity(stored)) {
                fresh.remove(position);
                self.ensure_selector(generic);
            } else {
                stale.push(generic);
            }
        }

        // Every name match is settled before any durable id is consulted,
        // so a recreated name keeps its entry whatever the discovery order.
        let mut unmatched = Vec::new();
        for descriptor in fresh {
            if !self.match_stale_by_name(&mut stale, &descriptor) {
                unmatched.push(descriptor);
            }
        }
        for descriptor in unmatched {
            if !self.match_stale_by_id(&mut stale, &descriptor) {
                self.add_generic(descriptor);
            }
        }

        for generic in stale {
            self.retire_generic(generic);
        }
    }

    fn describe(&self, ty: &LoadedType) -> GenericTypeDescriptor {
        GenericTypeDescriptor::new(
            ty.name.clone(),
            self.services.durable_id_or_empty(&ty.name),
            ty.type_params().unwrap_or_default().to_vec(),
        )
    }

    /// Pair a new descriptor with the stored entry of the same name. The
    /// stored durable id is refreshed when the host reports one.
    fn match_stale_by_name(
        &mut self,
        stale: &mut Vec<GenericIdx>,
        descriptor: &GenericTypeDescriptor,
    ) -> bool {
        let by_name = stale.iter().position(|&generic| {
            self.db
                .generic(generic)
                .is_some_and(|stored| stored.name == descriptor.name)
        });
        let Some(position) = by_name else {
            return false;
        };
        let generic = stale.remove(position);
        if !descriptor.durable_id.is_empty() {
            if let Err(err) = self
                .db
                .update_generic_durable_id(generic, descriptor.durable_id.clone())
            {
                tracing::warn!(generic = %descriptor.name, %err, "keeping stale durable id");
            }
        }
        self.ensure_selector(generic);
        true
    }

    /// Pair a new descriptor with a stored entry that kept its durable id
    /// under another name.
    fn match_stale_by_id(
        &mut self,
        stale: &mut Vec<GenericIdx>,
        descriptor: &GenericTypeDescriptor,
    ) -> bool {
        if descriptor.durable_id.is_empty() {
            return false;
        }
        let by_id = stale.iter().position(|&generic| {
            self.db
                .generic(generic)
                .is_some_and(|stored| stored.durable_id == descriptor.durable_id)
        });
        let Some(position) = by_id else {
            return false;
        };
        let generic = stale.remove(position);
        self.rename_generic(generic, descriptor.name.clone());
        true
    }

    fn add_generic(&mut self, mut descriptor: GenericTypeDescriptor) {
        if self.kind.uses_selectors() {
            match self.generate_selector(&descriptor) {
                Ok(module) => descriptor.selector_module = Some(module),
                Err(err) => {
                    tracing::warn!(generic = %descriptor.name, %err, "failed to generate selector");
                    self.report.dropped += 1;
                    return;
                }
            }
        }

        let name = descriptor.name.clone();
        let selector = descriptor.selector_module.clone();
        match self.db.add_generic(descriptor) {
            Ok(_) => {
                tracing::debug!(generic = %name, "generic definition added");
                self.report.generics_added += 1;
            }
            Err(err) => {
                tracing::warn!(generic = %name, %err, "failed to register generic definition");
                self.report.dropped += 1;
                self.delete_modules(selector.as_ref());
            }
        }
    }

    /// The definition kept its durable id but changed its name.
    pub(super) fn rename_generic(&mut self, generic: GenericIdx, new_name: TypeName) {
        let Some(old) = self.db.generic(generic).cloned() else {
            return;
        };
        if let Err(err) = self.db.update_generic_identity(generic, new_name.clone()) {
            tracing::warn!(old = %old.name, new = %new_name, %err, "cannot rename generic definition");
            self.report.dropped += 1;
            self.retire_generic(generic);
            return;
        }
        tracing::debug!(old = %old.name, new = %new_name, "generic definition renamed");
        self.report.generics_renamed += 1;

        if self.kind.uses_selectors() {
            match old.selector_module {
                Some(module) => self.replace_selector(generic, &module),
                None => self.ensure_selector(generic),
            }
        }

        let tuples: Vec<Vec<ArgumentIdx>> = self
            .db
            .instantiations(generic)
            .iter()
            .filter(|inst| inst.is_generated())
            .map(|inst| inst.arguments.clone())
            .collect();
        for tuple in tuples {
            self.regenerate_instantiation(generic, &tuple);
        }
    }

    /// Delete the definition with every module generated for it.
    pub(super) fn retire_generic(&mut self, generic: GenericIdx) {
        let Some(removed) = self.db.remove_generic(generic) else {
            return;
        };
        tracing::debug!(generic = %removed.descriptor.name, "generic definition removed");
        self.report.generics_removed += 1;
        self.delete_modules(removed.generated_modules());
    }

    // === Selector modules ===

    fn selector_template(descriptor: &GenericTypeDescriptor) -> ModuleTemplate {
        ModuleTemplate::Selector {
            generic: descriptor.name.clone(),
            type_params: descriptor.type_params.clone(),
            component_name: selector_component_name(&descriptor.name, &descriptor.type_params),
        }
    }

    fn generate_selector(
        &mut self,
        descriptor: &GenericTypeDescriptor,
    ) -> Result<ModuleId, GeneratorError> {
        let template = Self::selector_template(descriptor);
        self.generate(&template, &selector_module_name(&descriptor.name))
    }

    /// Generate the selector of a known definition if it has none, or if
    /// its module disappeared.
    fn ensure_selector(&mut self, generic: GenericIdx) {
        if !self.kind.uses_selectors() {
            return;
        }
        let Some(descriptor) = self.db.generic(generic).cloned() else {
            return;
        };
        if descriptor
            .selector_module
            .as_ref()
            .is_some_and(|module| self.services.modules.module_exists(module))
        {
            return;
        }

        match self.generate_selector(&descriptor) {
            Ok(module) => {
                tracing::debug!(generic = %descriptor.name, %module, "selector restored");
                self.db.set_selector_module(generic, Some(module));
            }
            Err(err) => {
                tracing::warn!(generic = %descriptor.name, %err, "failed to restore selector");
                self.db.set_selector_module(generic, None);
                self.report.dropped += 1;
            }
        }
    }

    fn replace_selector(&mut self, generic: GenericIdx, module: &ModuleId) {
        let Some(descriptor) = self.db.generic(generic).cloned() else {
            return;
        };
        let template = Self::selector_template(&descriptor);
        let name = selector_module_name(&descriptor.name);
        match self.replace_module(module, &name, &template) {
            Ok(replaced) => {
                self.db.set_selector_module(generic, Some(replaced));
            }
            Err(err) => {
                tracing::warn!(generic = %descriptor.name, %err, "failed to regenerate selector");
                self.report.dropped += 1;
                self.db.set_selector_module(generic, None);
                if self.services.modules.module_exists(module) {
                    self.delete_modules([module]);
                }
            }
        }
    }

    // === Instantiation modules ===

    /// Regenerate one generated instantiation under its current names.
    ///
    /// Arguments are checked first. A stale argument is renamed instead,
    /// which regenerates every instantiation using it, this one included;
    /// a vanished argument takes the instantiation down with it.
    pub(super) fn regenerate_instantiation(&mut self, generic: GenericIdx, tuple: &[ArgumentIdx]) {
        for &argument in tuple {
            let Some(stored) = self.db.argument(argument).cloned() else {
                return;
            };
            match self.retrieve(&stored.name, &stored.durable_id) {
                Retrieved::ByName(_) => {}
                Retrieved::ByDurableId(ty) => {
                    self.rename_argument(argument, ty.name);
                    return;
                }
                Retrieved::Missing => {
                    self.orphan_argument(argument);
                    return;
                }
            }
        }

        let Some(generic_name) = self.db.generic(generic).map(|d| d.name.clone()) else {
            return;
        };
        let Some(inst) = self
            .db
            .instantiations(generic)
            .iter()
            .find(|inst| inst.arguments == tuple)
        else {
            return;
        };
        if !inst.is_generated() {
            return;
        }
        let module = inst.module.clone();
        let Some(arguments) = self.db.argument_names(inst) else {
            return;
        };

        let name = self.concrete_output_name(&module, &generic_name, &arguments);
        let template = ModuleTemplate::Concrete {
            kind: self.kind,
            generic: generic_name.clone(),
            arguments,
        };
        match self.replace_module(&module, &name, &template) {
            Ok(replaced) => {
                self.db.set_instantiation_module(generic, tuple, replaced);
            }
            Err(err) => {
                tracing::warn!(generic = %generic_name, %module, %err, "dropping instantiation");
                self.report.dropped += 1;
                self.db.remove_instantiation(generic, tuple);
                if self.services.modules.module_exists(&module) {
                    self.delete_modules([&module]);
                }
            }
        }
    }

    /// Target name for a regenerated concrete module. A module already at
    /// its target name keeps it; otherwise a taken name gets a count suffix.
    fn concrete_output_name(
        &self,
        module: &ModuleId,
        generic: &TypeName,
        arguments: &[TypeName],
    ) -> String {
        let base = concrete_module_name(generic, arguments);
        if self.services.modules.module_name(module).as_deref() == Some(base.as_str()) {
            return base;
        }
        match self.services.modules.count_named(&base) {
            0 => base,
            taken => format!("{base}_{taken}"),
        }
    }
}
