//! Argument types shared between instantiations.

use gobj_db::{ArgumentIdx, GenericIdx};
use gobj_ident::TypeName;

use super::{Pass, Retrieved};

impl Pass<'_, '_> {
    /// Re-resolve every stored argument type.
    pub(super) fn diff_arguments(&mut self) {
        for argument in self.db.argument_indices() {
            // Earlier repairs in this loop may have pruned it.
            let Some(stored) = self.db.argument(argument).cloned() else {
                continue;
            };
            match self.retrieve(&stored.name, &stored.durable_id) {
                Retrieved::ByName(ty) => {
                    if stored.durable_id.is_empty() {
                        self.learn_argument_id(argument, &ty.name);
                    }
                }
                Retrieved::ByDurableId(ty) => self.rename_argument(argument, ty.name),
                Retrieved::Missing => self.orphan_argument(argument),
            }
        }
    }

    /// Fill in a durable id the host could not provide when the argument
    /// was first recorded.
    fn learn_argument_id(&mut self, argument: ArgumentIdx, name: &TypeName) {
        let Ok(id) = self.services.identity.durable_id(name) else {
            return;
        };
        if let Err(err) = self.db.update_argument_durable_id(argument, id) {
            tracing::debug!(argument = %name, %err, "argument keeps an empty durable id");
        }
    }

    /// The argument kept its durable id but changed its name.
    ///
    /// Every instantiation using it embeds the old name and is regenerated.
    /// A referencing definition that was renamed too is renamed first, which
    /// regenerates all of its instantiations; one that vanished is retired.
    pub(super) fn rename_argument(&mut self, argument: ArgumentIdx, new_name: TypeName) {
        let Some(old_name) = self.db.argument(argument).map(|arg| arg.name.clone()) else {
            return;
        };
        if let Err(err) = self.db.update_argument_identity(argument, new_name.clone()) {
            tracing::warn!(old = %old_name, new = %new_name, %err, "cannot rename argument");
            self.report.dropped += 1;
            self.orphan_argument(argument);
            return;
        }
        tracing::debug!(old = %old_name, new = %new_name, "argument renamed");
        self.report.arguments_renamed += 1;

        for generic in self.db.referencing_generics(argument) {
            if !self.generic_is_current(generic) {
                continue;
            }
            let tuples: Vec<Vec<ArgumentIdx>> = self
                .db
                .instantiations_with_argument(generic, argument)
                .filter(|inst| inst.is_generated())
                .map(|inst| inst.arguments.clone())
                .collect();
            for tuple in tuples {
                self.regenerate_instantiation(generic, &tuple);
            }
        }
    }

    /// Make sure a referencing definition still resolves under its stored
    /// name, repairing it otherwise. Returns `false` when the repair already
    /// took care of its instantiations.
    fn generic_is_current(&mut self, generic: GenericIdx) -> bool {
        let Some(stored) = self.db.generic(generic).cloned() else {
            return false;
        };
        match self.retrieve(&stored.name, &stored.durable_id) {
            Retrieved::ByName(_) => true,
            Retrieved::ByDurableId(ty) => {
                self.rename_generic(generic, ty.name);
                false
            }
            Retrieved::Missing => {
                self.retire_generic(generic);
                false
            }
        }
    }

    /// The argument type is gone: remove every instantiation using it.
    pub(super) fn orphan_argument(&mut self, argument: ArgumentIdx) {
        let name = self.db.argument(argument).map(|arg| arg.name.clone());
        let removed = self.db.remove_argument(argument);
        if let Some(name) = name {
            tracing::debug!(
                argument = %name,
                instantiations = removed.len(),
                "argument type vanished"
            );
            self.report.arguments_removed += 1;
        }
        self.delete_modules(
            removed
                .iter()
                .filter(|(_, inst)| inst.is_generated())
                .map(|(_, inst)| &inst.module),
        );
    }
}
