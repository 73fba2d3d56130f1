//! Concrete subclasses the user wrote by hand.

use gobj_ident::{ArgumentDescriptor, ModuleId};

use super::Pass;
use crate::services::{LoadedType, TypeShape};

impl Pass<'_, '_> {
    /// Record closed concrete types that are not in the database yet.
    ///
    /// They are backed by their own source artifact, identified by its
    /// durable id, and are never regenerated or deleted by the engine.
    /// Types backed by one of the generated modules are skipped: until the
    /// next recompilation the host still reports generated classes under
    /// their old names.
    pub(super) fn adopt_discovered(&mut self, closed: &[LoadedType]) {
        for ty in closed {
            let TypeShape::Closed {
                definition,
                arguments,
            } = &ty.shape
            else {
                continue;
            };
            let Some(generic) = self.db.find_generic_by_name(definition) else {
                tracing::debug!(ty = %ty.name, "concrete type of an unknown generic definition");
                continue;
            };
            if self.db.find_instantiation(generic, arguments).is_some() {
                continue;
            }

            let module = match self.services.identity.durable_id(&ty.name) {
                Ok(id) => ModuleId::from(&id),
                Err(err) => {
                    tracing::debug!(%err, "cannot adopt concrete type");
                    continue;
                }
            };
            if self.services.modules.module_exists(&module) {
                continue;
            }

            let Some(descriptor) = self.db.generic(generic).cloned() else {
                continue;
            };
            let argument_descriptors: Vec<ArgumentDescriptor> = arguments
                .iter()
                .map(|name| {
                    ArgumentDescriptor::new(name.clone(), self.services.durable_id_or_empty(name))
                })
                .collect();

            match self
                .db
                .adopt_instantiation(&descriptor, &argument_descriptors, module)
            {
                Ok(_) => {
                    tracing::debug!(ty = %ty.name, "adopted concrete type");
                    self.report.instantiations_adopted += 1;
                }
                Err(err) => tracing::debug!(ty = %ty.name, %err, "concrete type not adopted"),
            }
        }
    }
}
