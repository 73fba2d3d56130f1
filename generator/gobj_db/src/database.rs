//! The generation database.

use gobj_ident::{ArgumentDescriptor, DurableId, GenericTypeDescriptor, ModuleId, TypeName};
use rustc_hash::FxHashMap;

use crate::{
    ArgumentIdx, ConcreteInstantiation, DatabaseError, GenericIdx, InstantiationOrigin, MenuItem,
};

/// A generic definition together with everything instantiated from it.
#[derive(Clone, Debug)]
struct GenericSlot {
    descriptor: GenericTypeDescriptor,
    instantiations: Vec<ConcreteInstantiation>,
}

/// A generic definition removed from the database, with the instantiations
/// that went with it.
#[derive(Clone, Debug)]
pub struct RemovedGeneric {
    pub descriptor: GenericTypeDescriptor,
    pub instantiations: Vec<ConcreteInstantiation>,
}

impl RemovedGeneric {
    /// Every generated module that belonged to the definition: its selector
    /// and the modules of generated instantiations.
    pub fn generated_modules(&self) -> impl Iterator<Item = &ModuleId> {
        self.descriptor.selector_module.iter().chain(
            self.instantiations
                .iter()
                .filter(|inst| inst.is_generated())
                .map(|inst| &inst.module),
        )
    }
}

/// Persistent store of generic definitions, their instantiations and the
/// shared argument descriptors those instantiations reference.
///
/// Invariants:
/// - no generic has two instantiations with the same ordered argument tuple;
/// - every argument slot is referenced by at least one instantiation;
/// - names and non-empty durable ids are unique within each arena.
#[derive(Clone, Debug, Default)]
pub struct GenerationDatabase {
    generics: Vec<Option<GenericSlot>>,
    arguments: Vec<Option<ArgumentDescriptor>>,

    generics_by_name: FxHashMap<TypeName, GenericIdx>,
    generics_by_id: FxHashMap<DurableId, GenericIdx>,
    arguments_by_name: FxHashMap<TypeName, ArgumentIdx>,
    arguments_by_id: FxHashMap<DurableId, ArgumentIdx>,

    /// Argument -> generic -> number of that generic's instantiations using
    /// the argument. Drives both reverse lookup and pruning.
    argument_users: FxHashMap<ArgumentIdx, FxHashMap<GenericIdx, usize>>,

    menu_items: Vec<MenuItem>,
    menu_module: Option<ModuleId>,
    dirty: bool,
}

impl GenerationDatabase {
    /// Create an empty database.
    pub fn new() -> Self {
        Self::default()
    }

    // === Queries ===

    pub fn generic(&self, idx: GenericIdx) -> Option<&GenericTypeDescriptor> {
        self.slot(idx).map(|slot| &slot.descriptor)
    }

    pub fn argument(&self, idx: ArgumentIdx) -> Option<&ArgumentDescriptor> {
        self.arguments.get(idx.index()).and_then(Option::as_ref)
    }

    /// All live generic definitions, in registration order.
    pub fn generics(&self) -> impl Iterator<Item = (GenericIdx, &GenericTypeDescriptor)> {
        self.generics.iter().enumerate().filter_map(|(i, slot)| {
            slot.as_ref()
                .map(|slot| (GenericIdx::from_usize(i), &slot.descriptor))
        })
    }

    /// All live argument descriptors, in registration order.
    pub fn arguments(&self) -> impl Iterator<Item = (ArgumentIdx, &ArgumentDescriptor)> {
        self.arguments.iter().enumerate().filter_map(|(i, arg)| {
            arg.as_ref().map(|arg| (ArgumentIdx::from_usize(i), arg))
        })
    }

    /// Snapshot of the live generic indices, for loops that mutate.
    pub fn generic_indices(&self) -> Vec<GenericIdx> {
        self.generics().map(|(idx, _)| idx).collect()
    }

    /// Snapshot of the live argument indices, for loops that mutate.
    pub fn argument_indices(&self) -> Vec<ArgumentIdx> {
        self.arguments().map(|(idx, _)| idx).collect()
    }

    pub fn generic_count(&self) -> usize {
        self.generics_by_name.len()
    }

    pub fn argument_count(&self) -> usize {
        self.arguments_by_name.len()
    }

    pub fn instantiation_count(&self) -> usize {
        self.generics
            .iter()
            .flatten()
            .map(|slot| slot.instantiations.len())
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.generic_count() == 0 && self.menu_items.is_empty() && self.menu_module.is_none()
    }

    pub fn find_generic_by_name(&self, name: &TypeName) -> Option<GenericIdx> {
        self.generics_by_name.get(name).copied()
    }

    pub fn find_generic_by_id(&self, id: &DurableId) -> Option<GenericIdx> {
        if id.is_empty() {
            return None;
        }
        self.generics_by_id.get(id).copied()
    }

    pub fn find_argument_by_name(&self, name: &TypeName) -> Option<ArgumentIdx> {
        self.arguments_by_name.get(name).copied()
    }

    pub fn find_argument_by_id(&self, id: &DurableId) -> Option<ArgumentIdx> {
        if id.is_empty() {
            return None;
        }
        self.arguments_by_id.get(id).copied()
    }

    /// Instantiations of one generic definition. Empty for stale indices.
    pub fn instantiations(&self, generic: GenericIdx) -> &[ConcreteInstantiation] {
        self.slot(generic)
            .map_or(&[], |slot| slot.instantiations.as_slice())
    }

    /// Instantiations of `generic` that use `argument` at any position.
    pub fn instantiations_with_argument(
        &self,
        generic: GenericIdx,
        argument: ArgumentIdx,
    ) -> impl Iterator<Item = &ConcreteInstantiation> {
        self.instantiations(generic)
            .iter()
            .filter(move |inst| inst.uses(argument))
    }

    /// Generic definitions with at least one instantiation using `argument`,
    /// in index order.
    pub fn referencing_generics(&self, argument: ArgumentIdx) -> Vec<GenericIdx> {
        let mut generics: Vec<GenericIdx> = self
            .argument_users
            .get(&argument)
            .map(|users| users.keys().copied().collect())
            .unwrap_or_default();
        generics.sort_unstable();
        generics
    }

    /// Reverse lookup: every (generic, instantiation) pair that uses
    /// `argument` anywhere in its tuple.
    pub fn find_instantiations_referencing(
        &self,
        argument: ArgumentIdx,
    ) -> Vec<(GenericIdx, &ConcreteInstantiation)> {
        self.referencing_generics(argument)
            .into_iter()
            .flat_map(|generic| {
                self.instantiations_with_argument(generic, argument)
                    .map(move |inst| (generic, inst))
            })
            .collect()
    }

    /// Current names of an instantiation's arguments, in order.
    pub fn argument_names(&self, instantiation: &ConcreteInstantiation) -> Option<Vec<TypeName>> {
        instantiation
            .arguments
            .iter()
            .map(|&idx| self.argument(idx).map(|arg| arg.name.clone()))
            .collect()
    }

    /// Find the instantiation of `generic` whose arguments currently carry
    /// exactly these names, in this order.
    pub fn find_instantiation(
        &self,
        generic: GenericIdx,
        argument_names: &[TypeName],
    ) -> Option<&ConcreteInstantiation> {
        let indices: Option<Vec<ArgumentIdx>> = argument_names
            .iter()
            .map(|name| self.find_argument_by_name(name))
            .collect();
        let indices = indices?;
        self.instantiations(generic)
            .iter()
            .find(|inst| inst.arguments == indices)
    }

    pub fn menu_items(&self) -> &[MenuItem] {
        &self.menu_items
    }

    /// The generated module holding the menu items, if one exists.
    pub fn menu_module(&self) -> Option<&ModuleId> {
        self.menu_module.as_ref()
    }

    /// Whether anything changed since the last save.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    // === Mutations ===

    /// Register a generic definition with no instantiations.
    pub fn add_generic(
        &mut self,
        descriptor: GenericTypeDescriptor,
    ) -> Result<GenericIdx, DatabaseError> {
        if self.find_existing_generic(&descriptor).is_some() {
            return Err(DatabaseError::DuplicateGeneric(descriptor.name));
        }
        Ok(self.insert_generic(descriptor))
    }

    /// Record a generated instantiation of `generic`.
    ///
    /// Registers the generic definition if it is not known yet, and reuses
    /// already-registered argument descriptors (matched by durable id, then
    /// by name).
    pub fn add_instantiation(
        &mut self,
        generic: &GenericTypeDescriptor,
        arguments: &[ArgumentDescriptor],
        module: ModuleId,
    ) -> Result<GenericIdx, DatabaseError> {
        self.insert_instantiation(generic, arguments, module, InstantiationOrigin::Generated)
    }

    /// Record a concrete subclass that the user wrote by hand.
    pub fn adopt_instantiation(
        &mut self,
        generic: &GenericTypeDescriptor,
        arguments: &[ArgumentDescriptor],
        module: ModuleId,
    ) -> Result<GenericIdx, DatabaseError> {
        self.insert_instantiation(generic, arguments, module, InstantiationOrigin::Discovered)
    }

    pub(crate) fn insert_instantiation(
        &mut self,
        generic: &GenericTypeDescriptor,
        arguments: &[ArgumentDescriptor],
        module: ModuleId,
        origin: InstantiationOrigin,
    ) -> Result<GenericIdx, DatabaseError> {
        let existing = self.find_existing_generic(generic);

        let expected = existing
            .and_then(|idx| self.generic(idx))
            .map_or(generic.arity(), GenericTypeDescriptor::arity);
        if expected != 0 && expected != arguments.len() {
            return Err(DatabaseError::ArityMismatch {
                generic: generic.name.clone(),
                expected,
                found: arguments.len(),
            });
        }

        // Check for a duplicate before interning anything, so a rejected call
        // leaves no orphaned argument slots behind.
        if let Some(generic_idx) = existing {
            let known: Option<Vec<ArgumentIdx>> = arguments
                .iter()
                .map(|arg| self.find_existing_argument(arg))
                .collect();
            if let Some(known) = known {
                if self
                    .instantiations(generic_idx)
                    .iter()
                    .any(|inst| inst.arguments == known)
                {
                    return Err(DatabaseError::DuplicateInstantiation {
                        generic: generic.name.clone(),
                        arguments: join_names(arguments.iter().map(|arg| &arg.name)),
                    });
                }
            }
        }

        let generic_idx = match existing {
            Some(idx) => idx,
            None => self.insert_generic(generic.clone()),
        };
        let argument_indices: Vec<ArgumentIdx> = arguments
            .iter()
            .map(|arg| self.intern_argument(arg))
            .collect();

        for &argument in &argument_indices {
            self.retain_argument(argument, generic_idx);
        }

        if let Some(slot) = self.slot_mut(generic_idx) {
            slot.instantiations.push(ConcreteInstantiation {
                arguments: argument_indices,
                module,
                origin,
            });
        }
        self.dirty = true;
        Ok(generic_idx)
    }

    /// Remove one instantiation, pruning arguments nothing uses anymore.
    pub fn remove_instantiation(
        &mut self,
        generic: GenericIdx,
        arguments: &[ArgumentIdx],
    ) -> Option<ConcreteInstantiation> {
        let slot = self.slot_mut(generic)?;
        let position = slot
            .instantiations
            .iter()
            .position(|inst| inst.arguments == arguments)?;
        let removed = slot.instantiations.remove(position);

        for &argument in &removed.arguments {
            self.release_argument(argument, generic);
        }
        self.dirty = true;
        Some(removed)
    }

    /// Remove a generic definition and all of its instantiations.
    pub fn remove_generic(&mut self, generic: GenericIdx) -> Option<RemovedGeneric> {
        let slot = self.generics.get_mut(generic.index())?.take()?;

        if self.generics_by_name.get(&slot.descriptor.name) == Some(&generic) {
            self.generics_by_name.remove(&slot.descriptor.name);
        }
        if self.generics_by_id.get(&slot.descriptor.durable_id) == Some(&generic) {
            self.generics_by_id.remove(&slot.descriptor.durable_id);
        }

        for inst in &slot.instantiations {
            for &argument in &inst.arguments {
                self.release_argument(argument, generic);
            }
        }
        self.dirty = true;

        Some(RemovedGeneric {
            descriptor: slot.descriptor,
            instantiations: slot.instantiations,
        })
    }

    /// Remove an argument and every instantiation that uses it.
    ///
    /// Returns the removed instantiations so the caller can delete their
    /// modules.
    pub fn remove_argument(
        &mut self,
        argument: ArgumentIdx,
    ) -> Vec<(GenericIdx, ConcreteInstantiation)> {
        let mut removed = Vec::new();

        for generic in self.referencing_generics(argument) {
            let tuples: Vec<Vec<ArgumentIdx>> = self
                .instantiations_with_argument(generic, argument)
                .map(|inst| inst.arguments.clone())
                .collect();
            for tuple in tuples {
                if let Some(inst) = self.remove_instantiation(generic, &tuple) {
                    removed.push((generic, inst));
                }
            }
        }

        // Normally pruned by the last removal above; an argument with no
        // users is dropped here.
        if self.argument(argument).is_some() {
            self.prune_argument(argument);
            self.dirty = true;
        }
        removed
    }

    /// Repair the name of a generic definition in place.
    ///
    /// The durable id and every instantiation link are left untouched.
    pub fn update_generic_identity(
        &mut self,
        generic: GenericIdx,
        new_name: TypeName,
    ) -> Result<(), DatabaseError> {
        let old_name = match self.generic(generic) {
            Some(descriptor) => descriptor.name.clone(),
            None => return Err(DatabaseError::UnknownGeneric(generic)),
        };
        if old_name == new_name {
            return Ok(());
        }
        if self.generics_by_name.contains_key(&new_name) {
            return Err(DatabaseError::NameTaken(new_name));
        }

        self.generics_by_name.remove(&old_name);
        self.generics_by_name.insert(new_name.clone(), generic);
        if let Some(slot) = self.slot_mut(generic) {
            slot.descriptor.name = new_name;
        }
        self.dirty = true;
        Ok(())
    }

    /// Replace the durable id of a generic definition in place.
    pub fn update_generic_durable_id(
        &mut self,
        generic: GenericIdx,
        new_id: DurableId,
    ) -> Result<(), DatabaseError> {
        let old_id = match self.generic(generic) {
            Some(descriptor) => descriptor.durable_id.clone(),
            None => return Err(DatabaseError::UnknownGeneric(generic)),
        };
        if old_id == new_id {
            return Ok(());
        }
        if !new_id.is_empty() && self.generics_by_id.contains_key(&new_id) {
            return Err(DatabaseError::DurableIdTaken(new_id));
        }

        self.generics_by_id.remove(&old_id);
        if !new_id.is_empty() {
            self.generics_by_id.insert(new_id.clone(), generic);
        }
        if let Some(slot) = self.slot_mut(generic) {
            slot.descriptor.durable_id = new_id;
        }
        self.dirty = true;
        Ok(())
    }

    /// Repair the name of an argument in place. Every instantiation using
    /// the argument sees the new name.
    pub fn update_argument_identity(
        &mut self,
        argument: ArgumentIdx,
        new_name: TypeName,
    ) -> Result<(), DatabaseError> {
        let old_name = match self.argument(argument) {
            Some(descriptor) => descriptor.name.clone(),
            None => return Err(DatabaseError::UnknownArgument(argument)),
        };
        if old_name == new_name {
            return Ok(());
        }
        if self.arguments_by_name.contains_key(&new_name) {
            return Err(DatabaseError::NameTaken(new_name));
        }

        self.arguments_by_name.remove(&old_name);
        self.arguments_by_name.insert(new_name.clone(), argument);
        if let Some(Some(descriptor)) = self.arguments.get_mut(argument.index()) {
            descriptor.name = new_name;
        }
        self.dirty = true;
        Ok(())
    }

    /// Replace the durable id of an argument in place.
    pub fn update_argument_durable_id(
        &mut self,
        argument: ArgumentIdx,
        new_id: DurableId,
    ) -> Result<(), DatabaseError> {
        let old_id = match self.argument(argument) {
            Some(descriptor) => descriptor.durable_id.clone(),
            None => return Err(DatabaseError::UnknownArgument(argument)),
        };
        if old_id == new_id {
            return Ok(());
        }
        if !new_id.is_empty() && self.arguments_by_id.contains_key(&new_id) {
            return Err(DatabaseError::DurableIdTaken(new_id));
        }

        self.arguments_by_id.remove(&old_id);
        if !new_id.is_empty() {
            self.arguments_by_id.insert(new_id.clone(), argument);
        }
        if let Some(Some(descriptor)) = self.arguments.get_mut(argument.index()) {
            descriptor.durable_id = new_id;
        }
        self.dirty = true;
        Ok(())
    }

    /// Point a generic definition at a (new) selector module.
    pub fn set_selector_module(&mut self, generic: GenericIdx, module: Option<ModuleId>) -> bool {
        let Some(slot) = self.slot_mut(generic) else {
            return false;
        };
        let changed = slot.descriptor.selector_module != module;
        slot.descriptor.selector_module = module;
        self.dirty |= changed;
        true
    }

    /// Point an instantiation at a (new) backing module.
    pub fn set_instantiation_module(
        &mut self,
        generic: GenericIdx,
        arguments: &[ArgumentIdx],
        module: ModuleId,
    ) -> bool {
        let Some(inst) = self
            .slot_mut(generic)
            .and_then(|slot| {
                slot.instantiations
                    .iter_mut()
                    .find(|inst| inst.arguments == arguments)
            })
        else {
            return false;
        };
        let changed = inst.module != module;
        inst.module = module;
        self.dirty |= changed;
        true
    }

    pub fn set_menu_items(&mut self, items: Vec<MenuItem>) {
        if self.menu_items != items {
            self.menu_items = items;
            self.dirty = true;
        }
    }

    pub fn set_menu_module(&mut self, module: Option<ModuleId>) {
        if self.menu_module != module {
            self.menu_module = module;
            self.dirty = true;
        }
    }

    /// Forget pending changes, typically right after a save.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    // === Internals ===

    fn slot(&self, idx: GenericIdx) -> Option<&GenericSlot> {
        self.generics.get(idx.index()).and_then(Option::as_ref)
    }

    fn slot_mut(&mut self, idx: GenericIdx) -> Option<&mut GenericSlot> {
        self.generics.get_mut(idx.index()).and_then(Option::as_mut)
    }

    /// Name match first; durable id only when the name is unknown.
    fn find_existing_generic(&self, descriptor: &GenericTypeDescriptor) -> Option<GenericIdx> {
        self.find_generic_by_name(&descriptor.name)
            .or_else(|| self.find_generic_by_id(&descriptor.durable_id))
    }

    /// Durable id first, since arguments are shared by identity; name when
    /// the id is unavailable.
    fn find_existing_argument(&self, descriptor: &ArgumentDescriptor) -> Option<ArgumentIdx> {
        self.find_argument_by_id(&descriptor.durable_id)
            .or_else(|| self.find_argument_by_name(&descriptor.name))
    }

    fn insert_generic(&mut self, descriptor: GenericTypeDescriptor) -> GenericIdx {
        let idx = GenericIdx::from_usize(self.generics.len());
        self.generics_by_name.insert(descriptor.name.clone(), idx);
        if !descriptor.durable_id.is_empty() {
            self.generics_by_id
                .insert(descriptor.durable_id.clone(), idx);
        }
        self.generics.push(Some(GenericSlot {
            descriptor,
            instantiations: Vec::new(),
        }));
        self.dirty = true;
        idx
    }

    fn intern_argument(&mut self, descriptor: &ArgumentDescriptor) -> ArgumentIdx {
        if let Some(idx) = self.find_existing_argument(descriptor) {
            // An id learned later fills in a name-only entry.
            let fill_id = self.argument(idx).is_some_and(|arg| arg.durable_id.is_empty())
                && !descriptor.durable_id.is_empty()
                && !self.arguments_by_id.contains_key(&descriptor.durable_id);
            if fill_id {
                self.arguments_by_id
                    .insert(descriptor.durable_id.clone(), idx);
                if let Some(Some(arg)) = self.arguments.get_mut(idx.index()) {
                    arg.durable_id = descriptor.durable_id.clone();
                }
            }
            return idx;
        }

        let idx = ArgumentIdx::from_usize(self.arguments.len());
        self.arguments_by_name.insert(descriptor.name.clone(), idx);
        if !descriptor.durable_id.is_empty() {
            self.arguments_by_id
                .insert(descriptor.durable_id.clone(), idx);
        }
        self.arguments.push(Some(descriptor.clone()));
        idx
    }

    fn retain_argument(&mut self, argument: ArgumentIdx, generic: GenericIdx) {
        *self
            .argument_users
            .entry(argument)
            .or_default()
            .entry(generic)
            .or_default() += 1;
    }

    /// Drop one use of `argument` by `generic`; prune the argument once
    /// nothing uses it.
    fn release_argument(&mut self, argument: ArgumentIdx, generic: GenericIdx) {
        let Some(users) = self.argument_users.get_mut(&argument) else {
            return;
        };
        if let Some(count) = users.get_mut(&generic) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                users.remove(&generic);
            }
        }
        if users.is_empty() {
            self.prune_argument(argument);
        }
    }

    fn prune_argument(&mut self, argument: ArgumentIdx) {
        self.argument_users.remove(&argument);
        let Some(descriptor) = self
            .arguments
            .get_mut(argument.index())
            .and_then(Option::take)
        else {
            return;
        };
        tracing::debug!(argument = %descriptor.name, "pruned unused argument");

        if self.arguments_by_name.get(&descriptor.name) == Some(&argument) {
            self.arguments_by_name.remove(&descriptor.name);
        }
        if self.arguments_by_id.get(&descriptor.durable_id) == Some(&argument) {
            self.arguments_by_id.remove(&descriptor.durable_id);
        }
    }
}

fn join_names<'a>(names: impl Iterator<Item = &'a TypeName>) -> String {
    names
        .map(TypeName::full_name)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests;
