//! Creating a concrete instantiation on demand.

use gobj_db::{DatabaseError, GenerationDatabase};
use gobj_ident::naming::{closed_display_name, concrete_module_name};
use gobj_ident::{ArgumentDescriptor, GenericTypeDescriptor, ModuleId, TypeName};
use thiserror::Error;

use crate::services::{GeneratorError, ModuleTemplate, Services};
use crate::ObjectKind;

/// Creating an instantiation failed. Nothing was recorded.
#[derive(Debug, Error)]
pub enum CreateError {
    #[error("object kind '{0}' is not managed by this session")]
    KindDisabled(ObjectKind),

    #[error("'{0}' is not a loaded generic definition")]
    NotGeneric(TypeName),

    /// A module with the target name exists and a concrete type for the
    /// same arguments is already loaded.
    #[error("a concrete type for {0} already exists")]
    TypeAlreadyExists(String),

    #[error("generated module '{0}' does not yield a class")]
    NotLoadable(ModuleId),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Generation(#[from] GeneratorError),
}

/// Fired after a new instantiation was generated and recorded.
///
/// Listeners use it to attach presentation to the new module, such as the
/// icon of the generic definition's source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstantiationAdded {
    pub kind: ObjectKind,
    pub generic: GenericTypeDescriptor,
    pub arguments: Vec<TypeName>,
    pub module: ModuleId,
}

/// Generate the module for `generic<arguments>` and record it.
pub(crate) fn create_instantiation(
    kind: ObjectKind,
    db: &mut GenerationDatabase,
    services: &mut Services<'_>,
    generic: &TypeName,
    arguments: &[TypeName],
) -> Result<InstantiationAdded, CreateError> {
    let descriptor = generic_descriptor(db, services, generic)?;
    let known = db.find_generic_by_name(generic);
    if descriptor.arity() != arguments.len() {
        return Err(DatabaseError::ArityMismatch {
            generic: generic.clone(),
            expected: descriptor.arity(),
            found: arguments.len(),
        }
        .into());
    }
    if known.is_some_and(|idx| db.find_instantiation(idx, arguments).is_some()) {
        let names: Vec<&str> = arguments.iter().map(TypeName::full_name).collect();
        return Err(DatabaseError::DuplicateInstantiation {
            generic: generic.clone(),
            arguments: names.join(", "),
        }
        .into());
    }

    let output_name = unique_output_name(kind, services, generic, arguments)?;
    let argument_descriptors: Vec<ArgumentDescriptor> = arguments
        .iter()
        .map(|name| ArgumentDescriptor::new(name.clone(), services.durable_id_or_empty(name)))
        .collect();

    let template = ModuleTemplate::Concrete {
        kind,
        generic: generic.clone(),
        arguments: arguments.to_vec(),
    };
    let module = services.modules.generate_module(&template, &output_name)?;

    if let Err(err) = db.add_instantiation(&descriptor, &argument_descriptors, module.clone()) {
        if let Err(cleanup) = services.modules.delete_module(&module) {
            tracing::warn!(%module, err = %cleanup, "failed to delete unrecorded module");
        }
        return Err(err.into());
    }

    tracing::info!(
        generic = %generic,
        module = %module,
        name = %output_name,
        "instantiation created"
    );
    Ok(InstantiationAdded {
        kind,
        generic: descriptor,
        arguments: arguments.to_vec(),
        module,
    })
}

/// The stored descriptor of `generic`, or a fresh one for a loaded
/// generic definition the database does not know yet.
pub(crate) fn generic_descriptor(
    db: &GenerationDatabase,
    services: &Services<'_>,
    generic: &TypeName,
) -> Result<GenericTypeDescriptor, CreateError> {
    if let Some(descriptor) = db.find_generic_by_name(generic).and_then(|idx| db.generic(idx)) {
        return Ok(descriptor.clone());
    }
    let definition = services
        .discovery
        .resolve_by_name(generic)
        .ok_or_else(|| CreateError::NotGeneric(generic.clone()))?;
    let type_params = definition
        .type_params()
        .ok_or_else(|| CreateError::NotGeneric(generic.clone()))?;
    Ok(GenericTypeDescriptor::new(
        generic.clone(),
        services.durable_id_or_empty(generic),
        type_params.to_vec(),
    ))
}

/// Module name for a new instantiation.
///
/// A taken name gets a `_<count>` suffix, unless the clash is an already
/// loaded empty concrete type for the same arguments, which is reported
/// instead of shadowed.
fn unique_output_name(
    kind: ObjectKind,
    services: &Services<'_>,
    generic: &TypeName,
    arguments: &[TypeName],
) -> Result<String, CreateError> {
    let base = concrete_module_name(generic, arguments);
    let taken = services.modules.count_named(&base);
    if taken == 0 {
        return Ok(base);
    }

    let shadowed = services
        .discovery
        .loaded_types(kind)
        .iter()
        .any(|ty| ty.is_empty_closed_of(generic, arguments));
    if shadowed {
        return Err(CreateError::TypeAlreadyExists(closed_display_name(
            generic, arguments,
        )));
    }
    Ok(format!("{base}_{taken}"))
}
