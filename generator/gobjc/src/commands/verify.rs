//! The `verify` command: drop entries whose generated module is gone.

use std::path::Path;

use gobj_db::{DatabaseStore, GenerationDatabase, StoreError};
use gobj_ident::ModuleId;
use gobj_sync::{prune_missing_modules, DeclarationEmitter, FsModuleStore, GeneratorError};
use thiserror::Error;

use super::load_existing;

pub fn verify_database(db_path: &str, modules_dir: &str) {
    let (store, mut db) = load_existing(db_path);

    match verify(&store, &mut db, Path::new(modules_dir)) {
        Ok(missing) if missing.is_empty() => println!("ok: every generated module is present"),
        Ok(missing) => {
            for module in &missing {
                println!("missing: {module}");
            }
            println!(
                "removed {} stale references, database saved to {}",
                missing.len(),
                store.path().display()
            );
        }
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(1);
        }
    }
}

#[derive(Debug, Error)]
pub(crate) enum VerifyError {
    #[error("cannot read modules directory: {0}")]
    Modules(#[from] GeneratorError),

    #[error("cannot save database: {0}")]
    Store(#[from] StoreError),
}

/// Prune references to missing modules and save the database if anything
/// changed. Returns the missing module ids.
pub(crate) fn verify(
    store: &DatabaseStore,
    db: &mut GenerationDatabase,
    modules_dir: &Path,
) -> Result<Vec<ModuleId>, VerifyError> {
    let modules = FsModuleStore::open(modules_dir, DeclarationEmitter)?;
    tracing::debug!(modules = modules.len(), dir = %modules.dir().display(), "modules indexed");
    let missing = prune_missing_modules(db, &modules);
    store.save_if_dirty(db)?;
    Ok(missing)
}

#[cfg(test)]
mod tests {
    use gobj_db::{DatabaseStore, GenerationDatabase};
    use gobj_ident::{ArgumentDescriptor, DurableId, GenericTypeDescriptor, ModuleId, TypeName};
    use gobj_sync::{DeclarationEmitter, FsModuleStore, ModuleGenerator, ModuleTemplate, ObjectKind};
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::verify;

    #[test]
    fn missing_modules_are_pruned_and_saved() {
        let dir = TempDir::new().unwrap_or_else(|e| panic!("tempdir: {e}"));
        let modules_dir = dir.path().join("modules");
        let boxed = GenericTypeDescriptor::new(
            TypeName::new("Game.Box`1", "Game.Runtime"),
            DurableId::new("box-guid"),
            vec!["T".to_string()],
        );
        let int = TypeName::new("System.Int32", "mscorlib");

        let mut modules = FsModuleStore::open(&modules_dir, DeclarationEmitter)
            .unwrap_or_else(|e| panic!("open failed: {e}"));
        let present = modules
            .generate_module(
                &ModuleTemplate::Concrete {
                    kind: ObjectKind::Behaviour,
                    generic: boxed.name.clone(),
                    arguments: vec![int.clone()],
                },
                "Box_Int32",
            )
            .unwrap_or_else(|e| panic!("generate failed: {e}"));

        let store = DatabaseStore::new(dir.path().join("behaviours.gobjdb"));
        let mut db = GenerationDatabase::new();
        db.add_instantiation(&boxed, &[ArgumentDescriptor::new(int, DurableId::EMPTY)], present)
            .unwrap_or_else(|e| panic!("add failed: {e}"));
        db.add_instantiation(
            &boxed,
            &[ArgumentDescriptor::new(
                TypeName::new("System.String", "mscorlib"),
                DurableId::EMPTY,
            )],
            ModuleId::new("deleted"),
        )
        .unwrap_or_else(|e| panic!("add failed: {e}"));

        let missing = verify(&store, &mut db, &modules_dir)
            .unwrap_or_else(|e| panic!("verify failed: {e}"));

        assert_eq!(missing, vec![ModuleId::new("deleted")]);
        assert_eq!(store.load().instantiation_count(), 1);
    }
}
