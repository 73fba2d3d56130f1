//! Persisted form of the generation database.
//!
//! The database is stored as two parallel ordered sequences: `keys` (generic
//! definitions) and `values` (each definition's instantiations), plus the
//! shared argument table the instantiations point into. A length mismatch
//! between `keys` and `values` means the file is corrupt; the loader then
//! starts from an empty database instead of loading part of it.
//!
//! # File Layout
//!
//! ```text
//! <database dir>/
//! └── <kind>.gobjdb      # bincode-encoded PersistedDatabase
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use gobj_ident::{ArgumentDescriptor, GenericTypeDescriptor, ModuleId};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ArgumentIdx, DatabaseError, GenerationDatabase, InstantiationOrigin, MenuItem};

/// One instantiation as stored on disk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedInstantiation {
    /// Positions into [`PersistedDatabase::arguments`].
    pub arguments: Vec<u32>,
    pub module: ModuleId,
    pub origin: InstantiationOrigin,
}

/// Serializable snapshot of a [`GenerationDatabase`].
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedDatabase {
    pub keys: Vec<GenericTypeDescriptor>,
    pub values: Vec<Vec<PersistedInstantiation>>,
    pub arguments: Vec<ArgumentDescriptor>,
    pub menu_items: Vec<MenuItem>,
    pub menu_module: Option<ModuleId>,
}

impl GenerationDatabase {
    /// Flatten the database into its persisted form.
    ///
    /// Live slots are renumbered densely, so the snapshot of a freshly
    /// loaded database equals the snapshot it was loaded from.
    pub fn to_persisted(&self) -> PersistedDatabase {
        let mut positions: FxHashMap<ArgumentIdx, u32> = FxHashMap::default();
        let mut arguments = Vec::with_capacity(self.argument_count());
        let mut keys = Vec::with_capacity(self.generic_count());
        let mut values = Vec::with_capacity(self.generic_count());

        for (generic, descriptor) in self.generics() {
            let mut stored = Vec::new();
            for inst in self.instantiations(generic) {
                let mut tuple = Vec::with_capacity(inst.arguments.len());
                for &argument in &inst.arguments {
                    let position = *positions.entry(argument).or_insert_with(|| {
                        let position = u32::try_from(arguments.len()).unwrap_or(u32::MAX);
                        if let Some(descriptor) = self.argument(argument) {
                            arguments.push(descriptor.clone());
                        }
                        position
                    });
                    tuple.push(position);
                }
                stored.push(PersistedInstantiation {
                    arguments: tuple,
                    module: inst.module.clone(),
                    origin: inst.origin,
                });
            }
            keys.push(descriptor.clone());
            values.push(stored);
        }

        PersistedDatabase {
            keys,
            values,
            arguments,
            menu_items: self.menu_items().to_vec(),
            menu_module: self.menu_module().cloned(),
        }
    }

    /// Rebuild a database from its persisted form.
    ///
    /// Fails only on `keys`/`values` length mismatch. Individual broken
    /// entries (out-of-range argument positions, duplicate definitions or
    /// tuples) are dropped, and the database is marked dirty so the healed
    /// form gets written back.
    pub fn from_persisted(persisted: PersistedDatabase) -> Result<Self, DatabaseError> {
        let PersistedDatabase {
            keys,
            values,
            arguments,
            menu_items,
            menu_module,
        } = persisted;

        if keys.len() != values.len() {
            return Err(DatabaseError::Corruption {
                keys: keys.len(),
                values: values.len(),
            });
        }

        let mut db = Self::new();
        let mut healed = false;

        for (descriptor, stored) in keys.into_iter().zip(values) {
            if let Err(err) = db.add_generic(descriptor.clone()) {
                tracing::warn!(%err, "dropping persisted generic definition");
                healed = true;
                continue;
            }

            for inst in stored {
                let tuple: Option<Vec<ArgumentDescriptor>> = inst
                    .arguments
                    .iter()
                    .map(|&position| arguments.get(position as usize).cloned())
                    .collect();
                let Some(tuple) = tuple else {
                    tracing::warn!(
                        generic = %descriptor.name,
                        module = %inst.module,
                        "dropping instantiation with a dangling argument reference"
                    );
                    healed = true;
                    continue;
                };

                if let Err(err) =
                    db.insert_instantiation(&descriptor, &tuple, inst.module, inst.origin)
                {
                    tracing::warn!(%err, "dropping persisted instantiation");
                    healed = true;
                }
            }
        }

        db.set_menu_items(menu_items);
        db.set_menu_module(menu_module);
        db.mark_clean();
        if healed {
            db.mark_dirty();
        }
        Ok(db)
    }
}

/// Error reading or writing a database file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database I/O error at '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode database: {0}")]
    Encode(#[from] bincode::Error),
}

/// A database file on disk.
#[derive(Clone, Debug)]
pub struct DatabaseStore {
    path: PathBuf,
}

impl DatabaseStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the database, falling back to an empty one.
    ///
    /// A missing file is a fresh project. An unreadable, undecodable or
    /// corrupt file is logged as an error and replaced by an empty database
    /// that is marked dirty, so the next save overwrites the bad file.
    pub fn load(&self) -> GenerationDatabase {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no database yet, starting empty");
                return GenerationDatabase::new();
            }
            Err(err) => {
                tracing::error!(path = %self.path.display(), %err, "failed to read database");
                return Self::reset();
            }
        };

        let persisted: PersistedDatabase = match bincode::deserialize(&bytes) {
            Ok(persisted) => persisted,
            Err(err) => {
                tracing::error!(path = %self.path.display(), %err, "failed to decode database");
                return Self::reset();
            }
        };

        match GenerationDatabase::from_persisted(persisted) {
            Ok(db) => {
                tracing::debug!(
                    path = %self.path.display(),
                    generics = db.generic_count(),
                    instantiations = db.instantiation_count(),
                    "database loaded"
                );
                db
            }
            Err(err) => {
                tracing::error!(
                    path = %self.path.display(),
                    %err,
                    "the database will be cleaned up"
                );
                Self::reset()
            }
        }
    }

    /// Write the database and mark it clean.
    ///
    /// Writes to a sibling temp file first and renames it over the old file.
    pub fn save(&self, db: &mut GenerationDatabase) -> Result<(), StoreError> {
        let bytes = bincode::serialize(&db.to_persisted())?;

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|source| StoreError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let temp = self.path.with_extension("tmp");
        fs::write(&temp, &bytes).map_err(|source| StoreError::Io {
            path: temp.clone(),
            source,
        })?;
        fs::rename(&temp, &self.path).map_err(|source| StoreError::Io {
            path: self.path.clone(),
            source,
        })?;

        db.mark_clean();
        tracing::debug!(path = %self.path.display(), bytes = bytes.len(), "database saved");
        Ok(())
    }

    /// Save only if something changed since the last save.
    pub fn save_if_dirty(&self, db: &mut GenerationDatabase) -> Result<bool, StoreError> {
        if !db.is_dirty() {
            return Ok(false);
        }
        self.save(db)?;
        Ok(true)
    }

    fn reset() -> GenerationDatabase {
        let mut db = GenerationDatabase::new();
        db.mark_dirty();
        db
    }
}
