//! A generation session: the databases of every managed object kind, and
//! the lookup tables built from them.

use gobj_db::{DatabaseStore, GenerationDatabase, LookupTable, StoreError};
use gobj_ident::{ArgumentDescriptor, ConcreteType, ModuleId, TypeName};

use crate::creator::{self, CreateError, InstantiationAdded};
use crate::reconcile::{reconcile, PassReport};
use crate::services::Services;
use crate::table::{build_lookup, TableReport};
use crate::{GenerationConfig, ObjectKind};

/// Per-kind outcome of [`GenerationSession::on_recompiled`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KindReport {
    pub kind: ObjectKind,
    pub pass: PassReport,
    pub table: TableReport,
}

/// Outcome of [`GenerationSession::on_recompiled`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SessionReport {
    pub kinds: Vec<KindReport>,
    /// Whether the asset index was asked to refresh.
    pub refreshed: bool,
    /// Databases written to disk.
    pub saved: usize,
}

struct KindState {
    kind: ObjectKind,
    store: DatabaseStore,
    db: GenerationDatabase,
    table: LookupTable,
}

impl KindState {
    fn rebuild_table(&mut self, services: &Services<'_>) -> TableReport {
        let (snapshot, report) = build_lookup(&mut self.db, &*services.modules, services.identity);
        if !report.failed_modules.is_empty() {
            tracing::warn!(
                kind = %self.kind,
                failed = report.failed_modules.len(),
                "some generated modules could not be loaded"
            );
        }
        self.table.initialize(snapshot);
        report
    }

    fn save_if_dirty(&mut self) -> Result<bool, StoreError> {
        self.store.save_if_dirty(&mut self.db)
    }
}

type Listener = Box<dyn FnMut(&InstantiationAdded)>;

/// Owns the generation databases and lookup tables of one project.
///
/// Databases are loaded when the session opens. Each recompilation of the
/// host is reported through [`on_recompiled`](Self::on_recompiled), which
/// reconciles every kind and rebuilds its lookup table.
pub struct GenerationSession {
    config: GenerationConfig,
    kinds: Vec<KindState>,
    listeners: Vec<Listener>,
}

impl GenerationSession {
    /// Load the database of every configured kind.
    ///
    /// Lookup tables stay empty until the first pass.
    pub fn open(config: GenerationConfig) -> Self {
        let kinds = config
            .kinds
            .iter()
            .map(|&kind| {
                let store = DatabaseStore::new(config.database_path(kind));
                let db = store.load();
                KindState {
                    kind,
                    store,
                    db,
                    table: LookupTable::new(),
                }
            })
            .collect();

        Self {
            config,
            kinds,
            listeners: Vec::new(),
        }
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    pub fn database(&self, kind: ObjectKind) -> Option<&GenerationDatabase> {
        self.state(kind).map(|state| &state.db)
    }

    pub fn table(&self, kind: ObjectKind) -> Option<&LookupTable> {
        self.state(kind).map(|state| &state.table)
    }

    /// Register a listener for [`InstantiationAdded`].
    pub fn on_instantiation_added(&mut self, listener: impl FnMut(&InstantiationAdded) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Reconcile every kind after a recompilation.
    ///
    /// The asset index is refreshed at most once, after all kinds. Dirty
    /// databases are saved when auto-save is on; a failed save is logged
    /// and retried on the next pass.
    pub fn on_recompiled(&mut self, services: &mut Services<'_>) -> SessionReport {
        let mut report = SessionReport::default();

        for state in &mut self.kinds {
            let pass = reconcile(state.kind, &mut state.db, services);
            let table = state.rebuild_table(services);
            report.refreshed |= pass.files_touched;
            report.kinds.push(KindReport {
                kind: state.kind,
                pass,
                table,
            });
        }

        if report.refreshed {
            services.index.refresh();
        }
        if self.config.auto_save {
            report.saved = self.save_logged();
        }
        report
    }

    /// Resolve the concrete type registered for `generic<arguments>`.
    pub fn try_resolve(
        &self,
        kind: ObjectKind,
        generic: &TypeName,
        arguments: &[TypeName],
    ) -> Option<&ConcreteType> {
        self.state(kind)?.table.try_resolve(generic, arguments)
    }

    /// Like [`try_resolve`](Self::try_resolve), but falls back to an empty
    /// concrete subclass the user already wrote, recording it so the next
    /// lookup succeeds directly.
    pub fn resolve_or_adopt(
        &mut self,
        kind: ObjectKind,
        generic: &TypeName,
        arguments: &[TypeName],
        services: &mut Services<'_>,
    ) -> Option<ConcreteType> {
        let state = self.kinds.iter_mut().find(|state| state.kind == kind)?;
        if let Some(found) = state.table.try_resolve(generic, arguments) {
            return Some(found.clone());
        }

        let candidate = services
            .discovery
            .loaded_types(kind)
            .into_iter()
            .find(|ty| ty.is_empty_closed_of(generic, arguments))?;
        let id = match services.identity.durable_id(&candidate.name) {
            Ok(id) => id,
            Err(err) => {
                tracing::debug!(%err, "cannot adopt concrete type");
                return None;
            }
        };

        let descriptor = match creator::generic_descriptor(&state.db, services, generic) {
            Ok(descriptor) => descriptor,
            Err(err) => {
                tracing::debug!(%err, "cannot adopt concrete type");
                return None;
            }
        };
        let argument_descriptors: Vec<ArgumentDescriptor> = arguments
            .iter()
            .map(|name| ArgumentDescriptor::new(name.clone(), services.durable_id_or_empty(name)))
            .collect();
        let module = ModuleId::from(&id);
        if let Err(err) = state
            .db
            .adopt_instantiation(&descriptor, &argument_descriptors, module)
        {
            tracing::warn!(ty = %candidate.name, %err, "failed to adopt concrete type");
            return None;
        }
        tracing::debug!(ty = %candidate.name, "adopted existing concrete type");

        state.rebuild_table(services);
        state.table.try_resolve(generic, arguments).cloned()
    }

    /// Generate a concrete module for `generic<arguments>`, record it, and
    /// make it resolvable.
    pub fn create_instantiation(
        &mut self,
        kind: ObjectKind,
        generic: &TypeName,
        arguments: &[TypeName],
        services: &mut Services<'_>,
    ) -> Result<ConcreteType, CreateError> {
        let Some(state) = self.kinds.iter_mut().find(|state| state.kind == kind) else {
            return Err(CreateError::KindDisabled(kind));
        };

        let added = creator::create_instantiation(kind, &mut state.db, services, generic, arguments)?;
        for listener in &mut self.listeners {
            listener(&added);
        }

        state.rebuild_table(services);
        services.index.refresh();
        if self.config.auto_save {
            if let Err(err) = state.save_if_dirty() {
                tracing::warn!(kind = %kind, %err, "failed to save database");
            }
        }

        state
            .table
            .try_resolve(generic, arguments)
            .cloned()
            .ok_or(CreateError::NotLoadable(added.module))
    }

    /// Save every dirty database. Returns how many were written.
    pub fn save(&mut self) -> Result<usize, StoreError> {
        let mut saved = 0;
        for state in &mut self.kinds {
            if state.save_if_dirty()? {
                saved += 1;
            }
        }
        Ok(saved)
    }

    fn save_logged(&mut self) -> usize {
        let mut saved = 0;
        for state in &mut self.kinds {
            match state.save_if_dirty() {
                Ok(true) => saved += 1,
                Ok(false) => {}
                Err(err) => tracing::warn!(kind = %state.kind, %err, "failed to save database"),
            }
        }
        saved
    }

    fn state(&self, kind: ObjectKind) -> Option<&KindState> {
        self.kinds.iter().find(|state| state.kind == kind)
    }
}
