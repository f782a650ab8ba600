//! Snapshot storage for completion metadata
//!
//! Values are published as whole `Arc`s and never mutated in place. Readers
//! clone the `Arc` and drop the lock straight away, so a completion running
//! against an old snapshot is unaffected by a concurrent swap.

use crate::db::{ColumnDef, SchemaMetadata, TableDef};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info};

/// Generation number captured when a load starts
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoadTicket(u64);

/// Atomically replaceable, last-writer-wins value cell
pub struct SnapshotCell<T> {
    current: RwLock<Option<Arc<T>>>,
    generation: AtomicU64,
}

impl<T> SnapshotCell<T> {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Current value, if one is published
    pub fn get(&self) -> Option<Arc<T>> {
        self.current.read().clone()
    }

    /// Start a load. Any ticket issued earlier can no longer publish.
    pub fn begin(&self) -> LoadTicket {
        LoadTicket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Publish the result of a load; `None` clears the cell.
    ///
    /// Returns false (and drops the value) when a newer load was started.
    pub fn publish(&self, ticket: LoadTicket, value: Option<T>) -> bool {
        let mut current = self.current.write();
        if self.generation.load(Ordering::SeqCst) != ticket.0 {
            return false;
        }
        *current = value.map(Arc::new);
        true
    }

    /// Replace the value immediately, superseding in-flight loads.
    ///
    /// Returns false when a load started in the meantime won the race.
    pub fn replace(&self, value: Option<T>) -> bool {
        let ticket = self.begin();
        self.publish(ticket, value)
    }
}

impl<T> Default for SnapshotCell<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// What the store currently holds
#[derive(Clone, Debug)]
pub enum MetadataView {
    Loaded(Arc<SchemaMetadata>),
    /// Not loaded yet, or the last load failed
    Unloaded,
}

impl MetadataView {
    pub fn snapshot(&self) -> Option<&SchemaMetadata> {
        match self {
            MetadataView::Loaded(meta) => Some(meta),
            MetadataView::Unloaded => None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, MetadataView::Loaded(_))
    }
}

/// Holder of the current schema snapshot
#[derive(Default)]
pub struct SchemaMetadataStore {
    cell: SnapshotCell<SchemaMetadata>,
}

impl SchemaMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a snapshot from its parts and swap it in
    pub fn load(
        &self,
        schemas: impl IntoIterator<Item = String>,
        tables: impl IntoIterator<Item = (String, TableDef)>,
        columns: impl IntoIterator<Item = (String, Vec<ColumnDef>)>,
    ) -> bool {
        self.install(SchemaMetadata::new(schemas, tables, columns))
    }

    /// Swap in a prebuilt snapshot; false if a concurrent load superseded it
    pub fn install(&self, snapshot: SchemaMetadata) -> bool {
        let schemas = snapshot.schemas().count();
        let tables = snapshot.table_count();
        let loaded_at = snapshot.loaded_at();
        let installed = self.cell.replace(Some(snapshot));
        if installed {
            info!(schemas, tables, %loaded_at, "schema snapshot installed");
        } else {
            debug!("schema snapshot superseded before install");
        }
        installed
    }

    pub fn get(&self) -> MetadataView {
        match self.cell.get() {
            Some(meta) => MetadataView::Loaded(meta),
            None => MetadataView::Unloaded,
        }
    }

    /// Ordered columns of a table, empty when unknown or unloaded
    pub fn columns_for(&self, schema: &str, table: &str) -> Vec<ColumnDef> {
        self.cell
            .get()
            .map(|meta| meta.columns_for(schema, table).to_vec())
            .unwrap_or_default()
    }

    /// Drop the snapshot (disconnect)
    pub fn clear(&self) {
        if self.cell.replace(None) {
            debug!("schema snapshot cleared");
        }
    }

    pub fn begin_load(&self) -> LoadTicket {
        self.cell.begin()
    }

    /// Publish a load result; `None` marks the load as failed
    pub fn publish(&self, ticket: LoadTicket, snapshot: Option<SchemaMetadata>) -> bool {
        let published = self.cell.publish(ticket, snapshot);
        if !published {
            debug!(?ticket, "discarding superseded schema load");
        }
        published
    }
}
