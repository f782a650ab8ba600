//! Completion service - the editor's single entry point
//!
//! Owns the schema snapshot, the active table and the static sources. The
//! editor calls [`CompletionService::complete`] on every edit; metadata
//! arrives out of band through the async reload methods.

use super::candidates::resolve;
use super::context::{classify, CompletionContext};
use super::store::{SchemaMetadataStore, SnapshotCell};
use super::{ActiveTable, CompletionItem, CompletionResult, CompletionSources};
use crate::config::ConsoleConfig;
use crate::db::{SchemaIntrospector, SchemaMetadata};
use std::collections::HashSet;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Classify, resolve and rank.
///
/// Pure function of its inputs. Returns `None` when the cursor does not follow
/// anything completable.
pub fn complete(
    context: &CompletionContext,
    active_table: Option<&ActiveTable>,
    snapshot: Option<&SchemaMetadata>,
    sources: &CompletionSources,
) -> Option<CompletionResult> {
    let classification = classify(context, snapshot)?;
    debug!(scenario = ?classification.scenario, anchor = classification.anchor, "classified");

    let candidates = resolve(&classification.scenario, snapshot, active_table, sources);
    Some(CompletionResult {
        from: classification.anchor,
        options: rank(candidates),
    })
}

/// Sort by boost (descending) then label, keeping the first of each
/// `(label, kind)` pair. The sort is stable so equal entries keep source order.
fn rank(mut items: Vec<CompletionItem>) -> Vec<CompletionItem> {
    items.sort_by(|a, b| b.boost.cmp(&a.boost).then_with(|| a.label.cmp(&b.label)));
    let mut seen = HashSet::new();
    items.retain(|item| seen.insert((item.label.clone(), item.kind)));
    items
}

/// Completion engine state shared between the editor and the loaders
pub struct CompletionService {
    metadata: SchemaMetadataStore,
    active_table: SnapshotCell<ActiveTable>,
    sources: CompletionSources,
    excluded_schemas: Vec<String>,
}

impl CompletionService {
    pub fn new(sources: CompletionSources) -> Self {
        Self {
            metadata: SchemaMetadataStore::new(),
            active_table: SnapshotCell::new(),
            sources,
            excluded_schemas: Vec::new(),
        }
    }

    /// Service with the configured sources and schema exclusions
    pub fn from_config(config: &ConsoleConfig) -> Self {
        let mut service = Self::new(config.completion.sources());
        service.excluded_schemas = config.excluded_schemas.clone();
        service
    }

    pub fn metadata(&self) -> &SchemaMetadataStore {
        &self.metadata
    }

    pub fn sources(&self) -> &CompletionSources {
        &self.sources
    }

    pub fn active_table(&self) -> Option<Arc<ActiveTable>> {
        self.active_table.get()
    }

    /// Complete at the cursor against the current snapshots
    pub fn complete(&self, context: &CompletionContext) -> Option<CompletionResult> {
        let metadata = self.metadata.get();
        let active = self.active_table.get();
        complete(context, active.as_deref(), metadata.snapshot(), &self.sources)
    }

    /// Fetch `/schema-info` and publish it.
    ///
    /// A failed fetch publishes an unloaded snapshot. Returns whether this
    /// load's result was published (false when a newer load superseded it).
    pub async fn reload_metadata<I>(&self, introspector: &I) -> bool
    where
        I: SchemaIntrospector + ?Sized,
    {
        let ticket = self.metadata.begin_load();
        let snapshot = match introspector.fetch_schema_info().await {
            Ok(snapshot) => {
                info!(tables = snapshot.table_count(), "schema info loaded");
                Some(snapshot)
            }
            Err(e) => {
                warn!(error = %e, "schema info load failed, completions limited to keywords");
                None
            }
        };
        self.metadata.publish(ticket, snapshot)
    }

    /// Build a column-less snapshot from the flat `/tables` listing
    pub async fn reload_metadata_from_tables<I>(&self, introspector: &I) -> bool
    where
        I: SchemaIntrospector + ?Sized,
    {
        let ticket = self.metadata.begin_load();
        let snapshot = match introspector.fetch_tables().await {
            Ok(tables) => Some(SchemaMetadata::from_tables(tables, &self.excluded_schemas)),
            Err(e) => {
                warn!(error = %e, "table listing load failed");
                None
            }
        };
        self.metadata.publish(ticket, snapshot)
    }

    /// Record the table picked in the browser and fetch its columns.
    ///
    /// The selection is kept even when the column fetch fails, with no columns.
    pub async fn select_table<I>(&self, introspector: &I, schema: &str, table: &str) -> bool
    where
        I: SchemaIntrospector + ?Sized,
    {
        let ticket = self.active_table.begin();
        let columns = match introspector.fetch_columns(schema, table).await {
            Ok(columns) => columns,
            Err(e) => {
                warn!(error = %e, schema, table, "column load failed");
                Vec::new()
            }
        };
        debug!(schema, table, columns = columns.len(), "active table selected");
        self.active_table
            .publish(ticket, Some(ActiveTable::new(schema, table, columns)))
    }

    /// Reload in the background, for "connected" / "schema changed" events.
    ///
    /// Completion keeps using the previous snapshot until this one publishes.
    pub fn spawn_reload(self: &Arc<Self>, introspector: Arc<dyn SchemaIntrospector>) -> JoinHandle<bool> {
        let service = Arc::clone(self);
        tokio::spawn(async move { service.reload_metadata(introspector.as_ref()).await })
    }

    /// Background variant of [`select_table`](Self::select_table)
    pub fn spawn_select_table(
        self: &Arc<Self>,
        introspector: Arc<dyn SchemaIntrospector>,
        schema: String,
        table: String,
    ) -> JoinHandle<bool> {
        let service = Arc::clone(self);
        tokio::spawn(async move { service.select_table(introspector.as_ref(), &schema, &table).await })
    }

    /// Forget the schema snapshot (disconnect)
    pub fn clear_metadata(&self) {
        self.metadata.clear();
    }

    pub fn clear_active_table(&self) {
        self.active_table.replace(None);
    }
}

impl Default for CompletionService {
    fn default() -> Self {
        Self::new(CompletionSources::default())
    }
}
