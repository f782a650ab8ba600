//! SQL Autocomplete - Context-aware completion engine
//!
//! Provides completion for the query editor based on:
//! - Qualified column context (schema.table.col)
//! - Table context (after FROM / JOIN, optionally schema-qualified)
//! - Generic words (keywords, functions, schemas, tables, active table columns)
//!
//! Completion is synchronous and never fails; schema metadata arrives through
//! snapshots published by [`CompletionService`].

mod candidates;
mod context;
mod service;
mod store;

pub use candidates::{resolve, CompletionSources};
pub use context::{classify, detect_scenario, Classification, CompletionContext, Scenario};
pub use service::{complete, CompletionService};
pub use store::{LoadTicket, MetadataView, SchemaMetadataStore, SnapshotCell};

use crate::db::ColumnDef;
use serde::Serialize;

/// Table selected in the browser, with its separately fetched columns
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ActiveTable {
    pub schema: String,
    pub table: String,
    pub columns: Vec<ColumnDef>,
}

impl ActiveTable {
    pub fn new(schema: impl Into<String>, table: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        Self {
            schema: schema.into(),
            table: table.into(),
            columns,
        }
    }
}

/// A single completion item
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(into = "EditorOption")]
pub struct CompletionItem {
    /// Display label (e.g., "users")
    pub label: String,
    /// Type of completion
    pub kind: CompletionKind,
    /// Text to insert when selected
    pub insert_text: String,
    /// Additional detail (e.g., column data type)
    pub info: Option<String>,
    /// Rank tier, higher sorts first
    pub boost: i32,
}

impl CompletionItem {
    /// Create a new completion item that inserts its own label
    pub fn new(label: impl Into<String>, kind: CompletionKind, boost: i32) -> Self {
        let label = label.into();
        Self {
            insert_text: label.clone(),
            label,
            kind,
            info: None,
            boost,
        }
    }

    /// Set the inserted text
    pub fn with_insert(mut self, insert_text: impl Into<String>) -> Self {
        self.insert_text = insert_text.into();
        self
    }

    /// Set the info text, ignoring empty strings
    pub fn with_info(mut self, info: impl Into<String>) -> Self {
        let info = info.into();
        self.info = (!info.is_empty()).then_some(info);
        self
    }
}

/// Type of completion item
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CompletionKind {
    /// SQL keyword (SELECT, FROM, WHERE, etc.)
    Keyword,
    /// SQL function
    Function,
    /// Database schema
    Namespace,
    /// Table
    Table,
    /// Table column
    Column,
}

impl CompletionKind {
    /// Name used by the editor to pick an icon
    pub fn label(&self) -> &'static str {
        match self {
            CompletionKind::Keyword => "keyword",
            CompletionKind::Function => "function",
            CompletionKind::Namespace => "namespace",
            CompletionKind::Table => "table",
            CompletionKind::Column => "column",
        }
    }
}

/// Completion item in the shape the editor consumes
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EditorOption {
    pub label: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
    /// Inserted text, only when it differs from the label
    #[serde(skip_serializing_if = "Option::is_none")]
    pub apply: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boost: Option<i32>,
}

impl From<CompletionItem> for EditorOption {
    fn from(item: CompletionItem) -> Self {
        let apply = (item.insert_text != item.label).then_some(item.insert_text);
        Self {
            label: item.label,
            kind: item.kind.label(),
            info: item.info,
            apply,
            boost: Some(item.boost),
        }
    }
}

/// Ranked completions and where they apply
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CompletionResult {
    /// Character offset where the typed fragment starts; accepting an option
    /// replaces `from..cursor`
    pub from: usize,
    pub options: Vec<CompletionItem>,
}

impl CompletionResult {
    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }
}
