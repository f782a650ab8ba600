//! Schema introspection client
//!
//! Defines the interface to the console server's introspection endpoints and
//! an HTTP implementation of it.

use crate::config::ConsoleConfig;
use crate::db::{ColumnDef, SchemaMetadata, TableDef};
use crate::error::{IntrospectionError, IntrospectionResult};
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;

/// Source of schema metadata.
///
/// All methods are async because they talk to the server; the completion
/// engine only ever sees their results through published snapshots.
#[async_trait]
pub trait SchemaIntrospector: Send + Sync {
    /// Fetch the full schema snapshot (`GET /schema-info`)
    async fn fetch_schema_info(&self) -> IntrospectionResult<SchemaMetadata>;

    /// Fetch the flat table listing (`GET /tables`)
    async fn fetch_tables(&self) -> IntrospectionResult<Vec<TableDef>>;

    /// Fetch ordered columns of one table (`GET /columns/<schema>/<table>`)
    async fn fetch_columns(&self, schema: &str, table: &str) -> IntrospectionResult<Vec<ColumnDef>>;
}

// --- Wire format ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SchemaInfoResponse {
    success: bool,
    schema_info: Option<SchemaInfoPayload>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SchemaInfoPayload {
    #[serde(default)]
    schemas: Vec<String>,
    #[serde(default)]
    tables: HashMap<String, TableDef>,
    #[serde(default)]
    columns: HashMap<String, Vec<ColumnDef>>,
}

#[derive(Debug, Deserialize)]
struct TablesResponse {
    success: bool,
    tables: Option<Vec<TableRow>>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TableRow {
    table_schema: String,
    table_name: String,
}

#[derive(Debug, Deserialize)]
struct ColumnsResponse {
    success: bool,
    columns: Option<Vec<ColumnRow>>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ColumnRow {
    column_name: String,
    #[serde(default)]
    data_type: Option<String>,
}

/// Decode a `/schema-info` body into a snapshot
pub fn decode_schema_info(body: &str) -> IntrospectionResult<SchemaMetadata> {
    let response: SchemaInfoResponse = serde_json::from_str(body)?;
    if !response.success {
        return Err(IntrospectionError::rejected(response.message));
    }
    let info = response
        .schema_info
        .ok_or(IntrospectionError::MissingPayload("schemaInfo"))?;
    Ok(SchemaMetadata::new(info.schemas, info.tables, info.columns))
}

/// Decode a `/tables` body
pub fn decode_tables(body: &str) -> IntrospectionResult<Vec<TableDef>> {
    let response: TablesResponse = serde_json::from_str(body)?;
    if !response.success {
        return Err(IntrospectionError::rejected(response.message));
    }
    let rows = response.tables.ok_or(IntrospectionError::MissingPayload("tables"))?;
    Ok(rows
        .into_iter()
        .map(|r| TableDef::new(r.table_schema, r.table_name))
        .collect())
}

/// Decode a `/columns/<schema>/<table>` body
pub fn decode_columns(body: &str) -> IntrospectionResult<Vec<ColumnDef>> {
    let response: ColumnsResponse = serde_json::from_str(body)?;
    if !response.success {
        return Err(IntrospectionError::rejected(response.message));
    }
    let rows = response.columns.ok_or(IntrospectionError::MissingPayload("columns"))?;
    Ok(rows
        .into_iter()
        .map(|r| ColumnDef::new(r.column_name, r.data_type.unwrap_or_default()))
        .collect())
}

/// Introspector backed by the console server's HTTP API
pub struct HttpIntrospector {
    client: Client,
    base_url: Url,
}

impl HttpIntrospector {
    /// Create a client for the API rooted at `base_url` (e.g. `http://localhost:5000/api`)
    pub fn new(base_url: &str, timeout: Duration) -> IntrospectionResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| IntrospectionError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base_url.cannot_be_a_base() {
            return Err(IntrospectionError::InvalidUrl(base_url.to_string()));
        }
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &ConsoleConfig) -> IntrospectionResult<Self> {
        Self::new(&config.api_base_url, config.request_timeout())
    }

    /// Endpoint URL with path segments percent-encoded
    pub fn endpoint(&self, segments: &[&str]) -> IntrospectionResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| IntrospectionError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_body(&self, segments: &[&str]) -> IntrospectionResult<String> {
        let url = self.endpoint(segments)?;
        debug!(%url, "fetching introspection endpoint");
        let body = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        Ok(body)
    }
}

#[async_trait]
impl SchemaIntrospector for HttpIntrospector {
    async fn fetch_schema_info(&self) -> IntrospectionResult<SchemaMetadata> {
        let body = self.get_body(&["schema-info"]).await?;
        decode_schema_info(&body)
    }

    async fn fetch_tables(&self) -> IntrospectionResult<Vec<TableDef>> {
        let body = self.get_body(&["tables"]).await?;
        decode_tables(&body)
    }

    async fn fetch_columns(&self, schema: &str, table: &str) -> IntrospectionResult<Vec<ColumnDef>> {
        let body = self.get_body(&["columns", schema, table]).await?;
        decode_columns(&body)
    }
}
