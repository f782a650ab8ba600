//! Schema metadata snapshot shared by the completion engine

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// Build the composite `"<schema>.<table>"` lookup key
pub fn table_key(schema: &str, table: &str) -> String {
    format!("{}.{}", schema, table)
}

/// Table definition
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableDef {
    pub schema: String,
    pub name: String,
}

impl TableDef {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    pub fn key(&self) -> String {
        table_key(&self.schema, &self.name)
    }
}

/// Column definition
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
        }
    }
}

/// Immutable snapshot of the database schema.
///
/// Built once per load and never mutated afterwards; a reload replaces the
/// whole value. Maps are ordered so that iteration, and therefore completion
/// output, is deterministic.
#[derive(Clone, Debug)]
pub struct SchemaMetadata {
    schemas: BTreeSet<String>,
    tables: BTreeMap<String, TableDef>,
    columns: BTreeMap<String, Vec<ColumnDef>>,
    loaded_at: DateTime<Utc>,
}

impl SchemaMetadata {
    /// Build a snapshot.
    ///
    /// Column entries whose key has no table entry are dropped. Tables without
    /// column entries are kept since columns may be fetched later per table.
    pub fn new(
        schemas: impl IntoIterator<Item = String>,
        tables: impl IntoIterator<Item = (String, TableDef)>,
        columns: impl IntoIterator<Item = (String, Vec<ColumnDef>)>,
    ) -> Self {
        let schemas: BTreeSet<String> = schemas.into_iter().collect();
        let tables: BTreeMap<String, TableDef> = tables.into_iter().collect();

        let mut kept = BTreeMap::new();
        for (key, cols) in columns {
            if tables.contains_key(&key) {
                kept.insert(key, cols);
            } else {
                warn!(key = %key, "dropping columns for unknown table");
            }
        }

        Self {
            schemas,
            tables,
            columns: kept,
            loaded_at: Utc::now(),
        }
    }

    /// Build a snapshot from a flat table listing, grouping schemas from rows.
    ///
    /// Rows in `excluded_schemas` (compared case-insensitively) are skipped.
    pub fn from_tables(tables: Vec<TableDef>, excluded_schemas: &[String]) -> Self {
        let tables: Vec<TableDef> = tables
            .into_iter()
            .filter(|t| !excluded_schemas.iter().any(|s| s.eq_ignore_ascii_case(&t.schema)))
            .collect();
        let schemas = tables.iter().map(|t| t.schema.clone()).collect::<Vec<_>>();
        let tables = tables.into_iter().map(|t| (t.key(), t));
        Self::new(schemas, tables, std::iter::empty())
    }

    pub fn schemas(&self) -> impl Iterator<Item = &str> {
        self.schemas.iter().map(String::as_str)
    }

    /// Tables keyed by composite key
    pub fn tables(&self) -> impl Iterator<Item = (&str, &TableDef)> {
        self.tables.iter().map(|(k, t)| (k.as_str(), t))
    }

    pub fn table_count(&self) -> usize {
        self.tables.len()
    }

    /// When the snapshot was built
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Whether column metadata exists for the table, matching the key
    /// case-insensitively when there is no exact entry
    pub fn has_columns(&self, schema: &str, table: &str) -> bool {
        self.column_entry(schema, table).is_some()
    }

    /// Ordered columns of a table, empty when unknown
    pub fn columns_for(&self, schema: &str, table: &str) -> &[ColumnDef] {
        self.column_entry(schema, table)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    fn column_entry(&self, schema: &str, table: &str) -> Option<&Vec<ColumnDef>> {
        let key = table_key(schema, table);
        self.columns.get(&key).or_else(|| {
            self.columns
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(&key))
                .map(|(_, cols)| cols)
        })
    }
}

impl PartialEq for SchemaMetadata {
    fn eq(&self, other: &Self) -> bool {
        self.schemas == other.schemas && self.tables == other.tables && self.columns == other.columns
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_columns_for_known_and_unknown() {
        let meta = fixtures::sample();
        let names: Vec<_> = meta.columns_for("public", "users").iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "email"]);
        assert!(meta.columns_for("public", "orders").is_empty());
        assert!(meta.columns_for("nope", "nope").is_empty());
    }

    #[test]
    fn test_loaded_at_is_build_time() {
        let before = Utc::now();
        let meta = fixtures::sample();
        let after = Utc::now();
        assert!(before <= meta.loaded_at() && meta.loaded_at() <= after);

        // Equality ignores the timestamp
        assert_eq!(meta, fixtures::sample());
    }

    #[test]
    fn test_columns_for_is_case_insensitive() {
        let meta = fixtures::sample();
        assert_eq!(meta.columns_for("PUBLIC", "Users").len(), 2);
        assert!(meta.has_columns("public", "USERS"));
    }

    #[test]
    fn test_orphan_columns_are_dropped() {
        let meta = SchemaMetadata::new(
            ["public".to_string()],
            [("public.a".to_string(), TableDef::new("public", "a"))],
            [
                ("public.a".to_string(), vec![ColumnDef::new("x", "int")]),
                ("public.ghost".to_string(), vec![ColumnDef::new("y", "int")]),
            ],
        );
        assert!(meta.has_columns("public", "a"));
        assert!(!meta.has_columns("public", "ghost"));
    }

    #[test]
    fn test_from_tables_groups_schemas_and_skips_system() {
        let meta = SchemaMetadata::from_tables(
            vec![
                TableDef::new("public", "users"),
                TableDef::new("public", "orders"),
                TableDef::new("sales", "invoices"),
                TableDef::new("pg_catalog", "pg_class"),
            ],
            &["pg_catalog".to_string(), "information_schema".to_string()],
        );
        assert_eq!(meta.schemas().collect::<Vec<_>>(), vec!["public", "sales"]);
        assert_eq!(meta.table_count(), 3);
    }
}
