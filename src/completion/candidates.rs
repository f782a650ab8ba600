//! Completion candidate generation
//!
//! Turns a classified scenario into candidates using the schema snapshot, the
//! active table and the static keyword/function lists. Ranking and dedup are
//! left to the service.

use super::{ActiveTable, CompletionItem, CompletionKind, Scenario};
use crate::db::SchemaMetadata;
use crate::sql::{quote_ident, quote_qualified};
use serde::{Deserialize, Serialize};

/// Rank tiers, higher sorts first
mod boost {
    pub const KEYWORD: i32 = 60;
    pub const FUNCTION: i32 = 50;
    pub const ACTIVE_COLUMN: i32 = 40;
    pub const SCHEMA: i32 = 30;
    pub const TABLE: i32 = 20;
    pub const SELECTED_COLUMN: i32 = 10;

    // FROM / JOIN context: schemas outrank qualified tables
    pub const TABLE_CONTEXT_SCHEMA: i32 = 20;
    pub const TABLE_CONTEXT_TABLE: i32 = 10;

    pub const QUALIFIED_TABLE: i32 = 10;
    pub const COLUMN: i32 = 10;
}

/// Static completion sources injected into the resolver
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionSources {
    pub keywords: Vec<String>,
    pub functions: Vec<String>,
}

impl CompletionSources {
    pub fn new(keywords: Vec<String>, functions: Vec<String>) -> Self {
        Self { keywords, functions }
    }

    /// No static sources, metadata only
    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new())
    }
}

impl Default for CompletionSources {
    fn default() -> Self {
        Self::new(to_strings(SQL_KEYWORDS), to_strings(SQL_FUNCTIONS))
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// SQL keywords for completion
const SQL_KEYWORDS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "AND", "OR", "NOT", "IN", "LIKE", "ILIKE", "BETWEEN",
    "ORDER BY", "ASC", "DESC", "GROUP BY", "HAVING", "JOIN", "INNER JOIN",
    "LEFT JOIN", "RIGHT JOIN", "FULL JOIN", "CROSS JOIN", "ON", "AS",
    "DISTINCT", "LIMIT", "OFFSET", "WITH", "INSERT INTO", "VALUES", "UPDATE", "SET",
    "DELETE FROM", "RETURNING", "CREATE TABLE", "ALTER TABLE", "DROP TABLE",
    "CREATE INDEX", "CREATE VIEW", "NULL", "IS NULL", "IS NOT NULL", "CASE",
    "WHEN", "THEN", "ELSE", "END", "UNION", "UNION ALL", "EXISTS", "TRUE", "FALSE",
    "EXPLAIN",
];

/// SQL functions for completion
const SQL_FUNCTIONS: &[&str] = &[
    "COUNT", "SUM", "AVG", "MIN", "MAX", "LENGTH", "SUBSTRING", "UPPER",
    "LOWER", "TRIM", "REPLACE", "CONCAT", "COALESCE", "NULLIF", "CAST",
    "NOW", "CURRENT_DATE", "CURRENT_TIMESTAMP", "DATE_TRUNC", "EXTRACT",
    "TO_CHAR", "ROUND", "ABS", "ARRAY_AGG", "STRING_AGG", "JSON_AGG",
    "ROW_NUMBER", "RANK", "DENSE_RANK", "LAG", "LEAD", "GREATEST",
];

/// Case-insensitive matcher for the typed fragment
struct PrefixFilter {
    lowered: String,
}

impl PrefixFilter {
    fn new(prefix: &str) -> Self {
        Self {
            lowered: prefix.to_lowercase(),
        }
    }

    fn prefix_of(&self, label: &str) -> bool {
        self.lowered.is_empty() || label.to_lowercase().starts_with(&self.lowered)
    }

    fn within(&self, label: &str) -> bool {
        self.lowered.is_empty() || label.to_lowercase().contains(&self.lowered)
    }
}

/// Produce the unranked candidates for a scenario.
///
/// A missing snapshot behaves like an empty one; static sources still apply.
pub fn resolve(
    scenario: &Scenario,
    snapshot: Option<&SchemaMetadata>,
    active_table: Option<&ActiveTable>,
    sources: &CompletionSources,
) -> Vec<CompletionItem> {
    match scenario {
        Scenario::TableQualified { schema, prefix } => {
            snapshot.map(|meta| qualified_tables(meta, schema, prefix)).unwrap_or_default()
        }
        Scenario::TableUnqualified { prefix } => {
            snapshot.map(|meta| unqualified_tables(meta, prefix)).unwrap_or_default()
        }
        Scenario::ColumnOf { schema, table, prefix } => {
            snapshot.map(|meta| columns_of(meta, schema, table, prefix)).unwrap_or_default()
        }
        Scenario::Generic { word_prefix, qualified } => {
            generic(word_prefix, *qualified, snapshot, active_table, sources)
        }
    }
}

/// Tables of one schema, matched by short name
fn qualified_tables(meta: &SchemaMetadata, schema: &str, prefix: &str) -> Vec<CompletionItem> {
    let filter = PrefixFilter::new(prefix);
    let key_prefix = format!("{}.", schema.to_lowercase());

    meta.tables()
        .filter(|(key, _)| key.to_lowercase().starts_with(&key_prefix))
        .filter(|(_, table)| filter.prefix_of(&table.name))
        .map(|(_, table)| {
            CompletionItem::new(&table.name, CompletionKind::Table, boost::QUALIFIED_TABLE)
                .with_insert(quote_qualified(&table.schema, &table.name))
        })
        .collect()
}

/// Schemas (prefix match) followed by `schema.table` labels (prefix or substring match)
fn unqualified_tables(meta: &SchemaMetadata, prefix: &str) -> Vec<CompletionItem> {
    let filter = PrefixFilter::new(prefix);

    let schemas = meta.schemas().filter(|s| filter.prefix_of(s)).map(|schema| {
        CompletionItem::new(schema, CompletionKind::Namespace, boost::TABLE_CONTEXT_SCHEMA)
            .with_insert(format!("{}.", schema))
    });

    let tables = meta
        .tables()
        .filter(|(key, _)| filter.prefix_of(key) || filter.within(key))
        .map(|(key, table)| {
            CompletionItem::new(key, CompletionKind::Table, boost::TABLE_CONTEXT_TABLE)
                .with_insert(quote_qualified(&table.schema, &table.name))
        });

    schemas.chain(tables).collect()
}

fn columns_of(meta: &SchemaMetadata, schema: &str, table: &str, prefix: &str) -> Vec<CompletionItem> {
    let filter = PrefixFilter::new(prefix);

    meta.columns_for(schema, table)
        .iter()
        .filter(|col| filter.prefix_of(&col.name))
        .map(|col| {
            CompletionItem::new(&col.name, CompletionKind::Column, boost::COLUMN)
                .with_insert(quote_ident(&col.name))
                .with_info(&col.data_type)
        })
        .collect()
}

/// Every source, each in its own tier.
///
/// After a `.` the qualifier is already typed, so tables insert only their
/// quoted short name.
fn generic(
    word_prefix: &str,
    qualified: bool,
    snapshot: Option<&SchemaMetadata>,
    active_table: Option<&ActiveTable>,
    sources: &CompletionSources,
) -> Vec<CompletionItem> {
    let filter = PrefixFilter::new(word_prefix);
    let mut items = Vec::new();

    items.extend(
        sources
            .keywords
            .iter()
            .filter(|kw| filter.prefix_of(kw))
            .map(|kw| CompletionItem::new(kw, CompletionKind::Keyword, boost::KEYWORD)),
    );
    items.extend(
        sources
            .functions
            .iter()
            .filter(|f| filter.prefix_of(f))
            .map(|f| CompletionItem::new(f, CompletionKind::Function, boost::FUNCTION)),
    );

    if let Some(active) = active_table {
        items.extend(
            active
                .columns
                .iter()
                .filter(|col| filter.prefix_of(&col.name))
                .map(|col| {
                    CompletionItem::new(&col.name, CompletionKind::Column, boost::ACTIVE_COLUMN)
                        .with_insert(quote_ident(&col.name))
                        .with_info(&col.data_type)
                }),
        );
    }

    let Some(meta) = snapshot else {
        return items;
    };

    items.extend(meta.schemas().filter(|s| filter.prefix_of(s)).map(|schema| {
        CompletionItem::new(schema, CompletionKind::Namespace, boost::SCHEMA).with_insert(format!("{}.", schema))
    }));

    items.extend(
        meta.tables()
            .filter(|(_, table)| filter.prefix_of(&table.name))
            .map(|(_, table)| {
                let insert = if qualified {
                    quote_ident(&table.name)
                } else {
                    quote_qualified(&table.schema, &table.name)
                };
                CompletionItem::new(&table.name, CompletionKind::Table, boost::TABLE)
                    .with_insert(insert)
                    .with_info(&table.schema)
            }),
    );

    // Selected table's columns as the snapshot knows them
    if let Some(active) = active_table {
        items.extend(
            meta.columns_for(&active.schema, &active.table)
                .iter()
                .filter(|col| filter.prefix_of(&col.name))
                .map(|col| {
                    CompletionItem::new(&col.name, CompletionKind::Column, boost::SELECTED_COLUMN)
                        .with_insert(quote_ident(&col.name))
                        .with_info(&col.data_type)
                }),
        );
    }

    items
}
