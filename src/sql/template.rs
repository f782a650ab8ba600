//! Identifier quoting and the statements the console generates on its own

/// Quote an identifier for PostgreSQL, doubling embedded quotes
pub fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// `"schema"."table"`
pub fn quote_qualified(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table))
}

/// Query shown in the editor when a table is picked in the browser
pub fn select_query_for(schema: &str, table: &str, limit: usize) -> String {
    format!("SELECT * FROM {} LIMIT {};", quote_qualified(schema, table), limit)
}
