//! SQL context extraction for autocomplete
//!
//! Looks at the current line up to the cursor and decides what the user is
//! typing. Rules are tried from most to least specific and the first one that
//! matches wins:
//!
//! 1. `schema.table.col|`  - columns of a qualified table
//! 2. `FROM tab|` / `JOIN schema.tab|` - table names
//! 3. `wor|` - generic identifier
//!
//! The text is scanned backwards from the cursor; nothing here allocates more
//! than the current line or can fail.

use crate::db::SchemaMetadata;
use tracing::trace;

/// Editor buffer plus cursor, as handed over on every keystroke
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompletionContext<'a> {
    pub text: &'a str,
    /// Offset in characters from the start of `text`; clamped to its length
    pub cursor_offset: usize,
}

impl<'a> CompletionContext<'a> {
    pub fn new(text: &'a str, cursor_offset: usize) -> Self {
        Self { text, cursor_offset }
    }

    /// Context with the cursor at the end of `text`
    pub fn at_end(text: &'a str) -> Self {
        Self::new(text, text.chars().count())
    }
}

/// What kind of identifier is being typed
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Scenario {
    /// After "schema.table." - suggest columns of that table
    /// Example: WHERE public.users.em|
    ColumnOf {
        schema: String,
        table: String,
        prefix: String,
    },

    /// After FROM/JOIN - suggest schemas and qualified tables
    /// Example: SELECT * FROM us|
    TableUnqualified { prefix: String },

    /// After FROM/JOIN and "schema." - suggest tables of that schema
    /// Example: SELECT * FROM public.us|
    TableQualified { schema: String, prefix: String },

    /// Anything else that ends in an identifier.
    /// `qualified` is set when the word directly follows a `.`
    Generic { word_prefix: String, qualified: bool },
}

/// A scenario plus the offset (in characters) where the replaced text begins
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Classification {
    pub scenario: Scenario,
    pub anchor: usize,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_line_break(c: char) -> bool {
    c == '\n' || c == '\r'
}

/// Start of the identifier run ending at `end`
fn ident_start(chars: &[char], end: usize) -> usize {
    let mut start = end;
    while start > 0 && is_ident_char(chars[start - 1]) {
        start -= 1;
    }
    start
}

/// Characters of the cursor line before the cursor, and the clamped cursor
fn line_prefix(text: &str, cursor_offset: usize) -> (Vec<char>, usize) {
    let before: Vec<char> = text.chars().take(cursor_offset).collect();
    let cursor = before.len();
    let line_start = before
        .iter()
        .rposition(|&c| is_line_break(c))
        .map(|pos| pos + 1)
        .unwrap_or(0);
    (before[line_start..].to_vec(), cursor)
}

/// Rule 1: `IDENT '.' IDENT '.' IDENT*` at the end of the prefix
fn match_qualified_column(chars: &[char]) -> Option<Scenario> {
    let col_start = ident_start(chars, chars.len());
    if col_start == 0 || chars[col_start - 1] != '.' {
        return None;
    }

    let table_end = col_start - 1;
    let table_start = ident_start(chars, table_end);
    if table_start == table_end || table_start == 0 || chars[table_start - 1] != '.' {
        return None;
    }

    let schema_end = table_start - 1;
    let schema_start = ident_start(chars, schema_end);
    if schema_start == schema_end {
        return None;
    }

    Some(Scenario::ColumnOf {
        schema: chars[schema_start..schema_end].iter().collect(),
        table: chars[table_start..table_end].iter().collect(),
        prefix: chars[col_start..].iter().collect(),
    })
}

/// Rule 2: `(FROM|JOIN)\s+[^,\s]*` at the end of the prefix, case-insensitive
fn match_table_context(chars: &[char]) -> Option<Scenario> {
    let mut start = chars.len();
    while start > 0 && !chars[start - 1].is_whitespace() && chars[start - 1] != ',' {
        start -= 1;
    }

    let mut ws = start;
    while ws > 0 && chars[ws - 1].is_whitespace() {
        ws -= 1;
    }
    if ws == start || ws < 4 {
        return None;
    }

    let keyword: String = chars[ws - 4..ws].iter().collect();
    if !keyword.eq_ignore_ascii_case("FROM") && !keyword.eq_ignore_ascii_case("JOIN") {
        return None;
    }

    let table_prefix: String = chars[start..].iter().collect();
    Some(match table_prefix.split_once('.') {
        Some((schema, rest)) => Scenario::TableQualified {
            schema: schema.to_string(),
            prefix: rest.to_string(),
        },
        None => Scenario::TableUnqualified { prefix: table_prefix },
    })
}

/// Rule 3: trailing identifier run, if any
fn match_generic(chars: &[char]) -> Option<Scenario> {
    let start = ident_start(chars, chars.len());
    if start == chars.len() {
        return None;
    }
    Some(Scenario::Generic {
        word_prefix: chars[start..].iter().collect(),
        qualified: start > 0 && chars[start - 1] == '.',
    })
}

/// Classify a line prefix by syntax alone, without looking at metadata
pub fn detect_scenario(line_prefix: &str) -> Option<Scenario> {
    let chars: Vec<char> = line_prefix.chars().collect();
    detect_scenario_chars(&chars)
}

/// Length in characters of the text the scenario would replace.
///
/// Qualified tables are inserted as `"schema"."table"`, so the typed schema
/// and its dot are replaced too.
fn fragment_len(scenario: &Scenario) -> usize {
    match scenario {
        Scenario::ColumnOf { prefix, .. } | Scenario::TableUnqualified { prefix } => prefix.chars().count(),
        Scenario::TableQualified { schema, prefix } => schema.chars().count() + 1 + prefix.chars().count(),
        Scenario::Generic { word_prefix, .. } => word_prefix.chars().count(),
    }
}

/// Classify the cursor position.
///
/// A `schema.table.` prefix only counts as a column lookup when the snapshot
/// holds columns for that table; otherwise the trailing fragment is treated as
/// a generic word. Returns `None` when nothing identifier-like precedes the
/// cursor.
pub fn classify(context: &CompletionContext, snapshot: Option<&SchemaMetadata>) -> Option<Classification> {
    let (prefix, cursor) = line_prefix(context.text, context.cursor_offset);

    let scenario = match detect_scenario_chars(&prefix)? {
        Scenario::ColumnOf { schema, table, prefix: column_prefix }
            if !snapshot.is_some_and(|meta| meta.has_columns(&schema, &table)) =>
        {
            trace!(%schema, %table, "no column metadata, falling back to generic");
            if column_prefix.is_empty() {
                return None;
            }
            Scenario::Generic {
                word_prefix: column_prefix,
                qualified: true,
            }
        }
        scenario => scenario,
    };

    let anchor = cursor - fragment_len(&scenario);
    Some(Classification { scenario, anchor })
}

fn detect_scenario_chars(chars: &[char]) -> Option<Scenario> {
    match_qualified_column(chars)
        .or_else(|| match_table_context(chars))
        .or_else(|| match_generic(chars))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::fixtures;
    use pretty_assertions::assert_eq;

    fn generic(word: &str) -> Scenario {
        Scenario::Generic {
            word_prefix: word.to_string(),
            qualified: false,
        }
    }

    fn after_dot(word: &str) -> Scenario {
        Scenario::Generic {
            word_prefix: word.to_string(),
            qualified: true,
        }
    }

    #[test]
    fn test_column_rule_beats_table_rule() {
        assert_eq!(
            detect_scenario("FROM a.b.c"),
            Some(Scenario::ColumnOf {
                schema: "a".to_string(),
                table: "b".to_string(),
                prefix: "c".to_string(),
            })
        );
    }

    #[test]
    fn test_column_rule_takes_nearest_identifiers() {
        assert_eq!(
            detect_scenario("x.a.b."),
            Some(Scenario::ColumnOf {
                schema: "a".to_string(),
                table: "b".to_string(),
                prefix: String::new(),
            })
        );
    }

    #[test]
    fn test_single_dot_is_not_column_context() {
        // alias.col is not resolved, it is just a generic word
        assert_eq!(detect_scenario("SELECT u.em"), Some(after_dot("em")));
    }

    #[test]
    fn test_table_unqualified() {
        assert_eq!(
            detect_scenario("SELECT * FROM pub"),
            Some(Scenario::TableUnqualified { prefix: "pub".to_string() })
        );
        assert_eq!(
            detect_scenario("select * from   "),
            Some(Scenario::TableUnqualified { prefix: String::new() })
        );
        assert_eq!(
            detect_scenario("a JOIN\tor"),
            Some(Scenario::TableUnqualified { prefix: "or".to_string() })
        );
    }

    #[test]
    fn test_table_qualified_splits_on_first_dot() {
        assert_eq!(
            detect_scenario("SELECT * FROM public.us"),
            Some(Scenario::TableQualified {
                schema: "public".to_string(),
                prefix: "us".to_string(),
            })
        );
        assert_eq!(
            detect_scenario("FROM public."),
            Some(Scenario::TableQualified {
                schema: "public".to_string(),
                prefix: String::new(),
            })
        );
    }

    #[test]
    fn test_qualified_table_anchor_covers_schema() {
        let text = "SELECT * FROM public.us";
        let c = classify(&CompletionContext::at_end(text), None).unwrap();
        assert_eq!(c.anchor, 14);

        let c = classify(&CompletionContext::at_end("JOIN ü."), None).unwrap();
        assert_eq!(c.anchor, 5);
    }

    #[test]
    fn test_comma_ends_table_context() {
        assert_eq!(detect_scenario("FROM a, b"), Some(generic("b")));
        assert_eq!(detect_scenario("FROM a,"), None);
    }

    #[test]
    fn test_keyword_needs_whitespace_before_table() {
        assert_eq!(detect_scenario("FROM"), Some(generic("FROM")));
        assert_eq!(detect_scenario("SELECT fromage"), Some(generic("fromage")));
    }

    #[test]
    fn test_generic_and_empty() {
        assert_eq!(detect_scenario("SEL"), Some(generic("SEL")));
        assert_eq!(detect_scenario("SELECT "), None);
        assert_eq!(detect_scenario(""), None);
        assert_eq!(detect_scenario("WHERE x = ("), None);
    }

    #[test]
    fn test_only_current_line_is_considered() {
        let text = "SELECT * FROM\nus";
        let c = classify(&CompletionContext::at_end(text), None).unwrap();
        assert_eq!(c.scenario, generic("us"));
        assert_eq!(c.anchor, 14);
    }

    #[test]
    fn test_classify_column_with_metadata() {
        let meta = fixtures::sample();
        let text = "SELECT * FROM public.users WHERE public.users.em";
        let c = classify(&CompletionContext::at_end(text), Some(&meta)).unwrap();
        assert_eq!(
            c.scenario,
            Scenario::ColumnOf {
                schema: "public".to_string(),
                table: "users".to_string(),
                prefix: "em".to_string(),
            }
        );
        assert_eq!(c.anchor, text.len() - 2);
    }

    #[test]
    fn test_classify_column_falls_back_without_metadata() {
        let meta = fixtures::sample();
        let c = classify(&CompletionContext::at_end("FROM a.b.c"), Some(&meta)).unwrap();
        assert_eq!(c.scenario, after_dot("c"));
        assert_eq!(c.anchor, 9);

        let c = classify(&CompletionContext::at_end("FROM a.b.c"), None).unwrap();
        assert_eq!(c.scenario, after_dot("c"));

        assert_eq!(classify(&CompletionContext::at_end("FROM a.b."), None), None);
    }

    #[test]
    fn test_cursor_is_clamped_and_mid_text() {
        let c = classify(&CompletionContext::new("SELECT", 99), None).unwrap();
        assert_eq!(c.scenario, generic("SELECT"));
        assert_eq!(c.anchor, 0);

        let c = classify(&CompletionContext::new("SELECT name FROM t", 9), None).unwrap();
        assert_eq!(c.scenario, generic("na"));
        assert_eq!(c.anchor, 7);

        assert_eq!(classify(&CompletionContext::new("SELECT", 0), None), None);
    }

    #[test]
    fn test_offsets_count_characters() {
        let text = "SELECT 'é' FROM ta";
        let c = classify(&CompletionContext::at_end(text), None).unwrap();
        assert_eq!(c.scenario, Scenario::TableUnqualified { prefix: "ta".to_string() });
        assert_eq!(c.anchor, 16);

        let c = classify(&CompletionContext::at_end("FROM résumé"), None).unwrap();
        assert_eq!(c.scenario, Scenario::TableUnqualified { prefix: "résumé".to_string() });
        assert_eq!(c.anchor, 5);
    }
}
