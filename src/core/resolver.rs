//! Query-time column resolution.
//!
//! Maps a SELECT projection onto the loaded source tables: `*` and
//! unqualified names expand against every source, qualified names restrict
//! to the matching reference, and every output name must be unique across
//! the whole projection.

use crate::core::table::{Column, Table};
use crate::error::{Error, Result};
use crate::sql::{ColumnSelector, ProjectionItem};
use rustc_hash::FxHashSet;

/// One resolved projected field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    /// Output name: the alias when given, else the column name. Unique
    /// within one projection.
    pub output: String,
    /// Reference of the source table.
    pub table: String,
    pub column: Column,
}

/// Resolve a full projection against the loaded tables.
pub fn resolve_projection(items: &[ProjectionItem], tables: &[Table]) -> Result<Vec<Field>> {
    let mut fields = Vec::new();
    for item in items {
        fields.extend(resolve_item(item, tables)?);
    }

    let duplicates = duplicate_outputs(&fields);
    if !duplicates.is_empty() {
        return Err(Error::AmbiguousColumns(duplicates.join(", ")));
    }
    Ok(fields)
}

fn resolve_item(item: &ProjectionItem, tables: &[Table]) -> Result<Vec<Field>> {
    let concerned: Vec<&Table> = match &item.table {
        None => tables.iter().collect(),
        Some(reference) => {
            let matching: Vec<&Table> = tables
                .iter()
                .filter(|table| table.reference == *reference)
                .collect();
            if matching.is_empty() {
                return Err(Error::TableNotFound(reference.clone()));
            }
            matching
        }
    };

    let mut fields = Vec::new();
    for table in concerned {
        for column in &table.columns {
            let selected = match &item.column {
                ColumnSelector::Star => true,
                ColumnSelector::Named(name) => &column.name == name,
            };
            if selected {
                fields.push(Field {
                    output: item.alias.clone().unwrap_or_else(|| column.name.clone()),
                    table: table.reference.clone(),
                    column: column.clone(),
                });
            }
        }
    }

    if fields.is_empty() {
        if let ColumnSelector::Named(name) = &item.column {
            return Err(Error::ColumnNotFound(name.clone()));
        }
    }
    Ok(fields)
}

/// Output names appearing more than once, in first-appearance order.
fn duplicate_outputs(fields: &[Field]) -> Vec<String> {
    let mut seen = FxHashSet::default();
    let mut reported = FxHashSet::default();
    let mut duplicates = Vec::new();
    for field in fields {
        if !seen.insert(field.output.as_str()) && reported.insert(field.output.as_str()) {
            duplicates.push(field.output.clone());
        }
    }
    duplicates
}

/// Resolve one column reference (WHERE operand) to its source table index
/// and column. Unqualified names matching several sources are ambiguous.
pub fn resolve_column<'a>(
    table_hint: Option<&str>,
    name: &str,
    tables: &'a [Table],
) -> Result<(usize, &'a Column)> {
    let mut found: Option<(usize, &Column)> = None;
    for (index, table) in tables.iter().enumerate() {
        if let Some(hint) = table_hint {
            if table.reference != hint {
                continue;
            }
        }
        if let Some(column) = table.column(name) {
            if found.is_some() {
                return Err(Error::AmbiguousColumns(name.to_string()));
            }
            found = Some((index, column));
        }
    }
    match found {
        Some(hit) => Ok(hit),
        None => {
            if let Some(hint) = table_hint {
                if !tables.iter().any(|t| t.reference == hint) {
                    return Err(Error::TableNotFound(hint.to_string()));
                }
            }
            Err(Error::ColumnNotFound(name.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::table::TableKind;
    use crate::core::types::{parse_type, Address};

    const OWNER: &str = "aleo1rhgdu77hgyqd3xjj8ucu3jj9r2krwz6mnzyd80gncr5fxcwlh5rsvzp9px";

    fn table(name: &str, columns: &[(&str, &str)]) -> Table {
        let columns = columns
            .iter()
            .map(|(column, ty)| Column {
                name: (*column).to_string(),
                ty: parse_type(ty, "t").unwrap(),
            })
            .collect();
        Table::from_columns(Address::parse(OWNER).unwrap(), name, columns, TableKind::Base)
    }

    fn star() -> ProjectionItem {
        ProjectionItem {
            table: None,
            column: ColumnSelector::Star,
            alias: None,
        }
    }

    fn named(table: Option<&str>, column: &str, alias: Option<&str>) -> ProjectionItem {
        ProjectionItem {
            table: table.map(str::to_string),
            column: ColumnSelector::Named(column.to_string()),
            alias: alias.map(str::to_string),
        }
    }

    #[test]
    fn test_resolver_star_expands_all_sources() {
        let tables = [table("t1", &[("a", "u64")]), table("t2", &[("b", "u64")])];
        let fields = resolve_projection(&[star()], &tables).unwrap();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].output, "a");
        assert_eq!(fields[0].table, "t1");
        assert_eq!(fields[1].output, "b");
        assert_eq!(fields[1].table, "t2");
    }

    #[test]
    fn test_resolver_qualified_restricts() {
        let tables = [table("t1", &[("a", "u64")]), table("t2", &[("a", "u64")])];
        let fields =
            resolve_projection(&[named(Some("t2"), "a", Some("a2"))], &tables).unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].table, "t2");
        assert_eq!(fields[0].output, "a2");
    }

    #[test]
    fn test_resolver_unqualified_duplicate_is_ambiguous() {
        let tables = [table("t1", &[("a", "u64")]), table("t2", &[("a", "u64")])];
        let err = resolve_projection(&[named(None, "a", None)], &tables).unwrap_err();
        assert_eq!(err, Error::AmbiguousColumns("a".to_string()));
    }

    #[test]
    fn test_resolver_unknown_table() {
        let tables = [table("t1", &[("a", "u64")])];
        assert_eq!(
            resolve_projection(&[named(Some("ghost"), "a", None)], &tables).unwrap_err(),
            Error::TableNotFound("ghost".to_string())
        );
    }

    #[test]
    fn test_resolver_unknown_column() {
        let tables = [table("t1", &[("a", "u64")])];
        assert_eq!(
            resolve_projection(&[named(None, "z", None)], &tables).unwrap_err(),
            Error::ColumnNotFound("z".to_string())
        );
    }

    #[test]
    fn test_resolver_aliases_disambiguate() {
        let tables = [table("t1", &[("a", "u64")]), table("t2", &[("a", "u64")])];
        let items = [
            named(Some("t1"), "a", Some("left")),
            named(Some("t2"), "a", Some("right")),
        ];
        let fields = resolve_projection(&items, &tables).unwrap();
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn test_resolver_column_lookup_for_predicates() {
        let tables = [table("t1", &[("a", "u64")]), table("t2", &[("b", "u64")])];
        let (index, column) = resolve_column(None, "b", &tables).unwrap();
        assert_eq!(index, 1);
        assert_eq!(column.name, "b");

        assert_eq!(
            resolve_column(None, "z", &tables).unwrap_err(),
            Error::ColumnNotFound("z".to_string())
        );
    }

    #[test]
    fn test_resolver_predicate_ambiguity() {
        let tables = [table("t1", &[("a", "u64")]), table("t2", &[("a", "u64")])];
        assert_eq!(
            resolve_column(None, "a", &tables).unwrap_err(),
            Error::AmbiguousColumns("a".to_string())
        );
        assert!(resolve_column(Some("t1"), "a", &tables).is_ok());
    }
}
