//! Adapter from the `sqlparser` AST to the boundary statement types.
//!
//! Parses with the generic dialect, then converts exactly the supported
//! subset: single-row INSERT, flat one- or two-table SELECT with an AND
//! conjunction of comparisons, and the two CREATE forms the compiler
//! answers with guidance. Everything else is rejected here so the
//! compiler only ever sees shapes it can lower.

use crate::error::{Error, Result};
use crate::sql::{
    ColumnSelector, Comparison, ComparisonOp, InsertStatement, Literal, Operand, ProjectionItem,
    SelectStatement, Statement, TableRef, WhereClause,
};
use sqlparser::ast;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

/// Parse one SQL statement into the boundary AST.
pub fn parse_statement(sql: &str) -> Result<Statement> {
    let mut statements = Parser::parse_sql(&GenericDialect {}, sql)
        .map_err(|error| Error::SqlParse(error.to_string()))?;
    if statements.len() != 1 {
        return Err(Error::Unsupported(format!(
            "expected exactly one statement, got {}",
            statements.len()
        )));
    }
    match statements.remove(0) {
        ast::Statement::Insert {
            table_name,
            columns,
            source,
            ..
        } => convert_insert(table_name, columns, *source),
        ast::Statement::Query(query) => convert_select(*query),
        ast::Statement::CreateDatabase { db_name, .. } => Ok(Statement::CreateDatabase {
            name: last_ident(&db_name),
        }),
        ast::Statement::CreateTable { name, .. } => Ok(Statement::CreateTable {
            name: last_ident(&name),
        }),
        other => Err(Error::Unsupported(format!(
            "statement '{}' is not supported",
            other
        ))),
    }
}

fn convert_insert(
    table_name: ast::ObjectName,
    columns: Vec<ast::Ident>,
    source: ast::Query,
) -> Result<Statement> {
    let table = object_name_to_table_ref(table_name, None)?;
    let ast::SetExpr::Values(values) = *source.body else {
        return Err(Error::Unsupported(
            "INSERT only accepts a VALUES list".to_string(),
        ));
    };
    if values.rows.len() != 1 {
        return Err(Error::Unsupported(format!(
            "INSERT takes exactly one VALUES row, got {}",
            values.rows.len()
        )));
    }
    let row = values.rows.into_iter().next().unwrap_or_default();
    let values = row.into_iter().map(expr_to_literal).collect::<Result<_>>()?;
    Ok(Statement::Insert(InsertStatement {
        table,
        columns: columns.into_iter().map(|ident| ident.value).collect(),
        values,
    }))
}

fn convert_select(query: ast::Query) -> Result<Statement> {
    if query.with.is_some() {
        return Err(Error::Unsupported("WITH is not supported".to_string()));
    }
    if !query.order_by.is_empty() {
        return Err(Error::Unsupported("ORDER BY is not supported".to_string()));
    }
    if query.limit.is_some() || query.offset.is_some() || query.fetch.is_some() {
        return Err(Error::Unsupported(
            "LIMIT and OFFSET are not supported".to_string(),
        ));
    }
    let ast::SetExpr::Select(select) = *query.body else {
        return Err(Error::Unsupported(
            "only plain SELECT queries are supported".to_string(),
        ));
    };
    if select.distinct.is_some() {
        return Err(Error::Unsupported("DISTINCT is not supported".to_string()));
    }
    if matches!(&select.group_by, ast::GroupByExpr::Expressions(exprs) if !exprs.is_empty()) {
        return Err(Error::Unsupported("GROUP BY is not supported".to_string()));
    }
    if select.having.is_some() {
        return Err(Error::Unsupported("HAVING is not supported".to_string()));
    }

    let mut from = Vec::with_capacity(select.from.len());
    for item in select.from {
        if !item.joins.is_empty() {
            return Err(Error::Unsupported(
                "JOIN syntax is not supported; list the tables in FROM".to_string(),
            ));
        }
        from.push(table_factor_to_ref(item.relation)?);
    }

    let projection = select
        .projection
        .into_iter()
        .map(convert_projection_item)
        .collect::<Result<_>>()?;
    let where_clause = match select.selection {
        Some(expr) => {
            let mut comparisons = Vec::new();
            collect_comparisons(expr, &mut comparisons)?;
            Some(WhereClause { comparisons })
        }
        None => None,
    };

    Ok(Statement::Select(SelectStatement {
        from,
        projection,
        where_clause,
    }))
}

fn table_factor_to_ref(factor: ast::TableFactor) -> Result<TableRef> {
    match factor {
        ast::TableFactor::Table { name, alias, .. } => {
            object_name_to_table_ref(name, alias.map(|a| a.name.value))
        }
        ast::TableFactor::Derived { .. } => Err(Error::Unsupported(
            "nested queries are not supported".to_string(),
        )),
        other => Err(Error::Unsupported(format!(
            "table expression '{}' is not supported",
            other
        ))),
    }
}

/// `table` or `database.table`; the database part, when present, must be
/// an account address and is validated downstream.
fn object_name_to_table_ref(name: ast::ObjectName, alias: Option<String>) -> Result<TableRef> {
    let mut parts: Vec<String> = name.0.into_iter().map(|ident| ident.value).collect();
    match parts.len() {
        1 => Ok(TableRef {
            database: None,
            table: parts.remove(0),
            alias,
        }),
        2 => {
            let table = parts.remove(1);
            Ok(TableRef {
                database: Some(parts.remove(0)),
                table,
                alias,
            })
        }
        _ => Err(Error::Unsupported(format!(
            "table name '{}' has too many qualifiers",
            parts.join(".")
        ))),
    }
}

fn convert_projection_item(item: ast::SelectItem) -> Result<ProjectionItem> {
    match item {
        ast::SelectItem::Wildcard(_) => Ok(ProjectionItem {
            table: None,
            column: ColumnSelector::Star,
            alias: None,
        }),
        ast::SelectItem::QualifiedWildcard(name, _) => Ok(ProjectionItem {
            table: Some(last_ident(&name)),
            column: ColumnSelector::Star,
            alias: None,
        }),
        ast::SelectItem::UnnamedExpr(expr) => projection_from_expr(expr, None),
        ast::SelectItem::ExprWithAlias { expr, alias } => {
            projection_from_expr(expr, Some(alias.value))
        }
    }
}

fn projection_from_expr(expr: ast::Expr, alias: Option<String>) -> Result<ProjectionItem> {
    let (table, name) = column_parts(expr)?;
    Ok(ProjectionItem {
        table,
        column: ColumnSelector::Named(name),
        alias,
    })
}

/// AND conjunctions flatten; anything else either converts to one
/// comparison or is rejected.
fn collect_comparisons(expr: ast::Expr, out: &mut Vec<Comparison>) -> Result<()> {
    match expr {
        ast::Expr::BinaryOp { left, op, right } if op == ast::BinaryOperator::And => {
            collect_comparisons(*left, out)?;
            collect_comparisons(*right, out)
        }
        ast::Expr::BinaryOp { op, .. } if op == ast::BinaryOperator::Or => Err(Error::Unsupported(
            "OR is not supported in WHERE".to_string(),
        )),
        ast::Expr::BinaryOp { left, op, right } => {
            let op = match op {
                ast::BinaryOperator::Eq => ComparisonOp::Eq,
                ast::BinaryOperator::NotEq => ComparisonOp::NotEq,
                ast::BinaryOperator::Lt => ComparisonOp::Lt,
                ast::BinaryOperator::LtEq => ComparisonOp::LtEq,
                ast::BinaryOperator::Gt => ComparisonOp::Gt,
                ast::BinaryOperator::GtEq => ComparisonOp::GtEq,
                other => {
                    return Err(Error::Unsupported(format!(
                        "operator '{}' is not supported in WHERE",
                        other
                    )))
                }
            };
            out.push(Comparison {
                left: expr_to_operand(*left)?,
                op,
                right: expr_to_operand(*right)?,
            });
            Ok(())
        }
        ast::Expr::Nested(inner) => collect_comparisons(*inner, out),
        other => Err(Error::Unsupported(format!(
            "WHERE expression '{}' is not supported",
            other
        ))),
    }
}

fn expr_to_operand(expr: ast::Expr) -> Result<Operand> {
    match expr {
        ast::Expr::Identifier(_) | ast::Expr::CompoundIdentifier(_) => {
            let (table, name) = column_parts(expr)?;
            Ok(Operand::Column { table, name })
        }
        other => Ok(Operand::Literal(expr_to_literal(other)?)),
    }
}

fn column_parts(expr: ast::Expr) -> Result<(Option<String>, String)> {
    match expr {
        ast::Expr::Identifier(ident) => Ok((None, ident.value)),
        ast::Expr::CompoundIdentifier(mut idents) if idents.len() == 2 => {
            let name = idents.remove(1).value;
            Ok((Some(idents.remove(0).value), name))
        }
        other => Err(Error::Unsupported(format!(
            "'{}' is not a column reference",
            other
        ))),
    }
}

fn expr_to_literal(expr: ast::Expr) -> Result<Literal> {
    match expr {
        ast::Expr::Value(value) => value_to_literal(value),
        ast::Expr::UnaryOp {
            op: ast::UnaryOperator::Minus,
            expr,
        } => match *expr {
            ast::Expr::Value(ast::Value::Number(number, _)) => {
                Ok(Literal::Number(format!("-{}", number)))
            }
            other => Err(Error::Unsupported(format!(
                "'-{}' is not a literal value",
                other
            ))),
        },
        other => Err(Error::Unsupported(format!(
            "'{}' is not a literal value",
            other
        ))),
    }
}

fn value_to_literal(value: ast::Value) -> Result<Literal> {
    match value {
        ast::Value::Number(number, _) => Ok(Literal::Number(number)),
        ast::Value::SingleQuotedString(text) => Ok(Literal::Str(text)),
        ast::Value::Boolean(flag) => Ok(Literal::Bool(flag)),
        other => Err(Error::Unsupported(format!(
            "literal '{}' is not supported",
            other
        ))),
    }
}

fn last_ident(name: &ast::ObjectName) -> String {
    name.0
        .last()
        .map(|ident| ident.value.clone())
        .unwrap_or_default()
}
