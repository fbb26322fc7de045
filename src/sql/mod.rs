//! SQL boundary AST — the statement shape the query compiler consumes.
//!
//! Tokenization and AST construction are delegated to the `sqlparser`
//! crate; [`frontend`] adapts its output into these types and rejects
//! everything outside the supported subset. The compiler never touches the
//! front-end's AST directly.

pub mod frontend;

pub use frontend::parse_statement;

/// A supported SQL statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    Insert(InsertStatement),
    Select(SelectStatement),
    CreateDatabase { name: String },
    CreateTable { name: String },
}

/// A table reference with its optional database qualifier and alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub database: Option<String>,
    pub table: String,
    pub alias: Option<String>,
}

impl TableRef {
    /// The name the query refers to this table by.
    pub fn reference(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }
}

/// A literal value from a VALUES row or a WHERE comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    /// Numeric text, sign included, as written in the query.
    Number(String),
    /// Single-quoted string contents.
    Str(String),
    Bool(bool),
}

impl Literal {
    /// The literal kind, for conversion error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Str(_) => "string",
            Self::Bool(_) => "boolean",
        }
    }

    /// The raw text, for conversion error messages.
    pub fn text(&self) -> String {
        match self {
            Self::Number(n) => n.clone(),
            Self::Str(s) => s.clone(),
            Self::Bool(b) => b.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InsertStatement {
    pub table: TableRef,
    /// Explicit column list; empty means schema order.
    pub columns: Vec<String>,
    /// Exactly one VALUES row.
    pub values: Vec<Literal>,
}

/// One projected item: `*`, `col`, `t.col`, `t.*`, optionally aliased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectionItem {
    pub table: Option<String>,
    pub column: ColumnSelector,
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSelector {
    Star,
    Named(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectStatement {
    pub from: Vec<TableRef>,
    pub projection: Vec<ProjectionItem>,
    pub where_clause: Option<WhereClause>,
}

/// A conjunction of comparisons; OR is rejected at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhereClause {
    pub comparisons: Vec<Comparison>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Eq,
    NotEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operand {
    Column { table: Option<String>, name: String },
    Literal(Literal),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    pub left: Operand,
    pub op: ComparisonOp,
    pub right: Operand,
}
