//! Error types for the zkSQL compiler.
//!
//! Every failure is synchronous and raised at detection; the query compiler
//! propagates them to its single top-level boundary and never attempts a
//! deploy or call after an earlier stage failed.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Program source syntax
    #[error("Invalid syntax in {block} '{name}': '{line}'")]
    InvalidSyntax {
        block: &'static str,
        name: String,
        line: String,
    },

    #[error("Invalid type '{text}' in declaration '{declaration}'")]
    InvalidType { text: String, declaration: String },

    // Program schema
    #[error("No Program ID declared")]
    NoProgramId,

    #[error("Multiple Program ID declarations")]
    MultipleProgramIds,

    #[error("No function found for finalize block '{0}'")]
    UnmatchedFinalize(String),

    #[error("Duplicate definition of '{0}'")]
    DuplicateDefinition(String),

    #[error("Struct '{0}' was not found in program source code")]
    StructNotFound(String),

    #[error("Type '{name}' does not resolve to a definition in '{program}' or its imports")]
    UnresolvedType { name: String, program: String },

    // Query shape
    #[error("Unsupported query: {0}")]
    Unsupported(String),

    #[error("Table '{0}' not found")]
    TableNotFound(String),

    #[error("Column '{0}' not found")]
    ColumnNotFound(String),

    #[error("Ambiguous selected columns: '{0}'. Use 'as' to rename them")]
    AmbiguousColumns(String),

    #[error("Invalid insert query. Missing columns: ({}). Extra columns: ({})", .missing.join(", "), .extra.join(", "))]
    ColumnSetMismatch {
        missing: Vec<String>,
        extra: Vec<String>,
    },

    // Value conversion
    #[error("Input type '{kind}' incompatible with ledger type '{target}' for value '{value}'")]
    IncompatibleType {
        value: String,
        kind: &'static str,
        target: String,
    },

    #[error("Invalid account address: '{0}'")]
    InvalidAddress(String),

    // Identifiers
    #[error("Database should be a valid account address, got '{0}'")]
    InvalidDatabase(String),

    // Registry
    #[error("Program '{0}' was not found on the ledger")]
    ProgramNotFound(String),

    #[error("Registry error: {0}")]
    Registry(String),

    // SQL front-end
    #[error("SQL parse error: {0}")]
    SqlParse(String),
}
