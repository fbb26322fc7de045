//! Core compiler logic — program model, parsing, generation, tables,
//! resolution, and query lowering.

pub mod codegen;
pub mod ident;
pub mod parser;
pub mod program;
pub mod query;
pub mod resolver;
pub mod table;
pub mod types;
