//! zkSQL — SQL compiled to privacy-preserving ledger programs.
//!
//! Tables are deployed Aleo-style programs; rows are records owned by the
//! inserting account. INSERT lowers to a program call, SELECT either reads
//! caller-owned records locally or deploys a synthesized, caller-gated view
//! program that re-homes the selected data.

pub mod core;
pub mod error;
pub mod registry;
pub mod sql;

pub use crate::core::query::{execute_statement, QueryContext, QueryOutcome};
pub use crate::error::{Error, Result};
pub use crate::sql::parse_statement;
