//! Program registry abstraction — the ledger-facing seam.
//!
//! The compiler's only effects go through this trait: fetching a deployed
//! program's source, deploying a synthesized program, and calling a program
//! function. Transport, signing, and fee handling live behind the
//! implementation; the compiler inspects only success or failure.

pub mod memory;

pub use memory::MemoryRegistry;

use crate::error::Result;
use async_trait::async_trait;
use std::fmt;

/// An opaque transaction id returned by the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxId(pub String);

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ledger access used by the query compiler.
#[async_trait]
pub trait ProgramRegistry: Send + Sync {
    /// Fetch the source text of a deployed program by id
    /// (`Error::ProgramNotFound` when missing).
    async fn fetch_program(&self, program_id: &str) -> Result<String>;

    /// Deploy new program source under the given id.
    async fn deploy(&self, program_id: &str, source: &str) -> Result<TxId>;

    /// Call a program function with ordered literal arguments.
    async fn call(&self, program_id: &str, function: &str, args: &[String]) -> Result<TxId>;
}
