//! In-memory program registry — tests and local experiments.

use super::{ProgramRegistry, TxId};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// A recorded `call` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub program_id: String,
    pub function: String,
    pub args: Vec<String>,
}

/// Registry backed by in-memory maps. Deploys and calls are recorded so
/// tests can assert on what the compiler issued.
#[derive(Default)]
pub struct MemoryRegistry {
    programs: Mutex<HashMap<String, String>>,
    deploys: Mutex<Vec<String>>,
    calls: Mutex<Vec<RecordedCall>>,
    next_tx: Mutex<u64>,
}

impl MemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a deployed program without recording a deploy.
    pub fn publish(&self, program_id: &str, source: &str) {
        self.programs
            .lock()
            .expect("registry lock")
            .insert(program_id.to_string(), source.to_string());
    }

    /// Ids deployed through the trait, in order.
    pub fn deployed(&self) -> Vec<String> {
        self.deploys.lock().expect("registry lock").clone()
    }

    /// Calls issued through the trait, in order.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().expect("registry lock").clone()
    }

    pub fn source_of(&self, program_id: &str) -> Option<String> {
        self.programs
            .lock()
            .expect("registry lock")
            .get(program_id)
            .cloned()
    }

    fn tx(&self) -> TxId {
        let mut next = self.next_tx.lock().expect("registry lock");
        *next += 1;
        TxId(format!("at{:016x}", *next))
    }
}

#[async_trait]
impl ProgramRegistry for MemoryRegistry {
    async fn fetch_program(&self, program_id: &str) -> Result<String> {
        self.source_of(program_id)
            .ok_or_else(|| Error::ProgramNotFound(program_id.to_string()))
    }

    async fn deploy(&self, program_id: &str, source: &str) -> Result<TxId> {
        let mut programs = self.programs.lock().expect("registry lock");
        if programs.contains_key(program_id) {
            return Err(Error::Registry(format!(
                "program '{}' is already deployed",
                program_id
            )));
        }
        programs.insert(program_id.to_string(), source.to_string());
        drop(programs);
        self.deploys
            .lock()
            .expect("registry lock")
            .push(program_id.to_string());
        Ok(self.tx())
    }

    async fn call(&self, program_id: &str, function: &str, args: &[String]) -> Result<TxId> {
        if self.source_of(program_id).is_none() {
            return Err(Error::ProgramNotFound(program_id.to_string()));
        }
        self.calls.lock().expect("registry lock").push(RecordedCall {
            program_id: program_id.to_string(),
            function: function.to_string(),
            args: args.to_vec(),
        });
        Ok(self.tx())
    }
}
