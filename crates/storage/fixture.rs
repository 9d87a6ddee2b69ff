//! JSON history fixtures for the in-memory backend.
//!
//! The dev binary loads one of these at startup so guests have something to
//! query; tests use them to build scenarios without hand-rolling index keys.

use serde::{Deserialize, Serialize};

use quarry_common::{Account, ActionTrace, BlockInfo, ContractIndex64, ContractRow};

use crate::InMemoryBackend;
use crate::error::StoreError;

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct HistoryFixture {
    #[serde(default)]
    pub blocks: Vec<BlockInfo>,
    #[serde(default)]
    pub irreversible: u32,
    #[serde(default)]
    pub action_traces: Vec<ActionTrace>,
    #[serde(default)]
    pub accounts: Vec<Account>,
    #[serde(default)]
    pub contract_rows: Vec<ContractRow>,
    #[serde(default)]
    pub contract_index64: Vec<ContractIndex64>,
}

impl HistoryFixture {
    /// Ingest the fixture into a backend. Blocks load first so the chain
    /// cursor is in place before any record rows.
    pub fn load_into(&self, backend: &InMemoryBackend) -> Result<(), StoreError> {
        for block in &self.blocks {
            backend.add_block(block.clone())?;
        }
        backend.set_irreversible(self.irreversible)?;
        for trace in &self.action_traces {
            backend.add_action_trace(trace.clone())?;
        }
        for account in &self.accounts {
            backend.add_account(account.clone())?;
        }
        for row in &self.contract_rows {
            backend.add_contract_row(row.clone())?;
        }
        for entry in &self.contract_index64 {
            backend.add_contract_index64(entry.clone())?;
        }
        Ok(())
    }
}
