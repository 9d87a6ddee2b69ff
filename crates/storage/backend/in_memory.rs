//! In-memory history backend for tests and the dev binary.
//!
//! Not a production store: everything lives in `BTreeMap`s behind one mutex.
//! A read view is a live handle: every point read and every range scan is
//! individually consistent (taken under the lock), while the captured fill
//! status can go stale when ingestion advances. That is the contract fork
//! detection relies on; whole-request consistency comes from the driver's
//! retry loop, not from the view.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use quarry_common::keys::KeyField;
use quarry_common::{
    Account, ActionTrace, BlockInfo, Checksum256, ContractIndex64, ContractRow, DatabaseStatus,
};
use quarry_wire::WireEncode;

use crate::api::{StorageBackend, StorageReadView, tables};
use crate::error::StoreError;

#[derive(Debug, Default, Clone)]
pub struct InMemoryBackend(Arc<Mutex<Inner>>);

#[derive(Debug, Default, Clone)]
struct Inner {
    tables: HashMap<&'static str, BTreeMap<Vec<u8>, Vec<u8>>>,
    blocks: BTreeMap<u32, Checksum256>,
    irreversible: u32,
}

impl Inner {
    fn status(&self) -> DatabaseStatus {
        let (head, head_id) = match self.blocks.last_key_value() {
            Some((&num, &id)) => (num, id),
            None => (0, Checksum256::ZERO),
        };
        let first = self.blocks.first_key_value().map(|(&num, _)| num).unwrap_or(0);
        let irreversible = self.irreversible.min(head);
        let irreversible_id = self.blocks.get(&irreversible).copied().unwrap_or_default();
        DatabaseStatus {
            head,
            head_id,
            irreversible,
            irreversible_id,
            first,
        }
    }

    fn put(&mut self, table: &'static str, key: Vec<u8>, value: Vec<u8>) {
        self.tables.entry(table).or_default().insert(key, value);
    }
}

fn action_trace_key(trace: &ActionTrace) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + 8 + 8 + 4 + 32 + 4);
    trace.name.push_key_bytes(&mut key);
    trace.receipt_receiver.push_key_bytes(&mut key);
    trace.account.push_key_bytes(&mut key);
    trace.block_index.push_key_bytes(&mut key);
    trace.transaction_id.push_key_bytes(&mut key);
    trace.action_index.push_key_bytes(&mut key);
    key
}

fn account_key(account: &Account) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + 4);
    account.name.push_key_bytes(&mut key);
    account.block_index.push_key_bytes(&mut key);
    key
}

fn contract_row_keys(row: &ContractRow) -> [(&'static str, Vec<u8>); 3] {
    let mut ctps = Vec::with_capacity(8 + 8 + 8 + 8 + 4);
    row.code.push_key_bytes(&mut ctps);
    row.table.push_key_bytes(&mut ctps);
    row.primary_key.push_key_bytes(&mut ctps);
    row.scope.push_key_bytes(&mut ctps);
    row.block_index.push_key_bytes(&mut ctps);

    let mut ctsp = Vec::with_capacity(8 + 8 + 8 + 8 + 4);
    row.code.push_key_bytes(&mut ctsp);
    row.table.push_key_bytes(&mut ctsp);
    row.scope.push_key_bytes(&mut ctsp);
    row.primary_key.push_key_bytes(&mut ctsp);
    row.block_index.push_key_bytes(&mut ctsp);

    let mut stpc = Vec::with_capacity(8 + 8 + 8 + 8 + 4);
    row.scope.push_key_bytes(&mut stpc);
    row.table.push_key_bytes(&mut stpc);
    row.primary_key.push_key_bytes(&mut stpc);
    row.code.push_key_bytes(&mut stpc);
    row.block_index.push_key_bytes(&mut stpc);

    [
        (tables::CONTRACT_ROWS_CTPS, ctps),
        (tables::CONTRACT_ROWS_CTSP, ctsp),
        (tables::CONTRACT_ROWS_STPC, stpc),
    ]
}

fn contract_index64_key(entry: &ContractIndex64) -> Vec<u8> {
    let mut key = Vec::with_capacity(8 + 8 + 8 + 8 + 8 + 4);
    entry.code.push_key_bytes(&mut key);
    entry.table.push_key_bytes(&mut key);
    entry.scope.push_key_bytes(&mut key);
    entry.secondary_key.push_key_bytes(&mut key);
    entry.primary_key.push_key_bytes(&mut key);
    entry.block_index.push_key_bytes(&mut key);
    key
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.0.lock().map_err(|_| StoreError::Lock)
    }

    /// Append a block summary. A block at an existing height replaces it and
    /// truncates the chain above it (fork ingestion); already-ingested record
    /// rows above the fork point are the fill process's responsibility.
    pub fn add_block(&self, info: BlockInfo) -> Result<(), StoreError> {
        let mut inner = self.inner()?;
        let num = info.block_num;
        inner.blocks.split_off(&num);
        if let Some(table) = inner.tables.get_mut(tables::BLOCK_INFO) {
            table.split_off(&num.to_be_bytes().to_vec());
        }
        inner.blocks.insert(num, info.block_id);
        inner.put(
            tables::BLOCK_INFO,
            num.to_be_bytes().to_vec(),
            info.encode_to_vec(),
        );
        Ok(())
    }

    pub fn set_irreversible(&self, block_num: u32) -> Result<(), StoreError> {
        self.inner()?.irreversible = block_num;
        Ok(())
    }

    pub fn add_action_trace(&self, trace: ActionTrace) -> Result<(), StoreError> {
        let key = action_trace_key(&trace);
        self.inner()?
            .put(tables::ACTION_TRACES, key, trace.encode_to_vec());
        Ok(())
    }

    pub fn add_account(&self, account: Account) -> Result<(), StoreError> {
        let key = account_key(&account);
        self.inner()?
            .put(tables::ACCOUNTS, key, account.encode_to_vec());
        Ok(())
    }

    pub fn add_contract_row(&self, row: ContractRow) -> Result<(), StoreError> {
        let value = row.encode_to_vec();
        let mut inner = self.inner()?;
        for (table, key) in contract_row_keys(&row) {
            inner.put(table, key, value.clone());
        }
        Ok(())
    }

    pub fn add_contract_index64(&self, entry: ContractIndex64) -> Result<(), StoreError> {
        let key = contract_index64_key(&entry);
        self.inner()?
            .put(tables::CONTRACT_INDEX64, key, entry.encode_to_vec());
        Ok(())
    }
}

impl StorageBackend for InMemoryBackend {
    fn read_view(&self) -> Result<Arc<dyn StorageReadView>, StoreError> {
        Ok(Arc::new(LiveView {
            inner: Arc::clone(&self.0),
        }))
    }
}

/// A live read handle; each operation locks the backend once.
struct LiveView {
    inner: Arc<Mutex<Inner>>,
}

impl LiveView {
    fn locked(&self) -> MutexGuard<'_, Inner> {
        // Recover from poisoning: readers only observe, they cannot see a
        // half-applied write because writers mutate under the same lock.
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StorageReadView for LiveView {
    fn status(&self) -> DatabaseStatus {
        self.locked().status()
    }

    fn block_id(&self, block_num: u32) -> Option<Checksum256> {
        self.locked().blocks.get(&block_num).copied()
    }

    fn range<'a>(
        &'a self,
        table: &str,
        first: &[u8],
        last: &[u8],
    ) -> Box<dyn Iterator<Item = (Vec<u8>, Vec<u8>)> + 'a> {
        if first > last {
            return Box::new(std::iter::empty());
        }
        let inner = self.locked();
        let rows: Vec<(Vec<u8>, Vec<u8>)> = match inner.tables.get(table) {
            Some(map) => map
                .range::<[u8], _>((
                    std::ops::Bound::Included(first),
                    std::ops::Bound::Included(last),
                ))
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            None => Vec::new(),
        };
        Box::new(rows.into_iter())
    }
}
