//! # Store Abstractions
//!
//! Three key-value stores — blocks, transactions, UTXOs — behind capability
//! traits, so the in-memory reference implementations below and a future
//! disk-backed engine are drop-in interchangeable. Keys are hex strings
//! (or `"{hash}:{index}"` for UTXOs); values are the typed records.
//!
//! Put semantics are last-writer-wins. The chain never overwrites an
//! existing block hash in normal operation; if it ever does, SHA-256 has
//! collided and the store is the least of anyone's problems.
//!
//! Each memory store owns its own `parking_lot::RwLock` — reads vastly
//! outnumber writes on the validation path, and we want those reads cheap
//! and concurrent.

use parking_lot::RwLock;
use std::collections::HashMap;
use thiserror::Error;

use super::block::{hash_block_hex, Block};
use super::utxo::Utxo;
use crate::transaction::{hash_transaction_hex, Transaction};

/// Errors surfaced by store operations.
///
/// Memory stores only ever miss; the variants leave room for a disk
/// backend to report real I/O trouble without changing the traits.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested key has no entry.
    #[error("{kind} [{key}] is not found")]
    NotFound {
        /// What sort of record was asked for ("block", "transaction", "utxo").
        kind: &'static str,
        /// The key that missed.
        key: String,
    },

    /// A backend failure (disk, corruption) from a non-memory implementation.
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub(crate) fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            key: key.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Blocks, keyed by the hex block hash.
pub trait BlockStore: Send + Sync {
    /// Insert (or overwrite) a block under its own hash.
    fn put(&self, block: &Block) -> Result<(), StoreError>;
    /// Fetch a block by hex hash.
    fn get(&self, hash: &str) -> Result<Block, StoreError>;
}

/// Transactions, keyed by the hex transaction hash.
pub trait TxStore: Send + Sync {
    fn put(&self, tx: &Transaction) -> Result<(), StoreError>;
    fn get(&self, hash: &str) -> Result<Transaction, StoreError>;
}

/// UTXO records, keyed by `"{hex_tx_hash}:{out_index}"`.
pub trait UtxoStore: Send + Sync {
    fn put(&self, utxo: &Utxo) -> Result<(), StoreError>;
    fn get(&self, key: &str) -> Result<Utxo, StoreError>;
}

// ---------------------------------------------------------------------------
// In-memory reference implementations
// ---------------------------------------------------------------------------

/// The reference block store: a hash map under a reader-writer lock.
#[derive(Debug, Default)]
pub struct MemoryBlockStore {
    blocks: RwLock<HashMap<String, Block>>,
}

impl MemoryBlockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlockStore for MemoryBlockStore {
    fn put(&self, block: &Block) -> Result<(), StoreError> {
        let hash = hash_block_hex(block);
        self.blocks.write().insert(hash, block.clone());
        Ok(())
    }

    fn get(&self, hash: &str) -> Result<Block, StoreError> {
        self.blocks
            .read()
            .get(hash)
            .cloned()
            .ok_or_else(|| StoreError::not_found("block", hash))
    }
}

/// The reference transaction store.
#[derive(Debug, Default)]
pub struct MemoryTxStore {
    txs: RwLock<HashMap<String, Transaction>>,
}

impl MemoryTxStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TxStore for MemoryTxStore {
    fn put(&self, tx: &Transaction) -> Result<(), StoreError> {
        let hash = hash_transaction_hex(tx);
        self.txs.write().insert(hash, tx.clone());
        Ok(())
    }

    fn get(&self, hash: &str) -> Result<Transaction, StoreError> {
        self.txs
            .read()
            .get(hash)
            .cloned()
            .ok_or_else(|| StoreError::not_found("transaction", hash))
    }
}

/// The reference UTXO store.
#[derive(Debug, Default)]
pub struct MemoryUtxoStore {
    utxos: RwLock<HashMap<String, Utxo>>,
}

impl MemoryUtxoStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UtxoStore for MemoryUtxoStore {
    fn put(&self, utxo: &Utxo) -> Result<(), StoreError> {
        self.utxos.write().insert(utxo.key(), utxo.clone());
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Utxo, StoreError> {
        self.utxos
            .read()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::not_found("utxo", key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::block::genesis_block;
    use crate::storage::utxo::utxo_key;

    #[test]
    fn block_store_roundtrip() {
        let store = MemoryBlockStore::new();
        let block = genesis_block();
        store.put(&block).unwrap();

        let fetched = store.get(&hash_block_hex(&block)).unwrap();
        assert_eq!(fetched, block);
    }

    #[test]
    fn block_store_miss_reports_key() {
        let store = MemoryBlockStore::new();
        let missing = "00".repeat(32);
        let err = store.get(&missing).unwrap_err();
        assert_eq!(err.to_string(), format!("block [{missing}] is not found"));
    }

    #[test]
    fn tx_store_roundtrip() {
        let store = MemoryTxStore::new();
        let tx = genesis_block().transactions[0].clone();
        store.put(&tx).unwrap();

        let fetched = store.get(&hash_transaction_hex(&tx)).unwrap();
        assert_eq!(fetched, tx);
    }

    #[test]
    fn utxo_store_roundtrip_and_overwrite() {
        let store = MemoryUtxoStore::new();
        let mut utxo = Utxo::new("ff".repeat(32), 0, 1_000);
        store.put(&utxo).unwrap();

        // Last writer wins: marking the record spent replaces it in place.
        utxo.spent = true;
        store.put(&utxo).unwrap();

        let fetched = store.get(&utxo_key(&utxo.tx_hash, 0)).unwrap();
        assert!(fetched.spent);
        assert_eq!(fetched.amount, 1_000);
    }

    #[test]
    fn utxo_store_miss() {
        let store = MemoryUtxoStore::new();
        assert!(matches!(
            store.get("nope:0"),
            Err(StoreError::NotFound { kind: "utxo", .. })
        ));
    }
}
