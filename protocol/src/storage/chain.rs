//! # The Chain
//!
//! The append-only ledger: an ordered header sequence plus the three
//! backing stores, with every rule that decides whether a block may extend
//! the chain.
//!
//! ## Validation before mutation
//!
//! `add_block` is all-or-nothing: the block is fully validated against the
//! current state, and only then applied. A rejected block leaves the
//! headers, the stores, and the UTXO set exactly as they were — there is
//! no partial application to roll back because there is no partial
//! application.
//!
//! ## UTXO accounting
//!
//! Applying a block does three things per transaction: persists it, marks
//! every input's referenced UTXO spent, and mints one fresh UTXO per
//! output. The spent records stay behind as tombstones, which keeps a
//! replayed input an *observable* error instead of a mystery.
//!
//! ## Linearization
//!
//! `add_block` holds the header-vector write lock across validation and
//! application, so concurrent submissions are serialized. Two blocks racing
//! for the same height cannot both see the old tip — the loser validates
//! against the winner's tip and is rejected on its `prev_hash`.

use parking_lot::RwLock;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

use crate::storage::block::{
    genesis_block, hash_header, verify_block, Block, BlockHeader,
};
use crate::storage::store::{
    BlockStore, MemoryBlockStore, MemoryTxStore, MemoryUtxoStore, StoreError, TxStore, UtxoStore,
};
use crate::storage::utxo::{utxo_key, Utxo};
use crate::transaction::{hash_transaction_hex, verify_transaction, Transaction, TxInput};

/// Errors raised while validating or extending the chain.
#[derive(Debug, Error)]
pub enum ChainError {
    /// The block itself is unacceptable: bad signature, wrong Merkle root,
    /// broken predecessor link, or a malformed height.
    #[error("invalid block: {0}")]
    InvalidBlock(String),

    /// A contained (or candidate) transaction is unacceptable: bad input
    /// signature, unknown or spent UTXO, wrong owner, negative output, or
    /// insufficient funds.
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    /// A store-level failure surfaced through the chain.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The ledger: header sequence + block/tx/UTXO stores.
///
/// Cheap to share (`Arc<Chain>`); all methods take `&self` and synchronize
/// internally.
pub struct Chain {
    block_store: Arc<dyn BlockStore>,
    tx_store: Arc<dyn TxStore>,
    utxo_store: Arc<dyn UtxoStore>,
    /// `headers[i]` is the header at height `i`. Guarded by the lock that
    /// also serializes `add_block`.
    headers: RwLock<Vec<BlockHeader>>,
}

impl Chain {
    /// Build a chain over the given stores and insert the genesis block.
    ///
    /// Genesis bypasses validation — it has no predecessor to link to and
    /// its no-input transaction mints the initial supply, which no later
    /// block is allowed to do.
    pub fn new(
        block_store: Arc<dyn BlockStore>,
        tx_store: Arc<dyn TxStore>,
        utxo_store: Arc<dyn UtxoStore>,
    ) -> Result<Self, ChainError> {
        let chain = Self {
            block_store,
            tx_store,
            utxo_store,
            headers: RwLock::new(Vec::new()),
        };

        let genesis = genesis_block();
        {
            let mut headers = chain.headers.write();
            chain.apply_block(&mut headers, &genesis)?;
        }
        Ok(chain)
    }

    /// Build a chain over fresh in-memory stores — the reference setup.
    pub fn in_memory() -> Result<Self, ChainError> {
        Self::new(
            Arc::new(MemoryBlockStore::new()),
            Arc::new(MemoryTxStore::new()),
            Arc::new(MemoryUtxoStore::new()),
        )
    }

    /// Current chain height. Genesis alone is height 0.
    pub fn height(&self) -> u32 {
        // The chain always holds at least the genesis header.
        (self.headers.read().len() - 1) as u32
    }

    /// Hash of the current tip header — what the next block must link to.
    pub fn tip_hash(&self) -> [u8; 32] {
        let headers = self.headers.read();
        let tip = headers
            .last()
            .expect("the chain always holds the genesis header");
        hash_header(tip)
    }

    /// Validate a block against the current tip and, on success, apply it.
    ///
    /// On any error the chain is left untouched.
    pub fn add_block(&self, block: &Block) -> Result<(), ChainError> {
        let mut headers = self.headers.write();
        self.validate_block(&headers, block)?;
        self.apply_block(&mut headers, block)
    }

    /// `true` if a block with this hex hash has been accepted.
    pub fn has_block(&self, hash_hex: &str) -> bool {
        self.block_store.get(hash_hex).is_ok()
    }

    /// Fetch a block by height.
    ///
    /// Heights above the tip miss with a not-found error, same as an
    /// unknown hash would.
    pub fn get_block_by_height(&self, height: u32) -> Result<Block, ChainError> {
        let hash = {
            let headers = self.headers.read();
            let header = headers.get(height as usize).ok_or_else(|| {
                StoreError::not_found("block at height", height.to_string())
            })?;
            hex::encode(hash_header(header))
        };
        Ok(self.block_store.get(&hash)?)
    }

    /// Fetch a block by its raw hash.
    pub fn get_block_by_hash(&self, hash: &[u8; 32]) -> Result<Block, ChainError> {
        Ok(self.block_store.get(&hex::encode(hash))?)
    }

    // -- Validation ---------------------------------------------------------

    /// Full admission check for a candidate block.
    fn validate_block(&self, headers: &[BlockHeader], block: &Block) -> Result<(), ChainError> {
        if !verify_block(block) {
            return Err(ChainError::InvalidBlock(
                "signature or merkle root does not verify".to_string(),
            ));
        }

        let tip = headers
            .last()
            .ok_or_else(|| ChainError::InvalidBlock("the chain has no tip".to_string()))?;
        let expected_prev = hash_header(tip);
        if block.header.prev_hash != expected_prev {
            return Err(ChainError::InvalidBlock(format!(
                "previous hash mismatch: expected {}, got {}",
                hex::encode(expected_prev),
                hex::encode(block.header.prev_hash),
            )));
        }

        let expected_height = headers.len() as u32;
        if block.header.height != expected_height {
            return Err(ChainError::InvalidBlock(format!(
                "height mismatch: expected {expected_height}, got {}",
                block.header.height,
            )));
        }

        // Per-transaction checks, plus two whole-block rules the per-tx view
        // cannot see: no UTXO consumed twice within the block, and no
        // transaction included twice (which would also defeat the Merkle
        // duplicate-last-leaf convention).
        let mut seen_txs = HashSet::new();
        let mut consumed = HashSet::new();
        for tx in &block.transactions {
            let tx_hash = hash_transaction_hex(tx);
            if !seen_txs.insert(tx_hash.clone()) {
                return Err(ChainError::InvalidBlock(format!(
                    "transaction [{tx_hash}] appears twice in the block",
                )));
            }
            self.validate_transaction(tx)?;
            for input in &tx.inputs {
                let key = input_utxo_key(input);
                if !consumed.insert(key.clone()) {
                    return Err(ChainError::InvalidBlock(format!(
                        "utxo [{key}] is consumed twice within the block",
                    )));
                }
            }
        }

        Ok(())
    }

    /// Admission check for a single transaction against the current UTXO
    /// set. Used both inside block validation and by the block producer to
    /// pre-filter mempool drains.
    pub fn validate_transaction(&self, tx: &Transaction) -> Result<(), ChainError> {
        if !verify_transaction(tx) {
            return Err(ChainError::InvalidTransaction(
                "an input signature does not verify".to_string(),
            ));
        }

        let mut sum_inputs: i64 = 0;
        for input in &tx.inputs {
            let key = input_utxo_key(input);
            let utxo = self.utxo_store.get(&key).map_err(|_| {
                ChainError::InvalidTransaction(format!("referenced utxo [{key}] does not exist"))
            })?;
            if utxo.spent {
                return Err(ChainError::InvalidTransaction(format!(
                    "utxo [{key}] is already spent",
                )));
            }
            self.check_input_ownership(input, &key)?;
            sum_inputs = sum_inputs.saturating_add(utxo.amount);
        }

        for output in &tx.outputs {
            if output.amount < 0 {
                return Err(ChainError::InvalidTransaction(format!(
                    "negative output amount {}",
                    output.amount,
                )));
            }
        }

        let sum_outputs = tx.total_output();
        if sum_inputs < sum_outputs {
            return Err(ChainError::InvalidTransaction(format!(
                "insufficient funds: inputs {sum_inputs} < outputs {sum_outputs}",
            )));
        }

        Ok(())
    }

    /// Outputs are locked by raw address equality: the spender's public key
    /// must truncate to the address the referenced output pays.
    fn check_input_ownership(&self, input: &TxInput, key: &str) -> Result<(), ChainError> {
        let prev_tx_hash = hex::encode(input.prev_tx_hash);
        let prev_tx = self.tx_store.get(&prev_tx_hash).map_err(|_| {
            ChainError::InvalidTransaction(format!(
                "transaction [{prev_tx_hash}] referenced by utxo [{key}] is not known",
            ))
        })?;
        let output = prev_tx
            .outputs
            .get(input.prev_tx_out_index as usize)
            .ok_or_else(|| {
                ChainError::InvalidTransaction(format!(
                    "transaction [{prev_tx_hash}] has no output {}",
                    input.prev_tx_out_index,
                ))
            })?;
        if input.public_key.address() != output.address {
            return Err(ChainError::InvalidTransaction(format!(
                "utxo [{key}] is not owned by the presented key",
            )));
        }
        Ok(())
    }

    // -- Application --------------------------------------------------------

    /// Apply an already-validated (or genesis) block: extend the header
    /// sequence, persist transactions, retire consumed UTXOs, mint created
    /// ones, and persist the block itself.
    fn apply_block(
        &self,
        headers: &mut Vec<BlockHeader>,
        block: &Block,
    ) -> Result<(), ChainError> {
        headers.push(block.header.clone());

        for tx in &block.transactions {
            self.tx_store.put(tx)?;

            for input in &tx.inputs {
                let key = input_utxo_key(input);
                let mut utxo = self.utxo_store.get(&key)?;
                utxo.spent = true;
                self.utxo_store.put(&utxo)?;
            }

            let tx_hash = hash_transaction_hex(tx);
            for (out_index, output) in tx.outputs.iter().enumerate() {
                let utxo = Utxo::new(tx_hash.clone(), out_index as u32, output.amount);
                self.utxo_store.put(&utxo)?;
            }
        }

        self.block_store.put(block)?;
        Ok(())
    }
}

/// The UTXO key an input points at.
fn input_utxo_key(input: &TxInput) -> String {
    utxo_key(&hex::encode(input.prev_tx_hash), input.prev_tx_out_index)
}
