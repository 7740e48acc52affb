//! # Block Production Pipeline
//!
//! The `BlockProducer` turns "a mempool full of maybes" into "a signed
//! block the chain accepted". It runs on the validator's tick and owns no
//! networking — the node drives the tick and broadcasts whatever comes out,
//! which keeps the producer testable without spinning up a single socket.
//!
//! ## Pipeline Stages
//!
//! ```text
//! 1. DRAIN   — Take every pending transaction; expire old tombstones
//! 2. FILTER  — Re-validate each against the chain; drop losers
//! 3. BUILD   — Assemble the block on the current tip
//! 4. SIGN    — Merkle root in, header hashed, one signature on
//! 5. ACCEPT  — chain.add_block; the chain re-checks everything
//! ```
//!
//! Invalid transactions are logged and dropped, not returned to the pool —
//! their tombstones keep them from sneaking back in via gossip. A tick
//! with nothing valid to include produces nothing: an empty block commits
//! to nothing and the chain would refuse it anyway.

use std::collections::HashSet;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::{BLOCK_VERSION, PROCESSED_TX_TTL};
use crate::crypto::keys::{StrataKeypair, StrataSignature};
use crate::storage::block::{hash_block_hex, sign_block, unix_nanos, Block, BlockHeader};
use crate::storage::chain::{Chain, ChainError};
use crate::storage::utxo::utxo_key;
use crate::transaction::{hash_transaction_hex, Transaction};

use super::mempool::Mempool;

/// Assembles, signs, and submits blocks from mempool drains.
pub struct BlockProducer {
    chain: Arc<Chain>,
    mempool: Arc<Mempool>,
    keypair: StrataKeypair,
}

impl BlockProducer {
    /// Wire a producer to the chain and mempool it will draw from.
    pub fn new(chain: Arc<Chain>, mempool: Arc<Mempool>, keypair: StrataKeypair) -> Self {
        Self {
            chain,
            mempool,
            keypair,
        }
    }

    /// One validator tick.
    ///
    /// Drains the mempool, expires old tombstones, filters the drain down
    /// to transactions the chain will accept together, and — if anything
    /// survives — builds and signs the next block and appends it to the
    /// chain. Returns the accepted block so the caller can gossip it, or
    /// `None` when there was nothing worth minting.
    pub fn produce_tick(&self) -> Result<Option<Block>, ChainError> {
        let drained = self.mempool.clear();
        let expired = self.mempool.clear_processed(PROCESSED_TX_TTL);
        if !expired.is_empty() {
            debug!(count = expired.len(), "evicted expired mempool tombstones");
        }

        info!(pending = drained.len(), "block production tick");

        let transactions = self.filter_candidates(drained);
        if transactions.is_empty() {
            debug!("no valid transactions pending, skipping block production");
            return Ok(None);
        }

        let mut block = Block {
            header: BlockHeader {
                version: BLOCK_VERSION,
                height: self.chain.height() + 1,
                prev_hash: self.chain.tip_hash(),
                root_hash: [0u8; 32],
                timestamp: unix_nanos(),
            },
            transactions,
            public_key: self.keypair.public_key(),
            signature: StrataSignature::empty(),
        };
        sign_block(&self.keypair, &mut block)
            .map_err(|e| ChainError::InvalidBlock(e.to_string()))?;

        self.chain.add_block(&block)?;

        info!(
            height = block.header.height,
            txs = block.transactions.len(),
            hash = %hash_block_hex(&block),
            "produced block"
        );
        Ok(Some(block))
    }

    /// Keep only transactions the chain will accept as a set: individually
    /// valid, and no two consuming the same UTXO. The chain's own
    /// per-transaction checks can't see a conflict between two candidates
    /// that are each fine alone — that conflict is decided here, first
    /// drained wins.
    fn filter_candidates(&self, drained: Vec<Transaction>) -> Vec<Transaction> {
        let mut consumed: HashSet<String> = HashSet::new();
        let mut kept = Vec::with_capacity(drained.len());

        'next_tx: for tx in drained {
            if let Err(e) = self.chain.validate_transaction(&tx) {
                warn!(
                    tx = %hash_transaction_hex(&tx),
                    error = %e,
                    "dropping invalid transaction from block candidate set"
                );
                continue;
            }

            let keys: Vec<String> = tx
                .inputs
                .iter()
                .map(|input| utxo_key(&hex::encode(input.prev_tx_hash), input.prev_tx_out_index))
                .collect();
            for key in &keys {
                if consumed.contains(key) {
                    warn!(
                        tx = %hash_transaction_hex(&tx),
                        utxo = %key,
                        "dropping transaction conflicting with an earlier candidate"
                    );
                    continue 'next_tx;
                }
            }

            consumed.extend(keys);
            kept.push(tx);
        }

        kept
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GENESIS_AMOUNT, TX_VERSION};
    use crate::storage::block::{founder_keypair, genesis_block};
    use crate::transaction::{hash_transaction, sign_transaction, TxInput, TxOutput};

    fn setup() -> (Arc<Chain>, Arc<Mempool>, BlockProducer) {
        let chain = Arc::new(Chain::in_memory().unwrap());
        let mempool = Arc::new(Mempool::new());
        let producer = BlockProducer::new(
            Arc::clone(&chain),
            Arc::clone(&mempool),
            StrataKeypair::generate(),
        );
        (chain, mempool, producer)
    }

    fn genesis_spend(amount: i64) -> Transaction {
        let founder = founder_keypair();
        let genesis_tx_hash = hash_transaction(&genesis_block().transactions[0]);
        let mut tx = Transaction {
            version: TX_VERSION,
            inputs: vec![TxInput {
                prev_tx_hash: genesis_tx_hash,
                prev_tx_out_index: 0,
                public_key: founder.public_key(),
                signature: StrataSignature::empty(),
            }],
            outputs: vec![TxOutput {
                amount,
                address: founder.address(),
            }],
        };
        let sig = sign_transaction(&founder, &tx);
        tx.inputs[0].signature = sig;
        tx
    }

    #[test]
    fn empty_mempool_produces_nothing() {
        let (chain, _mempool, producer) = setup();
        assert!(producer.produce_tick().unwrap().is_none());
        assert_eq!(chain.height(), 0);
    }

    #[test]
    fn valid_transaction_is_minted_into_a_block() {
        let (chain, mempool, producer) = setup();
        let tx = genesis_spend(GENESIS_AMOUNT);
        mempool.add(tx.clone());

        let block = producer.produce_tick().unwrap().expect("a block");
        assert_eq!(block.header.height, 1);
        assert_eq!(block.transactions, vec![tx.clone()]);
        assert_eq!(chain.height(), 1);

        // The mempool drained, but the tombstone keeps the tx out.
        assert_eq!(mempool.size(), 0);
        assert!(mempool.has(&tx));
        assert!(!mempool.add(tx));
    }

    #[test]
    fn invalid_transactions_are_dropped_not_minted() {
        let (chain, mempool, producer) = setup();
        // Overdraws the genesis output.
        mempool.add(genesis_spend(GENESIS_AMOUNT + 1));

        assert!(producer.produce_tick().unwrap().is_none());
        assert_eq!(chain.height(), 0);
        assert_eq!(mempool.size(), 0);
    }

    #[test]
    fn conflicting_candidates_yield_one_winner() {
        let (chain, mempool, producer) = setup();
        // Two different spends of the same genesis output.
        mempool.add(genesis_spend(GENESIS_AMOUNT));
        mempool.add(genesis_spend(GENESIS_AMOUNT - 1));

        let block = producer.produce_tick().unwrap().expect("a block");
        assert_eq!(block.transactions.len(), 1);
        assert_eq!(chain.height(), 1);
    }

    #[test]
    fn successive_ticks_extend_the_chain() {
        let (chain, mempool, producer) = setup();
        mempool.add(genesis_spend(GENESIS_AMOUNT));
        let first = producer.produce_tick().unwrap().expect("first block");

        // Spend the output minted in the first block.
        let founder = founder_keypair();
        let prev_hash = hash_transaction(&first.transactions[0]);
        let mut tx = Transaction {
            version: TX_VERSION,
            inputs: vec![TxInput {
                prev_tx_hash: prev_hash,
                prev_tx_out_index: 0,
                public_key: founder.public_key(),
                signature: StrataSignature::empty(),
            }],
            outputs: vec![TxOutput {
                amount: GENESIS_AMOUNT,
                address: founder.address(),
            }],
        };
        let sig = sign_transaction(&founder, &tx);
        tx.inputs[0].signature = sig;
        mempool.add(tx);

        let second = producer.produce_tick().unwrap().expect("second block");
        assert_eq!(second.header.height, 2);
        assert_eq!(chain.height(), 2);
    }
}
