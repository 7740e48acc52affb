//! The pending-transaction pool, with tombstones.
//!
//! Thread-safe set of transactions awaiting block inclusion. The part that
//! earns its keep is the second map: every transaction ever admitted keeps
//! a timestamped tombstone after it drains into a block, so a copy still
//! bouncing around the gossip fabric is recognized and dropped instead of
//! re-entering and being re-broadcast forever.
//!
//! One lock guards both maps. They change together on every admission, and
//! a lock per map would only buy the chance to observe them out of sync.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use crate::transaction::{hash_transaction_hex, Transaction};

#[derive(Debug, Default)]
struct MempoolInner {
    /// Transactions awaiting inclusion, keyed by hex hash.
    pending: HashMap<String, Transaction>,
    /// First-admission time of every transaction ever accepted, pending or
    /// already drained. This is the dedupe horizon.
    seen_at: HashMap<String, Instant>,
}

/// A concurrent-safe mempool with processed-transaction tombstones.
#[derive(Debug, Default)]
pub struct Mempool {
    inner: RwLock<MempoolInner>,
}

impl Mempool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admit a transaction.
    ///
    /// Returns `true` if this hash has never been seen — pending *or*
    /// drained — and was admitted; `false` for a duplicate, which is
    /// ignored entirely. The boolean is the gossip decision: only a
    /// first sighting is worth re-broadcasting.
    pub fn add(&self, tx: Transaction) -> bool {
        let hash = hash_transaction_hex(&tx);
        let mut inner = self.inner.write();
        if inner.seen_at.contains_key(&hash) {
            return false;
        }
        inner.seen_at.insert(hash.clone(), Instant::now());
        inner.pending.insert(hash, tx);
        true
    }

    /// `true` if this transaction has ever been admitted (pending or
    /// processed) and its tombstone has not yet expired.
    pub fn has(&self, tx: &Transaction) -> bool {
        let hash = hash_transaction_hex(tx);
        self.inner.read().seen_at.contains_key(&hash)
    }

    /// Number of transactions currently awaiting inclusion.
    pub fn size(&self) -> usize {
        self.inner.read().pending.len()
    }

    /// Atomically drain every pending transaction.
    ///
    /// The pending map is emptied; the tombstones are deliberately left in
    /// place so a drained transaction still arriving from peers does not
    /// re-enter after it has been embedded in a block.
    pub fn clear(&self) -> Vec<Transaction> {
        let mut inner = self.inner.write();
        inner.pending.drain().map(|(_, tx)| tx).collect()
    }

    /// Evict every entry older than `ttl` — tombstones and any still-pending
    /// transaction alike. Returns the evicted hashes.
    ///
    /// Without this, `seen_at` grows monotonically for the life of the
    /// process. The caller picks a `ttl` comfortably longer than a gossip
    /// round so nothing is forgotten while still in flight.
    pub fn clear_processed(&self, ttl: Duration) -> Vec<String> {
        let mut inner = self.inner.write();
        let now = Instant::now();

        let expired: Vec<String> = inner
            .seen_at
            .iter()
            .filter(|(_, admitted)| now.duration_since(**admitted) > ttl)
            .map(|(hash, _)| hash.clone())
            .collect();

        for hash in &expired {
            inner.seen_at.remove(hash);
            inner.pending.remove(hash);
        }

        expired
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::{StrataKeypair, StrataSignature};
    use crate::transaction::{TxInput, TxOutput};

    fn tx_with_amount(amount: i64) -> Transaction {
        let kp = StrataKeypair::generate();
        Transaction {
            version: 1,
            inputs: vec![TxInput {
                prev_tx_hash: [3u8; 32],
                prev_tx_out_index: 0,
                public_key: kp.public_key(),
                signature: StrataSignature::empty(),
            }],
            outputs: vec![TxOutput {
                amount,
                address: kp.address(),
            }],
        }
    }

    #[test]
    fn add_is_idempotent_per_hash() {
        let pool = Mempool::new();
        let tx = tx_with_amount(10);

        assert!(pool.add(tx.clone()));
        assert_eq!(pool.size(), 1);

        // Second admission of the same hash is a no-op.
        assert!(!pool.add(tx));
        assert_eq!(pool.size(), 1);
    }

    #[test]
    fn signature_changes_do_not_defeat_dedupe() {
        // The mempool key is the signature-cleared hash, so the same
        // transaction re-signed (or arriving unsigned) is still a duplicate.
        let pool = Mempool::new();
        let mut tx = tx_with_amount(10);
        assert!(pool.add(tx.clone()));

        tx.inputs[0].signature = StrataKeypair::generate().sign(b"different");
        assert!(!pool.add(tx));
    }

    #[test]
    fn clear_drains_pending_but_keeps_tombstones() {
        let pool = Mempool::new();
        let tx1 = tx_with_amount(1);
        let tx2 = tx_with_amount(2);
        pool.add(tx1.clone());
        pool.add(tx2.clone());

        let drained = pool.clear();
        assert_eq!(drained.len(), 2);
        assert_eq!(pool.size(), 0);

        // Still "seen": a drained transaction must not re-enter.
        assert!(pool.has(&tx1));
        assert!(pool.has(&tx2));
        assert!(!pool.add(tx1));
        assert_eq!(pool.size(), 0);
    }

    #[test]
    fn clear_processed_evicts_old_entries() {
        let pool = Mempool::new();
        let tx = tx_with_amount(5);
        pool.add(tx.clone());
        pool.clear();

        // A zero TTL makes everything "old".
        let evicted = pool.clear_processed(Duration::ZERO);
        assert_eq!(evicted.len(), 1);
        assert!(!pool.has(&tx));

        // The tombstone is gone, so the transaction may be admitted again.
        assert!(pool.add(tx));
    }

    #[test]
    fn clear_processed_keeps_fresh_entries() {
        let pool = Mempool::new();
        pool.add(tx_with_amount(5));

        let evicted = pool.clear_processed(Duration::from_secs(3600));
        assert!(evicted.is_empty());
        assert_eq!(pool.size(), 1);
    }

    #[test]
    fn clear_processed_also_drops_stale_pending() {
        // A transaction that sat pending past the TTL is evicted from both
        // maps, not just the tombstone table.
        let pool = Mempool::new();
        let tx = tx_with_amount(5);
        pool.add(tx.clone());

        let evicted = pool.clear_processed(Duration::ZERO);
        assert_eq!(evicted.len(), 1);
        assert_eq!(pool.size(), 0);
        assert!(!pool.has(&tx));
    }
}
