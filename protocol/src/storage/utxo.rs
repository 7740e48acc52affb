//! The unspent transaction output record.
//!
//! A [`Utxo`] is one output of one accepted transaction, tracked from the
//! moment its block lands until (and after) some later input consumes it.
//! The set of unspent records *is* the ledger state — balances are just a
//! scan someone hasn't written yet.

use serde::{Deserialize, Serialize};

/// One spendable (or spent) output, as tracked by the UTXO store.
///
/// Kept under the key produced by [`utxo_key`], so an input's
/// `(prev_tx_hash, prev_tx_out_index)` pair maps straight to a lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utxo {
    /// Hex-encoded hash of the transaction that created this output.
    pub tx_hash: String,
    /// Index of the output within that transaction.
    pub out_index: u32,
    /// Amount carried by the output.
    pub amount: i64,
    /// Whether a later accepted transaction has consumed this output.
    /// Spent records stay in the store as tombstones; `spent == true`
    /// means "gone", not "going".
    pub spent: bool,
}

impl Utxo {
    /// A freshly minted, unspent output record.
    pub fn new(tx_hash: String, out_index: u32, amount: i64) -> Self {
        Self {
            tx_hash,
            out_index,
            amount,
            spent: false,
        }
    }

    /// The store key for this record.
    pub fn key(&self) -> String {
        utxo_key(&self.tx_hash, self.out_index)
    }
}

/// The UTXO store key: `"{hex_tx_hash}:{out_index}"`.
pub fn utxo_key(tx_hash: &str, out_index: u32) -> String {
    format!("{tx_hash}:{out_index}")
}
