//! Core type definitions for Strata transactions.
//!
//! These types form the vocabulary of every value transfer on the network.
//! They are plain data — behavior (hashing, signing, verification) lives in
//! the sibling modules, and ledger rules live in `storage::chain`.

use serde::{Deserialize, Serialize};

use crate::config::HASH_LENGTH;
use crate::crypto::keys::{Address, StrataPublicKey, StrataSignature};

// ---------------------------------------------------------------------------
// TxInput
// ---------------------------------------------------------------------------

/// A reference to a previously created output, plus the proof of the right
/// to spend it.
///
/// The `(prev_tx_hash, prev_tx_out_index)` pair names exactly one UTXO. The
/// public key must hash (well, truncate) to the address that output is
/// locked to, and the signature must verify over the transaction hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    /// Hash of the transaction that created the output being spent.
    pub prev_tx_hash: [u8; HASH_LENGTH],
    /// Index of that output within its transaction.
    pub prev_tx_out_index: u32,
    /// Public key of the spender.
    pub public_key: StrataPublicKey,
    /// Signature over the transaction hash. Empty until signing, and
    /// treated as empty again whenever the transaction hash is computed.
    pub signature: StrataSignature,
}

// ---------------------------------------------------------------------------
// TxOutput
// ---------------------------------------------------------------------------

/// Newly created value, locked to an address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    /// Amount carried by this output. Signed so that a negative value is a
    /// representable, rejectable error instead of a silent wrap; the chain
    /// refuses anything below zero.
    pub amount: i64,
    /// The address this output is locked to.
    pub address: Address,
}

// ---------------------------------------------------------------------------
// Transaction
// ---------------------------------------------------------------------------

/// A UTXO transaction: ordered inputs consumed, ordered outputs created.
///
/// Identity is `SHA-256(canonical(tx with all input signatures cleared))` —
/// see [`hash_transaction`](super::signing::hash_transaction). There is no
/// cached `id` field; the hash is cheap and a stored copy is one more thing
/// to keep consistent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction format version.
    pub version: u32,
    /// Outputs being consumed, with spend authorization.
    pub inputs: Vec<TxInput>,
    /// Outputs being created.
    pub outputs: Vec<TxOutput>,
}

impl Transaction {
    /// Sum of all output amounts.
    ///
    /// Saturating: the theoretical ceiling (every output at `i64::MAX`) can
    /// only arise from a transaction the chain would reject anyway, and a
    /// validator must not panic while deciding to reject it.
    pub fn total_output(&self) -> i64 {
        self.outputs
            .iter()
            .fold(0i64, |acc, out| acc.saturating_add(out.amount))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::StrataKeypair;

    #[test]
    fn total_output_sums_amounts() {
        let addr = StrataKeypair::generate().address();
        let tx = Transaction {
            version: 1,
            inputs: vec![],
            outputs: vec![
                TxOutput { amount: 9, address: addr },
                TxOutput { amount: 1, address: addr },
            ],
        };
        assert_eq!(tx.total_output(), 10);
    }

    #[test]
    fn total_output_saturates() {
        let addr = StrataKeypair::generate().address();
        let tx = Transaction {
            version: 1,
            inputs: vec![],
            outputs: vec![
                TxOutput { amount: i64::MAX, address: addr },
                TxOutput { amount: i64::MAX, address: addr },
            ],
        };
        assert_eq!(tx.total_output(), i64::MAX);
    }
}
