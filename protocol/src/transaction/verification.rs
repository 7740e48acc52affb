//! Cryptographic verification of transaction input signatures.
//!
//! This is the stateless half of transaction validation: does every input
//! carry a signature by its claimed key over this transaction's hash? The
//! stateful half — do the referenced outputs exist, are they unspent, do
//! the sums balance — needs the UTXO ledger and lives in `storage::chain`.

use super::signing::hash_transaction;
use super::types::Transaction;

/// Verify every input signature of a transaction.
///
/// Each input must carry a 64-byte signature by `input.public_key` over the
/// transaction hash (computed with all signatures cleared, per the identity
/// rule). One bad input fails the whole transaction.
///
/// A transaction with no inputs verifies vacuously — whether a no-input
/// transaction can *spend* anything is the ledger's question, and the
/// ledger's answer is no.
pub fn verify_transaction(tx: &Transaction) -> bool {
    let hash = hash_transaction(tx);
    tx.inputs
        .iter()
        .all(|input| input.public_key.verify(&hash, &input.signature))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::keys::{StrataKeypair, StrataSignature};
    use crate::transaction::signing::sign_transaction;
    use crate::transaction::types::{TxInput, TxOutput};

    /// Two senders each contribute an input; the receiver and the first
    /// sender split the outputs. The shape of a real multi-party spend.
    fn two_party_tx(
        sender1: &StrataKeypair,
        sender2: &StrataKeypair,
        receiver: &StrataKeypair,
    ) -> Transaction {
        let mut tx = Transaction {
            version: 1,
            inputs: vec![
                TxInput {
                    prev_tx_hash: [1u8; 32],
                    prev_tx_out_index: 0,
                    public_key: sender1.public_key(),
                    signature: StrataSignature::empty(),
                },
                TxInput {
                    prev_tx_hash: [2u8; 32],
                    prev_tx_out_index: 1,
                    public_key: sender2.public_key(),
                    signature: StrataSignature::empty(),
                },
            ],
            outputs: vec![
                TxOutput {
                    amount: 9,
                    address: receiver.address(),
                },
                TxOutput {
                    amount: 1,
                    address: sender1.address(),
                },
            ],
        };

        let sig1 = sign_transaction(sender1, &tx);
        let sig2 = sign_transaction(sender2, &tx);
        tx.inputs[0].signature = sig1;
        tx.inputs[1].signature = sig2;
        tx
    }

    #[test]
    fn fully_signed_transaction_verifies() {
        let s1 = StrataKeypair::generate();
        let s2 = StrataKeypair::generate();
        let r = StrataKeypair::generate();
        assert!(verify_transaction(&two_party_tx(&s1, &s2, &r)));
    }

    #[test]
    fn unsigned_input_fails() {
        let s1 = StrataKeypair::generate();
        let s2 = StrataKeypair::generate();
        let r = StrataKeypair::generate();
        let mut tx = two_party_tx(&s1, &s2, &r);
        tx.inputs[1].signature = StrataSignature::empty();
        assert!(!verify_transaction(&tx));
    }

    #[test]
    fn signature_by_wrong_key_fails() {
        let s1 = StrataKeypair::generate();
        let s2 = StrataKeypair::generate();
        let r = StrataKeypair::generate();
        let mut tx = two_party_tx(&s1, &s2, &r);
        // Sender 2's slot signed by sender 1's key.
        tx.inputs[1].signature = sign_transaction(&s1, &tx);
        assert!(!verify_transaction(&tx));
    }

    #[test]
    fn tampered_output_fails() {
        let s1 = StrataKeypair::generate();
        let s2 = StrataKeypair::generate();
        let r = StrataKeypair::generate();
        let mut tx = two_party_tx(&s1, &s2, &r);
        tx.outputs[0].amount = 9_000_000;
        assert!(!verify_transaction(&tx));
    }

    #[test]
    fn no_input_transaction_verifies_vacuously() {
        let r = StrataKeypair::generate();
        let tx = Transaction {
            version: 1,
            inputs: vec![],
            outputs: vec![TxOutput {
                amount: 5,
                address: r.address(),
            }],
        };
        assert!(verify_transaction(&tx));
    }
}
