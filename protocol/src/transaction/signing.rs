//! Transaction identity and input signing.
//!
//! The transaction hash is defined over the canonical encoding of the
//! transaction with *every input signature cleared to the empty byte
//! string*. That makes the hash independent of the signatures it
//! authorizes — the only way to sign a structure that must carry its own
//! signatures without the definition eating its own tail.
//!
//! We hash a cleared clone rather than mutating and restoring in place, so
//! the caller's transaction stays verifiable at every moment.

use crate::crypto::hash::{canonical, sha256};
use crate::crypto::keys::{StrataKeypair, StrataSignature};

use super::types::Transaction;

use crate::config::HASH_LENGTH;

/// Compute the transaction hash: SHA-256 over the canonical encoding with
/// all input signatures cleared.
///
/// Stable across repeated calls and entirely independent of whatever the
/// signature slots currently hold — signed, unsigned, or garbage.
pub fn hash_transaction(tx: &Transaction) -> [u8; HASH_LENGTH] {
    let mut cleared = tx.clone();
    for input in &mut cleared.inputs {
        input.signature = StrataSignature::empty();
    }
    sha256(&canonical(&cleared))
}

/// The transaction hash as a lowercase hex string — the form used as a
/// store and mempool key.
pub fn hash_transaction_hex(tx: &Transaction) -> String {
    hex::encode(hash_transaction(tx))
}

/// Sign a transaction on behalf of one input's owner.
///
/// Returns the signature over the (signature-cleared) transaction hash; the
/// caller assigns it to the appropriate input's signature slot. Kept as a
/// free function rather than a method because the keypair, not the
/// transaction, is the actor here.
pub fn sign_transaction(keypair: &StrataKeypair, tx: &Transaction) -> StrataSignature {
    keypair.sign(&hash_transaction(tx))
}
