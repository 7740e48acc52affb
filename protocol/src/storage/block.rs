//! # Block Structure
//!
//! A block is the atomic unit of ledger growth in Strata. Each block
//! carries an ordered list of transactions, a link to its predecessor, and
//! the producer's signature.
//!
//! ## Block Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │  BlockHeader                                │
//! │  ├── version: u32                           │
//! │  ├── height: u32                            │
//! │  ├── prev_hash: [u8; 32]                    │
//! │  ├── root_hash: [u8; 32]  (Merkle root)     │
//! │  └── timestamp: i64       (unix nanos)      │
//! ├─────────────────────────────────────────────┤
//! │  transactions: Vec<Transaction>             │
//! │  public_key: producer's key                 │
//! │  signature: over the block hash             │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Hash Computation
//!
//! The block hash is `SHA-256(canonical(header))` — the header and nothing
//! but the header. Because the header embeds the Merkle root of the
//! transaction hashes, the block hash still commits to every transaction;
//! the producer key and signature stay outside the hash (the signature
//! signs the hash, not the other way around).

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

use crate::config::{
    BLOCK_VERSION, GENESIS_AMOUNT, GENESIS_SEED, GENESIS_TIMESTAMP, HASH_LENGTH, TX_VERSION,
};
use crate::crypto::hash::{canonical, merkle_root, sha256};
use crate::crypto::keys::{StrataKeypair, StrataPublicKey, StrataSignature};
use crate::transaction::{hash_transaction, Transaction, TxOutput};

/// A block that violates the structural rules of block construction.
#[derive(Debug, Error)]
pub enum BlockError {
    /// Every non-genesis block carries at least one transaction; a block
    /// with none has no Merkle root to commit to.
    #[error("a block must contain at least one transaction")]
    EmptyBlock,
}

// ---------------------------------------------------------------------------
// BlockHeader
// ---------------------------------------------------------------------------

/// Lightweight block header — everything the block hash covers.
///
/// The chain keeps the full header sequence in memory; a header is enough
/// to recompute any block's hash and fetch the body from the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Block format version.
    pub version: u32,
    /// Height of this block (genesis = 0).
    pub height: u32,
    /// Hash of the previous block's header. All zeros for genesis.
    pub prev_hash: [u8; HASH_LENGTH],
    /// Merkle root over the hashes of this block's transactions.
    pub root_hash: [u8; HASH_LENGTH],
    /// Production time, unix nanoseconds.
    pub timestamp: i64,
}

// ---------------------------------------------------------------------------
// Block
// ---------------------------------------------------------------------------

/// A full Strata block: header, ordered transactions, and the producer's
/// attestation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    /// Block metadata and chain linkage.
    pub header: BlockHeader,
    /// Ordered list of transactions included in this block.
    pub transactions: Vec<Transaction>,
    /// Public key of the block producer.
    pub public_key: StrataPublicKey,
    /// Producer's signature over the block hash.
    pub signature: StrataSignature,
}

// ---------------------------------------------------------------------------
// Hashing, signing, verification
// ---------------------------------------------------------------------------

/// Hash a block header: SHA-256 over its canonical encoding.
pub fn hash_header(header: &BlockHeader) -> [u8; HASH_LENGTH] {
    sha256(&canonical(header))
}

/// The block hash — by definition, the hash of its header.
pub fn hash_block(block: &Block) -> [u8; HASH_LENGTH] {
    hash_header(&block.header)
}

/// The block hash as a lowercase hex string — the block store key.
pub fn hash_block_hex(block: &Block) -> String {
    hex::encode(hash_block(block))
}

/// Merkle root over the ordered transaction hashes of a block.
///
/// `None` when the block has no transactions — such a block cannot be
/// signed or validated.
pub fn transactions_root(transactions: &[Transaction]) -> Option<[u8; HASH_LENGTH]> {
    let leaves: Vec<[u8; HASH_LENGTH]> = transactions.iter().map(hash_transaction).collect();
    merkle_root(&leaves)
}

/// Sign a block as its producer.
///
/// Computes the Merkle root over the block's current transaction list,
/// writes it into the header, hashes the header, and signs that hash —
/// once. The producer's public key and the signature are written onto the
/// block, and the same signature is returned. Because the root is fixed
/// before hashing and the producer fields sit outside the hash, the block
/// hash is identical before and after this call completes.
pub fn sign_block(keypair: &StrataKeypair, block: &mut Block) -> Result<StrataSignature, BlockError> {
    let root = transactions_root(&block.transactions).ok_or(BlockError::EmptyBlock)?;
    block.header.root_hash = root;

    let signature = keypair.sign(&hash_block(block));
    block.public_key = keypair.public_key();
    block.signature = signature.clone();
    Ok(signature)
}

/// Verify a block's self-contained integrity.
///
/// Checks that the header's Merkle root matches the transactions actually
/// present, and that the signature verifies over the block hash under the
/// producer's key. Chain linkage (`prev_hash`) and transaction validity are
/// the chain's job — this function answers only "is this block internally
/// honest?".
pub fn verify_block(block: &Block) -> bool {
    match transactions_root(&block.transactions) {
        Some(root) if root == block.header.root_hash => {}
        _ => return false,
    }
    block.public_key.verify(&hash_block(block), &block.signature)
}

/// Current wall-clock time as unix nanoseconds, for header timestamps.
pub fn unix_nanos() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Genesis
// ---------------------------------------------------------------------------

/// The founder keypair, derived from the well-known genesis seed.
///
/// Derived on demand from the compile-time constant — there is no mutable
/// global to poison. Anyone can derive it; that is the point of a devnet
/// faucet key.
pub fn founder_keypair() -> StrataKeypair {
    StrataKeypair::from_hex(GENESIS_SEED)
        .expect("the genesis seed constant is 32 bytes of valid hex")
}

/// Construct the genesis block.
///
/// Height 0, all-zero predecessor, a fixed timestamp, and exactly one
/// transaction: a single no-input output paying [`GENESIS_AMOUNT`] to the
/// founder address, signed by the founder key. Every field is derived from
/// constants, so every node computes a byte-identical genesis block — which
/// is what lets block 1 from a peer actually link.
pub fn genesis_block() -> Block {
    let founder = founder_keypair();

    let coinbase = Transaction {
        version: TX_VERSION,
        inputs: vec![],
        outputs: vec![TxOutput {
            amount: GENESIS_AMOUNT,
            address: founder.address(),
        }],
    };

    let mut block = Block {
        header: BlockHeader {
            version: BLOCK_VERSION,
            height: 0,
            prev_hash: [0u8; HASH_LENGTH],
            root_hash: [0u8; HASH_LENGTH],
            timestamp: GENESIS_TIMESTAMP,
        },
        transactions: vec![coinbase],
        public_key: founder.public_key(),
        signature: StrataSignature::empty(),
    };

    sign_block(&founder, &mut block)
        .expect("the genesis block carries exactly one transaction");
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    fn block_with_one_tx(producer: &StrataKeypair) -> Block {
        let tx = Transaction {
            version: TX_VERSION,
            inputs: vec![],
            outputs: vec![TxOutput {
                amount: 42,
                address: StrataKeypair::generate().address(),
            }],
        };
        let mut block = Block {
            header: BlockHeader {
                version: BLOCK_VERSION,
                height: 1,
                prev_hash: [9u8; 32],
                root_hash: [0u8; 32],
                timestamp: unix_nanos(),
            },
            transactions: vec![tx],
            public_key: producer.public_key(),
            signature: StrataSignature::empty(),
        };
        sign_block(producer, &mut block).unwrap();
        block
    }

    #[test]
    fn block_hash_is_header_hash() {
        let kp = StrataKeypair::generate();
        let block = block_with_one_tx(&kp);
        assert_eq!(hash_block(&block), hash_header(&block.header));
        assert_eq!(hash_block(&block).len(), 32);
    }

    #[test]
    fn signed_block_verifies() {
        let kp = StrataKeypair::generate();
        let block = block_with_one_tx(&kp);
        assert!(verify_block(&block));
    }

    #[test]
    fn sign_block_signs_exactly_once() {
        // The signature stored on the block and the one returned must be
        // bit-identical, and the block hash must not move during signing.
        let kp = StrataKeypair::generate();
        let mut block = block_with_one_tx(&kp);
        let hash_before = hash_block(&block);
        let returned = sign_block(&kp, &mut block).unwrap();
        assert_eq!(returned, block.signature);
        assert_eq!(hash_block(&block), hash_before);
    }

    #[test]
    fn tampered_header_fails_verification() {
        let kp = StrataKeypair::generate();
        let mut block = block_with_one_tx(&kp);
        block.header.height += 1;
        assert!(!verify_block(&block));
    }

    #[test]
    fn tampered_signature_fails_verification() {
        let kp = StrataKeypair::generate();
        let mut block = block_with_one_tx(&kp);
        let mut sig = [0u8; 64];
        sig.copy_from_slice(block.signature.as_bytes());
        sig[0] ^= 0xFF;
        block.signature = StrataSignature::from_bytes(sig);
        assert!(!verify_block(&block));
    }

    #[test]
    fn swapped_producer_key_fails_verification() {
        let kp = StrataKeypair::generate();
        let mut block = block_with_one_tx(&kp);
        block.public_key = StrataKeypair::generate().public_key();
        assert!(!verify_block(&block));
    }

    #[test]
    fn tampered_transaction_fails_verification() {
        // Changing a transaction breaks the Merkle commitment even though
        // the transaction list is outside the header.
        let kp = StrataKeypair::generate();
        let mut block = block_with_one_tx(&kp);
        block.transactions[0].outputs[0].amount = 9_999;
        assert!(!verify_block(&block));
    }

    #[test]
    fn root_hash_matches_computed_root() {
        let kp = StrataKeypair::generate();
        let block = block_with_one_tx(&kp);
        assert_eq!(
            block.header.root_hash,
            transactions_root(&block.transactions).unwrap()
        );
    }

    #[test]
    fn empty_block_cannot_be_signed() {
        let kp = StrataKeypair::generate();
        let mut block = Block {
            header: BlockHeader {
                version: BLOCK_VERSION,
                height: 1,
                prev_hash: [0u8; 32],
                root_hash: [0u8; 32],
                timestamp: unix_nanos(),
            },
            transactions: vec![],
            public_key: kp.public_key(),
            signature: StrataSignature::empty(),
        };
        assert!(matches!(
            sign_block(&kp, &mut block),
            Err(BlockError::EmptyBlock)
        ));
    }

    #[test]
    fn genesis_is_deterministic() {
        // Two nodes, one genesis. Anything else and no block ever links.
        let a = genesis_block();
        let b = genesis_block();
        assert_eq!(hash_block(&a), hash_block(&b));
        assert_eq!(a, b);
    }

    #[test]
    fn genesis_shape() {
        let genesis = genesis_block();
        assert_eq!(genesis.header.height, 0);
        assert_eq!(genesis.header.prev_hash, [0u8; 32]);
        assert_eq!(genesis.transactions.len(), 1);
        assert!(genesis.transactions[0].inputs.is_empty());
        assert_eq!(genesis.transactions[0].outputs.len(), 1);
        assert_eq!(genesis.transactions[0].outputs[0].amount, GENESIS_AMOUNT);
        assert_eq!(
            genesis.transactions[0].outputs[0].address,
            founder_keypair().address()
        );
        assert!(verify_block(&genesis));
    }
}
