//! # Hashing & Canonical Encoding
//!
//! SHA-256 and the Merkle root construction, plus the canonical byte
//! encoding that feeds them. One hash function, one encoding, no options —
//! every knob removed here is a consensus failure that can't happen.
//!
//! ## On the canonical encoding
//!
//! Block and transaction identities are hashes over serialized structures,
//! so the serialization must be byte-stable: same logical value, same bytes,
//! on every node, forever. We use bincode's default configuration
//! (little-endian, fixed-width integers, u64 length prefixes, serde field
//! order) as that canonical form. It is a tag-less tag-length-value scheme
//! in all but name: structs encode field by field, sequences carry their
//! length, and there is exactly one encoding per value.
//!
//! ## On hash function choice
//!
//! SHA-256, single, not double. The double-SHA construction in Bitcoin
//! guards against length extension on a hash used as a MAC, which is not a
//! role our hashes play. Compatibility with Bitcoin is nominal anyway — the
//! address format already gave that away.

use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::config::HASH_LENGTH;

/// Compute the SHA-256 digest of the input.
///
/// Returns a fixed-size 32-byte array — every caller in this codebase wants
/// the array form, so there is no `Vec<u8>` variant to drift out of sync.
pub fn sha256(data: &[u8]) -> [u8; HASH_LENGTH] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Hash two 32-byte nodes into their Merkle parent without concatenating
/// into a temporary buffer.
fn sha256_pair(left: &[u8; HASH_LENGTH], right: &[u8; HASH_LENGTH]) -> [u8; HASH_LENGTH] {
    let mut hasher = Sha256::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize().into()
}

/// Serialize a value into its canonical byte form.
///
/// This is the encoding that block hashes, transaction hashes, and wire
/// frames are defined over. Infallible by construction: our wire types are
/// plain structs, enums, arrays, and sequences, none of which bincode can
/// refuse to encode.
pub fn canonical<T: Serialize>(value: &T) -> Vec<u8> {
    bincode::serialize(value).expect("canonical encoding of a wire type cannot fail")
}

/// Compute the Merkle root over an ordered list of leaf hashes.
///
/// A simple binary tree — no sparse trees, no Merkle Mountain Ranges. For a
/// block's transaction list, a basic binary tree is sufficient and easy to
/// reason about.
///
/// Conventions, fixed forever:
/// - Zero leaves have no root: returns `None`. A block with no transactions
///   has nothing to commit to and is rejected upstream.
/// - A single leaf is paired with itself, so the root is always the output
///   of a hash operation, never a raw leaf.
/// - An odd level duplicates its last node (the Bitcoin convention). The
///   known duplicate-transaction ambiguity this creates is prevented a
///   layer up, where transaction hashes within a block must be unique.
pub fn merkle_root(leaves: &[[u8; HASH_LENGTH]]) -> Option<[u8; HASH_LENGTH]> {
    if leaves.is_empty() {
        return None;
    }

    let mut level: Vec<[u8; HASH_LENGTH]> = leaves.to_vec();

    if level.len() == 1 {
        return Some(sha256_pair(&level[0], &level[0]));
    }

    while level.len() > 1 {
        let mut next = Vec::with_capacity(level.len().div_ceil(2));
        for chunk in level.chunks(2) {
            let left = &chunk[0];
            let right = if chunk.len() == 2 { &chunk[1] } else { &chunk[0] };
            next.push(sha256_pair(left, right));
        }
        level = next;
    }

    Some(level[0])
}
