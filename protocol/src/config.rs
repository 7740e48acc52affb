//! # Protocol Configuration & Constants
//!
//! Every magic number in Strata lives here. If you're hardcoding a constant
//! somewhere else, you're doing it wrong and you owe the team coffee.
//!
//! These values define the DNA of the network. Changing `GENESIS_SEED` or
//! `GENESIS_AMOUNT` after any node has shipped forks the universe, so
//! choose wisely during devnet.

use std::time::Duration;

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// The node version string exchanged during the handshake.
///
/// Peering is gated on exact string equality — there is no semver range
/// negotiation, by deliberate choice. Two nodes either speak the same
/// protocol or they don't talk at all.
pub const PROTOCOL_VERSION: &str = "0.1.0";

/// Block format version stamped into every header.
pub const BLOCK_VERSION: u32 = 1;

/// Transaction format version.
pub const TX_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Cryptographic Parameters
// ---------------------------------------------------------------------------

/// Ed25519 seed length in bytes. The seed *is* the secret.
pub const SEED_LENGTH: usize = 32;

/// Expanded keypair length: seed followed by the derived public key.
pub const KEYPAIR_LENGTH: usize = 64;

/// Ed25519 public (verifying) key length in bytes.
pub const PUBLIC_KEY_LENGTH: usize = 32;

/// Ed25519 signature length. Always 64 bytes. If yours isn't, something
/// has gone terribly wrong.
pub const SIGNATURE_LENGTH: usize = 64;

/// Address length in bytes — the last 20 bytes of a public key.
/// Ethereum-style truncation; any resemblance to Bitcoin addresses is
/// strictly nominal.
pub const ADDRESS_LENGTH: usize = 20;

/// SHA-256 digest length in bytes.
pub const HASH_LENGTH: usize = 32;

// ---------------------------------------------------------------------------
// Genesis
// ---------------------------------------------------------------------------

/// Hex-encoded seed of the founder key. The genesis block is signed by the
/// keypair derived from this seed, and its single output pays the founder
/// address. Derived at chain construction time, never mutated afterwards.
pub const GENESIS_SEED: &str = "852d9b8e11b181bcf81aad70689521c469a2a5d830a8cbe1df1a497a91c93c84";

/// Amount minted by the genesis transaction.
pub const GENESIS_AMOUNT: i64 = 1_000_000;

/// Fixed genesis timestamp. Every node must derive a byte-identical genesis
/// block — a wall-clock timestamp here would give each node its own genesis
/// hash and no block from a peer would ever link.
pub const GENESIS_TIMESTAMP: i64 = 0;

// ---------------------------------------------------------------------------
// Timing
// ---------------------------------------------------------------------------

/// Validator tick: how often a validator drains the mempool and mints a
/// block. 5 seconds is leisurely, which is exactly right for a devnet.
pub const BLOCK_INTERVAL: Duration = Duration::from_secs(5);

/// How long a processed-transaction tombstone survives in the mempool
/// before `clear_processed` may evict it. Must comfortably exceed the time
/// a transaction spends bouncing around the gossip fabric, or a tx that is
/// still being relayed will re-enter after being embedded in a block.
pub const PROCESSED_TX_TTL: Duration = Duration::from_secs(60);

/// Deadline for a full broadcast fan-out. Peers that haven't acknowledged
/// by then are abandoned; partial broadcast is an acceptable outcome.
pub const BROADCAST_DEADLINE: Duration = Duration::from_secs(5);

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Default P2P listening port.
pub const DEFAULT_P2P_PORT: u16 = 4000;

/// Upper bound on a single RPC frame. Large enough for a block stuffed
/// with transactions, small enough that a malicious length prefix can't
/// talk us into a multi-gigabyte allocation.
pub const MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crypto_parameter_sizes() {
        assert_eq!(SEED_LENGTH, 32);
        assert_eq!(PUBLIC_KEY_LENGTH, 32);
        assert_eq!(SIGNATURE_LENGTH, 64);
        assert_eq!(ADDRESS_LENGTH, 20);
        assert_eq!(KEYPAIR_LENGTH, SEED_LENGTH + PUBLIC_KEY_LENGTH);
    }

    #[test]
    fn genesis_seed_is_well_formed() {
        let bytes = hex::decode(GENESIS_SEED).expect("genesis seed must be valid hex");
        assert_eq!(bytes.len(), SEED_LENGTH);
        assert!(GENESIS_AMOUNT > 0);
    }

    #[test]
    fn timing_constants_sanity() {
        // A tombstone must outlive at least one broadcast round, or drained
        // transactions could re-enter the mempool mid-gossip.
        assert!(PROCESSED_TX_TTL > BROADCAST_DEADLINE);
        assert!(PROCESSED_TX_TTL > BLOCK_INTERVAL);
    }
}
