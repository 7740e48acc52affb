//! # Cryptographic Primitives for Strata
//!
//! This module is the foundation of everything security-related in the
//! protocol. Every signing operation and every hash flows through here.
//!
//! We deliberately chose boring, well-audited cryptography:
//!
//! - **Ed25519** for signatures — fast, deterministic, and nobody has broken it.
//! - **SHA-256** for hashing — Bitcoin's choice, and ours, because block and
//!   transaction identities should be legible to the rest of the ecosystem.
//!
//! ## A note on "rolling your own crypto"
//!
//! We don't. Everything here is a thin, type-safe wrapper around audited
//! implementations. If you're tempted to optimize these functions, please
//! reconsider. Then reconsider again. Then go read about timing attacks
//! and come back when you've lost the urge.

pub mod hash;
pub mod keys;

// Re-export the things people actually need so they don't have to memorize
// our module hierarchy.
pub use hash::{merkle_root, sha256};
pub use keys::{Address, KeyError, StrataKeypair, StrataPublicKey, StrataSignature};
