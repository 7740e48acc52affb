//! # Transaction Module
//!
//! The UTXO transaction model: construction, hashing, signing, and
//! signature verification. Every movement of value on the network is a
//! [`Transaction`] consuming previously created outputs and producing new
//! ones.
//!
//! ## Architecture
//!
//! ```text
//! types.rs        — Transaction, TxInput, TxOutput
//! signing.rs      — Transaction identity (hash) and input signing
//! verification.rs — Cryptographic verification of input signatures
//! ```
//!
//! ## Transaction Lifecycle
//!
//! 1. **Build** — Assemble inputs referencing unspent outputs, and outputs
//!    locking new value to addresses.
//! 2. **Sign** — Each input's owner signs the transaction hash; the
//!    signature lands in that input's signature slot.
//! 3. **Broadcast** — Submit to any node; the mempool dedupes, the fabric
//!    gossips.
//! 4. **Validate** — The chain checks signatures here and the funds ledger
//!    in `storage::chain` before the transaction enters a block.
//!
//! ## Design Decisions
//!
//! - The transaction hash is computed with every input signature cleared to
//!   the empty byte string. This is the standard trick for signing a
//!   structure that must carry its own signatures: hash-then-sign would
//!   otherwise be circular. We hash a cleared *clone*, so the original's
//!   signatures are never disturbed.
//! - Amounts are `i64`, validated non-negative at the chain boundary. The
//!   signed type makes "negative amount" a rejectable value rather than a
//!   silent wrap.

pub mod signing;
pub mod types;
pub mod verification;

pub use signing::{hash_transaction, hash_transaction_hex, sign_transaction};
pub use types::{Transaction, TxInput, TxOutput};
pub use verification::verify_transaction;
