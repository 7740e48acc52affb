//! # Storage Module
//!
//! Blocks, the store abstractions, and the chain that ties them into a
//! ledger. This is where "a bag of signed bytes" becomes "an append-only
//! history with a spendable balance sheet".
//!
//! ## Architecture
//!
//! ```text
//! block.rs — Block & header structures, hashing, signing, genesis
//! utxo.rs  — The unspent-output record and its store key
//! store.rs — BlockStore / TxStore / UtxoStore traits + in-memory impls
//! chain.rs — Validation, UTXO accounting, the header index
//! ```
//!
//! ## Design Decisions
//!
//! 1. **Stores are traits.** The in-memory maps are the reference
//!    implementation; a disk-backed engine slots in behind the same three
//!    traits without the chain noticing.
//! 2. **Headers live in memory.** The chain keeps the ordered header
//!    sequence beside the stores — height lookups never deserialize a
//!    block, and the tip hash is always one read away.
//! 3. **Spent UTXOs are tombstones, not deletions.** A replayed input hits
//!    a record that says "already spent", which is a far better error than
//!    "never heard of it".

pub mod block;
pub mod chain;
pub mod store;
pub mod utxo;

pub use block::{
    founder_keypair, genesis_block, hash_block, hash_block_hex, hash_header, sign_block,
    unix_nanos, verify_block, Block, BlockError, BlockHeader,
};
pub use chain::{Chain, ChainError};
pub use store::{
    BlockStore, MemoryBlockStore, MemoryTxStore, MemoryUtxoStore, StoreError, TxStore, UtxoStore,
};
pub use utxo::{utxo_key, Utxo};
