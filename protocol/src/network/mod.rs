//! # Network Module
//!
//! The peer fabric: node lifecycle, the RPC wire protocol, the mempool,
//! transaction/block gossip, and single-validator block production.
//!
//! ## Architecture
//!
//! ```text
//! node.rs     — Node runtime: accept loop, handshake, peer table, gossip
//! rpc.rs      — Wire envelopes (NodeInfo, requests, responses) + framing
//! peer.rs     — Cached outbound client, one per peer
//! mempool.rs  — Pending-transaction pool with processed-tx tombstones
//! producer.rs — Validator tick: drain, filter, build, sign, accept
//! ```
//!
//! ## Design Decisions
//!
//! - Transport is length-prefixed canonical bincode over plain TCP. Any
//!   bidirectional request/response channel would satisfy the contract;
//!   this one has no dependencies and no surprises.
//! - The mempool is guarded by `parking_lot::RwLock`, not an async lock —
//!   critical sections are map operations, never awaits, and sync locks
//!   keep the hot path free of executor bookkeeping.
//! - Broadcast is a task per peer joined under one deadline. A slow peer
//!   delays nobody else's copy and cannot hold the handler hostage.
//! - Gossip deduplication is structural, not cached: the mempool's
//!   tombstones suppress transaction echoes, the block store suppresses
//!   block echoes. There is no separate seen-message cache to fall out of
//!   sync with the state it summarizes.

pub mod mempool;
pub mod node;
pub mod peer;
pub mod producer;
pub mod rpc;

pub use mempool::Mempool;
pub use node::{Node, NodeConfig, NodeError};
pub use peer::PeerClient;
pub use producer::BlockProducer;
pub use rpc::{FaultKind, NodeInfo, RpcFault, RpcRequest, RpcResponse, TransportError};
