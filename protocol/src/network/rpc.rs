//! # RPC Wire Protocol
//!
//! Message envelopes and frame codec for node-to-node RPC. The transport
//! is deliberately boring: a persistent TCP connection carrying
//! length-prefixed frames, each frame the canonical bincode encoding of a
//! request or response envelope. Any bidirectional byte stream would do;
//! TCP is the one everyone already has.
//!
//! ## Frame Layout
//!
//! ```text
//! ┌────────────────────┬──────────────────────────────┐
//! │ length: u32 (BE)   │ canonical(envelope)          │
//! └────────────────────┴──────────────────────────────┘
//! ```
//!
//! The length prefix is validated against [`MAX_FRAME_BYTES`] before any
//! allocation happens — a hostile peer gets to waste four bytes of our
//! attention, not four gigabytes of our memory.
//!
//! ## Method Index
//!
//! | Method              | Request       | Response   | Behavior                        |
//! |---------------------|---------------|------------|---------------------------------|
//! | `Handshake`         | `NodeInfo`    | `NodeInfo` | Version equality gate; add peer |
//! | `HandleTransaction` | `Transaction` | `Ack`      | Mempool admit + gossip if novel |
//! | `HandleBlock`       | `Block`       | `Ack`      | Chain-accept + gossip if novel  |

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::config::MAX_FRAME_BYTES;
use crate::crypto::hash::canonical;
use crate::storage::block::Block;
use crate::transaction::Transaction;

// ---------------------------------------------------------------------------
// NodeInfo
// ---------------------------------------------------------------------------

/// A node's self-description, exchanged during the handshake.
///
/// The `peer_list` is what makes discovery transitive: every handshake
/// response carries the responder's current peer set, and the caller
/// bootstraps toward any address it hasn't met yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeInfo {
    /// Protocol version string. Peering requires exact equality.
    pub version: String,
    /// Chain height at the time the info was assembled.
    pub height: u32,
    /// The address this node accepts connections on — also its identity
    /// in every peer table.
    pub listen_addr: String,
    /// Listen addresses of the node's current peers.
    pub peer_list: Vec<String>,
}

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

/// A request frame, one per RPC method.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RpcRequest {
    /// `Handshake` — introduce ourselves, learn the peer.
    Handshake(NodeInfo),
    /// `HandleTransaction` — submit or relay a transaction.
    Transaction(Transaction),
    /// `HandleBlock` — submit or relay a block.
    Block(Block),
}

/// A response frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum RpcResponse {
    /// Successful handshake: the responder's own info.
    Handshake(NodeInfo),
    /// Successful transaction or block submission.
    Ack,
    /// The request was understood and refused.
    Fault(RpcFault),
}

/// Why a request was refused. Travels across the wire, so it carries a
/// machine-readable kind next to the human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcFault {
    pub kind: FaultKind,
    pub message: String,
}

/// Machine-readable refusal categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaultKind {
    /// Handshake rejected: the two nodes speak different protocol versions.
    VersionMismatch,
    /// The transaction failed validation.
    InvalidTransaction,
    /// The block failed validation.
    InvalidBlock,
    /// Anything else that went wrong server-side.
    Internal,
}

impl RpcFault {
    pub fn new(kind: FaultKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for RpcFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

// ---------------------------------------------------------------------------
// Transport errors
// ---------------------------------------------------------------------------

/// Failures at the transport layer, or a fault returned by the remote.
///
/// Per the propagation policy, callers on the gossip paths log these and
/// carry on — a flaky peer costs us a peer, never the node.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("frame of {0} bytes exceeds the {MAX_FRAME_BYTES}-byte limit")]
    FrameTooLarge(usize),

    /// The remote processed the request and said no.
    #[error("peer fault: {0}")]
    Fault(RpcFault),

    /// The remote answered with an envelope that doesn't match the request
    /// (e.g. an `Ack` to a handshake). Protocol violation.
    #[error("unexpected response envelope")]
    UnexpectedResponse,
}

// ---------------------------------------------------------------------------
// Frame codec
// ---------------------------------------------------------------------------

/// Write one length-prefixed frame.
pub async fn write_frame<W, T>(writer: &mut W, value: &T) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin,
    T: Serialize,
{
    let payload = canonical(value);
    if payload.len() > MAX_FRAME_BYTES {
        return Err(TransportError::FrameTooLarge(payload.len()));
    }
    writer.write_u32(payload.len() as u32).await?;
    writer.write_all(&payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Read one length-prefixed frame.
///
/// The length is checked against [`MAX_FRAME_BYTES`] before the payload
/// buffer is allocated.
pub async fn read_frame<R, T>(reader: &mut R) -> Result<T, TransportError>
where
    R: AsyncRead + Unpin,
    T: DeserializeOwned,
{
    let len = reader.read_u32().await? as usize;
    if len > MAX_FRAME_BYTES {
        return Err(TransportError::FrameTooLarge(len));
    }
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(bincode::deserialize(&payload)?)
}
