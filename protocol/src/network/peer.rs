//! # Peer Client
//!
//! An outbound RPC connection to one peer. The connection is dialed once,
//! cached in the peer table, and reused for every call until the peer is
//! removed — dropping the last handle closes the socket.
//!
//! Calls are strictly request/response, serialized per connection by an
//! async mutex: one frame out, one frame in. Concurrent callers queue on
//! the lock rather than interleaving frames, which keeps the wire protocol
//! trivially correct at the cost of per-peer pipelining we don't need.

use tokio::net::TcpStream;
use tokio::sync::Mutex;

use crate::storage::block::Block;
use crate::transaction::Transaction;

use super::rpc::{read_frame, write_frame, NodeInfo, RpcRequest, RpcResponse, TransportError};

/// A cached outbound connection to a single peer.
pub struct PeerClient {
    addr: String,
    stream: Mutex<TcpStream>,
}

impl PeerClient {
    /// Dial a peer.
    pub async fn connect(addr: &str) -> Result<Self, TransportError> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self {
            addr: addr.to_string(),
            stream: Mutex::new(stream),
        })
    }

    /// The address this client dialed.
    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// One request/response exchange.
    async fn call(&self, request: &RpcRequest) -> Result<RpcResponse, TransportError> {
        let mut stream = self.stream.lock().await;
        write_frame(&mut *stream, request).await?;
        read_frame(&mut *stream).await
    }

    /// `Handshake`: present our info, receive the peer's.
    pub async fn handshake(&self, our_info: &NodeInfo) -> Result<NodeInfo, TransportError> {
        match self.call(&RpcRequest::Handshake(our_info.clone())).await? {
            RpcResponse::Handshake(their_info) => Ok(their_info),
            RpcResponse::Fault(fault) => Err(TransportError::Fault(fault)),
            RpcResponse::Ack => Err(TransportError::UnexpectedResponse),
        }
    }

    /// `HandleTransaction`: relay a transaction to the peer.
    pub async fn send_transaction(&self, tx: &Transaction) -> Result<(), TransportError> {
        match self.call(&RpcRequest::Transaction(tx.clone())).await? {
            RpcResponse::Ack => Ok(()),
            RpcResponse::Fault(fault) => Err(TransportError::Fault(fault)),
            RpcResponse::Handshake(_) => Err(TransportError::UnexpectedResponse),
        }
    }

    /// `HandleBlock`: relay a block to the peer.
    pub async fn send_block(&self, block: &Block) -> Result<(), TransportError> {
        match self.call(&RpcRequest::Block(block.clone())).await? {
            RpcResponse::Ack => Ok(()),
            RpcResponse::Fault(fault) => Err(TransportError::Fault(fault)),
            RpcResponse::Handshake(_) => Err(TransportError::UnexpectedResponse),
        }
    }
}

impl std::fmt::Debug for PeerClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PeerClient({})", self.addr)
    }
}
