//! # The Node
//!
//! The top-level runtime entity: owns the chain, the mempool, the peer
//! table, and the listening socket, and wires inbound RPCs to the right
//! subsystem. In production this struct is instantiated by the node binary
//! and left running until the process dies.
//!
//! ## Lifecycle
//!
//! ```text
//! new() -> start(bootstrap) -> [accept loop | bootstrap | validator tick]
//!       -> shutdown()
//! ```
//!
//! `start` binds the listener and spawns the background tasks; `shutdown`
//! flips a watch channel that the accept loop and validator tick observe.
//! In-flight broadcasts are allowed to finish on their own — they are
//! bounded by the broadcast deadline anyway.
//!
//! ## Peer discovery
//!
//! Discovery is transitive and unceremonious: every handshake response
//! carries the responder's peer list, and the receiver bootstraps toward
//! any address it hasn't met. No flood, no TTL — convergence rides on the
//! fact that each new edge exposes both sides' peer sets to each other.
//!
//! ## Gossip discipline
//!
//! A transaction is re-broadcast only on first admission (the mempool says
//! so), and a block only on first acceptance (the block store says so).
//! That single bit per object is the entire storm-suppression mechanism,
//! and it is enough.

use std::collections::HashMap;
use std::io;
use std::sync::Arc;

use futures::future::join_all;
use parking_lot::RwLock;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::time::{timeout, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::{BLOCK_INTERVAL, BROADCAST_DEADLINE, PROTOCOL_VERSION};
use crate::crypto::keys::StrataKeypair;
use crate::storage::block::{hash_block_hex, Block};
use crate::storage::chain::{Chain, ChainError};
use crate::transaction::{hash_transaction_hex, Transaction};

use super::mempool::Mempool;
use super::peer::PeerClient;
use super::producer::BlockProducer;
use super::rpc::{
    read_frame, write_frame, FaultKind, NodeInfo, RpcFault, RpcRequest, RpcResponse,
    TransportError,
};
use thiserror::Error;

/// Errors surfaced by node operations.
#[derive(Debug, Error)]
pub enum NodeError {
    /// Handshake refused: the peer speaks a different protocol version.
    #[error("version mismatch: ours {ours}, theirs {theirs}")]
    VersionMismatch { ours: String, theirs: String },

    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Startup configuration for a [`Node`].
#[derive(Debug)]
pub struct NodeConfig {
    /// Protocol version to present (and require) in handshakes.
    pub version: String,
    /// Address to listen on. Port 0 is honored: the resolved address is
    /// what gets advertised to peers.
    pub listen_addr: String,
    /// A validator keypair, if this node should mint blocks.
    pub validator_key: Option<StrataKeypair>,
}

impl NodeConfig {
    /// Config for a plain relay node on the given address.
    pub fn new(listen_addr: impl Into<String>) -> Self {
        Self {
            version: PROTOCOL_VERSION.to_string(),
            listen_addr: listen_addr.into(),
            validator_key: None,
        }
    }

    /// Make this node a validator.
    pub fn with_validator_key(mut self, key: StrataKeypair) -> Self {
        self.validator_key = Some(key);
        self
    }

    /// Override the advertised protocol version.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// A peer table entry: the cached outbound client plus what the peer told
/// us about itself. The entry owns the client; peers hold no pointer back
/// into the node.
struct PeerEntry {
    client: Arc<PeerClient>,
    #[allow(dead_code)] // height/version are kept for future sync logic
    info: NodeInfo,
}

/// A running Strata node.
///
/// Shared as `Arc<Node>`; every method takes `&self` and synchronizes
/// internally. Background tasks hold their own `Arc` clones.
pub struct Node {
    version: String,
    /// Rewritten once at `start` with the resolved socket address, then
    /// read-only. A lock instead of `OnceLock` because the pre-bind value
    /// is also meaningful (it is what the caller asked for).
    listen_addr: RwLock<String>,
    validator_key: Option<StrataKeypair>,
    chain: Arc<Chain>,
    mempool: Arc<Mempool>,
    peers: RwLock<HashMap<String, PeerEntry>>,
    shutdown: watch::Sender<bool>,
}

impl Node {
    /// Build a node over fresh in-memory stores. The chain inserts genesis
    /// eagerly, so a new node is immediately at height 0.
    pub fn new(config: NodeConfig) -> Result<Arc<Self>, ChainError> {
        let chain = Arc::new(Chain::in_memory()?);
        let (shutdown, _) = watch::channel(false);

        Ok(Arc::new(Self {
            version: config.version,
            listen_addr: RwLock::new(config.listen_addr),
            validator_key: config.validator_key,
            chain,
            mempool: Arc::new(Mempool::new()),
            peers: RwLock::new(HashMap::new()),
            shutdown,
        }))
    }

    /// Start serving: bind the listener, spawn the accept loop, schedule
    /// the bootstrap, and — on a validator — the block production tick.
    ///
    /// Returns once the listener is bound; everything else proceeds in the
    /// background.
    pub async fn start(self: &Arc<Self>, bootstrap_addrs: Vec<String>) -> Result<(), NodeError> {
        let listener = TcpListener::bind(self.listen_addr())
            .await
            .map_err(TransportError::from)?;
        let resolved = listener.local_addr().map_err(TransportError::from)?;
        *self.listen_addr.write() = resolved.to_string();

        info!(
            addr = %resolved,
            validator = self.validator_key.is_some(),
            "node listening"
        );

        let node = Arc::clone(self);
        let shutdown_rx = self.shutdown.subscribe();
        tokio::spawn(node.accept_loop(listener, shutdown_rx));

        if !bootstrap_addrs.is_empty() {
            let node = Arc::clone(self);
            tokio::spawn(node.bootstrap_network(bootstrap_addrs));
        }

        if let Some(key) = &self.validator_key {
            let producer = BlockProducer::new(
                Arc::clone(&self.chain),
                Arc::clone(&self.mempool),
                key.clone(),
            );
            let node = Arc::clone(self);
            let shutdown_rx = self.shutdown.subscribe();
            tokio::spawn(node.validator_loop(producer, shutdown_rx));
        }

        Ok(())
    }

    /// Stop the accept loop and the validator tick. Idempotent.
    pub fn shutdown(&self) {
        let _ = self.shutdown.send(true);
    }

    /// The address this node listens on (resolved after `start`).
    pub fn listen_addr(&self) -> String {
        self.listen_addr.read().clone()
    }

    /// This node's current self-description.
    pub fn node_info(&self) -> NodeInfo {
        NodeInfo {
            version: self.version.clone(),
            height: self.chain.height(),
            listen_addr: self.listen_addr(),
            peer_list: self.peer_addrs(),
        }
    }

    /// Listen addresses of all current peers.
    pub fn peer_addrs(&self) -> Vec<String> {
        self.peers.read().keys().cloned().collect()
    }

    /// The node's ledger.
    pub fn chain(&self) -> &Arc<Chain> {
        &self.chain
    }

    /// The node's mempool.
    pub fn mempool(&self) -> &Arc<Mempool> {
        &self.mempool
    }

    // -- Serving ------------------------------------------------------------

    async fn accept_loop(
        self: Arc<Self>,
        listener: TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, remote)) => {
                        debug!(%remote, "accepted connection");
                        let node = Arc::clone(&self);
                        tokio::spawn(node.serve_connection(stream));
                    }
                    Err(e) => warn!(error = %e, "accept failed"),
                },
                _ = shutdown.changed() => {
                    info!("accept loop stopping");
                    break;
                }
            }
        }
    }

    /// Serve one inbound connection: a loop of request frames answered
    /// with response frames, until the peer hangs up.
    async fn serve_connection(self: Arc<Self>, mut stream: TcpStream) {
        loop {
            let request: RpcRequest = match read_frame(&mut stream).await {
                Ok(request) => request,
                Err(TransportError::Io(e)) if e.kind() == io::ErrorKind::UnexpectedEof => break,
                Err(e) => {
                    debug!(error = %e, "closing connection on read error");
                    break;
                }
            };

            let response = self.dispatch(request).await;
            if let Err(e) = write_frame(&mut stream, &response).await {
                debug!(error = %e, "closing connection on write error");
                break;
            }
        }
    }

    async fn dispatch(self: &Arc<Self>, request: RpcRequest) -> RpcResponse {
        match request {
            RpcRequest::Handshake(their_info) => match self.handle_handshake(their_info).await {
                Ok(our_info) => RpcResponse::Handshake(our_info),
                Err(e @ NodeError::VersionMismatch { .. }) => {
                    RpcResponse::Fault(RpcFault::new(FaultKind::VersionMismatch, e.to_string()))
                }
                Err(e) => RpcResponse::Fault(RpcFault::new(FaultKind::Internal, e.to_string())),
            },
            RpcRequest::Transaction(tx) => {
                self.handle_transaction(tx);
                RpcResponse::Ack
            }
            RpcRequest::Block(block) => match self.handle_block(block) {
                Ok(_) => RpcResponse::Ack,
                Err(e @ ChainError::InvalidTransaction(_)) => {
                    RpcResponse::Fault(RpcFault::new(FaultKind::InvalidTransaction, e.to_string()))
                }
                Err(e @ ChainError::InvalidBlock(_)) => {
                    RpcResponse::Fault(RpcFault::new(FaultKind::InvalidBlock, e.to_string()))
                }
                Err(e) => RpcResponse::Fault(RpcFault::new(FaultKind::Internal, e.to_string())),
            },
        }
    }

    // -- Handshake & peer table ----------------------------------------------

    /// Inbound handshake: gate on version equality, dial the peer back on
    /// its advertised listen address, add it to the table, and answer with
    /// our own info.
    async fn handle_handshake(self: &Arc<Self>, their_info: NodeInfo) -> Result<NodeInfo, NodeError> {
        if their_info.version != self.version {
            warn!(
                peer = %their_info.listen_addr,
                theirs = %their_info.version,
                "rejecting handshake: version mismatch"
            );
            return Err(NodeError::VersionMismatch {
                ours: self.version.clone(),
                theirs: their_info.version,
            });
        }

        info!(peer = %their_info.listen_addr, height = their_info.height, "handshake received");

        // The dial-back gives us our own cached client to the peer. If it
        // fails, the peer keeps its client to us and may retry later; the
        // handshake itself still succeeds.
        match PeerClient::connect(&their_info.listen_addr).await {
            Ok(client) => self.add_peer(client, their_info),
            Err(e) => warn!(
                peer = %their_info.listen_addr,
                error = %e,
                "could not dial peer back; not added to peer table"
            ),
        }

        Ok(self.node_info())
    }

    /// Insert a peer (idempotent, keyed by listen address) and schedule a
    /// bootstrap toward every address in its peer list we don't know yet.
    fn add_peer(self: &Arc<Self>, client: PeerClient, info: NodeInfo) {
        let addr = info.listen_addr.clone();
        if addr == self.listen_addr() {
            debug!("refusing to add ourselves as a peer");
            return;
        }

        let learned = info.peer_list.clone();
        self.peers.write().insert(
            addr.clone(),
            PeerEntry {
                client: Arc::new(client),
                info,
            },
        );
        info!(peer = %addr, peers = self.peers.read().len(), "peer added");

        // Transitive discovery: chase the addresses this peer knows and we
        // don't. Skipping known ones here is an optimization, not a
        // guarantee — the bootstrap re-checks under no lock at all, and
        // add_peer's idempotent insert is what makes the race harmless.
        let own_addr = self.listen_addr();
        let absent: Vec<String> = {
            let peers = self.peers.read();
            learned
                .into_iter()
                .filter(|a| *a != own_addr && !peers.contains_key(a))
                .collect()
        };
        if !absent.is_empty() {
            debug!(count = absent.len(), "bootstrapping toward newly learned peers");
            let node = Arc::clone(self);
            tokio::spawn(node.bootstrap_network(absent));
        }
    }

    /// Drop a peer. The cached connection closes when the last clone of
    /// the client handle (possibly held by an in-flight broadcast) drops.
    pub fn remove_peer(&self, addr: &str) {
        if self.peers.write().remove(addr).is_some() {
            info!(peer = %addr, "peer removed");
        }
    }

    /// Dial and handshake each address, adding successes to the peer
    /// table. Failures are logged and skipped — bootstrap is best-effort
    /// by design.
    async fn bootstrap_network(self: Arc<Self>, addrs: Vec<String>) {
        for addr in addrs {
            if addr == self.listen_addr() || self.peers.read().contains_key(&addr) {
                continue;
            }
            match self.dial_peer(&addr).await {
                Ok((client, info)) => self.add_peer(client, info),
                Err(e) => warn!(peer = %addr, error = %e, "bootstrap failed"),
            }
        }
    }

    async fn dial_peer(&self, addr: &str) -> Result<(PeerClient, NodeInfo), TransportError> {
        debug!(peer = %addr, "dialing");
        let client = PeerClient::connect(addr).await?;
        let their_info = client.handshake(&self.node_info()).await?;
        Ok((client, their_info))
    }

    // -- Gossip --------------------------------------------------------------

    /// Inbound transaction: admit to the mempool and, on first sight,
    /// fan out to every peer.
    fn handle_transaction(self: &Arc<Self>, tx: Transaction) {
        let hash = hash_transaction_hex(&tx);
        if self.mempool.add(tx.clone()) {
            info!(tx = %hash, pending = self.mempool.size(), "admitted new transaction");
            let node = Arc::clone(self);
            tokio::spawn(async move { node.broadcast_transaction(tx).await });
        } else {
            debug!(tx = %hash, "ignoring known transaction");
        }
    }

    /// Inbound block: accept onto the chain and, on first acceptance, fan
    /// out to every peer. A block we already hold is acknowledged without
    /// re-validation or re-broadcast — that silence is what terminates the
    /// gossip wave.
    fn handle_block(self: &Arc<Self>, block: Block) -> Result<bool, ChainError> {
        let hash = hash_block_hex(&block);
        if self.chain.has_block(&hash) {
            debug!(block = %hash, "ignoring known block");
            return Ok(false);
        }

        self.chain.add_block(&block)?;
        info!(
            block = %hash,
            height = block.header.height,
            txs = block.transactions.len(),
            "accepted block"
        );

        let node = Arc::clone(self);
        tokio::spawn(async move { node.broadcast_block(block).await });
        Ok(true)
    }

    async fn broadcast_transaction(self: Arc<Self>, tx: Transaction) {
        let clients = self.peer_clients();
        if clients.is_empty() {
            return;
        }
        debug!(peers = clients.len(), "broadcasting transaction");

        let sends: Vec<_> = clients
            .into_iter()
            .map(|client| {
                let tx = tx.clone();
                tokio::spawn(async move {
                    if let Err(e) = client.send_transaction(&tx).await {
                        warn!(peer = %client.addr(), error = %e, "transaction broadcast failed");
                    }
                })
            })
            .collect();

        // Past the deadline the stragglers finish (or fail) on their own;
        // partial broadcast is the accepted outcome and nothing rolls back.
        if timeout(BROADCAST_DEADLINE, join_all(sends)).await.is_err() {
            warn!("transaction broadcast deadline exceeded");
        }
    }

    async fn broadcast_block(self: Arc<Self>, block: Block) {
        let clients = self.peer_clients();
        if clients.is_empty() {
            return;
        }
        debug!(peers = clients.len(), "broadcasting block");

        let sends: Vec<_> = clients
            .into_iter()
            .map(|client| {
                let block = block.clone();
                tokio::spawn(async move {
                    if let Err(e) = client.send_block(&block).await {
                        warn!(peer = %client.addr(), error = %e, "block broadcast failed");
                    }
                })
            })
            .collect();

        if timeout(BROADCAST_DEADLINE, join_all(sends)).await.is_err() {
            warn!("block broadcast deadline exceeded");
        }
    }

    fn peer_clients(&self) -> Vec<Arc<PeerClient>> {
        self.peers
            .read()
            .values()
            .map(|entry| Arc::clone(&entry.client))
            .collect()
    }

    // -- Validator ------------------------------------------------------------

    async fn validator_loop(
        self: Arc<Self>,
        producer: BlockProducer,
        mut shutdown: watch::Receiver<bool>,
    ) {
        let mut ticker = tokio::time::interval(BLOCK_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval = ?BLOCK_INTERVAL, "validator loop running");

        loop {
            tokio::select! {
                _ = ticker.tick() => match producer.produce_tick() {
                    Ok(Some(block)) => {
                        let node = Arc::clone(&self);
                        tokio::spawn(async move { node.broadcast_block(block).await });
                    }
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "block production failed"),
                },
                _ = shutdown.changed() => {
                    info!("validator loop stopping");
                    break;
                }
            }
        }
    }
}
