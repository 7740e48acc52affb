//! End-to-end integration tests for the Strata protocol.
//!
//! These tests exercise the full node stack over real TCP sockets: the
//! handshake and transitive peer discovery, transaction gossip, block
//! production, and block propagation. Each test spins up its own nodes on
//! ephemeral ports (`127.0.0.1:0`) so tests neither collide with each
//! other nor depend on free well-known ports.
//!
//! Network convergence is asynchronous, so assertions poll with a bounded
//! deadline instead of sleeping a fixed "surely long enough" interval.

use std::sync::Arc;
use std::time::Duration;

use strata_protocol::config::{GENESIS_AMOUNT, TX_VERSION};
use strata_protocol::crypto::keys::{StrataKeypair, StrataSignature};
use strata_protocol::network::{BlockProducer, Node, NodeConfig, PeerClient};
use strata_protocol::storage::{founder_keypair, genesis_block};
use strata_protocol::transaction::{
    hash_transaction, sign_transaction, Transaction, TxInput, TxOutput,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Poll `condition` every 25 ms until it holds or `deadline` elapses.
async fn wait_until<F>(deadline: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = tokio::time::Instant::now();
    while start.elapsed() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    condition()
}

/// Start a relay node on an ephemeral port, bootstrapped against `peers`.
async fn start_node(peers: Vec<String>) -> Arc<Node> {
    let node = Node::new(NodeConfig::new("127.0.0.1:0")).expect("node construction");
    node.start(peers).await.expect("node start");
    node
}

/// A transaction spending the entire genesis output to `recipient`, with
/// change back to the founder.
fn founder_payment(recipient: &StrataKeypair, amount: i64) -> Transaction {
    let founder = founder_keypair();
    let genesis_tx_hash = hash_transaction(&genesis_block().transactions[0]);

    let mut tx = Transaction {
        version: TX_VERSION,
        inputs: vec![TxInput {
            prev_tx_hash: genesis_tx_hash,
            prev_tx_out_index: 0,
            public_key: founder.public_key(),
            signature: StrataSignature::empty(),
        }],
        outputs: vec![
            TxOutput {
                amount,
                address: recipient.address(),
            },
            TxOutput {
                amount: GENESIS_AMOUNT - amount,
                address: founder.address(),
            },
        ],
    };
    let sig = sign_transaction(&founder, &tx);
    tx.inputs[0].signature = sig;
    tx
}

// ---------------------------------------------------------------------------
// Peer discovery
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread")]
async fn transitive_discovery_converges() {
    // B bootstraps against A, C bootstraps against B. Nobody tells C about
    // A directly — the handshake's peer list does.
    let a = start_node(vec![]).await;
    let b = start_node(vec![a.listen_addr()]).await;
    let c = start_node(vec![b.listen_addr()]).await;

    let (a_addr, c_addr) = (a.listen_addr(), c.listen_addr());

    let converged = wait_until(Duration::from_secs(5), || {
        c.peer_addrs().contains(&a_addr) && a.peer_addrs().contains(&c_addr)
    })
    .await;

    assert!(converged, "transitive discovery did not converge within 5s");

    // The direct edges exist too.
    assert!(a.peer_addrs().contains(&b.listen_addr()));
    assert!(b.peer_addrs().contains(&a.listen_addr()));
    assert!(b.peer_addrs().contains(&c.listen_addr()));

    for node in [&a, &b, &c] {
        node.shutdown();
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn version_mismatch_prevents_peering() {
    let a = start_node(vec![]).await;

    let odd = Node::new(NodeConfig::new("127.0.0.1:0").with_version("9.9.9"))
        .expect("node construction");
    odd.start(vec![a.listen_addr()]).await.expect("node start");

    // Give the bootstrap a moment to run and fail.
    let peered = wait_until(Duration::from_millis(750), || !odd.peer_addrs().is_empty()).await;

    assert!(!peered, "mismatched versions must not peer");
    assert!(a.peer_addrs().is_empty());

    a.shutdown();
    odd.shutdown();
}

// ---------------------------------------------------------------------------
// Transaction gossip
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread")]
async fn transaction_gossip_reaches_every_node() {
    let a = start_node(vec![]).await;
    let b = start_node(vec![a.listen_addr()]).await;
    let c = start_node(vec![b.listen_addr()]).await;

    // Wait for the fabric to settle so the fan-out has peers to reach.
    let a_addr = a.listen_addr();
    assert!(
        wait_until(Duration::from_secs(5), || c.peer_addrs().contains(&a_addr)).await,
        "fabric did not converge"
    );

    let recipient = StrataKeypair::generate();
    let tx = founder_payment(&recipient, 1_000);

    // Submit to A like any client would: over the RPC surface.
    let client = PeerClient::connect(&a.listen_addr()).await.expect("dial A");
    client.send_transaction(&tx).await.expect("submit tx");

    let spread = wait_until(Duration::from_secs(5), || {
        a.mempool().has(&tx) && b.mempool().has(&tx) && c.mempool().has(&tx)
    })
    .await;
    assert!(spread, "transaction did not reach every mempool within 5s");

    // Exactly one pending copy per node, no echo storms.
    assert_eq!(a.mempool().size(), 1);
    assert_eq!(b.mempool().size(), 1);
    assert_eq!(c.mempool().size(), 1);

    for node in [&a, &b, &c] {
        node.shutdown();
    }
}

// ---------------------------------------------------------------------------
// Block propagation
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread")]
async fn produced_block_propagates_through_gossip() {
    let a = start_node(vec![]).await;
    let b = start_node(vec![a.listen_addr()]).await;
    let c = start_node(vec![b.listen_addr()]).await;

    let a_addr = a.listen_addr();
    assert!(
        wait_until(Duration::from_secs(5), || c.peer_addrs().contains(&a_addr)).await,
        "fabric did not converge"
    );

    // Mint a block out of A's state, as A's validator tick would.
    let recipient = StrataKeypair::generate();
    let tx = founder_payment(&recipient, 2_500);
    a.mempool().add(tx.clone());
    let producer = BlockProducer::new(
        Arc::clone(a.chain()),
        Arc::clone(a.mempool()),
        StrataKeypair::generate(),
    );
    let block = producer
        .produce_tick()
        .expect("production")
        .expect("a block");
    assert_eq!(a.chain().height(), 1);

    // Hand the block to B over RPC; B accepts and gossips onward. A
    // already holds it and must acknowledge without re-broadcasting.
    let client = PeerClient::connect(&b.listen_addr()).await.expect("dial B");
    client.send_block(&block).await.expect("submit block");

    let spread = wait_until(Duration::from_secs(5), || {
        b.chain().height() == 1 && c.chain().height() == 1
    })
    .await;
    assert!(spread, "block did not reach every chain within 5s");

    // All three agree on the block at height 1.
    let expected = a.chain().get_block_by_height(1).unwrap();
    assert_eq!(b.chain().get_block_by_height(1).unwrap(), expected);
    assert_eq!(c.chain().get_block_by_height(1).unwrap(), expected);
    assert_eq!(expected.transactions, vec![tx]);

    for node in [&a, &b, &c] {
        node.shutdown();
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_block_is_refused_over_rpc() {
    let a = start_node(vec![]).await;

    // A block whose linkage is garbage.
    let mut block = genesis_block();
    block.header.height = 1;
    block.header.prev_hash = [0xEE; 32];
    let founder = founder_keypair();
    strata_protocol::storage::sign_block(&founder, &mut block).expect("sign");

    let client = PeerClient::connect(&a.listen_addr()).await.expect("dial A");
    let err = client.send_block(&block).await.expect_err("must be refused");
    assert!(err.to_string().contains("invalid"));
    assert_eq!(a.chain().height(), 0);

    a.shutdown();
}

// ---------------------------------------------------------------------------
// Full validator lifecycle
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread")]
async fn validator_mints_and_the_network_follows() {
    // A runs the real validator loop; B and C just relay.
    let validator = Node::new(
        NodeConfig::new("127.0.0.1:0").with_validator_key(StrataKeypair::generate()),
    )
    .expect("node construction");
    validator.start(vec![]).await.expect("node start");

    let b = start_node(vec![validator.listen_addr()]).await;
    let c = start_node(vec![b.listen_addr()]).await;

    let v_addr = validator.listen_addr();
    assert!(
        wait_until(Duration::from_secs(5), || c.peer_addrs().contains(&v_addr)).await,
        "fabric did not converge"
    );

    // Submit through C — gossip carries it to the validator, the next tick
    // mints it, and the block gossips back out.
    let recipient = StrataKeypair::generate();
    let tx = founder_payment(&recipient, 5_000);
    let client = PeerClient::connect(&c.listen_addr()).await.expect("dial C");
    client.send_transaction(&tx).await.expect("submit tx");

    // The tick interval is 5s; allow two full ticks of slack.
    let minted = wait_until(Duration::from_secs(15), || {
        validator.chain().height() == 1 && b.chain().height() == 1 && c.chain().height() == 1
    })
    .await;
    assert!(minted, "the network did not reach height 1 within 15s");

    let block = c.chain().get_block_by_height(1).unwrap();
    assert_eq!(block.transactions, vec![tx]);

    for node in [&validator, &b, &c] {
        node.shutdown();
    }
}
