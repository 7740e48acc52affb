// Copyright (c) 2026 Strata Contributors. MIT License.
// See LICENSE for details.

//! # Strata Node
//!
//! Entry point for the `strata-node` binary. Parses CLI arguments,
//! initializes logging, and hands off to the protocol crate's node
//! runtime.
//!
//! The binary supports three subcommands:
//!
//! - `run`    — start a node (a validator, when given a seed)
//! - `demo`   — launch a small local cluster, first node validating
//! - `keygen` — generate a keypair and print the seed and address

mod cli;
mod logging;

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tracing::info;

use strata_protocol::crypto::keys::StrataKeypair;
use strata_protocol::network::{Node, NodeConfig};

use cli::{Commands, DemoArgs, RunArgs, StrataNodeCli};
use logging::{init_logging, LogFormat};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = StrataNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Demo(args) => run_demo(args).await,
        Commands::Keygen => keygen(),
    }
}

/// Start a single node and serve until interrupted.
async fn run_node(args: RunArgs) -> Result<()> {
    init_logging("info", LogFormat::from_str_lossy(&args.log_format));

    let mut config = NodeConfig::new(&args.listen);
    if let Some(seed) = &args.validator_seed {
        let keypair = StrataKeypair::from_hex(seed).context("invalid validator seed")?;
        info!(address = %keypair.address(), "running as validator");
        config = config.with_validator_key(keypair);
    }

    let node = Node::new(config)?;
    node.start(args.bootstrap).await?;

    signal::ctrl_c().await.context("waiting for shutdown signal")?;
    info!("shutting down");
    node.shutdown();
    Ok(())
}

/// Launch `node_count` interconnected nodes on consecutive ports. The
/// first node validates; every later node bootstraps against all earlier
/// ones, which gives transitive discovery something to chew on even if a
/// bootstrap address is slow to come up.
async fn run_demo(args: DemoArgs) -> Result<()> {
    init_logging("info", LogFormat::from_str_lossy(&args.log_format));

    let mut nodes: Vec<Arc<Node>> = Vec::with_capacity(args.node_count);
    let mut addrs: Vec<String> = Vec::with_capacity(args.node_count);

    for i in 0..args.node_count {
        let listen = format!(
            "127.0.0.1:{}",
            args.base_port
                .checked_add(i as u16)
                .context("base port too high for the requested node count")?
        );

        let mut config = NodeConfig::new(&listen);
        if i == 0 {
            config = config.with_validator_key(StrataKeypair::generate());
        }

        let node = Node::new(config)?;
        node.start(addrs.clone()).await?;
        addrs.push(node.listen_addr());
        nodes.push(node);
    }

    info!(nodes = nodes.len(), "demo cluster running; ctrl-c to stop");
    signal::ctrl_c().await.context("waiting for shutdown signal")?;

    for node in &nodes {
        node.shutdown();
    }
    Ok(())
}

/// Generate a keypair and print the seed and derived address to stdout.
fn keygen() -> Result<()> {
    let keypair = StrataKeypair::generate();
    println!("seed:    {}", hex::encode(keypair.seed_bytes()));
    println!("address: {}", keypair.address());
    Ok(())
}
