//! # CLI Interface
//!
//! Defines the command-line argument structure for `strata-node` using
//! `clap` derive. Supports three subcommands: `run`, `demo`, and `keygen`.

use clap::{Parser, Subcommand};

use strata_protocol::config::DEFAULT_P2P_PORT;

fn default_listen_addr() -> String {
    format!("127.0.0.1:{DEFAULT_P2P_PORT}")
}

/// Strata blockchain node.
///
/// A peer-to-peer UTXO ledger node. Accepts signed transactions, gossips
/// them to known peers, and — when started with a validator seed — mints
/// new blocks from the pending set on a fixed tick.
#[derive(Parser, Debug)]
#[command(
    name = "strata-node",
    about = "Strata blockchain node",
    version,
    propagate_version = true
)]
pub struct StrataNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the Strata node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start a node.
    Run(RunArgs),
    /// Spin up a local cluster of interconnected nodes. Demo only.
    Demo(DemoArgs),
    /// Generate a fresh keypair and print the seed and address.
    Keygen,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Address to listen on for peer connections.
    #[arg(long, env = "STRATA_LISTEN", default_value_t = default_listen_addr())]
    pub listen: String,

    /// Peer addresses to bootstrap against. Repeatable.
    #[arg(long = "bootstrap", env = "STRATA_BOOTSTRAP", value_delimiter = ',')]
    pub bootstrap: Vec<String>,

    /// Hex-encoded 32-byte validator seed. When set, this node mints
    /// blocks.
    ///
    /// **Never pass this flag in production** — use the environment
    /// variable, or better, a secrets manager writing the environment.
    #[arg(long, env = "STRATA_VALIDATOR_SEED")]
    pub validator_seed: Option<String>,

    /// Log output format: "pretty" or "json".
    #[arg(long, env = "STRATA_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}

/// Arguments for the `demo` subcommand.
#[derive(Parser, Debug)]
pub struct DemoArgs {
    /// Number of nodes to launch. The first is the validator.
    #[arg(long, default_value_t = 3)]
    pub node_count: usize,

    /// First listen port; node `i` listens on `base_port + i`.
    #[arg(long, default_value_t = DEFAULT_P2P_PORT)]
    pub base_port: u16,

    /// Log output format: "pretty" or "json".
    #[arg(long, env = "STRATA_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        // Ensures the derive macros produce a valid CLI definition.
        StrataNodeCli::command().debug_assert();
    }
}
