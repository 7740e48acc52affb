// Copyright (c) 2026 Strata Contributors. MIT License.
// See LICENSE for details.

//! # Strata Protocol — Core Library
//!
//! The beating heart of Strata: a peer-to-peer UTXO ledger in the Bitcoin
//! tradition, minus the parts nobody needs for a single-validator devnet.
//!
//! Strata takes a pragmatic stance: Ed25519 for signatures (because we're
//! not barbarians), SHA-256 for hashing (because chain interop still speaks
//! SHA-256), and a canonical bincode encoding for everything that gets
//! hashed or put on the wire (because "deterministic" is not optional when
//! two machines must agree on a block hash).
//!
//! ## Architecture
//!
//! The protocol is split into modules that mirror the actual concerns of a
//! ledger node:
//!
//! - **crypto** — Ed25519 keys, signatures, addresses, SHA-256, Merkle roots.
//! - **transaction** — UTXO transaction model, hashing, signing, verification.
//! - **storage** — Blocks, the store abstractions, and the chain itself.
//! - **network** — Mempool, peer fabric, gossip, and block production.
//! - **config** — Protocol constants and network parameters.
//!
//! ## Design Philosophy
//!
//! 1. Correctness over performance (but we're still fast).
//! 2. Validation failures never mutate state. Ever.
//! 3. Transport failures never kill the node — log, shrug, carry on with
//!    fewer peers.
//! 4. If it touches money, it has tests. Plural.

pub mod config;
pub mod crypto;
pub mod network;
pub mod storage;
pub mod transaction;
