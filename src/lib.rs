//! StakeChain - a hash-chained ledger with stake-weighted block production
//!
//! # Architecture
//!
//! ## Core Ledger
//! - [`blockchain`] - Blocks, the ledger, its state and integrity checks
//! - [`transaction`] - Transaction types, signing and validation
//! - [`shared`] - Lock-guarded handle for concurrent use
//!
//! ## Cryptography
//! - [`sha256`] - SHA-256 used for block identity and signing digests
//! - [`crypto`] - secp256k1 keys, signatures and the key manager
//!
//! ## Configuration & Utilities
//! - [`config`] - Configuration management
//! - [`logging`] - Tracing subscriber setup
//! - [`error`] - Error types

#![forbid(unsafe_code)]

// ============================================================================
// Core Ledger
// ============================================================================
pub mod blockchain;
pub mod shared;
pub mod transaction;

// ============================================================================
// Cryptography
// ============================================================================
pub mod crypto;
pub mod sha256;

// ============================================================================
// Configuration & Utilities
// ============================================================================
pub mod config;
pub mod error;
pub mod logging;

pub use blockchain::{Block, ChainSnapshot, Ledger};
pub use error::{ChainError, Result};
pub use shared::SharedLedger;
pub use transaction::Transaction;
