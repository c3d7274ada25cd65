// Thin re-export module: implementation is in `blockchain/core.rs`, split into
// blocks, the ledger itself, its state containers, integrity checks, and
// snapshots.

pub mod core;
pub use self::core::*;
