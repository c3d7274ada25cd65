//! Error types for StakeChain

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainError {
    InvalidBlockLinkage,
    InvalidTransaction(String),
    /// A key or signature could not be decoded (bad hex, wrong length, off-curve).
    DecodeError(String),
    CryptoError(String),
    DoubleSpendDetected(String),
    InvalidStake(String),
    NoValidatorAvailable,
    InvalidBlock(String),
    SerializationError(String),
}

impl fmt::Display for ChainError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ChainError::InvalidBlockLinkage => write!(f, "Invalid block linkage"),
            ChainError::InvalidTransaction(msg) => write!(f, "Invalid transaction: {}", msg),
            ChainError::DecodeError(msg) => write!(f, "Decode error: {}", msg),
            ChainError::CryptoError(msg) => write!(f, "Cryptographic error: {}", msg),
            ChainError::DoubleSpendDetected(msg) => write!(f, "Double spend detected: {}", msg),
            ChainError::InvalidStake(msg) => write!(f, "Invalid stake: {}", msg),
            ChainError::NoValidatorAvailable => write!(f, "No validator available"),
            ChainError::InvalidBlock(msg) => write!(f, "Invalid block: {}", msg),
            ChainError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
        }
    }
}

impl std::error::Error for ChainError {}

impl From<serde_json::Error> for ChainError {
    fn from(err: serde_json::Error) -> Self {
        ChainError::SerializationError(err.to_string())
    }
}

/// Convenience alias used across the crate
pub type Result<T> = std::result::Result<T, ChainError>;
