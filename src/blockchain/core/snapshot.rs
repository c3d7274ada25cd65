use crate::blockchain::core::block::Block;
use crate::blockchain::core::chain::Ledger;
use crate::blockchain::core::state::{StakeRegistry, TransactionPool};
use crate::config::LedgerConfig;
use crate::error::Result;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};

/// Plain-data form of a ledger: `{chain, transaction_pool, stakes}`.
///
/// `stakes` is an object keyed by validator in first-staked order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub chain: Vec<Block>,
    pub transaction_pool: Vec<Transaction>,
    pub stakes: StakeRegistry,
}

impl Ledger {
    pub fn to_snapshot(&self) -> ChainSnapshot {
        ChainSnapshot {
            chain: self.chain.clone(),
            transaction_pool: self.pool.transactions().to_vec(),
            stakes: self.stakes.clone(),
        }
    }

    /// Rebuilds a ledger from a snapshot without re-validating its blocks;
    /// call [`Ledger::validate_chain`] to audit an untrusted snapshot.
    pub fn from_snapshot(snapshot: ChainSnapshot, config: LedgerConfig) -> Result<Self> {
        Ledger::from_parts(
            snapshot.chain,
            TransactionPool::from(snapshot.transaction_pool),
            snapshot.stakes,
            config,
        )
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_snapshot())?)
    }

    pub fn from_json(json: &str, config: LedgerConfig) -> Result<Self> {
        let snapshot: ChainSnapshot = serde_json::from_str(json)?;
        Self::from_snapshot(snapshot, config)
    }
}
