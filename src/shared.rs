//! Thread-safe handle to a single ledger.
//!
//! All operations take one exclusive lock for their whole duration, so block
//! production (select, build, validate, append, clear) never interleaves with
//! another submitter.

use crate::blockchain::{Block, ChainSnapshot, Ledger};
use crate::error::Result;
use crate::transaction::{Amount, Transaction};
use parking_lot::Mutex;
use std::sync::Arc;

#[derive(Clone)]
pub struct SharedLedger {
    inner: Arc<Mutex<Ledger>>,
}

impl SharedLedger {
    pub fn new(ledger: Ledger) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    pub fn add_transaction(&self, tx: Transaction) -> Result<()> {
        self.inner.lock().add_transaction(tx)
    }

    pub fn stake(&self, identity: &str, amount: Amount) -> Result<()> {
        self.inner.lock().stake(identity, amount)
    }

    pub fn mine_block(&self) -> Result<Block> {
        self.inner.lock().mine_block()
    }

    pub fn is_chain_valid(&self) -> bool {
        self.inner.lock().is_chain_valid()
    }

    pub fn chain_len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn pending_len(&self) -> usize {
        self.inner.lock().pending_transactions().len()
    }

    pub fn snapshot(&self) -> ChainSnapshot {
        self.inner.lock().to_snapshot()
    }

    /// Runs `f` with exclusive access to the ledger.
    pub fn with_ledger<T>(&self, f: impl FnOnce(&mut Ledger) -> T) -> T {
        let mut ledger = self.inner.lock();
        f(&mut *ledger)
    }
}

impl std::fmt::Debug for SharedLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedLedger")
            .field("ledger", &*self.inner.lock())
            .finish()
    }
}
