use crate::error::{ChainError, Result};
use crate::transaction::{Amount, SpendKey, Transaction};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Stake held by each validator, plus the order in which validators first staked.
///
/// Serializes as a `{identity: stake}` object whose keys follow first-staked
/// order, so a reloaded registry walks the lottery exactly as before.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StakeRegistry {
    stakes: HashMap<String, Amount>,
    validators: Vec<String>,
}

impl StakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `amount` to `identity`'s stake, registering it on first use.
    pub fn stake(&mut self, identity: &str, amount: Amount) -> Result<()> {
        self.total().checked_add(amount).ok_or_else(|| {
            ChainError::InvalidStake(format!(
                "Staking {} for {} would overflow the total stake",
                amount, identity
            ))
        })?;

        match self.stakes.get_mut(identity) {
            Some(existing) => *existing += amount,
            None => {
                self.stakes.insert(identity.to_string(), amount);
                self.validators.push(identity.to_string());
            }
        }
        Ok(())
    }

    pub fn stake_of(&self, identity: &str) -> Amount {
        self.stakes.get(identity).copied().unwrap_or(0)
    }

    pub fn contains(&self, identity: &str) -> bool {
        self.stakes.contains_key(identity)
    }

    /// Registry never admits a total above `u64::MAX`.
    pub fn total(&self) -> Amount {
        self.stakes.values().sum()
    }

    /// Validators in first-staked order.
    pub fn validators(&self) -> &[String] {
        &self.validators
    }

    /// `(identity, stake)` pairs in first-staked order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, Amount)> + '_ {
        self.validators
            .iter()
            .map(move |v| (v.as_str(), self.stake_of(v)))
    }

    /// Returns the validator whose cumulative stake range contains `draw`.
    ///
    /// `draw` must be below [`StakeRegistry::total`]; the first validator whose
    /// running sum exceeds it wins.
    pub fn validator_for_draw(&self, draw: Amount) -> Option<&str> {
        let mut cumulative: Amount = 0;
        for (validator, stake) in self.iter() {
            cumulative += stake;
            if cumulative > draw {
                return Some(validator);
            }
        }
        None
    }
}

impl Serialize for StakeRegistry {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.validators.len()))?;
        for (identity, stake) in self.iter() {
            map.serialize_entry(identity, &stake)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for StakeRegistry {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct StakeRegistryVisitor;

        impl<'de> Visitor<'de> for StakeRegistryVisitor {
            type Value = StakeRegistry;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a map of validator identities to stakes")
            }

            fn visit_map<A>(self, mut map: A) -> std::result::Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut registry = StakeRegistry::new();
                while let Some((identity, stake)) = map.next_entry::<String, Amount>()? {
                    if registry.contains(&identity) {
                        return Err(de::Error::custom(format!(
                            "duplicate validator {}",
                            identity
                        )));
                    }
                    registry.stake(&identity, stake).map_err(de::Error::custom)?;
                }
                Ok(registry)
            }
        }

        deserializer.deserialize_map(StakeRegistryVisitor)
    }
}

/// Admitted transactions waiting for the next block.
#[derive(Debug, Clone, Default)]
pub struct TransactionPool {
    transactions: Vec<Transaction>,
}

impl TransactionPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, tx: Transaction) {
        self.transactions.push(tx);
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn clear(&mut self) {
        self.transactions.clear();
    }
}

impl From<Vec<Transaction>> for TransactionPool {
    fn from(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }
}

/// Every spend ever admitted to the pool. Grows for the life of the ledger.
#[derive(Debug, Clone, Default)]
pub struct SpentSet {
    spent: HashSet<SpendKey>,
}

impl SpentSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, tx: &Transaction) -> bool {
        self.spent.contains(&tx.spend_key())
    }

    /// Records the spend; returns `false` if it was already present.
    pub fn insert(&mut self, tx: &Transaction) -> bool {
        self.spent.insert(tx.spend_key())
    }

    pub fn len(&self) -> usize {
        self.spent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spent.is_empty()
    }
}
