use crate::blockchain::core::block::Block;
use crate::blockchain::core::state::{SpentSet, StakeRegistry, TransactionPool};
use crate::blockchain::core::validation::{
    validate_block_linkage, validate_chain_linkage, validate_validator_eligibility,
};
use crate::config::LedgerConfig;
use crate::error::{ChainError, Result};
use crate::transaction::{Amount, Transaction};
use rand::rngs::StdRng;
use rand::{Rng, RngCore, SeedableRng};
use tracing::{debug, info, warn};

/// An append-only chain of blocks with a pending pool and a stake registry.
///
/// Block producers are drawn from the registry with probability proportional
/// to stake. Every mutation goes through `&mut self`; wrap the ledger in
/// [`crate::shared::SharedLedger`] to use it from several threads.
pub struct Ledger {
    pub(crate) chain: Vec<Block>,
    pub(crate) pool: TransactionPool,
    pub(crate) stakes: StakeRegistry,
    pub(crate) spent: SpentSet,
    config: LedgerConfig,
    rng: Box<dyn RngCore + Send>,
}

impl std::fmt::Debug for Ledger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ledger")
            .field("height", &self.chain.len())
            .field("pending", &self.pool.len())
            .field("validators", &self.stakes.validators().len())
            .field("config", &self.config)
            .finish()
    }
}

impl Ledger {
    /// Creates a ledger holding only the genesis block.
    ///
    /// The lottery is seeded from `config.rng_seed` when set, from OS entropy otherwise.
    pub fn new(config: LedgerConfig) -> Result<Self> {
        let rng: Box<dyn RngCore + Send> = match config.rng_seed {
            Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
            None => Box::new(StdRng::from_entropy()),
        };
        Self::with_rng(config, rng)
    }

    /// Creates a ledger that draws validators from the supplied randomness source.
    pub fn with_rng(config: LedgerConfig, rng: Box<dyn RngCore + Send>) -> Result<Self> {
        Ok(Ledger {
            chain: vec![Block::create_genesis_block()?],
            pool: TransactionPool::new(),
            stakes: StakeRegistry::new(),
            spent: SpentSet::new(),
            config,
            rng,
        })
    }

    pub(crate) fn from_parts(
        chain: Vec<Block>,
        pool: TransactionPool,
        stakes: StakeRegistry,
        config: LedgerConfig,
    ) -> Result<Self> {
        match chain.first() {
            Some(first) if first.index == 0 => {}
            Some(first) => {
                return Err(ChainError::InvalidBlock(format!(
                    "Chain must start at index 0, but starts at {}.",
                    first.index
                )))
            }
            None => {
                return Err(ChainError::InvalidBlock(
                    "Chain must contain a genesis block.".to_string(),
                ))
            }
        }

        let mut spent = SpentSet::new();
        let admitted = chain
            .iter()
            .flat_map(|block| block.pooled_transactions().iter())
            .chain(pool.transactions().iter());
        for tx in admitted {
            spent.insert(tx);
        }

        let mut ledger = Self::new(config)?;
        ledger.chain = chain;
        ledger.pool = pool;
        ledger.stakes = stakes;
        ledger.spent = spent;
        Ok(ledger)
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    /// Always false: a ledger holds at least its genesis block.
    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn latest_block(&self) -> &Block {
        // `chain` is never empty: constructors install a genesis block and blocks are only appended.
        &self.chain[self.chain.len() - 1]
    }

    pub fn pending_transactions(&self) -> &[Transaction] {
        self.pool.transactions()
    }

    pub fn stakes(&self) -> &StakeRegistry {
        &self.stakes
    }

    /// Admits a transaction to the pool if it is valid and not a resubmission.
    pub fn add_transaction(&mut self, tx: Transaction) -> Result<()> {
        if let Err(e) = tx.validate() {
            warn!(sender = %tx.sender, recipient = %tx.recipient, error = %e, "rejected transaction");
            return Err(e);
        }

        if self.spent.contains(&tx) {
            let err = ChainError::DoubleSpendDetected(format!(
                "{} -> {} ({}) was already admitted",
                tx.sender, tx.recipient, tx.amount
            ));
            warn!(error = %err, "rejected transaction");
            return Err(err);
        }

        self.spent.insert(&tx);
        self.pool.push(tx);
        debug!(pending = self.pool.len(), "transaction admitted");
        Ok(())
    }

    pub fn stake(&mut self, identity: &str, amount: Amount) -> Result<()> {
        self.stakes.stake(identity, amount)?;
        debug!(identity, amount, total = self.stakes.total(), "stake recorded");
        Ok(())
    }

    /// Draws a block producer with probability proportional to stake.
    /// Returns `None` when nothing is staked.
    pub fn select_validator(&mut self) -> Option<String> {
        let total = self.stakes.total();
        if total == 0 {
            return None;
        }
        let draw = self.rng.gen_range(0..total);
        let selected = self.stakes.validator_for_draw(draw).map(str::to_string);
        debug!(draw, total, validator = ?selected, "validator selected");
        selected
    }

    /// Produces the next block from the pending pool plus a reward for the
    /// selected validator.
    ///
    /// The pool is only cleared once the block is appended; on any error the
    /// ledger is left exactly as it was.
    pub fn mine_block(&mut self) -> Result<Block> {
        let validator = match self.select_validator() {
            Some(v) => v,
            None => {
                warn!("no validators available");
                return Err(ChainError::NoValidatorAvailable);
            }
        };

        let mut transactions = self.pool.transactions().to_vec();
        transactions.push(Transaction::reward(
            validator.as_str(),
            self.config.block_reward,
        ));

        let block = Block::create_new_block(self.latest_block(), transactions, validator)?;
        if let Err(e) = self.validate_block(&block, self.latest_block()) {
            warn!(index = block.index, error = %e, "candidate block rejected");
            return Err(e);
        }

        info!(
            index = block.index,
            hash = %block.hash,
            validator = %block.validator,
            transactions = block.transactions.len(),
            "block added"
        );
        self.chain.push(block.clone());
        self.pool.clear();
        Ok(block)
    }

    /// Applies the acceptance rule for `block` as the successor of `previous_block`.
    pub fn validate_block(&self, block: &Block, previous_block: &Block) -> Result<()> {
        validate_block_linkage(block, previous_block)?;
        if self.config.require_registered_validator {
            validate_validator_eligibility(block, &self.stakes)?;
        }
        Ok(())
    }

    pub fn is_block_valid(&self, block: &Block, previous_block: &Block) -> bool {
        self.validate_block(block, previous_block).is_ok()
    }

    pub fn validate_chain(&self) -> Result<()> {
        if self.config.require_registered_validator {
            for block in self.chain.iter().skip(1) {
                validate_validator_eligibility(block, &self.stakes)?;
            }
        }
        validate_chain_linkage(&self.chain)
    }

    pub fn is_chain_valid(&self) -> bool {
        self.validate_chain().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;

    fn seeded_ledger(seed: u64) -> Ledger {
        Ledger::with_rng(LedgerConfig::default(), Box::new(StdRng::seed_from_u64(seed))).unwrap()
    }

    fn signed(keypair: &KeyPair, recipient: &str, amount: Amount) -> Transaction {
        let mut tx = Transaction::new(keypair.public_key_hex(), recipient, amount);
        tx.sign(keypair).unwrap();
        tx
    }

    #[test]
    fn test_new_ledger_holds_genesis() {
        let ledger = seeded_ledger(1);
        assert_eq!(ledger.len(), 1);
        assert!(!ledger.is_empty());
        assert!(ledger.latest_block().is_genesis());
        assert!(ledger.pending_transactions().is_empty());
        assert!(ledger.is_chain_valid());
    }

    #[test]
    fn test_add_valid_transaction() {
        let mut ledger = seeded_ledger(1);
        let keypair = KeyPair::generate();
        ledger.add_transaction(signed(&keypair, "bob", 10)).unwrap();
        assert_eq!(ledger.pending_transactions().len(), 1);
    }

    #[test]
    fn test_unsigned_transaction_rejected() {
        let mut ledger = seeded_ledger(1);
        let keypair = KeyPair::generate();
        let tx = Transaction::new(keypair.public_key_hex(), "bob", 10);
        assert!(matches!(
            ledger.add_transaction(tx),
            Err(ChainError::InvalidTransaction(_))
        ));
        assert!(ledger.pending_transactions().is_empty());
    }

    #[test]
    fn test_malformed_sender_surfaces_decode_error() {
        let mut ledger = seeded_ledger(1);
        let mut tx = Transaction::new("xyz", "bob", 10);
        tx.signature = Some("00".repeat(64));
        assert!(matches!(
            ledger.add_transaction(tx),
            Err(ChainError::DecodeError(_))
        ));
    }

    #[test]
    fn test_resubmission_rejected_as_double_spend() {
        let mut ledger = seeded_ledger(1);
        let keypair = KeyPair::generate();
        let tx = signed(&keypair, "bob", 10);
        ledger.add_transaction(tx.clone()).unwrap();

        let resigned = signed(&keypair, "bob", 10);
        assert!(matches!(
            ledger.add_transaction(resigned),
            Err(ChainError::DoubleSpendDetected(_))
        ));
        assert!(matches!(
            ledger.add_transaction(tx),
            Err(ChainError::DoubleSpendDetected(_))
        ));
        assert_eq!(ledger.pending_transactions().len(), 1);
    }

    #[test]
    fn test_double_spend_detected_after_mining() {
        let mut ledger = seeded_ledger(1);
        let keypair = KeyPair::generate();
        ledger.stake("v", 1).unwrap();
        ledger.add_transaction(signed(&keypair, "bob", 10)).unwrap();
        ledger.mine_block().unwrap();

        assert!(matches!(
            ledger.add_transaction(signed(&keypair, "bob", 10)),
            Err(ChainError::DoubleSpendDetected(_))
        ));
    }

    #[test]
    fn test_select_validator_without_stake() {
        let mut ledger = seeded_ledger(1);
        assert_eq!(ledger.select_validator(), None);
        ledger.stake("idle", 0).unwrap();
        assert_eq!(ledger.select_validator(), None);
    }

    #[test]
    fn test_single_staker_always_selected() {
        let mut ledger = seeded_ledger(3);
        ledger.stake("zero", 0).unwrap();
        ledger.stake("solo", 7).unwrap();
        for _ in 0..100 {
            assert_eq!(ledger.select_validator().as_deref(), Some("solo"));
        }
    }

    #[test]
    fn test_selection_frequency_tracks_stake() {
        let mut ledger = seeded_ledger(2024);
        ledger.stake("A", 90).unwrap();
        ledger.stake("B", 10).unwrap();

        let draws = 20_000;
        let wins_a = (0..draws)
            .filter(|_| ledger.select_validator().as_deref() == Some("A"))
            .count();
        let frequency = wins_a as f64 / draws as f64;
        assert!((frequency - 0.9).abs() < 0.01, "frequency was {}", frequency);
    }

    #[test]
    fn test_same_seed_same_selection_sequence() {
        let run = |seed| {
            let mut ledger = seeded_ledger(seed);
            ledger.stake("a", 1).unwrap();
            ledger.stake("b", 1).unwrap();
            ledger.stake("c", 1).unwrap();
            (0..50).map(|_| ledger.select_validator()).collect::<Vec<_>>()
        };
        assert_eq!(run(9), run(9));
    }

    #[test]
    fn test_mine_block_appends_and_clears_pool() {
        let mut ledger = seeded_ledger(1);
        let keypair = KeyPair::generate();
        ledger.stake("v", 100).unwrap();
        ledger.add_transaction(signed(&keypair, "bob", 10)).unwrap();

        let block = ledger.mine_block().unwrap();
        assert_eq!(ledger.len(), 2);
        assert_eq!(ledger.latest_block(), &block);
        assert_eq!(block.validator, "v");
        assert_eq!(block.transactions.len(), 2);

        let reward = block.transactions.last().unwrap();
        assert!(reward.is_reward());
        assert_eq!(reward.recipient, "v");
        assert_eq!(reward.amount, 1);
        assert!(ledger.pending_transactions().is_empty());
        assert!(ledger.is_chain_valid());
    }

    #[test]
    fn test_mine_block_uses_configured_reward() {
        let config = LedgerConfig {
            block_reward: 25,
            rng_seed: Some(5),
            ..LedgerConfig::default()
        };
        let mut ledger = Ledger::new(config).unwrap();
        ledger.stake("v", 1).unwrap();
        let block = ledger.mine_block().unwrap();
        assert_eq!(block.transactions[0].amount, 25);
    }

    #[test]
    fn test_mine_without_validator_leaves_state_untouched() {
        let mut ledger = seeded_ledger(1);
        let keypair = KeyPair::generate();
        ledger.add_transaction(signed(&keypair, "bob", 10)).unwrap();

        assert_eq!(ledger.mine_block(), Err(ChainError::NoValidatorAvailable));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.pending_transactions().len(), 1);
        assert!(!ledger.pending_transactions()[0].is_reward());
    }

    #[test]
    fn test_tampering_any_field_invalidates_chain() {
        let mut ledger = seeded_ledger(11);
        let keypair = KeyPair::generate();
        ledger.stake("v", 1).unwrap();
        ledger.add_transaction(signed(&keypair, "bob", 10)).unwrap();
        ledger.mine_block().unwrap();
        ledger.mine_block().unwrap();
        assert!(ledger.is_chain_valid());

        let pristine = ledger.chain.clone();
        let tamperings: Vec<Box<dyn Fn(&mut Block)>> = vec![
            Box::new(|b: &mut Block| b.transactions[0].amount += 1),
            Box::new(|b: &mut Block| b.timestamp += 1),
            Box::new(|b: &mut Block| b.hash = "0".repeat(64)),
            Box::new(|b: &mut Block| b.previous_hash = "1".repeat(64)),
        ];
        for tamper in &tamperings {
            for i in 1..pristine.len() {
                ledger.chain = pristine.clone();
                tamper(&mut ledger.chain[i]);
                assert!(!ledger.is_chain_valid(), "tampering block {} went unnoticed", i);
            }
        }
    }

    #[test]
    fn test_eligibility_policy() {
        let mut ledger = seeded_ledger(1);
        let genesis = ledger.latest_block().clone();
        let outsider = Block::create_new_block(&genesis, Vec::new(), "outsider").unwrap();
        assert!(ledger.is_block_valid(&outsider, &genesis));

        let config = LedgerConfig {
            require_registered_validator: true,
            ..LedgerConfig::default()
        };
        let mut strict = Ledger::with_rng(config, Box::new(StdRng::seed_from_u64(1))).unwrap();
        assert!(!strict.is_block_valid(&outsider, &genesis));

        strict.stake("v", 5).unwrap();
        strict.mine_block().unwrap();
        assert!(strict.is_chain_valid());

        ledger.stake("v", 5).unwrap();
        ledger.mine_block().unwrap();
        ledger.chain[1].validator = "outsider".to_string();
        // Validator is not part of the hash, so only the strict policy notices.
        assert!(ledger.is_chain_valid());
        strict.chain[1].validator = "outsider".to_string();
        assert!(!strict.is_chain_valid());
    }
}
