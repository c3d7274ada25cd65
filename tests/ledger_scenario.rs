//! Integration tests for staking, transaction admission and block production

use stakechain::blockchain::{Block, Ledger};
use stakechain::config::LedgerConfig;
use stakechain::crypto::KeyManager;
use stakechain::error::ChainError;
use stakechain::sha256::Sha256;
use stakechain::transaction::Transaction;

fn seeded_config(seed: u64) -> LedgerConfig {
    LedgerConfig {
        rng_seed: Some(seed),
        ..LedgerConfig::default()
    }
}

/// Helper to build a transfer signed by a key held in `keys`
fn signed_transfer(
    keys: &KeyManager,
    sender: &str,
    recipient: &str,
    amount: u64,
) -> Result<Transaction, Box<dyn std::error::Error>> {
    let secret = keys.get_private_key(sender).ok_or("unknown sender")?;
    let mut tx = Transaction::new(sender, recipient, amount);
    tx.sign_with_secret_hex(&secret)?;
    Ok(tx)
}

#[test]
fn test_reference_digests() {
    assert_eq!(
        Sha256::hash(""),
        "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
    assert_eq!(
        Sha256::hash("abc"),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn test_stake_submit_and_produce_five_blocks() -> Result<(), Box<dyn std::error::Error>> {
    let mut keys = KeyManager::new();
    let (validator, _) = keys.generate_key_pair();

    let mut ledger = Ledger::new(seeded_config(1))?;
    ledger.stake(&validator, 100)?;

    for i in 0..5u64 {
        let tx = signed_transfer(&keys, &validator, &format!("recipient_address_{}", i), 10 + i)?;
        ledger.add_transaction(tx)?;
    }
    assert_eq!(ledger.pending_transactions().len(), 5);

    let mut expected_pool: Vec<Transaction> = ledger.pending_transactions().to_vec();
    for round in 0..5 {
        let block = ledger.mine_block()?;
        assert_eq!(block.index, round + 1);
        assert_eq!(block.validator, validator);

        let (reward, transfers) = block.transactions.split_last().ok_or("empty block")?;
        assert_eq!(transfers, expected_pool.as_slice());
        assert!(reward.is_reward());
        assert_eq!(reward.recipient, validator);
        assert_eq!(reward.amount, 1);

        assert!(ledger.pending_transactions().is_empty());
        assert!(ledger.is_chain_valid());
        expected_pool.clear();
    }

    let chain = ledger.chain();
    assert_eq!(chain.len(), 6);
    assert!(chain[0].is_genesis());
    for pair in chain.windows(2) {
        assert_eq!(pair[1].previous_hash, pair[0].hash);
        assert_eq!(pair[1].index, pair[0].index + 1);
        assert_eq!(
            pair[1].hash,
            Block::calculate_hash(
                pair[1].index,
                &pair[1].previous_hash,
                pair[1].timestamp,
                &pair[1].transactions
            )?
        );
    }
    Ok(())
}

#[test]
fn test_resubmitted_transfer_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let mut keys = KeyManager::new();
    let (alice, _) = keys.generate_key_pair();
    let mut ledger = Ledger::new(seeded_config(2))?;

    ledger.add_transaction(signed_transfer(&keys, &alice, "bob", 7)?)?;
    let again = signed_transfer(&keys, &alice, "bob", 7)?;
    assert!(matches!(
        ledger.add_transaction(again),
        Err(ChainError::DoubleSpendDetected(_))
    ));

    ledger.add_transaction(signed_transfer(&keys, &alice, "bob", 8)?)?;
    assert_eq!(ledger.pending_transactions().len(), 2);
    Ok(())
}

#[test]
fn test_block_production_without_stake_fails_cleanly() -> Result<(), Box<dyn std::error::Error>> {
    let mut keys = KeyManager::new();
    let (alice, _) = keys.generate_key_pair();
    let mut ledger = Ledger::new(seeded_config(3))?;
    ledger.add_transaction(signed_transfer(&keys, &alice, "bob", 1)?)?;

    assert!(matches!(
        ledger.mine_block(),
        Err(ChainError::NoValidatorAvailable)
    ));
    assert_eq!(ledger.len(), 1);
    assert_eq!(ledger.pending_transactions().len(), 1);
    Ok(())
}

#[test]
fn test_weighted_lottery_frequency() -> Result<(), Box<dyn std::error::Error>> {
    let mut ledger = Ledger::new(seeded_config(4))?;
    ledger.stake("A", 90)?;
    ledger.stake("B", 10)?;

    let draws = 10_000;
    let mut wins_a = 0;
    for _ in 0..draws {
        match ledger.select_validator().as_deref() {
            Some("A") => wins_a += 1,
            Some("B") => {}
            other => panic!("unexpected selection {:?}", other),
        }
    }
    let frequency = wins_a as f64 / draws as f64;
    assert!((frequency - 0.9).abs() < 0.015, "frequency was {}", frequency);
    Ok(())
}

#[test]
fn test_snapshot_tampering_is_detected() -> Result<(), Box<dyn std::error::Error>> {
    let mut keys = KeyManager::new();
    let (validator, _) = keys.generate_key_pair();
    let mut ledger = Ledger::new(seeded_config(5))?;
    ledger.stake(&validator, 10)?;
    ledger.add_transaction(signed_transfer(&keys, &validator, "bob", 3)?)?;
    ledger.mine_block()?;
    ledger.mine_block()?;

    let json = ledger.to_json()?;
    let restored = Ledger::from_json(&json, seeded_config(5))?;
    assert!(restored.is_chain_valid());
    assert_eq!(restored.chain(), ledger.chain());

    let mutations: [fn(&mut Block); 4] = [
        |b| b.transactions[0].amount += 1,
        |b| b.timestamp -= 1,
        |b| b.hash = Sha256::hash("forged"),
        |b| b.previous_hash = Sha256::hash("elsewhere"),
    ];
    for mutate in mutations {
        for index in 1..ledger.len() {
            let mut snapshot = ledger.to_snapshot();
            mutate(&mut snapshot.chain[index]);
            let tampered = Ledger::from_snapshot(snapshot, seeded_config(5))?;
            assert!(!tampered.is_chain_valid(), "mutation at block {} passed", index);
        }
    }
    Ok(())
}
