#![forbid(unsafe_code)]
//! Runs a local proof-of-stake simulation and prints the resulting chain.

use clap::Parser;
use colored::*;
use comfy_table::presets::UTF8_FULL;
use comfy_table::Color as TableColor;
use comfy_table::{Attribute, Cell, ContentArrangement, Table};
use stakechain::blockchain::Ledger;
use stakechain::config::load_config;
use stakechain::crypto::KeyManager;
use stakechain::logging::init_logging;
use stakechain::blockchain::Block;
use stakechain::transaction::Transaction;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML config file; defaults apply when it does not exist
    #[arg(long, default_value = "stakechain.toml")]
    config: PathBuf,
    /// Stake registered for the generated validator
    #[arg(long, default_value_t = 100)]
    stake: u64,
    /// Number of signed transfers submitted before block production
    #[arg(long, default_value_t = 5)]
    transfers: u64,
    /// Number of blocks to produce
    #[arg(long, default_value_t = 5)]
    blocks: u64,
    /// Seed for the validator lottery (overrides the config file)
    #[arg(long)]
    seed: Option<u64>,
    /// Print the ledger snapshot as JSON after the run
    #[arg(long)]
    json: bool,
    /// List every transaction of every block
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(&cli.config)?;
    if cli.seed.is_some() {
        config.ledger.rng_seed = cli.seed;
    }
    init_logging(&config.logging)?;

    let mut key_manager = KeyManager::new();
    let (public_key, _) = key_manager.generate_key_pair();
    let keypair = key_manager
        .keypair(&public_key)
        .ok_or("generated key is missing from the key manager")?;

    let mut ledger = Ledger::new(config.ledger.clone())?;
    ledger.stake(&public_key, cli.stake)?;

    for i in 0..cli.transfers {
        let mut tx = Transaction::new(
            public_key.as_str(),
            format!("recipient_address_{}", i),
            10 + i,
        );
        tx.sign(keypair)?;
        if let Err(e) = ledger.add_transaction(tx) {
            println!("{}", format!("⚠️  Transfer {} rejected: {}", i, e).yellow());
        }
    }

    for _ in 0..cli.blocks {
        if let Err(e) = ledger.mine_block() {
            println!("{}", format!("❌ Block production failed: {}", e).red());
        }
    }

    print_chain(&ledger);
    if cli.verbose {
        for block in ledger.chain() {
            print_block_transactions(block);
        }
    }

    let valid = ledger.is_chain_valid();
    println!();
    if valid {
        println!("{}", "✅ Chain is valid".bright_green().bold());
    } else {
        println!("{}", "❌ Chain is INVALID".bright_red().bold());
    }

    if cli.json {
        println!("{}", ledger.to_json()?);
    }

    Ok(())
}

fn print_chain(ledger: &Ledger) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            ["Index", "Hash", "Previous", "Time", "Txs", "Validator"]
                .into_iter()
                .map(|h| {
                    Cell::new(h)
                        .fg(TableColor::Cyan)
                        .add_attribute(Attribute::Bold)
                })
                .collect::<Vec<_>>(),
        );

    for block in ledger.chain() {
        table.add_row(vec![
            Cell::new(format!("#{}", block.index)).fg(TableColor::White),
            Cell::new(shorten(&block.hash)).fg(TableColor::Green),
            Cell::new(shorten(&block.previous_hash)).fg(TableColor::Grey),
            Cell::new(format_timestamp(block.timestamp)).fg(TableColor::Grey),
            Cell::new(block.transactions.len()).fg(TableColor::White),
            Cell::new(shorten(&block.validator)).fg(TableColor::Yellow),
        ]);
    }

    println!("{}", "⛓️  Chain".bright_cyan().bold());
    println!("{}", table);
    println!(
        "{}",
        format!(
            "Blocks: {}   Pending: {}   Total stake: {}",
            ledger.len(),
            ledger.pending_transactions().len(),
            ledger.stakes().total()
        )
        .cyan()
    );
}

fn print_block_transactions(block: &Block) {
    println!();
    println!(
        "{}",
        format!("📦 Block #{} ({} transactions)", block.index, block.transactions.len())
            .bright_cyan()
            .bold()
    );
    if block.transactions.is_empty() {
        println!("{}", "   (none)".bright_black());
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            ["Sender", "Recipient", "Amount", "Signature", "Contract"]
                .into_iter()
                .map(|h| {
                    Cell::new(h)
                        .fg(TableColor::Cyan)
                        .add_attribute(Attribute::Bold)
                })
                .collect::<Vec<_>>(),
        );
    for tx in &block.transactions {
        table.add_row(transaction_row(tx));
    }
    println!("{}", table);
}

fn transaction_row(tx: &Transaction) -> Vec<String> {
    let sender = if tx.is_reward() {
        "reward".to_string()
    } else {
        shorten(&tx.sender)
    };
    vec![
        sender,
        shorten(&tx.recipient),
        tx.amount.to_string(),
        tx.signature.as_deref().map(shorten).unwrap_or_else(|| "-".to_string()),
        tx.contract_id.clone().unwrap_or_else(|| "-".to_string()),
    ]
}

fn shorten(value: &str) -> String {
    if value.len() > 20 && value.is_ascii() {
        format!("{}...{}", &value[..8], &value[value.len() - 8..])
    } else {
        value.to_string()
    }
}

fn format_timestamp(timestamp: i64) -> String {
    use chrono::DateTime;

    if let Some(dt) = DateTime::from_timestamp(timestamp, 0) {
        dt.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        "Invalid".to_string()
    }
}
