use crate::error::Result;
use crate::sha256::Sha256;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use serde_json::ser::Formatter;
use std::io;

/// Placeholder for "no parent" and "no producer" on the genesis block.
pub const GENESIS_SENTINEL: &str = "0";

/// 2023-01-01T00:00:00Z, so every ledger shares the same genesis hash.
pub const GENESIS_TIMESTAMP: i64 = 1_672_531_200;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub index: u64,
    pub previous_hash: String,
    pub timestamp: i64,
    pub transactions: Vec<Transaction>,
    pub hash: String,
    pub validator: String,
}

impl Block {
    /// Hex SHA-256 of `index || previous_hash || timestamp || transactions-json`.
    pub fn calculate_hash(
        index: u64,
        previous_hash: &str,
        timestamp: i64,
        transactions: &[Transaction],
    ) -> Result<String> {
        let mut hasher = Sha256::new();
        hasher.update(index.to_string());
        hasher.update(previous_hash);
        hasher.update(timestamp.to_string());
        hasher.update(canonical_json(transactions)?);
        Ok(hex::encode(hasher.finalize()))
    }

    pub fn create_genesis_block() -> Result<Self> {
        let hash = Self::calculate_hash(0, GENESIS_SENTINEL, GENESIS_TIMESTAMP, &[])?;
        Ok(Block {
            index: 0,
            previous_hash: GENESIS_SENTINEL.to_string(),
            timestamp: GENESIS_TIMESTAMP,
            transactions: Vec::new(),
            hash,
            validator: GENESIS_SENTINEL.to_string(),
        })
    }

    /// Builds the successor of `previous_block`. No validation happens here.
    pub fn create_new_block(
        previous_block: &Block,
        transactions: Vec<Transaction>,
        validator: impl Into<String>,
    ) -> Result<Self> {
        let index = previous_block.index + 1;
        let timestamp = chrono::Utc::now().timestamp();
        let hash = Self::calculate_hash(index, &previous_block.hash, timestamp, &transactions)?;

        Ok(Block {
            index,
            previous_hash: previous_block.hash.clone(),
            timestamp,
            transactions,
            hash,
            validator: validator.into(),
        })
    }

    /// Transactions that reached this block through the pool: everything but
    /// the trailing reward. Genesis has none.
    pub fn pooled_transactions(&self) -> &[Transaction] {
        match self.transactions.split_last() {
            Some((_reward, pooled)) => pooled,
            None => &[],
        }
    }

    pub fn is_genesis(&self) -> bool {
        self.index == 0 && self.previous_hash == GENESIS_SENTINEL
    }

    pub fn recompute_hash(&self) -> Result<String> {
        Self::calculate_hash(
            self.index,
            &self.previous_hash,
            self.timestamp,
            &self.transactions,
        )
    }

    pub fn has_valid_hash(&self) -> bool {
        matches!(self.recompute_hash(), Ok(hash) if hash == self.hash)
    }
}

/// Renders transactions as JSON text with `", "` and `": "` separators and
/// every character outside printable ASCII escaped as `\uXXXX`.
pub fn canonical_json(transactions: &[Transaction]) -> Result<String> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, CanonicalFormatter);
    transactions.serialize(&mut serializer)?;
    // The formatter only ever emits ASCII.
    Ok(buf.into_iter().map(char::from).collect())
}

struct CanonicalFormatter;

impl Formatter for CanonicalFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_string_fragment<W>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        for c in fragment.chars() {
            if (' '..='~').contains(&c) {
                writer.write_all(&[c as u8])?;
            } else {
                let mut units = [0u16; 2];
                for unit in c.encode_utf16(&mut units) {
                    write!(writer, "\\u{:04x}", unit)?;
                }
            }
        }
        Ok(())
    }
}
