/// Transaction types for StakeChain
use crate::crypto::KeyPair;
use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Sender identity reserved for system-minted rewards.
pub const REWARD_SENDER: &str = "0";

/// Quantity moved by a transaction.
pub type Amount = u64;

/// A transfer of `amount` from `sender` to `recipient`.
///
/// Field order is significant: it fixes the key order of the serialized form
/// that feeds block hashes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: Amount,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default)]
    pub contract_id: Option<String>,
}

/// The four signed fields of a transaction. Two transactions with equal keys
/// are the same spend regardless of their signatures.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SpendKey {
    pub sender: String,
    pub recipient: String,
    pub amount: Amount,
    pub contract_id: Option<String>,
}

impl Transaction {
    pub fn new(sender: impl Into<String>, recipient: impl Into<String>, amount: Amount) -> Self {
        Transaction {
            sender: sender.into(),
            recipient: recipient.into(),
            amount,
            signature: None,
            contract_id: None,
        }
    }

    /// A system-minted reward paid to `recipient`.
    pub fn reward(recipient: impl Into<String>, amount: Amount) -> Self {
        Self::new(REWARD_SENDER, recipient, amount)
    }

    pub fn with_contract_id(mut self, contract_id: impl Into<String>) -> Self {
        self.contract_id = Some(contract_id.into());
        self
    }

    pub fn is_reward(&self) -> bool {
        self.sender == REWARD_SENDER
    }

    /// `sender || recipient || amount || contract_id` as UTF-8, with an absent
    /// contract id rendered as the empty string.
    pub fn canonical_message(&self) -> Vec<u8> {
        format!(
            "{}{}{}{}",
            self.sender,
            self.recipient,
            self.amount,
            self.contract_id.as_deref().unwrap_or("")
        )
        .into_bytes()
    }

    /// Signs the canonical message, replacing any previous signature.
    pub fn sign(&mut self, keypair: &KeyPair) -> Result<()> {
        let message = self.canonical_message();
        self.signature = Some(keypair.sign_hex(&message)?);
        Ok(())
    }

    pub fn sign_with_secret_hex(&mut self, secret_key_hex: &str) -> Result<()> {
        let keypair = KeyPair::from_secret_hex(secret_key_hex)?;
        self.sign(&keypair)
    }

    pub fn spend_key(&self) -> SpendKey {
        SpendKey {
            sender: self.sender.clone(),
            recipient: self.recipient.clone(),
            amount: self.amount,
            contract_id: self.contract_id.clone(),
        }
    }
}
