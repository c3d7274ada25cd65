/// Validation logic for transactions separated from type definitions
use crate::crypto::verify_signature;
use crate::error::{ChainError, Result};
use crate::transaction::types::Transaction;

impl Transaction {
    /// Checks the transaction's provenance.
    ///
    /// Rewards are trusted without a signature. Anything else must carry a
    /// signature that verifies against `sender` read as a public key.
    pub fn validate(&self) -> Result<()> {
        if self.is_reward() {
            return Ok(());
        }

        let signature = self.signature.as_deref().ok_or_else(|| {
            ChainError::InvalidTransaction("Transaction not signed".to_string())
        })?;

        let message = self.canonical_message();
        if verify_signature(&self.sender, &message, signature)? {
            Ok(())
        } else {
            Err(ChainError::InvalidTransaction(
                "Signature verification failed".to_string(),
            ))
        }
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}
