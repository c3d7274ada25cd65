//! secp256k1 signing and verification for StakeChain
//!
//! Identities on the ledger are hex-encoded public keys. Messages are digested
//! with [`crate::sha256`] before signing, and signatures travel as hex-encoded
//! 64-byte compact `r || s` values.

use crate::error::{ChainError, Result};
use crate::sha256;
use once_cell::sync::Lazy;
use rand::rngs::OsRng;
use secp256k1::{
    constants::{
        COMPACT_SIGNATURE_SIZE, PUBLIC_KEY_SIZE, SECRET_KEY_SIZE, UNCOMPRESSED_PUBLIC_KEY_SIZE,
    },
    ecdsa::Signature,
    All, Message, PublicKey, Secp256k1, SecretKey,
};
use std::collections::HashMap;

/// A thread-safe, lazily initialized Secp256k1 context.
static SECP256K1_CONTEXT: Lazy<Secp256k1<All>> = Lazy::new(Secp256k1::new);

/// Raw `x || y` encoding without the leading `0x04` tag.
const RAW_PUBLIC_KEY_SIZE: usize = UNCOMPRESSED_PUBLIC_KEY_SIZE - 1;

#[derive(Debug, Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generates a new random KeyPair using the OS random number generator.
    pub fn generate() -> Self {
        let secret_key = SecretKey::new(&mut OsRng);
        Self::from_secret_key(secret_key)
    }

    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let public_key = PublicKey::from_secret_key(&SECP256K1_CONTEXT, &secret_key);
        KeyPair {
            secret_key,
            public_key,
        }
    }

    pub fn from_secret_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != SECRET_KEY_SIZE {
            return Err(ChainError::DecodeError(format!(
                "Secret key must be {} bytes, got {}",
                SECRET_KEY_SIZE,
                bytes.len()
            )));
        }
        let secret_key = SecretKey::from_slice(bytes)
            .map_err(|e| ChainError::DecodeError(format!("Invalid secret key bytes: {}", e)))?;
        Ok(Self::from_secret_key(secret_key))
    }

    pub fn from_secret_hex(secret_hex: &str) -> Result<Self> {
        let bytes = hex::decode(secret_hex)
            .map_err(|e| ChainError::DecodeError(format!("Invalid secret key hex: {}", e)))?;
        Self::from_secret_bytes(&bytes)
    }

    /// The ledger identity for this keypair: the compressed public key as hex.
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }

    pub fn secret_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Signs the SHA-256 digest of `message` and returns the compact signature bytes.
    pub fn sign(&self, message: &[u8]) -> Result<[u8; COMPACT_SIGNATURE_SIZE]> {
        let digest = sha256::digest(message);
        let message = Message::from_digest_slice(&digest)
            .map_err(|e| ChainError::CryptoError(format!("Failed to create message: {}", e)))?;

        let signature = SECP256K1_CONTEXT.sign_ecdsa(&message, &self.secret_key);
        Ok(signature.serialize_compact())
    }

    pub fn sign_hex(&self, message: &[u8]) -> Result<String> {
        Ok(hex::encode(self.sign(message)?))
    }
}

/// Parses a hex public key in compressed, uncompressed, or raw `x || y` form.
pub fn parse_public_key(public_key_hex: &str) -> Result<PublicKey> {
    let bytes = hex::decode(public_key_hex)
        .map_err(|e| ChainError::DecodeError(format!("Invalid public key hex: {}", e)))?;

    let parsed = match bytes.len() {
        PUBLIC_KEY_SIZE | UNCOMPRESSED_PUBLIC_KEY_SIZE => PublicKey::from_slice(&bytes),
        RAW_PUBLIC_KEY_SIZE => {
            let mut tagged = Vec::with_capacity(UNCOMPRESSED_PUBLIC_KEY_SIZE);
            tagged.push(0x04);
            tagged.extend_from_slice(&bytes);
            PublicKey::from_slice(&tagged)
        }
        other => {
            return Err(ChainError::DecodeError(format!(
                "Public key must be {}, {} or {} bytes, got {}",
                PUBLIC_KEY_SIZE, RAW_PUBLIC_KEY_SIZE, UNCOMPRESSED_PUBLIC_KEY_SIZE, other
            )))
        }
    };

    parsed.map_err(|e| ChainError::DecodeError(format!("Invalid public key: {}", e)))
}

/// Verifies a hex signature over `message` against a hex public key.
///
/// Returns `Ok(false)` for a well-formed signature that does not match, and a
/// `DecodeError` when either the key or the signature cannot be decoded.
pub fn verify_signature(public_key_hex: &str, message: &[u8], signature_hex: &str) -> Result<bool> {
    let public_key = parse_public_key(public_key_hex)?;

    let signature_bytes = hex::decode(signature_hex)
        .map_err(|e| ChainError::DecodeError(format!("Invalid signature hex: {}", e)))?;
    if signature_bytes.len() != COMPACT_SIGNATURE_SIZE {
        return Err(ChainError::DecodeError(format!(
            "Signature must be exactly {} bytes (compact), got {}",
            COMPACT_SIGNATURE_SIZE,
            signature_bytes.len()
        )));
    }
    let signature = Signature::from_compact(&signature_bytes)
        .map_err(|e| ChainError::DecodeError(format!("Invalid signature: {}", e)))?;

    let digest = sha256::digest(message);
    let message = Message::from_digest_slice(&digest)
        .map_err(|e| ChainError::CryptoError(format!("Failed to create message: {}", e)))?;

    Ok(SECP256K1_CONTEXT
        .verify_ecdsa(&message, &signature, &public_key)
        .is_ok())
}

/// In-memory store of generated keypairs, indexed by public key hex.
#[derive(Debug, Default)]
pub struct KeyManager {
    keys: HashMap<String, KeyPair>,
}

impl KeyManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Generates a keypair, remembers it, and returns `(public_hex, secret_hex)`.
    pub fn generate_key_pair(&mut self) -> (String, String) {
        let keypair = KeyPair::generate();
        let public_key = keypair.public_key_hex();
        let secret_key = keypair.secret_key_hex();
        self.keys.insert(public_key.clone(), keypair);
        (public_key, secret_key)
    }

    pub fn get_private_key(&self, public_key_hex: &str) -> Option<String> {
        self.keys.get(public_key_hex).map(KeyPair::secret_key_hex)
    }

    pub fn keypair(&self, public_key_hex: &str) -> Option<&KeyPair> {
        self.keys.get(public_key_hex)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}
