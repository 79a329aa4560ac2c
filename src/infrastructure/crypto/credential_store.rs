use aes_gcm::aead::{Aead, KeyInit, OsRng};
use aes_gcm::{AeadCore, Aes256Gcm, Key, Nonce};

use crate::application::ports::{CredentialCipher, CredentialError};

const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const KEY_LEN: usize = 32;

/// AES-256-GCM cipher producing `nonce:tag:ciphertext` envelopes with
/// hex-encoded fields. A fresh random nonce per call means two
/// encryptions of the same plaintext never produce the same envelope.
///
/// The key is a 64-hex-char environment value. It is validated on first
/// use, not at construction, so a misconfigured deployment fails the
/// operation that actually needs the key.
pub struct CredentialStore {
    key_hex: String,
}

impl CredentialStore {
    pub fn new(key_hex: impl Into<String>) -> Self {
        Self {
            key_hex: key_hex.into(),
        }
    }

    fn key(&self) -> Result<Key<Aes256Gcm>, CredentialError> {
        if self.key_hex.is_empty() {
            return Err(CredentialError::Config(
                "encryption key is not configured".to_string(),
            ));
        }
        let bytes = hex::decode(&self.key_hex)
            .map_err(|e| CredentialError::Config(format!("encryption key is not valid hex: {}", e)))?;
        if bytes.len() != KEY_LEN {
            return Err(CredentialError::Config(format!(
                "encryption key must be {} bytes, got {}",
                KEY_LEN,
                bytes.len()
            )));
        }
        Ok(*Key::<Aes256Gcm>::from_slice(&bytes))
    }
}

impl CredentialCipher for CredentialStore {
    fn encrypt(&self, plaintext: &str) -> Result<String, CredentialError> {
        let cipher = Aes256Gcm::new(&self.key()?);
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

        // aes-gcm appends the 16-byte tag to the ciphertext; the envelope
        // keeps it as its own field.
        let sealed = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|_| CredentialError::Encryption("AES-GCM seal failed".to_string()))?;
        let (ciphertext, tag) = sealed.split_at(sealed.len() - TAG_LEN);

        Ok(format!(
            "{}:{}:{}",
            hex::encode(nonce),
            hex::encode(tag),
            hex::encode(ciphertext)
        ))
    }

    fn decrypt(&self, envelope: &str) -> Result<String, CredentialError> {
        let parts: Vec<&str> = envelope.split(':').collect();
        if parts.len() != 3 {
            return Err(CredentialError::Decryption(format!(
                "envelope must have 3 parts, got {}",
                parts.len()
            )));
        }

        let nonce_bytes = hex::decode(parts[0])
            .map_err(|_| CredentialError::Decryption("nonce is not valid hex".to_string()))?;
        let tag = hex::decode(parts[1])
            .map_err(|_| CredentialError::Decryption("tag is not valid hex".to_string()))?;
        let ciphertext = hex::decode(parts[2])
            .map_err(|_| CredentialError::Decryption("ciphertext is not valid hex".to_string()))?;

        if nonce_bytes.len() != NONCE_LEN {
            return Err(CredentialError::Decryption(format!(
                "nonce must be {} bytes, got {}",
                NONCE_LEN,
                nonce_bytes.len()
            )));
        }
        if tag.len() != TAG_LEN {
            return Err(CredentialError::Decryption(format!(
                "tag must be {} bytes, got {}",
                TAG_LEN,
                tag.len()
            )));
        }

        let cipher = Aes256Gcm::new(&self.key()?);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let mut sealed = ciphertext;
        sealed.extend_from_slice(&tag);

        let plaintext = cipher
            .decrypt(nonce, sealed.as_slice())
            .map_err(|_| CredentialError::Decryption("authentication failed".to_string()))?;

        String::from_utf8(plaintext)
            .map_err(|_| CredentialError::Decryption("plaintext is not UTF-8".to_string()))
    }
}
