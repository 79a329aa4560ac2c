/// Symmetric encryption of PBX passwords at rest. Pure, synchronous,
/// total-or-fail: no retry semantics apply.
pub trait CredentialCipher: Send + Sync {
    fn encrypt(&self, plaintext: &str) -> Result<String, CredentialError>;

    fn decrypt(&self, envelope: &str) -> Result<String, CredentialError>;
}

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// Missing or malformed key material. Fatal for the operation, never
    /// retried.
    #[error("credential configuration error: {0}")]
    Config(String),
    #[error("encryption failed: {0}")]
    Encryption(String),
    /// Malformed envelope or authentication-tag mismatch. Callers never
    /// receive partially-decrypted data.
    #[error("decryption failed: {0}")]
    Decryption(String),
}
