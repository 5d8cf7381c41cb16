//! Remote cipher client: string-in, string-out access to a remote KMS.
//!
//! No cryptography happens locally. Implementations are transport adapters
//! and surface service failures without retrying or reinterpreting them.
//!
//! # Ciphertext format
//!
//! Ciphertexts are the service's native blob, standard base64 encoded.

pub mod kms;

pub use kms::KmsCipher;

use async_trait::async_trait;
use thiserror::Error;

/// Errors produced by the remote cipher layer.
#[derive(Debug, Error)]
pub enum CipherError {
    /// The service call failed (bad key, permission denied, throttling,
    /// network failure). Carries the service's error text.
    #[error("{0}")]
    Remote(String),

    /// The ciphertext could not be decoded into a blob to send.
    #[error("ciphertext is not valid base64: {0}")]
    MalformedCiphertext(String),

    /// The service response lacked a field it must always carry.
    #[error("service response is missing {0}")]
    MissingField(&'static str),

    /// The decrypted bytes are not UTF-8.
    #[error("decrypted plaintext is not valid UTF-8")]
    NonUtf8Plaintext,
}

/// Encrypt/decrypt primitives backed by a remote key-management service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteCipher: Send + Sync {
    /// Encrypt `plaintext` under `key_id`, returning base64 ciphertext.
    async fn encrypt_string(&self, plaintext: &str, key_id: &str) -> Result<String, CipherError>;

    /// Decrypt base64 ciphertext produced by [`RemoteCipher::encrypt_string`].
    async fn decrypt_string(&self, ciphertext: &str) -> Result<String, CipherError>;
}
