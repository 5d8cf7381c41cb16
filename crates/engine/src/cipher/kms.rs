//! [`KmsCipher`]: [`RemoteCipher`] over AWS KMS `Encrypt` / `Decrypt`.

use async_trait::async_trait;
use aws_sdk_kms::error::DisplayErrorContext;
use aws_sdk_kms::primitives::Blob;
use base64::{
    alphabet,
    engine::{general_purpose::STANDARD, DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use tracing::debug;

use super::{CipherError, RemoteCipher};
use crate::aws::{build_kms_client, KmsSettings};

/// Standard alphabet, accepting ciphertexts with or without `=` padding.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// AWS KMS implementation of [`RemoteCipher`].
#[derive(Clone, Debug)]
pub struct KmsCipher {
    client: aws_sdk_kms::Client,
}

impl KmsCipher {
    /// Wrap an existing KMS client.
    pub fn new(client: aws_sdk_kms::Client) -> Self {
        Self { client }
    }

    /// Build a KMS client from `settings` and wrap it.
    pub async fn connect(settings: &KmsSettings) -> Self {
        Self::new(build_kms_client(settings).await)
    }
}

#[async_trait]
impl RemoteCipher for KmsCipher {
    async fn encrypt_string(&self, plaintext: &str, key_id: &str) -> Result<String, CipherError> {
        let resp = self
            .client
            .encrypt()
            .key_id(key_id)
            .plaintext(Blob::new(plaintext.as_bytes()))
            .send()
            .await
            .map_err(|e| CipherError::Remote(DisplayErrorContext(&e).to_string()))?;

        let blob = resp
            .ciphertext_blob()
            .ok_or(CipherError::MissingField("CiphertextBlob"))?;

        debug!(key_id, ciphertext_len = blob.as_ref().len(), "KMS encrypt succeeded");
        Ok(STANDARD.encode(blob.as_ref()))
    }

    async fn decrypt_string(&self, ciphertext: &str) -> Result<String, CipherError> {
        let bytes = LENIENT
            .decode(ciphertext)
            .map_err(|e| CipherError::MalformedCiphertext(e.to_string()))?;

        let resp = self
            .client
            .decrypt()
            .ciphertext_blob(Blob::new(bytes))
            .send()
            .await
            .map_err(|e| CipherError::Remote(DisplayErrorContext(&e).to_string()))?;

        let plaintext = resp
            .plaintext()
            .ok_or(CipherError::MissingField("Plaintext"))?;

        debug!(key_id = resp.key_id().unwrap_or_default(), "KMS decrypt succeeded");
        String::from_utf8(plaintext.as_ref().to_vec()).map_err(|_| CipherError::NonUtf8Plaintext)
    }
}
