//! Object transform engine: moves selected values in and out of the
//! `_encrypted` envelope.
//!
//! # Invariants
//!
//! - Unselected keys keep their relative order and their JSON values are
//!   copied, never re-encoded as strings.
//! - Exactly one remote call is issued per envelope entry. All calls of one
//!   invocation run concurrently and are joined before a result is built.
//! - The first failure fails the whole invocation; no partial object is
//!   ever returned.

use futures::future::try_join_all;
use serde_json::Value;
use tracing::{debug, instrument};

use common::envelope::{envelope_entries, EncryptedEnvelope};
use common::{KeySelection, ObjError, PlainObject, ENCRYPTED_KEY};

use crate::cipher::{CipherError, RemoteCipher};

/// Encrypts and decrypts flat objects through a [`RemoteCipher`].
#[derive(Clone, Debug)]
pub struct ObjectTransformer<C> {
    cipher: C,
}

impl<C: RemoteCipher> ObjectTransformer<C> {
    pub fn new(cipher: C) -> Self {
        Self { cipher }
    }

    /// Move the values of `keys_to_encrypt` into the `_encrypted` envelope,
    /// encrypting each under `key_id`.
    ///
    /// Selected keys absent from `obj` are ignored; the envelope is present
    /// even when empty.
    ///
    /// # Errors
    ///
    /// - [`ObjError::EnvelopeCollision`] if `obj` already has a top-level
    ///   `_encrypted` key that is not selected. No remote call is made.
    /// - [`ObjError::RemoteService`] if any remote encrypt call fails.
    #[instrument(skip_all, fields(selected = keys_to_encrypt.len()))]
    pub async fn encrypt(
        &self,
        obj: &PlainObject,
        key_id: &str,
        keys_to_encrypt: &KeySelection,
    ) -> Result<PlainObject, ObjError> {
        if obj.contains_key(ENCRYPTED_KEY) && !keys_to_encrypt.contains(ENCRYPTED_KEY) {
            return Err(ObjError::EnvelopeCollision(format!(
                "input already has a top-level {ENCRYPTED_KEY} key that is not selected for encryption"
            )));
        }

        let mut result = PlainObject::new();
        let mut to_encrypt = Vec::new();
        for (key, value) in obj {
            if keys_to_encrypt.contains(key) {
                let plaintext = serde_json::to_string(value)
                    .map_err(|e| ObjError::Serialization(format!("{key}: {e}")))?;
                to_encrypt.push((key.as_str(), plaintext));
            } else {
                result.insert(key.clone(), value.clone());
            }
        }
        debug!(kept = result.len(), encrypting = to_encrypt.len(), "partitioned object");

        let calls = to_encrypt.iter().map(|(key, plaintext)| async move {
            let ciphertext = self
                .cipher
                .encrypt_string(plaintext, key_id)
                .await
                .map_err(|e| cipher_error("encrypt", key, e))?;
            Ok::<_, ObjError>(((*key).to_owned(), Value::String(ciphertext)))
        });
        let envelope: EncryptedEnvelope = try_join_all(calls).await?.into_iter().collect();

        result.insert(ENCRYPTED_KEY.to_owned(), Value::Object(envelope));
        Ok(result)
    }

    /// Restore every envelope entry as a top-level key, dropping the
    /// envelope.
    ///
    /// A decrypted key that also exists at the top level replaces the
    /// top-level value in place.
    ///
    /// # Errors
    ///
    /// - [`ObjError::MalformedEnvelope`] if `_encrypted` is missing, is not an
    ///   object, or holds a non-string entry.
    /// - [`ObjError::RemoteService`] if any remote decrypt call fails,
    ///   including ciphertext that cannot be decoded into a request.
    /// - [`ObjError::InvalidPlaintext`] if a decrypted value is not JSON.
    #[instrument(skip_all)]
    pub async fn decrypt(&self, obj: &PlainObject) -> Result<PlainObject, ObjError> {
        let entries = envelope_entries(obj)?;

        let mut result: PlainObject = obj
            .iter()
            .filter(|(key, _)| key.as_str() != ENCRYPTED_KEY)
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        debug!(kept = result.len(), decrypting = entries.len(), "read envelope");

        let calls = entries.iter().map(|&(key, ciphertext)| async move {
            let plaintext = self
                .cipher
                .decrypt_string(ciphertext)
                .await
                .map_err(|e| cipher_error("decrypt", key, e))?;
            let value: Value = serde_json::from_str(&plaintext)
                .map_err(|e| ObjError::InvalidPlaintext(format!("{key}: {e}")))?;
            Ok::<_, ObjError>((key, value))
        });

        for (key, value) in try_join_all(calls).await? {
            result.insert(key.to_owned(), value);
        }
        Ok(result)
    }
}

fn cipher_error(op: &str, key: &str, err: CipherError) -> ObjError {
    match err {
        CipherError::NonUtf8Plaintext => ObjError::InvalidPlaintext(format!("{key}: {err}")),
        CipherError::Remote(_)
        | CipherError::MalformedCiphertext(_)
        | CipherError::MissingField(_) => ObjError::RemoteService(format!("{op} {key}: {err}")),
    }
}
