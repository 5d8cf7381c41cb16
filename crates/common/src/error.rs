//! Error taxonomy shared across crates.

use thiserror::Error;

/// Top-level error type for object encryption and decryption.
///
/// Every failure is fatal for the invocation that raised it; no variant
/// carries a partial result.
#[derive(Debug, Error)]
pub enum ObjError {
    /// A required credential or argument is missing.
    #[error("{0}")]
    Configuration(String),

    /// The input document could not be read or is not a JSON object.
    #[error("input parse error: {0}")]
    InputParse(String),

    /// The remote key-management service rejected or failed a call.
    #[error("remote service error: {0}")]
    RemoteService(String),

    /// `decrypt` was given an object without a valid `_encrypted` mapping.
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    /// The input already holds a top-level `_encrypted` key that was not
    /// selected for encryption.
    #[error("envelope collision: {0}")]
    EnvelopeCollision(String),

    /// A decrypted plaintext is not a JSON document.
    #[error("invalid plaintext: {0}")]
    InvalidPlaintext(String),

    /// A value could not be serialised to JSON before encryption.
    #[error("serialization failure: {0}")]
    Serialization(String),
}

impl ObjError {
    /// Stable machine-readable identifier, used as a structured log field.
    pub fn code(&self) -> &'static str {
        match self {
            ObjError::Configuration(_) => "configuration_error",
            ObjError::InputParse(_) => "input_parse_error",
            ObjError::RemoteService(_) => "remote_service_error",
            ObjError::MalformedEnvelope(_) => "malformed_envelope_error",
            ObjError::EnvelopeCollision(_) => "envelope_collision_error",
            ObjError::InvalidPlaintext(_) => "invalid_plaintext_error",
            ObjError::Serialization(_) => "serialization_error",
        }
    }
}
