//! Shared types and errors for the `kms-encrypt-obj` crates.
//!
//! [`envelope`] defines the shape of plain and transformed objects;
//! [`error`] defines the failure taxonomy every layer reports through.

pub mod envelope;
pub mod error;

pub use envelope::{EncryptedEnvelope, KeySelection, PlainObject, ENCRYPTED_KEY};
pub use error::ObjError;
