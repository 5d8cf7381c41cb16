//! Selective encryption of flat JSON objects through a remote KMS.
//!
//! The pieces, leaves first:
//! 1. [`cipher`] — the [`RemoteCipher`] seam and its AWS KMS implementation.
//! 2. [`aws`] — KMS client construction from explicit credentials.
//! 3. [`transform`] — [`ObjectTransformer`], which partitions an object, fans
//!    out one remote call per selected value and reassembles the result.
//! 4. [`blocking`] — [`BlockingDecrypter`] for callers that cannot await.

pub mod aws;
pub mod blocking;
pub mod cipher;
pub mod transform;

pub use aws::KmsSettings;
pub use blocking::BlockingDecrypter;
pub use cipher::{CipherError, KmsCipher, RemoteCipher};
pub use transform::ObjectTransformer;
