//! AWS SDK client initialisation for KMS.
//!
//! Credentials and region are always supplied explicitly by the caller; the
//! ambient AWS credential chain is never consulted.

pub mod clients;

pub use clients::{build_kms_client, KmsSettings};
