//! Logging and optional trace export.
//!
//! Logs are structured JSON on stderr; stdout carries only the result
//! document. Spans are exported over OTLP only when an endpoint is
//! configured.
//!
//! # Telemetry invariants
//!
//! - **No plaintext, ciphertext or credential** may appear in any span
//!   attribute or log field. Key names and counts are allowed.

pub mod init;

pub use init::{init_telemetry, TelemetryGuard};
