//! Shared glue for the `encrypt-obj` and `decrypt-obj` binaries.

pub mod config;
pub mod io;
pub mod telemetry;
