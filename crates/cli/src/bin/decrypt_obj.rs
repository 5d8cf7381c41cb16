//! `decrypt-obj` — restore the `_encrypted` values of a JSON file with AWS KMS.
//!
//! Startup sequence:
//! 1. Parse arguments and resolve settings (flags, then environment).
//! 2. Initialise logging.
//! 3. Read and parse the input file.
//! 4. Decrypt the envelope and print the result to stdout.
//!
//! Any failure exits with status 1 and the error on stderr.

use anyhow::Result;
use tracing::{error, info};

use cli::config::{parse_args, ConnectionSettings, DecryptCli};
use engine::{KmsCipher, ObjectTransformer};

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let args: DecryptCli = parse_args()?;
    let settings = ConnectionSettings::resolve(&args)?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    let _telemetry = cli::telemetry::init_telemetry(
        "decrypt-obj",
        &settings.log_level,
        settings.otlp_endpoint.as_deref(),
    )?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        region = %settings.kms.region,
        "decrypt-obj starting"
    );

    // -----------------------------------------------------------------------
    // 3. Input
    // -----------------------------------------------------------------------
    let input = cli::io::read_object(&settings.path).await?;

    // -----------------------------------------------------------------------
    // 4. Decrypt
    // -----------------------------------------------------------------------
    let transformer = ObjectTransformer::new(KmsCipher::connect(&settings.kms).await);
    let decrypted = transformer
        .decrypt(&input)
        .await
        .inspect_err(|e| error!(code = e.code(), "decryption failed"))?;

    println!("{}", cli::io::render(&decrypted)?);
    Ok(())
}
