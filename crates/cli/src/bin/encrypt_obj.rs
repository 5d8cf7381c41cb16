//! `encrypt-obj` — encrypt selected values of a JSON file with AWS KMS.
//!
//! Startup sequence:
//! 1. Parse arguments and resolve settings (flags, then environment).
//! 2. Initialise logging.
//! 3. Read and parse the input file.
//! 4. Encrypt the selected values and print the result to stdout.
//!
//! Any failure exits with status 1 and the error on stderr.

use anyhow::Result;
use tracing::{error, info};

use cli::config::{parse_args, EncryptCli, EncryptSettings};
use engine::{KmsCipher, ObjectTransformer};

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let args: EncryptCli = parse_args()?;
    let settings = EncryptSettings::resolve(&args)?;
    let connection = &settings.connection;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    let _telemetry = cli::telemetry::init_telemetry(
        "encrypt-obj",
        &connection.log_level,
        connection.otlp_endpoint.as_deref(),
    )?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        region = %connection.kms.region,
        selected = settings.keys_to_encrypt.len(),
        "encrypt-obj starting"
    );

    // -----------------------------------------------------------------------
    // 3. Input
    // -----------------------------------------------------------------------
    let input = cli::io::read_object(&connection.path).await?;

    // -----------------------------------------------------------------------
    // 4. Encrypt
    // -----------------------------------------------------------------------
    let transformer = ObjectTransformer::new(KmsCipher::connect(&connection.kms).await);
    let encrypted = transformer
        .encrypt(&input, &settings.kms_key_id, &settings.keys_to_encrypt)
        .await
        .inspect_err(|e| error!(code = e.code(), "encryption failed"))?;

    println!("{}", cli::io::render(&encrypted)?);
    Ok(())
}
