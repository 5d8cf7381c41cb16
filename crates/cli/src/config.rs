//! Argument parsing and configuration resolution.
//!
//! Every setting is taken from its command-line flag if given, otherwise from
//! the environment variable of the same name in upper snake case. An empty
//! flag counts as not given. A missing or empty required setting fails with
//! `"<flag> should be specified"` before any file is read or remote call is
//! made.

use std::path::PathBuf;

use clap::{error::ErrorKind, Args, Parser};
use serde::Deserialize;

use common::{KeySelection, ObjError};
use engine::KmsSettings;

/// Arguments shared by both binaries.
#[derive(Debug, Clone, Args)]
pub struct ConnectionArgs {
    /// JSON file to transform.
    pub path: Option<PathBuf>,

    /// AWS access key id [env: AWS_ACCESS_KEY]
    #[arg(long)]
    pub aws_access_key: Option<String>,

    /// AWS secret access key [env: AWS_SECRET_KEY]
    #[arg(long)]
    pub aws_secret_key: Option<String>,

    /// AWS region of the KMS key [env: AWS_REGION]
    #[arg(long)]
    pub aws_region: Option<String>,

    /// Override the KMS endpoint URL [env: KMS_ENDPOINT_URL]
    #[arg(long)]
    pub kms_endpoint: Option<String>,

    /// Log level filter, overridden by RUST_LOG [env: LOG_LEVEL]
    #[arg(long)]
    pub log_level: Option<String>,
}

/// `encrypt-obj <path> --kms-key-id <id> --keys-to-encrypt <k1,k2,...>`
#[derive(Debug, Parser)]
#[command(name = "encrypt-obj", version, about = "Encrypt selected values of a JSON object with AWS KMS")]
pub struct EncryptCli {
    #[command(flatten)]
    pub connection: ConnectionArgs,

    /// KMS key id, ARN or alias to encrypt with [env: KMS_KEY_ID]
    #[arg(long)]
    pub kms_key_id: Option<String>,

    /// Comma-separated keys whose values are encrypted [env: KEYS_TO_ENCRYPT]
    #[arg(long)]
    pub keys_to_encrypt: Option<String>,
}

/// `decrypt-obj <path>`
#[derive(Debug, Parser)]
#[command(name = "decrypt-obj", version, about = "Decrypt the _encrypted values of a JSON object with AWS KMS")]
pub struct DecryptCli {
    #[command(flatten)]
    pub connection: ConnectionArgs,
}

/// Parse process arguments, printing help or version and exiting when asked.
///
/// Any other parse error is returned so the process exits with status 1.
pub fn parse_args<T: Parser>() -> anyhow::Result<T> {
    T::try_parse().or_else(|e| match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => e.exit(),
        _ => Err(anyhow::anyhow!(e.render().to_string())),
    })
}

/// Settings as read from flags and environment, before validation.
#[derive(Debug, Default, Deserialize)]
struct RawSettings {
    aws_access_key: Option<String>,
    aws_secret_key: Option<String>,
    aws_region: Option<String>,
    kms_endpoint_url: Option<String>,
    kms_key_id: Option<String>,
    keys_to_encrypt: Option<String>,
    log_level: Option<String>,
    otel_exporter_otlp_endpoint: Option<String>,
}

/// Validated settings common to both binaries.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub path: PathBuf,
    pub kms: KmsSettings,
    pub log_level: String,
    pub otlp_endpoint: Option<String>,
}

/// Validated `encrypt-obj` settings.
#[derive(Debug, Clone)]
pub struct EncryptSettings {
    pub connection: ConnectionSettings,
    pub kms_key_id: String,
    pub keys_to_encrypt: KeySelection,
}

impl EncryptSettings {
    /// Resolve settings from `cli` and the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ObjError::Configuration`] naming the first missing setting.
    pub fn resolve(cli: &EncryptCli) -> Result<Self, ObjError> {
        Self::resolve_with(cli, config::Environment::default())
    }

    fn resolve_with(cli: &EncryptCli, env: config::Environment) -> Result<Self, ObjError> {
        let mut raw = layer(
            env,
            &cli.connection,
            [
                ("kms_key_id", cli.kms_key_id.clone()),
                ("keys_to_encrypt", cli.keys_to_encrypt.clone()),
            ],
        )?;
        let connection = connection_settings(&mut raw, &cli.connection)?;
        let kms_key_id = required(raw.kms_key_id, "kms-key-id")?;
        let keys_to_encrypt = KeySelection::parse_list(&required(raw.keys_to_encrypt, "keys-to-encrypt")?);

        Ok(Self {
            connection,
            kms_key_id,
            keys_to_encrypt,
        })
    }
}

impl ConnectionSettings {
    /// Resolve `decrypt-obj` settings from `cli` and the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ObjError::Configuration`] naming the first missing setting.
    pub fn resolve(cli: &DecryptCli) -> Result<Self, ObjError> {
        Self::resolve_with(cli, config::Environment::default())
    }

    fn resolve_with(cli: &DecryptCli, env: config::Environment) -> Result<Self, ObjError> {
        let mut raw = layer(env, &cli.connection, [])?;
        connection_settings(&mut raw, &cli.connection)
    }
}

fn default_log_level() -> String {
    "warn".into()
}

/// Stack non-empty command-line flags over the environment source.
fn layer<const N: usize>(
    env: config::Environment,
    args: &ConnectionArgs,
    extra: [(&str, Option<String>); N],
) -> Result<RawSettings, ObjError> {
    let overrides = [
        ("aws_access_key", args.aws_access_key.clone()),
        ("aws_secret_key", args.aws_secret_key.clone()),
        ("aws_region", args.aws_region.clone()),
        ("kms_endpoint_url", args.kms_endpoint.clone()),
        ("log_level", args.log_level.clone()),
    ];

    let mut builder = config::Config::builder().add_source(env);
    for (key, value) in overrides.into_iter().chain(extra) {
        builder = builder
            .set_override_option(key, non_empty(value))
            .map_err(|e| ObjError::Configuration(format!("invalid {key}: {e}")))?;
    }

    builder
        .build()
        .and_then(|cfg| cfg.try_deserialize())
        .map_err(|e| ObjError::Configuration(format!("failed to read configuration: {e}")))
}

fn connection_settings(
    raw: &mut RawSettings,
    args: &ConnectionArgs,
) -> Result<ConnectionSettings, ObjError> {
    let access_key_id = required(raw.aws_access_key.take(), "aws-access-key")?;
    let secret_access_key = required(raw.aws_secret_key.take(), "aws-secret-key")?;
    let region = required(raw.aws_region.take(), "aws-region")?;
    let path = args
        .path
        .clone()
        .ok_or_else(|| ObjError::Configuration("path should be specified".into()))?;

    Ok(ConnectionSettings {
        path,
        kms: KmsSettings {
            access_key_id,
            secret_access_key,
            region,
            endpoint_url: non_empty(raw.kms_endpoint_url.take()),
        },
        log_level: non_empty(raw.log_level.take()).unwrap_or_else(default_log_level),
        otlp_endpoint: non_empty(raw.otel_exporter_otlp_endpoint.take()),
    })
}

fn required(value: Option<String>, flag: &str) -> Result<String, ObjError> {
    non_empty(value).ok_or_else(|| ObjError::Configuration(format!("{flag} should be specified")))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let map: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        config::Environment::default().source(Some(map))
    }

    fn encrypt_cli(args: &[&str]) -> EncryptCli {
        EncryptCli::try_parse_from(std::iter::once("encrypt-obj").chain(args.iter().copied()))
            .unwrap()
    }

    fn decrypt_cli(args: &[&str]) -> DecryptCli {
        DecryptCli::try_parse_from(std::iter::once("decrypt-obj").chain(args.iter().copied()))
            .unwrap()
    }

    fn message(err: ObjError) -> String {
        assert!(matches!(err, ObjError::Configuration(_)));
        err.to_string()
    }

    #[test]
    fn defaults_are_correct() {
        assert_eq!(default_log_level(), "warn");
    }

    #[test]
    fn flags_only() {
        let cli = encrypt_cli(&[
            "conf.json",
            "--aws-access-key",
            "AK",
            "--aws-secret-key",
            "SK",
            "--aws-region",
            "ap-northeast-1",
            "--kms-key-id",
            "alias/app",
            "--keys-to-encrypt=password,token",
        ]);

        let s = EncryptSettings::resolve_with(&cli, env(&[])).unwrap();

        assert_eq!(s.connection.path, PathBuf::from("conf.json"));
        assert_eq!(s.connection.kms.access_key_id, "AK");
        assert_eq!(s.connection.kms.secret_access_key, "SK");
        assert_eq!(s.connection.kms.region, "ap-northeast-1");
        assert_eq!(s.connection.kms.endpoint_url, None);
        assert_eq!(s.connection.log_level, "warn");
        assert_eq!(s.kms_key_id, "alias/app");
        assert_eq!(s.keys_to_encrypt, KeySelection::parse_list("token,password"));
    }

    #[test]
    fn environment_fallback() {
        let cli = encrypt_cli(&["conf.json"]);
        let vars = env(&[
            ("AWS_ACCESS_KEY", "AK"),
            ("AWS_SECRET_KEY", "SK"),
            ("AWS_REGION", "us-west-2"),
            ("KMS_KEY_ID", "key-1"),
            ("KEYS_TO_ENCRYPT", "a,b"),
            ("KMS_ENDPOINT_URL", "http://localhost:4566"),
            ("LOG_LEVEL", "debug"),
            ("OTEL_EXPORTER_OTLP_ENDPOINT", "http://localhost:4317"),
        ]);

        let s = EncryptSettings::resolve_with(&cli, vars).unwrap();

        assert_eq!(s.connection.kms.region, "us-west-2");
        assert_eq!(s.kms_key_id, "key-1");
        assert_eq!(s.keys_to_encrypt.len(), 2);
        assert_eq!(
            s.connection.kms.endpoint_url.as_deref(),
            Some("http://localhost:4566")
        );
        assert_eq!(s.connection.log_level, "debug");
        assert_eq!(
            s.connection.otlp_endpoint.as_deref(),
            Some("http://localhost:4317")
        );
    }

    #[test]
    fn flag_beats_environment() {
        let cli = decrypt_cli(&["conf.json", "--aws-region", "eu-west-1"]);
        let vars = env(&[
            ("AWS_ACCESS_KEY", "AK"),
            ("AWS_SECRET_KEY", "SK"),
            ("AWS_REGION", "us-east-1"),
        ]);

        let s = ConnectionSettings::resolve_with(&cli, vars).unwrap();

        assert_eq!(s.kms.region, "eu-west-1");
    }

    #[test]
    fn missing_settings_reported_in_order() {
        let cli = encrypt_cli(&[]);
        assert_eq!(
            message(EncryptSettings::resolve_with(&cli, env(&[])).unwrap_err()),
            "aws-access-key should be specified"
        );

        let vars = [("AWS_ACCESS_KEY", "AK")];
        assert_eq!(
            message(EncryptSettings::resolve_with(&cli, env(&vars)).unwrap_err()),
            "aws-secret-key should be specified"
        );

        let vars = [("AWS_ACCESS_KEY", "AK"), ("AWS_SECRET_KEY", "SK")];
        assert_eq!(
            message(EncryptSettings::resolve_with(&cli, env(&vars)).unwrap_err()),
            "aws-region should be specified"
        );

        let vars = [
            ("AWS_ACCESS_KEY", "AK"),
            ("AWS_SECRET_KEY", "SK"),
            ("AWS_REGION", "us-east-1"),
        ];
        assert_eq!(
            message(EncryptSettings::resolve_with(&cli, env(&vars)).unwrap_err()),
            "path should be specified"
        );

        let cli = encrypt_cli(&["conf.json"]);
        assert_eq!(
            message(EncryptSettings::resolve_with(&cli, env(&vars)).unwrap_err()),
            "kms-key-id should be specified"
        );

        let cli = encrypt_cli(&["conf.json", "--kms-key-id", "k"]);
        assert_eq!(
            message(EncryptSettings::resolve_with(&cli, env(&vars)).unwrap_err()),
            "keys-to-encrypt should be specified"
        );
    }

    #[test]
    fn empty_values_count_as_missing() {
        let cli = decrypt_cli(&["conf.json", "--aws-access-key="]);
        let vars = env(&[("AWS_SECRET_KEY", "SK"), ("AWS_REGION", "")]);

        let err = ConnectionSettings::resolve_with(&cli, vars).unwrap_err();
        assert_eq!(message(err), "aws-access-key should be specified");

        let cli = decrypt_cli(&["conf.json", "--aws-access-key", "AK"]);
        let vars = env(&[("AWS_SECRET_KEY", "SK"), ("AWS_REGION", "")]);

        let err = ConnectionSettings::resolve_with(&cli, vars).unwrap_err();
        assert_eq!(message(err), "aws-region should be specified");
    }

    #[test]
    fn empty_flag_falls_back_to_environment() {
        let cli = encrypt_cli(&[
            "conf.json",
            "--aws-access-key=",
            "--kms-key-id=",
            "--keys-to-encrypt=",
        ]);
        let vars = env(&[
            ("AWS_ACCESS_KEY", "AK"),
            ("AWS_SECRET_KEY", "SK"),
            ("AWS_REGION", "us-east-1"),
            ("KMS_KEY_ID", "key-1"),
            ("KEYS_TO_ENCRYPT", "a"),
        ]);

        let s = EncryptSettings::resolve_with(&cli, vars).unwrap();

        assert_eq!(s.connection.kms.access_key_id, "AK");
        assert_eq!(s.kms_key_id, "key-1");
        assert_eq!(s.keys_to_encrypt, KeySelection::parse_list("a"));
    }

    #[test]
    fn whitespace_values_are_kept() {
        let cli = decrypt_cli(&["conf.json", "--aws-access-key", " AK "]);
        let vars = env(&[("AWS_SECRET_KEY", " "), ("AWS_REGION", "us-east-1")]);

        let s = ConnectionSettings::resolve_with(&cli, vars).unwrap();

        assert_eq!(s.kms.access_key_id, " AK ");
        assert_eq!(s.kms.secret_access_key, " ");
    }

    #[test]
    fn decrypt_does_not_need_key_settings() {
        let cli = decrypt_cli(&[
            "conf.json",
            "--aws-access-key",
            "AK",
            "--aws-secret-key",
            "SK",
            "--aws-region",
            "us-east-1",
        ]);

        assert!(ConnectionSettings::resolve_with(&cli, env(&[])).is_ok());
    }
}
