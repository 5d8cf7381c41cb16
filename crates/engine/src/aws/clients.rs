//! KMS client construction from static credentials.

use aws_config::BehaviorVersion;
use aws_sdk_kms::config::{Credentials, Region};

/// Provider name recorded on the static credentials.
const CREDENTIALS_PROVIDER: &str = "kms-encrypt-obj";

/// Connection settings for the remote KMS.
#[derive(Clone)]
pub struct KmsSettings {
    /// Long-lived access key id.
    pub access_key_id: String,
    /// Secret access key paired with `access_key_id`.
    pub secret_access_key: String,
    /// Service region, e.g. `"ap-northeast-1"`.
    pub region: String,
    /// Override for the service endpoint, for KMS-compatible services.
    pub endpoint_url: Option<String>,
}

impl std::fmt::Debug for KmsSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print the secret key.
        f.debug_struct("KmsSettings")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field("region", &self.region)
            .field("endpoint_url", &self.endpoint_url)
            .finish()
    }
}

/// Build a KMS client bound to the given credentials and region.
///
/// Loading is local only: no request is made until the first KMS call.
pub async fn build_kms_client(settings: &KmsSettings) -> aws_sdk_kms::Client {
    let credentials = Credentials::new(
        settings.access_key_id.clone(),
        settings.secret_access_key.clone(),
        None,
        None,
        CREDENTIALS_PROVIDER,
    );

    let mut loader = aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(settings.region.clone()))
        .credentials_provider(credentials);

    if let Some(url) = &settings.endpoint_url {
        loader = loader.endpoint_url(url.clone());
    }

    let config = loader.load().await;
    aws_sdk_kms::Client::new(&config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> KmsSettings {
        KmsSettings {
            access_key_id: "AKIDEXAMPLE".into(),
            secret_access_key: "wJalrXUtnFEMI".into(),
            region: "ap-northeast-1".into(),
            endpoint_url: None,
        }
    }

    #[test]
    fn debug_redacts_secret() {
        let printed = format!("{:?}", settings());
        assert!(printed.contains("REDACTED"));
        assert!(printed.contains("AKIDEXAMPLE"));
        assert!(!printed.contains("wJalrXUtnFEMI"));
    }

    #[tokio::test]
    async fn client_uses_configured_region() {
        let client = build_kms_client(&settings()).await;
        let region = client.config().region().map(|r| r.as_ref().to_owned());
        assert_eq!(region.as_deref(), Some("ap-northeast-1"));
    }
}
