//! Picks one effective credential strategy and builds the immutable client
//! configuration every platform call shares.
//!
//! No explicit strategy selector exists: each optional field, when set,
//! overrides whatever an earlier field selected, so the last applicable
//! strategy in declaration order wins. Strategies are lazy; an invalid
//! profile, key pair, or credentials file only surfaces when the first
//! dependent API call asks for credentials.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use aws_config::imds::credentials::ImdsCredentialsProvider;
use aws_config::profile::ProfileFileCredentialsProvider;
use aws_config::sts::AssumeRoleProvider;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::provider::error::CredentialsError;
use aws_credential_types::provider::{self, future, ProvideCredentials, SharedCredentialsProvider};
use aws_credential_types::Credentials;
use serde::Deserialize;

/// Instance-metadata credential acquisition for role assumption is bounded;
/// all other calls rely on transport defaults.
const ROLE_ACQUISITION_TIMEOUT: Duration = Duration::from_secs(5);

const SESSION_NAME: &str = "lambda-deploy";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CredentialOptions {
    pub profile: Option<String>,
    pub role_arn: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub credentials_file: Option<PathBuf>,
}

/// The strategy that ends up configured after every applicable option has
/// been applied in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialStrategy {
    SharedProfile(String),
    AssumedRole(String),
    StaticKeys {
        access_key_id: String,
        secret_access_key: String,
    },
    CredentialsFile(PathBuf),
}

impl CredentialStrategy {
    /// Evaluates the strategies in fixed order; each applicable one
    /// overwrites the previous selection, so the last applicable wins.
    pub fn select(options: &CredentialOptions) -> Option<CredentialStrategy> {
        let mut selected = None;

        if let Some(profile) = &options.profile {
            selected = Some(CredentialStrategy::SharedProfile(profile.clone()));
        }
        if let Some(role_arn) = &options.role_arn {
            selected = Some(CredentialStrategy::AssumedRole(role_arn.clone()));
        }
        if let (Some(access_key_id), Some(secret_access_key)) =
            (&options.access_key_id, &options.secret_access_key)
        {
            selected = Some(CredentialStrategy::StaticKeys {
                access_key_id: access_key_id.clone(),
                secret_access_key: secret_access_key.clone(),
            });
        }
        if let Some(path) = &options.credentials_file {
            selected = Some(CredentialStrategy::CredentialsFile(path.clone()));
        }

        selected
    }

    async fn into_provider(self, region: Region) -> SharedCredentialsProvider {
        match self {
            CredentialStrategy::SharedProfile(profile) => SharedCredentialsProvider::new(
                ProfileFileCredentialsProvider::builder()
                    .profile_name(&profile)
                    .build(),
            ),
            CredentialStrategy::AssumedRole(role_arn) => {
                SharedCredentialsProvider::new(assume_role_provider(&role_arn, region).await)
            }
            CredentialStrategy::StaticKeys {
                access_key_id,
                secret_access_key,
            } => SharedCredentialsProvider::new(Credentials::new(
                access_key_id,
                secret_access_key,
                None,
                None,
                "deploy-options",
            )),
            CredentialStrategy::CredentialsFile(path) => {
                SharedCredentialsProvider::new(JsonFileCredentials { path })
            }
        }
    }
}

/// Builds the one `SdkConfig` value shared by every subsequent call. The
/// region is applied unconditionally; the caller has already folded in any
/// ARN-derived override.
pub async fn resolve_client_config(options: &CredentialOptions, region: &str) -> SdkConfig {
    let region = Region::new(region.to_string());
    let mut loader = aws_config::defaults(BehaviorVersion::latest()).region(region.clone());

    if let Some(strategy) = CredentialStrategy::select(options) {
        loader = loader.credentials_provider(strategy.into_provider(region).await);
    }

    loader.load().await
}

/// Instance-metadata credentials exchanged for temporary role credentials
/// through STS, with the acquisition timeout applied to the exchange.
async fn assume_role_provider(role_arn: &str, region: Region) -> AssumeRoleProvider {
    let base = aws_config::defaults(BehaviorVersion::latest())
        .region(region)
        .credentials_provider(ImdsCredentialsProvider::builder().build())
        .timeout_config(
            TimeoutConfig::builder()
                .operation_timeout(ROLE_ACQUISITION_TIMEOUT)
                .build(),
        )
        .load()
        .await;

    AssumeRoleProvider::builder(role_arn)
        .session_name(SESSION_NAME)
        .configure(&base)
        .build()
        .await
}

/// Credentials loaded from a JSON file in the AWS JS SDK `loadFromPath`
/// shape. The read happens per credential request, never at configuration
/// time.
#[derive(Debug)]
struct JsonFileCredentials {
    path: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CredentialsFile {
    access_key_id: String,
    secret_access_key: String,
    #[serde(default)]
    session_token: Option<String>,
}

impl JsonFileCredentials {
    fn load(&self) -> provider::Result {
        let raw = fs::read_to_string(&self.path).map_err(|error| {
            CredentialsError::provider_error(format!(
                "unable to read credentials file {}: {error}",
                self.path.display()
            ))
        })?;
        let parsed: CredentialsFile = serde_json::from_str(&raw).map_err(|error| {
            CredentialsError::provider_error(format!(
                "malformed credentials file {}: {error}",
                self.path.display()
            ))
        })?;
        Ok(Credentials::new(
            parsed.access_key_id,
            parsed.secret_access_key,
            parsed.session_token,
            None,
            "credentials-file",
        ))
    }
}

impl ProvideCredentials for JsonFileCredentials {
    fn provide_credentials<'a>(&'a self) -> future::ProvideCredentials<'a>
    where
        Self: 'a,
    {
        future::ProvideCredentials::ready(self.load())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn no_options_selects_default_chain() {
        assert_eq!(CredentialStrategy::select(&CredentialOptions::default()), None);
    }

    #[test]
    fn single_strategy_is_selected() {
        let options = CredentialOptions {
            profile: Some("deploy".to_string()),
            ..CredentialOptions::default()
        };
        assert_eq!(
            CredentialStrategy::select(&options),
            Some(CredentialStrategy::SharedProfile("deploy".to_string()))
        );
    }

    #[test]
    fn last_applicable_strategy_wins() {
        let options = CredentialOptions {
            profile: Some("deploy".to_string()),
            role_arn: Some("arn:aws:iam::123456789012:role/deployer".to_string()),
            access_key_id: Some("AKIDEXAMPLE".to_string()),
            secret_access_key: Some("secret".to_string()),
            credentials_file: Some(PathBuf::from("creds.json")),
        };
        assert_eq!(
            CredentialStrategy::select(&options),
            Some(CredentialStrategy::CredentialsFile(PathBuf::from(
                "creds.json"
            )))
        );
    }

    #[test]
    fn role_overrides_profile() {
        let options = CredentialOptions {
            profile: Some("deploy".to_string()),
            role_arn: Some("arn:aws:iam::123456789012:role/deployer".to_string()),
            ..CredentialOptions::default()
        };
        assert_eq!(
            CredentialStrategy::select(&options),
            Some(CredentialStrategy::AssumedRole(
                "arn:aws:iam::123456789012:role/deployer".to_string()
            ))
        );
    }

    #[test]
    fn key_pair_requires_both_halves() {
        let options = CredentialOptions {
            profile: Some("deploy".to_string()),
            access_key_id: Some("AKIDEXAMPLE".to_string()),
            ..CredentialOptions::default()
        };
        assert_eq!(
            CredentialStrategy::select(&options),
            Some(CredentialStrategy::SharedProfile("deploy".to_string()))
        );
    }

    #[test]
    fn credentials_file_is_read_lazily() {
        let provider = JsonFileCredentials {
            path: PathBuf::from("/definitely/not/a/real/path.json"),
        };
        let error = provider.load().expect_err("missing file should fail on load");
        assert!(format!("{error:?}").contains("unable to read credentials file"));
    }

    #[test]
    fn reads_js_sdk_shaped_credentials_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(
            file,
            r#"{{"accessKeyId": "AKIDEXAMPLE", "secretAccessKey": "wJalr", "sessionToken": "tok"}}"#
        )
        .expect("write temp file");

        let provider = JsonFileCredentials {
            path: file.path().to_path_buf(),
        };
        let credentials = provider.load().expect("file should parse");
        assert_eq!(credentials.access_key_id(), "AKIDEXAMPLE");
        assert_eq!(credentials.secret_access_key(), "wJalr");
        assert_eq!(credentials.session_token(), Some("tok"));
    }

    #[test]
    fn rejects_malformed_credentials_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        write!(file, "not json").expect("write temp file");

        let provider = JsonFileCredentials {
            path: file.path().to_path_buf(),
        };
        let error = provider.load().expect_err("malformed file should fail");
        assert!(format!("{error:?}").contains("malformed credentials file"));
    }
}
