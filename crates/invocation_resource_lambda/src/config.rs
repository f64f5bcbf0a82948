use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use aws_config::sts::AssumeRoleProvider;
use aws_config::BehaviorVersion;
use aws_sdk_lambda::config::Region;
use invocation_resource_core::contract::ResourceConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_PROFILE: &str = "default";
pub const ASSUME_ROLE_SESSION_NAME: &str = "lambdabased";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AssumeRoleConfig {
    pub role_arn: String,
}

/// Where and as whom functions are invoked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProviderConfig {
    #[serde(default = "default_profile")]
    pub profile: String,
    /// Empty means the region resolved from the profile or environment.
    #[serde(default)]
    pub region: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assume_role: Option<AssumeRoleConfig>,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            region: String::new(),
            assume_role: None,
        }
    }
}

/// Command line / environment values that take precedence over the manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderOverrides {
    pub profile: Option<String>,
    pub region: Option<String>,
    pub assume_role_arn: Option<String>,
}

impl ProviderConfig {
    pub fn with_overrides(mut self, overrides: ProviderOverrides) -> Self {
        if let Some(profile) = non_blank(overrides.profile) {
            self.profile = profile;
        }
        if let Some(region) = non_blank(overrides.region) {
            self.region = region;
        }
        if let Some(role_arn) = non_blank(overrides.assume_role_arn) {
            self.assume_role = Some(AssumeRoleConfig { role_arn });
        }
        self
    }
}

/// Declared resources plus the provider settings used to reach them.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Manifest {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceConfig>,
}

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to read manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed manifest {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl Manifest {
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let body = fs::read(path).map_err(|source| ManifestError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&body).map_err(|source| ManifestError::Malformed {
            path: path.to_path_buf(),
            source,
        })
    }
}

pub fn default_profile() -> String {
    DEFAULT_PROFILE.to_string()
}

/// Builds a Lambda client for the configured profile, region and role.
pub async fn build_lambda_client(config: &ProviderConfig) -> aws_sdk_lambda::Client {
    let mut loader = aws_config::defaults(BehaviorVersion::latest()).profile_name(&config.profile);
    if !config.region.trim().is_empty() {
        loader = loader.region(Region::new(config.region.clone()));
    }
    let sdk_config = loader.load().await;

    let Some(assume_role) = &config.assume_role else {
        return aws_sdk_lambda::Client::new(&sdk_config);
    };

    let role_provider = AssumeRoleProvider::builder(assume_role.role_arn.clone())
        .session_name(ASSUME_ROLE_SESSION_NAME)
        .configure(&sdk_config)
        .build()
        .await;
    let lambda_config = aws_sdk_lambda::config::Builder::from(&sdk_config)
        .credentials_provider(role_provider)
        .build();
    aws_sdk_lambda::Client::from_conf(lambda_config)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}
