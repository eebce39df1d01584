use std::path::Path;
use std::time::Duration;

use error_stack::{Report, ResultExt};
use onboard_common::config::{parse_toml, read_toml, ConfigError, ConfigResult};
use onboard_common::PopulateConfig;
use serde_derive::{Deserialize, Serialize};
use url::Url;

fn default_max_retries() -> u32 {
    3
}

fn default_retry_delay_ms() -> u64 {
    100
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Connection settings for a JSON-RPC node
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcConfig {
    pub url: String,
    /// Extra attempts made after a transport failure
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl RpcConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    pub fn parsed_url(&self) -> ConfigResult<Url> {
        Url::parse(&self.url).map_err(|e| {
            Report::new(ConfigError::InvalidValue {
                field: "url".to_string(),
                value: format!("{}: {}", self.url, e),
            })
        })
    }

    pub fn retry_delay(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_delay_ms.saturating_mul(attempt as u64))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn from_toml_str(input: &str) -> ConfigResult<Self> {
        let config: Self = parse_toml(input)?;
        config.parsed_url()?;
        Ok(config)
    }
}

/// Configuration file with an `[rpc]` and an optional `[populate]` section
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnboardConfig {
    pub rpc: RpcConfig,
    #[serde(default)]
    pub populate: PopulateConfig,
}

impl OnboardConfig {
    pub fn from_toml_str(input: &str) -> ConfigResult<Self> {
        let config: Self = parse_toml(input)?;
        config.rpc.parsed_url().attach_printable("Validating [rpc] section")?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let config: Self = read_toml(path)?;
        config
            .rpc
            .parsed_url()
            .attach_printable(format!("Validating [rpc] section of {}", path.display()))?;
        Ok(config)
    }
}
