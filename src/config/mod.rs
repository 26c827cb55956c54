//! Configuration loading
//!
//! The configuration file is YAML with four sections (`account`, `product`,
//! `app`, `compliance`) plus an optional `endpoint` section. Every optional key
//! has a default in [`defaults`]; command-line values are layered on top with
//! [`ConfigOverrides`] before validation produces an [`AppConfig`].

pub mod defaults;
pub mod run;

pub use run::{RunConfiguration, RunMode, StartSpec};

use crate::fetcher::endpoint::{Credentials, EndpointConfig, RequestFilters};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::TimeDelta;
use defaults::*;
use serde::{Deserialize, Deserializer, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read config file {path}: {message}")]
    Io {
        /// Config file path
        path: PathBuf,
        /// Underlying error
        message: String,
    },

    /// File is not valid YAML for the expected layout
    #[error("failed to parse YAML: {0}")]
    Parse(String),

    /// Required settings missing or out of range; the poller must not run
    #[error("configuration invalid: {0}")]
    ConfigurationInvalid(String),
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Raw configuration file layout
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileConfig {
    /// Account and credentials
    #[serde(default)]
    pub account: AccountSection,
    /// Optional request filters
    #[serde(default)]
    pub product: Option<ProductSection>,
    /// Scheduling settings
    #[serde(default)]
    pub app: AppSection,
    /// Output settings
    #[serde(default)]
    pub compliance: ComplianceSection,
    /// Endpoint overrides
    #[serde(default)]
    pub endpoint: EndpointSection,
}

/// `account:` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountSection {
    /// Account identifier appended to the endpoint URL
    pub account_name: Option<String>,
    /// Basic auth user name
    pub user_name: Option<String>,
    /// Plain-text password
    pub password: Option<String>,
    /// Base64-encoded password; wins over `password`
    pub password_encoded: Option<String>,
}

/// `product:` section, passed through to the request as-is
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductSection {
    /// `product` query parameter
    pub product: Option<String>,
    /// `stream_type` query parameter
    pub stream_type: Option<String>,
    /// `label` query parameter
    pub label: Option<String>,
}

/// `app:` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppSection {
    /// `one_time` or `real-time`
    pub run_mode: Option<String>,
    /// Start of the first window, or `file`
    #[serde(default, deserialize_with = "scalar_string")]
    pub start_time: Option<String>,
    /// Explicit end of a single window
    #[serde(default, deserialize_with = "scalar_string")]
    pub end_time: Option<String>,
    /// Hours to go back when resuming without a checkpoint
    pub initial_go_back: Option<f64>,
    /// Sleep increment between windows
    pub sleep_time_in_seconds: Option<u64>,
    /// Sleep increment before the first window
    pub hold_off_in_seconds: Option<u64>,
    /// Window length
    pub query_length_in_seconds: Option<u64>,
    /// Storage backend; only `files`
    pub storage: Option<String>,
    /// Write logs to this file instead of stdout
    pub log_file_path: Option<PathBuf>,
}

/// `compliance:` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComplianceSection {
    /// Output root
    pub out_box: Option<PathBuf>,
    /// Accepted for compatibility; compression is not implemented
    pub compress_files: Option<bool>,
    /// Checkpoint file location
    pub checkpoint_file: Option<PathBuf>,
}

/// `endpoint:` section
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndpointSection {
    /// URL prefix the account name is appended to
    pub base_url: Option<String>,
    /// Publisher path segment
    pub publisher: Option<String>,
    /// Request timeout
    pub timeout_seconds: Option<u64>,
}

/// Values supplied on the command line; each one replaces the file value.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    /// `--start-time`
    pub start_time: Option<String>,
    /// `--end-time`
    pub end_time: Option<String>,
    /// `--outbox`
    pub out_box: Option<PathBuf>,
    /// `--run-mode`
    pub run_mode: Option<RunMode>,
}

/// Validated configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Basic auth credentials and account
    pub credentials: Credentials,
    /// Optional request filters
    pub filters: RequestFilters,
    /// Endpoint location
    pub endpoint: EndpointConfig,
    /// Scheduler settings
    pub run: RunConfiguration,
    /// Output root
    pub out_box: PathBuf,
    /// Checkpoint file
    pub checkpoint_file: PathBuf,
    /// Optional log file
    pub log_file_path: Option<PathBuf>,
}

impl FileConfig {
    /// Load configuration from a YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading configuration file");
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(content: &str) -> ConfigResult<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Layer command-line values over the file values
    pub fn apply_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        if let Some(start) = &overrides.start_time {
            self.app.start_time = Some(start.clone());
        }
        if let Some(end) = &overrides.end_time {
            self.app.end_time = Some(end.clone());
        }
        if let Some(out_box) = &overrides.out_box {
            self.compliance.out_box = Some(out_box.clone());
        }
        if let Some(mode) = overrides.run_mode {
            self.app.run_mode = Some(mode.to_string());
        }
        self
    }

    /// Validate and resolve defaults
    pub fn into_app_config(self) -> ConfigResult<AppConfig> {
        let credentials = self.resolve_credentials()?;
        let run = self.resolve_run_configuration()?;

        match self.app.storage.as_deref().map(str::trim) {
            None | Some(STORAGE_FILES) => {}
            Some(other) => {
                return Err(ConfigError::ConfigurationInvalid(format!(
                    "unsupported storage '{other}': only '{STORAGE_FILES}' is implemented"
                )))
            }
        }

        if self.compliance.compress_files == Some(true) {
            warn!("compress_files is not supported; output is written uncompressed");
        }

        let filters = self
            .product
            .map(|p| RequestFilters {
                product: non_empty(p.product),
                stream_type: non_empty(p.stream_type),
                label: non_empty(p.label),
            })
            .unwrap_or_default();

        let timeout_secs = self.endpoint.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::ConfigurationInvalid(
                "endpoint.timeout_seconds must be positive".to_string(),
            ));
        }

        let endpoint = EndpointConfig {
            base_url: non_empty(self.endpoint.base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            publisher: non_empty(self.endpoint.publisher)
                .unwrap_or_else(|| DEFAULT_PUBLISHER.to_string()),
            timeout: Duration::from_secs(timeout_secs),
        };

        Ok(AppConfig {
            credentials,
            filters,
            endpoint,
            run,
            out_box: self
                .compliance
                .out_box
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUT_BOX)),
            checkpoint_file: self
                .compliance
                .checkpoint_file
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CHECKPOINT_FILE)),
            log_file_path: self.app.log_file_path,
        })
    }

    fn resolve_credentials(&self) -> ConfigResult<Credentials> {
        let user_name = non_empty(self.account.user_name.clone()).ok_or_else(|| {
            ConfigError::ConfigurationInvalid("account.user_name is required".to_string())
        })?;

        let account_name = non_empty(self.account.account_name.clone()).ok_or_else(|| {
            ConfigError::ConfigurationInvalid("account.account_name is required".to_string())
        })?;

        let password = match (&self.account.password_encoded, &self.account.password) {
            (Some(encoded), _) => decode_password(encoded)?,
            (None, Some(plain)) => plain.clone(),
            (None, None) => {
                return Err(ConfigError::ConfigurationInvalid(
                    "account.password or account.password_encoded is required".to_string(),
                ))
            }
        };

        Ok(Credentials {
            account_name,
            user_name,
            password,
        })
    }

    fn resolve_run_configuration(&self) -> ConfigResult<RunConfiguration> {
        let app = &self.app;

        let run_mode = match app.run_mode.as_deref() {
            None => RunMode::OneShot,
            Some(mode) => mode
                .parse::<RunMode>()
                .map_err(ConfigError::ConfigurationInvalid)?,
        };

        let query_length_secs = app
            .query_length_in_seconds
            .unwrap_or(DEFAULT_QUERY_LENGTH_SECS);
        if query_length_secs == 0 || query_length_secs % 60 != 0 {
            return Err(ConfigError::ConfigurationInvalid(format!(
                "app.query_length_in_seconds must be a positive multiple of 60, got {query_length_secs}"
            )));
        }

        let poll_secs = app.sleep_time_in_seconds.unwrap_or(DEFAULT_SLEEP_TIME_SECS);
        let hold_off_secs = app.hold_off_in_seconds.unwrap_or(DEFAULT_HOLD_OFF_SECS);
        if poll_secs == 0 || hold_off_secs == 0 {
            return Err(ConfigError::ConfigurationInvalid(
                "app.sleep_time_in_seconds and app.hold_off_in_seconds must be positive"
                    .to_string(),
            ));
        }

        let go_back_hours = app.initial_go_back.unwrap_or(DEFAULT_INITIAL_GO_BACK_HOURS);
        if !go_back_hours.is_finite() || go_back_hours < 0.0 {
            return Err(ConfigError::ConfigurationInvalid(format!(
                "app.initial_go_back must be a non-negative number of hours, got {go_back_hours}"
            )));
        }
        let initial_lookback = TimeDelta::try_seconds((go_back_hours * 3_600.0).round() as i64)
            .ok_or_else(|| {
                ConfigError::ConfigurationInvalid("app.initial_go_back is too large".to_string())
            })?;

        let query_length = i64::try_from(query_length_secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .ok_or_else(|| {
                ConfigError::ConfigurationInvalid(
                    "app.query_length_in_seconds is too large".to_string(),
                )
            })?;

        Ok(RunConfiguration {
            run_mode,
            query_length,
            min_latency: TimeDelta::seconds(COMPLIANCE_MIN_LATENCY_SECS),
            poll_interval: Duration::from_secs(poll_secs),
            hold_off_poll: Duration::from_secs(hold_off_secs),
            initial_lookback,
            start: StartSpec::from_input(app.start_time.as_deref()),
            end: non_empty(app.end_time.clone()),
        })
    }
}

impl AppConfig {
    /// Load a file, apply overrides and validate in one step
    pub fn load<P: AsRef<Path>>(path: P, overrides: &ConfigOverrides) -> ConfigResult<Self> {
        FileConfig::load(path)?
            .apply_overrides(overrides)
            .into_app_config()
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn decode_password(encoded: &str) -> ConfigResult<String> {
    // Encoders commonly wrap at 60 columns
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64.decode(compact).map_err(|e| {
        ConfigError::ConfigurationInvalid(format!("account.password_encoded is not base64: {e}"))
    })?;
    String::from_utf8(bytes).map_err(|_| {
        ConfigError::ConfigurationInvalid("account.password_encoded is not UTF-8".to_string())
    })
}

/// Accept `start_time: 201311151546` (a YAML integer) as well as strings.
fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Integer(u64),
    }

    Ok(Option::<Scalar>::deserialize(deserializer)?.map(|s| match s {
        Scalar::Text(text) => text,
        Scalar::Integer(n) => n.to_string(),
    }))
}
