//! Endpoint location, credentials and request filters
//!
//! The compliance URL is
//! `{base_url}{account_name}/publishers/{publisher}/compliance.json`; only the
//! account name and publisher vary between deployments, so they are plain
//! configuration rather than code.

use std::fmt;
use std::time::Duration;

/// Where the compliance endpoint lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointConfig {
    /// URL prefix the account name is appended to
    pub base_url: String,
    /// Publisher path segment (e.g. `twitter`)
    pub publisher: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl EndpointConfig {
    /// Full compliance URL for `account_name`
    pub fn compliance_url(&self, account_name: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        format!(
            "{base}/{}/publishers/{}/compliance.json",
            account_name.trim(),
            self.publisher.trim()
        )
    }
}

/// Basic auth credentials and the account they belong to
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account identifier
    pub account_name: String,
    /// Basic auth user name
    pub user_name: String,
    /// Basic auth password (decoded)
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("account_name", &self.account_name)
            .field("user_name", &self.user_name)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Optional filters passed through to the request untouched
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestFilters {
    /// `product` parameter
    pub product: Option<String>,
    /// `stream_type` parameter
    pub stream_type: Option<String>,
    /// `label` parameter
    pub label: Option<String>,
}

impl RequestFilters {
    /// Present filters as query pairs, in a stable order
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        [
            ("product", &self.product),
            ("stream_type", &self.stream_type),
            ("label", &self.label),
        ]
        .into_iter()
        .filter_map(|(key, value)| value.clone().map(|v| (key, v)))
        .collect()
    }
}
