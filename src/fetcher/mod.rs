//! Compliance data fetching
//!
//! [`ComplianceSource`] is the seam between the scheduler and the network: one
//! call per window, returning a classified [`FetchResult`] instead of an error
//! so a bad window never aborts a continuous run.

use async_trait::async_trait;
use bytes::Bytes;
use std::fmt;

pub mod compliance_http;
pub mod endpoint;

pub use compliance_http::ComplianceHttpClient;
pub use endpoint::{Credentials, EndpointConfig, RequestFilters};

/// The only status code treated as success
pub const SUCCESS_STATUS: u16 = 200;

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// HTTP client could not be built
    #[error("HTTP client error: {0}")]
    ClientError(String),

    /// Endpoint URL is malformed
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(String),
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// Outcome classification of one request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// Exactly [`SUCCESS_STATUS`]
    Success,
    /// Any other HTTP status
    HttpError(u16),
    /// No response was obtained
    TransportError,
}

impl FetchStatus {
    /// Classify an HTTP status code
    pub fn from_code(code: u16) -> Self {
        if code == SUCCESS_STATUS {
            FetchStatus::Success
        } else {
            FetchStatus::HttpError(code)
        }
    }

    /// Short label for logs and metrics
    pub fn label(&self) -> String {
        match self {
            FetchStatus::Success => SUCCESS_STATUS.to_string(),
            FetchStatus::HttpError(code) => code.to_string(),
            FetchStatus::TransportError => "transport_error".to_string(),
        }
    }
}

impl fmt::Display for FetchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FetchStatus::Success => write!(f, "success"),
            FetchStatus::HttpError(code) => write!(f, "HTTP error {code}"),
            FetchStatus::TransportError => write!(f, "transport error"),
        }
    }
}

/// Classified response of one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResult {
    /// Classification
    pub status: FetchStatus,
    /// Response body, if a response was obtained
    pub payload: Option<Bytes>,
}

impl FetchResult {
    /// Response with the given status code and body
    pub fn response(code: u16, body: impl Into<Bytes>) -> Self {
        Self {
            status: FetchStatus::from_code(code),
            payload: Some(body.into()),
        }
    }

    /// No response at all
    pub fn transport_error() -> Self {
        Self {
            status: FetchStatus::TransportError,
            payload: None,
        }
    }

    /// Whether the request succeeded
    pub fn is_success(&self) -> bool {
        self.status == FetchStatus::Success
    }
}

/// Query for one window
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComplianceQuery {
    /// Window start, canonical form
    pub from_date: String,
    /// Window end, canonical form
    pub to_date: String,
    /// Optional pass-through filters
    pub filters: RequestFilters,
}

impl ComplianceQuery {
    /// Query parameters in request order
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("fromDate", self.from_date.clone()),
            ("toDate", self.to_date.clone()),
        ];
        params.extend(self.filters.to_params());
        params
    }
}

/// Something that can answer a compliance query
#[async_trait]
pub trait ComplianceSource: Send + Sync {
    /// Issue exactly one request and classify the outcome
    async fn fetch(&self, query: &ComplianceQuery) -> FetchResult;

    /// Endpoint description for logs
    fn endpoint(&self) -> &str;
}
