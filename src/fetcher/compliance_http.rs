//! HTTP client for the compliance endpoint
//!
//! One GET per window with Basic Authentication and JSON content headers.
//! There is no retry here: a failed window is reported and the scheduler
//! moves on to the next one.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, error, warn};

use crate::fetcher::endpoint::{Credentials, EndpointConfig};
use crate::fetcher::{ComplianceQuery, ComplianceSource, FetchResult, FetcherError, FetcherResult};
use crate::metrics::RequestMetrics;

const JSON: &str = "application/json";

/// Compliance endpoint client
pub struct ComplianceHttpClient {
    client: Arc<Client>,
    url: String,
    credentials: Credentials,
}

impl ComplianceHttpClient {
    /// Build a client for `credentials.account_name` on `endpoint`
    pub fn new(endpoint: &EndpointConfig, credentials: Credentials) -> FetcherResult<Self> {
        let url = endpoint.compliance_url(&credentials.account_name);
        reqwest::Url::parse(&url).map_err(|e| FetcherError::InvalidUrl(format!("{url}: {e}")))?;

        let client = Client::builder()
            .timeout(endpoint.timeout)
            .default_headers(default_headers())
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetcherError::ClientError(e.to_string()))?;

        Ok(Self::with_client(Arc::new(client), url, credentials))
    }

    /// Use an existing client (shares its connection pool)
    pub fn with_client(client: Arc<Client>, url: impl Into<String>, credentials: Credentials) -> Self {
        Self {
            client,
            url: url.into(),
            credentials,
        }
    }

    /// Full request URL without query string
    pub fn url(&self) -> &str {
        &self.url
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON));
    headers.insert(ACCEPT, HeaderValue::from_static(JSON));
    headers
}

#[async_trait]
impl ComplianceSource for ComplianceHttpClient {
    async fn fetch(&self, query: &ComplianceQuery) -> FetchResult {
        let params = query.to_params();
        debug!(url = %self.url, ?params, "Calling compliance endpoint");

        let metrics = RequestMetrics::start();
        let response = match self
            .client
            .get(&self.url)
            .query(&params)
            .basic_auth(&self.credentials.user_name, Some(&self.credentials.password))
            .send()
            .await
        {
            Ok(resp) => resp,
            Err(e) => {
                metrics.record_transport_error();
                error!(url = %self.url, error = %e, "No response from compliance endpoint");
                return FetchResult::transport_error();
            }
        };

        let code = response.status().as_u16();
        let body = match response.bytes().await {
            Ok(body) => body,
            Err(e) => {
                metrics.record_transport_error();
                error!(
                    url = %self.url,
                    status = code,
                    error = %e,
                    "Failed to read compliance response body"
                );
                return FetchResult::transport_error();
            }
        };

        metrics.record_status(code);
        let result = FetchResult::response(code, body);
        if !result.is_success() {
            warn!(status = code, "Non-success response code from compliance endpoint");
        }
        result
    }

    fn endpoint(&self) -> &str {
        &self.url
    }
}
