//! Production widget-data fetcher.
//!
//! Implements [`WidgetFetch`] over HTTP: one GET per widget type under
//! `/widget-data/`, query parameters derived from the widget's settings,
//! bearer-token auth. Response bodies are opaque JSON; interpreting them
//! is the renderer's business.

use std::time::Duration;

use async_trait::async_trait;

use rentora_runtime::{FetchError, QueryParams, WidgetFetch};

/// HTTP request timeout for a single widget-data read.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP-backed [`WidgetFetch`] implementation.
pub struct HttpWidgetFetcher {
    http: reqwest::Client,
    base_url: String,
    bearer_token: String,
}

impl HttpWidgetFetcher {
    pub fn new(base_url: impl Into<String>, bearer_token: impl Into<String>) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            bearer_token: bearer_token.into(),
        }
    }
}

#[async_trait]
impl WidgetFetch for HttpWidgetFetcher {
    async fn fetch(
        &self,
        endpoint: &str,
        params: &QueryParams,
    ) -> Result<serde_json::Value, FetchError> {
        let url = format!("{}/widget-data/{endpoint}", self.base_url);
        let query: Vec<(&str, &str)> = params.pairs().collect();

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.bearer_token)
            .query(&query)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    FetchError::Timeout(REQUEST_TIMEOUT)
                } else {
                    FetchError::Request(err.to_string())
                }
            })?;

        let status = response.status();
        if status.as_u16() == 401 {
            return Err(FetchError::Unauthorized);
        }
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }

        response
            .json()
            .await
            .map_err(|err| FetchError::Request(err.to_string()))
    }
}
