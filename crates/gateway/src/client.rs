//! HTTP client for the layout persistence backend.
//!
//! [`LayoutClient`] speaks the four layout endpoints over REST/JSON with
//! bearer-token auth. The [`LayoutBackend`] trait is the seam the layout
//! store programs against, so tests can substitute an in-memory backend.

use std::time::Duration;

use async_trait::async_trait;

use rentora_core::layout::Layout;
use rentora_core::types::LayoutId;

use crate::wire::WireLayout;

/// HTTP request timeout for a single backend call.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

// ---------------------------------------------------------------------------
// Error
// ---------------------------------------------------------------------------

/// Error type for layout backend calls.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// The backend rejected the bearer token (401).
    #[error("Authentication failed")]
    Unauthorized,

    /// The backend answered with a non-2xx status other than 401.
    #[error("Layout backend returned HTTP {0}")]
    HttpStatus(u16),

    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
}

// ---------------------------------------------------------------------------
// LayoutBackend
// ---------------------------------------------------------------------------

/// The four logical operations the layout store needs from persistence.
#[async_trait]
pub trait LayoutBackend: Send + Sync {
    /// All layouts for the current user.
    async fn list_layouts(&self) -> Result<Vec<Layout>, GatewayError>;

    /// Persist a layout; returns the saved layout with its backend id.
    async fn save_layout(&self, layout: &Layout) -> Result<Layout, GatewayError>;

    /// Delete a layout by id.
    async fn delete_layout(&self, id: LayoutId) -> Result<(), GatewayError>;

    /// Mark a layout as the user's default.
    async fn set_default_layout(&self, id: LayoutId) -> Result<(), GatewayError>;
}

// ---------------------------------------------------------------------------
// LayoutClient
// ---------------------------------------------------------------------------

/// Production [`LayoutBackend`] over HTTP.
pub struct LayoutClient {
    http: reqwest::Client,
    base_url: String,
    bearer_token: String,
}

impl LayoutClient {
    /// Create a client for a backend base URL (e.g.
    /// `https://api.rentora.example/api/v1`).
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

    /// Map a response status onto the error taxonomy.
    fn check_status(response: reqwest::Response) -> Result<reqwest::Response, GatewayError> {
        let status = response.status();
        if status.as_u16() == 401 {
            return Err(GatewayError::Unauthorized);
        }
        if !status.is_success() {
            return Err(GatewayError::HttpStatus(status.as_u16()));
        }
        Ok(response)
    }
}

#[async_trait]
impl LayoutBackend for LayoutClient {
    async fn list_layouts(&self) -> Result<Vec<Layout>, GatewayError> {
        let response = self
            .http
            .get(format!("{}/layouts", self.base_url))
            .bearer_auth(&self.bearer_token)
            .send()
            .await?;
        let wires: Vec<WireLayout> = Self::check_status(response)?.json().await?;

        tracing::debug!(count = wires.len(), "Loaded layouts from backend");
        Ok(wires.into_iter().map(WireLayout::into_layout).collect())
    }

    async fn save_layout(&self, layout: &Layout) -> Result<Layout, GatewayError> {
        let wire = WireLayout::from_layout(layout);
        let response = self
            .http
            .post(format!("{}/layouts", self.base_url))
            .bearer_auth(&self.bearer_token)
            .json(&wire)
            .send()
            .await?;
        let saved: WireLayout = Self::check_status(response)?.json().await?;

        tracing::info!(layout_id = ?saved.id, layout_name = %saved.name, "Layout saved");
        Ok(saved.into_layout())
    }

    async fn delete_layout(&self, id: LayoutId) -> Result<(), GatewayError> {
        let response = self
            .http
            .delete(format!("{}/layouts/{id}", self.base_url))
            .bearer_auth(&self.bearer_token)
            .send()
            .await?;
        Self::check_status(response)?;

        tracing::info!(layout_id = id, "Layout deleted");
        Ok(())
    }

    async fn set_default_layout(&self, id: LayoutId) -> Result<(), GatewayError> {
        let response = self
            .http
            .post(format!("{}/layouts/{id}/default", self.base_url))
            .bearer_auth(&self.bearer_token)
            .send()
            .await?;
        Self::check_status(response)?;

        tracing::info!(layout_id = id, "Layout set as default");
        Ok(())
    }
}
