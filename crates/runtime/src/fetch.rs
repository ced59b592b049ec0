//! The fetch seam between widget runtimes and the HTTP layer.
//!
//! [`WidgetFetch`] is implemented by the gateway's HTTP client in
//! production and by scripted doubles in tests. [`QueryParams`] gives every
//! widget's settings a canonical query representation so equal parameter
//! sets always share one cache key.

use std::collections::BTreeMap;

use async_trait::async_trait;

use rentora_core::layout::REFRESH_INTERVAL_KEY;

use crate::error::FetchError;

// ---------------------------------------------------------------------------
// QueryParams
// ---------------------------------------------------------------------------

/// Widget-specific query parameters derived from a widget's settings.
///
/// Keys are kept sorted so serialisation is canonical: two settings maps
/// with the same scalar entries produce identical cache keys regardless of
/// insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams(BTreeMap<String, String>);

impl QueryParams {
    /// Derive query parameters from widget settings.
    ///
    /// Scalar values (strings, numbers, booleans) become parameters;
    /// nested structures and nulls are skipped. `refreshInterval` is a
    /// runtime concern, not an endpoint filter, and is excluded.
    pub fn from_settings(settings: &serde_json::Map<String, serde_json::Value>) -> Self {
        let mut params = BTreeMap::new();
        for (key, value) in settings {
            if key == REFRESH_INTERVAL_KEY {
                continue;
            }
            let rendered = match value {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                _ => continue,
            };
            params.insert(key.clone(), rendered);
        }
        Self(params)
    }

    /// Key/value pairs in canonical (sorted) order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Canonical `key=value&key=value` rendering used for cache keys.
    pub fn canonical(&self) -> String {
        let mut out = String::new();
        for (key, value) in &self.0 {
            if !out.is_empty() {
                out.push('&');
            }
            out.push_str(key);
            out.push('=');
            out.push_str(value);
        }
        out
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---------------------------------------------------------------------------
// WidgetFetch
// ---------------------------------------------------------------------------

/// One read call against a widget-data endpoint.
///
/// Implementations must be cancellation-safe: the runtime drops the
/// returned future when a newer fetch supersedes it or the widget
/// unmounts, and a dropped attempt must leave no observable side effects.
#[async_trait]
pub trait WidgetFetch: Send + Sync {
    async fn fetch(
        &self,
        endpoint: &str,
        params: &QueryParams,
    ) -> Result<serde_json::Value, FetchError>;
}
