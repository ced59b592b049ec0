use std::time::Duration;

/// Shell configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development against a
/// backend on localhost.
#[derive(Debug, Clone)]
pub struct DashboardConfig {
    /// Base URL of the console API (default: `http://localhost:3000/api/v1`).
    pub api_base_url: String,
    /// Bearer token sent on every request (default: empty).
    pub api_token: String,
    /// TTL for the shared widget-data response cache (default: `60`).
    pub cache_ttl: Duration,
}

impl DashboardConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                         |
    /// |--------------------------|---------------------------------|
    /// | `RENTORA_API_URL`        | `http://localhost:3000/api/v1`  |
    /// | `RENTORA_API_TOKEN`      | *(empty)*                       |
    /// | `RENTORA_CACHE_TTL_SECS` | `60`                            |
    pub fn from_env() -> Self {
        let api_base_url = std::env::var("RENTORA_API_URL")
            .unwrap_or_else(|_| "http://localhost:3000/api/v1".into());

        let api_token = std::env::var("RENTORA_API_TOKEN").unwrap_or_default();

        let cache_ttl_secs: u64 = std::env::var("RENTORA_CACHE_TTL_SECS")
            .unwrap_or_else(|_| "60".into())
            .parse()
            .expect("RENTORA_CACHE_TTL_SECS must be a valid u64");

        Self {
            api_base_url,
            api_token,
            cache_ttl: Duration::from_secs(cache_ttl_secs),
        }
    }
}
