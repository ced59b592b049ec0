//! Dashboard host shell.
//!
//! Wires the engine together the way the console's host page does: load
//! the saved layouts, select the current one, and spawn a data runtime
//! per visible widget. Runs until ctrl-c, then tears every widget task
//! down through the master cancellation path.

mod config;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use rentora_gateway::{HttpWidgetFetcher, LayoutClient};
use rentora_runtime::{ResponseCache, WidgetHandle, WidgetRuntime};
use rentora_store::LayoutStore;

use crate::config::DashboardConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rentora_shell=info,rentora_store=info,rentora_runtime=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = DashboardConfig::from_env();
    tracing::info!(api = %config.api_base_url, "Starting dashboard shell");

    let backend = Arc::new(LayoutClient::new(&config.api_base_url, &config.api_token));
    let mut store = LayoutStore::new(backend);

    if let Err(err) = store.load_layouts().await {
        // The store keeps its error state; the dashboard renders empty
        // with a retry affordance instead of exiting.
        tracing::error!(error = %err, "Initial layout load failed");
    }

    let cache = Arc::new(ResponseCache::new(config.cache_ttl));
    let fetcher = Arc::new(HttpWidgetFetcher::new(
        &config.api_base_url,
        &config.api_token,
    ));
    let runtime = WidgetRuntime::new(fetcher, cache);

    let mut handles: Vec<WidgetHandle> = Vec::new();
    match store.current_layout() {
        Some(layout) => {
            tracing::info!(
                layout_name = %layout.name,
                widgets = layout.widgets.len(),
                "Mounting dashboard layout",
            );
            for widget in layout.visible_widgets() {
                let handle = runtime.mount(widget);
                spawn_state_logger(&handle);
                handles.push(handle);
            }
        }
        None => tracing::warn!("No layout available; dashboard is empty"),
    }

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutting down dashboard shell");
    runtime.shutdown();
    drop(handles);

    Ok(())
}

/// Log each widget's lifecycle transitions.
fn spawn_state_logger(handle: &WidgetHandle) {
    let widget_id = handle.widget_id().to_string();
    let mut state_rx = handle.subscribe();

    tokio::spawn(async move {
        while state_rx.changed().await.is_ok() {
            let state = state_rx.borrow().clone();
            if let Some(error) = &state.error {
                tracing::warn!(widget_id = %widget_id, ?error, "Widget entered error state");
            } else if !state.loading && state.data.is_some() {
                tracing::info!(widget_id = %widget_id, "Widget data updated");
            }
        }
    });
}
