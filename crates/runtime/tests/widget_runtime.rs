//! Lifecycle tests for the widget data runtime: retry ceiling, cache
//! behaviour, in-flight supersession, and unmount teardown.
//!
//! All tests run on a paused tokio clock, so retry delays and refresh
//! intervals elapse instantly and deterministically.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use tokio::sync::watch;

use rentora_core::catalog::WidgetType;
use rentora_core::layout::{GridPosition, WidgetInstance, REFRESH_INTERVAL_KEY};
use rentora_runtime::{
    FetchError, QueryParams, ResponseCache, WidgetDataError, WidgetDataState, WidgetFetch,
    WidgetRuntime,
};

// ---------------------------------------------------------------------------
// Scripted fetch double
// ---------------------------------------------------------------------------

/// One scripted response per call; the last script repeats forever.
#[derive(Clone)]
enum Script {
    Ok(serde_json::Value),
    Err(FetchError),
    /// Sleep, then answer. Used to hold a fetch in flight.
    DelayedOk(Duration, serde_json::Value),
}

struct ScriptedFetcher {
    scripts: Mutex<Vec<Script>>,
    calls: AtomicU32,
}

impl ScriptedFetcher {
    fn new(scripts: Vec<Script>) -> Arc<Self> {
        assert!(!scripts.is_empty());
        Arc::new(Self {
            scripts: Mutex::new(scripts),
            calls: AtomicU32::new(0),
        })
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl WidgetFetch for ScriptedFetcher {
    async fn fetch(
        &self,
        _endpoint: &str,
        _params: &QueryParams,
    ) -> Result<serde_json::Value, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let script = {
            let mut scripts = self.scripts.lock().unwrap();
            if scripts.len() > 1 {
                scripts.remove(0)
            } else {
                scripts[0].clone()
            }
        };
        match script {
            Script::Ok(value) => Ok(value),
            Script::Err(err) => Err(err),
            Script::DelayedOk(delay, value) => {
                tokio::time::sleep(delay).await;
                Ok(value)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A recent-orders widget with an explicit refresh interval.
fn widget(refresh_secs: u64) -> WidgetInstance {
    let mut settings = serde_json::Map::new();
    settings.insert(REFRESH_INTERVAL_KEY.into(), serde_json::json!(refresh_secs));
    WidgetInstance::new(WidgetType::RecentOrders, GridPosition::new(0, 0, 6))
        .with_settings(settings)
}

/// Await the first state snapshot satisfying `pred`.
async fn wait_for(
    rx: &mut watch::Receiver<WidgetDataState>,
    pred: impl Fn(&WidgetDataState) -> bool,
) -> WidgetDataState {
    loop {
        {
            let state = rx.borrow_and_update();
            if pred(&state) {
                return state.clone();
            }
        }
        rx.changed().await.expect("widget task ended unexpectedly");
    }
}

/// Yield until the fetcher has seen `expected` calls (or give up).
async fn wait_for_calls(fetcher: &ScriptedFetcher, expected: u32) {
    for _ in 0..100 {
        if fetcher.calls() == expected {
            return;
        }
        tokio::task::yield_now().await;
    }
    assert_eq!(fetcher.calls(), expected, "fetch count never reached");
}

// ---------------------------------------------------------------------------
// Test: mount fetches immediately and publishes data
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn mount_fetches_immediately() {
    let fetcher = ScriptedFetcher::new(vec![Script::Ok(serde_json::json!({ "orders": [] }))]);
    let runtime = WidgetRuntime::new(fetcher.clone(), Arc::new(ResponseCache::default()));

    let handle = runtime.mount(&widget(3600));
    let mut rx = handle.subscribe();

    let state = wait_for(&mut rx, |s| s.data.is_some()).await;
    assert_eq!(state.data, Some(serde_json::json!({ "orders": [] })));
    assert!(!state.loading);
    assert_eq!(state.error, None);
    assert!(state.last_updated.is_some());
    assert_eq!(fetcher.calls(), 1);
}

// ---------------------------------------------------------------------------
// Test: retry ceiling — 1 + retry_limit attempts, then terminal error
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn transient_failure_is_attempted_exactly_four_times() {
    let fetcher = ScriptedFetcher::new(vec![Script::Err(FetchError::HttpStatus(503))]);
    let runtime = WidgetRuntime::new(fetcher.clone(), Arc::new(ResponseCache::default()));

    let handle = runtime.mount(&widget(3600));
    let mut rx = handle.subscribe();

    let state = wait_for(&mut rx, |s| s.error.is_some()).await;
    assert_matches!(state.error, Some(WidgetDataError::Failed(_)));
    assert!(!state.loading);
    assert_eq!(state.data, None);
    assert_eq!(fetcher.calls(), 4);

    // Terminal means terminal: nothing else fires until the next tick.
    tokio::time::advance(Duration::from_secs(5)).await;
    tokio::task::yield_now().await;
    assert_eq!(fetcher.calls(), 4);
}

// ---------------------------------------------------------------------------
// Test: 401 surfaces immediately, never retried
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn auth_errors_are_not_retried() {
    let fetcher = ScriptedFetcher::new(vec![Script::Err(FetchError::Unauthorized)]);
    let runtime = WidgetRuntime::new(fetcher.clone(), Arc::new(ResponseCache::default()));

    let handle = runtime.mount(&widget(3600));
    let mut rx = handle.subscribe();

    let state = wait_for(&mut rx, |s| s.error.is_some()).await;
    assert_eq!(state.error, Some(WidgetDataError::Unauthorized));
    assert_eq!(fetcher.calls(), 1);
}

// ---------------------------------------------------------------------------
// Test: cache hit short-circuits the network
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn second_widget_with_same_params_hits_the_cache() {
    let fetcher = ScriptedFetcher::new(vec![Script::Ok(serde_json::json!([1, 2]))]);
    let cache = Arc::new(ResponseCache::new(Duration::from_secs(60)));
    let runtime = WidgetRuntime::new(fetcher.clone(), cache);

    let first = runtime.mount(&widget(3600));
    let mut first_rx = first.subscribe();
    wait_for(&mut first_rx, |s| s.data.is_some()).await;

    let second = runtime.mount(&widget(3600));
    let mut second_rx = second.subscribe();
    let state = wait_for(&mut second_rx, |s| s.data.is_some()).await;

    assert_eq!(state.data, Some(serde_json::json!([1, 2])));
    assert_eq!(fetcher.calls(), 1, "second mount must be served from cache");
}

// ---------------------------------------------------------------------------
// Test: cache expiry issues exactly one new call
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn expired_cache_entry_triggers_one_refetch() {
    let fetcher = ScriptedFetcher::new(vec![Script::Ok(serde_json::json!("payload"))]);
    let cache = Arc::new(ResponseCache::new(Duration::from_secs(60)));
    let runtime = WidgetRuntime::new(fetcher.clone(), cache);

    let first = runtime.mount(&widget(3600));
    let mut first_rx = first.subscribe();
    wait_for(&mut first_rx, |s| s.data.is_some()).await;
    assert_eq!(fetcher.calls(), 1);
    drop(first);

    tokio::time::advance(Duration::from_secs(61)).await;

    let second = runtime.mount(&widget(3600));
    let mut second_rx = second.subscribe();
    wait_for(&mut second_rx, |s| s.data.is_some()).await;
    assert_eq!(fetcher.calls(), 2);
}

// ---------------------------------------------------------------------------
// Test: a superseded in-flight fetch never applies its response
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn refresh_supersedes_in_flight_fetch() {
    let fetcher = ScriptedFetcher::new(vec![
        Script::DelayedOk(Duration::from_secs(5), serde_json::json!("stale")),
        Script::Ok(serde_json::json!("fresh")),
    ]);
    let runtime = WidgetRuntime::new(fetcher.clone(), Arc::new(ResponseCache::default()));

    let handle = runtime.mount(&widget(3600));
    let mut rx = handle.subscribe();

    // Let the slow first fetch get airborne, then supersede it.
    wait_for_calls(&fetcher, 1).await;
    handle.refresh();

    let state = wait_for(&mut rx, |s| s.data.is_some()).await;
    assert_eq!(state.data, Some(serde_json::json!("fresh")));
    assert_eq!(fetcher.calls(), 2);

    // Run past the aborted fetch's would-be completion: its response must
    // never overwrite the fresh payload.
    tokio::time::advance(Duration::from_secs(10)).await;
    tokio::task::yield_now().await;
    assert_eq!(handle.state().data, Some(serde_json::json!("fresh")));
    assert_eq!(fetcher.calls(), 2);
}

// ---------------------------------------------------------------------------
// Test: failed background refresh keeps stale data visible
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn failed_refresh_retains_previous_data() {
    let fetcher = ScriptedFetcher::new(vec![
        Script::Ok(serde_json::json!("v1")),
        Script::Err(FetchError::HttpStatus(500)),
    ]);
    let runtime = WidgetRuntime::new(fetcher.clone(), Arc::new(ResponseCache::default()));

    let handle = runtime.mount(&widget(3600));
    let mut rx = handle.subscribe();
    wait_for(&mut rx, |s| s.data.is_some()).await;

    handle.refresh();
    let state = wait_for(&mut rx, |s| s.error.is_some()).await;

    assert_matches!(state.error, Some(WidgetDataError::Failed(_)));
    assert_eq!(
        state.data,
        Some(serde_json::json!("v1")),
        "stale data must survive a failed refresh"
    );
    // Initial fetch + refresh attempt + 3 retries.
    assert_eq!(fetcher.calls(), 5);
}

// ---------------------------------------------------------------------------
// Test: unmount cancels the timer and any future fetches
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn unmount_stops_polling() {
    let fetcher = ScriptedFetcher::new(vec![Script::Ok(serde_json::json!(0))]);
    let runtime = WidgetRuntime::new(fetcher.clone(), Arc::new(ResponseCache::new(Duration::ZERO)));

    let handle = runtime.mount(&widget(30));
    let mut rx = handle.subscribe();
    wait_for(&mut rx, |s| s.data.is_some()).await;
    assert_eq!(fetcher.calls(), 1);

    handle.unmount();
    tokio::time::advance(Duration::from_secs(300)).await;
    tokio::task::yield_now().await;
    assert_eq!(fetcher.calls(), 1, "unmounted widget must not poll");
}

// ---------------------------------------------------------------------------
// Test: runtime shutdown tears down every mounted widget
// ---------------------------------------------------------------------------

#[tokio::test(start_paused = true)]
async fn shutdown_cancels_all_widgets() {
    let fetcher = ScriptedFetcher::new(vec![Script::Ok(serde_json::json!(0))]);
    let runtime = WidgetRuntime::new(fetcher.clone(), Arc::new(ResponseCache::new(Duration::ZERO)));

    let first = runtime.mount(&widget(30));
    let second = runtime.mount(&widget(45));
    let mut first_rx = first.subscribe();
    let mut second_rx = second.subscribe();
    wait_for(&mut first_rx, |s| s.data.is_some()).await;
    wait_for(&mut second_rx, |s| s.data.is_some()).await;
    let settled = fetcher.calls();

    runtime.shutdown();
    tokio::time::advance(Duration::from_secs(600)).await;
    tokio::task::yield_now().await;
    assert_eq!(fetcher.calls(), settled);
}
