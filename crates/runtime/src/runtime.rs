//! Per-widget fetch task: refresh timer, cancellation, retry, and state
//! publication.
//!
//! [`WidgetRuntime::mount`] spawns one task per widget (connect -> fetch ->
//! sleep loop) and hands back a [`WidgetHandle`]. The handle is the
//! widget's only view of the runtime: a `watch` subscription for state
//! snapshots, a manual refresh trigger, and unmount. Dropping the handle
//! cancels the task, so an unmounted widget can never apply a late
//! response.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use rentora_core::layout::WidgetInstance;
use rentora_core::types::{Timestamp, WidgetId};

use crate::cache::{CacheKey, ResponseCache};
use crate::error::FetchError;
use crate::fetch::{QueryParams, WidgetFetch};

/// Queued-but-unserviced manual refreshes beyond this are coalesced.
const REFRESH_QUEUE_CAPACITY: usize = 8;

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Tunable parameters for the fetch lifecycle.
#[derive(Debug, Clone, Copy)]
pub struct RuntimeConfig {
    /// Retries after the initial attempt for transient errors.
    pub retry_limit: u32,
    /// Fixed delay between attempts.
    pub retry_delay: Duration,
    /// Per-request deadline, enforced independently of the HTTP client.
    pub request_timeout: Duration,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            retry_limit: 3,
            retry_delay: Duration::from_secs(2),
            request_timeout: Duration::from_secs(10),
        }
    }
}

// ---------------------------------------------------------------------------
// Widget state
// ---------------------------------------------------------------------------

/// Error surfaced to the widget chrome once retries are exhausted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WidgetDataError {
    /// 401-class failure; the session needs re-authentication.
    Unauthorized,
    /// Transient failure that outlived the retry ceiling.
    Failed(String),
}

/// Snapshot published to subscribers after every lifecycle step.
///
/// Stale-while-revalidate: `data` holds the last successful payload even
/// while `loading` is set or after a failed background refresh.
#[derive(Debug, Clone, Default)]
pub struct WidgetDataState {
    pub loading: bool,
    pub data: Option<serde_json::Value>,
    pub error: Option<WidgetDataError>,
    pub last_updated: Option<Timestamp>,
}

// ---------------------------------------------------------------------------
// WidgetRuntime
// ---------------------------------------------------------------------------

/// Spawns and supervises the per-widget fetch tasks.
///
/// Created once per dashboard mount with a shared fetcher and cache. The
/// master cancellation token tears down every widget task on
/// [`shutdown`](Self::shutdown).
pub struct WidgetRuntime {
    fetcher: Arc<dyn WidgetFetch>,
    cache: Arc<ResponseCache>,
    config: RuntimeConfig,
    cancel: CancellationToken,
}

impl WidgetRuntime {
    pub fn new(fetcher: Arc<dyn WidgetFetch>, cache: Arc<ResponseCache>) -> Self {
        Self::with_config(fetcher, cache, RuntimeConfig::default())
    }

    pub fn with_config(
        fetcher: Arc<dyn WidgetFetch>,
        cache: Arc<ResponseCache>,
        config: RuntimeConfig,
    ) -> Self {
        Self {
            fetcher,
            cache,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Start the fetch lifecycle for one widget instance.
    ///
    /// Fetches immediately, then on the widget's effective refresh
    /// interval. The returned handle owns the task: dropping it unmounts
    /// the widget.
    pub fn mount(&self, widget: &WidgetInstance) -> WidgetHandle {
        let initial = WidgetDataState {
            loading: true,
            ..Default::default()
        };
        let (state_tx, state_rx) = watch::channel(initial);
        let (refresh_tx, refresh_rx) = mpsc::channel(REFRESH_QUEUE_CAPACITY);
        let cancel = self.cancel.child_token();

        let task = WidgetTask {
            widget_id: widget.id.clone(),
            endpoint: widget.widget_type.endpoint(),
            params: QueryParams::from_settings(&widget.settings),
            interval: widget.refresh_interval(),
            fetcher: Arc::clone(&self.fetcher),
            cache: Arc::clone(&self.cache),
            config: self.config,
            state_tx,
            cancel: cancel.clone(),
        };

        tracing::debug!(
            widget_id = %widget.id,
            endpoint = task.endpoint,
            interval_secs = task.interval.as_secs(),
            "Widget runtime mounted",
        );

        let task_handle = tokio::spawn(task.run(refresh_rx));

        WidgetHandle {
            widget_id: widget.id.clone(),
            state_rx,
            refresh_tx,
            cancel,
            task_handle,
        }
    }

    /// Cancel every widget task spawned from this runtime.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

// ---------------------------------------------------------------------------
// WidgetHandle
// ---------------------------------------------------------------------------

/// A mounted widget's connection to its fetch task.
pub struct WidgetHandle {
    widget_id: WidgetId,
    state_rx: watch::Receiver<WidgetDataState>,
    refresh_tx: mpsc::Sender<()>,
    /// Child of the runtime's master token; cancelled on unmount/drop.
    cancel: CancellationToken,
    #[allow(dead_code)]
    task_handle: tokio::task::JoinHandle<()>,
}

impl WidgetHandle {
    pub fn widget_id(&self) -> &str {
        &self.widget_id
    }

    /// Current state snapshot.
    pub fn state(&self) -> WidgetDataState {
        self.state_rx.borrow().clone()
    }

    /// Independent subscription to state changes.
    pub fn subscribe(&self) -> watch::Receiver<WidgetDataState> {
        self.state_rx.clone()
    }

    /// Request an immediate re-fetch, bypassing the cache.
    ///
    /// Aborts any in-flight request for this widget first. A refresh that
    /// arrives while the queue is full coalesces with the pending one.
    pub fn refresh(&self) {
        if self.refresh_tx.try_send(()).is_err() {
            tracing::debug!(widget_id = %self.widget_id, "Refresh already pending");
        }
    }

    /// Tear the widget down. Equivalent to dropping the handle.
    pub fn unmount(self) {
        self.cancel.cancel();
    }
}

impl Drop for WidgetHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// ---------------------------------------------------------------------------
// The per-widget task
// ---------------------------------------------------------------------------

struct WidgetTask {
    widget_id: WidgetId,
    endpoint: &'static str,
    params: QueryParams,
    interval: Duration,
    fetcher: Arc<dyn WidgetFetch>,
    cache: Arc<ResponseCache>,
    config: RuntimeConfig,
    state_tx: watch::Sender<WidgetDataState>,
    cancel: CancellationToken,
}

impl WidgetTask {
    async fn run(self, mut refresh_rx: mpsc::Receiver<()>) {
        let key = CacheKey::new(self.endpoint, &self.params);

        // The first tick completes immediately: mount implies fetch.
        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.fetch_cycle(&key, &mut refresh_rx, false).await;
                }
                Some(()) = refresh_rx.recv() => {
                    ticker.reset();
                    self.fetch_cycle(&key, &mut refresh_rx, true).await;
                }
            }
        }

        tracing::debug!(widget_id = %self.widget_id, "Widget runtime stopped");
    }

    /// Run one triggered fetch to completion.
    ///
    /// A manual refresh arriving mid-flight drops the outstanding attempt
    /// (its response can never be applied) and starts over with the cache
    /// invalidated. Cancellation aborts the cycle outright.
    async fn fetch_cycle(
        &self,
        key: &CacheKey,
        refresh_rx: &mut mpsc::Receiver<()>,
        mut forced: bool,
    ) {
        loop {
            if forced {
                self.cache.invalidate(key);
            }
            self.state_tx.send_modify(|state| state.loading = true);

            tokio::select! {
                _ = self.cancel.cancelled() => return,
                Some(()) = refresh_rx.recv() => {
                    tracing::debug!(
                        widget_id = %self.widget_id,
                        "Refresh superseded in-flight fetch",
                    );
                    forced = true;
                    continue;
                }
                outcome = self.fetch_once(key) => {
                    self.publish(outcome);
                    return;
                }
            }
        }
    }

    /// Cache lookup, then network with retry on a miss.
    async fn fetch_once(&self, key: &CacheKey) -> Result<serde_json::Value, FetchError> {
        if let Some(data) = self.cache.get(key) {
            tracing::debug!(
                widget_id = %self.widget_id,
                endpoint = self.endpoint,
                "Serving widget data from cache",
            );
            return Ok(data);
        }

        let data = self.fetch_with_retry().await?;
        self.cache.insert(key.clone(), data.clone());
        Ok(data)
    }

    /// Issue the request up to `1 + retry_limit` times with a fixed delay.
    ///
    /// Authentication errors are terminal on the first occurrence.
    async fn fetch_with_retry(&self) -> Result<serde_json::Value, FetchError> {
        let mut last_err: Option<FetchError> = None;

        for attempt in 0..=self.config.retry_limit {
            if attempt > 0 {
                tokio::time::sleep(self.config.retry_delay).await;
            }

            let attempt_result = tokio::time::timeout(
                self.config.request_timeout,
                self.fetcher.fetch(self.endpoint, &self.params),
            )
            .await;

            match attempt_result {
                Ok(Ok(data)) => return Ok(data),
                Ok(Err(err)) if !err.is_retryable() => {
                    tracing::warn!(
                        widget_id = %self.widget_id,
                        endpoint = self.endpoint,
                        error = %err,
                        "Widget fetch rejected, not retrying",
                    );
                    return Err(err);
                }
                Ok(Err(err)) => {
                    tracing::warn!(
                        widget_id = %self.widget_id,
                        endpoint = self.endpoint,
                        attempt = attempt + 1,
                        error = %err,
                        "Widget fetch attempt failed",
                    );
                    last_err = Some(err);
                }
                Err(_) => {
                    tracing::warn!(
                        widget_id = %self.widget_id,
                        endpoint = self.endpoint,
                        attempt = attempt + 1,
                        "Widget fetch attempt timed out",
                    );
                    last_err = Some(FetchError::Timeout(self.config.request_timeout));
                }
            }
        }

        Err(last_err.expect("retry loop records an error before exhausting attempts"))
    }

    fn publish(&self, outcome: Result<serde_json::Value, FetchError>) {
        match outcome {
            Ok(data) => {
                self.state_tx.send_modify(|state| {
                    state.loading = false;
                    state.error = None;
                    state.data = Some(data);
                    state.last_updated = Some(chrono::Utc::now());
                });
            }
            Err(err) => {
                let surfaced = match &err {
                    FetchError::Unauthorized => WidgetDataError::Unauthorized,
                    other => WidgetDataError::Failed(other.to_string()),
                };
                // Keep the last good payload: a failed background refresh
                // must not blank the widget.
                self.state_tx.send_modify(|state| {
                    state.loading = false;
                    state.error = Some(surfaced);
                });
                tracing::error!(
                    widget_id = %self.widget_id,
                    endpoint = self.endpoint,
                    error = %err,
                    "Widget data fetch failed",
                );
            }
        }
    }
}
