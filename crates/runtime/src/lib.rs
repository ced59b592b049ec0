//! Widget data runtime for the Rentora dashboard (PRD-17).
//!
//! One runtime task per mounted widget drives its entire data lifecycle:
//!
//! - [`WidgetRuntime`] — spawns and supervises per-widget fetch tasks.
//! - [`WidgetHandle`] — the mounted widget's view: state subscription,
//!   manual refresh, unmount.
//! - [`ResponseCache`] — injectable TTL cache shared by all runtimes.
//! - [`WidgetFetch`] — the seam to the HTTP layer (or a test double).

pub mod cache;
pub mod error;
pub mod fetch;
pub mod runtime;

pub use cache::{CacheKey, ResponseCache, DEFAULT_CACHE_TTL};
pub use error::FetchError;
pub use fetch::{QueryParams, WidgetFetch};
pub use runtime::{
    RuntimeConfig, WidgetDataError, WidgetDataState, WidgetHandle, WidgetRuntime,
};
