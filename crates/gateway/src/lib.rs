//! HTTP gateway to the Rentora dashboard backend.
//!
//! Owns the wire format of the layout endpoints and the two typed
//! clients the engine needs:
//!
//! - [`LayoutClient`] — list/save/delete/set-default against the layout
//!   backend, behind the [`LayoutBackend`] trait so stores can run
//!   against a test double.
//! - [`HttpWidgetFetcher`] — the production
//!   [`WidgetFetch`](rentora_runtime::WidgetFetch) implementation for
//!   widget-data reads.

pub mod client;
pub mod widget_data;
pub mod wire;

pub use client::{GatewayError, LayoutBackend, LayoutClient};
pub use widget_data::HttpWidgetFetcher;
pub use wire::{WireLayout, WirePosition, WireWidget, WIRE_CELL_HEIGHT};
