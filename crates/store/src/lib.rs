//! Layout store and grid interaction controllers for the Rentora
//! dashboard (PRD-14).
//!
//! - [`LayoutStore`] — single source of truth for the loaded layouts:
//!   synchronous reducer actions, broadcast change events, async
//!   persistence effects.
//! - [`DragController`] / [`ResizeController`] — pointer-protocol state
//!   machines that preview grid moves and commit them through the store.

pub mod drag;
pub mod store;

pub use drag::{DragController, DragSession, GridMetrics, PointerPosition, ResizeController};
pub use store::{LayoutAction, LayoutStore, StoreError, StoreEvent};
