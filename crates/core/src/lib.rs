//! Core domain model for the Rentora dashboard engine.
//!
//! Pure, framework-free building blocks shared by every other crate in the
//! workspace: the layout/widget data model, the widget catalog, the grid
//! placement engine, and the domain error type. Nothing in here performs
//! I/O.

pub mod catalog;
pub mod error;
pub mod grid;
pub mod layout;
pub mod types;
