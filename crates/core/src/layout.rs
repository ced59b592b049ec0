//! Layout and widget-instance model for the dashboard grid (PRD-14).
//!
//! A [`Layout`] is a named, persisted arrangement of [`WidgetInstance`]s on
//! the fixed 12-column grid. Layouts are mutated exclusively through the
//! store's reducer actions; this module only defines the shapes and their
//! local invariants.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::catalog::{WidgetCategory, WidgetType};
use crate::error::CoreError;
use crate::types::{LayoutId, WidgetId};

/// Maximum accepted layout name length, in characters.
pub const MAX_LAYOUT_NAME_LEN: usize = 100;

/// Settings key holding a per-widget refresh override, in seconds.
pub const REFRESH_INTERVAL_KEY: &str = "refreshInterval";

// ---------------------------------------------------------------------------
// GridPosition
// ---------------------------------------------------------------------------

/// A widget's cell on the 12-column grid.
///
/// Invariant for committed positions: `col + width <= 12` with
/// `width >= 1`. Rows are unbounded upward and grow to content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridPosition {
    pub col: u16,
    pub row: u16,
    pub width: u16,
}

impl GridPosition {
    pub fn new(col: u16, row: u16, width: u16) -> Self {
        Self { col, row, width }
    }

    /// Exclusive end column of the occupied range `[col, col + width)`.
    pub fn end_col(&self) -> u16 {
        self.col + self.width
    }
}

// ---------------------------------------------------------------------------
// WidgetInstance
// ---------------------------------------------------------------------------

/// One placed widget within a layout.
///
/// Display metadata (`title`, `icon`, `category`) is derived from the
/// catalog at construction and never travels over the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetInstance {
    /// Stable id, unique within the layout (UUID v4).
    pub id: WidgetId,
    pub widget_type: WidgetType,
    pub title: String,
    pub icon: String,
    pub category: WidgetCategory,
    pub position: GridPosition,
    /// Hidden widgets are skipped by placement and rendering but keep
    /// their position for when they are re-shown.
    pub visible: bool,
    /// Collapsed widgets keep their grid cell but render only the header.
    pub collapsed: bool,
    /// Free-form settings, opaque to the engine, passed through to the
    /// widget's data runtime (e.g. `depotId`, `limit`, `refreshInterval`).
    pub settings: serde_json::Map<String, serde_json::Value>,
}

impl WidgetInstance {
    /// Create a new instance at `position` with a freshly generated id and
    /// the catalog's display metadata.
    pub fn new(widget_type: WidgetType, position: GridPosition) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            widget_type,
            title: widget_type.title().to_string(),
            icon: widget_type.icon().to_string(),
            category: widget_type.category(),
            position,
            visible: true,
            collapsed: false,
            settings: serde_json::Map::new(),
        }
    }

    /// Rebuild an instance from persisted fields (wire decode path).
    pub fn from_parts(
        id: WidgetId,
        widget_type: WidgetType,
        position: GridPosition,
        visible: bool,
        collapsed: bool,
        settings: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        Self {
            id,
            widget_type,
            title: widget_type.title().to_string(),
            icon: widget_type.icon().to_string(),
            category: widget_type.category(),
            position,
            visible,
            collapsed,
            settings,
        }
    }

    /// Attach settings to the instance.
    pub fn with_settings(
        mut self,
        settings: serde_json::Map<String, serde_json::Value>,
    ) -> Self {
        self.settings = settings;
        self
    }

    /// Effective refresh interval: the `refreshInterval` setting (seconds)
    /// when present and positive, otherwise the type's catalog default.
    ///
    /// `0` and non-numeric values both fall back -- a widget never polls
    /// every tick because of a zeroed or malformed override.
    pub fn refresh_interval(&self) -> Duration {
        self.settings
            .get(REFRESH_INTERVAL_KEY)
            .and_then(serde_json::Value::as_u64)
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or_else(|| self.widget_type.default_refresh_interval())
    }
}

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

/// A named, persisted arrangement of widgets.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    /// Backend-assigned id; `None` for an unsaved draft.
    pub id: Option<LayoutId>,
    /// Display name. Non-empty; uniqueness is user convention only.
    pub name: String,
    /// At most one layout per user has this set; enforced by the backend.
    pub is_default: bool,
    /// Widget instances keyed by widget id. Rendering order is derived
    /// from positions, never from map order.
    pub widgets: HashMap<WidgetId, WidgetInstance>,
}

impl Layout {
    /// Create an empty in-memory draft.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            is_default: false,
            widgets: HashMap::new(),
        }
    }

    pub fn widget(&self, id: &str) -> Option<&WidgetInstance> {
        self.widgets.get(id)
    }

    pub fn widget_mut(&mut self, id: &str) -> Option<&mut WidgetInstance> {
        self.widgets.get_mut(id)
    }

    /// Visible widgets, in unspecified order.
    pub fn visible_widgets(&self) -> impl Iterator<Item = &WidgetInstance> {
        self.widgets.values().filter(|w| w.visible)
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validate a layout name before a save request is issued.
pub fn validate_layout_name(name: &str) -> Result<(), CoreError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::Validation(
            "Layout name must not be empty".to_string(),
        ));
    }
    if trimmed.chars().count() > MAX_LAYOUT_NAME_LEN {
        return Err(CoreError::Validation(format!(
            "Layout name must be at most {MAX_LAYOUT_NAME_LEN} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_widget_gets_catalog_metadata() {
        let widget = WidgetInstance::new(WidgetType::RecentOrders, GridPosition::new(0, 0, 6));
        assert_eq!(widget.title, "Recent Orders");
        assert_eq!(widget.category, WidgetCategory::Overview);
        assert!(widget.visible);
        assert!(!widget.collapsed);
    }

    #[test]
    fn new_widget_ids_are_unique() {
        let a = WidgetInstance::new(WidgetType::DepotStock, GridPosition::new(0, 0, 6));
        let b = WidgetInstance::new(WidgetType::DepotStock, GridPosition::new(6, 0, 6));
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn refresh_interval_reads_settings_override() {
        let mut settings = serde_json::Map::new();
        settings.insert(REFRESH_INTERVAL_KEY.into(), serde_json::json!(15));
        let widget = WidgetInstance::new(WidgetType::RecentOrders, GridPosition::new(0, 0, 6))
            .with_settings(settings);
        assert_eq!(widget.refresh_interval(), Duration::from_secs(15));
    }

    #[test]
    fn refresh_interval_zero_falls_back_to_type_default() {
        let mut settings = serde_json::Map::new();
        settings.insert(REFRESH_INTERVAL_KEY.into(), serde_json::json!(0));
        let widget =
            WidgetInstance::new(WidgetType::FleetUtilization, GridPosition::new(0, 0, 6))
                .with_settings(settings);
        assert_eq!(widget.refresh_interval(), Duration::from_secs(300));
    }

    #[test]
    fn refresh_interval_absent_falls_back_to_type_default() {
        let widget = WidgetInstance::new(WidgetType::RecentOrders, GridPosition::new(0, 0, 6));
        assert_eq!(widget.refresh_interval(), Duration::from_secs(60));
    }

    #[test]
    fn refresh_interval_malformed_falls_back() {
        let mut settings = serde_json::Map::new();
        settings.insert(REFRESH_INTERVAL_KEY.into(), serde_json::json!("soon"));
        let widget = WidgetInstance::new(WidgetType::RecentOrders, GridPosition::new(0, 0, 6))
            .with_settings(settings);
        assert_eq!(widget.refresh_interval(), Duration::from_secs(60));
    }

    #[test]
    fn layout_name_validation() {
        assert!(validate_layout_name("My dashboard").is_ok());
        assert!(validate_layout_name("").is_err());
        assert!(validate_layout_name("   ").is_err());
        assert!(validate_layout_name(&"x".repeat(MAX_LAYOUT_NAME_LEN + 1)).is_err());
    }

    #[test]
    fn draft_layout_has_no_id() {
        let layout = Layout::new("Draft");
        assert_eq!(layout.id, None);
        assert!(!layout.is_default);
        assert!(layout.widgets.is_empty());
    }
}
