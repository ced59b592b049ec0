//! Wire-format DTOs for the layout endpoints, and their translation to
//! and from the in-memory model.
//!
//! The backend speaks `x/y/w/h` grid cells with camelCase field names;
//! the engine speaks `col/row/width`. Cell height is fixed at 4 units and
//! carried only for the backend's benefit. Display metadata (title, icon,
//! category) never travels: it is rebuilt from the widget catalog on
//! decode.

use serde::{Deserialize, Serialize};

use rentora_core::catalog::WidgetType;
use rentora_core::grid::clamp_position;
use rentora_core::layout::{GridPosition, Layout, WidgetInstance};
use rentora_core::types::LayoutId;

/// Fixed wire cell height; rows grow to content locally.
pub const WIRE_CELL_HEIGHT: u16 = 4;

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

/// A layout as the backend stores it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireLayout {
    /// Absent when saving a draft; assigned by the backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<LayoutId>,
    pub name: String,
    pub is_default: bool,
    pub widgets: Vec<WireWidget>,
}

/// One placed widget on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireWidget {
    pub widget_id: String,
    #[serde(rename = "type")]
    pub widget_type: WidgetType,
    pub position: WirePosition,
    #[serde(default)]
    pub settings: serde_json::Map<String, serde_json::Value>,
    pub is_visible: bool,
    /// Tolerant default: older backends omit this field.
    #[serde(default)]
    pub is_collapsed: bool,
}

/// Grid cell in backend coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WirePosition {
    pub x: u16,
    pub y: u16,
    pub w: u16,
    pub h: u16,
}

// ---------------------------------------------------------------------------
// Translation
// ---------------------------------------------------------------------------

impl WireLayout {
    /// Build the wire shape from an in-memory layout.
    ///
    /// Widgets are emitted in rendering order (row, then column, then id
    /// as the tiebreak) so the output is deterministic.
    pub fn from_layout(layout: &Layout) -> Self {
        let mut widgets: Vec<&WidgetInstance> = layout.widgets.values().collect();
        widgets.sort_by_key(|w| (w.position.row, w.position.col, w.id.clone()));

        Self {
            id: layout.id,
            name: layout.name.clone(),
            is_default: layout.is_default,
            widgets: widgets
                .into_iter()
                .map(|widget| WireWidget {
                    widget_id: widget.id.clone(),
                    widget_type: widget.widget_type,
                    position: WirePosition {
                        x: widget.position.col,
                        y: widget.position.row,
                        w: widget.position.width,
                        h: WIRE_CELL_HEIGHT,
                    },
                    settings: widget.settings.clone(),
                    is_visible: widget.visible,
                    is_collapsed: widget.collapsed,
                })
                .collect(),
        }
    }

    /// Translate the wire shape into the in-memory model.
    ///
    /// Positions are clamped on the way in so the bounds invariant holds
    /// even for data written by older clients. The wire `h` is dropped.
    pub fn into_layout(self) -> Layout {
        let widgets = self
            .widgets
            .into_iter()
            .map(|wire| {
                let position = clamp_position(GridPosition::new(
                    wire.position.x,
                    wire.position.y,
                    wire.position.w,
                ));
                let widget = WidgetInstance::from_parts(
                    wire.widget_id,
                    wire.widget_type,
                    position,
                    wire.is_visible,
                    wire.is_collapsed,
                    wire.settings,
                );
                (widget.id.clone(), widget)
            })
            .collect();

        Layout {
            id: self.id,
            name: self.name,
            is_default: self.is_default,
            widgets,
        }
    }
}
