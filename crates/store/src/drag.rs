//! Pointer-interaction state machines for the grid: drag/drop and
//! resize.
//!
//! Both controllers speak the same three-operation protocol
//! (`begin_interaction`, `update_interaction`, `end_interaction`) so the
//! host can drive them from mouse, touch, or synthesized movement in
//! tests. A drag runs `Idle -> Dragging -> (Dropped | Cancelled) -> Idle`;
//! the ephemeral session is discarded unconditionally at the end,
//! whatever the outcome. Collision checks only gate the live preview --
//! a commit always goes through (last drop wins).

use rentora_core::grid::{
    clamp_position, is_position_occupied, max_row, GRID_COLUMNS, MIN_WIDGET_WIDTH,
};
use rentora_core::layout::GridPosition;
use rentora_core::types::WidgetId;

use crate::store::{LayoutAction, LayoutStore, StoreError};

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Pointer position in pixels, relative to the grid surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerPosition {
    pub x: f64,
    pub y: f64,
}

/// Pixel dimensions of one grid cell, measured by the host at mount and
/// on surface resize.
#[derive(Debug, Clone, Copy)]
pub struct GridMetrics {
    pub column_width: f64,
    pub row_height: f64,
}

impl GridMetrics {
    /// Grid cell under a surface-relative point.
    fn cell_at(&self, point: PointerPosition) -> (u16, u16) {
        let col = (point.x / self.column_width).floor().max(0.0) as u16;
        let row = (point.y / self.row_height).floor().max(0.0) as u16;
        (col.min(GRID_COLUMNS - 1), row)
    }

    /// Pixel origin of a widget's cell.
    fn widget_origin(&self, position: GridPosition) -> PointerPosition {
        PointerPosition {
            x: f64::from(position.col) * self.column_width,
            y: f64::from(position.row) * self.row_height,
        }
    }
}

// ---------------------------------------------------------------------------
// Drag controller
// ---------------------------------------------------------------------------

/// Live state of one drag, from pointer-down to drop or cancel.
#[derive(Debug, Clone, PartialEq)]
pub struct DragSession {
    pub widget_id: WidgetId,
    /// Pointer offset within the widget at drag start; keeps the grabbed
    /// point under the cursor instead of snapping the widget's corner to
    /// the cursor tip.
    pub pointer_offset: PointerPosition,
    /// Position at drag start.
    pub origin: GridPosition,
    /// Last computed (clamped) candidate, occupied or not. Commits use
    /// this.
    pub candidate: Option<GridPosition>,
    /// Candidate shown as the drop-target preview; `None` while the
    /// candidate overlaps another widget.
    pub preview: Option<GridPosition>,
}

/// Drag/drop state machine over grid cells.
pub struct DragController {
    metrics: GridMetrics,
    session: Option<DragSession>,
}

impl DragController {
    pub fn new(metrics: GridMetrics) -> Self {
        Self {
            metrics,
            session: None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }

    /// Idle -> Dragging.
    ///
    /// Only starts when edit mode is active and the widget is visible in
    /// the current layout. Returns whether a drag began.
    pub fn begin_interaction(
        &mut self,
        store: &LayoutStore,
        widget_id: &str,
        pointer: PointerPosition,
    ) -> bool {
        if !store.edit_mode() {
            return false;
        }
        let Some(widget) = store
            .current_layout()
            .and_then(|layout| layout.widget(widget_id))
        else {
            return false;
        };
        if !widget.visible {
            return false;
        }

        let origin_px = self.metrics.widget_origin(widget.position);
        self.session = Some(DragSession {
            widget_id: widget_id.to_string(),
            pointer_offset: PointerPosition {
                x: pointer.x - origin_px.x,
                y: pointer.y - origin_px.y,
            },
            origin: widget.position,
            candidate: None,
            preview: None,
        });
        true
    }

    /// Pointer moved while dragging. Returns the drop-target preview, or
    /// `None` when there is no active drag or the candidate cell is
    /// occupied (the drop is still possible; the UI just withholds
    /// positive feedback).
    pub fn update_interaction(
        &mut self,
        store: &LayoutStore,
        pointer: PointerPosition,
    ) -> Option<GridPosition> {
        let session = self.session.as_mut()?;
        let layout = store.current_layout()?;
        let widget = layout.widget(&session.widget_id)?;

        let anchored = PointerPosition {
            x: pointer.x - session.pointer_offset.x,
            y: pointer.y - session.pointer_offset.y,
        };
        let (col, row) = self.metrics.cell_at(anchored);

        // The drop surface extends exactly one row past the deepest
        // visible widget so a drag can grow the grid downward.
        let row_limit = max_row(&layout.widgets).map_or(0, |deepest| deepest + 1);
        let candidate = clamp_position(GridPosition::new(
            col,
            row.min(row_limit),
            widget.position.width,
        ));

        session.candidate = Some(candidate);
        let occupied =
            is_position_occupied(&layout.widgets, candidate, Some(session.widget_id.as_str()));
        session.preview = (!occupied).then_some(candidate);
        session.preview
    }

    /// Dragging -> Dropped (committed) or Cancelled. Either way the
    /// session is gone afterwards.
    ///
    /// Returns whether a move was dispatched.
    pub fn end_interaction(
        &mut self,
        store: &mut LayoutStore,
        committed: bool,
    ) -> Result<bool, StoreError> {
        let Some(session) = self.session.take() else {
            return Ok(false);
        };
        if !committed {
            return Ok(false);
        }
        let Some(candidate) = session.candidate else {
            // Pointer never moved over the surface; nothing to commit.
            return Ok(false);
        };

        store.dispatch(LayoutAction::MoveWidget {
            widget_id: session.widget_id,
            position: candidate,
        })?;
        Ok(true)
    }

    /// Escape / pointer-capture loss: drop the session with no mutation.
    pub fn cancel(&mut self) {
        self.session = None;
    }
}

// ---------------------------------------------------------------------------
// Resize controller
// ---------------------------------------------------------------------------

/// Live state of one resize gesture on a widget's right-edge handle.
#[derive(Debug, Clone, PartialEq)]
pub struct ResizeSession {
    pub widget_id: WidgetId,
    start_x: f64,
    start_width: u16,
    /// Width currently shown as live feedback.
    pub live_width: u16,
}

/// Resize sub-machine: tracks horizontal delta, snaps to columns.
pub struct ResizeController {
    metrics: GridMetrics,
    session: Option<ResizeSession>,
}

impl ResizeController {
    pub fn new(metrics: GridMetrics) -> Self {
        Self {
            metrics,
            session: None,
        }
    }

    pub fn is_resizing(&self) -> bool {
        self.session.is_some()
    }

    pub fn live_width(&self) -> Option<u16> {
        self.session.as_ref().map(|session| session.live_width)
    }

    /// Start tracking on pointer-down over the resize handle.
    pub fn begin_interaction(
        &mut self,
        store: &LayoutStore,
        widget_id: &str,
        pointer: PointerPosition,
    ) -> bool {
        if !store.edit_mode() {
            return false;
        }
        let Some(widget) = store
            .current_layout()
            .and_then(|layout| layout.widget(widget_id))
        else {
            return false;
        };
        if !widget.visible {
            return false;
        }

        self.session = Some(ResizeSession {
            widget_id: widget_id.to_string(),
            start_x: pointer.x,
            start_width: widget.position.width,
            live_width: widget.position.width,
        });
        true
    }

    /// Pointer moved: recompute the live width.
    ///
    /// `delta_columns = round(delta_x / column_width)`, clamped so the
    /// widget keeps at least one column and its right edge stays on the
    /// grid (the column never changes during a resize).
    pub fn update_interaction(
        &mut self,
        store: &LayoutStore,
        pointer: PointerPosition,
    ) -> Option<u16> {
        let session = self.session.as_mut()?;
        let widget = store
            .current_layout()?
            .widget(&session.widget_id)?;

        let delta_columns =
            ((pointer.x - session.start_x) / self.metrics.column_width).round() as i32;
        let max_width = i32::from(GRID_COLUMNS - widget.position.col);
        let width = (i32::from(session.start_width) + delta_columns)
            .clamp(i32::from(MIN_WIDGET_WIDTH), max_width) as u16;

        session.live_width = width;
        Some(width)
    }

    /// Commit the final width through the same move contract the drag
    /// uses (position unchanged, width updated), or discard on cancel.
    pub fn end_interaction(
        &mut self,
        store: &mut LayoutStore,
        committed: bool,
    ) -> Result<bool, StoreError> {
        let Some(session) = self.session.take() else {
            return Ok(false);
        };
        if !committed {
            return Ok(false);
        }
        let Some(widget) = store
            .current_layout()
            .and_then(|layout| layout.widget(&session.widget_id))
        else {
            return Ok(false);
        };
        if widget.position.width == session.live_width {
            return Ok(false);
        }

        let position = GridPosition::new(
            widget.position.col,
            widget.position.row,
            session.live_width,
        );
        store.dispatch(LayoutAction::MoveWidget {
            widget_id: session.widget_id,
            position,
        })?;
        Ok(true)
    }

    pub fn cancel(&mut self) {
        self.session = None;
    }
}
