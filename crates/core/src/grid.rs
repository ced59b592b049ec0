//! Grid placement engine: collision detection, next-free-slot search, and
//! overflow clamping for the 12-column dashboard grid.
//!
//! All functions are pure and synchronous; the store calls them before
//! committing a position, the drag controller calls them while previewing
//! one. Collision detection is advisory: overlap blocks the live preview,
//! never a commit (last drop wins).

use std::collections::HashMap;

use crate::layout::{GridPosition, WidgetInstance};
use crate::types::WidgetId;

/// Number of columns on the placement surface.
pub const GRID_COLUMNS: u16 = 12;

/// Narrowest allowed widget.
pub const MIN_WIDGET_WIDTH: u16 = 1;

/// Clamp a candidate so it never renders partially off-grid.
///
/// Width is forced into `1..=12`, then `col` is pulled left until
/// `col + width <= 12`. The row is left untouched.
pub fn clamp_position(position: GridPosition) -> GridPosition {
    let width = position.width.clamp(MIN_WIDGET_WIDTH, GRID_COLUMNS);
    let col = position.col.min(GRID_COLUMNS - width);
    GridPosition {
        col,
        row: position.row,
        width,
    }
}

/// Whether `candidate` overlaps some *other visible* widget.
///
/// Row occupancy is exact-match: widgets on different rows never conflict
/// regardless of column overlap, and widgets on the same row conflict iff
/// their `[col, col + width)` ranges intersect. Hidden widgets never
/// occupy. `exclude` removes one widget (typically the one being dragged)
/// from consideration, so a widget never collides with itself.
pub fn is_position_occupied(
    widgets: &HashMap<WidgetId, WidgetInstance>,
    candidate: GridPosition,
    exclude: Option<&str>,
) -> bool {
    widgets.values().any(|widget| {
        if !widget.visible {
            return false;
        }
        if exclude == Some(widget.id.as_str()) {
            return false;
        }
        widget.position.row == candidate.row
            && widget.position.col < candidate.end_col()
            && candidate.col < widget.position.end_col()
    })
}

/// First free slot for a widget of the given width, scanning rows top to
/// bottom and columns left to right.
///
/// Returns the lexicographically smallest `(row, col)` whose cells are all
/// free. Always terminates: rows are unbounded upward, and a finite widget
/// set leaves some row empty. Widths outside `1..=12` are clamped before
/// the scan.
pub fn find_next_available_position(
    widgets: &HashMap<WidgetId, WidgetInstance>,
    width: u16,
) -> GridPosition {
    let width = width.clamp(MIN_WIDGET_WIDTH, GRID_COLUMNS);
    let mut row = 0u16;
    loop {
        for col in 0..=(GRID_COLUMNS - width) {
            let candidate = GridPosition { col, row, width };
            if !is_position_occupied(widgets, candidate, None) {
                return candidate;
            }
        }
        row += 1;
    }
}

/// Highest occupied row among visible widgets, or `None` for an empty or
/// fully hidden layout.
///
/// Sizes the editable drop-target overlay; callers may offer one row
/// beyond this to let a drag extend the grid downward.
pub fn max_row(widgets: &HashMap<WidgetId, WidgetInstance>) -> Option<u16> {
    widgets
        .values()
        .filter(|widget| widget.visible)
        .map(|widget| widget.position.row)
        .max()
}
