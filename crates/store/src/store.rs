//! The layout store: canonical dashboard state behind a reducer.
//!
//! All layout mutations flow through [`LayoutStore::dispatch`] and apply
//! synchronously, in dispatch order. Async persistence effects
//! (load/save/delete/set-default) delegate to a [`LayoutBackend`] and
//! reload the layout list on success -- the server stays the source of
//! truth for ids and default flags. Observers subscribe to a broadcast
//! channel of [`StoreEvent`]s and re-read state through the accessors.

use std::sync::Arc;

use tokio::sync::broadcast;

use rentora_core::catalog::WidgetType;
use rentora_core::error::CoreError;
use rentora_core::grid::{clamp_position, find_next_available_position};
use rentora_core::layout::{validate_layout_name, GridPosition, Layout, WidgetInstance};
use rentora_core::types::{LayoutId, WidgetId};
use rentora_gateway::{GatewayError, LayoutBackend};

/// Broadcast buffer for store events.
const EVENT_CHANNEL_CAPACITY: usize = 256;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Error type for store operations.
///
/// Every failure is typed state for the caller to render; nothing here is
/// ever thrown across a widget boundary.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("No layout selected")]
    NoLayoutSelected,

    #[error("Layout backend returned a saved layout without an id")]
    MissingLayoutId,
}

// ---------------------------------------------------------------------------
// Actions and events
// ---------------------------------------------------------------------------

/// Synchronous state transitions. Every mutating action marks the layout
/// dirty; selection does not.
#[derive(Debug, Clone)]
pub enum LayoutAction {
    /// Switch the current-layout pointer. Other layouts stay loaded.
    SelectLayout(LayoutId),
    /// Create and select a fresh in-memory draft.
    NewLayout { name: String },
    /// Rename the current layout.
    RenameLayout { name: String },
    /// Add a widget at the next free slot for its default width.
    AddWidget {
        widget_type: WidgetType,
        settings: serde_json::Map<String, serde_json::Value>,
    },
    RemoveWidget { widget_id: WidgetId },
    /// Commit a position unconditionally (collision checks are advisory
    /// and happen before dispatch; last drop wins). Out-of-grid input is
    /// clamped.
    MoveWidget {
        widget_id: WidgetId,
        position: GridPosition,
    },
    ToggleWidgetVisibility { widget_id: WidgetId },
    ToggleWidgetCollapsed { widget_id: WidgetId },
    /// Replace a widget's settings wholesale (configuration dialog).
    UpdateWidgetSettings {
        widget_id: WidgetId,
        settings: serde_json::Map<String, serde_json::Value>,
    },
}

/// Change notifications published to subscribers.
#[derive(Debug, Clone)]
pub enum StoreEvent {
    LayoutsLoaded { count: usize },
    LayoutSelected { layout_id: Option<LayoutId> },
    WidgetAdded { widget_id: WidgetId },
    WidgetRemoved { widget_id: WidgetId },
    WidgetMoved {
        widget_id: WidgetId,
        position: GridPosition,
    },
    WidgetToggled { widget_id: WidgetId },
    SettingsUpdated { widget_id: WidgetId },
    DirtyChanged { dirty: bool },
    EditModeChanged { enabled: bool },
    PersistenceFailed {
        operation: &'static str,
        message: String,
    },
}

// ---------------------------------------------------------------------------
// LayoutStore
// ---------------------------------------------------------------------------

/// Single source of truth for dashboard layouts.
pub struct LayoutStore {
    backend: Arc<dyn LayoutBackend>,
    layouts: Vec<Layout>,
    /// Index into `layouts`; indices survive drafts (which have no id).
    current_index: Option<usize>,
    has_unsaved_changes: bool,
    edit_mode: bool,
    /// Load-failure message surfaced to the host page.
    last_error: Option<String>,
    event_tx: broadcast::Sender<StoreEvent>,
}

impl LayoutStore {
    pub fn new(backend: Arc<dyn LayoutBackend>) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            backend,
            layouts: Vec::new(),
            current_index: None,
            has_unsaved_changes: false,
            edit_mode: false,
            last_error: None,
            event_tx,
        }
    }

    /// Subscribe to store change events.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.event_tx.subscribe()
    }

    pub fn layouts(&self) -> &[Layout] {
        &self.layouts
    }

    pub fn current_layout(&self) -> Option<&Layout> {
        self.current_index.and_then(|index| self.layouts.get(index))
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.has_unsaved_changes
    }

    pub fn edit_mode(&self) -> bool {
        self.edit_mode
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Toggle grid edit mode (enables drag/resize interactions).
    pub fn set_edit_mode(&mut self, enabled: bool) {
        if self.edit_mode != enabled {
            self.edit_mode = enabled;
            self.emit(StoreEvent::EditModeChanged { enabled });
        }
    }

    // -----------------------------------------------------------------------
    // Reducer
    // -----------------------------------------------------------------------

    /// Apply one action synchronously.
    ///
    /// Actions are totally ordered by dispatch order; no merging or
    /// reordering ever happens.
    pub fn dispatch(&mut self, action: LayoutAction) -> Result<(), StoreError> {
        match action {
            LayoutAction::SelectLayout(id) => {
                let index = self
                    .layouts
                    .iter()
                    .position(|layout| layout.id == Some(id))
                    .ok_or(CoreError::LayoutNotFound { id })?;
                self.current_index = Some(index);
                self.emit(StoreEvent::LayoutSelected {
                    layout_id: Some(id),
                });
            }

            LayoutAction::NewLayout { name } => {
                validate_layout_name(&name)?;
                self.layouts.push(Layout::new(name));
                self.current_index = Some(self.layouts.len() - 1);
                self.emit(StoreEvent::LayoutSelected { layout_id: None });
                self.mark_dirty();
            }

            LayoutAction::RenameLayout { name } => {
                validate_layout_name(&name)?;
                self.current_layout_mut()?.name = name;
                self.mark_dirty();
            }

            LayoutAction::AddWidget {
                widget_type,
                settings,
            } => {
                let layout = self.current_layout_mut()?;
                let position =
                    find_next_available_position(&layout.widgets, widget_type.default_width());
                let widget = WidgetInstance::new(widget_type, position).with_settings(settings);
                let widget_id = widget.id.clone();
                layout.widgets.insert(widget_id.clone(), widget);
                self.emit(StoreEvent::WidgetAdded { widget_id });
                self.mark_dirty();
            }

            LayoutAction::RemoveWidget { widget_id } => {
                let layout = self.current_layout_mut()?;
                layout
                    .widgets
                    .remove(&widget_id)
                    .ok_or_else(|| CoreError::WidgetNotFound {
                        id: widget_id.clone(),
                    })?;
                self.emit(StoreEvent::WidgetRemoved { widget_id });
                self.mark_dirty();
            }

            LayoutAction::MoveWidget {
                widget_id,
                position,
            } => {
                let position = clamp_position(position);
                let layout = self.current_layout_mut()?;
                let widget =
                    layout
                        .widget_mut(&widget_id)
                        .ok_or_else(|| CoreError::WidgetNotFound {
                            id: widget_id.clone(),
                        })?;
                widget.position = position;
                self.emit(StoreEvent::WidgetMoved {
                    widget_id,
                    position,
                });
                self.mark_dirty();
            }

            LayoutAction::ToggleWidgetVisibility { widget_id } => {
                let layout = self.current_layout_mut()?;
                let widget =
                    layout
                        .widget_mut(&widget_id)
                        .ok_or_else(|| CoreError::WidgetNotFound {
                            id: widget_id.clone(),
                        })?;
                widget.visible = !widget.visible;
                self.emit(StoreEvent::WidgetToggled { widget_id });
                self.mark_dirty();
            }

            LayoutAction::ToggleWidgetCollapsed { widget_id } => {
                let layout = self.current_layout_mut()?;
                let widget =
                    layout
                        .widget_mut(&widget_id)
                        .ok_or_else(|| CoreError::WidgetNotFound {
                            id: widget_id.clone(),
                        })?;
                widget.collapsed = !widget.collapsed;
                self.emit(StoreEvent::WidgetToggled { widget_id });
                self.mark_dirty();
            }

            LayoutAction::UpdateWidgetSettings {
                widget_id,
                settings,
            } => {
                let layout = self.current_layout_mut()?;
                let widget =
                    layout
                        .widget_mut(&widget_id)
                        .ok_or_else(|| CoreError::WidgetNotFound {
                            id: widget_id.clone(),
                        })?;
                widget.settings = settings;
                self.emit(StoreEvent::SettingsUpdated { widget_id });
                self.mark_dirty();
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Persistence effects
    // -----------------------------------------------------------------------

    /// Fetch all layouts and replace the in-memory list.
    ///
    /// Keeps the current selection when its id survives the reload;
    /// otherwise falls back to the default layout, then the first. A
    /// failed load leaves previously loaded layouts untouched and
    /// surfaces the error through [`last_error`](Self::last_error).
    pub async fn load_layouts(&mut self) -> Result<(), StoreError> {
        match self.backend.list_layouts().await {
            Ok(layouts) => {
                let selected_id = self.current_layout().and_then(|layout| layout.id);
                self.layouts = layouts;
                self.current_index = selected_id
                    .and_then(|id| self.layouts.iter().position(|l| l.id == Some(id)))
                    .or_else(|| self.layouts.iter().position(|l| l.is_default))
                    .or(if self.layouts.is_empty() { None } else { Some(0) });
                self.last_error = None;

                tracing::debug!(count = self.layouts.len(), "Layouts loaded");
                self.emit(StoreEvent::LayoutsLoaded {
                    count: self.layouts.len(),
                });
                Ok(())
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to load layouts");
                self.last_error = Some(err.to_string());
                self.emit(StoreEvent::PersistenceFailed {
                    operation: "load",
                    message: err.to_string(),
                });
                Err(err.into())
            }
        }
    }

    /// Persist the current layout, reload the list, and clear the dirty
    /// flag.
    ///
    /// The draft is snapshotted when the request is issued: an edit made
    /// while the save is in flight is not part of the request and is
    /// overwritten by the reload. Known last-writer-wins tradeoff for a
    /// single-user editing surface.
    pub async fn save_current_layout(&mut self) -> Result<LayoutId, StoreError> {
        let draft = self.current_layout().ok_or(StoreError::NoLayoutSelected)?;
        validate_layout_name(&draft.name)?;
        let snapshot = draft.clone();

        match self.backend.save_layout(&snapshot).await {
            Ok(saved) => {
                let layout_id = saved.id.ok_or(StoreError::MissingLayoutId)?;
                self.load_layouts().await?;
                self.current_index = self
                    .layouts
                    .iter()
                    .position(|l| l.id == Some(layout_id))
                    .or(self.current_index);
                if self.has_unsaved_changes {
                    self.has_unsaved_changes = false;
                    self.emit(StoreEvent::DirtyChanged { dirty: false });
                }
                tracing::info!(layout_id, "Layout saved");
                Ok(layout_id)
            }
            Err(err) => {
                tracing::error!(error = %err, "Failed to save layout");
                self.emit(StoreEvent::PersistenceFailed {
                    operation: "save",
                    message: err.to_string(),
                });
                Err(err.into())
            }
        }
    }

    /// Delete a layout and reload. In-memory state is untouched on
    /// failure so the user can retry.
    pub async fn delete_layout(&mut self, id: LayoutId) -> Result<(), StoreError> {
        match self.backend.delete_layout(id).await {
            Ok(()) => {
                tracing::info!(layout_id = id, "Layout deleted");
                self.load_layouts().await
            }
            Err(err) => {
                tracing::error!(layout_id = id, error = %err, "Failed to delete layout");
                self.emit(StoreEvent::PersistenceFailed {
                    operation: "delete",
                    message: err.to_string(),
                });
                Err(err.into())
            }
        }
    }

    /// Mark a layout as the default and reload; the backend owns the
    /// at-most-one-default invariant.
    pub async fn set_default_layout(&mut self, id: LayoutId) -> Result<(), StoreError> {
        match self.backend.set_default_layout(id).await {
            Ok(()) => {
                tracing::info!(layout_id = id, "Default layout changed");
                self.load_layouts().await
            }
            Err(err) => {
                tracing::error!(layout_id = id, error = %err, "Failed to set default layout");
                self.emit(StoreEvent::PersistenceFailed {
                    operation: "set-default",
                    message: err.to_string(),
                });
                Err(err.into())
            }
        }
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn current_layout_mut(&mut self) -> Result<&mut Layout, StoreError> {
        let index = self.current_index.ok_or(StoreError::NoLayoutSelected)?;
        Ok(&mut self.layouts[index])
    }

    fn mark_dirty(&mut self) {
        if !self.has_unsaved_changes {
            self.has_unsaved_changes = true;
            self.emit(StoreEvent::DirtyChanged { dirty: true });
        }
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine; events are best-effort notifications.
        let _ = self.event_tx.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use async_trait::async_trait;

    struct NullBackend;

    #[async_trait]
    impl LayoutBackend for NullBackend {
        async fn list_layouts(&self) -> Result<Vec<Layout>, GatewayError> {
            Ok(Vec::new())
        }
        async fn save_layout(&self, _layout: &Layout) -> Result<Layout, GatewayError> {
            Err(GatewayError::HttpStatus(501))
        }
        async fn delete_layout(&self, _id: LayoutId) -> Result<(), GatewayError> {
            Ok(())
        }
        async fn set_default_layout(&self, _id: LayoutId) -> Result<(), GatewayError> {
            Ok(())
        }
    }

    fn draft_store() -> LayoutStore {
        let mut store = LayoutStore::new(Arc::new(NullBackend));
        store
            .dispatch(LayoutAction::NewLayout {
                name: "Test".into(),
            })
            .unwrap();
        store
    }

    fn only_widget_id(store: &LayoutStore) -> WidgetId {
        store
            .current_layout()
            .unwrap()
            .widgets
            .keys()
            .next()
            .unwrap()
            .clone()
    }

    #[test]
    fn new_layout_marks_store_dirty() {
        let store = draft_store();
        assert!(store.has_unsaved_changes());
        assert_eq!(store.current_layout().unwrap().name, "Test");
    }

    #[test]
    fn add_widget_places_at_next_free_slot() {
        let mut store = draft_store();
        store
            .dispatch(LayoutAction::AddWidget {
                widget_type: WidgetType::RecentOrders,
                settings: serde_json::Map::new(),
            })
            .unwrap();
        store
            .dispatch(LayoutAction::AddWidget {
                widget_type: WidgetType::OverdueRentals,
                settings: serde_json::Map::new(),
            })
            .unwrap();

        let layout = store.current_layout().unwrap();
        let mut positions: Vec<GridPosition> =
            layout.widgets.values().map(|w| w.position).collect();
        positions.sort_by_key(|p| (p.row, p.col));
        assert_eq!(positions, vec![GridPosition::new(0, 0, 6), GridPosition::new(6, 0, 6)]);
    }

    #[test]
    fn move_widget_clamps_overflow() {
        let mut store = draft_store();
        store
            .dispatch(LayoutAction::AddWidget {
                widget_type: WidgetType::RecentOrders,
                settings: serde_json::Map::new(),
            })
            .unwrap();
        let widget_id = only_widget_id(&store);

        store
            .dispatch(LayoutAction::MoveWidget {
                widget_id: widget_id.clone(),
                position: GridPosition::new(10, 2, 6),
            })
            .unwrap();

        let widget = store.current_layout().unwrap().widget(&widget_id).unwrap();
        assert_eq!(widget.position, GridPosition::new(6, 2, 6));
    }

    #[test]
    fn move_commits_even_onto_occupied_cells() {
        let mut store = draft_store();
        for widget_type in [WidgetType::RecentOrders, WidgetType::OverdueRentals] {
            store
                .dispatch(LayoutAction::AddWidget {
                    widget_type,
                    settings: serde_json::Map::new(),
                })
                .unwrap();
        }
        let layout = store.current_layout().unwrap();
        let mover = layout
            .widgets
            .values()
            .find(|w| w.position.col == 0)
            .unwrap()
            .id
            .clone();

        // Overlaps the neighbour at [6, 12): advisory policy still commits.
        store
            .dispatch(LayoutAction::MoveWidget {
                widget_id: mover.clone(),
                position: GridPosition::new(3, 0, 6),
            })
            .unwrap();
        let widget = store.current_layout().unwrap().widget(&mover).unwrap();
        assert_eq!(widget.position, GridPosition::new(3, 0, 6));
    }

    #[test]
    fn toggles_flip_flags_and_keep_position() {
        let mut store = draft_store();
        store
            .dispatch(LayoutAction::AddWidget {
                widget_type: WidgetType::FleetUtilization,
                settings: serde_json::Map::new(),
            })
            .unwrap();
        let widget_id = only_widget_id(&store);

        store
            .dispatch(LayoutAction::ToggleWidgetVisibility {
                widget_id: widget_id.clone(),
            })
            .unwrap();
        store
            .dispatch(LayoutAction::ToggleWidgetCollapsed {
                widget_id: widget_id.clone(),
            })
            .unwrap();

        let widget = store.current_layout().unwrap().widget(&widget_id).unwrap();
        assert!(!widget.visible);
        assert!(widget.collapsed);
        assert_eq!(widget.position, GridPosition::new(0, 0, 6));
    }

    #[test]
    fn unknown_widget_is_a_typed_error() {
        let mut store = draft_store();
        let result = store.dispatch(LayoutAction::ToggleWidgetVisibility {
            widget_id: "missing".into(),
        });
        assert_matches!(
            result,
            Err(StoreError::Core(CoreError::WidgetNotFound { .. }))
        );
    }

    #[test]
    fn rename_validates_the_new_name() {
        let mut store = draft_store();
        let result = store.dispatch(LayoutAction::RenameLayout { name: "  ".into() });
        assert_matches!(result, Err(StoreError::Core(CoreError::Validation(_))));
        assert_eq!(store.current_layout().unwrap().name, "Test");
    }

    #[test]
    fn dispatch_without_selection_is_rejected() {
        let mut store = LayoutStore::new(Arc::new(NullBackend));
        let result = store.dispatch(LayoutAction::AddWidget {
            widget_type: WidgetType::DepotStock,
            settings: serde_json::Map::new(),
        });
        assert_matches!(result, Err(StoreError::NoLayoutSelected));
    }

    #[test]
    fn edit_mode_toggle_emits_event() {
        let mut store = draft_store();
        let mut events = store.subscribe();
        store.set_edit_mode(true);
        store.set_edit_mode(true); // no-op, no duplicate event

        assert_matches!(
            events.try_recv(),
            Ok(StoreEvent::EditModeChanged { enabled: true })
        );
        assert!(events.try_recv().is_err());
    }
}
