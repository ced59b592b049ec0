use crate::types::{LayoutId, WidgetId};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Layout not found: {id}")]
    LayoutNotFound { id: LayoutId },

    #[error("Widget not found in layout: {id}")]
    WidgetNotFound { id: WidgetId },

    #[error("Validation failed: {0}")]
    Validation(String),
}
