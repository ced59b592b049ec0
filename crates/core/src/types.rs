/// Layout ids are assigned by the layout backend on first save.
pub type LayoutId = i64;

/// Widget instance ids are UUID-v4 strings generated at insertion time,
/// unique within their layout.
pub type WidgetId = String;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
