use eabridge_queue::QueueStore;
use std::sync::Arc;

/// Shared application state accessible by all route handlers.
pub struct AppState {
    pub store: Arc<QueueStore>,
    /// EA id substituted whenever a request leaves `ea_id` out.
    pub default_ea_id: String,
}

impl AppState {
    pub fn new(store: Arc<QueueStore>, default_ea_id: impl Into<String>) -> Self {
        Self {
            store,
            default_ea_id: default_ea_id.into(),
        }
    }
}
