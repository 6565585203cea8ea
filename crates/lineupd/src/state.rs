use lineup_core::Pipeline;
use std::sync::Arc;

/// Shared application state: the pipeline is built once at startup and
/// served read-only to every request.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
}
