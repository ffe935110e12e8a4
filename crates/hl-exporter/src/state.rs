use std::sync::Arc;

use crate::config::Network;
use crate::metrics::PrometheusSink;

/// Shared application state for the scrape server.
pub struct AppState {
    /// Registry the monitor publishes into.
    pub sink: Arc<PrometheusSink>,
    pub network: Network,
    /// Bearer token for /metrics (None = public).
    pub metrics_token: Option<Vec<u8>>,
}
