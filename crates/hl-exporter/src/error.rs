//! Validator monitor error types.

/// Ways the outbound call can fail before a response body is available.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("upstream returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("request cancelled")]
    Cancelled,
}

/// Errors that abort a single monitor cycle.
///
/// Each variant names the step that failed and keeps the underlying cause
/// reachable through [`std::error::Error::source`].
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("error creating request: {0}")]
    RequestConstruction(#[source] reqwest::Error),

    #[error("error making request: {0}")]
    Transport(#[from] TransportError),

    #[error("error reading response body: {0}")]
    BodyRead(#[source] reqwest::Error),

    #[error("error decoding validator summaries: {0}")]
    Decode(#[from] serde_json::Error),
}

impl MonitorError {
    /// Short machine-readable name of the failed step, used as a log field
    /// and as the `result` label on the cycle counter.
    pub fn kind(&self) -> &'static str {
        match self {
            MonitorError::RequestConstruction(_) => "request_construction",
            MonitorError::Transport(_) => "transport",
            MonitorError::BodyRead(_) => "body_read",
            MonitorError::Decode(_) => "decode",
        }
    }

    /// True when the cycle was aborted by the shutdown signal.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, MonitorError::Transport(TransportError::Cancelled))
    }
}
