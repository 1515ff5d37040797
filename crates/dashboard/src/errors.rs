use thiserror::Error;

use crate::types::HistoryHorizon;

/// Typed error hierarchy for the dashboard service.
///
/// Adapter internals propagate with `anyhow::Context`; the variants below are
/// the ones callers branch on (e.g. the HTTP layer mapping history exhaustion
/// to 503). Transport and JSON failures stay `anyhow` with context.
#[derive(Error, Debug)]
pub enum DashboardError {
    // -- Feeds --------------------------------------------------------------
    #[error("all price history sources unavailable ({horizon})")]
    HistoryUnavailable { horizon: HistoryHorizon },

    #[error("upstream {url} returned HTTP {status}")]
    UpstreamStatus { url: String, status: u16 },

    #[error("malformed payload from {provider}: {reason}")]
    MalformedPayload { provider: String, reason: String },

    #[error("{provider} returned {points} points (need more than {required})")]
    InsufficientData {
        provider: String,
        points: usize,
        required: usize,
    },

    #[error("unknown provider `{name}` for feed `{feed}`")]
    UnknownProvider { feed: String, name: String },

    // -- Configuration ------------------------------------------------------
    #[error("configuration error: {0}")]
    Config(String),
}

impl DashboardError {
    /// Shorthand for a [`DashboardError::MalformedPayload`].
    pub fn malformed(provider: &str, reason: impl Into<String>) -> Self {
        Self::MalformedPayload {
            provider: provider.to_string(),
            reason: reason.into(),
        }
    }

    /// Shorthand for a [`DashboardError::UnknownProvider`].
    pub fn unknown_provider(feed: impl Into<String>, name: impl Into<String>) -> Self {
        Self::UnknownProvider {
            feed: feed.into(),
            name: name.into(),
        }
    }
}
