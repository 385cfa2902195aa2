//! Client-side error type and the user-facing messages derived from it.

use shared::error::ServiceException;
use thiserror::Error;

/// Shown when a calculation fails without structured messages from the service.
pub const CALCULATION_FAILED: &str = "Calculation failed";
/// Shown when the municipality endpoint answers with a non-success status.
pub const MUNICIPALITIES_UNAVAILABLE: &str = "Could not fetch municipalities";

#[derive(Debug, Error)]
pub enum ApiClientError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error(transparent)]
    Service(#[from] ServiceException),
    #[error("malformed response body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiClientError {
    /// Normalized message for a failed tax calculation. Only the service's
    /// structured `messages` are surfaced; everything else maps to
    /// [`CALCULATION_FAILED`].
    pub fn calculation_message(&self) -> String {
        match self {
            Self::Service(err) => err
                .body
                .joined_messages()
                .unwrap_or_else(|| CALCULATION_FAILED.to_string()),
            Self::Transport { .. } | Self::Decode { .. } => CALCULATION_FAILED.to_string(),
        }
    }

    /// Normalized message for a failed municipality load.
    pub fn municipality_load_message(&self) -> String {
        match self {
            Self::Service(_) => MUNICIPALITIES_UNAVAILABLE.to_string(),
            other => other.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Service(err) => Some(err.status),
            Self::Transport { source, .. } => source.status().map(|s| s.as_u16()),
            Self::Decode { .. } => None,
        }
    }
}
