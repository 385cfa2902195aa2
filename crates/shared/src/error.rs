use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body returned by the tax service on non-success responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub messages: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ServiceErrorBody {
    pub fn from_messages<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            messages: Some(messages.into_iter().map(Into::into).collect()),
            message: None,
        }
    }

    /// The structured messages joined with `", "`, if any were supplied.
    pub fn joined_messages(&self) -> Option<String> {
        let messages = self.messages.as_ref()?;
        let joined = messages
            .iter()
            .map(|m| m.trim())
            .filter(|m| !m.is_empty())
            .collect::<Vec<_>>()
            .join(", ");
        if joined.is_empty() {
            None
        } else {
            Some(joined)
        }
    }
}

#[derive(Debug, Error)]
#[error("service responded with status {status}")]
pub struct ServiceException {
    pub status: u16,
    pub body: ServiceErrorBody,
}

impl ServiceException {
    pub fn new(status: u16, body: ServiceErrorBody) -> Self {
        Self { status, body }
    }
}

impl From<ServiceException> for ServiceErrorBody {
    fn from(value: ServiceException) -> Self {
        value.body
    }
}
