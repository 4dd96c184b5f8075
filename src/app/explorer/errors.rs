//! Error taxonomy for explorer operations.
//!
//! Every provider backend reports failures through [`ExplorerError`], so panes
//! can surface them without knowing whether the data came from the in-memory
//! mock or a remote API. HTTP responses are categorized by status code, with
//! the response body trimmed into the message for display.

use std::time::Duration;

pub type ExplorerResult<T> = Result<T, ExplorerError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExplorerError {
    /// Id unknown to the addressed organization
    NotFound { organization_id: String, id: String },
    /// Move/copy would break the forest invariant
    InvalidTarget { reason: String },
    /// Rename to an empty name
    InvalidName { name: String },
    /// Authentication failed or no credential available
    Unauthorized { message: String },
    /// Transport, timeout or server-side failure
    ProviderUnavailable {
        message: String,
        retry_after: Option<Duration>,
    },
}

impl ExplorerError {
    pub fn not_found(organization_id: &str, id: &str) -> Self {
        ExplorerError::NotFound {
            organization_id: organization_id.to_string(),
            id: id.to_string(),
        }
    }

    pub fn invalid_target(reason: impl Into<String>) -> Self {
        ExplorerError::InvalidTarget {
            reason: reason.into(),
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        ExplorerError::ProviderUnavailable {
            message: message.into(),
            retry_after: None,
        }
    }

    /// Attach a server-suggested delay to a `ProviderUnavailable` error
    pub fn with_retry_after(self, delay: Option<Duration>) -> Self {
        match self {
            ExplorerError::ProviderUnavailable {
                message,
                retry_after,
            } => ExplorerError::ProviderUnavailable {
                message,
                retry_after: delay.or(retry_after),
            },
            other => other,
        }
    }

    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            ExplorerError::ProviderUnavailable { retry_after, .. } => *retry_after,
            _ => None,
        }
    }

    /// Whether trying the same call again later could succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExplorerError::ProviderUnavailable { .. })
    }

    /// User-friendly message for status display
    pub fn user_message(&self) -> String {
        match self {
            ExplorerError::NotFound { id, .. } => format!("{} no longer exists", id),
            ExplorerError::InvalidTarget { reason } => format!("Cannot drop here: {}", reason),
            ExplorerError::InvalidName { .. } => "Name cannot be empty".to_string(),
            ExplorerError::Unauthorized { .. } => "Sign-in required".to_string(),
            ExplorerError::ProviderUnavailable {
                retry_after: Some(delay),
                ..
            } => format!("Service unavailable, retry in {}s", delay.as_secs().max(1)),
            ExplorerError::ProviderUnavailable { .. } => "Service unavailable".to_string(),
        }
    }

    /// Short label for compact display
    pub fn short_label(&self) -> &'static str {
        match self {
            ExplorerError::NotFound { .. } => "not found",
            ExplorerError::InvalidTarget { .. } => "invalid target",
            ExplorerError::InvalidName { .. } => "invalid name",
            ExplorerError::Unauthorized { .. } => "unauthorized",
            ExplorerError::ProviderUnavailable { .. } => "unavailable",
        }
    }

    /// Categorize a non-success HTTP response.
    ///
    /// `id` is the node the request addressed, used to fill `NotFound`.
    pub fn from_status(status: u16, body: &str, organization_id: &str, id: &str) -> Self {
        match status {
            401 | 403 => ExplorerError::Unauthorized {
                message: truncate_message(body, 200),
            },
            404 => ExplorerError::not_found(organization_id, id),
            409 | 422 => ExplorerError::InvalidTarget {
                reason: truncate_message(body, 200),
            },
            429 => ExplorerError::ProviderUnavailable {
                message: format!("rate limited: {}", truncate_message(body, 100)),
                retry_after: None,
            },
            _ => ExplorerError::ProviderUnavailable {
                message: format!("HTTP {}: {}", status, truncate_message(body, 100)),
                retry_after: None,
            },
        }
    }
}

impl std::fmt::Display for ExplorerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExplorerError::NotFound {
                organization_id,
                id,
            } => write!(f, "Node '{}' not found in organization '{}'", id, organization_id),
            ExplorerError::InvalidTarget { reason } => write!(f, "Invalid target: {}", reason),
            ExplorerError::InvalidName { name } => write!(f, "Invalid name: '{}'", name),
            ExplorerError::Unauthorized { message } => write!(f, "Unauthorized: {}", message),
            ExplorerError::ProviderUnavailable { message, .. } => {
                write!(f, "Provider unavailable: {}", message)
            }
        }
    }
}

impl std::error::Error for ExplorerError {}

impl From<reqwest::Error> for ExplorerError {
    fn from(error: reqwest::Error) -> Self {
        if let Some(status) = error.status() {
            if status == reqwest::StatusCode::UNAUTHORIZED
                || status == reqwest::StatusCode::FORBIDDEN
            {
                return ExplorerError::Unauthorized {
                    message: error.to_string(),
                };
            }
        }
        let kind = if error.is_timeout() {
            "timeout"
        } else if error.is_connect() {
            "connection failed"
        } else if error.is_decode() {
            "malformed response"
        } else {
            "request failed"
        };
        ExplorerError::ProviderUnavailable {
            message: format!("{}: {}", kind, truncate_message(&error.to_string(), 100)),
            retry_after: None,
        }
    }
}

/// Truncate a message to `max_len` characters, adding ellipsis if truncated
fn truncate_message(msg: &str, max_len: usize) -> String {
    let msg = msg.trim();
    if msg.chars().count() <= max_len {
        msg.to_string()
    } else {
        let kept: String = msg.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
