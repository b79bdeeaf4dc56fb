//! Error types for connection orchestration

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tables whose rows may still reference an organization's connections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ReferenceTable {
    /// Issued credential records
    Credentials,
    /// Presentation (proof) records
    Presentations,
}

impl ReferenceTable {
    /// Table name as reported to callers
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Credentials => "credentials",
            Self::Presentations => "presentations",
        }
    }
}

impl std::fmt::Display for ReferenceTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for connection orchestration
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// Missing org agent, invitation target, shortened URL or empty search result
    #[error("Not found: {0}")]
    NotFound(String),

    /// Operation blocked by live references
    #[error("Conflict: {message}")]
    Conflict {
        /// Human readable reason
        message: String,
        /// Tables still referencing the organization (empty when not applicable)
        blocking: Vec<ReferenceTable>,
    },

    /// Org agent carries an agent type no URL template exists for.
    ///
    /// Signals a data-integrity fault in the org-agent directory and is never retried.
    #[error("Agent URL not found: {0}")]
    AgentUrlNotFound(String),

    /// Failure reported by (or while calling) the agent service
    #[error("Agent error{}: {message}", status.map(|s| format!(" ({s})")).unwrap_or_default())]
    UpstreamAgent {
        /// Status code reported by the agent, if any
        status: Option<u16>,
        /// Reason reported by the agent, or the raw error text
        message: String,
    },

    /// Malformed input
    #[error("Validation error: {0}")]
    Validation(String),

    /// Outbound request did not complete in time
    #[error("Timeout: {0}")]
    Timeout(String),

    /// Message bus failure (closed channel, undeliverable request)
    #[error("Bus error: {0}")]
    Bus(String),

    /// Storage layer failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// JSON encode/decode error
    #[error("JSON decode error: {0}")]
    JsonDecode(#[from] serde_json::Error),

    /// I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for connection operations
pub type Result<T> = std::result::Result<T, ConnectionError>;

impl ConnectionError {
    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a conflict error without blocking tables
    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict {
            message: msg.into(),
            blocking: Vec::new(),
        }
    }

    /// Create a conflict error naming the tables that block the operation
    pub fn blocked_by(msg: impl Into<String>, blocking: Vec<ReferenceTable>) -> Self {
        Self::Conflict {
            message: msg.into(),
            blocking,
        }
    }

    /// Create an agent URL not found error
    pub fn agent_url_not_found(agent_type: impl Into<String>) -> Self {
        Self::AgentUrlNotFound(agent_type.into())
    }

    /// Create an upstream agent error
    pub fn upstream(status: Option<u16>, msg: impl Into<String>) -> Self {
        Self::UpstreamAgent {
            status,
            message: msg.into(),
        }
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a timeout error
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Create a bus error
    pub fn bus(msg: impl Into<String>) -> Self {
        Self::Bus(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create an invalid configuration error
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Machine status code carried to callers
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) | Self::AgentUrlNotFound(_) => 404,
            Self::Conflict { .. } => 409,
            Self::UpstreamAgent { status, .. } => status.unwrap_or(502),
            Self::Validation(_) | Self::JsonDecode(_) => 400,
            Self::Timeout(_) => 504,
            Self::Bus(_) | Self::Storage(_) | Self::Io(_) | Self::InvalidConfig(_) => 500,
        }
    }

    /// Whether a caller may reasonably retry the operation
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout(_) | Self::Bus(_))
    }
}

/// Outward-facing error shape returned to callers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Machine status code
    pub status_code: u16,
    /// Human readable message
    pub message: String,
    /// Short error class
    pub error: String,
    /// Tables blocking a deletion, when relevant
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocking: Vec<ReferenceTable>,
}

impl From<&ConnectionError> for ErrorResponse {
    fn from(err: &ConnectionError) -> Self {
        let (error, message, blocking) = match err {
            ConnectionError::NotFound(msg) => ("NotFound", msg.clone(), Vec::new()),
            ConnectionError::AgentUrlNotFound(agent_type) => (
                "AgentUrlNotFound",
                format!("Agent url not found for agent type '{agent_type}'"),
                Vec::new(),
            ),
            ConnectionError::Conflict { message, blocking } => {
                ("Conflict", message.clone(), blocking.clone())
            }
            ConnectionError::UpstreamAgent { message, .. } => {
                ("UpstreamAgentError", message.clone(), Vec::new())
            }
            ConnectionError::Validation(msg) => ("ValidationError", msg.clone(), Vec::new()),
            ConnectionError::JsonDecode(e) => ("ValidationError", e.to_string(), Vec::new()),
            ConnectionError::Timeout(msg) => ("Timeout", msg.clone(), Vec::new()),
            other => ("InternalError", other.to_string(), Vec::new()),
        };

        Self {
            status_code: err.status_code(),
            message,
            error: error.to_string(),
            blocking,
        }
    }
}

impl From<ConnectionError> for ErrorResponse {
    fn from(err: ConnectionError) -> Self {
        Self::from(&err)
    }
}
