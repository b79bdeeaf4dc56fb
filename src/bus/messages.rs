//! Bus message types
//!
//! Every message on the bus is one JSON object per line, tagged by `type`.

use serde::{Deserialize, Serialize};

use crate::error::ErrorResponse;
use crate::types::identifiers::RequestId;

/// Envelope for all bus messages
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BusMessage {
    /// Request addressed to whichever service handles `pattern`
    #[serde(rename = "request")]
    Request(BusRequest),
    /// Reply to an earlier request
    #[serde(rename = "reply")]
    Reply(BusReply),
}

/// Request addressed by message pattern
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusRequest {
    /// Correlation id echoed by the reply
    pub id: RequestId,
    /// Message pattern, e.g. `get-org-agent-api-key`
    pub pattern: String,
    /// Pattern-specific payload
    #[serde(default)]
    pub payload: serde_json::Value,
}

/// Reply to a request
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum BusReply {
    /// Successful reply
    #[serde(rename = "success")]
    Success {
        /// Request id this replies to
        id: RequestId,
        /// Reply data
        #[serde(default)]
        data: serde_json::Value,
    },
    /// Error reply
    #[serde(rename = "error")]
    Error {
        /// Request id this replies to
        id: RequestId,
        /// Structured error
        error: ErrorResponse,
    },
}

impl BusReply {
    /// Request id this replies to
    #[must_use]
    pub fn id(&self) -> &RequestId {
        match self {
            Self::Success { id, .. } | Self::Error { id, .. } => id,
        }
    }
}
