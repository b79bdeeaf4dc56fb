//! Connection records, webhook events and search types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identifiers::{ConnectionId, OrgId, TenantId};

// ============================================================================
// Stored Connection
// ============================================================================

/// One counterparty connection for an organization
///
/// `their_label` is masked before the record is built and never changes after
/// the first write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Identifier assigned by the agent
    pub connection_id: ConnectionId,
    /// Owning organization
    pub org_id: OrgId,
    /// Agent state machine value, e.g. `invitation-sent`, `completed`
    pub state: String,
    /// Masked counterparty label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub their_label: Option<String>,
    /// First time the agent reported the connection
    pub create_date_time: DateTime<Utc>,
    /// Last time the agent reported a change
    pub last_changed_date_time: DateTime<Utc>,
    /// Organization that created the record
    pub created_by: OrgId,
    /// Organization that last changed the record
    pub last_changed_by: OrgId,
}

// ============================================================================
// Webhook Event
// ============================================================================

/// Connection state notification emitted by an agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionEvent {
    /// Connection id
    #[serde(alias = "connectionId")]
    pub id: ConnectionId,
    /// New state
    pub state: String,
    /// Unmasked counterparty label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub their_label: Option<String>,
    /// DID of the organization side
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub org_did: Option<String>,
    /// Whether the agent accepts the connection automatically
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_accept_connection: Option<bool>,
    /// Out-of-band record the connection came from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_of_band_id: Option<String>,
    /// When the agent created the connection
    pub create_date_time: DateTime<Utc>,
    /// When the agent last changed the connection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_changed_date_time: Option<DateTime<Utc>>,
    /// Tenant id on shared agents, `"default"` on dedicated agents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_correlation_id: Option<String>,
}

impl ConnectionEvent {
    /// Tenant the event was emitted for, if it came from a shared agent
    #[must_use]
    pub fn tenant_id(&self) -> Option<TenantId> {
        self.context_correlation_id
            .as_deref()
            .filter(|id| !id.is_empty() && *id != super::identifiers::DEFAULT_CORRELATION_ID)
            .map(TenantId::from)
    }

    /// Change timestamp, falling back to creation time
    #[must_use]
    pub fn changed_at(&self) -> DateTime<Utc> {
        self.last_changed_date_time.unwrap_or(self.create_date_time)
    }
}

// ============================================================================
// Search
// ============================================================================

/// Sort direction for connection listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortDirection {
    /// Ascending
    #[serde(rename = "ASC")]
    Asc,
    /// Descending
    #[default]
    #[serde(rename = "DESC")]
    Desc,
}

impl SortDirection {
    /// `ASC` maps to ascending, anything else to descending
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value == "ASC" { Self::Asc } else { Self::Desc }
    }
}

/// Column a connection listing is ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    /// Creation time
    #[default]
    CreateDateTime,
    /// Last change time
    LastChangedDateTime,
    /// Masked label
    TheirLabel,
    /// State
    State,
    /// Connection id
    ConnectionId,
}

/// Raw listing criteria as sent by callers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSearchCriteria {
    /// Case-insensitive text matched against label or connection id
    #[serde(default)]
    pub search_by_text: Option<String>,
    /// Page size
    #[serde(default)]
    pub page_size: Option<usize>,
    /// One-based page number
    #[serde(default)]
    pub page_number: Option<usize>,
    /// Column to order by
    #[serde(default)]
    pub sort_field: Option<SortField>,
    /// `ASC` or anything else for descending
    #[serde(default)]
    pub sort_by: Option<String>,
}

/// Pagination metadata and the current page of connections
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedConnections {
    /// Total matching records
    pub total_items: usize,
    /// More pages after this one
    pub has_next_page: bool,
    /// Pages before this one
    pub has_previous_page: bool,
    /// Page number after this one
    pub next_page: usize,
    /// Page number before this one
    pub previous_page: usize,
    /// Last page number
    pub last_page: usize,
    /// Records on this page
    pub data: Vec<Connection>,
}

// ============================================================================
// Live Detail
// ============================================================================

/// Connection detail returned live by the agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionDetail {
    /// Connection id
    pub id: ConnectionId,
    /// Agent state
    #[serde(default)]
    pub state: Option<String>,
    /// Protocol role
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    /// Counterparty label as the agent holds it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub their_label: Option<String>,
    /// Counterparty DID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub their_did: Option<String>,
    /// Own DID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub did: Option<String>,
    /// Remaining agent-specific fields
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Result of removing every connection of an organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletedConnections {
    /// Snapshot of the rows taken before deletion
    pub deleted_connections_records: Vec<Connection>,
    /// Number of rows removed
    pub deleted_count: usize,
}
