//! Persistence seams
//!
//! The service depends on these traits only. [`MemoryStore`] implements all of
//! them in process; a relational backend implements the same contracts, with
//! [`ConnectionStore::begin`] mapping to a database transaction.

mod memory;

use std::future::Future;

use chrono::{DateTime, Utc};

use crate::error::{ReferenceTable, Result};
use crate::masking::MaskedLabel;
use crate::types::{
    AgentInvitation, Connection, ConnectionId, OrgAgent, OrgId, ShorteningUrl, SortDirection,
    SortField, TenantId,
};

pub use memory::{MemoryStore, MemoryTransaction};

/// Read-only lookup of org-agent records
pub trait OrgAgentDirectory: Send + Sync {
    /// Agent record of an organization
    fn find_by_org(&self, org_id: &OrgId) -> impl Future<Output = Result<Option<OrgAgent>>> + Send;

    /// Agent record owning a tenant on a shared agent
    fn find_by_tenant(
        &self,
        tenant_id: &TenantId,
    ) -> impl Future<Output = Result<Option<OrgAgent>>> + Send;
}

/// Storage of the per-organization legacy invitation
pub trait InvitationStore: Send + Sync {
    /// Stored invitation of an organization
    fn find_invitation(
        &self,
        org_id: &OrgId,
    ) -> impl Future<Output = Result<Option<AgentInvitation>>> + Send;

    /// Store an invitation unless the organization already has one
    ///
    /// Returns the row that is stored after the call, which is the existing
    /// one when another request won the race.
    fn save_invitation(
        &self,
        invitation: AgentInvitation,
    ) -> impl Future<Output = Result<AgentInvitation>> + Send;
}

/// Storage of shortened invitation URLs
pub trait ShorteningUrlStore: Send + Sync {
    /// Store a new mapping; an existing reference fails with `Conflict`
    fn insert_shortening_url(
        &self,
        url: ShorteningUrl,
    ) -> impl Future<Output = Result<ShorteningUrl>> + Send;

    /// Look up a mapping
    fn find_shortening_url(
        &self,
        reference_id: &str,
    ) -> impl Future<Output = Result<Option<ShorteningUrl>>> + Send;
}

/// Values written by a webhook upsert
///
/// On insert every field is written. On update only `state`,
/// `last_changed_date_time` and `actor` (as `last_changed_by`) are.
#[derive(Debug, Clone)]
pub struct ConnectionUpsert {
    /// Row key
    pub connection_id: ConnectionId,
    /// Resolved owning organization
    pub org_id: OrgId,
    /// Agent state
    pub state: String,
    /// Masked counterparty label
    pub their_label: Option<MaskedLabel>,
    /// Creation time reported by the agent
    pub create_date_time: DateTime<Utc>,
    /// Change time reported by the agent
    pub last_changed_date_time: DateTime<Utc>,
    /// Organization recorded as creator/changer
    pub actor: OrgId,
}

/// Validated connection listing query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionQuery {
    /// Lower-cased search text
    pub search_text: Option<String>,
    /// Page size, at least 1
    pub page_size: usize,
    /// One-based page number
    pub page_number: usize,
    /// Ordering column
    pub sort_field: SortField,
    /// Ordering direction
    pub direction: SortDirection,
}

/// A page of connections plus the total number of matches
#[derive(Debug, Clone)]
pub struct ConnectionPage {
    /// Total matches across all pages
    pub total_items: usize,
    /// Rows on the requested page
    pub items: Vec<Connection>,
}

/// Connection table access
pub trait ConnectionStore: Send + Sync {
    /// Transaction type returned by [`ConnectionStore::begin`]
    type Transaction: ConnectionTransaction;

    /// Insert or update a connection keyed by connection id
    fn upsert_connection(
        &self,
        upsert: ConnectionUpsert,
    ) -> impl Future<Output = Result<Connection>> + Send;

    /// Filter, sort and page an organization's connections
    fn search_connections(
        &self,
        org_id: &OrgId,
        query: &ConnectionQuery,
    ) -> impl Future<Output = Result<ConnectionPage>> + Send;

    /// Start a transaction
    ///
    /// Reads and writes through the transaction must not interleave with
    /// concurrent writers to the connection or dependent tables.
    fn begin(&self) -> impl Future<Output = Result<Self::Transaction>> + Send;
}

/// Atomic unit of work over connections and the tables referencing them
///
/// Dropping a transaction without committing discards its changes.
pub trait ConnectionTransaction: Send {
    /// Rows in `table` referencing the organization
    fn count_references(
        &mut self,
        org_id: &OrgId,
        table: ReferenceTable,
    ) -> impl Future<Output = Result<usize>> + Send;

    /// Connections of the organization as seen by this transaction
    fn connections_for_org(
        &mut self,
        org_id: &OrgId,
    ) -> impl Future<Output = Result<Vec<Connection>>> + Send;

    /// Delete the organization's connections, returning the number removed
    fn delete_connections_for_org(
        &mut self,
        org_id: &OrgId,
    ) -> impl Future<Output = Result<usize>> + Send;

    /// Make the changes visible
    fn commit(self) -> impl Future<Output = Result<()>> + Send;

    /// Discard the changes
    fn rollback(self) -> impl Future<Output = Result<()>> + Send;
}

/// Everything the connection service persists to
pub trait Repository:
    OrgAgentDirectory + InvitationStore + ConnectionStore + ShorteningUrlStore
{
}

impl<T> Repository for T where
    T: OrgAgentDirectory + InvitationStore + ConnectionStore + ShorteningUrlStore
{
}
