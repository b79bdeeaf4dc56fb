//! In-process store
//!
//! All tables live behind one async mutex. A transaction owns the lock for its
//! whole lifetime and works on a copy of the connection table, so nothing can
//! be written between its reference check and its delete.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

use super::{
    ConnectionPage, ConnectionQuery, ConnectionStore, ConnectionTransaction, ConnectionUpsert,
    InvitationStore, OrgAgentDirectory, ShorteningUrlStore,
};
use crate::error::{ConnectionError, ReferenceTable, Result};
use crate::types::{
    AgentInvitation, Connection, ConnectionId, OrgAgent, OrgId, ShorteningUrl, SortDirection,
    SortField, TenantId,
};

#[derive(Default)]
struct StoreState {
    org_agents: HashMap<OrgId, OrgAgent>,
    invitations: HashMap<OrgId, AgentInvitation>,
    connections: HashMap<ConnectionId, Connection>,
    shortening_urls: HashMap<String, ShorteningUrl>,
    references: HashMap<(OrgId, ReferenceTable), usize>,
}

/// Store held in process memory
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an org agent (provisioning side)
    pub async fn insert_org_agent(&self, agent: OrgAgent) {
        self.state
            .lock()
            .await
            .org_agents
            .insert(agent.org_id.clone(), agent);
    }

    /// Record a credential row referencing the organization
    pub async fn record_credential(&self, org_id: &OrgId) {
        self.add_reference(org_id, ReferenceTable::Credentials).await;
    }

    /// Record a presentation row referencing the organization
    pub async fn record_presentation(&self, org_id: &OrgId) {
        self.add_reference(org_id, ReferenceTable::Presentations)
            .await;
    }

    async fn add_reference(&self, org_id: &OrgId, table: ReferenceTable) {
        *self
            .state
            .lock()
            .await
            .references
            .entry((org_id.clone(), table))
            .or_default() += 1;
    }

    /// Stored connection by id
    pub async fn connection(&self, connection_id: &ConnectionId) -> Option<Connection> {
        self.state
            .lock()
            .await
            .connections
            .get(connection_id)
            .cloned()
    }

    /// Number of stored connections across all organizations
    pub async fn connection_count(&self) -> usize {
        self.state.lock().await.connections.len()
    }

    /// Number of stored invitations across all organizations
    pub async fn invitation_count(&self) -> usize {
        self.state.lock().await.invitations.len()
    }
}

impl OrgAgentDirectory for MemoryStore {
    async fn find_by_org(&self, org_id: &OrgId) -> Result<Option<OrgAgent>> {
        Ok(self.state.lock().await.org_agents.get(org_id).cloned())
    }

    async fn find_by_tenant(&self, tenant_id: &TenantId) -> Result<Option<OrgAgent>> {
        Ok(self
            .state
            .lock()
            .await
            .org_agents
            .values()
            .find(|agent| agent.tenant_id.as_ref() == Some(tenant_id))
            .cloned())
    }
}

impl InvitationStore for MemoryStore {
    async fn find_invitation(&self, org_id: &OrgId) -> Result<Option<AgentInvitation>> {
        Ok(self.state.lock().await.invitations.get(org_id).cloned())
    }

    async fn save_invitation(&self, invitation: AgentInvitation) -> Result<AgentInvitation> {
        let mut state = self.state.lock().await;
        Ok(state
            .invitations
            .entry(invitation.org_id.clone())
            .or_insert(invitation)
            .clone())
    }
}

impl ShorteningUrlStore for MemoryStore {
    async fn insert_shortening_url(&self, url: ShorteningUrl) -> Result<ShorteningUrl> {
        let mut state = self.state.lock().await;
        if state.shortening_urls.contains_key(&url.reference_id) {
            return Err(ConnectionError::conflict(format!(
                "Shortening URL reference {} already exists",
                url.reference_id
            )));
        }
        state
            .shortening_urls
            .insert(url.reference_id.clone(), url.clone());
        Ok(url)
    }

    async fn find_shortening_url(&self, reference_id: &str) -> Result<Option<ShorteningUrl>> {
        Ok(self
            .state
            .lock()
            .await
            .shortening_urls
            .get(reference_id)
            .cloned())
    }
}

impl ConnectionStore for MemoryStore {
    type Transaction = MemoryTransaction;

    async fn upsert_connection(&self, upsert: ConnectionUpsert) -> Result<Connection> {
        let mut state = self.state.lock().await;
        let row = state
            .connections
            .entry(upsert.connection_id.clone())
            .and_modify(|existing| {
                existing.state = upsert.state.clone();
                existing.last_changed_date_time = upsert.last_changed_date_time;
                existing.last_changed_by = upsert.actor.clone();
            })
            .or_insert_with(|| Connection {
                connection_id: upsert.connection_id.clone(),
                org_id: upsert.org_id.clone(),
                state: upsert.state.clone(),
                their_label: upsert.their_label.clone().map(|l| l.into_inner()),
                create_date_time: upsert.create_date_time,
                last_changed_date_time: upsert.last_changed_date_time,
                created_by: upsert.actor.clone(),
                last_changed_by: upsert.actor.clone(),
            });
        Ok(row.clone())
    }

    async fn search_connections(
        &self,
        org_id: &OrgId,
        query: &ConnectionQuery,
    ) -> Result<ConnectionPage> {
        let state = self.state.lock().await;
        let mut matches: Vec<Connection> = state
            .connections
            .values()
            .filter(|c| &c.org_id == org_id && matches_text(c, query.search_text.as_deref()))
            .cloned()
            .collect();
        drop(state);

        matches.sort_by(|a, b| {
            let ordering = compare_by(a, b, query.sort_field);
            match query.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });

        let total_items = matches.len();
        let skip = query.page_size.saturating_mul(query.page_number.saturating_sub(1));
        let items = matches
            .into_iter()
            .skip(skip)
            .take(query.page_size)
            .collect();

        Ok(ConnectionPage { total_items, items })
    }

    async fn begin(&self) -> Result<MemoryTransaction> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.connections.clone();
        Ok(MemoryTransaction { guard, working })
    }
}

fn matches_text(connection: &Connection, search: Option<&str>) -> bool {
    let Some(needle) = search.filter(|s| !s.is_empty()) else {
        return true;
    };
    let label_match = connection
        .their_label
        .as_deref()
        .is_some_and(|label| label.to_lowercase().contains(needle));
    label_match
        || connection
            .connection_id
            .as_str()
            .to_lowercase()
            .contains(needle)
}

fn compare_by(a: &Connection, b: &Connection, field: SortField) -> Ordering {
    match field {
        SortField::CreateDateTime => a.create_date_time.cmp(&b.create_date_time),
        SortField::LastChangedDateTime => a.last_changed_date_time.cmp(&b.last_changed_date_time),
        SortField::TheirLabel => a.their_label.cmp(&b.their_label),
        SortField::State => a.state.cmp(&b.state),
        SortField::ConnectionId => a.connection_id.cmp(&b.connection_id),
    }
    .then_with(|| a.connection_id.cmp(&b.connection_id))
}

/// Transaction over a [`MemoryStore`]
///
/// Holds the store lock until committed, rolled back or dropped.
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<StoreState>,
    working: HashMap<ConnectionId, Connection>,
}

impl ConnectionTransaction for MemoryTransaction {
    async fn count_references(&mut self, org_id: &OrgId, table: ReferenceTable) -> Result<usize> {
        Ok(self
            .guard
            .references
            .get(&(org_id.clone(), table))
            .copied()
            .unwrap_or(0))
    }

    async fn connections_for_org(&mut self, org_id: &OrgId) -> Result<Vec<Connection>> {
        let mut rows: Vec<Connection> = self
            .working
            .values()
            .filter(|c| &c.org_id == org_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| a.create_date_time.cmp(&b.create_date_time));
        Ok(rows)
    }

    async fn delete_connections_for_org(&mut self, org_id: &OrgId) -> Result<usize> {
        let before = self.working.len();
        self.working.retain(|_, c| &c.org_id != org_id);
        Ok(before - self.working.len())
    }

    async fn commit(mut self) -> Result<()> {
        self.guard.connections = std::mem::take(&mut self.working);
        Ok(())
    }

    async fn rollback(self) -> Result<()> {
        Ok(())
    }
}
