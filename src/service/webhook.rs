//! Webhook reconciliation
//!
//! Agents report connection state changes asynchronously. Each event is
//! attributed to an organization, masked, and upserted by connection id so
//! that duplicate and out-of-order deliveries converge on a single row.

use super::core::ConnectionService;
use crate::agent::AgentClient;
use crate::cache::CacheStore;
use crate::error::Result;
use crate::masking::MaskedLabel;
use crate::store::{ConnectionStore, ConnectionUpsert, OrgAgentDirectory, Repository};
use crate::types::{Connection, ConnectionEvent, OrgAgent, OrgId};

impl<S, A, C> ConnectionService<S, A, C>
where
    S: Repository,
    A: AgentClient,
    C: CacheStore,
{
    /// Record a connection event and return the organization's agent
    ///
    /// Events from shared agents carry the tenant id as correlation id and are
    /// attributed to the tenant's organization when it is known. Everything
    /// else is attributed to `org_id`.
    ///
    /// # Errors
    /// Returns `NotFound` if neither the tenant nor `org_id` resolve to an agent
    pub async fn ingest_webhook(&self, org_id: &OrgId, event: &ConnectionEvent) -> Result<OrgAgent> {
        self.reconcile(org_id, event).await.map(|(agent, _)| agent)
    }

    /// Record a connection event and forward it to the organization's subscriber
    ///
    /// Subscriber delivery is best-effort and never fails the call.
    ///
    /// # Errors
    /// Same as [`ConnectionService::ingest_webhook`]
    pub async fn handle_webhook(&self, org_id: &OrgId, event: &ConnectionEvent) -> Result<Connection> {
        let (agent, connection) = self.reconcile(org_id, event).await?;
        self.notify_subscriber(&agent, event).await;
        Ok(connection)
    }

    async fn reconcile(
        &self,
        org_id: &OrgId,
        event: &ConnectionEvent,
    ) -> Result<(OrgAgent, Connection)> {
        let agent = self.resolve_event_owner(org_id, event).await?;

        let upsert = ConnectionUpsert {
            connection_id: event.id.clone(),
            org_id: agent.org_id.clone(),
            state: event.state.clone(),
            their_label: event.their_label.as_deref().map(MaskedLabel::mask),
            create_date_time: event.create_date_time,
            last_changed_date_time: event.changed_at(),
            actor: agent.org_id.clone(),
        };
        let connection = self.store.upsert_connection(upsert).await?;

        log::info!(
            "Connection {} of org {} is now '{}'",
            connection.connection_id,
            connection.org_id,
            connection.state
        );
        Ok((agent, connection))
    }

    async fn resolve_event_owner(&self, org_id: &OrgId, event: &ConnectionEvent) -> Result<OrgAgent> {
        if let Some(tenant_id) = event.tenant_id() {
            if let Some(agent) = self.store.find_by_tenant(&tenant_id).await? {
                return Ok(agent);
            }
            log::debug!("No org agent for tenant {tenant_id}, falling back to org {org_id}");
        }
        self.resolve_org_agent(org_id).await
    }

    /// Forward an event to the organization's registered webhook URL
    ///
    /// Lookup and delivery failures are logged and dropped.
    pub async fn notify_subscriber(&self, agent: &OrgAgent, event: &ConnectionEvent) {
        let tenant_id = event.tenant_id().or_else(|| agent.tenant_id.clone());

        let webhook_url = match self
            .agent
            .get_webhook_url(tenant_id.as_ref(), &agent.org_id)
            .await
        {
            Ok(Some(url)) => url,
            Ok(None) => {
                log::debug!("Org {} has no webhook subscriber", agent.org_id);
                return;
            }
            Err(e) => {
                log::warn!("Webhook URL lookup failed for org {}: {e}", agent.org_id);
                return;
            }
        };

        let data = match serde_json::to_value(event) {
            Ok(data) => data,
            Err(e) => {
                log::warn!("Failed to encode connection event {}: {e}", event.id);
                return;
            }
        };

        match self.agent.post_webhook(&webhook_url, &data).await {
            Ok(()) => log::debug!("Forwarded connection {} to org {} subscriber", event.id, agent.org_id),
            Err(e) => log::warn!(
                "Webhook delivery for connection {} to org {} failed: {e}",
                event.id,
                agent.org_id
            ),
        }
    }
}
