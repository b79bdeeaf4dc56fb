//! Connection listing and live connection detail

use super::core::{ConnectionService, agent_failure};
use super::pagination::{build_query, paginate};
use crate::agent::AgentClient;
use crate::cache::CacheStore;
use crate::error::{ConnectionError, Result};
use crate::routing::{self, AgentOperation, PathParams};
use crate::store::{ConnectionStore, Repository};
use crate::types::{
    ConnectionDetail, ConnectionId, ConnectionSearchCriteria, OrgId, PaginatedConnections,
};

impl<S, A, C> ConnectionService<S, A, C>
where
    S: Repository,
    A: AgentClient,
    C: CacheStore,
{
    /// List an organization's stored connections
    ///
    /// Text search matches the masked label or the connection id,
    /// case-insensitively.
    ///
    /// # Errors
    /// - `Validation` if paging parameters are out of range
    /// - `NotFound` if nothing matches
    pub async fn list_connections(
        &self,
        org_id: &OrgId,
        criteria: ConnectionSearchCriteria,
    ) -> Result<PaginatedConnections> {
        let query = build_query(criteria, self.config.max_page_size)?;
        let page = self.store.search_connections(org_id, &query).await?;

        if page.total_items == 0 {
            return Err(ConnectionError::not_found(format!(
                "No connections found for org {org_id}"
            )));
        }

        log::debug!(
            "Listing {} of {} connections for org {org_id}",
            page.items.len(),
            page.total_items
        );
        Ok(paginate(page, query.page_size, query.page_number))
    }

    /// Fetch a connection's current detail from the organization's agent
    ///
    /// The local connection table is not consulted.
    ///
    /// # Errors
    /// - `NotFound` if the organization has no agent
    /// - `AgentUrlNotFound` if the agent type has no URL templates
    /// - `UpstreamAgent`/`Timeout` if the agent call fails
    pub async fn get_connection_by_id(
        &self,
        org_id: &OrgId,
        connection_id: &ConnectionId,
    ) -> Result<ConnectionDetail> {
        let agent = self.resolve_org_agent(org_id).await?;
        let url = routing::url_for(
            &agent,
            AgentOperation::GetConnectionById,
            PathParams {
                connection_id: Some(connection_id),
            },
        )?;
        let api_key = self.credentials.get_api_key(org_id).await?;

        self.agent
            .get_connection_details(&url, &api_key)
            .await
            .map_err(|e| agent_failure("get-connection-details", e))
    }
}
