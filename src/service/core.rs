//! Core connection service structure and org-agent resolution

use std::sync::Arc;

use crate::agent::AgentClient;
use crate::cache::{CacheStore, CredentialCache};
use crate::config::ConnectionConfig;
use crate::error::{ConnectionError, Result};
use crate::store::{OrgAgentDirectory, Repository};
use crate::types::{OrgAgent, OrgId};

/// Connection orchestration for every organization served by this worker
///
/// The service holds no per-request state. The only shared mutable state it
/// touches is the API key cache, which is itself shared between workers.
pub struct ConnectionService<S, A, C> {
    pub(crate) store: Arc<S>,
    pub(crate) agent: Arc<A>,
    pub(crate) credentials: CredentialCache<C, A>,
    pub(crate) config: ConnectionConfig,
}

impl<S, A, C> ConnectionService<S, A, C>
where
    S: Repository,
    A: AgentClient,
    C: CacheStore,
{
    /// Create a service over its collaborators
    pub fn new(store: Arc<S>, agent: Arc<A>, cache: Arc<C>, config: ConnectionConfig) -> Self {
        let credentials = CredentialCache::new(
            cache,
            Arc::clone(&agent),
            config.api_key_cache_prefix.clone(),
            config.api_key_cache_ttl,
        );
        Self {
            store,
            agent,
            credentials,
            config,
        }
    }

    /// API key cache used for agent calls
    #[must_use]
    pub const fn credentials(&self) -> &CredentialCache<C, A> {
        &self.credentials
    }

    /// Active configuration
    #[must_use]
    pub const fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    /// Resolve the agent record of an organization
    ///
    /// # Errors
    /// Returns `NotFound` if the organization has no agent
    pub async fn resolve_org_agent(&self, org_id: &OrgId) -> Result<OrgAgent> {
        if org_id.is_blank() {
            return Err(ConnectionError::not_found("Organization agent not found: empty org id"));
        }
        self.store
            .find_by_org(org_id)
            .await?
            .ok_or_else(|| {
                ConnectionError::not_found(format!("Organization agent not found for org {org_id}"))
            })
    }

    /// Resolve the org agent and the API key used to call it
    pub(crate) async fn agent_with_key(&self, org_id: &OrgId) -> Result<(OrgAgent, String)> {
        let agent = self.resolve_org_agent(org_id).await?;
        let api_key = self.credentials.get_api_key(org_id).await?;
        Ok((agent, api_key))
    }
}

/// Normalize a failed agent call
///
/// Agent-reported failures and timeouts pass through unchanged; anything else
/// is wrapped as an upstream failure carrying the raw error text.
pub(crate) fn agent_failure(operation: &str, err: ConnectionError) -> ConnectionError {
    log::error!("Agent call '{operation}' failed: {err}");
    match err {
        ConnectionError::UpstreamAgent { .. } | ConnectionError::Timeout(_) => err,
        other => ConnectionError::upstream(None, other.to_string()),
    }
}
