//! Receive-invitation passthrough to the organization's agent

use super::core::{ConnectionService, agent_failure};
use crate::agent::AgentClient;
use crate::cache::CacheStore;
use crate::error::Result;
use crate::routing::{self, AgentOperation, PathParams};
use crate::store::Repository;
use crate::types::{OrgId, ReceiveInvitation, ReceiveInvitationUrl, ReceivedInvitation};

impl<S, A, C> ConnectionService<S, A, C>
where
    S: Repository,
    A: AgentClient,
    C: CacheStore,
{
    /// Have the organization's agent accept an invitation URL
    ///
    /// # Errors
    /// - `NotFound` if the organization has no agent
    /// - `AgentUrlNotFound` if the agent type has no URL templates
    /// - `UpstreamAgent`/`Timeout` if the agent call fails
    pub async fn receive_invitation_url(
        &self,
        org_id: &OrgId,
        request: &ReceiveInvitationUrl,
    ) -> Result<ReceivedInvitation> {
        let (agent, api_key) = self.agent_with_key(org_id).await?;
        let url = routing::url_for(&agent, AgentOperation::ReceiveInvitationUrl, PathParams::default())?;

        self.agent
            .receive_invitation_url(request, &url, &api_key)
            .await
            .map_err(|e| agent_failure("receive-invitation-url", e))
    }

    /// Have the organization's agent accept an invitation object
    ///
    /// # Errors
    /// Same as [`ConnectionService::receive_invitation_url`]
    pub async fn receive_invitation(
        &self,
        org_id: &OrgId,
        request: &ReceiveInvitation,
    ) -> Result<ReceivedInvitation> {
        let (agent, api_key) = self.agent_with_key(org_id).await?;
        let url = routing::url_for(&agent, AgentOperation::ReceiveInvitation, PathParams::default())?;

        self.agent
            .receive_invitation(request, &url, &api_key)
            .await
            .map_err(|e| agent_failure("receive-invitation", e))
    }
}
