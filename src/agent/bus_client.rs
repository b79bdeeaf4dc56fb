//! Agent contract over the message bus

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::json;

use super::AgentClient;
use crate::bus::BusClient;
use crate::error::{ConnectionError, Result};
use crate::types::{
    ConnectionDetail, CreateInvitationPayload, CreatedInvitation, OrgId, ReceiveInvitation,
    ReceiveInvitationUrl, ReceivedInvitation, TenantId,
};

/// Outbound message patterns
pub mod patterns {
    /// Create a legacy invitation on the agent
    pub const CREATE_LEGACY_INVITATION: &str = "agent-create-connection-legacy-invitation";
    /// Live connection detail
    pub const GET_CONNECTION_DETAILS: &str = "agent-get-connection-details-by-connectionId";
    /// Receive invitation by URL
    pub const RECEIVE_INVITATION_URL: &str = "agent-receive-invitation-url";
    /// Receive invitation by JSON
    pub const RECEIVE_INVITATION: &str = "agent-receive-invitation";
    /// Org agent API key
    pub const GET_ORG_AGENT_API_KEY: &str = "get-org-agent-api-key";
    /// Subscriber webhook URL
    pub const GET_WEBHOOK_URL: &str = "get-webhookurl";
    /// Deliver to subscriber
    pub const POST_WEBHOOK: &str = "post-webhook-response-to-webhook-url";
}

/// [`AgentClient`] that sends every call as a bus request
#[derive(Clone)]
pub struct BusAgentClient {
    bus: Arc<BusClient>,
}

impl BusAgentClient {
    /// Create a client over `bus`
    #[must_use]
    pub const fn new(bus: Arc<BusClient>) -> Self {
        Self { bus }
    }

    async fn call<T: DeserializeOwned>(&self, pattern: &str, payload: serde_json::Value) -> Result<T> {
        let data = self.bus.request(pattern, payload).await?;
        serde_json::from_value(data).map_err(|e| {
            ConnectionError::upstream(None, format!("Unexpected reply to '{pattern}': {e}"))
        })
    }
}

impl AgentClient for BusAgentClient {
    async fn create_legacy_invitation(
        &self,
        payload: &CreateInvitationPayload,
        url: &str,
        api_key: &str,
    ) -> Result<CreatedInvitation> {
        self.call(
            patterns::CREATE_LEGACY_INVITATION,
            json!({ "connectionPayload": payload, "url": url, "apiKey": api_key }),
        )
        .await
    }

    async fn get_connection_details(&self, url: &str, api_key: &str) -> Result<ConnectionDetail> {
        self.call(
            patterns::GET_CONNECTION_DETAILS,
            json!({ "url": url, "apiKey": api_key }),
        )
        .await
    }

    async fn receive_invitation_url(
        &self,
        payload: &ReceiveInvitationUrl,
        url: &str,
        api_key: &str,
    ) -> Result<ReceivedInvitation> {
        self.call(
            patterns::RECEIVE_INVITATION_URL,
            json!({ "url": url, "apiKey": api_key, "receiveInvitationUrl": payload }),
        )
        .await
    }

    async fn receive_invitation(
        &self,
        payload: &ReceiveInvitation,
        url: &str,
        api_key: &str,
    ) -> Result<ReceivedInvitation> {
        self.call(
            patterns::RECEIVE_INVITATION,
            json!({ "url": url, "apiKey": api_key, "receiveInvitation": payload }),
        )
        .await
    }

    async fn get_org_agent_api_key(&self, org_id: &OrgId) -> Result<String> {
        self.call(patterns::GET_ORG_AGENT_API_KEY, json!({ "orgId": org_id }))
            .await
    }

    async fn get_webhook_url(
        &self,
        tenant_id: Option<&TenantId>,
        org_id: &OrgId,
    ) -> Result<Option<String>> {
        let url: Option<String> = self
            .call(
                patterns::GET_WEBHOOK_URL,
                json!({ "tenantId": tenant_id, "orgId": org_id }),
            )
            .await?;
        Ok(url.filter(|u| !u.trim().is_empty()))
    }

    async fn post_webhook(&self, webhook_url: &str, data: &serde_json::Value) -> Result<()> {
        self.bus
            .request(
                patterns::POST_WEBHOOK,
                json!({ "webhookUrl": webhook_url, "data": data }),
            )
            .await
            .map(|_| ())
    }
}
