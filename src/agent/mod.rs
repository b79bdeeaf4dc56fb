//! Agent service and webhook subscriber contracts
//!
//! Every call here is an asynchronous request/reply to an external
//! collaborator. [`BusAgentClient`] implements the contract over the message
//! bus; tests substitute a scripted implementation.

mod bus_client;

use std::future::Future;

use crate::error::Result;
use crate::types::{
    ConnectionDetail, CreateInvitationPayload, CreatedInvitation, OrgId, ReceiveInvitation,
    ReceiveInvitationUrl, ReceivedInvitation, TenantId,
};

pub use bus_client::{BusAgentClient, patterns};

/// Outbound calls made on behalf of an organization
pub trait AgentClient: Send + Sync {
    /// Create a legacy connection invitation on the agent at `url`
    fn create_legacy_invitation(
        &self,
        payload: &CreateInvitationPayload,
        url: &str,
        api_key: &str,
    ) -> impl Future<Output = Result<CreatedInvitation>> + Send;

    /// Fetch live connection detail from the agent at `url`
    fn get_connection_details(
        &self,
        url: &str,
        api_key: &str,
    ) -> impl Future<Output = Result<ConnectionDetail>> + Send;

    /// Accept an invitation given as a URL
    fn receive_invitation_url(
        &self,
        payload: &ReceiveInvitationUrl,
        url: &str,
        api_key: &str,
    ) -> impl Future<Output = Result<ReceivedInvitation>> + Send;

    /// Accept an invitation given as JSON
    fn receive_invitation(
        &self,
        payload: &ReceiveInvitation,
        url: &str,
        api_key: &str,
    ) -> impl Future<Output = Result<ReceivedInvitation>> + Send;

    /// Fetch the organization's agent API key from the credential source
    fn get_org_agent_api_key(&self, org_id: &OrgId) -> impl Future<Output = Result<String>> + Send;

    /// Look up the webhook URL an organization registered, if any
    fn get_webhook_url(
        &self,
        tenant_id: Option<&TenantId>,
        org_id: &OrgId,
    ) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Deliver a payload to a subscriber webhook URL
    fn post_webhook(
        &self,
        webhook_url: &str,
        data: &serde_json::Value,
    ) -> impl Future<Output = Result<()>> + Send;
}
