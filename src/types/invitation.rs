//! Invitation, shortened URL and receive-invitation types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::identifiers::OrgId;

/// Reusable legacy invitation stored once per organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentInvitation {
    /// Record identifier
    pub id: String,
    /// Owning organization
    pub org_id: OrgId,
    /// Org agent the invitation was created on
    pub agent_id: String,
    /// Shareable invitation URL
    pub connection_invitation: String,
    /// Always true for legacy invitations
    pub multi_use: bool,
    /// DID the invitation was issued from, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invitation_did: Option<String>,
    /// When the record was stored
    pub create_date_time: DateTime<Utc>,
}

/// Caller options for invitation creation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvitationOptions {
    /// Defaults to `true`
    #[serde(default)]
    pub multi_use_invitation: Option<bool>,
    /// Defaults to `true`
    #[serde(default)]
    pub auto_accept_connection: Option<bool>,
    /// Alias stored by the agent
    #[serde(default)]
    pub alias: Option<String>,
    /// Label shown to the invitee, defaults to the organization name
    #[serde(default)]
    pub label: Option<String>,
    /// Goal code advertised in the invitation
    #[serde(default)]
    pub goal_code: Option<String>,
    /// Goal advertised in the invitation
    #[serde(default)]
    pub goal: Option<String>,
}

/// Payload sent to the agent to create a legacy invitation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvitationPayload {
    /// Multi-use flag
    pub multi_use_invitation: bool,
    /// Auto-accept flag
    pub auto_accept_connection: bool,
    /// Alias
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Public logo URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Goal code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_code: Option<String>,
    /// Goal
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
}

/// Invitation message as returned by the agent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationMessage {
    /// Invitation id
    #[serde(rename = "@id")]
    pub id: String,
    /// Message type URI
    #[serde(rename = "@type", default, skip_serializing_if = "Option::is_none")]
    pub message_type: Option<String>,
    /// Label carried in the invitation
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

/// Agent response to a create-invitation request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedInvitation {
    /// The invitation
    pub invitation: InvitationMessage,
    /// URL form of the invitation as produced by the agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invitation_url: Option<String>,
    /// DID the invitation was issued from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub invitation_did: Option<String>,
}

/// Opaque reference mapped to a full invitation URL
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShorteningUrl {
    /// Reference used in the short link
    pub reference_id: String,
    /// Full invitation URL
    pub invitation_payload: String,
}

/// Receive an invitation given as a URL
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveInvitationUrl {
    /// Invitation URL
    pub invitation_url: String,
    /// Alias for the resulting connection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Label presented to the inviter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Auto-accept the resulting connection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_accept_connection: Option<bool>,
    /// Reuse an existing connection to the same party
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reuse_connection: Option<bool>,
}

/// Receive an invitation given as a JSON message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiveInvitation {
    /// Invitation message as published by the inviter
    pub invitation: serde_json::Map<String, serde_json::Value>,
    /// Alias for the resulting connection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
    /// Label presented to the inviter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Auto-accept the resulting connection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_accept_connection: Option<bool>,
    /// Reuse an existing connection to the same party
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reuse_connection: Option<bool>,
}

/// Agent response to a receive-invitation request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceivedInvitation {
    /// Out-of-band record created by the agent
    #[serde(default)]
    pub out_of_band_record: serde_json::Map<String, serde_json::Value>,
    /// Connection record, when a connection was started
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_record: Option<serde_json::Map<String, serde_json::Value>>,
}
