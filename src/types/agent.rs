//! Org-agent records
//!
//! An organization reaches its wallet through exactly one agent. The agent is
//! either dedicated to the organization or shared between many tenants.

use serde::{Deserialize, Serialize};

use super::identifiers::{OrgId, TenantId};

// ============================================================================
// Agent Type
// ============================================================================

/// Deployment shape of an organization's agent
///
/// Values outside `DEDICATED`/`SHARED` are kept verbatim so URL routing can
/// report them instead of failing at deserialization time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AgentType {
    /// One agent instance per organization
    Dedicated,
    /// One agent instance multiplexing many organizations by tenant id
    Shared,
    /// Anything the directory stored that is not a known agent type
    Unrecognized(String),
}

impl AgentType {
    /// Wire name of the agent type
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Dedicated => "DEDICATED",
            Self::Shared => "SHARED",
            Self::Unrecognized(other) => other,
        }
    }
}

impl From<String> for AgentType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "DEDICATED" => Self::Dedicated,
            "SHARED" => Self::Shared,
            _ => Self::Unrecognized(s),
        }
    }
}

impl From<&str> for AgentType {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<AgentType> for String {
    fn from(agent_type: AgentType) -> Self {
        agent_type.as_str().to_string()
    }
}

impl std::fmt::Display for AgentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Org Agent
// ============================================================================

/// Organization profile data attached to an org agent
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organisation {
    /// Display name
    pub name: String,
    /// Configured logo (URL or stored asset reference)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

/// Agent record for one organization
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrgAgent {
    /// Agent record identifier
    pub id: String,
    /// Owning organization
    pub org_id: OrgId,
    /// Base URL of the agent
    #[serde(rename = "agentEndPoint")]
    pub agent_endpoint: String,
    /// Dedicated or shared
    pub agent_type: AgentType,
    /// Tenant id on a shared agent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tenant_id: Option<TenantId>,
    /// Organization profile
    #[serde(default)]
    pub organisation: Organisation,
}

impl OrgAgent {
    /// Whether invitations from this agent are routed through a tenant
    #[must_use]
    pub fn is_multi_tenant(&self) -> bool {
        self.tenant_id.as_ref().is_some_and(|t| !t.is_blank())
    }

    /// Agent endpoint without a trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.agent_endpoint.trim_end_matches('/')
    }
}
