//! Agent URL resolution
//!
//! Dedicated agents expose plain paths. Shared agents expose the same
//! operations under `/multi-tenancy/...` with the tenant id in the path.

use crate::error::{ConnectionError, Result};
use crate::types::{AgentType, ConnectionId, OrgAgent, TenantId};

const CONNECTION_ID_PLACEHOLDER: &str = "{connectionId}";
const TENANT_ID_PLACEHOLDER: &str = "{tenantId}";

/// Agent operation a URL is built for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentOperation {
    /// Create a legacy connection invitation
    CreateLegacyInvitation,
    /// Fetch live connection detail
    GetConnectionById,
    /// Accept an invitation given as a URL
    ReceiveInvitationUrl,
    /// Accept an invitation given as JSON
    ReceiveInvitation,
}

impl AgentOperation {
    /// Path template on a dedicated agent
    #[must_use]
    pub const fn dedicated_template(self) -> &'static str {
        match self {
            Self::CreateLegacyInvitation => "/oob/create-legacy-invitation",
            Self::GetConnectionById => "/connections/{connectionId}",
            Self::ReceiveInvitationUrl => "/oob/receive-invitation-url",
            Self::ReceiveInvitation => "/oob/receive-invitation",
        }
    }

    /// Path template on a shared agent
    #[must_use]
    pub const fn shared_template(self) -> &'static str {
        match self {
            Self::CreateLegacyInvitation => "/multi-tenancy/create-legacy-invitation/{tenantId}",
            Self::GetConnectionById => "/multi-tenancy/connections/{connectionId}/{tenantId}",
            Self::ReceiveInvitationUrl => "/multi-tenancy/receive-invitation-url/{tenantId}",
            Self::ReceiveInvitation => "/multi-tenancy/receive-invitation/{tenantId}",
        }
    }
}

/// Path parameters substituted into a template
#[derive(Debug, Clone, Copy, Default)]
pub struct PathParams<'a> {
    /// Connection id, for per-connection operations
    pub connection_id: Option<&'a ConnectionId>,
}

/// Build the downstream URL for `operation`
///
/// # Errors
/// - `AgentUrlNotFound` for an agent type without templates
/// - `Validation` when a template needs a parameter that was not supplied
///   (including a shared agent without a tenant id)
pub fn build_url(
    agent_type: &AgentType,
    agent_endpoint: &str,
    tenant_id: Option<&TenantId>,
    operation: AgentOperation,
    params: PathParams<'_>,
) -> Result<String> {
    let path = match agent_type {
        AgentType::Dedicated => operation.dedicated_template().to_string(),
        AgentType::Shared => {
            let tenant = tenant_id
                .filter(|t| !t.is_blank())
                .ok_or_else(|| ConnectionError::validation("Shared agent has no tenant id"))?;
            operation
                .shared_template()
                .replace(TENANT_ID_PLACEHOLDER, tenant.as_str())
        }
        AgentType::Unrecognized(other) => {
            return Err(ConnectionError::agent_url_not_found(other.as_str()));
        }
    };

    let path = if path.contains(CONNECTION_ID_PLACEHOLDER) {
        let connection_id = params
            .connection_id
            .ok_or_else(|| ConnectionError::validation("Connection id is required"))?;
        path.replace(CONNECTION_ID_PLACEHOLDER, connection_id.as_str())
    } else {
        path
    };

    Ok(format!("{}{}", agent_endpoint.trim_end_matches('/'), path))
}

/// Build the downstream URL for `operation` on an org agent
///
/// # Errors
/// See [`build_url`]
pub fn url_for(agent: &OrgAgent, operation: AgentOperation, params: PathParams<'_>) -> Result<String> {
    build_url(
        &agent.agent_type,
        &agent.agent_endpoint,
        agent.tenant_id.as_ref(),
        operation,
        params,
    )
}
