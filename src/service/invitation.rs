//! Legacy invitation creation and URL shortening

use chrono::Utc;
use uuid::Uuid;

use super::core::{ConnectionService, agent_failure};
use crate::agent::AgentClient;
use crate::cache::CacheStore;
use crate::error::{ConnectionError, Result};
use crate::routing::{self, AgentOperation, PathParams};
use crate::store::{InvitationStore, Repository, ShorteningUrlStore};
use crate::types::{
    AgentInvitation, CreateInvitationPayload, InvitationOptions, OrgAgent, OrgId, ShorteningUrl,
};

impl<S, A, C> ConnectionService<S, A, C>
where
    S: Repository,
    A: AgentClient,
    C: CacheStore,
{
    /// Create the organization's reusable legacy invitation
    ///
    /// Once an organization has an invitation it is returned as-is and the
    /// agent is not called again.
    ///
    /// # Errors
    /// - `NotFound` if the organization has no agent
    /// - `AgentUrlNotFound` if the agent type has no URL templates
    /// - `UpstreamAgent`/`Timeout` if the agent call fails
    pub async fn create_invitation(
        &self,
        org_id: &OrgId,
        options: InvitationOptions,
    ) -> Result<AgentInvitation> {
        if let Some(existing) = self.store.find_invitation(org_id).await? {
            log::debug!("Reusing stored invitation for org {org_id}");
            return Ok(existing);
        }

        let agent = self.resolve_org_agent(org_id).await?;
        let payload = self.invitation_payload(&agent, options);
        let url = routing::url_for(&agent, AgentOperation::CreateLegacyInvitation, PathParams::default())?;
        let api_key = self.credentials.get_api_key(org_id).await?;

        let created = self
            .agent
            .create_legacy_invitation(&payload, &url, &api_key)
            .await
            .map_err(|e| agent_failure("create-legacy-invitation", e))?;

        let invitation_id = created.invitation.id.trim();
        if invitation_id.is_empty() {
            return Err(ConnectionError::upstream(
                None,
                "Agent returned an invitation without an @id",
            ));
        }

        let record = AgentInvitation {
            id: Uuid::new_v4().to_string(),
            org_id: org_id.clone(),
            agent_id: agent.id.clone(),
            connection_invitation: shareable_invitation_url(&agent, invitation_id),
            multi_use: true,
            invitation_did: created.invitation_did,
            create_date_time: Utc::now(),
        };

        let stored = self.store.save_invitation(record).await?;
        log::info!("Created legacy invitation for org {org_id}");
        Ok(stored)
    }

    fn invitation_payload(
        &self,
        agent: &OrgAgent,
        options: InvitationOptions,
    ) -> CreateInvitationPayload {
        let org_name = Some(agent.organisation.name.clone()).filter(|n| !n.trim().is_empty());
        CreateInvitationPayload {
            multi_use_invitation: options.multi_use_invitation.unwrap_or(true),
            auto_accept_connection: options.auto_accept_connection.unwrap_or(true),
            alias: options.alias,
            label: options.label.or(org_name),
            image_url: self.logo_url(agent),
            goal_code: options.goal_code,
            goal: options.goal,
        }
    }

    /// Public logo URL for the organization, if it configured a logo
    ///
    /// Absolute logo URLs are used directly. Stored logo assets are served
    /// through the public API when a base URL is configured.
    fn logo_url(&self, agent: &OrgAgent) -> Option<String> {
        let logo = agent
            .organisation
            .logo_url
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())?;

        if logo.starts_with("https://") || logo.starts_with("http://") {
            return Some(logo.to_string());
        }

        self.config.public_api_base_url.as_deref().map(|base| {
            format!("{}/orgs/{}/logo", base.trim_end_matches('/'), agent.org_id)
        })
    }

    /// Store a shortened invitation URL
    ///
    /// A reference id is generated when none is supplied.
    ///
    /// # Errors
    /// - `Validation` if the URL is empty
    /// - `Conflict` if the reference id is already taken
    pub async fn store_shortening_url(
        &self,
        reference_id: Option<String>,
        invitation_url: String,
    ) -> Result<ShorteningUrl> {
        if invitation_url.trim().is_empty() {
            return Err(ConnectionError::validation("Invitation URL is required"));
        }
        let reference_id = reference_id
            .filter(|r| !r.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        self.store
            .insert_shortening_url(ShorteningUrl {
                reference_id,
                invitation_payload: invitation_url,
            })
            .await
    }

    /// Resolve a shortened invitation URL
    ///
    /// # Errors
    /// Returns `NotFound` if the reference is unknown
    pub async fn get_shortening_url(&self, reference_id: &str) -> Result<ShorteningUrl> {
        self.store
            .find_shortening_url(reference_id)
            .await?
            .ok_or_else(|| {
                ConnectionError::not_found(format!("Shortening URL {reference_id} not found"))
            })
    }
}

/// Shareable URL for an invitation created on `agent`
///
/// Multi-tenant agents serve invitations under `/multi-tenancy/url/{tenant}/{id}`,
/// dedicated agents under `/url/{id}`.
#[must_use]
pub fn shareable_invitation_url(agent: &OrgAgent, invitation_id: &str) -> String {
    match agent.tenant_id.as_ref().filter(|_| agent.is_multi_tenant()) {
        Some(tenant) => format!(
            "{}/multi-tenancy/url/{tenant}/{invitation_id}",
            agent.base_url()
        ),
        None => format!("{}/url/{invitation_id}", agent.base_url()),
    }
}
