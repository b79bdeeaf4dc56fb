//! Inbound request dispatch
//!
//! Maps inbound bus patterns to [`ConnectionService`] operations. Payloads are
//! decoded into typed requests at this boundary; nothing past it sees raw JSON.

use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::agent::AgentClient;
use crate::bus::{BusReply, BusRequest};
use crate::cache::CacheStore;
use crate::error::{ConnectionError, ErrorResponse, Result};
use crate::service::ConnectionService;
use crate::store::Repository;
use crate::types::{
    ConnectionEvent, ConnectionId, ConnectionSearchCriteria, InvitationOptions, OrgId,
    ReceiveInvitation, ReceiveInvitationUrl,
};

/// Inbound message patterns
pub mod patterns {
    /// Create (or return) the organization's legacy invitation
    pub const CREATE_CONNECTION: &str = "create-connection";
    /// Agent webhook carrying a connection event
    pub const WEBHOOK_GET_CONNECTION: &str = "webhook-get-connection";
    /// Paginated connection listing
    pub const GET_ALL_CONNECTIONS: &str = "get-all-connections";
    /// Live connection detail
    pub const GET_CONNECTION_DETAILS: &str = "get-connection-details-by-connectionId";
    /// Delete every connection of an organization
    pub const DELETE_CONNECTION_RECORDS: &str = "delete-connection-records";
    /// Store a shortened invitation URL
    pub const STORE_SHORTENING_URL: &str = "store-shortening-url";
    /// Resolve a shortened invitation URL
    pub const GET_CONNECTION_URL: &str = "get-connection-url";
    /// Receive an invitation by URL
    pub const RECEIVE_INVITATION_URL: &str = "receive-invitation-url";
    /// Receive an invitation by JSON
    pub const RECEIVE_INVITATION: &str = "receive-invitation";

    /// Every pattern the dispatcher serves
    pub const ALL: [&str; 9] = [
        CREATE_CONNECTION,
        WEBHOOK_GET_CONNECTION,
        GET_ALL_CONNECTIONS,
        GET_CONNECTION_DETAILS,
        DELETE_CONNECTION_RECORDS,
        STORE_SHORTENING_URL,
        GET_CONNECTION_URL,
        RECEIVE_INVITATION_URL,
        RECEIVE_INVITATION,
    ];
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateConnectionRequest {
    org_id: OrgId,
    #[serde(flatten)]
    options: InvitationOptions,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WebhookRequest {
    #[serde(default)]
    org_id: Option<OrgId>,
    connection_dto: ConnectionEvent,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListConnectionsRequest {
    org_id: OrgId,
    #[serde(default)]
    connection_search_criteria: ConnectionSearchCriteria,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConnectionDetailsRequest {
    org_id: OrgId,
    connection_id: ConnectionId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OrgRequest {
    org_id: OrgId,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreShorteningUrlRequest {
    #[serde(default)]
    reference_id: Option<String>,
    invitation_payload: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GetShorteningUrlRequest {
    reference_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceiveInvitationUrlRequest {
    org_id: OrgId,
    receive_invitation_url: ReceiveInvitationUrl,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ReceiveInvitationRequest {
    org_id: OrgId,
    receive_invitation: ReceiveInvitation,
}

/// Routes inbound requests to the connection service
pub struct Dispatcher<S, A, C> {
    service: Arc<ConnectionService<S, A, C>>,
}

impl<S, A, C> Clone for Dispatcher<S, A, C> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
        }
    }
}

impl<S, A, C> Dispatcher<S, A, C>
where
    S: Repository,
    A: AgentClient,
    C: CacheStore,
{
    /// Create a dispatcher over `service`
    #[must_use]
    pub const fn new(service: Arc<ConnectionService<S, A, C>>) -> Self {
        Self { service }
    }

    /// Service requests are dispatched to
    #[must_use]
    pub fn service(&self) -> &ConnectionService<S, A, C> {
        &self.service
    }

    /// Answer one bus request
    ///
    /// Failures become error replies carrying the structured error.
    pub async fn handle(&self, request: BusRequest) -> BusReply {
        let BusRequest { id, pattern, payload } = request;
        match self.dispatch(&pattern, payload).await {
            Ok(data) => BusReply::Success { id, data },
            Err(e) => {
                log::warn!("Request {id} ('{pattern}') failed: {e}");
                BusReply::Error {
                    id,
                    error: ErrorResponse::from(&e),
                }
            }
        }
    }

    /// Run the operation registered for `pattern`
    ///
    /// # Errors
    /// - `Validation` for an unknown pattern or a malformed payload
    /// - whatever the operation itself returns
    pub async fn dispatch(&self, pattern: &str, payload: serde_json::Value) -> Result<serde_json::Value> {
        log::debug!("Dispatching '{pattern}'");
        let service = &self.service;
        match pattern {
            patterns::CREATE_CONNECTION => {
                let req: CreateConnectionRequest = decode(pattern, payload)?;
                reply(service.create_invitation(&req.org_id, req.options).await?)
            }
            patterns::WEBHOOK_GET_CONNECTION => {
                let req: WebhookRequest = decode(pattern, payload)?;
                let org_id = req.org_id.unwrap_or_else(|| OrgId::new(""));
                reply(service.handle_webhook(&org_id, &req.connection_dto).await?)
            }
            patterns::GET_ALL_CONNECTIONS => {
                let req: ListConnectionsRequest = decode(pattern, payload)?;
                reply(
                    service
                        .list_connections(&req.org_id, req.connection_search_criteria)
                        .await?,
                )
            }
            patterns::GET_CONNECTION_DETAILS => {
                let req: ConnectionDetailsRequest = decode(pattern, payload)?;
                reply(
                    service
                        .get_connection_by_id(&req.org_id, &req.connection_id)
                        .await?,
                )
            }
            patterns::DELETE_CONNECTION_RECORDS => {
                let req: OrgRequest = decode(pattern, payload)?;
                reply(service.delete_all_connections(&req.org_id).await?)
            }
            patterns::STORE_SHORTENING_URL => {
                let req: StoreShorteningUrlRequest = decode(pattern, payload)?;
                reply(
                    service
                        .store_shortening_url(req.reference_id, req.invitation_payload)
                        .await?,
                )
            }
            patterns::GET_CONNECTION_URL => {
                let req: GetShorteningUrlRequest = decode(pattern, payload)?;
                let url = service.get_shortening_url(&req.reference_id).await?;
                Ok(serde_json::Value::String(url.invitation_payload))
            }
            patterns::RECEIVE_INVITATION_URL => {
                let req: ReceiveInvitationUrlRequest = decode(pattern, payload)?;
                reply(
                    service
                        .receive_invitation_url(&req.org_id, &req.receive_invitation_url)
                        .await?,
                )
            }
            patterns::RECEIVE_INVITATION => {
                let req: ReceiveInvitationRequest = decode(pattern, payload)?;
                reply(
                    service
                        .receive_invitation(&req.org_id, &req.receive_invitation)
                        .await?,
                )
            }
            other => Err(ConnectionError::validation(format!(
                "Unknown message pattern '{other}'"
            ))),
        }
    }
}

fn decode<T: DeserializeOwned>(pattern: &str, payload: serde_json::Value) -> Result<T> {
    serde_json::from_value(payload)
        .map_err(|e| ConnectionError::validation(format!("Invalid payload for '{pattern}': {e}")))
}

fn reply<T: Serialize>(value: T) -> Result<serde_json::Value> {
    serde_json::to_value(value).map_err(ConnectionError::from)
}
