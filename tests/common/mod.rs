//! Shared fixtures for integration tests
//!
//! Included by each test target with `#[path = "../common/mod.rs"] mod common;`

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use serde_json::{Value, json};
use tokio::sync::Barrier;

use agent_connections::config::ConnectionConfig;
use agent_connections::types::{
    ConnectionDetail, ConnectionEvent, CreateInvitationPayload, CreatedInvitation,
    InvitationMessage, Organisation, ReceiveInvitation, ReceiveInvitationUrl, ReceivedInvitation,
};
use agent_connections::{
    AgentClient, AgentType, ConnectionError, ConnectionId, ConnectionService, MemoryCache,
    MemoryStore, OrgAgent, OrgId, Result, TenantId,
};

pub const INVITATION_ID: &str = "inv-123";
pub const API_KEY: &str = "live-api-key";
pub const DEDICATED_ENDPOINT: &str = "https://dedicated.example/";
pub const SHARED_ENDPOINT: &str = "https://shared.example";

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// ============================================================================
// Scripted agent
// ============================================================================

/// One recorded outbound call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentCall {
    pub operation: &'static str,
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub tenant_id: Option<String>,
}

impl AgentCall {
    fn new(operation: &'static str) -> Self {
        Self {
            operation,
            url: None,
            api_key: None,
            tenant_id: None,
        }
    }

    fn with_url(operation: &'static str, url: &str, api_key: &str) -> Self {
        Self {
            url: Some(url.to_string()),
            api_key: Some(api_key.to_string()),
            ..Self::new(operation)
        }
    }
}

/// How agent calls fail when a failure is scripted
#[derive(Debug, Clone)]
pub enum AgentFailure {
    Upstream(Option<u16>, String),
    Timeout,
    Bus,
}

impl AgentFailure {
    fn to_error(&self) -> ConnectionError {
        match self {
            Self::Upstream(status, message) => ConnectionError::upstream(*status, message.clone()),
            Self::Timeout => ConnectionError::timeout("agent did not answer"),
            Self::Bus => ConnectionError::bus("bus connection lost"),
        }
    }
}

/// Agent client that records calls and answers from a script
pub struct FakeAgent {
    calls: Mutex<Vec<AgentCall>>,
    last_payload: Mutex<Option<CreateInvitationPayload>>,
    failure: Mutex<Option<AgentFailure>>,
    api_key: Mutex<Option<String>>,
    webhook_url: Mutex<Option<String>>,
    webhook_lookup_fails: AtomicBool,
    post_fails: AtomicBool,
    posted: Mutex<Vec<(String, Value)>>,
    invitation_gate: Mutex<Option<Arc<Barrier>>>,
}

impl Default for FakeAgent {
    fn default() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            last_payload: Mutex::new(None),
            failure: Mutex::new(None),
            api_key: Mutex::new(Some(API_KEY.to_string())),
            webhook_url: Mutex::new(None),
            webhook_lookup_fails: AtomicBool::new(false),
            post_fails: AtomicBool::new(false),
            posted: Mutex::new(Vec::new()),
            invitation_gate: Mutex::new(None),
        }
    }
}

impl FakeAgent {
    pub fn calls(&self) -> Vec<AgentCall> {
        self.calls.lock().clone()
    }

    pub fn calls_to(&self, operation: &str) -> Vec<AgentCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.operation == operation)
            .cloned()
            .collect()
    }

    pub fn last_payload(&self) -> Option<CreateInvitationPayload> {
        self.last_payload.lock().clone()
    }

    pub fn fail_with(&self, failure: AgentFailure) {
        *self.failure.lock() = Some(failure);
    }

    pub fn recover(&self) {
        *self.failure.lock() = None;
    }

    pub fn set_api_key(&self, key: Option<&str>) {
        *self.api_key.lock() = key.map(str::to_string);
    }

    pub fn set_webhook_url(&self, url: Option<&str>) {
        *self.webhook_url.lock() = url.map(str::to_string);
    }

    pub fn fail_webhook_lookup(&self) {
        self.webhook_lookup_fails.store(true, Ordering::SeqCst);
    }

    pub fn fail_webhook_post(&self) {
        self.post_fails.store(true, Ordering::SeqCst);
    }

    pub fn posted(&self) -> Vec<(String, Value)> {
        self.posted.lock().clone()
    }

    /// Hold invitation creation until `callers` requests are inside the agent
    pub fn gate_invitations(&self, callers: usize) {
        *self.invitation_gate.lock() = Some(Arc::new(Barrier::new(callers)));
    }

    fn record(&self, call: AgentCall) -> Result<()> {
        self.calls.lock().push(call);
        match self.failure.lock().as_ref() {
            Some(failure) => Err(failure.to_error()),
            None => Ok(()),
        }
    }

    fn received() -> ReceivedInvitation {
        ReceivedInvitation {
            out_of_band_record: json!({ "id": "oob-1", "state": "prepare-response" })
                .as_object()
                .cloned()
                .unwrap_or_default(),
            connection_record: None,
        }
    }
}

impl AgentClient for FakeAgent {
    async fn create_legacy_invitation(
        &self,
        payload: &CreateInvitationPayload,
        url: &str,
        api_key: &str,
    ) -> Result<CreatedInvitation> {
        self.record(AgentCall::with_url("create-legacy-invitation", url, api_key))?;
        *self.last_payload.lock() = Some(payload.clone());
        let gate = self.invitation_gate.lock().clone();
        if let Some(gate) = gate {
            gate.wait().await;
        }
        Ok(CreatedInvitation {
            invitation: InvitationMessage {
                id: INVITATION_ID.to_string(),
                message_type: Some("https://didcomm.org/connections/1.0/invitation".to_string()),
                label: payload.label.clone(),
            },
            invitation_url: Some(format!("{url}?c_i=encoded")),
            invitation_did: None,
        })
    }

    async fn get_connection_details(&self, url: &str, api_key: &str) -> Result<ConnectionDetail> {
        self.record(AgentCall::with_url("get-connection-details", url, api_key))?;
        Ok(ConnectionDetail {
            id: ConnectionId::new("conn-live"),
            state: Some("completed".to_string()),
            role: Some("responder".to_string()),
            their_label: None,
            their_did: Some("did:peer:1".to_string()),
            did: Some("did:peer:2".to_string()),
            extra: serde_json::Map::new(),
        })
    }

    async fn receive_invitation_url(
        &self,
        _payload: &ReceiveInvitationUrl,
        url: &str,
        api_key: &str,
    ) -> Result<ReceivedInvitation> {
        self.record(AgentCall::with_url("receive-invitation-url", url, api_key))?;
        Ok(Self::received())
    }

    async fn receive_invitation(
        &self,
        _payload: &ReceiveInvitation,
        url: &str,
        api_key: &str,
    ) -> Result<ReceivedInvitation> {
        self.record(AgentCall::with_url("receive-invitation", url, api_key))?;
        Ok(Self::received())
    }

    async fn get_org_agent_api_key(&self, _org_id: &OrgId) -> Result<String> {
        self.calls.lock().push(AgentCall::new("get-org-agent-api-key"));
        self.api_key
            .lock()
            .clone()
            .ok_or_else(|| ConnectionError::upstream(Some(404), "API key not found"))
    }

    async fn get_webhook_url(
        &self,
        tenant_id: Option<&TenantId>,
        _org_id: &OrgId,
    ) -> Result<Option<String>> {
        self.calls.lock().push(AgentCall {
            tenant_id: tenant_id.map(|t| t.to_string()),
            ..AgentCall::new("get-webhook-url")
        });
        if self.webhook_lookup_fails.load(Ordering::SeqCst) {
            return Err(ConnectionError::bus("webhook lookup unavailable"));
        }
        Ok(self.webhook_url.lock().clone())
    }

    async fn post_webhook(&self, webhook_url: &str, data: &Value) -> Result<()> {
        self.calls.lock().push(AgentCall {
            url: Some(webhook_url.to_string()),
            ..AgentCall::new("post-webhook")
        });
        if self.post_fails.load(Ordering::SeqCst) {
            return Err(ConnectionError::upstream(Some(500), "subscriber unavailable"));
        }
        self.posted.lock().push((webhook_url.to_string(), data.clone()));
        Ok(())
    }
}

// ============================================================================
// Service harness
// ============================================================================

pub type TestService = ConnectionService<MemoryStore, FakeAgent, MemoryCache>;

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub agent: Arc<FakeAgent>,
    pub cache: Arc<MemoryCache>,
    pub service: TestService,
}

pub fn harness() -> Harness {
    harness_with(ConnectionConfig::default())
}

pub fn harness_with(config: ConnectionConfig) -> Harness {
    init_logger();
    let store = Arc::new(MemoryStore::new());
    let agent = Arc::new(FakeAgent::default());
    let cache = Arc::new(MemoryCache::new());
    let service = ConnectionService::new(
        Arc::clone(&store),
        Arc::clone(&agent),
        Arc::clone(&cache),
        config,
    );
    Harness {
        store,
        agent,
        cache,
        service,
    }
}

// ============================================================================
// Fixtures
// ============================================================================

pub fn dedicated_agent(org_id: &str) -> OrgAgent {
    OrgAgent {
        id: format!("agent-{org_id}"),
        org_id: OrgId::new(org_id),
        agent_endpoint: DEDICATED_ENDPOINT.to_string(),
        agent_type: AgentType::Dedicated,
        tenant_id: None,
        organisation: Organisation {
            name: "Acme Org".to_string(),
            logo_url: None,
        },
    }
}

pub fn shared_agent(org_id: &str, tenant_id: &str) -> OrgAgent {
    OrgAgent {
        id: format!("agent-{org_id}"),
        org_id: OrgId::new(org_id),
        agent_endpoint: SHARED_ENDPOINT.to_string(),
        agent_type: AgentType::Shared,
        tenant_id: Some(TenantId::new(tenant_id)),
        organisation: Organisation {
            name: "Tenant Org".to_string(),
            logo_url: None,
        },
    }
}

pub fn at(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 10, minute, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

pub fn event(
    connection_id: &str,
    state: &str,
    label: Option<&str>,
    correlation: &str,
    created: DateTime<Utc>,
    changed: DateTime<Utc>,
) -> ConnectionEvent {
    serde_json::from_value(json!({
        "id": connection_id,
        "state": state,
        "theirLabel": label,
        "createDateTime": created,
        "lastChangedDateTime": changed,
        "contextCorrelationId": correlation,
        "autoAcceptConnection": true,
    }))
    .unwrap()
}
