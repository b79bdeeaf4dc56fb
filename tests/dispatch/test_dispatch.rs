//! Tests for inbound dispatch and the bus worker loop

#[path = "../common/mod.rs"]
mod common;

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use agent_connections::agent::patterns as agent_patterns;
use agent_connections::config::ConnectionConfig;
use agent_connections::dispatch::patterns;
use agent_connections::types::RequestId;
use agent_connections::{
    BusAgentClient, BusClient, BusMessage, BusReply, BusRequest, ConnectionError,
    ConnectionService, Dispatcher, LineTransport, MemoryCache, MemoryStore, OrgId, Worker,
};

use common::{FakeAgent, Harness, TestService, at, dedicated_agent, harness};

type TestDispatcher = Dispatcher<MemoryStore, FakeAgent, MemoryCache>;

fn into_dispatcher(h: Harness) -> (TestDispatcher, Arc<MemoryStore>, Arc<FakeAgent>) {
    let service: Arc<TestService> = Arc::new(h.service);
    (Dispatcher::new(service), h.store, h.agent)
}

fn request(id: &str, pattern: &str, payload: Value) -> BusRequest {
    BusRequest {
        id: RequestId::new(id),
        pattern: pattern.to_string(),
        payload,
    }
}

fn webhook_payload(org: &str, connection_id: &str, label: &str) -> Value {
    json!({
        "orgId": org,
        "connectionDto": {
            "id": connection_id,
            "state": "completed",
            "theirLabel": label,
            "createDateTime": at(0),
            "lastChangedDateTime": at(1),
            "contextCorrelationId": "default",
        }
    })
}

#[tokio::test]
async fn test_unknown_pattern_is_validation_error() {
    let (dispatcher, _, _) = into_dispatcher(harness());

    let err = dispatcher
        .dispatch("no-such-pattern", json!({}))
        .await
        .unwrap_err();

    assert!(matches!(err, ConnectionError::Validation(_)));
}

#[tokio::test]
async fn test_malformed_payload_is_validation_error() {
    let (dispatcher, _, _) = into_dispatcher(harness());

    for pattern in patterns::ALL {
        let err = dispatcher
            .dispatch(pattern, json!({ "unexpected": 42 }))
            .await
            .unwrap_err();
        assert!(
            matches!(err, ConnectionError::Validation(_)),
            "{pattern} accepted a malformed payload"
        );
    }
}

#[tokio::test]
async fn test_create_connection_reply() {
    let h = harness();
    h.store.insert_org_agent(dedicated_agent("org-1")).await;
    let (dispatcher, _, agent) = into_dispatcher(h);

    let reply = dispatcher
        .handle(request(
            "req-1",
            patterns::CREATE_CONNECTION,
            json!({ "orgId": "org-1", "alias": "desk", "autoAcceptConnection": false }),
        ))
        .await;

    match reply {
        BusReply::Success { id, data } => {
            assert_eq!(id, RequestId::new("req-1"));
            assert_eq!(
                data["connectionInvitation"],
                "https://dedicated.example/url/inv-123"
            );
            assert_eq!(data["multiUse"], true);
        }
        other => panic!("unexpected reply: {other:?}"),
    }
    let payload = agent.last_payload().unwrap();
    assert_eq!(payload.alias.as_deref(), Some("desk"));
    assert!(!payload.auto_accept_connection);
}

#[tokio::test]
async fn test_webhook_then_listing() {
    let h = harness();
    h.store.insert_org_agent(dedicated_agent("org-1")).await;
    let (dispatcher, store, _) = into_dispatcher(h);

    let stored = dispatcher
        .dispatch(
            patterns::WEBHOOK_GET_CONNECTION,
            webhook_payload("org-1", "conn-1", "Alice Anderson"),
        )
        .await
        .unwrap();
    assert_eq!(stored["theirLabel"], "Ali********son");
    assert_eq!(stored["orgId"], "org-1");

    let listing = dispatcher
        .dispatch(
            patterns::GET_ALL_CONNECTIONS,
            json!({
                "orgId": "org-1",
                "connectionSearchCriteria": { "pageSize": 5, "pageNumber": 1, "sortField": "theirLabel", "sortBy": "ASC" }
            }),
        )
        .await
        .unwrap();
    assert_eq!(listing["totalItems"], 1);
    assert_eq!(listing["lastPage"], 1);
    assert_eq!(listing["data"][0]["connectionId"], "conn-1");
    assert_eq!(store.connection_count().await, 1);
}

#[tokio::test]
async fn test_extreme_page_number_gets_error_reply() {
    let h = harness();
    h.store.insert_org_agent(dedicated_agent("org-1")).await;
    let (dispatcher, _, _) = into_dispatcher(h);
    dispatcher
        .dispatch(
            patterns::WEBHOOK_GET_CONNECTION,
            webhook_payload("org-1", "conn-1", "Alice Anderson"),
        )
        .await
        .unwrap();

    let reply = dispatcher
        .handle(request(
            "req-page",
            patterns::GET_ALL_CONNECTIONS,
            json!({
                "orgId": "org-1",
                "connectionSearchCriteria": { "pageSize": 10, "pageNumber": u64::MAX }
            }),
        ))
        .await;

    match reply {
        BusReply::Error { id, error } => {
            assert_eq!(id, RequestId::new("req-page"));
            assert_eq!(error.status_code, 400);
        }
        other => panic!("unexpected reply: {other:?}"),
    }
}

#[tokio::test]
async fn test_webhook_without_path_org_resolves_by_tenant() {
    let h = harness();
    h.store
        .insert_org_agent(common::shared_agent("org-2", "tenant-7"))
        .await;
    let (dispatcher, _, _) = into_dispatcher(h);

    let stored = dispatcher
        .dispatch(
            patterns::WEBHOOK_GET_CONNECTION,
            json!({
                "connectionDto": {
                    "id": "conn-9",
                    "state": "request-received",
                    "createDateTime": at(0),
                    "contextCorrelationId": "tenant-7",
                }
            }),
        )
        .await
        .unwrap();

    assert_eq!(stored["orgId"], "org-2");
    assert_eq!(stored["lastChangedDateTime"], stored["createDateTime"]);
}

#[tokio::test]
async fn test_blocked_deletion_reply_names_tables() {
    let h = harness();
    h.store.insert_org_agent(dedicated_agent("org-1")).await;
    h.store.record_credential(&OrgId::new("org-1")).await;
    let (dispatcher, _, _) = into_dispatcher(h);
    dispatcher
        .dispatch(
            patterns::WEBHOOK_GET_CONNECTION,
            webhook_payload("org-1", "conn-1", "Bob"),
        )
        .await
        .unwrap();

    let reply = dispatcher
        .handle(request(
            "req-del",
            patterns::DELETE_CONNECTION_RECORDS,
            json!({ "orgId": "org-1" }),
        ))
        .await;

    match reply {
        BusReply::Error { id, error } => {
            assert_eq!(id, RequestId::new("req-del"));
            assert_eq!(error.status_code, 409);
            let wire = serde_json::to_value(&error).unwrap();
            assert_eq!(wire["blocking"], json!(["credentials"]));
        }
        other => panic!("unexpected reply: {other:?}"),
    }
}

#[tokio::test]
async fn test_shortening_url_round_trip_through_dispatch() {
    let (dispatcher, _, _) = into_dispatcher(harness());

    dispatcher
        .dispatch(
            patterns::STORE_SHORTENING_URL,
            json!({ "referenceId": "ref-1", "invitationPayload": "https://agent.example/url/inv-1" }),
        )
        .await
        .unwrap();
    let url = dispatcher
        .dispatch(patterns::GET_CONNECTION_URL, json!({ "referenceId": "ref-1" }))
        .await
        .unwrap();

    assert_eq!(url, json!("https://agent.example/url/inv-1"));
}

#[tokio::test]
async fn test_receive_invitation_passthrough() {
    let h = harness();
    h.store.insert_org_agent(dedicated_agent("org-1")).await;
    let (dispatcher, _, agent) = into_dispatcher(h);

    let received = dispatcher
        .dispatch(
            patterns::RECEIVE_INVITATION,
            json!({
                "orgId": "org-1",
                "receiveInvitation": {
                    "invitation": { "@id": "inv-remote", "@type": "https://didcomm.org/out-of-band/1.1/invitation" },
                    "autoAcceptConnection": true
                }
            }),
        )
        .await
        .unwrap();

    assert_eq!(received["outOfBandRecord"]["id"], "oob-1");
    let calls = agent.calls_to("receive-invitation");
    assert_eq!(
        calls[0].url.as_deref(),
        Some("https://dedicated.example/oob/receive-invitation")
    );
}

// ============================================================================
// Worker loop
// ============================================================================

async fn write_line(writer: &mut (impl AsyncWrite + Unpin), message: &BusMessage) {
    let line = BusClient::serialize_message(message).unwrap();
    writer.write_all(line.as_bytes()).await.unwrap();
}

#[tokio::test]
async fn test_worker_answers_requests_until_input_ends() {
    let h = harness();
    h.store.insert_org_agent(dedicated_agent("org-1")).await;
    let (dispatcher, _, _) = into_dispatcher(h);

    let (worker_io, peer_io) = tokio::io::duplex(64 * 1024);
    let (worker_r, worker_w) = tokio::io::split(worker_io);
    let (peer_r, mut peer_w) = tokio::io::split(peer_io);

    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let bus = Arc::new(BusClient::new(outbound_tx.clone(), Duration::from_secs(5)));
    let transport = LineTransport::new(worker_r, worker_w, 64 * 1024);
    let worker = tokio::spawn(Worker::new(transport, dispatcher, bus, outbound_tx, outbound_rx).run());

    write_line(
        &mut peer_w,
        &BusMessage::Request(request(
            "req-ok",
            patterns::STORE_SHORTENING_URL,
            json!({ "referenceId": "ref-1", "invitationPayload": "https://a.example" }),
        )),
    )
    .await;
    peer_w.write_all(b"garbage line\n").await.unwrap();
    write_line(
        &mut peer_w,
        &BusMessage::Request(request(
            "req-missing",
            patterns::GET_CONNECTION_URL,
            json!({ "referenceId": "ref-unknown" }),
        )),
    )
    .await;
    peer_w.shutdown().await.unwrap();

    let mut lines = BufReader::new(peer_r).lines();
    let mut replies = Vec::new();
    while let Some(line) = lines.next_line().await.unwrap() {
        if let BusMessage::Reply(reply) = BusClient::deserialize_message(&line).unwrap() {
            replies.push(reply);
        }
    }
    worker.await.unwrap().unwrap();

    assert_eq!(replies.len(), 2);
    assert!(replies.iter().any(|r| matches!(
        r,
        BusReply::Success { id, .. } if id.as_str() == "req-ok"
    )));
    assert!(replies.iter().any(|r| matches!(
        r,
        BusReply::Error { id, error } if id.as_str() == "req-missing" && error.status_code == 404
    )));
}

#[tokio::test]
async fn test_worker_round_trips_agent_calls_over_the_bus() {
    common::init_logger();
    let store = Arc::new(MemoryStore::new());
    store.insert_org_agent(dedicated_agent("org-1")).await;

    let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
    let bus = Arc::new(BusClient::new(outbound_tx.clone(), Duration::from_secs(5)));
    let service = ConnectionService::new(
        store,
        Arc::new(BusAgentClient::new(Arc::clone(&bus))),
        Arc::new(MemoryCache::new()),
        ConnectionConfig::default(),
    );
    let dispatcher = Dispatcher::new(Arc::new(service));

    let (worker_io, peer_io) = tokio::io::duplex(64 * 1024);
    let (worker_r, worker_w) = tokio::io::split(worker_io);
    let (peer_r, mut peer_w) = tokio::io::split(peer_io);
    let transport = LineTransport::new(worker_r, worker_w, 64 * 1024);
    let worker = tokio::spawn(Worker::new(transport, dispatcher, bus, outbound_tx, outbound_rx).run());

    write_line(
        &mut peer_w,
        &BusMessage::Request(request(
            "caller-1",
            patterns::CREATE_CONNECTION,
            json!({ "orgId": "org-1" }),
        )),
    )
    .await;

    // Play the agent service until the caller's reply comes back
    let mut lines = BufReader::new(peer_r).lines();
    let mut agent_requests = Vec::new();
    let mut caller_reply = None;
    while let Some(line) = lines.next_line().await.unwrap() {
        match BusClient::deserialize_message(&line).unwrap() {
            BusMessage::Request(req) => {
                let data = match req.pattern.as_str() {
                    agent_patterns::GET_ORG_AGENT_API_KEY => json!("bus-key"),
                    agent_patterns::CREATE_LEGACY_INVITATION => {
                        json!({ "invitation": { "@id": "inv-bus" } })
                    }
                    other => panic!("unexpected outbound pattern {other}"),
                };
                let reply = BusReply::Success {
                    id: req.id.clone(),
                    data,
                };
                agent_requests.push(req);
                write_line(&mut peer_w, &BusMessage::Reply(reply)).await;
            }
            BusMessage::Reply(reply) => {
                caller_reply = Some(reply);
                break;
            }
        }
    }
    peer_w.shutdown().await.unwrap();
    worker.await.unwrap().unwrap();

    let patterns_seen: Vec<&str> = agent_requests.iter().map(|r| r.pattern.as_str()).collect();
    assert_eq!(
        patterns_seen,
        [
            agent_patterns::GET_ORG_AGENT_API_KEY,
            agent_patterns::CREATE_LEGACY_INVITATION
        ]
    );
    assert_eq!(
        agent_requests[1].payload["url"],
        "https://dedicated.example/oob/create-legacy-invitation"
    );
    assert_eq!(agent_requests[1].payload["apiKey"], "bus-key");
    assert_eq!(
        agent_requests[1].payload["connectionPayload"]["multiUseInvitation"],
        true
    );

    match caller_reply {
        Some(BusReply::Success { id, data }) => {
            assert_eq!(id, RequestId::new("caller-1"));
            assert_eq!(
                data["connectionInvitation"],
                "https://dedicated.example/url/inv-bus"
            );
        }
        other => panic!("unexpected caller reply: {other:?}"),
    }
}
