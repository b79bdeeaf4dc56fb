//! Request/reply correlation over the bus

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::{Mutex, mpsc, oneshot};
use uuid::Uuid;

use crate::error::{ConnectionError, Result};
use crate::types::identifiers::RequestId;

use super::messages::{BusMessage, BusReply, BusRequest};

/// Sends requests on the bus and pairs them with their replies
///
/// Outbound messages are pushed onto a channel drained by the worker loop.
/// Replies are fed back through [`BusClient::handle_reply`].
pub struct BusClient {
    instance: String,
    next_request_id: AtomicU64,
    pending_requests: Mutex<HashMap<RequestId, oneshot::Sender<BusReply>>>,
    outbound: mpsc::UnboundedSender<BusMessage>,
    timeout: Duration,
}

impl BusClient {
    /// Create a client writing to `outbound`, waiting at most `timeout` per request
    #[must_use]
    pub fn new(outbound: mpsc::UnboundedSender<BusMessage>, timeout: Duration) -> Self {
        Self {
            instance: Uuid::new_v4().simple().to_string(),
            next_request_id: AtomicU64::new(1),
            pending_requests: Mutex::new(HashMap::new()),
            outbound,
            timeout,
        }
    }

    /// Generate the next request id
    ///
    /// Ids are prefixed per client so replies from a shared bus never collide
    /// between worker instances.
    #[must_use]
    pub fn next_id(&self) -> RequestId {
        let id = self.next_request_id.fetch_add(1, Ordering::SeqCst);
        RequestId::new(format!("{}-{id}", self.instance))
    }

    /// Timeout applied to each request
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of requests still waiting for a reply
    pub async fn pending_count(&self) -> usize {
        self.pending_requests.lock().await.len()
    }

    /// Send a request and wait for its reply
    ///
    /// # Errors
    /// - `Bus` if the outbound channel is closed or the reply sender was dropped
    /// - `Timeout` if no reply arrived in time (the pending entry is discarded)
    /// - `UpstreamAgent` carrying the replier's status and message on an error reply
    pub async fn request(
        &self,
        pattern: &str,
        payload: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let id = self.next_id();
        let (reply_tx, reply_rx) = oneshot::channel();

        self.pending_requests
            .lock()
            .await
            .insert(id.clone(), reply_tx);

        let message = BusMessage::Request(BusRequest {
            id: id.clone(),
            pattern: pattern.to_string(),
            payload,
        });
        if self.outbound.send(message).is_err() {
            self.pending_requests.lock().await.remove(&id);
            return Err(ConnectionError::bus("Outbound bus channel closed"));
        }

        match tokio::time::timeout(self.timeout, reply_rx).await {
            Ok(Ok(BusReply::Success { data, .. })) => Ok(data),
            Ok(Ok(BusReply::Error { error, .. })) => Err(ConnectionError::upstream(
                Some(error.status_code),
                error.message,
            )),
            Ok(Err(_)) => Err(ConnectionError::bus(format!(
                "Reply channel for '{pattern}' dropped"
            ))),
            Err(_) => {
                self.pending_requests.lock().await.remove(&id);
                Err(ConnectionError::timeout(format!(
                    "No reply to '{pattern}' within {}ms",
                    self.timeout.as_millis()
                )))
            }
        }
    }

    /// Route a reply to the request waiting for it
    ///
    /// Replies nobody is waiting for (late, duplicate, or meant for another
    /// worker) are ignored.
    pub async fn handle_reply(&self, reply: BusReply) {
        let pending = self.pending_requests.lock().await.remove(reply.id());
        match pending {
            Some(tx) => {
                let _ = tx.send(reply);
            }
            None => log::debug!("Ignoring reply for unknown request {}", reply.id()),
        }
    }

    /// Serialize a bus message as one line
    ///
    /// # Errors
    /// Returns error if JSON serialization fails
    pub fn serialize_message(message: &BusMessage) -> Result<String> {
        serde_json::to_string(message)
            .map(|s| format!("{s}\n"))
            .map_err(ConnectionError::from)
    }

    /// Deserialize one bus line
    ///
    /// # Errors
    /// Returns error if the line is not a valid bus message
    pub fn deserialize_message(json: &str) -> Result<BusMessage> {
        serde_json::from_str(json).map_err(ConnectionError::from)
    }
}
