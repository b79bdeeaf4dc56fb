//! Asynchronous request/reply message bus
//!
//! Every collaborator of the connection service (agent service, org-agent
//! credential source, webhook subscribers) and every caller talks to it through
//! pattern-addressed requests and correlated replies.
//!
//! # Example: correlating a reply
//!
//! ```rust
//! use agent_connections::bus::{BusClient, BusMessage, BusReply};
//! use std::time::Duration;
//! use tokio::sync::mpsc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let (tx, mut rx) = mpsc::unbounded_channel();
//! let client = std::sync::Arc::new(BusClient::new(tx, Duration::from_secs(5)));
//!
//! let replier = client.clone();
//! tokio::spawn(async move {
//!     if let Some(BusMessage::Request(request)) = rx.recv().await {
//!         replier
//!             .handle_reply(BusReply::Success {
//!                 id: request.id,
//!                 data: serde_json::json!("api-key"),
//!             })
//!             .await;
//!     }
//! });
//!
//! let data = client
//!     .request("get-org-agent-api-key", serde_json::json!({ "orgId": "org-1" }))
//!     .await?;
//! assert_eq!(data, "api-key");
//! # Ok(())
//! # }
//! ```

mod client;
mod messages;
mod transport;

pub use client::BusClient;
pub use messages::{BusMessage, BusReply, BusRequest};
pub use transport::{LineTransport, Transport};
