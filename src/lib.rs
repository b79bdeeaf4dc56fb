//! # Agent Connections
//!
//! Connection orchestration and webhook reconciliation for organizations that
//! run issuer/holder agents, either on a dedicated agent or as a tenant of a
//! shared one.
//!
//! ## Quick Start
//!
//! Wire a [`ConnectionService`] over a store, an agent client and a cache:
//!
//! ```no_run
//! use std::sync::Arc;
//! use agent_connections::{
//!     BusAgentClient, BusClient, ConnectionConfig, ConnectionService, MemoryCache, MemoryStore,
//!     OrgId,
//! };
//!
//! # async fn example() -> agent_connections::Result<()> {
//! let config = ConnectionConfig::from_env()?;
//! let (outbound_tx, _outbound_rx) = tokio::sync::mpsc::unbounded_channel();
//! let bus = Arc::new(BusClient::new(outbound_tx, config.agent_request_timeout));
//!
//! let service = ConnectionService::new(
//!     Arc::new(MemoryStore::new()),
//!     Arc::new(BusAgentClient::new(bus)),
//!     Arc::new(MemoryCache::new()),
//!     config,
//! );
//!
//! let invitation = service
//!     .create_invitation(&OrgId::new("org-1"), Default::default())
//!     .await?;
//! log::info!("Share {}", invitation.connection_invitation);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`types`]: Identifiers, org agents, connections, invitations
//! - [`masking`]: Counterparty label masking applied before persistence
//! - [`routing`]: Dedicated/shared agent URL resolution
//! - [`cache`]: Per-organization API key cache
//! - [`store`]: Persistence traits and the in-memory store
//! - [`agent`]: Agent service and webhook subscriber contract
//! - [`service`]: Invitation, webhook, query and deletion operations
//! - [`bus`]: Request/reply correlation and line transport
//! - [`dispatch`]: Inbound pattern routing
//! - [`worker`]: Bus worker loop
//! - [`config`]: Runtime configuration
//! - [`error`]: Error types and handling
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T, ConnectionError>`](Result). Every
//! error maps to a status code and converts into the [`ErrorResponse`] carried
//! on bus replies:
//!
//! ```
//! use agent_connections::{ConnectionError, ErrorResponse};
//!
//! let error = ConnectionError::not_found("Organization agent not found for org org-1");
//! let response = ErrorResponse::from(&error);
//! assert_eq!(response.status_code, 404);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod agent;
pub mod bus;
pub mod cache;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod masking;
pub mod routing;
pub mod service;
pub mod store;
pub mod types;
pub mod worker;

// Re-export commonly used types for external API
pub use agent::{AgentClient, BusAgentClient};
pub use bus::{BusClient, BusMessage, BusReply, BusRequest, LineTransport, Transport};
pub use cache::{CacheStore, CredentialCache, MemoryCache};
pub use config::ConnectionConfig;
pub use dispatch::Dispatcher;
pub use error::{ConnectionError, ErrorResponse, ReferenceTable, Result};
pub use masking::{MaskedLabel, mask_label};
pub use service::ConnectionService;
pub use store::{MemoryStore, Repository};
pub use types::{AgentType, ConnectionId, OrgAgent, OrgId, TenantId};
pub use worker::Worker;

/// Version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
