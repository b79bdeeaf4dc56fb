//! Type definitions for connection orchestration
//!
//! - [`identifiers`] - Type-safe ID wrappers (`OrgId`, `TenantId`, `ConnectionId`, `RequestId`)
//! - [`agent`] - Org-agent records and agent types
//! - [`connection`] - Connection records, webhook events, search and pagination
//! - [`invitation`] - Invitations, shortened URLs and receive-invitation payloads

pub mod agent;
pub mod connection;
pub mod identifiers;
pub mod invitation;

pub use agent::{AgentType, OrgAgent, Organisation};
pub use connection::{
    Connection, ConnectionDetail, ConnectionEvent, ConnectionSearchCriteria, DeletedConnections,
    PaginatedConnections, SortDirection, SortField,
};
pub use identifiers::{ConnectionId, DEFAULT_CORRELATION_ID, OrgId, RequestId, TenantId};
pub use invitation::{
    AgentInvitation, CreateInvitationPayload, CreatedInvitation, InvitationMessage,
    InvitationOptions, ReceiveInvitation, ReceiveInvitationUrl, ReceivedInvitation, ShorteningUrl,
};
