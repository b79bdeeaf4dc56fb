//! Connection orchestration service
//!
//! This module is organized into logical submodules:
//! - `core`: Core struct, constructors, and org-agent resolution
//! - `invitation`: Legacy invitation creation and URL shortening
//! - `webhook`: Webhook reconciliation and subscriber forwarding
//! - `query`: Connection listing and live detail
//! - `deletion`: Guarded bulk deletion
//! - `receive`: Receive-invitation passthrough
//! - `pagination`: Pagination utilities

// Module declarations
mod core;
mod invitation;
mod webhook;
mod query;
mod deletion;
mod receive;
mod pagination;

// Re-export public API
pub use core::ConnectionService;
pub use deletion::blocking_message;
pub use invitation::shareable_invitation_url;
pub use pagination::DEFAULT_PAGE_SIZE;
