//! Newtype wrappers for type safety
//!
//! Organization, tenant, connection and request identifiers are all opaque
//! strings on the wire. Wrapping them keeps an org id from being passed where a
//! tenant id is expected.

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an identifier
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the identifier as a string slice
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether the identifier is blank
            #[must_use]
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Organization identifier
    OrgId
);

string_id!(
    /// Tenant identifier on a shared agent
    TenantId
);

string_id!(
    /// Connection identifier assigned by the agent
    ConnectionId
);

string_id!(
    /// Correlation identifier for bus request/reply
    RequestId
);

/// Correlation id emitted by dedicated agents instead of a tenant id
pub const DEFAULT_CORRELATION_ID: &str = "default";
