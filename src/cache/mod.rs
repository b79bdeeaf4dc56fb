//! API key cache
//!
//! A key/value store with per-entry expiry sits in front of the agent's
//! credential source. Reads are cache-aside: a miss costs one live fetch and
//! does **not** populate the cache. Population belongs to the provisioning
//! flow, which calls [`CredentialCache::prime`].

mod memory;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::agent::AgentClient;
use crate::error::Result;
use crate::types::OrgId;

pub use memory::MemoryCache;

/// Shared key/value store with expiry
///
/// Implementations are expected to be shared between worker instances, so
/// concurrent readers and writers must be safe.
pub trait CacheStore: Send + Sync {
    /// Read a value; expired entries read as absent
    fn get(&self, key: &str) -> impl Future<Output = Result<Option<String>>> + Send;

    /// Write a value that expires after `ttl`
    fn set_with_ttl(
        &self,
        key: &str,
        value: String,
        ttl: Duration,
    ) -> impl Future<Output = Result<()>> + Send;

    /// Remove a value
    fn remove(&self, key: &str) -> impl Future<Output = Result<()>> + Send;
}

/// Per-organization API key lookup backed by a [`CacheStore`]
pub struct CredentialCache<C, A> {
    store: Arc<C>,
    source: Arc<A>,
    prefix: String,
    ttl: Duration,
}

impl<C, A> Clone for CredentialCache<C, A> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            source: Arc::clone(&self.source),
            prefix: self.prefix.clone(),
            ttl: self.ttl,
        }
    }
}

impl<C: CacheStore, A: AgentClient> CredentialCache<C, A> {
    /// Create a cache over `store`, falling back to `source` on misses
    pub fn new(store: Arc<C>, source: Arc<A>, prefix: impl Into<String>, ttl: Duration) -> Self {
        Self {
            store,
            source,
            prefix: prefix.into(),
            ttl,
        }
    }

    /// Cache key for an organization
    #[must_use]
    pub fn key_for(&self, org_id: &OrgId) -> String {
        format!("{}:{}", self.prefix, org_id)
    }

    /// Get the agent API key for an organization
    ///
    /// Returns the cached key when present. Otherwise fetches it from the
    /// credential source and returns it without writing it back.
    ///
    /// # Errors
    /// Propagates the cache or credential source error; nothing is retried
    pub async fn get_api_key(&self, org_id: &OrgId) -> Result<String> {
        let key = self.key_for(org_id);
        if let Some(api_key) = self.store.get(&key).await?.filter(|k| !k.is_empty()) {
            return Ok(api_key);
        }

        log::debug!("API key cache miss for org {org_id}, fetching from agent service");
        self.source.get_org_agent_api_key(org_id).await
    }

    /// Write an organization's API key (provisioning side)
    ///
    /// # Errors
    /// Propagates the cache store error
    pub async fn prime(&self, org_id: &OrgId, api_key: String) -> Result<()> {
        self.store
            .set_with_ttl(&self.key_for(org_id), api_key, self.ttl)
            .await
    }

    /// Drop an organization's cached API key
    ///
    /// # Errors
    /// Propagates the cache store error
    pub async fn evict(&self, org_id: &OrgId) -> Result<()> {
        self.store.remove(&self.key_for(org_id)).await
    }
}
