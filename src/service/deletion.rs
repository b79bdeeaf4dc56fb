//! Bulk connection deletion guarded by dependent-table references

use super::core::ConnectionService;
use crate::agent::AgentClient;
use crate::cache::CacheStore;
use crate::error::{ConnectionError, ReferenceTable, Result};
use crate::store::{ConnectionStore, ConnectionTransaction, Repository};
use crate::types::{DeletedConnections, OrgId};

/// Tables whose rows depend on an organization's connections
const DEPENDENT_TABLES: [ReferenceTable; 2] =
    [ReferenceTable::Credentials, ReferenceTable::Presentations];

impl<S, A, C> ConnectionService<S, A, C>
where
    S: Repository,
    A: AgentClient,
    C: CacheStore,
{
    /// Delete every connection of an organization
    ///
    /// The reference check, snapshot and delete run in one transaction. Either
    /// all rows are removed or none are.
    ///
    /// # Errors
    /// - `Conflict` naming the blocking tables if credentials or presentations
    ///   still reference the organization
    /// - `NotFound` if the organization has no connections
    pub async fn delete_all_connections(&self, org_id: &OrgId) -> Result<DeletedConnections> {
        let mut tx = self.store.begin().await?;

        let mut blocking = Vec::new();
        for table in DEPENDENT_TABLES {
            if tx.count_references(org_id, table).await? > 0 {
                blocking.push(table);
            }
        }
        if !blocking.is_empty() {
            tx.rollback().await?;
            log::warn!("Refusing to delete connections of org {org_id}: referenced in {blocking:?}");
            return Err(ConnectionError::blocked_by(
                blocking_message(org_id, &blocking),
                blocking,
            ));
        }

        let snapshot = tx.connections_for_org(org_id).await?;
        if snapshot.is_empty() {
            tx.rollback().await?;
            return Err(ConnectionError::not_found(format!(
                "No connections found for org {org_id}"
            )));
        }

        let deleted_count = tx.delete_connections_for_org(org_id).await?;
        tx.commit().await?;

        log::info!("Deleted {deleted_count} connections of org {org_id}");
        Ok(DeletedConnections {
            deleted_connections_records: snapshot,
            deleted_count,
        })
    }
}

/// Caller-facing explanation of why a deletion was refused
#[must_use]
pub fn blocking_message(org_id: &OrgId, blocking: &[ReferenceTable]) -> String {
    match blocking {
        [table] => format!(
            "Connections of organization {org_id} cannot be deleted: organization is referenced in {table}"
        ),
        _ => format!(
            "Connections of organization {org_id} cannot be deleted: remove the credential and presentation records referencing its connections first"
        ),
    }
}
