//! Materialized store over the event log
//!
//! The store owns the canonical in-memory view of all governed resources: a
//! concurrent map keyed by identity key, rebuilt by applying log records in
//! delivery order. Mutations never touch the map directly; `create` and
//! `delete` only append to the log and return once the append is durable.
//! The background applier task eventually makes the write visible; there is
//! no read-your-writes guarantee, on purpose.

use dashmap::DashMap;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::access::{NamespacePolicies, Scope};
use crate::error::{GovernorError, Result};
use crate::log::{EventLog, LogRecord};
use crate::model::{Resource, ResourceKey};

/// Characters Kafka allows in topic and resource names
fn is_legal_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '.' || c == '_' || c == '-'
}

fn validate_identity(resource: &Resource) -> Result<()> {
    let name = resource.name();
    if name.is_empty() {
        return Err(GovernorError::InvalidResource(
            "resource name must not be empty".into(),
        ));
    }
    if resource.cluster().is_empty() {
        return Err(GovernorError::InvalidResource(format!(
            "resource '{name}' has no target cluster"
        )));
    }
    if name == "." || name == ".." {
        return Err(GovernorError::InvalidResource(format!(
            "resource name '{name}' is reserved"
        )));
    }
    if let Some(bad) = name.chars().find(|c| !is_legal_name_char(*c)) {
        return Err(GovernorError::InvalidResource(format!(
            "resource name '{name}' contains illegal character '{bad}'"
        )));
    }
    Ok(())
}

/// Event-sourced materialized view of governed resources.
///
/// Concurrent readers query the map while the single applier task replaces or
/// removes entries; [`DashMap`] carries that discipline without exposing
/// locking to callers.
pub struct ResourceStore {
    map: Arc<DashMap<ResourceKey, Resource>>,
    log: Arc<dyn EventLog>,
}

impl ResourceStore {
    /// Create a store over an event log. Call [`ResourceStore::start`] to
    /// begin applying the log's subscription.
    pub fn new(log: Arc<dyn EventLog>) -> Self {
        Self {
            map: Arc::new(DashMap::new()),
            log,
        }
    }

    /// Spawn the applier: a long-lived task draining the log subscription and
    /// applying every record, in delivery order, to the map. Replays history
    /// from the earliest retained offset first, then keeps applying new
    /// records until the log closes the channel.
    pub fn start(&self) -> JoinHandle<()> {
        let mut rx = self.log.subscribe();
        let map = Arc::clone(&self.map);

        tokio::spawn(async move {
            info!("resource store applier started");
            while let Some(record) = rx.recv().await {
                apply(&map, record);
            }
            info!("event log subscription ended, applier exiting");
        })
    }

    /// Validate the identity key and append the resource to the log.
    ///
    /// Returns the submitted resource unchanged once the append is durable.
    /// The map does not reflect the write until the applier observes it;
    /// callers must not assume read-your-writes.
    pub async fn create(&self, resource: Resource) -> Result<Resource> {
        validate_identity(&resource)?;
        self.log.append(LogRecord::put(resource.clone())).await?;
        Ok(resource)
    }

    /// Append a tombstone for the resource's identity key. Logical deletion
    /// only: the key disappears from the view once the applier sees the
    /// tombstone, and compaction eventually purges the log.
    pub async fn delete(&self, resource: &Resource) -> Result<()> {
        self.log.append(LogRecord::tombstone(resource.key())).await?;
        Ok(())
    }

    /// All non-tombstoned resources on a cluster, in unspecified order.
    pub fn find_all_for_cluster(&self, cluster: &str) -> Vec<Resource> {
        self.map
            .iter()
            .filter(|entry| entry.key().cluster == cluster)
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// Resources on the namespace's cluster visible under the scope.
    pub fn find_all_for_namespace(&self, ns: &NamespacePolicies, scope: Scope) -> Vec<Resource> {
        self.map
            .iter()
            .filter(|entry| entry.key().cluster == ns.cluster())
            .filter(|entry| ns.admits(entry.value(), scope))
            .map(|entry| entry.value().clone())
            .collect()
    }

    /// First resource with that name visible to the namespace under any
    /// scope. Absence is not an error.
    pub fn find_by_name(&self, ns: &NamespacePolicies, name: &str) -> Option<Resource> {
        self.find_all_for_namespace(ns, Scope::All)
            .into_iter()
            .find(|resource| resource.name() == name)
    }

    /// Number of materialized resources
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether the view holds no resources
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Apply one delivered record: remove on tombstone, otherwise replace the
/// prior value wholesale. Replaying the same record twice is a no-op, which
/// is what makes at-least-once delivery safe.
fn apply(map: &DashMap<ResourceKey, Resource>, record: LogRecord) {
    match record.value {
        Some(resource) => {
            debug!(key = %record.key, "materializing record");
            map.insert(record.key, resource);
        }
        None => {
            debug!(key = %record.key, "removing tombstoned key");
            map.remove(&record.key);
        }
    }
}
