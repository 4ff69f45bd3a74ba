//! Governed resource types
//!
//! Resource kinds form a closed set: engines and resolvers switch over the
//! [`ResourceKind`] tag rather than dispatching through a trait hierarchy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::namespace::ResourcePatternType;

/// Topic config key holding the per-partition retention size
pub const RETENTION_BYTES_CONFIG: &str = "retention.bytes";

/// Kind tag for a governed resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceKind {
    /// A Kafka topic
    Topic,
    /// A Kafka Connect connector
    Connector,
    /// An access control entry granting a namespace access to a resource
    AccessControlEntry,
    /// A per-namespace resource quota
    ResourceQuota,
}

impl ResourceKind {
    /// Parse from string representation
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "topic" => Some(ResourceKind::Topic),
            "connector" => Some(ResourceKind::Connector),
            "accesscontrolentry" | "acl" => Some(ResourceKind::AccessControlEntry),
            "resourcequota" | "quota" => Some(ResourceKind::ResourceQuota),
            _ => None,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Topic => write!(f, "Topic"),
            ResourceKind::Connector => write!(f, "Connector"),
            ResourceKind::AccessControlEntry => write!(f, "AccessControlEntry"),
            ResourceKind::ResourceQuota => write!(f, "ResourceQuota"),
        }
    }
}

/// Metadata common to every governed resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectMeta {
    /// Resource name, unique within cluster and kind
    pub name: String,
    /// Owning namespace, when the resource is namespace-scoped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Target Kafka cluster
    pub cluster: String,
    /// Free-form labels
    #[serde(default)]
    pub labels: HashMap<String, String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl ObjectMeta {
    /// Create metadata for a resource on a cluster
    pub fn new(name: impl Into<String>, cluster: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            cluster: cluster.into(),
            labels: HashMap::new(),
            created_at: Utc::now(),
        }
    }

    /// Set the owning namespace
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Add a label
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }
}

/// Kind-specific spec payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceSpec {
    /// Topic layout and configs
    Topic {
        partitions: i32,
        replication_factor: i16,
        #[serde(default)]
        configs: HashMap<String, String>,
    },
    /// Connector definition targeting a Kafka Connect cluster
    Connector {
        connect_cluster: String,
        #[serde(default)]
        config: HashMap<String, String>,
    },
    /// Grant of access to a resource pattern for another namespace
    AccessControlEntry {
        resource_type: ResourceKind,
        pattern_type: ResourcePatternType,
        resource: String,
        grantee: String,
    },
    /// Per-namespace quota limits, keyed by quota dimension
    Quota {
        #[serde(default)]
        limits: HashMap<String, String>,
    },
}

impl ResourceSpec {
    /// Kind tag of this spec
    pub fn kind(&self) -> ResourceKind {
        match self {
            ResourceSpec::Topic { .. } => ResourceKind::Topic,
            ResourceSpec::Connector { .. } => ResourceKind::Connector,
            ResourceSpec::AccessControlEntry { .. } => ResourceKind::AccessControlEntry,
            ResourceSpec::Quota { .. } => ResourceKind::ResourceQuota,
        }
    }
}

/// Identity key of a resource, globally unique in the store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceKey {
    pub kind: ResourceKind,
    pub cluster: String,
    pub name: String,
}

impl ResourceKey {
    /// Log partitioning key. All history for one resource shares a key, so a
    /// log partitioned by key preserves per-resource ordering. The kind is
    /// implicit on the wire: each resource category gets its own log.
    pub fn log_key(&self) -> String {
        format!("{}/{}", self.cluster, self.name)
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.cluster, self.name)
    }
}

/// A governed resource: metadata plus kind-specific spec
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub metadata: ObjectMeta,
    pub spec: ResourceSpec,
}

impl Resource {
    /// Create a resource from metadata and spec
    pub fn new(metadata: ObjectMeta, spec: ResourceSpec) -> Self {
        Self { metadata, spec }
    }

    /// Convenience constructor for a topic
    pub fn topic(cluster: impl Into<String>, name: impl Into<String>, partitions: i32) -> Self {
        Self {
            metadata: ObjectMeta::new(name, cluster),
            spec: ResourceSpec::Topic {
                partitions,
                replication_factor: 1,
                configs: HashMap::new(),
            },
        }
    }

    /// Convenience constructor for a connector
    pub fn connector(
        cluster: impl Into<String>,
        name: impl Into<String>,
        connect_cluster: impl Into<String>,
    ) -> Self {
        Self {
            metadata: ObjectMeta::new(name, cluster),
            spec: ResourceSpec::Connector {
                connect_cluster: connect_cluster.into(),
                config: HashMap::new(),
            },
        }
    }

    /// Convenience constructor for a namespace quota
    pub fn quota(
        cluster: impl Into<String>,
        namespace: impl Into<String>,
        limits: HashMap<String, String>,
    ) -> Self {
        let namespace = namespace.into();
        Self {
            metadata: ObjectMeta::new(format!("quota-{namespace}"), cluster)
                .with_namespace(namespace),
            spec: ResourceSpec::Quota { limits },
        }
    }

    /// Add a config entry (topics and connectors)
    pub fn with_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        match &mut self.spec {
            ResourceSpec::Topic { configs, .. } => {
                configs.insert(key.into(), value.into());
            }
            ResourceSpec::Connector { config, .. } => {
                config.insert(key.into(), value.into());
            }
            _ => {}
        }
        self
    }

    /// Kind tag
    pub fn kind(&self) -> ResourceKind {
        self.spec.kind()
    }

    /// Resource name
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    /// Target cluster
    pub fn cluster(&self) -> &str {
        &self.metadata.cluster
    }

    /// Identity key
    pub fn key(&self) -> ResourceKey {
        ResourceKey {
            kind: self.kind(),
            cluster: self.metadata.cluster.clone(),
            name: self.metadata.name.clone(),
        }
    }

    /// Partition count. Zero for non-topic resources.
    pub fn partitions(&self) -> i64 {
        match &self.spec {
            ResourceSpec::Topic { partitions, .. } => i64::from(*partitions),
            _ => 0,
        }
    }

    /// Declared `retention.bytes` config, defaulting to 0 when absent or
    /// unparseable. Zero for non-topic resources.
    pub fn retention_bytes(&self) -> i64 {
        match &self.spec {
            ResourceSpec::Topic { configs, .. } => configs
                .get(RETENTION_BYTES_CONFIG)
                .and_then(|v| v.parse().ok())
                .unwrap_or(0),
            _ => 0,
        }
    }

    /// Whether a topic explicitly declares `retention.bytes`
    pub fn declares_retention_bytes(&self) -> bool {
        match &self.spec {
            ResourceSpec::Topic { configs, .. } => configs
                .get(RETENTION_BYTES_CONFIG)
                .is_some_and(|v| !v.trim().is_empty()),
            _ => false,
        }
    }

    /// Disk footprint of a topic: retention bytes times partition count
    pub fn disk_usage_bytes(&self) -> i64 {
        self.retention_bytes() * self.partitions()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_key_identity() {
        let topic = Resource::topic("cluster-a", "fin.trades", 3);
        let key = topic.key();

        assert_eq!(key.kind, ResourceKind::Topic);
        assert_eq!(key.cluster, "cluster-a");
        assert_eq!(key.name, "fin.trades");
        assert_eq!(key.log_key(), "cluster-a/fin.trades");
    }

    #[test]
    fn test_same_name_different_kind_distinct_keys() {
        let topic = Resource::topic("c1", "payments", 1);
        let connector = Resource::connector("c1", "payments", "connect-1");

        assert_ne!(topic.key(), connector.key());
        assert_eq!(topic.key().log_key(), connector.key().log_key());
    }

    #[test]
    fn test_topic_disk_usage() {
        let topic = Resource::topic("c1", "t1", 3).with_config(RETENTION_BYTES_CONFIG, "1048576");
        assert_eq!(topic.retention_bytes(), 1_048_576);
        assert_eq!(topic.disk_usage_bytes(), 3 * 1_048_576);
    }

    #[test]
    fn test_topic_without_retention_defaults_to_zero() {
        let topic = Resource::topic("c1", "t1", 4);
        assert!(!topic.declares_retention_bytes());
        assert_eq!(topic.retention_bytes(), 0);
        assert_eq!(topic.disk_usage_bytes(), 0);
    }

    #[test]
    fn test_kind_parse() {
        assert_eq!(ResourceKind::parse("topic"), Some(ResourceKind::Topic));
        assert_eq!(ResourceKind::parse("Connector"), Some(ResourceKind::Connector));
        assert_eq!(ResourceKind::parse("quota"), Some(ResourceKind::ResourceQuota));
        assert_eq!(ResourceKind::parse("unknown"), None);
    }

    #[test]
    fn test_resource_serde_round_trip() {
        let topic = Resource::topic("c1", "t1", 3).with_config("cleanup.policy", "compact");
        let json = serde_json::to_string(&topic).unwrap();
        let back: Resource = serde_json::from_str(&json).unwrap();
        assert_eq!(topic, back);
    }
}
