//! Configuration for the governance core

use serde::{Deserialize, Serialize};

use crate::model::ResourceKind;

/// Settings the core needs from its host process.
///
/// Each managed-resource category persists to its own compacted log, named
/// `<topic_prefix><category>`, keyed by `cluster/name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernorConfig {
    /// Prefix for the compacted metadata logs
    pub topic_prefix: String,
    /// Cluster assumed when a request names none
    pub default_cluster: String,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            topic_prefix: "ns4.".to_string(),
            default_cluster: "local".to_string(),
        }
    }
}

impl GovernorConfig {
    /// Name of the compacted log holding one resource category
    pub fn log_topic(&self, kind: ResourceKind) -> String {
        let category = match kind {
            ResourceKind::Topic => "topics",
            ResourceKind::Connector => "connectors",
            ResourceKind::AccessControlEntry => "access-control-entries",
            ResourceKind::ResourceQuota => "resource-quotas",
        };
        format!("{}{}", self.topic_prefix, category)
    }
}
