//! Quota computation and admission control
//!
//! The quota engine reads usage exclusively through the store filtered by the
//! ownership resolver, then gates prospective writes against the namespace's
//! declared limits. Validators accumulate one human-readable error per
//! violated dimension instead of failing fast, so a single request reports
//! everything that is wrong with it.
//!
//! Validation and the subsequent log append are two separate steps with no
//! atomicity between them: two concurrent writes can both pass against the
//! same pre-write usage snapshot and momentarily exceed a limit until the
//! next write is rejected. That soft-limit window is a deliberate design
//! choice, not a defect.

pub mod bytes;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::access::{NamespacePolicies, Scope};
use crate::model::{Resource, ResourceKind, ResourceSpec};
use crate::store::ResourceStore;

use self::bytes::{bytes_to_human_readable, has_recognized_unit, human_readable_to_bytes};
use self::bytes::{BYTE, GIBIBYTE, KIBIBYTE, MEBIBYTE};

/// Quota dimension keys, as they appear in a quota spec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuotaKey {
    /// Number of owned topics
    CountTopics,
    /// Total partitions across owned topics
    CountPartitions,
    /// Total disk footprint of owned topics
    DiskTopics,
    /// Number of owned connectors
    CountConnectors,
}

impl QuotaKey {
    /// Spec key string
    pub fn as_str(self) -> &'static str {
        match self {
            QuotaKey::CountTopics => "count/topics",
            QuotaKey::CountPartitions => "count/partitions",
            QuotaKey::DiskTopics => "disk/topics",
            QuotaKey::CountConnectors => "count/connectors",
        }
    }

    /// Parse from a spec key string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "count/topics" => Some(QuotaKey::CountTopics),
            "count/partitions" => Some(QuotaKey::CountPartitions),
            "disk/topics" => Some(QuotaKey::DiskTopics),
            "count/connectors" => Some(QuotaKey::CountConnectors),
            _ => None,
        }
    }
}

impl fmt::Display for QuotaKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-dimension usage report: `"<used>/<limit>"` when a limit is
/// configured, `"<used>"` alone when unconstrained.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaResponse {
    pub namespace: String,
    pub count_topic: String,
    pub count_partition: String,
    pub disk_topic: String,
    pub count_connector: String,
}

/// Computes usage and validates admission limits for namespaces.
pub struct QuotaEngine {
    store: Arc<ResourceStore>,
}

impl QuotaEngine {
    pub fn new(store: Arc<ResourceStore>) -> Self {
        Self { store }
    }

    /// The 0-or-1 quota object declared for a namespace on its cluster.
    pub fn quota_for_namespace(&self, ns: &NamespacePolicies) -> Option<Resource> {
        self.store
            .find_all_for_cluster(ns.cluster())
            .into_iter()
            .find(|resource| {
                resource.kind() == ResourceKind::ResourceQuota
                    && resource.metadata.namespace.as_deref() == Some(ns.name())
            })
    }

    fn owned(&self, ns: &NamespacePolicies, kind: ResourceKind) -> Vec<Resource> {
        self.store
            .find_all_for_namespace(ns, Scope::Owned)
            .into_iter()
            .filter(|resource| resource.kind() == kind)
            .collect()
    }

    /// Number of topics the namespace owns
    pub fn current_count_topics(&self, ns: &NamespacePolicies) -> i64 {
        self.owned(ns, ResourceKind::Topic).len() as i64
    }

    /// Sum of partition counts across owned topics
    pub fn current_count_partitions(&self, ns: &NamespacePolicies) -> i64 {
        self.owned(ns, ResourceKind::Topic)
            .iter()
            .map(Resource::partitions)
            .sum()
    }

    /// Sum over owned topics of retention bytes times partition count
    pub fn current_disk_topics(&self, ns: &NamespacePolicies) -> i64 {
        self.owned(ns, ResourceKind::Topic)
            .iter()
            .map(Resource::disk_usage_bytes)
            .sum()
    }

    /// Number of connectors the namespace owns
    pub fn current_count_connectors(&self, ns: &NamespacePolicies) -> i64 {
        self.owned(ns, ResourceKind::Connector).len() as i64
    }

    /// Validate a prospective quota object against usage that already exists,
    /// blocking the creation of a quota the namespace already violates.
    /// Returns one error per violated or malformed dimension; never mutates.
    pub fn validate_new_resource_quota(
        &self,
        ns: &NamespacePolicies,
        quota: &Resource,
    ) -> Vec<String> {
        let mut errors = Vec::new();

        if let Some(raw) = limit_spec(quota, QuotaKey::CountTopics) {
            match parse_count(raw) {
                Ok(limit) => {
                    let used = self.current_count_topics(ns);
                    if used > limit {
                        errors.push(already_exceeded(QuotaKey::CountTopics, &used.to_string(), raw));
                    }
                }
                Err(e) => errors.push(e),
            }
        }

        if let Some(raw) = limit_spec(quota, QuotaKey::CountPartitions) {
            match parse_count(raw) {
                Ok(limit) => {
                    let used = self.current_count_partitions(ns);
                    if used > limit {
                        errors.push(already_exceeded(
                            QuotaKey::CountPartitions,
                            &used.to_string(),
                            raw,
                        ));
                    }
                }
                Err(e) => errors.push(e),
            }
        }

        if let Some(raw) = limit_spec(quota, QuotaKey::DiskTopics) {
            if !has_recognized_unit(raw) {
                errors.push(format!(
                    "Invalid value for {}: value must end with either {BYTE}, {KIBIBYTE}, {MEBIBYTE} or {GIBIBYTE}",
                    QuotaKey::DiskTopics
                ));
            } else {
                match human_readable_to_bytes(raw) {
                    Ok(limit) => {
                        let used = self.current_disk_topics(ns);
                        if used > limit {
                            errors.push(already_exceeded(
                                QuotaKey::DiskTopics,
                                &bytes_to_human_readable(used),
                                raw,
                            ));
                        }
                    }
                    Err(e) => errors.push(e.to_string()),
                }
            }
        }

        if let Some(raw) = limit_spec(quota, QuotaKey::CountConnectors) {
            match parse_count(raw) {
                Ok(limit) => {
                    let used = self.current_count_connectors(ns);
                    if used > limit {
                        errors.push(already_exceeded(
                            QuotaKey::CountConnectors,
                            &used.to_string(),
                            raw,
                        ));
                    }
                }
                Err(e) => errors.push(e),
            }
        }

        errors
    }

    /// Gate a topic create or update. Without a quota object the namespace is
    /// unconstrained. Count dimensions apply only on creation; the disk
    /// dimension applies whenever the new spec declares a retention size,
    /// charging only the delta over the existing topic. Shrinking is always
    /// allowed, even when prior state already exceeds the limit.
    pub fn validate_topic_quota(
        &self,
        ns: &NamespacePolicies,
        existing_topic: Option<&Resource>,
        new_topic: &Resource,
    ) -> Vec<String> {
        let Some(quota) = self.quota_for_namespace(ns) else {
            return Vec::new();
        };

        let mut errors = Vec::new();

        if existing_topic.is_none() {
            if let Some(raw) = limit_spec(&quota, QuotaKey::CountTopics) {
                match parse_count(raw) {
                    Ok(limit) => {
                        let used = self.current_count_topics(ns);
                        if used + 1 > limit {
                            errors.push(format!(
                                "Exceeding quota for {}: {used}/{limit} (used/limit). Cannot add 1 topic.",
                                QuotaKey::CountTopics
                            ));
                        }
                    }
                    Err(e) => errors.push(e),
                }
            }

            if let Some(raw) = limit_spec(&quota, QuotaKey::CountPartitions) {
                match parse_count(raw) {
                    Ok(limit) => {
                        let used = self.current_count_partitions(ns);
                        let to_add = new_topic.partitions();
                        if used + to_add > limit {
                            errors.push(format!(
                                "Exceeding quota for {}: {used}/{limit} (used/limit). Cannot add {to_add} partition(s).",
                                QuotaKey::CountPartitions
                            ));
                        }
                    }
                    Err(e) => errors.push(e),
                }
            }
        }

        if let Some(raw) = limit_spec(&quota, QuotaKey::DiskTopics) {
            if new_topic.declares_retention_bytes() {
                match human_readable_to_bytes(raw) {
                    Ok(limit) => {
                        let used = self.current_disk_topics(ns);
                        let existing_bytes =
                            existing_topic.map(Resource::disk_usage_bytes).unwrap_or(0);
                        let bytes_to_add = new_topic.disk_usage_bytes() - existing_bytes;

                        // Inclusive boundary: landing exactly on the limit is
                        // accepted, only strictly greater rejects.
                        if bytes_to_add > 0 && used + bytes_to_add > limit {
                            errors.push(format!(
                                "Exceeding quota for {}: {}/{} (used/limit). Cannot add {} of data.",
                                QuotaKey::DiskTopics,
                                bytes_to_human_readable(used),
                                bytes_to_human_readable(limit),
                                bytes_to_human_readable(bytes_to_add)
                            ));
                        }
                    }
                    Err(e) => errors.push(e.to_string()),
                }
            }
        }

        debug!(
            namespace = ns.name(),
            topic = new_topic.name(),
            violations = errors.len(),
            "validated topic against quota"
        );
        errors
    }

    /// Gate a connector creation against the connector-count dimension.
    pub fn validate_connector_quota(&self, ns: &NamespacePolicies) -> Vec<String> {
        let Some(quota) = self.quota_for_namespace(ns) else {
            return Vec::new();
        };

        let mut errors = Vec::new();

        if let Some(raw) = limit_spec(&quota, QuotaKey::CountConnectors) {
            match parse_count(raw) {
                Ok(limit) => {
                    let used = self.current_count_connectors(ns);
                    if used + 1 > limit {
                        errors.push(format!(
                            "Exceeding quota for {}: {used}/{limit} (used/limit). Cannot add 1 connector.",
                            QuotaKey::CountConnectors
                        ));
                    }
                }
                Err(e) => errors.push(e),
            }
        }

        errors
    }

    /// Render current usage against the (optional) quota object.
    pub fn to_response(&self, ns: &NamespacePolicies, quota: Option<&Resource>) -> QuotaResponse {
        let used_topics = self.current_count_topics(ns).to_string();
        let used_partitions = self.current_count_partitions(ns).to_string();
        let used_disk = bytes_to_human_readable(self.current_disk_topics(ns));
        let used_connectors = self.current_count_connectors(ns).to_string();

        QuotaResponse {
            namespace: ns.name().to_string(),
            count_topic: render(&used_topics, quota, QuotaKey::CountTopics),
            count_partition: render(&used_partitions, quota, QuotaKey::CountPartitions),
            disk_topic: render(&used_disk, quota, QuotaKey::DiskTopics),
            count_connector: render(&used_connectors, quota, QuotaKey::CountConnectors),
        }
    }
}

/// Non-blank limit string for a dimension of a quota resource
fn limit_spec(quota: &Resource, key: QuotaKey) -> Option<&str> {
    match &quota.spec {
        ResourceSpec::Quota { limits } => limits
            .get(key.as_str())
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty()),
        _ => None,
    }
}

fn parse_count(raw: &str) -> std::result::Result<i64, String> {
    raw.trim()
        .parse()
        .map_err(|_| format!("Invalid quota value '{raw}': not a number"))
}

fn already_exceeded(key: QuotaKey, used: &str, limit: &str) -> String {
    format!("Quota already exceeded for {key}: {used}/{limit} (used/limit)")
}

fn render(used: &str, quota: Option<&Resource>, key: QuotaKey) -> String {
    match quota.and_then(|q| limit_spec(q, key)) {
        Some(limit) => format!("{used}/{limit}"),
        None => used.to_string(),
    }
}
