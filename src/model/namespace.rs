//! Namespaces and their security policies
//!
//! Namespaces are externally managed configuration: the core consumes them
//! read-only and never mutates them. Each namespace carries an ordered list of
//! security policies that the ownership resolver evaluates against candidate
//! resources.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use super::resource::ResourceKind;

/// Pattern matching strategy of a security policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourcePatternType {
    /// Exact name equality
    Literal,
    /// Resource name starts with the pattern
    Prefixed,
    /// Resource name fully matches the pattern as a regular expression
    Regexp,
}

impl fmt::Display for ResourcePatternType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourcePatternType::Literal => write!(f, "LITERAL"),
            ResourcePatternType::Prefixed => write!(f, "PREFIXED"),
            ResourcePatternType::Regexp => write!(f, "REGEXP"),
        }
    }
}

/// Relation a matching policy grants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SecurityPolicy {
    /// The namespace owns matching resources
    Owner,
    /// The namespace may read matching resources without owning them
    AccessGiven,
}

/// One relation grant between a namespace and a resource pattern
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSecurityPolicy {
    pub resource_type: ResourceKind,
    pub resource_pattern_type: ResourcePatternType,
    /// Pattern string, interpreted per `resource_pattern_type`
    pub resource: String,
    pub security_policy: SecurityPolicy,
}

impl ResourceSecurityPolicy {
    /// Build an OWNER policy
    pub fn owner(
        resource_type: ResourceKind,
        pattern_type: ResourcePatternType,
        pattern: impl Into<String>,
    ) -> Self {
        Self {
            resource_type,
            resource_pattern_type: pattern_type,
            resource: pattern.into(),
            security_policy: SecurityPolicy::Owner,
        }
    }

    /// Build an ACCESS_GIVEN policy
    pub fn access_given(
        resource_type: ResourceKind,
        pattern_type: ResourcePatternType,
        pattern: impl Into<String>,
    ) -> Self {
        Self {
            resource_type,
            resource_pattern_type: pattern_type,
            resource: pattern.into(),
            security_policy: SecurityPolicy::AccessGiven,
        }
    }
}

/// A tenant boundary on one Kafka cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Namespace {
    /// Unique namespace name
    pub name: String,
    /// Kafka cluster the namespace targets
    pub cluster: String,
    /// Free-form labels
    #[serde(default)]
    pub labels: HashMap<String, String>,
    /// Ordered policy list; all policies are evaluated, OWNER wins over a
    /// plain access grant when both match
    #[serde(default)]
    pub policies: Vec<ResourceSecurityPolicy>,
}

impl Namespace {
    /// Create a namespace with an empty policy list
    pub fn new(name: impl Into<String>, cluster: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cluster: cluster.into(),
            labels: HashMap::new(),
            policies: Vec::new(),
        }
    }

    /// Add a security policy
    pub fn with_policy(mut self, policy: ResourceSecurityPolicy) -> Self {
        self.policies.push(policy);
        self
    }

    /// Add a label
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_namespace_builder() {
        let ns = Namespace::new("finance", "cluster-a")
            .with_label("team", "fin")
            .with_policy(ResourceSecurityPolicy::owner(
                ResourceKind::Topic,
                ResourcePatternType::Prefixed,
                "fin.",
            ));

        assert_eq!(ns.name, "finance");
        assert_eq!(ns.cluster, "cluster-a");
        assert_eq!(ns.policies.len(), 1);
        assert_eq!(ns.policies[0].security_policy, SecurityPolicy::Owner);
    }

    #[test]
    fn test_policy_serde_uses_wire_names() {
        let policy = ResourceSecurityPolicy::access_given(
            ResourceKind::Topic,
            ResourcePatternType::Regexp,
            "fin\\..*",
        );
        let json = serde_json::to_string(&policy).unwrap();

        assert!(json.contains("REGEXP"));
        assert!(json.contains("ACCESS_GIVEN"));
        assert!(json.contains("TOPIC"));
    }
}
