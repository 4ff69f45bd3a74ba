//! Ownership resolution between namespaces and resources
//!
//! Every read out of the store is filtered through a namespace's compiled
//! policy set, and quota usage is computed only over resources the namespace
//! owns. REGEXP patterns are compiled once at namespace load: a malformed
//! pattern fails fast with a policy error instead of failing on every
//! evaluation under load.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{GovernorError, Result};
use crate::model::{
    Namespace, Resource, ResourceKind, ResourcePatternType, ResourceSecurityPolicy, SecurityPolicy,
};

/// Relation of a resource to a namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Relation {
    /// A matching OWNER policy exists
    Owned,
    /// Matching policies exist but none is OWNER
    AccessGiven,
    /// No policy matches
    Unrelated,
}

/// Visibility scope for namespace-filtered queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Scope {
    /// Owned or access-granted
    #[default]
    All,
    /// Owned only
    Owned,
    /// Access-granted only
    AccessGiven,
}

impl Scope {
    /// Whether a relation is visible under this scope. `Unrelated` is never
    /// admitted.
    pub fn admits(self, relation: Relation) -> bool {
        match self {
            Scope::All => relation != Relation::Unrelated,
            Scope::Owned => relation == Relation::Owned,
            Scope::AccessGiven => relation == Relation::AccessGiven,
        }
    }
}

enum Matcher {
    Literal(String),
    Prefixed(String),
    Regexp(Regex),
}

/// One policy with its pattern in evaluable form
pub struct CompiledPolicy {
    resource_type: ResourceKind,
    matcher: Matcher,
    security_policy: SecurityPolicy,
}

impl CompiledPolicy {
    fn compile(policy: &ResourceSecurityPolicy) -> Result<Self> {
        let matcher = match policy.resource_pattern_type {
            ResourcePatternType::Literal => Matcher::Literal(policy.resource.clone()),
            ResourcePatternType::Prefixed => Matcher::Prefixed(policy.resource.clone()),
            ResourcePatternType::Regexp => {
                // Anchored so the pattern must match the whole name.
                let anchored = format!("^(?:{})$", policy.resource);
                let regex = Regex::new(&anchored).map_err(|source| {
                    warn!(pattern = %policy.resource, "rejecting malformed security policy pattern");
                    GovernorError::Policy {
                        pattern: policy.resource.clone(),
                        source,
                    }
                })?;
                Matcher::Regexp(regex)
            }
        };

        Ok(Self {
            resource_type: policy.resource_type,
            matcher,
            security_policy: policy.security_policy,
        })
    }

    /// Whether this policy matches a candidate resource. The resource kind
    /// must equal the policy's resource type before any name matching.
    pub fn matches(&self, resource: &Resource) -> bool {
        if resource.kind() != self.resource_type {
            return false;
        }
        match &self.matcher {
            Matcher::Literal(name) => resource.name() == name,
            Matcher::Prefixed(prefix) => resource.name().starts_with(prefix.as_str()),
            Matcher::Regexp(regex) => regex.is_match(resource.name()),
        }
    }
}

/// A namespace bundled with its compiled policy set, ready for evaluation.
///
/// Built once when the namespace is loaded; queries and the quota engine
/// classify against it without recompiling patterns.
pub struct NamespacePolicies {
    namespace: Namespace,
    compiled: Vec<CompiledPolicy>,
}

impl NamespacePolicies {
    /// Compile every policy of a namespace. Fails on the first malformed
    /// REGEXP pattern; a namespace with a broken policy cannot be resolved
    /// until the policy is fixed.
    pub fn compile(namespace: Namespace) -> Result<Self> {
        let compiled = namespace
            .policies
            .iter()
            .map(CompiledPolicy::compile)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            namespace,
            compiled,
        })
    }

    /// The underlying namespace
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Namespace name
    pub fn name(&self) -> &str {
        &self.namespace.name
    }

    /// Cluster the namespace targets
    pub fn cluster(&self) -> &str {
        &self.namespace.cluster
    }

    /// Classify a resource against every policy. Any matching OWNER policy
    /// wins, even when an access grant also matches.
    pub fn classify(&self, resource: &Resource) -> Relation {
        let mut any_match = false;
        for policy in &self.compiled {
            if policy.matches(resource) {
                if policy.security_policy == SecurityPolicy::Owner {
                    return Relation::Owned;
                }
                any_match = true;
            }
        }
        if any_match {
            Relation::AccessGiven
        } else {
            Relation::Unrelated
        }
    }

    /// Whether a resource is visible under a scope
    pub fn admits(&self, resource: &Resource, scope: Scope) -> bool {
        scope.admits(self.classify(resource))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finance_ns(policy: ResourceSecurityPolicy) -> NamespacePolicies {
        NamespacePolicies::compile(Namespace::new("finance", "c1").with_policy(policy)).unwrap()
    }

    #[test]
    fn test_prefixed_owner_policy() {
        let ns = finance_ns(ResourceSecurityPolicy::owner(
            ResourceKind::Topic,
            ResourcePatternType::Prefixed,
            "fin.",
        ));

        assert_eq!(ns.classify(&Resource::topic("c1", "fin.trades", 1)), Relation::Owned);
        assert_eq!(
            ns.classify(&Resource::topic("c1", "risk.trades", 1)),
            Relation::Unrelated
        );
    }

    #[test]
    fn test_literal_policy_requires_exact_name() {
        let ns = finance_ns(ResourceSecurityPolicy::owner(
            ResourceKind::Topic,
            ResourcePatternType::Literal,
            "fin.trades",
        ));

        assert_eq!(ns.classify(&Resource::topic("c1", "fin.trades", 1)), Relation::Owned);
        assert_eq!(
            ns.classify(&Resource::topic("c1", "fin.trades.v2", 1)),
            Relation::Unrelated
        );
    }

    #[test]
    fn test_regexp_policy_matches_whole_name() {
        let ns = finance_ns(ResourceSecurityPolicy::access_given(
            ResourceKind::Topic,
            ResourcePatternType::Regexp,
            "fin\\.[a-z]+",
        ));

        assert_eq!(
            ns.classify(&Resource::topic("c1", "fin.trades", 1)),
            Relation::AccessGiven
        );
        // Unanchored substring matches must not count.
        assert_eq!(
            ns.classify(&Resource::topic("c1", "xfin.trades", 1)),
            Relation::Unrelated
        );
        assert_eq!(
            ns.classify(&Resource::topic("c1", "fin.trades2", 1)),
            Relation::Unrelated
        );
    }

    #[test]
    fn test_owner_takes_priority_over_access_grant() {
        let ns = NamespacePolicies::compile(
            Namespace::new("finance", "c1")
                .with_policy(ResourceSecurityPolicy::access_given(
                    ResourceKind::Topic,
                    ResourcePatternType::Prefixed,
                    "fin.",
                ))
                .with_policy(ResourceSecurityPolicy::owner(
                    ResourceKind::Topic,
                    ResourcePatternType::Literal,
                    "fin.trades",
                )),
        )
        .unwrap();

        assert_eq!(ns.classify(&Resource::topic("c1", "fin.trades", 1)), Relation::Owned);
        assert_eq!(
            ns.classify(&Resource::topic("c1", "fin.rates", 1)),
            Relation::AccessGiven
        );
    }

    #[test]
    fn test_kind_mismatch_never_matches() {
        let ns = finance_ns(ResourceSecurityPolicy::owner(
            ResourceKind::Topic,
            ResourcePatternType::Prefixed,
            "fin.",
        ));

        let connector = Resource::connector("c1", "fin.sink", "connect-1");
        assert_eq!(ns.classify(&connector), Relation::Unrelated);
    }

    #[test]
    fn test_empty_policy_list_sees_nothing() {
        let ns = NamespacePolicies::compile(Namespace::new("empty", "c1")).unwrap();
        assert_eq!(
            ns.classify(&Resource::topic("c1", "anything", 1)),
            Relation::Unrelated
        );
    }

    #[test]
    fn test_malformed_regexp_fails_at_compile_time() {
        let result = NamespacePolicies::compile(Namespace::new("broken", "c1").with_policy(
            ResourceSecurityPolicy::owner(
                ResourceKind::Topic,
                ResourcePatternType::Regexp,
                "fin.[unclosed",
            ),
        ));

        assert!(matches!(result, Err(GovernorError::Policy { .. })));
    }

    #[test]
    fn test_scope_admission() {
        assert!(Scope::All.admits(Relation::Owned));
        assert!(Scope::All.admits(Relation::AccessGiven));
        assert!(!Scope::All.admits(Relation::Unrelated));

        assert!(Scope::Owned.admits(Relation::Owned));
        assert!(!Scope::Owned.admits(Relation::AccessGiven));

        assert!(Scope::AccessGiven.admits(Relation::AccessGiven));
        assert!(!Scope::AccessGiven.admits(Relation::Owned));
        assert!(!Scope::AccessGiven.admits(Relation::Unrelated));
    }
}
