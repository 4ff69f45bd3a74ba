#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

//! # nsgovernor
//!
//! Multi-tenant governance core for Kafka clusters: namespaces own subsets of
//! topics, connectors and other resources, and all ownership, quota and
//! desired-state metadata is itself stored as an event log inside Kafka
//! rather than in an external database.
//!
//! ## Architecture
//!
//! - [`log`]: the durable event log contract ([`EventLog`]) plus an
//!   in-memory backend; one compacted log per resource category, keyed by
//!   `cluster/name`, replayed from the earliest offset on startup.
//! - [`store`]: the materialized view ([`ResourceStore`]), a concurrent map
//!   continuously rebuilt by a background applier task from the log
//!   subscription; the single in-process read model.
//! - [`access`]: the ownership resolver, classifying resources as owned,
//!   access-granted or unrelated to a namespace via literal, prefixed or
//!   regexp security policies compiled at namespace load.
//! - [`quota`]: the quota engine, computing current usage through the
//!   resolver-filtered store and gating writes against per-namespace limits,
//!   accumulating every violated dimension into one report.
//!
//! ## Consistency
//!
//! A write returns once its append to the log is durable. The materialized
//! view catches up asynchronously: a read immediately after a write may not
//! observe it yet, on the same process or any other. Quota validation and
//! the subsequent append are likewise two unsynchronized steps; concurrent
//! writes can briefly overshoot a limit before the next write is rejected.
//! Both are deliberate soft-consistency choices.
//!
//! ## Example
//!
//! ```no_run
//! use nsgovernor::{
//!     MemoryEventLog, Namespace, NamespacePolicies, QuotaEngine, Resource,
//!     ResourceKind, ResourcePatternType, ResourceSecurityPolicy, ResourceStore, Scope,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> nsgovernor::Result<()> {
//!     let log = Arc::new(MemoryEventLog::new());
//!     let store = Arc::new(ResourceStore::new(log));
//!     store.start();
//!
//!     let finance = NamespacePolicies::compile(
//!         Namespace::new("finance", "prod").with_policy(ResourceSecurityPolicy::owner(
//!             ResourceKind::Topic,
//!             ResourcePatternType::Prefixed,
//!             "fin.",
//!         )),
//!     )?;
//!
//!     let engine = QuotaEngine::new(Arc::clone(&store));
//!     let topic = Resource::topic("prod", "fin.trades", 3);
//!
//!     let violations = engine.validate_topic_quota(&finance, None, &topic);
//!     if violations.is_empty() {
//!         store.create(topic).await?;
//!     }
//!
//!     let visible = store.find_all_for_namespace(&finance, Scope::Owned);
//!     println!("owned resources: {}", visible.len());
//!     Ok(())
//! }
//! ```

pub mod access;
pub mod config;
pub mod error;
pub mod log;
pub mod model;
pub mod quota;
pub mod store;

pub use access::{CompiledPolicy, NamespacePolicies, Relation, Scope};
pub use config::GovernorConfig;
pub use error::{GovernorError, Result};
pub use log::{EventLog, LogRecord, MemoryEventLog};
pub use model::{
    Namespace, ObjectMeta, Resource, ResourceKey, ResourceKind, ResourcePatternType,
    ResourceSecurityPolicy, ResourceSpec, SecurityPolicy, RETENTION_BYTES_CONFIG,
};
pub use quota::{QuotaEngine, QuotaKey, QuotaResponse};
pub use store::ResourceStore;
