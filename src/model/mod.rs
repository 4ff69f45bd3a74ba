//! Data model for governed resources and namespaces
//!
//! Everything the governance core manages is a [`Resource`]: a piece of
//! metadata plus a kind-specific spec, identified by `(kind, cluster, name)`.
//! A [`Namespace`] is the tenant boundary: an externally managed, read-only
//! description of which resources a tenant owns or may access on a cluster.

mod namespace;
mod resource;

pub use namespace::{Namespace, ResourcePatternType, ResourceSecurityPolicy, SecurityPolicy};
pub use resource::{
    ObjectMeta, Resource, ResourceKey, ResourceKind, ResourceSpec, RETENTION_BYTES_CONFIG,
};
