//! Event log contract and in-memory backend
//!
//! The durable source of truth for governed resources is a compacted,
//! partitioned log (one per resource category). The store never reads the log
//! directly: it appends through [`EventLog::append`] and rebuilds its view
//! from the ordered, replay-from-earliest subscription. Delivery is
//! at-least-once; appliers must tolerate redelivery.
//!
//! [`MemoryEventLog`] is the in-process backend used by tests and embedded
//! setups, mirroring the shape a Kafka-backed adapter implements.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::debug;

use crate::error::{GovernorError, Result};
use crate::model::{Resource, ResourceKey};

/// One record of a resource-category log. `value: None` is a tombstone
/// marking logical deletion of the key; compaction eventually purges it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    pub key: ResourceKey,
    pub value: Option<Resource>,
}

impl LogRecord {
    /// Record carrying the latest state of a resource
    pub fn put(resource: Resource) -> Self {
        Self {
            key: resource.key(),
            value: Some(resource),
        }
    }

    /// Tombstone for a resource key
    pub fn tombstone(key: ResourceKey) -> Self {
        Self { key, value: None }
    }

    /// Whether this record logically deletes its key
    pub fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }

    /// Wire payload for a Kafka-backed adapter. Tombstones serialize to an
    /// empty payload, matching Kafka's null-value compaction convention.
    pub fn to_payload(&self) -> Result<Vec<u8>> {
        match &self.value {
            Some(resource) => Ok(serde_json::to_vec(resource)?),
            None => Ok(Vec::new()),
        }
    }

    /// Rebuild a record from a wire key and payload
    pub fn from_payload(key: ResourceKey, payload: &[u8]) -> Result<Self> {
        if payload.is_empty() {
            return Ok(Self::tombstone(key));
        }
        Ok(Self {
            key,
            value: Some(serde_json::from_slice(payload)?),
        })
    }
}

/// Contract the store requires from the durable log.
#[async_trait]
pub trait EventLog: Send + Sync {
    /// Durably append a record, returning its offset. On failure the record
    /// was not persisted and the whole operation is safe to retry.
    async fn append(&self, record: LogRecord) -> Result<i64>;

    /// Deliver every retained record from the earliest offset, in log order,
    /// then keep delivering new appends indefinitely. At-least-once.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<LogRecord>;
}

struct LogInner {
    records: Vec<LogRecord>,
    subscribers: Vec<mpsc::UnboundedSender<LogRecord>>,
    fail_next_append: bool,
}

/// In-memory event log. Retains full history so late subscribers replay from
/// the earliest offset, like a compacted Kafka topic consumed from
/// `earliest` (minus compaction, which tests do not rely on).
pub struct MemoryEventLog {
    name: String,
    inner: Mutex<LogInner>,
}

impl MemoryEventLog {
    pub fn new() -> Self {
        Self::named("memory")
    }

    /// Create a log with a name, typically the compacted topic name derived
    /// from [`crate::config::GovernorConfig::log_topic`].
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inner: Mutex::new(LogInner {
                records: Vec::new(),
                subscribers: Vec::new(),
                fail_next_append: false,
            }),
        }
    }

    /// Log name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of retained records
    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    /// Whether the log holds no records
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fault injection: make the next `append` fail with an append error,
    /// simulating broker unavailability.
    pub fn fail_next_append(&self) {
        self.inner.lock().fail_next_append = true;
    }
}

impl Default for MemoryEventLog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventLog for MemoryEventLog {
    async fn append(&self, record: LogRecord) -> Result<i64> {
        let mut inner = self.inner.lock();
        if inner.fail_next_append {
            inner.fail_next_append = false;
            return Err(GovernorError::Append(format!(
                "broker unavailable for log '{}'",
                self.name
            )));
        }

        inner.records.push(record.clone());
        let offset = inner.records.len() as i64 - 1;
        debug!(log = %self.name, key = %record.key, offset, tombstone = record.is_tombstone(), "appended record");

        // Fan out to live subscribers, dropping the ones that went away.
        inner
            .subscribers
            .retain(|tx| tx.send(record.clone()).is_ok());

        Ok(offset)
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<LogRecord> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut inner = self.inner.lock();

        // Replay history before registering for new records, under the same
        // lock, so the subscriber sees every record exactly in log order.
        for record in &inner.records {
            let _ = tx.send(record.clone());
        }
        inner.subscribers.push(tx);

        rx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_append_assigns_sequential_offsets() {
        let log = MemoryEventLog::new();

        let o1 = log
            .append(LogRecord::put(Resource::topic("c1", "t1", 1)))
            .await
            .unwrap();
        let o2 = log
            .append(LogRecord::put(Resource::topic("c1", "t2", 1)))
            .await
            .unwrap();

        assert_eq!(o1, 0);
        assert_eq!(o2, 1);
        assert_eq!(log.len(), 2);
    }

    #[tokio::test]
    async fn test_subscribe_replays_from_earliest_then_delivers_new() {
        let log = MemoryEventLog::new();
        let early = Resource::topic("c1", "t1", 1);
        log.append(LogRecord::put(early.clone())).await.unwrap();

        let mut rx = log.subscribe();

        let late = Resource::topic("c1", "t2", 1);
        log.append(LogRecord::put(late.clone())).await.unwrap();

        assert_eq!(rx.recv().await.unwrap().value, Some(early));
        assert_eq!(rx.recv().await.unwrap().value, Some(late));
    }

    #[tokio::test]
    async fn test_injected_append_failure_persists_nothing() {
        let log = MemoryEventLog::named("ns4.topics");
        log.fail_next_append();

        let result = log
            .append(LogRecord::put(Resource::topic("c1", "t1", 1)))
            .await;

        assert!(matches!(result, Err(GovernorError::Append(_))));
        assert!(log.is_empty());

        // Failure is one-shot; the retry succeeds.
        log.append(LogRecord::put(Resource::topic("c1", "t1", 1)))
            .await
            .unwrap();
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn test_tombstone_payload_is_empty() {
        let topic = Resource::topic("c1", "t1", 1);
        let key = topic.key();

        let tombstone = LogRecord::tombstone(key.clone());
        assert!(tombstone.is_tombstone());
        assert!(tombstone.to_payload().unwrap().is_empty());

        let back = LogRecord::from_payload(key, &[]).unwrap();
        assert!(back.is_tombstone());
    }

    #[test]
    fn test_payload_round_trip() {
        let record = LogRecord::put(Resource::topic("c1", "t1", 3));
        let payload = record.to_payload().unwrap();
        let back = LogRecord::from_payload(record.key.clone(), &payload).unwrap();
        assert_eq!(record, back);
    }
}
