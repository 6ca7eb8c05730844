//! Bounded archive of messages that exhausted their retry budget
//!
//! Failed messages are retained for operator inspection and may be
//! explicitly resubmitted; they are never silently discarded (short of
//! the capacity bound, which drops the oldest entries first).

use std::collections::VecDeque;
use std::sync::Mutex;

use tracing::warn;

use meshnet_core::{FailedMessage, MessageId};

/// Default number of failed messages retained
pub const DEFAULT_ARCHIVE_CAPACITY: usize = 100;

/// Bounded FIFO of failed messages
#[derive(Debug)]
pub struct FailedArchive {
    entries: Mutex<VecDeque<FailedMessage>>,
    capacity: usize,
}

impl FailedArchive {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(VecDeque::new()),
            capacity,
        }
    }

    /// Archive a failed message, evicting the oldest beyond capacity
    pub fn push(&self, failed: FailedMessage) {
        let mut entries = self.entries.lock().unwrap();
        if entries.len() == self.capacity {
            if let Some(evicted) = entries.pop_front() {
                warn!(
                    message_id = %evicted.envelope.id,
                    "failed archive full, evicting oldest entry"
                );
            }
        }
        entries.push_back(failed);
    }

    /// Remove and return one archived message (for resubmission)
    pub fn take(&self, id: &MessageId) -> Option<FailedMessage> {
        let mut entries = self.entries.lock().unwrap();
        let position = entries.iter().position(|f| &f.envelope.id == id)?;
        entries.remove(position)
    }

    /// Clone out the current archive contents, oldest first
    pub fn snapshot(&self) -> Vec<FailedMessage> {
        self.entries.lock().unwrap().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for FailedArchive {
    fn default() -> Self {
        Self::new(DEFAULT_ARCHIVE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshnet_core::{MessageEnvelope, NodeName, RouteError};

    fn failed(source: &str) -> FailedMessage {
        let envelope = MessageEnvelope::new(
            NodeName::new(source).unwrap(),
            NodeName::new("target").unwrap(),
            vec![],
        );
        FailedMessage::new(
            envelope,
            RouteError::RetryExhausted { attempts: 3 },
        )
    }

    #[test]
    fn test_push_and_snapshot() {
        let archive = FailedArchive::new(10);
        archive.push(failed("a"));
        archive.push(failed("b"));

        let entries = archive.snapshot();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].envelope.source.as_str(), "a");
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let archive = FailedArchive::new(2);
        let first = failed("a");
        let first_id = first.envelope.id;
        archive.push(first);
        archive.push(failed("b"));
        archive.push(failed("c"));

        assert_eq!(archive.len(), 2);
        assert!(archive.take(&first_id).is_none());
    }

    #[test]
    fn test_take_removes_entry() {
        let archive = FailedArchive::new(10);
        let entry = failed("a");
        let id = entry.envelope.id;
        archive.push(entry);

        assert!(archive.take(&id).is_some());
        assert!(archive.is_empty());
        assert!(archive.take(&id).is_none());
    }
}
