// In-memory implementation of QuestionStore.
//
// Entries map the id of a question posted into the moderation group to the
// user who asked it. The store is bounded: once `capacity` is exceeded the
// oldest entries go first, and entries older than `ttl` count as absent.
// Lookups never consume an entry, so several moderators can answer the same
// question.

use crate::core::relay::{MessageId, PendingQuestion, QuestionStore};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

pub const DEFAULT_CAPACITY: usize = 10_000;

#[derive(Debug, Clone)]
struct StoredQuestion {
    question: PendingQuestion,
    recorded_at: DateTime<Utc>,
}

pub struct InMemoryQuestionStore {
    entries: DashMap<MessageId, StoredQuestion>,
    /// Insertion order, oldest first. May hold stale pairs for overwritten
    /// ids; those are skipped when they reach the front.
    order: Mutex<VecDeque<(MessageId, DateTime<Utc>)>>,
    capacity: usize,
    ttl: Option<Duration>,
}

impl InMemoryQuestionStore {
    /// `ttl = None` keeps entries until capacity pushes them out.
    pub fn new(capacity: usize, ttl: Option<Duration>) -> Self {
        Self {
            entries: DashMap::new(),
            order: Mutex::new(VecDeque::new()),
            capacity: capacity.max(1),
            ttl,
        }
    }

    fn is_expired(&self, recorded_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        self.ttl.is_some_and(|ttl| now - recorded_at >= ttl)
    }

    fn record_at(&self, forwarded: MessageId, question: PendingQuestion, now: DateTime<Utc>) {
        self.entries.insert(
            forwarded,
            StoredQuestion {
                question,
                recorded_at: now,
            },
        );

        let mut order = self.order.lock().unwrap_or_else(PoisonError::into_inner);
        order.push_back((forwarded, now));
        self.evict(&mut order, now);
    }

    fn lookup_at(&self, forwarded: MessageId, now: DateTime<Utc>) -> Option<PendingQuestion> {
        let stored = self.entries.get(&forwarded).map(|e| e.value().clone())?;

        if self.is_expired(stored.recorded_at, now) {
            self.entries
                .remove_if(&forwarded, |_, e| e.recorded_at == stored.recorded_at);
            return None;
        }

        Some(stored.question)
    }

    fn evict(&self, order: &mut VecDeque<(MessageId, DateTime<Utc>)>, now: DateTime<Utc>) {
        while let Some(&(id, recorded_at)) = order.front() {
            let superseded = self
                .entries
                .get(&id)
                .map_or(true, |e| e.recorded_at != recorded_at);
            let expired = self.is_expired(recorded_at, now);
            let over_capacity = self.entries.len() > self.capacity;

            if !(superseded || expired || over_capacity) {
                break;
            }

            order.pop_front();
            if !superseded {
                self.entries
                    .remove_if(&id, |_, e| e.recorded_at == recorded_at);
                tracing::debug!(message_id = %id, expired, "Evicted pending question");
            }
        }
    }
}

impl Default for InMemoryQuestionStore {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, None)
    }
}

impl QuestionStore for InMemoryQuestionStore {
    fn record(&self, forwarded: MessageId, question: PendingQuestion) {
        self.record_at(forwarded, question, Utc::now());
    }

    fn lookup(&self, forwarded: MessageId) -> Option<PendingQuestion> {
        self.lookup_at(forwarded, Utc::now())
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::relay::UserId;

    fn question(user: i64) -> PendingQuestion {
        PendingQuestion {
            requester_id: UserId(user),
            requester_name: format!("@user{}", user),
        }
    }

    #[test]
    fn test_record_then_lookup() {
        let store = InMemoryQuestionStore::default();
        store.record(MessageId(10), question(111));

        assert_eq!(store.lookup(MessageId(10)), Some(question(111)));
        assert_eq!(store.lookup(MessageId(11)), None);
    }

    #[test]
    fn test_lookup_does_not_consume() {
        let store = InMemoryQuestionStore::default();
        store.record(MessageId(10), question(111));

        assert!(store.lookup(MessageId(10)).is_some());
        assert!(store.lookup(MessageId(10)).is_some());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_record_overwrites() {
        let store = InMemoryQuestionStore::default();
        store.record(MessageId(10), question(1));
        store.record(MessageId(10), question(2));

        assert_eq!(store.lookup(MessageId(10)), Some(question(2)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_capacity_evicts_oldest_first() {
        let store = InMemoryQuestionStore::new(2, None);
        store.record(MessageId(1), question(1));
        store.record(MessageId(2), question(2));
        store.record(MessageId(3), question(3));

        assert_eq!(store.len(), 2);
        assert_eq!(store.lookup(MessageId(1)), None);
        assert_eq!(store.lookup(MessageId(2)), Some(question(2)));
        assert_eq!(store.lookup(MessageId(3)), Some(question(3)));
    }

    #[test]
    fn test_overwritten_entry_is_not_evicted_by_its_old_slot() {
        let store = InMemoryQuestionStore::new(2, None);
        let start = Utc::now();
        store.record_at(MessageId(1), question(1), start);
        store.record_at(MessageId(2), question(2), start + Duration::seconds(1));
        store.record_at(MessageId(1), question(9), start + Duration::seconds(2));
        store.record_at(MessageId(3), question(3), start + Duration::seconds(3));

        // Id 1 was refreshed after id 2, so id 2 is now the oldest.
        assert_eq!(store.lookup(MessageId(2)), None);
        assert_eq!(store.lookup(MessageId(1)), Some(question(9)));
        assert_eq!(store.lookup(MessageId(3)), Some(question(3)));
    }

    #[test]
    fn test_expired_entries_are_absent() {
        let store = InMemoryQuestionStore::new(10, Some(Duration::hours(1)));
        let start = Utc::now();
        store.record_at(MessageId(1), question(1), start);

        assert!(store
            .lookup_at(MessageId(1), start + Duration::minutes(59))
            .is_some());
        assert!(store
            .lookup_at(MessageId(1), start + Duration::hours(2))
            .is_none());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn test_recording_sweeps_expired_entries() {
        let store = InMemoryQuestionStore::new(10, Some(Duration::hours(1)));
        let start = Utc::now();
        store.record_at(MessageId(1), question(1), start);
        store.record_at(MessageId(2), question(2), start + Duration::hours(3));

        assert_eq!(store.len(), 1);
        assert!(store
            .lookup_at(MessageId(2), start + Duration::hours(3))
            .is_some());
    }
}
