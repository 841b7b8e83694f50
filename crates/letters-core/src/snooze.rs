//! Notification snoozing
//!
//! A snoozed letter drops out of the surfaced notification collections until
//! the start of the next calendar day. Snoozing is presentation state only:
//! it never touches the stored letter or its SLA classification.

use std::collections::HashMap;

use chrono::{DateTime, Days, Utc};
use parking_lot::RwLock;
use uuid::Uuid;

/// Key-value store for snooze expiries
///
/// Kept behind a trait so the in-memory implementation can be swapped for a
/// durable one without touching the classification or routing logic.
pub trait SnoozeStore: Send + Sync {
    /// Snooze a letter until the given instant
    fn set(&self, letter_id: Uuid, until: DateTime<Utc>);
    /// Remove a snooze, if any
    fn clear(&self, letter_id: Uuid);
    /// Whether the letter's notifications are currently suppressed
    fn is_snoozed(&self, letter_id: Uuid, now: DateTime<Utc>) -> bool;
}

/// Start of the calendar day after `now`, the default snooze horizon
pub fn next_day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    // Midnight is valid for any date; the fallback is unreachable
    (now.date_naive() + Days::new(1))
        .and_hms_opt(0, 0, 0)
        .map(|start| start.and_utc())
        .unwrap_or(now)
}

/// In-memory snooze store with lazy pruning
#[derive(Default)]
pub struct MemorySnoozeStore {
    entries: RwLock<HashMap<Uuid, DateTime<Utc>>>,
}

impl MemorySnoozeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnoozeStore for MemorySnoozeStore {
    fn set(&self, letter_id: Uuid, until: DateTime<Utc>) {
        self.entries.write().insert(letter_id, until);
    }

    fn clear(&self, letter_id: Uuid) {
        self.entries.write().remove(&letter_id);
    }

    fn is_snoozed(&self, letter_id: Uuid, now: DateTime<Utc>) -> bool {
        let expired = {
            let entries = self.entries.read();
            match entries.get(&letter_id) {
                Some(until) if *until > now => return true,
                Some(_) => true,
                None => false,
            }
        };
        if expired {
            self.entries.write().remove(&letter_id);
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_snooze_lasts_until_next_day() {
        let store = MemorySnoozeStore::new();
        let id = Uuid::new_v4();
        let evening = Utc.with_ymd_and_hms(2024, 1, 3, 18, 30, 0).unwrap();

        store.set(id, next_day_start(evening));
        assert!(store.is_snoozed(id, evening));
        assert!(store.is_snoozed(
            id,
            Utc.with_ymd_and_hms(2024, 1, 3, 23, 59, 59).unwrap()
        ));
        // Midnight rolls the suppression off
        assert!(!store.is_snoozed(
            id,
            Utc.with_ymd_and_hms(2024, 1, 4, 0, 0, 0).unwrap()
        ));
    }

    #[test]
    fn test_expired_entries_are_pruned() {
        let store = MemorySnoozeStore::new();
        let id = Uuid::new_v4();
        let now = Utc.with_ymd_and_hms(2024, 1, 3, 10, 0, 0).unwrap();

        store.set(id, now - chrono::Duration::hours(1));
        assert!(!store.is_snoozed(id, now));
        assert!(store.entries.read().is_empty());
    }

    #[test]
    fn test_clear_removes_suppression() {
        let store = MemorySnoozeStore::new();
        let id = Uuid::new_v4();
        let now = Utc.with_ymd_and_hms(2024, 1, 3, 10, 0, 0).unwrap();

        store.set(id, next_day_start(now));
        store.clear(id);
        assert!(!store.is_snoozed(id, now));
    }
}
