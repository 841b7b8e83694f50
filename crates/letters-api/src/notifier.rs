//! Notification fan-out
//!
//! Letters surface to the outside world two ways: the polling endpoints in
//! `routes::notifications`, and push delivery to subscribed webhook targets
//! (the integration point for the Telegram/email/SMS bridges, which live
//! outside this service). Delivery retries with exponential backoff and
//! parks exhausted events in a dead-letter list.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use letters_core::{Letter, SnoozeStore};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{Store, NOTIFICATION_LIMIT};

/// Notification event kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    LetterOverdue,
    LetterDueSoon,
    StatusChanged,
    CommentAdded,
    LetterAssigned,
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::LetterOverdue => write!(f, "letter.overdue"),
            Self::LetterDueSoon => write!(f, "letter.due_soon"),
            Self::StatusChanged => write!(f, "letter.status_changed"),
            Self::CommentAdded => write!(f, "letter.comment_added"),
            Self::LetterAssigned => write!(f, "letter.assigned"),
        }
    }
}

/// A notification event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub kind: EventKind,
    pub timestamp: DateTime<Utc>,
    pub letter_id: Uuid,
    pub data: serde_json::Value,
}

impl Event {
    pub fn for_letter(kind: EventKind, letter: &Letter, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            timestamp: now,
            letter_id: letter.id,
            data: serde_json::json!({
                "number": letter.number,
                "org": letter.org,
                "status": letter.status.to_string(),
                "deadline_date": letter.deadline_date,
            }),
        }
    }
}

/// A delivery target
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub url: String,
    pub kinds: Vec<EventKind>,
    pub secret: String,
    pub enabled: bool,
    pub retry: RetryPolicy,
}

/// Retry policy for a subscription
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 5, base_delay_secs: 60 }
    }
}

/// Queued delivery
#[derive(Debug, Clone)]
struct PendingDelivery {
    id: Uuid,
    subscription_id: Uuid,
    event: Event,
    attempt: u32,
    next_attempt: DateTime<Utc>,
}

/// Undeliverable event
#[derive(Debug, Clone)]
pub struct DeadLetter {
    pub event_id: Uuid,
    pub subscription_id: Uuid,
    pub error: String,
    pub failed_at: DateTime<Utc>,
}

/// Notification dispatcher
pub struct NotificationDispatch {
    subscriptions: Arc<RwLock<HashMap<Uuid, Subscription>>>,
    queue: Arc<RwLock<Vec<PendingDelivery>>>,
    dead_letters: Arc<RwLock<Vec<DeadLetter>>>,
}

impl NotificationDispatch {
    pub fn new() -> Self {
        Self {
            subscriptions: Arc::new(RwLock::new(HashMap::new())),
            queue: Arc::new(RwLock::new(Vec::new())),
            dead_letters: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Register a delivery target
    pub fn subscribe(&self, subscription: Subscription) -> Uuid {
        let id = subscription.id;
        self.subscriptions.write().insert(id, subscription);
        id
    }

    pub fn unsubscribe(&self, id: Uuid) {
        self.subscriptions.write().remove(&id);
    }

    /// Queue an event for every enabled subscription interested in its kind
    pub fn publish(&self, event: Event) {
        let subscriptions = self.subscriptions.read();
        let mut queue = self.queue.write();
        for (id, subscription) in subscriptions.iter() {
            if subscription.enabled && subscription.kinds.contains(&event.kind) {
                queue.push(PendingDelivery {
                    id: Uuid::new_v4(),
                    subscription_id: *id,
                    event: event.clone(),
                    attempt: 0,
                    next_attempt: event.timestamp,
                });
            }
        }
    }

    pub fn pending(&self) -> usize {
        self.queue.read().len()
    }

    pub fn dead_letters(&self) -> Vec<DeadLetter> {
        self.dead_letters.read().clone()
    }

    /// Drain and deliver everything whose retry time has come
    pub async fn process(&self, now: DateTime<Utc>) {
        let due: Vec<PendingDelivery> = {
            let mut queue = self.queue.write();
            let (ready, waiting): (Vec<_>, Vec<_>) =
                queue.drain(..).partition(|d| d.next_attempt <= now);
            *queue = waiting;
            ready
        };

        for mut delivery in due {
            let subscription = {
                let subscriptions = self.subscriptions.read();
                subscriptions.get(&delivery.subscription_id).cloned()
            };
            let Some(subscription) = subscription else {
                // Target was removed while the event waited
                continue;
            };

            match self.deliver(&subscription, &delivery.event).await {
                Ok(()) => {
                    tracing::info!(delivery = %delivery.id, kind = %delivery.event.kind, "notification delivered");
                }
                Err(error) => {
                    delivery.attempt += 1;
                    if delivery.attempt < subscription.retry.max_attempts {
                        let delay =
                            subscription.retry.base_delay_secs * 2u64.pow(delivery.attempt);
                        delivery.next_attempt = now + chrono::Duration::seconds(delay as i64);
                        self.queue.write().push(delivery);
                    } else {
                        tracing::warn!(delivery = %delivery.id, %error, "notification dead-lettered");
                        self.dead_letters.write().push(DeadLetter {
                            event_id: delivery.event.id,
                            subscription_id: delivery.subscription_id,
                            error,
                            failed_at: now,
                        });
                    }
                }
            }
        }
    }

    async fn deliver(&self, subscription: &Subscription, event: &Event) -> Result<(), String> {
        let payload = serde_json::to_string(event).map_err(|e| e.to_string())?;
        let signature = sign(&payload, &subscription.secret);

        let client = reqwest::Client::new();
        let response = client
            .post(&subscription.url)
            .header("Content-Type", "application/json")
            .header("X-Letters-Signature", signature)
            .header("X-Letters-Event", event.kind.to_string())
            .body(payload)
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(format!("HTTP {}", response.status()))
        }
    }
}

impl Default for NotificationDispatch {
    fn default() -> Self {
        Self::new()
    }
}

/// Sign a payload for receiver verification
fn sign(payload: &str, secret: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(payload.as_bytes());
    format!("sha256={}", hex::encode(hasher.finalize()))
}

/// Publish overdue/due-soon events for everything the trigger queries surface
///
/// Runs from the periodic scan in `main`. Snoozed letters are skipped here
/// the same way the polling endpoints skip them.
pub fn publish_deadline_events(
    store: &Store,
    snooze: &dyn SnoozeStore,
    dispatch: &NotificationDispatch,
    now: DateTime<Utc>,
) {
    for letter in store.overdue(now, NOTIFICATION_LIMIT) {
        if !snooze.is_snoozed(letter.id, now) {
            dispatch.publish(Event::for_letter(EventKind::LetterOverdue, &letter, now));
        }
    }
    for letter in store.urgent(now, NOTIFICATION_LIMIT) {
        if !snooze.is_snoozed(letter.id, now) {
            dispatch.publish(Event::for_letter(EventKind::LetterDueSoon, &letter, now));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use letters_core::MemorySnoozeStore;
    use crate::models::LetterCreate;
    use chrono::TimeZone;

    fn subscription(kinds: Vec<EventKind>, enabled: bool) -> Subscription {
        Subscription {
            id: Uuid::new_v4(),
            url: "http://127.0.0.1:1/hook".into(),
            kinds,
            secret: "s3cret".into(),
            enabled,
            retry: RetryPolicy::default(),
        }
    }

    fn event(kind: EventKind) -> Event {
        Event {
            id: Uuid::new_v4(),
            kind,
            timestamp: Utc::now(),
            letter_id: Uuid::new_v4(),
            data: serde_json::Value::Null,
        }
    }

    #[test]
    fn test_publish_filters_by_kind_and_enabled() {
        let dispatch = NotificationDispatch::new();
        dispatch.subscribe(subscription(vec![EventKind::LetterOverdue], true));
        dispatch.subscribe(subscription(vec![EventKind::CommentAdded], true));
        dispatch.subscribe(subscription(vec![EventKind::LetterOverdue], false));

        dispatch.publish(event(EventKind::LetterOverdue));
        assert_eq!(dispatch.pending(), 1);
    }

    #[test]
    fn test_signature_is_deterministic() {
        let a = sign("{\"x\":1}", "secret");
        let b = sign("{\"x\":1}", "secret");
        assert_eq!(a, b);
        assert!(a.starts_with("sha256="));
        assert_ne!(a, sign("{\"x\":1}", "other"));
    }

    #[test]
    fn test_deadline_scan_respects_snooze() {
        let store = Store::new();
        let snooze = MemorySnoozeStore::new();
        let dispatch = NotificationDispatch::new();
        dispatch.subscribe(subscription(
            vec![EventKind::LetterOverdue, EventKind::LetterDueSoon],
            true,
        ));

        let now = Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap();
        let letter = store.create_letter(LetterCreate {
            subject: "late".into(),
            body: "".into(),
            org: "Org".into(),
            deadline_date: Some(Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap()),
        });

        publish_deadline_events(&store, &snooze, &dispatch, now);
        assert_eq!(dispatch.pending(), 1);

        snooze.set(letter.id, letters_core::next_day_start(now));
        publish_deadline_events(&store, &snooze, &dispatch, now);
        // Still only the first event; the snoozed letter published nothing new
        assert_eq!(dispatch.pending(), 1);
    }

    #[tokio::test]
    async fn test_unreachable_target_retries_then_dead_letters() {
        let dispatch = NotificationDispatch::new();
        let mut sub = subscription(vec![EventKind::StatusChanged], true);
        sub.retry = RetryPolicy { max_attempts: 1, base_delay_secs: 1 };
        dispatch.subscribe(sub);

        dispatch.publish(event(EventKind::StatusChanged));
        dispatch.process(Utc::now()).await;

        assert_eq!(dispatch.pending(), 0);
        assert_eq!(dispatch.dead_letters().len(), 1);
    }
}
