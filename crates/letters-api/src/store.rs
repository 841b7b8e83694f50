//! In-memory letter store
//!
//! The database is an external collaborator in this slice; the store keeps
//! the same shape a repository over the ORM would expose. Collections live
//! behind `parking_lot` locks, one per entity, acquired briefly and never
//! nested.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use letters_core::{
    classify, Attachment, Comment, Letter, LetterError, LetterStatus, Result, SlaState, User,
    UserRole,
};
use parking_lot::RwLock;
use uuid::Uuid;

use crate::models::{
    AttachmentCreate, BulkStatusResult, CommentCreate, LetterCreate, LetterUpdate, UserCreate,
};

/// Page size cap for the notification trigger queries
pub const NOTIFICATION_LIMIT: usize = 100;

#[derive(Default)]
pub struct Store {
    letters: RwLock<HashMap<Uuid, Letter>>,
    comments: RwLock<HashMap<Uuid, Comment>>,
    attachments: RwLock<HashMap<Uuid, Attachment>>,
    users: RwLock<HashMap<Uuid, User>>,
    next_number: AtomicU64,
}

impl Store {
    pub fn new() -> Self {
        Self {
            next_number: AtomicU64::new(1),
            ..Self::default()
        }
    }

    // ============ Letters ============

    pub fn create_letter(&self, input: LetterCreate) -> Letter {
        let number = self.next_number.fetch_add(1, Ordering::Relaxed);
        let mut letter = Letter::create(number, input.subject, input.body, input.org);
        if let Some(deadline) = input.deadline_date {
            letter.set_deadline(deadline);
        }
        self.letters.write().insert(letter.id, letter.clone());
        letter
    }

    pub fn letter(&self, id: Uuid) -> Option<Letter> {
        self.letters.read().get(&id).cloned()
    }

    pub fn letter_by_portal_token(&self, token: &str) -> Option<Letter> {
        if token.is_empty() {
            return None;
        }
        self.letters
            .read()
            .values()
            .find(|l| l.portal_token == token)
            .cloned()
    }

    /// All letters, newest registration first
    pub fn letters(&self) -> Vec<Letter> {
        let mut all: Vec<Letter> = self.letters.read().values().cloned().collect();
        all.sort_by(|a, b| b.number.cmp(&a.number));
        all
    }

    pub fn update_letter(&self, id: Uuid, update: LetterUpdate) -> Result<Letter> {
        let mut letters = self.letters.write();
        let letter = letters.get_mut(&id).ok_or(LetterError::LetterNotFound)?;
        if let Some(subject) = update.subject {
            letter.subject = subject;
        }
        if let Some(body) = update.body {
            letter.body = body;
        }
        if let Some(org) = update.org {
            letter.org = org;
        }
        if let Some(deadline) = update.deadline_date {
            letter.set_deadline(deadline);
        }
        Ok(letter.clone())
    }

    pub fn delete_letter(&self, id: Uuid) -> Result<()> {
        self.letters
            .write()
            .remove(&id)
            .map(|_| ())
            .ok_or(LetterError::LetterNotFound)?;
        self.comments.write().retain(|_, c| c.letter_id != id);
        self.attachments.write().retain(|_, a| a.letter_id != id);
        Ok(())
    }

    /// Apply a lifecycle mutation to one letter under the write lock
    pub fn with_letter<F>(&self, id: Uuid, f: F) -> Result<Letter>
    where
        F: FnOnce(&mut Letter) -> Result<()>,
    {
        let mut letters = self.letters.write();
        let letter = letters.get_mut(&id).ok_or(LetterError::LetterNotFound)?;
        f(letter)?;
        Ok(letter.clone())
    }

    /// Batch status update; one lock acquisition per batch
    pub fn bulk_set_status(&self, ids: &[Uuid], status: LetterStatus) -> BulkStatusResult {
        let mut letters = self.letters.write();
        let mut updated = 0;
        let mut missing = Vec::new();
        for id in ids {
            match letters.get_mut(id) {
                Some(letter) => {
                    letter.set_status(status);
                    updated += 1;
                }
                None => missing.push(*id),
            }
        }
        BulkStatusResult { updated, missing }
    }

    // ============ Notification trigger queries ============

    /// Letters currently past their deadline, oldest registration first
    ///
    /// Filters through the SLA classifier itself, so the listing can never
    /// disagree with the state a detail view would show.
    pub fn overdue(&self, now: DateTime<Utc>, limit: usize) -> Vec<Letter> {
        self.letters_in_state(SlaState::Overdue, now, limit)
    }

    /// Letters due within the urgency boundary, oldest registration first
    pub fn urgent(&self, now: DateTime<Utc>, limit: usize) -> Vec<Letter> {
        self.letters_in_state(SlaState::DueSoon, now, limit)
    }

    fn letters_in_state(&self, state: SlaState, now: DateTime<Utc>, limit: usize) -> Vec<Letter> {
        let mut matched: Vec<Letter> = self
            .letters
            .read()
            .values()
            .filter(|l| classify(&l.sla_input(), now).state == state)
            .cloned()
            .collect();
        matched.sort_by_key(|l| l.number);
        matched.truncate(limit);
        matched
    }

    // ============ Comments ============

    pub fn add_comment(&self, letter_id: Uuid, input: CommentCreate) -> Result<Comment> {
        if !self.letters.read().contains_key(&letter_id) {
            return Err(LetterError::LetterNotFound);
        }
        let comment = Comment {
            id: Uuid::new_v4(),
            letter_id,
            author_id: input.author_id,
            body: input.body,
            is_internal: input.is_internal,
            created_at: Utc::now(),
        };
        self.comments.write().insert(comment.id, comment.clone());
        Ok(comment)
    }

    pub fn comments_for(&self, letter_id: Uuid) -> Vec<Comment> {
        let mut list: Vec<Comment> = self
            .comments
            .read()
            .values()
            .filter(|c| c.letter_id == letter_id)
            .cloned()
            .collect();
        list.sort_by_key(|c| c.created_at);
        list
    }

    /// Public (non-internal) comments for the applicant portal
    pub fn public_comments_for(&self, letter_id: Uuid) -> Vec<Comment> {
        self.comments_for(letter_id)
            .into_iter()
            .filter(|c| !c.is_internal)
            .collect()
    }

    pub fn delete_comment(&self, letter_id: Uuid, comment_id: Uuid) -> Result<()> {
        let mut comments = self.comments.write();
        match comments.get(&comment_id) {
            Some(c) if c.letter_id == letter_id => {
                comments.remove(&comment_id);
                Ok(())
            }
            _ => Err(LetterError::CommentNotFound),
        }
    }

    // ============ Attachments ============

    pub fn add_attachment(&self, letter_id: Uuid, input: AttachmentCreate) -> Result<Attachment> {
        if !self.letters.read().contains_key(&letter_id) {
            return Err(LetterError::LetterNotFound);
        }
        let attachment = Attachment {
            id: Uuid::new_v4(),
            letter_id,
            file_name: input.file_name,
            content_type: input.content_type,
            size_bytes: input.size_bytes,
            uploaded_by: input.uploaded_by,
            created_at: Utc::now(),
        };
        self.attachments
            .write()
            .insert(attachment.id, attachment.clone());
        Ok(attachment)
    }

    pub fn attachments_for(&self, letter_id: Uuid) -> Vec<Attachment> {
        let mut list: Vec<Attachment> = self
            .attachments
            .read()
            .values()
            .filter(|a| a.letter_id == letter_id)
            .cloned()
            .collect();
        list.sort_by_key(|a| a.created_at);
        list
    }

    pub fn delete_attachment(&self, letter_id: Uuid, attachment_id: Uuid) -> Result<()> {
        let mut attachments = self.attachments.write();
        match attachments.get(&attachment_id) {
            Some(a) if a.letter_id == letter_id => {
                attachments.remove(&attachment_id);
                Ok(())
            }
            _ => Err(LetterError::AttachmentNotFound),
        }
    }

    // ============ Users ============

    pub fn create_user(&self, input: UserCreate) -> User {
        let user = User {
            id: Uuid::new_v4(),
            email: input.email,
            name: input.name,
            role: input.role,
            created_at: Utc::now(),
            last_login: None,
        };
        self.users.write().insert(user.id, user.clone());
        user
    }

    pub fn user(&self, id: Uuid) -> Option<User> {
        self.users.read().get(&id).cloned()
    }

    pub fn users(&self) -> Vec<User> {
        let mut all: Vec<User> = self.users.read().values().cloned().collect();
        all.sort_by_key(|u| u.created_at);
        all
    }

    pub fn update_user(&self, id: Uuid, input: UserCreate) -> Result<User> {
        let mut users = self.users.write();
        let user = users.get_mut(&id).ok_or(LetterError::UserNotFound)?;
        user.email = input.email;
        user.name = input.name;
        user.role = input.role;
        Ok(user.clone())
    }

    pub fn delete_user(&self, id: Uuid) -> Result<()> {
        self.users
            .write()
            .remove(&id)
            .map(|_| ())
            .ok_or(LetterError::UserNotFound)
    }

    pub fn user_name(&self, id: Option<Uuid>) -> Option<String> {
        id.and_then(|id| self.users.read().get(&id).map(|u| u.name.clone()))
    }

    /// Seed a default admin so a fresh instance is reachable
    pub fn seed_admin(&self) -> User {
        self.create_user(UserCreate {
            email: "admin@dmed.local".into(),
            name: "Administrator".into(),
            role: UserRole::Admin,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn draft(subject: &str) -> LetterCreate {
        LetterCreate {
            subject: subject.into(),
            body: "body".into(),
            org: "Org".into(),
            deadline_date: None,
        }
    }

    #[test]
    fn test_numbers_are_monotonic() {
        let store = Store::new();
        let a = store.create_letter(draft("a"));
        let b = store.create_letter(draft("b"));
        assert!(b.number > a.number);
    }

    #[test]
    fn test_bulk_status_reports_missing_ids() {
        let store = Store::new();
        let a = store.create_letter(draft("a"));
        let ghost = Uuid::new_v4();
        let result = store.bulk_set_status(&[a.id, ghost], LetterStatus::Accepted);
        assert_eq!(result.updated, 1);
        assert_eq!(result.missing, vec![ghost]);
        assert_eq!(store.letter(a.id).unwrap().status, LetterStatus::Accepted);
    }

    #[test]
    fn test_overdue_and_urgent_are_disjoint_and_capped() {
        let store = Store::new();
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap();

        let mut past = draft("past");
        past.deadline_date = Some(Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap());
        let past = store.create_letter(past);

        let mut soon = draft("soon");
        soon.deadline_date = Some(Utc.with_ymd_and_hms(2024, 1, 11, 0, 0, 0).unwrap());
        let soon = store.create_letter(soon);

        let overdue = store.overdue(now, NOTIFICATION_LIMIT);
        let urgent = store.urgent(now, NOTIFICATION_LIMIT);
        assert_eq!(overdue.iter().map(|l| l.id).collect::<Vec<_>>(), vec![past.id]);
        assert_eq!(urgent.iter().map(|l| l.id).collect::<Vec<_>>(), vec![soon.id]);

        assert!(store.overdue(now, 0).is_empty());
    }

    #[test]
    fn test_frozen_letter_leaves_overdue_listing() {
        let store = Store::new();
        let now = Utc.with_ymd_and_hms(2024, 1, 10, 9, 0, 0).unwrap();
        let mut past = draft("past");
        past.deadline_date = Some(Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap());
        let past = store.create_letter(past);

        assert_eq!(store.overdue(now, 10).len(), 1);
        store
            .with_letter(past.id, |l| {
                l.set_status(LetterStatus::Frozen);
                Ok(())
            })
            .unwrap();
        assert!(store.overdue(now, 10).is_empty());
    }

    #[test]
    fn test_deleting_letter_drops_its_comments() {
        let store = Store::new();
        let letter = store.create_letter(draft("a"));
        store
            .add_comment(
                letter.id,
                CommentCreate {
                    author_id: Uuid::new_v4(),
                    body: "hi".into(),
                    is_internal: false,
                },
            )
            .unwrap();
        store.delete_letter(letter.id).unwrap();
        assert!(store.comments_for(letter.id).is_empty());
    }

    #[test]
    fn test_portal_token_lookup_rejects_empty() {
        let store = Store::new();
        let letter = store.create_letter(draft("a"));
        assert!(store.letter_by_portal_token("").is_none());
        assert_eq!(
            store
                .letter_by_portal_token(&letter.portal_token)
                .map(|l| l.id),
            Some(letter.id)
        );
    }
}
