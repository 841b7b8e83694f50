//! DMED Letters domain core
//!
//! Correspondence tracking for organizations: letters move through a triage
//! lifecycle with deadlines measured in working days. This crate owns the
//! letter model, the status lifecycle, and the deadline/SLA projection; it
//! performs no I/O and never reads the system clock inside the classifier.
//!
//! ## Modules
//! - [`status`] - the status enum and its SLA grouping
//! - [`workdays`] - working-day calendar arithmetic
//! - [`sla`] - the state classifier
//! - [`progress`] - display projection (percent, label, tone)
//! - [`snooze`] - notification suppression store

pub mod progress;
pub mod sla;
pub mod snooze;
pub mod status;
pub mod workdays;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use progress::{plural, project, PluralForms, Progress, Tone, WORKING_DAYS_EN};
pub use sla::{classify, SlaInput, SlaReport, SlaState, DUE_SOON_WORKING_DAYS};
pub use snooze::{next_day_start, MemorySnoozeStore, SnoozeStore};
pub use status::{LetterStatus, StatusCategory, UnknownStatus};
pub use workdays::{is_weekend, working_days_between, working_days_between_at};

// =============================================================================
// Core Types
// =============================================================================

/// A tracked letter/request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Letter {
    pub id: Uuid,
    /// Sequential registration number
    pub number: u64,
    pub subject: String,
    pub body: String,
    /// Submitting organization
    pub org: String,
    pub status: LetterStatus,
    /// Responsible staff member
    pub owner_id: Option<Uuid>,
    pub watchers: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    /// Committed due date; absent until staff set one
    pub deadline_date: Option<DateTime<Utc>>,
    /// Set once on entering a completed status, cleared only by reopen
    pub closed_at: Option<DateTime<Utc>>,
    /// Set while the letter sits in the frozen status
    pub frozen_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    /// Opaque token granting the applicant read access
    pub portal_token: String,
}

impl Letter {
    /// Register a new letter
    pub fn create(
        number: u64,
        subject: impl Into<String>,
        body: impl Into<String>,
        org: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            number,
            subject: subject.into(),
            body: body.into(),
            org: org.into(),
            status: LetterStatus::default(),
            owner_id: None,
            watchers: Vec::new(),
            created_at: now,
            deadline_date: None,
            closed_at: None,
            frozen_at: None,
            updated_at: now,
            portal_token: Uuid::new_v4().simple().to_string(),
        }
    }

    /// Move the letter to a new status, maintaining the closure and freeze
    /// timestamps the SLA model depends on
    pub fn set_status(&mut self, status: LetterStatus) {
        if status.is_completed() && self.closed_at.is_none() {
            self.closed_at = Some(Utc::now());
        }
        match status {
            LetterStatus::Frozen => {
                if self.frozen_at.is_none() {
                    self.frozen_at = Some(Utc::now());
                }
            }
            _ => self.frozen_at = None,
        }
        self.status = status;
        self.touch();
    }

    /// Return a completed letter to work; the only path that clears `closed_at`
    pub fn reopen(&mut self) -> Result<()> {
        if !self.status.is_completed() {
            return Err(LetterError::NotCompleted(self.status));
        }
        self.status = LetterStatus::InProgress;
        self.closed_at = None;
        self.touch();
        Ok(())
    }

    pub fn assign(&mut self, owner_id: Uuid) {
        self.owner_id = Some(owner_id);
        if self.status == LetterStatus::NotReviewed {
            self.status = LetterStatus::Accepted;
        }
        self.touch();
    }

    pub fn set_deadline(&mut self, deadline: DateTime<Utc>) {
        self.deadline_date = Some(deadline);
        self.touch();
    }

    pub fn watch(&mut self, user_id: Uuid) {
        if !self.watchers.contains(&user_id) {
            self.watchers.push(user_id);
            self.touch();
        }
    }

    pub fn unwatch(&mut self, user_id: Uuid) {
        self.watchers.retain(|w| *w != user_id);
        self.touch();
    }

    /// SLA-relevant slice of this letter
    pub fn sla_input(&self) -> SlaInput {
        SlaInput {
            created_at: Some(self.created_at),
            deadline_date: self.deadline_date,
            status: self.status,
            closed_at: self.closed_at,
            frozen_at: self.frozen_at,
        }
    }

    fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// A comment on a letter
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub letter_id: Uuid,
    pub author_id: Uuid,
    pub body: String,
    /// Internal comments are hidden from the applicant portal
    pub is_internal: bool,
    pub created_at: DateTime<Utc>,
}

/// File attachment metadata; the bytes live with the external file store
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Attachment {
    pub id: Uuid,
    pub letter_id: Uuid,
    pub file_name: String,
    pub content_type: String,
    pub size_bytes: u64,
    pub uploaded_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// A staff member or applicant account
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Admin,
    #[default]
    Staff,
    Applicant,
}

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum LetterError {
    #[error("letter not found")]
    LetterNotFound,

    #[error("comment not found")]
    CommentNotFound,

    #[error("attachment not found")]
    AttachmentNotFound,

    #[error("user not found")]
    UserNotFound,

    #[error("cannot reopen a letter in status {0}")]
    NotCompleted(LetterStatus),
}

pub type Result<T> = std::result::Result<T, LetterError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_sets_closed_at_once() {
        let mut letter = Letter::create(1, "Water supply", "...", "Org A");
        letter.set_status(LetterStatus::Ready);
        let first = letter.closed_at;
        assert!(first.is_some());

        // Moving between completed statuses keeps the original closure time
        letter.set_status(LetterStatus::Done);
        assert_eq!(letter.closed_at, first);
    }

    #[test]
    fn test_reopen_clears_closed_at() {
        let mut letter = Letter::create(2, "Repair request", "...", "Org B");
        letter.set_status(LetterStatus::Done);
        letter.reopen().unwrap();
        assert_eq!(letter.status, LetterStatus::InProgress);
        assert!(letter.closed_at.is_none());
    }

    #[test]
    fn test_reopen_requires_completed_status() {
        let mut letter = Letter::create(3, "Inquiry", "...", "Org C");
        assert!(matches!(
            letter.reopen(),
            Err(LetterError::NotCompleted(LetterStatus::NotReviewed))
        ));
    }

    #[test]
    fn test_freeze_and_thaw_track_frozen_at() {
        let mut letter = Letter::create(4, "Dispute", "...", "Org D");
        letter.set_status(LetterStatus::Frozen);
        assert!(letter.frozen_at.is_some());
        letter.set_status(LetterStatus::InProgress);
        assert!(letter.frozen_at.is_none());
    }

    #[test]
    fn test_assignment_advances_new_letters() {
        let mut letter = Letter::create(5, "Request", "...", "Org E");
        letter.assign(Uuid::new_v4());
        assert_eq!(letter.status, LetterStatus::Accepted);
    }

    #[test]
    fn test_watchers_are_deduplicated() {
        let mut letter = Letter::create(6, "Notice", "...", "Org F");
        let user = Uuid::new_v4();
        letter.watch(user);
        letter.watch(user);
        assert_eq!(letter.watchers.len(), 1);
        letter.unwatch(user);
        assert!(letter.watchers.is_empty());
    }
}
