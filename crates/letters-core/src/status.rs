//! Letter status lifecycle

use serde::{Deserialize, Serialize};

/// Workflow status of a letter
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LetterStatus {
    #[default]
    NotReviewed,
    Accepted,
    InProgress,
    Clarification,
    Frozen,
    Rejected,
    Ready,
    Processed,
    Done,
}

/// SLA-relevant grouping of statuses
///
/// Completed statuses freeze elapsed time at `closed_at`; paused statuses
/// suppress the overdue classification entirely.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatusCategory {
    Active,
    Paused,
    Completed,
}

impl LetterStatus {
    /// SLA category of this status
    ///
    /// Exhaustive on purpose: a newly added status must be placed in a
    /// category here before the crate compiles again.
    pub fn category(self) -> StatusCategory {
        match self {
            Self::NotReviewed | Self::Accepted | Self::InProgress | Self::Clarification => {
                StatusCategory::Active
            }
            Self::Frozen | Self::Rejected => StatusCategory::Paused,
            Self::Ready | Self::Processed | Self::Done => StatusCategory::Completed,
        }
    }

    /// Terminal for SLA purposes
    pub fn is_completed(self) -> bool {
        self.category() == StatusCategory::Completed
    }

    /// Suppresses overdue classification
    pub fn is_paused(self) -> bool {
        self.category() == StatusCategory::Paused
    }
}

impl std::fmt::Display for LetterStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::NotReviewed => "not_reviewed",
            Self::Accepted => "accepted",
            Self::InProgress => "in_progress",
            Self::Clarification => "clarification",
            Self::Frozen => "frozen",
            Self::Rejected => "rejected",
            Self::Ready => "ready",
            Self::Processed => "processed",
            Self::Done => "done",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for LetterStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_reviewed" => Ok(Self::NotReviewed),
            "accepted" => Ok(Self::Accepted),
            "in_progress" => Ok(Self::InProgress),
            "clarification" => Ok(Self::Clarification),
            "frozen" => Ok(Self::Frozen),
            "rejected" => Ok(Self::Rejected),
            "ready" => Ok(Self::Ready),
            "processed" => Ok(Self::Processed),
            "done" => Ok(Self::Done),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

/// Parse error for status names
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl std::fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown letter status: {}", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(LetterStatus::InProgress.category(), StatusCategory::Active);
        assert_eq!(LetterStatus::Frozen.category(), StatusCategory::Paused);
        assert_eq!(LetterStatus::Rejected.category(), StatusCategory::Paused);
        assert!(LetterStatus::Ready.is_completed());
        assert!(LetterStatus::Done.is_completed());
        assert!(LetterStatus::Processed.is_completed());
        assert!(!LetterStatus::Clarification.is_completed());
    }

    #[test]
    fn test_serde_names_are_stable() {
        let json = serde_json::to_string(&LetterStatus::NotReviewed).unwrap();
        assert_eq!(json, "\"not_reviewed\"");
        let back: LetterStatus = serde_json::from_str("\"frozen\"").unwrap();
        assert_eq!(back, LetterStatus::Frozen);
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for status in [
            LetterStatus::NotReviewed,
            LetterStatus::Accepted,
            LetterStatus::InProgress,
            LetterStatus::Clarification,
            LetterStatus::Frozen,
            LetterStatus::Rejected,
            LetterStatus::Ready,
            LetterStatus::Processed,
            LetterStatus::Done,
        ] {
            assert_eq!(status.to_string().parse::<LetterStatus>(), Ok(status));
        }
        assert!("solved".parse::<LetterStatus>().is_err());
    }
}
