//! SLA state classification
//!
//! Pure read-side projection over a letter's timestamps and status. Never
//! reads the system clock: `now` is always an argument.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::{LetterStatus, StatusCategory};
use crate::workdays::working_days_between;

/// Letters due within this many working days count as urgent
///
/// Shared by the classifier and the overdue/urgent query filters so a letter
/// can never show as urgent in one place and ordinary in the other. Boundary
/// is inclusive: exactly zero days left means "due today", still `DueSoon`.
pub const DUE_SOON_WORKING_DAYS: i64 = 2;

/// Discrete SLA state of a letter
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlaState {
    NoData,
    CompletedOnTime,
    CompletedLate,
    Paused,
    Overdue,
    DueSoon,
    OnTrack,
}

/// SLA-relevant slice of a letter
///
/// Timestamps are optional because the system commits to an explicit
/// `NoData` outcome, not an error, when either anchor date is missing.
#[derive(Clone, Copy, Debug, Default)]
pub struct SlaInput {
    pub created_at: Option<DateTime<Utc>>,
    pub deadline_date: Option<DateTime<Utc>>,
    pub status: LetterStatus,
    pub closed_at: Option<DateTime<Utc>>,
    pub frozen_at: Option<DateTime<Utc>>,
}

/// Classifier output: the state plus the day counts the projector needs
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SlaReport {
    pub state: SlaState,
    /// Working days until the deadline; negative when past it. Only present
    /// for letters still in an active status.
    pub days_left: Option<i64>,
    pub elapsed_days: i64,
    pub total_days: i64,
    /// Pause duration in working days, when the freeze timestamp is known
    pub frozen_days: Option<i64>,
}

impl SlaReport {
    fn no_data() -> Self {
        Self {
            state: SlaState::NoData,
            days_left: None,
            elapsed_days: 0,
            total_days: 0,
            frozen_days: None,
        }
    }
}

/// Classify a letter's SLA state at the given instant
///
/// Decision order: missing anchor dates win, then completed statuses, then
/// paused statuses, then the deadline distance for active letters.
pub fn classify(input: &SlaInput, now: DateTime<Utc>) -> SlaReport {
    let (Some(created), Some(deadline)) = (input.created_at, input.deadline_date) else {
        return SlaReport::no_data();
    };
    let created = created.date_naive();
    let deadline = deadline.date_naive();

    // Floor of one working day: a same-day deadline still has a window
    let total_days = working_days_between(created, deadline).abs().max(1);

    match input.status.category() {
        StatusCategory::Completed => {
            // Elapsed time freezes at closure, never at "now"
            let end = input.closed_at.unwrap_or(now).date_naive();
            let state = if end <= deadline {
                SlaState::CompletedOnTime
            } else {
                SlaState::CompletedLate
            };
            SlaReport {
                state,
                days_left: None,
                elapsed_days: working_days_between(created, end).clamp(0, total_days),
                total_days,
                frozen_days: None,
            }
        }
        StatusCategory::Paused => {
            // A paused letter is never overdue, however far past the deadline
            let frozen_days = input
                .frozen_at
                .map(|frozen| working_days_between(frozen.date_naive(), now.date_naive()).abs());
            SlaReport {
                state: SlaState::Paused,
                days_left: None,
                elapsed_days: working_days_between(created, now.date_naive()).clamp(0, total_days),
                total_days,
                frozen_days,
            }
        }
        StatusCategory::Active => {
            let days_left = working_days_between(now.date_naive(), deadline);
            let state = if days_left < 0 {
                SlaState::Overdue
            } else if days_left <= DUE_SOON_WORKING_DAYS {
                SlaState::DueSoon
            } else {
                SlaState::OnTrack
            };
            SlaReport {
                state,
                days_left: Some(days_left),
                elapsed_days: working_days_between(created, now.date_naive()).clamp(0, total_days),
                total_days,
                frozen_days: None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    fn input(status: LetterStatus) -> SlaInput {
        SlaInput {
            // 2024-01-01 is a Monday, 2024-01-05 a Friday
            created_at: Some(at(2024, 1, 1)),
            deadline_date: Some(at(2024, 1, 5)),
            status,
            closed_at: None,
            frozen_at: None,
        }
    }

    #[test]
    fn test_missing_dates_yield_no_data() {
        let mut no_deadline = input(LetterStatus::InProgress);
        no_deadline.deadline_date = None;
        assert_eq!(classify(&no_deadline, at(2024, 1, 3)).state, SlaState::NoData);

        let mut no_created = input(LetterStatus::InProgress);
        no_created.created_at = None;
        let report = classify(&no_created, at(2024, 1, 3));
        assert_eq!(report.state, SlaState::NoData);
        assert_eq!(report.elapsed_days, 0);
    }

    #[test]
    fn test_midweek_letter_is_due_soon() {
        // Wednesday: Thursday and Friday remain, boundary is inclusive
        let report = classify(&input(LetterStatus::InProgress), at(2024, 1, 3));
        assert_eq!(report.total_days, 4);
        assert_eq!(report.days_left, Some(2));
        assert_eq!(report.state, SlaState::DueSoon);
    }

    #[test]
    fn test_due_today_is_due_soon_not_overdue() {
        let report = classify(&input(LetterStatus::InProgress), at(2024, 1, 5));
        assert_eq!(report.days_left, Some(0));
        assert_eq!(report.state, SlaState::DueSoon);
    }

    #[test]
    fn test_one_working_day_past_deadline() {
        // Monday after the Friday deadline; the weekend does not count
        let report = classify(&input(LetterStatus::InProgress), at(2024, 1, 8));
        assert_eq!(report.days_left, Some(-1));
        assert_eq!(report.state, SlaState::Overdue);
    }

    #[test]
    fn test_on_track_beyond_the_boundary() {
        // Monday morning, four working days left
        let report = classify(&input(LetterStatus::InProgress), at(2024, 1, 1));
        assert_eq!(report.days_left, Some(4));
        assert_eq!(report.state, SlaState::OnTrack);
    }

    #[test]
    fn test_frozen_letter_is_never_overdue() {
        let mut frozen = input(LetterStatus::Frozen);
        frozen.frozen_at = Some(at(2024, 1, 4));
        // Well past the deadline
        let report = classify(&frozen, at(2024, 1, 10));
        assert_eq!(report.state, SlaState::Paused);
        // Thu 4th -> Wed 10th: Fri, Mon, Tue, Wed
        assert_eq!(report.frozen_days, Some(4));
        // Snapshot never exceeds the original window
        assert_eq!(report.elapsed_days, report.total_days);
    }

    #[test]
    fn test_rejected_also_suppresses_overdue() {
        let report = classify(&input(LetterStatus::Rejected), at(2024, 2, 1));
        assert_eq!(report.state, SlaState::Paused);
        assert_eq!(report.frozen_days, None);
    }

    #[test]
    fn test_completed_on_time_vs_late() {
        let mut done = input(LetterStatus::Done);
        done.closed_at = Some(at(2024, 1, 4));
        assert_eq!(classify(&done, at(2024, 1, 20)).state, SlaState::CompletedOnTime);

        done.closed_at = Some(at(2024, 1, 9));
        let report = classify(&done, at(2024, 1, 20));
        assert_eq!(report.state, SlaState::CompletedLate);
        // Elapsed froze at closure and is capped at the window
        assert_eq!(report.elapsed_days, report.total_days);
    }

    #[test]
    fn test_closed_on_deadline_day_is_on_time() {
        let mut done = input(LetterStatus::Ready);
        done.closed_at = Some(at(2024, 1, 5));
        assert_eq!(classify(&done, at(2024, 1, 20)).state, SlaState::CompletedOnTime);
    }

    #[test]
    fn test_completed_without_closed_at_falls_back_to_now() {
        let done = input(LetterStatus::Processed);
        assert_eq!(classify(&done, at(2024, 1, 3)).state, SlaState::CompletedOnTime);
        assert_eq!(classify(&done, at(2024, 1, 9)).state, SlaState::CompletedLate);
    }

    #[test]
    fn test_same_day_deadline_has_floor_of_one() {
        let mut same_day = input(LetterStatus::InProgress);
        same_day.deadline_date = Some(at(2024, 1, 1));
        let report = classify(&same_day, at(2024, 1, 1));
        assert_eq!(report.total_days, 1);
        assert_eq!(report.state, SlaState::DueSoon);
    }
}
