//! Display projection of an SLA report
//!
//! Converts raw day counts into a bounded percentage, a human label, and a
//! display tone. All percentages are clamped to [0, 100] on every branch.

use serde::{Deserialize, Serialize};

use crate::sla::{SlaReport, SlaState};

/// Display tone attached to a progress value
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tone {
    Neutral,
    Success,
    Warning,
    Danger,
    Muted,
    Info,
}

/// Projected progress for display
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Progress {
    pub percent: u8,
    pub label: String,
    pub tone: Tone,
}

/// Word forms for day-count labels
///
/// Three forms cover the Russian pluralization rule the original interface
/// used (1 день / 2 дня / 5 дней); English collapses `few` and `many`.
#[derive(Clone, Copy, Debug)]
pub struct PluralForms {
    pub one: &'static str,
    pub few: &'static str,
    pub many: &'static str,
}

/// English day-word forms
pub const WORKING_DAYS_EN: PluralForms = PluralForms {
    one: "working day",
    few: "working days",
    many: "working days",
};

/// Pick the grammatical form for a count
pub fn plural(n: i64, forms: &PluralForms) -> &'static str {
    let n = n.abs();
    match (n % 100, n % 10) {
        (11..=14, _) => forms.many,
        (_, 1) => forms.one,
        (_, 2..=4) => forms.few,
        _ => forms.many,
    }
}

fn ratio_percent(elapsed: i64, total: i64) -> u8 {
    if total <= 0 {
        return 0;
    }
    let percent = elapsed as f64 / total as f64 * 100.0;
    percent.clamp(0.0, 100.0).round() as u8
}

/// Project a classifier report into a progress bar value
pub fn project(report: &SlaReport) -> Progress {
    let days = |n: i64| format!("{} {}", n, plural(n, &WORKING_DAYS_EN));
    match report.state {
        SlaState::NoData => Progress {
            percent: 0,
            label: "no deadline data".into(),
            tone: Tone::Neutral,
        },
        SlaState::CompletedOnTime => Progress {
            percent: ratio_percent(report.elapsed_days, report.total_days),
            label: "completed on time".into(),
            tone: Tone::Success,
        },
        SlaState::CompletedLate => Progress {
            percent: ratio_percent(report.elapsed_days, report.total_days),
            label: "completed late".into(),
            tone: Tone::Warning,
        },
        SlaState::Paused => Progress {
            percent: ratio_percent(report.elapsed_days, report.total_days),
            label: match report.frozen_days {
                Some(n) => format!("paused for {}", days(n)),
                None => "paused".into(),
            },
            tone: Tone::Muted,
        },
        // Breach is always rendered as a full bar
        SlaState::Overdue => {
            let magnitude = report.days_left.map(|d| -d).unwrap_or(0).max(1);
            Progress {
                percent: 100,
                label: format!("overdue by {}", days(magnitude)),
                tone: Tone::Danger,
            }
        }
        SlaState::DueSoon => {
            let left = report.days_left.unwrap_or(0);
            Progress {
                percent: ratio_percent(report.elapsed_days, report.total_days),
                label: if left == 0 {
                    "due today".into()
                } else {
                    format!("due in {}", days(left))
                },
                tone: Tone::Warning,
            }
        }
        SlaState::OnTrack => Progress {
            percent: ratio_percent(report.elapsed_days, report.total_days),
            label: "on track".into(),
            tone: Tone::Info,
        },
    }
}
