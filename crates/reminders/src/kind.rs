//! Reminder buckets and their presentation.

use serde::Serialize;

/// The bucket a follow-up falls into, checked in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    /// Due on a calendar day before today.
    Overdue,
    /// Due today, whether or not the time has passed.
    DueToday,
    /// Due tomorrow.
    DueTomorrow,
    /// Due two to seven days from today.
    Upcoming,
}

/// Reminder urgency. Ordered so that `High` sorts greatest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderPriority {
    Low,
    Medium,
    High,
}

/// How a reminder is drawn in the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReminderStyle {
    pub color: &'static str,
    pub icon: &'static str,
}

impl ReminderKind {
    /// Stable identifier, also used as the reminder id prefix.
    pub fn as_str(self) -> &'static str {
        match self {
            ReminderKind::Overdue => "overdue",
            ReminderKind::DueToday => "due_today",
            ReminderKind::DueTomorrow => "due_tomorrow",
            ReminderKind::Upcoming => "upcoming",
        }
    }

    pub fn priority(self) -> ReminderPriority {
        match self {
            ReminderKind::Overdue | ReminderKind::DueToday => ReminderPriority::High,
            ReminderKind::DueTomorrow => ReminderPriority::Medium,
            ReminderKind::Upcoming => ReminderPriority::Low,
        }
    }

    pub fn style(self) -> ReminderStyle {
        match self {
            ReminderKind::Overdue => ReminderStyle {
                color: "red",
                icon: "alert-triangle",
            },
            ReminderKind::DueToday => ReminderStyle {
                color: "orange",
                icon: "clock",
            },
            ReminderKind::DueTomorrow => ReminderStyle {
                color: "yellow",
                icon: "calendar",
            },
            ReminderKind::Upcoming => ReminderStyle {
                color: "blue",
                icon: "calendar-days",
            },
        }
    }

    /// Short label used as the reminder title prefix.
    pub fn label(self) -> &'static str {
        match self {
            ReminderKind::Overdue => "Overdue",
            ReminderKind::DueToday => "Due today",
            ReminderKind::DueTomorrow => "Due tomorrow",
            ReminderKind::Upcoming => "Upcoming",
        }
    }
}
