//! Follow-up reminder derivation.
//!
//! Reminders are not stored. They are recomputed on every request from the
//! open follow-ups and the current time, so they always agree with the
//! latest data:
//!
//! - [`classify`] - place a due date into a [`ReminderKind`] bucket
//! - [`derive_reminders`] - build the sorted reminder list for a user
//! - [`ReminderSummary`] - per-bucket counts for dashboards
//!
//! # Example
//!
//! ```rust
//! use chrono::{FixedOffset, TimeZone, Utc};
//! use reminders::{classify, ReminderKind};
//!
//! let now = FixedOffset::east_opt(0).unwrap().with_ymd_and_hms(2025, 1, 12, 8, 0, 0).unwrap();
//! let due = Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap();
//! assert_eq!(classify(due, &now), Some(ReminderKind::Overdue));
//! ```

mod derive;
mod kind;

pub use derive::{classify, derive_reminders, Reminder, ReminderSummary, UPCOMING_WINDOW_DAYS};
pub use kind::{ReminderKind, ReminderPriority, ReminderStyle};
