//! Bucket classification and reminder list construction.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset, Utc};
use database::{FollowUp, FollowUpStatus};
use serde::Serialize;

use crate::kind::{ReminderKind, ReminderPriority, ReminderStyle};

/// Follow-ups due further out than this many days produce no reminder.
pub const UPCOMING_WINDOW_DAYS: i64 = 7;

/// A derived, never-stored reminder for one follow-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    /// `"<bucket>-<followUpId>"`; identical across recomputations.
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ReminderKind,
    pub title: String,
    pub message: String,
    pub follow_up_id: i64,
    pub client_id: i64,
    pub client_name: String,
    pub due_date: DateTime<Utc>,
    pub priority: ReminderPriority,
    #[serde(flatten)]
    pub style: ReminderStyle,
}

/// Place a due date into a bucket relative to `now`.
///
/// Calendar days are taken in `now`'s offset. Returns `None` for anything
/// more than [`UPCOMING_WINDOW_DAYS`] days out.
pub fn classify(due: DateTime<Utc>, now: &DateTime<FixedOffset>) -> Option<ReminderKind> {
    let today = now.date_naive();
    let due_day = due.with_timezone(&now.timezone()).date_naive();

    match (due_day - today).num_days() {
        days if days < 0 => Some(ReminderKind::Overdue),
        0 => Some(ReminderKind::DueToday),
        1 => Some(ReminderKind::DueTomorrow),
        2..=UPCOMING_WINDOW_DAYS => Some(ReminderKind::Upcoming),
        _ => None,
    }
}

/// Build the reminder list for a set of follow-ups.
///
/// Completed follow-ups are skipped whatever their date. The stored
/// `overdue` status is ignored; only the due date decides the bucket.
/// Follow-ups whose client is missing from `client_names` are dropped.
///
/// The result is ordered by priority (high first), then due date, then
/// follow-up id.
pub fn derive_reminders(
    follow_ups: &[FollowUp],
    client_names: &HashMap<i64, String>,
    now: &DateTime<FixedOffset>,
) -> Vec<Reminder> {
    let mut reminders: Vec<Reminder> = follow_ups
        .iter()
        .filter(|f| f.status != FollowUpStatus::Completed)
        .filter_map(|f| {
            let kind = classify(f.due_date, now)?;
            let client_name = client_names.get(&f.client_id)?;
            Some(build(f, kind, client_name, now))
        })
        .collect();

    reminders.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then(a.due_date.cmp(&b.due_date))
            .then(a.follow_up_id.cmp(&b.follow_up_id))
    });

    reminders
}

fn build(
    follow_up: &FollowUp,
    kind: ReminderKind,
    client_name: &str,
    now: &DateTime<FixedOffset>,
) -> Reminder {
    let local_due = follow_up.due_date.with_timezone(&now.timezone());
    let date = local_due.format("%b %-d, %Y");
    let days = (local_due.date_naive() - now.date_naive()).num_days();
    let subject = format!("{} with {}", follow_up.title, client_name);

    let message = match kind {
        ReminderKind::Overdue => {
            let late = -days;
            format!(
                "{} was due {} ({} day{} overdue)",
                subject,
                date,
                late,
                if late == 1 { "" } else { "s" }
            )
        }
        ReminderKind::DueToday => {
            format!("{} is due today at {}", subject, local_due.format("%H:%M"))
        }
        ReminderKind::DueTomorrow => format!("{} is due tomorrow, {}", subject, date),
        ReminderKind::Upcoming => format!("{} is due in {} days, on {}", subject, days, date),
    };

    Reminder {
        id: format!("{}-{}", kind.as_str(), follow_up.id),
        kind,
        title: format!("{}: {}", kind.label(), follow_up.title),
        message,
        follow_up_id: follow_up.id,
        client_id: follow_up.client_id,
        client_name: client_name.to_string(),
        due_date: follow_up.due_date,
        priority: kind.priority(),
        style: kind.style(),
    }
}

/// Reminder counts per bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderSummary {
    pub overdue: usize,
    pub due_today: usize,
    pub due_tomorrow: usize,
    pub upcoming: usize,
}

impl ReminderSummary {
    pub fn from_reminders(reminders: &[Reminder]) -> Self {
        reminders
            .iter()
            .fold(Self::default(), |mut summary, reminder| {
                match reminder.kind {
                    ReminderKind::Overdue => summary.overdue += 1,
                    ReminderKind::DueToday => summary.due_today += 1,
                    ReminderKind::DueTomorrow => summary.due_tomorrow += 1,
                    ReminderKind::Upcoming => summary.upcoming += 1,
                }
                summary
            })
    }

    pub fn total(&self) -> usize {
        self.overdue + self.due_today + self.due_tomorrow + self.upcoming
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use database::Priority;

    fn utc_offset() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<FixedOffset> {
        utc_offset().with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
    }

    fn follow_up(id: i64, client_id: i64, due: DateTime<Utc>) -> FollowUp {
        FollowUp {
            id,
            client_id,
            title: "Renewal call".to_string(),
            description: None,
            due_date: due,
            status: FollowUpStatus::Pending,
            priority: Priority::Medium,
            created_at: due - Duration::days(30),
            completed_at: None,
        }
    }

    fn names() -> HashMap<i64, String> {
        [(1, "Acme Corp".to_string()), (2, "Globex".to_string())].into()
    }

    #[test]
    fn test_overdue_example() {
        let now = at(2025, 1, 12, 8, 0);
        let due = Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap();

        let reminders = derive_reminders(&[follow_up(7, 1, due)], &names(), &now);
        assert_eq!(reminders.len(), 1);

        let r = &reminders[0];
        assert_eq!(r.kind, ReminderKind::Overdue);
        assert_eq!(r.priority, ReminderPriority::High);
        assert_eq!(r.id, "overdue-7");
        assert!(r.message.contains("Acme Corp"));
        assert!(r.message.contains("Jan 10, 2025"));
        assert!(r.message.contains("2 days overdue"));
        assert_eq!(r.style.color, "red");
    }

    #[test]
    fn test_bucket_boundaries() {
        let now = at(2025, 3, 10, 12, 0);
        let day = |d: u32, h: u32| Utc.with_ymd_and_hms(2025, 3, d, h, 0, 0).unwrap();

        assert_eq!(classify(day(9, 23), &now), Some(ReminderKind::Overdue));
        // Earlier today is still "today", not overdue.
        assert_eq!(classify(day(10, 0), &now), Some(ReminderKind::DueToday));
        assert_eq!(classify(day(10, 23), &now), Some(ReminderKind::DueToday));
        assert_eq!(classify(day(11, 0), &now), Some(ReminderKind::DueTomorrow));
        assert_eq!(classify(day(12, 0), &now), Some(ReminderKind::Upcoming));
        assert_eq!(classify(day(17, 23), &now), Some(ReminderKind::Upcoming));
        assert_eq!(classify(day(18, 0), &now), None);
    }

    #[test]
    fn test_calendar_day_uses_offset() {
        // 23:30 UTC on the 10th is already the 11th at UTC+2.
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        let now = plus_two.with_ymd_and_hms(2025, 3, 11, 9, 0, 0).unwrap();
        let due = Utc.with_ymd_and_hms(2025, 3, 10, 23, 30, 0).unwrap();
        assert_eq!(classify(due, &now), Some(ReminderKind::DueToday));

        let now_utc = at(2025, 3, 11, 7, 0);
        assert_eq!(classify(due, &now_utc), Some(ReminderKind::Overdue));
    }

    #[test]
    fn test_completed_and_far_future_are_excluded() {
        let now = at(2025, 1, 12, 8, 0);
        let mut done = follow_up(1, 1, Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap());
        done.status = FollowUpStatus::Completed;
        let far = follow_up(2, 1, Utc.with_ymd_and_hms(2025, 2, 1, 9, 0, 0).unwrap());

        assert!(derive_reminders(&[done, far], &names(), &now).is_empty());
    }

    #[test]
    fn test_stored_overdue_status_is_not_trusted() {
        let now = at(2025, 1, 12, 8, 0);
        let mut f = follow_up(3, 1, Utc.with_ymd_and_hms(2025, 1, 13, 9, 0, 0).unwrap());
        f.status = FollowUpStatus::Overdue;

        let reminders = derive_reminders(&[f], &names(), &now);
        assert_eq!(reminders[0].kind, ReminderKind::DueTomorrow);
        assert_eq!(reminders[0].id, "due_tomorrow-3");
    }

    #[test]
    fn test_missing_client_is_skipped() {
        let now = at(2025, 1, 12, 8, 0);
        let f = follow_up(4, 99, Utc.with_ymd_and_hms(2025, 1, 12, 9, 0, 0).unwrap());
        assert!(derive_reminders(&[f], &names(), &now).is_empty());
    }

    #[test]
    fn test_ordering_is_total() {
        let now = at(2025, 1, 12, 8, 0);
        let same_time = Utc.with_ymd_and_hms(2025, 1, 12, 15, 0, 0).unwrap();
        let follow_ups = vec![
            follow_up(10, 2, Utc.with_ymd_and_hms(2025, 1, 16, 9, 0, 0).unwrap()),
            follow_up(11, 1, Utc.with_ymd_and_hms(2025, 1, 13, 9, 0, 0).unwrap()),
            follow_up(12, 1, same_time),
            follow_up(5, 2, same_time),
            follow_up(13, 1, Utc.with_ymd_and_hms(2025, 1, 3, 9, 0, 0).unwrap()),
        ];

        let ids: Vec<String> = derive_reminders(&follow_ups, &names(), &now)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(
            ids,
            vec![
                "overdue-13",
                "due_today-5",
                "due_today-12",
                "due_tomorrow-11",
                "upcoming-10",
            ]
        );

        // Input order does not matter.
        let mut reversed = follow_ups.clone();
        reversed.reverse();
        let again: Vec<String> = derive_reminders(&reversed, &names(), &now)
            .into_iter()
            .map(|r| r.id)
            .collect();
        assert_eq!(ids, again);
    }

    #[test]
    fn test_messages() {
        let now = at(2025, 1, 12, 8, 0);
        let follow_ups = vec![
            follow_up(1, 1, Utc.with_ymd_and_hms(2025, 1, 12, 15, 30, 0).unwrap()),
            follow_up(2, 1, Utc.with_ymd_and_hms(2025, 1, 13, 9, 0, 0).unwrap()),
            follow_up(3, 1, Utc.with_ymd_and_hms(2025, 1, 15, 9, 0, 0).unwrap()),
            follow_up(4, 1, Utc.with_ymd_and_hms(2025, 1, 11, 9, 0, 0).unwrap()),
        ];
        let reminders = derive_reminders(&follow_ups, &names(), &now);
        let by_id = |id: &str| reminders.iter().find(|r| r.id == id).unwrap();

        assert_eq!(
            by_id("due_today-1").message,
            "Renewal call with Acme Corp is due today at 15:30"
        );
        assert_eq!(
            by_id("due_tomorrow-2").message,
            "Renewal call with Acme Corp is due tomorrow, Jan 13, 2025"
        );
        assert_eq!(
            by_id("upcoming-3").message,
            "Renewal call with Acme Corp is due in 3 days, on Jan 15, 2025"
        );
        assert_eq!(
            by_id("overdue-4").message,
            "Renewal call with Acme Corp was due Jan 11, 2025 (1 day overdue)"
        );
        assert_eq!(by_id("overdue-4").title, "Overdue: Renewal call");
    }

    #[test]
    fn test_summary() {
        let now = at(2025, 1, 12, 8, 0);
        let follow_ups = vec![
            follow_up(1, 1, Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap()),
            follow_up(2, 1, Utc.with_ymd_and_hms(2025, 1, 2, 9, 0, 0).unwrap()),
            follow_up(3, 1, Utc.with_ymd_and_hms(2025, 1, 14, 9, 0, 0).unwrap()),
        ];
        let summary =
            ReminderSummary::from_reminders(&derive_reminders(&follow_ups, &names(), &now));
        assert_eq!(
            summary,
            ReminderSummary {
                overdue: 2,
                due_today: 0,
                due_tomorrow: 0,
                upcoming: 1,
            }
        );
        assert_eq!(summary.total(), 3);
    }

    #[test]
    fn test_serialized_shape() {
        let now = at(2025, 1, 12, 8, 0);
        let f = follow_up(9, 1, Utc.with_ymd_and_hms(2025, 1, 12, 9, 0, 0).unwrap());
        let reminders = derive_reminders(&[f], &names(), &now);
        let json = serde_json::to_value(&reminders[0]).unwrap();

        assert_eq!(json["id"], "due_today-9");
        assert_eq!(json["type"], "due_today");
        assert_eq!(json["priority"], "high");
        assert_eq!(json["followUpId"], 9);
        assert_eq!(json["color"], "orange");
        assert_eq!(json["icon"], "clock");
    }
}
