//! Side effects of domain events: journey awards and admin notifications.
//!
//! These never fail the request that triggered them. Errors are logged and
//! dropped.

use chrono::{DateTime, Duration, Utc};
use database::{
    admin_notification, journey, user, MilestoneKind, NotificationDraft, NotificationPriority,
    NotificationType, User, UserRole,
};
use serde_json::json;
use tracing::{info, warn};

use crate::error::Result;
use crate::state::AppState;

/// Trials ending within this window get a `trial_expiring` notification.
pub const TRIAL_EXPIRING_WINDOW_DAYS: i64 = 3;

/// Complete a journey milestone for `user_id`, logging any failure.
pub async fn award(state: &AppState, user_id: i64, kind: MilestoneKind) {
    let result = journey::complete_milestone(
        state.db.pool(),
        user_id,
        kind,
        &state.settings.stage_thresholds,
        Utc::now(),
    )
    .await;

    if let Err(e) = result {
        warn!(user_id, milestone = kind.as_str(), error = %e, "Failed to award milestone");
    }
}

async fn notify(state: &AppState, draft: NotificationDraft) {
    let kind = draft.notification_type;
    let result =
        admin_notification::create_notification(state.db.pool(), &draft, Utc::now()).await;
    if let Err(e) = result {
        warn!(kind = ?kind, error = %e, "Failed to record admin notification");
    }
}

/// A new account was created.
pub async fn user_registered(state: &AppState, user: &User) {
    award(state, user.id, MilestoneKind::AccountCreated).await;

    notify(
        state,
        NotificationDraft::new(
            NotificationType::UserRegistration,
            "New User",
            format!("{} registered", user.name),
            NotificationPriority::Medium,
        )
        .about(user)
        .with_data(json!({ "role": user.role })),
    )
    .await;

    if let Some(ends_at) = user.trial_ends_at {
        notify(
            state,
            NotificationDraft::new(
                NotificationType::TrialStarted,
                "Trial Started",
                format!(
                    "{} started a trial ending {}",
                    user.name,
                    ends_at.format("%b %-d, %Y")
                ),
                NotificationPriority::Low,
            )
            .about(user)
            .with_data(json!({ "trialEndsAt": ends_at })),
        )
        .await;
    }
}

/// A user signed in.
pub async fn user_logged_in(state: &AppState, user: &User) {
    notify(
        state,
        NotificationDraft::new(
            NotificationType::UserLogin,
            "User Login",
            format!("{} signed in", user.name),
            NotificationPriority::Low,
        )
        .about(user),
    )
    .await;
}

/// An admin changed a user's role.
pub async fn role_changed(state: &AppState, user: &User, previous: UserRole, by: &User) {
    notify(
        state,
        NotificationDraft::new(
            NotificationType::RoleChange,
            "Role Changed",
            format!(
                "{} changed {}'s role from {} to {}",
                by.name,
                user.name,
                previous.as_str(),
                user.role.as_str()
            ),
            NotificationPriority::High,
        )
        .about(user)
        .with_data(json!({
            "previousRole": previous,
            "newRole": user.role,
            "changedBy": by.id,
        })),
    )
    .await;
}

/// Record `trial_expiring` and `trial_expired` notifications that are due.
///
/// Each user gets at most one notification of each kind. Returns how many
/// were created.
pub async fn sweep_trials(state: &AppState, now: DateTime<Utc>) -> Result<usize> {
    let pool = state.db.pool();
    let cutoff = now + Duration::days(TRIAL_EXPIRING_WINDOW_DAYS);
    let mut created = 0;

    for user in user::list_trials_ending_before(pool, cutoff).await? {
        let Some(ends_at) = user.trial_ends_at else {
            continue;
        };

        let draft = if ends_at <= now {
            if admin_notification::exists_for_user(pool, user.id, NotificationType::TrialExpired)
                .await?
            {
                continue;
            }
            NotificationDraft::new(
                NotificationType::TrialExpired,
                "Trial Expired",
                format!("{}'s trial has expired", user.name),
                NotificationPriority::High,
            )
        } else {
            if admin_notification::exists_for_user(pool, user.id, NotificationType::TrialExpiring)
                .await?
            {
                continue;
            }
            let hours_left = (ends_at - now).num_hours();
            NotificationDraft::new(
                NotificationType::TrialExpiring,
                "Trial Expiring",
                format!(
                    "{}'s trial ends {} ({} hours left)",
                    user.name,
                    ends_at.format("%b %-d, %Y"),
                    hours_left
                ),
                NotificationPriority::Medium,
            )
        };

        admin_notification::create_notification(
            pool,
            &draft.about(&user).with_data(json!({ "trialEndsAt": ends_at })),
            now,
        )
        .await?;
        created += 1;
    }

    if created > 0 {
        info!(created, "Recorded trial notifications");
    }

    Ok(created)
}
