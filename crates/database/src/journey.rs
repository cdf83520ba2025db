//! Journey progress tracking.
//!
//! A milestone moves from incomplete to completed exactly once. Completing it
//! awards its points, bumps the completed count, recomputes the level
//! (`total_points / 50 + 1`) and the stage, and stamps the activity time. All
//! of that happens in one transaction, with increments done in SQL so two
//! concurrent completions for the same user cannot lose an update.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::{DatabaseError, Result};
use crate::models::{
    JourneyMilestone, JourneyProgress, JourneyStage, MilestoneCategory, MilestoneKind,
};

/// Points needed per level.
pub const POINTS_PER_LEVEL: i64 = 50;

/// Level reached with `total_points` points.
pub fn level_for_points(total_points: i64) -> i64 {
    total_points.max(0) / POINTS_PER_LEVEL + 1
}

/// Static description of a milestone kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MilestoneDefinition {
    pub kind: MilestoneKind,
    pub title: &'static str,
    pub description: &'static str,
    pub points: i64,
    pub category: MilestoneCategory,
}

impl MilestoneKind {
    pub const ALL: [MilestoneKind; 8] = [
        MilestoneKind::AccountCreated,
        MilestoneKind::FirstClient,
        MilestoneKind::FirstFollowUp,
        MilestoneKind::FirstInteraction,
        MilestoneKind::FirstEmail,
        MilestoneKind::FollowUpCompleted,
        MilestoneKind::TenClients,
        MilestoneKind::FirstExport,
    ];

    pub fn definition(self) -> MilestoneDefinition {
        let (title, description, points, category) = match self {
            MilestoneKind::AccountCreated => (
                "Welcome aboard",
                "Create your Tracker Suite account",
                10,
                MilestoneCategory::GettingStarted,
            ),
            MilestoneKind::FirstClient => (
                "First client",
                "Add your first client record",
                20,
                MilestoneCategory::Clients,
            ),
            MilestoneKind::FirstFollowUp => (
                "Plan ahead",
                "Schedule your first follow-up",
                15,
                MilestoneCategory::FollowUps,
            ),
            MilestoneKind::FirstInteraction => (
                "Keep in touch",
                "Log your first interaction",
                15,
                MilestoneCategory::Communication,
            ),
            MilestoneKind::FirstEmail => (
                "Inbox zero hero",
                "Send your first email from Tracker Suite",
                20,
                MilestoneCategory::Communication,
            ),
            MilestoneKind::FollowUpCompleted => (
                "Closing the loop",
                "Complete a follow-up",
                25,
                MilestoneCategory::FollowUps,
            ),
            MilestoneKind::TenClients => (
                "Growing book",
                "Manage ten clients",
                50,
                MilestoneCategory::Clients,
            ),
            MilestoneKind::FirstExport => (
                "Data in hand",
                "Export your clients or follow-ups",
                15,
                MilestoneCategory::Insights,
            ),
        };

        MilestoneDefinition {
            kind: self,
            title,
            description,
            points,
            category,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MilestoneKind::AccountCreated => "account_created",
            MilestoneKind::FirstClient => "first_client",
            MilestoneKind::FirstFollowUp => "first_follow_up",
            MilestoneKind::FirstInteraction => "first_interaction",
            MilestoneKind::FirstEmail => "first_email",
            MilestoneKind::FollowUpCompleted => "follow_up_completed",
            MilestoneKind::TenClients => "ten_clients",
            MilestoneKind::FirstExport => "first_export",
        }
    }
}

impl FromStr for MilestoneKind {
    type Err = DatabaseError;

    fn from_str(s: &str) -> Result<Self> {
        MilestoneKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| DatabaseError::not_found("Milestone", s))
    }
}

/// Minimum level for each stage past onboarding.
///
/// Stage boundaries are a business rule supplied through configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageThresholds {
    pub exploring: i64,
    pub active: i64,
    pub power_user: i64,
    pub expert: i64,
}

impl Default for StageThresholds {
    fn default() -> Self {
        Self {
            exploring: 2,
            active: 4,
            power_user: 7,
            expert: 10,
        }
    }
}

impl StageThresholds {
    pub fn stage_for_level(&self, level: i64) -> JourneyStage {
        if level >= self.expert {
            JourneyStage::Expert
        } else if level >= self.power_user {
            JourneyStage::PowerUser
        } else if level >= self.active {
            JourneyStage::Active
        } else if level >= self.exploring {
            JourneyStage::Exploring
        } else {
            JourneyStage::Onboarding
        }
    }

    /// Parse `"exploring,active,power_user,expert"` minimum levels, e.g. `"2,4,7,10"`.
    pub fn parse(value: &str) -> Option<Self> {
        let levels: Vec<i64> = value
            .split(',')
            .map(|part| part.trim().parse::<i64>().ok())
            .collect::<Option<_>>()?;

        match levels.as_slice() {
            &[exploring, active, power_user, expert]
                if 1 < exploring
                    && exploring <= active
                    && active <= power_user
                    && power_user <= expert =>
            {
                Some(Self {
                    exploring,
                    active,
                    power_user,
                    expert,
                })
            }
            _ => None,
        }
    }
}

/// Result of a completion attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneAward {
    pub milestone: MilestoneKind,
    /// False when the milestone had already been completed.
    pub awarded: bool,
    pub points_awarded: i64,
    pub progress: JourneyProgress,
}

/// Seed the progress row and every catalog milestone for a user.
///
/// Idempotent; existing rows are left untouched.
pub async fn ensure_journey(pool: &SqlitePool, user_id: i64, now: DateTime<Utc>) -> Result<()> {
    let mut tx = pool.begin().await?;
    seed(&mut tx, user_id, now).await?;
    tx.commit().await?;
    Ok(())
}

async fn seed(conn: &mut SqliteConnection, user_id: i64, now: DateTime<Utc>) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO user_journey_progress (user_id, last_activity_at, updated_at)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(user_id)
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    for kind in MilestoneKind::ALL {
        let def = kind.definition();
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO user_journey_milestones (
                user_id, milestone_type, title, description, points, category, created_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(kind)
        .bind(def.title)
        .bind(def.description)
        .bind(def.points)
        .bind(def.category)
        .bind(now)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Get a user's progress row.
pub async fn get_progress(pool: &SqlitePool, user_id: i64) -> Result<JourneyProgress> {
    fetch_progress(pool, user_id).await
}

async fn fetch_progress<'e, E>(executor: E, user_id: i64) -> Result<JourneyProgress>
where
    E: sqlx::Executor<'e, Database = sqlx::Sqlite>,
{
    sqlx::query_as::<_, JourneyProgress>(
        r#"
        SELECT user_id, total_points, completed_milestones, current_level,
               journey_stage, last_activity_at, updated_at
        FROM user_journey_progress
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_optional(executor)
    .await?
    .ok_or_else(|| DatabaseError::not_found("JourneyProgress", user_id))
}

/// List a user's milestones in catalog order.
pub async fn list_milestones(pool: &SqlitePool, user_id: i64) -> Result<Vec<JourneyMilestone>> {
    let rows = sqlx::query_as::<_, JourneyMilestone>(
        r#"
        SELECT id, user_id, milestone_type, title, description, is_completed,
               completed_at, points, category, created_at
        FROM user_journey_milestones
        WHERE user_id = ?
        ORDER BY id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Complete a milestone, awarding its points at most once.
pub async fn complete_milestone(
    pool: &SqlitePool,
    user_id: i64,
    kind: MilestoneKind,
    thresholds: &StageThresholds,
    now: DateTime<Utc>,
) -> Result<MilestoneAward> {
    let mut tx = pool.begin().await?;
    seed(&mut tx, user_id, now).await?;

    // The guard on is_completed makes the transition one-way and single-shot.
    let points = sqlx::query_scalar::<_, i64>(
        r#"
        UPDATE user_journey_milestones
        SET is_completed = 1, completed_at = ?
        WHERE user_id = ? AND milestone_type = ? AND is_completed = 0
        RETURNING points
        "#,
    )
    .bind(now)
    .bind(user_id)
    .bind(kind)
    .fetch_optional(&mut *tx)
    .await?;

    let Some(points) = points else {
        let progress = fetch_progress(&mut *tx, user_id).await?;
        tx.commit().await?;
        return Ok(MilestoneAward {
            milestone: kind,
            awarded: false,
            points_awarded: 0,
            progress,
        });
    };

    // Right-hand sides see the pre-update row.
    let level = sqlx::query_scalar::<_, i64>(
        r#"
        UPDATE user_journey_progress
        SET total_points = total_points + ?1,
            completed_milestones = completed_milestones + 1,
            current_level = (total_points + ?1) / ?2 + 1,
            last_activity_at = ?3,
            updated_at = ?3
        WHERE user_id = ?4
        RETURNING current_level
        "#,
    )
    .bind(points)
    .bind(POINTS_PER_LEVEL)
    .bind(now)
    .bind(user_id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query("UPDATE user_journey_progress SET journey_stage = ? WHERE user_id = ?")
        .bind(thresholds.stage_for_level(level))
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    let progress = fetch_progress(&mut *tx, user_id).await?;
    tx.commit().await?;

    tracing::info!(
        user_id,
        milestone = kind.as_str(),
        points,
        total_points = progress.total_points,
        level = progress.current_level,
        "Milestone completed"
    );

    Ok(MilestoneAward {
        milestone: kind,
        awarded: true,
        points_awarded: points,
        progress,
    })
}
