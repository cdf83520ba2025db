//! SQLite persistence layer for Tracker Suite.
//!
//! This crate provides async database operations for accounts, sessions,
//! clients, interactions, follow-ups, admin notifications and journey
//! progress using SQLx with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use chrono::Utc;
//! use database::{client, models::ClientDraft, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:tracker.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let draft = ClientDraft {
//!         name: "Acme Corp".to_string(),
//!         email: "ops@acme.test".to_string(),
//!         ..Default::default()
//!     };
//!     client::create_client(db.pool(), 1, &draft, Utc::now()).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod admin_notification;
pub mod client;
pub mod error;
pub mod follow_up;
pub mod interaction;
pub mod journey;
pub mod models;
pub mod session;
pub mod user;
pub mod validation;

pub use error::{DatabaseError, Result};
pub use journey::{MilestoneAward, StageThresholds};
pub use models::{
    AdminNotification, Client, ClientDraft, ClientStatus, FollowUp, FollowUpDraft,
    FollowUpStatus, Interaction, InteractionDraft, InteractionType, JourneyMilestone,
    JourneyProgress, JourneyStage, MilestoneCategory, MilestoneKind, NewUser,
    NotificationDraft, NotificationPriority, NotificationType, Priority, Session, User,
    UserRole,
};
pub use validation::ValidationError;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 20;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `?mode=rwc` to create the database file if it doesn't exist.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # async fn example() -> database::Result<()> {
    /// let db = database::Database::connect("sqlite:data/tracker.db?mode=rwc").await?;
    /// # Ok(())
    /// # }
    /// ```
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    ///
    /// In-memory databases should use a pool size of 1 so every query sees
    /// the same connection.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use follow_up::FollowUpFilter;

    async fn test_db() -> Database {
        let db = Database::connect_with_pool_size("sqlite::memory:", 1)
            .await
            .unwrap();
        db.migrate().await.unwrap();
        db
    }

    async fn test_user(db: &Database, email: &str) -> User {
        let new_user = NewUser {
            name: "Alice".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            role: UserRole::User,
            trial_ends_at: None,
        };
        user::create_user(db.pool(), &new_user, Utc::now())
            .await
            .unwrap()
    }

    fn acme() -> ClientDraft {
        ClientDraft {
            name: "Acme Corp".to_string(),
            email: "ops@acme.test".to_string(),
            company: Some("Acme".to_string()),
            tags: ["vip".to_string(), "renewal".to_string()].into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_user_crud() {
        let db = test_db().await;
        let now = Utc::now();

        let alice = test_user(&db, "alice@example.com").await;
        assert_eq!(alice.role, UserRole::User);

        let fetched = user::get_user_by_email(db.pool(), "ALICE@example.com")
            .await
            .unwrap();
        assert_eq!(fetched.id, alice.id);

        let dup = NewUser {
            name: "Other".to_string(),
            email: "Alice@Example.com".to_string(),
            password_hash: "x".to_string(),
            role: UserRole::User,
            trial_ends_at: None,
        };
        let result = user::create_user(db.pool(), &dup, now).await;
        assert!(matches!(result, Err(DatabaseError::AlreadyExists { .. })));

        let admin = user::update_role(db.pool(), alice.id, UserRole::Admin)
            .await
            .unwrap();
        assert!(admin.role.is_admin());

        user::record_login(db.pool(), alice.id, now).await.unwrap();
        assert!(user::get_user(db.pool(), alice.id)
            .await
            .unwrap()
            .last_login_at
            .is_some());

        assert_eq!(user::count_users(db.pool()).await.unwrap(), 1);
        user::delete_user(db.pool(), alice.id).await.unwrap();
        let result = user::get_user(db.pool(), alice.id).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_session_expiry() {
        let db = test_db().await;
        let alice = test_user(&db, "alice@example.com").await;
        let now = Utc::now();

        session::create_session(db.pool(), "tok", alice.id, Duration::hours(1), now)
            .await
            .unwrap();
        assert!(session::get_active_session(db.pool(), "tok", now)
            .await
            .unwrap()
            .is_some());
        assert!(
            session::get_active_session(db.pool(), "tok", now + Duration::hours(2))
                .await
                .unwrap()
                .is_none()
        );

        let pruned = session::prune_expired(db.pool(), now + Duration::hours(2))
            .await
            .unwrap();
        assert_eq!(pruned, 1);
    }

    #[tokio::test]
    async fn test_client_crud_and_isolation() {
        let db = test_db().await;
        let alice = test_user(&db, "alice@example.com").await;
        let bob = test_user(&db, "bob@example.com").await;
        let now = Utc::now();

        let created = client::create_client(db.pool(), alice.id, &acme(), now)
            .await
            .unwrap();
        assert_eq!(created.status, ClientStatus::Prospect);
        assert_eq!(created.tags.len(), 2);

        // Bob cannot see Alice's client.
        let result = client::get_client(db.pool(), bob.id, created.id).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
        assert!(client::list_clients(db.pool(), bob.id, None)
            .await
            .unwrap()
            .is_empty());

        let mut draft = acme();
        draft.status = ClientStatus::Active;
        draft.tags.insert("  ".to_string());
        let updated = client::update_client(db.pool(), alice.id, created.id, &draft, now)
            .await
            .unwrap();
        assert_eq!(updated.status, ClientStatus::Active);
        assert_eq!(updated.tags.len(), 2);

        let active = client::list_clients(db.pool(), alice.id, Some(ClientStatus::Active))
            .await
            .unwrap();
        assert_eq!(active.len(), 1);
        let leads = client::list_clients(db.pool(), alice.id, Some(ClientStatus::Lead))
            .await
            .unwrap();
        assert!(leads.is_empty());

        let by_status = client::count_by_status(db.pool(), alice.id).await.unwrap();
        assert_eq!(by_status, vec![(ClientStatus::Active, 1)]);

        client::delete_client(db.pool(), alice.id, created.id)
            .await
            .unwrap();
        assert_eq!(client::count_clients(db.pool(), alice.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_client_search() {
        let db = test_db().await;
        let alice = test_user(&db, "alice@example.com").await;
        let now = Utc::now();

        client::create_client(db.pool(), alice.id, &acme(), now)
            .await
            .unwrap();
        let globex = ClientDraft {
            name: "Globex".to_string(),
            email: "hank@globex.test".to_string(),
            ..Default::default()
        };
        client::create_client(db.pool(), alice.id, &globex, now)
            .await
            .unwrap();

        let hits = client::search_clients(db.pool(), alice.id, "ACME").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Acme Corp");

        let hits = client::search_clients(db.pool(), alice.id, "renewal").await.unwrap();
        assert_eq!(hits.len(), 1);

        let hits = client::search_clients(db.pool(), alice.id, "globex.test").await.unwrap();
        assert_eq!(hits.len(), 1);

        let hits = client::search_clients(db.pool(), alice.id, "%").await.unwrap();
        assert!(hits.is_empty());

        let hits = client::search_clients(db.pool(), alice.id, "  ").await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_client_search_accented_names() {
        let db = test_db().await;
        let alice = test_user(&db, "alice@example.com").await;

        let emile = ClientDraft {
            name: "Émile Zola".to_string(),
            email: "emile@zola.test".to_string(),
            company: Some("Éditions Charpentier".to_string()),
            ..Default::default()
        };
        client::create_client(db.pool(), alice.id, &emile, Utc::now())
            .await
            .unwrap();

        for term in ["Émile", "émile", "ÉMILE", "éditions"] {
            let hits = client::search_clients(db.pool(), alice.id, term).await.unwrap();
            assert_eq!(hits.len(), 1, "no match for {term}");
            assert_eq!(hits[0].name, "Émile Zola");
        }
    }

    #[tokio::test]
    async fn test_validation_rejects_bad_client() {
        let db = test_db().await;
        let alice = test_user(&db, "alice@example.com").await;

        let draft = ClientDraft {
            name: "Acme".to_string(),
            email: "not-an-email".to_string(),
            ..Default::default()
        };
        let result = client::create_client(db.pool(), alice.id, &draft, Utc::now()).await;
        assert!(matches!(
            result,
            Err(DatabaseError::Validation(ValidationError::InvalidEmail(_)))
        ));
    }

    #[tokio::test]
    async fn test_interactions_and_follow_ups() {
        let db = test_db().await;
        let alice = test_user(&db, "alice@example.com").await;
        let bob = test_user(&db, "bob@example.com").await;
        let now = Utc::now();
        let acme = client::create_client(db.pool(), alice.id, &acme(), now)
            .await
            .unwrap();

        let draft = InteractionDraft {
            client_id: acme.id,
            interaction_type: InteractionType::Call,
            notes: "Discussed renewal".to_string(),
        };
        interaction::create_interaction(db.pool(), alice.id, &draft, now)
            .await
            .unwrap();
        let result = interaction::create_interaction(db.pool(), bob.id, &draft, now).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));

        let history = interaction::list_interactions(db.pool(), alice.id, Some(acme.id))
            .await
            .unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].interaction_type, InteractionType::Call);

        let due = Utc.with_ymd_and_hms(2025, 1, 10, 9, 0, 0).unwrap();
        let mut fu = FollowUpDraft {
            client_id: acme.id,
            title: "Renewal call".to_string(),
            description: None,
            due_date: due,
            status: FollowUpStatus::Pending,
            priority: Priority::High,
        };
        let created = follow_up::create_follow_up(db.pool(), alice.id, &fu, now)
            .await
            .unwrap();
        assert_eq!(created.due_date, due);
        assert!(created.completed_at.is_none());

        fu.status = FollowUpStatus::Completed;
        let completed = follow_up::update_follow_up(db.pool(), alice.id, created.id, &fu, now)
            .await
            .unwrap();
        assert!(completed.completed_at.is_some());

        // Completion time is kept on a repeated update.
        let later = now + Duration::hours(1);
        let again = follow_up::update_follow_up(db.pool(), alice.id, created.id, &fu, later)
            .await
            .unwrap();
        assert_eq!(again.completed_at, completed.completed_at);

        assert!(follow_up::list_open_follow_ups(db.pool(), alice.id)
            .await
            .unwrap()
            .is_empty());
        let done = follow_up::list_follow_ups(
            db.pool(),
            alice.id,
            FollowUpFilter {
                status: Some(FollowUpStatus::Completed),
                client_id: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(done.len(), 1);

        let result = follow_up::delete_follow_up(db.pool(), bob.id, created.id).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));

        // Deleting the client cascades.
        client::delete_client(db.pool(), alice.id, acme.id)
            .await
            .unwrap();
        let result = follow_up::get_follow_up(db.pool(), alice.id, created.id).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_admin_notification_lifecycle() {
        let db = test_db().await;
        let now = Utc::now();

        let draft = NotificationDraft::new(
            NotificationType::UserRegistration,
            "New User",
            "Jane Doe registered",
            NotificationPriority::Medium,
        );
        let created = admin_notification::create_notification(db.pool(), &draft, now)
            .await
            .unwrap();

        let list = admin_notification::list_notifications(db.pool(), false, 50)
            .await
            .unwrap();
        assert_eq!(list.len(), 1);
        assert!(!list[0].is_read);
        assert_eq!(list[0].title, "New User");

        admin_notification::mark_read(db.pool(), created.id)
            .await
            .unwrap();
        // Idempotent.
        admin_notification::mark_read(db.pool(), created.id)
            .await
            .unwrap();
        assert!(admin_notification::get_notification(db.pool(), created.id)
            .await
            .unwrap()
            .is_read);

        let result = admin_notification::mark_read(db.pool(), 9999).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));

        let empty = NotificationDraft::new(
            NotificationType::SystemAlert,
            " ",
            "body",
            NotificationPriority::Low,
        );
        let result = admin_notification::create_notification(db.pool(), &empty, now).await;
        assert!(matches!(result, Err(DatabaseError::Validation(_))));

        admin_notification::delete_notification(db.pool(), created.id)
            .await
            .unwrap();
        let result = admin_notification::delete_notification(db.pool(), created.id).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_mark_all_read() {
        let db = test_db().await;
        let now = Utc::now();

        for i in 0..3 {
            let draft = NotificationDraft::new(
                NotificationType::UserLogin,
                "Login",
                format!("user {} logged in", i),
                NotificationPriority::Low,
            )
            .with_data(serde_json::json!({ "seq": i }));
            admin_notification::create_notification(db.pool(), &draft, now)
                .await
                .unwrap();
        }
        assert_eq!(admin_notification::unread_count(db.pool()).await.unwrap(), 3);

        let changed = admin_notification::mark_all_read(db.pool()).await.unwrap();
        assert_eq!(changed, 3);
        assert_eq!(admin_notification::unread_count(db.pool()).await.unwrap(), 0);
        assert_eq!(admin_notification::mark_all_read(db.pool()).await.unwrap(), 0);

        let unread = admin_notification::list_notifications(db.pool(), true, 50)
            .await
            .unwrap();
        assert!(unread.is_empty());
        let all = admin_notification::list_notifications(db.pool(), false, 2)
            .await
            .unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].data.is_some());
    }

    #[tokio::test]
    async fn test_notification_exists_for_user() {
        let db = test_db().await;
        let alice = test_user(&db, "alice@example.com").await;

        assert!(!admin_notification::exists_for_user(
            db.pool(),
            alice.id,
            NotificationType::TrialExpired
        )
        .await
        .unwrap());

        let draft = NotificationDraft::new(
            NotificationType::TrialExpired,
            "Trial expired",
            "Alice's trial has ended",
            NotificationPriority::High,
        )
        .about(&alice);
        admin_notification::create_notification(db.pool(), &draft, Utc::now())
            .await
            .unwrap();

        assert!(admin_notification::exists_for_user(
            db.pool(),
            alice.id,
            NotificationType::TrialExpired
        )
        .await
        .unwrap());
    }

    #[tokio::test]
    async fn test_milestone_completion_is_idempotent() {
        let db = test_db().await;
        let alice = test_user(&db, "alice@example.com").await;
        let thresholds = StageThresholds::default();
        let now = Utc::now();

        journey::ensure_journey(db.pool(), alice.id, now).await.unwrap();
        let progress = journey::get_progress(db.pool(), alice.id).await.unwrap();
        assert_eq!(progress.total_points, 0);
        assert_eq!(progress.current_level, 1);
        assert_eq!(progress.journey_stage, JourneyStage::Onboarding);

        let first = journey::complete_milestone(
            db.pool(),
            alice.id,
            MilestoneKind::TenClients,
            &thresholds,
            now,
        )
        .await
        .unwrap();
        assert!(first.awarded);
        assert_eq!(first.points_awarded, 50);
        assert_eq!(first.progress.total_points, 50);
        assert_eq!(first.progress.completed_milestones, 1);
        assert_eq!(first.progress.current_level, 2);
        assert_eq!(first.progress.journey_stage, JourneyStage::Exploring);

        let second = journey::complete_milestone(
            db.pool(),
            alice.id,
            MilestoneKind::TenClients,
            &thresholds,
            now,
        )
        .await
        .unwrap();
        assert!(!second.awarded);
        assert_eq!(second.points_awarded, 0);
        assert_eq!(second.progress.total_points, 50);
        assert_eq!(second.progress.completed_milestones, 1);

        let milestones = journey::list_milestones(db.pool(), alice.id).await.unwrap();
        assert_eq!(milestones.len(), MilestoneKind::ALL.len());
        let ten = milestones
            .iter()
            .find(|m| m.milestone_type == MilestoneKind::TenClients)
            .unwrap();
        assert!(ten.is_completed);
        assert!(ten.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_level_tracks_points_after_every_award() {
        let db = test_db().await;
        let alice = test_user(&db, "alice@example.com").await;
        let thresholds = StageThresholds::default();

        let mut expected_points = 0;
        for kind in MilestoneKind::ALL {
            let award =
                journey::complete_milestone(db.pool(), alice.id, kind, &thresholds, Utc::now())
                    .await
                    .unwrap();
            expected_points += kind.definition().points;
            assert_eq!(award.progress.total_points, expected_points);
            assert_eq!(
                award.progress.current_level,
                journey::level_for_points(award.progress.total_points)
            );
            assert_eq!(
                award.progress.journey_stage,
                thresholds.stage_for_level(award.progress.current_level)
            );
        }

        let progress = journey::get_progress(db.pool(), alice.id).await.unwrap();
        assert_eq!(progress.completed_milestones, MilestoneKind::ALL.len() as i64);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_completions_award_each_milestone_once() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite:{}?mode=rwc", dir.path().join("journey.db").display());
        let db = Database::connect_with_pool_size(&url, 16).await.unwrap();
        db.migrate().await.unwrap();
        let user_id = test_user(&db, "alice@example.com").await.id;

        let mut handles = Vec::new();
        for _ in 0..4 {
            for kind in MilestoneKind::ALL {
                let db = db.clone();
                handles.push(tokio::spawn(async move {
                    journey::complete_milestone(
                        db.pool(),
                        user_id,
                        kind,
                        &StageThresholds::default(),
                        Utc::now(),
                    )
                    .await
                }));
            }
        }

        let mut awarded = Vec::new();
        for handle in handles {
            let award = handle.await.unwrap().unwrap();
            if award.awarded {
                awarded.push(award.milestone);
            }
        }

        assert_eq!(awarded.len(), MilestoneKind::ALL.len());
        for kind in MilestoneKind::ALL {
            assert_eq!(awarded.iter().filter(|k| **k == kind).count(), 1);
        }

        let expected: i64 = MilestoneKind::ALL.iter().map(|k| k.definition().points).sum();
        let progress = journey::get_progress(db.pool(), user_id).await.unwrap();
        assert_eq!(progress.total_points, expected);
        assert_eq!(progress.completed_milestones, MilestoneKind::ALL.len() as i64);
        assert_eq!(progress.current_level, journey::level_for_points(expected));

        db.close().await;
    }
}
