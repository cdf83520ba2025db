//! Tracker Suite API server.

use std::sync::Arc;

use database::Database;
use mailer::{EmailSender, SmtpMailer};
use tracing::info;
use tracing_subscriber::EnvFilter;

use tracker_web::{app, AppState, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                EnvFilter::new("tracker_web=info,database=info,tower_http=info")
            }),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting Tracker Suite server");

    // Connect to database
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    let pruned = database::session::prune_expired(db.pool(), chrono::Utc::now()).await?;
    if pruned > 0 {
        info!(pruned, "Removed expired sessions");
    }

    // Outbound email is optional
    let mailer: Option<Arc<dyn EmailSender>> = match config.smtp {
        Some(smtp) => {
            info!(host = %smtp.host, "Email sending enabled");
            Some(Arc::new(SmtpMailer::new(smtp)?))
        }
        None => {
            info!("SMTP_HOST not set, email sending disabled");
            None
        }
    };

    // Build application state
    let state = AppState::new(db, mailer, config.settings);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!(addr = %config.addr, "Tracker Suite server listening");
    axum::serve(listener, app(state)).await?;

    Ok(())
}
