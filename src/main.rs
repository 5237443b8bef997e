mod config;
mod db;
mod dtos;
mod error;
mod handler;
mod mail;
mod middleware;
mod models;
mod routes;
mod service;
mod utils;

use std::sync::Arc;

use anyhow::Context;
use axum::http::{
    header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method,
};
use chrono::Utc;
use clap::Command;
use config::Config;
use db::DBClient;
use dotenv::dotenv;
use mail::sendmail::Mailer;
use routes::create_router;
use service::{
    background_jobs, due_reading_service::scan_due_readings,
    notification_service::NotificationService, permission_service::PermissionService,
};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing_subscriber::EnvFilter;

pub struct AppState {
    pub env: Config,
    pub db_client: Arc<DBClient>,
    pub permission_service: PermissionService,
    pub notification_service: NotificationService,
}

impl AppState {
    pub fn new(db_client: DBClient, config: Config) -> Self {
        let db_client = Arc::new(db_client);
        let permission_service = PermissionService::for_db(db_client.clone());
        let notification_service =
            NotificationService::new(db_client.clone(), Mailer::new(config.smtp.clone()));

        Self {
            env: config,
            db_client,
            permission_service,
            notification_service,
        }
    }
}

fn cli() -> Command {
    Command::new("rentnest")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Rental property management backend")
        .subcommand(Command::new("serve").about("Run the HTTP API (default)"))
        .subcommand(
            Command::new("scan-due-readings")
                .about("Notify landlords about rooms still missing this month's readings"),
        )
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    dotenv().ok();

    let matches = cli().get_matches();
    let config = Config::init()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to the database")?;
    tracing::info!("Connection to the database is successful");

    sqlx::migrate!()
        .run(&pool)
        .await
        .context("Failed to run database migrations")?;

    let db_client = match config.redis_url {
        Some(ref redis_url) => DBClient::with_redis(pool, redis_url).await,
        None => {
            tracing::info!("Redis not configured, permission cache runs in memory");
            DBClient::new(pool)
        }
    };

    let app_state = Arc::new(AppState::new(db_client, config.clone()));
    tracing::info!("Cache status: {}", app_state.db_client.cache_status());

    match matches.subcommand() {
        Some(("scan-due-readings", _)) => {
            let today = Utc::now().date_naive();
            let report = scan_due_readings(
                app_state.db_client.as_ref(),
                &app_state.notification_service,
                today,
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        _ => serve(app_state, config).await,
    }
}

async fn serve(app_state: Arc<AppState>, config: Config) -> anyhow::Result<()> {
    let allowed_origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Ignoring invalid CORS origin {}: {}", origin, e);
                None
            }
        })
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed_origins))
        .allow_headers([AUTHORIZATION, ACCEPT, CONTENT_TYPE])
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE]);

    let app = create_router(app_state.clone()).layer(cors);

    let app_state_clone = app_state.clone();
    let scan_hours = config.due_reading_scan_hours;
    tokio::spawn(async move {
        background_jobs::start_due_reading_job(app_state_clone, scan_hours).await;
    });

    let app_state_clone = app_state.clone();
    tokio::spawn(async move {
        background_jobs::start_overdue_invoice_job(app_state_clone).await;
    });

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port))
        .await
        .with_context(|| format!("Failed to bind port {}", config.port))?;

    tracing::info!("Server is running on http://localhost:{}", config.port);

    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scan_subcommand_is_recognised() {
        let matches = cli()
            .try_get_matches_from(["rentnest", "scan-due-readings"])
            .unwrap();
        assert_eq!(matches.subcommand_name(), Some("scan-due-readings"));
    }

    #[test]
    fn scan_subcommand_takes_no_flags() {
        assert!(cli()
            .try_get_matches_from(["rentnest", "scan-due-readings", "--date", "2026-03-01"])
            .is_err());
    }

    #[test]
    fn no_subcommand_means_serve() {
        let matches = cli().try_get_matches_from(["rentnest"]).unwrap();
        assert!(matches.subcommand().is_none());
    }
}
