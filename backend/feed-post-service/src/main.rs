use actix_cors::Cors;
use actix_web::{web, App, HttpResponse, HttpServer};
use chrono::Utc;
use feed_post_service::config::Config;
use feed_post_service::db::{FeedCommentRepository, FeedPicRepository, FeedRepository, MIGRATOR};
use feed_post_service::handlers::{self, FeedHandlerState};
use feed_post_service::middleware::{JwtAuthMiddleware, TokenVerifier};
use feed_post_service::services::{FeedListService, FeedService};
use feed_post_service::storage::LocalBlobStorage;
use serde::Serialize;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

struct HealthState {
    db_pool: PgPool,
}

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum ComponentStatus {
    Healthy,
    Unhealthy,
}

#[derive(Serialize)]
struct ReadinessResponse {
    ready: bool,
    status: ComponentStatus,
    message: String,
    latency_ms: u64,
    timestamp: String,
}

impl HealthState {
    async fn check_postgres(&self) -> Result<(), sqlx::Error> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.db_pool)
            .await
            .map(|_| ())
    }
}

async fn health_summary() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "ok",
        "service": "feed-post-service",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn readiness_summary(state: web::Data<HealthState>) -> HttpResponse {
    let start = Instant::now();
    let result = state.check_postgres().await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let (ready, status, message) = match result {
        Ok(_) => (
            true,
            ComponentStatus::Healthy,
            "PostgreSQL connection successful".to_string(),
        ),
        Err(e) => (
            false,
            ComponentStatus::Unhealthy,
            format!("PostgreSQL connection failed: {}", e),
        ),
    };

    let response = ReadinessResponse {
        ready,
        status,
        message,
        latency_ms,
        timestamp: Utc::now().to_rfc3339(),
    };

    if ready {
        HttpResponse::Ok().json(response)
    } else {
        HttpResponse::ServiceUnavailable().json(response)
    }
}

async fn create_pool(config: &Config) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .acquire_timeout(Duration::from_secs(config.database.acquire_timeout_secs))
        .connect(&config.database.url)
        .await
}

/// Feed Post Service
///
/// # Routes
///
/// - `/api/v1/feeds` - Register and list feeds
/// - `/api/v1/feeds/{feed_id}` - Delete a feed
/// - `/health`, `/health/ready` - Liveness and readiness
#[actix_web::main]
async fn main() -> io::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,feed_post_service=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("Configuration loading failed: {}", e);
            eprintln!("ERROR: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing::info!("Starting feed-post-service v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        env = %config.app.env,
        strategy = ?config.feed.list_strategy,
        comment_preview_size = config.feed.comment_preview_size,
        "Feed configuration loaded"
    );

    let db_pool = match create_pool(&config).await {
        Ok(pool) => pool,
        Err(e) => {
            tracing::error!("Database pool creation failed: {}", e);
            eprintln!("ERROR: Failed to create database pool: {}", e);
            std::process::exit(1);
        }
    };

    MIGRATOR.run(&db_pool).await.map_err(|e| {
        io::Error::new(
            io::ErrorKind::Other,
            format!("Failed to run database migrations: {e}"),
        )
    })?;
    tracing::info!("Database migrations applied");

    let storage = Arc::new(LocalBlobStorage::new(&config.storage.upload_path));
    tokio::fs::create_dir_all(storage.root()).await?;

    let feed_repo = Arc::new(FeedRepository::new(db_pool.clone()));
    let feed_list = Arc::new(FeedListService::new(
        feed_repo.clone(),
        Arc::new(FeedPicRepository::new(db_pool.clone())),
        Arc::new(FeedCommentRepository::new(db_pool.clone())),
        &config.feed,
    ));
    let feeds = Arc::new(FeedService::new(feed_repo, storage));

    let feed_state = web::Data::new(FeedHandlerState {
        feed_list,
        feeds,
        default_page_size: config.feed.default_page_size,
        upload_limits: config.storage.limits,
    });
    let health_state = web::Data::new(HealthState {
        db_pool: db_pool.clone(),
    });
    let verifier = TokenVerifier::new(&config.auth.jwt_secret);

    let http_bind_address = format!("{}:{}", config.app.host, config.app.port);
    tracing::info!("Starting HTTP server at {}", http_bind_address);

    let allowed_origins = config.cors.allowed_origins.clone();
    HttpServer::new(move || {
        let mut cors = Cors::default();
        for origin in allowed_origins.split(',') {
            let origin = origin.trim();
            if origin == "*" {
                cors = cors.allow_any_origin();
            } else {
                cors = cors.allowed_origin(origin);
            }
        }
        cors = cors.allow_any_method().allow_any_header().max_age(3600);

        App::new()
            .app_data(feed_state.clone())
            .app_data(health_state.clone())
            .wrap(cors)
            .wrap(tracing_actix_web::TracingLogger::default())
            .route("/health", web::get().to(health_summary))
            .route("/health/ready", web::get().to(readiness_summary))
            .service(
                web::scope("/api/v1")
                    .wrap(JwtAuthMiddleware::new(verifier.clone()))
                    .configure(handlers::configure),
            )
    })
    .bind(&http_bind_address)?
    .run()
    .await?;

    tracing::info!("feed-post-service shutting down");
    Ok(())
}
