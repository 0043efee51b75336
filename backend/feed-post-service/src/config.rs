/// Configuration management for feed-post-service
///
/// Configuration is loaded from environment variables (a `.env` file is read by
/// `main` through `dotenvy`).
use crate::error::{AppError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Application settings
    pub app: AppConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Database configuration
    pub database: DatabaseConfig,
    /// Picture storage configuration
    pub storage: StorageConfig,
    /// JWT verification settings
    pub auth: AuthConfig,
    /// Feed listing configuration
    pub feed: FeedConfig,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application environment (development, staging, production)
    pub env: String,
    pub host: String,
    pub port: u16,
}

impl AppConfig {
    pub fn is_production(&self) -> bool {
        self.env.eq_ignore_ascii_case("production")
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    /// Comma-separated list of allowed origins
    pub allowed_origins: String,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root folder for uploaded pictures
    pub upload_path: String,
    pub limits: UploadLimits,
}

/// Byte limits enforced while a multipart upload is streamed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadLimits {
    /// Largest single picture
    pub max_picture_bytes: usize,
    /// Largest sum of all parts in one request
    pub max_request_bytes: usize,
}

impl Default for UploadLimits {
    fn default() -> Self {
        Self {
            max_picture_bytes: 10 * 1024 * 1024,
            max_request_bytes: 50 * 1024 * 1024,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .finish()
    }
}

/// How a feed page is assembled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListStrategy {
    /// One query with pictures and comments embedded per feed
    Embedded,
    /// Feed page, then one picture query and one comment query for the whole page
    Batched,
    /// Feed + picture join, then one comment query for the whole page
    Joined,
    /// Picture and comment queries per feed
    PerFeed,
}

impl FromStr for ListStrategy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "embedded" => Ok(ListStrategy::Embedded),
            "batched" => Ok(ListStrategy::Batched),
            "joined" => Ok(ListStrategy::Joined),
            "per_feed" => Ok(ListStrategy::PerFeed),
            other => Err(format!("Unknown feed list strategy '{}'", other)),
        }
    }
}

/// Feed listing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// Comments shown per feed; one more is fetched to detect overflow
    pub comment_preview_size: usize,
    pub default_page_size: u32,
    pub list_strategy: ListStrategy,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            comment_preview_size: 3,
            default_page_size: 20,
            list_strategy: ListStrategy::Embedded,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        let app_env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());
        let production = app_env.eq_ignore_ascii_case("production");

        Ok(Config {
            app: AppConfig {
                env: app_env.clone(),
                host: std::env::var("FEED_SERVICE_HOST")
                    .unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: parse_env_or_default("FEED_SERVICE_PORT", 8085)?,
            },
            cors: {
                let allowed_origins = match std::env::var("CORS_ALLOWED_ORIGINS") {
                    Ok(value) => value,
                    Err(_) if production => {
                        return Err(AppError::Config(
                            "CORS_ALLOWED_ORIGINS must be set in production".to_string(),
                        ))
                    }
                    Err(_) => "http://localhost:3000".to_string(),
                };

                if production && allowed_origins.trim() == "*" {
                    return Err(AppError::Config(
                        "CORS_ALLOWED_ORIGINS cannot be '*' in production".to_string(),
                    ));
                }

                CorsConfig { allowed_origins }
            },
            database: DatabaseConfig {
                url: std::env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgresql://localhost/greengram".to_string()),
                max_connections: parse_env_or_default("DATABASE_MAX_CONNECTIONS", 10)?,
                min_connections: parse_env_or_default("DATABASE_MIN_CONNECTIONS", 2)?,
                acquire_timeout_secs: parse_env_or_default("DATABASE_ACQUIRE_TIMEOUT_SECS", 10)?,
            },
            storage: StorageConfig {
                upload_path: std::env::var("UPLOAD_PATH")
                    .unwrap_or_else(|_| "./uploads".to_string()),
                limits: {
                    let defaults = UploadLimits::default();
                    let limits = UploadLimits {
                        max_picture_bytes: parse_env_or_default(
                            "FEED_MAX_PICTURE_BYTES",
                            defaults.max_picture_bytes,
                        )?,
                        max_request_bytes: parse_env_or_default(
                            "FEED_MAX_UPLOAD_BYTES",
                            defaults.max_request_bytes,
                        )?,
                    };

                    if limits.max_picture_bytes > limits.max_request_bytes {
                        return Err(AppError::Config(
                            "FEED_MAX_PICTURE_BYTES cannot exceed FEED_MAX_UPLOAD_BYTES"
                                .to_string(),
                        ));
                    }

                    limits
                },
            },
            auth: AuthConfig {
                jwt_secret: match std::env::var("JWT_SECRET") {
                    Ok(secret) if !secret.trim().is_empty() => secret,
                    _ if production => {
                        return Err(AppError::Config(
                            "JWT_SECRET must be set in production".to_string(),
                        ))
                    }
                    _ => "dev-secret-change-me".to_string(),
                },
            },
            feed: {
                let feed = FeedConfig {
                    comment_preview_size: parse_env_or_default("FEED_COMMENT_PREVIEW_SIZE", 3)?,
                    default_page_size: parse_env_or_default("FEED_DEFAULT_PAGE_SIZE", 20)?,
                    list_strategy: parse_env_or_default(
                        "FEED_LIST_STRATEGY",
                        ListStrategy::Embedded,
                    )?,
                };

                if feed.comment_preview_size == 0 {
                    return Err(AppError::Config(
                        "FEED_COMMENT_PREVIEW_SIZE must be at least 1".to_string(),
                    ));
                }

                feed
            },
        })
    }
}

fn parse_env_or_default<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match std::env::var(key) {
        Ok(val) => val.parse().map_err(|e| {
            AppError::Config(format!("Failed to parse {}='{}': {}", key, val, e))
        }),
        Err(_) => Ok(default),
    }
}
