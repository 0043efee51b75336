/// Feed Post Service Library
///
/// Handles feed registration with pictures, feed listing with picture lists and
/// comment previews, and owner-scoped feed deletion.
///
/// # Modules
///
/// - `handlers`: Feed HTTP request handlers
/// - `models`: Feed rows, summaries and request/response payloads
/// - `services`: Feed aggregation, registration and deletion logic
/// - `db`: Collaborator traits and PostgreSQL repositories
/// - `storage`: Picture blob storage
/// - `middleware`: JWT authentication and request timing
/// - `error`: Error types and handling
/// - `config`: Configuration management
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod storage;

pub use config::Config;
pub use error::{AppError, Result};
