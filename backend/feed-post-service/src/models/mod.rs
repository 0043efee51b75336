/// Data models for feed-post-service
///
/// This module defines structures for:
/// - Feed rows as returned by the query sources (flat, joined, embedded)
/// - FeedSummary: the assembled feed item handed to the HTTP layer
/// - Comment previews and feed creation/deletion payloads
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use validator::Validate;

/// Maximum number of pictures accepted for a single feed
pub const MAX_PICTURES_PER_FEED: usize = 10;

/// Comment entry shown in a feed's comment preview
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FeedComment {
    pub feed_comment_id: i64,
    pub feed_id: i64,
    pub comment: String,
    pub writer_user_id: i64,
    pub writer_nm: Option<String>,
    pub writer_pic: Option<String>,
}

/// Bounded comment preview attached to every feed summary
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentPreview {
    pub comments: Vec<FeedComment>,
    pub has_more: bool,
}

/// Feed scalar fields as returned by a plain feed page query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FeedRow {
    pub feed_id: i64,
    pub contents: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub writer_user_id: i64,
    pub writer_nm: Option<String>,
    pub writer_pic: Option<String>,
    pub is_like: bool,
}

/// Denormalized feed + picture row from a left join.
///
/// Feed fields repeat on every row; `pic` is `None` for a feed without pictures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FeedPictureRow {
    pub feed_id: i64,
    pub contents: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub writer_user_id: i64,
    pub writer_nm: Option<String>,
    pub writer_pic: Option<String>,
    pub is_like: bool,
    pub pic: Option<String>,
}

impl FeedPictureRow {
    pub fn feed(&self) -> FeedRow {
        FeedRow {
            feed_id: self.feed_id,
            contents: self.contents.clone(),
            location: self.location.clone(),
            created_at: self.created_at,
            writer_user_id: self.writer_user_id,
            writer_nm: self.writer_nm.clone(),
            writer_pic: self.writer_pic.clone(),
            is_like: self.is_like,
        }
    }
}

/// One row per feed with pictures and pre-limited comments embedded as JSON
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EmbeddedFeedRow {
    #[sqlx(flatten)]
    pub feed: FeedRow,
    pub pics: Json<Vec<String>>,
    pub comments: Json<Vec<FeedComment>>,
}

/// (feed id, filename) association
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FeedPicture {
    pub feed_id: i64,
    pub pic: String,
}

/// Assembled feed item returned to clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSummary {
    pub feed_id: i64,
    pub contents: Option<String>,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
    pub writer_user_id: i64,
    pub writer_nm: Option<String>,
    pub writer_pic: Option<String>,
    pub is_like: bool,
    pub pics: Vec<String>,
    pub comment: CommentPreview,
}

impl From<FeedRow> for FeedSummary {
    fn from(row: FeedRow) -> Self {
        Self {
            feed_id: row.feed_id,
            contents: row.contents,
            location: row.location,
            created_at: row.created_at,
            writer_user_id: row.writer_user_id,
            writer_nm: row.writer_nm,
            writer_pic: row.writer_pic,
            is_like: row.is_like,
            pics: Vec::new(),
            comment: CommentPreview::default(),
        }
    }
}

/// Optional narrowing of a feed page
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedListFilter {
    /// Only feeds written by this user
    pub profile_user_id: Option<i64>,
    /// Case-insensitive substring of the feed contents
    pub search: Option<String>,
}

/// Page request handed to the aggregator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedPageRequest {
    pub signed_user_id: i64,
    pub offset: i64,
    pub limit: i64,
    pub filter: FeedListFilter,
}

/// Page of assembled feeds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedPageResponse {
    pub feeds: Vec<FeedSummary>,
    pub cursor: Option<String>,
    pub has_more: bool,
}

/// Text fields of a feed creation request
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct CreateFeedRequest {
    #[validate(length(max = 1000, message = "contents must be at most 1000 characters"))]
    pub contents: Option<String>,
    #[validate(length(max = 50, message = "location must be at most 50 characters"))]
    pub location: Option<String>,
}

/// Uploaded picture payload
#[derive(Debug, Clone)]
pub struct PictureUpload {
    pub original_filename: Option<String>,
    pub data: bytes::Bytes,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateFeedResponse {
    pub feed_id: i64,
    pub pics: Vec<String>,
}
