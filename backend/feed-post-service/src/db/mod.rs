/// Database access layer
///
/// This module provides:
/// - The collaborator traits the feed aggregator and feed service depend on
/// - PostgreSQL repositories implementing them
/// - Embedded migrations
pub mod feed_comment_repo;
pub mod feed_pic_repo;
pub mod feed_repo;

pub use feed_comment_repo::FeedCommentRepository;
pub use feed_pic_repo::FeedPicRepository;
pub use feed_repo::FeedRepository;

use crate::error::Result;
use crate::models::{
    EmbeddedFeedRow, FeedComment, FeedPageRequest, FeedPicture, FeedPictureRow, FeedRow,
};
use async_trait::async_trait;
use sqlx::migrate::Migrator;

pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Source of feed pages in the three shapes the aggregation strategies consume
#[async_trait]
pub trait FeedQuerySource: Send + Sync {
    /// Feed scalar rows only, newest first
    async fn list_feeds(&self, req: &FeedPageRequest) -> Result<Vec<FeedRow>>;

    /// Feed page left-joined with pictures; rows of one feed are contiguous
    async fn list_feeds_with_pictures(&self, req: &FeedPageRequest)
        -> Result<Vec<FeedPictureRow>>;

    /// One row per feed with pictures and at most `comment_limit` comments embedded
    async fn list_feeds_with_pictures_and_comments(
        &self,
        req: &FeedPageRequest,
        comment_limit: i64,
    ) -> Result<Vec<EmbeddedFeedRow>>;
}

#[async_trait]
pub trait PictureSource: Send + Sync {
    async fn pictures_by_feed_id(&self, feed_id: i64) -> Result<Vec<String>>;

    async fn pictures_by_feed_ids(&self, feed_ids: &[i64]) -> Result<Vec<FeedPicture>>;
}

/// Comments are returned newest first within each feed
#[async_trait]
pub trait CommentSource: Send + Sync {
    async fn comments_by_feed_id(
        &self,
        feed_id: i64,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<FeedComment>>;

    /// At most `limit` comments per feed, grouped contiguously by feed
    async fn comments_by_feed_ids_limited(
        &self,
        feed_ids: &[i64],
        limit: i64,
    ) -> Result<Vec<FeedComment>>;
}

/// Write side of the feed tables
#[async_trait]
pub trait FeedStore: Send + Sync {
    /// Insert a feed row and return its generated id
    async fn insert_feed(
        &self,
        writer_user_id: i64,
        contents: Option<&str>,
        location: Option<&str>,
    ) -> Result<i64>;

    /// Record all picture associations of a feed in one call
    async fn insert_pictures(&self, feed_id: i64, pics: &[String]) -> Result<u64>;

    /// Remove a feed regardless of owner; used to undo a failed registration
    async fn remove_feed(&self, feed_id: i64) -> Result<u64>;

    /// Delete a feed owned by `writer_user_id`, returning affected rows
    async fn delete_feed(&self, feed_id: i64, writer_user_id: i64) -> Result<u64>;
}
