/// Feed list service - assembles a page of feeds with pictures and comment previews
use crate::config::{FeedConfig, ListStrategy};
use crate::db::{CommentSource, FeedQuerySource, PictureSource};
use crate::error::Result;
use crate::models::{FeedPageRequest, FeedSummary};
use crate::services::aggregation::{
    attach_comment_previews, attach_pictures, comment_preview, group_picture_rows,
    summaries_from_embedded,
};
use std::sync::Arc;
use tracing::debug;

pub struct FeedListService {
    queries: Arc<dyn FeedQuerySource>,
    pictures: Arc<dyn PictureSource>,
    comments: Arc<dyn CommentSource>,
    preview_size: usize,
    strategy: ListStrategy,
}

impl FeedListService {
    pub fn new(
        queries: Arc<dyn FeedQuerySource>,
        pictures: Arc<dyn PictureSource>,
        comments: Arc<dyn CommentSource>,
        config: &FeedConfig,
    ) -> Self {
        Self {
            queries,
            pictures,
            comments,
            preview_size: config.comment_preview_size,
            strategy: config.list_strategy,
        }
    }

    /// Comments fetched per feed: the preview plus one overflow sentinel
    fn comment_fetch_limit(&self) -> i64 {
        self.preview_size as i64 + 1
    }

    /// List a page of feeds using the configured strategy
    pub async fn list_feeds(&self, req: &FeedPageRequest) -> Result<Vec<FeedSummary>> {
        debug!(
            signed_user_id = req.signed_user_id,
            offset = req.offset,
            limit = req.limit,
            strategy = ?self.strategy,
            "listing feeds"
        );

        match self.strategy {
            ListStrategy::Embedded => self.list_embedded(req).await,
            ListStrategy::Batched => self.list_batched(req).await,
            ListStrategy::Joined => self.list_joined(req).await,
            ListStrategy::PerFeed => self.list_per_feed(req).await,
        }
    }

    /// Two queries per feed. Reference implementation for the other strategies.
    pub async fn list_per_feed(&self, req: &FeedPageRequest) -> Result<Vec<FeedSummary>> {
        let rows = self.queries.list_feeds(req).await?;
        let mut feeds = Vec::with_capacity(rows.len());

        for row in rows {
            let mut feed = FeedSummary::from(row);
            feed.pics = self.pictures.pictures_by_feed_id(feed.feed_id).await?;

            let comments = self
                .comments
                .comments_by_feed_id(feed.feed_id, 0, self.comment_fetch_limit())
                .await?;
            feed.comment = comment_preview(comments, self.preview_size);

            feeds.push(feed);
        }

        Ok(feeds)
    }

    /// Feed + picture join rows, then one comment query for the page
    pub async fn list_joined(&self, req: &FeedPageRequest) -> Result<Vec<FeedSummary>> {
        let rows = self.queries.list_feeds_with_pictures(req).await?;
        let mut feeds = group_picture_rows(rows);
        if feeds.is_empty() {
            return Ok(feeds);
        }

        let feed_ids: Vec<i64> = feeds.iter().map(|f| f.feed_id).collect();
        let comments = self
            .comments
            .comments_by_feed_ids_limited(&feed_ids, self.comment_fetch_limit())
            .await?;
        attach_comment_previews(&mut feeds, comments, self.preview_size);

        Ok(feeds)
    }

    /// Feed page, then one picture query and one comment query for the page
    pub async fn list_batched(&self, req: &FeedPageRequest) -> Result<Vec<FeedSummary>> {
        let rows = self.queries.list_feeds(req).await?;
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut feeds: Vec<FeedSummary> = rows.into_iter().map(FeedSummary::from).collect();
        let feed_ids: Vec<i64> = feeds.iter().map(|f| f.feed_id).collect();
        debug!(?feed_ids, "fetching pictures and comments for page");

        let (pictures, comments) = tokio::try_join!(
            self.pictures.pictures_by_feed_ids(&feed_ids),
            self.comments
                .comments_by_feed_ids_limited(&feed_ids, self.comment_fetch_limit()),
        )?;

        attach_pictures(&mut feeds, pictures);
        attach_comment_previews(&mut feeds, comments, self.preview_size);

        Ok(feeds)
    }

    /// Single query with pictures and capped comments embedded per feed
    pub async fn list_embedded(&self, req: &FeedPageRequest) -> Result<Vec<FeedSummary>> {
        let rows = self
            .queries
            .list_feeds_with_pictures_and_comments(req, self.comment_fetch_limit())
            .await?;

        Ok(summaries_from_embedded(rows, self.preview_size))
    }
}
