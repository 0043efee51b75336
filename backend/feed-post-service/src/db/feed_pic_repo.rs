use super::PictureSource;
use crate::error::Result;
use crate::models::FeedPicture;
use async_trait::async_trait;
use sqlx::PgPool;

/// Repository for the `feed_pic` table
#[derive(Clone)]
pub struct FeedPicRepository {
    pool: PgPool,
}

impl FeedPicRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PictureSource for FeedPicRepository {
    async fn pictures_by_feed_id(&self, feed_id: i64) -> Result<Vec<String>> {
        let pics: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT pic
            FROM feed_pic
            WHERE feed_id = $1
            ORDER BY seq ASC
            "#,
        )
        .bind(feed_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(pics)
    }

    async fn pictures_by_feed_ids(&self, feed_ids: &[i64]) -> Result<Vec<FeedPicture>> {
        if feed_ids.is_empty() {
            return Ok(Vec::new());
        }

        let pics = sqlx::query_as::<_, FeedPicture>(
            r#"
            SELECT feed_id, pic
            FROM feed_pic
            WHERE feed_id = ANY($1)
            ORDER BY feed_id DESC, seq ASC
            "#,
        )
        .bind(feed_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(pics)
    }
}
