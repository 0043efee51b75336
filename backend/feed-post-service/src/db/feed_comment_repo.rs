use super::CommentSource;
use crate::error::Result;
use crate::models::FeedComment;
use async_trait::async_trait;
use sqlx::PgPool;

/// Repository for the `feed_comment` table
#[derive(Clone)]
pub struct FeedCommentRepository {
    pool: PgPool,
}

impl FeedCommentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CommentSource for FeedCommentRepository {
    async fn comments_by_feed_id(
        &self,
        feed_id: i64,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<FeedComment>> {
        let comments = sqlx::query_as::<_, FeedComment>(
            r#"
            SELECT fc.feed_comment_id, fc.feed_id, fc.comment,
                   fc.user_id AS writer_user_id,
                   u.nick_name AS writer_nm, u.pic AS writer_pic
            FROM feed_comment fc
            JOIN users u ON u.user_id = fc.user_id
            WHERE fc.feed_id = $1
            ORDER BY fc.feed_comment_id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(feed_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }

    async fn comments_by_feed_ids_limited(
        &self,
        feed_ids: &[i64],
        limit: i64,
    ) -> Result<Vec<FeedComment>> {
        if feed_ids.is_empty() {
            return Ok(Vec::new());
        }

        // Window per feed so each feed contributes at most `limit` rows
        let comments = sqlx::query_as::<_, FeedComment>(
            r#"
            SELECT feed_comment_id, feed_id, comment, writer_user_id, writer_nm, writer_pic
            FROM (
                SELECT fc.feed_comment_id, fc.feed_id, fc.comment,
                       fc.user_id AS writer_user_id,
                       u.nick_name AS writer_nm, u.pic AS writer_pic,
                       ROW_NUMBER() OVER (
                           PARTITION BY fc.feed_id
                           ORDER BY fc.feed_comment_id DESC
                       ) AS rn
                FROM feed_comment fc
                JOIN users u ON u.user_id = fc.user_id
                WHERE fc.feed_id = ANY($1)
            ) ranked
            WHERE rn <= $2
            ORDER BY feed_id DESC, feed_comment_id DESC
            "#,
        )
        .bind(feed_ids)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(comments)
    }
}
