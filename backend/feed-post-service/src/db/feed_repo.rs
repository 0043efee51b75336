use super::{FeedQuerySource, FeedStore};
use crate::error::Result;
use crate::models::{EmbeddedFeedRow, FeedPageRequest, FeedPictureRow, FeedRow};
use async_trait::async_trait;
use sqlx::PgPool;

/// Page of feeds visible to `$1`, narrowed by writer (`$2`) and a contents pattern
/// (`$3`, built by `contains_pattern`).
///
/// `$4`/`$5` are limit/offset. Every listing query starts from this CTE so the
/// three shapes page identically.
const FEED_PAGE_CTE: &str = r#"
    WITH page AS (
        SELECT f.feed_id, f.contents, f.location, f.created_at, f.writer_user_id,
               u.nick_name AS writer_nm, u.pic AS writer_pic,
               EXISTS (
                   SELECT 1 FROM feed_like l
                   WHERE l.feed_id = f.feed_id AND l.user_id = $1
               ) AS is_like
        FROM feed f
        JOIN users u ON u.user_id = f.writer_user_id
        WHERE ($2::BIGINT IS NULL OR f.writer_user_id = $2)
          AND ($3::TEXT IS NULL OR f.contents ILIKE $3 ESCAPE '\')
        ORDER BY f.feed_id DESC
        LIMIT $4 OFFSET $5
    )
"#;

/// `ILIKE` pattern matching `search` literally anywhere in the contents
fn contains_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// Repository for the `feed` table
#[derive(Clone)]
pub struct FeedRepository {
    pool: PgPool,
}

impl FeedRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FeedQuerySource for FeedRepository {
    async fn list_feeds(&self, req: &FeedPageRequest) -> Result<Vec<FeedRow>> {
        let query = format!(
            r#"{FEED_PAGE_CTE}
            SELECT feed_id, contents, location, created_at, writer_user_id,
                   writer_nm, writer_pic, is_like
            FROM page
            ORDER BY feed_id DESC
            "#
        );

        let rows = sqlx::query_as::<_, FeedRow>(&query)
            .bind(req.signed_user_id)
            .bind(req.filter.profile_user_id)
            .bind(req.filter.search.as_deref().map(contains_pattern))
            .bind(req.limit)
            .bind(req.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn list_feeds_with_pictures(
        &self,
        req: &FeedPageRequest,
    ) -> Result<Vec<FeedPictureRow>> {
        // LEFT JOIN keeps feeds without pictures as a single row with a NULL pic
        let query = format!(
            r#"{FEED_PAGE_CTE}
            SELECT page.feed_id, page.contents, page.location, page.created_at,
                   page.writer_user_id, page.writer_nm, page.writer_pic, page.is_like,
                   p.pic
            FROM page
            LEFT JOIN feed_pic p ON p.feed_id = page.feed_id
            ORDER BY page.feed_id DESC, p.seq ASC
            "#
        );

        let rows = sqlx::query_as::<_, FeedPictureRow>(&query)
            .bind(req.signed_user_id)
            .bind(req.filter.profile_user_id)
            .bind(req.filter.search.as_deref().map(contains_pattern))
            .bind(req.limit)
            .bind(req.offset)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    async fn list_feeds_with_pictures_and_comments(
        &self,
        req: &FeedPageRequest,
        comment_limit: i64,
    ) -> Result<Vec<EmbeddedFeedRow>> {
        let query = format!(
            r#"{FEED_PAGE_CTE}
            SELECT page.feed_id, page.contents, page.location, page.created_at,
                   page.writer_user_id, page.writer_nm, page.writer_pic, page.is_like,
                   COALESCE(
                       (SELECT json_agg(p.pic ORDER BY p.seq)
                        FROM feed_pic p
                        WHERE p.feed_id = page.feed_id),
                       '[]'::json
                   ) AS pics,
                   COALESCE(
                       (SELECT json_agg(c ORDER BY c.feed_comment_id DESC)
                        FROM (
                            SELECT fc.feed_comment_id, fc.feed_id, fc.comment,
                                   fc.user_id AS writer_user_id,
                                   u.nick_name AS writer_nm, u.pic AS writer_pic
                            FROM feed_comment fc
                            JOIN users u ON u.user_id = fc.user_id
                            WHERE fc.feed_id = page.feed_id
                            ORDER BY fc.feed_comment_id DESC
                            LIMIT $6
                        ) c),
                       '[]'::json
                   ) AS comments
            FROM page
            ORDER BY page.feed_id DESC
            "#
        );

        let rows = sqlx::query_as::<_, EmbeddedFeedRow>(&query)
            .bind(req.signed_user_id)
            .bind(req.filter.profile_user_id)
            .bind(req.filter.search.as_deref().map(contains_pattern))
            .bind(req.limit)
            .bind(req.offset)
            .bind(comment_limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }
}

#[async_trait]
impl FeedStore for FeedRepository {
    async fn insert_feed(
        &self,
        writer_user_id: i64,
        contents: Option<&str>,
        location: Option<&str>,
    ) -> Result<i64> {
        let feed_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO feed (writer_user_id, contents, location)
            VALUES ($1, $2, $3)
            RETURNING feed_id
            "#,
        )
        .bind(writer_user_id)
        .bind(contents)
        .bind(location)
        .fetch_one(&self.pool)
        .await?;

        Ok(feed_id)
    }

    async fn insert_pictures(&self, feed_id: i64, pics: &[String]) -> Result<u64> {
        if pics.is_empty() {
            return Ok(0);
        }

        // ORDINALITY preserves upload order for later listing
        let result = sqlx::query(
            r#"
            INSERT INTO feed_pic (feed_id, pic, seq)
            SELECT $1, t.pic, t.ord::INT
            FROM UNNEST($2::TEXT[]) WITH ORDINALITY AS t(pic, ord)
            "#,
        )
        .bind(feed_id)
        .bind(pics)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn remove_feed(&self, feed_id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM feed WHERE feed_id = $1")
            .bind(feed_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn delete_feed(&self, feed_id: i64, writer_user_id: i64) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM feed
            WHERE feed_id = $1 AND writer_user_id = $2
            "#,
        )
        .bind(feed_id)
        .bind(writer_user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}
