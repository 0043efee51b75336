//! In-memory feed store for integration tests
//!
//! Implements every collaborator trait over plain collections so the listing
//! strategies, registration and deletion can be exercised without PostgreSQL.
//! Query calls are counted to verify round trips per strategy.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use feed_post_service::db::{CommentSource, FeedQuerySource, FeedStore, PictureSource};
use feed_post_service::error::Result;
use feed_post_service::models::{
    EmbeddedFeedRow, FeedComment, FeedPageRequest, FeedPicture, FeedPictureRow, FeedRow,
};
use feed_post_service::models::PictureUpload;
use feed_post_service::storage::{BlobStorage, LocalBlobStorage};
use sqlx::types::Json;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
struct StoredFeed {
    writer_user_id: i64,
    contents: Option<String>,
    location: Option<String>,
    created_at: chrono::DateTime<Utc>,
}

#[derive(Default)]
struct State {
    users: HashMap<i64, (String, Option<String>)>,
    feeds: BTreeMap<i64, StoredFeed>,
    pics: Vec<FeedPicture>,
    comments: Vec<FeedComment>,
    likes: HashSet<(i64, i64)>,
    next_feed_id: i64,
    next_comment_id: i64,
}

/// Shared in-memory store; clones see the same data
#[derive(Clone, Default)]
pub struct InMemoryFeedStore {
    state: Arc<Mutex<State>>,
    query_calls: Arc<AtomicUsize>,
}

impl InMemoryFeedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user_id: i64, nick_name: &str) {
        let mut state = self.state.lock().unwrap();
        state
            .users
            .insert(user_id, (nick_name.to_string(), Some(format!("{}.jpg", nick_name))));
    }

    /// Insert a feed directly, returning its id
    pub fn seed_feed(&self, writer_user_id: i64, contents: &str, pics: &[&str]) -> i64 {
        let mut state = self.state.lock().unwrap();
        state.next_feed_id += 1;
        let feed_id = state.next_feed_id;
        let created_at = Utc.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap()
            + Duration::minutes(feed_id);
        state.feeds.insert(
            feed_id,
            StoredFeed {
                writer_user_id,
                contents: Some(contents.to_string()),
                location: Some("Seoul".to_string()),
                created_at,
            },
        );
        for pic in pics {
            state.pics.push(FeedPicture {
                feed_id,
                pic: pic.to_string(),
            });
        }
        feed_id
    }

    pub fn seed_comments(&self, feed_id: i64, writer_user_id: i64, count: usize) {
        let mut state = self.state.lock().unwrap();
        let (writer_nm, writer_pic) = state
            .users
            .get(&writer_user_id)
            .cloned()
            .map(|(nm, pic)| (Some(nm), pic))
            .unwrap_or((None, None));
        for i in 0..count {
            state.next_comment_id += 1;
            let feed_comment_id = state.next_comment_id;
            state.comments.push(FeedComment {
                feed_comment_id,
                feed_id,
                comment: format!("comment {} on feed {}", i, feed_id),
                writer_user_id,
                writer_nm: writer_nm.clone(),
                writer_pic: writer_pic.clone(),
            });
        }
    }

    pub fn like(&self, feed_id: i64, user_id: i64) {
        self.state.lock().unwrap().likes.insert((feed_id, user_id));
    }

    pub fn feed_exists(&self, feed_id: i64) -> bool {
        self.state.lock().unwrap().feeds.contains_key(&feed_id)
    }

    pub fn feed_count(&self) -> usize {
        self.state.lock().unwrap().feeds.len()
    }

    pub fn pictures_of(&self, feed_id: i64) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .pics
            .iter()
            .filter(|p| p.feed_id == feed_id)
            .map(|p| p.pic.clone())
            .collect()
    }

    /// Number of read queries issued so far
    pub fn query_calls(&self) -> usize {
        self.query_calls.load(Ordering::SeqCst)
    }

    pub fn reset_query_calls(&self) {
        self.query_calls.store(0, Ordering::SeqCst);
    }

    fn record_query(&self) {
        self.query_calls.fetch_add(1, Ordering::SeqCst);
    }

    fn page(&self, req: &FeedPageRequest) -> Vec<FeedRow> {
        let state = self.state.lock().unwrap();
        let search = req.filter.search.as_ref().map(|s| s.to_lowercase());

        state
            .feeds
            .iter()
            .rev()
            .filter(|(_, feed)| {
                req.filter
                    .profile_user_id
                    .map_or(true, |writer| feed.writer_user_id == writer)
            })
            .filter(|(_, feed)| match &search {
                Some(search) => feed
                    .contents
                    .as_deref()
                    .map_or(false, |c| c.to_lowercase().contains(search)),
                None => true,
            })
            .skip(req.offset as usize)
            .take(req.limit as usize)
            .map(|(feed_id, feed)| {
                let writer = state.users.get(&feed.writer_user_id);
                FeedRow {
                    feed_id: *feed_id,
                    contents: feed.contents.clone(),
                    location: feed.location.clone(),
                    created_at: feed.created_at,
                    writer_user_id: feed.writer_user_id,
                    writer_nm: writer.map(|(nm, _)| nm.clone()),
                    writer_pic: writer.and_then(|(_, pic)| pic.clone()),
                    is_like: state.likes.contains(&(*feed_id, req.signed_user_id)),
                }
            })
            .collect()
    }

    fn pics_for(&self, feed_id: i64) -> Vec<String> {
        self.pictures_of(feed_id)
    }

    fn comments_for(&self, feed_id: i64, offset: usize, limit: usize) -> Vec<FeedComment> {
        let state = self.state.lock().unwrap();
        let mut comments: Vec<FeedComment> = state
            .comments
            .iter()
            .filter(|c| c.feed_id == feed_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| b.feed_comment_id.cmp(&a.feed_comment_id));
        comments.into_iter().skip(offset).take(limit).collect()
    }
}

#[async_trait]
impl FeedQuerySource for InMemoryFeedStore {
    async fn list_feeds(&self, req: &FeedPageRequest) -> Result<Vec<FeedRow>> {
        self.record_query();
        Ok(self.page(req))
    }

    async fn list_feeds_with_pictures(
        &self,
        req: &FeedPageRequest,
    ) -> Result<Vec<FeedPictureRow>> {
        self.record_query();
        let mut rows = Vec::new();
        for feed in self.page(req) {
            let pics = self.pics_for(feed.feed_id);
            let pics: Vec<Option<String>> = if pics.is_empty() {
                vec![None]
            } else {
                pics.into_iter().map(Some).collect()
            };
            for pic in pics {
                rows.push(FeedPictureRow {
                    feed_id: feed.feed_id,
                    contents: feed.contents.clone(),
                    location: feed.location.clone(),
                    created_at: feed.created_at,
                    writer_user_id: feed.writer_user_id,
                    writer_nm: feed.writer_nm.clone(),
                    writer_pic: feed.writer_pic.clone(),
                    is_like: feed.is_like,
                    pic,
                });
            }
        }
        Ok(rows)
    }

    async fn list_feeds_with_pictures_and_comments(
        &self,
        req: &FeedPageRequest,
        comment_limit: i64,
    ) -> Result<Vec<EmbeddedFeedRow>> {
        self.record_query();
        Ok(self
            .page(req)
            .into_iter()
            .map(|feed| {
                let pics = self.pics_for(feed.feed_id);
                let comments = self.comments_for(feed.feed_id, 0, comment_limit as usize);
                EmbeddedFeedRow {
                    feed,
                    pics: Json(pics),
                    comments: Json(comments),
                }
            })
            .collect())
    }
}

#[async_trait]
impl PictureSource for InMemoryFeedStore {
    async fn pictures_by_feed_id(&self, feed_id: i64) -> Result<Vec<String>> {
        self.record_query();
        Ok(self.pics_for(feed_id))
    }

    async fn pictures_by_feed_ids(&self, feed_ids: &[i64]) -> Result<Vec<FeedPicture>> {
        self.record_query();
        let state = self.state.lock().unwrap();
        Ok(state
            .pics
            .iter()
            .filter(|p| feed_ids.contains(&p.feed_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CommentSource for InMemoryFeedStore {
    async fn comments_by_feed_id(
        &self,
        feed_id: i64,
        offset: i64,
        limit: i64,
    ) -> Result<Vec<FeedComment>> {
        self.record_query();
        Ok(self.comments_for(feed_id, offset as usize, limit as usize))
    }

    async fn comments_by_feed_ids_limited(
        &self,
        feed_ids: &[i64],
        limit: i64,
    ) -> Result<Vec<FeedComment>> {
        self.record_query();
        Ok(feed_ids
            .iter()
            .flat_map(|feed_id| self.comments_for(*feed_id, 0, limit as usize))
            .collect())
    }
}

#[async_trait]
impl FeedStore for InMemoryFeedStore {
    async fn insert_feed(
        &self,
        writer_user_id: i64,
        contents: Option<&str>,
        location: Option<&str>,
    ) -> Result<i64> {
        let mut state = self.state.lock().unwrap();
        state.next_feed_id += 1;
        let feed_id = state.next_feed_id;
        state.feeds.insert(
            feed_id,
            StoredFeed {
                writer_user_id,
                contents: contents.map(str::to_string),
                location: location.map(str::to_string),
                created_at: Utc::now(),
            },
        );
        Ok(feed_id)
    }

    async fn insert_pictures(&self, feed_id: i64, pics: &[String]) -> Result<u64> {
        let mut state = self.state.lock().unwrap();
        for pic in pics {
            state.pics.push(FeedPicture {
                feed_id,
                pic: pic.clone(),
            });
        }
        Ok(pics.len() as u64)
    }

    async fn remove_feed(&self, feed_id: i64) -> Result<u64> {
        let mut state = self.state.lock().unwrap();
        Ok(remove_cascade(&mut state, feed_id))
    }

    async fn delete_feed(&self, feed_id: i64, writer_user_id: i64) -> Result<u64> {
        let mut state = self.state.lock().unwrap();
        let owned = state
            .feeds
            .get(&feed_id)
            .map_or(false, |feed| feed.writer_user_id == writer_user_id);
        if !owned {
            return Ok(0);
        }
        Ok(remove_cascade(&mut state, feed_id))
    }
}

fn remove_cascade(state: &mut State, feed_id: i64) -> u64 {
    if state.feeds.remove(&feed_id).is_none() {
        return 0;
    }
    state.pics.retain(|p| p.feed_id != feed_id);
    state.comments.retain(|c| c.feed_id != feed_id);
    state.likes.retain(|(liked_feed, _)| *liked_feed != feed_id);
    1
}

/// Local storage that fails the `fail_on`-th write (1-based)
pub struct FlakyBlobStorage {
    inner: LocalBlobStorage,
    fail_on: usize,
    writes: AtomicUsize,
}

impl FlakyBlobStorage {
    pub fn new(inner: LocalBlobStorage, fail_on: usize) -> Self {
        Self {
            inner,
            fail_on,
            writes: AtomicUsize::new(0),
        }
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlobStorage for FlakyBlobStorage {
    async fn make_folder(&self, path: &str) -> io::Result<()> {
        self.inner.make_folder(path).await
    }

    fn random_filename(&self, upload: &PictureUpload) -> String {
        self.inner.random_filename(upload)
    }

    async fn write(&self, upload: &PictureUpload, path: &str) -> io::Result<()> {
        let attempt = self.writes.fetch_add(1, Ordering::SeqCst) + 1;
        if attempt == self.fail_on {
            return Err(io::Error::new(io::ErrorKind::Other, "disk quota exceeded"));
        }
        self.inner.write(upload, path).await
    }

    async fn delete_folder(&self, path: &str, recursive: bool) -> io::Result<()> {
        self.inner.delete_folder(path, recursive).await
    }
}

pub fn picture(name: &str) -> PictureUpload {
    PictureUpload {
        original_filename: Some(name.to_string()),
        data: bytes::Bytes::from(format!("image bytes of {}", name)),
    }
}
