/// Feed service - handles feed registration with pictures and owner-scoped deletion
use crate::db::FeedStore;
use crate::error::{AppError, Result};
use crate::models::{CreateFeedRequest, CreateFeedResponse, PictureUpload, MAX_PICTURES_PER_FEED};
use crate::storage::{feed_folder, BlobStorage};
use std::sync::Arc;
use tracing::{error, info, warn};
use validator::Validate;

pub struct FeedService {
    store: Arc<dyn FeedStore>,
    storage: Arc<dyn BlobStorage>,
}

impl FeedService {
    pub fn new(store: Arc<dyn FeedStore>, storage: Arc<dyn BlobStorage>) -> Self {
        Self { store, storage }
    }

    /// Create a feed and store its pictures under `feed/{feed_id}`.
    ///
    /// Pictures are written one at a time. The first failed write removes the
    /// feed folder and the feed row, and the whole registration fails.
    pub async fn create_feed(
        &self,
        writer_user_id: i64,
        req: &CreateFeedRequest,
        pics: Vec<PictureUpload>,
    ) -> Result<CreateFeedResponse> {
        req.validate()?;
        if pics.is_empty() {
            return Err(AppError::Validation("at least one picture is required".into()));
        }
        if pics.len() > MAX_PICTURES_PER_FEED {
            return Err(AppError::Validation(format!(
                "at most {} pictures are allowed per feed",
                MAX_PICTURES_PER_FEED
            )));
        }

        let feed_id = self
            .store
            .insert_feed(writer_user_id, req.contents.as_deref(), req.location.as_deref())
            .await?;

        let folder = feed_folder(feed_id);
        if let Err(e) = self.storage.make_folder(&folder).await {
            self.abandon_registration(feed_id, &folder).await;
            return Err(AppError::RegistrationFailed(format!(
                "could not create folder {}: {}",
                folder, e
            )));
        }

        let mut pic_names = Vec::with_capacity(pics.len());
        for pic in &pics {
            let pic_name = self.storage.random_filename(pic);
            let path = format!("{}/{}", folder, pic_name);

            if let Err(e) = self.storage.write(pic, &path).await {
                error!(feed_id, path = %path, error = %e, "picture write failed");
                self.abandon_registration(feed_id, &folder).await;
                return Err(AppError::RegistrationFailed(format!(
                    "could not store picture {}: {}",
                    pic_name, e
                )));
            }
            pic_names.push(pic_name);
        }

        if let Err(e) = self.store.insert_pictures(feed_id, &pic_names).await {
            self.abandon_registration(feed_id, &folder).await;
            return Err(e);
        }

        info!(feed_id, writer_user_id, pics = pic_names.len(), "feed registered");

        Ok(CreateFeedResponse {
            feed_id,
            pics: pic_names,
        })
    }

    /// Delete a feed owned by `signed_user_id`.
    ///
    /// Ownership is part of the delete predicate; zero affected rows means the feed
    /// does not exist or belongs to someone else.
    pub async fn delete_feed(&self, feed_id: i64, signed_user_id: i64) -> Result<()> {
        let affected_rows = self.store.delete_feed(feed_id, signed_user_id).await?;
        info!(feed_id, signed_user_id, affected_rows, "delete feed");

        if affected_rows == 0 {
            return Err(AppError::DeletionFailed {
                feed_id,
                user_id: signed_user_id,
            });
        }

        if let Err(e) = self.storage.delete_folder(&feed_folder(feed_id), true).await {
            warn!(feed_id, error = %e, "feed picture folder cleanup failed");
        }

        Ok(())
    }

    async fn abandon_registration(&self, feed_id: i64, folder: &str) {
        if let Err(e) = self.storage.delete_folder(folder, true).await {
            error!(feed_id, folder, error = %e, "failed to remove partial feed folder");
        }
        if let Err(e) = self.store.remove_feed(feed_id).await {
            error!(feed_id, error = %e, "failed to remove feed after registration failure");
        }
    }
}
