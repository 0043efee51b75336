use actix_multipart::Multipart;
use actix_web::http::header::{self, ContentDisposition};
use actix_web::{web, HttpResponse};
use base64::{engine::general_purpose, Engine as _};
use bytes::BytesMut;
use futures::StreamExt;
use serde::Deserialize;
use std::sync::Arc;
use tracing::debug;

use crate::config::UploadLimits;
use crate::error::{AppError, Result};
use crate::middleware::UserId;
use crate::models::{
    CreateFeedRequest, FeedListFilter, FeedPageRequest, FeedPageResponse, PictureUpload,
    MAX_PICTURES_PER_FEED,
};
use crate::services::{FeedListService, FeedService};

const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Default, Deserialize)]
pub struct FeedQueryParams {
    pub limit: Option<u32>,
    pub cursor: Option<String>,
    pub profile_user_id: Option<i64>,
    pub search: Option<String>,
}

impl FeedQueryParams {
    pub(crate) fn decode_cursor(&self) -> Result<i64> {
        match &self.cursor {
            Some(cursor) => {
                let decoded = general_purpose::STANDARD
                    .decode(cursor)
                    .map_err(|_| AppError::BadRequest("Invalid cursor format".to_string()))?;

                let offset_str = String::from_utf8(decoded)
                    .map_err(|_| AppError::BadRequest("Invalid cursor encoding".to_string()))?;

                offset_str
                    .parse::<i64>()
                    .ok()
                    .filter(|offset| *offset >= 0)
                    .ok_or_else(|| AppError::BadRequest("Invalid cursor value".to_string()))
            }
            None => Ok(0),
        }
    }

    pub(crate) fn encode_cursor(offset: i64) -> String {
        general_purpose::STANDARD.encode(offset.to_string())
    }

    fn filter(&self) -> FeedListFilter {
        FeedListFilter {
            profile_user_id: self.profile_user_id,
            search: self
                .search
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }
}

pub struct FeedHandlerState {
    pub feed_list: Arc<FeedListService>,
    pub feeds: Arc<FeedService>,
    pub default_page_size: u32,
    pub upload_limits: UploadLimits,
}

/// Register routes under the `/feeds` scope
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/feeds")
            .service(
                web::resource("")
                    .route(web::get().to(get_feeds))
                    .route(web::post().to(create_feed)),
            )
            .service(web::resource("/{feed_id}").route(web::delete().to(delete_feed))),
    );
}

/// Create a feed from a multipart body: `contents`, `location` and repeated `pics`.
///
/// Byte limits and the picture count are enforced while the body is streamed, so
/// an oversized request is rejected before it is fully buffered.
pub async fn create_feed(
    state: web::Data<FeedHandlerState>,
    user_id: UserId,
    mut payload: Multipart,
) -> Result<HttpResponse> {
    let limits = state.upload_limits;
    let mut req = CreateFeedRequest::default();
    let mut pics = Vec::new();
    let mut total_bytes: usize = 0;

    while let Some(field) = payload.next().await {
        let mut field =
            field.map_err(|e| AppError::BadRequest(format!("Multipart error: {}", e)))?;

        let disposition = field
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|value| ContentDisposition::from_raw(value).ok());
        let name = disposition
            .as_ref()
            .and_then(|cd| cd.get_name())
            .unwrap_or_default()
            .to_string();
        let filename = disposition
            .as_ref()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);

        if name == "pics" && pics.len() == MAX_PICTURES_PER_FEED {
            return Err(AppError::Validation(format!(
                "at most {} pictures are allowed per feed",
                MAX_PICTURES_PER_FEED
            )));
        }

        let mut data = BytesMut::new();
        while let Some(chunk) = field.next().await {
            let chunk =
                chunk.map_err(|e| AppError::BadRequest(format!("Multipart read error: {}", e)))?;

            total_bytes += chunk.len();
            if total_bytes > limits.max_request_bytes {
                return Err(AppError::PayloadTooLarge(format!(
                    "upload exceeds {} bytes",
                    limits.max_request_bytes
                )));
            }
            if name == "pics" && data.len() + chunk.len() > limits.max_picture_bytes {
                return Err(AppError::PayloadTooLarge(format!(
                    "picture {} exceeds {} bytes",
                    filename.as_deref().unwrap_or("<unnamed>"),
                    limits.max_picture_bytes
                )));
            }

            data.extend_from_slice(&chunk);
        }

        match name.as_str() {
            "contents" => req.contents = Some(field_text(&name, &data)?),
            "location" => req.location = Some(field_text(&name, &data)?),
            "pics" => pics.push(PictureUpload {
                original_filename: filename,
                data: data.freeze(),
            }),
            _ => {}
        }
    }

    let created = state.feeds.create_feed(user_id.0, &req, pics).await?;

    Ok(HttpResponse::Created().json(created))
}

fn field_text(name: &str, data: &[u8]) -> Result<String> {
    String::from_utf8(data.to_vec())
        .map_err(|_| AppError::BadRequest(format!("Field '{}' is not valid UTF-8", name)))
}

/// Page of feeds for the signed user
pub async fn get_feeds(
    state: web::Data<FeedHandlerState>,
    user_id: UserId,
    query: web::Query<FeedQueryParams>,
) -> Result<HttpResponse> {
    let offset = query.decode_cursor()?;
    let limit = query
        .limit
        .unwrap_or(state.default_page_size)
        .clamp(1, MAX_PAGE_SIZE) as i64;

    debug!(user_id = user_id.0, limit, offset, "feed page request");

    let req = FeedPageRequest {
        signed_user_id: user_id.0,
        offset,
        limit,
        filter: query.filter(),
    };
    let feeds = state.feed_list.list_feeds(&req).await?;

    let has_more = feeds.len() as i64 == limit;
    let cursor = has_more.then(|| FeedQueryParams::encode_cursor(offset + limit));

    Ok(HttpResponse::Ok().json(FeedPageResponse {
        feeds,
        cursor,
        has_more,
    }))
}

/// Delete a feed owned by the signed user
pub async fn delete_feed(
    state: web::Data<FeedHandlerState>,
    user_id: UserId,
    feed_id: web::Path<i64>,
) -> Result<HttpResponse> {
    state.feeds.delete_feed(*feed_id, user_id.0).await?;

    Ok(HttpResponse::NoContent().finish())
}
