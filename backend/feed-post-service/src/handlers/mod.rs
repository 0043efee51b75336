/// HTTP handlers for feed endpoints
///
/// - `POST   /api/v1/feeds`            register a feed with pictures (multipart)
/// - `GET    /api/v1/feeds`            page of feeds with pictures and comment previews
/// - `DELETE /api/v1/feeds/{feed_id}`  delete a feed owned by the caller
pub mod feeds;

pub use feeds::{configure, create_feed, delete_feed, get_feeds, FeedHandlerState};
