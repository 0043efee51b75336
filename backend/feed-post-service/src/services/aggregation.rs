/// Row grouping and comment preview assembly shared by the listing strategies.
///
/// All functions here are pure: they turn the flat results of the query, picture
/// and comment sources into nested `FeedSummary` values without touching storage.
use crate::models::{
    CommentPreview, EmbeddedFeedRow, FeedComment, FeedPicture, FeedPictureRow, FeedSummary,
};
use std::collections::HashMap;

/// Rows grouped by feed id.
///
/// Output order comes from the page's feed list; groups are taken out by id.
#[derive(Debug)]
pub struct FeedGroups<T> {
    groups: HashMap<i64, Vec<T>>,
}

impl<T> Default for FeedGroups<T> {
    fn default() -> Self {
        Self {
            groups: HashMap::new(),
        }
    }
}

impl<T> FeedGroups<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Group for `feed_id`, created empty on first access
    pub fn get_or_insert_default(&mut self, feed_id: i64) -> &mut Vec<T> {
        self.groups.entry(feed_id).or_default()
    }

    pub fn push(&mut self, feed_id: i64, item: T) {
        self.get_or_insert_default(feed_id).push(item);
    }

    /// Remove and return the group for `feed_id`
    pub fn take(&mut self, feed_id: i64) -> Option<Vec<T>> {
        self.groups.remove(&feed_id)
    }
}

impl<T> FromIterator<(i64, T)> for FeedGroups<T> {
    fn from_iter<I: IntoIterator<Item = (i64, T)>>(iter: I) -> Self {
        let mut groups = FeedGroups::new();
        for (feed_id, item) in iter {
            groups.push(feed_id, item);
        }
        groups
    }
}

/// Build a preview from comments fetched with limit `preview_size + 1`.
///
/// The extra row only signals that more comments exist and is never shown.
pub fn comment_preview(mut comments: Vec<FeedComment>, preview_size: usize) -> CommentPreview {
    let has_more = comments.len() > preview_size;
    comments.truncate(preview_size);

    CommentPreview { comments, has_more }
}

/// Fold contiguous feed + picture join rows into one summary per feed.
///
/// A feed id change starts a new summary; rows are never re-sorted, so rows of a
/// feed must be adjacent. A NULL picture (outer join, feed without pictures) still
/// yields the summary, with no picture appended.
pub fn group_picture_rows(rows: Vec<FeedPictureRow>) -> Vec<FeedSummary> {
    let mut feeds: Vec<FeedSummary> = Vec::new();
    let mut current: Option<i64> = None;

    for row in rows {
        if current != Some(row.feed_id) {
            current = Some(row.feed_id);
            feeds.push(FeedSummary::from(row.feed()));
        }

        if let (Some(pic), Some(feed)) = (row.pic, feeds.last_mut()) {
            feed.pics.push(pic);
        }
    }

    feeds
}

/// Attach pictures fetched for a whole page to their feeds
pub fn attach_pictures(feeds: &mut [FeedSummary], pictures: Vec<FeedPicture>) {
    let mut groups: FeedGroups<String> = pictures
        .into_iter()
        .map(|picture| (picture.feed_id, picture.pic))
        .collect();

    for feed in feeds.iter_mut() {
        feed.pics = groups.take(feed.feed_id).unwrap_or_default();
    }
}

/// Attach comment previews from one batched fetch of `preview_size + 1` comments per feed.
///
/// Every feed receives a preview; feeds without comments get an empty one.
pub fn attach_comment_previews(
    feeds: &mut [FeedSummary],
    comments: Vec<FeedComment>,
    preview_size: usize,
) {
    let mut groups: FeedGroups<FeedComment> = comments
        .into_iter()
        .map(|comment| (comment.feed_id, comment))
        .collect();

    for feed in feeds.iter_mut() {
        feed.comment = match groups.take(feed.feed_id) {
            Some(group) => comment_preview(group, preview_size),
            None => CommentPreview::default(),
        };
    }
}

/// One summary per embedded row, comments already capped at `preview_size + 1` by the source
pub fn summaries_from_embedded(rows: Vec<EmbeddedFeedRow>, preview_size: usize) -> Vec<FeedSummary> {
    rows.into_iter()
        .map(|row| {
            let mut feed = FeedSummary::from(row.feed);
            feed.pics = row.pics.0;
            feed.comment = comment_preview(row.comments.0, preview_size);
            feed
        })
        .collect()
}
