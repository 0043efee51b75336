/// Business logic layer
///
/// - `aggregation`: grouping of flat rows into feed summaries
/// - `feed_list`: feed page assembly strategies
/// - `feeds`: feed registration and deletion
pub mod aggregation;
pub mod feed_list;
pub mod feeds;

pub use feed_list::FeedListService;
pub use feeds::FeedService;
