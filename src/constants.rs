//! Shared constants used across the application.

/// Reference instant for hot ranking (2005-12-08T07:46:43Z).
///
/// Ages are measured from this fixed point so ranks stay stable across
/// process restarts; only differences between ranks matter.
pub const RANKING_EPOCH: i64 = 1_134_028_003;

/// Seconds of age worth one full rank point.
pub const SECONDS_PER_RANK_POINT: f64 = 45_000.0;

/// Rank assigned to records with no stored score; sorts below everything.
pub const UNRANKED_SENTINEL: f64 = -10_000.0;

/// Hard cap on records fetched per feed read.
pub const FEED_LIMIT: u32 = 1000;

/// Record store collection holding posts.
pub const POSTS_COLLECTION: &str = "posts";

/// Record store collection holding comments.
pub const COMMENTS_COLLECTION: &str = "comments";

/// Vote receipt collection for posts.
pub const POST_VOTES_COLLECTION: &str = "post_votes";

/// Vote receipt collection for comments.
pub const COMMENT_VOTES_COLLECTION: &str = "comment_votes";
