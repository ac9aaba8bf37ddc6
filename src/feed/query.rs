//! Feed reads.
//!
//! The store is asked for records ordered by creation time (bounded, with a
//! restricted filter), then the result is re-sorted by hot rank — that
//! second sort is the order readers actually see.

use crate::constants::{COMMENTS_COLLECTION, FEED_LIMIT, POSTS_COLLECTION};
use crate::error::FeedError;
use crate::feed::models::{Comment, Post};
use crate::ranking;
use crate::store::{Filter, RecordStore};

/// Filter parameters for a post listing.
#[derive(Debug, Clone, Default)]
pub struct PostsQuery {
    pub min_score: Option<i64>,
    pub max_score: Option<i64>,
    pub sub: Option<String>,
    pub limit: Option<u32>,
}

/// Reads and ranks posts and comments.
#[derive(Debug, Clone)]
pub struct FeedQuery {
    store: RecordStore,
}

impl FeedQuery {
    #[must_use]
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    /// List posts matching the query, hot-ranked.
    ///
    /// An empty result is a valid result, not an error.
    ///
    /// # Errors
    ///
    /// Propagates record store failures.
    pub async fn list_posts(&self, query: &PostsQuery) -> Result<Vec<Post>, FeedError> {
        let mut filter = Filter::new();
        if let Some(min) = query.min_score {
            filter = filter.ge("score", min);
        }
        if let Some(max) = query.max_score {
            filter = filter.le("score", max);
        }
        // "all" is the front page, not a tag
        if let Some(sub) = query.sub.as_deref() {
            if !sub.is_empty() && sub != "all" {
                filter = filter.eq_str("sub", sub);
            }
        }

        let limit = match query.limit {
            Some(n) if n > 0 => n.min(FEED_LIMIT),
            _ => FEED_LIMIT,
        };

        let mut posts: Vec<Post> = self
            .store
            .read(POSTS_COLLECTION, &filter, "created", limit)
            .await?;
        ranking::sort_hot(&mut posts);
        Ok(posts)
    }

    /// List the comments of a post, hot-ranked.
    ///
    /// # Errors
    ///
    /// Propagates record store failures.
    pub async fn list_comments(&self, post_id: &str) -> Result<Vec<Comment>, FeedError> {
        let filter = Filter::new().eq_str("postId", post_id);
        let mut comments: Vec<Comment> = self
            .store
            .read(COMMENTS_COLLECTION, &filter, "created", FEED_LIMIT)
            .await?;
        ranking::sort_hot(&mut comments);
        Ok(comments)
    }
}
