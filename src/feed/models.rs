//! Collection schemas.
//!
//! One struct per record store collection, deserialized at the store
//! boundary. Counters default to zero when absent; `score` stays an
//! `Option` so a record that has never been scored is distinguishable from
//! one scored zero. `created` is kept as the raw stored value because the
//! store holds a mix of RFC3339 strings and numeric epochs.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FeedError;
use crate::ranking::Rankable;

/// Maximum title length in bytes.
pub const MAX_TITLE_LEN: usize = 200;
/// Maximum URL length in bytes.
pub const MAX_URL_LEN: usize = 200;
/// Maximum forum tag length in bytes.
pub const MAX_SUB_LEN: usize = 50;
/// Maximum body length in bytes.
pub const MAX_CONTENT_LEN: usize = 3000;

/// A top-level submitted post (link or text) in a forum tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    #[serde(default)]
    pub id: String,
    /// Empty for anonymous submissions.
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub title: String,
    /// Forum tag this post belongs to.
    #[serde(default)]
    pub sub: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub upvotes: f64,
    #[serde(default)]
    pub downvotes: f64,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub comment_count: f64,
    #[serde(default)]
    pub created: Value,
}

/// A comment on a post; `parent` is a flat reply-to comment id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub post_id: String,
    #[serde(default)]
    pub parent: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub user_name: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub upvotes: f64,
    #[serde(default)]
    pub downvotes: f64,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub created: Value,
}

/// Idempotency marker: its existence records that an identity has already
/// voted on a target. Keyed by `target_id + user_id`, no other payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteReceipt {
    pub id: String,
}

/// Which way a vote goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteDirection {
    Up,
    Down,
}

/// What a vote targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetKind {
    Post,
    Comment,
}

impl TargetKind {
    /// Collection the target records live in.
    #[must_use]
    pub fn collection(self) -> &'static str {
        match self {
            Self::Post => crate::constants::POSTS_COLLECTION,
            Self::Comment => crate::constants::COMMENTS_COLLECTION,
        }
    }

    /// Collection the vote receipts for this kind live in.
    #[must_use]
    pub fn votes_collection(self) -> &'static str {
        match self {
            Self::Post => crate::constants::POST_VOTES_COLLECTION,
            Self::Comment => crate::constants::COMMENT_VOTES_COLLECTION,
        }
    }

    #[must_use]
    pub fn noun(self) -> &'static str {
        match self {
            Self::Post => "post",
            Self::Comment => "comment",
        }
    }
}

/// A record whose vote counters can be adjusted.
pub trait Votable {
    fn upvotes_mut(&mut self) -> &mut f64;
    fn downvotes_mut(&mut self) -> &mut f64;
    fn set_score(&mut self, score: f64);
    fn counters(&self) -> (f64, f64);

    /// Apply a vote of the given magnitude and recompute the stored score.
    fn apply_vote(&mut self, direction: VoteDirection, magnitude: f64) {
        match direction {
            VoteDirection::Up => *self.upvotes_mut() += magnitude,
            VoteDirection::Down => *self.downvotes_mut() += magnitude,
        }
        let (up, down) = self.counters();
        self.set_score(up - down);
    }
}

impl Votable for Post {
    fn upvotes_mut(&mut self) -> &mut f64 {
        &mut self.upvotes
    }
    fn downvotes_mut(&mut self) -> &mut f64 {
        &mut self.downvotes
    }
    fn set_score(&mut self, score: f64) {
        self.score = Some(score);
    }
    fn counters(&self) -> (f64, f64) {
        (self.upvotes, self.downvotes)
    }
}

impl Votable for Comment {
    fn upvotes_mut(&mut self) -> &mut f64 {
        &mut self.upvotes
    }
    fn downvotes_mut(&mut self) -> &mut f64 {
        &mut self.downvotes
    }
    fn set_score(&mut self, score: f64) {
        self.score = Some(score);
    }
    fn counters(&self) -> (f64, f64) {
        (self.upvotes, self.downvotes)
    }
}

impl Rankable for Post {
    fn raw_score(&self) -> Option<f64> {
        self.score
    }
    fn created(&self) -> &Value {
        &self.created
    }
}

impl Rankable for Comment {
    fn raw_score(&self) -> Option<f64> {
        self.score
    }
    fn created(&self) -> &Value {
        &self.created
    }
}

/// Client-submitted post fields, validated before anything is written.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub sub: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub url: String,
}

impl PostDraft {
    /// Check the draft against the posting rules.
    ///
    /// # Errors
    ///
    /// Returns `ValidationFailed` naming the first rule violated.
    pub fn validate(&self) -> Result<(), FeedError> {
        if self.sub.is_empty() || self.title.is_empty() {
            return Err(FeedError::ValidationFailed(
                "both title and sub are required".to_string(),
            ));
        }
        if self.url.is_empty() && self.content.is_empty() {
            return Err(FeedError::ValidationFailed(
                "url or content required".to_string(),
            ));
        }
        if !self.url.is_empty() && !self.content.is_empty() {
            return Err(FeedError::ValidationFailed(
                "url and content are mutually exclusive".to_string(),
            ));
        }
        if self.title.len() > MAX_TITLE_LEN || self.url.len() > MAX_URL_LEN {
            return Err(FeedError::ValidationFailed(
                "post url or title too long".to_string(),
            ));
        }
        if self.sub.len() > MAX_SUB_LEN {
            return Err(FeedError::ValidationFailed("post sub too long".to_string()));
        }
        if self.content.len() > MAX_CONTENT_LEN {
            return Err(FeedError::ValidationFailed(
                "post content too long".to_string(),
            ));
        }
        Ok(())
    }
}

/// Client-submitted comment fields.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDraft {
    #[serde(default)]
    pub post_id: String,
    #[serde(default)]
    pub parent: String,
    #[serde(default)]
    pub content: String,
}
