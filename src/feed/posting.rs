//! Posting pipeline.
//!
//! Validates and persists new posts and comments. Authorship is optional:
//! an empty session token produces an anonymous record. Comment creation
//! also maintains the denormalized comment counter on the parent post.

use chrono::Utc;
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::constants::{COMMENTS_COLLECTION, POSTS_COLLECTION};
use crate::error::FeedError;
use crate::feed::models::{Comment, CommentDraft, Post, PostDraft};
use crate::identity::IdentityClient;
use crate::store::RecordStore;

/// Creates posts and comments.
#[derive(Debug, Clone)]
pub struct PostingPipeline {
    store: RecordStore,
    identity: IdentityClient,
}

impl PostingPipeline {
    #[must_use]
    pub fn new(store: RecordStore, identity: IdentityClient) -> Self {
        Self { store, identity }
    }

    /// Validate and persist a new post. Returns its id.
    ///
    /// # Errors
    ///
    /// Fails with `ValidationFailed` before anything is written,
    /// `Unauthenticated` when a non-empty session does not resolve, and
    /// propagates collaborator failures.
    pub async fn create_post(
        &self,
        draft: &PostDraft,
        session_id: &str,
    ) -> Result<String, FeedError> {
        draft.validate()?;
        let (user_id, user_name) = self.resolve_author(session_id).await?;

        let post = Post {
            id: Uuid::new_v4().to_string(),
            user_id,
            user_name,
            title: draft.title.clone(),
            sub: draft.sub.clone(),
            content: draft.content.clone(),
            url: draft.url.clone(),
            upvotes: 0.0,
            downvotes: 0.0,
            score: Some(0.0),
            comment_count: 0.0,
            created: json!(Utc::now().to_rfc3339()),
        };

        self.store.create(POSTS_COLLECTION, &post).await?;
        info!(post = %post.id, sub = %post.sub, "post created");
        Ok(post.id)
    }

    /// Validate and persist a new comment, bumping the parent post's
    /// comment counter. Returns the comment id.
    ///
    /// # Errors
    ///
    /// Fails with `MissingParent` on an empty post id, `TargetNotFound`
    /// when the parent does not exist, `AmbiguousParent` when more than one
    /// record shares the parent id, `Unauthenticated` when a non-empty
    /// session does not resolve, and propagates collaborator failures.
    pub async fn create_comment(
        &self,
        draft: &CommentDraft,
        session_id: &str,
    ) -> Result<String, FeedError> {
        let (user_id, user_name) = self.resolve_author(session_id).await?;

        if draft.post_id.is_empty() {
            return Err(FeedError::MissingParent);
        }

        let mut parents: Vec<Post> = self
            .store
            .read_by_id(POSTS_COLLECTION, &draft.post_id)
            .await?;
        if parents.is_empty() {
            return Err(FeedError::TargetNotFound("post"));
        }
        if parents.len() > 1 {
            return Err(FeedError::AmbiguousParent);
        }
        let mut parent = parents.remove(0);

        let comment = Comment {
            id: Uuid::new_v4().to_string(),
            post_id: draft.post_id.clone(),
            parent: draft.parent.clone(),
            user_id,
            user_name,
            content: draft.content.clone(),
            upvotes: 0.0,
            downvotes: 0.0,
            score: Some(0.0),
            created: json!(Utc::now().to_rfc3339()),
        };
        self.store.create(COMMENTS_COLLECTION, &comment).await?;

        // Read-increment-write; a concurrent comment can race this counter,
        // the store exposes no atomic increment to close it.
        parent.comment_count += 1.0;
        self.store
            .update(POSTS_COLLECTION, &draft.post_id, &parent)
            .await?;

        info!(comment = %comment.id, post = %draft.post_id, "comment created");
        Ok(comment.id)
    }

    /// Resolve the author for an optional session: empty session means
    /// anonymous, a present session must resolve to a user and account.
    async fn resolve_author(&self, session_id: &str) -> Result<(String, String), FeedError> {
        if session_id.is_empty() {
            return Ok((String::new(), String::new()));
        }

        let user_id = match self.identity.resolve_session(session_id).await {
            Ok(session) if !session.user_id.is_empty() => session.user_id,
            _ => return Err(FeedError::Unauthenticated),
        };
        let account = self.identity.read_account(&user_id).await?;
        Ok((user_id, account.username))
    }
}
