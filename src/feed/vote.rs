//! Vote ledger.
//!
//! Enforces at-most-one-vote-per-identity-per-target via vote receipts, with
//! a moderator exception path: moderators may re-vote any target, each vote
//! carrying a fresh random magnitude in 4..=16, and leave no receipt.

use std::sync::Arc;

use rand::Rng;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::error::FeedError;
use crate::feed::models::{Comment, Post, TargetKind, Votable, VoteDirection, VoteReceipt};
use crate::identity::IdentityClient;
use crate::store::RecordStore;

/// Magnitude range for a moderator vote, inclusive.
const MOD_VOTE_MIN: i32 = 4;
const MOD_VOTE_MAX: i32 = 16;

/// Applies votes to posts and comments.
#[derive(Debug, Clone)]
pub struct VoteLedger {
    store: RecordStore,
    identity: IdentityClient,
    config: Arc<Config>,
}

impl VoteLedger {
    #[must_use]
    pub fn new(store: RecordStore, identity: IdentityClient, config: Arc<Config>) -> Self {
        Self {
            store,
            identity,
            config,
        }
    }

    /// Cast a vote on a post or comment.
    ///
    /// # Errors
    ///
    /// Fails with `MissingTarget` on an empty id, `TargetNotFound` when the
    /// target does not exist, `Unauthenticated` when the session does not
    /// resolve to an identity, `AlreadyVoted` when a non-moderator has a
    /// receipt for this target, and propagates collaborator failures.
    pub async fn cast_vote(
        &self,
        target_id: &str,
        kind: TargetKind,
        session_id: &str,
        direction: VoteDirection,
    ) -> Result<(), FeedError> {
        match kind {
            TargetKind::Post => {
                self.vote_on::<Post>(target_id, kind, session_id, direction)
                    .await
            }
            TargetKind::Comment => {
                self.vote_on::<Comment>(target_id, kind, session_id, direction)
                    .await
            }
        }
    }

    async fn vote_on<T>(
        &self,
        target_id: &str,
        kind: TargetKind,
        session_id: &str,
        direction: VoteDirection,
    ) -> Result<(), FeedError>
    where
        T: DeserializeOwned + Serialize + Votable,
    {
        if target_id.is_empty() {
            return Err(FeedError::MissingTarget);
        }

        let mut targets: Vec<T> = self.store.read_by_id(kind.collection(), target_id).await?;
        let Some(mut target) = targets.pop() else {
            return Err(FeedError::TargetNotFound(kind.noun()));
        };

        let user_id = match self.identity.resolve_session(session_id).await {
            Ok(session) if !session.user_id.is_empty() => session.user_id,
            _ => return Err(FeedError::Unauthenticated),
        };

        let receipt_id = format!("{target_id}{user_id}");
        let receipts: Vec<VoteReceipt> = self
            .store
            .read_by_id(kind.votes_collection(), &receipt_id)
            .await?;

        let magnitude = if self.config.is_moderator(&user_id) {
            // Moderators bypass the receipt entirely: no duplicate check and
            // no receipt write, so they can keep voting the same target.
            f64::from(rand::thread_rng().gen_range(MOD_VOTE_MIN..=MOD_VOTE_MAX))
        } else {
            if !receipts.is_empty() {
                return Err(FeedError::AlreadyVoted);
            }
            // Receipt goes in before the counter update so a concurrent
            // duplicate submission sees it.
            self.store
                .create(
                    kind.votes_collection(),
                    &VoteReceipt {
                        id: receipt_id.clone(),
                    },
                )
                .await?;
            1.0
        };

        target.apply_vote(direction, magnitude);
        self.store
            .update(kind.collection(), target_id, &target)
            .await?;

        info!(
            target = %target_id,
            kind = kind.noun(),
            magnitude,
            "vote recorded"
        );
        Ok(())
    }
}
