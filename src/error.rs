//! Error taxonomy for feed operations.
//!
//! Collaborator failures are carried through unchanged; everything else is a
//! request-level failure with a stable message and a mapped HTTP status.

use axum::http::StatusCode;
use thiserror::Error;

use crate::identity::IdentityError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("missing target id")]
    MissingTarget,

    #[error("{0} not found")]
    TargetNotFound(&'static str),

    #[error("multiple records share parent post id")]
    AmbiguousParent,

    #[error("not signed in")]
    Unauthenticated,

    #[error("already voted")]
    AlreadyVoted,

    #[error("no post id")]
    MissingParent,

    #[error("{0}")]
    ValidationFailed(String),

    #[error("record store request failed")]
    Store(#[from] StoreError),

    #[error("identity service request failed")]
    Identity(#[from] IdentityError),
}

impl FeedError {
    /// HTTP status for this failure: request-shaped errors map to 4xx,
    /// collaborator failures to 502.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::MissingTarget | Self::MissingParent | Self::ValidationFailed(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::TargetNotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::AlreadyVoted => StatusCode::CONFLICT,
            Self::AmbiguousParent => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Store(_) | Self::Identity(_) => StatusCode::BAD_GATEWAY,
        }
    }

    /// Message placed in the JSON error envelope, including the collaborator
    /// detail when one failed.
    #[must_use]
    pub fn envelope_message(&self) -> String {
        match self {
            Self::Store(source) => format!("{self}: {source}"),
            Self::Identity(source) => format!("{self}: {source}"),
            _ => self.to_string(),
        }
    }
}
