//! Feed core: collection schemas, the vote ledger, feed reads, and the
//! posting pipeline.

pub mod models;
pub mod posting;
pub mod query;
pub mod vote;

pub use models::{Comment, CommentDraft, Post, PostDraft, TargetKind, VoteDirection};
pub use posting::PostingPipeline;
pub use query::{FeedQuery, PostsQuery};
pub use vote::VoteLedger;
