//! Hot ranking.
//!
//! Feed order is decided client-side: records come back from the store
//! ordered by creation time, then get re-sorted by [`hot_rank`], which
//! blends vote magnitude (logarithmic) with age (linear). Large score gaps
//! dominate; among near-equal scores, newer wins.

use chrono::DateTime;
use serde_json::Value;
use tracing::warn;

use crate::constants::{RANKING_EPOCH, SECONDS_PER_RANK_POINT, UNRANKED_SENTINEL};

/// Anything the feed can rank: exposes its stored score and raw creation
/// timestamp. Implemented by posts and comments.
pub trait Rankable {
    /// Stored `upvotes - downvotes`, `None` when the record has no score.
    fn raw_score(&self) -> Option<f64>;

    /// Creation timestamp as stored: RFC3339 string, float epoch, or
    /// integer epoch.
    fn created(&self) -> &Value;
}

/// Compute the hot rank for a stored score and creation timestamp.
///
/// Pure and total: this runs inside a sort comparator, so malformed input
/// degrades to sentinels instead of failing. A record with no score at all
/// ranks below everything.
#[must_use]
pub fn hot_rank(score: Option<f64>, created: &Value) -> f64 {
    let Some(score) = score else {
        return UNRANKED_SENTINEL;
    };

    let sign = if score > 0.0 {
        1.0
    } else if score < 0.0 {
        -1.0
    } else {
        0.0
    };
    let order = score.abs().max(1.0).log10();

    let age = (created_epoch(created) - RANKING_EPOCH) as f64;
    sign * order + age / SECONDS_PER_RANK_POINT
}

/// Rank of a single record via its [`Rankable`] view.
#[must_use]
pub fn rank_of<T: Rankable>(record: &T) -> f64 {
    hot_rank(record.raw_score(), record.created())
}

/// Sort records descending by hot rank.
///
/// The sort is stable, so records with exactly equal rank keep the store's
/// creation-time order.
pub fn sort_hot<T: Rankable>(records: &mut [T]) {
    records.sort_by(|a, b| rank_of(b).total_cmp(&rank_of(a)));
}

/// Normalize a stored creation timestamp to epoch seconds.
///
/// Accepts an RFC3339 string, a float epoch, or an integer epoch. An
/// unparsable string is logged and treated as epoch 0 rather than failing
/// the ranking pass.
fn created_epoch(created: &Value) -> i64 {
    match created {
        Value::String(s) => match DateTime::parse_from_rfc3339(s) {
            Ok(t) => t.timestamp(),
            Err(e) => {
                warn!(created = %s, error = %e, "unparsable creation timestamp, ranking as epoch 0");
                0
            }
        },
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i
            } else {
                n.as_f64().map_or(0, |f| f as i64)
            }
        }
        _ => 0,
    }
}
