//! Ordering and truncation of scored candidates.

use std::cmp::Ordering;

use crate::{RankMode, ScoredCandidate};

/// Compare optional distances ascending, placing unknown distances last.
fn compare_distance(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(left), Some(right)) => left.total_cmp(&right),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

const fn primary_key(candidate: &ScoredCandidate, mode: RankMode) -> f32 {
    match mode {
        RankMode::Relevance => candidate.relevance,
        RankMode::SmartScore => candidate.smart_score,
    }
}

/// Sort candidates and keep the first `limit`.
///
/// The primary key (relevance or smart score, per `mode`) sorts
/// descending. When `by_distance` is set, ties on the primary key are
/// broken by ascending distance with unmeasured candidates last. The sort is
/// stable, so remaining ties keep their input order.
///
/// # Examples
/// ```
/// use savour_core::{RankMode, Restaurant, ScoreBreakdown, ScoredCandidate, rank};
///
/// # fn main() -> Result<(), savour_core::RestaurantError> {
/// let near = ScoredCandidate::from_restaurant(
///     &Restaurant::new("near", "Near")?, Some(1.0), 50.0, ScoreBreakdown::default(), None,
/// );
/// let far = ScoredCandidate::from_restaurant(
///     &Restaurant::new("far", "Far")?, Some(9.0), 50.0, ScoreBreakdown::default(), None,
/// );
/// let ranked = rank(vec![far, near], RankMode::SmartScore, true, 10);
/// assert_eq!(ranked[0].id.as_str(), "near");
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn rank(
    mut candidates: Vec<ScoredCandidate>,
    mode: RankMode,
    by_distance: bool,
    limit: usize,
) -> Vec<ScoredCandidate> {
    candidates.sort_by(|a, b| {
        let primary = primary_key(b, mode).total_cmp(&primary_key(a, mode));
        if by_distance {
            primary.then_with(|| compare_distance(a.distance_miles, b.distance_miles))
        } else {
            primary
        }
    });
    candidates.truncate(limit);
    candidates
}
