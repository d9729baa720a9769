//! Review velocity and rating trend.

use chrono::{DateTime, Duration, Utc};
use savour_core::{Review, Signal, SignalContext};

/// Momentum reported when there are too few reviews to judge.
pub const NEUTRAL_MOMENTUM: f32 = 0.5;

/// Momentum reported when nothing was reviewed inside the recent window.
pub const STALLED_MOMENTUM: f32 = 0.3;

/// Minimum number of reviews before velocity is measured.
pub const MIN_REVIEWS: usize = 10;

/// Length of the recent window in days.
pub const RECENT_WINDOW_DAYS: i64 = 90;

/// Number of reviews in each half of the rating-trend comparison.
pub const TREND_WINDOW: usize = 30;

const VELOCITY_WEIGHT: f32 = 0.7;
const TREND_WEIGHT: f32 = 0.3;
const NEUTRAL_TREND: f32 = 0.5;

/// Scores whether a restaurant is trending up or fading.
///
/// Velocity compares the review rate inside the last
/// [`RECENT_WINDOW_DAYS`] days with the historical rate before that window.
/// The rating trend compares the mean rating of the latest
/// [`TREND_WINDOW`] reviews with the window before it. Momentum blends the
/// two as `0.7 * velocity + 0.3 * trend`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MomentumAnalyzer;

#[expect(
    clippy::cast_precision_loss,
    reason = "review counts and day spans are far below f32 precision limits"
)]
const fn as_f32(count: usize) -> f32 {
    count as f32
}

#[expect(
    clippy::cast_precision_loss,
    reason = "day spans are far below f32 precision limits"
)]
const fn days_as_f32(days: i64) -> f32 {
    days as f32
}

#[expect(clippy::float_arithmetic, reason = "averaging ratings")]
fn mean_rating(reviews: &[&Review]) -> f32 {
    if reviews.is_empty() {
        return 0.0;
    }
    let total: f32 = reviews.iter().map(|review| review.rating).sum();
    total / as_f32(reviews.len())
}

impl MomentumAnalyzer {
    /// Velocity of recent reviews relative to the historical rate.
    ///
    /// `sorted` must be in ascending publication order and contain at least
    /// one review at or after `cutoff`.
    #[expect(clippy::float_arithmetic, reason = "rate ratios")]
    fn velocity(sorted: &[&Review], cutoff: DateTime<Utc>, recent: usize) -> f32 {
        let historical: Vec<&&Review> = sorted
            .iter()
            .filter(|review| review.published_at < cutoff)
            .collect();
        let Some(oldest) = historical.first() else {
            return 1.0;
        };
        let span_days = cutoff
            .signed_duration_since(oldest.published_at)
            .num_days()
            .max(1);
        let historical_rate = as_f32(historical.len()) / days_as_f32(span_days);
        if historical_rate <= 0.0 {
            return 1.0;
        }
        let recent_rate = as_f32(recent) / days_as_f32(RECENT_WINDOW_DAYS);
        (recent_rate / historical_rate / 2.0).min(1.0)
    }

    /// Change in mean rating between the latest two trend windows.
    ///
    /// `sorted` must be in ascending publication order.
    #[expect(clippy::float_arithmetic, reason = "rating differences")]
    fn trend(sorted: &[&Review]) -> f32 {
        let needed = TREND_WINDOW.saturating_mul(2);
        if sorted.len() < needed {
            return NEUTRAL_TREND;
        }
        let tail_start = sorted.len().saturating_sub(needed);
        let Some(tail) = sorted.get(tail_start..) else {
            return NEUTRAL_TREND;
        };
        let (previous, latest) = tail.split_at(TREND_WINDOW);
        (mean_rating(latest) - mean_rating(previous) + 0.5).clamp(0.0, 1.0)
    }
}

impl Signal for MomentumAnalyzer {
    fn neutral(&self) -> f32 {
        NEUTRAL_MOMENTUM
    }

    #[expect(clippy::float_arithmetic, reason = "weighted blend")]
    fn evaluate(&self, context: &SignalContext<'_>) -> f32 {
        if context.reviews.len() < MIN_REVIEWS {
            return NEUTRAL_MOMENTUM;
        }
        let mut sorted: Vec<&Review> = context.reviews.iter().collect();
        sorted.sort_by_key(|review| review.published_at);

        let cutoff = context
            .now
            .checked_sub_signed(Duration::days(RECENT_WINDOW_DAYS))
            .unwrap_or(context.now);
        let recent = sorted
            .iter()
            .filter(|review| review.published_at >= cutoff)
            .count();
        if recent == 0 {
            return STALLED_MOMENTUM;
        }

        let velocity = Self::velocity(&sorted, cutoff, recent);
        let trend = Self::trend(&sorted);
        VELOCITY_WEIGHT * velocity + TREND_WEIGHT * trend
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use savour_core::Restaurant;
    use savour_core::test_support::{fixed_now, review_days_ago};

    const TOLERANCE: f32 = 1e-5;

    #[fixture]
    fn restaurant() -> Restaurant {
        Restaurant::new("p", "P").expect("valid restaurant")
    }

    fn momentum(restaurant: &Restaurant, reviews: &[Review]) -> f32 {
        MomentumAnalyzer.score(&SignalContext::new(restaurant, reviews, fixed_now()))
    }

    fn reviews_at(days: &[i64], rating: f32) -> Vec<Review> {
        days.iter()
            .map(|day| review_days_ago("p", rating, *day, fixed_now()))
            .collect()
    }

    #[rstest]
    fn fewer_than_ten_reviews_is_neutral(restaurant: Restaurant) {
        let reviews = reviews_at(&[1, 2, 3, 4, 5, 6, 7, 8, 9], 5.0);
        assert!((momentum(&restaurant, &reviews) - NEUTRAL_MOMENTUM).abs() <= TOLERANCE);
    }

    #[rstest]
    fn no_recent_reviews_is_stalled(restaurant: Restaurant) {
        let days: Vec<i64> = (100..110).collect();
        let reviews = reviews_at(&days, 4.0);
        assert!((momentum(&restaurant, &reviews) - STALLED_MOMENTUM).abs() <= TOLERANCE);
    }

    #[rstest]
    fn only_recent_reviews_has_full_velocity(restaurant: Restaurant) {
        let days: Vec<i64> = (1..=10).collect();
        let reviews = reviews_at(&days, 4.0);
        // velocity 1.0, trend neutral 0.5
        assert!((momentum(&restaurant, &reviews) - 0.85).abs() <= TOLERANCE);
    }

    #[rstest]
    fn velocity_compares_recent_and_historical_rates(restaurant: Restaurant) {
        // 5 recent reviews, 5 historical spread over 100 days before the cutoff.
        let reviews = reviews_at(&[1, 2, 3, 4, 5, 100, 120, 150, 170, 190], 4.0);
        let recent_rate = 5.0_f32 / 90.0;
        let historical_rate = 5.0_f32 / 100.0;
        let velocity = (recent_rate / historical_rate / 2.0).min(1.0);
        let expected = 0.7 * velocity + 0.3 * 0.5;
        assert!((momentum(&restaurant, &reviews) - expected).abs() <= TOLERANCE);
    }

    #[rstest]
    fn single_day_history_uses_one_day_floor(restaurant: Restaurant) {
        // Nine historical reviews published just before the cutoff.
        let mut reviews = reviews_at(&[91; 9], 4.0);
        reviews.extend(reviews_at(&[1], 4.0));
        let velocity = ((1.0_f32 / 90.0) / (9.0 / 1.0) / 2.0).min(1.0);
        let expected = 0.7 * velocity + 0.3 * 0.5;
        assert!((momentum(&restaurant, &reviews) - expected).abs() <= TOLERANCE);
    }

    #[rstest]
    #[case(5.0, 3.0, 1.0)]
    #[case(3.0, 5.0, 0.0)]
    #[case(4.0, 3.8, 0.7)]
    fn rating_trend_compares_latest_windows(
        restaurant: Restaurant,
        #[case] latest: f32,
        #[case] previous: f32,
        #[case] expected_trend: f32,
    ) {
        // 30 older reviews then 30 newer ones, all within the recent window.
        let mut reviews = reviews_at(&(31..61).collect::<Vec<_>>(), previous);
        reviews.extend(reviews_at(&(1..31).collect::<Vec<_>>(), latest));
        let expected = 0.7 * 1.0 + 0.3 * expected_trend;
        assert!((momentum(&restaurant, &reviews) - expected).abs() <= TOLERANCE);
    }

    #[rstest]
    fn input_order_does_not_matter(restaurant: Restaurant) {
        let mut reviews = reviews_at(&[1, 2, 3, 4, 5, 100, 120, 150, 170, 190], 4.0);
        let forward = momentum(&restaurant, &reviews);
        reviews.reverse();
        assert!((momentum(&restaurant, &reviews) - forward).abs() <= TOLERANCE);
    }
}
