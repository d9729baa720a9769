//! Rating-derived signals: base quality and value for money.

use savour_core::{MAX_RATING, Restaurant, Signal, SignalContext};

/// Rating count at which the volume component saturates.
pub const REVIEW_VOLUME_CAP: f32 = 1000.0;

const RATING_SHARE: f32 = 0.7;
const VOLUME_SHARE: f32 = 0.3;

/// Largest discount applied to the most expensive tier.
const MAX_PRICE_DISCOUNT: f32 = 0.75;

/// Rating scaled into `0.0..=1.0`; zero when unknown.
#[must_use]
#[expect(clippy::float_arithmetic, reason = "rating normalisation")]
pub fn normalised_rating(restaurant: &Restaurant) -> f32 {
    restaurant.rating.map_or(0.0, |rating| rating / MAX_RATING)
}

/// Log-scaled rating count, saturating at [`REVIEW_VOLUME_CAP`].
#[must_use]
#[expect(clippy::float_arithmetic, reason = "log scaling")]
#[expect(
    clippy::cast_possible_truncation,
    reason = "the ratio lies in 0..=1 after clamping"
)]
pub fn review_volume(review_count: u32) -> f32 {
    let scaled = f64::from(review_count).ln_1p() / f64::from(REVIEW_VOLUME_CAP).ln_1p();
    scaled.min(1.0) as f32
}

/// Blend of normalised rating and review volume.
///
/// `0.7 * rating / 5 + 0.3 * min(ln(1 + count) / ln(1001), 1)`.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use savour_core::{Restaurant, Signal, SignalContext};
/// use savour_scorer::BaseQuality;
///
/// let restaurant = Restaurant::new("p1", "Cafe")
///     .and_then(|r| r.with_rating(5.0))
///     .expect("valid restaurant")
///     .with_review_count(1000);
/// let score = BaseQuality.score(&SignalContext::new(&restaurant, &[], Utc::now()));
/// assert!((score - 1.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct BaseQuality;

impl Signal for BaseQuality {
    fn neutral(&self) -> f32 {
        0.0
    }

    #[expect(clippy::float_arithmetic, reason = "weighted blend")]
    fn evaluate(&self, context: &SignalContext<'_>) -> f32 {
        let restaurant = context.restaurant;
        RATING_SHARE * normalised_rating(restaurant)
            + VOLUME_SHARE * review_volume(restaurant.review_count)
    }
}

/// Scores rating relative to price tier.
///
/// A known tier discounts the normalised rating linearly from nothing at
/// tier 1 to 75% at tier 4. Without a tier the normalised rating is used
/// as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueAnalyzer;

impl ValueAnalyzer {
    /// Multiplier applied to the rating for a given tier.
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "linear price discount")]
    pub fn price_factor(level: u8) -> f32 {
        let steps = f32::from(level.saturating_sub(1));
        1.0 - (steps / 3.0) * MAX_PRICE_DISCOUNT
    }
}

impl Signal for ValueAnalyzer {
    fn neutral(&self) -> f32 {
        0.0
    }

    #[expect(clippy::float_arithmetic, reason = "rating times price factor")]
    fn evaluate(&self, context: &SignalContext<'_>) -> f32 {
        let rating = normalised_rating(context.restaurant);
        context
            .restaurant
            .price_level
            .map_or(rating, |level| rating * Self::price_factor(level.get()))
    }
}
