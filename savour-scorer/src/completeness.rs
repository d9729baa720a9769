//! Listing completeness.

use savour_core::{Amenities, Signal, SignalContext};

const PHOTOS_WEIGHT: f32 = 0.30;
const WEBSITE_WEIGHT: f32 = 0.25;
const PHONE_WEIGHT: f32 = 0.15;
const HOURS_WEIGHT: f32 = 0.15;
const AMENITIES_WEIGHT: f32 = 0.15;

/// Scores how much structured information a listing publishes.
///
/// Photos, website, phone and opening hours each contribute a fixed weight;
/// the fraction of tracked amenity flags that are set contributes the rest.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use savour_core::{ListingDetails, Restaurant, Signal, SignalContext};
/// use savour_scorer::CompletenessAnalyzer;
///
/// let restaurant = Restaurant::new("p1", "Cafe")
///     .expect("valid restaurant")
///     .with_details(ListingDetails { photos: true, website: true, ..ListingDetails::default() });
/// let score = CompletenessAnalyzer.score(&SignalContext::new(&restaurant, &[], Utc::now()));
/// assert!((score - 0.55).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletenessAnalyzer;

impl Signal for CompletenessAnalyzer {
    fn neutral(&self) -> f32 {
        0.0
    }

    #[expect(clippy::float_arithmetic, reason = "weighted sum of flags")]
    #[expect(
        clippy::cast_precision_loss,
        reason = "amenity counts are tiny"
    )]
    fn evaluate(&self, context: &SignalContext<'_>) -> f32 {
        let details = context.restaurant.details;
        let weigh = |present: bool, weight: f32| if present { weight } else { 0.0 };
        let amenity_fraction =
            context.restaurant.amenities.present() as f32 / Amenities::TRACKED as f32;
        weigh(details.photos, PHOTOS_WEIGHT)
            + weigh(details.website, WEBSITE_WEIGHT)
            + weigh(details.phone, PHONE_WEIGHT)
            + weigh(details.hours, HOURS_WEIGHT)
            + amenity_fraction * AMENITIES_WEIGHT
    }
}
