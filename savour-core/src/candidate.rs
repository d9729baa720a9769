//! Scored results returned to callers.

use serde::Serialize;

use crate::{PriceLevel, Restaurant, RestaurantId};

/// Component scores behind a smart score, each in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    /// Blend of normalised rating and review volume.
    pub base_quality: f32,
    /// Mean per-review authenticity.
    pub authenticity: f32,
    /// Review velocity and rating trend.
    pub momentum: f32,
    /// Listing completeness.
    pub completeness: f32,
    /// Rating relative to price tier.
    pub value: f32,
    /// Query relevance; zero when browsing.
    pub relevance: f32,
}

/// A restaurant that survived filtering, with its scores.
///
/// Candidates are ephemeral: they are built per request and never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredCandidate {
    /// Restaurant id.
    pub id: RestaurantId,
    /// Display name.
    pub name: String,
    /// Street address.
    pub address: String,
    /// Latitude, when known.
    pub latitude: Option<f64>,
    /// Longitude, when known.
    pub longitude: Option<f64>,
    /// Price tier, when known.
    pub price_level: Option<PriceLevel>,
    /// Average rating, when known.
    pub rating: Option<f32>,
    /// Distance from the request origin in miles, when measured.
    pub distance_miles: Option<f64>,
    /// Query relevance in `0.0..=1.0`.
    pub relevance: f32,
    /// Composite score in `0.0..=100.0`.
    pub smart_score: f32,
    /// Components of [`ScoredCandidate::smart_score`].
    pub breakdown: ScoreBreakdown,
    /// Representative review text.
    pub excerpt: Option<String>,
}

impl ScoredCandidate {
    /// Project a restaurant into a candidate with the given scores.
    #[must_use]
    pub fn from_restaurant(
        restaurant: &Restaurant,
        distance_miles: Option<f64>,
        smart_score: f32,
        breakdown: ScoreBreakdown,
        excerpt: Option<String>,
    ) -> Self {
        Self {
            id: restaurant.id.clone(),
            name: restaurant.name.clone(),
            address: restaurant.address.clone(),
            latitude: restaurant.latitude(),
            longitude: restaurant.longitude(),
            price_level: restaurant.price_level,
            rating: restaurant.rating,
            distance_miles,
            relevance: breakdown.relevance,
            smart_score,
            breakdown,
            excerpt,
        }
    }
}
