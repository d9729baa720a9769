//! Restaurant records and their validated building blocks.

use std::fmt;

use geo::Point;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::Embedding;

/// Highest rating a venue or review may carry.
pub const MAX_RATING: f32 = 5.0;

/// Stable identifier of a restaurant.
///
/// Identifiers are opaque strings (for example Google place ids) and are
/// compared byte for byte.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RestaurantId(String);

impl RestaurantId {
    /// Wrap a raw identifier.
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Borrow the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RestaurantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RestaurantId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

/// Price tier in the inclusive range `1..=4`.
///
/// # Examples
/// ```
/// use savour_core::PriceLevel;
///
/// let tier = PriceLevel::new(2).expect("valid tier");
/// assert_eq!(tier.get(), 2);
/// assert!(PriceLevel::new(5).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PriceLevel(u8);

impl PriceLevel {
    /// Cheapest tier.
    pub const CHEAPEST: Self = Self(1);
    /// Most expensive tier.
    pub const PRICIEST: Self = Self(4);

    /// Validate and wrap a raw tier.
    ///
    /// # Errors
    /// Returns [`RestaurantError::InvalidPriceLevel`] outside `1..=4`.
    pub const fn new(level: u8) -> Result<Self, RestaurantError> {
        if level >= Self::CHEAPEST.0 && level <= Self::PRICIEST.0 {
            Ok(Self(level))
        } else {
            Err(RestaurantError::InvalidPriceLevel { level })
        }
    }

    /// Return the raw tier.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for PriceLevel {
    type Error = RestaurantError;

    fn try_from(level: u8) -> Result<Self, Self::Error> {
        Self::new(level)
    }
}

impl From<PriceLevel> for u8 {
    fn from(level: PriceLevel) -> Self {
        level.0
    }
}

/// Structured amenity flags published for a venue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Amenities {
    /// Serves vegetarian food.
    pub vegetarian: bool,
    /// Offers dine-in seating.
    pub dine_in: bool,
    /// Offers takeout.
    pub takeout: bool,
    /// Offers delivery.
    pub delivery: bool,
}

impl Amenities {
    /// Number of tracked amenity flags.
    pub const TRACKED: usize = 4;

    /// Count the flags that are set.
    #[must_use]
    pub fn present(self) -> usize {
        [self.vegetarian, self.dine_in, self.takeout, self.delivery]
            .into_iter()
            .filter(|flag| *flag)
            .count()
    }
}

/// Presence of optional listing details used by completeness scoring.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingDetails {
    /// At least one photo is published.
    pub photos: bool,
    /// A website is published.
    pub website: bool,
    /// A phone number is published.
    pub phone: bool,
    /// Opening hours are published.
    pub hours: bool,
}

/// Errors raised while validating restaurant data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RestaurantError {
    /// The identifier was empty.
    #[error("restaurant id must not be empty")]
    EmptyId,
    /// The price tier fell outside `1..=4`.
    #[error("price level {level} is outside 1..=4")]
    InvalidPriceLevel {
        /// Rejected tier.
        level: u8,
    },
    /// The rating was not a finite value in `0..=5`.
    #[error("rating {rating} is outside 0..=5")]
    InvalidRating {
        /// Rejected rating.
        rating: f32,
    },
    /// Coordinates were non-finite or outside WGS84 bounds.
    #[error("coordinates ({lat}, {lng}) are not a valid WGS84 position")]
    InvalidCoordinates {
        /// Rejected latitude.
        lat: f64,
        /// Rejected longitude.
        lng: f64,
    },
}

/// Validate a rating in `0..=5`.
///
/// # Errors
/// Returns [`RestaurantError::InvalidRating`] for non-finite or
/// out-of-range values.
pub fn validate_rating(rating: f32) -> Result<f32, RestaurantError> {
    if rating.is_finite() && (0.0..=MAX_RATING).contains(&rating) {
        Ok(rating)
    } else {
        Err(RestaurantError::InvalidRating { rating })
    }
}

/// Build a WGS84 point (`x = longitude`, `y = latitude`).
///
/// # Errors
/// Returns [`RestaurantError::InvalidCoordinates`] for non-finite or
/// out-of-range values.
pub fn wgs84_point(lat: f64, lng: f64) -> Result<Point<f64>, RestaurantError> {
    let valid = lat.is_finite()
        && lng.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lng);
    if valid {
        Ok(Point::new(lng, lat))
    } else {
        Err(RestaurantError::InvalidCoordinates { lat, lng })
    }
}

/// A venue that can be ranked.
///
/// Optional fields stay `None` when the source has no value; scoring applies
/// neutral defaults without rewriting the record.
///
/// # Examples
/// ```
/// use savour_core::{PriceLevel, Restaurant};
///
/// # fn main() -> Result<(), savour_core::RestaurantError> {
/// let restaurant = Restaurant::new("place-1", "Taqueria Uno")?
///     .with_location(30.2672, -97.7431)?
///     .with_rating(4.6)?
///     .with_price_level(PriceLevel::new(1)?)
///     .with_tags("mexican tacos");
/// assert_eq!(restaurant.name, "Taqueria Uno");
/// assert!(restaurant.location.is_some());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    /// Stable unique identifier.
    pub id: RestaurantId,
    /// Display name.
    pub name: String,
    /// Street address.
    pub address: String,
    /// WGS84 position, when known.
    pub location: Option<Point<f64>>,
    /// Price tier, when known.
    pub price_level: Option<PriceLevel>,
    /// Average rating in `0..=5`, when known.
    pub rating: Option<f32>,
    /// Total number of ratings reported by the listing.
    pub review_count: u32,
    /// Free-form cuisine and category tags.
    pub tags: String,
    /// Structured amenity flags.
    pub amenities: Amenities,
    /// Presence of optional listing details.
    pub details: ListingDetails,
    /// Precomputed composite-text embedding, when available.
    pub embedding: Option<Embedding>,
}

impl Restaurant {
    /// Construct a restaurant with only an id and a name.
    ///
    /// # Errors
    /// Returns [`RestaurantError::EmptyId`] when the id is blank.
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Result<Self, RestaurantError> {
        let raw_id = id.into();
        if raw_id.trim().is_empty() {
            return Err(RestaurantError::EmptyId);
        }
        Ok(Self {
            id: RestaurantId::new(raw_id),
            name: name.into(),
            address: String::new(),
            location: None,
            price_level: None,
            rating: None,
            review_count: 0,
            tags: String::new(),
            amenities: Amenities::default(),
            details: ListingDetails::default(),
            embedding: None,
        })
    }

    /// Attach a validated WGS84 position.
    ///
    /// # Errors
    /// Returns [`RestaurantError::InvalidCoordinates`] for invalid input.
    pub fn with_location(mut self, lat: f64, lng: f64) -> Result<Self, RestaurantError> {
        self.location = Some(wgs84_point(lat, lng)?);
        Ok(self)
    }

    /// Attach a validated rating.
    ///
    /// # Errors
    /// Returns [`RestaurantError::InvalidRating`] for invalid input.
    pub fn with_rating(mut self, rating: f32) -> Result<Self, RestaurantError> {
        self.rating = Some(validate_rating(rating)?);
        Ok(self)
    }

    /// Set the price tier.
    #[must_use]
    pub const fn with_price_level(mut self, level: PriceLevel) -> Self {
        self.price_level = Some(level);
        self
    }

    /// Set the total rating count.
    #[must_use]
    pub const fn with_review_count(mut self, count: u32) -> Self {
        self.review_count = count;
        self
    }

    /// Set the street address.
    #[must_use]
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Set the tag text.
    #[must_use]
    pub fn with_tags(mut self, tags: impl Into<String>) -> Self {
        self.tags = tags.into();
        self
    }

    /// Set the amenity flags.
    #[must_use]
    pub const fn with_amenities(mut self, amenities: Amenities) -> Self {
        self.amenities = amenities;
        self
    }

    /// Set the listing detail flags.
    #[must_use]
    pub const fn with_details(mut self, details: ListingDetails) -> Self {
        self.details = details;
        self
    }

    /// Attach a precomputed embedding.
    #[must_use]
    pub fn with_embedding(mut self, embedding: Embedding) -> Self {
        self.embedding = Some(embedding);
        self
    }

    /// Latitude in degrees, when known.
    #[must_use]
    pub fn latitude(&self) -> Option<f64> {
        self.location.map(|point| point.y())
    }

    /// Longitude in degrees, when known.
    #[must_use]
    pub fn longitude(&self) -> Option<f64> {
        self.location.map(|point| point.x())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0)]
    #[case(5)]
    #[case(u8::MAX)]
    fn price_level_rejects_out_of_range(#[case] level: u8) {
        assert_eq!(
            PriceLevel::new(level),
            Err(RestaurantError::InvalidPriceLevel { level })
        );
    }

    #[rstest]
    #[case(f32::NAN)]
    #[case(-0.1)]
    #[case(5.1)]
    fn rating_rejects_invalid_values(#[case] rating: f32) {
        assert!(validate_rating(rating).is_err());
    }

    #[rstest]
    #[case(91.0, 0.0)]
    #[case(0.0, -180.5)]
    #[case(f64::INFINITY, 0.0)]
    fn location_rejects_invalid_coordinates(#[case] lat: f64, #[case] lng: f64) {
        let result = Restaurant::new("a", "A").and_then(|r| r.with_location(lat, lng));
        assert!(matches!(
            result,
            Err(RestaurantError::InvalidCoordinates { .. })
        ));
    }

    #[rstest]
    fn location_stores_longitude_as_x() {
        let restaurant = Restaurant::new("a", "A")
            .and_then(|r| r.with_location(30.0, -97.0))
            .expect("valid restaurant");
        assert_eq!(restaurant.latitude(), Some(30.0));
        assert_eq!(restaurant.longitude(), Some(-97.0));
    }

    #[rstest]
    fn blank_id_is_rejected() {
        assert_eq!(Restaurant::new("  ", "A"), Err(RestaurantError::EmptyId));
    }

    #[rstest]
    fn amenities_count_set_flags() {
        let amenities = Amenities {
            vegetarian: true,
            takeout: true,
            ..Amenities::default()
        };
        assert_eq!(amenities.present(), 2);
    }
}
