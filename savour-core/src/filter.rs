//! Geographic and price filters applied before scoring.

use geo::Point;

use crate::{PriceLevel, Restaurant, SearchFilters, UNLIMITED_PRICE, UNLIMITED_RADIUS_MILES};

/// Mean Earth radius in miles used by [`haversine_miles`].
pub const EARTH_RADIUS_MILES: f64 = 3959.0;

/// Distance assumed for a candidate without coordinates when filtering by
/// radius.
pub const MISSING_DISTANCE_MILES: f64 = 999.0;

/// Great-circle distance between two WGS84 points in miles.
///
/// # Examples
/// ```
/// use geo::Point;
/// use savour_core::haversine_miles;
///
/// let austin = Point::new(-97.7431, 30.2672);
/// let dallas = Point::new(-96.7970, 32.7767);
/// let miles = haversine_miles(austin, dallas);
/// assert!((miles - 182.0).abs() < 2.0);
/// assert_eq!(haversine_miles(austin, austin), 0.0);
/// ```
#[must_use]
#[expect(
    clippy::float_arithmetic,
    reason = "the haversine formula is inherently floating point"
)]
pub fn haversine_miles(a: Point<f64>, b: Point<f64>) -> f64 {
    let lat1 = a.y().to_radians();
    let lat2 = b.y().to_radians();
    let dlat = lat2 - lat1;
    let dlon = (b.x() - a.x()).to_radians();
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Rounding can push `h` fractionally above one for antipodal points.
    2.0 * EARTH_RADIUS_MILES * h.clamp(0.0, 1.0).sqrt().asin()
}

/// Radius test around an optional origin.
///
/// Without an origin nothing is measured or excluded. With an origin,
/// distances are measured for every candidate that has coordinates; the
/// radius only excludes candidates when it is tighter than
/// [`UNLIMITED_RADIUS_MILES`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoFilter {
    origin: Option<Point<f64>>,
    radius_miles: f64,
}

impl GeoFilter {
    /// Build the filter from request filters.
    #[must_use]
    pub const fn from_filters(filters: &SearchFilters) -> Self {
        Self {
            origin: filters.origin(),
            radius_miles: filters.radius_miles(),
        }
    }

    /// Report whether distances are computed for this request.
    #[must_use]
    pub const fn measures_distance(&self) -> bool {
        self.origin.is_some()
    }

    /// Distance from the origin to the restaurant, when both are known.
    #[must_use]
    pub fn distance_to(&self, restaurant: &Restaurant) -> Option<f64> {
        let origin = self.origin?;
        let location = restaurant.location?;
        Some(haversine_miles(origin, location))
    }

    /// Decide whether a candidate at `distance` passes the radius test.
    #[must_use]
    pub fn admits(&self, distance: Option<f64>) -> bool {
        if self.origin.is_none() || self.radius_miles >= UNLIMITED_RADIUS_MILES {
            return true;
        }
        distance.unwrap_or(MISSING_DISTANCE_MILES) <= self.radius_miles
    }
}

/// Price ceiling test.
///
/// A missing price level counts as the cheapest tier for the comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceFilter {
    max_price: u8,
}

impl PriceFilter {
    /// Build the filter from request filters.
    #[must_use]
    pub const fn from_filters(filters: &SearchFilters) -> Self {
        Self {
            max_price: filters.max_price(),
        }
    }

    /// Decide whether a restaurant passes the price ceiling.
    #[must_use]
    pub fn admits(&self, restaurant: &Restaurant) -> bool {
        if self.max_price >= UNLIMITED_PRICE {
            return true;
        }
        restaurant.price_level.unwrap_or(PriceLevel::CHEAPEST).get() <= self.max_price
    }
}
