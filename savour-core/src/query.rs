//! Validated search requests.

use geo::Point;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{PriceLevel, RestaurantError, restaurant::wgs84_point};

/// Radius at or above which no distance filtering happens.
pub const UNLIMITED_RADIUS_MILES: f64 = 100.0;

/// Maximum price tier that disables price filtering.
pub const UNLIMITED_PRICE: u8 = 4;

/// Number of results returned by a query search.
pub const SEARCH_LIMIT: usize = 10;

/// Number of results returned by a browse listing.
pub const BROWSE_LIMIT: usize = 20;

/// Errors raised when a request fails validation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum QueryError {
    /// The query text was empty or whitespace.
    #[error("query text must not be empty")]
    EmptyQuery,
    /// The radius was negative or not a finite number.
    #[error("radius {radius} must be a finite, non-negative number of miles")]
    InvalidRadius {
        /// Rejected radius.
        radius: f64,
    },
    /// The maximum price was outside `1..=4`.
    #[error("max price {max_price} is outside 1..=4")]
    InvalidMaxPrice {
        /// Rejected tier.
        max_price: u8,
    },
    /// The origin coordinates were invalid.
    #[error("invalid origin: {0}")]
    InvalidOrigin(#[source] RestaurantError),
}

/// Primary ordering key for a search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RankMode {
    /// Rank by semantic relevance alone.
    #[default]
    Relevance,
    /// Rank by the composite smart score.
    SmartScore,
}

/// Geographic and price constraints shared by search and browse.
///
/// # Examples
/// ```
/// use savour_core::SearchFilters;
///
/// # fn main() -> Result<(), savour_core::QueryError> {
/// let filters = SearchFilters::default()
///     .with_origin(30.2672, -97.7431)?
///     .with_radius(5.0)?
///     .with_max_price(2)?;
/// assert!(filters.origin().is_some());
/// assert_eq!(filters.max_price(), 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchFilters {
    origin: Option<Point<f64>>,
    radius_miles: f64,
    max_price: u8,
}

impl Default for SearchFilters {
    fn default() -> Self {
        Self {
            origin: None,
            radius_miles: UNLIMITED_RADIUS_MILES,
            max_price: UNLIMITED_PRICE,
        }
    }
}

impl SearchFilters {
    /// Set the caller's position.
    ///
    /// # Errors
    /// Returns [`QueryError::InvalidOrigin`] for invalid coordinates.
    pub fn with_origin(mut self, lat: f64, lng: f64) -> Result<Self, QueryError> {
        self.origin = Some(wgs84_point(lat, lng).map_err(QueryError::InvalidOrigin)?);
        Ok(self)
    }

    /// Set the search radius in miles.
    ///
    /// # Errors
    /// Returns [`QueryError::InvalidRadius`] for negative or non-finite input.
    pub fn with_radius(mut self, radius_miles: f64) -> Result<Self, QueryError> {
        if !radius_miles.is_finite() || radius_miles < 0.0 {
            return Err(QueryError::InvalidRadius {
                radius: radius_miles,
            });
        }
        self.radius_miles = radius_miles;
        Ok(self)
    }

    /// Set the highest admissible price tier.
    ///
    /// # Errors
    /// Returns [`QueryError::InvalidMaxPrice`] outside `1..=4`.
    pub fn with_max_price(mut self, max_price: u8) -> Result<Self, QueryError> {
        PriceLevel::new(max_price).map_err(|_| QueryError::InvalidMaxPrice { max_price })?;
        self.max_price = max_price;
        Ok(self)
    }

    /// Caller position, when supplied.
    #[must_use]
    pub const fn origin(&self) -> Option<Point<f64>> {
        self.origin
    }

    /// Radius in miles.
    #[must_use]
    pub const fn radius_miles(&self) -> f64 {
        self.radius_miles
    }

    /// Highest admissible price tier.
    #[must_use]
    pub const fn max_price(&self) -> u8 {
        self.max_price
    }
}

/// A free-text search with filters.
///
/// # Examples
/// ```
/// use savour_core::{QueryError, SearchQuery};
///
/// assert_eq!(SearchQuery::new("   ").unwrap_err(), QueryError::EmptyQuery);
/// let query = SearchQuery::new(" cheap tacos ").expect("valid query");
/// assert_eq!(query.text(), "cheap tacos");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    text: String,
    filters: SearchFilters,
    rank_mode: RankMode,
}

impl SearchQuery {
    /// Validate query text. Surrounding whitespace is trimmed.
    ///
    /// # Errors
    /// Returns [`QueryError::EmptyQuery`] when no text remains.
    pub fn new(text: impl AsRef<str>) -> Result<Self, QueryError> {
        let trimmed = text.as_ref().trim();
        if trimmed.is_empty() {
            return Err(QueryError::EmptyQuery);
        }
        Ok(Self {
            text: trimmed.to_owned(),
            filters: SearchFilters::default(),
            rank_mode: RankMode::default(),
        })
    }

    /// Replace the filters.
    #[must_use]
    pub const fn with_filters(mut self, filters: SearchFilters) -> Self {
        self.filters = filters;
        self
    }

    /// Choose the primary ordering key.
    #[must_use]
    pub const fn with_rank_mode(mut self, rank_mode: RankMode) -> Self {
        self.rank_mode = rank_mode;
        self
    }

    /// Trimmed query text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Active filters.
    #[must_use]
    pub const fn filters(&self) -> &SearchFilters {
        &self.filters
    }

    /// Primary ordering key.
    #[must_use]
    pub const fn rank_mode(&self) -> RankMode {
        self.rank_mode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(-1.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn radius_rejects_invalid_values(#[case] radius: f64) {
        assert!(matches!(
            SearchFilters::default().with_radius(radius),
            Err(QueryError::InvalidRadius { .. })
        ));
    }

    #[rstest]
    #[case(0)]
    #[case(5)]
    fn max_price_rejects_out_of_range(#[case] max_price: u8) {
        assert_eq!(
            SearchFilters::default().with_max_price(max_price),
            Err(QueryError::InvalidMaxPrice { max_price })
        );
    }

    #[rstest]
    fn defaults_disable_filtering() {
        let filters = SearchFilters::default();
        assert_eq!(filters.radius_miles(), UNLIMITED_RADIUS_MILES);
        assert_eq!(filters.max_price(), UNLIMITED_PRICE);
        assert!(filters.origin().is_none());
    }

    #[rstest]
    fn invalid_origin_is_reported() {
        assert!(matches!(
            SearchFilters::default().with_origin(120.0, 0.0),
            Err(QueryError::InvalidOrigin(_))
        ));
    }
}
