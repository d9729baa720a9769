//! Individual reviews attached to a restaurant.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{RestaurantError, RestaurantId, restaurant::validate_rating};

/// A single published review.
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use savour_core::{RestaurantId, Review};
///
/// # fn main() -> Result<(), savour_core::RestaurantError> {
/// let published = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
/// let review = Review::new(RestaurantId::new("place-1"), 4.0, published)?
///     .with_text("Great tacos");
/// assert_eq!(review.text_len(), 11);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    /// Restaurant the review belongs to.
    pub restaurant_id: RestaurantId,
    /// Star rating in `0..=5`.
    pub rating: f32,
    /// Review body, when the reviewer wrote one.
    pub text: Option<String>,
    /// Publication time.
    pub published_at: DateTime<Utc>,
    /// The reviewer has a profile photo.
    pub has_profile_photo: bool,
    /// The reviewer links to an active contributor profile.
    pub has_profile_link: bool,
}

impl Review {
    /// Construct a review without text or reviewer signals.
    ///
    /// # Errors
    /// Returns [`RestaurantError::InvalidRating`] for ratings outside `0..=5`.
    pub fn new(
        restaurant_id: RestaurantId,
        rating: f32,
        published_at: DateTime<Utc>,
    ) -> Result<Self, RestaurantError> {
        Ok(Self {
            restaurant_id,
            rating: validate_rating(rating)?,
            text: None,
            published_at,
            has_profile_photo: false,
            has_profile_link: false,
        })
    }

    /// Attach review text. Empty text is stored as `None`.
    #[must_use]
    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        let body = text.into();
        self.text = (!body.is_empty()).then_some(body);
        self
    }

    /// Record the reviewer's profile signals.
    #[must_use]
    pub const fn with_reviewer(mut self, has_profile_photo: bool, has_profile_link: bool) -> Self {
        self.has_profile_photo = has_profile_photo;
        self.has_profile_link = has_profile_link;
        self
    }

    /// Length of the review text in characters; zero without text.
    #[must_use]
    pub fn text_len(&self) -> usize {
        self.text.as_deref().map_or(0, |text| text.chars().count())
    }
}
