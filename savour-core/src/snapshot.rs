//! The immutable in-memory data set searched by the engine.
//!
//! A [`Snapshot`] is built once from loaded restaurants and reviews and is
//! then shared read-only between concurrent requests, typically behind an
//! `Arc`. Replacing data means building a new snapshot.

use std::collections::{HashMap, HashSet};

use log::warn;
use thiserror::Error;

use crate::{Restaurant, RestaurantId, Review};

/// Errors raised while assembling a [`Snapshot`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    /// Two restaurants share an id.
    #[error("restaurant {id} appears more than once")]
    DuplicateRestaurant {
        /// Repeated identifier.
        id: RestaurantId,
    },
}

/// Restaurants and their reviews, in load order.
///
/// # Examples
/// ```
/// use savour_core::{Restaurant, Snapshot};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let snapshot = Snapshot::new(vec![Restaurant::new("p1", "Cafe")?], Vec::new())?;
/// assert_eq!(snapshot.restaurant_count(), 1);
/// assert!(snapshot.reviews_for(&"p1".into()).is_empty());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    restaurants: Vec<Restaurant>,
    reviews: HashMap<RestaurantId, Vec<Review>>,
    review_count: usize,
}

impl Snapshot {
    /// Group reviews by restaurant and validate identifiers.
    ///
    /// Reviews referencing an unknown restaurant are skipped with a warning.
    ///
    /// # Errors
    /// Returns [`SnapshotError::DuplicateRestaurant`] when ids repeat.
    pub fn new(restaurants: Vec<Restaurant>, reviews: Vec<Review>) -> Result<Self, SnapshotError> {
        let mut known = HashSet::with_capacity(restaurants.len());
        for restaurant in &restaurants {
            if !known.insert(&restaurant.id) {
                return Err(SnapshotError::DuplicateRestaurant {
                    id: restaurant.id.clone(),
                });
            }
        }

        let mut grouped: HashMap<RestaurantId, Vec<Review>> = HashMap::new();
        let mut review_count = 0_usize;
        let mut orphans = 0_usize;
        for review in reviews {
            if known.contains(&review.restaurant_id) {
                review_count = review_count.saturating_add(1);
                grouped
                    .entry(review.restaurant_id.clone())
                    .or_default()
                    .push(review);
            } else {
                orphans = orphans.saturating_add(1);
            }
        }
        drop(known);
        if orphans > 0 {
            warn!("skipped {orphans} reviews referencing unknown restaurants");
        }

        Ok(Self {
            restaurants,
            reviews: grouped,
            review_count,
        })
    }

    /// All restaurants in load order.
    #[must_use]
    pub fn restaurants(&self) -> &[Restaurant] {
        &self.restaurants
    }

    /// Reviews for a restaurant in load order; empty when it has none.
    #[must_use]
    pub fn reviews_for(&self, id: &RestaurantId) -> &[Review] {
        self.reviews.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Number of restaurants.
    #[must_use]
    pub fn restaurant_count(&self) -> usize {
        self.restaurants.len()
    }

    /// Number of reviews attached to known restaurants.
    #[must_use]
    pub const fn review_count(&self) -> usize {
        self.review_count
    }
}
