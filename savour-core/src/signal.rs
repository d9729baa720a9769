//! Per-restaurant ranking signals.
//!
//! A [`Signal`] condenses one aspect of a restaurant (review authenticity,
//! momentum, listing completeness, value for money) into a score in
//! `0.0..=1.0`. Implementations live in the scorer crate; the engine only
//! depends on this trait.

use chrono::{DateTime, Utc};

use crate::{Restaurant, Review};

/// Inputs available to every signal.
#[derive(Debug, Clone, Copy)]
pub struct SignalContext<'a> {
    /// Restaurant under evaluation.
    pub restaurant: &'a Restaurant,
    /// Its reviews in snapshot order.
    pub reviews: &'a [Review],
    /// Reference instant for recency calculations.
    pub now: DateTime<Utc>,
}

impl<'a> SignalContext<'a> {
    /// Bundle the inputs for one restaurant.
    #[must_use]
    pub const fn new(restaurant: &'a Restaurant, reviews: &'a [Review], now: DateTime<Utc>) -> Self {
        Self {
            restaurant,
            reviews,
            now,
        }
    }
}

/// Replace a non-finite component with `neutral` and clamp to `0.0..=1.0`.
///
/// # Examples
/// ```
/// use savour_core::sanitise_component;
///
/// assert_eq!(sanitise_component(f32::NAN, 0.5), 0.5);
/// assert_eq!(sanitise_component(1.4, 0.5), 1.0);
/// assert_eq!(sanitise_component(-0.2, 0.5), 0.0);
/// ```
#[must_use]
pub fn sanitise_component(value: f32, neutral: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        neutral.clamp(0.0, 1.0)
    }
}

/// Score one aspect of a restaurant.
///
/// Implementations must be thread-safe so a single instance can serve
/// concurrent requests. [`Signal::evaluate`] may return any value;
/// [`Signal::score`] applies [`sanitise_component`] with the signal's
/// neutral default so callers always receive a finite score in
/// `0.0..=1.0`.
///
/// # Examples
///
/// ```rust
/// use chrono::Utc;
/// use savour_core::{Restaurant, Signal, SignalContext};
///
/// struct Broken;
///
/// impl Signal for Broken {
///     fn neutral(&self) -> f32 {
///         0.5
///     }
///
///     fn evaluate(&self, _context: &SignalContext<'_>) -> f32 {
///         f32::NAN
///     }
/// }
///
/// let restaurant = Restaurant::new("p1", "Cafe").expect("valid restaurant");
/// let context = SignalContext::new(&restaurant, &[], Utc::now());
/// assert_eq!(Broken.score(&context), 0.5);
/// ```
pub trait Signal: Send + Sync {
    /// Score used when the inputs are insufficient or the result is not
    /// finite.
    fn neutral(&self) -> f32;

    /// Compute the raw score.
    fn evaluate(&self, context: &SignalContext<'_>) -> f32;

    /// Compute the sanitised score.
    fn score(&self, context: &SignalContext<'_>) -> f32 {
        sanitise_component(self.evaluate(context), self.neutral())
    }
}

impl<S: Signal + ?Sized> Signal for Box<S> {
    fn neutral(&self) -> f32 {
        (**self).neutral()
    }

    fn evaluate(&self, context: &SignalContext<'_>) -> f32 {
        (**self).evaluate(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(f32::NAN, 0.5, 0.5)]
    #[case(f32::INFINITY, 0.3, 0.3)]
    #[case(f32::NEG_INFINITY, 0.0, 0.0)]
    #[case(-0.1, 0.5, 0.0)]
    #[case(1.2, 0.5, 1.0)]
    #[case(0.4, 0.5, 0.4)]
    #[case(f32::NAN, 7.0, 1.0)]
    fn sanitise_replaces_and_clamps(
        #[case] input: f32,
        #[case] neutral: f32,
        #[case] expected: f32,
    ) {
        let result = sanitise_component(input, neutral);
        assert!(result.is_finite());
        assert!((result - expected).abs() <= f32::EPSILON);
    }
}
