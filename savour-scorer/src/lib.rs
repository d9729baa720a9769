//! Ranking signals and the smart-score combiner for Savour.
//!
//! Each analyser implements [`savour_core::Signal`] and scores one aspect of
//! a restaurant in `0.0..=1.0`:
//!
//! - [`BaseQuality`]: rating blended with log-scaled rating volume;
//! - [`ReviewQualityAnalyzer`]: mean authenticity of individual reviews;
//! - [`MomentumAnalyzer`]: recent review velocity and rating trend;
//! - [`CompletenessAnalyzer`]: published listing details and amenities;
//! - [`ValueAnalyzer`]: rating discounted by price tier.
//!
//! [`SmartScoreCombiner`] weights these together with query relevance into
//! a score in `0.0..=100.0`.
//!
//! # Examples
//!
//! ```
//! use chrono::Utc;
//! use savour_core::{PriceLevel, Restaurant, SignalContext};
//! use savour_scorer::SmartScoreCombiner;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let restaurant = Restaurant::new("p1", "Taqueria")?
//!     .with_rating(4.8)?
//!     .with_review_count(50)
//!     .with_price_level(PriceLevel::new(1)?);
//! let combiner = SmartScoreCombiner::default();
//! let (score, _) = combiner.score(&SignalContext::new(&restaurant, &[], Utc::now()), 0.9);
//! assert!((0.0..=100.0).contains(&score));
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

mod completeness;
mod error;
mod momentum;
mod quality;
mod rating;
mod smart;

pub use completeness::CompletenessAnalyzer;
pub use error::WeightsError;
pub use momentum::{
    MIN_REVIEWS, MomentumAnalyzer, NEUTRAL_MOMENTUM, RECENT_WINDOW_DAYS, STALLED_MOMENTUM,
    TREND_WINDOW,
};
pub use quality::{NEUTRAL_AUTHENTICITY, ReviewQualityAnalyzer};
pub use rating::{BaseQuality, REVIEW_VOLUME_CAP, ValueAnalyzer, normalised_rating, review_volume};
pub use smart::{MAX_SMART_SCORE, SmartScoreCombiner, SmartScoreWeights, WEIGHT_TOLERANCE};
