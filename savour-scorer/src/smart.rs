//! Weighted aggregation of ranking signals into a 0-100 smart score.

use log::debug;
use savour_core::{ScoreBreakdown, Signal, SignalContext, sanitise_component};
use serde::{Deserialize, Serialize};

use crate::{
    BaseQuality, CompletenessAnalyzer, MomentumAnalyzer, ReviewQualityAnalyzer, ValueAnalyzer,
    WeightsError,
};

/// Highest smart score.
pub const MAX_SMART_SCORE: f32 = 100.0;

/// Allowed deviation of the weight total from one.
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Relative importance of each smart-score component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmartScoreWeights {
    /// Weight of rating and review volume.
    pub base_quality: f32,
    /// Weight of review authenticity.
    pub authenticity: f32,
    /// Weight of momentum.
    pub momentum: f32,
    /// Weight of listing completeness.
    pub completeness: f32,
    /// Weight of value for money.
    pub value: f32,
    /// Weight of query relevance.
    pub relevance: f32,
}

impl Default for SmartScoreWeights {
    fn default() -> Self {
        Self {
            base_quality: 0.30,
            authenticity: 0.15,
            momentum: 0.10,
            completeness: 0.10,
            value: 0.10,
            relevance: 0.25,
        }
    }
}

impl SmartScoreWeights {
    const fn named(self) -> [(&'static str, f32); 6] {
        [
            ("base_quality", self.base_quality),
            ("authenticity", self.authenticity),
            ("momentum", self.momentum),
            ("completeness", self.completeness),
            ("value", self.value),
            ("relevance", self.relevance),
        ]
    }

    /// Validate the weights and return a copy.
    ///
    /// # Errors
    /// Returns [`WeightsError::InvalidWeight`] when a value is negative or
    /// not finite, and [`WeightsError::BadTotal`] when the values do not sum
    /// to one within [`WEIGHT_TOLERANCE`].
    #[expect(clippy::float_arithmetic, reason = "summing weights")]
    pub fn validate(self) -> Result<Self, WeightsError> {
        let named = self.named();
        if let Some((name, value)) = named
            .iter()
            .find(|(_, value)| !value.is_finite() || *value < 0.0)
        {
            return Err(WeightsError::InvalidWeight {
                name: *name,
                value: *value,
            });
        }
        let sum: f64 = named.iter().map(|(_, value)| f64::from(*value)).sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(WeightsError::BadTotal { sum });
        }
        Ok(self)
    }
}

/// Combines the ranking signals into a smart score.
///
/// Every component is sanitised into `0.0..=1.0` before weighting and the
/// final score is clamped to `0.0..=100.0`. Browse requests pass a
/// relevance of zero; the remaining weights are not renormalised.
///
/// # Examples
/// ```
/// use chrono::Utc;
/// use savour_core::{Restaurant, SignalContext};
/// use savour_scorer::SmartScoreCombiner;
///
/// let combiner = SmartScoreCombiner::default();
/// let restaurant = Restaurant::new("p1", "Cafe").expect("valid restaurant");
/// let (score, breakdown) = combiner.score(&SignalContext::new(&restaurant, &[], Utc::now()), 0.0);
/// // Only the neutral authenticity and momentum defaults contribute.
/// assert!((score - 12.5).abs() < 1e-4);
/// assert_eq!(breakdown.relevance, 0.0);
/// ```
#[derive(Debug, Clone, Default)]
pub struct SmartScoreCombiner {
    weights: SmartScoreWeights,
    base_quality: BaseQuality,
    authenticity: ReviewQualityAnalyzer,
    momentum: MomentumAnalyzer,
    completeness: CompletenessAnalyzer,
    value: ValueAnalyzer,
}

impl SmartScoreCombiner {
    /// Build a combiner with validated weights.
    ///
    /// # Errors
    /// Returns [`WeightsError`] when the weights fail validation.
    pub fn new(weights: SmartScoreWeights) -> Result<Self, WeightsError> {
        Ok(Self {
            weights: weights.validate()?,
            ..Self::default()
        })
    }

    /// Active weights.
    #[must_use]
    pub const fn weights(&self) -> SmartScoreWeights {
        self.weights
    }

    /// Evaluate every component for one restaurant.
    #[must_use]
    pub fn breakdown(&self, context: &SignalContext<'_>, relevance: f32) -> ScoreBreakdown {
        ScoreBreakdown {
            base_quality: self.base_quality.score(context),
            authenticity: self.authenticity.score(context),
            momentum: self.momentum.score(context),
            completeness: self.completeness.score(context),
            value: self.value.score(context),
            relevance: sanitise_component(relevance, 0.0),
        }
    }

    /// Weight a breakdown into a score in `0.0..=100.0`.
    #[must_use]
    #[expect(clippy::float_arithmetic, reason = "weighted sum")]
    pub fn combine(&self, breakdown: &ScoreBreakdown) -> f32 {
        let w = self.weights;
        let weighted = w.base_quality * breakdown.base_quality
            + w.authenticity * breakdown.authenticity
            + w.momentum * breakdown.momentum
            + w.completeness * breakdown.completeness
            + w.value * breakdown.value
            + w.relevance * breakdown.relevance;
        let score = MAX_SMART_SCORE * weighted;
        if score.is_finite() {
            score.clamp(0.0, MAX_SMART_SCORE)
        } else {
            0.0
        }
    }

    /// Evaluate and weight the components for one restaurant.
    #[must_use]
    pub fn score(&self, context: &SignalContext<'_>, relevance: f32) -> (f32, ScoreBreakdown) {
        let breakdown = self.breakdown(context, relevance);
        let score = self.combine(&breakdown);
        debug!(
            "scored {} at {score:.2} (relevance {:.3})",
            context.restaurant.id, breakdown.relevance
        );
        (score, breakdown)
    }
}
