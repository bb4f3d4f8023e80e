//! Validated weight triples for the final score blend.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Allowed distance of the weight sum from 1.0
pub const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WeightsError {
    #[error("{component} weight is not a finite number: {value}")]
    NotFinite { component: &'static str, value: f64 },

    #[error("{component} weight must be within [0, 1], got {value}")]
    OutOfRange { component: &'static str, value: f64 },

    #[error("weights must sum to 1, got {sum}")]
    BadSum { sum: f64 },
}

pub type Result<T> = std::result::Result<T, WeightsError>;

/// `(personal, trending, diversity)` weights.
///
/// Can only be built through [`ScoreWeights::new`] (or deserialized through
/// the same checks), so a value in hand is always valid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawScoreWeights")]
pub struct ScoreWeights {
    personal: f64,
    trending: f64,
    diversity: f64,
}

#[derive(Deserialize)]
struct RawScoreWeights {
    personal: f64,
    trending: f64,
    diversity: f64,
}

impl TryFrom<RawScoreWeights> for ScoreWeights {
    type Error = WeightsError;

    fn try_from(raw: RawScoreWeights) -> Result<Self> {
        ScoreWeights::new(raw.personal, raw.trending, raw.diversity)
    }
}

impl ScoreWeights {
    /// Weights for users with like history
    pub const PERSONALIZED: ScoreWeights = ScoreWeights {
        personal: 0.7,
        trending: 0.2,
        diversity: 0.1,
    };

    /// Weights for users without any likes
    pub const COLD_START: ScoreWeights = ScoreWeights {
        personal: 0.0,
        trending: 0.9,
        diversity: 0.1,
    };

    pub fn new(personal: f64, trending: f64, diversity: f64) -> Result<Self> {
        for (component, value) in [
            ("personal", personal),
            ("trending", trending),
            ("diversity", diversity),
        ] {
            if !value.is_finite() {
                return Err(WeightsError::NotFinite { component, value });
            }
            if !(0.0..=1.0).contains(&value) {
                return Err(WeightsError::OutOfRange { component, value });
            }
        }

        let sum = personal + trending + diversity;
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(WeightsError::BadSum { sum });
        }

        Ok(Self {
            personal,
            trending,
            diversity,
        })
    }

    pub fn personal(&self) -> f64 {
        self.personal
    }

    pub fn trending(&self) -> f64 {
        self.trending
    }

    pub fn diversity(&self) -> f64 {
        self.diversity
    }
}
