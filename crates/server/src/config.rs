//! Engine configuration.
//!
//! Defaults reproduce the production tuning. Values can be overridden from a
//! JSON file or from `EVENT_RECS_*` environment variables:
//!
//! | variable | field |
//! |----------|-------|
//! | `EVENT_RECS_LIMIT` | `recommendation_limit` |
//! | `EVENT_RECS_DECAY_LAMBDA` | `decay_lambda` |
//! | `EVENT_RECS_PERSONALIZED_WEIGHTS` | `personalized_weights` (`"0.7,0.2,0.1"`) |
//! | `EVENT_RECS_COLD_START_WEIGHTS` | `cold_start_weights` |
//! | `EVENT_RECS_DIVERSITY_PROBABILITY` | `diversity_probability` |
//! | `EVENT_RECS_DIVERSITY_BOOST` | `diversity_boost` |
//! | `EVENT_RECS_CLAMP_FUTURE_LIKES` | `clamp_future_likes` |
//! | `EVENT_RECS_SEED` | `random_seed` |

use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use std::str::FromStr;

use scoring::{
    DEFAULT_DECAY_LAMBDA, DEFAULT_DIVERSITY_BOOST, DEFAULT_DIVERSITY_PROBABILITY,
    RECOMMENDATION_LIMIT, ScoreWeights, WeightsError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value:?} ({reason})")]
    InvalidEnv {
        key: String,
        value: String,
        reason: String,
    },

    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Invalid weights: {0}")]
    Weights(#[from] WeightsError),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Tuning knobs of the recommendation and trending engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Maximum number of events per response, at most [`RECOMMENDATION_LIMIT`]
    pub recommendation_limit: usize,
    /// Per-day decay rate of like weights
    pub decay_lambda: f64,
    pub personalized_weights: ScoreWeights,
    pub cold_start_weights: ScoreWeights,
    pub diversity_probability: f64,
    pub diversity_boost: f64,
    /// Treat future-dated likes as made today
    pub clamp_future_likes: bool,
    /// Seed for reproducible diversity draws; thread-local randomness if unset
    pub random_seed: Option<u64>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            recommendation_limit: RECOMMENDATION_LIMIT,
            decay_lambda: DEFAULT_DECAY_LAMBDA,
            personalized_weights: ScoreWeights::PERSONALIZED,
            cold_start_weights: ScoreWeights::COLD_START,
            diversity_probability: DEFAULT_DIVERSITY_PROBABILITY,
            diversity_boost: DEFAULT_DIVERSITY_BOOST,
            clamp_future_likes: false,
            random_seed: None,
        }
    }
}

impl EngineConfig {
    /// Create config from environment variables over the defaults
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load a JSON config file; missing fields keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let config: Self = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`from_env`](Self::from_env) but reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(v) = parse_var(&lookup, "EVENT_RECS_LIMIT")? {
            config.recommendation_limit = v;
        }
        if let Some(v) = parse_var(&lookup, "EVENT_RECS_DECAY_LAMBDA")? {
            config.decay_lambda = v;
        }
        if let Some(v) = weights_var(&lookup, "EVENT_RECS_PERSONALIZED_WEIGHTS")? {
            config.personalized_weights = v;
        }
        if let Some(v) = weights_var(&lookup, "EVENT_RECS_COLD_START_WEIGHTS")? {
            config.cold_start_weights = v;
        }
        if let Some(v) = parse_var(&lookup, "EVENT_RECS_DIVERSITY_PROBABILITY")? {
            config.diversity_probability = v;
        }
        if let Some(v) = parse_var(&lookup, "EVENT_RECS_DIVERSITY_BOOST")? {
            config.diversity_boost = v;
        }
        if let Some(v) = parse_var(&lookup, "EVENT_RECS_CLAMP_FUTURE_LIKES")? {
            config.clamp_future_likes = v;
        }
        if let Some(v) = parse_var(&lookup, "EVENT_RECS_SEED")? {
            config.random_seed = Some(v);
        }

        config.validate()?;
        Ok(config)
    }

    /// Set the random seed (builder style).
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = Some(seed);
        self
    }

    /// Check the scalar fields. Weight triples are valid by construction.
    pub fn validate(&self) -> Result<()> {
        if !(1..=RECOMMENDATION_LIMIT).contains(&self.recommendation_limit) {
            return Err(ConfigError::Invalid {
                field: "recommendation_limit",
                reason: format!(
                    "must be within [1, {}], got {}",
                    RECOMMENDATION_LIMIT, self.recommendation_limit
                ),
            });
        }
        if !self.decay_lambda.is_finite() || self.decay_lambda < 0.0 {
            return Err(ConfigError::Invalid {
                field: "decay_lambda",
                reason: format!("must be a non-negative number, got {}", self.decay_lambda),
            });
        }
        if !(0.0..=1.0).contains(&self.diversity_probability) {
            return Err(ConfigError::Invalid {
                field: "diversity_probability",
                reason: format!("must be within [0, 1], got {}", self.diversity_probability),
            });
        }
        if !self.diversity_boost.is_finite() || self.diversity_boost < 0.0 {
            return Err(ConfigError::Invalid {
                field: "diversity_boost",
                reason: format!("must be a non-negative number, got {}", self.diversity_boost),
            });
        }
        Ok(())
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<T>()
        .map(Some)
        .map_err(|e: T::Err| ConfigError::InvalidEnv {
            key: key.to_string(),
            value: raw.clone(),
            reason: e.to_string(),
        })
}

/// Parse `"personal,trending,diversity"`.
fn weights_var(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<ScoreWeights>> {
    let Some(raw) = lookup(key) else {
        return Ok(None);
    };
    let invalid = |reason: String| ConfigError::InvalidEnv {
        key: key.to_string(),
        value: raw.clone(),
        reason,
    };

    let parts = raw
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<f64>, _>>()
        .map_err(|e| invalid(e.to_string()))?;

    match parts.as_slice() {
        &[personal, trending, diversity] => {
            Ok(Some(ScoreWeights::new(personal, trending, diversity)?))
        }
        _ => Err(invalid(format!("expected 3 weights, got {}", parts.len()))),
    }
}
