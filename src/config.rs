use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::DecodeError;

/// Tunables for a decode run. Missing JSON fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeConfig {
    /// An occupancy step is uncertain when the runner-up scores within
    /// this distance of the winner.
    pub uncertain_threshold: f64,
    /// An occupancy step is uncertain when the winner's distance exceeds
    /// this value.
    pub dist_threshold: f64,
    /// Candidates reported per step.
    pub candidate_limit: usize,
    /// Candidates reported per entry of the uncertain collection.
    pub uncertain_candidate_limit: usize,
    /// Starting arrangement; `None` is the standard start.
    pub initial_fen: Option<String>,
    /// Score candidates of a step on the rayon pool.
    pub parallel: bool,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        DecodeConfig {
            uncertain_threshold: 0.1,
            dist_threshold: 2.0,
            candidate_limit: 3,
            uncertain_candidate_limit: 5,
            initial_fen: None,
            parallel: true,
        }
    }
}

impl DecodeConfig {
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DecodeError> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
