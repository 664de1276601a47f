/// Engine configuration: branching policy and RNG seeding.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::graph::ContentError;
use crate::core::timeline::{DEFAULT_BRANCH_PROBABILITY, DEFAULT_TIMELINE_LABELS};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Chance in `[0, 1]` that an eligible choice forks a timeline.
    #[serde(default = "default_probability")]
    pub branch_probability: f64,
    /// Names handed to new timelines in order, wrapping around.
    #[serde(default = "default_labels")]
    pub timeline_labels: Vec<String>,
    /// Seed for the branch roll. `None` seeds from entropy.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_probability() -> f64 {
    DEFAULT_BRANCH_PROBABILITY
}

fn default_labels() -> Vec<String> {
    DEFAULT_TIMELINE_LABELS.iter().map(|s| s.to_string()).collect()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            branch_probability: default_probability(),
            timeline_labels: default_labels(),
            seed: None,
        }
    }
}

impl EngineConfig {
    /// Load a config from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<EngineConfig, ContentError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a config from a RON string. Missing fields take defaults.
    pub fn parse_ron(input: &str) -> Result<EngineConfig, ContentError> {
        let config: EngineConfig = ron::from_str(input)?;
        Ok(config)
    }

    /// Returns a description of the first invalid setting, if any.
    pub fn validate(&self) -> Result<(), String> {
        if !(0.0..=1.0).contains(&self.branch_probability) {
            return Err(format!(
                "branch_probability must be within [0, 1], got {}",
                self.branch_probability
            ));
        }
        if self.timeline_labels.is_empty() {
            return Err("timeline_labels must not be empty".to_string());
        }
        Ok(())
    }
}
