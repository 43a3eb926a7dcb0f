//! Configuration types for the form progress controller.
//!
//! This module defines the step sequence, the request-bearing steps and the
//! simulated progress curve, plus loading, saving and validation.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Main configuration for a form session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormConfig {
    /// Ordered step identifiers. Insertion order is traversal order.
    pub steps: Vec<String>,

    /// Step at which the generation request may be started.
    pub request_initiated_step: String,

    /// Virtual terminal step reached when the request completes.
    pub request_completed_step: String,

    /// Shape of the synthetic progress curve.
    #[serde(default)]
    pub simulated_progress: SimulatedProgressConfig,
}

/// Timing and step sizes for simulated request progress.
///
/// All values are whole percentages or milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulatedProgressConfig {
    /// Delay before the one-time initial jump.
    #[serde(default = "default_initial_jump_ms")]
    pub initial_jump_ms: u64,

    /// Progress value set by the initial jump.
    #[serde(default = "default_initial_jump_value")]
    pub initial_jump_value: u8,

    /// Period of the recurring increment, armed once the jump has fired.
    #[serde(default = "default_increment_interval_ms")]
    pub increment_interval_ms: u64,

    /// Amount added on each increment.
    #[serde(default = "default_increment_value")]
    pub increment_value: u8,

    /// Ceiling the simulator never exceeds while a request is active.
    #[serde(default = "default_max_progress")]
    pub max_progress: u8,
}

fn default_initial_jump_ms() -> u64 {
    500
}

fn default_initial_jump_value() -> u8 {
    10
}

fn default_increment_interval_ms() -> u64 {
    1000
}

fn default_increment_value() -> u8 {
    5
}

fn default_max_progress() -> u8 {
    90
}

impl Default for SimulatedProgressConfig {
    fn default() -> Self {
        Self {
            initial_jump_ms: default_initial_jump_ms(),
            initial_jump_value: default_initial_jump_value(),
            increment_interval_ms: default_increment_interval_ms(),
            increment_value: default_increment_value(),
            max_progress: default_max_progress(),
        }
    }
}

impl SimulatedProgressConfig {
    /// Check the curve parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_progress == 0 || self.max_progress > 100 {
            return Err(ConfigError::Invalid(format!(
                "max_progress must be in 1..=100, got {}",
                self.max_progress
            )));
        }
        if self.initial_jump_value > 100 {
            return Err(ConfigError::Invalid(format!(
                "initial_jump_value must be at most 100, got {}",
                self.initial_jump_value
            )));
        }
        if self.increment_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "increment_interval_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl FormConfig {
    /// Create a configuration from step names, using the default progress curve.
    pub fn new(
        steps: impl IntoIterator<Item = impl Into<String>>,
        request_initiated_step: impl Into<String>,
        request_completed_step: impl Into<String>,
    ) -> Self {
        Self {
            steps: steps.into_iter().map(Into::into).collect(),
            request_initiated_step: request_initiated_step.into(),
            request_completed_step: request_completed_step.into(),
            simulated_progress: SimulatedProgressConfig::default(),
        }
    }

    /// Replace the simulated progress curve.
    #[must_use]
    pub fn with_simulated_progress(mut self, simulated_progress: SimulatedProgressConfig) -> Self {
        self.simulated_progress = simulated_progress;
        self
    }

    /// Load configuration from a file and validate it.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        let config: Self = serde_json::from_str(&content).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a file.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = serde_json::to_string_pretty(self).map_err(ConfigError::Serialize)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigError::Io)?;
        }
        std::fs::write(path, content).map_err(ConfigError::Io)
    }

    /// Check the step sequence and the progress curve.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.steps.is_empty() {
            return Err(ConfigError::Invalid("steps must not be empty".into()));
        }

        let mut seen = HashSet::with_capacity(self.steps.len());
        for step in &self.steps {
            if step.is_empty() {
                return Err(ConfigError::Invalid("step names must not be empty".into()));
            }
            if !seen.insert(step.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate step: {step}")));
            }
        }

        if !seen.contains(self.request_initiated_step.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "request_initiated_step '{}' is not one of the steps",
                self.request_initiated_step
            )));
        }
        if self.request_completed_step.is_empty() {
            return Err(ConfigError::Invalid(
                "request_completed_step must not be empty".into(),
            ));
        }
        if seen.contains(self.request_completed_step.as_str()) {
            return Err(ConfigError::Invalid(format!(
                "request_completed_step '{}' must not be one of the steps",
                self.request_completed_step
            )));
        }

        self.simulated_progress.validate()
    }
}

impl Default for FormConfig {
    fn default() -> Self {
        Self::new(["equipment", "profile", "preferences"], "preferences", "results")
    }
}

/// Errors that can occur when working with configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error reading or writing config.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error parsing config JSON.
    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),

    /// Error serializing config to JSON.
    #[error("Serialize error: {0}")]
    Serialize(#[source] serde_json::Error),

    /// Configuration is structurally invalid.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FormConfig::default();
        assert_eq!(config.steps, vec!["equipment", "profile", "preferences"]);
        assert_eq!(config.request_initiated_step, "preferences");
        assert_eq!(config.request_completed_step, "results");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_simulated_defaults_when_omitted() {
        let json = r#"{
            "steps": ["a", "b"],
            "request_initiated_step": "b",
            "request_completed_step": "done"
        }"#;
        let config: FormConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.simulated_progress, SimulatedProgressConfig::default());
        assert_eq!(config.simulated_progress.max_progress, 90);
    }

    #[test]
    fn test_partial_simulated_block() {
        let json = r#"{
            "steps": ["a"],
            "request_initiated_step": "a",
            "request_completed_step": "done",
            "simulated_progress": { "increment_value": 7 }
        }"#;
        let config: FormConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.simulated_progress.increment_value, 7);
        assert_eq!(config.simulated_progress.initial_jump_ms, 500);
    }

    #[test]
    fn test_rejects_empty_steps() {
        let config = FormConfig::new(Vec::<String>::new(), "a", "done");
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_duplicate_steps() {
        let config = FormConfig::new(["a", "b", "a"], "a", "done");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("duplicate step: a"));
    }

    #[test]
    fn test_rejects_missing_initiated_step() {
        let config = FormConfig::new(["a", "b"], "c", "done");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("request_initiated_step"));
    }

    #[test]
    fn test_rejects_completed_step_inside_sequence() {
        let config = FormConfig::new(["a", "b"], "a", "b");
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("must not be one of the steps"));
    }

    #[test]
    fn test_rejects_bad_curve() {
        let base = FormConfig::default();

        let zero_max = base.clone().with_simulated_progress(SimulatedProgressConfig {
            max_progress: 0,
            ..SimulatedProgressConfig::default()
        });
        assert!(zero_max.validate().is_err());

        let over_max = base.clone().with_simulated_progress(SimulatedProgressConfig {
            max_progress: 101,
            ..SimulatedProgressConfig::default()
        });
        assert!(over_max.validate().is_err());

        let zero_interval = base.with_simulated_progress(SimulatedProgressConfig {
            increment_interval_ms: 0,
            ..SimulatedProgressConfig::default()
        });
        assert!(zero_interval.validate().is_err());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = FormConfig::new(["intro", "details"], "details", "summary");
        config.save(&path).unwrap();

        let loaded = FormConfig::load(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{"steps": [], "request_initiated_step": "a", "request_completed_step": "b"}"#,
        )
        .unwrap();

        assert!(matches!(FormConfig::load(&path), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = FormConfig::load(&dir.path().join("absent.json"));
        assert!(matches!(result, Err(ConfigError::Io(_))));
    }
}
