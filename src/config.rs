//! Configuration system for tundra runs.
//!
//! Supports YAML configuration files with the reference constants as defaults.

use crate::error::ConfigurationError;
use crate::model::{IntegrationParams, ModelParams, ParameterSet, StateVector};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub model: ModelParams,
    pub integration: IntegrationParams,
    pub initial: InitialConditions,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Initial state of the patch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InitialConditions {
    /// Lichen biomass at t = 0
    pub vegetation: f64,
    /// Reindeer count at t = 0
    pub population: f64,
}

/// Logging and progress reporting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Steps between progress lines
    pub progress_interval: usize,
    /// Log level (error, warn, info, debug, trace)
    pub log_level: String,
}

impl Default for InitialConditions {
    fn default() -> Self {
        Self {
            vegetation: 800.0,
            population: 50.0,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            progress_interval: 2000,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to the defaults.
    ///
    /// A file that exists but fails to parse or validate is an error.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, Box<dyn std::error::Error>> {
        let path = path.as_ref();
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), Box<dyn std::error::Error>> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.parameters()?;
        self.initial_state().validate()
    }

    /// Build the validated parameter set
    pub fn parameters(&self) -> Result<ParameterSet, ConfigurationError> {
        ParameterSet::new(self.model, self.integration)
    }

    pub fn initial_state(&self) -> StateVector {
        StateVector::new(self.initial.vegetation, self.initial.population)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.parameters().unwrap(), ParameterSet::default());
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let yaml = serde_yaml::to_string(&config).unwrap();
        let loaded: Config = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_optional_sections() {
        let yaml = r#"
model:
  a1: 0.25
  a2: 0.05
  b1: 1.5
  b2: 0.15
  b3: 0.35
  kpbr: 0.018
  c2: 0.45
  vegetation_capacity: 1000.0
  alpha: 300.0
integration:
  dt: 0.05
  horizon: 10.0
initial:
  vegetation: 260.0
  population: 50.0
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.logging, LoggingConfig::default());
        assert_eq!(config.integration.divergence_limit, Some(1.0e12));
        assert_eq!(config.parameters().unwrap().steps(), 200);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        config.integration.dt = 0.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.initial.population = f64::INFINITY;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let mut config = Config::default();
        config.model.alpha = 250.0;
        config.save(&path).unwrap();

        let loaded = Config::from_file(&path).unwrap();
        assert_eq!(loaded.model.alpha, 250.0);
    }

    #[test]
    fn test_invalid_file_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let mut config = Config::default();
        config.model.alpha = -5.0;
        config.save(&path).unwrap();

        assert!(Config::from_file(&path).is_err());
    }

    #[test]
    fn test_load_or_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        // Missing file falls back to defaults
        assert_eq!(Config::load_or_default(&path).unwrap(), Config::default());

        // An existing but invalid file is not silently replaced
        let mut config = Config::default();
        config.integration.dt = 0.0;
        config.save(&path).unwrap();
        assert!(Config::load_or_default(&path).is_err());

        std::fs::write(&path, "model: [not, a, mapping]").unwrap();
        assert!(Config::load_or_default(&path).is_err());
    }
}
