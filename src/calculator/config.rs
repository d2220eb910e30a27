//! Calculator configuration.
//!
//! Positive sampling and threshold values are required at construction;
//! a calculator is never built from an invalid configuration.

use super::batch::{BatchOptions, DEFAULT_CHUNK_SIZE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for a [`BoxCalculator`](super::BoxCalculator).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorConfig {
    /// Number of frames sampled for the background median.
    pub bg_probes: usize,
    /// Intensity difference a pixel must exceed to count as foreground.
    pub diff_thresh: u8,
    /// Frame indices per unit of parallel work.
    pub chunk_size: usize,
    /// Worker count for batch runs; `None` picks one from the workload.
    pub num_workers: Option<usize>,
    /// Seed for background sampling; `None` seeds from the OS.
    pub seed: Option<u64>,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            bg_probes: 100,
            diff_thresh: 10,
            chunk_size: DEFAULT_CHUNK_SIZE,
            num_workers: None,
            seed: None,
        }
    }
}

impl CalculatorConfig {
    /// Creates a configuration with the given sampling parameters.
    pub fn with_sampling(bg_probes: usize, diff_thresh: u8) -> Self {
        Self {
            bg_probes,
            diff_thresh,
            ..Default::default()
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bg_probes == 0 {
            return Err(ConfigError::InvalidProbes);
        }
        if self.diff_thresh == 0 {
            return Err(ConfigError::InvalidThreshold);
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidChunkSize);
        }
        Ok(())
    }

    /// Batch options carrying this configuration's worker settings.
    pub fn batch_options(&self) -> BatchOptions {
        BatchOptions {
            num_workers: self.num_workers,
            chunk_size: self.chunk_size,
            cancel: None,
        }
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("bg_probes must be positive")]
    InvalidProbes,
    #[error("diff_thresh must be positive")]
    InvalidThreshold,
    #[error("chunk_size must be positive")]
    InvalidChunkSize,
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Where the CLI writes its results.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct OutputConfig {
    /// JSON file receiving the computed boxes.
    pub boxes_path: Option<PathBuf>,
    /// Image file receiving the background model.
    pub background_path: Option<PathBuf>,
    /// Text file receiving Prometheus metrics.
    pub metrics_path: Option<PathBuf>,
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Calculator parameters.
    #[serde(default)]
    pub calculator: CalculatorConfig,
    /// Output locations.
    #[serde(default)]
    pub output: OutputConfig,
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates TOML configuration text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.calculator.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = CalculatorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.bg_probes, 100);
        assert_eq!(config.diff_thresh, 10);
        assert_eq!(config.chunk_size, 50);
    }

    #[test]
    fn test_zero_probes_invalid() {
        let config = CalculatorConfig::with_sampling(0, 10);
        assert!(matches!(config.validate(), Err(ConfigError::InvalidProbes)));
    }

    #[test]
    fn test_zero_threshold_invalid() {
        let config = CalculatorConfig::with_sampling(10, 0);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidThreshold)
        ));
    }

    #[test]
    fn test_zero_chunk_invalid() {
        let config = CalculatorConfig {
            chunk_size: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidChunkSize)
        ));
    }

    #[test]
    fn test_parse_partial_file() {
        let config = FileConfig::from_toml(
            r#"
            [calculator]
            bg_probes = 40
            seed = 7

            [output]
            boxes_path = "out/boxes.json"
            "#,
        )
        .unwrap();

        assert_eq!(config.calculator.bg_probes, 40);
        assert_eq!(config.calculator.diff_thresh, 10);
        assert_eq!(config.calculator.seed, Some(7));
        assert_eq!(
            config.output.boxes_path.as_deref(),
            Some(Path::new("out/boxes.json"))
        );
        assert!(config.output.metrics_path.is_none());
    }

    #[test]
    fn test_file_values_validated() {
        assert!(matches!(
            FileConfig::from_toml("[calculator]\ndiff_thresh = 0\n"),
            Err(ConfigError::InvalidThreshold)
        ));
        assert!(matches!(
            FileConfig::from_toml("[calculator]\ndiff_thresh = 300\n"),
            Err(ConfigError::ParseError(_))
        ));
    }

    #[test]
    fn test_batch_options_follow_config() {
        let config = CalculatorConfig {
            chunk_size: 8,
            num_workers: Some(3),
            ..Default::default()
        };
        let options = config.batch_options();
        assert_eq!(options.chunk_size, 8);
        assert_eq!(options.num_workers, Some(3));
    }
}
