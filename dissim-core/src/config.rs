//! Centralized configuration for dissemination runs.
//!
//! A [`DisseminationConfig`] is assembled once (a JSON file or the defaults,
//! then environment overrides, then command-line flags), validated, and
//! treated as immutable for the rest of the run.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::node::{FIRST_CLIENT, SOURCE_CHANNEL, fits_id_space};
use crate::strategy::{
    DisseminationStrategy, FollowerDivisionStrategy, LocalSplitStrategy, RunMode,
};

/// Errors raised while assembling or validating a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown {kind} strategy: '{value}'")]
    UnknownStrategy { kind: &'static str, value: String },

    #[error("Invalid value for {name}: {reason}")]
    InvalidParameter { name: &'static str, reason: String },

    #[error("Failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Parameters of a single dissemination run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisseminationConfig {
    /// Number of clients to serve, excluding the source
    pub client_count: usize,
    /// Number of channels including the source's own channel
    pub channel_count: usize,
    /// Size of the disseminated content in content units
    pub content_size: f64,
    /// Capacity of every channel in content units per time unit
    pub channel_capacity: f64,
    /// Desired number of leaders spawned per activation
    pub branching_factor: usize,
    /// Time a new leader needs before it starts retransmitting
    pub activation_delay: f64,
    pub local_split: LocalSplitStrategy,
    pub follower_division: FollowerDivisionStrategy,
    pub dissemination: DisseminationStrategy,
    pub run_mode: RunMode,
    /// Backlog clients served per channel in concurrent optimizing runs, indexed by channel id
    pub channel_quotas: Option<Vec<usize>>,
}

impl Default for DisseminationConfig {
    fn default() -> Self {
        Self {
            client_count: 500,
            channel_count: 3,
            content_size: 1.0,
            channel_capacity: 1.0,
            branching_factor: 2,
            activation_delay: 0.0,
            local_split: LocalSplitStrategy::Naive,
            follower_division: FollowerDivisionStrategy::Naive,
            dissemination: DisseminationStrategy::Sequential,
            run_mode: RunMode::Normal,
            channel_quotas: None,
        }
    }
}

impl DisseminationConfig {
    /// Creates configuration with environment variable overrides.
    ///
    /// Reads `DISSIM_CLIENTS`, `DISSIM_CHANNELS`, `DISSIM_CONTENT_SIZE`,
    /// `DISSIM_CHANNEL_CAPACITY`, `DISSIM_BRANCHING_FACTOR`,
    /// `DISSIM_ACTIVATION_DELAY`, `DISSIM_LOCAL_SPLIT`, `DISSIM_FOLLOWER_DIVISION`,
    /// `DISSIM_DISS_STRATEGY` and `DISSIM_MODE`.
    ///
    /// # Errors
    ///
    /// - `ConfigError::InvalidParameter` - A numeric variable does not parse
    /// - `ConfigError::UnknownStrategy` - A strategy variable names no known strategy
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Loads configuration from a JSON file. Missing fields keep their defaults.
    ///
    /// # Errors
    ///
    /// - `ConfigError::Io` - File cannot be read
    /// - `ConfigError::Parse` - File is not a valid configuration document
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Applies `DISSIM_*` overrides resolved through `lookup`.
    ///
    /// # Errors
    ///
    /// - `ConfigError::InvalidParameter` - A numeric override does not parse
    /// - `ConfigError::UnknownStrategy` - A strategy override names no known strategy
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("DISSIM_CLIENTS") {
            self.client_count = parse_number("DISSIM_CLIENTS", &value)?;
        }
        if let Some(value) = lookup("DISSIM_CHANNELS") {
            self.channel_count = parse_number("DISSIM_CHANNELS", &value)?;
        }
        if let Some(value) = lookup("DISSIM_CONTENT_SIZE") {
            self.content_size = parse_number("DISSIM_CONTENT_SIZE", &value)?;
        }
        if let Some(value) = lookup("DISSIM_CHANNEL_CAPACITY") {
            self.channel_capacity = parse_number("DISSIM_CHANNEL_CAPACITY", &value)?;
        }
        if let Some(value) = lookup("DISSIM_BRANCHING_FACTOR") {
            self.branching_factor = parse_number("DISSIM_BRANCHING_FACTOR", &value)?;
        }
        if let Some(value) = lookup("DISSIM_ACTIVATION_DELAY") {
            self.activation_delay = parse_number("DISSIM_ACTIVATION_DELAY", &value)?;
        }
        if let Some(value) = lookup("DISSIM_LOCAL_SPLIT") {
            self.local_split = value.parse()?;
        }
        if let Some(value) = lookup("DISSIM_FOLLOWER_DIVISION") {
            self.follower_division = value.parse()?;
        }
        if let Some(value) = lookup("DISSIM_DISS_STRATEGY") {
            self.dissemination = value.parse()?;
        }
        if let Some(value) = lookup("DISSIM_MODE") {
            self.run_mode = value.parse()?;
        }
        Ok(self)
    }

    /// Checks that all parameters describe a runnable simulation.
    ///
    /// # Errors
    ///
    /// - `ConfigError::InvalidParameter` - A parameter is out of range
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.client_count == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "client_count",
                reason: "at least one client is required".to_string(),
            });
        }
        if self.channel_count == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "channel_count",
                reason: "at least the source channel is required".to_string(),
            });
        }
        if !fits_id_space(self.client_count, FIRST_CLIENT) {
            return Err(ConfigError::InvalidParameter {
                name: "client_count",
                reason: format!("{} clients exceed the node id space", self.client_count),
            });
        }
        if !fits_id_space(self.channel_count, SOURCE_CHANNEL.as_u32()) {
            return Err(ConfigError::InvalidParameter {
                name: "channel_count",
                reason: format!("{} channels exceed the channel id space", self.channel_count),
            });
        }
        require_positive("content_size", self.content_size)?;
        require_positive("channel_capacity", self.channel_capacity)?;
        if !self.activation_delay.is_finite() || self.activation_delay < 0.0 {
            return Err(ConfigError::InvalidParameter {
                name: "activation_delay",
                reason: format!("must be finite and non-negative, got {}", self.activation_delay),
            });
        }
        Ok(())
    }

    /// Returns time to transfer the content once over a channel of `capacity`.
    pub fn transmit_time(&self, capacity: f64) -> f64 {
        crate::planner::transmit_time(self.content_size, capacity)
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidParameter {
            name,
            reason: format!("'{value}' is not a number"),
        })
}

fn require_positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidParameter {
            name,
            reason: format!("must be finite and positive, got {value}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = DisseminationConfig::default();
        assert_eq!(config.client_count, 500);
        assert_eq!(config.channel_count, 3);
        assert_eq!(config.branching_factor, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overrides_apply() {
        let config = DisseminationConfig::default()
            .with_overrides(lookup_from(&[
                ("DISSIM_CLIENTS", "20"),
                ("DISSIM_CHANNEL_CAPACITY", "5.0"),
                ("DISSIM_FOLLOWER_DIVISION", "count_weighted"),
                ("DISSIM_MODE", "optimizing"),
            ]))
            .unwrap();

        assert_eq!(config.client_count, 20);
        assert_eq!(config.channel_capacity, 5.0);
        assert_eq!(config.follower_division, FollowerDivisionStrategy::CountWeighted);
        assert_eq!(config.run_mode, RunMode::Optimizing);
    }

    #[test]
    fn test_unknown_strategy_override_is_rejected() {
        let result = DisseminationConfig::default()
            .with_overrides(lookup_from(&[("DISSIM_DISS_STRATEGY", "broadcast")]));
        assert!(matches!(result, Err(ConfigError::UnknownStrategy { .. })));
    }

    #[test]
    fn test_bad_number_override_is_rejected() {
        let result = DisseminationConfig::default()
            .with_overrides(lookup_from(&[("DISSIM_CLIENTS", "many")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidParameter { name: "DISSIM_CLIENTS", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_out_of_range() {
        let config = DisseminationConfig {
            channel_capacity: 0.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = DisseminationConfig {
            activation_delay: -1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = DisseminationConfig {
            channel_count: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = DisseminationConfig {
            client_count: 0,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidParameter { name: "client_count", .. })
        ));
    }

    #[test]
    fn test_validate_rejects_counts_beyond_id_space() {
        let config = DisseminationConfig {
            client_count: u32::MAX as usize,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidParameter { name: "client_count", .. })
        ));

        let config = DisseminationConfig {
            channel_count: u32::MAX as usize,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidParameter { name: "channel_count", .. })
        ));

        // Largest client count whose ids still fit
        let config = DisseminationConfig {
            client_count: u32::MAX as usize - 2,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_json_file_fills_missing_fields_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"client_count": 40, "dissemination": "concurrent", "channel_quotas": [0, 20, 19]}}"#
        )
        .unwrap();

        let config = DisseminationConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.client_count, 40);
        assert_eq!(config.dissemination, DisseminationStrategy::Concurrent);
        assert_eq!(config.channel_quotas, Some(vec![0, 20, 19]));
        assert_eq!(config.channel_count, 3);
    }

    #[test]
    fn test_json_with_unknown_strategy_fails_to_parse() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"follower_division": "random"}}"#).unwrap();

        let result = DisseminationConfig::from_json_file(file.path());
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_transmit_time() {
        let config = DisseminationConfig {
            content_size: 2.0,
            ..Default::default()
        };
        assert_eq!(config.transmit_time(4.0), 0.5);
    }
}
