//! Strategy selectors for dissemination planning and simulation runs.
//!
//! Every selector parses from its lowercase name. Unknown names are rejected
//! with [`ConfigError::UnknownStrategy`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

/// How a leader splits its clients into directly served locals and followers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalSplitStrategy {
    /// Even split across the leader's own channel and its additional channels.
    #[default]
    Naive,
    /// Grows the local share to cover activation delay of freshly switched leaders.
    SwitchDelayCorrected,
}

/// How followers are divided between the branches of a leader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowerDivisionStrategy {
    /// Contiguous groups of equal size, remainder to the last branch.
    #[default]
    Naive,
    /// Proportional to the number of channels each branch receives.
    CountWeighted,
    /// Proportional to branch channel capacity. Not implemented; selecting it aborts the run.
    CapacityWeighted,
}

/// How a leader serves its local clients on its own channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisseminationStrategy {
    /// One transfer after another, each taking a full transmit time.
    #[default]
    Sequential,
    /// Shared-capacity broadcast; every local client finishes at the same time.
    Concurrent,
}

/// Simulation run type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Static recursive partitioning of clients into follower groups.
    #[default]
    Normal,
    /// Greedy policy where every active channel drains a shared backlog.
    Optimizing,
}

impl LocalSplitStrategy {
    /// Returns the name used in configuration files and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Naive => "naive",
            Self::SwitchDelayCorrected => "switch_delay_corrected",
        }
    }
}

impl fmt::Display for LocalSplitStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LocalSplitStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "naive" => Ok(Self::Naive),
            "switch_delay_corrected" => Ok(Self::SwitchDelayCorrected),
            _ => Err(ConfigError::UnknownStrategy {
                kind: "local split",
                value: s.to_string(),
            }),
        }
    }
}

impl FollowerDivisionStrategy {
    /// Returns the name used in configuration files and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Naive => "naive",
            Self::CountWeighted => "count_weighted",
            Self::CapacityWeighted => "capacity_weighted",
        }
    }
}

impl fmt::Display for FollowerDivisionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FollowerDivisionStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "naive" => Ok(Self::Naive),
            "count_weighted" => Ok(Self::CountWeighted),
            "capacity_weighted" => Ok(Self::CapacityWeighted),
            _ => Err(ConfigError::UnknownStrategy {
                kind: "follower division",
                value: s.to_string(),
            }),
        }
    }
}

impl DisseminationStrategy {
    /// Returns the name used in configuration files and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sequential => "sequential",
            Self::Concurrent => "concurrent",
        }
    }
}

impl fmt::Display for DisseminationStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DisseminationStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "concurrent" => Ok(Self::Concurrent),
            _ => Err(ConfigError::UnknownStrategy {
                kind: "dissemination",
                value: s.to_string(),
            }),
        }
    }
}

impl RunMode {
    /// Returns the name used in configuration files and on the command line.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Optimizing => "optimizing",
        }
    }

    /// Check if this is an optimizing run.
    pub fn is_optimizing(self) -> bool {
        matches!(self, Self::Optimizing)
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RunMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "optimizing" => Ok(Self::Optimizing),
            _ => Err(ConfigError::UnknownStrategy {
                kind: "run mode",
                value: s.to_string(),
            }),
        }
    }
}
