//! Dissim Core - Planning and configuration for recursive content dissemination
//!
//! A source node distributes content to many clients by promoting clients to
//! leaders that retransmit on additional shared channels. This crate holds the
//! pure planning functions that decide how a leader partitions its clients and
//! channels, the run configuration, identifier types and tracing setup. The
//! event engine lives in `dissim-sim`.

pub mod config;
pub mod node;
pub mod planner;
pub mod span;
pub mod strategy;
pub mod tracing_setup;

// Re-export main types for convenient access
pub use config::{ConfigError, DisseminationConfig};
pub use node::{
    Channel, ChannelId, FIRST_ADDITIONAL_CHANNEL, FIRST_CLIENT, NodeId, SOURCE, SOURCE_CHANNEL,
    channel_sequence, fits_id_space, node_sequence,
};
pub use planner::PlannerError;
pub use span::Span;
pub use strategy::{DisseminationStrategy, FollowerDivisionStrategy, LocalSplitStrategy, RunMode};
