//! Dissim Simulation - Deterministic discrete-event engine for recursive dissemination.

#![warn(missing_docs)]
#![warn(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
#![warn(clippy::too_many_lines)]
//!
//! A source node distributes content to many clients over a handful of
//! shared channels. Instead of serving everyone itself, it promotes some
//! clients to leaders that retransmit on the additional channels, and those
//! leaders recurse. This crate simulates that process in virtual time and
//! records every reception and leader activation.
//!
//! # Features
//!
//! - **Deterministic Execution**: Same configuration always produces identical logs
//! - **Event-Based Simulation**: Time-ordered scheduler with FIFO tie-breaking
//! - **Two Run Modes**: Normal recursive planning and the backlog-draining optimizer
//! - **Invariant Checking**: Exactly-once delivery and complete coverage
//! - **Reports**: Per-channel counts, bucketed CDF, leader count over time, JSON
//!
//! # Example
//!
//! ```rust,no_run
//! use dissim_core::DisseminationConfig;
//! use dissim_sim::scenarios::scenario_for;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = DisseminationConfig {
//!     client_count: 100,
//!     ..Default::default()
//! };
//!
//! let report = scenario_for(config)?.execute()?;
//! println!("{}", report.summary());
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Deterministic Engine**: Scheduler, virtual clock, event log and invariants
//! - **Events**: Leader activation (normal and optimizing) and content delivery
//! - **Backlog**: Shared pool of unserved clients for optimizing runs
//! - **Scenario Library**: Standard setups built from a configuration
//! - **Reports**: Text and JSON renderers over a finished run

pub mod backlog;
pub mod delivery;
pub mod deterministic;
pub mod leader;
pub mod optimizer;
pub mod reports;
pub mod scenarios;

// Re-export core types for convenience
pub use backlog::{Backlog, ChannelQuotas};
pub use delivery::{ContentDeliveryEvent, DeliveryKind};
pub use deterministic::{
    CompleteCoverage, DisseminationSimulation, EventKind, EventLog, EventScheduler,
    ExactlyOnceDelivery, Invariant, InvariantViolation, LeaderActivation, PendingEvent, Reception,
    SimTime, SimulationContext, SimulationError, SimulationEvent, SimulationMetrics,
    SimulationReport, VirtualClock,
};
pub use leader::LeaderActivationEvent;
pub use optimizer::OptimizerLeaderEvent;
pub use scenarios::{normal_scenario, optimizing_scenario, scenario_for};
