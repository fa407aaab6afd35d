//! Core simulation engine: event scheduler and run driver.

use std::collections::BinaryHeap;
use std::sync::Arc;

use dissim_core::{
    ChannelId, ConfigError, DisseminationConfig, FollowerDivisionStrategy, NodeId, PlannerError,
    RunMode,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::clock::{SimTime, VirtualClock};
use super::events::{EventKind, SimulationEvent};
use super::invariants::{Invariant, InvariantViolation};
use super::state::{EventLog, SimulationContext, SimulationMetrics};
use crate::backlog::{Backlog, ChannelQuotas};
use crate::leader::LeaderActivationEvent;
use crate::optimizer::OptimizerLeaderEvent;

/// Errors that can occur during simulation.
#[derive(Debug, Error)]
pub enum SimulationError {
    /// Configuration was rejected before any event was scheduled
    #[error("Invalid configuration: {0}")]
    Configuration(#[from] ConfigError),

    /// A planning function was called outside its preconditions
    #[error("Planning failed: {0}")]
    Planner(#[from] PlannerError),

    /// Leader has followers but no channel to delegate them to
    #[error("Leader {node} has {followers} followers but a branching factor of zero")]
    FollowersWithoutBranching {
        /// Activated leader
        node: NodeId,
        /// Number of followers left unserved
        followers: usize,
    },

    /// Selected follower division strategy has no implementation
    #[error("Follower division strategy '{strategy}' is not supported")]
    UnsupportedDivisionStrategy {
        /// Selected strategy
        strategy: FollowerDivisionStrategy,
    },

    /// Fewer local clients than leaders to promote
    #[error("Leader {node} needs {needed} leader candidates but has {available} local clients")]
    InsufficientLeaderCandidates {
        /// Activated leader
        node: NodeId,
        /// Branching factor
        needed: usize,
        /// Local clients available
        available: usize,
    },

    /// Backlog cannot supply a channel's quota
    #[error("Channel {channel} needs {requested} backlog clients but only {remaining} remain")]
    BacklogExhausted {
        /// Channel being served
        channel: ChannelId,
        /// Quota of the channel
        requested: usize,
        /// Undrawn backlog clients
        remaining: usize,
    },

    /// Concurrent optimizing run has no quota for a channel
    #[error("No client quota configured for channel {channel}")]
    MissingChannelQuota {
        /// Channel without quota
        channel: ChannelId,
    },

    /// Event could not be scheduled properly
    #[error("Invalid event scheduling: {reason}")]
    InvalidEventScheduling {
        /// Reason why scheduling failed
        reason: String,
    },

    /// An invariant check failed
    #[error("{0}")]
    InvariantViolation(InvariantViolation),
}

/// Time-ordered event set and the simulation loop.
///
/// Events fire in non-decreasing time order; simultaneous events fire in
/// insertion order.
#[derive(Debug, Default)]
pub struct EventScheduler {
    clock: VirtualClock,
    queue: BinaryHeap<SimulationEvent>,
    next_event_id: u64,
    metrics: SimulationMetrics,
}

impl EventScheduler {
    /// Creates empty scheduler at time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns current simulation time.
    pub fn now(&self) -> SimTime {
        self.clock.now()
    }

    /// Number of events not yet fired.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Returns true if no events are pending.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Returns collected metrics.
    pub fn metrics(&self) -> &SimulationMetrics {
        &self.metrics
    }

    /// Inserts an event, returning its sequence id.
    ///
    /// # Errors
    ///
    /// - `SimulationError::InvalidEventScheduling` - `time` is before the current time
    pub fn schedule(&mut self, time: SimTime, kind: EventKind) -> Result<u64, SimulationError> {
        if time < self.clock.now() {
            return Err(SimulationError::InvalidEventScheduling {
                reason: format!(
                    "{} event at {} is earlier than current time {}",
                    kind.as_str(),
                    time,
                    self.clock.now()
                ),
            });
        }

        let id = self.next_event_id;
        self.next_event_id += 1;
        self.queue.push(SimulationEvent::new(id, time, kind));
        self.metrics.update_peak_queue_len(self.queue.len());
        Ok(id)
    }

    /// Fires the earliest pending event and inserts its successors.
    ///
    /// Returns the time of the fired event, or `None` if nothing was pending.
    ///
    /// # Errors
    ///
    /// - `SimulationError::InvalidEventScheduling` - A successor lies in the past
    /// - Any fatal condition raised while processing the event
    pub fn step(
        &mut self,
        context: &mut SimulationContext,
    ) -> Result<Option<SimTime>, SimulationError> {
        let Some(event) = self.queue.pop() else {
            return Ok(None);
        };

        self.clock.advance_to(event.time)?;
        let successors = event.kind.process(event.time, context)?;
        self.metrics.record_event(event.kind.as_str());

        for pending in successors {
            self.schedule(pending.time, pending.kind)?;
        }

        Ok(Some(event.time))
    }

    /// Fires events until none remain.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by [`EventScheduler::step`].
    pub fn run(&mut self, context: &mut SimulationContext) -> Result<(), SimulationError> {
        while self.step(context)?.is_some() {}
        Ok(())
    }
}

/// Result of a simulation run.
#[derive(Debug, Clone, Serialize)]
pub struct SimulationReport {
    /// Collected metrics
    pub metrics: SimulationMetrics,
    /// Everything recorded during the run
    pub log: EventLog,
    /// Time of the last fired event
    pub final_time: SimTime,
    /// Total events processed
    pub event_count: u64,
    /// Backlog clients never drawn
    pub backlog_remaining: usize,
}

impl SimulationReport {
    /// Generates human-readable summary.
    pub fn summary(&self) -> String {
        let mut summary = String::new();
        summary.push_str("Simulation Report\n");
        summary.push_str(&format!("Final time: {}\n", self.final_time));
        summary.push_str(&format!("Events processed: {}\n", self.event_count));
        summary.push_str(&format!("Receptions: {}\n", self.log.receptions().len()));
        summary.push_str(&format!(
            "Client receptions: {}\n",
            self.log.client_receptions().len()
        ));
        summary.push_str(&format!(
            "Leader activations: {}\n",
            self.log.leader_activations().len()
        ));
        summary.push_str(&format!("Backlog remaining: {}\n", self.backlog_remaining));
        summary.push_str("\nEvent breakdown:\n");

        for (event_type, count) in &self.metrics.events_by_type {
            summary.push_str(&format!("  {event_type}: {count}\n"));
        }

        summary
    }
}

/// One dissemination run: configuration, scheduler, shared context and invariants.
pub struct DisseminationSimulation {
    context: SimulationContext,
    scheduler: EventScheduler,
    invariants: Vec<Arc<dyn Invariant>>,
    seeded: bool,
}

impl DisseminationSimulation {
    /// Creates simulation for a validated configuration.
    ///
    /// # Errors
    /// - `SimulationError::Configuration` - Configuration is out of range
    pub fn new(config: DisseminationConfig) -> Result<Self, SimulationError> {
        config.validate()?;

        Ok(Self {
            context: SimulationContext::new(config),
            scheduler: EventScheduler::new(),
            invariants: Vec::new(),
            seeded: false,
        })
    }

    /// Returns run configuration.
    pub fn config(&self) -> &DisseminationConfig {
        self.context.config()
    }

    /// Returns the shared state visible to events.
    pub fn context(&self) -> &SimulationContext {
        &self.context
    }

    /// Returns the scheduler.
    pub fn scheduler(&self) -> &EventScheduler {
        &self.scheduler
    }

    /// Adds an invariant to check during simulation.
    pub fn add_invariant(&mut self, invariant: Arc<dyn Invariant>) {
        self.invariants.push(invariant);
    }

    /// Seeds the single initial leader of a normal run.
    ///
    /// # Errors
    /// - `SimulationError::InvalidEventScheduling` - Already seeded, or the run is in optimizing mode
    pub fn seed_leader(
        &mut self,
        time: SimTime,
        event: LeaderActivationEvent,
    ) -> Result<(), SimulationError> {
        self.ensure_seedable(RunMode::Normal)?;
        self.scheduler.schedule(time, event.into())?;
        self.seeded = true;
        Ok(())
    }

    /// Seeds the single initial leader of an optimizing run together with
    /// its backlog and, for concurrent runs, the per-channel quotas.
    ///
    /// # Errors
    /// - `SimulationError::InvalidEventScheduling` - Already seeded, or the run is in normal mode
    pub fn seed_optimizer(
        &mut self,
        time: SimTime,
        event: OptimizerLeaderEvent,
        backlog: Backlog,
        quotas: Option<ChannelQuotas>,
    ) -> Result<(), SimulationError> {
        self.ensure_seedable(RunMode::Optimizing)?;
        self.context.backlog = backlog;
        self.context.quotas = quotas;
        self.scheduler.schedule(time, event.into())?;
        self.seeded = true;
        Ok(())
    }

    fn ensure_seedable(&self, mode: RunMode) -> Result<(), SimulationError> {
        if self.seeded {
            return Err(SimulationError::InvalidEventScheduling {
                reason: "simulation already has its initial leader".to_string(),
            });
        }
        if self.context.config.run_mode != mode {
            return Err(SimulationError::InvalidEventScheduling {
                reason: format!(
                    "cannot seed a {mode} leader in a {} run",
                    self.context.config.run_mode
                ),
            });
        }
        Ok(())
    }

    /// Runs the simulation until no events remain.
    ///
    /// # Errors
    /// - `SimulationError::InvalidEventScheduling` - No initial leader was seeded
    /// - `SimulationError::InvariantViolation` - An invariant failed
    /// - Any fatal condition raised by an event
    pub fn execute(mut self) -> Result<SimulationReport, SimulationError> {
        if !self.seeded {
            return Err(SimulationError::InvalidEventScheduling {
                reason: "no initial leader seeded".to_string(),
            });
        }

        debug!(
            mode = %self.context.config.run_mode,
            clients = self.context.config.client_count,
            channels = self.context.config.channel_count,
            "Starting dissemination run"
        );

        while let Some(now) = self.scheduler.step(&mut self.context)? {
            self.check_invariants(now, false)?;
        }
        let final_time = self.scheduler.now();
        self.check_invariants(final_time, true)?;

        let report = SimulationReport {
            metrics: self.scheduler.metrics().clone(),
            event_count: self.scheduler.metrics().events_processed,
            backlog_remaining: self.context.backlog.remaining(),
            final_time,
            log: self.context.log,
        };

        if report.backlog_remaining > 0 {
            warn!(
                remaining = report.backlog_remaining,
                "Run finished with unserved backlog clients"
            );
        }
        info!(
            events = report.event_count,
            receptions = report.log.receptions().len(),
            leaders = report.log.leader_activations().len(),
            final_time = %report.final_time,
            "Dissemination run complete"
        );

        Ok(report)
    }

    fn check_invariants(&self, now: SimTime, finished: bool) -> Result<(), SimulationError> {
        for invariant in &self.invariants {
            let result = if finished {
                invariant.check_final(&self.context.log, now)
            } else {
                invariant.check_event(&self.context.log, now)
            };
            result.map_err(SimulationError::InvariantViolation)?;
        }
        Ok(())
    }
}
