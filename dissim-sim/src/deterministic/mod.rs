//! Deterministic discrete-event engine for dissemination runs.
//!
//! Virtual time advances only when the scheduler pops the next event, and
//! simultaneous events fire in insertion order, so a configuration always
//! produces the same logs.

mod clock;
mod events;
mod invariants;
mod simulation;
mod state;

// Re-export core types for public API
pub use clock::{SimTime, VirtualClock};
pub use events::{EventKind, PendingEvent, SimulationEvent};
pub use invariants::{CompleteCoverage, ExactlyOnceDelivery, Invariant, InvariantViolation};
pub use simulation::{DisseminationSimulation, EventScheduler, SimulationError, SimulationReport};
pub use state::{EventLog, LeaderActivation, Reception, SimulationContext, SimulationMetrics};

#[cfg(test)]
mod tests;
