//! Invariant checking framework for simulation validation.

use std::collections::HashSet;
use std::fmt;

use dissim_core::NodeId;

use super::clock::SimTime;
use super::state::EventLog;

/// Violation of a simulation invariant.
#[derive(Debug, Clone, PartialEq)]
pub struct InvariantViolation {
    /// Name of the violated invariant
    pub invariant: String,
    /// Detailed description of the violation
    pub description: String,
    /// Simulation time at which the violation was detected
    pub time: SimTime,
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invariant '{}' violated at {}: {}",
            self.invariant, self.time, self.description
        )
    }
}

/// Trait for checking simulation invariants.
///
/// `check_event` runs after every processed event, `check_final` once the
/// queue has drained.
pub trait Invariant: Send + Sync {
    /// Checks invariant after an event fired at `now`.
    ///
    /// # Errors
    /// Returns `InvariantViolation` if the invariant condition is not met.
    fn check_event(&self, log: &EventLog, now: SimTime) -> Result<(), InvariantViolation> {
        let _ = (log, now);
        Ok(())
    }

    /// Checks invariant on the completed run.
    ///
    /// # Errors
    /// Returns `InvariantViolation` if the invariant condition is not met.
    fn check_final(&self, log: &EventLog, now: SimTime) -> Result<(), InvariantViolation> {
        let _ = (log, now);
        Ok(())
    }

    /// Returns name of this invariant.
    fn name(&self) -> &str;
}

/// Ensures no node receives the content twice.
pub struct ExactlyOnceDelivery;

impl Invariant for ExactlyOnceDelivery {
    fn check_event(&self, log: &EventLog, now: SimTime) -> Result<(), InvariantViolation> {
        let Some(last) = log.receptions().last() else {
            return Ok(());
        };
        let count = log.delivery_count(last.destination);
        if count > 1 {
            return Err(InvariantViolation {
                invariant: self.name().to_string(),
                description: format!(
                    "Node {} received the content {count} times, last from {} on channel {}",
                    last.destination, last.source, last.channel
                ),
                time: now,
            });
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "ExactlyOnceDelivery"
    }
}

/// Ensures every expected node has received the content by the end of the run.
pub struct CompleteCoverage {
    expected: Vec<NodeId>,
}

impl CompleteCoverage {
    /// Creates invariant expecting all of `expected` to be served.
    pub fn new(expected: Vec<NodeId>) -> Self {
        Self { expected }
    }
}

impl Invariant for CompleteCoverage {
    fn check_final(&self, log: &EventLog, now: SimTime) -> Result<(), InvariantViolation> {
        let served: HashSet<NodeId> = log.receptions().iter().map(|r| r.destination).collect();
        let missing: Vec<NodeId> = self
            .expected
            .iter()
            .filter(|node| !served.contains(node))
            .copied()
            .collect();

        if !missing.is_empty() {
            let preview: Vec<String> = missing.iter().take(10).map(ToString::to_string).collect();
            return Err(InvariantViolation {
                invariant: self.name().to_string(),
                description: format!(
                    "{} of {} nodes never received the content (first: {})",
                    missing.len(),
                    self.expected.len(),
                    preview.join(", ")
                ),
                time: now,
            });
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "CompleteCoverage"
    }
}
