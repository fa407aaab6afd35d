//! Virtual time for deterministic simulations.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::SimulationError;

/// Point in virtual simulation time.
///
/// Ordered totally so it can key a priority queue. Event times are derived
/// from validated, finite configuration values.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SimTime(f64);

impl SimTime {
    /// Simulation start.
    pub const ZERO: SimTime = SimTime(0.0);

    /// Creates time instant from raw value.
    pub const fn new(time: f64) -> Self {
        Self(time)
    }

    /// Returns raw time value.
    pub const fn as_f64(self) -> f64 {
        self.0
    }

    /// Returns the instant `delay` time units after this one.
    pub fn after(self, delay: f64) -> Self {
        Self(self.0 + delay)
    }
}

impl PartialEq for SimTime {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SimTime {}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<f64> for SimTime {
    fn from(time: f64) -> Self {
        Self(time)
    }
}

/// Deterministic clock for simulation time control.
///
/// Time only moves forward, and only when the scheduler pops the next event.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    current_time: SimTime,
}

impl VirtualClock {
    /// Creates clock starting at simulation time zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns current simulation time.
    pub fn now(&self) -> SimTime {
        self.current_time
    }

    /// Advances simulation time to specific instant.
    ///
    /// # Errors
    ///
    /// - `SimulationError::InvalidEventScheduling` - If target time is in the past
    pub fn advance_to(&mut self, target: SimTime) -> Result<(), SimulationError> {
        if target < self.current_time {
            return Err(SimulationError::InvalidEventScheduling {
                reason: format!(
                    "Cannot advance time backwards from {} to {}",
                    self.current_time, target
                ),
            });
        }
        self.current_time = target;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sim_time_ordering() {
        let early = SimTime::new(1.5);
        let late = early.after(0.25);

        assert!(early < late);
        assert_eq!(late.as_f64(), 1.75);
        assert_eq!(SimTime::new(2.0).max(SimTime::ZERO), SimTime::new(2.0));
    }

    #[test]
    fn test_clock_advancement() {
        let mut clock = VirtualClock::new();
        assert_eq!(clock.now(), SimTime::ZERO);

        clock.advance_to(SimTime::new(10.0)).unwrap();
        assert_eq!(clock.now().as_f64(), 10.0);

        // Same instant is allowed for simultaneous events
        clock.advance_to(SimTime::new(10.0)).unwrap();
        assert_eq!(clock.now(), SimTime::new(10.0));
    }

    #[test]
    fn test_clock_cannot_go_backwards() {
        let mut clock = VirtualClock::new();
        clock.advance_to(SimTime::new(10.0)).unwrap();

        let result = clock.advance_to(SimTime::new(5.0));
        assert!(matches!(
            result,
            Err(SimulationError::InvalidEventScheduling { .. })
        ));
    }
}
