//! Event types and scheduling order for deterministic simulations.

use std::cmp::Ordering;

use super::clock::SimTime;
use super::simulation::SimulationError;
use super::state::SimulationContext;
use crate::delivery::ContentDeliveryEvent;
use crate::leader::LeaderActivationEvent;
use crate::optimizer::OptimizerLeaderEvent;

/// Types of events that can occur in the simulation.
#[derive(Debug, Clone)]
pub enum EventKind {
    /// A node starts acting as leader and partitions its assignment
    LeaderActivation(LeaderActivationEvent),
    /// A node starts acting as leader in an optimizing run
    OptimizerLeaderActivation(OptimizerLeaderEvent),
    /// A node finishes receiving the content
    ContentDelivery(ContentDeliveryEvent),
}

impl EventKind {
    /// Returns string representation of event type for metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::LeaderActivation(_) => "LeaderActivation",
            EventKind::OptimizerLeaderActivation(_) => "OptimizerLeaderActivation",
            EventKind::ContentDelivery(_) => "ContentDelivery",
        }
    }

    /// Fires the event at `now`, returning the events it produces.
    ///
    /// # Errors
    ///
    /// Propagates the fatal conditions of the individual event kinds.
    pub(crate) fn process(
        &self,
        now: SimTime,
        context: &mut SimulationContext,
    ) -> Result<Vec<PendingEvent>, SimulationError> {
        match self {
            EventKind::LeaderActivation(event) => event.process(now, context),
            EventKind::OptimizerLeaderActivation(event) => event.process(now, context),
            EventKind::ContentDelivery(event) => event.process(now, context),
        }
    }
}

impl From<LeaderActivationEvent> for EventKind {
    fn from(event: LeaderActivationEvent) -> Self {
        EventKind::LeaderActivation(event)
    }
}

impl From<OptimizerLeaderEvent> for EventKind {
    fn from(event: OptimizerLeaderEvent) -> Self {
        EventKind::OptimizerLeaderActivation(event)
    }
}

impl From<ContentDeliveryEvent> for EventKind {
    fn from(event: ContentDeliveryEvent) -> Self {
        EventKind::ContentDelivery(event)
    }
}

/// Event produced by a firing event, not yet assigned a queue position.
#[derive(Debug, Clone)]
pub struct PendingEvent {
    /// Requested execution time
    pub time: SimTime,
    /// Type of event
    pub kind: EventKind,
}

impl PendingEvent {
    /// Creates pending event at `time`.
    pub fn new(time: SimTime, kind: impl Into<EventKind>) -> Self {
        Self {
            time,
            kind: kind.into(),
        }
    }
}

/// Scheduled simulation event.
#[derive(Debug, Clone)]
pub struct SimulationEvent {
    /// Insertion sequence number for deterministic ordering
    pub id: u64,
    /// Scheduled execution time
    pub time: SimTime,
    /// Type of event
    pub kind: EventKind,
}

impl SimulationEvent {
    /// Creates new simulation event.
    pub fn new(id: u64, time: SimTime, kind: EventKind) -> Self {
        Self { id, time, kind }
    }
}

impl Eq for SimulationEvent {}

impl PartialEq for SimulationEvent {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Ord for SimulationEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for min-heap behavior: earliest time first, then
        // earliest insertion among simultaneous events
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.id.cmp(&self.id))
    }
}

impl PartialOrd for SimulationEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BinaryHeap;

    use dissim_core::{ChannelId, NodeId};

    use super::*;

    fn delivery(id: u64, time: f64) -> SimulationEvent {
        SimulationEvent::new(
            id,
            SimTime::new(time),
            ContentDeliveryEvent::direct(NodeId::new(id as u32), NodeId::new(0), ChannelId::new(1))
                .into(),
        )
    }

    #[test]
    fn test_event_time_ordering() {
        let early = delivery(2, 1.0);
        let late = delivery(1, 2.0);

        // Ord is reversed for min-heap behavior, so early > late
        assert!(early > late);
    }

    #[test]
    fn test_simultaneous_events_pop_in_insertion_order() {
        let mut heap = BinaryHeap::new();
        heap.push(delivery(3, 5.0));
        heap.push(delivery(1, 5.0));
        heap.push(delivery(0, 7.0));
        heap.push(delivery(2, 5.0));

        let order: Vec<u64> = std::iter::from_fn(|| heap.pop()).map(|e| e.id).collect();
        assert_eq!(order, vec![1, 2, 3, 0]);
    }

    #[test]
    fn test_event_kind_string_conversion() {
        let event = delivery(0, 0.0);
        assert_eq!(event.kind.as_str(), "ContentDelivery");
    }
}
