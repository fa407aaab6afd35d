//! Simulation state tracking and metrics collection.

use std::collections::{BTreeMap, HashMap};

use dissim_core::{ChannelId, DisseminationConfig, NodeId};
use serde::Serialize;

use super::clock::SimTime;
use crate::backlog::{Backlog, ChannelQuotas};

/// One node obtaining the content from another over a channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Reception {
    /// Time the transfer completed
    pub time: SimTime,
    /// Sending node
    pub source: NodeId,
    /// Receiving node
    pub destination: NodeId,
    /// Channel the transfer used
    pub channel: ChannelId,
}

/// A node starting to act as leader.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LeaderActivation {
    /// Activation time
    pub time: SimTime,
    /// Activated node
    pub leader: NodeId,
}

/// Append-only record of everything that happened during a run.
///
/// Records appear in firing order, which is non-decreasing in time.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EventLog {
    receptions: Vec<Reception>,
    client_receptions: Vec<Reception>,
    leader_activations: Vec<LeaderActivation>,
    #[serde(skip)]
    delivery_counts: HashMap<NodeId, usize>,
}

impl EventLog {
    /// Creates empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a reception.
    pub fn record_reception(&mut self, reception: Reception) {
        *self.delivery_counts.entry(reception.destination).or_insert(0) += 1;
        self.receptions.push(reception);
    }

    /// Records a reception that served a backlog client.
    ///
    /// Client receptions are also regular receptions.
    pub fn record_client_reception(&mut self, reception: Reception) {
        self.client_receptions.push(reception);
        self.record_reception(reception);
    }

    /// Records a leader activation.
    pub fn record_leader_activation(&mut self, time: SimTime, leader: NodeId) {
        self.leader_activations.push(LeaderActivation { time, leader });
    }

    /// All receptions in firing order.
    pub fn receptions(&self) -> &[Reception] {
        &self.receptions
    }

    /// Receptions that served backlog clients, in firing order.
    pub fn client_receptions(&self) -> &[Reception] {
        &self.client_receptions
    }

    /// Leader activations in firing order.
    pub fn leader_activations(&self) -> &[LeaderActivation] {
        &self.leader_activations
    }

    /// Number of times `node` has received the content.
    pub fn delivery_count(&self, node: NodeId) -> usize {
        self.delivery_counts.get(&node).copied().unwrap_or(0)
    }

    /// Nodes that received the content more than once, with their counts.
    pub fn duplicate_deliveries(&self) -> Vec<(NodeId, usize)> {
        let mut duplicates: Vec<_> = self
            .delivery_counts
            .iter()
            .filter(|&(_, &count)| count > 1)
            .map(|(&node, &count)| (node, count))
            .collect();
        duplicates.sort_unstable();
        duplicates
    }
}

/// Mutable state shared by all events of one run.
#[derive(Debug)]
pub struct SimulationContext {
    pub(crate) config: DisseminationConfig,
    pub(crate) log: EventLog,
    pub(crate) backlog: Backlog,
    pub(crate) quotas: Option<ChannelQuotas>,
}

impl SimulationContext {
    /// Creates context with an empty log and backlog.
    pub fn new(config: DisseminationConfig) -> Self {
        Self {
            config,
            log: EventLog::new(),
            backlog: Backlog::default(),
            quotas: None,
        }
    }

    /// Returns run configuration.
    pub fn config(&self) -> &DisseminationConfig {
        &self.config
    }

    /// Returns event log.
    pub fn log(&self) -> &EventLog {
        &self.log
    }

    /// Returns shared backlog.
    pub fn backlog(&self) -> &Backlog {
        &self.backlog
    }
}

/// Metrics collected during simulation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SimulationMetrics {
    /// Total events processed
    pub events_processed: u64,
    /// Events by type
    pub events_by_type: BTreeMap<String, u64>,
    /// Largest number of events pending at once
    pub peak_queue_len: usize,
}

impl SimulationMetrics {
    /// Creates new metrics collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an event being processed.
    pub fn record_event(&mut self, event_type_str: &str) {
        self.events_processed += 1;
        *self
            .events_by_type
            .entry(event_type_str.to_string())
            .or_insert(0) += 1;
    }

    /// Updates peak queue length.
    pub fn update_peak_queue_len(&mut self, queue_len: usize) {
        if queue_len > self.peak_queue_len {
            self.peak_queue_len = queue_len;
        }
    }

    /// Generates summary statistics.
    pub fn summary(&self) -> String {
        let mut summary = String::new();

        summary.push_str(&format!("Events processed: {}\n", self.events_processed));
        summary.push_str(&format!("Peak queue length: {}\n", self.peak_queue_len));
        for (event_type, count) in &self.events_by_type {
            summary.push_str(&format!("  {event_type}: {count}\n"));
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reception(time: f64, destination: u32) -> Reception {
        Reception {
            time: SimTime::new(time),
            source: NodeId::new(0),
            destination: NodeId::new(destination),
            channel: ChannelId::new(1),
        }
    }

    #[test]
    fn test_event_log_counts_deliveries() {
        let mut log = EventLog::new();
        log.record_reception(reception(1.0, 5));
        log.record_reception(reception(2.0, 6));
        log.record_reception(reception(3.0, 5));

        assert_eq!(log.receptions().len(), 3);
        assert_eq!(log.delivery_count(NodeId::new(5)), 2);
        assert_eq!(log.delivery_count(NodeId::new(6)), 1);
        assert_eq!(log.delivery_count(NodeId::new(7)), 0);
        assert_eq!(log.duplicate_deliveries(), vec![(NodeId::new(5), 2)]);
        assert_eq!(log.receptions().last().map(|r| r.time), Some(SimTime::new(3.0)));
    }

    #[test]
    fn test_client_reception_is_also_reception() {
        let mut log = EventLog::new();
        log.record_reception(reception(1.0, 2));
        log.record_client_reception(reception(2.0, 3));

        assert_eq!(log.receptions().len(), 2);
        assert_eq!(log.client_receptions(), &[reception(2.0, 3)]);
    }

    #[test]
    fn test_leader_activations_keep_order() {
        let mut log = EventLog::new();
        log.record_leader_activation(SimTime::new(0.0), NodeId::new(1));
        log.record_leader_activation(SimTime::new(1.0), NodeId::new(2));

        let leaders: Vec<_> = log.leader_activations().iter().map(|a| a.leader).collect();
        assert_eq!(leaders, vec![NodeId::new(1), NodeId::new(2)]);
    }

    #[test]
    fn test_metrics_record_events() {
        let mut metrics = SimulationMetrics::new();
        metrics.record_event("ContentDelivery");
        metrics.record_event("ContentDelivery");
        metrics.record_event("LeaderActivation");
        metrics.update_peak_queue_len(4);
        metrics.update_peak_queue_len(2);

        assert_eq!(metrics.events_processed, 3);
        assert_eq!(metrics.events_by_type["ContentDelivery"], 2);
        assert_eq!(metrics.peak_queue_len, 4);
        assert!(metrics.summary().contains("Events processed: 3"));
    }
}
