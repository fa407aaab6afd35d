//! Tests for deterministic simulation framework.

use std::sync::Arc;

use dissim_core::{
    Channel, ChannelId, DisseminationConfig, DisseminationStrategy, NodeId, RunMode, Span,
    channel_sequence, node_sequence,
};

use crate::deterministic::{
    DisseminationSimulation, EventLog, ExactlyOnceDelivery, Invariant, InvariantViolation,
    SimTime, SimulationError,
};
use crate::leader::LeaderActivationEvent;
use crate::scenarios::scenario_for;

/// Fails once more than `limit` leaders have been activated.
struct LeaderLimit {
    limit: usize,
}

impl Invariant for LeaderLimit {
    fn check_event(&self, log: &EventLog, now: SimTime) -> Result<(), InvariantViolation> {
        let leaders = log.leader_activations().len();
        if leaders > self.limit {
            return Err(InvariantViolation {
                invariant: self.name().to_string(),
                description: format!("{leaders} leaders exceed limit {}", self.limit),
                time: now,
            });
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "LeaderLimit"
    }
}

fn root_leader(clients: usize, channels: usize) -> LeaderActivationEvent {
    LeaderActivationEvent::new(
        NodeId::new(1),
        Channel::new(ChannelId::new(1), 1.0),
        Span::from(node_sequence(clients, 2)),
        Span::from(channel_sequence(channels, 2, 1.0)),
    )
}

#[test]
fn test_simulation_reproducibility() {
    let config = DisseminationConfig {
        client_count: 200,
        channel_count: 6,
        activation_delay: 0.3,
        ..Default::default()
    };

    let report1 = scenario_for(config.clone()).unwrap().execute().unwrap();
    let report2 = scenario_for(config).unwrap().execute().unwrap();

    // Results should be identical
    assert_eq!(report1.event_count, report2.event_count);
    assert_eq!(report1.log.receptions(), report2.log.receptions());
    assert_eq!(
        report1.log.leader_activations(),
        report2.log.leader_activations()
    );
    assert_eq!(report1.final_time, report2.final_time);
}

#[test]
fn test_logs_are_time_ordered() {
    let config = DisseminationConfig {
        client_count: 300,
        channel_count: 8,
        ..Default::default()
    };
    let report = scenario_for(config).unwrap().execute().unwrap();

    let receptions = report.log.receptions();
    assert!(receptions.windows(2).all(|w| w[0].time <= w[1].time));
    let activations = report.log.leader_activations();
    assert!(activations.windows(2).all(|w| w[0].time <= w[1].time));
}

#[test]
fn test_simultaneous_deliveries_fire_in_scheduling_order() {
    let config = DisseminationConfig {
        dissemination: DisseminationStrategy::Concurrent,
        ..Default::default()
    };
    let mut sim = DisseminationSimulation::new(config).unwrap();
    sim.seed_leader(SimTime::ZERO, root_leader(5, 0)).unwrap();

    let report = sim.execute().unwrap();
    let order: Vec<NodeId> = report.log.receptions().iter().map(|r| r.destination).collect();
    assert_eq!(order, node_sequence(5, 2));
    assert!(report
        .log
        .receptions()
        .iter()
        .all(|r| r.time == SimTime::new(5.0)));
}

#[test]
fn test_invariant_violation_stops_run() {
    let mut sim = DisseminationSimulation::new(DisseminationConfig::default()).unwrap();
    sim.add_invariant(Arc::new(LeaderLimit { limit: 2 }));
    sim.seed_leader(SimTime::ZERO, root_leader(100, 4)).unwrap();

    let result = sim.execute();
    match result {
        Err(SimulationError::InvariantViolation(violation)) => {
            assert_eq!(violation.invariant, "LeaderLimit");
        }
        other => panic!("expected invariant violation, got {other:?}"),
    }
}

#[test]
fn test_exactly_once_holds_for_default_run() {
    let mut sim = DisseminationSimulation::new(DisseminationConfig::default()).unwrap();
    sim.add_invariant(Arc::new(ExactlyOnceDelivery));
    sim.seed_leader(SimTime::ZERO, root_leader(500, 2)).unwrap();

    let report = sim.execute().unwrap();
    assert_eq!(report.log.receptions().len(), 500);
    assert!(report.log.duplicate_deliveries().is_empty());
}

#[test]
fn test_fatal_event_error_propagates() {
    let mut sim = DisseminationSimulation::new(DisseminationConfig::default()).unwrap();
    // Two locals are kept for promotion, leaving one follower and no branching
    sim.seed_leader(SimTime::ZERO, root_leader(3, 2)).unwrap();

    assert!(matches!(
        sim.execute(),
        Err(SimulationError::FollowersWithoutBranching { .. })
    ));
}

#[test]
fn test_optimizing_run_terminates() {
    let config = DisseminationConfig {
        client_count: 120,
        channel_count: 5,
        run_mode: RunMode::Optimizing,
        ..Default::default()
    };
    let report = scenario_for(config).unwrap().execute().unwrap();

    assert_eq!(report.backlog_remaining, 0);
    assert_eq!(report.log.receptions().len(), 120);
    assert_eq!(report.log.client_receptions().len(), 116);
    assert_eq!(report.log.leader_activations().len(), 5);
}
