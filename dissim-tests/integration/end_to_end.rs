//! Recursive run of 20 clients over four channels seeded at t = 10.

use std::collections::HashSet;

use dissim_core::{
    Channel, ChannelId, DisseminationConfig, NodeId, Span, channel_sequence, node_sequence,
};
use dissim_sim::{DisseminationSimulation, ExactlyOnceDelivery, LeaderActivationEvent, SimTime};

const TOLERANCE: f64 = 1e-9;

fn run() -> dissim_sim::SimulationReport {
    let config = DisseminationConfig {
        client_count: 20,
        channel_count: 4,
        channel_capacity: 5.0,
        ..Default::default()
    };

    let mut simulation = DisseminationSimulation::new(config).unwrap();
    simulation.add_invariant(std::sync::Arc::new(ExactlyOnceDelivery));
    simulation
        .seed_leader(
            SimTime::new(10.0),
            LeaderActivationEvent::new(
                NodeId::new(0),
                Channel::new(ChannelId::new(1), 5.0),
                Span::from(node_sequence(20, 1)),
                Span::from(channel_sequence(4, 1, 1.0)),
            ),
        )
        .unwrap();
    simulation.execute().unwrap()
}

fn assert_close(actual: SimTime, expected: f64, what: &str) {
    assert!(
        (actual.as_f64() - expected).abs() < TOLERANCE,
        "{what}: expected {expected}, got {actual}"
    );
}

#[test]
fn test_every_client_served_exactly_once() {
    let report = run();

    let destinations: HashSet<NodeId> = report
        .log
        .receptions()
        .iter()
        .map(|reception| reception.destination)
        .collect();
    assert_eq!(report.log.receptions().len(), 20);
    assert_eq!(destinations, node_sequence(20, 1).into_iter().collect());
    assert!(report.log.duplicate_deliveries().is_empty());
}

#[test]
fn test_leader_activations() {
    let report = run();

    let expected = [(0, 10.0), (1, 10.2), (2, 10.4), (5, 11.2), (13, 11.4)];
    let activations = report.log.leader_activations();
    assert_eq!(activations.len(), expected.len());
    for (activation, (leader, time)) in activations.iter().zip(expected) {
        assert_eq!(activation.leader, NodeId::new(leader));
        assert_close(activation.time, time, "leader activation");
    }
}

#[test]
fn test_reception_schedule() {
    let report = run();

    // (destination, time, source, channel)
    let expected = [
        (1, 10.2, 0, 1),
        (2, 10.4, 0, 1),
        (3, 10.6, 0, 1),
        (4, 10.8, 0, 1),
        (5, 11.2, 1, 1),
        (6, 12.2, 1, 1),
        (7, 13.2, 1, 1),
        (8, 14.2, 1, 1),
        (9, 12.2, 5, 2),
        (10, 13.2, 5, 2),
        (11, 14.2, 5, 2),
        (12, 15.2, 5, 2),
        (13, 11.4, 2, 3),
        (14, 12.4, 2, 3),
        (15, 13.4, 2, 3),
        (16, 14.4, 2, 3),
        (17, 12.4, 13, 4),
        (18, 13.4, 13, 4),
        (19, 14.4, 13, 4),
        (20, 15.4, 13, 4),
    ];

    let mut receptions = report.log.receptions().to_vec();
    receptions.sort_by_key(|reception| reception.destination);
    for (reception, (destination, time, source, channel)) in receptions.iter().zip(expected) {
        assert_eq!(reception.destination, NodeId::new(destination));
        assert_eq!(reception.source, NodeId::new(source), "source of {destination}");
        assert_eq!(reception.channel, ChannelId::new(channel), "channel of {destination}");
        assert_close(reception.time, time, "reception");
    }
    assert_close(report.final_time, 15.4, "final time");
}

#[test]
fn test_log_is_time_ordered() {
    let report = run();

    let receptions = report.log.receptions();
    assert!(receptions.windows(2).all(|w| w[0].time <= w[1].time));
    assert!(report.log.client_receptions().is_empty());
    assert_eq!(report.backlog_remaining, 0);
}
