//! Optimizing runs draining the shared backlog.

use dissim_core::{ChannelId, DisseminationConfig, DisseminationStrategy, NodeId, RunMode};
use dissim_sim::{SimulationError, SimulationReport, scenario_for};

fn optimizing(
    dissemination: DisseminationStrategy,
    quotas: Option<Vec<usize>>,
) -> DisseminationConfig {
    DisseminationConfig {
        client_count: 10,
        channel_count: 3,
        run_mode: RunMode::Optimizing,
        dissemination,
        channel_quotas: quotas,
        ..Default::default()
    }
}

fn execute(config: DisseminationConfig) -> Result<SimulationReport, SimulationError> {
    scenario_for(config)?.execute()
}

fn client_schedule(report: &SimulationReport) -> Vec<(u32, f64, u32)> {
    let mut schedule: Vec<_> = report
        .log
        .client_receptions()
        .iter()
        .map(|r| (r.destination.as_u32(), r.time.as_f64(), r.channel.as_u32()))
        .collect();
    schedule.sort_by_key(|&(destination, _, _)| destination);
    schedule
}

#[test]
fn test_sequential_chains_until_backlog_is_empty() {
    let report = execute(optimizing(DisseminationStrategy::Sequential, None)).unwrap();

    assert_eq!(
        client_schedule(&report),
        vec![
            (4, 3.0, 1),
            (5, 2.0, 2),
            (6, 3.0, 3),
            (7, 3.0, 2),
            (8, 4.0, 1),
            (9, 4.0, 3),
            (10, 4.0, 2),
            (11, 5.0, 1),
        ]
    );
    assert_eq!(report.log.receptions().len(), 10);
    assert_eq!(report.backlog_remaining, 0);
    assert_eq!(report.final_time.as_f64(), 5.0);
}

#[test]
fn test_channel_leaders_carry_channel_ids() {
    let report = execute(optimizing(DisseminationStrategy::Sequential, None)).unwrap();

    let leaders: Vec<_> = report
        .log
        .leader_activations()
        .iter()
        .map(|a| (a.leader, a.time.as_f64()))
        .collect();
    assert_eq!(
        leaders,
        vec![(NodeId::new(1), 0.0), (NodeId::new(2), 1.0), (NodeId::new(3), 2.0)]
    );

    let direct: Vec<_> = report
        .log
        .receptions()
        .iter()
        .filter(|r| r.source == NodeId::new(1) && r.destination.as_u32() <= 3)
        .map(|r| (r.destination, r.channel))
        .collect();
    assert_eq!(
        direct,
        vec![
            (NodeId::new(2), ChannelId::new(1)),
            (NodeId::new(3), ChannelId::new(1)),
        ]
    );
}

#[test]
fn test_concurrent_with_explicit_quotas() {
    let report = execute(optimizing(
        DisseminationStrategy::Concurrent,
        Some(vec![0, 2, 3, 3]),
    ))
    .unwrap();

    assert_eq!(
        client_schedule(&report),
        vec![
            (4, 4.0, 1),
            (5, 4.0, 1),
            (6, 4.0, 2),
            (7, 4.0, 2),
            (8, 4.0, 2),
            (9, 5.0, 3),
            (10, 5.0, 3),
            (11, 5.0, 3),
        ]
    );
    assert_eq!(report.backlog_remaining, 0);
}

#[test]
fn test_short_quotas_leave_backlog() {
    let report = execute(optimizing(
        DisseminationStrategy::Concurrent,
        Some(vec![0, 1, 1, 1]),
    ))
    .unwrap();

    assert_eq!(report.log.client_receptions().len(), 3);
    assert_eq!(report.backlog_remaining, 5);
    assert!(report.log.duplicate_deliveries().is_empty());
}

#[test]
fn test_oversized_quota_exhausts_backlog() {
    let result = execute(optimizing(
        DisseminationStrategy::Concurrent,
        Some(vec![0, 5, 5, 5]),
    ));

    match result {
        Err(SimulationError::BacklogExhausted {
            channel,
            requested,
            remaining,
        }) => {
            assert_eq!(channel, ChannelId::new(2));
            assert_eq!(requested, 5);
            assert_eq!(remaining, 3);
        }
        other => panic!("expected exhausted backlog, got {other:?}"),
    }
}

#[test]
fn test_missing_quota_is_fatal() {
    let result = execute(optimizing(
        DisseminationStrategy::Concurrent,
        Some(vec![0, 4, 4]),
    ));

    assert!(matches!(
        result,
        Err(SimulationError::MissingChannelQuota { channel }) if channel == ChannelId::new(3)
    ));
}

#[test]
fn test_large_optimizing_runs_terminate() {
    for dissemination in [DisseminationStrategy::Sequential, DisseminationStrategy::Concurrent] {
        let config = DisseminationConfig {
            client_count: 250,
            channel_count: 6,
            run_mode: RunMode::Optimizing,
            dissemination,
            ..Default::default()
        };
        let report = execute(config).unwrap();

        assert_eq!(report.log.receptions().len(), 250);
        assert_eq!(report.log.client_receptions().len(), 245);
        assert_eq!(report.log.leader_activations().len(), 6);
        assert_eq!(report.final_time.as_f64(), 45.0);
    }
}
