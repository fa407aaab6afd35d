//! Identical configurations must produce identical logs.

use dissim_core::{
    DisseminationConfig, DisseminationStrategy, FollowerDivisionStrategy, LocalSplitStrategy,
    RunMode,
};
use dissim_sim::scenario_for;

fn render(config: &DisseminationConfig) -> String {
    let report = scenario_for(config.clone()).unwrap().execute().unwrap();
    serde_json::to_string(&report).unwrap()
}

fn configurations() -> Vec<DisseminationConfig> {
    vec![
        DisseminationConfig::default(),
        DisseminationConfig {
            client_count: 1000,
            channel_count: 7,
            activation_delay: 0.25,
            local_split: LocalSplitStrategy::SwitchDelayCorrected,
            ..Default::default()
        },
        DisseminationConfig {
            client_count: 400,
            channel_count: 5,
            follower_division: FollowerDivisionStrategy::CountWeighted,
            dissemination: DisseminationStrategy::Concurrent,
            ..Default::default()
        },
        DisseminationConfig {
            client_count: 250,
            channel_count: 6,
            branching_factor: 3,
            run_mode: RunMode::Optimizing,
            ..Default::default()
        },
        DisseminationConfig {
            client_count: 250,
            channel_count: 6,
            run_mode: RunMode::Optimizing,
            dissemination: DisseminationStrategy::Concurrent,
            ..Default::default()
        },
    ]
}

#[test]
fn test_repeated_runs_are_byte_identical() {
    for config in configurations() {
        let first = render(&config);
        let second = render(&config);
        assert_eq!(first, second, "run diverged for {config:?}");
    }
}

#[test]
fn test_every_configuration_serves_all_clients() {
    for config in configurations() {
        let report = scenario_for(config.clone()).unwrap().execute().unwrap();

        assert_eq!(report.log.receptions().len(), config.client_count);
        assert!(report.log.duplicate_deliveries().is_empty());
        assert_eq!(report.backlog_remaining, 0);
    }
}

#[test]
fn test_single_client_run() {
    let config = DisseminationConfig {
        client_count: 1,
        ..Default::default()
    };
    let report = scenario_for(config).unwrap().execute().unwrap();

    assert_eq!(report.log.receptions().len(), 1);
    assert_eq!(report.log.leader_activations().len(), 1);
    assert_eq!(report.final_time.as_f64(), 1.0);
}

#[test]
fn test_capacity_weighted_division_is_fatal() {
    let config = DisseminationConfig {
        follower_division: FollowerDivisionStrategy::CapacityWeighted,
        ..Default::default()
    };

    assert!(matches!(
        scenario_for(config).unwrap().execute(),
        Err(dissim_sim::SimulationError::UnsupportedDivisionStrategy { .. })
    ));
}
