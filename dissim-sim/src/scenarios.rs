//! Standard run setups.
//!
//! Node 1 is the source and leads channel 1 from time zero. Clients are
//! nodes `2..=client_count + 1`; the additional channels are
//! `2..=channel_count`.

use std::sync::Arc;

use dissim_core::{
    Channel, ChannelId, ConfigError, DisseminationConfig, DisseminationStrategy,
    FIRST_ADDITIONAL_CHANNEL, FIRST_CLIENT, RunMode, SOURCE, SOURCE_CHANNEL, Span,
    channel_sequence, node_sequence,
};
use tracing::{info, warn};

use crate::backlog::{Backlog, ChannelQuotas};
use crate::deterministic::{
    CompleteCoverage, DisseminationSimulation, ExactlyOnceDelivery, SimTime, SimulationError,
};
use crate::leader::LeaderActivationEvent;
use crate::optimizer::OptimizerLeaderEvent;

/// Builds the scenario matching the configured run mode.
///
/// # Errors
///
/// - `SimulationError::Configuration` - Configuration is invalid for the run mode
pub fn scenario_for(config: DisseminationConfig) -> Result<DisseminationSimulation, SimulationError> {
    match config.run_mode {
        RunMode::Normal => normal_scenario(config),
        RunMode::Optimizing => optimizing_scenario(config),
    }
}

/// Builds a normal run: the source gets every client and every additional channel.
///
/// # Errors
///
/// - `SimulationError::Configuration` - Configuration is invalid or not in normal mode
pub fn normal_scenario(
    config: DisseminationConfig,
) -> Result<DisseminationSimulation, SimulationError> {
    require_mode(&config, RunMode::Normal)?;

    let clients = node_sequence(config.client_count, FIRST_CLIENT);
    let channels = channel_sequence(
        config.channel_count.saturating_sub(1),
        FIRST_ADDITIONAL_CHANNEL,
        config.channel_capacity,
    );
    let source_channel = Channel::new(SOURCE_CHANNEL, config.channel_capacity);

    info!(
        clients = clients.len(),
        additional_channels = channels.len(),
        "Setting up normal run"
    );

    let mut simulation = DisseminationSimulation::new(config)?;
    simulation.add_invariant(Arc::new(ExactlyOnceDelivery));
    simulation.add_invariant(Arc::new(CompleteCoverage::new(clients.clone())));
    simulation.seed_leader(
        SimTime::ZERO,
        LeaderActivationEvent::new(
            SOURCE,
            source_channel,
            Span::from(clients),
            Span::from(channels),
        ),
    )?;

    Ok(simulation)
}

/// Builds an optimizing run.
///
/// The first `channel_count - 1` clients lead the additional channels and
/// carry their ids; everyone else waits in the backlog. Concurrent runs
/// without configured quotas spread the backlog evenly over all channels.
///
/// # Errors
///
/// - `SimulationError::Configuration` - Configuration is invalid, not in
///   optimizing mode, or has fewer clients than additional channels
pub fn optimizing_scenario(
    config: DisseminationConfig,
) -> Result<DisseminationSimulation, SimulationError> {
    require_mode(&config, RunMode::Optimizing)?;

    let extra_channels = config.channel_count.saturating_sub(1);
    if config.client_count < extra_channels {
        return Err(ConfigError::InvalidParameter {
            name: "client_count",
            reason: format!(
                "optimizing runs need a leader for each of the {extra_channels} additional channels, got {} clients",
                config.client_count
            ),
        }
        .into());
    }

    let nodes = node_sequence(config.client_count, FIRST_CLIENT);
    let channels: Vec<ChannelId> =
        channel_sequence(extra_channels, FIRST_ADDITIONAL_CHANNEL, config.channel_capacity)
            .into_iter()
            .map(|channel| channel.id)
            .collect();
    let backlog_clients = nodes[extra_channels..].to_vec();

    let quotas = match config.dissemination {
        DisseminationStrategy::Sequential => None,
        DisseminationStrategy::Concurrent => Some(match &config.channel_quotas {
            Some(table) => ChannelQuotas::new(table.clone()),
            None => {
                let all_channels: Vec<ChannelId> =
                    std::iter::once(SOURCE_CHANNEL).chain(channels.iter().copied()).collect();
                ChannelQuotas::even(backlog_clients.len(), &all_channels)
            }
        }),
    };

    // Explicit quotas may leave part of the backlog unserved
    let covers_backlog = quotas
        .as_ref()
        .is_none_or(|quotas| quotas.total() == backlog_clients.len());
    if !covers_backlog {
        warn!(
            backlog = backlog_clients.len(),
            "Channel quotas do not cover the backlog exactly"
        );
    }

    info!(
        backlog = backlog_clients.len(),
        additional_channels = channels.len(),
        dissemination = %config.dissemination,
        "Setting up optimizing run"
    );

    let source_channel = Channel::new(SOURCE_CHANNEL, config.channel_capacity);
    let mut simulation = DisseminationSimulation::new(config)?;
    simulation.add_invariant(Arc::new(ExactlyOnceDelivery));
    if covers_backlog {
        simulation.add_invariant(Arc::new(CompleteCoverage::new(nodes)));
    }
    simulation.seed_optimizer(
        SimTime::ZERO,
        OptimizerLeaderEvent::new(SOURCE, source_channel, Span::from(channels)),
        Backlog::new(backlog_clients),
        quotas,
    )?;

    Ok(simulation)
}

/// Validates `config` before any id sequence is built from it.
fn require_mode(config: &DisseminationConfig, mode: RunMode) -> Result<(), SimulationError> {
    config.validate()?;
    if config.run_mode != mode {
        return Err(ConfigError::InvalidParameter {
            name: "run_mode",
            reason: format!("expected {mode}, got {}", config.run_mode),
        }
        .into());
    }
    Ok(())
}
