//! Leader activation for normal runs.
//!
//! A leader keeps a prefix of its clients for itself, promotes the first
//! `bf` of those to leaders of their own channel sets, hands each of them a
//! share of the remaining followers, and serves the rest of its locals on
//! its own channel.

use dissim_core::planner::{
    branching_factor, calculate_weights, divide_ranges, divide_weighted_ranges,
};
use dissim_core::{Channel, FollowerDivisionStrategy, DisseminationStrategy, NodeId, Span};
use tracing::debug;

use crate::delivery::ContentDeliveryEvent;
use crate::deterministic::{PendingEvent, SimTime, SimulationContext, SimulationError};

/// A node starting to act as leader on `channel`.
#[derive(Debug, Clone)]
pub struct LeaderActivationEvent {
    /// Activated node
    pub node: NodeId,
    /// Channel the leader transmits on
    pub channel: Channel,
    /// Clients this leader is responsible for
    pub clients: Span<NodeId>,
    /// Channels this leader may hand to the leaders it promotes
    pub additional_channels: Span<Channel>,
}

impl LeaderActivationEvent {
    /// Creates activation of `node` on `channel`.
    pub fn new(
        node: NodeId,
        channel: Channel,
        clients: Span<NodeId>,
        additional_channels: Span<Channel>,
    ) -> Self {
        Self {
            node,
            channel,
            clients,
            additional_channels,
        }
    }

    /// Promotes leaders and serves the remaining locals.
    ///
    /// With `tt` the channel's transmit time, promoted leader `i` receives at
    /// `now + (i+1)·tt`. Local service starts at `start = now + bf·tt`. Under
    /// sequential dissemination the `k`-th remaining local receives at
    /// `start + (k+1)·tt`, so the first one lands at `now + (bf+1)·tt`. Under
    /// concurrent dissemination all remaining locals receive at
    /// `start + n·tt`, where `n` counts only the locals after the `bf`
    /// promoted ones.
    pub(crate) fn process(
        &self,
        now: SimTime,
        context: &mut SimulationContext,
    ) -> Result<Vec<PendingEvent>, SimulationError> {
        context.log.record_leader_activation(now, self.node);

        let config = &context.config;
        let transmit_time = config.transmit_time(self.channel.capacity);
        let num_channels = self.additional_channels.len();

        // Leaders are promoted from the locals, so keep at least `bf` of them
        let local_len = config.local_split.local_len(
            self.clients.len(),
            num_channels,
            config.branching_factor,
            config.activation_delay,
            transmit_time,
        );
        let (locals, followers) = self.clients.split_at(local_len);
        let bf = branching_factor(config.branching_factor, num_channels, followers.len());

        debug!(
            time = %now,
            node = %self.node,
            channel = %self.channel.id,
            clients = self.clients.len(),
            additional_channels = num_channels,
            locals = locals.len(),
            followers = followers.len(),
            branching_factor = bf,
            "Leader activated"
        );

        if bf == 0 && !followers.is_empty() {
            return Err(SimulationError::FollowersWithoutBranching {
                node: self.node,
                followers: followers.len(),
            });
        }
        if locals.len() < bf {
            return Err(SimulationError::InsufficientLeaderCandidates {
                node: self.node,
                needed: bf,
                available: locals.len(),
            });
        }

        let mut next = Vec::with_capacity(2 * bf + locals.len() - bf);

        if bf > 0 {
            let channel_sets = divide_ranges(num_channels, bf)?;
            let follower_sets = match config.follower_division {
                FollowerDivisionStrategy::Naive => divide_ranges(followers.len(), bf)?,
                FollowerDivisionStrategy::CountWeighted => {
                    let sizes: Vec<usize> = channel_sets.iter().map(|set| set.len()).collect();
                    let weights = calculate_weights(&sizes)?;
                    divide_weighted_ranges(followers.len(), &weights)?
                }
                strategy @ FollowerDivisionStrategy::CapacityWeighted => {
                    return Err(SimulationError::UnsupportedDivisionStrategy { strategy });
                }
            };

            for (i, (channel_range, follower_range)) in
                channel_sets.into_iter().zip(follower_sets).enumerate()
            {
                let channel_set = self.additional_channels.slice(channel_range);
                // divide_ranges never yields an empty group
                let next_channel = channel_set.as_slice()[0];
                let next_leader = locals.as_slice()[i];

                let delivery_time = now.after((i + 1) as f64 * transmit_time);
                next.push(PendingEvent::new(
                    delivery_time,
                    ContentDeliveryEvent::direct(next_leader, self.node, self.channel.id),
                ));
                next.push(PendingEvent::new(
                    delivery_time.after(config.activation_delay),
                    LeaderActivationEvent::new(
                        next_leader,
                        next_channel,
                        followers.slice(follower_range),
                        channel_set.tail(),
                    ),
                ));
            }
        }

        let served_locally = locals.slice(bf..locals.len());
        let start = now.after(bf as f64 * transmit_time);
        match config.dissemination {
            DisseminationStrategy::Sequential => {
                for (k, &client) in served_locally.as_slice().iter().enumerate() {
                    next.push(PendingEvent::new(
                        start.after((k + 1) as f64 * transmit_time),
                        ContentDeliveryEvent::direct(client, self.node, self.channel.id),
                    ));
                }
            }
            DisseminationStrategy::Concurrent => {
                let finish = start.after(served_locally.len() as f64 * transmit_time);
                for &client in served_locally.as_slice() {
                    next.push(PendingEvent::new(
                        finish,
                        ContentDeliveryEvent::direct(client, self.node, self.channel.id),
                    ));
                }
            }
        }

        Ok(next)
    }
}
