//! Leader activation for optimizing runs.
//!
//! Every channel gets a leader as early as possible, and each active
//! channel keeps serving clients from the shared backlog until it runs dry.
//! The node leading a channel carries the channel's id.

use dissim_core::planner::divide_ranges;
use dissim_core::{Channel, ChannelId, DisseminationStrategy, NodeId, Span};
use tracing::debug;

use crate::delivery::ContentDeliveryEvent;
use crate::deterministic::{PendingEvent, SimTime, SimulationContext, SimulationError};

/// A node starting to act as leader in an optimizing run.
#[derive(Debug, Clone)]
pub struct OptimizerLeaderEvent {
    /// Activated node
    pub node: NodeId,
    /// Channel the leader transmits on
    pub channel: Channel,
    /// Channels still waiting for a leader
    pub additional_channels: Span<ChannelId>,
}

impl OptimizerLeaderEvent {
    /// Creates activation of `node` on `channel`.
    pub fn new(node: NodeId, channel: Channel, additional_channels: Span<ChannelId>) -> Self {
        Self {
            node,
            channel,
            additional_channels,
        }
    }

    pub(crate) fn process(
        &self,
        now: SimTime,
        context: &mut SimulationContext,
    ) -> Result<Vec<PendingEvent>, SimulationError> {
        context.log.record_leader_activation(now, self.node);

        let config = &context.config;
        let transmit_time = config.transmit_time(self.channel.capacity);
        let bf = config.branching_factor.min(self.additional_channels.len());

        debug!(
            time = %now,
            node = %self.node,
            channel = %self.channel.id,
            additional_channels = self.additional_channels.len(),
            branching_factor = bf,
            backlog = context.backlog.remaining(),
            "Optimizer leader activated"
        );

        let mut next = Vec::new();

        if bf > 0 {
            for (i, range) in divide_ranges(self.additional_channels.len(), bf)?
                .into_iter()
                .enumerate()
            {
                let channel_set = self.additional_channels.slice(range);
                // divide_ranges never yields an empty group
                let next_channel = channel_set.as_slice()[0];
                let next_leader = NodeId::new(next_channel.as_u32());

                let delivery_time = now.after((i + 1) as f64 * transmit_time);
                next.push(PendingEvent::new(
                    delivery_time,
                    ContentDeliveryEvent::direct(next_leader, self.node, self.channel.id),
                ));
                next.push(PendingEvent::new(
                    delivery_time.after(config.activation_delay),
                    OptimizerLeaderEvent::new(
                        next_leader,
                        Channel::new(next_channel, self.channel.capacity),
                        channel_set.tail(),
                    ),
                ));
            }
        }

        let start = now.after(bf as f64 * transmit_time);
        match config.dissemination {
            DisseminationStrategy::Sequential => {
                if let Some(client) = context.backlog.take_next() {
                    next.push(PendingEvent::new(
                        start.after(transmit_time),
                        ContentDeliveryEvent::chained(
                            client,
                            self.node,
                            self.channel.id,
                            transmit_time,
                        ),
                    ));
                }
            }
            DisseminationStrategy::Concurrent => {
                let channel = self.channel.id;
                let quota = context
                    .quotas
                    .as_ref()
                    .and_then(|quotas| quotas.get(channel))
                    .ok_or(SimulationError::MissingChannelQuota { channel })?;

                let remaining = context.backlog.remaining();
                let clients =
                    context
                        .backlog
                        .take(quota)
                        .ok_or(SimulationError::BacklogExhausted {
                            channel,
                            requested: quota,
                            remaining,
                        })?;

                let finish = start.after(quota as f64 * transmit_time);
                for &client in clients {
                    next.push(PendingEvent::new(
                        finish,
                        ContentDeliveryEvent::from_backlog(client, self.node, channel),
                    ));
                }
            }
        }

        Ok(next)
    }
}
