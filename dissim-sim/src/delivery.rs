//! Content delivery: the leaf event of every dissemination.

use dissim_core::{ChannelId, NodeId};
use tracing::trace;

use crate::deterministic::{PendingEvent, Reception, SimTime, SimulationContext, SimulationError};

/// How a delivery was produced and what it does after recording.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DeliveryKind {
    /// Transfer to a leader or an assigned client
    Direct,
    /// Transfer to a backlog client, no follow-up
    Backlog,
    /// Transfer to a backlog client that starts the next transfer on the
    /// same channel when it completes
    ChainedBacklog {
        /// Time one transfer takes on the channel
        transmit_time: f64,
    },
}

/// A node finishing reception of the content.
#[derive(Debug, Clone)]
pub struct ContentDeliveryEvent {
    /// Receiving node
    pub destination: NodeId,
    /// Sending node
    pub source: NodeId,
    /// Channel the transfer uses
    pub channel: ChannelId,
    /// Recording and follow-up behavior
    pub kind: DeliveryKind,
}

impl ContentDeliveryEvent {
    /// Creates delivery to a leader or assigned client.
    pub fn direct(destination: NodeId, source: NodeId, channel: ChannelId) -> Self {
        Self {
            destination,
            source,
            channel,
            kind: DeliveryKind::Direct,
        }
    }

    /// Creates delivery to a backlog client.
    pub fn from_backlog(destination: NodeId, source: NodeId, channel: ChannelId) -> Self {
        Self {
            destination,
            source,
            channel,
            kind: DeliveryKind::Backlog,
        }
    }

    /// Creates delivery to a backlog client that keeps the channel busy
    /// while the backlog lasts.
    pub fn chained(
        destination: NodeId,
        source: NodeId,
        channel: ChannelId,
        transmit_time: f64,
    ) -> Self {
        Self {
            destination,
            source,
            channel,
            kind: DeliveryKind::ChainedBacklog { transmit_time },
        }
    }

    pub(crate) fn process(
        &self,
        now: SimTime,
        context: &mut SimulationContext,
    ) -> Result<Vec<PendingEvent>, SimulationError> {
        trace!(
            time = %now,
            destination = %self.destination,
            source = %self.source,
            channel = %self.channel,
            "Content delivered"
        );

        let reception = Reception {
            time: now,
            source: self.source,
            destination: self.destination,
            channel: self.channel,
        };

        match self.kind {
            DeliveryKind::Direct => {
                context.log.record_reception(reception);
                Ok(Vec::new())
            }
            DeliveryKind::Backlog => {
                context.log.record_client_reception(reception);
                Ok(Vec::new())
            }
            DeliveryKind::ChainedBacklog { transmit_time } => {
                context.log.record_client_reception(reception);

                let Some(next) = context.backlog.take_next() else {
                    return Ok(Vec::new());
                };
                let follow_up = Self::chained(next, self.source, self.channel, transmit_time);
                Ok(vec![PendingEvent::new(now.after(transmit_time), follow_up)])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use dissim_core::{DisseminationConfig, node_sequence};

    use super::*;
    use crate::backlog::Backlog;

    fn context_with_backlog(clients: usize) -> SimulationContext {
        let mut context = SimulationContext::new(DisseminationConfig::default());
        context.backlog = Backlog::new(node_sequence(clients, 10));
        context
    }

    #[test]
    fn test_direct_delivery_records_reception_only() {
        let mut context = context_with_backlog(2);
        let event = ContentDeliveryEvent::direct(NodeId::new(2), NodeId::new(1), ChannelId::new(1));

        let next = event.process(SimTime::new(1.0), &mut context).unwrap();
        assert!(next.is_empty());
        assert_eq!(context.log().receptions().len(), 1);
        assert!(context.log().client_receptions().is_empty());
        assert_eq!(context.backlog().remaining(), 2);
    }

    #[test]
    fn test_backlog_delivery_records_client_reception() {
        let mut context = context_with_backlog(2);
        let event =
            ContentDeliveryEvent::from_backlog(NodeId::new(10), NodeId::new(1), ChannelId::new(2));

        let next = event.process(SimTime::new(1.0), &mut context).unwrap();
        assert!(next.is_empty());
        assert_eq!(context.log().receptions().len(), 1);
        assert_eq!(context.log().client_receptions()[0].channel, ChannelId::new(2));
    }

    #[test]
    fn test_chained_delivery_draws_next_client() {
        let mut context = context_with_backlog(1);
        let event =
            ContentDeliveryEvent::chained(NodeId::new(9), NodeId::new(1), ChannelId::new(1), 0.5);

        let next = event.process(SimTime::new(2.0), &mut context).unwrap();
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].time, SimTime::new(2.5));
        assert!(context.backlog().is_empty());

        // Backlog drained: chain ends
        let crate::deterministic::EventKind::ContentDelivery(follow_up) = &next[0].kind else {
            panic!("expected a delivery");
        };
        assert_eq!(follow_up.destination, NodeId::new(10));
        assert_eq!(follow_up.source, NodeId::new(1));
        let last = follow_up.process(SimTime::new(2.5), &mut context).unwrap();
        assert!(last.is_empty());
        assert_eq!(context.log().client_receptions().len(), 2);
    }
}
