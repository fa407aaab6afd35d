//! Shared pool of unserved clients for optimizing runs.

use dissim_core::{ChannelId, NodeId};
use serde::{Deserialize, Serialize};

/// Ordered pool of clients not yet assigned to any channel.
///
/// Draws advance a cursor and never revisit an entry, so each client is
/// handed out at most once.
#[derive(Debug, Clone, Default)]
pub struct Backlog {
    clients: Vec<NodeId>,
    cursor: usize,
}

impl Backlog {
    /// Creates backlog holding `clients` in service order.
    pub fn new(clients: Vec<NodeId>) -> Self {
        Self { clients, cursor: 0 }
    }

    /// Returns true while undrawn clients remain.
    pub fn has_clients(&self) -> bool {
        self.cursor < self.clients.len()
    }

    /// Returns true if every client has been drawn.
    pub fn is_empty(&self) -> bool {
        !self.has_clients()
    }

    /// Number of undrawn clients.
    pub fn remaining(&self) -> usize {
        self.clients.len() - self.cursor
    }

    /// Draws the next client, if any.
    pub fn take_next(&mut self) -> Option<NodeId> {
        let client = self.clients.get(self.cursor).copied()?;
        self.cursor += 1;
        Some(client)
    }

    /// Draws exactly `count` clients.
    ///
    /// Returns `None` and leaves the backlog untouched when fewer than
    /// `count` clients remain.
    pub fn take(&mut self, count: usize) -> Option<&[NodeId]> {
        if count > self.remaining() {
            return None;
        }
        let start = self.cursor;
        self.cursor += count;
        Some(&self.clients[start..self.cursor])
    }
}

/// Number of backlog clients each channel serves in concurrent optimizing runs.
///
/// Indexed by channel id; channel 0 is unused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelQuotas(Vec<usize>);

impl ChannelQuotas {
    /// Creates quotas from a table indexed by channel id.
    pub fn new(quotas: Vec<usize>) -> Self {
        Self(quotas)
    }

    /// Spreads `total` clients evenly over `channels`.
    ///
    /// The remainder goes one each to the lowest channel ids.
    pub fn even(total: usize, channels: &[ChannelId]) -> Self {
        let mut sorted = channels.to_vec();
        sorted.sort_unstable();

        let table_len = sorted.last().map_or(0, |channel| channel.index() + 1);
        let mut quotas = vec![0; table_len];
        if sorted.is_empty() {
            return Self(quotas);
        }

        let base = total / sorted.len();
        let remainder = total % sorted.len();
        for (i, channel) in sorted.iter().enumerate() {
            quotas[channel.index()] = base + usize::from(i < remainder);
        }
        Self(quotas)
    }

    /// Quota of `channel`, if one is defined.
    pub fn get(&self, channel: ChannelId) -> Option<usize> {
        self.0.get(channel.index()).copied()
    }

    /// Sum over all channels.
    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use dissim_core::node_sequence;
    use proptest::prelude::*;

    use super::*;

    proptest! {
        #[test]
        fn prop_even_quotas_are_balanced(total in 0usize..10_000, channels in 1u32..16) {
            let ids: Vec<ChannelId> = (1..=channels).map(ChannelId::new).collect();
            let quotas = ChannelQuotas::even(total, &ids);

            prop_assert_eq!(quotas.total(), total);
            let per_channel: Vec<usize> = ids.iter().filter_map(|&id| quotas.get(id)).collect();
            prop_assert_eq!(per_channel.len(), ids.len());
            // Non-increasing by id, never more than one apart
            prop_assert!(per_channel.windows(2).all(|w| w[0] >= w[1]));
            prop_assert!(per_channel[0] - per_channel[per_channel.len() - 1] <= 1);
        }

        #[test]
        fn prop_draws_never_repeat(len in 0usize..100, counts in prop::collection::vec(0usize..10, 0..20)) {
            let mut backlog = Backlog::new(node_sequence(len, 1));
            let mut drawn = Vec::new();
            for count in counts {
                if let Some(clients) = backlog.take(count) {
                    drawn.extend_from_slice(clients);
                } else if let Some(client) = backlog.take_next() {
                    drawn.push(client);
                }
            }

            prop_assert_eq!(drawn.len() + backlog.remaining(), len);
            prop_assert_eq!(drawn.as_slice(), &node_sequence(len, 1)[..drawn.len()]);
        }
    }

    #[test]
    fn test_take_next_drains_in_order() {
        let mut backlog = Backlog::new(node_sequence(3, 10));
        assert_eq!(backlog.remaining(), 3);

        assert_eq!(backlog.take_next(), Some(NodeId::new(10)));
        assert_eq!(backlog.take_next(), Some(NodeId::new(11)));
        assert_eq!(backlog.take_next(), Some(NodeId::new(12)));
        assert_eq!(backlog.take_next(), None);
        assert!(backlog.is_empty());
        assert_eq!(backlog.remaining(), 0);
    }

    #[test]
    fn test_take_exact_count() {
        let mut backlog = Backlog::new(node_sequence(5, 1));

        let drawn = backlog.take(2).unwrap().to_vec();
        assert_eq!(drawn, node_sequence(2, 1));
        assert_eq!(backlog.remaining(), 3);
    }

    #[test]
    fn test_take_more_than_remaining_leaves_backlog_untouched() {
        let mut backlog = Backlog::new(node_sequence(2, 1));

        assert!(backlog.take(3).is_none());
        assert_eq!(backlog.remaining(), 2);
        assert_eq!(backlog.take(0).map(<[NodeId]>::len), Some(0));
    }

    #[test]
    fn test_even_quotas_give_remainder_to_lowest_ids() {
        let quotas = ChannelQuotas::even(499, &[ChannelId::new(2), ChannelId::new(1)]);
        assert_eq!(quotas.get(ChannelId::new(0)), Some(0));
        assert_eq!(quotas.get(ChannelId::new(1)), Some(250));
        assert_eq!(quotas.get(ChannelId::new(2)), Some(249));
        assert_eq!(quotas.get(ChannelId::new(3)), None);
        assert_eq!(quotas.total(), 499);
    }

    #[test]
    fn test_explicit_quotas() {
        let quotas = ChannelQuotas::new(vec![0, 250, 249]);
        assert_eq!(quotas.get(ChannelId::new(2)), Some(249));
        assert_eq!(quotas, ChannelQuotas::even(499, &[ChannelId::new(1), ChannelId::new(2)]));
    }
}
