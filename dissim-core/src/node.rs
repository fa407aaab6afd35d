//! Node and channel identifiers.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};

/// Node that holds the content at the start of every run.
pub const SOURCE: NodeId = NodeId::new(1);
/// Channel the source transmits on.
pub const SOURCE_CHANNEL: ChannelId = ChannelId::new(1);
/// Identifier of the first client; clients are numbered consecutively.
pub const FIRST_CLIENT: u32 = 2;
/// Identifier of the first channel beyond the source channel.
pub const FIRST_ADDITIONAL_CHANNEL: u32 = 2;

/// Identifier of a node taking part in the dissemination.
///
/// The source, every leader and every client are nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Creates node identifier from raw value.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns raw identifier value.
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a shared broadcast channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChannelId(u32);

impl ChannelId {
    /// Creates channel identifier from raw value.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns raw identifier value.
    pub const fn as_u32(self) -> u32 {
        self.0
    }

    /// Returns the identifier as an array index.
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ChannelId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A channel together with its capacity in content units per time unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Channel {
    pub id: ChannelId,
    pub capacity: f64,
}

impl Channel {
    /// Creates channel with given capacity.
    pub const fn new(id: ChannelId, capacity: f64) -> Self {
        Self { id, capacity }
    }
}

/// Builds `count` consecutive node identifiers starting at `first`.
///
/// # Panics
///
/// Panics if the identifiers would not fit in `u32`. Configurations that pass
/// [`crate::DisseminationConfig::validate`] never get there.
pub fn node_sequence(count: usize, first: u32) -> Vec<NodeId> {
    id_range(count, first).map(NodeId::new).collect()
}

/// Builds `count` consecutive channels starting at `first`, all with the same capacity.
///
/// # Panics
///
/// Panics if the identifiers would not fit in `u32`.
pub fn channel_sequence(count: usize, first: u32, capacity: f64) -> Vec<Channel> {
    id_range(count, first)
        .map(|id| Channel::new(ChannelId::new(id), capacity))
        .collect()
}

/// Returns true if `count` identifiers starting at `first` fit in `u32`.
pub fn fits_id_space(count: usize, first: u32) -> bool {
    u32::try_from(count).is_ok_and(|count| first.checked_add(count).is_some())
}

fn id_range(count: usize, first: u32) -> Range<u32> {
    let end = u32::try_from(count)
        .ok()
        .and_then(|count| first.checked_add(count));
    match end {
        Some(end) => first..end,
        None => panic!("{count} identifiers starting at {first} exceed the u32 id space"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_sequence() {
        let nodes = node_sequence(3, 2);
        assert_eq!(nodes, vec![NodeId::new(2), NodeId::new(3), NodeId::new(4)]);
        assert!(node_sequence(0, 7).is_empty());
    }

    #[test]
    fn test_channel_sequence_shares_capacity() {
        let channels = channel_sequence(2, 5, 1.5);
        assert_eq!(channels[0].id, ChannelId::new(5));
        assert_eq!(channels[1].id, ChannelId::new(6));
        assert!(channels.iter().all(|c| c.capacity == 1.5));
    }

    #[test]
    fn test_id_space_bounds() {
        assert!(fits_id_space(10, 2));
        assert!(fits_id_space(u32::MAX as usize - 2, 2));
        assert!(!fits_id_space(u32::MAX as usize, 2));
        assert!(!fits_id_space(usize::MAX, 0));
    }

    #[test]
    #[should_panic(expected = "exceed the u32 id space")]
    fn test_node_sequence_past_id_space_panics() {
        let _ = node_sequence(u32::MAX as usize, 2);
    }

    #[test]
    fn test_identifiers_serialize_transparently() {
        let json = serde_json::to_string(&NodeId::new(42)).unwrap();
        assert_eq!(json, "42");
        let channel: ChannelId = serde_json::from_str("3").unwrap();
        assert_eq!(channel.index(), 3);
    }
}
