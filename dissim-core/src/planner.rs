//! Dissemination planning: how a leader partitions clients and channels.
//!
//! All functions are pure. Range-level variants (`*_ranges`, `*_local_len`)
//! compute index ranges so callers holding a [`crate::Span`] can split without
//! copying; the slice-level variants are thin wrappers over them.

use std::ops::Range;

use crate::strategy::LocalSplitStrategy;

/// Precondition violations of planning functions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlannerError {
    #[error("Cannot divide into zero groups")]
    ZeroCount,

    #[error("Cannot divide {len} elements into {count} groups")]
    InputTooShort { len: usize, count: usize },

    #[error("Weights assign {assigned} elements but only {len} are available")]
    WeightsExceedInput { assigned: usize, len: usize },

    #[error("Cannot weight groups with a total size of zero")]
    EmptyGroups,
}

/// Returns time to transfer `content_size` over a channel of `capacity`.
pub fn transmit_time(content_size: f64, capacity: f64) -> f64 {
    content_size / capacity
}

/// Number of locally served clients under the naive split.
///
/// All clients stay local when there are no more than `min_local` of them or
/// no additional channels to delegate to.
pub fn approx_local_len(num_clients: usize, num_channels: usize, min_local: usize) -> usize {
    if num_clients <= min_local || num_channels == 0 {
        return num_clients;
    }

    let split = (num_clients as f64 / (num_channels as f64 + 1.0)).ceil() as usize;
    split.max(min_local).min(num_clients)
}

/// Number of locally served clients when compensating for leader switch delay.
///
/// Each of the `num_channels` delegated leaders starts `switch_delay` late, so
/// the local share grows by `num_channels * switch_delay / transmit_time`
/// transfers before the even split is taken.
pub fn switch_delay_local_len(
    num_clients: usize,
    num_channels: usize,
    min_local: usize,
    switch_delay: f64,
    transmit_time: f64,
) -> usize {
    if num_clients <= min_local || num_channels == 0 {
        return num_clients;
    }

    let compensated = num_clients as f64 + num_channels as f64 * switch_delay / transmit_time;
    let local = (compensated / (num_channels as f64 + 1.0)).ceil() as usize;
    local.max(min_local).min(num_clients)
}

/// Splits clients into `(followers, locals)` using the naive even split.
///
/// Locals are the prefix, followers the suffix; `locals ++ followers == clients`.
pub fn select_followers_approx<T>(
    clients: &[T],
    num_channels: usize,
    min_local: usize,
) -> (&[T], &[T]) {
    let local = approx_local_len(clients.len(), num_channels, min_local);
    let (locals, followers) = clients.split_at(local);
    (followers, locals)
}

/// Splits clients into `(followers, locals)`, growing the local share to
/// cover the activation delay of delegated leaders.
pub fn select_followers_with_switch_delay<T>(
    clients: &[T],
    num_channels: usize,
    min_local: usize,
    switch_delay: f64,
    transmit_time: f64,
) -> (&[T], &[T]) {
    let local = switch_delay_local_len(
        clients.len(),
        num_channels,
        min_local,
        switch_delay,
        transmit_time,
    );
    let (locals, followers) = clients.split_at(local);
    (followers, locals)
}

impl LocalSplitStrategy {
    /// Number of locally served clients under this strategy.
    pub fn local_len(
        self,
        num_clients: usize,
        num_channels: usize,
        min_local: usize,
        switch_delay: f64,
        transmit_time: f64,
    ) -> usize {
        match self {
            LocalSplitStrategy::Naive => approx_local_len(num_clients, num_channels, min_local),
            LocalSplitStrategy::SwitchDelayCorrected => switch_delay_local_len(
                num_clients,
                num_channels,
                min_local,
                switch_delay,
                transmit_time,
            ),
        }
    }
}

/// Number of leaders one activation spawns.
///
/// Never exceeds the available channels, and never more than half the
/// follower pool.
pub fn branching_factor(desired: usize, num_channels: usize, num_clients: usize) -> usize {
    desired.min((num_clients / 2).min(num_channels))
}

/// Index ranges of `count` contiguous groups over `len` elements.
///
/// Every group but the last has `len / count` elements; the last absorbs the
/// remainder.
///
/// # Errors
///
/// - `PlannerError::ZeroCount` - `count` is zero
/// - `PlannerError::InputTooShort` - fewer than `count` elements
pub fn divide_ranges(len: usize, count: usize) -> Result<Vec<Range<usize>>, PlannerError> {
    if count == 0 {
        return Err(PlannerError::ZeroCount);
    }
    if len < count {
        return Err(PlannerError::InputTooShort { len, count });
    }

    let group_len = len / count;
    Ok((0..count)
        .map(|i| {
            let start = i * group_len;
            let end = if i == count - 1 { len } else { start + group_len };
            start..end
        })
        .collect())
}

/// Divides `input` into `count` contiguous groups.
///
/// # Errors
///
/// - `PlannerError::ZeroCount` - `count` is zero
/// - `PlannerError::InputTooShort` - fewer than `count` elements
pub fn divide<T>(input: &[T], count: usize) -> Result<Vec<&[T]>, PlannerError> {
    Ok(divide_ranges(input.len(), count)?
        .into_iter()
        .map(|range| &input[range])
        .collect())
}

/// Index ranges of groups sized by `weights` over `len` elements.
///
/// Group `i` before the last gets `floor(weights[i] * len)` elements; the
/// last group takes whatever remains regardless of its own weight, so all
/// rounding loss lands on it.
///
/// # Errors
///
/// - `PlannerError::WeightsExceedInput` - leading weights claim more than `len` elements
pub fn divide_weighted_ranges(
    len: usize,
    weights: &[f64],
) -> Result<Vec<Range<usize>>, PlannerError> {
    let mut ranges = Vec::with_capacity(weights.len());
    let mut position = 0;

    for (i, weight) in weights.iter().enumerate() {
        let size = if i == weights.len() - 1 {
            len.checked_sub(position)
                .ok_or(PlannerError::WeightsExceedInput {
                    assigned: position,
                    len,
                })?
        } else {
            (weight * len as f64).floor() as usize
        };

        let end = position + size;
        if end > len {
            return Err(PlannerError::WeightsExceedInput { assigned: end, len });
        }
        ranges.push(position..end);
        position = end;
    }

    Ok(ranges)
}

/// Divides `input` into groups sized by `weights`.
///
/// # Errors
///
/// - `PlannerError::WeightsExceedInput` - leading weights claim more than `input.len()` elements
pub fn divide_weighted<'a, T>(
    input: &'a [T],
    weights: &[f64],
) -> Result<Vec<&'a [T]>, PlannerError> {
    Ok(divide_weighted_ranges(input.len(), weights)?
        .into_iter()
        .map(|range| &input[range])
        .collect())
}

/// Relative weight of each group: its size over the total size.
///
/// # Errors
///
/// - `PlannerError::EmptyGroups` - all groups are empty
pub fn calculate_weights(group_sizes: &[usize]) -> Result<Vec<f64>, PlannerError> {
    let total: usize = group_sizes.iter().sum();
    if total == 0 {
        return Err(PlannerError::EmptyGroups);
    }

    Ok(group_sizes
        .iter()
        .map(|&size| size as f64 / total as f64)
        .collect())
}
