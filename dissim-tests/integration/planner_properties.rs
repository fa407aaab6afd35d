//! Laws of the planning functions over random inputs.

use dissim_core::planner::{
    branching_factor, calculate_weights, divide, divide_weighted, select_followers_approx,
    select_followers_with_switch_delay,
};
use dissim_core::PlannerError;
use proptest::prelude::*;

proptest! {
    #[test]
    fn prop_naive_split_preserves_clients(
        len in 0usize..500,
        num_channels in 0usize..20,
        min_local in 0usize..10,
    ) {
        let clients: Vec<usize> = (0..len).collect();
        let (followers, locals) = select_followers_approx(&clients, num_channels, min_local);

        let joined: Vec<usize> = locals.iter().chain(followers).copied().collect();
        prop_assert_eq!(joined, clients.clone());

        let expected = if len <= min_local || num_channels == 0 {
            len
        } else {
            len.div_ceil(num_channels + 1).max(min_local).min(len)
        };
        prop_assert_eq!(locals.len(), expected);
    }

    #[test]
    fn prop_switch_delay_split_keeps_more_locals(
        len in 0usize..500,
        num_channels in 0usize..20,
        min_local in 0usize..10,
        delay in 0.0f64..5.0,
    ) {
        let clients: Vec<usize> = (0..len).collect();
        let (_, naive) = select_followers_approx(&clients, num_channels, min_local);
        let (followers, locals) =
            select_followers_with_switch_delay(&clients, num_channels, min_local, delay, 1.0);

        let joined: Vec<usize> = locals.iter().chain(followers).copied().collect();
        prop_assert_eq!(joined, clients.clone());
        prop_assert!(locals.len() >= naive.len());
        prop_assert!(locals.len() <= len);
    }

    #[test]
    fn prop_divide_group_sizes(len in 0usize..1000, count in 0usize..50) {
        let input: Vec<usize> = (0..len).collect();

        match divide(&input, count) {
            Ok(groups) => {
                prop_assert_eq!(groups.len(), count);
                prop_assert_eq!(groups.iter().map(|g| g.len()).sum::<usize>(), len);
                for group in &groups[..count - 1] {
                    prop_assert_eq!(group.len(), len / count);
                }
                let joined: Vec<usize> = groups.concat();
                prop_assert_eq!(joined, input.clone());
            }
            Err(PlannerError::ZeroCount) => prop_assert_eq!(count, 0),
            Err(PlannerError::InputTooShort { .. }) => prop_assert!(len < count),
            Err(other) => prop_assert!(false, "unexpected error {other:?}"),
        }
    }

    #[test]
    fn prop_weights_sum_to_one(sizes in prop::collection::vec(0usize..100, 1..12)) {
        let total: usize = sizes.iter().sum();
        prop_assume!(total > 0);

        let weights = calculate_weights(&sizes).unwrap();
        let sum: f64 = weights.iter().sum();
        prop_assert!((sum - 1.0).abs() < 1e-9);
        for (weight, &size) in weights.iter().zip(&sizes) {
            prop_assert!((weight * total as f64 - size as f64).abs() < 1e-9);
        }
    }

    #[test]
    fn prop_weighted_division_covers_input(
        sizes in prop::collection::vec(1usize..20, 1..8),
        len in 0usize..500,
    ) {
        let input: Vec<usize> = (0..len).collect();
        let weights = calculate_weights(&sizes).unwrap();
        let groups = divide_weighted(&input, &weights).unwrap();

        prop_assert_eq!(groups.len(), sizes.len());
        let joined: Vec<usize> = groups.concat();
        prop_assert_eq!(joined, input.clone());
    }

    #[test]
    fn prop_branching_factor_law(desired in 0usize..100, channels in 0usize..100, clients in 0usize..1000) {
        let bf = branching_factor(desired, channels, clients);
        prop_assert_eq!(bf, desired.min((clients / 2).min(channels)));
        prop_assert!(bf <= channels);
        prop_assert!(2 * bf <= clients);
    }
}

#[test]
fn test_weighted_division_example() {
    let weights = calculate_weights(&[2, 1]).unwrap();
    assert!((weights[0] - 2.0 / 3.0).abs() < 1e-9);
    assert!((weights[1] - 1.0 / 3.0).abs() < 1e-9);

    let clients: Vec<u32> = (0..300).collect();
    let groups = divide_weighted(&clients, &weights).unwrap();
    assert_eq!(groups[0].len(), 200);
    assert_eq!(groups[1].len(), 100);
}
