//! # Minimum-Distance Shuffle
//!
//! Builds the next round from the previous one. Writing the two rounds one
//! after the other, an item at position `i` of the previous round and position
//! `j` of the new round sit `n - i + j` steps apart, so the new position must
//! satisfy `j >= i + min_dist - n`. Items are placed from the tightest lower
//! bound to the loosest, each into a uniformly random free slot at or after its
//! bound. Placing the most constrained items first is what guarantees a slot is
//! always left: when an item with bound `b` is placed, every earlier placement
//! went to a slot `>= b`, so `n - b - placed >= 1` slots remain.

use crate::free_slot::pick_random_free_position;
use crate::position_set::{BitSet, PositionSet};
use rand::Rng;
use rustc_hash::FxHashMap;
use std::hash::Hash;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShuffleError {
    /// No arrangement can keep the last item of the previous round far enough
    /// away.
    #[error(
        "The minimum distance is {min_dist}, but the number of items is {n_items}, so the shuffle is impossible"
    )]
    MinDistTooLarge { min_dist: usize, n_items: usize },
    #[error("The minimum distance must be at least 1")]
    ZeroMinDist,
    #[error("Item at position {second} repeats the item at position {first}")]
    DuplicateItem { first: usize, second: usize },
}

/// Earliest legal position in the new round for every index of the previous
/// round, as `(earliest, previous_index)` pairs in placement order.
///
/// The bound `max(0, i + min_dist - n)` never decreases with `i`, so walking the
/// previous round backwards yields the bounds in descending order. Items that
/// share a bound are therefore taken in reverse order of their previous index.
pub fn earliest_allowed_locations(n_items: usize, min_dist: usize) -> Vec<(usize, usize)> {
    (0..n_items)
        .rev()
        .map(|i| ((i + min_dist).saturating_sub(n_items), i))
        .collect()
}

/// Checks `min_dist` against the round length.
pub fn validate_min_dist(n_items: usize, min_dist: usize) -> Result<(), ShuffleError> {
    if min_dist == 0 {
        return Err(ShuffleError::ZeroMinDist);
    }
    if min_dist > n_items {
        return Err(ShuffleError::MinDistTooLarge { min_dist, n_items });
    }
    Ok(())
}

/// Draws the new position of every previous index.
///
/// Returns `new_pos` with `new_pos[i]` the slot taken by the item that was at
/// index `i`. Assumes `min_dist` has been validated.
pub fn plan_positions<P, R>(n_items: usize, min_dist: usize, rng: &mut R) -> Vec<usize>
where
    P: PositionSet,
    R: Rng + ?Sized,
{
    let mut occupied = P::with_len(n_items);
    let mut new_pos = vec![usize::MAX; n_items];
    for (n_excluded, (earliest, i)) in earliest_allowed_locations(n_items, min_dist)
        .into_iter()
        .enumerate()
    {
        let pos = pick_random_free_position(earliest, n_items, &occupied, n_excluded, rng);
        occupied.insert(pos);
        new_pos[i] = pos;
        tracing::trace!(index = i, earliest, pos, "placed");
    }
    new_pos
}

/// Shuffles `previous` so that, appended to `previous`, no item comes back
/// within `min_dist` positions. Uses the bitset backend.
///
/// # Errors
/// * [`ShuffleError::MinDistTooLarge`] if `min_dist > previous.len()`.
/// * [`ShuffleError::ZeroMinDist`] if `min_dist == 0`.
/// * [`ShuffleError::DuplicateItem`] if an item occurs twice.
pub fn shuffle_min_dist<T, R>(
    previous: &[T],
    min_dist: usize,
    rng: &mut R,
) -> Result<Vec<T>, ShuffleError>
where
    T: Clone + Eq + Hash,
    R: Rng + ?Sized,
{
    shuffle_min_dist_with::<T, BitSet, R>(previous, min_dist, rng)
}

/// Same as [`shuffle_min_dist`] with an explicit occupied-slot backend. Every
/// backend yields the same output for the same random stream.
pub fn shuffle_min_dist_with<T, P, R>(
    previous: &[T],
    min_dist: usize,
    rng: &mut R,
) -> Result<Vec<T>, ShuffleError>
where
    T: Clone + Eq + Hash,
    P: PositionSet,
    R: Rng + ?Sized,
{
    let n_items = previous.len();
    validate_min_dist(n_items, min_dist)?;

    let mut seen = FxHashMap::default();
    seen.reserve(n_items);
    for (second, item) in previous.iter().enumerate() {
        if let Some(&first) = seen.get(item) {
            return Err(ShuffleError::DuplicateItem { first, second });
        }
        seen.insert(item, second);
    }

    tracing::debug!(n_items, min_dist, "constrained shuffle");
    let new_pos = plan_positions::<P, R>(n_items, min_dist, rng);
    let mut from = vec![0; n_items];
    for (i, &j) in new_pos.iter().enumerate() {
        from[j] = i;
    }
    Ok(from.into_iter().map(|i| previous[i].clone()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::check;
    use crate::position_set::FenwickSet;
    use itertools::Itertools;
    use rand::SeedableRng;
    use rand::seq::SliceRandom;
    use rand_chacha::ChaCha20Rng;

    fn concat<T: Clone>(a: &[T], b: &[T]) -> Vec<T> {
        a.iter().chain(b).cloned().collect()
    }

    #[test]
    fn earliest_bounds_for_four_items() {
        // Previous round [A, B, C, D] with min_dist 3: bounds are [0, 0, 1, 2],
        // taken as D(2), C(1), B(0), A(0).
        assert_eq!(
            earliest_allowed_locations(4, 3),
            vec![(2, 3), (1, 2), (0, 1), (0, 0)]
        );
    }

    #[test]
    fn four_item_scenario_respects_bounds() {
        let previous = ['A', 'B', 'C', 'D'];
        for seed in 0..200 {
            let mut rng = ChaCha20Rng::seed_from_u64(seed);
            let next = shuffle_min_dist(&previous, 3, &mut rng).unwrap();
            let pos = |c: char| next.iter().position(|&x| x == c).unwrap();
            assert!(pos('D') >= 2, "{:?}", next);
            assert!(pos('C') >= 1, "{:?}", next);
            assert_eq!(next.iter().sorted().collect_vec(), previous.iter().collect_vec());
        }
    }

    #[test]
    fn min_dist_equal_to_len_is_allowed() {
        // Every bound equals its own index, which leaves only the identity.
        let previous: Vec<usize> = (0..50).rev().collect();
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        let next = shuffle_min_dist(&previous, 50, &mut rng).unwrap();
        assert_eq!(next, previous);
    }

    #[test]
    fn min_dist_above_len_is_rejected() {
        let previous: Vec<usize> = (0..50).collect();
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        assert_eq!(
            shuffle_min_dist(&previous, 51, &mut rng),
            Err(ShuffleError::MinDistTooLarge {
                min_dist: 51,
                n_items: 50
            })
        );
        assert_eq!(
            shuffle_min_dist(&previous, 0, &mut rng),
            Err(ShuffleError::ZeroMinDist)
        );
        let empty: [u32; 0] = [];
        assert!(matches!(
            shuffle_min_dist(&empty, 1, &mut rng),
            Err(ShuffleError::MinDistTooLarge { .. })
        ));
    }

    #[test]
    fn duplicates_are_rejected() {
        let mut rng = ChaCha20Rng::seed_from_u64(0);
        assert_eq!(
            shuffle_min_dist(&["x", "y", "z", "y"], 2, &mut rng),
            Err(ShuffleError::DuplicateItem {
                first: 1,
                second: 3
            })
        );
    }

    #[test]
    fn output_is_permutation_with_min_distance() {
        let mut rng = ChaCha20Rng::seed_from_u64(42);
        for (n, min_dist) in [
            (1u32, 1usize),
            (2, 2),
            (10, 1),
            (10, 7),
            (100, 37),
            (333, 333),
            (500, 499),
        ] {
            let mut previous: Vec<u32> = (0..n).collect();
            previous.shuffle(&mut rng);
            let next = shuffle_min_dist(&previous, min_dist, &mut rng).unwrap();
            assert_eq!(next.len(), previous.len());
            assert_eq!(
                next.iter().sorted().collect_vec(),
                previous.iter().sorted().collect_vec()
            );
            let timeline = concat(&previous, &next);
            assert_eq!(check::first_violation(&timeline, min_dist), None);
        }
    }

    #[test]
    fn fixed_seed_is_deterministic() {
        let previous: Vec<usize> = (0..300).collect();
        let a = shuffle_min_dist(&previous, 120, &mut ChaCha20Rng::seed_from_u64(9)).unwrap();
        let b = shuffle_min_dist(&previous, 120, &mut ChaCha20Rng::seed_from_u64(9)).unwrap();
        let c = shuffle_min_dist(&previous, 120, &mut ChaCha20Rng::seed_from_u64(10)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn backends_produce_identical_rounds() {
        let previous: Vec<usize> = (0..1000).collect();
        for seed in 0..5 {
            let a = shuffle_min_dist_with::<_, BitSet, _>(
                &previous,
                250,
                &mut ChaCha20Rng::seed_from_u64(seed),
            )
            .unwrap();
            let b = shuffle_min_dist_with::<_, FenwickSet, _>(
                &previous,
                250,
                &mut ChaCha20Rng::seed_from_u64(seed),
            )
            .unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn most_constrained_item_is_uniform_over_legal_slots() {
        // n = 5, min_dist = 3: the last item may only land on 2, 3 or 4.
        let previous = [0, 1, 2, 3, 4];
        let trials = 30_000;
        let mut hits = [[0usize; 5]; 5];
        for seed in 0..trials {
            let mut rng = ChaCha20Rng::seed_from_u64(seed as u64);
            let next = shuffle_min_dist(&previous, 3, &mut rng).unwrap();
            for (j, &item) in next.iter().enumerate() {
                hits[item][j] += 1;
            }
        }
        assert_eq!(&hits[4][..2], &[0, 0]);
        assert_eq!(hits[3][0], 0);
        let expected = trials / 3;
        for j in 2..5 {
            assert!(
                hits[4][j].abs_diff(expected) < expected / 20,
                "item 4 at {}: {} vs {}",
                j,
                hits[4][j],
                expected
            );
        }
        // Unconstrained items can end up anywhere.
        for j in 0..5 {
            assert!(hits[0][j] > 0);
        }
    }

    #[test]
    fn five_chained_rounds_of_daily_pool() {
        let n = 2309;
        let min_dist = 366;
        let mut rng = ChaCha20Rng::seed_from_u64(2022);
        let mut first: Vec<usize> = (0..n).collect();
        first.shuffle(&mut rng);
        let mut rounds = vec![first];
        for _ in 1..5 {
            let next = shuffle_min_dist(rounds.last().unwrap(), min_dist, &mut rng).unwrap();
            rounds.push(next);
        }
        for (a, b) in rounds.iter().tuple_windows() {
            assert_eq!(check::first_violation(&concat(a, b), min_dist), None);
        }
        assert!(check::min_gap(&rounds.concat()).unwrap() >= min_dist);
    }

    #[test]
    fn min_dist_one_is_a_plain_shuffle() {
        let previous: Vec<usize> = (0..6).collect();
        let mut first_slot = [0usize; 6];
        let mut rng = ChaCha20Rng::seed_from_u64(5);
        for _ in 0..6000 {
            let next = shuffle_min_dist(&previous, 1, &mut rng).unwrap();
            first_slot[next[0]] += 1;
        }
        for count in first_slot {
            assert!(count.abs_diff(1000) < 150, "{:?}", first_slot);
        }
    }
}
