// # Rotation: spaced repetition-free scheduling
//
// This crate orders a fixed pool of items into consecutive rounds so that the
// same item never shows up twice within a minimum distance on the concatenated
// timeline. The core is `shuffle::shuffle_min_dist`, which builds one round
// from the previous one; `schedule` is the caller side that chains rounds and
// lightly perturbs the result.

/// A trait for conveniently updating a value to its minimum or maximum.
pub trait SetMinMax {
    /// If `v` is less than `self`, updates `self` to `v` and returns `true`.
    /// Otherwise, returns `false`.
    fn setmin(&mut self, v: Self) -> bool;
    /// If `v` is greater than `self`, updates `self` to `v` and returns `true`.
    /// Otherwise, returns `false`.
    fn setmax(&mut self, v: Self) -> bool;
}
impl<T> SetMinMax for T
where
    T: PartialOrd,
{
    fn setmin(&mut self, v: T) -> bool {
        *self > v && {
            *self = v;
            true
        }
    }
    fn setmax(&mut self, v: T) -> bool {
        *self < v && {
            *self = v;
            true
        }
    }
}

/// Occupied-slot sets used while a round is being built.
pub mod position_set;

/// Uniform selection of a free slot inside a range.
pub mod free_slot;

/// The minimum-distance shuffle.
pub mod shuffle;

/// Gap measurements over a concatenated timeline.
pub mod check;

/// Round chaining and post-processing on top of the shuffle.
pub mod schedule;

pub use shuffle::{ShuffleError, shuffle_min_dist, shuffle_min_dist_with};
