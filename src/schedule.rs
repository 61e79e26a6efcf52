//! # Schedule Generation
//!
//! The caller side of the shuffle: a uniformly shuffled first round, followed
//! by rounds that each come from [`shuffle_min_dist`] applied to the one
//! before. The rounds are then concatenated, lightly swapped around and thinned
//! out so the final sequence does not look like a stack of permutations.
//!
//! The swap and drop passes may break the minimum distance for a handful of
//! entries; only the chained rounds themselves carry the guarantee.

use crate::check;
use crate::shuffle::{ShuffleError, shuffle_min_dist, validate_min_dist};
use rand::prelude::*;
use rand_chacha::ChaCha20Rng;
use serde::{Deserialize, Serialize};
use sha1::{Digest, Sha1};
use thiserror::Error;

pub const DEFAULT_SEED: &str = "I <3 Quanta";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Size of the item pool; items are `0..n_items`.
    pub n_items: usize,
    pub min_dist: usize,
    /// Number of chained permutations.
    pub rounds: usize,
    /// Each entry is swapped with a random entry with probability
    /// `swap_fraction / 2`.
    pub swap_fraction: f64,
    pub drop_probability: f64,
    pub seed: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            n_items: 2_309,
            min_dist: 366,
            rounds: 5,
            swap_fraction: 0.15,
            drop_probability: 0.05,
            seed: DEFAULT_SEED.to_string(),
        }
    }
}

#[derive(Debug, PartialEq, Error)]
pub enum ScheduleError {
    #[error("{name} must be within [0, 1], got {value}")]
    Fraction { name: &'static str, value: f64 },
    #[error(transparent)]
    Shuffle(#[from] ShuffleError),
}

impl ScheduleConfig {
    pub fn validate(&self) -> Result<(), ScheduleError> {
        for (name, value) in [
            ("swap_fraction", self.swap_fraction),
            ("drop_probability", self.drop_probability),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ScheduleError::Fraction { name, value });
            }
        }
        if self.rounds > 1 {
            validate_min_dist(self.n_items, self.min_dist)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    /// The chained permutations before post-processing.
    pub rounds: Vec<Vec<usize>>,
    /// Concatenated, swapped and thinned sequence.
    pub sequence: Vec<usize>,
}

impl Schedule {
    /// Smallest distance between repeats across the chained rounds.
    pub fn rounds_min_gap(&self) -> Option<usize> {
        check::min_gap(&self.rounds.concat())
    }
}

/// Builds a generator from a seed string by hashing it with SHA-1.
pub fn seeded_rng(seed: &str) -> ChaCha20Rng {
    let digest = Sha1::digest(seed.as_bytes());
    let mut head = [0u8; 8];
    head.copy_from_slice(&digest[..8]);
    tracing::debug!(seed, digest = %hex::encode(digest), "seeding generator");
    ChaCha20Rng::seed_from_u64(u64::from_le_bytes(head))
}

/// Returns `config.rounds` permutations of `0..config.n_items`, each built from
/// the previous one with the minimum-distance shuffle.
pub fn chain_rounds<R>(config: &ScheduleConfig, rng: &mut R) -> Result<Vec<Vec<usize>>, ShuffleError>
where
    R: Rng + ?Sized,
{
    if config.rounds == 0 {
        return Ok(vec![]);
    }
    if config.rounds > 1 {
        validate_min_dist(config.n_items, config.min_dist)?;
    }
    let mut first: Vec<usize> = (0..config.n_items).collect();
    first.shuffle(rng);
    let mut rounds = Vec::with_capacity(config.rounds);
    rounds.push(first);
    for round in 1..config.rounds {
        let next = shuffle_min_dist(&rounds[round - 1], config.min_dist, rng)?;
        tracing::debug!(round, "round built");
        rounds.push(next);
    }
    Ok(rounds)
}

/// Swaps each entry with a uniformly chosen entry with probability
/// `fraction / 2`.
pub fn partial_shuffle<T, R>(items: &mut [T], fraction: f64, rng: &mut R)
where
    R: Rng + ?Sized,
{
    let n = items.len();
    for i in 0..n {
        if rng.random::<f64>() < fraction / 2.0 {
            let j = rng.random_range(0..n);
            items.swap(i, j);
        }
    }
}

/// Keeps each entry only if a draw in `[0, 1)` exceeds `probability`.
pub fn drop_random<T, R>(items: &mut Vec<T>, probability: f64, rng: &mut R)
where
    R: Rng + ?Sized,
{
    items.retain(|_| rng.random::<f64>() > probability);
}

pub fn generate(config: &ScheduleConfig) -> Result<Schedule, ScheduleError> {
    config.validate()?;
    let mut rng = seeded_rng(&config.seed);
    let rounds = chain_rounds(config, &mut rng)?;
    let mut sequence = rounds.concat();
    partial_shuffle(&mut sequence, config.swap_fraction, &mut rng);
    let before = sequence.len();
    drop_random(&mut sequence, config.drop_probability, &mut rng);
    tracing::info!(
        rounds = rounds.len(),
        before,
        after = sequence.len(),
        "schedule generated"
    );
    Ok(Schedule { rounds, sequence })
}
