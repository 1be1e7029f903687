//! Coin selection.
//!
//! The default selector picks a subset of candidate amounts covering a
//! target with minimal change: exact single match, ascending sweep,
//! smallest single over-target candidate, and finally a bounded randomized
//! search over shuffled orderings. The session's random generator is passed
//! in explicitly, which makes selection fully deterministic for a fixed
//! seed.

use std::ops::{Add, Sub};

use rand::rngs::StdRng;
use rand::Rng;

/// Number of shuffled orderings the randomized search examines.
const RANDOM_SEARCH_ROUNDS: usize = 1000;

/// Pluggable coin-selection strategy.
///
/// Implementations receive the candidate amounts (parallel to the caller's
/// coin list) and return the chosen candidate indexes in spend order, or
/// `None` when the candidates cannot cover the target.
pub trait CoinSelector {
    /// Select candidates covering a native satoshi target.
    ///
    /// # Arguments
    /// * `rng` - The session's random generator.
    /// * `amounts` - Candidate values.
    /// * `target` - The amount to cover.
    ///
    /// # Returns
    /// Chosen candidate indexes, or `None` if the total is insufficient.
    fn select_native(&self, rng: &mut StdRng, amounts: &[i64], target: i64) -> Option<Vec<usize>>;

    /// Select candidates covering an asset quantity target.
    ///
    /// # Arguments
    /// * `rng` - The session's random generator.
    /// * `amounts` - Candidate quantities.
    /// * `target` - The quantity to cover.
    ///
    /// # Returns
    /// Chosen candidate indexes, or `None` if the total is insufficient.
    fn select_quantities(&self, rng: &mut StdRng, amounts: &[u64], target: u64)
        -> Option<Vec<usize>>;
}

/// The default randomized minimal-change selector.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultCoinSelector;

impl CoinSelector for DefaultCoinSelector {
    fn select_native(&self, rng: &mut StdRng, amounts: &[i64], target: i64) -> Option<Vec<usize>> {
        select_amounts(rng, amounts, target)
    }

    fn select_quantities(
        &self,
        rng: &mut StdRng,
        amounts: &[u64],
        target: u64,
    ) -> Option<Vec<usize>> {
        select_amounts(rng, amounts, target)
    }
}

/// Select candidate indexes covering `target`, for any money-like amount
/// (total ordering, addition, subtraction; zero is `target - target`).
///
/// Evaluation order:
/// 1. a single candidate equal to the target;
/// 2. a target at or below zero selects nothing;
/// 3. an ascending sweep accumulating candidates strictly below the target
///    while the running sum is below it, returning on an exact hit;
/// 4. the first candidate strictly above a still-uncovered target is
///    returned alone;
/// 5. otherwise a randomized search over shuffled orderings picks the
///    smallest over-target sum seen in 1000 rounds.
///
/// A completed sweep whose sum is below the target is insufficient.
pub(crate) fn select_amounts<A>(rng: &mut StdRng, amounts: &[A], target: A) -> Option<Vec<usize>>
where
    A: Copy + Ord + Add<Output = A> + Sub<Output = A>,
{
    let zero = target - target;

    if let Some(i) = (0..amounts.len()).find(|&i| amounts[i] == target) {
        return Some(vec![i]);
    }
    if target <= zero {
        return Some(Vec::new());
    }

    let mut order: Vec<usize> = (0..amounts.len()).collect();
    order.sort_by(|&a, &b| amounts[a].cmp(&amounts[b]));

    let mut result = Vec::new();
    let mut total = zero;
    for &i in &order {
        if total < target && amounts[i] < target {
            total = total + amounts[i];
            result.push(i);
            if total == target {
                return Some(result);
            }
        } else if total < target && amounts[i] > target {
            return Some(vec![i]);
        } else {
            return randomized_search(rng, amounts, target, zero);
        }
    }

    if total < target {
        None
    } else {
        Some(result)
    }
}

/// The 1000-round randomized fallback: shuffle, accumulate until the target
/// is met, track the smallest over-target witness.
fn randomized_search<A>(rng: &mut StdRng, amounts: &[A], target: A, zero: A) -> Option<Vec<usize>>
where
    A: Copy + Ord + Add<Output = A> + Sub<Output = A>,
{
    let mut best: Option<(A, Vec<usize>)> = None;
    let mut order: Vec<usize> = (0..amounts.len()).collect();

    for _ in 0..RANDOM_SEARCH_ROUNDS {
        fisher_yates_shuffle(rng, &mut order);

        let mut total = zero;
        let mut picked = Vec::new();
        for &i in &order {
            total = total + amounts[i];
            picked.push(i);
            if total >= target {
                break;
            }
        }

        if total == target {
            return Some(picked);
        }
        if total > target {
            let improves = match &best {
                Some((best_total, _)) => total < *best_total,
                None => true,
            };
            if improves {
                best = Some((total, picked));
            }
        }
    }

    best.map(|(_, witness)| witness)
}

/// In-place Fisher-Yates shuffle driven by the session generator.
///
/// # Arguments
/// * `rng` - The session's random generator.
/// * `items` - The slice to permute.
pub(crate) fn fisher_yates_shuffle<T>(rng: &mut StdRng, items: &mut [T]) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}
