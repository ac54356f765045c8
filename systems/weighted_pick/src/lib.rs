#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic weighted sampling shared by reward negotiation and boss
//! pattern selection.

use sha2::{Digest, Sha256};

/// One entry in a weighted candidate pool, built fresh per selection call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WeightedCandidate<T> {
    /// Item returned when the candidate is selected.
    pub item: T,
    /// Selection weight; zero or negative excludes the candidate.
    pub weight: i32,
}

impl<T> WeightedCandidate<T> {
    /// Creates a new candidate with the provided item and weight.
    #[must_use]
    pub const fn new(item: T, weight: i32) -> Self {
        Self { item, weight }
    }
}

/// Selects up to `count` distinct items by weighted sampling without
/// replacement.
///
/// Candidates with non-positive weight are filtered out before sampling and
/// can never be selected. When the positive-weight pool holds fewer than
/// `count` entries the result is returned short rather than padded; callers
/// decide whether a partial result is acceptable. Items appear in selection
/// order.
#[must_use]
pub fn pick_unique<T: Clone>(
    candidates: &[WeightedCandidate<T>],
    count: usize,
    rng: &mut SplitMix64,
) -> Vec<T> {
    let mut pool: Vec<usize> = (0..candidates.len())
        .filter(|index| candidates[*index].weight > 0)
        .collect();

    let picks = count.min(pool.len());
    let mut result = Vec::with_capacity(picks);

    for _ in 0..picks {
        let total: i64 = pool
            .iter()
            .map(|index| i64::from(candidates[*index].weight))
            .sum();
        let draw = rng.next_below(total as u64) as i64;

        let mut acc = 0_i64;
        let mut chosen = 0_usize;
        for (position, index) in pool.iter().enumerate() {
            acc += i64::from(candidates[*index].weight);
            if draw < acc {
                chosen = position;
                break;
            }
        }

        result.push(candidates[pool[chosen]].item.clone());
        let _ = pool.remove(chosen);
    }

    result
}

/// Selects one candidate by weighted draw, leaving the pool untouched.
///
/// Repeated calls are independent draws with replacement. Returns `None`
/// when no positive-weight candidate exists.
#[must_use]
pub fn pick_one<'a, T>(
    candidates: &'a [WeightedCandidate<T>],
    rng: &mut SplitMix64,
) -> Option<&'a T> {
    let total: i64 = candidates
        .iter()
        .filter(|candidate| candidate.weight > 0)
        .map(|candidate| i64::from(candidate.weight))
        .sum();
    if total <= 0 {
        return None;
    }

    let draw = rng.next_below(total as u64) as i64;
    let mut acc = 0_i64;
    for candidate in candidates {
        if candidate.weight <= 0 {
            continue;
        }
        acc += i64::from(candidate.weight);
        if draw < acc {
            return Some(&candidate.item);
        }
    }

    None
}

/// Derives a sub-seed for a named random stream.
#[must_use]
pub fn derive_labeled_seed(base: u64, label: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(base.to_le_bytes());
    hasher.update(label.as_bytes());
    finalize_seed(hasher)
}

/// Derives a sub-seed for a named stream scoped to an index such as a round
/// number or encounter counter.
#[must_use]
pub fn derive_indexed_seed(base: u64, label: &str, index: u32) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(base.to_le_bytes());
    hasher.update(label.as_bytes());
    hasher.update(index.to_le_bytes());
    finalize_seed(hasher)
}

fn finalize_seed(hasher: Sha256) -> u64 {
    let digest = hasher.finalize();
    let bytes: [u8; 8] = digest[0..8].try_into().expect("sha256 digest slice length");
    u64::from_le_bytes(bytes)
}

/// Small deterministic generator backing every weighted draw.
#[derive(Clone, Debug)]
pub struct SplitMix64 {
    state: u64,
}

impl SplitMix64 {
    /// Creates a generator from the provided seed; zero is remapped so the
    /// stream never degenerates.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let seed = if seed == 0 { 0x9e37_79b9_7f4a_7c15 } else { seed };
        Self { state: seed }
    }

    /// Produces the next raw value in the stream.
    pub fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    /// Produces a value uniformly distributed in `[0, bound)`.
    ///
    /// A zero bound yields zero so callers never observe an invalid draw.
    pub fn next_below(&mut self, bound: u64) -> u64 {
        if bound == 0 {
            return 0;
        }
        self.next_u64() % bound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidates(weights: &[i32]) -> Vec<WeightedCandidate<usize>> {
        weights
            .iter()
            .enumerate()
            .map(|(index, weight)| WeightedCandidate::new(index, *weight))
            .collect()
    }

    #[test]
    fn picks_are_distinct_and_drawn_from_positive_weights() {
        let pool = candidates(&[10, 0, 25, -5, 40, 15]);
        let positive = [0_usize, 2, 4, 5];

        for seed in 1..50_u64 {
            let mut rng = SplitMix64::new(seed);
            let picked = pick_unique(&pool, 3, &mut rng);
            assert_eq!(picked.len(), 3);
            let mut seen = picked.clone();
            seen.sort_unstable();
            seen.dedup();
            assert_eq!(seen.len(), 3, "duplicate item for seed {seed}");
            for item in &picked {
                assert!(positive.contains(item), "non-positive item for seed {seed}");
            }
        }
    }

    #[test]
    fn short_pool_returns_partial_result() {
        let pool = candidates(&[5, 0, 7]);
        let mut rng = SplitMix64::new(11);
        let picked = pick_unique(&pool, 3, &mut rng);
        assert_eq!(picked.len(), 2);
    }

    #[test]
    fn degenerate_inputs_produce_empty_results() {
        let mut rng = SplitMix64::new(3);
        assert!(pick_unique::<usize>(&[], 3, &mut rng).is_empty());
        assert!(pick_unique(&candidates(&[4, 9]), 0, &mut rng).is_empty());
        assert!(pick_unique(&candidates(&[0, -2, 0]), 3, &mut rng).is_empty());
    }

    #[test]
    fn pick_one_ignores_non_positive_weights() {
        let pool = candidates(&[100, 0, -20]);
        let mut rng = SplitMix64::new(17);
        for _ in 0..25 {
            assert_eq!(pick_one(&pool, &mut rng), Some(&0));
        }
    }

    #[test]
    fn pick_one_is_none_without_positive_weight() {
        let pool = candidates(&[0, -1]);
        let mut rng = SplitMix64::new(23);
        assert_eq!(pick_one(&pool, &mut rng), None);
        assert_eq!(pick_one::<usize>(&[], &mut rng), None);
    }

    #[test]
    fn sampling_replays_for_identical_seeds() {
        let pool = candidates(&[3, 8, 2, 14, 6]);
        let mut first = SplitMix64::new(0x5eed);
        let mut second = SplitMix64::new(0x5eed);
        assert_eq!(
            pick_unique(&pool, 4, &mut first),
            pick_unique(&pool, 4, &mut second)
        );
    }

    #[test]
    fn derived_seeds_separate_streams() {
        let base = 0xfeed_f00d;
        assert_ne!(
            derive_labeled_seed(base, "reward"),
            derive_labeled_seed(base, "boss")
        );
        assert_ne!(
            derive_indexed_seed(base, "reward", 1),
            derive_indexed_seed(base, "reward", 2)
        );
        assert_eq!(
            derive_indexed_seed(base, "reward", 1),
            derive_indexed_seed(base, "reward", 1)
        );
    }

    #[test]
    fn next_below_handles_zero_bound() {
        let mut rng = SplitMix64::new(7);
        assert_eq!(rng.next_below(0), 0);
    }
}
