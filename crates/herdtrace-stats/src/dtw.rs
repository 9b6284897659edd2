//! Dynamic time warping
//!
//! Exact DTW over sequences of equal-dimensional samples, using Euclidean
//! distance as the local cost. The warping path is monotone and continuous:
//! both sequences are consumed front to back, each element is matched at least
//! once, and steps are limited to `(1, 0)`, `(0, 1)` and `(1, 1)`.
//!
//! The cumulative cost matrix is evaluated row by row with two rolling rows, so
//! memory is `O(len(b))` while time stays `O(len(a) * len(b))`.

/// Euclidean distance between two samples of the same dimension.
///
/// # Panics
///
/// Panics if the samples have different dimensions.
#[must_use]
pub fn euclidean(a: &[f64], b: &[f64]) -> f64 {
    assert_eq!(
        a.len(),
        b.len(),
        "samples must have the same dimension ({} != {})",
        a.len(),
        b.len()
    );
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).powi(2))
        .sum::<f64>()
        .sqrt()
}

/// Minimum cumulative cost of aligning `a` with `b`.
///
/// Returns `None` if either sequence is empty.
///
/// # Panics
///
/// Panics if any pair of samples has mismatched dimensions.
///
/// # Examples
///
/// ```
/// use herdtrace_stats::dtw;
///
/// let a = [[0.0], [1.0], [2.0]];
/// let b = [[2.0], [1.0], [0.0]];
/// assert_eq!(dtw::alignment_cost(&a, &b), Some(4.0));
/// assert_eq!(dtw::alignment_cost::<[f64; 1]>(&[], &b), None);
/// ```
#[must_use]
pub fn alignment_cost<S>(a: &[S], b: &[S]) -> Option<f64>
where
    S: AsRef<[f64]>,
{
    if a.is_empty() || b.is_empty() {
        return None;
    }

    // prev[j + 1] holds D(i - 1, j); index 0 is the virtual border column.
    let mut prev = vec![f64::INFINITY; b.len() + 1];
    let mut curr = vec![f64::INFINITY; b.len() + 1];
    prev[0] = 0.0;

    for x in a {
        curr[0] = f64::INFINITY;
        for (j, y) in b.iter().enumerate() {
            let local = euclidean(x.as_ref(), y.as_ref());
            let best = prev[j].min(prev[j + 1]).min(curr[j]);
            curr[j + 1] = local + best;
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    Some(prev[b.len()])
}

#[cfg(test)]
mod tests {
    use rand::{Rng as _, SeedableRng as _};
    use rand_pcg::Pcg32;

    use super::*;

    fn random_sequence(rng: &mut Pcg32, dim: usize) -> Vec<Vec<f64>> {
        let len = rng.random_range(1..40);
        (0..len)
            .map(|_| (0..dim).map(|_| rng.random_range(-1.0..4.0)).collect())
            .collect()
    }

    #[test]
    fn test_identical_sequences_cost_nothing() {
        let a = [[0.0], [0.0], [1.0], [1.0], [2.0]];
        assert_eq!(alignment_cost(&a, &a), Some(0.0));
    }

    #[test]
    fn test_repeated_samples_are_absorbed() {
        let a = [[0.0, 0.0], [0.0, 0.0], [3.0, 4.0]];
        let b = [[0.0, 0.0], [3.0, 4.0], [3.0, 4.0], [3.0, 4.0]];
        assert_eq!(alignment_cost(&a, &b), Some(0.0));
    }

    #[test]
    fn test_single_sample_matches_everything() {
        let a = [[1.0], [2.0], [4.0]];
        let b = [[1.0]];
        assert_eq!(alignment_cost(&a, &b), Some(4.0));
    }

    #[test]
    fn test_reversed_sequence() {
        let a = [[0.0], [1.0], [2.0]];
        let b = [[2.0], [1.0], [0.0]];
        assert_eq!(alignment_cost(&a, &b), Some(4.0));
    }

    #[test]
    fn test_symmetric_and_bounded() {
        let mut rng = Pcg32::seed_from_u64(0x5eed);
        for dim in 1..=3 {
            for _ in 0..50 {
                let a = random_sequence(&mut rng, dim);
                let b = random_sequence(&mut rng, dim);
                let ab = alignment_cost(&a, &b).unwrap();
                let ba = alignment_cost(&b, &a).unwrap();
                assert!((ab - ba).abs() < 1e-9, "{ab} != {ba}");
                assert!(ab >= 0.0);

                // No path is longer than len(a) + len(b) - 1 steps.
                let max_local = a
                    .iter()
                    .flat_map(|x| b.iter().map(move |y| euclidean(x, y)))
                    .fold(0.0, f64::max);
                #[expect(clippy::cast_precision_loss)]
                let bound = max_local * (a.len() + b.len() - 1) as f64;
                assert!(ab <= bound + 1e-9);
            }
        }
    }

    #[test]
    #[should_panic(expected = "same dimension")]
    fn test_dimension_mismatch_panics() {
        let a = vec![vec![0.0, 1.0]];
        let b = vec![vec![0.0]];
        let _ = alignment_cost(&a, &b);
    }
}
