//! Elastic alignment scorer
//!
//! Scores two signals by their DTW alignment cost, normalized by a
//! length-dependent denominator:
//!
//! ```text
//! dissimilarity = cost / denominator(len(a), len(b))
//! similarity    = clamp(1 - dissimilarity, 0, 1)
//! ```
//!
//! Two denominators are in use and both are kept as explicit choices
//! ([`Normalization`]); they give different score magnitudes and must not be
//! mixed within one run.

use arrayvec::ArrayVec;
use herdtrace_record::{Engagement, MAX_TARGETS, PlayerSlot, RecordError, TrialRecord};
use herdtrace_stats::dtw;
use serde::{Deserialize, Serialize};

/// One sample of an aligned signal: 1-D label, 2-D position or k-D
/// indicator vector.
pub type Sample = ArrayVec<f64, MAX_TARGETS>;

/// Which per-herder signal is aligned.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::FromStr,
)]
pub enum Signal {
    /// Collapsed engagement label (`-1` idle, otherwise target index).
    #[default]
    Label,
    /// Per-target engagement indicators.
    Indicators,
    /// Planar position.
    Position,
}

impl Signal {
    /// Extracts this signal for the herder in `slot`.
    pub fn samples(self, record: &TrialRecord, slot: PlayerSlot) -> Result<Vec<Sample>, RecordError> {
        let samples = match self {
            Signal::Label => record
                .engagement(slot)?
                .iter()
                .map(|&e| label_sample(e))
                .collect(),
            Signal::Indicators => record
                .indicators(slot)?
                .iter()
                .map(|flags| flags.iter().map(|&f| if f { 1.0 } else { 0.0 }).collect())
                .collect(),
            Signal::Position => record
                .positions(slot)?
                .iter()
                .map(|p| [p.x, p.z].into_iter().collect())
                .collect(),
        };
        Ok(samples)
    }
}

fn label_sample(engagement: Engagement) -> Sample {
    let mut sample = Sample::new();
    sample.push(f64::from(engagement.label()));
    sample
}

/// Denominator applied to the raw alignment cost.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::FromStr,
)]
pub enum Normalization {
    /// `len(a) + len(b)`
    #[default]
    Sum,
    /// `len(a) * len(b)`
    Product,
}

impl Normalization {
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn denominator(self, len_a: usize, len_b: usize) -> f64 {
        match self {
            Normalization::Sum => (len_a + len_b) as f64,
            Normalization::Product => len_a as f64 * len_b as f64,
        }
    }
}

/// Signal and normalization used by one alignment run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    pub signal: Signal,
    pub normalization: Normalization,
    /// Report `1 - dissimilarity` as is, which can be negative when the
    /// alignment cost exceeds the denominator.
    pub unclamped: bool,
}

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::IsVariant)]
pub enum AlignmentError {
    #[display("cannot align an empty sequence")]
    EmptySequence,
    #[display("samples have different dimensions ({left} != {right})")]
    DimensionMismatch { left: usize, right: usize },
    #[display("sample {index} of the {side} sequence is not finite")]
    NonFiniteSample { side: &'static str, index: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignmentScorer {
    normalization: Normalization,
    clamp: bool,
}

impl Default for AlignmentScorer {
    fn default() -> Self {
        Self::new(Normalization::default())
    }
}

impl AlignmentScorer {
    /// Scorer whose similarity is clamped to `[0, 1]`.
    #[must_use]
    pub fn new(normalization: Normalization) -> Self {
        Self {
            normalization,
            clamp: true,
        }
    }

    #[must_use]
    pub fn from_config(config: &AlignmentConfig) -> Self {
        Self {
            normalization: config.normalization,
            clamp: !config.unclamped,
        }
    }

    #[must_use]
    pub fn normalization(&self) -> Normalization {
        self.normalization
    }

    /// Normalized alignment cost; `0.0` for identical sequences.
    pub fn dissimilarity<S>(&self, a: &[S], b: &[S]) -> Result<f64, AlignmentError>
    where
        S: AsRef<[f64]>,
    {
        let dim = a.first().ok_or(AlignmentError::EmptySequence)?.as_ref().len();
        if let Some(sample) = a.iter().chain(b).find(|s| s.as_ref().len() != dim) {
            return Err(AlignmentError::DimensionMismatch {
                left: dim,
                right: sample.as_ref().len(),
            });
        }
        for (side, samples) in [("left", a), ("right", b)] {
            if let Some(index) = samples
                .iter()
                .position(|s| !s.as_ref().iter().all(|v| v.is_finite()))
            {
                return Err(AlignmentError::NonFiniteSample { side, index });
            }
        }
        let cost = dtw::alignment_cost(a, b).ok_or(AlignmentError::EmptySequence)?;
        Ok(cost / self.normalization.denominator(a.len(), b.len()))
    }

    /// `1 - dissimilarity`, clamped to `[0, 1]` unless the scorer was
    /// configured as unclamped.
    pub fn similarity<S>(&self, a: &[S], b: &[S]) -> Result<f64, AlignmentError>
    where
        S: AsRef<[f64]>,
    {
        let similarity = 1.0 - self.dissimilarity(a, b)?;
        Ok(if self.clamp {
            similarity.clamp(0.0, 1.0)
        } else {
            similarity
        })
    }
}

#[cfg(test)]
mod tests {
    use rand::{Rng as _, SeedableRng as _};
    use rand_pcg::Pcg32;

    use super::*;

    fn labels(values: &[f64]) -> Vec<[f64; 1]> {
        values.iter().map(|&v| [v]).collect()
    }

    #[test]
    fn test_identical_sequences() {
        let scorer = AlignmentScorer::default();
        let a = labels(&[0.0, 0.0, 1.0, 1.0, 2.0]);
        assert_eq!(scorer.dissimilarity(&a, &a).unwrap(), 0.0);
        assert_eq!(scorer.similarity(&a, &a).unwrap(), 1.0);
    }

    #[test]
    fn test_reversed_sequence_scores_lower() {
        let a = labels(&[0.0, 1.0, 2.0]);
        let b = labels(&[2.0, 1.0, 0.0]);

        let sum = AlignmentScorer::new(Normalization::Sum);
        assert!((sum.dissimilarity(&a, &b).unwrap() - 4.0 / 6.0).abs() < 1e-12);
        assert!(sum.similarity(&a, &b).unwrap() < 1.0);

        let product = AlignmentScorer::new(Normalization::Product);
        assert!((product.dissimilarity(&a, &b).unwrap() - 4.0 / 9.0).abs() < 1e-12);
    }

    #[test]
    fn test_similarity_is_bounded() {
        let mut rng = Pcg32::seed_from_u64(7);
        let scorer = AlignmentScorer::new(Normalization::Sum);
        for _ in 0..50 {
            let len_a = rng.random_range(1..20);
            let len_b = rng.random_range(1..20);
            let a = (0..len_a)
                .map(|_| [f64::from(rng.random_range(-1_i32..5))])
                .collect::<Vec<_>>();
            let b = (0..len_b)
                .map(|_| [f64::from(rng.random_range(-1_i32..5))])
                .collect::<Vec<_>>();
            let score = scorer.similarity(&a, &b).unwrap();
            assert!((0.0..=1.0).contains(&score), "{score}");
        }
    }

    #[test]
    fn test_empty_sequence_is_an_error() {
        let scorer = AlignmentScorer::default();
        let a = labels(&[0.0]);
        assert!(scorer.dissimilarity(&[] as &[[f64; 1]], &a).unwrap_err().is_empty_sequence());
        assert!(scorer.dissimilarity(&a, &[]).unwrap_err().is_empty_sequence());
    }

    #[test]
    fn test_dimension_mismatch() {
        let scorer = AlignmentScorer::default();
        let a = vec![vec![0.0], vec![1.0]];
        let b = vec![vec![0.0, 1.0]];
        let err = scorer.dissimilarity(&a, &b).unwrap_err();
        assert!(
            matches!(err, AlignmentError::DimensionMismatch { left: 1, right: 2 }),
            "{err}"
        );
    }

    #[test]
    fn test_non_finite_sample_is_an_error() {
        let scorer = AlignmentScorer::default();
        let a = vec![[0.0, 0.0], [1.0, f64::NAN]];
        let b = vec![[0.0, 0.0], [1.0, 1.0]];
        let err = scorer.similarity(&a, &b).unwrap_err();
        assert!(
            matches!(err, AlignmentError::NonFiniteSample { side: "left", index: 1 }),
            "{err}"
        );
        let err = scorer.dissimilarity(&b, &a).unwrap_err();
        assert!(
            matches!(err, AlignmentError::NonFiniteSample { side: "right", index: 1 }),
            "{err}"
        );
    }

    #[test]
    fn test_unclamped_similarity_can_be_negative() {
        // Cost 10 over a sum of lengths of 2.
        let a = labels(&[-1.0]);
        let b = labels(&[9.0]);
        let clamped = AlignmentScorer::new(Normalization::Sum);
        assert_eq!(clamped.similarity(&a, &b).unwrap(), 0.0);

        let config = AlignmentConfig {
            unclamped: true,
            ..AlignmentConfig::default()
        };
        let unclamped = AlignmentScorer::from_config(&config);
        assert!((unclamped.similarity(&a, &b).unwrap() + 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_parse_options() {
        assert_eq!("Position".parse::<Signal>().unwrap(), Signal::Position);
        assert_eq!("Product".parse::<Normalization>().unwrap(), Normalization::Product);
        assert!("median".parse::<Normalization>().is_err());
    }
}
