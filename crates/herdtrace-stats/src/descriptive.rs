/// Descriptive statistics summarizing a set of scores.
///
/// Scores are `f64` values; NaN entries must be filtered out by the caller
/// (invalid score cells are represented as `None` upstream, never as NaN).
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptiveStats {
    /// Number of values summarized.
    pub count: usize,
    /// The minimum value in the dataset.
    pub min: f64,
    /// The maximum value in the dataset.
    pub max: f64,
    /// The arithmetic mean of the dataset.
    pub mean: f64,
    /// The median value of the dataset (upper median for even counts).
    pub median: f64,
    /// The population variance of the dataset.
    pub variance: f64,
    /// The population standard deviation of the dataset.
    pub std_dev: f64,
    /// Standard error of the mean (`std_dev / sqrt(count)`).
    pub std_error: f64,
}

impl DescriptiveStats {
    /// Computes descriptive statistics from unsorted values.
    ///
    /// # Returns
    ///
    /// * `Some(DescriptiveStats)` - if the dataset contains at least one value
    /// * `None` - if the dataset is empty
    ///
    /// # Examples
    ///
    /// ```
    /// # use herdtrace_stats::descriptive::DescriptiveStats;
    /// let values = [0.9, 0.1, 0.5];
    /// let stats = DescriptiveStats::new(values).unwrap();
    /// assert_eq!(stats.min, 0.1);
    /// assert_eq!(stats.max, 0.9);
    /// assert_eq!(stats.median, 0.5);
    /// ```
    #[must_use]
    pub fn new<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = f64>,
    {
        let mut values = values.into_iter().collect::<Vec<_>>();
        values.sort_by(f64::total_cmp);
        Self::from_sorted(&values)
    }

    /// Computes descriptive statistics from pre-sorted values.
    ///
    /// # Panics
    ///
    /// Panics if `sorted_values` is not sorted in ascending order.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn from_sorted(sorted_values: &[f64]) -> Option<Self> {
        assert!(
            sorted_values.is_sorted_by(|a, b| a <= b),
            "values must be sorted in ascending order"
        );

        let min = *sorted_values.first()?;
        let max = *sorted_values.last()?;
        let count = sorted_values.len();
        let n = count as f64;
        let mean = sorted_values.iter().sum::<f64>() / n;
        let median = sorted_values[count / 2];
        let variance = sorted_values
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / n;
        let std_dev = variance.sqrt();

        Some(Self {
            count,
            min,
            max,
            mean,
            median,
            variance,
            std_dev,
            std_error: std_dev / n.sqrt(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values() {
        assert!(DescriptiveStats::new([]).is_none());
    }

    #[test]
    fn test_constant_values_have_no_spread() {
        let stats = DescriptiveStats::new([0.25; 4]).unwrap();
        assert_eq!(stats.count, 4);
        assert!(stats.variance.abs() < f64::EPSILON);
        assert!(stats.std_error.abs() < f64::EPSILON);
    }

    #[test]
    fn test_std_error() {
        let stats = DescriptiveStats::new([0.0, 1.0, 0.0, 1.0]).unwrap();
        assert!((stats.mean - 0.5).abs() < 1e-12);
        assert!((stats.std_dev - 0.5).abs() < 1e-12);
        assert!((stats.std_error - 0.25).abs() < 1e-12);
    }
}
