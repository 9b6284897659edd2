/// Evenly spaced bin edges over a closed interval.
///
/// Every bin is half-open `[start, end)` except the last, which also
/// includes `max`. Values outside `[min, max]` (and NaN) belong to no bin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinEdges {
    min: f64,
    max: f64,
    num_bins: usize,
}

impl BinEdges {
    /// Creates `num_bins` equal-width bins spanning `min..=max`.
    ///
    /// # Panics
    ///
    /// Panics if `num_bins` is zero or `min` is not strictly less than `max`.
    #[must_use]
    pub fn new(min: f64, max: f64, num_bins: usize) -> Self {
        assert!(num_bins > 0, "number of bins must be positive");
        assert!(min < max, "bin range must be non-empty ({min} >= {max})");
        Self { min, max, num_bins }
    }

    /// Lower bound of the first bin.
    #[must_use]
    pub fn min(&self) -> f64 {
        self.min
    }

    /// Upper bound of the last bin.
    #[must_use]
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Number of bins.
    #[must_use]
    pub fn num_bins(&self) -> usize {
        self.num_bins
    }

    /// Width of a single bin.
    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn width(&self) -> f64 {
        (self.max - self.min) / self.num_bins as f64
    }

    /// Index of the bin containing `value`, or `None` when it is out of range.
    ///
    /// # Examples
    ///
    /// ```
    /// # use herdtrace_stats::histogram::BinEdges;
    /// let edges = BinEdges::new(-60.0, 60.0, 24);
    /// assert_eq!(edges.index_of(-60.0), Some(0));
    /// assert_eq!(edges.index_of(0.0), Some(12));
    /// assert_eq!(edges.index_of(60.0), Some(23));
    /// assert_eq!(edges.index_of(60.5), None);
    /// ```
    #[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn index_of(&self, value: f64) -> Option<usize> {
        if !(self.min..=self.max).contains(&value) {
            return None;
        }
        let position = ((value - self.min) / self.width()).floor() as usize;
        // `max` itself and values rounding up past the last edge stay in the last bin
        Some(position.min(self.num_bins - 1))
    }
}

/// Sample counts over a rectangular grid of bins.
///
/// Counts are indexed as `(x_bin, y_bin)`, with both indices growing with
/// their coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram2d {
    x_edges: BinEdges,
    y_edges: BinEdges,
    /// Row-major by x bin: `counts[x * y_bins + y]`.
    counts: Vec<u64>,
    total: u64,
}

impl Histogram2d {
    /// Counts `(x, y)` samples into the grid spanned by the given edges.
    ///
    /// Samples outside either range are dropped; [`Self::total`] counts only
    /// samples that landed in a bin.
    #[must_use]
    pub fn new<I>(x_edges: BinEdges, y_edges: BinEdges, samples: I) -> Self
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut histogram = Self {
            x_edges,
            y_edges,
            counts: vec![0; x_edges.num_bins() * y_edges.num_bins()],
            total: 0,
        };
        for (x, y) in samples {
            histogram.add(x, y);
        }
        histogram
    }

    fn add(&mut self, x: f64, y: f64) {
        if let (Some(xi), Some(yi)) = (self.x_edges.index_of(x), self.y_edges.index_of(y)) {
            self.counts[xi * self.y_edges.num_bins() + yi] += 1;
            self.total += 1;
        }
    }

    /// Bin edges along x.
    #[must_use]
    pub fn x_edges(&self) -> &BinEdges {
        &self.x_edges
    }

    /// Bin edges along y.
    #[must_use]
    pub fn y_edges(&self) -> &BinEdges {
        &self.y_edges
    }

    /// Number of samples in bin `(x_bin, y_bin)`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of range.
    #[must_use]
    pub fn count(&self, x_bin: usize, y_bin: usize) -> u64 {
        assert!(x_bin < self.x_edges.num_bins() && y_bin < self.y_edges.num_bins());
        self.counts[x_bin * self.y_edges.num_bins() + y_bin]
    }

    /// Number of samples that landed inside the grid.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.total
    }
}
