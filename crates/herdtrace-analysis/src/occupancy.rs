//! Occupancy trace scorer
//!
//! A reference cohort's pooled positions are counted into a fixed grid over
//! the field. The square root of each count is compared with a threshold to
//! mark the cell visited or not, giving a [`VisitedMask`]. A test trajectory
//! scores the fraction of its samples that fall into visited cells.
//!
//! The mask is stored image-style: row 0 is the top of the field (largest
//! `z`), columns grow with `x`.

use herdtrace_record::Position;
use herdtrace_stats::histogram::{BinEdges, Histogram2d};
use serde::{Deserialize, Serialize};

/// Field geometry and threshold of the occupancy grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OccupancyConfig {
    /// The field spans `-field_half_width..=field_half_width` along `x`.
    pub field_half_width: f64,
    /// The field spans `-field_half_height..=field_half_height` along `z`.
    pub field_half_height: f64,
    /// Side of a square grid cell.
    pub bin_size: f64,
    /// A cell is visited when `sqrt(count) > threshold`.
    pub threshold: f64,
}

impl Default for OccupancyConfig {
    fn default() -> Self {
        Self {
            field_half_width: 60.0,
            field_half_height: 45.0,
            bin_size: 5.0,
            threshold: 10.0,
        }
    }
}

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::IsVariant)]
pub enum OccupancyError {
    #[display("invalid occupancy grid: {reason}")]
    InvalidConfig { reason: String },
    #[display("cannot score an empty trajectory")]
    EmptyTrajectory,
}

impl OccupancyConfig {
    /// Checks that the field is non-empty and divides into whole cells.
    pub fn validate(&self) -> Result<(), OccupancyError> {
        self.grid().map(|_| ())
    }

    fn grid(&self) -> Result<(BinEdges, BinEdges), OccupancyError> {
        let invalid = |reason: String| OccupancyError::InvalidConfig { reason };
        if !(self.bin_size.is_finite() && self.bin_size > 0.0) {
            return Err(invalid(format!("bin size {} is not positive", self.bin_size)));
        }
        if self.threshold.is_nan() {
            return Err(invalid("threshold is NaN".to_owned()));
        }
        let edges = |half: f64, axis: &str| -> Result<BinEdges, OccupancyError> {
            let bins = whole_bins(2.0 * half, self.bin_size).ok_or_else(|| {
                invalid(format!(
                    "{axis} extent {} is not a positive multiple of bin size {}",
                    2.0 * half,
                    self.bin_size
                ))
            })?;
            Ok(BinEdges::new(-half, half, bins))
        };
        Ok((
            edges(self.field_half_width, "x")?,
            edges(self.field_half_height, "z")?,
        ))
    }
}

#[expect(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn whole_bins(extent: f64, bin_size: f64) -> Option<usize> {
    let bins = (extent / bin_size).round();
    (bins >= 1.0 && (bins * bin_size - extent).abs() < 1e-9 * extent.max(1.0))
        .then_some(bins as usize)
}

/// Thresholded occupancy grid of a reference cohort.
#[derive(Debug, Clone, PartialEq)]
pub struct VisitedMask {
    x_edges: BinEdges,
    z_edges: BinEdges,
    /// Row-major, `rows = z bins`, row 0 at the top.
    visited: Vec<bool>,
}

impl VisitedMask {
    /// Builds the mask from pooled reference positions.
    pub fn new<I>(config: &OccupancyConfig, reference: I) -> Result<Self, OccupancyError>
    where
        I: IntoIterator<Item = Position>,
    {
        let (x_edges, z_edges) = config.grid()?;
        let histogram = Histogram2d::new(x_edges, z_edges, reference.into_iter().map(|p| (p.x, p.z)));

        let rows = z_edges.num_bins();
        let cols = x_edges.num_bins();
        let mut visited = vec![false; rows * cols];
        for z_bin in 0..rows {
            let row = rows - 1 - z_bin;
            for col in 0..cols {
                #[expect(clippy::cast_precision_loss)]
                let weight = (histogram.count(col, z_bin) as f64).sqrt();
                visited[row * cols + col] = weight > config.threshold;
            }
        }

        Ok(Self {
            x_edges,
            z_edges,
            visited,
        })
    }

    #[must_use]
    pub fn rows(&self) -> usize {
        self.z_edges.num_bins()
    }

    #[must_use]
    pub fn cols(&self) -> usize {
        self.x_edges.num_bins()
    }

    /// `(row, col)` of the cell containing `position`, if it is on the field.
    #[must_use]
    pub fn cell_of(&self, position: Position) -> Option<(usize, usize)> {
        let col = self.x_edges.index_of(position.x)?;
        let z_bin = self.z_edges.index_of(position.z)?;
        Some((self.rows() - 1 - z_bin, col))
    }

    #[must_use]
    pub fn is_visited(&self, row: usize, col: usize) -> bool {
        row < self.rows() && col < self.cols() && self.visited[row * self.cols() + col]
    }

    /// Number of visited cells.
    #[must_use]
    pub fn visited_count(&self) -> usize {
        self.visited.iter().filter(|&&v| v).count()
    }

    /// Fraction of `trajectory` samples inside visited cells.
    #[expect(clippy::cast_precision_loss)]
    pub fn overlap(&self, trajectory: &[Position]) -> Result<f64, OccupancyError> {
        if trajectory.is_empty() {
            return Err(OccupancyError::EmptyTrajectory);
        }
        let inside = trajectory
            .iter()
            .filter(|&&p| {
                self.cell_of(p)
                    .is_some_and(|(row, col)| self.is_visited(row, col))
            })
            .count();
        Ok(inside as f64 / trajectory.len() as f64)
    }
}
