//! Numeric kernels for the herdtrace analysis.
//!
//! This crate provides the small set of numeric tools the scoring engine is
//! built on:
//!
//! - **Elastic alignment**: exact dynamic time warping cost between two
//!   sequences of equal-dimensional samples
//! - **2D histograms**: fixed-edge occupancy counts over a planar domain
//! - **Descriptive statistics**: mean, median, spread of a set of scores
//!
//! # Modules
//!
//! - [`dtw`]: Dynamic time warping with Euclidean local cost
//! - [`histogram`]: Fixed-edge 2D histogram, last bin closed on the right
//! - [`descriptive`]: Descriptive statistics for summarizing score sets
//!
//! # Examples
//!
//! ## Aligning two label sequences
//!
//! ```
//! use herdtrace_stats::dtw;
//!
//! let a = [[0.0], [0.0], [1.0], [1.0], [2.0]];
//! let b = [[0.0], [1.0], [2.0]];
//! assert_eq!(dtw::alignment_cost(&a, &b), Some(0.0));
//! ```
//!
//! ## Counting planar samples
//!
//! ```
//! use herdtrace_stats::histogram::{BinEdges, Histogram2d};
//!
//! let x_edges = BinEdges::new(-60.0, 60.0, 24);
//! let y_edges = BinEdges::new(-45.0, 45.0, 18);
//! let histogram = Histogram2d::new(x_edges, y_edges, [(0.0, 0.0), (1.0, 2.0)]);
//! assert_eq!(histogram.count(12, 9), 2);
//! ```
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use herdtrace_stats::descriptive::DescriptiveStats;
//!
//! let values = [0.5, 0.75, 1.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.mean, 0.75);
//! ```

pub mod descriptive;
pub mod dtw;
pub mod histogram;
