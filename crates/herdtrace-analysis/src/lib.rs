//! Scoring and aggregation engine for herding-task recordings
//!
//! This crate quantifies how closely artificial agents, or humans paired with
//! them, behave like human-human teams.
//!
//! # Overview
//!
//! ```text
//! TrialSource ──► CrossSession ──► ScoreTable ──► CohortTable / LongTable
//!                  │                (session × player × trial)
//!                  ├─ AlignmentScorer  (DTW on engagement or position)
//!                  └─ VisitedMask      (thresholded occupancy grid)
//! ```
//!
//! - [`alignment`]: Elastic Alignment Scorer, DTW dissimilarity and similarity
//! - [`occupancy`]: Occupancy Trace Scorer, visited-cell masks and overlap
//! - [`aggregate`]: Cross-Session Aggregator, leave-one-out and human-AA
//!   protocols with recoverable skipping of missing trials
//! - [`table`]: per-trial score tables and their reductions
//! - [`cohort`]: Cohort Reducer, prefix rules and per-cohort tables
//! - [`long`]: the `pair, agent_type, <trials>` interchange table
//!
//! Scores of different kinds ([`table::ScoreKind`]) are never combined: every
//! operation that joins tables checks the kind first.

pub use self::{
    aggregate::{CrossSession, HumanAaScores},
    alignment::{AlignmentConfig, AlignmentScorer, Normalization, Signal},
    cohort::{CohortRule, CohortRules, CohortTable},
    error::{AnalysisError, CellContext},
    long::{AgentType, LongTable},
    occupancy::{OccupancyConfig, VisitedMask},
    table::{ScoreKind, ScoreRow, ScoreTable},
};

pub mod aggregate;
pub mod alignment;
pub mod cohort;
pub mod error;
pub mod long;
pub mod occupancy;
pub mod table;
