//! Per-trial score tables
//!
//! A [`ScoreTable`] holds one row per `(session[, player])` and one cell per
//! trial of its [`TrialRange`]. An empty cell means the score could not be
//! computed (the evaluee's trial is missing, or nothing in the background was
//! readable); it is never zero.
//!
//! Session-level scalars are reductions of this table ([`ScoreRow::mean`],
//! [`ScoreTable::merge_players`]), never recomputed from the recordings.

use herdtrace_record::{PlayerSlot, TrialNumber, TrialRange};
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// What the values of a table measure.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, derive_more::Display,
)]
pub enum ScoreKind {
    /// `1 - normalized DTW cost`; higher is more similar.
    #[display("alignment similarity")]
    AlignmentSimilarity,
    /// Normalized DTW cost; lower is more similar.
    #[display("alignment error")]
    AlignmentError,
    /// Fraction of samples in visited cells.
    #[display("trace overlap")]
    TraceOverlap,
}

impl ScoreKind {
    /// Short tag used in output file names.
    #[must_use]
    pub const fn tag(self) -> &'static str {
        match self {
            ScoreKind::AlignmentSimilarity => "dtw",
            ScoreKind::AlignmentError => "dtw_error",
            ScoreKind::TraceOverlap => "trace",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRow {
    pub session: String,
    pub player: Option<PlayerSlot>,
    pub cohort: Option<String>,
    /// One cell per trial, `None` where no score exists.
    pub values: Vec<Option<f64>>,
}

impl ScoreRow {
    /// Mean over the valid cells, or `None` if there are none.
    #[must_use]
    pub fn mean(&self) -> Option<f64> {
        mean(self.values.iter().copied().flatten())
    }

    /// Number of valid cells.
    #[must_use]
    pub fn valid_count(&self) -> usize {
        self.values.iter().flatten().count()
    }
}

#[expect(clippy::cast_precision_loss)]
fn mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = f64>,
{
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0_usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreTable {
    kind: ScoreKind,
    trials: TrialRange,
    rows: Vec<ScoreRow>,
}

impl ScoreTable {
    #[must_use]
    pub fn new(kind: ScoreKind, trials: TrialRange) -> Self {
        Self {
            kind,
            trials,
            rows: vec![],
        }
    }

    #[must_use]
    pub fn kind(&self) -> ScoreKind {
        self.kind
    }

    #[must_use]
    pub fn trials(&self) -> TrialRange {
        self.trials
    }

    #[must_use]
    pub fn rows(&self) -> &[ScoreRow] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [ScoreRow] {
        &mut self.rows
    }

    /// Appends a row with every cell empty and returns its index.
    pub fn push_row(
        &mut self,
        session: impl Into<String>,
        player: Option<PlayerSlot>,
        cohort: Option<String>,
    ) -> usize {
        self.rows.push(ScoreRow {
            session: session.into(),
            player,
            cohort,
            values: vec![None; self.trials.len()],
        });
        self.rows.len() - 1
    }

    /// Sets one cell.
    ///
    /// # Panics
    ///
    /// Panics if `row` does not exist or `trial` is outside the table's range.
    pub fn set(&mut self, row: usize, trial: TrialNumber, value: Option<f64>) {
        let column = self
            .trials
            .index_of(trial)
            .unwrap_or_else(|| panic!("trial {trial} is outside {}", self.trials));
        self.rows[row].values[column] = value;
    }

    #[must_use]
    pub fn get(&self, row: usize, trial: TrialNumber) -> Option<f64> {
        let column = self.trials.index_of(trial)?;
        self.rows.get(row)?.values[column]
    }

    /// Combines the player rows of each session into one row.
    ///
    /// Each cell is the mean of the valid player cells; rows are keyed by
    /// session and cohort and keep their first-appearance order.
    #[must_use]
    pub fn merge_players(&self) -> ScoreTable {
        let mut groups: Vec<(&str, Option<&str>, Vec<&ScoreRow>)> = vec![];
        for row in &self.rows {
            let key = (row.session.as_str(), row.cohort.as_deref());
            match groups.iter().position(|(s, c, _)| (*s, *c) == key) {
                Some(idx) => groups[idx].2.push(row),
                None => groups.push((key.0, key.1, vec![row])),
            }
        }

        let mut merged = ScoreTable::new(self.kind, self.trials);
        for (session, cohort, members) in groups {
            let values = (0..self.trials.len())
                .map(|column| mean(members.iter().filter_map(|row| row.values[column])))
                .collect();
            merged.rows.push(ScoreRow {
                session: session.to_owned(),
                player: None,
                cohort: cohort.map(str::to_owned),
                values,
            });
        }
        merged
    }

    /// Distinct cohort labels in order of first appearance.
    #[must_use]
    pub fn cohorts(&self) -> Vec<&str> {
        let mut cohorts = vec![];
        for cohort in self.rows.iter().filter_map(|row| row.cohort.as_deref()) {
            if !cohorts.contains(&cohort) {
                cohorts.push(cohort);
            }
        }
        cohorts
    }

    /// Fails unless `other` has the same kind and trial range.
    pub fn ensure_compatible(&self, other: &ScoreTable) -> Result<(), AnalysisError> {
        ensure_compatible(self.kind, self.trials, other)
    }
}

pub(crate) fn ensure_compatible(
    kind: ScoreKind,
    trials: TrialRange,
    other: &ScoreTable,
) -> Result<(), AnalysisError> {
    if other.kind != kind {
        return Err(AnalysisError::ScoreKindMismatch {
            expected: kind,
            found: other.kind,
        });
    }
    if other.trials != trials {
        return Err(AnalysisError::TrialRangeMismatch {
            expected: trials,
            found: other.trials,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range(first: u32, last: u32) -> TrialRange {
        TrialRange::new(TrialNumber(first), TrialNumber(last)).unwrap()
    }

    #[test]
    fn test_set_and_mean() {
        let mut table = ScoreTable::new(ScoreKind::TraceOverlap, range(7, 9));
        let row = table.push_row("H01", Some(PlayerSlot::First), None);
        table.set(row, TrialNumber(7), Some(0.5));
        table.set(row, TrialNumber(9), Some(1.0));
        assert_eq!(table.get(row, TrialNumber(8)), None);
        assert_eq!(table.rows()[row].valid_count(), 2);
        assert_eq!(table.rows()[row].mean(), Some(0.75));
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn test_set_outside_range_panics() {
        let mut table = ScoreTable::new(ScoreKind::TraceOverlap, range(7, 9));
        let row = table.push_row("H01", None, None);
        table.set(row, TrialNumber(10), Some(0.0));
    }

    #[test]
    fn test_merge_players_averages_valid_cells() {
        let mut table = ScoreTable::new(ScoreKind::AlignmentSimilarity, range(7, 8));
        let first = table.push_row("H01", Some(PlayerSlot::First), None);
        let second = table.push_row("H01", Some(PlayerSlot::Second), None);
        let other = table.push_row("H02", Some(PlayerSlot::First), None);
        table.set(first, TrialNumber(7), Some(0.4));
        table.set(second, TrialNumber(7), Some(0.8));
        table.set(second, TrialNumber(8), Some(0.6));
        table.set(other, TrialNumber(7), Some(0.1));

        let merged = table.merge_players();
        assert_eq!(merged.rows().len(), 2);
        let h01 = &merged.rows()[0];
        assert_eq!(h01.session, "H01");
        assert_eq!(h01.player, None);
        assert!((h01.values[0].unwrap() - 0.6).abs() < 1e-12);
        assert_eq!(h01.values[1], Some(0.6));
        assert_eq!(merged.rows()[1].values, vec![Some(0.1), None]);
    }

    #[test]
    fn test_incompatible_tables() {
        let dtw = ScoreTable::new(ScoreKind::AlignmentSimilarity, range(7, 9));
        let trace = ScoreTable::new(ScoreKind::TraceOverlap, range(7, 9));
        let short = ScoreTable::new(ScoreKind::AlignmentSimilarity, range(7, 8));
        assert!(dtw.ensure_compatible(&trace).unwrap_err().is_score_kind_mismatch());
        assert!(dtw.ensure_compatible(&short).unwrap_err().is_trial_range_mismatch());
        assert!(dtw.ensure_compatible(&dtw.clone()).is_ok());
    }

    #[test]
    fn test_cohorts_in_first_appearance_order() {
        let mut table = ScoreTable::new(ScoreKind::TraceOverlap, range(7, 7));
        table.push_row("S2A", None, Some("hybr".into()));
        table.push_row("S1A", None, Some("heur".into()));
        table.push_row("S2B", None, Some("hybr".into()));
        table.push_row("X", None, None);
        assert_eq!(table.cohorts(), ["hybr", "heur"]);
    }
}
