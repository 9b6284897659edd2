//! Cohort reducer
//!
//! Sessions are grouped into cohorts either by the directory they were found
//! in (kept in [`Session::cohort`](herdtrace_record::Session::cohort)) or by a
//! session-name prefix rule such as `Session1 -> heur`. A [`CohortTable`] is
//! the rectangular slice of a score table for one cohort.

use std::str::FromStr;

use herdtrace_record::TrialRange;
use herdtrace_stats::descriptive::DescriptiveStats;
use serde::{Deserialize, Serialize};

use crate::{
    error::AnalysisError,
    table::{ScoreKind, ScoreRow, ScoreTable},
};

/// Maps sessions whose name starts with `prefix` to `cohort`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortRule {
    pub prefix: String,
    pub cohort: String,
}

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("invalid cohort rule '{rule}': expected PREFIX=NAME")]
pub struct InvalidCohortRule {
    pub rule: String,
}

impl FromStr for CohortRule {
    type Err = InvalidCohortRule;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('=') {
            Some((prefix, cohort)) if !prefix.is_empty() && !cohort.is_empty() => Ok(Self {
                prefix: prefix.to_owned(),
                cohort: cohort.to_owned(),
            }),
            _ => Err(InvalidCohortRule { rule: s.to_owned() }),
        }
    }
}

/// Ordered prefix rules; the first matching rule wins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CohortRules {
    rules: Vec<CohortRule>,
}

impl Default for CohortRules {
    /// The three AA types of the human-AA experiment.
    fn default() -> Self {
        Self::new(
            [("Session1", "heur"), ("Session2", "hybr"), ("Session3", "self")]
                .map(|(prefix, cohort)| CohortRule {
                    prefix: prefix.to_owned(),
                    cohort: cohort.to_owned(),
                }),
        )
    }
}

impl CohortRules {
    #[must_use]
    pub fn new<I>(rules: I) -> Self
    where
        I: IntoIterator<Item = CohortRule>,
    {
        Self {
            rules: rules.into_iter().collect(),
        }
    }

    #[must_use]
    pub fn rules(&self) -> &[CohortRule] {
        &self.rules
    }

    /// Cohort of a session name, if any rule matches.
    #[must_use]
    pub fn classify(&self, session: &str) -> Option<&str> {
        self.rules
            .iter()
            .find(|rule| session.starts_with(&rule.prefix))
            .map(|rule| rule.cohort.as_str())
    }

    /// Fails when no row of `table` carries a cohort label, so a run whose
    /// sessions match none of the rules does not write empty tables.
    pub fn ensure_matched(&self, table: &ScoreTable) -> Result<(), AnalysisError> {
        if table.rows().iter().any(|row| row.cohort.is_some()) {
            return Ok(());
        }
        let cohort = self
            .rules
            .iter()
            .map(|rule| rule.cohort.as_str())
            .collect::<Vec<_>>()
            .join("/");
        Err(AnalysisError::EmptyCohort {
            cohort,
            kind: table.kind(),
        })
    }

    /// Labels rows that have no cohort yet; directory labels are kept.
    pub fn assign(&self, table: &mut ScoreTable) {
        for row in table.rows_mut() {
            if row.cohort.is_none() {
                row.cohort = self.classify(&row.session).map(str::to_owned);
            }
        }
    }
}

/// Rows of one cohort, one column per trial.
#[derive(Debug, Clone, PartialEq)]
pub struct CohortTable {
    kind: ScoreKind,
    cohort: String,
    trials: TrialRange,
    rows: Vec<ScoreRow>,
}

impl CohortTable {
    /// Selects the rows of `table` labelled `cohort`.
    pub fn from_table(table: &ScoreTable, cohort: &str) -> Result<Self, AnalysisError> {
        let rows = table
            .rows()
            .iter()
            .filter(|row| row.cohort.as_deref() == Some(cohort))
            .cloned()
            .collect::<Vec<_>>();
        if rows.is_empty() {
            return Err(AnalysisError::EmptyCohort {
                cohort: cohort.to_owned(),
                kind: table.kind(),
            });
        }
        Ok(Self {
            kind: table.kind(),
            cohort: cohort.to_owned(),
            trials: table.trials(),
            rows,
        })
    }

    /// One table per cohort label present in `table`.
    pub fn split(table: &ScoreTable) -> Result<Vec<Self>, AnalysisError> {
        table
            .cohorts()
            .into_iter()
            .map(|cohort| Self::from_table(table, cohort))
            .collect()
    }

    #[must_use]
    pub fn kind(&self) -> ScoreKind {
        self.kind
    }

    #[must_use]
    pub fn cohort(&self) -> &str {
        &self.cohort
    }

    #[must_use]
    pub fn trials(&self) -> TrialRange {
        self.trials
    }

    #[must_use]
    pub fn rows(&self) -> &[ScoreRow] {
        &self.rows
    }

    /// Trial-averaged score per row.
    #[must_use]
    pub fn row_means(&self) -> Vec<Option<f64>> {
        self.rows.iter().map(ScoreRow::mean).collect()
    }

    /// Statistics of the row means, ignoring rows without any valid cell.
    #[must_use]
    pub fn summary(&self) -> Option<DescriptiveStats> {
        DescriptiveStats::new(self.row_means().into_iter().flatten())
    }
}

#[cfg(test)]
mod tests {
    use herdtrace_record::TrialNumber;

    use super::*;

    fn score_dict() -> ScoreTable {
        let trials = TrialRange::new(TrialNumber(7), TrialNumber(8)).unwrap();
        let mut table = ScoreTable::new(ScoreKind::AlignmentSimilarity, trials);
        for (session, values) in [("Session1A", [0.2, 0.4]), ("Session2A", [0.9, 0.7])] {
            let row = table.push_row(session, None, None);
            table.set(row, TrialNumber(7), Some(values[0]));
            table.set(row, TrialNumber(8), Some(values[1]));
        }
        table
    }

    #[test]
    fn test_prefix_rule_selects_cohort_rows() {
        let mut table = score_dict();
        CohortRules::new(["Session1=heur".parse::<CohortRule>().unwrap()]).assign(&mut table);

        let heur = CohortTable::from_table(&table, "heur").unwrap();
        assert_eq!(heur.rows().len(), 1);
        assert_eq!(heur.rows()[0].session, "Session1A");
        assert_eq!(heur.rows()[0].values, vec![Some(0.2), Some(0.4)]);
        assert!((heur.row_means()[0].unwrap() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_empty_cohort_is_an_error() {
        let mut table = score_dict();
        CohortRules::default().assign(&mut table);
        let err = CohortTable::from_table(&table, "self").unwrap_err();
        assert!(
            matches!(&err, AnalysisError::EmptyCohort { cohort, .. } if cohort == "self"),
            "{err}"
        );
    }

    #[test]
    fn test_unmatched_sessions_are_an_error() {
        let rules = CohortRules::default();
        let empty = ScoreTable::new(ScoreKind::AlignmentSimilarity, TrialRange::default());
        let err = rules.ensure_matched(&empty).unwrap_err();
        assert!(
            matches!(&err, AnalysisError::EmptyCohort { cohort, .. } if cohort == "heur/hybr/self"),
            "{err}"
        );

        let mut table = score_dict();
        let other = CohortRules::new(["Run=x".parse::<CohortRule>().unwrap()]);
        other.assign(&mut table);
        assert!(other.ensure_matched(&table).unwrap_err().is_empty_cohort());

        rules.assign(&mut table);
        rules.ensure_matched(&table).unwrap();
    }

    #[test]
    fn test_directory_cohort_is_kept() {
        let trials = TrialRange::default();
        let mut table = ScoreTable::new(ScoreKind::TraceOverlap, trials);
        table.push_row("Session1A", None, Some("SelfPlay".into()));
        CohortRules::default().assign(&mut table);
        assert_eq!(table.cohorts(), ["SelfPlay"]);
    }

    #[test]
    fn test_split_and_summary() {
        let mut table = score_dict();
        CohortRules::default().assign(&mut table);
        let cohorts = CohortTable::split(&table).unwrap();
        assert_eq!(
            cohorts.iter().map(CohortTable::cohort).collect::<Vec<_>>(),
            ["heur", "hybr"]
        );
        let summary = cohorts[1].summary().unwrap();
        assert_eq!(summary.count, 1);
        assert!((summary.mean - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_parse_rule() {
        let rule = "Session3=self".parse::<CohortRule>().unwrap();
        assert_eq!(rule.prefix, "Session3");
        assert_eq!(rule.cohort, "self");
        assert!("Session3".parse::<CohortRule>().is_err());
        assert!("=self".parse::<CohortRule>().is_err());
    }
}
