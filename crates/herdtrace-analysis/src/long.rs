//! Long-format interchange table
//!
//! Stacks score tables of one kind into rows of `pair, agent_type, <trials>`,
//! the input format of the downstream hypothesis tests.

use herdtrace_record::TrialRange;
use serde::{Deserialize, Serialize};

use crate::{
    error::AnalysisError,
    table::{self, ScoreKind, ScoreTable},
};

/// Whose behavior a row of the long table scores.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::FromStr,
)]
pub enum AgentType {
    /// Human half of a human-AA session.
    Human,
    /// Artificial half of a human-AA session, or a simulation.
    Artificial,
    /// Human-human session scored against the other human-human sessions.
    Surrogate,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongRow {
    pub pair: String,
    pub agent_type: AgentType,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LongTable {
    kind: ScoreKind,
    trials: TrialRange,
    rows: Vec<LongRow>,
}

impl LongTable {
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
    pub fn rows(&self) -> &[LongRow] {
        &self.rows
    }

    /// Appends every row of `table` as `agent_type`.
    ///
    /// The pair is the session name, so the human and artificial rows of a
    /// human-AA session line up. Tables with several player rows per session
    /// should be passed through [`ScoreTable::merge_players`] first.
    pub fn extend(&mut self, agent_type: AgentType, table: &ScoreTable) -> Result<(), AnalysisError> {
        table::ensure_compatible(self.kind, self.trials, table)?;
        self.rows.extend(table.rows().iter().map(|row| LongRow {
            pair: row.session.clone(),
            agent_type,
            values: row.values.clone(),
        }));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use herdtrace_record::{PlayerSlot, TrialNumber};

    use super::*;

    #[test]
    fn test_stack_tables() {
        let trials = TrialRange::new(TrialNumber(7), TrialNumber(8)).unwrap();
        let mut human = ScoreTable::new(ScoreKind::TraceOverlap, trials);
        let row = human.push_row("Session1A", Some(PlayerSlot::Second), Some("heur".into()));
        human.set(row, TrialNumber(8), Some(0.75));
        let mut artificial = ScoreTable::new(ScoreKind::TraceOverlap, trials);
        artificial.push_row("Session1A", Some(PlayerSlot::First), Some("heur".into()));
        let mut surrogate = ScoreTable::new(ScoreKind::TraceOverlap, trials);
        surrogate.push_row("H01", Some(PlayerSlot::Second), None);

        let mut long = LongTable::new(ScoreKind::TraceOverlap, trials);
        long.extend(AgentType::Human, &human).unwrap();
        long.extend(AgentType::Artificial, &artificial).unwrap();
        long.extend(AgentType::Surrogate, &surrogate.merge_players()).unwrap();

        assert_eq!(long.rows().len(), 3);
        assert_eq!(long.rows()[0].pair, "Session1A");
        assert_eq!(long.rows()[0].values, vec![None, Some(0.75)]);
        assert_eq!(long.rows()[1].pair, "Session1A");
        assert_eq!(long.rows()[1].agent_type, AgentType::Artificial);
        assert_eq!(long.rows()[2].pair, "H01");
        assert_eq!(long.rows()[2].agent_type, AgentType::Surrogate);
    }

    #[test]
    fn test_score_kinds_are_never_mixed() {
        let trials = TrialRange::default();
        let dtw = ScoreTable::new(ScoreKind::AlignmentSimilarity, trials);
        let mut long = LongTable::new(ScoreKind::TraceOverlap, trials);
        let err = long.extend(AgentType::Artificial, &dtw).unwrap_err();
        assert!(err.is_score_kind_mismatch(), "{err}");
        assert!(long.rows().is_empty());
    }
}
