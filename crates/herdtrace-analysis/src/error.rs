use std::fmt;

use herdtrace_record::{PlayerSlot, RecordError, TrialNumber, TrialRange};

use crate::{alignment::AlignmentError, occupancy::OccupancyError, table::ScoreKind};

/// The score cell an error occurred in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellContext {
    pub session: String,
    pub trial: TrialNumber,
    pub player: Option<PlayerSlot>,
}

impl CellContext {
    #[must_use]
    pub fn new(session: impl Into<String>, trial: TrialNumber, player: Option<PlayerSlot>) -> Self {
        Self {
            session: session.into(),
            trial,
            player,
        }
    }

    pub(crate) fn record(&self, source: RecordError) -> AnalysisError {
        AnalysisError::Record {
            cell: self.clone(),
            source,
        }
    }

    pub(crate) fn alignment(&self, source: AlignmentError) -> AnalysisError {
        AnalysisError::Alignment {
            cell: self.clone(),
            source,
        }
    }

    pub(crate) fn occupancy(&self, source: OccupancyError) -> AnalysisError {
        AnalysisError::Occupancy {
            cell: self.clone(),
            source,
        }
    }
}

impl fmt::Display for CellContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "session '{}', trial {}", self.session, self.trial)?;
        if let Some(player) = self.player {
            write!(f, ", player {player}")?;
        }
        Ok(())
    }
}

/// Field compared by the pairing consistency check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum ConsistencyField {
    #[display("TrialID")]
    TrialId,
    #[display("numTargs")]
    NumTargets,
}

#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::IsVariant)]
pub enum AnalysisError {
    #[display("{cell}: {source}")]
    Record { cell: CellContext, source: RecordError },
    #[display(
        "{cell}: session '{other_session}' disagrees on {field} ({expected} != {found})"
    )]
    ConsistencyViolation {
        cell: CellContext,
        other_session: String,
        field: ConsistencyField,
        expected: String,
        found: String,
    },
    #[display("cohort '{cohort}' has no sessions in the {kind} table")]
    EmptyCohort { cohort: String, kind: ScoreKind },
    #[display("cannot combine {found} scores with {expected} scores")]
    ScoreKindMismatch { expected: ScoreKind, found: ScoreKind },
    #[display("cannot combine scores over trials {found} with scores over trials {expected}")]
    TrialRangeMismatch {
        expected: TrialRange,
        found: TrialRange,
    },
    #[display("{cell}: {source}")]
    Alignment {
        cell: CellContext,
        source: AlignmentError,
    },
    #[display("{cell}: {source}")]
    Occupancy {
        cell: CellContext,
        source: OccupancyError,
    },
    #[display("{source}")]
    InvalidConfig { source: OccupancyError },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_cell() {
        let cell = CellContext::new("Session1A", TrialNumber(12), Some(PlayerSlot::Second));
        let err = cell.record(RecordError::SchemaMismatch {
            session: "H03".into(),
            trial: TrialNumber(12),
            column: "p1x".into(),
        });
        assert_eq!(
            err.to_string(),
            "session 'Session1A', trial 12, player 2: trial 12 of session 'H03' has no column 'p1x'"
        );

        let err = AnalysisError::ConsistencyViolation {
            cell: CellContext::new("H01", TrialNumber(7), None),
            other_session: "sim".into(),
            field: ConsistencyField::NumTargets,
            expected: "3".into(),
            found: "4".into(),
        };
        assert_eq!(
            err.to_string(),
            "session 'H01', trial 7: session 'sim' disagrees on numTargs (3 != 4)"
        );
    }
}
