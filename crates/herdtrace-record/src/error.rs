use std::{io, path::PathBuf};

use crate::trial::TrialNumber;

/// Failure to supply a trial record.
///
/// Missing and malformed files are expected gaps in the data (unsuccessful
/// trials are never written, partial files occur); a missing column or an I/O
/// failure while walking directories is a data-integrity problem.
#[derive(Debug, derive_more::Display, derive_more::Error, derive_more::IsVariant)]
pub enum RecordError {
    #[display("session '{session}' has no file for trial {trial}")]
    MissingTrialFile {
        session: String,
        trial: TrialNumber,
    },
    #[display(
        "trial {trial} of session '{session}' could not be parsed ({}): {reason}",
        path.display()
    )]
    MalformedTrialFile {
        session: String,
        trial: TrialNumber,
        path: PathBuf,
        reason: String,
    },
    #[display("trial {trial} of session '{session}' has no column '{column}'")]
    SchemaMismatch {
        session: String,
        trial: TrialNumber,
        column: String,
    },
    #[display("failed to read {}: {source}", path.display())]
    Io { path: PathBuf, source: io::Error },
}

impl RecordError {
    /// Whether the aggregation may skip this record and carry on.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            RecordError::MissingTrialFile { .. } | RecordError::MalformedTrialFile { .. }
        )
    }
}
