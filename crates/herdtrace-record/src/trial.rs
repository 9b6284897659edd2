use std::{fmt, ops::RangeInclusive};

use serde::{Deserialize, Serialize};

/// Trial identifier as embedded in trial file names and the `TrialID` column.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::FromStr,
)]
#[serde(transparent)]
pub struct TrialNumber(pub u32);

#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("invalid trial range: first trial {first} is after last trial {last}")]
pub struct InvalidTrialRange {
    pub first: TrialNumber,
    pub last: TrialNumber,
}

/// Inclusive range of trials evaluated in one run.
///
/// Score tables have one column per trial in this range, in ascending order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialRange {
    first: TrialNumber,
    last: TrialNumber,
}

impl Default for TrialRange {
    /// Trials 7 through 24, the experimental block after practice trials.
    fn default() -> Self {
        Self {
            first: TrialNumber(7),
            last: TrialNumber(24),
        }
    }
}

impl fmt::Display for TrialRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", self.first, self.last)
    }
}

impl TrialRange {
    pub fn new(first: TrialNumber, last: TrialNumber) -> Result<Self, InvalidTrialRange> {
        if first > last {
            return Err(InvalidTrialRange { first, last });
        }
        Ok(Self { first, last })
    }

    #[must_use]
    pub fn first(&self) -> TrialNumber {
        self.first
    }

    #[must_use]
    pub fn last(&self) -> TrialNumber {
        self.last
    }

    #[must_use]
    pub fn len(&self) -> usize {
        (self.last.0 - self.first.0) as usize + 1
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    #[must_use]
    pub fn contains(&self, trial: TrialNumber) -> bool {
        self.as_range().contains(&trial.0)
    }

    /// Column index of `trial`, or `None` if it is outside the range.
    #[must_use]
    pub fn index_of(&self, trial: TrialNumber) -> Option<usize> {
        self.contains(trial)
            .then(|| (trial.0 - self.first.0) as usize)
    }

    pub fn iter(&self) -> impl Iterator<Item = TrialNumber> + use<> {
        self.as_range().map(TrialNumber)
    }

    fn as_range(&self) -> RangeInclusive<u32> {
        self.first.0..=self.last.0
    }
}
