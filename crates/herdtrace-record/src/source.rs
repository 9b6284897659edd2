use serde::{Deserialize, Serialize};

use crate::{
    error::RecordError,
    herder::{Pairing, PlayerSlot, Role},
    record::TrialRecord,
    trial::TrialNumber,
};

/// A named session and what the analysis needs to know about its layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Session {
    pub name: String,
    pub pairing: Pairing,
    /// Player slot the human occupied in the experiment (human-AA sessions).
    ///
    /// The recording always lists the human first; this field says whether
    /// the human started from the first or the second player position.
    pub human_player: Option<PlayerSlot>,
    /// Cohort given by directory membership, if any.
    pub cohort: Option<String>,
}

impl Session {
    #[must_use]
    pub fn new(name: impl Into<String>, pairing: Pairing) -> Self {
        Self {
            name: name.into(),
            pairing,
            human_player: None,
            cohort: None,
        }
    }

    #[must_use]
    pub fn with_human_player(mut self, slot: PlayerSlot) -> Self {
        self.human_player = Some(slot);
        self
    }

    #[must_use]
    pub fn with_cohort(mut self, cohort: impl Into<String>) -> Self {
        self.cohort = Some(cohort.into());
        self
    }

    /// Experiment player slot that the herder recorded in `recorded` played.
    ///
    /// For human-AA sessions the human's slot comes from
    /// [`Self::human_player`] and the agent took the other one; for every
    /// other pairing the two coincide.
    #[must_use]
    pub fn experiment_slot(&self, recorded: PlayerSlot) -> PlayerSlot {
        match (self.pairing, self.human_player) {
            (Pairing::HumanAa, Some(human)) => {
                if self.pairing.herder(recorded).role == Role::Human {
                    human
                } else {
                    human.other()
                }
            }
            _ => recorded,
        }
    }
}

/// Supplier of typed trial records.
///
/// Implementations own the file-naming convention: callers address trials by
/// session and trial number only.
pub trait TrialSource {
    /// Sessions available from this source, in a fixed enumeration order.
    fn sessions(&self) -> &[Session];

    /// Loads one trial of one session.
    ///
    /// A session without a file for `trial` yields
    /// [`RecordError::MissingTrialFile`].
    fn load(&self, session: &Session, trial: TrialNumber) -> Result<TrialRecord, RecordError>;
}
