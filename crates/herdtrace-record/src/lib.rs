//! Trial recordings of the multi-agent herding task
//!
//! This crate is the data-access side of the analysis: it knows how sessions
//! and trials are laid out, how column names map to herders, and how the
//! discrete engagement signal is derived from raw per-timestep flags.
//!
//! # Overview
//!
//! ```text
//! TrialSource (trait)
//! ├─ sessions(): Vec<Session>        name, pairing, human slot, cohort label
//! └─ load(session, trial) -> TrialRecord
//!     ├─ trial id / number of targets
//!     └─ per herder slot: positions, engagement labels, engagement indicators
//! ```
//!
//! [`fs::FsTrialSource`] implements the trait over directories of CSV files;
//! [`cache::TrialCache`] memoises records of one session keyed by trial.
//!
//! Column names are resolved exactly once, in [`record::TrialRecord::from_table`].
//! Everything downstream addresses herders by [`herder::PlayerSlot`].

pub use self::{
    engagement::{Engagement, MAX_TARGETS, Position, TargetFlags},
    error::RecordError,
    herder::{Herder, Pairing, PlayerSlot, Role},
    record::TrialRecord,
    source::{Session, TrialSource},
    trial::{InvalidTrialRange, TrialNumber, TrialRange},
};

pub mod cache;
pub mod engagement;
pub mod error;
pub mod fs;
pub mod herder;
pub mod record;
pub mod source;
pub mod table;
pub mod trial;
