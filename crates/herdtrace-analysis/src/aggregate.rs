//! Cross-session aggregator
//!
//! Scores evaluee signals against a background of human-human sessions.
//!
//! # Protocols
//!
//! | protocol | evaluee | background | reduction |
//! |---|---|---|---|
//! | [`surrogate_alignment`](CrossSession::surrogate_alignment) | each human-human session | all other human-human sessions | mean similarity |
//! | [`human_aa_alignment`](CrossSession::human_aa_alignment) | both halves of each human-AA session | all human-human sessions | mean similarity |
//! | [`surrogate_occupancy`](CrossSession::surrogate_occupancy) | each human-human session | all other sessions, positions pooled | overlap with pooled mask |
//! | [`human_aa_occupancy`](CrossSession::human_aa_occupancy) | both halves of each human-AA session | all human-human sessions, pooled | overlap with pooled mask |
//! | [`simulation_alignment_error`](CrossSession::simulation_alignment_error) | each human-human session | one simulation | DTW dissimilarity |
//! | [`simulation_occupancy`](CrossSession::simulation_occupancy) | a simulation, per human session | all other human sessions, pooled | overlap with pooled mask |
//!
//! Background records are compared slot against slot: a herder is only
//! scored against background herders that started from the same position.
//!
//! # Missing data
//!
//! A background session without a readable file for the trial is skipped and
//! not counted, so a mean over `N` background sessions with `M` missing is
//! divided by `N - M`. A missing evaluee file leaves its cells empty. Every
//! other record error aborts the run with the cell it occurred in.

use herdtrace_record::{
    Pairing, PlayerSlot, Position, Role, Session, TrialNumber, TrialRange, TrialRecord,
    TrialSource, cache::TrialCache,
};
use tracing::{debug, info, warn};

use crate::{
    alignment::{AlignmentConfig, AlignmentScorer, Signal},
    error::{AnalysisError, CellContext, ConsistencyField},
    occupancy::{OccupancyConfig, VisitedMask},
    table::{ScoreKind, ScoreTable},
};

/// Running mean over the background sessions that contributed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BackgroundAccumulator {
    sum: f64,
    count: usize,
    skipped: usize,
}

impl BackgroundAccumulator {
    pub fn add(&mut self, score: f64) {
        self.sum += score;
        self.count += 1;
    }

    /// Records a background session that had nothing to contribute.
    pub fn skip(&mut self) {
        self.skipped += 1;
    }

    /// Number of contributions, i.e. the denominator of [`Self::mean`].
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }

    #[must_use]
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    #[expect(clippy::cast_precision_loss)]
    #[must_use]
    pub fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Scores of the two halves of human-AA sessions, one row per session each.
#[derive(Debug, Clone, PartialEq)]
pub struct HumanAaScores {
    pub human: ScoreTable,
    pub artificial: ScoreTable,
}

impl HumanAaScores {
    fn new(kind: ScoreKind, trials: TrialRange, sessions: &[&Session]) -> Self {
        let mut scores = Self {
            human: ScoreTable::new(kind, trials),
            artificial: ScoreTable::new(kind, trials),
        };
        for session in sessions {
            for (role, table) in [
                (Role::Human, &mut scores.human),
                (Role::ArtificialAgent, &mut scores.artificial),
            ] {
                let player = session
                    .pairing
                    .slot_of(role)
                    .map(|slot| session.experiment_slot(slot));
                table.push_row(&session.name, player, session.cohort.clone());
            }
        }
        scores
    }

    fn set(&mut self, row: usize, role: Role, trial: TrialNumber, value: Option<f64>) {
        let table = match role {
            Role::Human => &mut self.human,
            Role::ArtificialAgent => &mut self.artificial,
        };
        table.set(row, trial, value);
    }
}

/// Fails if two records disagree on which trial they hold.
///
/// A `TrialID` missing from either file, or an unknown number of targets, is
/// not checked.
pub fn check_consistency(
    cell: &CellContext,
    evaluee: &TrialRecord,
    other: &TrialRecord,
) -> Result<(), AnalysisError> {
    let violation = |field, expected: String, found: String| AnalysisError::ConsistencyViolation {
        cell: cell.clone(),
        other_session: other.session().to_owned(),
        field,
        expected,
        found,
    };
    if let (Some(expected), Some(found)) = (evaluee.trial_id(), other.trial_id()) {
        if expected != found {
            return Err(violation(
                ConsistencyField::TrialId,
                expected.to_string(),
                found.to_string(),
            ));
        }
    }
    let (expected, found) = (evaluee.num_targets(), other.num_targets());
    if expected != 0 && found != 0 && expected != found {
        return Err(violation(
            ConsistencyField::NumTargets,
            expected.to_string(),
            found.to_string(),
        ));
    }
    Ok(())
}

/// Leave-one-out and human-AA evaluation against a human-human background.
///
/// Background trials are read once per run and shared by every protocol
/// invoked on the same value.
#[derive(Debug)]
pub struct CrossSession<'a, B>
where
    B: TrialSource + ?Sized,
{
    trials: TrialRange,
    background: TrialCache<'a, B>,
}

type EvalueeCell<'s> = (usize, &'s Session, PlayerSlot);

impl<'a, B> CrossSession<'a, B>
where
    B: TrialSource + ?Sized,
{
    #[must_use]
    pub fn new(background: &'a B, trials: TrialRange) -> Self {
        Self {
            trials,
            background: TrialCache::new(background),
        }
    }

    #[must_use]
    pub fn trials(&self) -> TrialRange {
        self.trials
    }

    /// Each human-human session against all the others, by alignment.
    pub fn surrogate_alignment(
        &mut self,
        config: AlignmentConfig,
    ) -> Result<ScoreTable, AnalysisError> {
        let scorer = AlignmentScorer::from_config(&config);
        let sessions = self.background.sessions();
        let mut table = ScoreTable::new(ScoreKind::AlignmentSimilarity, self.trials);
        let cells = push_player_rows(&mut table, sessions, None);

        for trial in self.trials.iter() {
            info!(%trial, sessions = sessions.len(), "scoring surrogate alignment");
            self.fetch_background(trial)?;
            for &(row, session, slot) in &cells {
                let cell = CellContext::new(&session.name, trial, Some(slot));
                let Some(evaluee) = self.background.get(session, trial) else {
                    debug!(%cell, "evaluee trial unavailable");
                    continue;
                };
                let scores = self.align_against_background(
                    &scorer,
                    config.signal,
                    &cell,
                    (evaluee, slot),
                    slot,
                    Some(session),
                )?;
                table.set(row, trial, scores.mean());
            }
        }
        Ok(table)
    }

    /// Both halves of each human-AA session against the background, by
    /// alignment.
    pub fn human_aa_alignment<E>(
        &mut self,
        source: &E,
        config: AlignmentConfig,
    ) -> Result<HumanAaScores, AnalysisError>
    where
        E: TrialSource + ?Sized,
    {
        let scorer = AlignmentScorer::from_config(&config);
        let sessions = human_aa_sessions(source.sessions());
        let mut scores = HumanAaScores::new(ScoreKind::AlignmentSimilarity, self.trials, &sessions);

        for trial in self.trials.iter() {
            info!(%trial, sessions = sessions.len(), "scoring human-AA alignment");
            self.fetch_background(trial)?;
            for (row, session) in sessions.iter().enumerate() {
                let Some(record) = load_evaluee(source, session, trial)? else {
                    continue;
                };
                for recorded in PlayerSlot::ALL {
                    let slot = session.experiment_slot(recorded);
                    let cell = CellContext::new(&session.name, trial, Some(slot));
                    let acc = self.align_against_background(
                        &scorer,
                        config.signal,
                        &cell,
                        (&record, recorded),
                        slot,
                        None,
                    )?;
                    let role = session.pairing.herder(recorded).role;
                    scores.set(row, role, trial, acc.mean());
                }
            }
        }
        Ok(scores)
    }

    /// Each human-human session against the pooled positions of all the
    /// others.
    pub fn surrogate_occupancy(
        &mut self,
        config: &OccupancyConfig,
    ) -> Result<ScoreTable, AnalysisError> {
        config
            .validate()
            .map_err(|source| AnalysisError::InvalidConfig { source })?;
        let sessions = self.background.sessions();
        let mut table = ScoreTable::new(ScoreKind::TraceOverlap, self.trials);
        let cells = push_player_rows(&mut table, sessions, None);

        for trial in self.trials.iter() {
            info!(%trial, sessions = sessions.len(), "scoring surrogate occupancy");
            self.fetch_background(trial)?;
            for &(row, session, slot) in &cells {
                let cell = CellContext::new(&session.name, trial, Some(slot));
                let Some(evaluee) = self.background.get(session, trial) else {
                    debug!(%cell, "evaluee trial unavailable");
                    continue;
                };
                let trajectory = evaluee.positions(slot).map_err(|e| cell.record(e))?;
                let overlap =
                    self.trace_against_background(config, &cell, evaluee, trajectory, slot, Some(session))?;
                table.set(row, trial, overlap);
            }
        }
        Ok(table)
    }

    /// Both halves of each human-AA session against the pooled positions of
    /// the background.
    pub fn human_aa_occupancy<E>(
        &mut self,
        source: &E,
        config: &OccupancyConfig,
    ) -> Result<HumanAaScores, AnalysisError>
    where
        E: TrialSource + ?Sized,
    {
        config
            .validate()
            .map_err(|source| AnalysisError::InvalidConfig { source })?;
        let sessions = human_aa_sessions(source.sessions());
        let mut scores = HumanAaScores::new(ScoreKind::TraceOverlap, self.trials, &sessions);

        for trial in self.trials.iter() {
            info!(%trial, sessions = sessions.len(), "scoring human-AA occupancy");
            self.fetch_background(trial)?;
            for (row, session) in sessions.iter().enumerate() {
                let Some(record) = load_evaluee(source, session, trial)? else {
                    continue;
                };
                for recorded in PlayerSlot::ALL {
                    let slot = session.experiment_slot(recorded);
                    let cell = CellContext::new(&session.name, trial, Some(slot));
                    let trajectory = record.positions(recorded).map_err(|e| cell.record(e))?;
                    let overlap =
                        self.trace_against_background(config, &cell, &record, trajectory, slot, None)?;
                    let role = session.pairing.herder(recorded).role;
                    scores.set(row, role, trial, overlap);
                }
            }
        }
        Ok(scores)
    }

    /// Alignment error between each human-human session and each simulation,
    /// slot against slot.
    ///
    /// Rows are `(human session, player)`, labelled with the simulation's
    /// cohort (or its name).
    pub fn simulation_alignment_error<E>(
        &mut self,
        simulation: &E,
        config: AlignmentConfig,
    ) -> Result<ScoreTable, AnalysisError>
    where
        E: TrialSource + ?Sized,
    {
        let scorer = AlignmentScorer::from_config(&config);
        let humans = self.background.sessions();
        let mut table = ScoreTable::new(ScoreKind::AlignmentError, self.trials);

        for sim_session in simulation.sessions() {
            info!(simulation = %sim_session.name, "scoring alignment error against simulation");
            let cells = push_player_rows(&mut table, humans, Some(simulation_cohort(sim_session)));
            let mut sim_cache = TrialCache::new(simulation);

            for trial in self.trials.iter() {
                self.fetch_background(trial)?;
                let Some(sim) = fetch_simulation(&mut sim_cache, sim_session, trial)? else {
                    continue;
                };
                for &(row, session, slot) in &cells {
                    let cell = CellContext::new(&session.name, trial, Some(slot));
                    let Some(human) = self.background.get(session, trial) else {
                        debug!(%cell, "human trial unavailable");
                        continue;
                    };
                    check_consistency(&cell, human, sim)?;
                    let a = config.signal.samples(human, slot).map_err(|e| cell.record(e))?;
                    let b = config.signal.samples(sim, slot).map_err(|e| cell.record(e))?;
                    let error = scorer.dissimilarity(&a, &b).map_err(|e| cell.alignment(e))?;
                    debug!(%cell, simulation = %sim_session.name, error, "aligned with simulation");
                    table.set(row, trial, Some(error));
                }
            }
        }
        Ok(table)
    }

    /// Occupancy of each simulation against the leave-one-out background of
    /// every human-human session, slot against slot.
    ///
    /// Row `(session, player)` holds the simulation's overlap with the mask
    /// built from all human sessions except `session`.
    pub fn simulation_occupancy<E>(
        &mut self,
        simulation: &E,
        config: &OccupancyConfig,
    ) -> Result<ScoreTable, AnalysisError>
    where
        E: TrialSource + ?Sized,
    {
        config
            .validate()
            .map_err(|source| AnalysisError::InvalidConfig { source })?;
        let humans = self.background.sessions();
        let mut table = ScoreTable::new(ScoreKind::TraceOverlap, self.trials);

        for sim_session in simulation.sessions() {
            info!(simulation = %sim_session.name, "scoring simulation occupancy");
            let cells = push_player_rows(&mut table, humans, Some(simulation_cohort(sim_session)));
            let mut sim_cache = TrialCache::new(simulation);

            for trial in self.trials.iter() {
                self.fetch_background(trial)?;
                let Some(sim) = fetch_simulation(&mut sim_cache, sim_session, trial)? else {
                    continue;
                };
                for &(row, session, slot) in &cells {
                    let cell = CellContext::new(&session.name, trial, Some(slot));
                    let trajectory = sim.positions(slot).map_err(|e| cell.record(e))?;
                    let overlap =
                        self.trace_against_background(config, &cell, sim, trajectory, slot, Some(session))?;
                    table.set(row, trial, overlap);
                }
            }
        }
        Ok(table)
    }

    fn fetch_background(&mut self, trial: TrialNumber) -> Result<(), AnalysisError> {
        for session in self.background.sessions() {
            self.background
                .fetch(session, trial)
                .map_err(|e| CellContext::new(&session.name, trial, None).record(e))?;
        }
        Ok(())
    }

    /// Mean similarity of one evaluee signal to the same-slot signal of every
    /// background session except `exclude`.
    fn align_against_background(
        &self,
        scorer: &AlignmentScorer,
        signal: Signal,
        cell: &CellContext,
        (evaluee, evaluee_slot): (&TrialRecord, PlayerSlot),
        background_slot: PlayerSlot,
        exclude: Option<&Session>,
    ) -> Result<BackgroundAccumulator, AnalysisError> {
        let evaluee_samples = signal
            .samples(evaluee, evaluee_slot)
            .map_err(|e| cell.record(e))?;

        let mut acc = BackgroundAccumulator::default();
        for other in self.background.sessions() {
            if exclude.is_some_and(|s| s.name == other.name) {
                continue;
            }
            let Some(record) = self.background.get(other, cell.trial) else {
                acc.skip();
                continue;
            };
            check_consistency(cell, evaluee, record)?;
            let samples = signal
                .samples(record, background_slot)
                .map_err(|e| cell.record(e))?;
            let score = scorer
                .similarity(&evaluee_samples, &samples)
                .map_err(|e| cell.alignment(e))?;
            acc.add(score);
        }

        debug!(%cell, used = acc.count(), skipped = acc.skipped(), "aligned against background");
        if acc.count() == 0 {
            warn!(%cell, "no background trial available; leaving cell empty");
        }
        Ok(acc)
    }

    /// Overlap of `trajectory` with the mask pooled from the `slot` positions
    /// of every background session except `exclude`.
    fn trace_against_background(
        &self,
        config: &OccupancyConfig,
        cell: &CellContext,
        reference: &TrialRecord,
        trajectory: &[Position],
        slot: PlayerSlot,
        exclude: Option<&Session>,
    ) -> Result<Option<f64>, AnalysisError> {
        let mut pool = vec![];
        let mut used = 0;
        let mut skipped = 0;
        for other in self.background.sessions() {
            if exclude.is_some_and(|s| s.name == other.name) {
                continue;
            }
            let Some(record) = self.background.get(other, cell.trial) else {
                skipped += 1;
                continue;
            };
            check_consistency(cell, reference, record)?;
            pool.extend_from_slice(record.positions(slot).map_err(|e| cell.record(e))?);
            used += 1;
        }

        debug!(%cell, used, skipped, samples = pool.len(), "pooled background positions");
        if used == 0 {
            warn!(%cell, "no background trial available; leaving cell empty");
            return Ok(None);
        }
        let mask = VisitedMask::new(config, pool).map_err(|e| cell.occupancy(e))?;
        let overlap = mask.overlap(trajectory).map_err(|e| cell.occupancy(e))?;
        Ok(Some(overlap))
    }
}

fn push_player_rows<'s>(
    table: &mut ScoreTable,
    sessions: &'s [Session],
    cohort: Option<&str>,
) -> Vec<EvalueeCell<'s>> {
    let mut cells = vec![];
    for session in sessions {
        for slot in PlayerSlot::ALL {
            let cohort = cohort.map(str::to_owned).or_else(|| session.cohort.clone());
            let row = table.push_row(&session.name, Some(slot), cohort);
            cells.push((row, session, slot));
        }
    }
    cells
}

fn human_aa_sessions(sessions: &[Session]) -> Vec<&Session> {
    sessions
        .iter()
        .filter(|session| {
            let keep = session.pairing == Pairing::HumanAa;
            if !keep {
                warn!(session = %session.name, pairing = ?session.pairing, "not a human-AA session; ignoring");
            }
            keep
        })
        .collect()
}

fn simulation_cohort(session: &Session) -> &str {
    session.cohort.as_deref().unwrap_or(&session.name)
}

/// Loads an evaluee record; `None` when its file is missing or unreadable.
fn load_evaluee<E>(
    source: &E,
    session: &Session,
    trial: TrialNumber,
) -> Result<Option<TrialRecord>, AnalysisError>
where
    E: TrialSource + ?Sized,
{
    match source.load(session, trial) {
        Ok(record) => Ok(Some(record)),
        Err(e) if e.is_recoverable() => {
            warn!(session = %session.name, %trial, "leaving evaluee cells empty: {e}");
            Ok(None)
        }
        Err(e) => Err(CellContext::new(&session.name, trial, None).record(e)),
    }
}

fn fetch_simulation<'c, E>(
    cache: &'c mut TrialCache<'_, E>,
    session: &Session,
    trial: TrialNumber,
) -> Result<Option<&'c TrialRecord>, AnalysisError>
where
    E: TrialSource + ?Sized,
{
    cache
        .fetch(session, trial)
        .map_err(|e| CellContext::new(&session.name, trial, None).record(e))?;
    Ok(cache.get(session, trial))
}
