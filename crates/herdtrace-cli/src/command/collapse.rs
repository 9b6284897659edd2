use std::path::{Path, PathBuf};

use anyhow::Context;
use herdtrace_record::{
    Pairing, PlayerSlot, Session, TrialRange, TrialRecord, TrialSource,
    fs::{FsTrialSource, HUMAN_PLAYER_DIRS},
};
use tracing::{debug, info, warn};

use crate::util::{self, Output};

use super::common::TrialRangeArg;

/// Who played the sessions of a collapse input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display, derive_more::FromStr)]
pub(crate) enum SessionKind {
    /// Human-human sessions, one subdirectory each
    Human,
    /// Human-AA sessions below HumanPlayer0/ and HumanPlayer1/
    Mixed,
    /// AA-AA simulations, one subdirectory per AA type
    Simulation,
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct CollapseArg {
    /// Root directory of the raw recordings
    input: PathBuf,
    /// Layout of INPUT: human, mixed or simulation
    #[arg(long, default_value = "human")]
    kind: SessionKind,
    /// Directory to write the engagement files to; INPUT's layout is kept
    #[arg(long)]
    output: PathBuf,
    #[clap(flatten)]
    trials: TrialRangeArg,
}

pub(crate) fn run(arg: &CollapseArg) -> anyhow::Result<()> {
    let trials = arg.trials.trials()?;
    let source = match arg.kind {
        SessionKind::Human => FsTrialSource::sessions_in(&arg.input, Pairing::HumanHuman),
        SessionKind::Mixed => FsTrialSource::human_aa(&arg.input),
        SessionKind::Simulation => FsTrialSource::sessions_in(&arg.input, Pairing::AaAa),
    }
    .with_context(|| format!("Failed to list {} sessions in {}", arg.kind, arg.input.display()))?;
    info!(
        sessions = source.sessions().len(),
        kind = %arg.kind,
        %trials,
        "collapsing engagement"
    );

    let (written, skipped) = collapse(&source, trials, &arg.output)?;
    info!(written, skipped, output = %arg.output.display(), "collapse finished");
    Ok(())
}

/// Writes one engagement file per readable trial and returns how many were
/// written and skipped.
fn collapse<S>(source: &S, trials: TrialRange, output: &Path) -> anyhow::Result<(usize, usize)>
where
    S: TrialSource + ?Sized,
{
    let mut written = 0;
    let mut skipped = 0;
    for session in source.sessions() {
        let dir = output.join(session_dir(session));
        for trial in trials.iter() {
            let record = match source.load(session, trial) {
                Ok(record) => record,
                Err(e) if e.is_missing_trial_file() => {
                    debug!(session = %session.name, %trial, "no trial file");
                    skipped += 1;
                    continue;
                }
                Err(e) if e.is_recoverable() => {
                    warn!(session = %session.name, %trial, error = %e, "skipping trial");
                    skipped += 1;
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            util::create_dir(&dir)?;
            let path = dir.join(format!("trialIdentifier_{trial}.csv"));
            let records = engagement_records(&record).with_context(|| {
                format!("Failed to collapse trial {trial} of session '{}'", session.name)
            })?;
            Output::open(path)?.write_csv(records)?;
            written += 1;
        }
        debug!(session = %session.name, "session collapsed");
    }
    Ok((written, skipped))
}

/// Output directory of a session, relative to the output root.
fn session_dir(session: &Session) -> PathBuf {
    let mut dir = PathBuf::new();
    if let Some(cohort) = &session.cohort {
        dir.push(cohort);
    }
    if let Some(slot) = session.human_player {
        dir.push(HUMAN_PLAYER_DIRS[slot.index()].0);
    }
    dir.push(&session.name);
    dir
}

/// Header and rows of an engagement file.
///
/// Herder positions and time are carried over when the recording has them,
/// so collapsed files serve the occupancy analysis too.
fn engagement_records(record: &TrialRecord) -> anyhow::Result<Vec<Vec<String>>> {
    let num_targets = record.num_targets();
    let prefixes = PlayerSlot::ALL.map(|slot| record.herder(slot).prefix());
    let time = record.time().ok();
    let positions = PlayerSlot::ALL.map(|slot| record.positions(slot).ok());
    let indicators = [
        record.indicators(PlayerSlot::First)?,
        record.indicators(PlayerSlot::Second)?,
    ];
    let engagement = [
        record.engagement(PlayerSlot::First)?,
        record.engagement(PlayerSlot::Second)?,
    ];

    let mut header = vec![];
    if time.is_some() {
        header.push("time".to_owned());
    }
    header.extend(["TrialID", "numTargs"].map(str::to_owned));
    for (prefix, positions) in prefixes.iter().zip(&positions) {
        if positions.is_some() {
            header.extend([format!("{prefix}x"), format!("{prefix}z")]);
        }
        header.extend((0..num_targets).map(|j| format!("{prefix}TA{j}")));
    }
    header.extend(prefixes.iter().map(|prefix| format!("{prefix}_engagement")));

    let trial_id = record.trial_id().unwrap_or(record.trial()).to_string();
    let num_rows = engagement[0].len();
    let mut records = Vec::with_capacity(num_rows + 1);
    records.push(header);
    for i in 0..num_rows {
        let mut row = vec![];
        if let Some(time) = time {
            row.push(time[i].to_string());
        }
        row.extend([trial_id.clone(), num_targets.to_string()]);
        for slot in PlayerSlot::ALL {
            if let Some(positions) = positions[slot.index()] {
                let p = positions[i];
                row.extend([p.x.to_string(), p.z.to_string()]);
            }
            let flags = &indicators[slot.index()][i];
            row.extend((0..num_targets).map(|j| u8::from(flags.get(j).is_some_and(|&f| f)).to_string()));
        }
        row.extend(engagement.iter().map(|labels| labels[i].label().to_string()));
        records.push(row);
    }
    Ok(records)
}
