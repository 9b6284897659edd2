//! Trial files on disk
//!
//! # Layout
//!
//! ```text
//! human-human / simulation root        human-AA root
//! ├─ <session>/                        ├─ HumanPlayer0/<session>/...
//! │   └─ **/*trialIdentifier_7*.csv    └─ HumanPlayer1/<session>/...
//! └─ <session>/...
//!                                      or, with one folder per AA type:
//!                                      └─ <type>/HumanPlayer{0,1}/<session>/...
//! ```
//!
//! Trial files are found anywhere below the session directory by the
//! `trialIdentifier` token in their name. The token is followed by an optional
//! `_` and the trial digits, with or without zero padding (`_7`, `07`, `_07`);
//! digits are compared numerically.

use std::{
    collections::HashMap,
    fs::{self, File},
    io::BufReader,
    path::{Path, PathBuf},
};

use tracing::warn;

use crate::{
    error::RecordError,
    herder::{Pairing, PlayerSlot},
    record::TrialRecord,
    source::{Session, TrialSource},
    table::TrialTable,
    trial::TrialNumber,
};

const TRIAL_TOKEN: &str = "trialIdentifier";

/// Folders of a human-AA root, by the player slot the human occupied.
pub const HUMAN_PLAYER_DIRS: [(&str, PlayerSlot); 2] = [
    ("HumanPlayer0", PlayerSlot::First),
    ("HumanPlayer1", PlayerSlot::Second),
];

/// Trial number encoded in a file name, if it carries the trial token.
///
/// # Examples
///
/// ```
/// use herdtrace_record::{TrialNumber, fs::trial_token};
///
/// assert_eq!(trial_token("trialIdentifier_7.csv"), Some(TrialNumber(7)));
/// assert_eq!(trial_token("HH_trialIdentifier07_run.csv"), Some(TrialNumber(7)));
/// assert_eq!(trial_token("trialIdentifier_17.csv"), Some(TrialNumber(17)));
/// assert_eq!(trial_token("summary.csv"), None);
/// ```
#[must_use]
pub fn trial_token(file_name: &str) -> Option<TrialNumber> {
    let (_, rest) = file_name.split_once(TRIAL_TOKEN)?;
    let rest = rest.trim_start_matches('_');
    let end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    rest[..end].parse().ok().map(TrialNumber)
}

/// [`TrialSource`] over session directories of CSV files.
#[derive(Debug, Clone, Default)]
pub struct FsTrialSource {
    sessions: Vec<Session>,
    dirs: HashMap<String, PathBuf>,
}

impl FsTrialSource {
    /// Every non-hidden subdirectory of `root` is a session.
    pub fn sessions_in<P>(root: P, pairing: Pairing) -> Result<Self, RecordError>
    where
        P: AsRef<Path>,
    {
        let mut source = Self::default();
        for (name, dir) in list_subdirs(root.as_ref())? {
            source.push(Session::new(name, pairing), dir);
        }
        Ok(source)
    }

    /// Human-AA sessions below `HumanPlayer0/` and `HumanPlayer1/`.
    ///
    /// If `root` has no such folders, each of its subdirectories is taken as
    /// an AA type holding them, and sessions are labelled with that type as
    /// their cohort.
    pub fn human_aa<P>(root: P) -> Result<Self, RecordError>
    where
        P: AsRef<Path>,
    {
        let root = root.as_ref();
        let mut source = Self::default();
        if has_human_player_dirs(root) {
            source.push_human_aa(root, None)?;
        } else {
            for (aa_type, dir) in list_subdirs(root)? {
                source.push_human_aa(&dir, Some(&aa_type))?;
            }
        }
        Ok(source)
    }

    fn push_human_aa(&mut self, root: &Path, cohort: Option<&str>) -> Result<(), RecordError> {
        for (dir_name, slot) in HUMAN_PLAYER_DIRS {
            let player_dir = root.join(dir_name);
            if !player_dir.is_dir() {
                continue;
            }
            for (name, dir) in list_subdirs(&player_dir)? {
                let mut session = Session::new(name, Pairing::HumanAa).with_human_player(slot);
                if let Some(cohort) = cohort {
                    session = session.with_cohort(cohort);
                }
                self.push(session, dir);
            }
        }
        Ok(())
    }

    fn push(&mut self, session: Session, dir: PathBuf) {
        if let Some(existing) = self.dirs.get(&session.name) {
            warn!(
                session = %session.name,
                kept = %existing.display(),
                ignored = %dir.display(),
                "duplicate session name; keeping the first directory"
            );
            return;
        }
        self.dirs.insert(session.name.clone(), dir);
        self.sessions.push(session);
    }

    /// Path of the file holding `trial` of `session`, if there is one.
    ///
    /// When several files match, the first in sorted path order is used and a
    /// warning is logged.
    pub fn trial_file(
        &self,
        session: &Session,
        trial: TrialNumber,
    ) -> Result<Option<PathBuf>, RecordError> {
        let Some(dir) = self.dirs.get(&session.name) else {
            return Ok(None);
        };
        let mut matches = vec![];
        collect_trial_files(dir, trial, &mut matches)?;
        matches.sort();
        if matches.len() > 1 {
            warn!(
                session = %session.name,
                %trial,
                candidates = matches.len(),
                using = %matches[0].display(),
                "multiple files match trial; using the first"
            );
        }
        Ok(matches.into_iter().next())
    }
}

impl TrialSource for FsTrialSource {
    fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    fn load(&self, session: &Session, trial: TrialNumber) -> Result<TrialRecord, RecordError> {
        let path = self
            .trial_file(session, trial)?
            .ok_or_else(|| RecordError::MissingTrialFile {
                session: session.name.clone(),
                trial,
            })?;
        let malformed = |reason: String| RecordError::MalformedTrialFile {
            session: session.name.clone(),
            trial,
            path: path.clone(),
            reason,
        };

        let file = File::open(&path).map_err(|e| malformed(e.to_string()))?;
        let table =
            TrialTable::from_reader(BufReader::new(file)).map_err(|e| malformed(e.to_string()))?;
        TrialRecord::from_table(&session.name, trial, session.pairing, &table).map_err(|e| match e {
            RecordError::MalformedTrialFile { reason, .. } => malformed(reason),
            e => e,
        })
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> RecordError + '_ {
    move |source| RecordError::Io {
        path: path.to_owned(),
        source,
    }
}

fn has_human_player_dirs(root: &Path) -> bool {
    HUMAN_PLAYER_DIRS
        .iter()
        .any(|(name, _)| root.join(name).is_dir())
}

/// Non-hidden subdirectories of `root` as `(name, path)`, sorted by name.
fn list_subdirs(root: &Path) -> Result<Vec<(String, PathBuf)>, RecordError> {
    let mut dirs = vec![];
    for entry in fs::read_dir(root).map_err(io_error(root))? {
        let entry = entry.map_err(io_error(root))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        let path = entry.path();
        if path.is_dir() {
            dirs.push((name, path));
        }
    }
    dirs.sort();
    Ok(dirs)
}

fn collect_trial_files(
    dir: &Path,
    trial: TrialNumber,
    matches: &mut Vec<PathBuf>,
) -> Result<(), RecordError> {
    for entry in fs::read_dir(dir).map_err(io_error(dir))? {
        let entry = entry.map_err(io_error(dir))?;
        let path = entry.path();
        if path.is_dir() {
            collect_trial_files(&path, trial, matches)?;
        } else if trial_token(&entry.file_name().to_string_lossy()) == Some(trial) {
            matches.push(path);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    const ENGAGEMENT_CSV: &str = "time,TrialID,numTargs,HA0_engagement,HA1_engagement\n\
                                  0.0,7,3,-1,0\n\
                                  0.1,7,3,1,0\n";

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_sessions_are_sorted_and_hidden_skipped() {
        let root = tempfile::tempdir().unwrap();
        for name in ["H02", "H01", ".DS_Store_dir"] {
            fs::create_dir_all(root.path().join(name)).unwrap();
        }
        write(&root.path().join("notes.txt"), "");

        let source = FsTrialSource::sessions_in(root.path(), Pairing::HumanHuman).unwrap();
        let names = source
            .sessions()
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, ["H01", "H02"]);
    }

    #[test]
    fn test_load_with_either_padding() {
        let root = tempfile::tempdir().unwrap();
        write(
            &root.path().join("H01/ExperimentData/run_trialIdentifier07.csv"),
            ENGAGEMENT_CSV,
        );
        write(&root.path().join("H02/trialIdentifier_7.csv"), ENGAGEMENT_CSV);
        write(&root.path().join("H02/trialIdentifier_17.csv"), ENGAGEMENT_CSV);

        let source = FsTrialSource::sessions_in(root.path(), Pairing::HumanHuman).unwrap();
        for session in source.sessions() {
            let record = source.load(session, TrialNumber(7)).unwrap();
            assert_eq!(record.trial_id(), Some(TrialNumber(7)));
            assert_eq!(record.engagement(PlayerSlot::First).unwrap().len(), 2);
        }
    }

    #[test]
    fn test_missing_and_malformed_files_are_recoverable() {
        let root = tempfile::tempdir().unwrap();
        write(&root.path().join("H01/trialIdentifier_8.csv"), "a,b\n1,2,3\n");

        let source = FsTrialSource::sessions_in(root.path(), Pairing::HumanHuman).unwrap();
        let session = &source.sessions()[0];

        let missing = source.load(session, TrialNumber(7)).unwrap_err();
        assert!(missing.is_missing_trial_file(), "{missing}");

        let malformed = source.load(session, TrialNumber(8)).unwrap_err();
        assert!(malformed.is_malformed_trial_file(), "{malformed}");
        assert!(malformed.is_recoverable());
        assert!(malformed.to_string().contains("trialIdentifier_8.csv"));
    }

    #[test]
    fn test_ambiguous_files_pick_first_sorted() {
        let root = tempfile::tempdir().unwrap();
        write(&root.path().join("H01/b/trialIdentifier_7.csv"), ENGAGEMENT_CSV);
        write(&root.path().join("H01/a/trialIdentifier07.csv"), ENGAGEMENT_CSV);

        let source = FsTrialSource::sessions_in(root.path(), Pairing::HumanHuman).unwrap();
        let path = source
            .trial_file(&source.sessions()[0], TrialNumber(7))
            .unwrap()
            .unwrap();
        assert!(path.ends_with("a/trialIdentifier07.csv"), "{}", path.display());
    }

    #[test]
    fn test_human_aa_discovery() {
        let root = tempfile::tempdir().unwrap();
        fs::create_dir_all(root.path().join("Heuristic/HumanPlayer0/Session1A")).unwrap();
        fs::create_dir_all(root.path().join("Heuristic/HumanPlayer1/Session1B")).unwrap();
        fs::create_dir_all(root.path().join("SelfPlay/HumanPlayer0/Session3A")).unwrap();

        let source = FsTrialSource::human_aa(root.path()).unwrap();
        let sessions = source.sessions();
        assert_eq!(sessions.len(), 3);
        assert_eq!(sessions[0].name, "Session1A");
        assert_eq!(sessions[0].human_player, Some(PlayerSlot::First));
        assert_eq!(sessions[0].cohort.as_deref(), Some("Heuristic"));
        assert_eq!(sessions[1].human_player, Some(PlayerSlot::Second));
        assert_eq!(sessions[2].cohort.as_deref(), Some("SelfPlay"));

        let flat = FsTrialSource::human_aa(root.path().join("Heuristic")).unwrap();
        assert_eq!(flat.sessions().len(), 2);
        assert_eq!(flat.sessions()[0].cohort, None);
    }
}
