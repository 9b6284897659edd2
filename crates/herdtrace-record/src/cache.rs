//! Write-once cache of loaded trial records
//!
//! Loading is split from lookup so that many records can be borrowed at the
//! same time: [`TrialCache::fetch`] fills an entry (`&mut self`) and
//! [`TrialCache::get`] reads it (`&self`).
//!
//! Recoverable load failures are remembered as skipped entries and logged
//! once; fatal failures are returned and leave no entry behind.

use std::collections::HashMap;

use tracing::warn;

use crate::{
    error::RecordError,
    record::TrialRecord,
    source::{Session, TrialSource},
    trial::TrialNumber,
};

#[derive(Debug)]
enum Entry {
    Loaded(TrialRecord),
    Skipped,
}

#[derive(Debug)]
pub struct TrialCache<'a, S>
where
    S: TrialSource + ?Sized,
{
    source: &'a S,
    entries: HashMap<String, HashMap<TrialNumber, Entry>>,
}

impl<'a, S> TrialCache<'a, S>
where
    S: TrialSource + ?Sized,
{
    #[must_use]
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            entries: HashMap::new(),
        }
    }

    #[must_use]
    pub fn source(&self) -> &'a S {
        self.source
    }

    #[must_use]
    pub fn sessions(&self) -> &'a [Session] {
        self.source.sessions()
    }

    /// Loads `trial` of `session` unless it was fetched before.
    pub fn fetch(&mut self, session: &Session, trial: TrialNumber) -> Result<(), RecordError> {
        if self
            .entries
            .get(session.name.as_str())
            .is_some_and(|trials| trials.contains_key(&trial))
        {
            return Ok(());
        }
        let entry = match self.source.load(session, trial) {
            Ok(record) => Entry::Loaded(record),
            Err(e) if e.is_recoverable() => {
                warn!(session = %session.name, %trial, "skipping trial: {e}");
                Entry::Skipped
            }
            Err(e) => return Err(e),
        };
        self.entries
            .entry(session.name.clone())
            .or_default()
            .insert(trial, entry);
        Ok(())
    }

    /// A fetched record, or `None` if it was skipped or never fetched.
    #[must_use]
    pub fn get(&self, session: &Session, trial: TrialNumber) -> Option<&TrialRecord> {
        match self
            .entries
            .get(session.name.as_str())
            .and_then(|trials| trials.get(&trial))
        {
            Some(Entry::Loaded(record)) => Some(record),
            Some(Entry::Skipped) | None => None,
        }
    }

    /// Number of fetched entries, skipped ones included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.values().map(HashMap::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::{herder::Pairing, table::TrialTable};

    struct CountingSource {
        sessions: Vec<Session>,
        loads: Cell<usize>,
    }

    impl TrialSource for CountingSource {
        fn sessions(&self) -> &[Session] {
            &self.sessions
        }

        fn load(&self, session: &Session, trial: TrialNumber) -> Result<TrialRecord, RecordError> {
            self.loads.set(self.loads.get() + 1);
            match session.name.as_str() {
                "missing" => Err(RecordError::MissingTrialFile {
                    session: session.name.clone(),
                    trial,
                }),
                "broken" => Err(RecordError::Io {
                    path: "broken".into(),
                    source: std::io::Error::other("disk on fire"),
                }),
                _ => {
                    let table = TrialTable::from_columns([("HA0_engagement", vec![0.0])]);
                    TrialRecord::from_table(&session.name, trial, session.pairing, &table)
                }
            }
        }
    }

    fn source(names: &[&str]) -> CountingSource {
        CountingSource {
            sessions: names
                .iter()
                .map(|name| Session::new(*name, Pairing::AaAa))
                .collect(),
            loads: Cell::new(0),
        }
    }

    #[test]
    fn test_records_are_loaded_once() {
        let source = source(&["sim", "missing"]);
        let mut cache = TrialCache::new(&source);
        for _ in 0..2 {
            for session in cache.sessions() {
                cache.fetch(session, TrialNumber(7)).unwrap();
            }
        }
        assert_eq!(source.loads.get(), 2);
        assert_eq!(cache.len(), 2);

        let [sim, missing] = [&source.sessions[0], &source.sessions[1]];
        assert_eq!(cache.get(sim, TrialNumber(7)).unwrap().session(), "sim");
        assert!(cache.get(missing, TrialNumber(7)).is_none());
        assert!(cache.get(sim, TrialNumber(8)).is_none());

        cache.fetch(sim, TrialNumber(8)).unwrap();
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get(sim, TrialNumber(8)).unwrap().trial(), TrialNumber(8));
        assert_eq!(cache.get(sim, TrialNumber(7)).unwrap().trial(), TrialNumber(7));
    }

    #[test]
    fn test_fatal_errors_are_not_cached() {
        let source = source(&["broken"]);
        let mut cache = TrialCache::new(&source);
        let err = cache.fetch(&source.sessions[0], TrialNumber(7)).unwrap_err();
        assert!(err.is_io(), "{err}");
        assert!(cache.is_empty());
    }
}
