use std::{
    fs::File,
    io::{self, BufWriter, StdoutLock, Write as _},
    path::{Path, PathBuf},
};

use anyhow::Context;
use herdtrace_analysis::{CohortTable, LongTable, ScoreTable};
use herdtrace_record::TrialRange;

#[derive(Debug)]
pub enum Output {
    Stdout {
        writer: StdoutLock<'static>,
    },
    File {
        writer: BufWriter<File>,
        path: PathBuf,
    },
}

impl Output {
    pub fn save_json<T>(value: &T, output_path: Option<PathBuf>) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        let mut output = Output::from_output_path(output_path)?;
        output.write_json(value)
    }

    pub fn from_output_path(output_path: Option<PathBuf>) -> anyhow::Result<Self> {
        match output_path {
            Some(path) => Output::open(path),
            None => Ok(Output::stdout()),
        }
    }

    pub fn stdout() -> Self {
        Output::Stdout {
            writer: io::stdout().lock(),
        }
    }

    pub fn open(path: PathBuf) -> anyhow::Result<Self> {
        let file = File::create(&path)
            .with_context(|| format!("Failed to create output file: {}", path.display()))?;
        Ok(Output::File {
            writer: BufWriter::new(file),
            path,
        })
    }

    pub fn display_path(&self) -> String {
        match self {
            Output::Stdout { .. } => "stdout".to_string(),
            Output::File { path, .. } => path.display().to_string(),
        }
    }

    pub fn write_json<T>(&mut self, value: T) -> anyhow::Result<()>
    where
        T: serde::Serialize,
    {
        serde_json::to_writer_pretty(&mut *self, &value)
            .with_context(|| format!("Failed to write JSON to {}", self.display_path()))?;
        writeln!(&mut *self).with_context(|| {
            format!(
                "Failed to write newline after JSON to {}",
                self.display_path()
            )
        })?;
        self.flush()
            .with_context(|| format!("Failed to flush output to {}", self.display_path()))?;
        Ok(())
    }

    /// Writes `records` as CSV, the first record being the header.
    pub fn write_csv<I, R>(self, records: I) -> anyhow::Result<()>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator,
        R::Item: AsRef<[u8]>,
    {
        let display_path = self.display_path();
        let mut writer = csv::Writer::from_writer(self);
        for record in records {
            writer
                .write_record(record)
                .with_context(|| format!("Failed to write CSV record to {display_path}"))?;
        }
        writer
            .flush()
            .with_context(|| format!("Failed to flush output to {display_path}"))?;
        Ok(())
    }
}

impl io::Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Output::Stdout { writer } => writer.write(buf),
            Output::File { writer, .. } => writer.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Output::Stdout { writer } => writer.flush(),
            Output::File { writer, .. } => writer.flush(),
        }
    }
}

pub fn read_json_file<T, P>(file_kind: &str, path: P) -> anyhow::Result<T>
where
    T: serde::de::DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open {} file: {}", file_kind, path.display()))?;

    let reader = io::BufReader::new(file);
    let value = serde_json::from_reader(reader).with_context(|| {
        format!(
            "Failed to parse {} JSON file: {}",
            file_kind,
            path.display()
        )
    })?;

    Ok(value)
}

pub fn create_dir<P>(path: P) -> anyhow::Result<()>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    std::fs::create_dir_all(path)
        .with_context(|| format!("Failed to create directory: {}", path.display()))
}

fn trial_header(trials: TrialRange) -> impl Iterator<Item = String> {
    trials.iter().map(|trial| trial.to_string())
}

/// Empty cells are written as empty fields.
fn format_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// `Session,Player,Cohort,<trials...>`
pub fn write_score_table(path: PathBuf, table: &ScoreTable) -> anyhow::Result<()> {
    let header = ["Session", "Player", "Cohort"]
        .map(str::to_owned)
        .into_iter()
        .chain(trial_header(table.trials()))
        .collect::<Vec<_>>();
    let rows = table.rows().iter().map(|row| {
        [
            row.session.clone(),
            row.player.map(|p| p.to_string()).unwrap_or_default(),
            row.cohort.clone().unwrap_or_default(),
        ]
        .into_iter()
        .chain(row.values.iter().map(|&v| format_cell(v)))
        .collect::<Vec<_>>()
    });
    Output::open(path)?.write_csv(std::iter::once(header).chain(rows))
}

/// `Session,Player,<trials...>`
pub fn write_cohort_table(path: PathBuf, table: &CohortTable) -> anyhow::Result<()> {
    let header = ["Session", "Player"]
        .map(str::to_owned)
        .into_iter()
        .chain(trial_header(table.trials()))
        .collect::<Vec<_>>();
    let rows = table.rows().iter().map(|row| {
        [
            row.session.clone(),
            row.player.map(|p| p.to_string()).unwrap_or_default(),
        ]
        .into_iter()
        .chain(row.values.iter().map(|&v| format_cell(v)))
        .collect::<Vec<_>>()
    });
    Output::open(path)?.write_csv(std::iter::once(header).chain(rows))
}

/// `pair,agent_type,<trials...>`
pub fn write_long_table(path: PathBuf, table: &LongTable) -> anyhow::Result<()> {
    let header = ["pair", "agent_type"]
        .map(str::to_owned)
        .into_iter()
        .chain(trial_header(table.trials()))
        .collect::<Vec<_>>();
    let rows = table.rows().iter().map(|row| {
        [row.pair.clone(), row.agent_type.to_string()]
            .into_iter()
            .chain(row.values.iter().map(|&v| format_cell(v)))
            .collect::<Vec<_>>()
    });
    Output::open(path)?.write_csv(std::iter::once(header).chain(rows))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use herdtrace_analysis::{AgentType, ScoreKind};
    use herdtrace_record::{PlayerSlot, TrialNumber};

    use super::*;

    fn trials() -> TrialRange {
        TrialRange::new(TrialNumber(7), TrialNumber(9)).unwrap()
    }

    #[test]
    fn test_score_table_csv_leaves_invalid_cells_empty() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = ScoreTable::new(ScoreKind::TraceOverlap, trials());
        let row = table.push_row("H01", Some(PlayerSlot::Second), None);
        table.set(row, TrialNumber(7), Some(0.5));
        table.set(row, TrialNumber(9), Some(1.0));
        let path = dir.path().join("trace_surrogate.csv");
        write_score_table(path.clone(), &table).unwrap();

        let text = fs::read_to_string(path).unwrap();
        assert_eq!(text, "Session,Player,Cohort,7,8,9\nH01,2,,0.5,,1\n");
    }

    #[test]
    fn test_cohort_and_long_table_csv() {
        let dir = tempfile::tempdir().unwrap();
        let mut table = ScoreTable::new(ScoreKind::AlignmentSimilarity, trials());
        let row = table.push_row("Session1A", Some(PlayerSlot::First), Some("heur".into()));
        table.set(row, TrialNumber(8), Some(0.25));

        let cohort = CohortTable::from_table(&table, "heur").unwrap();
        let cohort_path = dir.path().join("dtw_human_heur.csv");
        write_cohort_table(cohort_path.clone(), &cohort).unwrap();
        assert_eq!(
            fs::read_to_string(cohort_path).unwrap(),
            "Session,Player,7,8,9\nSession1A,1,,0.25,\n"
        );

        let mut long = LongTable::new(ScoreKind::AlignmentSimilarity, trials());
        long.extend(AgentType::Human, &table).unwrap();
        let long_path = dir.path().join("dtw_long.csv");
        write_long_table(long_path.clone(), &long).unwrap();
        assert_eq!(
            fs::read_to_string(long_path).unwrap(),
            "pair,agent_type,7,8,9\nSession1A,Human,,0.25,\n"
        );
    }

    #[test]
    fn test_read_json_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let err = read_json_file::<serde_json::Value, _>("occupancy config", &path).unwrap_err();
        assert!(
            err.to_string().contains("Failed to open occupancy config file"),
            "{err}"
        );
    }
}
