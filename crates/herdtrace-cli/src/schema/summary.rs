use chrono::{DateTime, Utc};
use herdtrace_analysis::{
    AlignmentConfig, CohortTable, OccupancyConfig, ScoreKind, ScoreRow, ScoreTable,
};
use herdtrace_record::TrialRange;
use herdtrace_stats::descriptive::DescriptiveStats;
use serde::{Deserialize, Serialize};

/// Machine-readable record of one analysis run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Timestamp when the run finished (RFC 3339)
    pub generated_at: DateTime<Utc>,
    /// Subcommand that produced the tables
    pub command: String,
    pub trials: TrialRange,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alignment: Option<AlignmentConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupancy: Option<OccupancyConfig>,
    pub tables: Vec<TableSummary>,
}

impl RunSummary {
    pub fn new(command: &str, trials: TrialRange) -> Self {
        Self {
            generated_at: Utc::now(),
            command: command.to_owned(),
            trials,
            alignment: None,
            occupancy: None,
            tables: vec![],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableSummary {
    /// Output file stem, e.g. `dtw_human`
    pub name: String,
    pub kind: ScoreKind,
    pub rows: usize,
    /// Statistics of the per-row trial means over the whole table
    pub overall: Option<StatsSummary>,
    pub cohorts: Vec<CohortSummary>,
}

impl TableSummary {
    pub fn new(name: &str, table: &ScoreTable, cohorts: &[CohortTable]) -> Self {
        let means = table.rows().iter().filter_map(ScoreRow::mean);
        Self {
            name: name.to_owned(),
            kind: table.kind(),
            rows: table.rows().len(),
            overall: DescriptiveStats::new(means).map(StatsSummary::from),
            cohorts: cohorts.iter().map(CohortSummary::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CohortSummary {
    pub cohort: String,
    pub rows: usize,
    /// `None` when no row of the cohort has a valid cell
    pub stats: Option<StatsSummary>,
}

impl From<&CohortTable> for CohortSummary {
    fn from(table: &CohortTable) -> Self {
        Self {
            cohort: table.cohort().to_owned(),
            rows: table.rows().len(),
            stats: table.summary().map(StatsSummary::from),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatsSummary {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
    pub std_error: f64,
}

impl From<DescriptiveStats> for StatsSummary {
    fn from(stats: DescriptiveStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean,
            median: stats.median,
            std_dev: stats.std_dev,
            std_error: stats.std_error,
        }
    }
}
