use std::path::PathBuf;

use anyhow::Context;
use herdtrace_analysis::{
    AgentType, AlignmentConfig, CohortRule, CohortRules, CohortTable, HumanAaScores, LongTable,
    Normalization, OccupancyConfig, ScoreTable, Signal,
};
use herdtrace_record::{TrialNumber, TrialRange};
use tracing::info;

use crate::{
    schema::summary::{RunSummary, TableSummary},
    util::{self, Output},
};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TrialRangeArg {
    /// First trial to evaluate
    #[arg(long, default_value = "7")]
    first_trial: TrialNumber,
    /// Last trial to evaluate (inclusive)
    #[arg(long, default_value = "24")]
    last_trial: TrialNumber,
}

impl TrialRangeArg {
    pub(crate) fn trials(&self) -> anyhow::Result<TrialRange> {
        Ok(TrialRange::new(self.first_trial, self.last_trial)?)
    }
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct AnalysisArg {
    #[clap(flatten)]
    trials: TrialRangeArg,
    /// Session-name prefix rule, e.g. `Session1=heur`; may be repeated
    ///
    /// Every cohort named here must contain at least one session. Without any
    /// rule the three AA types Session1=heur, Session2=hybr, Session3=self
    /// are used.
    #[arg(long = "cohort", value_name = "PREFIX=NAME")]
    cohorts: Vec<CohortRule>,
    /// Directory to write score tables and summary.json to
    ///
    /// Without it only the summary is printed to stdout.
    #[arg(long)]
    output_dir: Option<PathBuf>,
}

impl AnalysisArg {
    pub(crate) fn trials(&self) -> anyhow::Result<TrialRange> {
        self.trials.trials()
    }

    pub(crate) fn cohort_rules(&self) -> CohortRules {
        if self.cohorts.is_empty() {
            CohortRules::default()
        } else {
            CohortRules::new(self.cohorts.iter().cloned())
        }
    }

    /// Cohorts the user asked for explicitly.
    pub(crate) fn requested_cohorts(&self) -> Vec<String> {
        let mut cohorts = vec![];
        for rule in &self.cohorts {
            if !cohorts.contains(&rule.cohort) {
                cohorts.push(rule.cohort.clone());
            }
        }
        cohorts
    }

    pub(crate) fn report(&self, command: &str) -> anyhow::Result<Report> {
        Report::new(command, self.trials()?, self.output_dir.clone())
    }
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct AlignmentArg {
    /// Signal to align: label, indicators or position
    #[arg(long, default_value = "label")]
    signal: Signal,
    /// Cost denominator: sum or product of the sequence lengths
    #[arg(long, default_value = "sum")]
    normalization: Normalization,
    /// Keep similarities below zero instead of clamping them to [0, 1]
    #[arg(long)]
    unclamped: bool,
}

impl AlignmentArg {
    pub(crate) fn config(&self) -> AlignmentConfig {
        AlignmentConfig {
            signal: self.signal,
            normalization: self.normalization,
            unclamped: self.unclamped,
        }
    }
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct OccupancyArg {
    /// JSON file overriding the occupancy grid geometry and threshold
    #[arg(long)]
    occupancy_config: Option<PathBuf>,
}

impl OccupancyArg {
    pub(crate) fn config(&self) -> anyhow::Result<OccupancyConfig> {
        let config = match &self.occupancy_config {
            Some(path) => util::read_json_file("occupancy config", path)?,
            None => OccupancyConfig::default(),
        };
        config.validate().context("Invalid occupancy config")?;
        Ok(config)
    }
}

/// Collects the tables of one run and writes them out.
#[derive(Debug)]
pub(crate) struct Report {
    output_dir: Option<PathBuf>,
    summary: RunSummary,
}

impl Report {
    fn new(command: &str, trials: TrialRange, output_dir: Option<PathBuf>) -> anyhow::Result<Self> {
        if let Some(dir) = &output_dir {
            util::create_dir(dir)?;
        }
        Ok(Self {
            output_dir,
            summary: RunSummary::new(command, trials),
        })
    }

    pub(crate) fn summary_mut(&mut self) -> &mut RunSummary {
        &mut self.summary
    }

    /// Writes `<name>.csv` and one `<name>_<cohort>.csv` per cohort.
    ///
    /// With `requested` non-empty exactly those cohorts are written and each
    /// must have at least one row; otherwise every cohort present is written.
    pub(crate) fn score_table(
        &mut self,
        name: &str,
        table: &ScoreTable,
        requested: &[String],
    ) -> anyhow::Result<()> {
        let cohorts = if requested.is_empty() {
            CohortTable::split(table)?
        } else {
            requested
                .iter()
                .map(|cohort| CohortTable::from_table(table, cohort))
                .collect::<Result<Vec<_>, _>>()?
        };

        if let Some(dir) = &self.output_dir {
            util::write_score_table(dir.join(format!("{name}.csv")), table)?;
            for cohort in &cohorts {
                util::write_cohort_table(dir.join(format!("{name}_{}.csv", cohort.cohort())), cohort)?;
            }
        }
        info!(
            table = name,
            rows = table.rows().len(),
            cohorts = cohorts.len(),
            "score table ready"
        );
        self.summary
            .tables
            .push(TableSummary::new(name, table, &cohorts));
        Ok(())
    }

    pub(crate) fn long_table(&mut self, name: &str, table: &LongTable) -> anyhow::Result<()> {
        if let Some(dir) = &self.output_dir {
            util::write_long_table(dir.join(format!("{name}.csv")), table)?;
        }
        Ok(())
    }

    /// Writes `summary.json`, or prints it when there is no output directory.
    pub(crate) fn finish(self) -> anyhow::Result<()> {
        let path = self.output_dir.map(|dir| dir.join("summary.json"));
        Output::save_json(&self.summary, path)
    }
}

/// Writes the surrogate and human-AA tables of one score kind, their cohort
/// arrays and the long-format table stacking them.
pub(crate) fn report_comparison(
    report: &mut Report,
    arg: &AnalysisArg,
    surrogate: &ScoreTable,
    human_aa: Option<HumanAaScores>,
) -> anyhow::Result<()> {
    let tag = surrogate.kind().tag();
    report.score_table(&format!("{tag}_surrogate"), surrogate, &[])?;

    let mut long = LongTable::new(surrogate.kind(), surrogate.trials());
    if let Some(HumanAaScores {
        mut human,
        mut artificial,
    }) = human_aa
    {
        let rules = arg.cohort_rules();
        let requested = arg.requested_cohorts();
        rules.assign(&mut human);
        rules.assign(&mut artificial);
        rules.ensure_matched(&human)?;
        rules.ensure_matched(&artificial)?;
        report.score_table(&format!("{tag}_human"), &human, &requested)?;
        report.score_table(&format!("{tag}_artificial"), &artificial, &requested)?;
        long.extend(AgentType::Human, &human)?;
        long.extend(AgentType::Artificial, &artificial)?;
    }
    long.extend(AgentType::Surrogate, &surrogate.merge_players())?;
    report.long_table(&format!("{tag}_long"), &long)
}
