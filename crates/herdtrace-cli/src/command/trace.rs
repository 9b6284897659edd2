use std::path::PathBuf;

use anyhow::Context;
use herdtrace_analysis::CrossSession;
use herdtrace_record::{Pairing, TrialSource, fs::FsTrialSource};
use tracing::info;

use super::common::{self, AnalysisArg, OccupancyArg};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct TraceArg {
    /// Directory with one subdirectory per human-human session
    #[arg(long)]
    human_human: PathBuf,
    /// Directory with the human-AA sessions (HumanPlayer0/, HumanPlayer1/)
    #[arg(long)]
    human_aa: Option<PathBuf>,
    #[clap(flatten)]
    occupancy: OccupancyArg,
    #[clap(flatten)]
    analysis: AnalysisArg,
}

pub(crate) fn run(arg: &TraceArg) -> anyhow::Result<()> {
    let trials = arg.analysis.trials()?;
    let config = arg.occupancy.config()?;
    let background = FsTrialSource::sessions_in(&arg.human_human, Pairing::HumanHuman)
        .context("Failed to list human-human sessions")?;
    info!(
        sessions = background.sessions().len(),
        bin_size = config.bin_size,
        threshold = config.threshold,
        %trials,
        "scoring trace overlap"
    );

    let mut report = arg.analysis.report("trace")?;
    report.summary_mut().occupancy = Some(config);

    let mut cross = CrossSession::new(&background, trials);
    let surrogate = cross.surrogate_occupancy(&config)?;
    let human_aa = match &arg.human_aa {
        Some(dir) => {
            let source = FsTrialSource::human_aa(dir).context("Failed to list human-AA sessions")?;
            Some(cross.human_aa_occupancy(&source, &config)?)
        }
        None => None,
    };

    common::report_comparison(&mut report, &arg.analysis, &surrogate, human_aa)?;
    report.finish()
}
