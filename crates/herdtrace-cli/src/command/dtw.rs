use std::path::PathBuf;

use anyhow::Context;
use herdtrace_analysis::CrossSession;
use herdtrace_record::{Pairing, TrialSource, fs::FsTrialSource};
use tracing::info;

use super::common::{self, AlignmentArg, AnalysisArg};

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct DtwArg {
    /// Directory with one subdirectory per human-human session
    #[arg(long)]
    human_human: PathBuf,
    /// Directory with the human-AA sessions (HumanPlayer0/, HumanPlayer1/)
    #[arg(long)]
    human_aa: Option<PathBuf>,
    #[clap(flatten)]
    alignment: AlignmentArg,
    #[clap(flatten)]
    analysis: AnalysisArg,
}

pub(crate) fn run(arg: &DtwArg) -> anyhow::Result<()> {
    let trials = arg.analysis.trials()?;
    let config = arg.alignment.config();
    let background = FsTrialSource::sessions_in(&arg.human_human, Pairing::HumanHuman)
        .context("Failed to list human-human sessions")?;
    info!(
        sessions = background.sessions().len(),
        signal = %config.signal,
        normalization = %config.normalization,
        %trials,
        "scoring alignment similarity"
    );

    let mut report = arg.analysis.report("dtw")?;
    report.summary_mut().alignment = Some(config);

    let mut cross = CrossSession::new(&background, trials);
    let surrogate = cross.surrogate_alignment(config)?;
    let human_aa = match &arg.human_aa {
        Some(dir) => {
            let source = FsTrialSource::human_aa(dir).context("Failed to list human-AA sessions")?;
            Some(cross.human_aa_alignment(&source, config)?)
        }
        None => None,
    };

    common::report_comparison(&mut report, &arg.analysis, &surrogate, human_aa)?;
    report.finish()
}
