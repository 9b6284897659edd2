use std::path::PathBuf;

use anyhow::Context;
use herdtrace_analysis::CrossSession;
use herdtrace_record::{Pairing, TrialSource, fs::FsTrialSource};
use tracing::info;

use super::common::{AlignmentArg, AnalysisArg, OccupancyArg};

/// Directories shared by the simulation comparisons.
#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SimulationInputArg {
    /// Directory with one subdirectory per human-human session
    #[arg(long)]
    human_human: PathBuf,
    /// Directory with one subdirectory of AA-AA recordings per AA type
    #[arg(long)]
    simulation: PathBuf,
}

impl SimulationInputArg {
    fn open(&self) -> anyhow::Result<(FsTrialSource, FsTrialSource)> {
        let humans = FsTrialSource::sessions_in(&self.human_human, Pairing::HumanHuman)
            .context("Failed to list human-human sessions")?;
        let simulations = FsTrialSource::sessions_in(&self.simulation, Pairing::AaAa)
            .context("Failed to list simulation types")?;
        info!(
            humans = humans.sessions().len(),
            simulations = simulations.sessions().len(),
            "loaded session lists"
        );
        Ok((humans, simulations))
    }
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SimulationDtwArg {
    #[clap(flatten)]
    input: SimulationInputArg,
    #[clap(flatten)]
    alignment: AlignmentArg,
    #[clap(flatten)]
    analysis: AnalysisArg,
}

#[derive(Debug, Clone, clap::Args)]
pub(crate) struct SimulationTraceArg {
    #[clap(flatten)]
    input: SimulationInputArg,
    #[clap(flatten)]
    occupancy: OccupancyArg,
    #[clap(flatten)]
    analysis: AnalysisArg,
}

pub(crate) fn run_dtw(arg: &SimulationDtwArg) -> anyhow::Result<()> {
    let trials = arg.analysis.trials()?;
    let config = arg.alignment.config();
    let (humans, simulations) = arg.input.open()?;

    let mut report = arg.analysis.report("simulation-dtw")?;
    report.summary_mut().alignment = Some(config);

    let table = CrossSession::new(&humans, trials).simulation_alignment_error(&simulations, config)?;
    report.score_table(&format!("{}_simulation", table.kind().tag()), &table, &arg.analysis.requested_cohorts())?;
    report.finish()
}

pub(crate) fn run_trace(arg: &SimulationTraceArg) -> anyhow::Result<()> {
    let trials = arg.analysis.trials()?;
    let config = arg.occupancy.config()?;
    let (humans, simulations) = arg.input.open()?;

    let mut report = arg.analysis.report("simulation-trace")?;
    report.summary_mut().occupancy = Some(config);

    let table = CrossSession::new(&humans, trials).simulation_occupancy(&simulations, &config)?;
    report.score_table(&format!("{}_simulation", table.kind().tag()), &table, &arg.analysis.requested_cohorts())?;
    report.finish()
}
