use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use self::{
    collapse::CollapseArg,
    dtw::DtwArg,
    simulation::{SimulationDtwArg, SimulationTraceArg},
    trace::TraceArg,
};

mod collapse;
mod common;
mod dtw;
mod simulation;
mod trace;

#[derive(Debug, Clone, Parser)]
#[command(author, version, about, long_about = None)]
pub struct CommandArgs {
    /// Log filter used when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    /// What analysis to run
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Debug, Clone, Subcommand)]
enum Mode {
    /// Derive engagement files from raw trial recordings
    Collapse(#[clap(flatten)] CollapseArg),
    /// Score engagement similarity by dynamic time warping
    Dtw(#[clap(flatten)] DtwArg),
    /// Score trajectory overlap with visited-cell masks
    Trace(#[clap(flatten)] TraceArg),
    /// Score alignment error between human sessions and simulations
    SimulationDtw(#[clap(flatten)] SimulationDtwArg),
    /// Score simulation trajectories against the human background
    SimulationTrace(#[clap(flatten)] SimulationTraceArg),
}

pub fn run() -> anyhow::Result<()> {
    let args = CommandArgs::parse();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match args.mode {
        Mode::Collapse(arg) => collapse::run(&arg)?,
        Mode::Dtw(arg) => dtw::run(&arg)?,
        Mode::Trace(arg) => trace::run(&arg)?,
        Mode::SimulationDtw(arg) => simulation::run_dtw(&arg)?,
        Mode::SimulationTrace(arg) => simulation::run_trace(&arg)?,
    }
    Ok(())
}
