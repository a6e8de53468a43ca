use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "triage",
    version,
    about = "CI failure triage with flaky-test history"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Execute the suite once, triage the outcome and gate CI
    Run(RunArgs),
    /// List recent runs
    Runs(RunsArgs),
    /// Show one stored run in full
    Show(ShowArgs),
    /// Flaky-test statistics over the recent window
    Flaky(FlakyArgs),
    /// Scaffold a config file
    Init(InitArgs),
    Version,
}

#[derive(Parser, Clone)]
pub struct RunArgs {
    #[arg(long, default_value = "triage.yaml")]
    pub config: PathBuf,

    /// override the database path from the config
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// triage with rules only, even if an API key is present
    #[arg(long)]
    pub no_external: bool,
}

#[derive(Parser, Clone)]
pub struct RunsArgs {
    #[arg(long, default_value = ".triage/triage.db")]
    pub db: PathBuf,

    #[arg(long, default_value_t = 25)]
    pub limit: u32,

    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Clone)]
pub struct ShowArgs {
    #[arg(long, default_value = ".triage/triage.db")]
    pub db: PathBuf,

    #[arg(long)]
    pub id: i64,
}

#[derive(Parser, Clone)]
pub struct FlakyArgs {
    #[arg(long, default_value = ".triage/triage.db")]
    pub db: PathBuf,

    #[arg(long, default_value_t = 30)]
    pub window: u32,

    #[arg(long, default_value_t = 3)]
    pub min_occurrences: u32,

    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Clone)]
pub struct InitArgs {
    #[arg(long, default_value = "triage.yaml")]
    pub config: PathBuf,

    /// generate .gitignore for the database directory
    #[arg(long)]
    pub gitignore: bool,
}
