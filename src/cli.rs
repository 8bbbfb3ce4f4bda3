//! Command line interface

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "price-monitor",
    version,
    about = "Track storefront listing prices and mail an alert when they drop to a reference price",
    args_conflicts_with_subcommands = true
)]
pub struct Cli {
    /// Configuration file (TOML or JSON); defaults to the per-user config file
    #[arg(long, short, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub run: RunArgs,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check every tracked variant once (the default)
    Run(RunArgs),

    /// Print the most recent observations of a variant
    History(HistoryArgs),
}

#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Only check these variants; repeatable
    #[arg(long = "variant", value_name = "ID")]
    pub variants: Vec<String>,

    /// Check variants concurrently
    #[arg(long)]
    pub parallel: bool,
}

#[derive(Args, Debug, Clone)]
pub struct HistoryArgs {
    #[arg(long, value_name = "ID")]
    pub variant: String,

    #[arg(long, default_value_t = 20)]
    pub limit: u32,

    /// One JSON object per line instead of a table
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// The subcommand to execute, with `run` as the default.
    pub fn into_command(self) -> Command {
        self.command.unwrap_or(Command::Run(self.run))
    }
}
