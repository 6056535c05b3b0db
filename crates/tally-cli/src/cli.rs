use clap::{Args, Parser, Subcommand};

use tally_merge::MergePolicy;

#[derive(Parser)]
#[command(
    name = "tally",
    about = "Tally — scorecard snapshot reconciliation",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Merge snapshot files into one record, reporting conflicts
    Merge(MergeArgs),
    /// Apply chosen conflict resolutions to a merged record
    Resolve(ResolveArgs),
}

#[derive(Args)]
pub struct MergeArgs {
    /// Snapshot files, in fold order
    #[arg(required = true)]
    pub files: Vec<String>,
    /// Leaf policy for the whole run
    #[arg(long, default_value = "non-default-wins")]
    pub policy: PolicyArg,
    /// Write the merged record to this file
    #[arg(short, long)]
    pub out: Option<String>,
    /// Write the conflict list to this file
    #[arg(long)]
    pub conflicts: Option<String>,
}

#[derive(Args)]
pub struct ResolveArgs {
    /// Merged record produced by `tally merge --out`
    #[arg(long)]
    pub merged: String,
    /// Conflict list produced by `tally merge --conflicts`
    #[arg(long)]
    pub conflicts: String,
    /// JSON object mapping conflict index to chosen value index
    #[arg(long)]
    pub choices: String,
    /// Write the resolved record to this file
    #[arg(short, long)]
    pub out: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum PolicyArg {
    NonDefaultWins,
    LastWins,
    FirstWins,
}

impl From<PolicyArg> for MergePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::NonDefaultWins => MergePolicy::NonDefaultWins,
            PolicyArg::LastWins => MergePolicy::LastWins,
            PolicyArg::FirstWins => MergePolicy::FirstWins,
        }
    }
}
