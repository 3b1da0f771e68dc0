use clap::{Parser, Subcommand, Args};

#[derive(Parser)]
#[command(name = "meister", version, about = "Job dispatch and POV submission for binary exploitation games")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase log verbosity (repeat for more)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// YAML configuration file
    #[arg(short, long, global = true, env = "MEISTER_CONFIG")]
    pub config: Option<String>,

    /// SQLite database path (overrides config and MEISTER_DB)
    #[arg(long, global = true)]
    pub database: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the scoring service status
    Status(StatusArgs),
    /// List or ingest the staged challenge binaries
    Binaries(BinariesArgs),
    /// Create analysis jobs for binaries that have none
    Jobs(JobsArgs),
    /// Submit unsubmitted POVs to every opponent
    Submit(SubmitArgs),
    /// Manage the team roster
    #[command(subcommand)]
    Team(TeamCommand),
    /// Manage proofs of vulnerability
    #[command(subcommand)]
    Pov(PovCommand),
    /// Run the scheduler loop until interrupted
    Run(RunArgs),
}

#[derive(Args, Clone)]
pub struct StatusArgs {
    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Clone)]
pub struct BinariesArgs {
    /// Round to fetch binaries for (default: current round from /status)
    #[arg(long)]
    pub round: Option<u64>,

    /// Register the binaries as challenge binary nodes
    #[arg(long)]
    pub ingest: bool,
}

#[derive(Args, Clone)]
pub struct JobsArgs {
    /// Job kind: afl, driller, rex
    #[arg(long, default_value = "afl")]
    pub kind: String,

    /// Print the jobs that would be created without queuing them
    #[arg(long)]
    pub dry_run: bool,

    /// List queued jobs instead of creating new ones
    #[arg(long)]
    pub list: bool,
}

#[derive(Args, Clone)]
pub struct SubmitArgs {
    /// Round to submit for (default: current round from /status)
    #[arg(long)]
    pub round: Option<u64>,

    /// Maximum (team, binary) pairs submitted concurrently
    #[arg(long)]
    pub concurrency: Option<usize>,
}

#[derive(Subcommand, Clone)]
pub enum TeamCommand {
    /// Add a team to the roster
    Add {
        /// Team name as known to the scoring service
        name: String,

        /// Mark this team as ourselves (never submitted to)
        #[arg(long)]
        ours: bool,
    },
    /// List opponents in roster order
    List,
}

#[derive(Subcommand, Clone)]
pub enum PovCommand {
    /// Attach a POV file to a challenge binary
    Add {
        /// Challenge binary id
        #[arg(long)]
        cbn: String,

        /// POV file to store
        #[arg(long)]
        file: String,
    },
}

#[derive(Args, Clone)]
pub struct RunArgs {
    /// Seconds between ticks (overrides config)
    #[arg(long)]
    pub interval: Option<u64>,
}
