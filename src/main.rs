use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

mod cmd;

#[derive(Parser)]
#[command(name = "depflow")]
#[command(version, about = "Multi-repository dependency upgrade orchestrator")]
pub struct Cli {
    /// Path to depflow.toml (defaults to ./depflow.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the persisted state. Overrides DEPFLOW_STATE_DIR.
    #[arg(long, global = true)]
    pub state_dir: Option<PathBuf>,

    /// Backend base URL. Overrides DEPFLOW_API_BASE_URL.
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Only print warnings and errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Validate credentials against the backend
    Login {
        #[arg(long, env = "DEPFLOW_USERNAME")]
        username: String,
        #[arg(long, env = "DEPFLOW_TOKEN", hide_env_values = true)]
        token: String,
    },
    /// End the backend session
    Logout,
    /// Show session, configuration and pipeline summary
    Status,
    /// Supported-dependency catalog
    Deps {
        #[command(subcommand)]
        command: DepsCommands,
    },
    /// Dependency upgrade pipelines
    Pipeline {
        #[command(subcommand)]
        command: PipelineCommands,
    },
    /// Ad-hoc branch and pull request actions across projects
    Workspace {
        #[command(subcommand)]
        command: WorkspaceCommands,
    },
    /// View or validate configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
    /// Drop every pipeline, file and workspace entry
    Reset {
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Clone)]
pub enum DepsCommands {
    /// Fetch the supported dependencies from the backend
    Sync,
    /// List the catalog with each entry's status
    List,
    /// Check or uncheck a dependency for adding
    Toggle { name: String },
    /// Add a pipeline for NAME, or for every checked dependency
    Add { name: Option<String> },
}

#[derive(Subcommand, Clone)]
pub enum PipelineCommands {
    List,
    /// Show a pipeline's repositories, applications and files
    Show { pipeline: String },
    Remove { pipeline: String },
    /// Reload a pipeline from the backend; this also unlocks its mode
    Refresh { pipeline: String },
    /// Switch between execute-all and individual mode
    Mode { pipeline: String, mode: Mode },
    /// Edit a text field
    Set {
        pipeline: String,
        field: PipelineField,
        value: String,
    },
    /// Select the target version
    Version { pipeline: String, version: String },
    /// Derive the feature branch from a ticket
    Ticket { pipeline: String, ticket: String },
    /// Select or deselect every item of one kind
    Select {
        pipeline: String,
        target: SelectTarget,
        #[arg(long)]
        off: bool,
    },
    /// Run a single phase (individual mode)
    Run { pipeline: String, phase: String },
    /// Run every phase in order (execute-all mode)
    ExecuteAll { pipeline: String },
    /// Fetch pull request build statuses
    Builds {
        pipeline: String,
        /// Keep polling until interrupted
        #[arg(long)]
        watch: bool,
    },
}

#[derive(Subcommand, Clone)]
pub enum WorkspaceCommands {
    Show,
    AddProject { name: String },
    RemoveProject { name: String },
    /// Select or deselect a repository
    Toggle { project: String, repo: String },
    Set { field: WorkspaceField, value: String },
    CreateBranches,
    CreatePrs,
    Builds {
        project: String,
        #[arg(long)]
        watch: bool,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show effective configuration
    Show,
    /// Validate configuration and show any problems
    Validate,
    /// Write a default depflow.toml
    Init,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum Mode {
    ExecuteAll,
    Individual,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum PipelineField {
    FromBranch,
    NewBranch,
    PrFromBranch,
    ToBranch,
    UpdateFileBranch,
    CommitMessage,
    PrTitle,
    PrDescription,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum SelectTarget {
    /// Repositories for branch creation
    Branches,
    /// Repositories for pull requests
    Prs,
    /// Applications for the file update
    Apps,
    /// Updated files for the commit
    Files,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum WorkspaceField {
    FromBranch,
    NewBranch,
    PrFromBranch,
    PrToBranch,
    PrTitle,
    PrDescription,
}

fn init_tracing(quiet: bool) {
    let default_level = if quiet { "warn" } else { "info" };
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| default_level.into()),
            )
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_writer(std::io::stderr)
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| default_level.into()),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.quiet);

    match &cli.command {
        Commands::Config { command } => cmd::cmd_config(&cli, command.clone())?,
        Commands::Login { username, token } => cmd::cmd_login(&cli, username, token).await?,
        Commands::Logout => cmd::cmd_logout(&cli).await?,
        Commands::Status => cmd::cmd_status(&cli).await?,
        Commands::Reset { force } => cmd::cmd_reset(&cli, *force)?,
        Commands::Deps { command } => cmd::cmd_deps(&cli, command.clone()).await?,
        Commands::Pipeline { command } => cmd::cmd_pipeline(&cli, command.clone()).await?,
        Commands::Workspace { command } => cmd::cmd_workspace(&cli, command.clone()).await?,
    }

    Ok(())
}
