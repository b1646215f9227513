use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "focusnest", version, about = "Focusnest CLI")]
struct Cli {
    /// Owner id (defaults to the configured owner)
    #[arg(long, global = true)]
    owner: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Focus timer control
    Timer {
        #[command(subcommand)]
        action: commands::timer::TimerAction,
    },
    /// Incubating eggs
    Eggs {
        #[command(subcommand)]
        action: commands::eggs::EggsAction,
    },
    /// Hatched birds
    Aviary {
        #[command(subcommand)]
        action: commands::aviary::AviaryAction,
    },
    /// Cumulative focus statistics
    Stats,
    /// Species catalog
    Catalog {
        #[command(subcommand)]
        action: commands::catalog::CatalogAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Administrative shortcuts
    Admin {
        #[command(subcommand)]
        action: commands::admin::AdminAction,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("FOCUSNEST_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    init_logging();
    let cli = Cli::parse();
    let owner = cli.owner;
    let result = match cli.command {
        Commands::Timer { action } => commands::timer::run(action, owner).await,
        Commands::Eggs { action } => commands::eggs::run(action, owner).await,
        Commands::Aviary { action } => commands::aviary::run(action, owner).await,
        Commands::Stats => commands::stats::run(owner).await,
        Commands::Catalog { action } => commands::catalog::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Admin { action } => commands::admin::run(action, owner).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
