use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod plan;

#[derive(Parser)]
#[command(name = "slotplan", version, about = "Place a task backlog into calendar slots")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Schedule a plan file and print the result as JSON
    Schedule(commands::schedule::ScheduleArgs),
    /// Compare a plan's backlog with its free slot time
    Capacity(commands::capacity::CapacityArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Schedule(args) => commands::schedule::run(args),
        Commands::Capacity(args) => commands::capacity::run(args),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
