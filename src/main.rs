use anyhow::Result;
use clap::{Parser, Subcommand};
use conveyor::commands::{run, tick, watch};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "conveyor")]
#[command(about = "Unattended CSV intake, mirroring, and supervision pipeline", long_about = None)]
#[command(version)]
struct Cli {
    /// Raise the console log level to debug
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one intake pass and one mirror pass, then exit
    Tick {
        /// Path to the configuration file
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Run the scheduler loop in the foreground until signalled
    Run {
        /// Path to the configuration file
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Supervise the scheduler, restarting it after crashes, with a live console
    Watch {
        /// Path to the configuration file
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Tick { config } => tick::execute(&config, cli.verbose),
        Commands::Run { config } => run::execute(&config, cli.verbose),
        Commands::Watch { config } => watch::execute(&config, cli.verbose),
    }
}
