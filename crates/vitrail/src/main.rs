//! # vitrail
//!
//! Developer CLI for the Vitrail runtime.
//!
//! Exposes the pure parts of the runtime (class reconciliation, preview
//! placement, palette previews, configuration) for inspection from a
//! terminal.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;

#[derive(Parser)]
#[command(name = "vitrail")]
#[command(about = "Widget and palette runtime for visual page editors", long_about = None)]
#[command(version)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Reconcile a class attribute against managed class families
    #[command(visible_alias = "atelier")]
    Reconcile(commands::reconcile::ReconcileArgs),

    /// Compute where a hover preview is placed
    Place(commands::place::PlaceArgs),

    /// Render the hover preview of a palette entry
    #[command(visible_alias = "musea")]
    Preview(commands::preview::PreviewArgs),

    /// Print the effective configuration
    Config(commands::config::ConfigArgs),
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .with_max_level(level)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Reconcile(args) => commands::reconcile::run(args),
        Commands::Place(args) => commands::place::run(args),
        Commands::Preview(args) => commands::preview::run(args),
        Commands::Config(args) => commands::config::run(args),
    };

    match result {
        Ok(output) => println!("{}", output),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}
