use anyhow::Result;
use clap::{Parser, Subcommand};
use grafana_ops::{
    cli::{self, Session},
    console::StdinPrompter,
    runner::ProcessRunner,
    settings::Settings,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "grafana-ops")]
#[command(about = "Operations console for a Kind-hosted Grafana stack", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Directory holding manifests and the optional .env file
    #[arg(long, global = true, env = "GRAFANA_OPS_CONFIG_DIR", default_value = "config")]
    config_dir: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive menu (default)
    Menu,

    /// Run every health check; exits non-zero unless all pass
    Health,

    /// Trigger a database backup and wait for it
    Backup,

    /// List backup archives on the backup volume
    Backups,

    /// Restore the database from a chosen backup
    Restore,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_writer(std::io::stderr)
            .init();
    }

    let settings = Settings::load(&cli.config_dir)?;
    tracing::debug!("Loaded settings from {}", cli.config_dir.display());

    let runner = ProcessRunner::new(settings.timeouts.command)?;
    runner.listen_for_interrupts();
    let prompter = StdinPrompter::new();

    let session = Session {
        settings: &settings,
        runner: &runner,
        prompter: &prompter,
        interrupt: Some(runner.interrupt()),
    };

    match cli.command.unwrap_or(Commands::Menu) {
        Commands::Menu => cli::menu::run(&session)?,
        Commands::Health => {
            if !cli::health::execute(&session)? {
                std::process::exit(1);
            }
        }
        Commands::Backup => cli::backup::execute_backup(&session)?,
        Commands::Backups => cli::backup::execute_list(&session)?,
        Commands::Restore => cli::backup::execute_restore(&session)?,
    }

    Ok(())
}
