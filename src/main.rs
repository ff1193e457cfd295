use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use lazybeads::config::{self, Config};
use lazybeads::tracker::{BdClient, Tracker};
use lazybeads::tui::app::matches_query;
use lazybeads::tui::panel::{PanelFocus, Panels};
use lazybeads::{logging, tui};

#[derive(Parser)]
#[command(
    name = "lazybeads",
    version = env!("LAZYBEADS_VERSION"),
    about = "Terminal dashboard for beads issues"
)]
struct Cli {
    /// Config file (default: <config dir>/lazybeads/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Tracker program to run instead of the configured one
    #[arg(long, global = true)]
    bd: Option<String>,

    /// Directory the tracker program runs in
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the TUI dashboard (default)
    Dashboard,
    /// Print tasks grouped by panel
    List {
        /// Only show tasks matching every whitespace-separated term
        #[arg(short, long, default_value = "")]
        filter: String,
    },
    /// Print the configured custom commands
    Commands,
    /// Print the config file path
    ConfigPath,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => config::load_from(path)?,
        None => config::load()?,
    };

    match cli.command.unwrap_or(Commands::Dashboard) {
        Commands::Dashboard => {
            let (log_path, _guard) = logging::init()?;
            tracing::info!(log = %log_path.display(), "starting dashboard");
            let tracker = build_tracker(&config, cli.bd, cli.dir);
            tui::run(&config, Arc::new(tracker))
        }
        Commands::List { filter } => {
            let tracker = build_tracker(&config, cli.bd, cli.dir);
            print_tasks(&tracker, &filter)
        }
        Commands::Commands => {
            print_commands(&config);
            Ok(())
        }
        Commands::ConfigPath => {
            let path = match cli.config {
                Some(path) => path,
                None => config::config_path()?,
            };
            println!("{}", path.display());
            Ok(())
        }
    }
}

fn build_tracker(config: &Config, bd: Option<String>, dir: Option<PathBuf>) -> BdClient {
    let client = BdClient::new(bd.unwrap_or_else(|| config.bd_program.clone()));
    match dir {
        Some(dir) => client.with_workdir(dir),
        None => client,
    }
}

fn print_tasks(tracker: &dyn Tracker, filter: &str) -> Result<()> {
    let tasks: Vec<_> = tracker
        .list()
        .context("failed to load tasks")?
        .into_iter()
        .filter(|t| matches_query(t, filter))
        .collect();

    let mut panels = Panels::new();
    panels.distribute(&tasks);

    for kind in PanelFocus::ALL {
        let panel = panels.get(kind);
        println!("{} ({})", kind.title(), panel.len());
        for task in &panel.items {
            println!(
                "  {} {} {:<10} {}",
                task.status.symbol(),
                task.priority_label(),
                task.id,
                task.title
            );
        }
    }
    Ok(())
}

fn print_commands(config: &Config) {
    if config.custom_commands.is_empty() {
        println!("No custom commands configured.");
        return;
    }
    for cmd in &config.custom_commands {
        println!(
            "{:<10} {:<8} {}\n{:<19} {}",
            cmd.key,
            cmd.context.as_str(),
            cmd.description,
            "",
            cmd.command
        );
    }
}
