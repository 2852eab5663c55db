use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use futures::executor::block_on;

use pocket_ledger::cli::{handle_ledger_command, run_shell, LedgerCommands};
use pocket_ledger::config::paths::{LedgerPaths, DATA_DIR_ENV};
use pocket_ledger::config::settings::Settings;
use pocket_ledger::services::{LoadStatus, ReconciliationController};
use pocket_ledger::storage::{open_file_store, FileStore};

#[derive(Parser)]
#[command(
    name = "pocket",
    author = "Kaylee Beyene",
    version,
    about = "Personal income and expense ledger",
    long_about = "pocket keeps a list of income and expense transactions with a \
                  running balance. Every change is saved immediately, and a reset \
                  can be undone once from the interactive shell."
)]
struct Cli {
    /// Directory holding settings and ledger data
    #[arg(long, global = true, env = DATA_DIR_ENV)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Ledger(LedgerCommands),

    /// Start an interactive session (reset confirmation and undo)
    #[command(alias = "repl")]
    Shell,

    /// Write the default settings file
    Init,

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    pocket_ledger::init_tracing();

    // Initialize paths and settings
    let paths = match cli.data_dir {
        Some(dir) => LedgerPaths::with_base_dir(dir),
        None => LedgerPaths::new()?,
    };
    let settings = Settings::load_or_create(&paths)?;

    match cli.command {
        Some(Commands::Ledger(cmd)) => {
            let mut controller = start_controller(&paths)?;
            block_on(handle_ledger_command(&mut controller, &settings, cmd))?;
        }
        Some(Commands::Shell) => {
            let mut controller = start_controller(&paths)?;
            let stdin = std::io::stdin();
            let mut stdout = std::io::stdout();
            block_on(run_shell(&mut controller, &settings, stdin.lock(), &mut stdout))?;
        }
        Some(Commands::Init) => {
            println!("Initializing pocket ledger at: {}", paths.base_dir().display());
            paths.ensure_directories()?;
            settings.save(&paths)?;
            println!("Initialization complete!");
            println!();
            println!("Edit {} to change the currency symbol,", paths.settings_file().display());
            println!("date format or suggested categories.");
        }
        Some(Commands::Config) => {
            println!("Pocket Ledger Configuration");
            println!("===========================");
            println!("Base directory: {}", paths.base_dir().display());
            println!("Settings file:  {}", paths.settings_file().display());
            println!("Ledger store:   {}", paths.store_file().display());
            println!();
            println!("Settings:");
            println!("  Currency symbol: {}", settings.currency_symbol);
            println!("  Date format:     {}", settings.date_format);
        }
        None => {
            println!("pocket - personal income and expense ledger");
            println!();
            println!("Run 'pocket --help' for usage information.");
            println!("Run 'pocket shell' to start an interactive session.");
        }
    }

    Ok(())
}

fn start_controller(paths: &LedgerPaths) -> Result<ReconciliationController<FileStore>> {
    let mut controller = ReconciliationController::new(open_file_store(paths)?);
    if let LoadStatus::SessionOnly(e) = block_on(controller.start()) {
        eprintln!("Warning: could not load the saved ledger ({}).", e);
        eprintln!("Changes in this session will not be saved.");
    }
    Ok(controller)
}
