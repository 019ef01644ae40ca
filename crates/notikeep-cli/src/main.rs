use std::path::PathBuf;

use clap::{Parser, Subcommand};
use notikeep_cli::cli::{run, CliCommand, CliConfig};
use notikeep_core::tracing_setup::init_tracing;

#[derive(Parser)]
#[command(name = "notikeep")]
#[command(about = "Capture, deduplicate and browse notification threads")]
struct Cli {
    /// Pretty-print JSON output
    #[arg(long, short)]
    pretty: bool,

    /// Path to JSON config file (dataDir, queueCapacity, dedupWindowSecs, appNames)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Directory holding the notification database (overrides the config file)
    #[arg(long, short = 'd')]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest raw notifications, one JSON object per line
    Ingest {
        /// Input file (stdin when omitted)
        file: Option<PathBuf>,
    },

    /// List conversation threads, newest first
    Groups,

    /// Show every notification in a thread
    Thread {
        /// Thread key as printed by `groups`
        thread_key: String,
    },

    /// Mark every notification in a thread as read
    MarkRead {
        thread_key: String,
    },

    /// Delete one notification
    Delete {
        id: i64,
    },

    /// Delete all notifications
    Clear,

    /// Insert sample notifications into an empty database
    Seed,
}

impl From<Commands> for CliCommand {
    fn from(command: Commands) -> Self {
        match command {
            Commands::Ingest { file } => CliCommand::Ingest { input: file },
            Commands::Groups => CliCommand::Groups,
            Commands::Thread { thread_key } => CliCommand::Thread { thread_key },
            Commands::MarkRead { thread_key } => CliCommand::MarkRead { thread_key },
            Commands::Delete { id } => CliCommand::Delete { id },
            Commands::Clear => CliCommand::Clear,
            Commands::Seed => CliCommand::Seed,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = init_tracing("warn") {
        eprintln!("Logging disabled: {}", e);
    }

    let config = match &cli.config {
        Some(path) => match CliConfig::load(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {:#}", e);
                std::process::exit(1);
            }
        },
        None => CliConfig::default(),
    };

    let result = run(cli.command.into(), &config, cli.data_dir.as_deref());

    match result {
        Ok(value) => {
            let output = if cli.pretty {
                serde_json::to_string_pretty(&value)
            } else {
                serde_json::to_string(&value)
            };
            match output {
                Ok(text) => println!("{}", text),
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
