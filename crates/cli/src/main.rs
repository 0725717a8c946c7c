//! MCPIDE CLI - decompile, remap and highlight Minecraft sources

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mcpide_core::Config;
use std::path::PathBuf;

mod commands;
mod console;
mod logging;

use commands::{cmd_config_init, cmd_config_show, cmd_decompile, cmd_export, cmd_highlight, cmd_rename};
use logging::init_logging;

#[derive(Parser)]
#[command(name = "mcpide")]
#[command(about = "Decompile, remap and highlight Minecraft sources")]
#[command(after_help = "\
QUICK START:
  mcpide config init                          # Initialize project config
  mcpide decompile client.jar                 # Decompile into the project
  mcpide highlight src/Main.java -m srg.csv   # Show a file with mappings applied
  mcpide rename src/Main.java --caret 42      # Rename the symbol at a caret")]
struct Cli {
  /// Project directory (default: current directory)
  #[arg(short, long, global = true)]
  project: Option<PathBuf>,

  /// Write logs to the rolling log file instead of stderr
  #[arg(long, global = true)]
  log_file: bool,

  #[command(subcommand)]
  command: Commands,
}

/// Subcommands for `mcpide config`
#[derive(Subcommand)]
pub enum ConfigCommand {
  /// Show current effective configuration
  #[command(long_about = "Show the current effective configuration.\n\n\
    Displays which config file is being used and its contents as TOML.")]
  Show,

  /// Initialize project config file (.mcpide/config.toml)
  Init,
}

#[derive(Subcommand)]
enum Commands {
  /// Print a source file with mappings applied
  Highlight {
    /// File to open, relative to the project
    file: PathBuf,
    /// Mappings to load first: a searge,name CSV file or an MCP mappings directory
    #[arg(short, long)]
    mappings: Option<PathBuf>,
    /// List every symbol span after the text
    #[arg(long)]
    spans: bool,
  },
  /// Rename the symbol at a caret position
  #[command(after_help = "\
EXAMPLES:
  mcpide rename src/Main.java --caret 42 --to health
  mcpide rename src/Main.java --caret 42 --to health --yes   # Overwrite without asking
  mcpide rename src/Main.java --caret 42                     # Prompt for the new name")]
  Rename {
    /// File to open, relative to the project
    file: PathBuf,
    /// Caret position, in characters of the highlighted text
    #[arg(long)]
    caret: usize,
    /// New name (prompted when omitted)
    #[arg(long)]
    to: Option<String>,
    /// Confirm overwriting an existing mapping
    #[arg(short, long)]
    yes: bool,
    /// CSV mappings to load first
    #[arg(short, long)]
    mappings: Option<PathBuf>,
    /// Don't export mappings after renaming
    #[arg(long)]
    no_export: bool,
  },
  /// Decompile an archive into the project
  Decompile {
    /// Archive to decompile
    archive: PathBuf,
  },
  /// Export the project's mappings
  Export {
    /// CSV mappings to load first
    #[arg(short, long)]
    mappings: Option<PathBuf>,
  },
  /// Manage configuration
  #[command(after_help = "\
CONFIG LOCATIONS:
  Project: .mcpide/config.toml
  User:    ~/.config/mcpide/config.toml")]
  Config {
    #[command(subcommand)]
    command: ConfigCommand,
  },
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();

  let project = match cli.project {
    Some(project) => project,
    None => std::env::current_dir().context("Failed to read current directory")?,
  };
  let config = Config::load_for_project(&project);
  let _guard = init_logging(&config.logging, cli.log_file);

  match cli.command {
    Commands::Highlight { file, mappings, spans } => {
      cmd_highlight(config, &project, mappings.as_deref(), &file, spans).await
    }
    Commands::Rename {
      file,
      caret,
      to,
      yes,
      mappings,
      no_export,
    } => {
      let args = commands::RenameArgs {
        caret,
        to,
        yes,
        export: !no_export,
      };
      cmd_rename(config, &project, mappings.as_deref(), &file, args).await
    }
    Commands::Decompile { archive } => cmd_decompile(config, &project, archive).await,
    Commands::Export { mappings } => cmd_export(config, &project, mappings.as_deref()).await,

    Commands::Config { command } => match command {
      ConfigCommand::Show => cmd_config_show(&project).await,
      ConfigCommand::Init => cmd_config_init(&project).await,
    },
  }
}
