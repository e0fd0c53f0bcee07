// SPDX-License-Identifier: AGPL-3.0-or-later
//! File Driver Kit CLI
//!
//! Runs one storage operation against a driver chosen by name at runtime.

mod commands;
mod error;
mod profile;

use clap::{Args, Parser, Subcommand};
use console::style;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use error::{CliError, CliResult};
use profile::Profiles;

#[derive(Parser)]
#[command(name = "fdk")]
#[command(author, version, about = "File Driver Kit - one interface for every storage backend", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[command(flatten)]
    target: TargetArgs,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct TargetArgs {
    /// Driver name (see `fdk drivers`)
    #[arg(short, long, global = true)]
    driver: Option<String>,

    /// Profile from the profiles file
    #[arg(short, long, global = true)]
    profile: Option<String>,

    /// Profiles file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Driver option as key=value (repeatable)
    #[arg(short = 'o', long = "opt", global = true, value_parser = profile::parse_option)]
    options: Vec<(String, String)>,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered drivers
    Drivers,

    /// Check whether a path exists
    Exists {
        path: String,
    },

    /// Display file contents
    Cat {
        /// File to display
        path: String,
    },

    /// List directory contents
    #[command(alias = "dir")]
    Ls {
        /// Directory to list
        #[arg(default_value = "/")]
        path: String,

        /// Print entries as JSON
        #[arg(long)]
        json: bool,
    },

    /// Create a new file (fails if it exists)
    Put {
        /// Destination path
        path: String,

        /// Local file to upload (stdin if omitted)
        file: Option<PathBuf>,
    },

    /// Create or overwrite a file
    Update {
        /// Destination path
        path: String,

        /// Local file to upload (stdin if omitted)
        file: Option<PathBuf>,
    },

    /// Create directories
    Mkdir {
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Remove directories and their contents
    Rmdir {
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Remove files
    Rm {
        #[arg(required = true)]
        paths: Vec<String>,
    },

    /// Move or rename a file
    Mv {
        source: String,
        dest: String,
    },

    /// Copy a file
    Cp {
        source: String,
        dest: String,
    },
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "warn" }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_profiles(target: &TargetArgs) -> CliResult<Profiles> {
    match &target.config {
        Some(path) => Profiles::load(path),
        None => match profile::default_profiles_path() {
            Some(path) if path.exists() => Profiles::load(&path),
            _ => Ok(Profiles::default()),
        },
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let registry = fdk_providers::default_registry();

    if let Commands::Drivers = cli.command {
        return commands::drivers(&registry);
    }

    let target = &cli.target;
    let profiles = match target.profile {
        Some(_) => load_profiles(target)?,
        None => Profiles::default(),
    };
    let profile = match target.profile.as_deref() {
        Some(name) => Some(
            profiles
                .profiles
                .get(name)
                .ok_or_else(|| CliError::UnknownProfile(name.to_string()))?,
        ),
        None => None,
    };

    let (name, config) = profile::resolve(target.driver.as_deref(), profile, &target.options)?;
    let driver = registry.new_driver(&name, &config)?;
    let driver = driver.as_ref();

    match cli.command {
        Commands::Drivers => Ok(()),
        Commands::Exists { path } => commands::exists(driver, &path).await,
        Commands::Cat { path } => commands::cat(driver, &path).await,
        Commands::Ls { path, json } => commands::ls(driver, &path, json).await,
        Commands::Put { path, file } => commands::put(driver, &path, file.as_deref()).await,
        Commands::Update { path, file } => commands::update(driver, &path, file.as_deref()).await,
        Commands::Mkdir { paths } => commands::mkdir(driver, &paths).await,
        Commands::Rmdir { paths } => commands::rmdir(driver, &paths).await,
        Commands::Rm { paths } => commands::rm(driver, &paths).await,
        Commands::Mv { source, dest } => commands::mv(driver, &source, &dest).await,
        Commands::Cp { source, dest } => commands::cp(driver, &source, &dest).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {e}", style("Error:").red().bold());
            ExitCode::FAILURE
        }
    }
}
