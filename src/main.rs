//! cini reads and writes one value at a time in INI-style files,
//! leaving every other line of the file exactly as it was.
use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use cini::builders::validator::{EntryValidator, StandardValidator};
use cini::core::config::{ConfigManager, ConfigProvider, Settings};
use cini::core::version;
use cini::utils;
use env_logger::Env;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "cini")]
#[command(about = "Read and write single values in INI-style files")]
#[command(disable_version_flag = true)]
struct Cli {
    /// Print version information
    #[arg(short = 'v', long = "version")]
    version: bool,

    /// Settings file (TOML) controlling line endings and staging
    #[arg(long, global = true, env = "CINI_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the value of KEY in GROUP, or DEFAULT if it does not exist
    Get {
        path: PathBuf,
        group: String,
        key: String,
        #[arg(value_name = "DEFAULT", allow_hyphen_values = true)]
        default_value: String,
    },
    /// Set KEY in GROUP to VALUE, creating the file and group if needed
    Set {
        path: PathBuf,
        group: String,
        key: String,
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// Remove KEY from GROUP
    Rm {
        path: PathBuf,
        group: String,
        key: String,
    },
}

fn load_settings(config: Option<PathBuf>) -> Result<Settings> {
    match config {
        Some(path) => {
            let manager = ConfigManager::new_at(path);
            let config_path = manager.get_config_path()?;
            manager
                .load_config()
                .with_context(|| format!("Invalid settings in {}", config_path.display()))
        }
        None => Ok(Settings::default()),
    }
}

fn run(command: Commands, settings: &Settings) -> Result<()> {
    match command {
        Commands::Get {
            path,
            group,
            key,
            default_value,
        } => {
            println!(
                "{}",
                utils::get_value(&path, &group, &key, &default_value, settings)
            );
        }
        Commands::Set {
            path,
            group,
            key,
            value,
        } => {
            let issues = StandardValidator::new().validate_entry(&group, &key, &value);
            if !issues.is_empty() {
                for issue in &issues {
                    eprintln!("⚠️  {issue}");
                }
                bail!("Refusing to write [{group}] {key}");
            }
            if !utils::set_value(&path, &group, &key, &value, settings) {
                bail!("Failed to write {}", path.display());
            }
        }
        Commands::Rm { path, group, key } => {
            utils::remove_value(&path, &group, &key, settings);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init_from_env(Env::default().filter_or("CINI_LOG", "warn"));

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            // Help output is not an error.
            return if err.use_stderr() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    if cli.version {
        version::run();
        return ExitCode::SUCCESS;
    }

    let Some(command) = cli.command else {
        eprintln!("Invalid number of arguments. Use '--help' for instructions.");
        return ExitCode::from(1);
    };

    let result = load_settings(cli.config).and_then(|settings| run(command, &settings));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(1)
        }
    }
}
