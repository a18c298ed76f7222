//! CLI tool for setting Unity package icons.

mod commands;
mod exit_codes;
mod output;

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use std::path::PathBuf;

use exit_codes::ExitCode;

/// Set the thumbnail of a Unity package
#[derive(Parser)]
#[command(name = "iconpack")]
#[command(author, version, about = "Set the thumbnail of a Unity package", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, short = 'f', value_enum, default_value = "human", global = true)]
    format: OutputFormat,

    /// Suppress progress output
    #[arg(long, short = 'q', global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Replace the icon of a package (alias: s)
    #[command(alias = "s")]
    Set {
        /// Package to modify (.unitypackage)
        #[arg(short = 'p', long, env = "INPUT_PACKAGE_PATH")]
        package: Option<PathBuf>,

        /// Icon to embed (.png)
        #[arg(short = 'i', long, env = "INPUT_ICON_PATH")]
        icon: PathBuf,

        /// What to do when the icon is missing: fail, warn or ignore
        #[arg(long, env = "INPUT_ICON_NOT_FOUND_BEHAVIOR", default_value = "fail")]
        icon_not_found: String,

        /// What to do when the package is missing: fail, warn or ignore
        #[arg(long, env = "INPUT_PACKAGE_NOT_FOUND_BEHAVIOR", default_value = "fail")]
        package_not_found: String,

        /// Compression level (0-9)
        #[arg(short = 'l', long, default_value = "6", value_parser = clap::value_parser!(u32).range(0..=9))]
        level: u32,

        /// Fixed modification time for the icon entry, in seconds since the epoch
        #[arg(long)]
        mtime: Option<u64>,

        /// Directory for the temporary workspace
        #[arg(long)]
        temp_dir: Option<PathBuf>,
    },

    /// List package contents (alias: l)
    #[command(alias = "l")]
    List {
        /// Package to list
        package: PathBuf,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    /// GitHub Actions workflow annotations
    Github,
}

fn main() {
    // Set up Ctrl+C handler
    ctrlc::set_handler(move || {
        eprintln!("\nInterrupted");
        std::process::exit(exit_codes::USER_INTERRUPT);
    })
    .ok();

    let cli = Cli::parse();

    let default_filter = if cli.quiet { "error" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_target(false)
        .init();

    let exit_code = match cli.command {
        Commands::Set {
            package,
            icon,
            icon_not_found,
            package_not_found,
            level,
            mtime,
            temp_dir,
        } => match commands::resolve_package_path(package) {
            Some(package) => commands::set(&commands::SetConfig {
                package: &package,
                icon: &icon,
                icon_not_found: &icon_not_found,
                package_not_found: &package_not_found,
                level,
                mtime,
                temp_dir: temp_dir.as_deref(),
                format: cli.format,
                quiet: cli.quiet,
            }),
            None => {
                eprintln!("Error: a package path is required (--package or INPUT_PACKAGE_PATH)");
                ExitCode::BadArgs
            }
        },

        Commands::List { package } => commands::list(&package, cli.format, cli.quiet),

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut std::io::stdout());
            ExitCode::Success
        }
    };

    std::process::exit(exit_code.code());
}
