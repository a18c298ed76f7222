//! Command implementations for the CLI tool.

use std::path::{Path, PathBuf};

use iconpack::{
    EntryTime, GzipCodec, GzipOptions, InputKind, MissingFilePolicy, PipelineOptions, Reporter,
};

use crate::OutputFormat;
use crate::exit_codes::{ExitCode, error_to_exit_code};
use crate::output::{ConsoleReporter, create_formatter};

/// Configuration for the set command.
pub struct SetConfig<'a> {
    pub package: &'a Path,
    pub icon: &'a Path,
    pub icon_not_found: &'a str,
    pub package_not_found: &'a str,
    pub level: u32,
    pub mtime: Option<u64>,
    pub temp_dir: Option<&'a Path>,
    pub format: OutputFormat,
    pub quiet: bool,
}

/// Set command implementation
pub fn set(config: &SetConfig<'_>) -> ExitCode {
    let reporter = ConsoleReporter::new(config.format, config.quiet);

    let options = match build_options(config) {
        Ok(options) => options,
        Err(e) => {
            reporter.fatal(&e.to_string());
            return error_to_exit_code(&e);
        }
    };

    let codec = GzipCodec::new().with_options(GzipOptions::with_level(config.level));
    match iconpack::run_with(&options, &reporter, &codec) {
        Ok(outcome) => {
            if !config.quiet || config.format == OutputFormat::Json {
                let formatter = create_formatter(config.format);
                print!("{}", formatter.format_outcome(config.package, &outcome));
                if config.format == OutputFormat::Json {
                    println!();
                }
            }
            ExitCode::Success
        }
        // Already reported by the pipeline.
        Err(e) => error_to_exit_code(&e),
    }
}

/// Resolves policy strings (icon first) and assembles pipeline options.
fn build_options(config: &SetConfig<'_>) -> iconpack::Result<PipelineOptions> {
    let icon_policy = MissingFilePolicy::resolve(InputKind::Icon, config.icon_not_found)?;
    let package_policy =
        MissingFilePolicy::resolve(InputKind::Package, config.package_not_found)?;

    let mut options = PipelineOptions::new(config.package, config.icon)
        .icon_missing(icon_policy)
        .package_missing(package_policy)
        .compression_level(config.level);
    if let Some(secs) = config.mtime {
        options = options.mtime(EntryTime::Fixed(secs));
    }
    if let Some(dir) = config.temp_dir {
        options = options.workspace_root(dir);
    }
    Ok(options)
}

/// List command implementation
pub fn list(package: &Path, format: OutputFormat, quiet: bool) -> ExitCode {
    let reporter = ConsoleReporter::new(format, quiet);
    match iconpack::list_package(package, &GzipCodec::new()) {
        Ok(entries) => {
            let formatter = create_formatter(format);
            print!("{}", formatter.format_list(package, &entries));
            if format == OutputFormat::Json {
                println!();
            }
            ExitCode::Success
        }
        Err(e) => {
            reporter.fatal(&e.to_string());
            error_to_exit_code(&e)
        }
    }
}

/// Picks the package path from the flag, its environment binding, or the
/// legacy `INPUT_UNITYPACKAGE_PATH` variable.
pub fn resolve_package_path(package: Option<PathBuf>) -> Option<PathBuf> {
    package.or_else(|| {
        std::env::var_os("INPUT_UNITYPACKAGE_PATH")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    })
}
