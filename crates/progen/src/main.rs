//! progen command line entry point
//!
//! Usage: `progen [OPTIONS] <output.pro>`. The project root is the directory
//! containing the output file.

use anyhow::{Context, Result};
use progen::args::Occurrence;
use progen::{generate, Options, ProgenConfig, ProgenError};
use progen_logging::{init_logging, progen_home, LogConfig};
use std::path::Path;
use std::process::ExitCode;
use tracing::{debug, error, warn};

const KNOWN_OPTIONS: &[&str] = &[
    "config",
    "strict",
    "include-hidden",
    "no-follow-symlinks",
    "log-dir",
    "verbose",
    "help",
    "version",
];

const USAGE: &str = "\
Generate a qmake project file listing the C/C++ files next to it.

Usage: progen [OPTIONS] <output.pro>

The directory containing <output.pro> is scanned recursively. Flags take the
next argument as their value unless it starts with `--`, so place flags after
the output path.

Options:
  --config <file>        Load settings from a TOML file
  --strict               Fail on unreadable directories and symlink loops
  --include-hidden       Include files and directories starting with '.'
  --no-follow-symlinks   Do not descend into symlinked directories
  --log-dir <dir>        Also write logs to <dir>/progen.log
  --verbose              Debug output on stderr
  --help                 Print this help
  --version              Print the version
";

fn main() -> ExitCode {
    let options = Options::from_env();

    if options.present("help") {
        print!("{}", USAGE);
        return ExitCode::SUCCESS;
    }
    if options.present("version") {
        println!("progen {}", env!("CARGO_PKG_VERSION"));
        return ExitCode::SUCCESS;
    }

    match run(&options) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %format!("{:#}", err), "progen failed");
            eprintln!("ERROR: {:#}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}

fn run(options: &Options) -> Result<()> {
    let output_path = options.output_path()?;

    let explicit_config = options.value("config", Occurrence::Last).map(Path::new);
    let mut config = ProgenConfig::resolve(explicit_config, &progen_home())
        .context("Failed to load configuration")?;
    config.apply_options(options);

    init_logging(LogConfig {
        app_name: "progen",
        verbose: config.logging.verbose,
        filter: config.logging.filter.as_deref(),
        log_dir: config.logging.directory.as_deref(),
    })
    .context("Failed to initialize logging")?;

    for name in options.unknown_names(KNOWN_OPTIONS) {
        warn!(option = %name, "Ignoring unknown option");
    }
    debug!(?config, "Resolved configuration");

    let scan_config = config.scan_config()?;
    let summary = generate(&output_path, &scan_config)?;
    debug!(
        output = %summary.output_path.display(),
        headers = summary.headers,
        sources = summary.sources,
        "Done"
    );
    Ok(())
}

/// Exit code of the first `ProgenError` in the chain, 1 otherwise.
fn exit_code(err: &anyhow::Error) -> u8 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<ProgenError>())
        .map(ProgenError::exit_code)
        .unwrap_or(1)
}
