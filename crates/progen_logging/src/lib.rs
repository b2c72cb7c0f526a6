//! Shared logging utilities for progen binaries.
//!
//! Console output always goes to stderr so that nothing interferes with
//! tools reading stdout. A rolling file layer is added when a log directory
//! is configured.

use anyhow::{Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "progen=warn";
const VERBOSE_LOG_FILTER: &str = "progen=debug";
const ROTATED_LOG_FILES: usize = 4;
const MAX_LOG_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Logging configuration shared by progen binaries.
#[derive(Debug, Clone, Default)]
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    pub verbose: bool,
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    pub filter: Option<&'a str>,
    /// Directory for the rolling log file. No file output when `None`.
    pub log_dir: Option<&'a Path>,
}

impl LogConfig<'_> {
    /// Pick the filter directive: `RUST_LOG` wins, then the configured
    /// directive, then the verbosity default.
    fn env_filter(&self) -> EnvFilter {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return filter;
        }
        let directive = match self.filter {
            Some(filter) => filter,
            None if self.verbose => VERBOSE_LOG_FILTER,
            None => DEFAULT_LOG_FILTER,
        };
        EnvFilter::new(directive)
    }
}

/// Initialize tracing with stderr output and an optional rolling file writer.
pub fn init_logging(config: LogConfig<'_>) -> Result<()> {
    let console_filter = config.env_filter();

    let file_layer = match config.log_dir {
        Some(dir) => {
            let log_file = LogFile::open(dir, config.app_name, DEFAULT_ROTATION)
                .with_context(|| format!("Failed to open log file in {}", dir.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_writer(Mutex::new(log_file))
                    .with_ansi(false)
                    .with_filter(config.env_filter()),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(console_filter),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

/// Get the progen home directory: `$PROGEN_HOME` or `~/.progen`.
///
/// Falls back to `.progen` in the working directory when no home directory
/// can be determined.
pub fn progen_home() -> PathBuf {
    if let Some(override_path) = std::env::var_os("PROGEN_HOME") {
        return PathBuf::from(override_path);
    }
    dirs::home_dir()
        .map(|home| home.join(".progen"))
        .unwrap_or_else(|| PathBuf::from(".progen"))
}

/// Size cap and number of older generations kept for the log file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Rotation {
    max_bytes: u64,
    /// Older generations, `<name>.log.1` (newest) to `<name>.log.<keep>`.
    keep: usize,
}

const DEFAULT_ROTATION: Rotation = Rotation {
    max_bytes: MAX_LOG_FILE_SIZE,
    keep: ROTATED_LOG_FILES,
};

/// Append-only log file that rolls over once it reaches `max_bytes`.
struct LogFile {
    path: PathBuf,
    rotation: Rotation,
    file: File,
    written: u64,
}

impl LogFile {
    fn open(dir: &Path, app_name: &str, rotation: Rotation) -> io::Result<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.log", sanitize_name(app_name)));
        let (file, written) = open_append(&path)?;
        let mut log = Self {
            path,
            rotation,
            file,
            written,
        };
        if log.written > rotation.max_bytes {
            log.roll()?;
        }
        Ok(log)
    }

    fn generation(&self, n: usize) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(format!(".{}", n));
        PathBuf::from(name)
    }

    /// Age every generation by one, dropping the oldest, and start a fresh
    /// live file. With `keep == 0` the live file is simply truncated.
    fn roll(&mut self) -> io::Result<()> {
        self.file.flush()?;

        if self.rotation.keep == 0 {
            remove_if_exists(&self.path)?;
        } else {
            remove_if_exists(&self.generation(self.rotation.keep))?;
            for n in (1..self.rotation.keep).rev() {
                rename_if_exists(&self.generation(n), &self.generation(n + 1))?;
            }
            rename_if_exists(&self.path, &self.generation(1))?;
        }

        let (file, written) = open_append(&self.path)?;
        self.file = file;
        self.written = written;
        Ok(())
    }
}

impl Write for LogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // A single oversized record still goes into an empty file.
        if self.written > 0 && self.written + buf.len() as u64 > self.rotation.max_bytes {
            self.roll()?;
        }
        let n = self.file.write(buf)?;
        self.written += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

fn open_append(path: &Path) -> io::Result<(File, u64)> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let len = file.metadata()?.len();
    Ok((file, len))
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

fn rename_if_exists(from: &Path, to: &Path) -> io::Result<()> {
    match fs::rename(from, to) {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

fn sanitize_name(name: &str) -> String {
    let sanitized: String = name
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
        .collect();
    if sanitized.is_empty() {
        "progen".to_string()
    } else {
        sanitized
    }
}
