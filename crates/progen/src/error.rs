//! Error types for project generation

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Progen error type
#[derive(Error, Debug)]
pub enum ProgenError {
    #[error("Output file name is not present on the command line")]
    MissingOutputArgument,

    #[error("The project path does not exist: {}", .0.display())]
    InvalidProjectRoot(PathBuf),

    #[error("Failed to open the output file for writing: {}", .path.display())]
    OutputWriteFailure {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Cannot read directory {}: {message}", .path.display())]
    DirectoryUnreadable { path: PathBuf, message: String },

    #[error("Symlink loop at {} (points back to {})", .path.display(), .ancestor.display())]
    SymlinkLoop { path: PathBuf, ancestor: PathBuf },

    #[error("Config error: {0}")]
    Config(String),

    #[error("Pattern error: {0}")]
    Pattern(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ProgenError {
    /// Process exit code reported for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            ProgenError::MissingOutputArgument => 2,
            ProgenError::InvalidProjectRoot(_) => 3,
            ProgenError::OutputWriteFailure { .. } => 4,
            ProgenError::Config(_) | ProgenError::Pattern(_) => 5,
            ProgenError::DirectoryUnreadable { .. } | ProgenError::SymlinkLoop { .. } => 6,
            ProgenError::Io(_) => 1,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ProgenError>;
