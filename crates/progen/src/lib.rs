//! progen - qmake project generator for loose C/C++ trees
//!
//! Scans the directory that will hold the project file, sorts every header
//! and source below it, and writes a minimal `.pro` file that lets an IDE
//! open the folder as a project.
//!
//! # Flow
//!
//! ```text
//! ┌──────────┐     ┌───────────────────┐     ┌─────────┐     ┌───────────────┐
//! │ Options  │────▶│ ProjectDescriptor │────▶│ Scanner │────▶│ ProjectWriter │
//! │ (output) │     │ (root = parent)   │     │ (rules) │     │ (.pro file)   │
//! └──────────┘     └───────────────────┘     └─────────┘     └───────────────┘
//! ```

pub mod args;
pub mod classify;
pub mod config;
pub mod error;
pub mod paths;
pub mod project;
pub mod scanner;
pub mod writer;

// Re-exports for convenience
pub use args::{CliOption, Occurrence, Options};
pub use classify::{ClassifyRules, FileKind};
pub use config::ProgenConfig;
pub use error::{ProgenError, Result};
pub use project::ProjectDescriptor;
pub use scanner::{IssueKind, ScanConfig, ScanIssue, ScanMode, ScanResult, ScanStats, Scanner};
pub use writer::{ProjectWriter, WriteSummary};

use std::path::Path;

/// Scan the directory containing `output_path` and write the project file.
pub fn generate(output_path: &Path, config: &ScanConfig) -> Result<WriteSummary> {
    let mut project = ProjectDescriptor::new(output_path)?;
    project.enumerate(&Scanner::with_config(config.clone()))?;
    ProjectWriter::new().write(project)
}
