//! Project descriptor: output destination plus the classified files.

use crate::classify::FileKind;
use crate::error::Result;
use crate::paths::{absolutize, validate_project_root};
use crate::scanner::{ScanResult, Scanner};
use std::path::{Path, PathBuf};
use tracing::info;

/// A project about to be written.
///
/// The root is the directory containing the output file. It is fixed before
/// scanning and is the base for relative paths in the generated file.
#[derive(Debug, Clone)]
pub struct ProjectDescriptor {
    root_dir: PathBuf,
    output_path: PathBuf,
    result: ScanResult,
}

impl ProjectDescriptor {
    /// Create a descriptor for `output_path`.
    ///
    /// Fails with `InvalidProjectRoot` when the containing directory does not
    /// exist.
    pub fn new(output_path: &Path) -> Result<Self> {
        let output_path = absolutize(output_path)?;
        let root_dir = output_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| output_path.clone());
        validate_project_root(&root_dir)?;

        Ok(Self {
            root_dir,
            output_path,
            result: ScanResult::default(),
        })
    }

    /// Scan the project root and store the result, replacing any earlier one.
    pub fn enumerate(&mut self, scanner: &Scanner) -> Result<&ScanResult> {
        info!(
            root = %self.root_dir.display(),
            output = %self.output_path.display(),
            "Enumerating project files"
        );
        self.result = scanner.scan(&self.root_dir)?;
        Ok(&self.result)
    }

    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    pub fn result(&self) -> &ScanResult {
        &self.result
    }

    /// Absolute paths of the given kind.
    pub fn files(&self, kind: FileKind) -> &[PathBuf] {
        self.result.files(kind)
    }
}
