//! qmake project file serialization.
//!
//! Output shape:
//!
//! ```text
//! TEMPLATE = app
//!
//! HEADERS = \
//!   include/a.h \
//!   src/b.h
//!
//! SOURCES = \
//!   src/b.cpp
//! ```

use crate::classify::FileKind;
use crate::error::{ProgenError, Result};
use crate::paths::{relative_to, to_forward_slashes};
use crate::project::ProjectDescriptor;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const TEMPLATE_LINE: &str = "TEMPLATE = app";

/// What a write produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteSummary {
    pub output_path: PathBuf,
    pub headers: usize,
    pub sources: usize,
    pub bytes: usize,
}

/// Serializes project descriptors into qmake `.pro` files.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProjectWriter;

impl ProjectWriter {
    pub fn new() -> Self {
        Self
    }

    /// Render the project file text.
    pub fn render(&self, project: &ProjectDescriptor) -> String {
        let mut out = String::new();
        out.push_str(TEMPLATE_LINE);
        out.push_str("\n\n");
        render_block(&mut out, FileKind::Header, project);
        out.push('\n');
        render_block(&mut out, FileKind::Source, project);
        out
    }

    /// Write the project file, truncating any existing content.
    ///
    /// The text is rendered before the file is opened, so a failed open
    /// leaves the destination untouched.
    pub fn write(&self, project: ProjectDescriptor) -> Result<WriteSummary> {
        let text = self.render(&project);
        let output_path = project.output_path().to_path_buf();

        write_file(&output_path, text.as_bytes()).map_err(|source| {
            ProgenError::OutputWriteFailure {
                path: output_path.clone(),
                source,
            }
        })?;

        let summary = WriteSummary {
            headers: project.files(FileKind::Header).len(),
            sources: project.files(FileKind::Source).len(),
            bytes: text.len(),
            output_path,
        };
        info!(
            output = %summary.output_path.display(),
            headers = summary.headers,
            sources = summary.sources,
            bytes = summary.bytes,
            "Wrote project file"
        );
        Ok(summary)
    }
}

/// `VAR =` followed by one ` \`-continued, two-space-indented line per file.
fn render_block(out: &mut String, kind: FileKind, project: &ProjectDescriptor) {
    out.push_str(kind.qmake_variable());
    out.push_str(" =");
    for path in project.files(kind) {
        out.push_str(" \\\n  ");
        out.push_str(&display_path(path, project.root_dir()));
    }
    out.push('\n');
}

fn display_path(path: &Path, root: &Path) -> String {
    relative_to(path, root).unwrap_or_else(|| {
        warn!(
            path = %path.display(),
            root = %root.display(),
            "File is outside the project root, writing absolute path"
        );
        to_forward_slashes(path)
    })
}

fn write_file(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    writer.write_all(bytes)?;
    writer.flush()?;
    Ok(())
}
