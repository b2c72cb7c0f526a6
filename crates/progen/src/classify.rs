//! File name classification into headers and sources.
//!
//! Patterns are case-insensitive globs matched against the bare file name,
//! so `*.h` matches `foo.H` but not `foo.h.txt`.

use crate::error::{ProgenError, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::ffi::OsStr;
use std::fmt;

/// Default header patterns
pub const DEFAULT_HEADER_PATTERNS: &[&str] = &["*.h", "*.hpp"];

/// Default source patterns
pub const DEFAULT_SOURCE_PATTERNS: &[&str] = &["*.c", "*.cpp"];

/// Kind of project file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileKind {
    Header,
    Source,
}

impl FileKind {
    /// qmake variable holding files of this kind.
    pub fn qmake_variable(&self) -> &'static str {
        match self {
            FileKind::Header => "HEADERS",
            FileKind::Source => "SOURCES",
        }
    }
}

impl fmt::Display for FileKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileKind::Header => write!(f, "header"),
            FileKind::Source => write!(f, "source"),
        }
    }
}

/// Compiled header and source pattern sets.
#[derive(Debug, Clone)]
pub struct ClassifyRules {
    header_patterns: Vec<String>,
    source_patterns: Vec<String>,
    headers: GlobSet,
    sources: GlobSet,
}

impl ClassifyRules {
    /// Build rules from raw glob patterns.
    ///
    /// Each set needs at least one pattern.
    pub fn from_patterns<H, S>(header_patterns: H, source_patterns: S) -> Result<Self>
    where
        H: IntoIterator,
        H::Item: AsRef<str>,
        S: IntoIterator,
        S::Item: AsRef<str>,
    {
        let header_patterns = collect_patterns(header_patterns);
        let source_patterns = collect_patterns(source_patterns);
        let headers = build_set(FileKind::Header, &header_patterns)?;
        let sources = build_set(FileKind::Source, &source_patterns)?;

        Ok(Self {
            header_patterns,
            source_patterns,
            headers,
            sources,
        })
    }

    /// Classify a file name. Header patterns are checked first, so a name
    /// matching both sets is a header.
    pub fn classify(&self, file_name: &OsStr) -> Option<FileKind> {
        if self.headers.is_match(file_name) {
            Some(FileKind::Header)
        } else if self.sources.is_match(file_name) {
            Some(FileKind::Source)
        } else {
            None
        }
    }

    pub fn header_patterns(&self) -> &[String] {
        &self.header_patterns
    }

    pub fn source_patterns(&self) -> &[String] {
        &self.source_patterns
    }
}

impl Default for ClassifyRules {
    fn default() -> Self {
        // The built-in globs are known to compile.
        Self::from_patterns(DEFAULT_HEADER_PATTERNS, DEFAULT_SOURCE_PATTERNS)
            .unwrap_or_else(|e| unreachable!("default patterns must compile: {}", e))
    }
}

fn collect_patterns<I>(patterns: I) -> Vec<String>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    patterns
        .into_iter()
        .map(|p| p.as_ref().trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Build a case-insensitive glob set. `*` never crosses a path separator.
fn build_set(kind: FileKind, patterns: &[String]) -> Result<GlobSet> {
    if patterns.is_empty() {
        return Err(ProgenError::Pattern(format!("no {} patterns configured", kind)));
    }

    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .case_insensitive(true)
            .literal_separator(true)
            .build()
            .map_err(|e| ProgenError::Pattern(format!("invalid {} pattern '{}': {}", kind, pattern, e)))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| ProgenError::Pattern(format!("failed to compile {} patterns: {}", kind, e)))
}
