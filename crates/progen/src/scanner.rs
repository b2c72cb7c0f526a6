//! Directory scanner that partitions a tree into header and source files.
//!
//! # Design
//!
//! - Walk the tree with `walkdir`, which keeps its own stack instead of
//!   recursing, so depth is bounded only by memory
//! - Symlinked directories are followed; a link back to an ancestor is
//!   reported as a loop instead of being descended
//! - Paths accumulate unsorted and are sorted once after the walk
//! - Problems are either collected as issues (best-effort) or abort the
//!   scan (strict)

use crate::classify::{ClassifyRules, FileKind};
use crate::error::{ProgenError, Result};
use crate::paths::{absolutize, validate_project_root};
use serde::{Deserialize, Serialize};
use std::ffi::OsStr;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// How the scanner reacts to unreadable directories and symlink loops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScanMode {
    /// Record the problem, skip the subtree, keep going.
    #[default]
    BestEffort,
    /// Fail the scan on the first problem.
    Strict,
}

/// Configuration for scanning operations
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Header/source patterns
    pub rules: ClassifyRules,
    /// Reaction to unreadable subtrees
    pub mode: ScanMode,
    /// Whether to descend into symlinked directories
    pub follow_symlinks: bool,
    /// Whether to include entries whose name starts with `.`
    pub include_hidden: bool,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            rules: ClassifyRules::default(),
            mode: ScanMode::BestEffort,
            follow_symlinks: true,
            include_hidden: false,
        }
    }
}

/// Counters collected during a scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Directories descended into (the root excluded)
    pub dirs_scanned: u64,
    /// Non-directory entries offered to the classifier
    pub files_seen: u64,
    pub headers: u64,
    pub sources: u64,
    /// Files matching neither pattern set
    pub files_ignored: u64,
    /// Hidden entries skipped
    pub hidden_skipped: u64,
    pub issues: u64,
    pub duration_ms: u64,
}

/// Kind of problem met during a best-effort scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    UnreadableDirectory,
    SymlinkLoop { ancestor: PathBuf },
    /// An entry whose metadata could not be read, e.g. a dangling symlink
    BrokenEntry,
}

/// A non-fatal scan problem
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanIssue {
    pub path: PathBuf,
    pub kind: IssueKind,
    pub message: String,
}

impl fmt::Display for ScanIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            IssueKind::UnreadableDirectory => {
                write!(f, "unreadable directory {}: {}", self.path.display(), self.message)
            }
            IssueKind::SymlinkLoop { ancestor } => write!(
                f,
                "symlink loop at {} (points back to {})",
                self.path.display(),
                ancestor.display()
            ),
            IssueKind::BrokenEntry => {
                write!(f, "unreadable entry {}: {}", self.path.display(), self.message)
            }
        }
    }
}

impl ScanIssue {
    fn into_error(self) -> ProgenError {
        match self.kind {
            IssueKind::SymlinkLoop { ancestor } => ProgenError::SymlinkLoop {
                path: self.path,
                ancestor,
            },
            IssueKind::UnreadableDirectory | IssueKind::BrokenEntry => {
                ProgenError::DirectoryUnreadable {
                    path: self.path,
                    message: self.message,
                }
            }
        }
    }
}

/// Result of a scan operation
#[derive(Debug, Clone, Default)]
pub struct ScanResult {
    /// Absolute header paths, ascending
    pub headers: Vec<PathBuf>,
    /// Absolute source paths, ascending
    pub sources: Vec<PathBuf>,
    pub stats: ScanStats,
    /// Problems skipped over in best-effort mode
    pub issues: Vec<ScanIssue>,
}

impl ScanResult {
    /// Paths of the given kind.
    pub fn files(&self, kind: FileKind) -> &[PathBuf] {
        match kind {
            FileKind::Header => &self.headers,
            FileKind::Source => &self.sources,
        }
    }

    fn push(&mut self, kind: FileKind, path: PathBuf) {
        match kind {
            FileKind::Header => self.headers.push(path),
            FileKind::Source => self.sources.push(path),
        }
    }

    /// Sort both collections by path string and drop duplicates.
    fn finish(&mut self) {
        for files in [&mut self.headers, &mut self.sources] {
            files.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));
            files.dedup();
        }
        self.stats.headers = self.headers.len() as u64;
        self.stats.sources = self.sources.len() as u64;
        self.stats.issues = self.issues.len() as u64;
    }
}

/// Filesystem scanner
#[derive(Debug, Clone, Default)]
pub struct Scanner {
    config: ScanConfig,
}

impl Scanner {
    /// Create a scanner with the default patterns and best-effort mode
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a scanner with custom configuration
    pub fn with_config(config: ScanConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    /// Scan `root` and classify every file below it.
    ///
    /// The root must be an existing directory. Paths in the result are
    /// absolute.
    pub fn scan(&self, root: &Path) -> Result<ScanResult> {
        let start = Instant::now();
        let root = absolutize(root)?;
        validate_project_root(&root)?;

        info!(
            root = %root.display(),
            mode = ?self.config.mode,
            follow_symlinks = self.config.follow_symlinks,
            "Starting scan"
        );

        let include_hidden = self.config.include_hidden;
        let mut hidden_skipped = 0u64;
        let mut result = ScanResult::default();

        let walker = WalkDir::new(&root)
            .min_depth(1)
            .follow_links(self.config.follow_symlinks)
            .into_iter()
            .filter_entry(|entry| {
                if include_hidden || !is_hidden(entry.file_name()) {
                    return true;
                }
                debug!(path = %entry.path().display(), "Skipping hidden entry");
                hidden_skipped += 1;
                false
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    let issue = issue_from_walk_error(&err, &root);
                    // A dangling link is still a file name in the tree.
                    if issue.kind == IssueKind::BrokenEntry && is_dangling_symlink(&issue.path) {
                        if let Some(name) = issue.path.file_name() {
                            if include_hidden || !is_hidden(name) {
                                self.record_file(name, &issue.path, &mut result);
                            }
                        }
                    }
                    self.handle_issue(issue, &mut result)?;
                    continue;
                }
            };

            let path = entry.path();
            debug!(path = %path.display(), "Visiting");

            if entry.file_type().is_dir() {
                result.stats.dirs_scanned += 1;
                continue;
            }

            self.record_file(entry.file_name(), path, &mut result);
        }

        result.stats.hidden_skipped = hidden_skipped;
        result.finish();
        result.stats.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            root = %root.display(),
            dirs = result.stats.dirs_scanned,
            headers = result.stats.headers,
            sources = result.stats.sources,
            ignored = result.stats.files_ignored,
            issues = result.stats.issues,
            duration_ms = result.stats.duration_ms,
            "Scan complete"
        );

        Ok(result)
    }

    fn record_file(&self, name: &OsStr, path: &Path, result: &mut ScanResult) {
        result.stats.files_seen += 1;
        match self.config.rules.classify(name) {
            Some(kind) => result.push(kind, path.to_path_buf()),
            None => result.stats.files_ignored += 1,
        }
    }

    /// Record `issue`, or turn it into an error in strict mode. Broken
    /// entries never fail the scan since no subtree is lost.
    fn handle_issue(&self, issue: ScanIssue, result: &mut ScanResult) -> Result<()> {
        let fatal = self.config.mode == ScanMode::Strict && issue.kind != IssueKind::BrokenEntry;
        if fatal {
            return Err(issue.into_error());
        }
        warn!(path = %issue.path.display(), "Skipping: {}", issue);
        result.issues.push(issue);
        Ok(())
    }
}

fn is_hidden(name: &OsStr) -> bool {
    name.to_string_lossy().starts_with('.')
}

fn is_dangling_symlink(path: &Path) -> bool {
    let is_link = fs::symlink_metadata(path)
        .map(|meta| meta.file_type().is_symlink())
        .unwrap_or(false);
    is_link && fs::metadata(path).is_err()
}

fn issue_from_walk_error(err: &walkdir::Error, root: &Path) -> ScanIssue {
    let path = err.path().unwrap_or(root).to_path_buf();
    let message = err
        .io_error()
        .map(|e| e.to_string())
        .unwrap_or_else(|| err.to_string());

    let kind = if let Some(ancestor) = err.loop_ancestor() {
        IssueKind::SymlinkLoop {
            ancestor: ancestor.to_path_buf(),
        }
    } else if path.is_dir() {
        IssueKind::UnreadableDirectory
    } else {
        IssueKind::BrokenEntry
    };

    ScanIssue { path, kind, message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, name: &str) -> std::io::Result<PathBuf> {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(&path)?;
        file.write_all(b"// test\n")?;
        Ok(path)
    }

    fn names(paths: &[PathBuf], root: &Path) -> Vec<String> {
        paths
            .iter()
            .map(|p| crate::paths::to_forward_slashes(p.strip_prefix(root).unwrap()))
            .collect()
    }

    #[test]
    fn test_scan_empty_directory() {
        let temp = TempDir::new().unwrap();
        let result = Scanner::new().scan(temp.path()).unwrap();

        assert!(result.headers.is_empty());
        assert!(result.sources.is_empty());
        assert!(result.issues.is_empty());
        assert_eq!(result.stats.files_seen, 0);
    }

    #[test]
    fn test_scan_partitions_headers_and_sources() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "a.h").unwrap();
        create_test_file(temp.path(), "sub/b.cpp").unwrap();
        create_test_file(temp.path(), "sub/unrelated.txt").unwrap();

        let result = Scanner::new().scan(temp.path()).unwrap();

        assert_eq!(names(&result.headers, temp.path()), ["a.h"]);
        assert_eq!(names(&result.sources, temp.path()), ["sub/b.cpp"]);
        assert_eq!(result.stats.files_seen, 3);
        assert_eq!(result.stats.files_ignored, 1);
        assert_eq!(result.stats.dirs_scanned, 1);
    }

    #[test]
    fn test_scan_paths_are_absolute_and_sorted() {
        let temp = TempDir::new().unwrap();
        for name in ["z.c", "m/n.c", "a.c", "m.c", "B.CPP", "deep/er/still/x.hpp", "a.H"] {
            create_test_file(temp.path(), name).unwrap();
        }

        let result = Scanner::new().scan(temp.path()).unwrap();

        assert!(result.headers.iter().chain(&result.sources).all(|p| p.is_absolute()));
        assert_eq!(
            names(&result.sources, temp.path()),
            ["B.CPP", "a.c", "m.c", "m/n.c", "z.c"]
        );
        assert_eq!(names(&result.headers, temp.path()), ["a.H", "deep/er/still/x.hpp"]);

        for files in [&result.headers, &result.sources] {
            assert!(files.windows(2).all(|w| w[0].as_os_str() < w[1].as_os_str()));
        }
    }

    #[test]
    fn test_scan_root_with_dot_segments() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "x.c").unwrap();
        let dotted = temp.path().join("nested").join("..");

        let result = Scanner::new().scan(&dotted).unwrap();
        assert_eq!(result.sources, [temp.path().join("x.c")]);
    }

    #[test]
    fn test_scan_skips_hidden_entries_by_default() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "visible.c").unwrap();
        create_test_file(temp.path(), ".hidden.c").unwrap();
        create_test_file(temp.path(), ".git/objects/pack.h").unwrap();

        let result = Scanner::new().scan(temp.path()).unwrap();
        assert_eq!(names(&result.sources, temp.path()), ["visible.c"]);
        assert!(result.headers.is_empty());
        assert_eq!(result.stats.hidden_skipped, 2);

        let scanner = Scanner::with_config(ScanConfig {
            include_hidden: true,
            ..ScanConfig::default()
        });
        let result = scanner.scan(temp.path()).unwrap();
        assert_eq!(names(&result.sources, temp.path()), [".hidden.c", "visible.c"]);
        assert_eq!(names(&result.headers, temp.path()), [".git/objects/pack.h"]);
    }

    #[test]
    fn test_scan_with_custom_rules() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "a.hh").unwrap();
        create_test_file(temp.path(), "a.cc").unwrap();
        create_test_file(temp.path(), "a.h").unwrap();

        let scanner = Scanner::with_config(ScanConfig {
            rules: ClassifyRules::from_patterns(["*.hh"], ["*.cc"]).unwrap(),
            ..ScanConfig::default()
        });
        let result = scanner.scan(temp.path()).unwrap();

        assert_eq!(names(&result.headers, temp.path()), ["a.hh"]);
        assert_eq!(names(&result.sources, temp.path()), ["a.cc"]);
    }

    #[test]
    fn test_scan_nonexistent_root() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("missing");

        let err = Scanner::new().scan(&missing).unwrap_err();
        assert!(matches!(err, ProgenError::InvalidProjectRoot(_)));
    }

    #[test]
    fn test_scan_is_deterministic() {
        let temp = TempDir::new().unwrap();
        for i in 0..20 {
            create_test_file(temp.path(), &format!("d{}/f{}.c", i % 4, i)).unwrap();
            create_test_file(temp.path(), &format!("d{}/f{}.h", i % 3, i)).unwrap();
        }

        let first = Scanner::new().scan(temp.path()).unwrap();
        let second = Scanner::new().scan(temp.path()).unwrap();
        assert_eq!(first.headers, second.headers);
        assert_eq!(first.sources, second.sources);
        assert_eq!(first.headers.len(), 20);
        assert_eq!(first.sources.len(), 20);
    }

    // ========================================================================
    // Symlink and permission handling (unix only)
    // ========================================================================

    #[cfg(unix)]
    #[test]
    fn test_scan_symlink_loop_best_effort() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "sub/a.c").unwrap();
        std::os::unix::fs::symlink(temp.path(), temp.path().join("sub/back")).unwrap();

        let result = Scanner::new().scan(temp.path()).unwrap();

        assert_eq!(names(&result.sources, temp.path()), ["sub/a.c"]);
        assert_eq!(result.issues.len(), 1);
        assert!(matches!(result.issues[0].kind, IssueKind::SymlinkLoop { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_symlink_loop_strict() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "sub/a.c").unwrap();
        std::os::unix::fs::symlink(temp.path(), temp.path().join("sub/back")).unwrap();

        let scanner = Scanner::with_config(ScanConfig {
            mode: ScanMode::Strict,
            ..ScanConfig::default()
        });
        let err = scanner.scan(temp.path()).unwrap_err();
        assert!(matches!(err, ProgenError::SymlinkLoop { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_follows_symlinked_directory() {
        let temp = TempDir::new().unwrap();
        let outside = TempDir::new().unwrap();
        create_test_file(outside.path(), "lib.h").unwrap();
        std::os::unix::fs::symlink(outside.path(), temp.path().join("vendor")).unwrap();

        let result = Scanner::new().scan(temp.path()).unwrap();
        assert_eq!(names(&result.headers, temp.path()), ["vendor/lib.h"]);

        let scanner = Scanner::with_config(ScanConfig {
            follow_symlinks: false,
            ..ScanConfig::default()
        });
        let result = scanner.scan(temp.path()).unwrap();
        assert!(result.headers.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_dangling_symlink_is_recorded() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "ok.c").unwrap();
        std::os::unix::fs::symlink(temp.path().join("gone.h"), temp.path().join("dangling.h"))
            .unwrap();

        let scanner = Scanner::with_config(ScanConfig {
            mode: ScanMode::Strict,
            ..ScanConfig::default()
        });
        let result = scanner.scan(temp.path()).unwrap();

        assert_eq!(names(&result.sources, temp.path()), ["ok.c"]);
        assert_eq!(names(&result.headers, temp.path()), ["dangling.h"]);
        assert_eq!(result.stats.files_seen, 2);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].kind, IssueKind::BrokenEntry);
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_lists_dangling_symlink() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "ok.c").unwrap();
        std::os::unix::fs::symlink(temp.path().join("gone.h"), temp.path().join("dangling.h"))
            .unwrap();
        std::os::unix::fs::symlink(temp.path().join("gone.c"), temp.path().join(".stale.c"))
            .unwrap();

        for follow_symlinks in [true, false] {
            let scanner = Scanner::with_config(ScanConfig {
                follow_symlinks,
                ..ScanConfig::default()
            });
            let result = scanner.scan(temp.path()).unwrap();

            assert_eq!(names(&result.headers, temp.path()), ["dangling.h"]);
            assert_eq!(names(&result.sources, temp.path()), ["ok.c"]);
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_scan_unreadable_directory() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "open/a.c").unwrap();
        create_test_file(temp.path(), "locked/b.c").unwrap();
        let locked = temp.path().join("locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        // Privileged users can read the directory anyway.
        if fs::read_dir(&locked).is_ok() {
            fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();
            return;
        }

        let best_effort = Scanner::new().scan(temp.path());
        let strict = Scanner::with_config(ScanConfig {
            mode: ScanMode::Strict,
            ..ScanConfig::default()
        })
        .scan(temp.path());
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        let result = best_effort.unwrap();
        assert_eq!(names(&result.sources, temp.path()), ["open/a.c"]);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].kind, IssueKind::UnreadableDirectory);
        assert_eq!(result.issues[0].path, locked);

        let err = strict.unwrap_err();
        assert!(matches!(err, ProgenError::DirectoryUnreadable { .. }));
    }
}
