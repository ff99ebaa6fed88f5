//! Source discovery backend
//!
//! Uses the ignore crate for gitignore-aware traversal of directories given
//! on the command line.

use anyhow::{bail, Result};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

use crate::core::paths::resolve;

/// Options controlling directory traversal
#[derive(Debug, Clone, Copy, Default)]
pub struct ScanOptions {
    /// Include hidden files and directories
    pub hidden: bool,
    /// Ignore .gitignore and other ignore files
    pub no_ignore: bool,
    /// Maximum directory depth
    pub max_depth: Option<usize>,
}

/// Collect the source files to scan for markers.
///
/// Files named explicitly are always included. Directories are walked and
/// only text-like files are kept. The result is sorted and deduplicated so
/// extraction order is stable.
pub fn collect_sources(root: &Path, paths: &[PathBuf], options: ScanOptions) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        let path = resolve(root, path);

        if path.is_file() {
            files.push(path);
            continue;
        }
        if !path.is_dir() {
            bail!("Path not found: {}", path.display());
        }

        let mut builder = WalkBuilder::new(&path);
        builder
            .hidden(!options.hidden)
            .git_ignore(!options.no_ignore)
            .git_global(!options.no_ignore)
            .git_exclude(!options.no_ignore)
            .ignore(!options.no_ignore)
            .max_depth(options.max_depth);

        for entry in builder.build() {
            let entry = match entry {
                Ok(e) => e,
                Err(err) => {
                    tracing::debug!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };

            let entry_path = entry.path();
            if entry_path.is_file() && is_marker_candidate(entry_path) {
                files.push(entry_path.to_path_buf());
            }
        }
    }

    files.sort();
    files.dedup();
    tracing::debug!(files = files.len(), "collected sources");
    Ok(files)
}

/// Check if a file might contain markers
fn is_marker_candidate(path: &Path) -> bool {
    let text_extensions = [
        "go", "rs", "c", "cc", "cpp", "h", "hpp", "java", "kt", "js", "jsx", "ts", "tsx", "swift",
        "cs", "scala", "proto", "txt", "md",
    ];

    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| text_extensions.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}
