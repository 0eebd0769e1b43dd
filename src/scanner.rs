//! Source file discovery

use crate::error::{CompilerError, Result};
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use std::path::{Component, Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Directories never scanned, wherever they appear.
pub const IGNORED_DIRS: &[&str] = &["node_modules", "dist", ".git"];

pub struct SourceScanner {
    root: PathBuf,
    globs: GlobSet,
}

impl SourceScanner {
    pub fn new(root: impl Into<PathBuf>, patterns: &[String]) -> Result<Self> {
        let mut builder = GlobSetBuilder::new();

        for pattern in patterns {
            let normalized = pattern.trim().trim_start_matches("./");
            if normalized.is_empty() {
                continue;
            }
            let glob = GlobBuilder::new(normalized)
                .literal_separator(true)
                .build()
                .map_err(|e| CompilerError::Pattern {
                    pattern: pattern.clone(),
                    message: e.to_string(),
                })?;
            builder.add(glob);
        }

        let globs = builder.build().map_err(|e| CompilerError::Pattern {
            pattern: patterns.join(", "),
            message: e.to_string(),
        })?;

        Ok(Self {
            root: root.into(),
            globs,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Whether `path` (absolute or relative to the root) is a source file.
    pub fn is_match(&self, path: &Path) -> bool {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let ignored = relative.components().any(|component| match component {
            Component::Normal(name) => name
                .to_str()
                .map_or(false, |name| IGNORED_DIRS.contains(&name)),
            _ => false,
        });

        !ignored && self.globs.is_match(relative)
    }

    /// All matching files under the root, in sorted order.
    pub fn discover(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        let walker = WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !is_ignored(entry));

        for entry in walker {
            let entry = entry.map_err(|e| {
                CompilerError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    format!("Directory traversal error: {}", e),
                ))
            })?;

            if entry.file_type().is_file() && self.is_match(entry.path()) {
                files.push(entry.into_path());
            }
        }

        log::debug!("Discovered {} source files under {}", files.len(), self.root.display());
        Ok(files)
    }
}

fn is_ignored(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .map_or(false, |name| IGNORED_DIRS.contains(&name))
}
