//! File-name index for the CLI.
//!
//! `devkb index` walks the configured directories and writes a flat manifest
//! of `{path, name, ext}` records to `<dataDir>/index/files.json`.
//! `devkb search` then matches file names against that manifest. File
//! contents are never read, and the index has nothing to do with the API's
//! entry store.

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

use crate::config::Config;

/// One indexed file.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: String,
    pub name: String,
    /// Extension with its leading dot (`.rs`), or empty.
    pub ext: String,
}

/// Result of an index run.
#[derive(Debug)]
pub enum IndexOutcome {
    Written { path: PathBuf, files: usize },
    /// An index already exists and `--force` was not given.
    Skipped { path: PathBuf },
}

/// Compiled exclude rules.
struct Excludes {
    /// Patterns without `/`, tested against each path component.
    component: GlobSet,
    /// Patterns with `/`, tested against the path relative to the walked root.
    path: GlobSet,
}

impl Excludes {
    fn new(patterns: &[String]) -> Result<Self> {
        let (path_patterns, component_patterns): (Vec<&String>, Vec<&String>) =
            patterns.iter().partition(|p| p.contains('/'));
        Ok(Self {
            component: build_globset(&component_patterns)?,
            path: build_globset(&path_patterns)?,
        })
    }

    fn is_excluded(&self, entry: &DirEntry, root: &Path) -> bool {
        if entry.depth() == 0 {
            return false;
        }
        if self.component.is_match(entry.file_name()) {
            return true;
        }
        let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
        self.path.is_match(relative)
    }
}

fn build_globset(patterns: &[&String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(
            Glob::new(pattern).with_context(|| format!("Invalid exclude pattern: {}", pattern))?,
        );
    }
    Ok(builder.build()?)
}

fn normalize_ext(ext: &str) -> String {
    if ext.is_empty() || ext.starts_with('.') {
        ext.to_string()
    } else {
        format!(".{}", ext)
    }
}

/// Drops a leading `./` so records read `src/main.rs`, not `./src/main.rs`.
fn display_path(path: &Path) -> String {
    path.strip_prefix(".")
        .unwrap_or(path)
        .to_string_lossy()
        .to_string()
}

fn to_record(path: &Path) -> FileRecord {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let ext = path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();
    FileRecord {
        path: display_path(path),
        name,
        ext,
    }
}

/// Walks `roots` and returns the sorted, de-duplicated file records.
///
/// Roots that do not exist are skipped. Unreadable entries are logged and
/// skipped.
pub fn scan_paths(roots: &[PathBuf], config: &Config) -> Result<Vec<FileRecord>> {
    let excludes = Excludes::new(&config.exclude_patterns)?;
    let include: Vec<String> = config
        .include_extensions
        .iter()
        .map(|e| normalize_ext(e))
        .collect();

    let mut records = Vec::new();
    for root in roots {
        if !root.exists() {
            tracing::debug!(root = %root.display(), "index path does not exist, skipping");
            continue;
        }

        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| !excludes.is_excluded(e, root));

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable path");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let record = to_record(entry.path());
            if !include.is_empty() && !include.contains(&record.ext) {
                continue;
            }
            records.push(record);
        }
    }

    records.sort();
    records.dedup();
    Ok(records)
}

/// Builds the index and writes it to disk.
///
/// `paths` overrides `config.index_paths`. Without `force`, an existing
/// index file is left untouched.
pub fn build_index(config: &Config, paths: Option<&[PathBuf]>, force: bool) -> Result<IndexOutcome> {
    let index_path = config.index_file();
    if index_path.exists() && !force {
        return Ok(IndexOutcome::Skipped { path: index_path });
    }

    let roots = paths.unwrap_or(config.index_paths.as_slice());
    let records = scan_paths(roots, config)?;

    std::fs::create_dir_all(config.index_dir()).with_context(|| {
        format!(
            "Failed to create index directory: {}",
            config.index_dir().display()
        )
    })?;
    let json = serde_json::to_string_pretty(&records)?;
    std::fs::write(&index_path, json)
        .with_context(|| format!("Failed to write index: {}", index_path.display()))?;

    tracing::info!(files = records.len(), path = %index_path.display(), "index written");
    Ok(IndexOutcome::Written {
        path: index_path,
        files: records.len(),
    })
}

/// Reads the index, or `None` when it has not been built yet.
pub fn load_index(config: &Config) -> Result<Option<Vec<FileRecord>>> {
    let index_path = config.index_file();
    if !index_path.exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(&index_path)
        .with_context(|| format!("Failed to read index: {}", index_path.display()))?;
    let records = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse index: {}", index_path.display()))?;
    Ok(Some(records))
}

/// Case-insensitive substring match over file names, optionally restricted
/// to one extension, truncated to `limit`.
pub fn search_files<'a>(
    records: &'a [FileRecord],
    query: &str,
    ext: Option<&str>,
    limit: usize,
) -> Vec<&'a FileRecord> {
    let query_lower = query.to_lowercase();
    let ext = ext.map(normalize_ext);
    records
        .iter()
        .filter(|r| r.name.to_lowercase().contains(&query_lower))
        .filter(|r| ext.as_deref().map_or(true, |e| r.ext == e))
        .take(limit)
        .collect()
}

/// CLI entry point for `devkb index`.
pub fn run_index(config: &Config, paths: Option<&str>, force: bool) -> Result<()> {
    let paths: Option<Vec<PathBuf>> = paths.map(|p| {
        p.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .collect()
    });

    println!("Indexing codebase...");
    match build_index(config, paths.as_deref(), force)? {
        IndexOutcome::Written { path, files } => {
            println!("Indexed {} files", files);
            println!("Index written to {}", path.display());
        }
        IndexOutcome::Skipped { path } => {
            println!(
                "Index already exists at {}. Run \"devkb index --force\" to rebuild it.",
                path.display()
            );
        }
    }
    Ok(())
}

/// CLI entry point for `devkb search`.
pub fn run_search(config: &Config, query: &str, ext: Option<&str>, limit: usize) -> Result<()> {
    let records = match load_index(config)? {
        Some(r) => r,
        None => {
            println!("No index found. Run \"devkb index\" first.");
            return Ok(());
        }
    };

    let results = search_files(&records, query, ext, limit);
    if results.is_empty() {
        println!("No results found.");
        return Ok(());
    }

    println!("Found {} results for \"{}\":", results.len(), query);
    println!();
    for (i, file) in results.iter().enumerate() {
        println!("{}. {}", i + 1, file.path);
        println!("   Type: {}", file.ext);
        println!();
    }
    Ok(())
}
