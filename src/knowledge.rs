//! The CLI's flat-file knowledge directory.
//!
//! `devkb add` writes one JSON file per entry to `<dataDir>/knowledge/`.
//! These records are separate from the API's in-memory store: the two never
//! share state. `list`, `ask`, and `stats` read them back.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

use devkb_core::ask::ask;
use devkb_core::models::{EntryType, KnowledgeEntry};
use devkb_core::query::parse_tags;

use crate::config::Config;

/// On-disk shape of a CLI-created entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CliEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl CliEntry {
    /// Views the record as a [`KnowledgeEntry`] with source `cli`.
    pub fn to_entry(&self) -> KnowledgeEntry {
        KnowledgeEntry {
            id: self.id.clone(),
            entry_type: self.entry_type,
            title: self.title.clone(),
            content: self.content.clone(),
            source: "cli".to_string(),
            source_path: None,
            tags: self.tags.clone(),
            created_at: self.created_at,
            updated_at: self.created_at,
            metadata: None,
        }
    }
}

/// Creates a record and writes it to `<dataDir>/knowledge/<id>.json`.
pub fn add_entry(
    config: &Config,
    entry_type: EntryType,
    title: Option<&str>,
    content: Option<&str>,
    tags: Option<&str>,
) -> Result<CliEntry> {
    let entry = CliEntry {
        id: uuid::Uuid::new_v4().to_string(),
        entry_type,
        title: title
            .filter(|t| !t.is_empty())
            .unwrap_or("Untitled")
            .to_string(),
        content: content.unwrap_or_default().to_string(),
        tags: parse_tags(tags).unwrap_or_default(),
        created_at: Utc::now(),
    };

    let dir = config.knowledge_dir();
    std::fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    let path = dir.join(format!("{}.json", entry.id));
    std::fs::write(&path, serde_json::to_string_pretty(&entry)?)
        .with_context(|| format!("Failed to write entry: {}", path.display()))?;

    tracing::debug!(id = %entry.id, path = %path.display(), "knowledge entry written");
    Ok(entry)
}

/// Reads every `*.json` record, oldest first.
///
/// A missing directory yields no entries. Files that fail to parse are
/// logged and skipped.
pub fn load_entries(config: &Config) -> Result<Vec<CliEntry>> {
    let dir = config.knowledge_dir();
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut entries = Vec::new();
    for item in std::fs::read_dir(&dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
    {
        let path = item?.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        match read_entry(&path) {
            Ok(entry) => entries.push(entry),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping unreadable entry"),
        }
    }

    entries.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.cmp(&b.id))
    });
    Ok(entries)
}

fn read_entry(path: &Path) -> Result<CliEntry> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

/// CLI entry point for `devkb add`.
pub fn run_add(
    config: &Config,
    entry_type: EntryType,
    title: Option<&str>,
    content: Option<&str>,
    tags: Option<&str>,
) -> Result<()> {
    let entry = add_entry(config, entry_type, title, content, tags)?;
    println!("Added {} entry: {}", entry.entry_type, entry.title);
    println!("id: {}", entry.id);
    Ok(())
}

/// CLI entry point for `devkb list`.
pub fn run_list(config: &Config, entry_type: Option<EntryType>) -> Result<()> {
    let entries: Vec<CliEntry> = load_entries(config)?
        .into_iter()
        .filter(|e| entry_type.map_or(true, |t| e.entry_type == t))
        .collect();

    if entries.is_empty() {
        println!("No knowledge entries found.");
        return Ok(());
    }

    println!("Knowledge Entries ({}):", entries.len());
    println!();
    for entry in &entries {
        println!("{} - {}", entry.entry_type, entry.title);
        if !entry.tags.is_empty() {
            println!("  Tags: {}", entry.tags.join(", "));
        }
        println!();
    }
    Ok(())
}

/// CLI entry point for `devkb ask`: the same templated responder the API
/// uses, run over the knowledge directory.
pub fn run_ask(config: &Config, question: &str) -> Result<()> {
    let entries: Vec<KnowledgeEntry> = load_entries(config)?
        .iter()
        .map(CliEntry::to_entry)
        .collect();
    let result = ask(&entries, question);

    println!("Question: {}", question);
    println!();
    println!("Answer:");
    println!("{}", result.answer);
    println!();

    if result.sources.is_empty() {
        println!("Tip: add entries with \"devkb add <type> --title ... --content ...\" first.");
    } else {
        println!("Sources:");
        for id in &result.sources {
            println!("  - {}", id);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn test_config(tmp: &TempDir) -> Config {
        Config {
            data_dir: tmp.path().join(".devkb"),
            ..Config::default()
        }
    }

    #[test]
    fn test_add_then_load() {
        let tmp = TempDir::new().unwrap();
        let cfg = test_config(&tmp);

        let added = add_entry(
            &cfg,
            EntryType::Decision,
            Some("Use JWT"),
            Some("stateless auth"),
            Some("auth, jwt"),
        )
        .unwrap();

        assert!(cfg.knowledge_dir().join(format!("{}.json", added.id)).exists());
        let loaded = load_entries(&cfg).unwrap();
        assert_eq!(loaded, vec![added]);
        assert_eq!(loaded[0].tags, vec!["auth", "jwt"]);
    }

    #[test]
    fn test_add_defaults() {
        let tmp = TempDir::new().unwrap();
        let cfg = test_config(&tmp);
        let added = add_entry(&cfg, EntryType::Code, None, None, None).unwrap();
        assert_eq!(added.title, "Untitled");
        assert_eq!(added.content, "");
        assert!(added.tags.is_empty());
    }

    #[test]
    fn test_load_missing_dir_is_empty() {
        let tmp = TempDir::new().unwrap();
        assert!(load_entries(&test_config(&tmp)).unwrap().is_empty());
    }

    #[test]
    fn test_load_skips_bad_files_and_reads_short_type() {
        let tmp = TempDir::new().unwrap();
        let cfg = test_config(&tmp);
        let dir = cfg.knowledge_dir();
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("broken.json"), "{").unwrap();
        std::fs::write(dir.join("notes.txt"), "ignored").unwrap();
        std::fs::write(
            dir.join("1700000000000-abc.json"),
            r#"{"id":"1700000000000-abc","type":"doc","title":"Runbook","content":"","tags":[],"createdAt":"2024-01-01T00:00:00.000Z"}"#,
        )
        .unwrap();

        let loaded = load_entries(&cfg).unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].entry_type, EntryType::Documentation);
        assert_eq!(loaded[0].to_entry().source, "cli");
    }
}
