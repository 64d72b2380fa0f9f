//! `devkb stats`: a summary of the CLI's on-disk state.
//!
//! Reports how many files are indexed, how many knowledge records exist,
//! and a per-type breakdown of those records.

use anyhow::Result;

use devkb_core::models::KnowledgeEntry;
use devkb_core::stats::compute_stats;

use crate::config::Config;
use crate::indexer::load_index;
use crate::knowledge::{load_entries, CliEntry};

/// Run the stats command and print a summary.
pub fn run_stats(config: &Config) -> Result<()> {
    if !config.data_dir.exists() {
        println!("DevKB not initialized. Run \"devkb init\" first.");
        return Ok(());
    }

    let indexed_files = load_index(config)?.map(|r| r.len()).unwrap_or(0);
    let index_size = std::fs::metadata(config.index_file())
        .map(|m| m.len())
        .unwrap_or(0);

    let entries: Vec<KnowledgeEntry> = load_entries(config)?
        .iter()
        .map(CliEntry::to_entry)
        .collect();
    let stats = compute_stats(&entries, 0);

    println!("DevKB Statistics");
    println!("================");
    println!();
    println!("  Indexed files:     {}", indexed_files);
    println!("  Index size:        {}", format_bytes(index_size));
    println!("  Knowledge entries: {}", stats.total_entries);
    println!("  Distinct tags:     {}", stats.total_tags);
    println!("  Data directory:    {}", config.data_dir.display());

    if !stats.by_type.is_empty() {
        println!();
        println!("  By type:");
        println!("  {:<16} {:>7}", "TYPE", "ENTRIES");
        println!("  {}", "-".repeat(24));
        for (entry_type, count) in &stats.by_type {
            println!("  {:<16} {:>7}", entry_type.as_str(), count);
        }
    }

    println!();
    Ok(())
}

/// Format a byte count as a human-readable string.
fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(2048), "2.0 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.0 MB");
    }
}
