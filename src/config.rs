//! `.devkb.json` configuration.
//!
//! The file is read once per invocation. Every key is optional and falls
//! back to a built-in default; a missing or unparseable file yields
//! [`Config::default`] rather than an error.
//!
//! ```json
//! {
//!   "dataDir": ".devkb",
//!   "indexPaths": ["./src", "./lib", "./docs"],
//!   "excludePatterns": ["node_modules", "dist", "build", ".git", "*.log"],
//!   "includeExtensions": [],
//!   "server": { "bind": "127.0.0.1:3001" }
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Root of the CLI's on-disk state, relative to the working directory.
    pub data_dir: PathBuf,
    /// Directories walked by `devkb index`.
    pub index_paths: Vec<PathBuf>,
    /// Glob patterns to skip. A pattern without `/` matches any single path
    /// component; one with `/` matches the path relative to the walked root.
    pub exclude_patterns: Vec<String>,
    /// File extensions to keep (`.md` or `md`). Empty keeps everything.
    pub include_extensions: Vec<String>,
    pub server: ServerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3001".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".devkb"),
            index_paths: to_paths(&["./src", "./lib", "./docs"]),
            exclude_patterns: to_strings(&["node_modules", "dist", "build", ".git", "*.log"]),
            include_extensions: Vec::new(),
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    /// The configuration written by `devkb init`.
    pub fn init_template() -> Self {
        Self {
            data_dir: PathBuf::from(".devkb"),
            index_paths: to_paths(&["./src", "./lib", "./docs", "./tests"]),
            exclude_patterns: to_strings(&[
                "node_modules",
                "dist",
                "build",
                ".git",
                "*.log",
                ".env",
            ]),
            include_extensions: to_strings(&[
                ".ts", ".js", ".jsx", ".tsx", ".md", ".txt", ".json", ".yml", ".yaml",
            ]),
            server: ServerConfig::default(),
        }
    }

    pub fn knowledge_dir(&self) -> PathBuf {
        self.data_dir.join("knowledge")
    }

    pub fn index_dir(&self) -> PathBuf {
        self.data_dir.join("index")
    }

    pub fn index_file(&self) -> PathBuf {
        self.index_dir().join("files.json")
    }
}

fn to_paths(items: &[&str]) -> Vec<PathBuf> {
    items.iter().map(PathBuf::from).collect()
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

/// Loads the config at `path`, falling back to defaults when the file is
/// absent or malformed.
pub fn load_config(path: &Path) -> Config {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "config not readable, using defaults");
            return Config::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::debug!(path = %path.display(), error = %e, "config malformed, using defaults");
            Config::default()
        }
    }
}

pub fn write_config(path: &Path, config: &Config) -> Result<()> {
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write config file: {}", path.display()))
}

/// Replaces the port of a `host:port` bind address.
pub fn with_port(bind: &str, port: &str) -> String {
    match bind.rsplit_once(':') {
        Some((host, _)) => format!("{}:{}", host, port),
        None => format!("{}:{}", bind, port),
    }
}

/// Resolves the listen address: an explicit override wins, then the `PORT`
/// environment variable applied to the configured bind, then the config.
pub fn resolve_bind(config: &Config, bind_override: Option<&str>) -> String {
    if let Some(bind) = bind_override {
        return bind.to_string();
    }
    match std::env::var("PORT") {
        Ok(port) if !port.trim().is_empty() => with_port(&config.server.bind, port.trim()),
        _ => config.server.bind.clone(),
    }
}

/// `devkb init`: write the config template and create the data directories.
pub fn run_init(config_path: &Path) -> Result<()> {
    println!("Initializing DevKB...");

    let config = Config::init_template();
    write_config(config_path, &config)?;

    for dir in [config.knowledge_dir(), config.index_dir()] {
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }

    println!("DevKB initialized successfully.");
    println!("Created:");
    println!("  - {}", config_path.display());
    println!("  - {}/", config.knowledge_dir().display());
    println!("  - {}/", config.index_dir().display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let cfg = load_config(&tmp.path().join("nope.json"));
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn test_malformed_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".devkb.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_config(&path), Config::default());
    }

    #[test]
    fn test_partial_file_merges_with_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".devkb.json");
        std::fs::write(&path, r#"{"dataDir": "kb", "includeExtensions": [".rs"]}"#).unwrap();

        let cfg = load_config(&path);
        assert_eq!(cfg.data_dir, PathBuf::from("kb"));
        assert_eq!(cfg.include_extensions, vec![".rs"]);
        assert_eq!(cfg.index_paths, Config::default().index_paths);
        assert_eq!(cfg.server.bind, "127.0.0.1:3001");
        assert_eq!(cfg.index_file(), PathBuf::from("kb/index/files.json"));
    }

    #[test]
    fn test_init_template_round_trips() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(".devkb.json");
        write_config(&path, &Config::init_template()).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"dataDir\""));
        assert!(raw.contains("\"includeExtensions\""));
        assert_eq!(load_config(&path), Config::init_template());
    }

    #[test]
    fn test_with_port() {
        assert_eq!(with_port("127.0.0.1:3001", "8080"), "127.0.0.1:8080");
        assert_eq!(with_port("localhost", "8080"), "localhost:8080");
    }

    #[test]
    fn test_explicit_bind_wins() {
        let cfg = Config::default();
        assert_eq!(resolve_bind(&cfg, Some("0.0.0.0:9000")), "0.0.0.0:9000");
    }
}
