//! User-level configuration
//!
//! Stored as TOML at `<config dir>/autocommit/config.toml`, or wherever
//! `AUTOCOMMIT_CONFIG` points. A missing file means defaults.

use anyhow::{Context, Result};
use git::GitSettings;
use pipeline::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use watcher::ignore::IgnoreConfig;
use watcher::WatcherConfig;

/// Environment variable overriding the config file location
pub const CONFIG_ENV: &str = "AUTOCOMMIT_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub watch: WatchSection,
    pub git: GitSection,
}

/// `[watch]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchSection {
    /// Quiet period before a commit is made
    pub debounce_ms: u64,
    /// Per-path write stabilization threshold
    pub stability_ms: u64,
    pub poll_interval_ms: u64,
    pub use_gitignore: bool,
    pub use_autocommitignore: bool,
    pub additional_patterns: Vec<String>,
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            debounce_ms: 3000,
            stability_ms: 1000,
            poll_interval_ms: 100,
            use_gitignore: true,
            use_autocommitignore: true,
            additional_patterns: Vec::new(),
        }
    }
}

/// `[git]` section
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GitSection {
    pub remote: String,
    pub push: bool,
    pub message_prefix: String,
}

impl Default for GitSection {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            push: true,
            message_prefix: autocommit_core::DEFAULT_PREFIX.to_string(),
        }
    }
}

impl SystemConfig {
    /// Range-check every value
    pub fn validate(&self) -> Result<()> {
        check_range("watch.debounce_ms", self.watch.debounce_ms, 100, 600_000)?;
        check_range("watch.stability_ms", self.watch.stability_ms, 0, 60_000)?;
        check_range("watch.poll_interval_ms", self.watch.poll_interval_ms, 10, 5_000)?;

        if self.git.remote.trim().is_empty() {
            anyhow::bail!("git.remote must not be empty");
        }
        if self.git.message_prefix.contains('\n') {
            anyhow::bail!("git.message_prefix must be a single line");
        }
        Ok(())
    }

    pub fn watcher_config(&self) -> WatcherConfig {
        WatcherConfig {
            stability_threshold: Duration::from_millis(self.watch.stability_ms),
            poll_interval: Duration::from_millis(self.watch.poll_interval_ms),
            ignore: IgnoreConfig {
                use_gitignore: self.watch.use_gitignore,
                use_autocommitignore: self.watch.use_autocommitignore,
                additional_patterns: self.watch.additional_patterns.clone(),
            },
        }
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            debounce: Duration::from_millis(self.watch.debounce_ms),
            message_prefix: self.git.message_prefix.clone(),
        }
    }

    pub fn git_settings(&self) -> GitSettings {
        GitSettings {
            remote: self.git.remote.clone(),
            push: self.git.push,
        }
    }

    /// Value of a dotted key, as shown by `config get`
    pub fn get(&self, key: &str) -> Result<String> {
        let value = match key {
            "watch.debounce_ms" => self.watch.debounce_ms.to_string(),
            "watch.stability_ms" => self.watch.stability_ms.to_string(),
            "watch.poll_interval_ms" => self.watch.poll_interval_ms.to_string(),
            "watch.use_gitignore" => self.watch.use_gitignore.to_string(),
            "watch.use_autocommitignore" => self.watch.use_autocommitignore.to_string(),
            "watch.additional_patterns" => self.watch.additional_patterns.join(","),
            "git.remote" => self.git.remote.clone(),
            "git.push" => self.git.push.to_string(),
            "git.message_prefix" => self.git.message_prefix.clone(),
            _ => anyhow::bail!("Unknown config key: {}. Known keys: {}", key, KEYS.join(", ")),
        };
        Ok(value)
    }

    /// Update a dotted key from its string form
    ///
    /// Does not validate ranges; call `validate()` afterwards.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "watch.debounce_ms" => self.watch.debounce_ms = parse_u64(value)?,
            "watch.stability_ms" => self.watch.stability_ms = parse_u64(value)?,
            "watch.poll_interval_ms" => self.watch.poll_interval_ms = parse_u64(value)?,
            "watch.use_gitignore" => self.watch.use_gitignore = parse_bool(value)?,
            "watch.use_autocommitignore" => self.watch.use_autocommitignore = parse_bool(value)?,
            "watch.additional_patterns" => {
                self.watch.additional_patterns = value
                    .split(',')
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .map(str::to_string)
                    .collect();
            }
            "git.remote" => self.git.remote = value.trim().to_string(),
            "git.push" => self.git.push = parse_bool(value)?,
            "git.message_prefix" => self.git.message_prefix = value.to_string(),
            _ => anyhow::bail!("Unknown config key: {}. Known keys: {}", key, KEYS.join(", ")),
        }
        Ok(())
    }
}

/// Keys accepted by `config get` and `config set`
pub const KEYS: &[&str] = &[
    "watch.debounce_ms",
    "watch.stability_ms",
    "watch.poll_interval_ms",
    "watch.use_gitignore",
    "watch.use_autocommitignore",
    "watch.additional_patterns",
    "git.remote",
    "git.push",
    "git.message_prefix",
];

fn check_range(key: &str, value: u64, min: u64, max: u64) -> Result<()> {
    if value < min || value > max {
        anyhow::bail!("{} must be between {} and {} (got {})", key, min, max, value);
    }
    Ok(())
}

fn parse_u64(value: &str) -> Result<u64> {
    value
        .trim()
        .parse()
        .context("Invalid value: must be a non-negative integer")
}

fn parse_bool(value: &str) -> Result<bool> {
    value
        .trim()
        .parse()
        .context("Invalid value: must be 'true' or 'false'")
}

/// Location of the config file
pub fn config_file_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("autocommit").join("config.toml"))
}

/// Load the config file, falling back to defaults when it is missing
pub fn load() -> Result<SystemConfig> {
    match config_file_path() {
        Some(path) => load_from(&path),
        None => Ok(SystemConfig::default()),
    }
}

pub fn load_from(path: &Path) -> Result<SystemConfig> {
    if !path.exists() {
        return Ok(SystemConfig::default());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file {}", path.display()))?;
    let config: SystemConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config file {}", path.display()))?;
    Ok(config)
}

pub fn save(config: &SystemConfig) -> Result<()> {
    let path = config_file_path().context("Could not determine config file path")?;
    save_to(config, &path)
}

pub fn save_to(config: &SystemConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }
    let contents = toml::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write config file {}", path.display()))
}

/// Write the example config if no file exists yet
pub fn init_if_missing() -> Result<PathBuf> {
    let path = config_file_path().context("Could not determine config file path")?;
    if !path.exists() {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }
        std::fs::write(&path, example_config())
            .with_context(|| format!("Failed to write config file {}", path.display()))?;
    }
    Ok(path)
}

pub fn example_config() -> &'static str {
    r#"# autocommit configuration

[watch]
# Quiet period after the last change before committing (100-600000)
debounce_ms = 3000
# A file must stop changing for this long before it counts (0-60000)
stability_ms = 1000
# How often settling files are checked (10-5000)
poll_interval_ms = 100
use_gitignore = true
use_autocommitignore = true
# Extra ignore patterns, gitignore syntax
additional_patterns = []

[git]
# Remote used when a branch has no upstream yet
remote = "origin"
# Set to false to only commit locally
push = true
message_prefix = "[Auto]"
"#
}
