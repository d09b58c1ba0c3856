//! Ignore pattern management for the watcher
//!
//! Supports multiple sources of ignore patterns:
//! 1. Built-in patterns (VCS metadata, dependency and build directories,
//!    log files, editor and OS litter - always active)
//! 2. .autocommitignore patterns (optional, enabled by default)
//! 3. .gitignore patterns (optional, enabled by default)
//! 4. Config-based patterns (additional custom patterns)
//!
//! Ignore files are read at every level of the tree. As with git, patterns
//! are relative to the directory holding the file and deeper files win.

use anyhow::Result;
use ignore::gitignore::{Gitignore, GitignoreBuilder};
use ignore::WalkBuilder;
use serde::{Deserialize, Serialize};
use std::path::{Component, Path, PathBuf};

/// File name of the watcher-specific ignore file
pub const AUTOCOMMIT_IGNORE_FILE: &str = ".autocommitignore";

/// Directory names that are never watched, wherever they appear
const BUILTIN_DIRS: &[&str] = &[
    ".git",
    "node_modules",
    "dist",
    "build",
    "target",
    "coverage",
    ".next",
    ".cache",
    ".vscode",
    ".idea",
    "__pycache__",
    ".venv",
];

/// Ignore rule manager
///
/// Combines multiple sources of ignore patterns with proper precedence:
/// 1. Built-in patterns (highest priority - always enforced)
/// 2. .autocommitignore patterns (override .gitignore)
/// 3. .gitignore patterns (lowest priority)
pub struct IgnoreRules {
    /// Watched root directory
    root: PathBuf,

    /// Gitignore patterns (optional)
    gitignore: Option<IgnoreFiles>,

    /// Watcher-specific ignore patterns (optional)
    acignore: Option<IgnoreFiles>,

    /// Configuration
    config: IgnoreConfig,
}

impl IgnoreRules {
    /// Load ignore rules for a watched root
    pub fn load(root: &Path, config: IgnoreConfig) -> Result<Self> {
        let mut rules = Self {
            root: root.to_path_buf(),
            gitignore: None,
            acignore: None,
            config,
        };

        rules.reload_ignore_files()?;
        Ok(rules)
    }

    /// Reload ignore files from disk
    ///
    /// Called by the watcher when .gitignore or .autocommitignore changes.
    pub fn reload_ignore_files(&mut self) -> Result<()> {
        self.gitignore = if self.config.use_gitignore {
            self.build_matcher(".gitignore")?
        } else {
            None
        };

        self.acignore = if self.config.use_autocommitignore {
            self.build_matcher(AUTOCOMMIT_IGNORE_FILE)?
        } else {
            None
        };

        Ok(())
    }

    fn build_matcher(&self, file_name: &str) -> Result<Option<IgnoreFiles>> {
        let files = IgnoreFiles::load(&self.root, file_name)?;
        Ok((!files.is_empty()).then_some(files))
    }

    /// Whether a change to `path` should reload the ignore files
    pub fn is_ignore_file(path: &Path) -> bool {
        matches!(
            path.file_name().and_then(|n| n.to_str()),
            Some(".gitignore") | Some(AUTOCOMMIT_IGNORE_FILE)
        )
    }

    /// Check if path should be ignored
    ///
    /// `path` is relative to the watched root.
    pub fn should_ignore(&self, path: &Path) -> bool {
        // 1. Built-in patterns (highest priority - always enforced)
        if is_builtin_ignored(path) {
            return true;
        }

        let is_dir = self.root.join(path).is_dir();

        // 2. .autocommitignore (overrides .gitignore)
        if let Some(ref acignore) = self.acignore {
            if let Some(ignored) = acignore.matched(path, is_dir) {
                return ignored;
            }
        }

        // 3. .gitignore (lowest priority)
        if let Some(ref gitignore) = self.gitignore {
            if gitignore.matched(path, is_dir) == Some(true) {
                return true;
            }
        }

        // 4. Additional config patterns
        self.config
            .additional_patterns
            .iter()
            .any(|pattern| matches_glob_pattern(path, pattern))
    }

    /// Get number of active ignore sources
    pub fn active_sources(&self) -> usize {
        let mut count = 1; // Built-in always active
        if self.gitignore.is_some() {
            count += 1;
        }
        if self.acignore.is_some() {
            count += 1;
        }
        if !self.config.additional_patterns.is_empty() {
            count += 1;
        }
        count
    }

    /// Get watched root
    pub fn root(&self) -> &Path {
        &self.root
    }
}

/// Every ignore file of one name under the root, deepest first
struct IgnoreFiles {
    /// (directory relative to the root, matcher rooted there)
    scoped: Vec<(PathBuf, Gitignore)>,
}

impl IgnoreFiles {
    fn load(root: &Path, file_name: &str) -> Result<Self> {
        let walker = WalkBuilder::new(root)
            .standard_filters(false)
            .hidden(false)
            .filter_entry(|entry| {
                !(entry.file_type().map_or(false, |t| t.is_dir())
                    && entry.depth() > 0
                    && entry
                        .file_name()
                        .to_str()
                        .map_or(false, |name| BUILTIN_DIRS.contains(&name)))
            })
            .build();

        let mut scoped = Vec::new();
        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if entry.file_name() != file_name || !entry.file_type().map_or(false, |t| t.is_file()) {
                continue;
            }

            let path = entry.path();
            let Some(dir) = path.parent() else { continue };
            let mut builder = GitignoreBuilder::new(dir);
            if let Some(err) = builder.add(path) {
                tracing::warn!(file = %path.display(), "Partially invalid ignore file: {}", err);
            }
            let rel_dir = dir.strip_prefix(root).unwrap_or(Path::new("")).to_path_buf();
            scoped.push((rel_dir, builder.build()?));
        }

        scoped.sort_by_key(|(dir, _)| std::cmp::Reverse(dir.components().count()));
        Ok(Self { scoped })
    }

    fn is_empty(&self) -> bool {
        self.scoped.is_empty()
    }

    /// Some(true) if ignored, Some(false) if whitelisted, None if no file
    /// has an opinion. `path` is relative to the watched root.
    fn matched(&self, path: &Path, is_dir: bool) -> Option<bool> {
        for (dir, matcher) in &self.scoped {
            let Ok(rel) = path.strip_prefix(dir) else { continue };
            if rel.as_os_str().is_empty() {
                continue;
            }
            let matched = matcher.matched_path_or_any_parents(rel, is_dir);
            if matched.is_ignore() {
                return Some(true);
            }
            if matched.is_whitelist() {
                return Some(false);
            }
        }
        None
    }
}

/// Check if path matches built-in ignore patterns
fn is_builtin_ignored(path: &Path) -> bool {
    let in_builtin_dir = path.components().any(|component| match component {
        Component::Normal(name) => name
            .to_str()
            .map(|name| BUILTIN_DIRS.contains(&name))
            .unwrap_or(false),
        _ => false,
    });
    if in_builtin_dir {
        return true;
    }

    let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    is_litter_file(filename)
}

/// Log files, editor temporaries and OS metadata files
fn is_litter_file(filename: &str) -> bool {
    // Log files
    if filename.ends_with(".log") {
        return true;
    }

    // Vim swap files (.swp, .swo, .swn, .swm)
    if filename.ends_with(".swp")
        || filename.ends_with(".swo")
        || filename.ends_with(".swn")
        || filename.ends_with(".swm") {
        return true;
    }

    // Vim/Emacs backup files (~)
    if filename.ends_with('~') {
        return true;
    }

    // Emacs auto-save (#*#) and lock files (.#*)
    if (filename.len() > 1 && filename.starts_with('#') && filename.ends_with('#'))
        || filename.starts_with(".#") {
        return true;
    }

    // MacOS and Windows system files
    filename == ".DS_Store"
        || filename.starts_with("._")
        || filename == "Thumbs.db"
        || filename == "desktop.ini"
}

/// Match glob pattern (simple implementation)
///
/// A single `*` splits the pattern into prefix and suffix; anything else is
/// a substring match. Full gitignore syntax belongs in .autocommitignore.
fn matches_glob_pattern(path: &Path, pattern: &str) -> bool {
    let path_str = path.to_string_lossy();

    match pattern.split_once('*') {
        Some((prefix, suffix)) if !suffix.contains('*') => {
            path_str.starts_with(prefix) && path_str.ends_with(suffix)
        }
        Some(_) => false,
        None => path_str.contains(pattern),
    }
}

/// Ignore configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IgnoreConfig {
    /// Use .gitignore patterns (default: true)
    #[serde(default = "default_true")]
    pub use_gitignore: bool,

    /// Use .autocommitignore patterns (default: true)
    #[serde(default = "default_true")]
    pub use_autocommitignore: bool,

    /// Additional patterns from config
    #[serde(default)]
    pub additional_patterns: Vec<String>,
}

impl Default for IgnoreConfig {
    fn default() -> Self {
        Self {
            use_gitignore: true,
            use_autocommitignore: true,
            additional_patterns: vec![],
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_patterns_always_enforced() {
        let temp_dir = TempDir::new().unwrap();
        let rules = IgnoreRules::load(temp_dir.path(), IgnoreConfig::default()).unwrap();

        assert!(rules.should_ignore(Path::new(".git/objects/ab/cd")));
        assert!(rules.should_ignore(Path::new("packages/web/.git/config")));
        assert!(rules.should_ignore(Path::new("node_modules/left-pad/index.js")));
        assert!(rules.should_ignore(Path::new("dist/bundle.js")));
        assert!(rules.should_ignore(Path::new("app/build/out.css")));
        assert!(rules.should_ignore(Path::new("server.log")));
        assert!(rules.should_ignore(Path::new("src/.main.ts.swp")));
        assert!(rules.should_ignore(Path::new("docs/.DS_Store")));

        // Normal files should not be ignored
        assert!(!rules.should_ignore(Path::new("src/main.ts")));
        assert!(!rules.should_ignore(Path::new("README.md")));
        assert!(!rules.should_ignore(Path::new("src/builder.ts")));
    }

    #[test]
    fn test_gitignore_parsing() -> Result<()> {
        let temp_dir = TempDir::new()?;
        fs::write(temp_dir.path().join(".gitignore"), "*.tmp\nout/\nsecrets.json\n")?;
        fs::create_dir_all(temp_dir.path().join("out"))?;

        let config = IgnoreConfig {
            use_gitignore: true,
            use_autocommitignore: false,
            additional_patterns: vec![],
        };
        let rules = IgnoreRules::load(temp_dir.path(), config)?;

        assert!(rules.should_ignore(Path::new("file.tmp")));
        assert!(rules.should_ignore(Path::new("out")));
        assert!(rules.should_ignore(Path::new("out/report.html")));
        assert!(rules.should_ignore(Path::new("config/secrets.json")));

        assert!(!rules.should_ignore(Path::new("src/main.ts")));
        assert!(!rules.should_ignore(Path::new("package.json")));

        Ok(())
    }

    #[test]
    fn test_autocommitignore_overrides_gitignore() -> Result<()> {
        let temp_dir = TempDir::new()?;
        fs::write(temp_dir.path().join(".gitignore"), "*.env\n")?;
        fs::write(temp_dir.path().join(AUTOCOMMIT_IGNORE_FILE), "!shared.env\ndrafts/\n")?;

        let rules = IgnoreRules::load(temp_dir.path(), IgnoreConfig::default())?;

        assert!(rules.should_ignore(Path::new("local.env")));
        assert!(!rules.should_ignore(Path::new("shared.env")));
        assert!(rules.should_ignore(Path::new("drafts/idea.md")));
        assert_eq!(rules.active_sources(), 3);

        Ok(())
    }

    #[test]
    fn test_additional_patterns() {
        let temp_dir = TempDir::new().unwrap();
        let config = IgnoreConfig {
            use_gitignore: false,
            use_autocommitignore: false,
            additional_patterns: vec!["*.bak".to_string(), "generated/".to_string()],
        };
        let rules = IgnoreRules::load(temp_dir.path(), config).unwrap();

        assert!(rules.should_ignore(Path::new("notes.md.bak")));
        assert!(rules.should_ignore(Path::new("src/generated/api.ts")));
        assert!(!rules.should_ignore(Path::new("src/api.ts")));
    }

    #[test]
    fn test_gitignore_disabled() -> Result<()> {
        let temp_dir = TempDir::new()?;
        fs::write(temp_dir.path().join(".gitignore"), "*.md\n")?;

        let config = IgnoreConfig {
            use_gitignore: false,
            use_autocommitignore: false,
            additional_patterns: vec![],
        };
        let rules = IgnoreRules::load(temp_dir.path(), config)?;

        assert!(!rules.should_ignore(Path::new("README.md")));
        // Built-ins still apply
        assert!(rules.should_ignore(Path::new(".git/HEAD")));
        assert_eq!(rules.active_sources(), 1);

        Ok(())
    }

    #[test]
    fn test_reload_ignore_files() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let mut rules = IgnoreRules::load(temp_dir.path(), IgnoreConfig::default())?;

        assert!(!rules.should_ignore(Path::new("scratch.txt")));

        fs::write(temp_dir.path().join(".gitignore"), "scratch.txt\n")?;
        rules.reload_ignore_files()?;

        assert!(rules.should_ignore(Path::new("scratch.txt")));
        Ok(())
    }

    #[test]
    fn test_nested_ignore_files_apply_to_their_subtree() -> Result<()> {
        let temp_dir = TempDir::new()?;
        fs::write(temp_dir.path().join(".gitignore"), "*.tmp\n")?;
        fs::create_dir_all(temp_dir.path().join("packages/web/generated"))?;
        fs::write(temp_dir.path().join("packages/web/.gitignore"), "generated/\n!keep.tmp\n")?;

        let rules = IgnoreRules::load(temp_dir.path(), IgnoreConfig::default())?;

        assert!(rules.should_ignore(Path::new("packages/web/generated/api.ts")));
        // Scoped to packages/web only
        assert!(!rules.should_ignore(Path::new("generated/api.ts")));
        // Deeper file overrides the root one
        assert!(!rules.should_ignore(Path::new("packages/web/keep.tmp")));
        assert!(rules.should_ignore(Path::new("packages/web/other.tmp")));
        assert!(rules.should_ignore(Path::new("scratch.tmp")));

        Ok(())
    }

    #[test]
    fn test_nested_ignore_file_change_reloads() -> Result<()> {
        let temp_dir = TempDir::new()?;
        fs::create_dir_all(temp_dir.path().join("docs"))?;
        let mut rules = IgnoreRules::load(temp_dir.path(), IgnoreConfig::default())?;
        assert!(!rules.should_ignore(Path::new("docs/draft.md")));

        let nested = temp_dir.path().join("docs").join(AUTOCOMMIT_IGNORE_FILE);
        fs::write(&nested, "draft.md\n")?;
        assert!(IgnoreRules::is_ignore_file(&nested));
        rules.reload_ignore_files()?;

        assert!(rules.should_ignore(Path::new("docs/draft.md")));
        assert!(!rules.should_ignore(Path::new("draft.md")));
        Ok(())
    }

    #[test]
    fn test_ignore_files_inside_builtin_dirs_are_skipped() -> Result<()> {
        let temp_dir = TempDir::new()?;
        fs::create_dir_all(temp_dir.path().join("node_modules/pkg"))?;
        fs::write(temp_dir.path().join("node_modules/pkg/.gitignore"), "*\n")?;

        let rules = IgnoreRules::load(temp_dir.path(), IgnoreConfig::default())?;

        assert_eq!(rules.active_sources(), 1);
        Ok(())
    }

    #[test]
    fn test_is_ignore_file() {
        assert!(IgnoreRules::is_ignore_file(Path::new(".gitignore")));
        assert!(IgnoreRules::is_ignore_file(Path::new("sub/.autocommitignore")));
        assert!(!IgnoreRules::is_ignore_file(Path::new("gitignore.md")));
    }
}
