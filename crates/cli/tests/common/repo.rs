//! Scratch git repositories for integration tests

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{Duration, Instant};
use tempfile::TempDir;

/// Whether a `git` executable is available
pub fn git_available() -> bool {
    Command::new("git").arg("--version").output().is_ok()
}

/// A work tree with a bare `origin`, plus a private config file path
pub struct TestRepo {
    _temp: TempDir,
    pub work: PathBuf,
    pub remote: PathBuf,
    pub config: PathBuf,
}

impl TestRepo {
    pub fn new() -> Result<Self> {
        let temp = TempDir::new()?;
        let work = temp.path().join("work");
        let remote = temp.path().join("remote.git");
        let config = temp.path().join("config/autocommit.toml");
        std::fs::create_dir_all(&work)?;

        git(temp.path(), &["init", "--bare", &remote.to_string_lossy()])?;
        git(&work, &["init"])?;
        git(&work, &["config", "user.name", "Autocommit Test"])?;
        git(&work, &["config", "user.email", "autocommit@example.com"])?;
        git(&work, &["config", "commit.gpgsign", "false"])?;
        git(&work, &["remote", "add", "origin", &remote.to_string_lossy()])?;

        Ok(Self {
            _temp: temp,
            work,
            remote,
            config,
        })
    }

    pub fn write(&self, rel: &str, contents: &str) -> Result<()> {
        let path = self.work.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Run git in the work tree, returning trimmed stdout
    pub fn git(&self, args: &[&str]) -> Result<String> {
        git(&self.work, args)
    }

    /// Subjects of all commits, newest first
    pub fn log_subjects(&self) -> Vec<String> {
        self.git(&["log", "--format=%s"])
            .map(|out| out.lines().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Poll until at least `count` commits exist
    pub fn wait_for_commits(&self, count: usize, timeout: Duration) -> Vec<String> {
        let deadline = Instant::now() + timeout;
        loop {
            let subjects = self.log_subjects();
            if subjects.len() >= count || Instant::now() >= deadline {
                return subjects;
            }
            std::thread::sleep(Duration::from_millis(100));
        }
    }
}

fn git(dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .context("Failed to run git")?;
    if !output.status.success() {
        anyhow::bail!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
