//! Per-repository lock ensuring one pipeline per watched root

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

const LOCK_FILE: &str = "daemon.lock";

/// Held for as long as a pipeline watches the repository
pub struct DaemonLock {
    path: PathBuf,
    // Keeps the flock alive
    _file: File,
}

/// Lock file content
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockContent {
    pub pid: u32,
    pub started_at: u64,
}

impl DaemonLock {
    /// Acquire the lock in `state_dir`
    ///
    /// Fails if another live process holds it. A lock left behind by a dead
    /// process is removed and acquisition retried.
    pub fn acquire(state_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(state_dir).context("Failed to create state directory")?;
        let lock_path = state_dir.join(LOCK_FILE);

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)
            .context("Failed to open lock file")?;

        if !try_flock_exclusive(&file)? {
            if Self::is_stale_lock(&mut file) {
                tracing::warn!(path = %lock_path.display(), "Removing stale daemon lock");
                drop(file);
                std::fs::remove_file(&lock_path)?;
                return Self::acquire(state_dir);
            }
            let holder = read_lock_content(&mut file)
                .map(|c| format!(" (pid {})", c.pid))
                .unwrap_or_default();
            anyhow::bail!("autocommit is already watching this repository{}", holder);
        }

        write_lock_content(&mut file)?;

        Ok(Self {
            path: lock_path,
            _file: file,
        })
    }

    /// Process currently holding the lock in `state_dir`, if it is alive
    pub fn holder(state_dir: &Path) -> Option<LockContent> {
        let mut file = File::open(state_dir.join(LOCK_FILE)).ok()?;
        let content = read_lock_content(&mut file).ok()?;
        is_process_alive(content.pid).then_some(content)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_stale_lock(file: &mut File) -> bool {
        match read_lock_content(file) {
            Ok(content) => !is_process_alive(content.pid),
            // Holder has not written its PID yet
            Err(_) => false,
        }
    }
}

impl Drop for DaemonLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

fn write_lock_content(file: &mut File) -> Result<()> {
    let content = LockContent {
        pid: std::process::id(),
        started_at: crate::util::now_ms(),
    };

    let serialized = serde_json::to_string(&content).context("Failed to serialize lock content")?;

    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(serialized.as_bytes())?;
    file.sync_all()?;
    Ok(())
}

fn read_lock_content(file: &mut File) -> Result<LockContent> {
    file.seek(SeekFrom::Start(0))?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;
    serde_json::from_str(&contents).context("Failed to deserialize lock content")
}

/// Try to acquire exclusive file lock (non-blocking)
#[cfg(unix)]
fn try_flock_exclusive(file: &File) -> Result<bool> {
    use nix::fcntl::{flock, FlockArg};
    use std::os::unix::io::AsRawFd;

    match flock(file.as_raw_fd(), FlockArg::LockExclusiveNonblock) {
        Ok(_) => Ok(true),
        Err(nix::errno::Errno::EWOULDBLOCK) => Ok(false),
        Err(e) => Err(e.into()),
    }
}

#[cfg(unix)]
pub fn is_process_alive(pid: u32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    // Null signal: existence check only
    match kill(Pid::from_raw(pid as i32), None) {
        Ok(_) => true,
        Err(nix::errno::Errno::ESRCH) => false,
        Err(_) => true,
    }
}
