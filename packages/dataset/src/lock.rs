//! Cross-process write lock for a dataset file.
//!
//! A `<dataset>.lock` file created with `create_new` holds the writer's pid.
//! The lock is released when the guard drops. A lock whose pid is no longer
//! running is treated as stale: it is renamed aside and removed only if the
//! renamed file still names that pid, so a lock another writer created in
//! the meantime is put back rather than deleted.

use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use crate::DatasetError;

const LOCK_RETRY_DELAY: Duration = Duration::from_millis(250);

/// Default time to wait for another writer.
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(300);

/// Held while a dataset is being merged and persisted.
#[derive(Debug)]
pub struct DatasetLock {
    path: PathBuf,
}

impl Drop for DatasetLock {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

impl DatasetLock {
    /// Acquires the lock for `dataset`, waiting up to `timeout` for another
    /// writer to finish.
    ///
    /// # Errors
    ///
    /// Returns [`DatasetError::Locked`] if the lock is still held when the
    /// timeout expires.
    pub fn acquire(dataset: &Path, timeout: Duration) -> Result<Self, DatasetError> {
        let path = lock_path(dataset);
        let started = Instant::now();

        loop {
            match try_acquire(&path) {
                Ok(lock) => {
                    log::debug!("Acquired dataset lock {}", path.display());
                    return Ok(lock);
                }
                Err(LockState::Stale(pid)) => {
                    if remove_stale(&path, pid) {
                        log::warn!("Removed stale dataset lock held by pid {pid}");
                    }
                }
                Err(state) => {
                    if started.elapsed() >= timeout {
                        return Err(DatasetError::Locked {
                            path,
                            pid: state.pid(),
                        });
                    }
                    std::thread::sleep(LOCK_RETRY_DELAY);
                }
            }
        }
    }

    /// The lock file's path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// `weather_summary.csv` → `weather_summary.csv.lock`.
#[must_use]
pub fn lock_path(dataset: &Path) -> PathBuf {
    let mut name = dataset.file_name().unwrap_or_default().to_os_string();
    name.push(".lock");
    dataset.with_file_name(name)
}

#[derive(Debug)]
enum LockState {
    HeldBy(i32),
    Stale(i32),
    Unknown,
}

impl LockState {
    const fn pid(&self) -> Option<i32> {
        match self {
            Self::HeldBy(pid) | Self::Stale(pid) => Some(*pid),
            Self::Unknown => None,
        }
    }
}

fn try_acquire(path: &Path) -> Result<DatasetLock, LockState> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        let _ = std::fs::create_dir_all(parent);
    }

    match OpenOptions::new().create_new(true).write(true).open(path) {
        Ok(mut file) => {
            let _ = writeln!(file, "{}", std::process::id());
            Ok(DatasetLock {
                path: path.to_path_buf(),
            })
        }
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
            match read_pid(path) {
                Some(pid) if is_process_running(pid) => Err(LockState::HeldBy(pid)),
                Some(pid) => Err(LockState::Stale(pid)),
                None => Err(LockState::Unknown),
            }
        }
        Err(_) => Err(LockState::Unknown),
    }
}

fn read_pid(path: &Path) -> Option<i32> {
    let mut pid_buf = String::new();
    OpenOptions::new()
        .read(true)
        .open(path)
        .and_then(|mut file| file.read_to_string(&mut pid_buf))
        .ok()?;
    pid_buf.trim().parse().ok()
}

/// Removes the lock at `path` only if it still belongs to `stale_pid`.
///
/// Returns whether a stale lock was removed.
fn remove_stale(path: &Path, stale_pid: i32) -> bool {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(format!(".stale-{}", std::process::id()));
    let aside = path.with_file_name(name);

    if std::fs::rename(path, &aside).is_err() {
        // Someone else already moved or released it.
        return false;
    }

    if read_pid(&aside) == Some(stale_pid) {
        let _ = std::fs::remove_file(&aside);
        return true;
    }

    // A live writer replaced the stale lock between our check and the
    // rename. Link it back without clobbering any newer lock.
    if let Err(e) = std::fs::hard_link(&aside, path) {
        log::warn!("Could not restore dataset lock {}: {e}", path.display());
    }
    let _ = std::fs::remove_file(&aside);
    false
}

fn is_process_running(pid: i32) -> bool {
    if u32::try_from(pid).is_ok_and(|pid| pid == std::process::id()) {
        return true;
    }

    let proc_dir = Path::new("/proc");
    if proc_dir.is_dir() {
        return proc_dir.join(pid.to_string()).exists();
    }

    std::process::Command::new("kill")
        .arg("-0")
        .arg(pid.to_string())
        .status()
        .is_ok_and(|status| status.success())
}
