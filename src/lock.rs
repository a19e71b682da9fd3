//! Lock file management for single-instance enforcement.
//!
//! One dozr per host: two controllers issuing suspend decisions against
//! the same machine would fight each other. The lock lives in the runtime
//! directory and records our PID so a conflicting start can name the
//! existing instance.

use anyhow::{Context, Result};
use fs2::FileExt;
use std::fs::File;
use std::io::{Seek, SeekFrom, Write};

/// An acquired instance lock. Released (and the file removed) on drop.
pub struct InstanceLock {
    file: File,
    path: String,
}

/// Path of the lock file in the runtime directory.
pub fn lock_path() -> String {
    let runtime_dir = std::env::var("XDG_RUNTIME_DIR").unwrap_or_else(|_| "/tmp".to_string());
    format!("{runtime_dir}/dozr.lock")
}

/// Acquire the exclusive instance lock.
///
/// Returns `Ok(None)` when another live instance holds the lock; stale
/// locks from dead processes are cleaned up and retried once.
pub fn acquire_lock() -> Result<Option<InstanceLock>> {
    let path = lock_path();

    // Open without truncating so an existing holder's PID stays readable.
    let mut file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&path)
        .with_context(|| format!("Failed to open lock file {path}"))?;

    match file.try_lock_exclusive() {
        Ok(()) => {
            write_holder(&mut file)?;
            Ok(Some(InstanceLock { file, path }))
        }
        Err(_) => {
            if !holder_is_alive(&path) {
                log_warning!("Removing stale lock file");
                let _ = std::fs::remove_file(&path);

                let mut retry = std::fs::OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(false)
                    .open(&path)
                    .with_context(|| format!("Failed to reopen lock file {path}"))?;
                if retry.try_lock_exclusive().is_ok() {
                    write_holder(&mut retry)?;
                    return Ok(Some(InstanceLock { file: retry, path }));
                }
            }

            if let Some(pid) = holder_pid(&path) {
                log_pipe!();
                log_error!("dozr is already running (PID: {pid})");
            } else {
                log_pipe!();
                log_error!("dozr is already running");
            }
            Ok(None)
        }
    }
}

fn write_holder(file: &mut File) -> Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    writeln!(file, "{}", std::process::id())?;
    file.flush()?;
    Ok(())
}

fn holder_pid(path: &str) -> Option<u32> {
    let content = std::fs::read_to_string(path).ok()?;
    content.trim().lines().next()?.parse().ok()
}

fn holder_is_alive(path: &str) -> bool {
    match holder_pid(path) {
        Some(pid) => std::path::Path::new(&format!("/proc/{pid}")).exists(),
        // Unreadable or malformed lock counts as stale.
        None => false,
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
        let _ = std::fs::remove_file(&self.path);
    }
}
