//! Advisory lock serializing registry read-modify-write cycles.
//!
//! Uses `flock` on a sidecar file next to the registry document.
//! Acquisition blocks until the current holder releases.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use crate::errors::{FleetError, FleetResult};

/// A guard holding an exclusive lock on the registry lock file.
///
/// Released when dropped, or when the process exits/crashes.
#[derive(Debug)]
pub struct RegistryLock {
    file: Option<File>,
    path: Option<PathBuf>,
}

impl RegistryLock {
    /// Acquire an exclusive lock on `lock_path`, waiting for other holders.
    ///
    /// The parent directory and the lock file are created if absent.
    pub fn acquire(lock_path: &Path) -> FleetResult<Self> {
        if let Some(parent) = lock_path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| FleetError::Storage(format!("failed to create home dir: {e}")))?;
        }

        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(lock_path)
            .map_err(|e| FleetError::Storage(format!("failed to open lock file: {e}")))?;

        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;

            let fd = file.as_raw_fd();
            loop {
                let result = unsafe { libc::flock(fd, libc::LOCK_EX) };
                if result == 0 {
                    break;
                }
                let err = std::io::Error::last_os_error();
                if err.kind() != std::io::ErrorKind::Interrupted {
                    return Err(FleetError::Storage(format!(
                        "failed to acquire registry lock: {err}"
                    )));
                }
            }
        }

        #[cfg(not(unix))]
        {
            compile_error!("registry locking is only implemented for unix targets");
        }

        tracing::trace!(lock_path = %lock_path.display(), "Acquired registry lock");

        Ok(RegistryLock {
            file: Some(file),
            path: Some(lock_path.to_path_buf()),
        })
    }

    /// A guard that holds nothing, for stores without cross-process sharing.
    pub fn unshared() -> Self {
        RegistryLock {
            file: None,
            path: None,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}

impl Drop for RegistryLock {
    fn drop(&mut self) {
        #[cfg(unix)]
        if let Some(file) = &self.file {
            use std::os::unix::io::AsRawFd;
            let fd = file.as_raw_fd();
            unsafe {
                libc::flock(fd, libc::LOCK_UN);
            }
        }

        if let Some(path) = &self.path {
            tracing::trace!(lock_path = %path.display(), "Released registry lock");
        }
    }
}
