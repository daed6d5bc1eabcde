//! Registry persistence backends.

use std::io::Write;
use std::path::{Path, PathBuf};

use parking_lot::{Mutex, MutexGuard};
use tempfile::NamedTempFile;

use super::Registry;
use crate::errors::{FleetError, FleetResult};
use crate::runtime::lock::RegistryLock;

/// Exclusive access to a store for one read-modify-write cycle.
///
/// Holds the in-process gate and, for shared stores, the cross-process lock.
pub struct StoreGuard<'a> {
    _local: MutexGuard<'a, ()>,
    _shared: RegistryLock,
}

/// Durable home of the [`Registry`].
///
/// `read` and `write` move whole documents. Callers that read, modify and
/// write back must hold the guard from [`RegistryStore::lock`] across the
/// cycle; plain reads may skip it.
pub trait RegistryStore: Send + Sync {
    /// Load the registry, creating an empty one if none exists yet.
    fn read(&self) -> FleetResult<Registry>;

    /// Replace the stored registry.
    fn write(&self, registry: &Registry) -> FleetResult<()>;

    /// Wait for exclusive access to the registry.
    fn lock(&self) -> FleetResult<StoreGuard<'_>>;
}

// ============================================================================
// JSON FILE STORE
// ============================================================================

/// Registry persisted as a single JSON document.
///
/// Writes go to a temporary file in the same directory which is then renamed
/// over the document, so readers never observe a partial write.
#[derive(Debug)]
pub struct JsonRegistryStore {
    path: PathBuf,
    lock_path: PathBuf,
    gate: Mutex<()>,
}

impl JsonRegistryStore {
    pub fn new(path: PathBuf, lock_path: PathBuf) -> Self {
        Self {
            path,
            lock_path,
            gate: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parent_dir(&self) -> FleetResult<&Path> {
        let dir = self.path.parent().ok_or_else(|| {
            FleetError::Internal(format!(
                "registry path {} has no parent",
                self.path.display()
            ))
        })?;
        std::fs::create_dir_all(dir)
            .map_err(|e| FleetError::Storage(format!("failed to create {}: {e}", dir.display())))?;
        Ok(dir)
    }

    fn to_temp_file(&self, registry: &Registry) -> FleetResult<NamedTempFile> {
        let dir = self.parent_dir()?;
        let mut temp = NamedTempFile::new_in(dir)
            .map_err(|e| FleetError::Storage(format!("failed to create temp file: {e}")))?;

        serde_json::to_writer_pretty(&mut temp, registry)
            .map_err(|e| FleetError::Internal(format!("failed to serialize registry: {e}")))?;
        temp.write_all(b"\n")?;
        temp.as_file().sync_all()?;

        Ok(temp)
    }

    /// Persist the empty default unless another writer got there first.
    fn initialize(&self) -> FleetResult<Option<Registry>> {
        let registry = Registry::default();
        let temp = self.to_temp_file(&registry)?;

        match temp.persist_noclobber(&self.path) {
            Ok(_) => {
                tracing::info!(path = %self.path.display(), "Initialized empty registry");
                Ok(Some(registry))
            }
            Err(e) if e.error.kind() == std::io::ErrorKind::AlreadyExists => Ok(None),
            Err(e) => Err(FleetError::Storage(format!(
                "failed to create {}: {}",
                self.path.display(),
                e.error
            ))),
        }
    }
}

impl RegistryStore for JsonRegistryStore {
    fn read(&self) -> FleetResult<Registry> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                if let Some(registry) = self.initialize()? {
                    return Ok(registry);
                }
                std::fs::read_to_string(&self.path)?
            }
            Err(e) => {
                return Err(FleetError::Storage(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )));
            }
        };

        let mut registry: Registry =
            serde_json::from_str(&content).map_err(|e| FleetError::RegistryCorrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        if registry.normalize() {
            tracing::warn!(
                path = %self.path.display(),
                next_port_offset = registry.next_port_offset,
                available = ?registry.available_offsets,
                "Repaired inconsistent offset bookkeeping in registry"
            );
        }

        Ok(registry)
    }

    fn write(&self, registry: &Registry) -> FleetResult<()> {
        let temp = self.to_temp_file(registry)?;
        temp.persist(&self.path).map_err(|e| {
            FleetError::Storage(format!("failed to replace {}: {}", self.path.display(), e.error))
        })?;

        tracing::debug!(
            path = %self.path.display(),
            instances = registry.instances.len(),
            next_offset = registry.next_port_offset,
            "Wrote registry"
        );
        Ok(())
    }

    fn lock(&self) -> FleetResult<StoreGuard<'_>> {
        let local = self.gate.lock();
        let shared = RegistryLock::acquire(&self.lock_path)?;
        Ok(StoreGuard {
            _local: local,
            _shared: shared,
        })
    }
}

// ============================================================================
// IN-MEMORY STORE
// ============================================================================

/// Registry held in memory, for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryRegistryStore {
    registry: Mutex<Registry>,
    gate: Mutex<()>,
}

impl MemoryRegistryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_registry(registry: Registry) -> Self {
        Self {
            registry: Mutex::new(registry),
            gate: Mutex::new(()),
        }
    }
}

impl RegistryStore for MemoryRegistryStore {
    fn read(&self) -> FleetResult<Registry> {
        Ok(self.registry.lock().clone())
    }

    fn write(&self, registry: &Registry) -> FleetResult<()> {
        *self.registry.lock() = registry.clone();
        Ok(())
    }

    fn lock(&self) -> FleetResult<StoreGuard<'_>> {
        Ok(StoreGuard {
            _local: self.gate.lock(),
            _shared: RegistryLock::unshared(),
        })
    }
}
