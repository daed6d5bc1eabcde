use crate::errors::{FleetError, FleetResult};
use crate::runtime::constants::filenames;
use std::path::{Path, PathBuf};

/// Directory structure constants
pub mod dirs {
    /// Base directory name for gwfleet data
    pub const GWFLEET_DIR: &str = ".gwfleet";

    /// Subdirectory holding one directory per instance
    pub const INSTANCES_DIR: &str = "instances";

    /// Subdirectory for log files
    pub const LOGS_DIR: &str = "logs";

    /// Per-instance configuration subtree
    pub const CONFIG_DIR: &str = "config";

    /// Per-instance workspace subtree
    pub const WORKSPACE_DIR: &str = "workspace";
}

// ============================================================================
// FILESYSTEM LAYOUT (home directory)
// ============================================================================

/// Filesystem layout of a gwfleet installation.
///
/// ```text
/// ~/.gwfleet/
/// ├── registry.json        # Instance registry
/// ├── registry.lock        # Advisory lock for registry updates
/// ├── logs/
/// │   └── gwfleet.log
/// └── instances/
///     └── {name}/          # See InstanceLayout
/// ```
#[derive(Clone, Debug)]
pub struct FilesystemLayout {
    home_dir: PathBuf,
}

impl FilesystemLayout {
    pub fn new(home_dir: PathBuf) -> Self {
        Self { home_dir }
    }

    pub fn home_dir(&self) -> &Path {
        &self.home_dir
    }

    pub fn registry_path(&self) -> PathBuf {
        self.home_dir.join(filenames::REGISTRY)
    }

    pub fn registry_lock_path(&self) -> PathBuf {
        self.home_dir.join(filenames::REGISTRY_LOCK)
    }

    pub fn logs_dir(&self) -> PathBuf {
        self.home_dir.join(dirs::LOGS_DIR)
    }

    /// Root directory for all instances: ~/.gwfleet/instances
    pub fn instances_dir(&self) -> PathBuf {
        self.home_dir.join(dirs::INSTANCES_DIR)
    }

    /// Initialize the filesystem structure.
    pub fn prepare(&self) -> FleetResult<()> {
        std::fs::create_dir_all(&self.home_dir)
            .map_err(|e| FleetError::Storage(format!("failed to create home: {e}")))?;

        std::fs::create_dir_all(self.instances_dir())
            .map_err(|e| FleetError::Storage(format!("failed to create instances dir: {e}")))?;

        std::fs::create_dir_all(self.logs_dir())
            .map_err(|e| FleetError::Storage(format!("failed to create logs dir: {e}")))?;

        Ok(())
    }

    /// Layout for a specific instance. The name must already be validated.
    pub fn instance_layout(&self, name: &str) -> InstanceLayout {
        InstanceLayout::new(self.instances_dir().join(name))
    }
}

// ============================================================================
// INSTANCE LAYOUT (per-instance directory)
// ============================================================================

/// Filesystem layout for a single instance directory.
///
/// ```text
/// ~/.gwfleet/instances/{name}/
/// ├── config/              # Gateway configuration (mounted into container)
/// ├── workspace/           # Gateway workspace (mounted into container)
/// ├── .env                 # Secrets, mode 0600
/// └── docker-compose.yml   # Orchestration manifest
/// ```
#[derive(Clone, Debug)]
pub struct InstanceLayout {
    root: PathBuf,
}

impl InstanceLayout {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Root directory for this instance: ~/.gwfleet/instances/{name}
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_dir(&self) -> PathBuf {
        self.root.join(dirs::CONFIG_DIR)
    }

    pub fn workspace_dir(&self) -> PathBuf {
        self.root.join(dirs::WORKSPACE_DIR)
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.root.join(filenames::SECRETS)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(filenames::MANIFEST)
    }

    /// Create the config and workspace subtrees.
    pub fn prepare(&self) -> FleetResult<()> {
        std::fs::create_dir_all(self.config_dir())
            .map_err(|e| FleetError::Storage(format!("failed to create config dir: {e}")))?;

        std::fs::create_dir_all(self.workspace_dir())
            .map_err(|e| FleetError::Storage(format!("failed to create workspace dir: {e}")))?;

        Ok(())
    }

    /// Recursively remove the instance directory. Missing directories are fine.
    pub fn remove(&self) -> FleetResult<()> {
        match std::fs::remove_dir_all(&self.root) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(FleetError::Storage(format!(
                "failed to remove {}: {e}",
                self.root.display()
            ))),
        }
    }
}
