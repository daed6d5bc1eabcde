//! Core data types for instance lifecycle management.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

use crate::runtime::constants::ports::BRIDGE_OFFSET;

// ============================================================================
// PORT PAIR
// ============================================================================

/// Gateway port and its adjacent bridge port.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PortPair {
    pub gateway: u16,
    pub bridge: u16,
}

impl PortPair {
    /// Pair for a gateway port. `None` when the bridge port would overflow.
    pub fn from_gateway(gateway: u16) -> Option<Self> {
        gateway.checked_add(BRIDGE_OFFSET).map(|bridge| Self { gateway, bridge })
    }

    pub fn contains(&self, port: u16) -> bool {
        port == self.gateway || port == self.bridge
    }
}

impl fmt::Display for PortPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.gateway, self.bridge)
    }
}

// ============================================================================
// INSTANCE (persisted)
// ============================================================================

/// Persisted record of one managed gateway instance.
///
/// Immutable after creation; removed from the registry on destroy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub name: String,
    pub gateway_port: u16,
    pub bridge_port: u16,
    pub config_dir: PathBuf,
    pub created_at: DateTime<Utc>,
}

impl Instance {
    pub fn ports(&self) -> PortPair {
        PortPair {
            gateway: self.gateway_port,
            bridge: self.bridge_port,
        }
    }
}

// ============================================================================
// STATUS (derived, never persisted)
// ============================================================================

/// Live status of an instance, recomputed on every query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    /// Gateway container is up.
    Running,

    /// No running gateway container.
    Stopped,

    /// The container runtime could not be queried.
    Unknown,
}

impl InstanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceStatus::Running => "running",
            InstanceStatus::Stopped => "stopped",
            InstanceStatus::Unknown => "unknown",
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self, InstanceStatus::Running)
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Query-time view: a persisted instance together with its live status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct InstanceInfo {
    #[serde(flatten)]
    pub instance: Instance,
    pub status: InstanceStatus,
}

// ============================================================================
// OPERATION OPTIONS
// ============================================================================

#[derive(Clone, Copy, Debug, Default)]
pub struct DestroyOptions {
    /// Leave the instance directory on disk.
    pub keep_data: bool,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct LogOptions {
    pub follow: bool,
    pub tail: Option<u32>,
}
