//! Error types for fleet operations.
//!
//! Errors are grouped by how a caller recovers from them:
//! - input problems ([`FleetError::InvalidName`], [`FleetError::PortOutOfRange`],
//!   [`FleetError::PortInUse`]) are detected before any side effect
//! - allocation problems ([`FleetError::AllocationExhausted`],
//!   [`FleetError::RangeExceeded`]) mean the caller should pass an explicit port
//! - runtime problems come from the external container tool
//! - storage problems ([`FleetError::RegistryCorrupt`], [`FleetError::Storage`])
//!   are fatal for the current operation

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while managing gateway instances.
#[derive(Debug, Error)]
pub enum FleetError {
    /// The proposed instance name was rejected.
    #[error("{0}")]
    InvalidName(String),

    /// An explicit port lies outside the range an instance may use.
    #[error("port {port} is out of range (must be between {min} and {max})")]
    PortOutOfRange { port: u32, min: u16, max: u16 },

    /// A port is already bound on the host or claimed by another instance.
    #[error("port {port} is already in use{}", .holder.as_ref().map(|h| format!(" by instance '{h}'")).unwrap_or_default())]
    PortInUse { port: u16, holder: Option<String> },

    /// No free port pair was found within the retry budget.
    #[error(
        "could not find a free port pair after {attempts} attempts; specify one with --port"
    )]
    AllocationExhausted { attempts: usize },

    /// The computed port pair for an offset falls outside the valid port space.
    #[error("port offset {offset} maps to port {port}, which exceeds {max}")]
    RangeExceeded { offset: u32, port: u32, max: u16 },

    /// No instance with this name is registered.
    #[error("instance '{0}' not found")]
    NotFound(String),

    /// The container tool could not be invoked at all.
    #[error("container runtime unavailable: {0}")]
    RuntimeUnavailable(String),

    /// The container tool ran but reported failure.
    #[error("container runtime failed ({command}): {stderr}")]
    RuntimeFailure { command: String, stderr: String },

    /// The registry document exists but cannot be parsed.
    #[error("registry at {path} is corrupt: {reason}")]
    RegistryCorrupt { path: PathBuf, reason: String },

    /// Filesystem-level failure with context.
    #[error("storage: {0}")]
    Storage(String),

    #[error("io: {0}")]
    Io(#[from] io::Error),

    #[error("internal: {0}")]
    Internal(String),
}

impl FleetError {
    /// True for errors caused by caller input, which never leave side effects.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            FleetError::InvalidName(_)
                | FleetError::PortOutOfRange { .. }
                | FleetError::PortInUse { .. }
        )
    }
}

pub type FleetResult<T> = Result<T, FleetError>;
