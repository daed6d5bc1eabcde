//! gwfleet - run several isolated gateway instances side by side.
//!
//! The crate keeps a registry of instances, hands each one a non-conflicting
//! pair of ports, and produces the compose manifest and secrets file the
//! container runtime needs to run it.
//!
//! # Example
//!
//! ```rust,no_run
//! use gwfleet::{DestroyOptions, FleetOptions, GatewayFleet};
//!
//! # async fn demo() -> gwfleet::FleetResult<()> {
//! let fleet = GatewayFleet::new(FleetOptions::default())?;
//!
//! let instance = fleet.create("dev", None)?;
//! println!("{} on {}", instance.name, instance.gateway_port);
//!
//! fleet.start("dev").await?;
//! for info in fleet.list().await? {
//!     println!("{}: {}", info.instance.name, info.status);
//! }
//! fleet.destroy("dev", DestroyOptions::default()).await?;
//! # Ok(())
//! # }
//! ```

pub mod compose;
pub mod errors;
pub mod naming;
pub mod ports;
pub mod registry;
pub mod runtime;
pub mod util;

use std::sync::OnceLock;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub use compose::{ComposeContext, ComposeRuntime, ContainerRuntime};
pub use errors::{FleetError, FleetResult};
pub use ports::{LoopbackProbe, PortAllocator, PortProbe};
pub use registry::{JsonRegistryStore, MemoryRegistryStore, Registry, RegistryStore};
pub use runtime::GatewayFleet;
pub use runtime::layout::{FilesystemLayout, InstanceLayout};
pub use runtime::options::FleetOptions;
pub use runtime::types::{
    DestroyOptions, Instance, InstanceInfo, InstanceStatus, LogOptions, PortPair,
};

use runtime::constants::filenames;

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Send library logs to `<home>/logs/gwfleet.log`.
///
/// Filter comes from `RUST_LOG`, default `info`. Only the first call in a
/// process installs anything.
pub fn init_logging_for(layout: &FilesystemLayout) -> FleetResult<()> {
    if LOG_GUARD.get().is_some() {
        return Ok(());
    }

    let logs_dir = layout.logs_dir();
    std::fs::create_dir_all(&logs_dir)
        .map_err(|e| FleetError::Storage(format!("failed to create logs dir: {e}")))?;

    let appender = tracing_appender::rolling::never(&logs_dir, filenames::LOG_FILE);
    let (non_blocking, guard) = tracing_appender::non_blocking(appender);
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    util::register_to_tracing(non_blocking, env_filter);
    let _ = LOG_GUARD.set(guard);
    Ok(())
}
