//! Constants for the gwfleet runtime
//!
//! Centralized location for port-space parameters, naming rules, and
//! file names shared by the registry, allocator and lifecycle controller.

/// Port space used by the allocator.
///
/// Offset `k` maps to gateway port `BASE_PORT + k * PORT_STEP` and bridge
/// port one above it.
pub mod ports {
    /// Gateway port of offset 0.
    pub const BASE_PORT: u16 = 18789;

    /// Distance between consecutive offsets.
    ///
    /// Must cover [`FOOTPRINT`], otherwise the auxiliary range of one
    /// instance runs into the primary ports of the next.
    pub const PORT_STEP: u16 = 120;

    /// Highest valid TCP port.
    pub const MAX_PORT: u16 = 65535;

    /// Lowest port accepted on the explicit-port path.
    pub const MIN_EXPLICIT_PORT: u16 = 1024;

    /// Highest gateway port accepted on the explicit-port path (bridge = +1).
    pub const MAX_EXPLICIT_PORT: u16 = 65534;

    /// Candidate offsets tried before giving up.
    pub const MAX_ALLOCATION_ATTEMPTS: usize = 10;

    /// Bridge port, relative to the gateway port.
    pub const BRIDGE_OFFSET: u16 = 1;

    /// Browser control port the gateway derives from its own port.
    pub const BROWSER_CONTROL_OFFSET: u16 = 2;

    /// First port of the auxiliary (browser debugging) range.
    pub const AUX_RANGE_START_OFFSET: u16 = 11;

    /// Number of ports in the auxiliary range.
    pub const AUX_RANGE_LEN: u16 = 100;

    /// Ports a gateway occupies counting from its own port.
    pub const FOOTPRINT: u16 = AUX_RANGE_START_OFFSET + AUX_RANGE_LEN;

    const _: () = assert!(PORT_STEP >= FOOTPRINT);
}

/// Instance naming rules.
pub mod naming {
    pub const MAX_NAME_LEN: usize = 32;
}

/// Container and orchestration naming.
pub mod containers {
    /// Default prefix for container and project names.
    pub const DEFAULT_PREFIX: &str = "gwfleet";

    /// Default gateway image.
    pub const DEFAULT_IMAGE: &str = "gwfleet-gateway:local";

    /// Default orchestration program (invoked as `<program> compose ...`).
    pub const DEFAULT_COMPOSE_PROGRAM: &str = "docker";

    /// Service name inside every generated manifest.
    pub const GATEWAY_SERVICE: &str = "gateway";

    /// Mount points inside the gateway container.
    pub const CONTAINER_CONFIG_DIR: &str = "/home/node/.gateway";
    pub const CONTAINER_WORKSPACE_DIR: &str = "/home/node/workspace";
}

pub mod envs {
    pub const GWFLEET_HOME: &str = "GWFLEET_HOME";
    pub const GWFLEET_IMAGE: &str = "GWFLEET_IMAGE";
    pub const GWFLEET_COMPOSE: &str = "GWFLEET_COMPOSE";
}

/// File naming patterns
pub mod filenames {
    /// Registry document
    pub const REGISTRY: &str = "registry.json";

    /// Advisory lock guarding registry read-modify-write cycles
    pub const REGISTRY_LOCK: &str = "registry.lock";

    /// Per-instance secrets file
    pub const SECRETS: &str = ".env";

    /// Per-instance orchestration manifest
    pub const MANIFEST: &str = "docker-compose.yml";

    /// Log file under the logs directory
    pub const LOG_FILE: &str = "gwfleet.log";
}
