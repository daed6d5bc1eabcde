//! Per-instance artifacts consumed by the orchestration tool: the compose
//! manifest and the secrets file.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

use rand::RngCore;
use serde::Serialize;

use crate::errors::{FleetError, FleetResult};
use crate::runtime::constants::containers::{
    CONTAINER_CONFIG_DIR, CONTAINER_WORKSPACE_DIR, GATEWAY_SERVICE,
};
use crate::runtime::constants::filenames;
use crate::runtime::layout::dirs;
use crate::runtime::types::PortPair;

/// Gateway auth token length in bytes (256 bits, 64 hex chars).
pub const TOKEN_BYTES: usize = 32;

/// Generate a fresh random hex token for gateway authentication.
pub fn generate_token() -> String {
    let mut random_bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill_bytes(&mut random_bytes);
    hex::encode(random_bytes)
}

// ============================================================================
// COMPOSE MANIFEST
// ============================================================================

#[derive(Debug, Serialize)]
pub struct ComposeManifest {
    pub name: String,
    pub services: BTreeMap<String, ComposeService>,
}

#[derive(Debug, Serialize)]
pub struct ComposeService {
    pub image: String,
    pub container_name: String,
    pub env_file: Vec<String>,
    pub environment: BTreeMap<String, String>,
    pub ports: Vec<String>,
    pub volumes: Vec<String>,
    pub restart: String,
}

impl ComposeManifest {
    /// Manifest for one gateway service publishing both ports on loopback.
    pub fn gateway(project: &str, container_name: &str, image: &str, ports: PortPair) -> Self {
        let environment = BTreeMap::from([
            ("GATEWAY_PORT".to_string(), ports.gateway.to_string()),
            ("BRIDGE_PORT".to_string(), ports.bridge.to_string()),
        ]);

        let service = ComposeService {
            image: image.to_string(),
            container_name: container_name.to_string(),
            env_file: vec![filenames::SECRETS.to_string()],
            environment,
            ports: vec![
                format!("127.0.0.1:{0}:{0}", ports.gateway),
                format!("127.0.0.1:{0}:{0}", ports.bridge),
            ],
            volumes: vec![
                format!("./{}:{}", dirs::CONFIG_DIR, CONTAINER_CONFIG_DIR),
                format!("./{}:{}", dirs::WORKSPACE_DIR, CONTAINER_WORKSPACE_DIR),
            ],
            restart: "unless-stopped".to_string(),
        };

        Self {
            name: project.to_string(),
            services: BTreeMap::from([(GATEWAY_SERVICE.to_string(), service)]),
        }
    }

    pub fn render(&self) -> FleetResult<String> {
        serde_yaml::to_string(self)
            .map_err(|e| FleetError::Internal(format!("failed to render manifest: {e}")))
    }

    pub fn write_to(&self, path: &Path) -> FleetResult<()> {
        let yaml = self.render()?;
        std::fs::write(path, yaml)
            .map_err(|e| FleetError::Storage(format!("failed to write {}: {e}", path.display())))
    }
}

// ============================================================================
// SECRETS FILE
// ============================================================================

/// Contents of the per-instance `.env` file.
#[derive(Debug, Clone)]
pub struct InstanceSecrets {
    pub name: String,
    pub ports: PortPair,
    pub token: String,
}

impl InstanceSecrets {
    pub fn generate(name: &str, ports: PortPair) -> Self {
        Self {
            name: name.to_string(),
            ports,
            token: generate_token(),
        }
    }

    pub fn render(&self) -> String {
        format!(
            "# Generated by gwfleet for instance {name}\n\
             INSTANCE_NAME={name}\n\
             GATEWAY_PORT={gateway}\n\
             BRIDGE_PORT={bridge}\n\
             GATEWAY_TOKEN={token}\n",
            name = self.name,
            gateway = self.ports.gateway,
            bridge = self.ports.bridge,
            token = self.token,
        )
    }

    /// Write the file readable and writable by the owner only.
    pub fn write_to(&self, path: &Path) -> FleetResult<()> {
        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);

        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options
            .open(path)
            .map_err(|e| FleetError::Storage(format!("failed to create {}: {e}", path.display())))?;

        // mode() only applies on creation
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))?;
        }

        file.write_all(self.render().as_bytes())?;
        file.sync_all()?;
        Ok(())
    }
}
