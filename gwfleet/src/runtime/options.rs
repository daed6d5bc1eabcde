//! Configuration for gwfleet.

use crate::runtime::constants::{containers, envs as const_envs};
use crate::runtime::layout::dirs as const_dirs;
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Options shared by every fleet operation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FleetOptions {
    /// Installation directory holding the registry and instance directories.
    ///
    /// Default: `$GWFLEET_HOME`, else `~/.gwfleet`.
    #[serde(default = "default_home_dir")]
    pub home_dir: PathBuf,

    /// Gateway image referenced by generated manifests.
    ///
    /// Default: `$GWFLEET_IMAGE`, else `gwfleet-gateway:local`.
    #[serde(default = "default_image")]
    pub image: String,

    /// Prefix for container and orchestration project names.
    #[serde(default = "default_container_prefix")]
    pub container_prefix: String,

    /// Program providing the `compose` subcommand.
    ///
    /// Default: `$GWFLEET_COMPOSE`, else `docker`.
    #[serde(default = "default_compose_program")]
    pub compose_program: String,
}

fn default_home_dir() -> PathBuf {
    if let Ok(home) = std::env::var(const_envs::GWFLEET_HOME)
        && !home.is_empty()
    {
        return PathBuf::from(home);
    }

    let mut path = home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(const_dirs::GWFLEET_DIR);
    path
}

fn default_image() -> String {
    std::env::var(const_envs::GWFLEET_IMAGE)
        .ok()
        .filter(|image| !image.is_empty())
        .unwrap_or_else(|| containers::DEFAULT_IMAGE.to_string())
}

fn default_container_prefix() -> String {
    containers::DEFAULT_PREFIX.to_string()
}

fn default_compose_program() -> String {
    std::env::var(const_envs::GWFLEET_COMPOSE)
        .ok()
        .filter(|program| !program.is_empty())
        .unwrap_or_else(|| containers::DEFAULT_COMPOSE_PROGRAM.to_string())
}

impl Default for FleetOptions {
    fn default() -> Self {
        Self {
            home_dir: default_home_dir(),
            image: default_image(),
            container_prefix: default_container_prefix(),
            compose_program: default_compose_program(),
        }
    }
}

impl FleetOptions {
    /// Default options rooted at `home_dir`.
    pub fn with_home(home_dir: impl Into<PathBuf>) -> Self {
        Self {
            home_dir: home_dir.into(),
            ..Self::default()
        }
    }

    /// Orchestration project for an instance: `<prefix>-<name>`.
    pub fn project_name(&self, name: &str) -> String {
        format!("{}-{}", self.container_prefix, name)
    }

    /// Well-known gateway container name: `<prefix>-<name>-gateway`.
    pub fn container_name(&self, name: &str) -> String {
        format!(
            "{}-{}-{}",
            self.container_prefix,
            name,
            containers::GATEWAY_SERVICE
        )
    }
}
