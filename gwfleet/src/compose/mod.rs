//! Runtime collaborator boundary: artifacts handed to the orchestration tool
//! and the verbs issued against them.

mod manifest;
mod runner;

pub use manifest::{ComposeManifest, ComposeService, InstanceSecrets, generate_token};
pub use runner::{ComposeContext, ComposeRuntime, ContainerRuntime};
