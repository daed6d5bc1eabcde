#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use gwfleet::{
    ComposeContext, ContainerRuntime, FleetError, FleetOptions, FleetResult, GatewayFleet,
    JsonRegistryStore, LogOptions, PortProbe, Registry, RegistryStore,
};
use parking_lot::Mutex;
use tempfile::TempDir;

/// Container runtime double: records verbs, tracks "running" projects.
#[derive(Default)]
pub struct FakeRuntime {
    pub calls: Mutex<Vec<(String, String)>>,
    pub running: Mutex<HashSet<String>>,
    pub fail_down: bool,
    pub unreachable: bool,
}

impl FakeRuntime {
    pub fn verbs(&self) -> Vec<String> {
        self.calls.lock().iter().map(|(verb, _)| verb.clone()).collect()
    }

    fn record(&self, verb: &str, ctx: &ComposeContext) -> FleetResult<()> {
        if self.unreachable {
            return Err(FleetError::RuntimeUnavailable("fake runtime is down".into()));
        }
        self.calls
            .lock()
            .push((verb.to_string(), ctx.project.clone()));
        Ok(())
    }
}

#[async_trait]
impl ContainerRuntime for FakeRuntime {
    async fn up(&self, ctx: &ComposeContext) -> FleetResult<()> {
        self.record("up", ctx)?;
        assert!(ctx.manifest.exists(), "manifest missing at {}", ctx.manifest.display());
        self.running
            .lock()
            .insert(format!("{}-gateway", ctx.project));
        Ok(())
    }

    async fn stop(&self, ctx: &ComposeContext) -> FleetResult<()> {
        self.record("stop", ctx)?;
        self.running
            .lock()
            .remove(&format!("{}-gateway", ctx.project));
        Ok(())
    }

    async fn down(&self, ctx: &ComposeContext) -> FleetResult<()> {
        self.record("down", ctx)?;
        if self.fail_down {
            return Err(FleetError::RuntimeFailure {
                command: "compose down".into(),
                stderr: "no such project".into(),
            });
        }
        self.running
            .lock()
            .remove(&format!("{}-gateway", ctx.project));
        Ok(())
    }

    async fn logs(&self, ctx: &ComposeContext, _options: LogOptions) -> FleetResult<()> {
        self.record("logs", ctx)
    }

    async fn is_running(&self, container_name: &str) -> FleetResult<bool> {
        if self.unreachable {
            return Err(FleetError::RuntimeUnavailable("fake runtime is down".into()));
        }
        Ok(self.running.lock().contains(container_name))
    }
}

/// Port probe double: everything is free except `taken`.
#[derive(Default)]
pub struct FakeProbe {
    pub taken: Mutex<HashSet<u16>>,
}

impl PortProbe for FakeProbe {
    fn is_available(&self, port: u16) -> bool {
        !self.taken.lock().contains(&port)
    }
}

pub struct TestFleet {
    pub fleet: GatewayFleet,
    pub runtime: Arc<FakeRuntime>,
    pub probe: Arc<FakeProbe>,
    pub store: Arc<JsonRegistryStore>,
    pub home: TempDir,
}

impl TestFleet {
    /// Registry exactly as written, without the repair applied on read.
    pub fn on_disk(&self) -> Registry {
        let raw = std::fs::read_to_string(self.home.path().join("registry.json"))
            .expect("Failed to read registry");
        serde_json::from_str(&raw).expect("Registry is not valid JSON")
    }
}

pub fn fleet() -> TestFleet {
    fleet_with_runtime(FakeRuntime::default())
}

pub fn fleet_with_runtime(runtime: FakeRuntime) -> TestFleet {
    let home = TempDir::new().expect("Failed to create temp dir");
    let options = FleetOptions::with_home(home.path());
    let store = Arc::new(JsonRegistryStore::new(
        home.path().join("registry.json"),
        home.path().join("registry.lock"),
    ));
    let runtime = Arc::new(runtime);
    let probe = Arc::new(FakeProbe::default());

    let fleet = GatewayFleet::with_parts(
        options,
        store.clone() as Arc<dyn RegistryStore>,
        runtime.clone(),
        probe.clone(),
    )
    .expect("Failed to create fleet");

    TestFleet {
        fleet,
        runtime,
        probe,
        store,
        home,
    }
}
