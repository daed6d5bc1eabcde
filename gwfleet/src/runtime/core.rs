//! Instance lifecycle controller.

use std::sync::Arc;

use chrono::Utc;

use crate::compose::{
    ComposeContext, ComposeManifest, ComposeRuntime, ContainerRuntime, InstanceSecrets,
};
use crate::errors::{FleetError, FleetResult};
use crate::init_logging_for;
use crate::naming::{validate_name, validate_syntax};
use crate::ports::{LoopbackProbe, PortAllocator, PortProbe};
use crate::registry::{JsonRegistryStore, Registry, RegistryStore};
use crate::runtime::constants::filenames;
use crate::runtime::layout::{FilesystemLayout, InstanceLayout};
use crate::runtime::options::FleetOptions;
use crate::runtime::types::{
    DestroyOptions, Instance, InstanceInfo, InstanceStatus, LogOptions, PortPair,
};

/// Entry point for creating and managing gateway instances.
///
/// **Registry access**: every mutation runs as one locked read-modify-write
/// cycle against the [`RegistryStore`]; reads go straight to the store.
///
/// **Cloning**: cheap via `Arc`; all clones share the same store and runtime.
#[derive(Clone)]
pub struct GatewayFleet {
    inner: Arc<FleetInner>,
}

struct FleetInner {
    options: FleetOptions,
    layout: FilesystemLayout,
    store: Arc<dyn RegistryStore>,
    runtime: Arc<dyn ContainerRuntime>,
    allocator: PortAllocator,
}

impl GatewayFleet {
    /// Fleet backed by the JSON registry under `options.home_dir`, the
    /// compose runtime, and loopback port probing. Also starts file logging.
    pub fn new(options: FleetOptions) -> FleetResult<Self> {
        let layout = Self::prepare_layout(&options)?;
        init_logging_for(&layout)?;

        let store = Arc::new(JsonRegistryStore::new(
            layout.registry_path(),
            layout.registry_lock_path(),
        ));
        let runtime = Arc::new(ComposeRuntime::new(options.compose_program.clone()));

        Self::assemble(options, layout, store, runtime, Arc::new(LoopbackProbe))
    }

    /// Fleet with injected collaborators.
    pub fn with_parts(
        options: FleetOptions,
        store: Arc<dyn RegistryStore>,
        runtime: Arc<dyn ContainerRuntime>,
        probe: Arc<dyn PortProbe>,
    ) -> FleetResult<Self> {
        let layout = Self::prepare_layout(&options)?;
        Self::assemble(options, layout, store, runtime, probe)
    }

    fn prepare_layout(options: &FleetOptions) -> FleetResult<FilesystemLayout> {
        if !options.home_dir.is_absolute() {
            return Err(FleetError::Internal(format!(
                "home_dir must be absolute path, got: {}",
                options.home_dir.display()
            )));
        }

        let layout = FilesystemLayout::new(options.home_dir.clone());
        layout.prepare().map_err(|e| {
            FleetError::Storage(format!(
                "Failed to initialize filesystem at {}: {}",
                layout.home_dir().display(),
                e
            ))
        })?;
        Ok(layout)
    }

    fn assemble(
        options: FleetOptions,
        layout: FilesystemLayout,
        store: Arc<dyn RegistryStore>,
        runtime: Arc<dyn ContainerRuntime>,
        probe: Arc<dyn PortProbe>,
    ) -> FleetResult<Self> {
        // Surface a corrupt registry at startup rather than mid-operation.
        store.read()?;

        tracing::debug!(home = %layout.home_dir().display(), "Fleet ready");
        Ok(Self {
            inner: Arc::new(FleetInner {
                options,
                layout,
                store,
                runtime,
                allocator: PortAllocator::new(probe),
            }),
        })
    }

    pub fn options(&self) -> &FleetOptions {
        &self.inner.options
    }

    pub fn layout(&self) -> &FilesystemLayout {
        &self.inner.layout
    }

    /// Snapshot of the persisted registry.
    pub fn registry(&self) -> FleetResult<Registry> {
        self.inner.store.read()
    }

    // ========================================================================
    // CREATE
    // ========================================================================

    /// Register a new instance, allocating ports unless `port` is given.
    ///
    /// Artifacts are written before the registry commit; if anything fails
    /// the name stays unregistered and a freshly created directory is removed.
    pub fn create(&self, name: &str, port: Option<u32>) -> FleetResult<Instance> {
        validate_syntax(name)?;

        let inner = &self.inner;
        let _guard = inner.store.lock()?;
        let mut registry = inner.store.read()?;

        validate_name(name, &registry)?;

        let ports = match port {
            Some(port) => inner.allocator.check_explicit(&registry, port)?,
            None => inner.allocator.allocate(&mut registry)?,
        };

        let layout = inner.layout.instance_layout(name);
        let fresh_dir = !layout.root().exists();
        let instance = Instance {
            name: name.to_string(),
            gateway_port: ports.gateway,
            bridge_port: ports.bridge,
            config_dir: layout.root().to_path_buf(),
            created_at: Utc::now(),
        };

        let committed = self
            .write_artifacts(&layout, name, ports)
            .and_then(|()| {
                registry.insert(instance.clone());
                // An explicit port on the grid claims its offset.
                if registry.normalize() {
                    tracing::debug!(
                        instance = %name,
                        next_port_offset = registry.next_port_offset,
                        available = ?registry.available_offsets,
                        "Explicit port adjusted offset bookkeeping"
                    );
                }
                inner.store.write(&registry)
            });

        if let Err(e) = committed {
            if fresh_dir && let Err(cleanup) = layout.remove() {
                tracing::warn!(
                    instance = %name,
                    error = %cleanup,
                    "Failed to clean up instance directory after failed create"
                );
            }
            return Err(e);
        }

        tracing::info!(
            instance = %name,
            gateway_port = ports.gateway,
            bridge_port = ports.bridge,
            explicit = port.is_some(),
            "Created instance"
        );
        Ok(instance)
    }

    fn write_artifacts(
        &self,
        layout: &InstanceLayout,
        name: &str,
        ports: PortPair,
    ) -> FleetResult<()> {
        let options = &self.inner.options;
        layout.prepare()?;

        InstanceSecrets::generate(name, ports).write_to(&layout.secrets_path())?;

        ComposeManifest::gateway(
            &options.project_name(name),
            &options.container_name(name),
            &options.image,
            ports,
        )
        .write_to(&layout.manifest_path())
    }

    // ========================================================================
    // START / STOP / RESTART / LOGS
    // ========================================================================

    pub async fn start(&self, name: &str) -> FleetResult<()> {
        let instance = self.require(name)?;
        self.inner.runtime.up(&self.compose_context(&instance)).await?;
        tracing::info!(instance = %name, "Started instance");
        Ok(())
    }

    pub async fn stop(&self, name: &str) -> FleetResult<()> {
        let instance = self.require(name)?;
        self.inner.runtime.stop(&self.compose_context(&instance)).await?;
        tracing::info!(instance = %name, "Stopped instance");
        Ok(())
    }

    /// Stop then start. A failed stop aborts before starting.
    pub async fn restart(&self, name: &str) -> FleetResult<()> {
        self.stop(name).await?;
        self.start(name).await
    }

    pub async fn logs(&self, name: &str, options: LogOptions) -> FleetResult<()> {
        let instance = self.require(name)?;
        self.inner
            .runtime
            .logs(&self.compose_context(&instance), options)
            .await
    }

    // ========================================================================
    // DESTROY
    // ========================================================================

    /// Tear down containers, remove data unless kept, unregister, and return
    /// the port offset to the pool.
    ///
    /// Container teardown is best-effort: its failures are logged and
    /// cleanup continues.
    pub async fn destroy(&self, name: &str, options: DestroyOptions) -> FleetResult<Instance> {
        let inner = &self.inner;
        let instance = self.require(name)?;

        if let Err(e) = inner.runtime.down(&self.compose_context(&instance)).await {
            tracing::warn!(
                instance = %name,
                error = %e,
                "Container teardown failed, continuing with cleanup"
            );
        }

        if !options.keep_data {
            InstanceLayout::new(instance.config_dir.clone()).remove()?;
        }

        let reclaimed = {
            let _guard = inner.store.lock()?;
            let mut registry = inner.store.read()?;

            match registry.remove(name) {
                Some(current) => {
                    let reclaimed = inner.allocator.reclaim(&mut registry, &current);
                    inner.store.write(&registry)?;
                    reclaimed
                }
                None => {
                    tracing::warn!(instance = %name, "Instance already unregistered");
                    None
                }
            }
        };

        tracing::info!(
            instance = %name,
            keep_data = options.keep_data,
            reclaimed_offset = ?reclaimed,
            "Destroyed instance"
        );
        Ok(instance)
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    /// All instances, by name, with live status.
    pub async fn list(&self) -> FleetResult<Vec<InstanceInfo>> {
        let registry = self.inner.store.read()?;

        let mut infos = Vec::with_capacity(registry.instances.len());
        for instance in registry.instances.into_values() {
            let status = self.status_of(&instance.name).await;
            infos.push(InstanceInfo { instance, status });
        }
        Ok(infos)
    }

    /// One instance with live status; `None` if not registered.
    pub async fn get(&self, name: &str) -> FleetResult<Option<InstanceInfo>> {
        let Some(instance) = self.inner.store.read()?.remove(name) else {
            return Ok(None);
        };

        let status = self.status_of(name).await;
        Ok(Some(InstanceInfo { instance, status }))
    }

    async fn status_of(&self, name: &str) -> InstanceStatus {
        let container = self.inner.options.container_name(name);
        match self.inner.runtime.is_running(&container).await {
            Ok(true) => InstanceStatus::Running,
            Ok(false) => InstanceStatus::Stopped,
            Err(e) => {
                tracing::debug!(instance = %name, error = %e, "Could not determine status");
                InstanceStatus::Unknown
            }
        }
    }

    fn require(&self, name: &str) -> FleetResult<Instance> {
        self.inner
            .store
            .read()?
            .remove(name)
            .ok_or_else(|| FleetError::NotFound(name.to_string()))
    }

    fn compose_context(&self, instance: &Instance) -> ComposeContext {
        ComposeContext {
            project: self.inner.options.project_name(&instance.name),
            manifest: instance.config_dir.join(filenames::MANIFEST),
            working_dir: instance.config_dir.clone(),
        }
    }
}
