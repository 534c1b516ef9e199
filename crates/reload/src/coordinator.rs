//! Watch-triggered configuration reconciliation.
//!
//! Reacts to config file events: re-resolves the layered configuration,
//! diffs it against the last accepted snapshot per namespace, propagates
//! only the namespaces whose value changed, and recovers from a previously
//! failed configuration state with a full service reload.

use std::{path::Path, sync::Arc};

use {
    serde_json::Value,
    tokio::sync::mpsc,
    tracing::{debug, error, info},
};

use {
    trellis_config::{ConfigError, FileLoader, LoadOptions, ResolveContext, Resolver, load_config},
    trellis_plugins::PluginRegistry,
    trellis_service_traits::{BuildService, NamespaceMap, SharedConfig},
};

use crate::watcher::{ConfigWatchEvent, ConfigWatcher};

/// Health of the watch session with respect to the configuration on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadState {
    /// The last resolution pass succeeded; incremental diffing applies.
    Healthy,
    /// The last pass failed; the previous accepted config stays
    /// authoritative and the next success forces a full service reload.
    Failed,
}

/// Owns the accepted configuration snapshot and the failed/recovered state
/// machine. Events are processed strictly sequentially; the snapshot and
/// the middleware sink are only ever mutated from [`Self::initial_config`]
/// and [`Self::on_file_event`].
pub struct ReloadCoordinator {
    service: Arc<dyn BuildService>,
    registry: Arc<PluginRegistry>,
    loader: Arc<FileLoader>,
    sink: SharedConfig,
    ctx: ResolveContext,
    accepted: NamespaceMap,
    state: ReloadState,
}

impl ReloadCoordinator {
    #[must_use]
    pub fn new(
        service: Arc<dyn BuildService>,
        registry: Arc<PluginRegistry>,
        loader: Arc<FileLoader>,
        sink: SharedConfig,
        ctx: ResolveContext,
    ) -> Self {
        Self {
            service,
            registry,
            loader,
            sink,
            ctx,
            accepted: NamespaceMap::new(),
            state: ReloadState::Healthy,
        }
    }

    /// Coordinator resolving against the service's working directory and the
    /// process environment flags.
    #[must_use]
    pub fn for_service(
        service: Arc<dyn BuildService>,
        registry: Arc<PluginRegistry>,
        loader: Arc<FileLoader>,
        sink: SharedConfig,
    ) -> Self {
        let ctx = ResolveContext::from_env(service.cwd());
        Self::new(service, registry, loader, sink, ctx)
    }

    #[must_use]
    pub fn state(&self) -> ReloadState {
        self.state
    }

    /// The last configuration that passed validation — the diff baseline.
    #[must_use]
    pub fn accepted(&self) -> &NamespaceMap {
        &self.accepted
    }

    /// One-shot startup resolution. Failures propagate so the host can abort
    /// startup; on success the snapshot becomes the diff baseline and the
    /// middleware sink is seeded.
    pub fn initial_config(&mut self) -> Result<NamespaceMap, ConfigError> {
        let config = self.run_pipeline(false)?;
        self.accepted = config.clone();
        Ok(config)
    }

    fn run_pipeline(&self, force: bool) -> Result<NamespaceMap, ConfigError> {
        let sink = self.sink.clone();
        let set_config = |config: &NamespaceMap| sink.set(config.clone());
        load_config(
            &self.loader,
            &self.ctx,
            &self.registry,
            &self.service,
            LoadOptions {
                force,
                set_config: Some(&set_config),
            },
        )
    }

    /// Handle one config file event. Never terminates the watch session:
    /// failures park the coordinator in [`ReloadState::Failed`] until a
    /// later pass succeeds.
    pub fn on_file_event(&mut self, path: &Path) {
        debug!(path = %path.display(), "config file changed; re-resolving");

        // The loader caches by path; reflect disk, not a stale parse.
        for candidate in Resolver::strict().candidate_paths(&self.ctx) {
            self.loader.evict(&candidate);
        }
        self.loader.evict(path);

        let new_config = match self.run_pipeline(false) {
            Ok(config) => config,
            Err(err) => {
                error!(error = %err, "config reload failed; keeping previous config");
                self.service
                    .print_error(&format!("config reload failed: {err}"));
                self.state = ReloadState::Failed;
                return;
            },
        };

        if self.state == ReloadState::Failed {
            // In-memory state downstream of a failed pass cannot be trusted;
            // skip diffing and rebuild everything.
            info!("config recovered; requesting full service reload");
            self.state = ReloadState::Healthy;
            self.service.reload();
        } else {
            self.propagate_changes(&new_config);
        }

        self.accepted = new_config;
    }

    /// Notify the service and owning plugins about namespaces whose value
    /// differs from the accepted snapshot. Unchanged namespaces stay silent.
    fn propagate_changes(&self, new_config: &NamespaceMap) {
        for plugin in self.registry.iter() {
            let namespace = plugin.name();
            let new_value = new_config.get(namespace);
            if new_value == self.accepted.get(namespace) {
                continue;
            }

            debug!(namespace, "config namespace changed");
            let value = new_value.cloned().unwrap_or(Value::Null);
            self.service.update_namespace(namespace, &value);
            if plugin.has_on_change() {
                plugin.notify_change(new_config);
            }
        }
    }

    /// Drain watcher events strictly sequentially, in arrival order. Invokes
    /// each plugin's watch-start capability once before the first event.
    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<ConfigWatchEvent>) {
        self.registry.notify_watch_start();
        while let Some(ConfigWatchEvent::Changed { path }) = rx.recv().await {
            self.on_file_event(&path);
        }
    }

    /// Start watching the working directory and process events until the
    /// returned watcher is dropped.
    pub fn watch(self) -> anyhow::Result<ConfigWatcher> {
        let (watcher, rx) = ConfigWatcher::start(self.ctx.cwd.clone())?;
        tokio::spawn(self.run(rx));
        Ok(watcher)
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
