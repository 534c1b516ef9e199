//! Trait interface between the configuration core and the host build service.
//!
//! The build service owns the build/reload lifecycle and the dev server; this
//! crate only specifies the surface the configuration core talks to. A `Noop`
//! implementation lets the core run standalone (tests, one-shot resolution)
//! before a real service is wired in.

use std::{
    path::PathBuf,
    sync::{Arc, PoisonError, RwLock},
};

use {
    serde_json::Value,
    tracing::{debug, error, warn},
};

/// A top-level configuration object: namespace name → arbitrary value.
///
/// Used for the raw, normalized, and accepted forms of the configuration —
/// the three only differ in how far through the pipeline they have travelled.
pub type NamespaceMap = serde_json::Map<String, Value>;

// ── Build service ───────────────────────────────────────────────────────────

/// Host-side collaborator for the configuration core.
///
/// Implementations are expected to keep two live copies of the configuration
/// (the initial snapshot and the current one), both keyed by namespace;
/// [`BuildService::update_namespace`] updates both.
pub trait BuildService: Send + Sync {
    /// Working directory configuration files are resolved against.
    fn cwd(&self) -> PathBuf;

    /// Surface a non-fatal warning to the user.
    fn print_warn(&self, message: &str);

    /// Surface an error to the user without terminating the process.
    fn print_error(&self, message: &str);

    /// Request a full service reload, discarding incremental state.
    fn reload(&self);

    /// Apply a changed namespace value to the service's live config copies
    /// (both the initial and the current mapping).
    fn update_namespace(&self, namespace: &str, value: &Value);

    /// Extension point: inspect and rewrite the resolved configuration before
    /// it is validated. The default keeps it unchanged.
    fn modify_config(&self, config: NamespaceMap) -> NamespaceMap {
        config
    }
}

/// Build service that logs and otherwise does nothing.
pub struct NoopBuildService;

impl BuildService for NoopBuildService {
    fn cwd(&self) -> PathBuf {
        PathBuf::from(".")
    }

    fn print_warn(&self, message: &str) {
        warn!("{message}");
    }

    fn print_error(&self, message: &str) {
        error!("{message}");
    }

    fn reload(&self) {
        debug!("full reload requested (noop)");
    }

    fn update_namespace(&self, namespace: &str, _value: &Value) {
        debug!(namespace, "config namespace updated (noop)");
    }
}

// ── Middleware configuration sink ───────────────────────────────────────────

/// Shared slot holding the externally-visible current configuration.
///
/// Consumed by the request-routing middleware layer; the reload coordinator
/// writes to it on every resolution pass, including passes that later fail
/// validation. Injected where needed — there is no process-wide singleton.
#[derive(Clone, Default)]
pub struct SharedConfig(Arc<RwLock<NamespaceMap>>);

impl SharedConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current configuration.
    pub fn set(&self, config: NamespaceMap) {
        let mut guard = self.0.write().unwrap_or_else(PoisonError::into_inner);
        *guard = config;
    }

    /// Snapshot the current configuration.
    #[must_use]
    pub fn get(&self) -> NamespaceMap {
        self.0
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn shared_config_set_then_get() {
        let sink = SharedConfig::new();
        assert!(sink.get().is_empty());

        let mut config = NamespaceMap::new();
        config.insert("pages".into(), serde_json::json!({ "/": {} }));
        sink.set(config.clone());
        assert_eq!(sink.get(), config);
    }

    #[test]
    fn shared_config_clones_observe_writes() {
        let sink = SharedConfig::new();
        let other = sink.clone();

        let mut config = NamespaceMap::new();
        config.insert("base".into(), serde_json::json!("/app/"));
        sink.set(config.clone());
        assert_eq!(other.get(), config);
    }

    #[test]
    fn noop_service_methods_do_not_panic() {
        let svc = NoopBuildService;
        svc.print_warn("warn");
        svc.print_error("error");
        svc.reload();
        svc.update_namespace("pages", &serde_json::json!({}));
        assert_eq!(svc.cwd(), PathBuf::from("."));
        let config = svc.modify_config(NamespaceMap::new());
        assert!(config.is_empty());
    }
}
