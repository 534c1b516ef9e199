//! Plugin registry: namespace → owning plugin, fixed at build time.

use std::{collections::HashMap, sync::Arc};

use {tracing::debug, trellis_service_traits::{BuildService, NamespaceMap}};

use crate::{PluginFactory, SchemaPlugin};

/// Immutable set of namespace-owning plugins.
///
/// Built once at startup; namespace ownership is one-to-one for the process
/// lifetime. Iteration follows registration order.
pub struct PluginRegistry {
    plugins: Vec<SchemaPlugin>,
    index: HashMap<String, usize>,
}

impl PluginRegistry {
    /// Instantiate `factories` against `service` and index them by namespace.
    ///
    /// # Panics
    ///
    /// Panics when two plugins declare the same namespace. That is a defect in
    /// the tool's own plugin registration, not a user configuration error, so
    /// it fails the process at startup rather than being recoverable.
    #[must_use]
    pub fn build(service: Arc<dyn BuildService>, factories: Vec<PluginFactory>) -> Self {
        Self::build_with(service, factories, |factories| factories)
    }

    /// Like [`PluginRegistry::build`], with an extension point letting the
    /// host rewrite the initial plugin list before instantiation.
    #[must_use]
    pub fn build_with(
        service: Arc<dyn BuildService>,
        factories: Vec<PluginFactory>,
        intercept: impl FnOnce(Vec<PluginFactory>) -> Vec<PluginFactory>,
    ) -> Self {
        let factories = intercept(factories);
        let mut plugins = Vec::with_capacity(factories.len());
        let mut index = HashMap::with_capacity(factories.len());

        for factory in factories {
            let plugin = factory(&service);
            let name = plugin.name().to_string();
            if index.contains_key(&name) {
                panic!("duplicate config namespace \"{name}\": each namespace must be owned by exactly one plugin");
            }
            index.insert(name, plugins.len());
            plugins.push(plugin);
        }

        debug!(count = plugins.len(), "plugin registry built");
        Self { plugins, index }
    }

    /// Registered namespace names, in registration order.
    #[must_use]
    pub fn namespaces(&self) -> Vec<&str> {
        self.plugins.iter().map(SchemaPlugin::name).collect()
    }

    /// The plugin owning `namespace`, if any.
    #[must_use]
    pub fn get(&self, namespace: &str) -> Option<&SchemaPlugin> {
        self.index.get(namespace).map(|&i| &self.plugins[i])
    }

    /// Plugins in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &SchemaPlugin> {
        self.plugins.iter()
    }

    /// Apply each owning plugin's normalize capability to its namespace value.
    #[must_use]
    pub fn normalize_config(&self, mut config: NamespaceMap) -> NamespaceMap {
        for plugin in &self.plugins {
            if let Some(value) = config.remove(plugin.name()) {
                config.insert(plugin.name().to_string(), plugin.normalize(value));
            }
        }
        config
    }

    /// Invoke every plugin's watch-start capability.
    pub fn notify_watch_start(&self) {
        for plugin in &self.plugins {
            plugin.notify_watch_start();
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
