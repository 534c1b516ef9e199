//! Schema plugins: namespace ownership, validation, and change notification.
//!
//! Every top-level key of the configuration is owned by exactly one
//! [`SchemaPlugin`]. A plugin is a capability record — each capability is an
//! optional function field, checked for presence before invocation. The set
//! of plugins is fixed at registry build time and read-only afterwards.

use std::sync::Arc;

use {
    serde_json::Value,
    trellis_service_traits::{BuildService, NamespaceMap},
};

pub mod builtin;
pub mod registry;

pub use {builtin::builtin_plugins, registry::PluginRegistry};

/// Validates a namespace value. The error string becomes the schema error
/// message surfaced to the user.
pub type ValidateFn = Box<dyn Fn(&Value) -> Result<(), String> + Send + Sync>;

/// Rewrites a namespace value into its canonical form.
pub type NormalizeFn = Box<dyn Fn(Value) -> Value + Send + Sync>;

/// Reacts to a change of the owned namespace; receives the full new config.
pub type OnChangeFn = Box<dyn Fn(&NamespaceMap) + Send + Sync>;

/// Runs once when the watch session starts.
pub type OnWatchStartFn = Box<dyn Fn() + Send + Sync>;

/// Constructs a plugin instance bound to the owning build service.
pub type PluginFactory = Box<dyn FnOnce(&Arc<dyn BuildService>) -> SchemaPlugin + Send>;

/// A namespace-owning schema plugin.
pub struct SchemaPlugin {
    name: String,
    validate: Option<ValidateFn>,
    normalize: Option<NormalizeFn>,
    on_change: Option<OnChangeFn>,
    on_watch_start: Option<OnWatchStartFn>,
}

impl SchemaPlugin {
    /// A plugin owning `name` with no capabilities. Ownership alone is
    /// meaningful: it makes the namespace a known key.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            validate: None,
            normalize: None,
            on_change: None,
            on_watch_start: None,
        }
    }

    #[must_use]
    pub fn with_validate(
        mut self,
        f: impl Fn(&Value) -> Result<(), String> + Send + Sync + 'static,
    ) -> Self {
        self.validate = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn with_normalize(mut self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> Self {
        self.normalize = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn with_on_change(mut self, f: impl Fn(&NamespaceMap) + Send + Sync + 'static) -> Self {
        self.on_change = Some(Box::new(f));
        self
    }

    #[must_use]
    pub fn with_on_watch_start(mut self, f: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_watch_start = Some(Box::new(f));
        self
    }

    /// The namespace this plugin owns.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the validate capability if present; absent means any value passes.
    pub fn validate(&self, value: &Value) -> Result<(), String> {
        match &self.validate {
            Some(f) => f(value),
            None => Ok(()),
        }
    }

    /// Run the normalize capability if present; absent is the identity.
    #[must_use]
    pub fn normalize(&self, value: Value) -> Value {
        match &self.normalize {
            Some(f) => f(value),
            None => value,
        }
    }

    #[must_use]
    pub fn has_on_change(&self) -> bool {
        self.on_change.is_some()
    }

    /// Invoke the change capability if present.
    pub fn notify_change(&self, config: &NamespaceMap) {
        if let Some(f) = &self.on_change {
            f(config);
        }
    }

    /// Invoke the watch-start capability if present.
    pub fn notify_watch_start(&self) {
        if let Some(f) = &self.on_watch_start {
            f();
        }
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn bare_plugin_accepts_any_value() {
        let plugin = SchemaPlugin::new("routes");
        assert_eq!(plugin.name(), "routes");
        assert!(plugin.validate(&serde_json::json!(42)).is_ok());
        assert!(!plugin.has_on_change());
    }

    #[test]
    fn validate_capability_runs_when_present() {
        let plugin = SchemaPlugin::new("routes").with_validate(|value| {
            if value.is_array() {
                Ok(())
            } else {
                Err("must be an array".into())
            }
        });
        assert!(plugin.validate(&serde_json::json!([])).is_ok());
        assert_eq!(
            plugin.validate(&serde_json::json!({})),
            Err("must be an array".to_string())
        );
    }

    #[test]
    fn normalize_capability_defaults_to_identity() {
        let plugin = SchemaPlugin::new("routes");
        let value = serde_json::json!({ "a": 1 });
        assert_eq!(plugin.normalize(value.clone()), value);
    }

    #[test]
    fn notify_change_checks_presence() {
        static CALLS: AtomicUsize = AtomicUsize::new(0);
        let silent = SchemaPlugin::new("a");
        silent.notify_change(&NamespaceMap::new());
        assert_eq!(CALLS.load(Ordering::SeqCst), 0);

        let noisy = SchemaPlugin::new("b").with_on_change(|_| {
            CALLS.fetch_add(1, Ordering::SeqCst);
        });
        assert!(noisy.has_on_change());
        noisy.notify_change(&NamespaceMap::new());
        assert_eq!(CALLS.load(Ordering::SeqCst), 1);
    }
}
