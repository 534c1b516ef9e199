//! Namespace validation and unknown-key detection.

use {trellis_plugins::PluginRegistry, trellis_service_traits::NamespaceMap};

use crate::{
    error::{ConfigError, Result},
    fuzzy,
};

/// Validate `config` against the registry's owning plugins and flag
/// top-level keys that no plugin owns.
///
/// When `set_config` is supplied it sees the config before any check runs —
/// including a config that is about to be rejected — so callers tracking a
/// "last seen" snapshot never miss the value that caused a failure.
///
/// Checks run plugins-first in registration order, then unknown-key
/// detection in key order; the first failure of either kind aborts the pass.
pub fn validate(
    config: &NamespaceMap,
    registry: &PluginRegistry,
    set_config: Option<&dyn Fn(&NamespaceMap)>,
) -> Result<()> {
    if let Some(observer) = set_config {
        observer(config);
    }

    for plugin in registry.iter() {
        if let Some(value) = config.get(plugin.name()) {
            if let Err(message) = plugin.validate(value) {
                return Err(ConfigError::Schema {
                    namespace: plugin.name().to_string(),
                    message,
                });
            }
        }
    }

    let namespaces = registry.namespaces();
    for key in config.keys() {
        if registry.get(key).is_none() {
            return Err(ConfigError::UnknownNamespace {
                key: key.clone(),
                suggestion: fuzzy::closest(key, &namespaces).map(str::to_string),
                valid: namespaces.iter().map(|s| (*s).to_string()).collect(),
            });
        }
    }

    Ok(())
}

// ── Tests ───────────────────────────────────────────────────────────────────
