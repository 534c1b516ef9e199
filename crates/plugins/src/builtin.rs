//! Built-in schema plugins for the core build-tool namespaces.
//!
//! The list is an explicit static registration — plugins are constructed
//! here, in order, rather than discovered by scanning a directory. Hosts
//! extend or replace it through [`crate::PluginRegistry::build_with`].

use std::sync::Arc;

use {serde_json::Value, tracing::debug};

use crate::{PluginFactory, SchemaPlugin};

fn require_table(value: &Value) -> Result<&serde_json::Map<String, Value>, String> {
    value.as_object().ok_or_else(|| "must be a table".into())
}

fn require_string(value: &Value) -> Result<&str, String> {
    value.as_str().ok_or_else(|| "must be a string".into())
}

/// The default plugin list, in registration order.
#[must_use]
pub fn builtin_plugins() -> Vec<PluginFactory> {
    vec![
        Box::new(|_service| {
            SchemaPlugin::new("pages")
                .with_validate(|value| {
                    let pages = require_table(value)?;
                    for (route, settings) in pages {
                        if !settings.is_object() {
                            return Err(format!("entry \"{route}\" must be a table of page settings"));
                        }
                    }
                    Ok(())
                })
                .with_on_change(|config| {
                    let count = config
                        .get("pages")
                        .and_then(Value::as_object)
                        .map_or(0, serde_json::Map::len);
                    debug!(count, "pages changed");
                })
        }),
        Box::new(|_service| {
            SchemaPlugin::new("context").with_validate(|value| require_table(value).map(|_| ()))
        }),
        Box::new(|_service| {
            SchemaPlugin::new("export_static").with_validate(|value| {
                let options = require_table(value)?;
                if let Some(suffix) = options.get("html_suffix") {
                    if !suffix.is_boolean() {
                        return Err("html_suffix must be a boolean".into());
                    }
                }
                Ok(())
            })
        }),
        Box::new(|service| {
            let service = Arc::clone(service);
            SchemaPlugin::new("output_path")
                .with_validate(|value| {
                    let path = require_string(value)?;
                    if path.is_empty() {
                        return Err("must not be empty".into());
                    }
                    Ok(())
                })
                .with_on_change(move |_config| {
                    service.print_warn(
                        "output_path changed; the new value takes effect on the next full build",
                    );
                })
        }),
        Box::new(|_service| {
            SchemaPlugin::new("public_path").with_validate(|value| {
                let path = require_string(value)?;
                if !path.ends_with('/') {
                    return Err(format!("must end with a slash, got \"{path}\""));
                }
                Ok(())
            })
        }),
        Box::new(|_service| {
            SchemaPlugin::new("base").with_validate(|value| {
                let base = require_string(value)?;
                if !base.starts_with('/') {
                    return Err(format!("must start with a slash, got \"{base}\""));
                }
                Ok(())
            })
        }),
        Box::new(|_service| {
            SchemaPlugin::new("define").with_validate(|value| require_table(value).map(|_| ()))
        }),
        Box::new(|_service| {
            SchemaPlugin::new("alias").with_validate(|value| {
                let aliases = require_table(value)?;
                for (from, to) in aliases {
                    if !to.is_string() {
                        return Err(format!("alias \"{from}\" must map to a string path"));
                    }
                }
                Ok(())
            })
        }),
        Box::new(|_service| {
            SchemaPlugin::new("proxy").with_validate(|value| require_table(value).map(|_| ()))
        }),
        Box::new(|_service| {
            SchemaPlugin::new("theme").with_validate(|value| {
                if value.is_string() || value.is_object() {
                    Ok(())
                } else {
                    Err("must be a theme name or a table of theme variables".into())
                }
            })
        }),
    ]
}

// ── Tests ───────────────────────────────────────────────────────────────────
