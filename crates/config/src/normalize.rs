//! Structural normalization of a resolved configuration.

use {serde_json::Value, trellis_service_traits::NamespaceMap};

/// Apply the structural transforms that make a raw configuration canonical:
/// page-level context inheritance and page-key normalization.
///
/// Pure and idempotent; absent or oddly-typed namespaces pass through
/// untouched.
#[must_use]
pub fn normalize(mut config: NamespaceMap) -> NamespaceMap {
    propagate_context(&mut config);
    rewrite_page_keys(&mut config);
    config
}

/// Merge the global `context` namespace underneath each page's own `context`
/// table. Page-level keys win.
fn propagate_context(config: &mut NamespaceMap) {
    let Some(global) = config.get("context").and_then(Value::as_object).cloned() else {
        return;
    };
    let Some(pages) = config.get_mut("pages").and_then(Value::as_object_mut) else {
        return;
    };

    for page in pages.values_mut() {
        let Some(page) = page.as_object_mut() else {
            continue;
        };
        let mut merged = global.clone();
        if let Some(own) = page.get("context").and_then(Value::as_object) {
            for (key, value) in own {
                merged.insert(key.clone(), value.clone());
            }
        }
        page.insert("context".into(), Value::Object(merged));
    }
}

/// Normalize page keys: under `export_static.html_suffix`, relative keys get
/// an `.html` suffix (directory-style and already-suffixed keys are left
/// alone); then every key is made absolute.
fn rewrite_page_keys(config: &mut NamespaceMap) {
    let html_suffix = config
        .get("export_static")
        .and_then(|v| v.get("html_suffix"))
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let Some(pages) = config.get_mut("pages").and_then(Value::as_object_mut) else {
        return;
    };

    let entries = std::mem::take(pages);
    for (key, value) in entries {
        let mut key = key;
        if html_suffix && !key.starts_with('/') && !key.ends_with('/') && !key.ends_with(".html") {
            key.push_str(".html");
        }
        if !key.starts_with('/') {
            key.insert(0, '/');
        }
        pages.insert(key, value);
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn map(value: Value) -> NamespaceMap {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    #[test]
    fn html_suffix_applies_to_relative_keys_only() {
        let config = map(json!({
            "pages": { "index": {}, "/about": {} },
            "export_static": { "html_suffix": true },
        }));
        let config = normalize(config);
        let pages = config.get("pages").unwrap().as_object().unwrap();
        assert!(pages.contains_key("/index.html"));
        assert!(pages.contains_key("/about"));
        assert_eq!(pages.len(), 2);
    }

    #[test]
    fn keys_are_made_absolute_without_html_suffix() {
        let config = map(json!({ "pages": { "docs": {}, "/x": {} } }));
        let config = normalize(config);
        let pages = config.get("pages").unwrap().as_object().unwrap();
        assert!(pages.contains_key("/docs"));
        assert!(pages.contains_key("/x"));
    }

    #[test]
    fn directory_style_keys_skip_the_suffix() {
        let config = map(json!({
            "pages": { "docs/": {} },
            "export_static": { "html_suffix": true },
        }));
        let config = normalize(config);
        let pages = config.get("pages").unwrap().as_object().unwrap();
        assert!(pages.contains_key("/docs/"), "got keys: {:?}", pages.keys());
    }

    #[test]
    fn context_propagates_with_page_keys_winning() {
        let config = map(json!({
            "context": { "x": 1 },
            "pages": {
                "/a": { "context": { "x": 2 } },
                "/b": {},
            },
        }));
        let config = normalize(config);
        let pages = config.get("pages").unwrap();
        assert_eq!(pages["/a"]["context"]["x"], json!(2));
        assert_eq!(pages["/b"]["context"]["x"], json!(1));
    }

    #[test]
    fn normalization_is_idempotent() {
        let config = map(json!({
            "context": { "site": "trellis", "x": 1 },
            "pages": {
                "index": { "context": { "x": 2 } },
                "/about": {},
                "docs/": {},
            },
            "export_static": { "html_suffix": true },
        }));
        let once = normalize(config);
        let twice = normalize(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn tolerates_absent_and_oddly_typed_namespaces() {
        assert!(normalize(NamespaceMap::new()).is_empty());

        let config = map(json!({ "pages": "not a table", "context": { "x": 1 } }));
        let config = normalize(config);
        assert_eq!(config.get("pages"), Some(&json!("not a table")));

        let config = map(json!({ "pages": { "/a": "scalar entry" }, "context": { "x": 1 } }));
        let config = normalize(config);
        // Non-table page entries keep their value; only the key is normalized.
        assert_eq!(config["pages"]["/a"], json!("scalar entry"));
    }

    #[test]
    fn non_boolean_html_suffix_is_ignored() {
        let config = map(json!({
            "pages": { "index": {} },
            "export_static": { "html_suffix": "yes" },
        }));
        let config = normalize(config);
        let pages = config.get("pages").unwrap().as_object().unwrap();
        assert!(pages.contains_key("/index"));
    }
}
