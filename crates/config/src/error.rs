use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A configuration file exists but could not be read or parsed.
    #[error("failed to load {}: {reason}", .path.display())]
    File { path: PathBuf, reason: String },

    /// A namespace value was rejected by its owning plugin.
    #[error("config namespace \"{namespace}\" is invalid: {message}")]
    Schema { namespace: String, message: String },

    /// A top-level key has no owning plugin.
    #[error("{}", unknown_namespace_message(.key, .suggestion.as_deref(), .valid))]
    UnknownNamespace {
        key: String,
        suggestion: Option<String>,
        valid: Vec<String>,
    },
}

fn unknown_namespace_message(key: &str, suggestion: Option<&str>, valid: &[String]) -> String {
    match suggestion {
        Some(s) => format!("unknown config namespace \"{key}\" (did you mean \"{s}\"?)"),
        None => format!(
            "unknown config namespace \"{key}\"; valid namespaces: {}",
            valid.join(", ")
        ),
    }
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn unknown_namespace_message_with_suggestion() {
        let err = ConfigError::UnknownNamespace {
            key: "pagez".into(),
            suggestion: Some("pages".into()),
            valid: vec!["pages".into(), "theme".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("pagez"));
        assert!(msg.contains("did you mean \"pages\""), "got: {msg}");
    }

    #[test]
    fn unknown_namespace_message_lists_valid_names_without_suggestion() {
        let err = ConfigError::UnknownNamespace {
            key: "zzz".into(),
            suggestion: None,
            valid: vec!["pages".into(), "theme".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("valid namespaces: pages, theme"), "got: {msg}");
    }

    #[test]
    fn file_error_names_the_path() {
        let err = ConfigError::File {
            path: PathBuf::from("trellis.toml"),
            reason: "boom".into(),
        };
        assert_eq!(err.to_string(), "failed to load trellis.toml: boom");
    }
}
