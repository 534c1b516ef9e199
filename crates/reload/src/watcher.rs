//! Filesystem watcher for configuration files.
//!
//! Watches the working directory for changes to any `trellis.*` config file
//! (base, environment override, or local override) and sends debounced
//! events so the reload coordinator can re-resolve.

use std::path::PathBuf;

use {
    anyhow::Result,
    notify_debouncer_full::{
        DebounceEventResult, Debouncer, RecommendedCache, new_debouncer, notify::RecursiveMode,
    },
    tokio::sync::mpsc,
    tracing::{debug, info, warn},
};

/// Events emitted by the config watcher.
#[derive(Debug, Clone)]
pub enum ConfigWatchEvent {
    /// A configuration file was created, modified, or deleted.
    Changed { path: PathBuf },
}

/// Extensions accepted for configuration files.
const CONFIG_EXTENSIONS: &[&str] = &["toml", "yaml", "yml", "json"];

/// Whether `name` looks like a trellis config file in any supported format.
fn is_config_filename(name: &str) -> bool {
    let Some(rest) = name.strip_prefix("trellis.") else {
        return false;
    };
    rest.rsplit('.')
        .next()
        .is_some_and(|ext| CONFIG_EXTENSIONS.contains(&ext))
}

/// Watches a directory for config file changes with debouncing.
pub struct ConfigWatcher {
    _debouncer: Debouncer<notify_debouncer_full::notify::RecommendedWatcher, RecommendedCache>,
}

impl ConfigWatcher {
    /// Start watching `dir` (non-recursively). Returns the watcher and a
    /// receiver for debounced events.
    ///
    /// The watcher must be kept alive (not dropped) for events to continue.
    pub fn start(dir: PathBuf) -> Result<(Self, mpsc::UnboundedReceiver<ConfigWatchEvent>)> {
        let (tx, rx) = mpsc::unbounded_channel();

        let debouncer = new_debouncer(
            std::time::Duration::from_millis(500),
            None,
            move |result: DebounceEventResult| match result {
                Ok(events) => {
                    for event in events {
                        for path in &event.paths {
                            let filename = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
                            if !is_config_filename(filename) {
                                continue;
                            }

                            use notify_debouncer_full::notify::EventKind;
                            match event.kind {
                                EventKind::Create(_)
                                | EventKind::Modify(_)
                                | EventKind::Remove(_) => {
                                    debug!(path = %path.display(), "config watcher event");
                                    let _ = tx.send(ConfigWatchEvent::Changed {
                                        path: path.clone(),
                                    });
                                },
                                _ => {},
                            }
                        }
                    }
                },
                Err(errors) => {
                    for e in errors {
                        warn!(error = %e, "config watcher error");
                    }
                },
            },
        )?;

        let mut watcher = Self {
            _debouncer: debouncer,
        };

        if dir.exists() {
            watcher._debouncer.watch(&dir, RecursiveMode::NonRecursive)?;
            info!(dir = %dir.display(), "watching directory for config changes");
        }

        Ok((watcher, rx))
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn config_filenames_are_recognized() {
        assert!(is_config_filename("trellis.toml"));
        assert!(is_config_filename("trellis.yaml"));
        assert!(is_config_filename("trellis.local.toml"));
        assert!(is_config_filename("trellis.cloud.toml"));

        assert!(!is_config_filename("trellis.toml.bak"));
        assert!(!is_config_filename("other.toml"));
        assert!(!is_config_filename("trellisfoo.toml"));
        assert!(!is_config_filename("notes.txt"));
    }

    #[tokio::test]
    async fn watcher_fires_on_config_file_write() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().to_path_buf();

        let (_watcher, mut rx) = ConfigWatcher::start(dir.clone()).unwrap();

        std::fs::write(dir.join("trellis.toml"), "[context]\n").unwrap();

        let event = tokio::time::timeout(std::time::Duration::from_secs(10), rx.recv())
            .await
            .expect("timed out waiting for watcher event")
            .expect("channel closed");

        let ConfigWatchEvent::Changed { path } = event;
        assert!(path.ends_with("trellis.toml"));
    }

    #[tokio::test]
    async fn watcher_ignores_unrelated_files() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().to_path_buf();

        let (_watcher, mut rx) = ConfigWatcher::start(dir.clone()).unwrap();

        std::fs::write(dir.join("notes.txt"), "some text").unwrap();

        let result = tokio::time::timeout(std::time::Duration::from_secs(3), rx.recv()).await;
        assert!(result.is_err(), "expected timeout, no event should fire");
    }
}
