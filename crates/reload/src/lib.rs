//! Hot reload of the build configuration.
//!
//! [`watcher::ConfigWatcher`] turns filesystem events into debounced config
//! events; [`coordinator::ReloadCoordinator`] consumes them one at a time,
//! re-resolves the configuration, and propagates the minimal set of
//! namespace changes to the running build service.

pub mod coordinator;
pub mod watcher;

pub use {
    coordinator::{ReloadCoordinator, ReloadState},
    watcher::{ConfigWatchEvent, ConfigWatcher},
};
