//! Configuration resolution, normalization, and validation.
//!
//! Config files: `trellis.toml`, `trellis.yaml`, `trellis.yml`, or
//! `trellis.json`, resolved against the working directory, with optional
//! `trellis.<env>.toml` and `trellis.local.toml` override layers merged on
//! top (shallow, top-level namespaces only).
//!
//! Supports `${ENV_VAR}` substitution in raw file text.

pub mod env_subst;
pub mod error;
pub mod fuzzy;
pub mod loader;
pub mod normalize;
pub mod resolve;
pub mod validate;

pub use {
    error::{ConfigError, Result},
    loader::FileLoader,
    normalize::normalize,
    resolve::{
        CONFIG_FILENAMES, FileErrorStrategy, LoadOptions, ResolveContext, Resolver,
        discover_config, load_config,
    },
    validate::validate,
};
