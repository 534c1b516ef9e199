//! Discovery and precedence-merging of layered configuration files.

use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use {
    tracing::{debug, warn},
    trellis_plugins::PluginRegistry,
    trellis_service_traits::{BuildService, NamespaceMap},
};

use crate::{error::Result, loader::FileLoader, normalize::normalize, validate::validate};

/// Conventional base config filenames, checked in order. The first existing
/// match is authoritative.
pub const CONFIG_FILENAMES: &[&str] =
    &["trellis.toml", "trellis.yaml", "trellis.yml", "trellis.json"];

/// Primary extension. Environment and local override layers are derived only
/// for base files carrying it; any other base extension has no overrides.
const PRIMARY_EXT: &str = ".toml";

/// Inputs to a resolution pass, threaded explicitly instead of being read
/// from process globals at the point of use.
#[derive(Debug, Clone)]
pub struct ResolveContext {
    pub cwd: PathBuf,
    /// Environment name selecting a `trellis.<env>.toml` override layer.
    pub env: Option<String>,
    /// Development mode enables the `trellis.local.toml` override layer.
    pub dev: bool,
}

impl ResolveContext {
    #[must_use]
    pub fn new(cwd: impl Into<PathBuf>) -> Self {
        Self {
            cwd: cwd.into(),
            env: None,
            dev: false,
        }
    }

    /// Read the environment name from `TRELLIS_ENV` and development mode
    /// from `TRELLIS_DEV` (`1` or `true`). Both are read-only inputs; this
    /// core never writes them.
    #[must_use]
    pub fn from_env(cwd: impl Into<PathBuf>) -> Self {
        let env = std::env::var("TRELLIS_ENV").ok().filter(|v| !v.is_empty());
        let dev = std::env::var("TRELLIS_DEV")
            .map(|v| v == "1" || v == "true")
            .unwrap_or(false);
        Self {
            cwd: cwd.into(),
            env,
            dev,
        }
    }

    #[must_use]
    pub fn with_env(mut self, env: impl Into<String>) -> Self {
        self.env = Some(env.into());
        self
    }

    #[must_use]
    pub fn development(mut self) -> Self {
        self.dev = true;
        self
    }
}

/// What to do when a config file exists but fails to load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileErrorStrategy {
    /// Log and treat the file as an empty layer.
    #[default]
    Lenient,
    /// Propagate the failure to the caller.
    Strict,
}

/// Resolves the ordered set of applicable config files and merges them.
#[derive(Debug, Clone, Copy, Default)]
pub struct Resolver {
    strategy: FileErrorStrategy,
}

impl Resolver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A resolver that propagates file-load failures instead of substituting
    /// an empty layer.
    #[must_use]
    pub fn strict() -> Self {
        Self::with_strategy(FileErrorStrategy::Strict)
    }

    #[must_use]
    pub fn with_strategy(strategy: FileErrorStrategy) -> Self {
        Self { strategy }
    }

    /// The base config file for `ctx`, if any. With more than one
    /// conventional file present, the first match wins and all matches are
    /// reported.
    #[must_use]
    pub fn find_base_file(&self, ctx: &ResolveContext) -> Option<PathBuf> {
        let existing: Vec<PathBuf> = CONFIG_FILENAMES
            .iter()
            .map(|name| ctx.cwd.join(name))
            .filter(|p| p.exists())
            .collect();
        if existing.len() > 1 {
            let names: Vec<String> = existing.iter().map(|p| p.display().to_string()).collect();
            warn!(
                files = names.join(", "),
                "multiple config files found; using the first"
            );
        }
        existing.into_iter().next()
    }

    /// Every path a resolution pass may read for `ctx`, whether or not it
    /// currently exists. The reload coordinator evicts these from the
    /// loader cache before re-resolving.
    #[must_use]
    pub fn candidate_paths(&self, ctx: &ResolveContext) -> Vec<PathBuf> {
        let mut paths: Vec<PathBuf> = CONFIG_FILENAMES
            .iter()
            .map(|name| ctx.cwd.join(name))
            .collect();
        if let Some(base) = self.find_base_file(ctx) {
            paths.extend(override_paths(&base, ctx));
        }
        paths
    }

    /// Resolve the configuration for `ctx`: discover the base file, derive
    /// the override layers, load each, and shallow-merge in precedence
    /// order (base, environment, local). Later layers replace earlier ones
    /// key-by-key at the top level only.
    ///
    /// Each loaded unit and each intermediate merge is normalized, so
    /// merging an already-normalized base with a fresh override composes.
    pub fn resolve(&self, loader: &FileLoader, ctx: &ResolveContext) -> Result<NamespaceMap> {
        let Some(base) = self.find_base_file(ctx) else {
            debug!(cwd = %ctx.cwd.display(), "no config file found; resolving to empty config");
            return Ok(NamespaceMap::new());
        };

        let mut merged = normalize(self.load_layer(loader, &base)?);
        for path in override_paths(&base, ctx) {
            let layer = normalize(self.load_layer(loader, &path)?);
            if layer.is_empty() {
                continue;
            }
            for (namespace, value) in layer {
                merged.insert(namespace, value);
            }
            merged = normalize(merged);
        }
        Ok(merged)
    }

    fn load_layer(&self, loader: &FileLoader, path: &Path) -> Result<NamespaceMap> {
        match loader.load_or_empty(path) {
            Ok(layer) => Ok(layer),
            Err(err) => match self.strategy {
                FileErrorStrategy::Strict => Err(err),
                FileErrorStrategy::Lenient => {
                    warn!(error = %err, "skipping unreadable config file");
                    Ok(NamespaceMap::new())
                },
            },
        }
    }
}

/// Override layers derived from `base`, lowest precedence first.
fn override_paths(base: &Path, ctx: &ResolveContext) -> Vec<PathBuf> {
    let Some(name) = base.file_name().and_then(|n| n.to_str()) else {
        return Vec::new();
    };
    let Some(stem) = name.strip_suffix(PRIMARY_EXT) else {
        return Vec::new();
    };

    let mut paths = Vec::new();
    if let Some(env) = &ctx.env {
        paths.push(base.with_file_name(format!("{stem}.{env}{PRIMARY_EXT}")));
    }
    if ctx.dev {
        paths.push(base.with_file_name(format!("{stem}.local{PRIMARY_EXT}")));
    }
    paths
}

// ── Full pipeline ───────────────────────────────────────────────────────────

/// Options for [`load_config`].
#[derive(Default)]
pub struct LoadOptions<'a> {
    /// Evict every candidate path from the loader cache first, so the pass
    /// reflects disk rather than cached parses.
    pub force: bool,
    /// Observer invoked with the resolved config before validation — also
    /// on passes that subsequently fail, so callers tracking a "last seen"
    /// config never miss the value that caused the failure.
    pub set_config: Option<&'a dyn Fn(&NamespaceMap)>,
}

/// Full resolution pipeline: resolve → host rewrite → plugin normalize →
/// validate. File-load failures propagate, as does the first validation
/// failure; at service startup that aborts the process, during watch
/// reloads the coordinator absorbs it.
pub fn load_config(
    loader: &FileLoader,
    ctx: &ResolveContext,
    registry: &PluginRegistry,
    service: &Arc<dyn BuildService>,
    opts: LoadOptions<'_>,
) -> Result<NamespaceMap> {
    let resolver = Resolver::strict();
    if opts.force {
        for path in resolver.candidate_paths(ctx) {
            loader.evict(&path);
        }
    }

    let resolved = resolver.resolve(loader, ctx)?;
    let resolved = normalize(service.modify_config(resolved));
    let resolved = registry.normalize_config(resolved);
    validate(&resolved, registry, opts.set_config)?;
    Ok(resolved)
}

/// Lenient one-shot resolution: unreadable files are skipped and a config
/// that fails validation falls back to empty. Suited to advisory tooling;
/// the dev service goes through [`load_config`] so failures surface.
#[must_use]
pub fn discover_config(
    loader: &FileLoader,
    ctx: &ResolveContext,
    registry: &PluginRegistry,
    service: &Arc<dyn BuildService>,
) -> NamespaceMap {
    let resolved = match Resolver::new().resolve(loader, ctx) {
        Ok(resolved) => resolved,
        Err(err) => {
            warn!(error = %err, "failed to load config, using defaults");
            return NamespaceMap::new();
        },
    };
    let resolved = normalize(service.modify_config(resolved));
    let resolved = registry.normalize_config(resolved);
    match validate(&resolved, registry, None) {
        Ok(()) => resolved,
        Err(err) => {
            warn!(error = %err, "ignoring invalid config, using defaults");
            NamespaceMap::new()
        },
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────
