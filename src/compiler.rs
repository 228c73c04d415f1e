//! Build lifecycle driver
//!
//! A [`Compiler`] owns the registered hooks and walks one build through
//! emit (assets in memory), write (assets on disk) and done. Plugins attach
//! through the single [`Plugin::apply`] entry point.

use crate::models::CompiledAsset;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// The asset set produced by one build, keyed by output name.
#[derive(Debug, Clone, Default)]
pub struct Compilation {
    assets: BTreeMap<String, CompiledAsset>,
}

impl Compilation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_assets(assets: impl IntoIterator<Item = CompiledAsset>) -> Self {
        let mut compilation = Self::new();
        for asset in assets {
            compilation.insert(asset);
        }
        compilation
    }

    /// Load every regular file under `dir` as an asset named by its relative path.
    pub fn from_output_dir(dir: &Path) -> Result<Self> {
        let mut compilation = Self::new();
        collect_dir(dir, dir, &mut compilation)?;
        debug!(
            "Loaded {} assets from {}",
            compilation.len(),
            dir.display()
        );
        Ok(compilation)
    }

    /// Insert an asset, replacing any previous asset with the same name.
    pub fn insert(&mut self, asset: CompiledAsset) -> Option<CompiledAsset> {
        self.assets.insert(asset.name.clone(), asset)
    }

    pub fn get(&self, name: &str) -> Option<&CompiledAsset> {
        self.assets.get(name)
    }

    pub fn assets(&self) -> impl Iterator<Item = &CompiledAsset> {
        self.assets.values()
    }

    pub fn asset_names(&self) -> Vec<&str> {
        self.assets.keys().map(String::as_str).collect()
    }

    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

fn collect_dir(root: &Path, dir: &Path, compilation: &mut Compilation) -> Result<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let path = entry.path();

        if file_type.is_dir() {
            collect_dir(root, &path, compilation)?;
        } else if file_type.is_file() {
            let relative = path
                .strip_prefix(root)
                .map_err(|e| Error::Generic(format!("Asset outside output dir: {}", e)))?;
            let name = asset_name(relative)?;
            compilation.insert(CompiledAsset::new(name, fs::read(&path)?));
        }
    }
    Ok(())
}

/// `/`-joined asset name for a relative path. Non-UTF-8 names are rejected
/// rather than rewritten, so the name always maps back to the same file.
fn asset_name(relative: &Path) -> Result<String> {
    let parts = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>();

    match parts {
        Some(parts) => Ok(parts.join("/")),
        None => {
            warn!("Asset name is not valid UTF-8: {}", relative.display());
            Err(Error::InvalidAssetName(relative.display().to_string()))
        }
    }
}

/// Join an asset name onto `root`, refusing names that would leave it.
pub fn resolve_asset_path(root: &Path, name: &str) -> Option<PathBuf> {
    let relative = Path::new(name);
    let contained = relative
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));

    if name.is_empty() || !contained {
        return None;
    }
    Some(root.join(relative))
}

/// View of a finished build handed to done hooks.
#[derive(Debug, Clone, Copy)]
pub struct Stats<'a> {
    pub compilation: &'a Compilation,
    pub output_dir: &'a Path,
}

impl Stats<'_> {
    pub fn asset_names(&self) -> Vec<&str> {
        self.compilation.asset_names()
    }
}

/// Callback fired while assets exist only in memory.
#[async_trait]
pub trait EmitHook: Send + Sync {
    async fn on_emit(&self, compilation: &Compilation);
}

/// Callback fired after assets are written to disk.
#[async_trait]
pub trait DoneHook: Send + Sync {
    async fn on_done(&self, stats: &Stats<'_>);
}

#[derive(Default)]
pub struct Hooks {
    emit: Vec<(&'static str, Arc<dyn EmitHook>)>,
    done: Vec<(&'static str, Arc<dyn DoneHook>)>,
}

impl Hooks {
    pub fn tap_emit(&mut self, name: &'static str, hook: Arc<dyn EmitHook>) {
        self.emit.push((name, hook));
    }

    pub fn tap_done(&mut self, name: &'static str, hook: Arc<dyn DoneHook>) {
        self.done.push((name, hook));
    }

    pub fn emit_taps(&self) -> Vec<&'static str> {
        self.emit.iter().map(|(name, _)| *name).collect()
    }

    pub fn done_taps(&self) -> Vec<&'static str> {
        self.done.iter().map(|(name, _)| *name).collect()
    }
}

pub trait Plugin: Send + Sync {
    fn name(&self) -> &'static str;

    /// Register this plugin's lifecycle callbacks.
    fn apply(self: Arc<Self>, hooks: &mut Hooks);
}

pub struct Compiler {
    output_dir: PathBuf,
    write_assets: bool,
    hooks: Hooks,
}

impl Compiler {
    /// Compiler that writes every asset under `output_dir` between emit and done.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            write_assets: true,
            hooks: Hooks::default(),
        }
    }

    /// Compiler for a build whose assets are already on disk.
    pub fn for_existing_output(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            write_assets: false,
            ..Self::new(output_dir)
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn hooks(&self) -> &Hooks {
        &self.hooks
    }

    pub fn apply(&mut self, plugin: Arc<dyn Plugin>) -> &mut Self {
        info!("Applying plugin {}", plugin.name());
        plugin.apply(&mut self.hooks);
        self
    }

    /// Run one build cycle: emit hooks, asset write, done hooks.
    pub async fn run(&self, compilation: &Compilation) -> Result<()> {
        info!("Emitting {} assets", compilation.len());
        for (name, hook) in &self.hooks.emit {
            debug!(plugin = *name, "emit");
            hook.on_emit(compilation).await;
        }

        if self.write_assets {
            self.write(compilation).await?;
        }

        let stats = Stats {
            compilation,
            output_dir: &self.output_dir,
        };
        for (name, hook) in &self.hooks.done {
            debug!(plugin = *name, "done");
            hook.on_done(&stats).await;
        }

        info!("Build complete");
        Ok(())
    }

    async fn write(&self, compilation: &Compilation) -> Result<()> {
        for asset in compilation.assets() {
            let path = resolve_asset_path(&self.output_dir, &asset.name).ok_or_else(|| {
                Error::Generic(format!("Asset name escapes output dir: {}", asset.name))
            })?;
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(&path, &asset.content).await?;
        }
        info!(
            "Wrote {} assets to {}",
            compilation.len(),
            self.output_dir.display()
        );
        Ok(())
    }
}
