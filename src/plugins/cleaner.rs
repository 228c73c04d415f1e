use crate::compiler::{resolve_asset_path, DoneHook, Hooks, Plugin, Stats};
use crate::models::{CleanReport, PluginOptions};
use crate::{Error, Result};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, warn};

pub const PLUGIN_NAME: &str = "DeleteSourceMapWebpackPlugin";

const SOURCE_MAP_SUFFIX: &str = ".js.map";

pub fn is_source_map(name: &str) -> bool {
    name.ends_with(SOURCE_MAP_SUFFIX)
}

/// Deletes `.js.map` files from the output directory once the build is done.
pub struct SourceMapCleaner {
    dist_path: Option<PathBuf>,
    dry_run: bool,
}

impl SourceMapCleaner {
    pub fn new(options: &PluginOptions) -> Result<Self> {
        if !options.dry_run && options.dist_path.is_none() {
            return Err(Error::ConfigurationAbsent(
                "output directory for source map cleanup (DIST_PATH)".to_string(),
            ));
        }

        Ok(Self {
            dist_path: options.dist_path.clone(),
            dry_run: options.dry_run,
        })
    }

    /// Delete every source map among `names`, one file at a time.
    ///
    /// A file that is already gone is a no-op; any other failure is logged
    /// and the pass moves on to the next file.
    pub async fn clean<'a>(&self, names: impl IntoIterator<Item = &'a str>) -> CleanReport {
        let mut report = CleanReport::default();
        let maps = names.into_iter().filter(|name| is_source_map(name));

        let dist_path = match (&self.dist_path, self.dry_run) {
            (Some(dist_path), false) => dist_path,
            _ => {
                info!(plugin = PLUGIN_NAME, "DRY Run Mode");
                for name in maps {
                    info!(plugin = PLUGIN_NAME, "Would delete {}", name);
                }
                return report;
            }
        };

        for name in maps {
            let Some(path) = resolve_asset_path(dist_path, name) else {
                warn!(
                    plugin = PLUGIN_NAME,
                    "Refusing to delete {} outside {}",
                    name,
                    dist_path.display()
                );
                report.refused.push(name.to_string());
                continue;
            };

            match tokio::fs::remove_file(&path).await {
                Ok(()) => {
                    info!(plugin = PLUGIN_NAME, "Deleted {}", path.display());
                    report.deleted.push(path);
                }
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    report.already_absent.push(path);
                }
                Err(e) => {
                    error!(
                        plugin = PLUGIN_NAME,
                        "Failed to delete {}: {}",
                        path.display(),
                        e
                    );
                    report.failed.push(path);
                }
            }
        }

        report
    }
}

#[async_trait]
impl DoneHook for SourceMapCleaner {
    async fn on_done(&self, stats: &Stats<'_>) {
        let report = self.clean(stats.asset_names()).await;

        if !report.failed.is_empty() || !report.refused.is_empty() {
            warn!(
                plugin = PLUGIN_NAME,
                "{} source maps could not be deleted, {} refused",
                report.failed.len(),
                report.refused.len()
            );
        }
        if !self.dry_run {
            info!(
                plugin = PLUGIN_NAME,
                "Removed {} source maps ({} already absent)",
                report.deleted.len(),
                report.already_absent.len()
            );
        }
    }
}

impl Plugin for SourceMapCleaner {
    fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    fn apply(self: Arc<Self>, hooks: &mut Hooks) {
        hooks.tap_done(PLUGIN_NAME, self);
    }
}
