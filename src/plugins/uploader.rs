use crate::compiler::{Compilation, EmitHook, Hooks, Plugin};
use crate::mime::content_type_for;
use crate::models::{CompiledAsset, PluginOptions, UploadFailure, UploadReport, UploadResult};
use crate::storage::{MockStorage, ObjectStorage, S3Storage};
use crate::{Error, Result};
use async_trait::async_trait;
use futures::future::join_all;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

pub const PLUGIN_NAME: &str = "UploadAlisOSSPlugin";

const UPLOADABLE_EXTENSIONS: &[&str] = &["js", "css", "jpg", "jpeg", "png", "gif"];

/// Scripts, stylesheets and raster images qualify for upload.
pub fn is_uploadable(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            UPLOADABLE_EXTENSIONS
                .iter()
                .any(|allowed| ext.eq_ignore_ascii_case(allowed))
        })
}

/// Uploads qualifying assets to `prefix + name` at emit time.
///
/// Every upload is issued at once and the emit step waits for all of them to
/// settle. A failed upload is logged and dropped; it never fails the build.
pub struct AssetUploader {
    storage: Box<dyn ObjectStorage>,
    prefix: String,
    dry_run: bool,
}

impl AssetUploader {
    /// Build an uploader backed by the configured bucket.
    ///
    /// In dry-run mode no network client is created and missing credentials
    /// are tolerated.
    pub async fn from_options(options: &PluginOptions) -> Result<Self> {
        let prefix = options
            .storage
            .as_ref()
            .map(|storage| storage.prefix.clone())
            .unwrap_or_default();

        if options.dry_run {
            info!(plugin = PLUGIN_NAME, "DRY Run Mode: uploads will be skipped");
            return Ok(Self::with_storage(Box::new(MockStorage::new()), prefix, true));
        }

        let config = options.storage.as_ref().ok_or_else(|| {
            Error::ConfigurationAbsent(
                "object storage credentials (OSS_REGION, OSS_ACCESS_KEY_ID, OSS_ACCESS_KEY_SECRET, OSS_BUCKET)"
                    .to_string(),
            )
        })?;

        info!(
            plugin = PLUGIN_NAME,
            "Uploading to bucket {} via {}",
            config.bucket,
            config.endpoint_url()
        );
        let storage = S3Storage::new(config).await?;

        Ok(Self::with_storage(Box::new(storage), prefix, false))
    }

    pub fn with_storage(
        storage: Box<dyn ObjectStorage>,
        prefix: impl Into<String>,
        dry_run: bool,
    ) -> Self {
        Self {
            storage,
            prefix: prefix.into(),
            dry_run,
        }
    }

    pub fn remote_key(&self, name: &str) -> String {
        format!("{}{}", self.prefix, name)
    }

    pub fn pickup_assets<'a>(&self, compilation: &'a Compilation) -> Vec<&'a CompiledAsset> {
        compilation
            .assets()
            .filter(|asset| is_uploadable(&asset.name))
            .collect()
    }

    /// Keys a real run would upload `compilation` to.
    pub fn planned_keys(&self, compilation: &Compilation) -> Vec<String> {
        self.pickup_assets(compilation)
            .into_iter()
            .map(|asset| self.remote_key(&asset.name))
            .collect()
    }

    pub async fn upload_assets(&self, compilation: &Compilation) -> UploadReport {
        if self.dry_run {
            info!(plugin = PLUGIN_NAME, "DRY Run Mode");
            for key in self.planned_keys(compilation) {
                info!(plugin = PLUGIN_NAME, "Would upload {}", key);
            }
            return UploadReport::default();
        }

        let uploads = self
            .pickup_assets(compilation)
            .into_iter()
            .map(|asset| self.put(asset));

        let mut report = UploadReport::default();
        for outcome in join_all(uploads).await {
            match outcome {
                Ok(result) => report.uploaded.push(result),
                Err(failure) => report.failed.push(failure),
            }
        }
        report
    }

    async fn put(&self, asset: &CompiledAsset) -> std::result::Result<UploadResult, UploadFailure> {
        let key = self.remote_key(&asset.name);
        let content_type = content_type_for(&asset.name);

        match self
            .storage
            .put_object(&key, &asset.content, content_type)
            .await
        {
            Ok(remote_name) => {
                info!(plugin = PLUGIN_NAME, "Uploaded: {}", remote_name);
                Ok(UploadResult { remote_name })
            }
            Err(e) => {
                error!(plugin = PLUGIN_NAME, "Upload failed for {}: {}", key, e);
                Err(UploadFailure {
                    key,
                    error: e.to_string(),
                })
            }
        }
    }
}

#[async_trait]
impl EmitHook for AssetUploader {
    async fn on_emit(&self, compilation: &Compilation) {
        let report = self.upload_assets(compilation).await;

        if report.failed.is_empty() {
            info!(
                plugin = PLUGIN_NAME,
                "Uploaded {} assets",
                report.uploaded.len()
            );
        } else {
            // TODO: surface a non-zero exit once CDN parity is required to ship.
            warn!(
                plugin = PLUGIN_NAME,
                "{} of {} uploads failed and were dropped",
                report.failed.len(),
                report.attempted()
            );
        }
    }
}

impl Plugin for AssetUploader {
    fn name(&self) -> &'static str {
        PLUGIN_NAME
    }

    fn apply(self: Arc<Self>, hooks: &mut Hooks) {
        hooks.tap_emit(PLUGIN_NAME, self);
    }
}
