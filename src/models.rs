//! Data models and configuration
//!
//! Defines compiled assets, per-plugin result records, and the option set
//! both plugins are constructed from.

use crate::{Error, Result};
use std::path::PathBuf;

/// One named output artifact of a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledAsset {
    /// Output path relative to the output directory, `/`-separated.
    pub name: String,
    pub content: Vec<u8>,
}

impl CompiledAsset {
    pub fn new(name: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    pub remote_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFailure {
    pub key: String,
    pub error: String,
}

/// Outcome of one emit-time upload pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UploadReport {
    pub uploaded: Vec<UploadResult>,
    pub failed: Vec<UploadFailure>,
}

impl UploadReport {
    pub fn attempted(&self) -> usize {
        self.uploaded.len() + self.failed.len()
    }
}

/// Outcome of one source-map cleanup pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub deleted: Vec<PathBuf>,
    pub already_absent: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
    /// Names that would resolve outside the output directory.
    pub refused: Vec<String>,
}

/// Credentials and addressing for the remote bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub region: String,
    pub access_key_id: String,
    pub access_key_secret: String,
    pub bucket: String,
    pub prefix: String,
    pub endpoint: Option<String>,
    pub force_path_style: bool,
}

impl StorageConfig {
    /// Explicit endpoint, or the public OSS endpoint for the region.
    ///
    /// Accepts both `cn-hangzhou` and the ali-oss style `oss-cn-hangzhou`.
    pub fn endpoint_url(&self) -> String {
        self.endpoint.clone().unwrap_or_else(|| {
            if self.region.starts_with("oss-") {
                format!("https://{}.aliyuncs.com", self.region)
            } else {
                format!("https://oss-{}.aliyuncs.com", self.region)
            }
        })
    }
}

/// Static configuration handed to each plugin at construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginOptions {
    pub dry_run: bool,
    pub dist_path: Option<PathBuf>,
    pub storage: Option<StorageConfig>,
}

impl PluginOptions {
    /// Load options from the process environment, reading `.env` first.
    pub fn from_env() -> Result<Self> {
        load_env_file(dotenvy::dotenv())?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let dry_run = match lookup("DRY_RUN") {
            Some(value) => parse_bool("DRY_RUN", &value)?,
            None => false,
        };

        let dist_path = lookup("DIST_PATH")
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        // Uploads are only wired up when a region is configured.
        let storage = match lookup("OSS_REGION").filter(|value| !value.trim().is_empty()) {
            Some(region) => {
                let required = |key: &str| {
                    lookup(key)
                        .filter(|value| !value.trim().is_empty())
                        .ok_or_else(|| Error::ConfigurationAbsent(format!("{} not set", key)))
                };

                let force_path_style = match lookup("OSS_FORCE_PATH_STYLE") {
                    Some(value) => parse_bool("OSS_FORCE_PATH_STYLE", &value)?,
                    None => false,
                };

                Some(StorageConfig {
                    region,
                    access_key_id: required("OSS_ACCESS_KEY_ID")?,
                    access_key_secret: required("OSS_ACCESS_KEY_SECRET")?,
                    bucket: required("OSS_BUCKET")?,
                    prefix: lookup("OSS_PREFIX").unwrap_or_default(),
                    endpoint: lookup("OSS_ENDPOINT").filter(|value| !value.trim().is_empty()),
                    force_path_style,
                })
            }
            None => None,
        };

        Ok(Self {
            dry_run,
            dist_path,
            storage,
        })
    }
}

/// A missing `.env` is fine; a malformed one is an error.
fn load_env_file(loaded: dotenvy::Result<PathBuf>) -> Result<()> {
    match loaded {
        Ok(path) => {
            tracing::debug!("Loaded environment from {}", path.display());
            Ok(())
        }
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::InvalidConfig(format!(
            "{} must be a boolean, got '{}'",
            key, other
        ))),
    }
}
