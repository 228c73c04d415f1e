//! Object storage integration for mirroring build assets
//!
//! Wraps an S3-compatible bucket (Alibaba OSS in production) behind a
//! single PUT-style call so plugins can be exercised against a recorder.

pub mod client;
pub mod mock;

pub use client::S3Storage;
pub use mock::MockStorage;

use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `data` under `key`, returning the remote object name.
    async fn put_object(&self, key: &str, data: &[u8], content_type: &str) -> Result<String>;
}
