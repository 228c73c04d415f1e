//! Post-build asset pipeline for a multi-page micro-frontend bundle
//!
//! Hooks two plugins into the build lifecycle: one mirrors scripts,
//! stylesheets and images to S3-compatible object storage at emit time,
//! the other strips `.js.map` files from the output directory once the
//! build is done.

pub mod compiler;
pub mod error;
pub mod mime;
pub mod models;
pub mod plugins;
pub mod storage;

pub use error::{Error, Result};
