//! Build lifecycle plugins
//!
//! [`AssetUploader`] mirrors emitted assets to object storage;
//! [`SourceMapCleaner`] removes `.js.map` files once the build is on disk.

pub mod cleaner;
pub mod uploader;

pub use cleaner::SourceMapCleaner;
pub use uploader::AssetUploader;
