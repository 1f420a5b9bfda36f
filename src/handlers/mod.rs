//! # Media Handlers Module
//!
//! One handler variant per family of file formats, behind a common
//! capability interface.
//!
//! ## Lifecycle per instance:
//! `Loaded -> [Resized] -> Saved | Failed`. A handler is constructed from a
//! path (decoding the content, which may fail), mutated by at most a resize
//! step, consumed by exactly one terminal save, then discarded. Instances
//! are never shared across files.
//!
//! ## Variants:
//! - [`raster::RasterImage`]: generic in-memory raster (PNG/GIF/WebP)
//! - [`exif::ExifImage`]: JPEG raster with EXIF propagation
//! - [`raw::RawImage`]: camera raw, decode-only via dcraw
//! - [`video::Video`]: container sizing/re-encoding via an external transcoder
//!
//! Callers can ask `can_save_native()` / `can_encode()` before invoking a
//! terminal operation; invoking an unsupported one returns a typed error
//! rather than panicking.

pub mod exif;
pub mod raster;
pub mod raw;
pub mod video;

use crate::error::ConvertError;
use crate::file_manager::MediaFile;
use crate::registry::MediaKind;
use crate::size::BoundingBox;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub use video::{FfmpegBackend, VideoBackend};

/// Capability set shared by all handler variants.
pub trait MediaHandler {
    /// Derived attributes of the file this handler owns.
    fn media_file(&self) -> &MediaFile;

    /// Current dimensions of the decoded content. Reflects any in-memory
    /// resize already applied, not the on-disk original.
    fn dimensions(&self) -> (u32, u32);

    /// Resize the decoded content against a bounding box. Calling this twice
    /// resizes the already-resized result.
    fn resize(&mut self, bounds: &BoundingBox) -> Result<(), ConvertError>;

    /// Whether this variant can re-save its own native format.
    fn can_save_native(&self) -> bool;

    /// Whether this variant can encode to `format`.
    fn can_encode(&self, format: &str) -> bool;

    /// Write the content in its original format into `output_dir`.
    fn save(&mut self, output_dir: &Path) -> Result<PathBuf, ConvertError>;

    /// Write the content as `format` into `output_dir`. For raster variants
    /// a target equal to the source extension degenerates to a resave.
    fn save_as(&mut self, format: &str, output_dir: &Path) -> Result<PathBuf, ConvertError>;
}

/// Construct the handler a registry resolution asked for, decoding `path`.
pub fn open_handler(
    kind: MediaKind,
    path: &Path,
    backend: Arc<dyn VideoBackend>,
) -> Result<Box<dyn MediaHandler>, ConvertError> {
    match kind {
        MediaKind::Raster => Ok(Box::new(raster::RasterImage::open(path)?)),
        MediaKind::ExifRaster => Ok(Box::new(exif::ExifImage::open(path)?)),
        MediaKind::Raw => Ok(Box::new(raw::RawImage::open(path)?)),
        MediaKind::Video => Ok(Box::new(video::Video::open(path, backend)?)),
    }
}

pub(crate) fn ensure_parent_dirs(path: &Path) -> Result<(), ConvertError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}
