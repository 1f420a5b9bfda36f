//! # Generic Raster Handler
//!
//! In-memory raster images without a metadata container we preserve:
//! PNG, GIF, WebP. Decoding, resizing and re-encoding all happen through the
//! `image` crate; no external tools are involved.

use crate::error::ConvertError;
use crate::file_manager::MediaFile;
use crate::handlers::{ensure_parent_dirs, MediaHandler};
use crate::registry::MediaKind;
use crate::size::{compute_target_size, BoundingBox};
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat};
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct RasterImage {
    file: MediaFile,
    image: DynamicImage,
    width: u32,
    height: u32,
}

impl RasterImage {
    pub fn open(path: &Path) -> Result<Self, ConvertError> {
        let image = image::open(path)?;
        let (width, height) = (image.width(), image.height());

        Ok(Self {
            file: MediaFile::new(path),
            image,
            width,
            height,
        })
    }

    /// Apply a bounding-box resize to the in-memory raster.
    pub(crate) fn resize_in_memory(&mut self, bounds: &BoundingBox) {
        let (new_width, new_height) =
            compute_target_size(self.width, self.height, bounds.length, bounds.width);

        debug!(
            "Resizing {} from {}x{} to {}x{}",
            self.file.filename, self.width, self.height, new_width, new_height
        );

        self.image = self
            .image
            .resize_exact(new_width, new_height, FilterType::Lanczos3);
        self.width = new_width;
        self.height = new_height;
    }

    pub(crate) fn media_file_ref(&self) -> &MediaFile {
        &self.file
    }

    pub(crate) fn current_dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Encode the current raster to `path` in the format its extension names.
    pub(crate) fn encode_to(&self, path: &Path) -> Result<(), ConvertError> {
        ensure_parent_dirs(path)?;
        let format = ImageFormat::from_path(path)?;

        // JPEG cannot carry an alpha channel; flatten before encoding.
        if format == ImageFormat::Jpeg && self.image.color().has_alpha() {
            let rgb = DynamicImage::ImageRgb8(self.image.to_rgb8());
            rgb.save_with_format(path, format)?;
        } else {
            self.image.save_with_format(path, format)?;
        }

        Ok(())
    }
}

impl MediaHandler for RasterImage {
    fn media_file(&self) -> &MediaFile {
        &self.file
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, bounds: &BoundingBox) -> Result<(), ConvertError> {
        self.resize_in_memory(bounds);
        Ok(())
    }

    fn can_save_native(&self) -> bool {
        MediaKind::Raster.can_save_native()
    }

    fn can_encode(&self, format: &str) -> bool {
        MediaKind::Raster.can_encode(format)
    }

    fn save(&mut self, output_dir: &Path) -> Result<PathBuf, ConvertError> {
        let output = self.file.output_path(output_dir);
        self.encode_to(&output)?;
        Ok(output)
    }

    fn save_as(&mut self, format: &str, output_dir: &Path) -> Result<PathBuf, ConvertError> {
        if !self.can_encode(format) {
            return Err(ConvertError::UnsupportedFormat(format!(
                "cannot encode '{}' to '{}'",
                self.file.filename, format
            )));
        }

        // Same format as the source: a resave, not a true conversion.
        let output = self.file.output_path_as(output_dir, format);
        self.encode_to(&output)?;
        Ok(output)
    }
}
