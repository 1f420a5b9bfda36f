//! # EXIF-bearing Raster Handler
//!
//! JPEG images whose capture metadata (ISO, shutter speed, aperture, white
//! balance, camera model, ...) must survive a resize or re-encode.
//!
//! The pixels go through the same in-memory path as the generic raster
//! handler; metadata propagation is delegated to `exiftool` after the encode,
//! the same way the video transcode step preserves its tags. Converting to a
//! format without an EXIF container drops the metadata silently.

use crate::error::ConvertError;
use crate::file_manager::MediaFile;
use crate::handlers::raster::RasterImage;
use crate::handlers::MediaHandler;
use crate::platform::PlatformCommands;
use crate::registry::MediaKind;
use crate::size::BoundingBox;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, warn};

/// Output formats whose container can carry the source's EXIF block.
const EXIF_CAPABLE: &[&str] = &["jpg", "jpeg", "webp"];

pub struct ExifImage {
    raster: RasterImage,
}

impl ExifImage {
    pub fn open(path: &Path) -> Result<Self, ConvertError> {
        Ok(Self {
            raster: RasterImage::open(path)?,
        })
    }

    /// Copy the EXIF block from the source file into `target`.
    ///
    /// A missing or failing exiftool degrades the output (no metadata), it
    /// does not fail the file.
    fn propagate_metadata(&self, target: &Path) {
        let source = &self.raster.media_file_ref().path;
        let platform = PlatformCommands::instance();
        let exiftool = platform.get_command("exiftool");

        let result = Command::new(exiftool)
            .args([
                "-tagsFromFile",
                &source.to_string_lossy(),
                "-all:all",
                "-overwrite_original",
                &target.to_string_lossy(),
            ])
            .output();

        match result {
            Ok(output) if output.status.success() => {
                debug!("Propagated EXIF metadata to {}", target.display());
            }
            Ok(output) => {
                warn!(
                    "Failed to propagate EXIF metadata for {}: {}",
                    source.display(),
                    String::from_utf8_lossy(&output.stderr)
                );
            }
            Err(e) => {
                warn!(
                    "Could not run exiftool for {}: {}",
                    source.display(),
                    e
                );
            }
        }
    }
}

impl MediaHandler for ExifImage {
    fn media_file(&self) -> &MediaFile {
        self.raster.media_file_ref()
    }

    fn dimensions(&self) -> (u32, u32) {
        self.raster.current_dimensions()
    }

    fn resize(&mut self, bounds: &BoundingBox) -> Result<(), ConvertError> {
        self.raster.resize_in_memory(bounds);
        Ok(())
    }

    fn can_save_native(&self) -> bool {
        MediaKind::ExifRaster.can_save_native()
    }

    fn can_encode(&self, format: &str) -> bool {
        MediaKind::ExifRaster.can_encode(format)
    }

    fn save(&mut self, output_dir: &Path) -> Result<PathBuf, ConvertError> {
        let output = self.media_file().output_path(output_dir);
        self.raster.encode_to(&output)?;
        self.propagate_metadata(&output);
        Ok(output)
    }

    fn save_as(&mut self, format: &str, output_dir: &Path) -> Result<PathBuf, ConvertError> {
        if !self.can_encode(format) {
            return Err(ConvertError::UnsupportedFormat(format!(
                "cannot encode '{}' to '{}'",
                self.media_file().filename, format
            )));
        }

        let output = self.media_file().output_path_as(output_dir, format);
        self.raster.encode_to(&output)?;

        if EXIF_CAPABLE.contains(&format.to_lowercase().as_str()) {
            self.propagate_metadata(&output);
        } else {
            debug!(
                "Target format '{}' has no EXIF container, dropping metadata",
                format
            );
        }

        Ok(output)
    }
}
