//! # Video Handler
//!
//! Video files are never decoded in-process. Dimension probing and the
//! resize/save/convert operations all go through a narrow transcoder
//! interface, so the control flow and error handling here are independent of
//! which concrete external tool is installed.
//!
//! ## Pipeline:
//! 1. Probe width/height at construction (a probe failure fails this file
//!    only, never the batch)
//! 2. A resize records target dimensions, forced even because the encoder
//!    rejects odd frame sizes
//! 3. The terminal `save_as("mp4")` runs one blocking transcode: a scale
//!    filter re-encode when a resize is pending, a stream copy otherwise

use crate::error::ConvertError;
use crate::file_manager::MediaFile;
use crate::handlers::MediaHandler;
use crate::platform::PlatformCommands;
use crate::registry::MediaKind;
use crate::size::{compute_target_size, BoundingBox};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use tracing::debug;

/// External transcoding process contract.
pub trait VideoBackend: Send + Sync {
    /// Frame dimensions of the primary video stream.
    fn probe(&self, path: &Path) -> Result<(u32, u32), ConvertError>;

    /// Re-encode `input` to `output`, applying `scale` as a width:height
    /// filter when present, stream-copying when not.
    fn transcode(
        &self,
        input: &Path,
        scale: Option<(u32, u32)>,
        output: &Path,
    ) -> Result<(), ConvertError>;
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
}

/// Extract the frame dimensions from `ffprobe -print_format json` output.
///
/// Exactly one video stream with one positive width/height pair is required.
fn parse_probe_dimensions(stdout: &[u8], path: &Path) -> Result<(u32, u32), ConvertError> {
    let info: ProbeOutput = serde_json::from_slice(stdout)
        .map_err(|e| ConvertError::ExternalTool(format!("unparsable ffprobe output: {e}")))?;

    if info.streams.len() != 1 {
        return Err(ConvertError::ExternalTool(format!(
            "expected exactly one video stream in {}",
            path.display()
        )));
    }

    match (info.streams[0].width, info.streams[0].height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => Ok((w, h)),
        _ => Err(ConvertError::ExternalTool(format!(
            "no dimensions in ffprobe output for {}",
            path.display()
        ))),
    }
}

/// ffprobe/ffmpeg implementation of the transcoder contract.
pub struct FfmpegBackend;

impl FfmpegBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FfmpegBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl VideoBackend for FfmpegBackend {
    fn probe(&self, path: &Path) -> Result<(u32, u32), ConvertError> {
        let platform = PlatformCommands::instance();
        let ffprobe = platform.get_command("ffprobe");

        let output = Command::new(ffprobe)
            .args([
                "-v",
                "error",
                "-select_streams",
                "v:0",
                "-print_format",
                "json",
                "-show_streams",
                &path.to_string_lossy().into_owned(),
            ])
            .output()
            .map_err(|e| {
                ConvertError::ExternalTool(format!("failed to execute {}: {}", ffprobe, e))
            })?;

        if !output.status.success() {
            return Err(ConvertError::ExternalTool(format!(
                "ffprobe failed for {}: {}",
                path.display(),
                String::from_utf8_lossy(&output.stderr)
            )));
        }

        parse_probe_dimensions(&output.stdout, path)
    }

    fn transcode(
        &self,
        input: &Path,
        scale: Option<(u32, u32)>,
        output: &Path,
    ) -> Result<(), ConvertError> {
        let platform = PlatformCommands::instance();
        let ffmpeg = platform.get_command("ffmpeg");

        let mut cmd = Command::new(ffmpeg);
        cmd.args(["-i", &input.to_string_lossy().into_owned()]);

        match scale {
            Some((width, height)) => {
                cmd.args(["-vf", &format!("scale={}:{}", width, height)]);
                cmd.args(["-strict", "-2"]);
            }
            None => {
                // No resize requested: remux without re-encoding.
                cmd.args(["-c", "copy", "-strict", "-2"]);
            }
        }

        cmd.args(["-loglevel", "warning", "-y", &output.to_string_lossy().into_owned()]);

        debug!("Running transcode: {:?}", cmd);
        let result = cmd.output().map_err(|e| {
            ConvertError::ExternalTool(format!("failed to execute {}: {}", ffmpeg, e))
        })?;

        if !result.status.success() {
            return Err(ConvertError::ExternalTool(format!(
                "ffmpeg failed for {}: {}",
                input.display(),
                String::from_utf8_lossy(&result.stderr)
            )));
        }

        Ok(())
    }
}

/// Round up to the next even value; encoders reject odd frame dimensions.
fn force_even(value: u32) -> u32 {
    value + (value & 1)
}

pub struct Video {
    file: MediaFile,
    backend: Arc<dyn VideoBackend>,
    width: u32,
    height: u32,
    /// Target dimensions recorded by a resize, applied at save time.
    pending_scale: Option<(u32, u32)>,
}

impl Video {
    pub fn open(path: &Path, backend: Arc<dyn VideoBackend>) -> Result<Self, ConvertError> {
        let (width, height) = backend.probe(path)?;

        Ok(Self {
            file: MediaFile::new(path),
            backend,
            width,
            height,
            pending_scale: None,
        })
    }
}

impl MediaHandler for Video {
    fn media_file(&self) -> &MediaFile {
        &self.file
    }

    fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn resize(&mut self, bounds: &BoundingBox) -> Result<(), ConvertError> {
        let (new_width, new_height) =
            compute_target_size(self.width, self.height, bounds.length, bounds.width);
        let (new_width, new_height) = (force_even(new_width), force_even(new_height));

        self.width = new_width;
        self.height = new_height;
        self.pending_scale = Some((new_width, new_height));
        Ok(())
    }

    fn can_save_native(&self) -> bool {
        MediaKind::Video.can_save_native()
    }

    fn can_encode(&self, format: &str) -> bool {
        MediaKind::Video.can_encode(format)
    }

    fn save(&mut self, _output_dir: &Path) -> Result<PathBuf, ConvertError> {
        Err(ConvertError::UnsupportedOperation(format!(
            "cannot re-encode '{}' in its source container, convert to mp4 instead",
            self.file.filename
        )))
    }

    fn save_as(&mut self, format: &str, output_dir: &Path) -> Result<PathBuf, ConvertError> {
        if !self.can_encode(format) {
            return Err(ConvertError::UnsupportedFormat(format!(
                "cannot convert '{}' to '{}'",
                self.file.filename, format
            )));
        }

        let output = self.file.output_path_as(output_dir, format);
        crate::handlers::ensure_parent_dirs(&output)?;
        self.backend
            .transcode(&self.file.path, self.pending_scale, &output)?;
        Ok(output)
    }
}
