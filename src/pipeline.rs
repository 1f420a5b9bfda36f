//! # Conversion Pipeline Module
//!
//! Orchestrates one batch run: enumerate candidates, construct a handler per
//! file via the registry, apply the requested resize and format conversion,
//! record one outcome per file.
//!
//! ## Guarantees:
//! - One file's failure never aborts the batch; every failure becomes a
//!   logged skip and the loop continues
//! - The only batch-fatal conditions are configuration errors detected
//!   before any file is processed (ambiguous registry, unreadable input
//!   root, invalid options)
//! - Handler instances live for exactly one loop iteration

use crate::config::{ConversionOptions, InputSource};
use crate::error::ConvertError;
use crate::file_manager::{FileManager, MediaClass, MediaFile};
use crate::handlers::{self, VideoBackend};
use crate::progress::{ConversionStats, ProgressManager};
use crate::registry::MediaTypeRegistry;
use crate::report::EventSink;
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What happened to one candidate file.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Terminal save succeeded; holds the written path.
    Saved(PathBuf),
    /// The file was skipped; holds the reported reason.
    Skipped(String),
}

#[derive(Debug, Clone)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub outcome: Outcome,
}

/// Per-file ledger of a finished run.
#[derive(Debug, Default)]
pub struct ConversionReport {
    pub outcomes: Vec<FileOutcome>,
}

impl ConversionReport {
    pub fn saved(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.outcome, Outcome::Saved(_)))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.saved()
    }
}

pub struct ConversionPipeline {
    registry: MediaTypeRegistry,
    backend: Arc<dyn VideoBackend>,
}

impl ConversionPipeline {
    pub fn new(registry: MediaTypeRegistry, backend: Arc<dyn VideoBackend>) -> Self {
        Self { registry, backend }
    }

    pub fn registry(&self) -> &MediaTypeRegistry {
        &self.registry
    }

    /// Resolve the candidate file list for a run.
    ///
    /// A folder input is filtered down to extensions the registry knows; an
    /// explicit file list is taken verbatim (unknown extensions then surface
    /// as per-file skips, not here).
    pub fn candidates(&self, options: &ConversionOptions) -> Result<Vec<PathBuf>> {
        options.validate(&self.registry)?;

        match &options.input {
            InputSource::Folder { path, recurse } => {
                FileManager::find_files(path, *recurse, &self.registry, MediaClass::All)
            }
            InputSource::Files(files) => Ok(files.clone()),
        }
    }

    /// Run the whole batch: enumerate, then convert each candidate.
    pub async fn convert(
        &self,
        options: &ConversionOptions,
        sink: &dyn EventSink,
    ) -> Result<ConversionReport> {
        let files = self.candidates(options)?;
        self.convert_files(&files, options, sink).await
    }

    /// Convert an already-resolved candidate list.
    pub async fn convert_files(
        &self,
        files: &[PathBuf],
        options: &ConversionOptions,
        sink: &dyn EventSink,
    ) -> Result<ConversionReport> {
        options.validate(&self.registry)?;
        tokio::fs::create_dir_all(&options.output_dir).await?;

        sink.record(&format!("Number of files to convert: {}", files.len()));

        let progress = ProgressManager::new(files.len() as u64);
        let mut stats = ConversionStats::new();
        let mut report = ConversionReport::default();

        for (i, path) in files.iter().enumerate() {
            let media = MediaFile::new(path);
            sink.record(&format!(
                "[{}/{}] Processing file: '{}'.",
                i + 1,
                files.len(),
                media.filename
            ));

            let outcome = match self.convert_one(path, options) {
                Ok(written) => {
                    stats.add_converted();
                    progress.update(&format!("[OK] {}", media.filename));
                    Outcome::Saved(written)
                }
                Err(e) => {
                    let reason = e.to_string();
                    sink.record(&format!(
                        "Failed to convert file '{}'. Message: {}.",
                        media.filename, reason
                    ));
                    stats.add_skipped();
                    progress.update(&format!("[SKIP] {}", media.filename));
                    Outcome::Skipped(reason)
                }
            };

            report.outcomes.push(FileOutcome {
                path: path.clone(),
                outcome,
            });
        }

        progress.finish(&stats.format_summary());
        sink.record(&stats.format_summary());

        Ok(report)
    }

    /// The per-file state machine: resolve, construct, resize, save.
    fn convert_one(&self, path: &Path, options: &ConversionOptions) -> Result<PathBuf, ConvertError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_string();

        let kind = self
            .registry
            .resolve(&extension)
            .ok_or(ConvertError::UnknownExtension(extension))?;

        let mut handler = handlers::open_handler(kind, path, self.backend.clone())?;

        if let Some(bounds) = &options.resize {
            handler.resize(bounds)?;
        }

        match &options.format {
            Some(format) => handler.save_as(format, &options.output_dir),
            None => handler.save(&options.output_dir),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handlers::FfmpegBackend;
    use crate::report::MemorySink;
    use crate::size::BoundingBox;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    fn pipeline() -> ConversionPipeline {
        ConversionPipeline::new(
            MediaTypeRegistry::build().unwrap(),
            Arc::new(FfmpegBackend::new()),
        )
    }

    fn write_image(path: &Path, width: u32, height: u32) {
        let img = RgbImage::from_pixel(width, height, Rgb([10, 120, 230]));
        img.save(path).unwrap();
    }

    fn folder_options(input: &TempDir, output: &TempDir) -> ConversionOptions {
        ConversionOptions {
            input: InputSource::Folder {
                path: input.path().to_path_buf(),
                recurse: true,
            },
            output_dir: output.path().to_path_buf(),
            format: None,
            resize: None,
            assume_yes: true,
        }
    }

    #[tokio::test]
    async fn test_batch_save_in_original_formats() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        write_image(&input.path().join("a.png"), 20, 20);
        write_image(&input.path().join("b.jpg"), 30, 20);

        let sink = MemorySink::new();
        let report = pipeline()
            .convert(&folder_options(&input, &output), &sink)
            .await
            .unwrap();

        assert_eq!(report.saved(), 2);
        assert!(output.path().join("a.png").exists());
        assert!(output.path().join("b.jpg").exists());
    }

    #[tokio::test]
    async fn test_batch_isolation_one_corrupt_file() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        write_image(&input.path().join("good1.png"), 20, 20);
        std::fs::write(input.path().join("corrupt.jpg"), b"not an image").unwrap();
        write_image(&input.path().join("good2.png"), 20, 20);

        let sink = MemorySink::new();
        let report = pipeline()
            .convert(&folder_options(&input, &output), &sink)
            .await
            .unwrap();

        assert_eq!(report.outcomes.len(), 3);
        assert_eq!(report.saved(), 2);
        assert_eq!(report.skipped(), 1);
        assert!(sink
            .lines()
            .iter()
            .any(|l| l.contains("Failed to convert file 'corrupt.jpg'")));
    }

    #[tokio::test]
    async fn test_resize_and_convert_format() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        write_image(&input.path().join("photo.jpg"), 400, 300);

        let mut options = folder_options(&input, &output);
        options.resize = Some(BoundingBox::new(192, 108));
        options.format = Some("png".to_string());

        let sink = MemorySink::new();
        let report = pipeline().convert(&options, &sink).await.unwrap();
        assert_eq!(report.saved(), 1);

        let converted = image::open(output.path().join("photo.png")).unwrap();
        assert_eq!((converted.width(), converted.height()), (192, 144));
    }

    #[tokio::test]
    async fn test_explicit_file_list_skips_unknown_extension() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        write_image(&input.path().join("a.png"), 10, 10);
        std::fs::write(input.path().join("notes.txt"), b"hello").unwrap();

        let options = ConversionOptions {
            input: InputSource::Files(vec![
                input.path().join("a.png"),
                input.path().join("notes.txt"),
            ]),
            output_dir: output.path().to_path_buf(),
            format: None,
            resize: None,
            assume_yes: true,
        };

        let sink = MemorySink::new();
        let report = pipeline().convert(&options, &sink).await.unwrap();

        assert_eq!(report.saved(), 1);
        assert_eq!(report.skipped(), 1);
        assert!(sink
            .lines()
            .iter()
            .any(|l| l.contains("no handler registered")));
    }

    #[tokio::test]
    async fn test_unsupported_target_format_skips_and_continues() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        write_image(&input.path().join("first.png"), 10, 10);
        write_image(&input.path().join("second.png"), 10, 10);

        // mp4 is a known output format, but no raster handler encodes it.
        let mut options = folder_options(&input, &output);
        options.format = Some("mp4".to_string());

        let sink = MemorySink::new();
        let report = pipeline().convert(&options, &sink).await.unwrap();

        assert_eq!(report.saved(), 0);
        assert_eq!(report.skipped(), 2);
        assert!(std::fs::read_dir(output.path()).unwrap().next().is_none());
    }

    #[tokio::test]
    async fn test_folder_enumeration_ignores_unknown_extensions() {
        let input = TempDir::new().unwrap();
        let output = TempDir::new().unwrap();
        write_image(&input.path().join("a.png"), 10, 10);
        std::fs::write(input.path().join("notes.txt"), b"hello").unwrap();

        let candidates = pipeline().candidates(&folder_options(&input, &output)).unwrap();
        assert_eq!(candidates.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_options_fail_before_processing() {
        let output = TempDir::new().unwrap();
        let options = ConversionOptions {
            input: InputSource::Folder {
                path: PathBuf::from("/no/such/input"),
                recurse: true,
            },
            output_dir: output.path().to_path_buf(),
            format: None,
            resize: None,
            assume_yes: true,
        };

        let sink = MemorySink::new();
        assert!(pipeline().convert(&options, &sink).await.is_err());
        assert!(sink.lines().is_empty());
    }
}
