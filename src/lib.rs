//! # Batch Convert Library
//!
//! Batch media conversion plus checksum-indexed archive sync.
//!
//! ## Module architecture:
//! - `config`: per-run conversion options and validation
//! - `error`: custom error taxonomy
//! - `size`: pure bounding-box resize math
//! - `registry`: static extension -> handler variant dispatch table
//! - `handlers`: one handler variant per format family (raster, EXIF
//!   raster, camera raw, video)
//! - `pipeline`: batch orchestration with per-file failure isolation
//! - `checksum`: content-hash index over a file tree
//! - `sync`: copy-if-missing against the checksum index
//! - `file_manager`: discovery and file utilities
//! - `report`: explicit event sink (run log file, console, test capture)
//! - `progress`: progress bar and run statistics
//! - `platform`: external tool resolution (ffmpeg, ffprobe, dcraw, exiftool)
//!
//! ## Usage:
//! ```rust,no_run
//! use std::sync::Arc;
//! use batchconvert::{
//!     ConsoleSink, ConversionOptions, ConversionPipeline, FfmpegBackend,
//!     InputSource, MediaTypeRegistry,
//! };
//!
//! # async fn run() -> anyhow::Result<()> {
//! let registry = MediaTypeRegistry::build()?;
//! let pipeline = ConversionPipeline::new(registry, Arc::new(FfmpegBackend::new()));
//! let options = ConversionOptions {
//!     input: InputSource::Folder { path: "/photos".into(), recurse: true },
//!     output_dir: "/converted".into(),
//!     format: Some("jpg".into()),
//!     resize: None,
//!     assume_yes: true,
//! };
//! let report = pipeline.convert(&options, &ConsoleSink).await?;
//! println!("{} saved, {} skipped", report.saved(), report.skipped());
//! # Ok(())
//! # }
//! ```

pub mod checksum;
pub mod config;
pub mod error;
pub mod file_manager;
pub mod handlers;
pub mod pipeline;
pub mod platform;
pub mod progress;
pub mod registry;
pub mod report;
pub mod size;
pub mod sync;

pub use checksum::{ChecksumIndex, ChecksumRecord};
pub use config::{ConversionOptions, InputSource};
pub use error::ConvertError;
pub use file_manager::{FileManager, MediaClass, MediaFile};
pub use handlers::{FfmpegBackend, MediaHandler, VideoBackend};
pub use pipeline::{ConversionPipeline, ConversionReport, FileOutcome, Outcome};
pub use registry::{MediaKind, MediaTypeRegistry};
pub use report::{ConsoleSink, EventSink, MemorySink, RunLog};
pub use size::{compute_target_size, BoundingBox};
pub use sync::{SyncEngine, SyncReport};
