//! # Error Types Module
//!
//! Custom error taxonomy for conversion and sync operations.
//!
//! ## Categories:
//! - `Io`: filesystem errors (missing files, permissions, etc.)
//! - `Decode`: the matched handler could not parse the file content
//! - `UnsupportedFormat`: requested output format outside a handler's capability set
//! - `UnsupportedOperation`: native-format save on a read-only variant (camera raw)
//! - `UnknownExtension`: extension not claimed by any handler variant
//! - `ExternalTool`: ffmpeg/ffprobe/dcraw/exiftool failed or produced unparsable output
//! - `Configuration`: fatal setup errors, detected before any file is touched
//! - `Index`: checksum index parse/persist errors
//!
//! Per-file errors are caught at the pipeline loop boundary and turned into
//! a logged skip; only `Configuration` surfaces as process failure.

/// Custom error types for batch conversion and archive sync
#[derive(thiserror::Error, Debug)]
pub enum ConvertError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("decode error: {0}")]
    Decode(#[from] image::ImageError),

    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("no handler registered for extension: {0}")]
    UnknownExtension(String),

    #[error("external tool error: {0}")]
    ExternalTool(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("checksum index error: {0}")]
    Index(String),
}
