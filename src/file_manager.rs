//! # File Management Module
//!
//! Candidate discovery and file utilities shared by the conversion pipeline
//! and the sync engine.
//!
//! ## Responsibilities:
//! - Recursive (or single-level) discovery of media files under a directory
//! - Media class filtering (photo / video / everything the registry knows)
//! - Size and modification-time lookup
//! - Human-readable size formatting
//!
//! Discovery only produces candidate paths; which handler owns a path is the
//! registry's decision.

use crate::registry::MediaTypeRegistry;
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use walkdir::WalkDir;

/// Coarse media classification used to filter discovery and sync candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaClass {
    #[default]
    All,
    Photo,
    Video,
}

impl MediaClass {
    /// Whether a path belongs to this class according to the registry.
    pub fn matches(&self, registry: &MediaTypeRegistry, path: &Path) -> bool {
        match registry.resolve_path(path) {
            Some(kind) => match self {
                MediaClass::All => true,
                MediaClass::Photo => kind.is_photo(),
                MediaClass::Video => kind.is_video(),
            },
            None => false,
        }
    }
}

impl std::str::FromStr for MediaClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(MediaClass::All),
            "photo" => Ok(MediaClass::Photo),
            "video" => Ok(MediaClass::Video),
            other => Err(format!("unknown media class: {other}")),
        }
    }
}

/// Derived attributes of one file under conversion.
#[derive(Debug, Clone)]
pub struct MediaFile {
    pub path: PathBuf,
    /// Base filename, e.g. `IMG_001.JPG`.
    pub filename: String,
    /// Lowercased extension, e.g. `jpg`. Empty if the path has none.
    pub extension: String,
    /// Filename minus extension, e.g. `IMG_001`.
    pub root_name: String,
}

impl MediaFile {
    pub fn new(path: &Path) -> Self {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        let root_name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();

        Self {
            path: path.to_path_buf(),
            filename,
            extension,
            root_name,
        }
    }

    /// Output path for a save in the original format.
    pub fn output_path(&self, output_dir: &Path) -> PathBuf {
        output_dir.join(&self.filename)
    }

    /// Output path for a save in `format`.
    pub fn output_path_as(&self, output_dir: &Path, format: &str) -> PathBuf {
        output_dir.join(format!("{}.{}", self.root_name, format.to_lowercase()))
    }
}

/// File discovery and metadata helpers.
pub struct FileManager;

impl FileManager {
    /// Find files under `root`, filtered by registry membership and class.
    ///
    /// With `recurse` false only the immediate children of `root` are
    /// considered. Enumeration order is the walk order and is what the
    /// pipeline reports file indices against.
    pub fn find_files(
        root: &Path,
        recurse: bool,
        registry: &MediaTypeRegistry,
        class: MediaClass,
    ) -> Result<Vec<PathBuf>> {
        let max_depth = if recurse { usize::MAX } else { 1 };
        let mut files = Vec::new();

        // An unreadable root or subtree is an enumeration failure, not a
        // silently shorter candidate list.
        for entry in WalkDir::new(root).max_depth(max_depth) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if class.matches(registry, path) {
                files.push(path.to_path_buf());
            }
        }

        Ok(files)
    }

    /// Size in bytes and modification time of a file.
    pub async fn file_info(path: &Path) -> Result<(u64, SystemTime)> {
        let metadata = fs::metadata(path).await?;
        Ok((metadata.len(), metadata.modified()?))
    }

    /// Human-readable file size.
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }
}
