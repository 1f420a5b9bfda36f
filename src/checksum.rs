//! # Checksum Index Module
//!
//! Content-addressed index over a file tree, used to deduplicate archive
//! sync operations.
//!
//! ## Responsibilities:
//! - Stream-hash whole files (SHA-256, fixed-size chunks, memory use
//!   independent of file size)
//! - Persist an ordered scan as a simple tabular file:
//!   header `id,filename,timestamp`, hash in hex, mtime as local
//!   `YYYY-MM-DD HH:MM:SS`
//! - Reload the table into a hash -> record mapping
//!
//! Identity is the content hash alone: two paths with identical bytes are
//! the same file as far as sync is concerned. A repeated hash in persisted
//! data should not happen in a valid index; loading one is warning-worthy,
//! not fatal, and the last row wins.

use crate::error::ConvertError;
use crate::file_manager::{FileManager, MediaClass};
use crate::registry::MediaTypeRegistry;
use crate::report::EventSink;
use anyhow::Result;
use chrono::{DateTime, Local};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::warn;

const HASH_CHUNK_SIZE: usize = 64 * 1024;
const INDEX_HEADER: &str = "id,filename,timestamp";

/// One indexed file: content hash, original path, formatted mtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumRecord {
    pub hash: String,
    pub path: PathBuf,
    pub timestamp: String,
}

/// Whole-file SHA-256, streamed in fixed-size chunks.
pub async fn hash_file(path: &Path) -> Result<String, ConvertError> {
    let mut file = File::open(path).await?;
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; HASH_CHUNK_SIZE];

    loop {
        let read = file.read(&mut buffer).await?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

/// Format a modification time the way the index stores it.
pub fn format_timestamp(mtime: SystemTime) -> String {
    DateTime::<Local>::from(mtime)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// Ordered scan results plus a hash lookup over them.
#[derive(Default)]
pub struct ChecksumIndex {
    records: Vec<ChecksumRecord>,
    by_hash: HashMap<String, usize>,
}

impl ChecksumIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scan `root` recursively and hash every matching file.
    ///
    /// Files that disappear or fail to read mid-scan are logged and skipped;
    /// the scan continues.
    pub async fn build(
        root: &Path,
        registry: &MediaTypeRegistry,
        class: MediaClass,
        sink: &dyn EventSink,
    ) -> Result<Self> {
        let files = FileManager::find_files(root, true, registry, class)?;
        sink.record(&format!("Number of files to process: {}", files.len()));

        let mut index = Self::new();
        let mut total_bytes = 0u64;
        for (i, path) in files.iter().enumerate() {
            let hash = match hash_file(path).await {
                Ok(hash) => hash,
                Err(e) => {
                    sink.record(&format!(
                        "Failed to hash file [{}] ({}): {}",
                        i + 1,
                        path.display(),
                        e
                    ));
                    continue;
                }
            };
            let (size, mtime) = match FileManager::file_info(path).await {
                Ok(info) => info,
                Err(e) => {
                    sink.record(&format!(
                        "Failed to stat file [{}] ({}): {}",
                        i + 1,
                        path.display(),
                        e
                    ));
                    continue;
                }
            };
            total_bytes += size;

            sink.record(&format!("Writing file [{}]: {}", i + 1, hash));
            index.insert(ChecksumRecord {
                hash,
                path: path.clone(),
                timestamp: format_timestamp(mtime),
            });
        }

        sink.record(&format!(
            "Indexed size: {}",
            FileManager::format_size(total_bytes)
        ));
        Ok(index)
    }

    /// Insert a record; an existing record with the same hash is replaced.
    pub fn insert(&mut self, record: ChecksumRecord) {
        match self.by_hash.get(&record.hash) {
            Some(&i) => self.records[i] = record,
            None => {
                self.by_hash.insert(record.hash.clone(), self.records.len());
                self.records.push(record);
            }
        }
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.by_hash.contains_key(hash)
    }

    pub fn get(&self, hash: &str) -> Option<&ChecksumRecord> {
        self.by_hash.get(hash).map(|&i| &self.records[i])
    }

    pub fn records(&self) -> &[ChecksumRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Persist as the tabular scan-results format.
    pub async fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let mut content = String::from(INDEX_HEADER);
        content.push('\n');
        for record in &self.records {
            content.push_str(&format!(
                "{},{},{}\n",
                record.hash,
                record.path.display(),
                record.timestamp
            ));
        }

        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Load a persisted index.
    ///
    /// The hash is the first field and the timestamp the last, so a filename
    /// containing commas still parses. A repeated hash is warned about and
    /// the later row wins.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let mut lines = content.lines();

        match lines.next() {
            Some(header) if header.trim() == INDEX_HEADER => {}
            other => {
                return Err(ConvertError::Index(format!(
                    "bad index header in {}: {:?}",
                    path.display(),
                    other
                ))
                .into())
            }
        }

        let mut index = Self::new();
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            let Some(first) = line.find(',') else {
                warn!("Skipping malformed index line: {}", line);
                continue;
            };
            let Some(last) = line.rfind(',').filter(|&last| last > first) else {
                warn!("Skipping malformed index line: {}", line);
                continue;
            };

            let hash = line[..first].to_string();
            let filename = &line[first + 1..last];
            let timestamp = line[last + 1..].to_string();

            if index.contains(&hash) {
                warn!("Duplicate hash in index, keeping the later row: {}", hash);
            }
            index.insert(ChecksumRecord {
                hash,
                path: PathBuf::from(filename),
                timestamp,
            });
        }

        Ok(index)
    }
}
