//! # Sync Engine Module
//!
//! Copies files from a source tree into an archive folder, skipping files
//! whose content the archive's checksum index already knows.
//!
//! ## Decision per file:
//! - checksum verification on: hash the file; hash present in the index ->
//!   "already exists", no copy; absent -> copy and remember the hash so a
//!   second identical file in the same run also dedups
//! - checksum verification off: unconditional copy (bulk-import mode, the
//!   index is not consulted)
//!
//! One file's IO failure is logged and skipped; the run continues.

use crate::checksum::{self, ChecksumIndex, ChecksumRecord};
use crate::file_manager::{FileManager, MediaClass};
use crate::registry::MediaTypeRegistry;
use crate::report::EventSink;
use anyhow::Result;
use std::path::Path;

/// Per-run copy/skip tally.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub candidates: usize,
    pub copied: usize,
    pub already_present: usize,
    pub failed: usize,
}

pub struct SyncEngine<'a> {
    registry: &'a MediaTypeRegistry,
}

impl<'a> SyncEngine<'a> {
    pub fn new(registry: &'a MediaTypeRegistry) -> Self {
        Self { registry }
    }

    /// Sync `source_tree` into `dest_dir` against `index`.
    pub async fn sync(
        &self,
        source_tree: &Path,
        dest_dir: &Path,
        index: &mut ChecksumIndex,
        verify_by_checksum: bool,
        class: MediaClass,
        sink: &dyn EventSink,
    ) -> Result<SyncReport> {
        tokio::fs::create_dir_all(dest_dir).await?;

        let source_files = FileManager::find_files(source_tree, true, self.registry, class)?;
        sink.record(&format!("Number of source files: {}", source_files.len()));

        let mut report = SyncReport {
            candidates: source_files.len(),
            ..Default::default()
        };

        for (i, path) in source_files.iter().enumerate() {
            let result = if verify_by_checksum {
                self.sync_with_checksum(i, path, dest_dir, index, sink).await
            } else {
                sink.record(&format!(
                    "[XX] - File {}. Copying... ({})",
                    i + 1,
                    path.display()
                ));
                self.copy_into(path, dest_dir).await.map(|_| true)
            };

            match result {
                Ok(true) => report.copied += 1,
                Ok(false) => report.already_present += 1,
                Err(e) => {
                    report.failed += 1;
                    sink.record(&format!(
                        "Failed to sync file {} ({}): {}",
                        i + 1,
                        path.display(),
                        e
                    ));
                }
            }
        }

        Ok(report)
    }

    /// Returns true if the file was copied, false if it was already present.
    async fn sync_with_checksum(
        &self,
        i: usize,
        path: &Path,
        dest_dir: &Path,
        index: &mut ChecksumIndex,
        sink: &dyn EventSink,
    ) -> Result<bool> {
        let hash = checksum::hash_file(path).await?;

        if let Some(existing) = index.get(&hash) {
            sink.record(&format!(
                "[OK] - File {} exists already ({}) in folder ({})",
                i + 1,
                path.display(),
                existing.path.display()
            ));
            return Ok(false);
        }

        sink.record(&format!(
            "[XX] - File {} does not exist. Copying... ({})",
            i + 1,
            path.display()
        ));
        self.copy_into(path, dest_dir).await?;

        let (_, mtime) = FileManager::file_info(path).await?;
        index.insert(ChecksumRecord {
            hash,
            path: path.to_path_buf(),
            timestamp: checksum::format_timestamp(mtime),
        });

        Ok(true)
    }

    async fn copy_into(&self, path: &Path, dest_dir: &Path) -> Result<()> {
        let filename = path
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("source path has no filename: {}", path.display()))?;
        tokio::fs::copy(path, dest_dir.join(filename)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::MemorySink;
    use tempfile::TempDir;

    fn setup() -> (MediaTypeRegistry, TempDir, TempDir) {
        (
            MediaTypeRegistry::build().unwrap(),
            TempDir::new().unwrap(),
            TempDir::new().unwrap(),
        )
    }

    #[tokio::test]
    async fn test_dedup_skips_identical_content() {
        let (registry, source, dest) = setup();
        std::fs::write(source.path().join("copy-of-f.jpg"), b"the bytes of F").unwrap();

        // Index already knows these bytes under a different name and path.
        let mut index = ChecksumIndex::new();
        let hash = checksum::hash_file(&source.path().join("copy-of-f.jpg"))
            .await
            .unwrap();
        index.insert(ChecksumRecord {
            hash,
            path: "/archive/F.jpg".into(),
            timestamp: "2016-10-22 12:00:00".to_string(),
        });

        let sink = MemorySink::new();
        let engine = SyncEngine::new(&registry);
        let report = engine
            .sync(source.path(), dest.path(), &mut index, true, MediaClass::All, &sink)
            .await
            .unwrap();

        assert_eq!(report.copied, 0);
        assert_eq!(report.already_present, 1);
        assert!(!dest.path().join("copy-of-f.jpg").exists());
        assert_eq!(
            sink.lines()
                .iter()
                .filter(|l| l.contains("exists already"))
                .count(),
            1
        );
    }

    #[tokio::test]
    async fn test_missing_files_are_copied_and_indexed() {
        let (registry, source, dest) = setup();
        std::fs::write(source.path().join("new.jpg"), b"new content").unwrap();
        // Two identical files in one run: the second dedups against the
        // hash inserted for the first.
        std::fs::write(source.path().join("dup.jpg"), b"new content").unwrap();

        let mut index = ChecksumIndex::new();
        let sink = MemorySink::new();
        let engine = SyncEngine::new(&registry);
        let report = engine
            .sync(source.path(), dest.path(), &mut index, true, MediaClass::All, &sink)
            .await
            .unwrap();

        assert_eq!(report.copied, 1);
        assert_eq!(report.already_present, 1);
        assert_eq!(index.len(), 1);
    }

    #[tokio::test]
    async fn test_bulk_import_ignores_index() {
        let (registry, source, dest) = setup();
        std::fs::write(source.path().join("a.jpg"), b"a").unwrap();
        std::fs::write(source.path().join("b.jpg"), b"b").unwrap();
        std::fs::write(source.path().join("c.mov"), b"c").unwrap();

        // Index containing every hash must not matter with checksum off.
        let mut index = ChecksumIndex::new();
        for name in ["a.jpg", "b.jpg", "c.mov"] {
            let hash = checksum::hash_file(&source.path().join(name)).await.unwrap();
            index.insert(ChecksumRecord {
                hash,
                path: source.path().join(name),
                timestamp: "2016-10-22 12:00:00".to_string(),
            });
        }

        let sink = MemorySink::new();
        let engine = SyncEngine::new(&registry);
        let report = engine
            .sync(source.path(), dest.path(), &mut index, false, MediaClass::All, &sink)
            .await
            .unwrap();

        assert_eq!(report.copied, 3);
        assert_eq!(report.already_present, 0);
        assert!(dest.path().join("a.jpg").exists());
        assert!(dest.path().join("b.jpg").exists());
        assert!(dest.path().join("c.mov").exists());
    }

    #[tokio::test]
    async fn test_class_filter_limits_candidates() {
        let (registry, source, dest) = setup();
        std::fs::write(source.path().join("a.jpg"), b"a").unwrap();
        std::fs::write(source.path().join("c.mov"), b"c").unwrap();

        let mut index = ChecksumIndex::new();
        let sink = MemorySink::new();
        let engine = SyncEngine::new(&registry);
        let report = engine
            .sync(
                source.path(),
                dest.path(),
                &mut index,
                false,
                MediaClass::Photo,
                &sink,
            )
            .await
            .unwrap();

        assert_eq!(report.candidates, 1);
        assert!(dest.path().join("a.jpg").exists());
        assert!(!dest.path().join("c.mov").exists());
    }
}
