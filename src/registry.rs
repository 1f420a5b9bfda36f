//! # Media Type Registry Module
//!
//! Static dispatch table from file extension to handler variant.
//!
//! ## Responsibilities:
//! - Declares the input/output capability set of every handler variant
//! - Builds an extension -> variant map once, read-only afterwards
//! - Rejects ambiguous tables (two variants claiming one extension) at build
//!   time instead of silently shadowing
//! - Resolves extensions case-insensitively
//!
//! The table is declared explicitly rather than discovered at runtime, so the
//! disjointness of the input sets is checkable independently of any file
//! being processed.

use crate::error::ConvertError;
use std::collections::HashMap;

/// The handler variant responsible for a family of file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaKind {
    /// Generic raster images without a metadata container we preserve.
    Raster,
    /// JPEG images carrying EXIF capture metadata.
    ExifRaster,
    /// Camera raw files: decodable, never re-encodable in their native form.
    Raw,
    /// Video containers, sized and re-encoded by an external transcoder.
    Video,
}

impl MediaKind {
    pub const ALL: [MediaKind; 4] = [
        MediaKind::Raster,
        MediaKind::ExifRaster,
        MediaKind::Raw,
        MediaKind::Video,
    ];

    /// Extensions this variant claims as input. Sets must be disjoint
    /// across variants; `MediaTypeRegistry::build` enforces it.
    pub fn input_extensions(&self) -> &'static [&'static str] {
        match self {
            MediaKind::Raster => &["png", "gif", "webp"],
            MediaKind::ExifRaster => &["jpg", "jpeg"],
            MediaKind::Raw => &["nef", "dng", "cr2"],
            MediaKind::Video => &["wmv", "mov", "avi", "mkv"],
        }
    }

    /// Extensions this variant can encode to.
    pub fn output_extensions(&self) -> &'static [&'static str] {
        match self {
            MediaKind::Raster => &["png", "gif", "webp", "jpg", "jpeg"],
            MediaKind::ExifRaster => &["jpg", "jpeg", "png", "webp"],
            MediaKind::Raw => &["jpg", "jpeg", "png"],
            MediaKind::Video => &["mp4"],
        }
    }

    pub fn can_encode(&self, format: &str) -> bool {
        let format = format.to_lowercase();
        self.output_extensions().contains(&format.as_str())
    }

    /// Whether the variant can re-save its own native format.
    pub fn can_save_native(&self) -> bool {
        match self {
            MediaKind::Raster | MediaKind::ExifRaster => true,
            // Raw sensor data cannot be re-encoded; video only writes mp4.
            MediaKind::Raw | MediaKind::Video => false,
        }
    }

    pub fn is_photo(&self) -> bool {
        matches!(self, MediaKind::Raster | MediaKind::ExifRaster | MediaKind::Raw)
    }

    pub fn is_video(&self) -> bool {
        matches!(self, MediaKind::Video)
    }
}

/// Read-only lookup from lowercased extension to handler variant.
pub struct MediaTypeRegistry {
    by_extension: HashMap<&'static str, MediaKind>,
}

impl MediaTypeRegistry {
    /// Build the registry from the static capability declarations.
    ///
    /// Fails fast with `Configuration` if two variants claim the same
    /// extension.
    pub fn build() -> Result<Self, ConvertError> {
        Self::from_kinds(&MediaKind::ALL)
    }

    fn from_kinds(kinds: &[MediaKind]) -> Result<Self, ConvertError> {
        let mut by_extension = HashMap::new();

        for kind in kinds {
            for ext in kind.input_extensions() {
                if let Some(existing) = by_extension.insert(*ext, *kind) {
                    return Err(ConvertError::Configuration(format!(
                        "extension '{}' claimed by both {:?} and {:?}",
                        ext, existing, kind
                    )));
                }
            }
        }

        Ok(Self { by_extension })
    }

    /// Resolve an extension to its handler variant, case-insensitively.
    pub fn resolve(&self, extension: &str) -> Option<MediaKind> {
        self.by_extension
            .get(extension.to_lowercase().as_str())
            .copied()
    }

    /// Resolve a path by its extension.
    pub fn resolve_path(&self, path: &std::path::Path) -> Option<MediaKind> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.resolve(ext))
    }

    /// All extensions known to any variant, for discovery filtering.
    pub fn known_input_extensions(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.by_extension.keys().copied()
    }

    /// Union of every variant's output capability set.
    pub fn known_output_extensions(&self) -> Vec<&'static str> {
        let mut out: Vec<&'static str> = MediaKind::ALL
            .iter()
            .flat_map(|k| k.output_extensions().iter().copied())
            .collect();
        out.sort_unstable();
        out.dedup();
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_resolve_is_case_insensitive() {
        let registry = MediaTypeRegistry::build().unwrap();
        assert_eq!(registry.resolve("jpg"), Some(MediaKind::ExifRaster));
        assert_eq!(registry.resolve("JPG"), Some(MediaKind::ExifRaster));
        assert_eq!(registry.resolve("Nef"), Some(MediaKind::Raw));
    }

    #[test]
    fn test_resolve_unknown_extension() {
        let registry = MediaTypeRegistry::build().unwrap();
        assert_eq!(registry.resolve("bmp"), None);
        assert_eq!(registry.resolve(""), None);
    }

    #[test]
    fn test_resolve_is_deterministic() {
        let registry = MediaTypeRegistry::build().unwrap();
        for _ in 0..3 {
            assert_eq!(registry.resolve("mov"), Some(MediaKind::Video));
            assert_eq!(registry.resolve("png"), Some(MediaKind::Raster));
        }
    }

    #[test]
    fn test_resolve_path() {
        let registry = MediaTypeRegistry::build().unwrap();
        assert_eq!(
            registry.resolve_path(Path::new("/a/b/photo.NEF")),
            Some(MediaKind::Raw)
        );
        assert_eq!(registry.resolve_path(Path::new("/a/b/noext")), None);
    }

    #[test]
    fn test_input_sets_are_disjoint() {
        assert!(MediaTypeRegistry::build().is_ok());
    }

    #[test]
    fn test_duplicate_claim_is_rejected() {
        // Listing a variant twice makes every one of its extensions a
        // duplicate claim; the build must refuse rather than shadow.
        let err = MediaTypeRegistry::from_kinds(&[MediaKind::Raw, MediaKind::Raw]);
        assert!(matches!(err, Err(ConvertError::Configuration(_))));
    }

    #[test]
    fn test_capability_queries() {
        assert!(MediaKind::Raw.can_encode("jpg"));
        assert!(!MediaKind::Raw.can_encode("bmp"));
        assert!(!MediaKind::Raw.can_save_native());
        assert!(MediaKind::ExifRaster.can_save_native());
        assert!(MediaKind::Video.can_encode("MP4"));
        assert!(!MediaKind::Video.can_save_native());
    }

    #[test]
    fn test_known_output_extensions_deduplicated() {
        let registry = MediaTypeRegistry::build().unwrap();
        let outputs = registry.known_output_extensions();
        assert!(outputs.contains(&"mp4"));
        assert!(outputs.contains(&"jpg"));
        let mut sorted = outputs.clone();
        sorted.dedup();
        assert_eq!(sorted.len(), outputs.len());
    }
}
