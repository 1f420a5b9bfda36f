//! # Configuration Module
//!
//! Options for one conversion run.
//!
//! ## Parameters:
//! - `input`: a folder (with recurse flag) XOR an explicit file list
//! - `output_dir`: where converted files land
//! - `format`: optional target format, constrained to the registry's known
//!   output formats; absent means save in the original format
//! - `resize`: optional (length, width) bounding box
//! - `assume_yes`: bypass the confirmation gate before the batch starts
//!
//! Validation failures are `ConvertError::Configuration` and fatal before
//! any file is touched.

use crate::error::ConvertError;
use crate::registry::MediaTypeRegistry;
use crate::size::BoundingBox;
use std::path::PathBuf;

/// Where conversion candidates come from.
#[derive(Debug, Clone)]
pub enum InputSource {
    /// Enumerate a directory, optionally descending into subdirectories.
    /// Only extensions the registry knows are picked up.
    Folder { path: PathBuf, recurse: bool },
    /// Use these paths verbatim, no extension filtering.
    Files(Vec<PathBuf>),
}

/// Immutable options for one conversion run.
#[derive(Debug, Clone)]
pub struct ConversionOptions {
    pub input: InputSource,
    pub output_dir: PathBuf,
    pub format: Option<String>,
    pub resize: Option<BoundingBox>,
    pub assume_yes: bool,
}

impl ConversionOptions {
    /// Validate against the registry's capability declarations.
    pub fn validate(&self, registry: &MediaTypeRegistry) -> Result<(), ConvertError> {
        match &self.input {
            InputSource::Folder { path, .. } => {
                if !path.is_dir() {
                    return Err(ConvertError::Configuration(format!(
                        "input folder does not exist: {}",
                        path.display()
                    )));
                }
            }
            InputSource::Files(files) => {
                if files.is_empty() {
                    return Err(ConvertError::Configuration(
                        "no input files given".to_string(),
                    ));
                }
            }
        }

        if let Some(format) = &self.format {
            let known = registry.known_output_extensions();
            if !known.contains(&format.to_lowercase().as_str()) {
                return Err(ConvertError::Configuration(format!(
                    "unknown output format '{}', expected one of: {}",
                    format,
                    known.join(", ")
                )));
            }
        }

        if let Some(bounds) = &self.resize {
            if bounds.length == 0 || bounds.width == 0 {
                return Err(ConvertError::Configuration(
                    "resize dimensions must be positive".to_string(),
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn options(input: InputSource) -> ConversionOptions {
        ConversionOptions {
            input,
            output_dir: PathBuf::from("/tmp/out"),
            format: None,
            resize: None,
            assume_yes: true,
        }
    }

    #[test]
    fn test_valid_folder_input() {
        let registry = MediaTypeRegistry::build().unwrap();
        let dir = TempDir::new().unwrap();
        let opts = options(InputSource::Folder {
            path: dir.path().to_path_buf(),
            recurse: true,
        });
        assert!(opts.validate(&registry).is_ok());
    }

    #[test]
    fn test_missing_folder_rejected() {
        let registry = MediaTypeRegistry::build().unwrap();
        let opts = options(InputSource::Folder {
            path: PathBuf::from("/no/such/folder"),
            recurse: true,
        });
        assert!(matches!(
            opts.validate(&registry),
            Err(ConvertError::Configuration(_))
        ));
    }

    #[test]
    fn test_empty_file_list_rejected() {
        let registry = MediaTypeRegistry::build().unwrap();
        let opts = options(InputSource::Files(vec![]));
        assert!(opts.validate(&registry).is_err());
    }

    #[test]
    fn test_unknown_output_format_rejected() {
        let registry = MediaTypeRegistry::build().unwrap();
        let mut opts = options(InputSource::Files(vec![PathBuf::from("a.jpg")]));
        opts.format = Some("tiff".to_string());
        assert!(opts.validate(&registry).is_err());

        opts.format = Some("MP4".to_string());
        assert!(opts.validate(&registry).is_ok());
    }

    #[test]
    fn test_zero_resize_rejected() {
        let registry = MediaTypeRegistry::build().unwrap();
        let mut opts = options(InputSource::Files(vec![PathBuf::from("a.jpg")]));
        opts.resize = Some(BoundingBox::new(0, 1080));
        assert!(opts.validate(&registry).is_err());
    }
}
