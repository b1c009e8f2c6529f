#![allow(non_shorthand_field_patterns)]
#![doc = "Error handling primitives shared across the projection engine and CLI."]
// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! The derive emitted by [`masterror::Error`] expands pattern matches that
//! trigger the `non_shorthand_field_patterns` lint. The lint is disabled for
//! the module to keep the generated implementations warning-free.

use std::path::{Path, PathBuf};

/// Unified error type returned by the loaders, projections and CLI.
///
/// Every variant aborts the run. Soft conditions such as a metric without a
/// qualifying query variant are not errors and never surface here.
#[derive(Debug, masterror::Error)]
pub enum Error {
    /// Wraps I/O errors that occur while reading input documents.
    #[error("failed to read {path:?}: {source}")]
    Io {
        /// Location of the document being read.
        path:   PathBuf,
        /// Underlying I/O error.
        source: std::io::Error
    },
    /// Wraps I/O errors that occur while writing generated artifacts.
    #[error("failed to write artifact at {path:?}: {source}")]
    Write {
        /// Location of the artifact being produced.
        path:   PathBuf,
        /// Underlying I/O error reported by the operating system.
        source: std::io::Error
    },
    /// Wraps YAML decoding errors.
    #[error("failed to parse YAML document: {source}")]
    Parse {
        /// Source decoding error from serde_yaml.
        source: serde_yaml::Error
    },
    /// Wraps JSON decoding errors raised while loading a dashboard template.
    #[error("failed to parse JSON document: {source}")]
    ParseJson {
        /// Source decoding error from serde_json.
        source: serde_json::Error
    },
    /// Wraps JSON serialization errors when rendering artifacts.
    #[error("failed to serialize artifact: {source}")]
    Serialize {
        /// Underlying serialization error.
        source: serde_json::Error
    },
    /// Wraps YAML serialization errors when rendering artifacts.
    #[error("failed to encode YAML artifact: {source}")]
    YamlEncode {
        /// Underlying serialization error.
        source: serde_yaml::Error
    },
    /// Returned when a document or configuration violates structural rules.
    #[error("invalid document: {message}")]
    Validation {
        /// Human readable message naming the offending element and rule.
        message: String
    },
    /// Returned when the embedded document cannot be recovered from its host.
    #[error("failed to extract embedded document: {message}")]
    Extraction {
        /// Human readable message describing the extraction failure.
        message: String
    },
    /// Returned by check mode when generated artifacts differ from the
    /// committed copies.
    #[error("drift detected: {count} generated artifact(s) differ from committed files")]
    Drift {
        /// Number of differing artifacts.
        count: usize,
        /// Committed paths whose contents differ or are missing.
        paths: Vec<PathBuf>
    }
}

impl Error {
    /// Constructs a validation error from the provided displayable value.
    ///
    /// # Parameters
    ///
    /// * `message` - Human-readable description of the validation failure.
    pub fn validation<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Validation {
            message: message.into()
        }
    }

    /// Constructs an extraction error from the provided displayable value.
    pub fn extraction<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Extraction {
            message: message.into()
        }
    }

    /// Constructs a drift error listing every differing committed path.
    pub fn drift(paths: Vec<PathBuf>) -> Self {
        Self::Drift {
            count: paths.len(),
            paths
        }
    }

    /// Formats the error for diagnostics without the variant name.
    ///
    /// The returned string matches the [`std::fmt::Display`] implementation.
    pub fn to_display_string(&self) -> String {
        format!("{self}")
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(source: serde_yaml::Error) -> Self {
        Self::Parse {
            source
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Serialize {
            source
        }
    }
}

/// Creates an [`Error::Io`] variant capturing the failing path and source.
///
/// # Parameters
///
/// * `path` - Location of the input document that triggered the error.
/// * `source` - I/O error reported by the operating system.
pub fn io_error(path: &Path, source: std::io::Error) -> Error {
    Error::Io {
        path: path.to_path_buf(),
        source
    }
}

/// Creates an [`Error::Write`] variant capturing the failing path and source.
///
/// # Parameters
///
/// * `path` - Location of the artifact that triggered the error.
/// * `source` - I/O error reported by the operating system.
pub fn write_error(path: &Path, source: std::io::Error) -> Error {
    Error::Write {
        path: path.to_path_buf(),
        source
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::Error;

    #[test]
    fn validation_constructor_populates_message() {
        let error = Error::validation("metric 0 missing required 'tag' field");
        match error {
            Error::Validation {
                ref message
            } => {
                assert_eq!(message, "metric 0 missing required 'tag' field");
            }
            other => panic!("expected validation error, got {other:?}")
        }
    }

    #[test]
    fn to_display_string_matches_display() {
        let error = Error::extraction("could not find INTERNAL_YAML macro");
        assert_eq!(error.to_string(), error.to_display_string());
        assert!(error.to_string().contains("INTERNAL_YAML"));
    }

    #[test]
    fn io_error_helper_wraps_path_and_source() {
        let path = std::path::Path::new("/tmp/internal.h");
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let error = super::io_error(path, io_error);

        match error {
            Error::Io {
                path: ref stored_path,
                ref source
            } => {
                assert_eq!(stored_path, path);
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected io error, got {other:?}")
        }
    }

    #[test]
    fn write_error_helper_wraps_path_and_source() {
        let path = std::path::Path::new("/tmp/postgresql-13.yaml");
        let io_error = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let error = super::write_error(path, io_error);

        match error {
            Error::Write {
                path: ref stored_path,
                ref source
            } => {
                assert_eq!(stored_path, path);
                assert_eq!(source.kind(), std::io::ErrorKind::PermissionDenied);
            }
            other => panic!("expected write error, got {other:?}")
        }
    }

    #[test]
    fn serde_yaml_conversion_maps_to_parse_variant() {
        let error = serde_yaml::from_str::<usize>("not-a-number").unwrap_err();
        let mapped: Error = error.into();
        assert!(matches!(mapped, Error::Parse { .. }));
    }

    #[test]
    fn drift_constructor_counts_paths() {
        let error = Error::drift(vec![
            PathBuf::from("contrib/yaml/postgresql-13.yaml"),
            PathBuf::from("contrib/json/postgresql-13.json"),
        ]);
        assert!(matches!(error, Error::Drift { count: 2, .. }));
        assert!(error.to_string().starts_with("drift detected: 2"));
    }
}
