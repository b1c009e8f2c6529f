// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Deterministic serialization of generated artifacts.
//!
//! Artifacts are rendered to bytes first and written second, so the same
//! bytes can be committed in generate mode or compared in check mode. Key
//! order follows the source documents, and every artifact ends with a
//! newline.

use std::{
    fs::{self, File},
    io::{BufWriter, Write},
    path::Path
};

use serde::Serialize;
use tracing::info;

use crate::error::{self, Error};

/// Output encodings supported for artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactFormat {
    /// Block-style YAML.
    Yaml,
    /// JSON with two-space indentation.
    Json
}

impl ArtifactFormat {
    /// File extension used for the format.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json"
        }
    }

    /// Directory name used for the format under the metrics output root.
    pub fn directory(self) -> &'static str {
        self.extension()
    }
}

/// Renders `value` in the requested format.
///
/// # Errors
///
/// Returns [`Error::YamlEncode`] or [`Error::Serialize`] when the value
/// cannot be represented, for example a mapping with non-string keys in JSON.
///
/// # Example
///
/// ```
/// use pgcontrib::{ArtifactFormat, render_artifact};
///
/// let bytes = render_artifact(&serde_json::json!({"b": 1, "a": 2}), ArtifactFormat::Json)?;
/// assert_eq!(bytes, b"{\n  \"b\": 1,\n  \"a\": 2\n}\n");
/// # Ok::<(), pgcontrib::Error>(())
/// ```
pub fn render_artifact<T>(value: &T, format: ArtifactFormat) -> Result<Vec<u8>, Error>
where
    T: Serialize + ?Sized
{
    match format {
        ArtifactFormat::Yaml => render_yaml(value),
        ArtifactFormat::Json => render_json(value)
    }
}

fn render_yaml<T>(value: &T) -> Result<Vec<u8>, Error>
where
    T: Serialize + ?Sized
{
    let mut rendered = serde_yaml::to_string(value).map_err(|source| Error::YamlEncode {
        source
    })?;
    terminate(&mut rendered);
    Ok(rendered.into_bytes())
}

fn render_json<T>(value: &T) -> Result<Vec<u8>, Error>
where
    T: Serialize + ?Sized
{
    let mut rendered = serde_json::to_string_pretty(value)?;
    terminate(&mut rendered);
    Ok(rendered.into_bytes())
}

fn terminate(rendered: &mut String) {
    if !rendered.ends_with('\n') {
        rendered.push('\n');
    }
}

/// Writes `contents` to `path`, creating missing parent directories.
///
/// # Errors
///
/// Returns [`Error::Write`](Error::Write) when directories or the file cannot
/// be created or written.
pub fn write_artifact(path: &Path, contents: &[u8]) -> Result<(), Error> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| error::write_error(parent, source))?;
    }

    let file = File::create(path).map_err(|source| error::write_error(path, source))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(contents)
        .map_err(|source| error::write_error(path, source))?;
    writer
        .flush()
        .map_err(|source| error::write_error(path, source))?;

    info!("Wrote {}", path.display());
    Ok(())
}
