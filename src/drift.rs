// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Detection of drift between generated and committed artifacts.
//!
//! Check mode renders every artifact into a private scratch directory and
//! compares bytes with the committed copy. Differences never abort the loop;
//! they accumulate in a [`DriftReport`] that is inspected once at the end.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use tempfile::TempDir;
use tracing::warn;

use crate::{
    error::{self, Error},
    writer::write_artifact,
};

/// Committed paths found to differ from freshly generated artifacts.
#[derive(Debug, Clone, Default, PartialEq, Eq,)]
pub struct DriftReport
{
    differences: Vec<PathBuf,>,
}

impl DriftReport
{
    /// Returns `true` when no artifact differed.
    pub fn is_clean(&self,) -> bool
    {
        self.differences.is_empty()
    }

    /// Differing committed paths in discovery order.
    pub fn differences(&self,) -> &[PathBuf]
    {
        &self.differences
    }

    /// Returns the report extended with `path`.
    #[must_use]
    pub fn with_difference(mut self, path: PathBuf,) -> Self
    {
        self.differences.push(path,);
        self
    }

    /// Returns the report extended with every difference of `other`.
    #[must_use]
    pub fn merge(mut self, other: DriftReport,) -> Self
    {
        self.differences.extend(other.differences,);
        self
    }

    /// Converts a non-clean report into [`Error::Drift`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Drift`] listing every differing path.
    pub fn into_result(self,) -> Result<(), Error,>
    {
        if self.is_clean() { Ok((),) } else { Err(Error::drift(self.differences,),) }
    }
}

/// Returns `true` when the generated bytes do not match the committed ones.
///
/// A missing committed file always counts as a difference.
pub fn contents_differ(generated: &[u8], committed: Option<&[u8],>,) -> bool
{
    committed != Some(generated,)
}

/// Private directory holding regenerated artifacts during a check.
///
/// The directory is removed when the value is dropped.
#[derive(Debug,)]
pub struct ScratchSpace
{
    dir: TempDir,
}

impl ScratchSpace
{
    /// Creates a fresh scratch directory under the system temporary location.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Write`] when the directory cannot be created.
    pub fn new() -> Result<Self, Error,>
    {
        let dir = tempfile::Builder::new()
            .prefix("pgcontrib_gen_",)
            .tempdir()
            .map_err(|source| error::write_error(&std::env::temp_dir(), source,),)?;
        Ok(Self {
            dir,
        },)
    }

    /// Root of the scratch directory.
    pub fn path(&self,) -> &Path
    {
        self.dir.path()
    }
}

/// Regenerates one artifact into `scratch` and compares it with `committed`.
///
/// `relative` locates the artifact below both the scratch root and the
/// committed output root. Returns the committed path when it differs.
///
/// # Errors
///
/// Returns [`Error::Write`] when the scratch copy cannot be written and
/// [`Error::Io`] when either copy cannot be read for a reason other than the
/// committed file being absent.
pub fn check_artifact(
    scratch: &ScratchSpace,
    relative: &Path,
    committed: &Path,
    contents: &[u8],
) -> Result<Option<PathBuf,>, Error,>
{
    let generated_path = scratch.path().join(relative,);
    write_artifact(&generated_path, contents,)?;
    let generated =
        fs::read(&generated_path,).map_err(|source| error::io_error(&generated_path, source,),)?;

    let existing = match fs::read(committed,) {
        Ok(bytes,) => Some(bytes,),
        Err(source,) if source.kind() == io::ErrorKind::NotFound => {
            warn!("Missing committed file: {}", committed.display());
            None
        }
        Err(source,) => return Err(error::io_error(committed, source,),),
    };

    if !contents_differ(&generated, existing.as_deref(),) {
        return Ok(None,);
    }
    if existing.is_some() {
        warn!("Diff detected: {}", committed.display());
    }
    Ok(Some(committed.to_path_buf(),),)
}
