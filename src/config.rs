// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Generator configuration describing which target versions are produced.
//!
//! The supported-version list is configuration rather than a constant. The
//! YAML document mirrors [`GeneratorConfig`]; every key is optional and falls
//! back to the deployment defaults. [`GeneratorConfig::resolve`] turns the raw
//! document into validated [`ProjectionSettings`].

use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::error::{self, Error};

/// Versions produced when the configuration does not override them.
pub const DEFAULT_VERSIONS: [u32; 6] = [13, 14, 15, 16, 17, 18,];
/// Name of the embedded macro carrying the superset metric document.
pub const DEFAULT_MACRO_NAME: &str = "INTERNAL_YAML";

/// Raw configuration document.
///
/// # Examples
///
/// ```
/// use pgcontrib::GeneratorConfig;
///
/// let config: GeneratorConfig = serde_yaml::from_str("versions: [15, 16]\n",).expect("valid",);
/// let settings = config.resolve().expect("valid settings",);
/// assert_eq!(settings.template_version, 16);
/// assert_eq!(settings.default_min_version, 15);
/// ```
#[derive(Debug, Clone, Deserialize, Serialize,)]
#[serde(deny_unknown_fields)]
pub struct GeneratorConfig
{
    /// Ordered target versions, strictly ascending.
    #[serde(default = "default_versions")]
    pub versions: Vec<u32,>,

    /// Version whose digits appear in the dashboard template metadata.
    #[serde(default)]
    pub template_version: Option<u32,>,

    /// Minimum version assumed for panels without a `version` annotation.
    #[serde(default)]
    pub default_min_version: Option<u32,>,

    /// Macro that embeds the superset metric document in the host header.
    #[serde(default = "default_macro_name")]
    pub macro_name: String,
}

impl Default for GeneratorConfig
{
    fn default() -> Self
    {
        Self {
            versions:            default_versions(),
            template_version:    None,
            default_min_version: None,
            macro_name:          default_macro_name(),
        }
    }
}

fn default_versions() -> Vec<u32,>
{
    DEFAULT_VERSIONS.to_vec()
}

fn default_macro_name() -> String
{
    DEFAULT_MACRO_NAME.to_owned()
}

impl GeneratorConfig
{
    /// Loads a configuration document from disk.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the file cannot be read and
    /// [`Error::Parse`] when the YAML is malformed or has unknown keys.
    pub fn load(path: &Path,) -> Result<Self, Error,>
    {
        let contents = fs::read_to_string(path,).map_err(|source| error::io_error(path, source,),)?;
        let config: Self = serde_yaml::from_str(&contents,)?;
        Ok(config,)
    }

    /// Validates the document and derives the effective settings.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the version list is empty or not
    /// strictly ascending, when the macro name is blank, or when the default
    /// minimum version exceeds every supported version.
    pub fn resolve(&self,) -> Result<ProjectionSettings, Error,>
    {
        let versions = SupportedVersions::new(self.versions.clone(),)?;

        let macro_name = self.macro_name.trim();
        if macro_name.is_empty() {
            return Err(Error::validation("macro_name cannot be empty",),);
        }

        let template_version = self.template_version.unwrap_or_else(|| versions.highest(),);
        let default_min_version = self.default_min_version.unwrap_or_else(|| versions.lowest(),);
        if default_min_version > versions.highest() {
            return Err(Error::validation(format!(
                "default_min_version {default_min_version} exceeds the highest supported version {}",
                versions.highest()
            ),),);
        }

        Ok(ProjectionSettings {
            versions,
            template_version,
            default_min_version,
            macro_name: macro_name.to_owned(),
        },)
    }
}

/// Non-empty, strictly ascending list of target versions.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct SupportedVersions
{
    versions: Vec<u32,>,
}

impl SupportedVersions
{
    /// Validates and wraps the provided version list.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] for an empty or unordered list.
    pub fn new(versions: Vec<u32,>,) -> Result<Self, Error,>
    {
        if versions.is_empty() {
            return Err(Error::validation("versions must include at least one entry",),);
        }
        if let Some(pair,) = versions.windows(2,).find(|pair| pair[0] >= pair[1],) {
            return Err(Error::validation(format!(
                "versions must be strictly ascending, found {} before {}",
                pair[0], pair[1]
            ),),);
        }
        Ok(Self {
            versions,
        },)
    }

    /// Lowest supported version.
    pub fn lowest(&self,) -> u32
    {
        self.versions[0]
    }

    /// Highest supported version.
    pub fn highest(&self,) -> u32
    {
        self.versions[self.versions.len() - 1]
    }

    /// Versions in ascending order.
    pub fn as_slice(&self,) -> &[u32]
    {
        &self.versions
    }

    /// Iterates the versions in ascending order.
    pub fn iter(&self,) -> impl Iterator<Item = u32,> + '_
    {
        self.versions.iter().copied()
    }
}

/// Validated settings consumed by the projection pipeline.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct ProjectionSettings
{
    /// Target versions, ascending.
    pub versions:            SupportedVersions,
    /// Version whose digits are substituted in dashboard metadata.
    pub template_version:    u32,
    /// Minimum version of panels without a `version` annotation.
    pub default_min_version: u32,
    /// Macro carrying the embedded superset metric document.
    pub macro_name:          String,
}

impl Default for ProjectionSettings
{
    fn default() -> Self
    {
        let versions = SupportedVersions {
            versions: default_versions(),
        };
        Self {
            template_version: versions.highest(),
            default_min_version: versions.lowest(),
            versions,
            macro_name: default_macro_name(),
        }
    }
}
