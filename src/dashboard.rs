// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Projection of the superset dashboard onto target versions.
//!
//! The template carries every panel known across all supported versions.
//! Panels needing a newer server declare a `version` annotation; panels
//! without one exist from the lowest supported version onward. Projection
//! filters panels, strips the annotation, renumbers ids, closes vertical gaps
//! and rewrites version-specific metadata. Every step returns new values.

use std::{fs, path::Path};

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, warn};

use crate::{
    config::ProjectionSettings,
    error::{self, Error},
    layout::{recalculate_grid_positions, row_gate_conflicts},
};

/// Metadata keys whose text mentions the template version.
const METADATA_FIELDS: [&str; 3] = ["title", "uid", "description",];

/// Grid placement of a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
pub struct GridPos
{
    /// Horizontal offset.
    pub x: i64,
    /// Vertical offset; panels sharing it form one row.
    pub y: i64,
    /// Width.
    pub w: i64,
    /// Height.
    pub h: i64,
}

/// Dashboard panel with its version gate and grid position decoded.
///
/// All other fields stay opaque and keep their source order.
#[derive(Debug, Clone, PartialEq,)]
pub struct Panel
{
    fields:      Map<String, Value,>,
    min_version: Option<u32,>,
    grid:        Option<GridPos,>,
}

impl Panel
{
    /// Decodes a panel from its JSON object.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] when the panel is not an object, the
    /// `version` annotation is not a non-negative integer, or `gridPos` lacks
    /// integer `x`, `y`, `w`, `h` members.
    pub fn from_value(index: usize, value: &Value,) -> Result<Self, Error,>
    {
        let fields = value
            .as_object()
            .ok_or_else(|| Error::validation(format!("panel {index} must be an object"),),)?
            .clone();

        let min_version = fields
            .get("version",)
            .map(|version| {
                version.as_u64().and_then(|value| u32::try_from(value,).ok(),).ok_or_else(|| {
                    Error::validation(format!(
                        "panel {index} 'version' must be a non-negative integer, got {version}"
                    ),)
                },)
            },)
            .transpose()?;

        let grid = fields.get("gridPos",).map(|grid| parse_grid_pos(index, grid,),).transpose()?;

        Ok(Self {
            fields,
            min_version,
            grid,
        },)
    }

    /// Declared minimum version, if annotated.
    pub fn min_version(&self,) -> Option<u32,>
    {
        self.min_version
    }

    /// Minimum version, treating unannotated panels as `default_min_version`.
    pub fn effective_min_version(&self, default_min_version: u32,) -> u32
    {
        self.min_version.unwrap_or(default_min_version,)
    }

    /// Grid placement, when the panel declares one.
    pub fn grid_pos(&self,) -> Option<GridPos,>
    {
        self.grid
    }

    /// Panel id, when present and numeric.
    pub fn id(&self,) -> Option<u64,>
    {
        self.fields.get("id",).and_then(Value::as_u64,)
    }

    /// Source fields in order.
    pub fn fields(&self,) -> &Map<String, Value,>
    {
        &self.fields
    }

    /// Returns a copy without the `version` annotation.
    pub fn stripped(&self,) -> Self
    {
        Self {
            fields:      self
                .fields
                .iter()
                .filter(|(key, _,)| key.as_str() != "version",)
                .map(|(key, value,)| (key.clone(), value.clone(),),)
                .collect(),
            min_version: None,
            grid:        self.grid,
        }
    }

    /// Returns a copy with `id` set, keeping the key's position if present.
    pub fn with_id(&self, id: u64,) -> Self
    {
        let mut fields = self.fields.clone();
        fields.insert("id".to_owned(), Value::from(id,),);
        Self {
            fields,
            min_version: self.min_version,
            grid: self.grid,
        }
    }

    /// Returns a copy moved to vertical offset `y`.
    pub fn with_y(&self, y: i64,) -> Self
    {
        let mut fields = self.fields.clone();
        if let Some(grid,) = fields.get_mut("gridPos",).and_then(Value::as_object_mut,) {
            grid.insert("y".to_owned(), Value::from(y,),);
        }
        Self {
            fields,
            min_version: self.min_version,
            grid: self.grid.map(|grid| GridPos {
                y,
                ..grid
            },),
        }
    }

    fn into_value(self,) -> Value
    {
        Value::Object(self.fields,)
    }
}

fn parse_grid_pos(index: usize, value: &Value,) -> Result<GridPos, Error,>
{
    let member = |name: &str| {
        value.get(name,).and_then(Value::as_i64,).ok_or_else(|| {
            Error::validation(format!("panel {index} 'gridPos.{name}' must be an integer"),)
        },)
    };

    Ok(GridPos {
        x: member("x",)?,
        y: member("y",)?,
        w: member("w",)?,
        h: member("h",)?,
    },)
}

/// Superset dashboard template.
#[derive(Debug, Clone, PartialEq,)]
pub struct DashboardTemplate
{
    fields: Map<String, Value,>,
    panels: Vec<Panel,>,
}

impl DashboardTemplate
{
    /// Top-level fields in source order, including the raw `panels` array.
    pub fn fields(&self,) -> &Map<String, Value,>
    {
        &self.fields
    }

    /// Decoded panels in source order.
    pub fn panels(&self,) -> &[Panel]
    {
        &self.panels
    }
}

/// Dashboard generated for one target version.
#[derive(Debug, Clone, PartialEq, Serialize,)]
#[serde(transparent)]
pub struct ProjectedDashboard
{
    fields: Map<String, Value,>,
}

impl ProjectedDashboard
{
    /// Top-level fields in template order.
    pub fn fields(&self,) -> &Map<String, Value,>
    {
        &self.fields
    }

    /// Projected panels.
    pub fn panels(&self,) -> &[Value]
    {
        self.fields.get("panels",).and_then(Value::as_array,).map(Vec::as_slice,).unwrap_or(&[],)
    }
}

/// Loads a dashboard template from disk.
///
/// # Errors
///
/// Returns [`Error::Io`] when the file cannot be read and the errors of
/// [`parse_dashboard`] otherwise.
pub fn load_dashboard(path: &Path,) -> Result<DashboardTemplate, Error,>
{
    info!("Loading template: {}", path.display());
    let contents = fs::read_to_string(path,).map_err(|source| error::io_error(path, source,),)?;
    parse_dashboard(&contents,)
}

/// Parses a dashboard template from JSON text.
///
/// # Errors
///
/// Returns [`Error::ParseJson`] for malformed JSON and [`Error::Validation`]
/// when the root is not an object, `panels` is missing or not an array, or a
/// panel is malformed.
pub fn parse_dashboard(contents: &str,) -> Result<DashboardTemplate, Error,>
{
    let document: Value = serde_json::from_str(contents,).map_err(|source| Error::ParseJson {
        source,
    },)?;
    let fields = match document {
        Value::Object(fields,) => fields,
        _ => return Err(Error::validation("dashboard root must be an object",),),
    };

    let panels = fields
        .get("panels",)
        .ok_or_else(|| Error::validation("dashboard missing required 'panels' field",),)?
        .as_array()
        .ok_or_else(|| Error::validation("'panels' must be a list",),)?
        .iter()
        .enumerate()
        .map(|(index, value,)| Panel::from_value(index, value,),)
        .collect::<Result<Vec<_,>, _,>>()?;

    Ok(DashboardTemplate {
        fields,
        panels,
    },)
}

/// Checks that every row is gated uniformly.
///
/// Conflicts are logged as warnings. With `strict` the first conflict is
/// returned as an error instead.
///
/// # Errors
///
/// Returns [`Error::Validation`] in strict mode when a row mixes gates.
pub fn check_row_gates(
    template: &DashboardTemplate,
    default_min_version: u32,
    strict: bool,
) -> Result<(), Error,>
{
    for conflict in row_gate_conflicts(template.panels(), default_min_version,) {
        let versions = conflict
            .versions
            .iter()
            .map(u32::to_string,)
            .collect::<Vec<_,>>()
            .join(", ",);
        if strict {
            return Err(Error::validation(format!(
                "panels at gridPos.y={} disagree on minimum version ({versions})",
                conflict.y
            ),),);
        }
        warn!(
            "Panels at gridPos.y={} disagree on minimum version ({}); rows are relaid out as a unit",
            conflict.y, versions
        );
    }
    Ok((),)
}

/// Keeps panels whose minimum version does not exceed `target`.
pub fn filter_panels(panels: &[Panel], target: u32, default_min_version: u32,) -> Vec<Panel,>
{
    panels
        .iter()
        .filter(|panel| panel.effective_min_version(default_min_version,) <= target,)
        .cloned()
        .collect()
}

/// Numbers panels `1..=N` in their current order.
pub fn reassign_ids(panels: &[Panel],) -> Vec<Panel,>
{
    panels.iter().zip(1u64..,).map(|(panel, id,)| panel.with_id(id,),).collect()
}

/// Rewrites version-specific metadata for `target`.
///
/// Every occurrence of the template version's digits in `title`, `uid` and
/// `description` is replaced, and the exact tag `pg<template>` becomes
/// `pg<target>`. Non-string values are left alone.
pub fn update_metadata(
    fields: &Map<String, Value,>,
    template_version: u32,
    target: u32,
) -> Map<String, Value,>
{
    let template_digits = template_version.to_string();
    let target_digits = target.to_string();
    let template_tag = format!("pg{template_version}");
    let target_tag = format!("pg{target}");

    fields
        .iter()
        .map(|(key, value,)| {
            let updated = match value {
                Value::String(text,) if METADATA_FIELDS.contains(&key.as_str(),) => {
                    Value::String(text.replace(&template_digits, &target_digits,),)
                }
                Value::Array(tags,) if key == "tags" => Value::Array(
                    tags.iter()
                        .map(|tag| match tag {
                            Value::String(name,) if *name == template_tag => {
                                Value::String(target_tag.clone(),)
                            }
                            other => other.clone(),
                        },)
                        .collect(),
                ),
                other => other.clone(),
            };
            (key.clone(), updated,)
        },)
        .collect()
}

/// Projects the template onto `target`.
pub fn project_dashboard(
    template: &DashboardTemplate,
    settings: &ProjectionSettings,
    target: u32,
) -> ProjectedDashboard
{
    info!("Processing {} panels for PostgreSQL {}", template.panels().len(), target);

    let kept = filter_panels(template.panels(), target, settings.default_min_version,);
    info!("After filtering: {} panels", kept.len());

    let kept: Vec<Panel,> = kept.iter().map(Panel::stripped,).collect();
    let kept = reassign_ids(&kept,);
    let all: Vec<Panel,> = template.panels().iter().map(Panel::stripped,).collect();
    let kept = recalculate_grid_positions(&all, &kept,);

    let mut fields = update_metadata(template.fields(), settings.template_version, target,);
    fields.insert(
        "panels".to_owned(),
        Value::Array(kept.into_iter().map(Panel::into_value,).collect(),),
    );

    ProjectedDashboard {
        fields,
    }
}
