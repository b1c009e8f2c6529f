// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Vertical relayout of dashboard panels after version filtering.
//!
//! A row is the set of panels sharing one `gridPos.y`. When every panel of a
//! row is removed, the row's height (the tallest panel in it) shifts every
//! lower row upward. A row keeping at least one panel shifts nothing, which
//! is why rows are expected to be gated uniformly; see [`row_gate_conflicts`].

use std::collections::{BTreeMap, BTreeSet, HashSet};

use crate::dashboard::Panel;

/// Row whose panels disagree on their effective minimum version.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct RowGateConflict
{
    /// Vertical offset shared by the panels of the row.
    pub y:        i64,
    /// Distinct effective minimum versions found in the row, ascending.
    pub versions: Vec<u32,>,
}

/// Computes the upward shift in effect at each row of `all`.
///
/// The value at `y` includes the row's own height when that row was fully
/// removed.
pub fn row_offsets(all: &[Panel], kept: &[Panel],) -> BTreeMap<i64, i64,>
{
    let kept_rows: HashSet<i64,> =
        kept.iter().filter_map(Panel::grid_pos,).map(|grid| grid.y,).collect();

    let mut heights: BTreeMap<i64, i64,> = BTreeMap::new();
    for grid in all.iter().filter_map(Panel::grid_pos,) {
        let height = heights.entry(grid.y,).or_insert(grid.h,);
        *height = (*height).max(grid.h,);
    }

    let mut cumulative = 0;
    heights
        .into_iter()
        .map(|(y, height,)| {
            if !kept_rows.contains(&y,) {
                cumulative += height;
            }
            (y, cumulative,)
        },)
        .collect()
}

/// Returns the kept panels with `gridPos.y` shifted over removed rows.
///
/// `all` is the full, version-stripped panel list and `kept` the filtered
/// subset in the same coordinate space. Panels without a grid position are
/// returned unchanged.
///
/// # Examples
///
/// ```
/// use pgcontrib::{parse_dashboard, recalculate_grid_positions};
///
/// let template = parse_dashboard(
///     r#"{"panels": [
///         {"id": 1, "gridPos": {"x": 0, "y": 0, "w": 24, "h": 4}},
///         {"id": 2, "gridPos": {"x": 0, "y": 4, "w": 24, "h": 8}, "version": 15},
///         {"id": 3, "gridPos": {"x": 0, "y": 12, "w": 24, "h": 6}}
///     ]}"#,
/// )
/// .expect("valid dashboard",);
/// let all = template.panels();
/// let kept = [all[0].clone(), all[2].clone()];
///
/// let moved = recalculate_grid_positions(all, &kept,);
/// assert_eq!(moved[0].grid_pos().map(|grid| grid.y), Some(0));
/// assert_eq!(moved[1].grid_pos().map(|grid| grid.y), Some(4));
/// ```
pub fn recalculate_grid_positions(all: &[Panel], kept: &[Panel],) -> Vec<Panel,>
{
    if kept.is_empty() {
        return Vec::new();
    }

    let offsets = row_offsets(all, kept,);
    kept.iter()
        .map(|panel| match panel.grid_pos() {
            Some(grid,) => {
                let shift = offsets.get(&grid.y,).copied().unwrap_or(0,);
                panel.with_y(grid.y - shift,)
            }
            None => panel.clone(),
        },)
        .collect()
}

/// Lists rows whose panels would be kept or removed inconsistently.
///
/// Panels without a `version` annotation count as `default_min_version`.
pub fn row_gate_conflicts(panels: &[Panel], default_min_version: u32,) -> Vec<RowGateConflict,>
{
    let mut rows: BTreeMap<i64, BTreeSet<u32,>,> = BTreeMap::new();
    for panel in panels {
        if let Some(grid,) = panel.grid_pos() {
            rows.entry(grid.y,)
                .or_default()
                .insert(panel.effective_min_version(default_min_version,),);
        }
    }

    rows.into_iter()
        .filter(|(_, versions,)| versions.len() > 1,)
        .map(|(y, versions,)| RowGateConflict {
            y,
            versions: versions.into_iter().collect(),
        },)
        .collect()
}
