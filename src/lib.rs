// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Projection of superset PostgreSQL monitoring definitions into per-version
//! artifacts.
//!
//! A single superset document lists every metric ever collected, each with
//! query variants tagged by the first server version they apply to. A single
//! dashboard template carries every panel, gated by an optional minimum
//! version. For each supported version the library selects, filters and
//! relays out those documents into deterministic YAML and JSON artifacts, and
//! can verify that committed artifacts match what would be generated.

mod builder;
mod config;
mod dashboard;
mod drift;
mod error;
mod extract;
mod layout;
mod metric;
mod pipeline;
mod schema;
mod selector;
mod writer;

pub use builder::{
    MetricOutcome, ProjectedMetric, ProjectedQuery, VersionedMetricArtifact, build_metric,
    project_metrics,
};
pub use config::{
    DEFAULT_MACRO_NAME, DEFAULT_VERSIONS, GeneratorConfig, ProjectionSettings, SupportedVersions,
};
pub use dashboard::{
    DashboardTemplate, GridPos, Panel, ProjectedDashboard, check_row_gates, filter_panels,
    load_dashboard, parse_dashboard, project_dashboard, reassign_ids, update_metadata,
};
pub use drift::{DriftReport, ScratchSpace, check_artifact, contents_differ};
pub use error::{Error, io_error, write_error};
pub use extract::extract_embedded_document;
pub use layout::{RowGateConflict, recalculate_grid_positions, row_gate_conflicts, row_offsets};
pub use metric::{
    CarriedFields, Column, ColumnType, MetricDefinition, MetricSuperset, QueryVariant,
};
pub use pipeline::{
    Artifact, FormatSelection, RunMode, RunSummary, dashboard_artifact_path, dashboard_artifacts,
    generate_dashboards, generate_metrics, metric_artifact_path, metric_artifacts, run_versions,
};
pub use schema::{load_superset, parse_superset, validate_superset};
pub use selector::select_variant;
pub use writer::{ArtifactFormat, render_artifact, write_artifact};
