// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Sequential per-version generation in generate or check mode.
//!
//! Inputs are loaded and validated once before the loop, so a structural
//! error never leaves partial output behind. Inside the loop versions run in
//! ascending order; a fatal error stops the run but keeps the artifacts
//! already written for earlier versions.

use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::info;

use crate::{
    builder::project_metrics,
    config::{ProjectionSettings, SupportedVersions},
    dashboard::{DashboardTemplate, check_row_gates, load_dashboard, project_dashboard},
    drift::{DriftReport, ScratchSpace, check_artifact},
    error::Error,
    metric::MetricSuperset,
    schema::load_superset,
    writer::{ArtifactFormat, render_artifact, write_artifact},
};

/// Whether artifacts are written in place or compared with committed copies.
#[derive(Debug, Clone, Copy, PartialEq, Eq,)]
pub enum RunMode
{
    /// Write artifacts below the output root.
    Generate,
    /// Regenerate into a scratch directory and report differences.
    Check,
}

/// Metric artifact formats to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default,)]
pub enum FormatSelection
{
    /// YAML and JSON.
    #[default]
    Both,
    /// YAML only.
    YamlOnly,
    /// JSON only.
    JsonOnly,
}

impl FormatSelection
{
    /// Formats in emission order.
    pub fn formats(self,) -> &'static [ArtifactFormat]
    {
        match self {
            Self::Both => &[ArtifactFormat::Yaml, ArtifactFormat::Json,],
            Self::YamlOnly => &[ArtifactFormat::Yaml,],
            Self::JsonOnly => &[ArtifactFormat::Json,],
        }
    }
}

/// Rendered artifact addressed relative to the output root.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct Artifact
{
    /// Location below the output root.
    pub relative_path: PathBuf,
    /// Serialized bytes.
    pub contents:      Vec<u8,>,
}

/// Outcome of a completed run.
#[derive(Debug, Clone, Default, PartialEq, Eq,)]
pub struct RunSummary
{
    /// Paths written in generate mode, in write order.
    pub written: Vec<PathBuf,>,
    /// Differences collected in check mode.
    pub drift:   DriftReport,
}

/// Relative path of the metric artifact for `version` in `format`.
pub fn metric_artifact_path(version: u32, format: ArtifactFormat,) -> PathBuf
{
    Path::new(format.directory(),).join(format!("postgresql-{version}.{}", format.extension()),)
}

/// Relative path of the dashboard artifact for `version`.
pub fn dashboard_artifact_path(version: u32,) -> PathBuf
{
    PathBuf::from(format!("postgresql_dashboard_pg{version}.json"),)
}

/// Renders the metric artifacts of one version.
///
/// # Errors
///
/// Propagates serialization failures from [`render_artifact`].
pub fn metric_artifacts(
    superset: &MetricSuperset,
    version: u32,
    formats: FormatSelection,
) -> Result<Vec<Artifact,>, Error,>
{
    let artifact = project_metrics(superset, version,);
    formats
        .formats()
        .iter()
        .map(|format| -> Result<Artifact, Error,> {
            Ok(Artifact {
                relative_path: metric_artifact_path(version, *format,),
                contents:      render_artifact(&artifact, *format,)?,
            },)
        },)
        .collect()
}

/// Renders the dashboard artifact of one version.
///
/// # Errors
///
/// Propagates serialization failures from [`render_artifact`].
pub fn dashboard_artifacts(
    template: &DashboardTemplate,
    settings: &ProjectionSettings,
    version: u32,
) -> Result<Vec<Artifact,>, Error,>
{
    let dashboard = project_dashboard(template, settings, version,);
    Ok(vec![Artifact {
        relative_path: dashboard_artifact_path(version,),
        contents:      render_artifact(&dashboard, ArtifactFormat::Json,)?,
    }],)
}

/// Runs `render` for each version and writes or checks its artifacts.
///
/// # Errors
///
/// Returns the first rendering or I/O error. Artifacts of earlier versions
/// stay on disk. Drift is not an error here; it is returned in the summary.
pub fn run_versions<F,>(
    versions: &SupportedVersions,
    output: &Path,
    mode: RunMode,
    mut render: F,
) -> Result<RunSummary, Error,>
where
    F: FnMut(u32,) -> Result<Vec<Artifact,>, Error,>,
{
    let scratch = match mode {
        RunMode::Generate => None,
        RunMode::Check => Some(ScratchSpace::new()?,),
    };

    let pb = spinner();
    let mut summary = RunSummary::default();

    for version in versions.iter() {
        pb.set_message(format!("PostgreSQL {version}"),);
        for artifact in render(version,)? {
            let target = output.join(&artifact.relative_path,);
            match &scratch {
                None => {
                    write_artifact(&target, &artifact.contents,)?;
                    summary.written.push(target,);
                }
                Some(scratch,) => {
                    if let Some(path,) =
                        check_artifact(scratch, &artifact.relative_path, &target, &artifact.contents,)?
                    {
                        summary.drift = summary.drift.with_difference(path,);
                    }
                }
            }
        }
        pb.tick();
    }

    pb.finish_and_clear();
    Ok(summary,)
}

/// Loads the host header and produces the metric artifacts of every version.
///
/// # Errors
///
/// Returns extraction or validation errors before anything is written, and
/// rendering or I/O errors from [`run_versions`].
pub fn generate_metrics(
    header: &Path,
    output: &Path,
    settings: &ProjectionSettings,
    formats: FormatSelection,
    mode: RunMode,
) -> Result<RunSummary, Error,>
{
    let superset = load_superset(header, &settings.macro_name,)?;
    info!("Loaded {} metric definitions", superset.metrics().len());

    run_versions(&settings.versions, output, mode, |version| {
        metric_artifacts(&superset, version, formats,)
    },)
}

/// Loads the dashboard template and produces the dashboard of every version.
///
/// # Errors
///
/// Returns parse or validation errors before anything is written, including
/// mixed row gates when `strict_layout` is set, and rendering or I/O errors
/// from [`run_versions`].
pub fn generate_dashboards(
    template_path: &Path,
    output: &Path,
    settings: &ProjectionSettings,
    mode: RunMode,
    strict_layout: bool,
) -> Result<RunSummary, Error,>
{
    let template = load_dashboard(template_path,)?;
    check_row_gates(&template, settings.default_min_version, strict_layout,)?;

    run_versions(&settings.versions, output, mode, |version| {
        dashboard_artifacts(&template, settings, version,)
    },)
}

fn spinner() -> ProgressBar
{
    let pb = ProgressBar::with_draw_target(None, ProgressDrawTarget::stderr(),);
    if let Ok(style,) =
        ProgressStyle::default_spinner().template("{spinner:.yellow} [{elapsed_precise}] {msg}",)
    {
        pb.set_style(style,);
    }
    pb
}

#[cfg(test)]
mod tests
{
    use std::{fs, path::PathBuf};

    use tempfile::tempdir;

    use super::{
        FormatSelection, RunMode, dashboard_artifact_path, generate_dashboards, generate_metrics,
        metric_artifact_path, metric_artifacts,
    };
    use crate::{
        Error,
        config::{GeneratorConfig, ProjectionSettings},
        schema::parse_superset,
        writer::ArtifactFormat,
    };

    const HEADER: &str = r#"
#ifndef PGEXPORTER_INTERNAL_H
#define PGEXPORTER_INTERNAL_H

#define INTERNAL_YAML "" \
   "version: 1\n" \
   "metrics:\n" \
   "  - tag: pg_up\n" \
   "    queries:\n" \
   "      - version: 13\n" \
   "        query: SELECT 1;\n" \
   "        columns:\n" \
   "          - type: gauge\n" \
   "  - tag: pg_stat_io\n" \
   "    collector: io\n" \
   "    queries:\n" \
   "      - version: 16\n" \
   "        query: SELECT * FROM pg_stat_io;\n" \
   "        columns:\n" \
   "          - name: backend_type\n" \
   "            type: label\n"

#endif
"#;

    const TEMPLATE: &str = r#"{
  "title": "PostgreSQL 18",
  "uid": "pgexporter-pg18",
  "tags": ["pg18"],
  "panels": [
    {"id": 7, "title": "Up", "gridPos": {"x": 0, "y": 0, "w": 24, "h": 4}},
    {"id": 8, "title": "IO", "version": 16, "gridPos": {"x": 0, "y": 4, "w": 24, "h": 8}},
    {"id": 9, "title": "Sessions", "gridPos": {"x": 0, "y": 12, "w": 24, "h": 6}}
  ]
}
"#;

    fn settings(versions: &[u32],) -> ProjectionSettings
    {
        GeneratorConfig {
            versions: versions.to_vec(),
            ..GeneratorConfig::default()
        }
        .resolve()
        .expect("valid settings",)
    }

    #[test]
    fn artifact_paths_follow_layout()
    {
        assert_eq!(
            metric_artifact_path(13, ArtifactFormat::Yaml,),
            PathBuf::from("yaml/postgresql-13.yaml")
        );
        assert_eq!(
            metric_artifact_path(18, ArtifactFormat::Json,),
            PathBuf::from("json/postgresql-18.json")
        );
        assert_eq!(dashboard_artifact_path(15,), PathBuf::from("postgresql_dashboard_pg15.json"));
    }

    #[test]
    fn format_selection_limits_outputs()
    {
        let superset = parse_superset("version: 1\nmetrics: []\n",).expect("valid superset",);
        let both = metric_artifacts(&superset, 14, FormatSelection::Both,).expect("render",);
        let json = metric_artifacts(&superset, 14, FormatSelection::JsonOnly,).expect("render",);

        assert_eq!(both.len(), 2);
        assert_eq!(json.len(), 1);
        assert_eq!(json[0].relative_path, PathBuf::from("json/postgresql-14.json"));
    }

    #[test]
    fn generates_metric_artifacts_for_every_version()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let header = temp.path().join("internal.h",);
        fs::write(&header, HEADER,).expect("failed to write header",);
        let output = temp.path().join("contrib",);

        let summary = generate_metrics(
            &header,
            &output,
            &settings(&[15, 16],),
            FormatSelection::Both,
            RunMode::Generate,
        )
        .expect("generation failed",);

        assert_eq!(summary.written.len(), 4);
        assert!(summary.drift.is_clean());
        let v15 = fs::read_to_string(output.join("yaml/postgresql-15.yaml",),).expect("read",);
        let v16 = fs::read_to_string(output.join("yaml/postgresql-16.yaml",),).expect("read",);
        assert!(v15.contains("tag: pg_up"));
        assert!(!v15.contains("pg_stat_io"));
        assert!(v16.contains("collector: io"));
        assert!(output.join("json/postgresql-16.json").is_file());
    }

    #[test]
    fn failure_mid_run_keeps_earlier_versions()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let header = temp.path().join("internal.h",);
        fs::write(&header, HEADER,).expect("failed to write header",);
        let output = temp.path().join("contrib",);
        fs::create_dir_all(output.join("yaml/postgresql-15.yaml",),)
            .expect("failed to block artifact path",);

        let error = generate_metrics(
            &header,
            &output,
            &settings(&[13, 14, 15, 16],),
            FormatSelection::YamlOnly,
            RunMode::Generate,
        )
        .expect_err("expected write failure",);

        assert!(matches!(error, Error::Write { .. }));
        assert!(output.join("yaml/postgresql-13.yaml").is_file());
        assert!(output.join("yaml/postgresql-14.yaml").is_file());
        assert!(!output.join("yaml/postgresql-16.yaml").exists());
    }

    fn embed(yaml: &str,) -> String
    {
        let literals = yaml
            .lines()
            .map(|line| format!("  \"{}\\n\"", line.replace('\\', "\\\\",).replace('"', "\\\"",)),)
            .collect::<Vec<_,>>()
            .join(" \\\n",);
        format!("#define INTERNAL_YAML \"\" \\\n{literals}\n")
    }

    #[test]
    fn validation_failure_writes_nothing()
    {
        let invalid = [
            (
                "version: 1\nmetrics:\n  - tag: a\n",
                "metric 0 (a) missing required 'queries' field",
            ),
            (
                "version: 1\nmetrics:\n  - {tag: dup, queries: [{version: 13, query: q, columns: [{type: gauge}]}]}\n  - {tag: dup, queries: [{version: 14, query: q, columns: [{type: gauge}]}]}\n",
                "metric 1: duplicate tag 'dup'",
            ),
            (
                "version: 1\nmetrics:\n  - {tag: twice, queries: [{version: 14, query: a, columns: [{type: gauge}]}, {version: 14, query: b, columns: [{type: gauge}]}]}\n",
                "metric 0 (twice): duplicate version 14",
            ),
            (
                "version: 1\nmetrics:\n  - {tag: odd, queries: [{version: 13, query: q, columns: [{type: bogus}]}]}\n",
                "metric 0 (odd) query 0 column 0: invalid type 'bogus' (valid: gauge, counter, label, histogram)",
            ),
        ];

        for (yaml, expected,) in invalid {
            let temp = tempdir().expect("failed to create tempdir",);
            let header = temp.path().join("internal.h",);
            fs::write(&header, embed(yaml,),).expect("failed to write header",);
            let output = temp.path().join("contrib",);

            let error = generate_metrics(
                &header,
                &output,
                &settings(&[13, 14, 15],),
                FormatSelection::Both,
                RunMode::Generate,
            )
            .expect_err("expected validation failure",);

            match error {
                Error::Validation {
                    message,
                } => assert_eq!(message, expected),
                other => panic!("expected validation error, got {other:?}"),
            }
            assert!(!output.exists());
        }
    }

    #[test]
    fn embedded_fixture_round_trips_through_extraction()
    {
        let yaml = "version: 1\nmetrics:\n  - {tag: \"quoted\", queries: []}\n";
        let document =
            crate::extract_embedded_document(&embed(yaml,), "INTERNAL_YAML",).expect("extracted",);
        assert_eq!(document, yaml);
    }

    #[test]
    fn check_mode_is_clean_after_generation()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let template = temp.path().join("postgresql_dashboard.json",);
        fs::write(&template, TEMPLATE,).expect("failed to write template",);
        let settings = settings(&[15, 16, 17, 18],);

        generate_dashboards(&template, temp.path(), &settings, RunMode::Generate, false,)
            .expect("generation failed",);
        let summary = generate_dashboards(&template, temp.path(), &settings, RunMode::Check, false,)
            .expect("check failed",);

        assert!(summary.drift.is_clean());
        assert!(summary.written.is_empty());
        let pg15 = fs::read_to_string(temp.path().join("postgresql_dashboard_pg15.json",),)
            .expect("read",);
        assert!(pg15.contains("\"title\": \"PostgreSQL 15\""));
        assert!(!pg15.contains("\"IO\""));
    }

    #[test]
    fn check_mode_reports_changed_and_missing_files()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let template = temp.path().join("template.json",);
        fs::write(&template, TEMPLATE,).expect("failed to write template",);
        let settings = settings(&[15, 16, 17],);

        generate_dashboards(&template, temp.path(), &settings, RunMode::Generate, false,)
            .expect("generation failed",);
        let changed = temp.path().join("postgresql_dashboard_pg15.json",);
        let missing = temp.path().join("postgresql_dashboard_pg17.json",);
        fs::write(&changed, "{}\n",).expect("failed to edit committed file",);
        fs::remove_file(&missing,).expect("failed to remove committed file",);

        let summary = generate_dashboards(&template, temp.path(), &settings, RunMode::Check, false,)
            .expect("check failed",);

        assert_eq!(summary.drift.differences(), &[changed.clone(), missing.clone()]);
        assert_eq!(fs::read_to_string(&changed).expect("read"), "{}\n");
        assert!(!missing.exists());
    }

    #[test]
    fn strict_layout_rejects_mixed_rows_before_writing()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let template = temp.path().join("template.json",);
        fs::write(
            &template,
            r#"{"panels": [
                {"gridPos": {"x": 0, "y": 0, "w": 12, "h": 4}},
                {"version": 17, "gridPos": {"x": 12, "y": 0, "w": 12, "h": 4}}
            ]}"#,
        )
        .expect("failed to write template",);
        let output = temp.path().join("out",);

        let error =
            generate_dashboards(&template, &output, &settings(&[16, 17],), RunMode::Generate, true,)
                .expect_err("expected layout conflict",);
        assert!(matches!(error, Error::Validation { .. }));
        assert!(!output.exists());

        let summary =
            generate_dashboards(&template, &output, &settings(&[16, 17],), RunMode::Generate, false,)
                .expect("lenient run succeeds",);
        assert_eq!(summary.written.len(), 2);
    }
}
