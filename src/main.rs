// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Command-line interface for the pgcontrib binary.
//!
//! The CLI regenerates per-version metric definitions and dashboards from
//! their superset sources, or verifies that committed copies are current.

use std::{
    path::{Path, PathBuf},
    process,
};

use clap::{ArgAction, Args, Parser, Subcommand};
use pgcontrib::{
    Error, FormatSelection, GeneratorConfig, ProjectionSettings, RunMode, RunSummary,
    generate_dashboards, generate_metrics,
};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Command line interface for projecting superset monitoring sources.
#[derive(Debug, Parser,)]
#[command(name = "pgcontrib", version, about = "Generate per-version PostgreSQL contrib artifacts")]
struct Cli
{
    /// Optional YAML file overriding supported versions and defaults.
    #[arg(long = "config", value_name = "PATH", env = "PGCONTRIB_CONFIG", global = true)]
    config: Option<PathBuf,>,

    /// Enable debug logging.
    #[arg(long = "verbose", short = 'v', action = ArgAction::SetTrue, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand,)]
enum Command
{
    /// Generate per-version metric definitions from the host header.
    Metrics(MetricsArgs,),
    /// Generate per-version dashboards from the superset template.
    Dashboards(DashboardsArgs,),
}

#[derive(Debug, Args,)]
struct MetricsArgs
{
    /// Header embedding the superset metric document.
    #[arg(long = "internal-h", value_name = "PATH")]
    internal_h: PathBuf,

    /// Output root; defaults to `contrib/` of the repository owning the header.
    #[arg(long = "output", value_name = "DIR")]
    output: Option<PathBuf,>,

    /// Only produce YAML artifacts.
    #[arg(long = "yaml-only", action = ArgAction::SetTrue, conflicts_with = "json_only")]
    yaml_only: bool,

    /// Only produce JSON artifacts.
    #[arg(long = "json-only", action = ArgAction::SetTrue)]
    json_only: bool,

    /// Compare against committed artifacts instead of writing.
    #[arg(long = "check", action = ArgAction::SetTrue)]
    check: bool,
}

#[derive(Debug, Args,)]
struct DashboardsArgs
{
    /// Superset dashboard template.
    #[arg(long = "template", value_name = "PATH")]
    template: PathBuf,

    /// Output directory; defaults to the template's directory.
    #[arg(long = "output", value_name = "DIR")]
    output: Option<PathBuf,>,

    /// Compare against committed dashboards instead of writing.
    #[arg(long = "check", action = ArgAction::SetTrue)]
    check: bool,

    /// Reject rows whose panels disagree on their minimum version.
    #[arg(long = "strict-layout", action = ArgAction::SetTrue)]
    strict_layout: bool,
}

/// Entry point that reports errors and sets the appropriate exit status.
fn main()
{
    if let Err(error,) = run() {
        eprintln!("{}", error.to_display_string());
        process::exit(1,);
    }
}

fn run() -> Result<(), Error,>
{
    let cli = Cli::parse();
    init_tracing(cli.verbose,);

    let settings = load_settings(cli.config.as_deref(),)?;
    match cli.command {
        Command::Metrics(args,) => run_metrics(&args, &settings,),
        Command::Dashboards(args,) => run_dashboards(&args, &settings,),
    }
}

fn init_tracing(verbose: bool,)
{
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level,),);
    let _ = tracing_subscriber::registry()
        .with(filter,)
        .with(tracing_subscriber::fmt::layer().with_target(false,).with_writer(std::io::stderr,),)
        .try_init();
}

fn load_settings(path: Option<&Path,>,) -> Result<ProjectionSettings, Error,>
{
    let config = match path {
        Some(path,) => {
            info!("Using configuration {}", path.display());
            GeneratorConfig::load(path,)?
        }
        None => GeneratorConfig::default(),
    };
    config.resolve()
}

fn run_metrics(args: &MetricsArgs, settings: &ProjectionSettings,) -> Result<(), Error,>
{
    let output = args.output.clone().unwrap_or_else(|| default_metrics_output(&args.internal_h,),);
    let formats = format_selection(args.yaml_only, args.json_only,);
    let mode = run_mode(args.check,);

    info!("Generating metric artifacts in {}", output.display());
    let summary = generate_metrics(&args.internal_h, &output, settings, formats, mode,)?;
    finish(mode, summary,)
}

fn run_dashboards(args: &DashboardsArgs, settings: &ProjectionSettings,) -> Result<(), Error,>
{
    let output = args.output.clone().unwrap_or_else(|| default_dashboard_output(&args.template,),);
    let mode = run_mode(args.check,);

    info!("Generating dashboards in {}", output.display());
    let summary = generate_dashboards(&args.template, &output, settings, mode, args.strict_layout,)?;
    finish(mode, summary,)
}

fn finish(mode: RunMode, summary: RunSummary,) -> Result<(), Error,>
{
    match mode {
        RunMode::Generate => {
            info!("Generated {} artifacts", summary.written.len());
            Ok((),)
        }
        RunMode::Check if summary.drift.is_clean() => {
            info!("All artifacts are up to date");
            Ok((),)
        }
        RunMode::Check => {
            error!("Generated artifacts differ from committed files:");
            for path in summary.drift.differences() {
                error!("  {}", path.display());
            }
            summary.drift.into_result()
        }
    }
}

fn run_mode(check: bool,) -> RunMode
{
    if check { RunMode::Check } else { RunMode::Generate }
}

fn format_selection(yaml_only: bool, json_only: bool,) -> FormatSelection
{
    match (yaml_only, json_only,) {
        (true, _,) => FormatSelection::YamlOnly,
        (false, true,) => FormatSelection::JsonOnly,
        (false, false,) => FormatSelection::Both,
    }
}

/// `<repo>/contrib`, where the header lives at `<repo>/src/include/<file>`.
fn default_metrics_output(header: &Path,) -> PathBuf
{
    header.ancestors().nth(3,).unwrap_or_else(|| Path::new(".",),).join("contrib",)
}

fn default_dashboard_output(template: &Path,) -> PathBuf
{
    template.parent().map(Path::to_path_buf,).unwrap_or_default()
}

#[cfg(test)]
mod tests
{
    use std::{
        fs,
        path::{Path, PathBuf},
    };

    use clap::Parser;
    use pgcontrib::{DriftReport, Error, FormatSelection, RunMode, RunSummary};
    use tempfile::tempdir;

    use super::{
        Cli, Command, default_dashboard_output, default_metrics_output, finish, format_selection,
        load_settings,
    };

    #[test]
    fn parses_metrics_invocation()
    {
        let cli = Cli::try_parse_from([
            env!("CARGO_PKG_NAME"),
            "metrics",
            "--internal-h",
            "src/include/internal.h",
            "--yaml-only",
            "--check",
        ],)
        .expect("failed to parse CLI",);

        let Command::Metrics(args,) = cli.command else {
            panic!("unexpected command variant");
        };
        assert_eq!(args.internal_h, PathBuf::from("src/include/internal.h"));
        assert!(args.yaml_only);
        assert!(args.check);
        assert_eq!(format_selection(args.yaml_only, args.json_only,), FormatSelection::YamlOnly);
    }

    #[test]
    fn format_flags_are_mutually_exclusive()
    {
        let result = Cli::try_parse_from([
            env!("CARGO_PKG_NAME"),
            "metrics",
            "--internal-h",
            "internal.h",
            "--yaml-only",
            "--json-only",
        ],);
        assert!(result.is_err());
    }

    #[test]
    fn global_flags_follow_subcommand()
    {
        let cli = Cli::try_parse_from([
            env!("CARGO_PKG_NAME"),
            "dashboards",
            "--template",
            "contrib/grafana/postgresql_dashboard.json",
            "--strict-layout",
            "--verbose",
            "--config",
            "pgcontrib.yaml",
        ],)
        .expect("failed to parse CLI",);

        assert!(cli.verbose);
        assert_eq!(cli.config.as_deref(), Some(Path::new("pgcontrib.yaml")));
        let Command::Dashboards(args,) = cli.command else {
            panic!("unexpected command variant");
        };
        assert!(args.strict_layout);
        assert!(!args.check);
    }

    #[test]
    fn default_outputs_follow_repository_layout()
    {
        assert_eq!(
            default_metrics_output(Path::new("/repo/src/include/internal.h"),),
            PathBuf::from("/repo/contrib")
        );
        assert_eq!(
            default_dashboard_output(Path::new("/repo/contrib/grafana/template.json"),),
            PathBuf::from("/repo/contrib/grafana")
        );
        assert_eq!(default_dashboard_output(Path::new("template.json"),), PathBuf::new());
    }

    #[test]
    fn settings_load_from_config_file()
    {
        let temp = tempdir().expect("failed to create tempdir",);
        let path = temp.path().join("pgcontrib.yaml",);
        fs::write(&path, "versions: [16, 17]\n",).expect("failed to write config",);

        let settings = load_settings(Some(&path,),).expect("settings must load",);
        assert_eq!(settings.versions.as_slice(), &[16, 17]);
        assert_eq!(load_settings(None,).expect("defaults",).template_version, 18);
    }

    #[test]
    fn check_with_drift_fails()
    {
        let summary = RunSummary {
            written: Vec::new(),
            drift:   DriftReport::default()
                .with_difference(PathBuf::from("contrib/yaml/postgresql-16.yaml",),),
        };

        let error = finish(RunMode::Check, summary,).expect_err("expected drift error",);
        assert!(matches!(error, Error::Drift { count: 1, .. }));
        assert!(finish(RunMode::Check, RunSummary::default(),).is_ok());
        assert!(finish(RunMode::Generate, RunSummary::default(),).is_ok());
    }
}
