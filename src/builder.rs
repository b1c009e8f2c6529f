// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Assembly of per-version metric artifacts.
//!
//! Each projected metric carries its identity, the optional keys present on
//! the source, and exactly one query: the floor-selected variant for the
//! target version.

use serde::Serialize;
use serde_yaml::Value;
use tracing::{debug, info, warn};

use crate::{
    metric::{Column, MetricDefinition, MetricSuperset},
    selector::select_variant,
};

/// Metric set generated for one target version.
#[derive(Debug, Clone, PartialEq, Serialize,)]
pub struct VersionedMetricArtifact
{
    /// Target version the artifact was generated for.
    pub version: u32,
    /// Projected metrics in superset order.
    pub metrics: Vec<ProjectedMetric,>,
}

/// Metric record as emitted into a versioned artifact.
#[derive(Debug, Clone, PartialEq, Serialize,)]
pub struct ProjectedMetric
{
    /// Unique identifier of the metric.
    pub tag:       String,
    /// Collector name, defaulting to the tag.
    pub collector: String,
    /// Sort hint copied from the source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort:      Option<Value,>,
    /// Server role copied from the source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server:    Option<Value,>,
    /// Database scope copied from the source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database:  Option<Value,>,
    /// Optional flag copied from the source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub optional:  Option<Value,>,
    /// Single-element list holding the selected variant.
    pub queries:   Vec<ProjectedQuery,>,
}

/// Selected query variant as emitted into a versioned artifact.
#[derive(Debug, Clone, PartialEq, Serialize,)]
pub struct ProjectedQuery
{
    /// SQL text of the variant.
    pub query:   String,
    /// Version the variant was declared for.
    pub version: u32,
    /// Column descriptions, verbatim.
    pub columns: Vec<Column,>,
}

/// Result of projecting one metric onto one target version.
#[derive(Debug, Clone, PartialEq,)]
pub enum MetricOutcome
{
    /// The metric is present in the artifact.
    Included(ProjectedMetric,),
    /// No variant has a version at or below the target.
    NoQualifyingVariant,
    /// The metric has an empty tag and is skipped.
    MissingTag,
}

/// Projects one metric onto `target`.
///
/// Optional keys are copied only when the source declares them; nothing is
/// defaulted apart from the collector.
pub fn build_metric(metric: &MetricDefinition, target: u32,) -> MetricOutcome
{
    if metric.tag().is_empty() {
        return MetricOutcome::MissingTag;
    }

    let Some(variant,) = select_variant(metric, target,) else {
        return MetricOutcome::NoQualifyingVariant;
    };

    let carried = metric.carried().clone();
    MetricOutcome::Included(ProjectedMetric {
        tag:       metric.tag().to_owned(),
        collector: metric.collector().to_owned(),
        sort:      carried.sort,
        server:    carried.server,
        database:  carried.database,
        optional:  carried.optional,
        queries:   vec![ProjectedQuery {
            query:   variant.query().to_owned(),
            version: variant.version(),
            columns: variant.columns().to_vec(),
        }],
    },)
}

/// Projects the whole superset onto `target`.
///
/// Metrics without a qualifying variant are omitted and logged at debug
/// level; metrics with an empty tag are skipped with a warning.
pub fn project_metrics(superset: &MetricSuperset, target: u32,) -> VersionedMetricArtifact
{
    info!("Processing {} metrics for PostgreSQL {}", superset.metrics().len(), target);

    let metrics: Vec<ProjectedMetric,> = superset
        .metrics()
        .iter()
        .filter_map(|metric| match build_metric(metric, target,) {
            MetricOutcome::Included(projected,) => Some(projected,),
            MetricOutcome::NoQualifyingVariant => {
                debug!("No query variant found for {} on PostgreSQL {}", metric.tag(), target);
                None
            }
            MetricOutcome::MissingTag => {
                warn!("Metric missing 'tag' field, skipping");
                None
            }
        },)
        .collect();

    info!("Generated {} metrics for PostgreSQL {}", metrics.len(), target);
    VersionedMetricArtifact {
        version: target,
        metrics,
    }
}
