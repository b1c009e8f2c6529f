// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Immutable records describing the superset metric document.
//!
//! Instances are only produced by [`crate::validate_superset`], so every
//! value observed through these types already satisfies the structural rules:
//! unique tags, unique variant versions per metric, and typed columns.

use std::fmt;

use serde::{Serialize, Serializer};
use serde_yaml::{Mapping, Value};

/// Column kinds accepted by the exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash,)]
pub enum ColumnType
{
    /// Instantaneous numeric value.
    Gauge,
    /// Monotonically increasing numeric value.
    Counter,
    /// Text attached to the other columns as a label.
    Label,
    /// Bucketed distribution.
    Histogram,
}

impl ColumnType
{
    /// Every accepted column kind in declaration order.
    pub const ALL: [ColumnType; 4] =
        [ColumnType::Gauge, ColumnType::Counter, ColumnType::Label, ColumnType::Histogram,];

    /// Parses the YAML spelling of a column kind.
    pub fn parse(value: &str,) -> Option<Self,>
    {
        Self::ALL.into_iter().find(|kind| kind.as_str() == value,)
    }

    /// YAML spelling of the column kind.
    pub fn as_str(self,) -> &'static str
    {
        match self {
            Self::Gauge => "gauge",
            Self::Counter => "counter",
            Self::Label => "label",
            Self::Histogram => "histogram",
        }
    }
}

impl fmt::Display for ColumnType
{
    fn fmt(&self, f: &mut fmt::Formatter<'_,>,) -> fmt::Result
    {
        f.write_str(self.as_str(),)
    }
}

/// Column description with a validated `type`.
///
/// The remaining keys (`name`, `description`, ...) are opaque and kept in
/// their source order so artifacts reproduce them verbatim.
#[derive(Debug, Clone, PartialEq,)]
pub struct Column
{
    kind:   ColumnType,
    fields: Mapping,
}

impl Column
{
    pub(crate) fn new(kind: ColumnType, fields: Mapping,) -> Self
    {
        Self {
            kind,
            fields,
        }
    }

    /// Validated column kind.
    pub fn kind(&self,) -> ColumnType
    {
        self.kind
    }

    /// Column name, when the source declares one.
    pub fn name(&self,) -> Option<&str,>
    {
        self.fields.get("name",).and_then(Value::as_str,)
    }

    /// All source fields, including `type`.
    pub fn fields(&self,) -> &Mapping
    {
        &self.fields
    }
}

impl Serialize for Column
{
    fn serialize<S,>(&self, serializer: S,) -> Result<S::Ok, S::Error,>
    where
        S: Serializer,
    {
        self.fields.serialize(serializer,)
    }
}

/// One version-specific implementation of a logical metric.
#[derive(Debug, Clone, PartialEq,)]
pub struct QueryVariant
{
    version: u32,
    query:   String,
    columns: Vec<Column,>,
}

impl QueryVariant
{
    pub(crate) fn new(version: u32, query: String, columns: Vec<Column,>,) -> Self
    {
        Self {
            version,
            query,
            columns,
        }
    }

    /// Minimum server version the variant applies to.
    pub fn version(&self,) -> u32
    {
        self.version
    }

    /// SQL text of the variant.
    pub fn query(&self,) -> &str
    {
        &self.query
    }

    /// Ordered column descriptions.
    pub fn columns(&self,) -> &[Column]
    {
        &self.columns
    }
}

/// Optional top-level keys copied into artifacts when present on the source.
#[derive(Debug, Clone, Default, PartialEq,)]
pub struct CarriedFields
{
    /// Sort order hint.
    pub sort:     Option<Value,>,
    /// Server role the metric applies to.
    pub server:   Option<Value,>,
    /// Database scope of the metric.
    pub database: Option<Value,>,
    /// Whether a failing query is tolerated.
    pub optional: Option<Value,>,
}

impl CarriedFields
{
    /// Keys carried from the source metric, in artifact order.
    pub const KEYS: [&'static str; 4] = ["sort", "server", "database", "optional",];

    pub(crate) fn from_mapping(mapping: &Mapping,) -> Self
    {
        let get = |key: &str| mapping.get(key,).cloned();
        Self {
            sort:     get("sort",),
            server:   get("server",),
            database: get("database",),
            optional: get("optional",),
        }
    }
}

/// Logical metric with every query variant known to the superset.
#[derive(Debug, Clone, PartialEq,)]
pub struct MetricDefinition
{
    tag:       String,
    collector: Option<String,>,
    carried:   CarriedFields,
    queries:   Vec<QueryVariant,>,
}

impl MetricDefinition
{
    /// Assembles a metric definition.
    ///
    /// Prefer [`crate::validate_superset`] for untrusted input; this
    /// constructor performs no checks.
    pub fn new(
        tag: impl Into<String,>,
        collector: Option<String,>,
        carried: CarriedFields,
        queries: Vec<QueryVariant,>,
    ) -> Self
    {
        Self {
            tag: tag.into(),
            collector,
            carried,
            queries,
        }
    }

    /// Unique identifier of the metric.
    pub fn tag(&self,) -> &str
    {
        &self.tag
    }

    /// Collector name, falling back to the tag.
    pub fn collector(&self,) -> &str
    {
        self.collector.as_deref().unwrap_or(&self.tag,)
    }

    /// Optional keys copied verbatim into artifacts.
    pub fn carried(&self,) -> &CarriedFields
    {
        &self.carried
    }

    /// Query variants in source order.
    pub fn queries(&self,) -> &[QueryVariant]
    {
        &self.queries
    }
}

/// Parsed superset metric document.
#[derive(Debug, Clone, PartialEq,)]
pub struct MetricSuperset
{
    version: Value,
    metrics: Vec<MetricDefinition,>,
}

impl MetricSuperset
{
    /// Builds a superset from already validated metrics.
    pub fn new(version: Value, metrics: Vec<MetricDefinition,>,) -> Self
    {
        Self {
            version,
            metrics,
        }
    }

    /// Advisory document version; not used for selection.
    pub fn version(&self,) -> &Value
    {
        &self.version
    }

    /// Metrics in source order.
    pub fn metrics(&self,) -> &[MetricDefinition]
    {
        &self.metrics
    }
}
