// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Structural validation of the superset metric document.
//!
//! Validation walks the raw YAML tree once and lifts it into the immutable
//! records of [`crate::metric`]. The first violation aborts the run with a
//! message naming the metric index, its tag when known, and the rule broken.

use std::{collections::HashSet, fs, path::Path};

use serde_yaml::{Mapping, Value};
use tracing::{debug, info};

use crate::{
    error::{self, Error},
    extract::extract_embedded_document,
    metric::{CarriedFields, Column, ColumnType, MetricDefinition, MetricSuperset, QueryVariant},
};

/// Loads the superset from a C header embedding it in `macro_name`.
///
/// # Errors
///
/// Returns [`Error::Io`] when the header cannot be read,
/// [`Error::Extraction`] when the macro cannot be recovered, and the errors of
/// [`parse_superset`] otherwise.
pub fn load_superset(header: &Path, macro_name: &str,) -> Result<MetricSuperset, Error,>
{
    info!("Reading {}", header.display());
    let host = fs::read_to_string(header,).map_err(|source| error::io_error(header, source,),)?;
    let document = extract_embedded_document(&host, macro_name,)?;
    parse_superset(&document,)
}

/// Parses and validates a superset document from YAML text.
///
/// # Errors
///
/// Returns [`Error::Parse`] for malformed YAML and [`Error::Validation`] for
/// structural violations.
pub fn parse_superset(contents: &str,) -> Result<MetricSuperset, Error,>
{
    let document: Value = serde_yaml::from_str(contents,)?;
    validate_superset(&document,)
}

/// Validates a parsed superset document and lifts it into typed records.
///
/// # Errors
///
/// Returns [`Error::Validation`] on the first violated rule.
///
/// # Examples
///
/// ```
/// use pgcontrib::validate_superset;
///
/// let yaml = r"
/// version: 16
/// metrics:
///   - tag: pg_stat
///     queries:
///       - version: 13
///         query: SELECT 1;
///         columns:
///           - type: gauge
/// ";
/// let document: serde_yaml::Value = serde_yaml::from_str(yaml,).expect("valid yaml",);
/// let superset = validate_superset(&document,).expect("valid superset",);
/// assert_eq!(superset.metrics()[0].tag(), "pg_stat");
/// ```
pub fn validate_superset(document: &Value,) -> Result<MetricSuperset, Error,>
{
    let root = document
        .as_mapping()
        .ok_or_else(|| Error::validation("YAML root must be a mapping",),)?;

    let version = root
        .get("version",)
        .cloned()
        .ok_or_else(|| Error::validation("YAML missing required 'version' field",),)?;

    let entries = root
        .get("metrics",)
        .ok_or_else(|| Error::validation("YAML missing required 'metrics' field",),)?
        .as_sequence()
        .ok_or_else(|| Error::validation("'metrics' must be a list",),)?;

    let mut seen_tags = HashSet::with_capacity(entries.len(),);
    let mut metrics = Vec::with_capacity(entries.len(),);

    for (index, entry,) in entries.iter().enumerate() {
        let metric = validate_metric(index, entry,)?;
        if !seen_tags.insert(metric.tag().to_owned(),) {
            return Err(Error::validation(format!(
                "metric {index}: duplicate tag '{}'",
                metric.tag()
            ),),);
        }
        metrics.push(metric,);
    }

    debug!("Validated {} metrics", metrics.len());
    Ok(MetricSuperset::new(version, metrics,),)
}

fn validate_metric(index: usize, entry: &Value,) -> Result<MetricDefinition, Error,>
{
    let mapping = entry
        .as_mapping()
        .ok_or_else(|| Error::validation(format!("metric {index} must be a mapping"),),)?;

    let tag = match mapping.get("tag",) {
        None => {
            return Err(Error::validation(format!(
                "metric {index} missing required 'tag' field"
            ),),);
        }
        Some(Value::String(tag,),) => tag.clone(),
        Some(other,) => {
            return Err(Error::validation(format!(
                "metric {index} 'tag' must be a string, got {}",
                value_kind(other)
            ),),);
        }
    };
    let context = format!("metric {index} ({tag})");

    let collector = match mapping.get("collector",) {
        None => None,
        Some(Value::String(collector,),) => Some(collector.clone(),),
        Some(other,) => {
            return Err(Error::validation(format!(
                "{context} 'collector' must be a string, got {}",
                value_kind(other)
            ),),);
        }
    };

    let variants = mapping
        .get("queries",)
        .ok_or_else(|| Error::validation(format!("{context} missing required 'queries' field"),),)?
        .as_sequence()
        .ok_or_else(|| Error::validation(format!("{context} 'queries' must be a list"),),)?;
    if variants.is_empty() {
        return Err(Error::validation(format!("{context} has empty 'queries' list"),),);
    }

    let mut seen_versions = HashSet::with_capacity(variants.len(),);
    let mut queries = Vec::with_capacity(variants.len(),);
    for (position, variant,) in variants.iter().enumerate() {
        let query = validate_variant(&context, position, variant,)?;
        if !seen_versions.insert(query.version(),) {
            return Err(Error::validation(format!(
                "{context}: duplicate version {}",
                query.version()
            ),),);
        }
        queries.push(query,);
    }

    Ok(MetricDefinition::new(tag, collector, CarriedFields::from_mapping(mapping,), queries,),)
}

fn validate_variant(context: &str, position: usize, variant: &Value,) -> Result<QueryVariant, Error,>
{
    let context = format!("{context} query {position}");
    let mapping = variant
        .as_mapping()
        .ok_or_else(|| Error::validation(format!("{context} must be a mapping"),),)?;

    let version = required(mapping, "version", &context,)?;
    let query = required(mapping, "query", &context,)?;
    let columns = required(mapping, "columns", &context,)?;

    let version = version
        .as_u64()
        .and_then(|value| u32::try_from(value,).ok(),)
        .ok_or_else(|| {
            Error::validation(format!(
                "{context} 'version' must be a non-negative integer, got {}",
                value_kind(version)
            ),)
        },)?;

    let query = query.as_str().ok_or_else(|| {
        Error::validation(format!("{context} 'query' must be a string, got {}", value_kind(query)),)
    },)?;

    let columns = columns
        .as_sequence()
        .ok_or_else(|| Error::validation(format!("{context} 'columns' must be a list"),),)?;
    if columns.is_empty() {
        return Err(Error::validation(format!("{context} has empty 'columns' list"),),);
    }

    let columns = columns
        .iter()
        .enumerate()
        .map(|(position, column,)| validate_column(&context, position, column,),)
        .collect::<Result<Vec<_,>, _,>>()?;

    Ok(QueryVariant::new(version, query.to_owned(), columns,),)
}

fn validate_column(context: &str, position: usize, column: &Value,) -> Result<Column, Error,>
{
    let context = format!("{context} column {position}");
    let mapping = column
        .as_mapping()
        .ok_or_else(|| Error::validation(format!("{context} must be a mapping"),),)?;

    let declared = mapping
        .get("type",)
        .ok_or_else(|| Error::validation(format!("{context} missing 'type'"),),)?;

    let kind = declared.as_str().and_then(ColumnType::parse,).ok_or_else(|| {
        let spelled = declared.as_str().map_or_else(|| value_kind(declared,).to_owned(), str::to_owned,);
        let valid = ColumnType::ALL.map(ColumnType::as_str,).join(", ",);
        Error::validation(format!("{context}: invalid type '{spelled}' (valid: {valid})"),)
    },)?;

    Ok(Column::new(kind, mapping.clone(),),)
}

fn required<'a,>(mapping: &'a Mapping, key: &str, context: &str,) -> Result<&'a Value, Error,>
{
    mapping
        .get(key,)
        .ok_or_else(|| Error::validation(format!("{context} missing '{key}'"),),)
}

fn value_kind(value: &Value,) -> &'static str
{
    match value {
        Value::Null => "null",
        Value::Bool(_,) => "bool",
        Value::Number(_,) => "number",
        Value::String(_,) => "string",
        Value::Sequence(_,) => "list",
        Value::Mapping(_,) => "mapping",
        Value::Tagged(_,) => "tagged value",
    }
}
