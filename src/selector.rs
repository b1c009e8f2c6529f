// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Floor selection of query variants.

use crate::metric::{MetricDefinition, QueryVariant};

/// Returns the variant with the greatest version not exceeding `target`.
///
/// Variant versions are unique within a validated metric, so the result is
/// unambiguous. `None` means the metric does not exist yet at `target`.
///
/// # Examples
///
/// ```
/// use pgcontrib::{parse_superset, select_variant};
///
/// let superset = parse_superset(
///     "version: 1\nmetrics:\n  - tag: t\n    queries:\n      - {version: 13, query: a, columns: [{type: gauge}]}\n      - {version: 16, query: b, columns: [{type: gauge}]}\n",
/// )
/// .expect("valid superset",);
/// let metric = &superset.metrics()[0];
///
/// assert_eq!(select_variant(metric, 15,).map(|v| v.query()), Some("a"));
/// assert_eq!(select_variant(metric, 16,).map(|v| v.query()), Some("b"));
/// assert!(select_variant(metric, 12,).is_none());
/// ```
pub fn select_variant(metric: &MetricDefinition, target: u32,) -> Option<&QueryVariant,>
{
    metric
        .queries()
        .iter()
        .filter(|variant| variant.version() <= target,)
        .max_by_key(|variant| variant.version(),)
}
