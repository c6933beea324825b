//! Province / locality scoping of the measurement table.

use crate::data::schema::{LOCALITY, PROVINCE};
use polars::prelude::*;
use std::collections::BTreeSet;

fn distinct_values(df: &DataFrame, column: &str) -> Vec<String> {
    let Ok(column) = df.column(column) else {
        return Vec::new();
    };
    let Ok(values) = column.as_materialized_series().str() else {
        return Vec::new();
    };

    let distinct: BTreeSet<String> = values
        .into_iter()
        .flatten()
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    distinct.into_iter().collect()
}

/// Province options, sorted.
pub fn provinces(df: &DataFrame) -> Vec<String> {
    distinct_values(df, PROVINCE)
}

/// Locality options of a (usually province-filtered) frame, sorted.
pub fn localities(df: &DataFrame) -> Vec<String> {
    distinct_values(df, LOCALITY)
}

/// Rows of exactly one province.
pub fn filter_province(df: &DataFrame, province: &str) -> PolarsResult<DataFrame> {
    df.clone()
        .lazy()
        .filter(col(PROVINCE).eq(lit(province)))
        .collect()
}

/// Narrow to the selected localities; an empty selection keeps every row.
pub fn filter_localities(df: &DataFrame, selected: &BTreeSet<String>) -> PolarsResult<DataFrame> {
    let Some(predicate) = selected
        .iter()
        .map(|loc| col(LOCALITY).eq(lit(loc.as_str())))
        .reduce(|acc, e| acc.or(e))
    else {
        return Ok(df.clone());
    };

    df.clone().lazy().filter(predicate).collect()
}

/// Province-scoped and locality-scoped views of the raw table.
///
/// The locality view is a separate frame derived from the province view;
/// narrowing it never mutates the province view.
#[derive(Debug, Clone)]
pub struct FilteredView {
    pub province: String,
    pub localities: BTreeSet<String>,
    pub province_rows: DataFrame,
    pub locality_rows: DataFrame,
}

impl FilteredView {
    pub fn build(
        df: &DataFrame,
        province: &str,
        localities: &BTreeSet<String>,
    ) -> PolarsResult<Self> {
        Self::from_province_rows(filter_province(df, province)?, province, localities)
    }

    /// Same as [`FilteredView::build`] for rows already scoped to `province`.
    pub fn from_province_rows(
        province_rows: DataFrame,
        province: &str,
        localities: &BTreeSet<String>,
    ) -> PolarsResult<Self> {
        let locality_rows = filter_localities(&province_rows, localities)?;
        Ok(Self {
            province: province.to_string(),
            localities: localities.clone(),
            province_rows,
            locality_rows,
        })
    }

    /// True when the locality chart should be drawn.
    pub fn has_locality_selection(&self) -> bool {
        !self.localities.is_empty() && self.locality_rows.height() > 0
    }
}
