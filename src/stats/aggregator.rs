//! Period Aggregator Module
//! Group-by-mean of the throughput columns, chronological period ordering and
//! period-over-period deltas.

use crate::data::schema::{Operator, PERIOD};
use polars::prelude::*;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("No data available for the selected periods")]
    NoData,
    #[error("Polars error: {0}")]
    Polars(#[from] PolarsError),
}

/// Default month labels, oldest first.
pub const DEFAULT_PERIODS: [&str; 6] = ["ene-24", "feb-24", "mar-24", "abr-24", "may-24", "jun-24"];

/// Fixed chronological order of period labels.
///
/// Labels outside the list are unknown: they sort after every known label
/// and have no predecessor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodOrder {
    labels: Vec<String>,
}

impl Default for PeriodOrder {
    fn default() -> Self {
        Self::new(DEFAULT_PERIODS)
    }
}

impl PeriodOrder {
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            labels: labels.into_iter().map(Into::into).collect(),
        }
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn rank(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Chronological predecessor; `None` for the first or an unknown label.
    pub fn previous(&self, label: &str) -> Option<&str> {
        match self.rank(label)? {
            0 => None,
            i => Some(self.labels[i - 1].as_str()),
        }
    }

    /// Known labels by position, unknown ones afterwards in lexical order.
    pub fn sort_key<'a>(&self, label: &'a str) -> (usize, &'a str) {
        (self.rank(label).unwrap_or(self.labels.len()), label)
    }
}

/// Mean throughput per operator for one period.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodAverage {
    pub period: String,
    pub values: [Option<f64>; 3],
}

impl PeriodAverage {
    pub fn value(&self, op: Operator) -> Option<f64> {
        self.values[op as usize]
    }
}

/// Mean throughput per operator for one (period, keys...) group.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupMean {
    pub period: String,
    pub keys: Vec<String>,
    pub values: [Option<f64>; 3],
}

impl GroupMean {
    pub fn value(&self, op: Operator) -> Option<f64> {
        self.values[op as usize]
    }
}

/// Group by period plus `keys` and average every throughput column.
///
/// Rows come back ordered by `order`, then by key values.
pub fn grouped_means(
    df: &DataFrame,
    keys: &[&str],
    order: &PeriodOrder,
) -> PolarsResult<Vec<GroupMean>> {
    let mut by = vec![col(PERIOD)];
    by.extend(keys.iter().map(|k| col(*k)));
    let aggs: Vec<Expr> = Operator::ALL
        .iter()
        .map(|op| col(op.thp_column()).mean())
        .collect();

    let out = df.clone().lazy().group_by(by).agg(aggs).collect()?;

    let periods = out.column(PERIOD)?.as_materialized_series().str()?;
    let key_values = keys
        .iter()
        .map(|k| out.column(k).and_then(|c| c.as_materialized_series().str()))
        .collect::<PolarsResult<Vec<_>>>()?;
    let means = Operator::ALL
        .iter()
        .map(|op| {
            out.column(op.thp_column())
                .and_then(|c| c.as_materialized_series().f64())
        })
        .collect::<PolarsResult<Vec<_>>>()?;

    let mut rows: Vec<GroupMean> = (0..out.height())
        .filter_map(|i| {
            let period = periods.get(i)?.to_string();
            let keys = key_values
                .iter()
                .map(|ca| ca.get(i).unwrap_or_default().to_string())
                .collect();
            Some(GroupMean {
                period,
                keys,
                values: [means[0].get(i), means[1].get(i), means[2].get(i)],
            })
        })
        .collect();

    rows.sort_by(|a, b| {
        order
            .sort_key(&a.period)
            .cmp(&order.sort_key(&b.period))
            .then_with(|| a.keys.cmp(&b.keys))
    });
    Ok(rows)
}

/// Per-period means of the three operators, chronologically ordered.
pub fn period_averages(
    df: &DataFrame,
    order: &PeriodOrder,
) -> Result<Vec<PeriodAverage>, AggregateError> {
    let rows = grouped_means(df, &[], order)?;
    if rows.is_empty() {
        return Err(AggregateError::NoData);
    }
    Ok(rows
        .into_iter()
        .map(|g| PeriodAverage {
            period: g.period,
            values: g.values,
        })
        .collect())
}

pub fn metric_value(averages: &[PeriodAverage], period: &str, op: Operator) -> Option<f64> {
    averages
        .iter()
        .find(|a| a.period == period)
        .and_then(|a| a.value(op))
}

/// Change of a metric relative to the chronologically previous period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Delta {
    /// First period, unknown period, or no value in the previous period.
    NoPrevious,
    /// Percent change, `(current - previous) / previous * 100`.
    Percent(f64),
    /// The previous value is zero, so the change is unbounded.
    ZeroBaseline,
}

pub fn delta(averages: &[PeriodAverage], order: &PeriodOrder, period: &str, op: Operator) -> Delta {
    let Some(current) = metric_value(averages, period, op) else {
        return Delta::NoPrevious;
    };
    let Some(previous) = order
        .previous(period)
        .and_then(|prev| metric_value(averages, prev, op))
    else {
        return Delta::NoPrevious;
    };

    if previous == 0.0 {
        Delta::ZeroBaseline
    } else {
        Delta::Percent((current - previous) / previous * 100.0)
    }
}
