//! Stats module - period averages and deltas

mod aggregator;

pub use aggregator::{
    delta, grouped_means, metric_value, period_averages, AggregateError, Delta, GroupMean,
    PeriodAverage, PeriodOrder, DEFAULT_PERIODS,
};
