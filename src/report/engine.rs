//! Report Engine
//! Pure recompute of every dashboard view from the raw table and the current
//! control selection.

use crate::data::filter::{self, FilteredView};
use crate::data::schema::{rows_from_frame, Operator, LOCALITY, PROVINCE};
use crate::data::{DataCache, LoaderError};
use crate::report::presenter::{
    locality_trend, metric_cards, operator_province_comparison, operator_trend, province_trend,
    ChartSpec, DetailTable, MetricCard,
};
use crate::stats::{grouped_means, period_averages, AggregateError, PeriodOrder};
use polars::prelude::*;
use std::collections::BTreeSet;
use std::path::Path;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to load data: {0}")]
    Load(#[from] LoaderError),
    #[error("Failed to process data: {0}")]
    Data(#[from] PolarsError),
}

/// Values of the dashboard controls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    /// Period shown in the metric cards; empty means the first configured one.
    pub period: String,
    /// `None` (or a province not in the data) falls back to the first province.
    pub province: Option<String>,
    pub localities: BTreeSet<String>,
    /// Operator drawn in the province and locality charts.
    pub focus: Operator,
}

/// Metric cards plus the global operator trend.
#[derive(Debug, Clone, PartialEq)]
pub struct Overview {
    pub metrics: Vec<MetricCard>,
    pub operator_trend: ChartSpec,
}

/// Everything one render needs.
#[derive(Debug, Clone)]
pub struct Report {
    pub periods: Vec<String>,
    pub provinces: Vec<String>,
    pub localities: Vec<String>,
    /// Selection after defaults and stale values were resolved.
    pub selection: Selection,
    /// `None` when no period has any data.
    pub overview: Option<Overview>,
    pub comparison: Option<ChartSpec>,
    pub province_trend: Option<ChartSpec>,
    pub locality_trend: Option<ChartSpec>,
    pub table: DetailTable,
}

impl Report {
    /// Charts present in this report, paired with their export file stem.
    pub fn charts(&self) -> Vec<(&'static str, &ChartSpec)> {
        let mut charts = Vec::new();
        if let Some(overview) = &self.overview {
            charts.push(("thp_operador", &overview.operator_trend));
        }
        if let Some(chart) = &self.comparison {
            charts.push(("thp_operador_provincia", chart));
        }
        if let Some(chart) = &self.province_trend {
            charts.push(("thp_provincia", chart));
        }
        if let Some(chart) = &self.locality_trend {
            charts.push(("thp_localidad", chart));
        }
        charts
    }
}

pub struct ReportEngine {
    order: PeriodOrder,
}

impl ReportEngine {
    pub fn new(order: PeriodOrder) -> Self {
        Self { order }
    }

    /// Load (through the cache) and recompute.
    pub fn run(
        &self,
        cache: &mut DataCache,
        path: &Path,
        selection: &Selection,
    ) -> Result<Report, EngineError> {
        let raw = cache.load(path)?;
        self.recompute(&raw, selection)
    }

    /// Rebuild every view for `selection`. Empty results drop the dependent
    /// chart or metric instead of failing.
    pub fn recompute(&self, raw: &DataFrame, selection: &Selection) -> Result<Report, EngineError> {
        let started = Instant::now();
        let selection = self.resolve(raw, selection);

        let overview = match period_averages(raw, &self.order) {
            Ok(averages) => {
                let metrics = metric_cards(&averages, &self.order, &selection.period);
                if metrics.is_empty() {
                    warn!(period = %selection.period, "No data for selected period");
                }
                Some(Overview {
                    metrics,
                    operator_trend: operator_trend(&averages),
                })
            }
            Err(AggregateError::NoData) => None,
            Err(AggregateError::Polars(e)) => return Err(e.into()),
        };

        let provinces = filter::provinces(raw);
        let mut report = Report {
            periods: self.order.labels().to_vec(),
            provinces,
            localities: Vec::new(),
            selection: selection.clone(),
            overview,
            comparison: None,
            province_trend: None,
            locality_trend: None,
            table: DetailTable::default(),
        };

        let Some(province) = selection.province.as_deref() else {
            return Ok(report);
        };

        // Localities are checked against the province rows before narrowing.
        let province_rows = filter::filter_province(raw, province)?;
        report.localities = filter::localities(&province_rows);
        report
            .selection
            .localities
            .retain(|l| report.localities.contains(l));

        let view =
            FilteredView::from_province_rows(province_rows, province, &report.selection.localities)?;

        let by_province = grouped_means(&view.province_rows, &[PROVINCE], &self.order)?;
        report.comparison = operator_province_comparison(&by_province);
        report.province_trend = province_trend(&by_province, selection.focus);

        if view.has_locality_selection() {
            let by_locality =
                grouped_means(&view.locality_rows, &[PROVINCE, LOCALITY], &self.order)?;
            report.locality_trend = locality_trend(&by_locality, selection.focus);
        }

        report.table = DetailTable::new(rows_from_frame(&view.locality_rows)?);

        debug!(
            province = %view.province,
            localities = view.localities.len(),
            rows = report.table.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Recomputed report"
        );
        Ok(report)
    }

    /// Fill the period default and fall back to the first province when the
    /// selected one is unset or absent. Localities are checked in `recompute`.
    fn resolve(&self, raw: &DataFrame, selection: &Selection) -> Selection {
        let mut resolved = selection.clone();

        if resolved.period.is_empty() {
            resolved.period = self.order.labels().first().cloned().unwrap_or_default();
        }

        let provinces = filter::provinces(raw);
        resolved.province = match selection.province.as_ref() {
            Some(p) if provinces.contains(p) => Some(p.clone()),
            _ => provinces.into_iter().next(),
        };

        if resolved.province.is_none() {
            resolved.localities.clear();
        }

        resolved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::test_support::{frame, sample_frame};

    fn engine() -> ReportEngine {
        ReportEngine::new(PeriodOrder::default())
    }

    fn select(province: Option<&str>, localities: &[&str]) -> Selection {
        Selection {
            period: "feb-24".to_string(),
            province: province.map(str::to_string),
            localities: localities.iter().map(|s| s.to_string()).collect(),
            focus: Operator::Claro,
        }
    }

    #[test]
    fn full_report_for_province_without_localities() {
        let report = engine()
            .recompute(&sample_frame(), &select(Some("Cordoba"), &[]))
            .unwrap();

        let overview = report.overview.as_ref().unwrap();
        assert_eq!(overview.metrics.len(), 3);
        assert_eq!(report.provinces, vec!["Cordoba", "Mendoza"]);
        assert_eq!(report.localities, vec!["Rio Cuarto", "Villa Maria"]);
        assert!(report.province_trend.is_some());
        assert!(report.comparison.is_some());
        assert!(report.locality_trend.is_none());
        assert_eq!(report.table.len(), 4);
        assert_eq!(report.charts().len(), 3);
    }

    #[test]
    fn locality_selection_adds_locality_chart_and_narrows_table() {
        let report = engine()
            .recompute(&sample_frame(), &select(Some("Cordoba"), &["Rio Cuarto"]))
            .unwrap();

        assert!(report.locality_trend.is_some());
        assert_eq!(report.table.len(), 2);
        assert!(report.table.rows.iter().all(|r| r.locality == "Rio Cuarto"));
        // The province chart still covers the whole province.
        let province = report.province_trend.unwrap();
        assert_eq!(province.series[0].points, vec![Some(15.0), Some(18.0)]);
    }

    #[test]
    fn missing_province_defaults_to_first_and_drops_stale_localities() {
        let report = engine()
            .recompute(&sample_frame(), &select(Some("Salta"), &["Godoy Cruz"]))
            .unwrap();

        assert_eq!(report.selection.province.as_deref(), Some("Cordoba"));
        assert!(report.selection.localities.is_empty());
        assert!(report.locality_trend.is_none());
    }

    #[test]
    fn stale_localities_are_dropped_and_valid_ones_kept() {
        let report = engine()
            .recompute(&sample_frame(), &select(Some("Cordoba"), &["Godoy Cruz", "Villa Maria"]))
            .unwrap();

        let kept: Vec<&str> = report.selection.localities.iter().map(String::as_str).collect();
        assert_eq!(kept, vec!["Villa Maria"]);
        assert!(report.locality_trend.is_some());
        assert_eq!(report.table.len(), 2);
        assert!(report.table.rows.iter().all(|r| r.locality == "Villa Maria"));
    }

    #[test]
    fn nan_cells_are_null_in_the_averages() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("thp.csv");
        std::fs::write(
            &path,
            "Periodo;Provincia;Localidad;THP Claro;Muestras Claro;THP Personal;Muestras Personal;THP Movistar;Muestras Movistar\n\
             ene-24;Cordoba;Rio Cuarto;10;100;1;1;1;1\n\
             ene-24;Cordoba;Villa Maria;NaN;100;inf;1;1e400;1\n",
        )
        .unwrap();

        let mut cache = DataCache::new();
        let selection = Selection { period: "ene-24".into(), ..Selection::default() };
        let report = engine().run(&mut cache, &path, &selection).unwrap();

        let metrics = &report.overview.unwrap().metrics;
        assert_eq!(metrics[0].value_label(), "10.00 GB");
        assert_eq!(metrics[1].value_label(), "1.00 GB");
        assert_eq!(metrics[2].value_label(), "1.00 GB");
    }

    #[test]
    fn empty_table_suppresses_charts_without_error() {
        let report = engine().recompute(&frame(&[]), &Selection::default()).unwrap();

        assert!(report.overview.is_none());
        assert!(report.province_trend.is_none());
        assert!(report.comparison.is_none());
        assert!(report.locality_trend.is_none());
        assert!(report.table.is_empty());
        assert!(report.charts().is_empty());
        assert_eq!(report.selection.period, "ene-24");
    }

    #[test]
    fn load_errors_are_typed() {
        let mut cache = DataCache::new();
        let err = engine()
            .run(&mut cache, Path::new("/no/such/file.csv"), &Selection::default())
            .unwrap_err();
        assert!(matches!(err, EngineError::Load(LoaderError::NotFound(_))));
    }
}
