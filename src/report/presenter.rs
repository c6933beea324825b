//! Presenter Module
//! Turns aggregated tables into metric cards, chart specifications and the
//! detail table shown (and exported) by the dashboard.

use crate::data::schema::{MeasurementRow, Operator, Rgb};
use crate::stats::{delta, metric_value, Delta, GroupMean, PeriodAverage, PeriodOrder};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Palette for series without a fixed operator color (localities).
pub const PALETTE: [Rgb; 10] = [
    Rgb(231, 76, 60),  // Red
    Rgb(46, 204, 113), // Green
    Rgb(155, 89, 182), // Purple
    Rgb(243, 156, 18), // Orange
    Rgb(26, 188, 156), // Teal
    Rgb(233, 30, 99),  // Pink
    Rgb(0, 188, 212),  // Cyan
    Rgb(255, 87, 34),  // Deep Orange
    Rgb(121, 85, 72),  // Brown
    Rgb(96, 125, 139), // Blue Grey
];

pub const Y_TITLE: &str = "THP (GB)";

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MetricCard {
    pub operator: Operator,
    pub value: f64,
    pub delta: Delta,
}

impl MetricCard {
    pub fn title(&self) -> &'static str {
        self.operator.thp_column()
    }

    pub fn value_label(&self) -> String {
        format!("{:.2} GB", self.value)
    }

    /// `None` when there is no previous period to compare with.
    pub fn delta_label(&self) -> Option<String> {
        match self.delta {
            Delta::NoPrevious => None,
            Delta::Percent(p) => Some(format!("{:.2}%", p)),
            Delta::ZeroBaseline => Some("n/a".to_string()),
        }
    }
}

/// One card per operator with a value in `period`.
pub fn metric_cards(
    averages: &[PeriodAverage],
    order: &PeriodOrder,
    period: &str,
) -> Vec<MetricCard> {
    Operator::ALL
        .iter()
        .filter_map(|&op| {
            let value = metric_value(averages, period, op)?;
            Some(MetricCard {
                operator: op,
                value,
                delta: delta(averages, order, period, op),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Charts
// ---------------------------------------------------------------------------

/// One line of a chart; `points` is aligned with [`ChartSpec::categories`].
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub color: Rgb,
    pub points: Vec<Option<f64>>,
}

impl Series {
    /// `(category index, value)` pairs of the non-null points.
    pub fn points_xy(&self) -> Vec<(f64, f64)> {
        self.points
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| (i as f64, v)))
            .collect()
    }

    /// Contiguous runs of non-null points; a missing period breaks the line.
    pub fn segments(&self) -> Vec<Vec<(f64, f64)>> {
        let mut segments = Vec::new();
        let mut current = Vec::new();
        for (i, v) in self.points.iter().enumerate() {
            match v {
                Some(v) => current.push((i as f64, *v)),
                None if !current.is_empty() => segments.push(std::mem::take(&mut current)),
                None => {}
            }
        }
        if !current.is_empty() {
            segments.push(current);
        }
        segments
    }
}

/// Renderer-agnostic line chart over the period axis.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub categories: Vec<String>,
    pub series: Vec<Series>,
    pub y_title: String,
    pub legend_title: String,
    /// Fixed y-axis range; auto-scaled when `None`.
    pub y_range: Option<(f64, f64)>,
}

impl ChartSpec {
    fn new(title: &str, legend_title: &str, categories: Vec<String>) -> Self {
        Self {
            title: title.to_string(),
            categories,
            series: Vec::new(),
            y_title: Y_TITLE.to_string(),
            legend_title: legend_title.to_string(),
            y_range: None,
        }
    }

    pub fn max_value(&self) -> Option<f64> {
        self.series
            .iter()
            .flat_map(|s| s.points.iter().flatten().copied())
            .filter(|v| v.is_finite())
            .reduce(f64::max)
    }

    /// Pin the axis to `[0, 2 * max]` and clamp the points into it.
    fn with_doubled_range(mut self) -> Self {
        let Some(max) = self.max_value().filter(|m| *m > 0.0) else {
            return self;
        };
        let upper = max * 2.0;
        for series in &mut self.series {
            for v in series.points.iter_mut().flatten() {
                *v = v.clamp(0.0, upper);
            }
        }
        self.y_range = Some((0.0, upper));
        self
    }
}

/// Distinct periods of already period-ordered groups.
fn categories_of<'a>(periods: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut categories: Vec<String> = Vec::new();
    for p in periods {
        if categories.last().map(String::as_str) != Some(p) {
            categories.push(p.to_string());
        }
    }
    categories
}

fn pivot<K: Ord>(
    groups: &[GroupMean],
    categories: &[String],
    key: impl Fn(&GroupMean) -> K,
    value: impl Fn(&GroupMean) -> Option<f64>,
) -> BTreeMap<K, Vec<Option<f64>>> {
    let mut out = BTreeMap::new();
    for g in groups {
        let Some(idx) = categories.iter().position(|c| *c == g.period) else {
            continue;
        };
        let slot = out
            .entry(key(g))
            .or_insert_with(|| vec![None; categories.len()]);
        slot[idx] = value(g);
    }
    out
}

/// Global trend, one series per operator.
pub fn operator_trend(averages: &[PeriodAverage]) -> ChartSpec {
    let categories = categories_of(averages.iter().map(|a| a.period.as_str()));
    let mut chart = ChartSpec::new("THP Operador", "Operadores", categories);
    chart.series = Operator::ALL
        .iter()
        .map(|&op| Series {
            name: op.thp_column().to_string(),
            color: op.color(),
            points: averages.iter().map(|a| a.value(op)).collect(),
        })
        .collect();
    chart
}

/// One series per province for `op`; groups keyed by `[Provincia]`.
pub fn province_trend(groups: &[GroupMean], op: Operator) -> Option<ChartSpec> {
    if groups.is_empty() {
        return None;
    }
    let categories = categories_of(groups.iter().map(|g| g.period.as_str()));
    let lines = pivot(groups, &categories, |g| g.keys[0].clone(), |g| g.value(op));

    let mut chart = ChartSpec::new("Provincia", "Provincia", categories);
    chart.series = lines
        .into_iter()
        .map(|(name, points)| Series {
            name,
            color: op.color(),
            points,
        })
        .collect();
    Some(chart.with_doubled_range())
}

/// One series per locality for `op`; groups keyed by `[Provincia, Localidad]`.
pub fn locality_trend(groups: &[GroupMean], op: Operator) -> Option<ChartSpec> {
    if groups.is_empty() {
        return None;
    }
    let categories = categories_of(groups.iter().map(|g| g.period.as_str()));
    let lines = pivot(groups, &categories, |g| g.keys[1].clone(), |g| g.value(op));

    let mut chart = ChartSpec::new("Localidad", "Localidad", categories);
    chart.series = lines
        .into_iter()
        .enumerate()
        .map(|(i, (name, points))| Series {
            name,
            color: PALETTE[i % PALETTE.len()],
            points,
        })
        .collect();
    Some(chart)
}

/// Long format: one series per (operator, province) pair.
pub fn operator_province_comparison(groups: &[GroupMean]) -> Option<ChartSpec> {
    if groups.is_empty() {
        return None;
    }
    let categories = categories_of(groups.iter().map(|g| g.period.as_str()));
    let mut chart = ChartSpec::new("THP Operador Provincia", "Operadores", categories);
    for op in Operator::ALL {
        let lines = pivot(groups, &chart.categories, |g| g.keys[0].clone(), |g| g.value(op));
        chart.series.extend(lines.into_iter().map(|(province, points)| Series {
            name: format!("{} - {}", op.thp_column(), province),
            color: op.color(),
            points,
        }));
    }
    Some(chart)
}

// ---------------------------------------------------------------------------
// Detail table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableColumn {
    Period,
    Province,
    Locality,
    Throughput(Operator),
    Samples(Operator),
}

impl TableColumn {
    pub const ALL: [TableColumn; 9] = [
        TableColumn::Period,
        TableColumn::Province,
        TableColumn::Locality,
        TableColumn::Throughput(Operator::Claro),
        TableColumn::Samples(Operator::Claro),
        TableColumn::Throughput(Operator::Personal),
        TableColumn::Samples(Operator::Personal),
        TableColumn::Throughput(Operator::Movistar),
        TableColumn::Samples(Operator::Movistar),
    ];

    /// Columns usable as a grouping key.
    pub const GROUPABLE: [TableColumn; 3] =
        [TableColumn::Period, TableColumn::Province, TableColumn::Locality];

    pub fn title(self) -> &'static str {
        match self {
            TableColumn::Period => crate::data::schema::PERIOD,
            TableColumn::Province => crate::data::schema::PROVINCE,
            TableColumn::Locality => crate::data::schema::LOCALITY,
            TableColumn::Throughput(op) => op.thp_column(),
            TableColumn::Samples(op) => op.samples_column(),
        }
    }

    pub fn text(self, row: &MeasurementRow) -> String {
        match self {
            TableColumn::Period => row.period.clone(),
            TableColumn::Province => row.province.clone(),
            TableColumn::Locality => row.locality.clone(),
            TableColumn::Throughput(op) => row
                .throughput(op)
                .map(|v| format!("{:.2}", v))
                .unwrap_or_default(),
            TableColumn::Samples(op) => row
                .samples(op)
                .map(|v| v.to_string())
                .unwrap_or_default(),
        }
    }
}

/// Aggregated row of a grouped table: sums, like the grid's default.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSummary {
    pub key: String,
    pub rows: usize,
    pub throughput: [f64; 3],
    pub samples: [i64; 3],
}

/// Filtered measurement rows behind the table view and the CSV export.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailTable {
    pub rows: Vec<MeasurementRow>,
}

fn cmp_nulls_last<T: PartialOrd>(a: Option<T>, b: Option<T>, descending: bool) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => {
            let ord = a.partial_cmp(&b).unwrap_or(Ordering::Equal);
            if descending {
                ord.reverse()
            } else {
                ord
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

impl DetailTable {
    pub fn new(rows: Vec<MeasurementRow>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Stable sort; periods sort chronologically and nulls always go last.
    pub fn sort_by(&mut self, column: TableColumn, descending: bool, order: &PeriodOrder) {
        self.rows.sort_by(|a, b| match column {
            TableColumn::Period => {
                let ord = order.sort_key(&a.period).cmp(&order.sort_key(&b.period));
                if descending {
                    ord.reverse()
                } else {
                    ord
                }
            }
            TableColumn::Province => cmp_nulls_last(Some(&a.province), Some(&b.province), descending),
            TableColumn::Locality => cmp_nulls_last(Some(&a.locality), Some(&b.locality), descending),
            TableColumn::Throughput(op) => cmp_nulls_last(a.throughput(op), b.throughput(op), descending),
            TableColumn::Samples(op) => cmp_nulls_last(a.samples(op), b.samples(op), descending),
        });
    }

    /// Rows grouped by the text of `column`, numeric columns summed with nulls skipped.
    pub fn group_by(&self, column: TableColumn, order: &PeriodOrder) -> Vec<GroupSummary> {
        let mut groups: BTreeMap<String, GroupSummary> = BTreeMap::new();
        for row in &self.rows {
            let key = column.text(row);
            let entry = groups.entry(key.clone()).or_insert_with(|| GroupSummary {
                key,
                rows: 0,
                throughput: [0.0; 3],
                samples: [0; 3],
            });
            entry.rows += 1;
            for op in Operator::ALL {
                let i = op as usize;
                entry.throughput[i] += row.throughput(op).unwrap_or(0.0);
                entry.samples[i] += row.samples(op).unwrap_or(0);
            }
        }

        let mut out: Vec<GroupSummary> = groups.into_values().collect();
        if column == TableColumn::Period {
            out.sort_by(|a, b| order.sort_key(&a.key).cmp(&order.sort_key(&b.key)));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::{rows_from_frame, LOCALITY, PROVINCE};
    use crate::data::test_support::sample_frame;
    use crate::stats::{grouped_means, period_averages};

    fn averages() -> Vec<PeriodAverage> {
        period_averages(&sample_frame(), &PeriodOrder::default()).unwrap()
    }

    #[test]
    fn metric_cards_format_value_and_delta() {
        let cards = metric_cards(&averages(), &PeriodOrder::default(), "feb-24");
        assert_eq!(cards.len(), 3);
        let claro = &cards[0];
        assert_eq!(claro.title(), "THP Claro");
        assert_eq!(claro.value_label(), "24.00 GB");
        assert_eq!(claro.delta_label().as_deref(), Some("20.00%"));
    }

    #[test]
    fn first_period_cards_have_no_delta() {
        let cards = metric_cards(&averages(), &PeriodOrder::default(), "ene-24");
        assert!(cards.iter().all(|c| c.delta_label().is_none()));
    }

    #[test]
    fn period_without_data_yields_no_cards() {
        let cards = metric_cards(&averages(), &PeriodOrder::default(), "jun-24");
        assert!(cards.is_empty());
    }

    #[test]
    fn operator_trend_uses_fixed_colors() {
        let chart = operator_trend(&averages());
        assert_eq!(chart.categories, vec!["ene-24", "feb-24"]);
        assert_eq!(chart.series.len(), 3);
        for (series, op) in chart.series.iter().zip(Operator::ALL) {
            assert_eq!(series.name, op.thp_column());
            assert_eq!(series.color, op.color());
            assert_eq!(series.points.len(), 2);
        }
        assert_eq!(chart.y_title, "THP (GB)");
        assert_eq!(chart.legend_title, "Operadores");
    }

    #[test]
    fn province_trend_range_is_double_the_max() {
        let groups =
            grouped_means(&sample_frame(), &[PROVINCE], &PeriodOrder::default()).unwrap();
        let chart = province_trend(&groups, Operator::Claro).unwrap();
        assert_eq!(chart.series.len(), 2);
        assert_eq!(chart.series[0].name, "Cordoba");
        assert_eq!(chart.series[0].points, vec![Some(15.0), Some(18.0)]);
        assert_eq!(chart.y_range, Some((0.0, 72.0)));
        assert!(chart.series.iter().all(|s| s.color == Operator::Claro.color()));
    }

    #[test]
    fn missing_points_split_lines() {
        let series = Series {
            name: "x".into(),
            color: PALETTE[0],
            points: vec![Some(1.0), Some(2.0), None, Some(4.0), None],
        };
        assert_eq!(
            series.segments(),
            vec![vec![(0.0, 1.0), (1.0, 2.0)], vec![(3.0, 4.0)]]
        );
        assert_eq!(series.points_xy().len(), 3);
    }

    #[test]
    fn empty_groups_produce_no_chart() {
        assert!(province_trend(&[], Operator::Claro).is_none());
        assert!(locality_trend(&[], Operator::Claro).is_none());
        assert!(operator_province_comparison(&[]).is_none());
    }

    #[test]
    fn locality_trend_has_one_series_per_locality() {
        let groups = grouped_means(&sample_frame(), &[PROVINCE, LOCALITY], &PeriodOrder::default())
            .unwrap();
        let chart = locality_trend(&groups, Operator::Personal).unwrap();
        let names: Vec<&str> = chart.series.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Godoy Cruz", "Rio Cuarto", "Villa Maria"]);
        assert_eq!(chart.y_range, None);
    }

    #[test]
    fn comparison_keys_series_by_operator_and_province() {
        let groups =
            grouped_means(&sample_frame(), &[PROVINCE], &PeriodOrder::default()).unwrap();
        let chart = operator_province_comparison(&groups).unwrap();
        assert_eq!(chart.series.len(), 6);
        assert_eq!(chart.series[0].name, "THP Claro - Cordoba");
        assert_eq!(chart.series[5].name, "THP Movistar - Mendoza");
        assert_eq!(chart.series[5].color, Operator::Movistar.color());
    }

    #[test]
    fn table_sorts_periods_chronologically_with_nulls_last() {
        let order = PeriodOrder::default();
        let mut table = DetailTable::new(rows_from_frame(&sample_frame()).unwrap());

        table.sort_by(TableColumn::Period, false, &order);
        assert_eq!(table.rows[0].period, "ene-24");
        assert_eq!(table.rows[5].period, "feb-24");

        table.sort_by(TableColumn::Throughput(Operator::Movistar), true, &order);
        assert_eq!(table.rows[0].throughput(Operator::Movistar), Some(9.0));
        assert_eq!(table.rows[5].throughput(Operator::Movistar), None);
    }

    #[test]
    fn table_groups_sum_numeric_columns() {
        let order = PeriodOrder::default();
        let table = DetailTable::new(rows_from_frame(&sample_frame()).unwrap());
        let groups = table.group_by(TableColumn::Province, &order);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].key, "Cordoba");
        assert_eq!(groups[0].rows, 4);
        assert_eq!(groups[0].throughput[Operator::Claro as usize], 66.0);
        assert_eq!(groups[0].samples[Operator::Claro as usize], 6600);
        assert_eq!(groups[0].samples[Operator::Movistar as usize], 180);
    }
}
