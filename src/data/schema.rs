//! Column names, operators and the typed measurement row.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

pub const PERIOD: &str = "Periodo";
pub const PROVINCE: &str = "Provincia";
pub const LOCALITY: &str = "Localidad";

/// Text columns that identify a measurement row.
pub const KEY_COLUMNS: [&str; 3] = [PERIOD, PROVINCE, LOCALITY];

/// Simple RGB triple shared by the egui and plotters front ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// Mobile operators present in the report.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Operator {
    #[default]
    Claro,
    Personal,
    Movistar,
}

impl Operator {
    pub const ALL: [Operator; 3] = [Operator::Claro, Operator::Personal, Operator::Movistar];

    pub fn name(self) -> &'static str {
        match self {
            Operator::Claro => "Claro",
            Operator::Personal => "Personal",
            Operator::Movistar => "Movistar",
        }
    }

    /// Throughput column, also used as the series label.
    pub fn thp_column(self) -> &'static str {
        match self {
            Operator::Claro => "THP Claro",
            Operator::Personal => "THP Personal",
            Operator::Movistar => "THP Movistar",
        }
    }

    pub fn samples_column(self) -> &'static str {
        match self {
            Operator::Claro => "Muestras Claro",
            Operator::Personal => "Muestras Personal",
            Operator::Movistar => "Muestras Movistar",
        }
    }

    /// Fixed color, identical in every chart.
    pub fn color(self) -> Rgb {
        match self {
            Operator::Claro => Rgb(255, 0, 0),        // red
            Operator::Personal => Rgb(0, 0, 255),     // blue
            Operator::Movistar => Rgb(173, 216, 230), // light blue
        }
    }
}

/// Required header columns, in detail table and export order.
pub const TABLE_COLUMNS: [&str; 9] = [
    PERIOD,
    PROVINCE,
    LOCALITY,
    "THP Claro",
    "Muestras Claro",
    "THP Personal",
    "Muestras Personal",
    "THP Movistar",
    "Muestras Movistar",
];

/// One record per (period, province, locality).
#[derive(Debug, Clone, PartialEq)]
pub struct MeasurementRow {
    pub period: String,
    pub province: String,
    pub locality: String,
    pub throughput: [Option<f64>; 3],
    pub samples: [Option<i64>; 3],
}

impl MeasurementRow {
    pub fn throughput(&self, op: Operator) -> Option<f64> {
        self.throughput[op as usize]
    }

    pub fn samples(&self, op: Operator) -> Option<i64> {
        self.samples[op as usize]
    }
}

fn str_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<String>> {
    Ok(df
        .column(name)?
        .as_materialized_series()
        .str()?
        .into_iter()
        .map(|v| v.unwrap_or_default().to_string())
        .collect())
}

fn f64_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<f64>>> {
    Ok(df
        .column(name)?
        .as_materialized_series()
        .f64()?
        .into_iter()
        .collect())
}

fn i64_values(df: &DataFrame, name: &str) -> PolarsResult<Vec<Option<i64>>> {
    Ok(df
        .column(name)?
        .as_materialized_series()
        .i64()?
        .into_iter()
        .collect())
}

/// Materialize a normalized frame into typed rows.
pub fn rows_from_frame(df: &DataFrame) -> PolarsResult<Vec<MeasurementRow>> {
    let periods = str_values(df, PERIOD)?;
    let provinces = str_values(df, PROVINCE)?;
    let localities = str_values(df, LOCALITY)?;

    let mut thp = Vec::with_capacity(3);
    let mut samples = Vec::with_capacity(3);
    for op in Operator::ALL {
        thp.push(f64_values(df, op.thp_column())?);
        samples.push(i64_values(df, op.samples_column())?);
    }

    let rows = periods
        .into_iter()
        .zip(provinces)
        .zip(localities)
        .enumerate()
        .map(|(i, ((period, province), locality))| MeasurementRow {
            period,
            province,
            locality,
            throughput: [thp[0][i], thp[1][i], thp[2][i]],
            samples: [samples[0][i], samples[1][i], samples[2][i]],
        })
        .collect();

    Ok(rows)
}
