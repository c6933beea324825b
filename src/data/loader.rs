//! CSV Data Loader Module
//! Reads the semicolon-delimited THP export with Polars, normalizes the
//! locale-formatted numbers and caches parsed tables by file path.

use crate::data::schema::{Operator, KEY_COLUMNS, TABLE_COLUMNS};
use polars::prelude::*;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("File not found: {0}")]
    NotFound(PathBuf),
    #[error("Failed to load CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("Missing column '{column}' in {path}")]
    MissingColumn { column: String, path: PathBuf },
}

/// Parse a throughput cell written with a comma decimal separator.
///
/// `"12,5"` becomes `12.5`. Anything that is not a finite number after the
/// separator swap (including `NaN` and `inf`) yields `None`.
pub fn parse_throughput(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }
    s.replace(',', ".").parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parse a sample count that may carry thousands separators (`1.234`,
/// `1,234`, `1 234`).
pub fn parse_samples(raw: &str) -> Option<i64> {
    let s: String = raw
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '.' | ' ' | '\u{a0}'))
        .collect();
    if s.is_empty() {
        return None;
    }
    s.parse::<i64>().ok()
}

fn text_column(df: &DataFrame, name: &str) -> PolarsResult<Column> {
    let values: Vec<Option<String>> = df
        .column(name)?
        .as_materialized_series()
        .str()?
        .into_iter()
        .map(|v| v.map(|s| s.trim().to_string()))
        .collect();
    Ok(Column::new(name.into(), values))
}

fn throughput_column(df: &DataFrame, name: &str) -> PolarsResult<Column> {
    let values: Vec<Option<f64>> = df
        .column(name)?
        .as_materialized_series()
        .str()?
        .into_iter()
        .map(|v| v.and_then(parse_throughput))
        .collect();
    Ok(Column::new(name.into(), values))
}

fn samples_column(df: &DataFrame, name: &str) -> PolarsResult<Column> {
    let values: Vec<Option<i64>> = df
        .column(name)?
        .as_materialized_series()
        .str()?
        .into_iter()
        .map(|v| v.and_then(parse_samples))
        .collect();
    Ok(Column::new(name.into(), values))
}

/// Turn the all-text frame into typed columns.
///
/// Cells that fail numeric coercion become null; only the required columns
/// are kept, in detail table order. Extra columns are dropped.
pub fn normalize_measurements(raw: &DataFrame) -> PolarsResult<DataFrame> {
    let mut columns = Vec::with_capacity(TABLE_COLUMNS.len());
    for name in KEY_COLUMNS {
        columns.push(text_column(raw, name)?);
    }
    for op in Operator::ALL {
        columns.push(throughput_column(raw, op.thp_column())?);
        columns.push(samples_column(raw, op.samples_column())?);
    }
    DataFrame::new(columns)
}

/// Read and normalize a measurements file.
pub fn read_measurements(path: &Path) -> Result<DataFrame, LoaderError> {
    if !path.exists() {
        return Err(LoaderError::NotFound(path.to_path_buf()));
    }

    // Every column as text: numbers are locale formatted and parsed below.
    let raw = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .map_parse_options(|opts| {
            opts.with_separator(b';')
                .with_encoding(CsvEncoding::Utf8)
        })
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    let present: Vec<String> = raw
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    if let Some(missing) = TABLE_COLUMNS
        .iter()
        .find(|c| !present.iter().any(|p| p == *c))
    {
        return Err(LoaderError::MissingColumn {
            column: missing.to_string(),
            path: path.to_path_buf(),
        });
    }

    let df = normalize_measurements(&raw)?;
    info!(path = %path.display(), rows = df.height(), "Loaded measurements");
    Ok(df)
}

/// Memoizing loader: one parsed table per file path.
///
/// Entries are never refreshed on their own; a changed file is only re-read
/// after [`DataCache::invalidate`].
#[derive(Default)]
pub struct DataCache {
    tables: HashMap<PathBuf, Arc<DataFrame>>,
}

impl DataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached table for `path`, parsing it on first use.
    pub fn load(&mut self, path: &Path) -> Result<Arc<DataFrame>, LoaderError> {
        if let Some(df) = self.tables.get(path) {
            debug!(path = %path.display(), "Cache hit");
            return Ok(Arc::clone(df));
        }

        let df = Arc::new(read_measurements(path)?);
        self.tables.insert(path.to_path_buf(), Arc::clone(&df));
        Ok(df)
    }

    pub fn invalidate(&mut self, path: &Path) {
        self.tables.remove(path);
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::schema::rows_from_frame;
    use std::io::Write;

    const HEADER: &str = "Periodo;Provincia;Localidad;THP Claro;THP Personal;THP Movistar;Muestras Claro;Muestras Personal;Muestras Movistar";

    fn write_csv(dir: &tempfile::TempDir, name: &str, body: &str) -> PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        file.write_all(body.as_bytes()).unwrap();
        path
    }

    #[test]
    fn throughput_uses_comma_decimal() {
        assert_eq!(parse_throughput("12,5"), Some(12.5));
        assert_eq!(parse_throughput(" 3 "), Some(3.0));
        assert_eq!(parse_throughput("0,75"), Some(0.75));
    }

    #[test]
    fn throughput_garbage_is_null() {
        assert_eq!(parse_throughput(""), None);
        assert_eq!(parse_throughput("s/d"), None);
        assert_eq!(parse_throughput("1.234,5"), None);
        assert_eq!(parse_throughput("NaN"), None);
        assert_eq!(parse_throughput("inf"), None);
        assert_eq!(parse_throughput("-infinity"), None);
        assert_eq!(parse_throughput("1e400"), None);
    }

    #[test]
    fn samples_strip_thousands_separators() {
        assert_eq!(parse_samples("1.234"), Some(1234));
        assert_eq!(parse_samples("1,234"), Some(1234));
        assert_eq!(parse_samples("12 345"), Some(12345));
        assert_eq!(parse_samples("987"), Some(987));
    }

    #[test]
    fn samples_garbage_is_null() {
        assert_eq!(parse_samples(""), None);
        assert_eq!(parse_samples("n/a"), None);
        assert_eq!(parse_samples("12,5k"), None);
    }

    #[test]
    fn read_normalizes_numeric_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(
            &dir,
            "thp.csv",
            "ene-24;Cordoba;Rio Cuarto;12,5;8,25;x;1.234;56;\nfeb-24;Cordoba;Villa Maria;;10;9,5;2,000;abc;7\n",
        );

        let df = read_measurements(&path).unwrap();
        assert_eq!(df.height(), 2);

        let rows = rows_from_frame(&df).unwrap();
        assert_eq!(rows[0].period, "ene-24");
        assert_eq!(rows[0].throughput(Operator::Claro), Some(12.5));
        assert_eq!(rows[0].throughput(Operator::Personal), Some(8.25));
        assert_eq!(rows[0].throughput(Operator::Movistar), None);
        assert_eq!(rows[0].samples(Operator::Claro), Some(1234));
        assert_eq!(rows[0].samples(Operator::Movistar), None);
        assert_eq!(rows[1].throughput(Operator::Claro), None);
        assert_eq!(rows[1].samples(Operator::Claro), Some(2000));
        assert_eq!(rows[1].samples(Operator::Personal), None);
        assert_eq!(rows[1].samples(Operator::Movistar), Some(7));
    }

    #[test]
    fn missing_file_is_reported() {
        let err = read_measurements(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, LoaderError::NotFound(_)));
    }

    #[test]
    fn missing_column_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.csv");
        std::fs::write(&path, "Periodo;Provincia\nene-24;Cordoba\n").unwrap();

        let err = read_measurements(&path).unwrap_err();
        match err {
            LoaderError::MissingColumn { column, .. } => assert_eq!(column, "Localidad"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn cache_returns_same_table_without_rereading() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv(&dir, "thp.csv", "ene-24;Cordoba;Rio Cuarto;1;2;3;4;5;6\n");

        let mut cache = DataCache::new();
        let first = cache.load(&path).unwrap();

        // Deleting the file proves the second call never touches the disk.
        std::fs::remove_file(&path).unwrap();
        let second = cache.load(&path).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        cache.invalidate(&path);
        assert_eq!(cache.len(), 0);
        assert!(matches!(cache.load(&path), Err(LoaderError::NotFound(_))));
    }
}
