//! CSV export of the detail table, in the same `;` / comma-decimal format the
//! loader reads.

use crate::data::schema::{MeasurementRow, Operator, LOCALITY, PERIOD, PROVINCE};
use polars::prelude::*;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use thiserror::Error;
use tracing::info;

pub const EXPORT_FILE_NAME: &str = "datos_thp_filtrados.csv";

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to write CSV: {0}")]
    Csv(#[from] PolarsError),
}

/// `12.5` -> `"12,5"`.
pub fn format_decimal_comma(value: f64) -> String {
    value.to_string().replace('.', ",")
}

fn text_column(name: &str, rows: &[MeasurementRow], f: impl Fn(&MeasurementRow) -> &str) -> Column {
    let values: Vec<&str> = rows.iter().map(f).collect();
    Column::new(name.into(), values)
}

/// Build the all-text frame that is written out.
fn export_frame(rows: &[MeasurementRow]) -> PolarsResult<DataFrame> {
    let mut columns = vec![
        text_column(PERIOD, rows, |r| r.period.as_str()),
        text_column(PROVINCE, rows, |r| r.province.as_str()),
        text_column(LOCALITY, rows, |r| r.locality.as_str()),
    ];
    for op in Operator::ALL {
        let thp: Vec<Option<String>> = rows
            .iter()
            .map(|r| r.throughput(op).map(format_decimal_comma))
            .collect();
        let samples: Vec<Option<String>> = rows
            .iter()
            .map(|r| r.samples(op).map(|v| v.to_string()))
            .collect();
        columns.push(Column::new(op.thp_column().into(), thp));
        columns.push(Column::new(op.samples_column().into(), samples));
    }
    DataFrame::new(columns)
}

/// Write rows as semicolon-delimited CSV with comma decimals; nulls are empty.
pub fn export_csv<W: Write>(rows: &[MeasurementRow], writer: &mut W) -> Result<(), ExportError> {
    let mut df = export_frame(rows)?;
    CsvWriter::new(writer)
        .include_header(true)
        .with_separator(b';')
        .with_quote_char(b'"')
        .finish(&mut df)?;
    Ok(())
}

pub fn export_csv_to_path(rows: &[MeasurementRow], path: &Path) -> Result<(), ExportError> {
    let mut file = File::create(path)?;
    export_csv(rows, &mut file)?;
    file.flush()?;
    info!(path = %path.display(), rows = rows.len(), "Exported CSV");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::filter::FilteredView;
    use crate::data::loader::read_measurements;
    use crate::data::schema::rows_from_frame;
    use crate::data::test_support::{frame, sample_frame};
    use std::collections::BTreeSet;

    #[test]
    fn decimals_use_commas() {
        assert_eq!(format_decimal_comma(12.5), "12,5");
        assert_eq!(format_decimal_comma(3.0), "3");
    }

    #[test]
    fn header_and_delimiter_match_input_convention() {
        let rows = rows_from_frame(&sample_frame()).unwrap();
        let mut buf = Vec::new();
        export_csv(&rows[..1], &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();

        assert_eq!(
            lines.next().unwrap(),
            "Periodo;Provincia;Localidad;THP Claro;Muestras Claro;THP Personal;Muestras Personal;THP Movistar;Muestras Movistar"
        );
        assert_eq!(lines.next().unwrap(), "feb-24;Cordoba;Rio Cuarto;12;1200;8;80;6;60");
    }

    #[test]
    fn export_round_trips_through_loader() {
        // Fractional values exercise the comma decimal path.
        let df = frame(&[
            ("ene-24", "Cordoba", "Villa Maria", [Some(20.5), Some(11.25), None], [Some(2000), Some(1234), None]),
            ("ene-24", "Cordoba", "Rio Cuarto", [Some(10.0), Some(7.0), Some(5.0)], [Some(1000), Some(70), Some(50)]),
            ("feb-24", "Cordoba", "Villa Maria", [Some(24.125), None, Some(7.0)], [Some(2400), None, Some(70)]),
            ("feb-24", "Mendoza", "Godoy Cruz", [Some(36.0), Some(12.0), Some(9.0)], [Some(3600), Some(120), Some(90)]),
        ]);

        let localities: BTreeSet<String> = ["Villa Maria".to_string()].into();
        let view = FilteredView::build(&df, "Cordoba", &localities).unwrap();
        let rows = rows_from_frame(&view.locality_rows).unwrap();
        assert_eq!(rows.len(), 2);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(EXPORT_FILE_NAME);
        export_csv_to_path(&rows, &path).unwrap();

        let reloaded = rows_from_frame(&read_measurements(&path).unwrap()).unwrap();
        assert_eq!(reloaded, rows);
        assert_eq!(reloaded[0].throughput(Operator::Personal), Some(11.25));
        assert_eq!(reloaded[0].throughput(Operator::Movistar), None);
        assert_eq!(reloaded[1].samples(Operator::Personal), None);
    }
}
