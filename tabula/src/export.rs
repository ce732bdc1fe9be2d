//! CSV export of a filtered, ordered table view.
//!
//! Cells that read as euro-style numbers are rewritten for machine consumption
//! (`1.234,50` becomes `1234.50`); everything else is written as stored.

use std::io::Write;

use tracing::debug;

use crate::error::Result;
use crate::numeric::{format_export_number, parse_euro_strict};
use crate::schema::Column;
use crate::store::{Row, Value};

/// A cell prepared for export.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportCell {
    Empty,
    Number(f64),
    Text(String),
}

impl ExportCell {
    pub fn render(&self) -> String {
        match self {
            ExportCell::Empty => String::new(),
            ExportCell::Number(n) => format_export_number(*n),
            ExportCell::Text(s) => s.clone(),
        }
    }
}

/// Normalizes one stored value for export.
///
/// ```rust
/// use tabula::export::{normalize_for_export, ExportCell};
/// use tabula::store::Value;
///
/// assert_eq!(normalize_for_export(&Value::from("1.234,50")), ExportCell::Number(1234.5));
/// assert_eq!(normalize_for_export(&Value::from("Obras")).render(), "Obras");
/// assert_eq!(normalize_for_export(&Value::Integer(12)).render(), "12.00");
/// ```
pub fn normalize_for_export(value: &Value) -> ExportCell {
    if value.is_null() {
        return ExportCell::Empty;
    }
    let text = value.as_text();
    match parse_euro_strict(&text) {
        Some(number) => ExportCell::Number(number),
        None => ExportCell::Text(text.into_owned()),
    }
}

/// Writes a header of column names followed by every row. Returns the row count.
pub fn write_csv<W: Write>(writer: W, columns: &[Column], rows: &[Row]) -> Result<usize> {
    let mut csv = csv::Writer::from_writer(writer);
    csv.write_record(columns.iter().map(|c| c.name.as_str()))?;

    for row in rows {
        let record: Vec<String> = columns
            .iter()
            .map(|c| {
                row.get(&c.name)
                    .map(normalize_for_export)
                    .unwrap_or(ExportCell::Empty)
                    .render()
            })
            .collect();
        csv.write_record(&record)?;
    }
    csv.flush()?;

    debug!(rows = rows.len(), "csv written");
    Ok(rows.len())
}

/// Default export file name for `table`: unsafe characters dropped, spaces as `_`.
///
/// ```rust
/// assert_eq!(tabula::export::export_file_name("Obras 2024/25"), "_Obras_202425_export.csv");
/// assert_eq!(tabula::export::export_file_name("¿?"), "_export_export.csv");
/// ```
pub fn export_file_name(table: &str) -> String {
    let safe: String = table
        .trim()
        .replace(' ', "_")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        .collect();
    let safe = if safe.is_empty() { "export" } else { safe.as_str() };
    format!("_{safe}_export.csv")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns(names: &[&str]) -> Vec<Column> {
        names
            .iter()
            .map(|n| Column {
                name: n.to_string(),
                declared_type: String::new(),
            })
            .collect()
    }

    #[test]
    fn test_normalize_cells() {
        assert_eq!(normalize_for_export(&Value::Null), ExportCell::Empty);
        assert_eq!(
            normalize_for_export(&Value::from("10.000,00")).render(),
            "10000.00"
        );
        // dot-decimal text is not euro-style and stays as stored
        assert_eq!(normalize_for_export(&Value::from("1234.5")).render(), "1234.5");
        assert_eq!(
            normalize_for_export(&Value::from("Adxudicado 15/03/2024")).render(),
            "Adxudicado 15/03/2024"
        );
    }

    #[test]
    fn test_write_csv_quotes_and_normalizes() {
        let cols = columns(&["Expediente", "Importe", "Objeto"]);
        let rows = vec![
            Row::new(vec![
                ("Expediente".into(), Value::from("EXP-1")),
                ("Importe".into(), Value::from("1.234,50")),
                ("Objeto".into(), Value::from("Rúa, beirarrúas")),
            ]),
            Row::new(vec![
                ("Expediente".into(), Value::from("EXP-2")),
                ("Importe".into(), Value::Null),
                ("Objeto".into(), Value::from("Limpeza")),
            ]),
        ];

        let mut out = Vec::new();
        let written = write_csv(&mut out, &cols, &rows).unwrap();
        assert_eq!(written, 2);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "Expediente,Importe,Objeto\nEXP-1,1234.50,\"Rúa, beirarrúas\"\nEXP-2,,Limpeza\n"
        );
    }
}
