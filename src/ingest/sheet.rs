//! Raw sheet access for the ingest pipeline.
//!
//! CSV and XLSX sources are lowered to the same shape: lowercased headers
//! plus column-major string cells. All numeric interpretation happens in
//! the pipeline, so a cell that fails to parse is reported with its row
//! and column.

use crate::error::GrowthError;
use crate::GrowthResult;
use calamine::{open_workbook_auto, Data, Reader};
use polars::prelude::*;
use std::path::Path;

/// One raw worksheet: headers plus column-major cells. Empty cells are
/// empty strings.
#[derive(Debug, Clone)]
pub(crate) struct RawSheet {
    pub headers: Vec<String>,
    pub columns: Vec<Vec<String>>,
}

impl RawSheet {
    pub fn n_rows(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    /// Index of a header, if present.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Parse one cell as f64, naming the offending cell on failure.
    pub fn f64_cell(&self, col: usize, row: usize) -> GrowthResult<f64> {
        let raw = self.columns[col][row].trim();
        raw.parse::<f64>().map_err(|_| {
            GrowthError::invalid_input(format!(
                "cannot parse '{}' column '{}' at row {} as a number",
                raw,
                self.headers[col],
                row + 2
            ))
        })
    }

    /// Read a CSV file. All cells arrive as strings; interpretation is
    /// deferred to the pipeline.
    pub fn from_csv(path: &Path) -> GrowthResult<RawSheet> {
        let df = CsvReadOptions::default()
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .try_into_reader_with_file_path(Some(path.to_path_buf()))?
            .finish()?;

        let headers: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|name| name.trim().to_lowercase())
            .collect();

        let mut columns = Vec::with_capacity(headers.len());
        for column in df.get_columns() {
            let cells = column
                .str()?
                .into_iter()
                .map(|cell| cell.unwrap_or("").trim().to_string())
                .collect();
            columns.push(cells);
        }

        Ok(RawSheet { headers, columns })
    }

    /// Read the first worksheet of an XLSX/XLS file.
    pub fn from_xlsx(path: &Path) -> GrowthResult<RawSheet> {
        let mut workbook = open_workbook_auto(path).map_err(|e| {
            GrowthError::invalid_input(format!("failed to open workbook {path:?}: {e}"))
        })?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| GrowthError::invalid_input(format!("{path:?} has no worksheets")))?
            .map_err(|e| GrowthError::invalid_input(format!("failed to read {path:?}: {e}")))?;

        if range.is_empty() {
            return Err(GrowthError::invalid_input(format!(
                "first worksheet of {path:?} is empty"
            )));
        }

        // Headers run until the first empty cell in row 0.
        let mut headers = Vec::new();
        let mut col = 0usize;
        loop {
            match range.get((0, col)) {
                Some(Data::String(s)) if !s.trim().is_empty() => {
                    headers.push(s.trim().to_lowercase())
                }
                Some(Data::Empty) | None => break,
                Some(other) => headers.push(other.to_string().trim().to_lowercase()),
            }
            col += 1;
        }
        if headers.is_empty() {
            return Err(GrowthError::invalid_input(format!(
                "header row of {path:?} is empty"
            )));
        }

        // Rows run until the first all-empty row.
        let mut columns: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        let mut row = 1usize;
        loop {
            let mut row_cells = Vec::with_capacity(headers.len());
            let mut has_data = false;

            for col in 0..headers.len() {
                let cell = match range.get((row, col)) {
                    Some(Data::Float(f)) => f.to_string(),
                    Some(Data::Int(v)) => v.to_string(),
                    Some(Data::String(s)) => s.trim().to_string(),
                    Some(Data::Bool(b)) => (if *b { "1" } else { "0" }).to_string(),
                    Some(Data::Empty) | None => String::new(),
                    Some(other) => other.to_string().trim().to_string(),
                };
                if !cell.is_empty() {
                    has_data = true;
                }
                row_cells.push(cell);
            }

            if !has_data {
                break;
            }
            for (col, cell) in row_cells.into_iter().enumerate() {
                columns[col].push(cell);
            }
            row += 1;
        }

        Ok(RawSheet { headers, columns })
    }
}

// ================================================
// UNIT TESTS
// ================================================
#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn temp_csv(name: &str, body: &str) -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("growthstandards-sheet-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_csv_headers_are_lowercased() {
        let path = temp_csv(
            "who-child_growth-weight-m.csv",
            "Day,L,M,S\n0,0.3,3.3,0.14\n1,0.3,3.32,0.14\n",
        );
        let sheet = RawSheet::from_csv(&path).unwrap();
        assert_eq!(sheet.headers, vec!["day", "l", "m", "s"]);
        assert_eq!(sheet.n_rows(), 2);
        assert_eq!(sheet.f64_cell(2, 1).unwrap(), 3.32);
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_bad_cell_reports_row_and_column() {
        let path = temp_csv(
            "who-child_growth-stature-f.csv",
            "day,l,m,s\n0,1,49.9,abc\n",
        );
        let sheet = RawSheet::from_csv(&path).unwrap();
        let err = sheet.f64_cell(3, 0).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("'s'"), "unexpected message: {msg}");
        assert!(msg.contains("abc"), "unexpected message: {msg}");
        fs::remove_file(path).ok();
    }
}
