//! CSV Data Loader Module
//! Reads the crime CSV with Polars and hands back string records.

use super::record::{Dataset, Record};
use polars::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("CSV file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Failed to load CSV: {0}")]
    Csv(#[from] PolarsError),
    #[error("Column '{column}' missing from {}", .path.display())]
    MissingColumn { column: String, path: PathBuf },
    #[error("CSV file has no rows: {}", .0.display())]
    Empty(PathBuf),
}

/// Loads CSV files into immutable [`Dataset`]s.
pub struct DataLoader;

impl DataLoader {
    /// Load a CSV file. Every column is read as a string; empty cells become `""`.
    pub fn load_csv(path: &Path) -> Result<Dataset, LoadError> {
        if !path.is_file() {
            return Err(LoadError::NotFound(path.to_path_buf()));
        }

        // Schema inference off: a year like 2018 must stay "2018", not 2018i64
        let df = LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(0))
            .finish()?
            .collect()?;

        if df.height() == 0 {
            return Err(LoadError::Empty(path.to_path_buf()));
        }

        let dataset = Self::dataset_from_frame(&df)?;
        info!(
            "Loaded {} rows, {} columns from {}",
            dataset.len(),
            dataset.columns().len(),
            path.display()
        );
        Ok(dataset)
    }

    /// Load and check that every column in `required` is present.
    pub fn load_with_columns(path: &Path, required: &[&str]) -> Result<Dataset, LoadError> {
        let dataset = Self::load_csv(path)?;
        dataset
            .require_columns(required)
            .map_err(|missing| LoadError::MissingColumn {
                column: missing.to_string(),
                path: path.to_path_buf(),
            })?;
        Ok(dataset)
    }

    fn dataset_from_frame(df: &DataFrame) -> Result<Dataset, LoadError> {
        let columns: Vec<String> = df
            .get_column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();

        let mut rows: Vec<Vec<(String, String)>> = vec![Vec::new(); df.height()];

        for column in df.get_columns() {
            let name = column.name().to_string();
            let as_str = column.cast(&DataType::String)?;
            let values = as_str.str()?;

            for (row, value) in rows.iter_mut().zip(values.into_iter()) {
                row.push((name.clone(), value.unwrap_or("").to_string()));
            }
        }
        debug!("Converted {} columns to records", columns.len());

        let records = rows.into_iter().map(Record::from_pairs).collect();
        Ok(Dataset::new(columns, records))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_keeps_values_as_strings() {
        let file = write_csv("district,shooting,year,amount\nA,Y,2018,3\nB,,2017,4.5\n");
        let dataset = DataLoader::load_csv(file.path()).unwrap();

        assert_eq!(dataset.columns(), &["district", "shooting", "year", "amount"]);
        assert_eq!(dataset.len(), 2);

        let first = &dataset.records()[0];
        assert_eq!(first.get("district"), Some("A"));
        assert_eq!(first.get("year"), Some("2018"));

        let second = &dataset.records()[1];
        assert_eq!(second.get("shooting"), Some(""));
        assert_eq!(second.get("amount"), Some("4.5"));
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = DataLoader::load_csv(Path::new("/no/such/dir/crime.csv")).unwrap_err();
        assert!(matches!(err, LoadError::NotFound(_)));
    }

    #[test]
    fn test_header_only_csv_is_empty() {
        let file = write_csv("district,shooting,year,amount\n");
        let err = DataLoader::load_csv(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::Empty(_)));
    }

    #[test]
    fn test_ragged_rows_are_a_csv_error() {
        let file = write_csv("district,shooting,year\nA,Y,2018\nB,,2017,4.5,extra\n");
        let err = DataLoader::load_csv(file.path()).unwrap_err();
        assert!(matches!(err, LoadError::Csv(_)), "unexpected error: {err}");
    }

    #[test]
    fn test_required_column_missing() {
        let file = write_csv("district,year\nA,2018\n");
        let err = DataLoader::load_with_columns(file.path(), &["district", "shooting"]).unwrap_err();
        match err {
            LoadError::MissingColumn { column, .. } => assert_eq!(column, "shooting"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_fixture_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/crime_sample.csv");
        let dataset =
            DataLoader::load_with_columns(&path, &["district", "shooting", "year", "amount"])
                .unwrap();
        assert_eq!(dataset.len(), 10);
        assert_eq!(dataset.distinct_values("district"), vec!["B2", "D4", "C11"]);
    }
}
