//! Tabular file loading and saving
//!
//! All tables in the pipeline are CSV files with a header row. Raw datasets
//! may mix numeric and string columns; processed tables are numeric only.

use crate::artifacts::{ensure_parent, require};
use crate::error::{PipelineError, Result};
use ndarray::{Array1, Array2};
use polars::prelude::*;
use std::path::Path;

/// Load a CSV file with a header row.
///
/// The whole file is scanned for schema inference so a string value late in
/// a column still makes that column categorical.
pub fn load_csv(path: &Path) -> Result<DataFrame> {
    require(path)?;

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(None)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;

    Ok(df)
}

/// Write a frame as CSV, replacing any previous file.
pub fn save_csv(path: &Path, df: &mut DataFrame) -> Result<()> {
    ensure_parent(path)?;
    let mut file = std::fs::File::create(path)?;
    CsvWriter::new(&mut file).include_header(true).finish(df)?;
    Ok(())
}

/// Column names of a frame, in order
pub fn column_names(df: &DataFrame) -> Vec<String> {
    df.get_column_names().iter().map(|s| s.to_string()).collect()
}

/// Values of a column cast to `f64`, nulls preserved as `None`.
pub fn float_values(series: &Series) -> Result<Vec<Option<f64>>> {
    let casted = series
        .cast(&DataType::Float64)
        .map_err(|e| PipelineError::DataError(format!("column '{}': {}", series.name(), e)))?;
    let values = casted
        .f64()
        .map_err(|e| PipelineError::DataError(e.to_string()))?
        .into_iter()
        .collect();
    Ok(values)
}

/// Values of a column cast to `f64`; any null is an error.
pub fn dense_values(series: &Series) -> Result<Vec<f64>> {
    float_values(series)?
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| {
                PipelineError::DataError(format!("column '{}' has a missing value at row {}", series.name(), row))
            })
        })
        .collect()
}

/// Extract every column of a fully numeric frame into a row-major `Array2<f64>`.
pub fn frame_to_array2(df: &DataFrame) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = df.width();

    let col_data: Vec<Vec<f64>> = df
        .get_columns()
        .iter()
        .map(|column| dense_values(column.as_materialized_series()))
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| col_refs[c][r]))
}

/// Build a frame from a row-major matrix and its column names.
pub fn array2_to_frame(names: &[String], values: &Array2<f64>) -> Result<DataFrame> {
    if names.len() != values.ncols() {
        return Err(PipelineError::ShapeMismatch {
            expected: format!("{} column names", values.ncols()),
            actual: format!("{} column names", names.len()),
        });
    }

    let columns: Vec<Column> = names
        .iter()
        .zip(values.columns())
        .map(|(name, col)| Series::new(name.as_str().into(), col.to_vec()).into())
        .collect();

    Ok(DataFrame::new(columns)?)
}

/// Build a single-column frame from a vector.
pub fn array1_to_frame(name: &str, values: &Array1<f64>) -> Result<DataFrame> {
    let column: Column = Series::new(name.into(), values.to_vec()).into();
    Ok(DataFrame::new(vec![column])?)
}

/// Read a processed feature table: column names plus the dense matrix.
pub fn read_feature_table(path: &Path) -> Result<(Vec<String>, Array2<f64>)> {
    let df = load_csv(path)?;
    let names = column_names(&df);
    let x = frame_to_array2(&df)?;
    Ok((names, x))
}

/// Read a processed target table; the first column holds the target.
pub fn read_target_table(path: &Path) -> Result<Array1<f64>> {
    let df = load_csv(path)?;
    let column = df
        .get_columns()
        .first()
        .ok_or_else(|| PipelineError::DataError(format!("{} has no columns", path.display())))?;
    Ok(Array1::from_vec(dense_values(column.as_materialized_series())?))
}
