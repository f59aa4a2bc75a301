use std::path::{Path, PathBuf};

use thiserror::Error;

use super::model::{ColumnData, RecordingTable};

#[derive(Debug, Error)]
pub enum WriteError {
    #[error("creating output directory {}: {source}", .path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("{} has no file name", .0.display())]
    NoFileName(PathBuf),

    #[error("writing {}: {source}", .path.display())]
    Csv { path: PathBuf, source: csv::Error },
}

/// Output path for `source`: `<output_dir>/<prefix><name>`, with any
/// extension other than `.csv` replaced by `.csv`.
pub fn output_path(source: &Path, output_dir: &Path, prefix: &str) -> Result<PathBuf, WriteError> {
    let name = source
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| WriteError::NoFileName(source.to_path_buf()))?;

    let is_csv = source
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("csv"));
    let name = if is_csv {
        name.to_string()
    } else {
        let stem = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(name);
        format!("{stem}.csv")
    };

    Ok(output_dir.join(format!("{prefix}{name}")))
}

/// Write the table as CSV to `path`, creating the parent directory if needed.
/// Missing numeric values are written as empty cells.
pub fn write_csv(table: &RecordingTable, path: &Path) -> Result<(), WriteError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| WriteError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let csv_err = |source: csv::Error| WriteError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(csv_err)?;
    writer.write_record(table.column_names()).map_err(csv_err)?;

    for row in 0..table.row_count() {
        let record = table.columns().iter().map(|col| match &col.data {
            ColumnData::Numeric(v) => format_value(v[row]),
            ColumnData::Text(v) => v[row].clone(),
        });
        writer.write_record(record).map_err(csv_err)?;
    }

    writer
        .flush()
        .map_err(|e| csv_err(csv::Error::from(e)))?;
    Ok(())
}

fn format_value(v: f64) -> String {
    if v.is_nan() {
        String::new()
    } else {
        v.to_string()
    }
}
