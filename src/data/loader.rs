use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, Float32Array, Float64Array, Int32Array, Int64Array};
use arrow::datatypes::DataType;
use arrow::util::display::array_value_to_string;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;

use super::model::{Column, ColumnData, RecordingTable};

/// OpenBCI GUI writes its metadata block as lines starting with this byte.
const METADATA_MARKER: u8 = b'%';

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a recording from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv` / `.txt` – comma-separated table, `%` metadata lines skipped (OpenBCI GUI raw export)
/// * `.parquet`      – flat table of numeric and text columns
///
/// A file without data rows is rejected.
pub fn load_file(path: &Path) -> Result<RecordingTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" | "txt" => load_csv(path)?,
        "parquet" | "pq" => load_parquet(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };

    if table.is_empty() {
        bail!("{} contains no data rows", path.display());
    }
    Ok(table)
}

// ---------------------------------------------------------------------------
// CSV / OpenBCI text loader
// ---------------------------------------------------------------------------

/// CSV layout: optional `%`-prefixed metadata lines, then a header row with
/// channel names, then one sample per row.  Surrounding whitespace (OpenBCI
/// pads every field with a space) is trimmed.
fn load_csv(path: &Path) -> Result<RecordingTable> {
    let mut reader = csv::ReaderBuilder::new()
        .comment(Some(METADATA_MARKER))
        .trim(csv::Trim::All)
        .flexible(true)
        .from_path(path)
        .context("opening CSV")?;

    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        bail!("CSV has no header row");
    }

    let mut rows = Vec::new();
    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        rows.push(record.iter().map(|f| f.to_string()).collect::<Vec<_>>());
    }

    RecordingTable::from_rows(headers, rows)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet recording.
///
/// Integer and float columns become numeric (nulls → `NaN`); every other
/// column type is rendered to text (nulls → empty).  Works with files written
/// by both **Pandas** and **Polars**, and by the bundled sample generator.
fn load_parquet(path: &Path) -> Result<RecordingTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;

    let fields: Vec<(String, DataType)> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| (f.name().clone(), f.data_type().clone()))
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut columns: Vec<ColumnData> = fields
        .iter()
        .map(|(_, dt)| {
            if is_numeric_type(dt) {
                ColumnData::Numeric(Vec::new())
            } else {
                ColumnData::Text(Vec::new())
            }
        })
        .collect();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        for (col_idx, column) in columns.iter_mut().enumerate() {
            let array = batch.column(col_idx);
            match column {
                ColumnData::Numeric(values) => {
                    values.extend(extract_f64(array).with_context(|| {
                        format!("column '{}'", fields[col_idx].0)
                    })?);
                }
                ColumnData::Text(values) => {
                    for row in 0..array.len() {
                        if array.is_null(row) {
                            values.push(String::new());
                        } else {
                            values.push(array_value_to_string(array, row).with_context(|| {
                                format!("column '{}', row {row}", fields[col_idx].0)
                            })?);
                        }
                    }
                }
            }
        }
    }

    let columns = fields
        .into_iter()
        .zip(columns)
        .map(|((name, _), data)| Column { name, data })
        .collect();
    RecordingTable::from_columns(columns)
}

// -- Parquet / Arrow helpers --

fn is_numeric_type(dt: &DataType) -> bool {
    matches!(
        dt,
        DataType::Float32 | DataType::Float64 | DataType::Int32 | DataType::Int64
    )
}

/// Extract all values of a numeric column as `f64`, mapping nulls to `NaN`.
fn extract_f64(col: &Arc<dyn Array>) -> Result<Vec<f64>> {
    let any = col.as_any();
    let values: Vec<f64> = if let Some(arr) = any.downcast_ref::<Float64Array>() {
        arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect()
    } else if let Some(arr) = any.downcast_ref::<Float32Array>() {
        arr.iter().map(|v| v.map_or(f64::NAN, f64::from)).collect()
    } else if let Some(arr) = any.downcast_ref::<Int64Array>() {
        arr.iter().map(|v| v.map_or(f64::NAN, |i| i as f64)).collect()
    } else if let Some(arr) = any.downcast_ref::<Int32Array>() {
        arr.iter().map(|v| v.map_or(f64::NAN, f64::from)).collect()
    } else {
        bail!("expected a numeric column, got {:?}", col.data_type());
    };
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use arrow::array::StringArray;
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    fn write_file(dir: &Path, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn reads_openbci_text_with_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            dir.path(),
            "OpenBCI-RAW-2026.txt",
            "%OpenBCI Raw EXG Data\n%Number of channels = 8\n%Sample Rate = 250 Hz\n\
             Sample Index, EXG Channel 0, Timestamp (Formatted)\n\
             0, 1.5, 2026-01-01 10:00:00.000\n\
             1, -2.25, 2026-01-01 10:00:00.004\n",
        );

        let table = load_file(&path).unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(
            table.column_names(),
            vec!["Sample Index", "EXG Channel 0", "Timestamp (Formatted)"]
        );
        assert_eq!(table.numeric_mask(), vec![true, true, false]);
        assert_eq!(
            table.columns()[1].data,
            ColumnData::Numeric(vec![1.5, -2.25])
        );
    }

    #[test]
    fn header_only_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "empty.csv", "a,b\n");
        let err = load_file(&path).unwrap_err();
        assert!(err.to_string().contains("no data rows"));
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "notes.md", "a,b\n1,2\n");
        let err = load_file(&path).unwrap_err();
        assert!(err.to_string().contains("Unsupported file extension"));
    }

    #[test]
    fn overlong_row_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(dir.path(), "bad.csv", "a,b\n1,2\n1,2,3\n");
        assert!(load_file(&path).is_err());
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_file(&dir.path().join("absent.csv")).is_err());
    }

    #[test]
    fn reads_parquet_numeric_and_text_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.parquet");

        let schema = Arc::new(Schema::new(vec![
            Field::new("Sample Index", DataType::Int64, false),
            Field::new("EXG Channel 0", DataType::Float64, true),
            Field::new("Note", DataType::Utf8, true),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(Int64Array::from(vec![0, 1, 2])),
                Arc::new(Float64Array::from(vec![Some(1.0), None, Some(3.0)])),
                Arc::new(StringArray::from(vec![Some("a"), None, Some("c")])),
            ],
        )
        .unwrap();
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let table = load_file(&path).unwrap();
        assert_eq!(table.row_count(), 3);
        assert_eq!(table.numeric_mask(), vec![true, true, false]);
        let ColumnData::Numeric(eeg) = &table.columns()[1].data else {
            panic!("expected numeric column");
        };
        assert_eq!(eeg[0], 1.0);
        assert!(eeg[1].is_nan());
        assert_eq!(
            table.columns()[2].data,
            ColumnData::Text(vec!["a".into(), String::new(), "c".into()])
        );
    }
}
