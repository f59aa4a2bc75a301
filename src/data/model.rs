use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use anyhow::{Result, bail};

// ---------------------------------------------------------------------------
// ColumnData – one column of a recording
// ---------------------------------------------------------------------------

/// Column storage mirroring the two dtypes a recording actually uses.
/// Missing numeric cells are stored as `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<f64>),
    Text(Vec<String>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnData::Numeric(_))
    }

    /// Coerce to numeric values.  Text cells that do not parse become `NaN`.
    pub fn to_numeric(&self) -> Vec<f64> {
        match self {
            ColumnData::Numeric(v) => v.clone(),
            ColumnData::Text(v) => v
                .iter()
                .map(|s| parse_number(s).unwrap_or(f64::NAN))
                .collect(),
        }
    }

    /// Infer the column type from raw cells: numeric when there is at least one
    /// row and every non-empty cell parses as a number.
    pub fn from_cells(cells: Vec<String>) -> Self {
        if cells.is_empty() {
            return ColumnData::Text(cells);
        }
        let parsed: Option<Vec<f64>> = cells
            .iter()
            .map(|s| {
                if s.is_empty() {
                    Some(f64::NAN)
                } else {
                    parse_number(s)
                }
            })
            .collect();
        match parsed {
            Some(values) => ColumnData::Numeric(values),
            None => ColumnData::Text(cells),
        }
    }
}

/// Parse a single cell.  Accepts `nan` / `inf` spellings like the float parser does.
pub fn parse_number(s: &str) -> Option<f64> {
    s.trim().parse::<f64>().ok()
}

// ---------------------------------------------------------------------------
// Column – a named column
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn numeric(name: impl Into<String>, values: Vec<f64>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Numeric(values),
        }
    }

    pub fn text(name: impl Into<String>, values: Vec<String>) -> Self {
        Self {
            name: name.into(),
            data: ColumnData::Text(values),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingTable – the complete loaded recording
// ---------------------------------------------------------------------------

/// A fully loaded recording: rows are time-ordered samples, columns are
/// named channels.  All columns have the same length.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordingTable {
    columns: Vec<Column>,
    rows: usize,
}

impl RecordingTable {
    /// Build a table, checking that every column has the same length and
    /// making duplicate names unique (`Not Used`, `Not Used.1`, ...).
    pub fn from_columns(mut columns: Vec<Column>) -> Result<Self> {
        let rows = columns.first().map(|c| c.data.len()).unwrap_or(0);
        for col in &columns {
            if col.data.len() != rows {
                bail!(
                    "column '{}' has {} rows, expected {rows}",
                    col.name,
                    col.data.len()
                );
            }
        }

        let names: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
        for (col, name) in columns.iter_mut().zip(dedupe_names(&names)) {
            col.name = name;
        }

        Ok(Self { columns, rows })
    }

    /// Build a table from a header row and raw string rows, inferring column types.
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let mut cells: Vec<Vec<String>> = vec![Vec::with_capacity(rows.len()); headers.len()];
        for (row_no, row) in rows.into_iter().enumerate() {
            if row.len() > headers.len() {
                bail!(
                    "row {row_no} has {} fields but the header has {}",
                    row.len(),
                    headers.len()
                );
            }
            let mut fields = row.into_iter();
            for column in cells.iter_mut() {
                column.push(fields.next().unwrap_or_default());
            }
        }

        let columns = headers
            .into_iter()
            .zip(cells)
            .map(|(name, cells)| Column {
                name,
                data: ColumnData::from_cells(cells),
            })
            .collect();
        Self::from_columns(columns)
    }

    pub fn row_count(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, idx: usize) -> Option<&Column> {
        self.columns.get(idx)
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }

    pub fn numeric_mask(&self) -> Vec<bool> {
        self.columns.iter().map(|c| c.data.is_numeric()).collect()
    }

    /// Replace the values of column `idx` with numeric data of the same length.
    pub fn set_numeric(&mut self, idx: usize, values: Vec<f64>) -> Result<()> {
        let rows = self.rows;
        let Some(col) = self.columns.get_mut(idx) else {
            bail!("no column at index {idx}");
        };
        if values.len() != rows {
            bail!(
                "column '{}': got {} values, expected {rows}",
                col.name,
                values.len()
            );
        }
        col.data = ColumnData::Numeric(values);
        Ok(())
    }
}

impl fmt::Display for RecordingTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} rows x {} columns", self.rows, self.columns.len())
    }
}

/// Suffix repeated names with `.1`, `.2`, ... keeping the first occurrence as is.
fn dedupe_names(names: &[String]) -> Vec<String> {
    let mut seen: BTreeMap<String, usize> = BTreeMap::new();
    let mut taken: BTreeSet<String> = names.iter().cloned().collect();
    let mut out = Vec::with_capacity(names.len());

    for name in names {
        let count = seen.entry(name.clone()).or_insert(0);
        if *count == 0 {
            *count = 1;
            out.push(name.clone());
            continue;
        }
        let mut candidate = format!("{name}.{count}");
        while taken.contains(&candidate) {
            *count += 1;
            candidate = format!("{name}.{count}");
        }
        *count += 1;
        taken.insert(candidate.clone());
        out.push(candidate);
    }
    out
}
