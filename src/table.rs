use csv::{ReaderBuilder, Trim, WriterBuilder};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use crate::constants::MISSING_VALUE_TOKENS;
use crate::error::{CleanerError, Result};

/// A single typed cell in a record table
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Null,
    Int(i64),
    Float(f64),
    Text(String),
}

impl CellValue {
    /// Interpret a raw CSV field, mapping the standard missing tokens to `Null`
    pub fn from_raw(field: &str) -> Self {
        if MISSING_VALUE_TOKENS.contains(&field) {
            CellValue::Null
        } else {
            CellValue::Text(field.to_string())
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, CellValue::Null)
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            CellValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CellValue::Float(v) => Some(*v),
            CellValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            CellValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }

    /// Convert to an integer, or `Null` if the value has no integral reading
    fn to_integer(&self) -> CellValue {
        match self {
            CellValue::Null => CellValue::Null,
            CellValue::Int(v) => CellValue::Int(*v),
            CellValue::Float(v) => integral(*v),
            CellValue::Text(s) => {
                let trimmed = s.trim();
                if let Ok(v) = trimmed.parse::<i64>() {
                    CellValue::Int(v)
                } else {
                    trimmed.parse::<f64>().map(integral).unwrap_or(CellValue::Null)
                }
            }
        }
    }

    /// Convert to a finite real number, or `Null` (NaN and infinities included)
    fn to_numeric(&self) -> CellValue {
        match self {
            CellValue::Null => CellValue::Null,
            CellValue::Int(v) => CellValue::Float(*v as f64),
            CellValue::Float(v) if v.is_finite() => CellValue::Float(*v),
            CellValue::Float(_) => CellValue::Null,
            CellValue::Text(s) => match s.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => CellValue::Float(v),
                _ => CellValue::Null,
            },
        }
    }

    /// Render for CSV output; `Null` becomes an empty field
    pub fn to_field(&self) -> String {
        match self {
            CellValue::Null => String::new(),
            CellValue::Int(v) => v.to_string(),
            CellValue::Float(v) => format_float(*v),
            CellValue::Text(s) => s.clone(),
        }
    }
}

fn integral(v: f64) -> CellValue {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < i64::MAX as f64 {
        CellValue::Int(v as i64)
    } else {
        CellValue::Null
    }
}

fn format_float(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{:.1}", v)
    } else {
        v.to_string()
    }
}

/// Null counts produced by coercing one column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CoercionStats {
    /// Values that were present but could not be converted
    pub coerced_to_null: usize,
    /// All nulls in the column after conversion
    pub null_count: usize,
}

/// Borrowed view of one row, addressed by column name
pub struct Row<'a> {
    index: &'a HashMap<String, usize>,
    cells: &'a [CellValue],
}

impl<'a> Row<'a> {
    pub fn get(&self, column: &str) -> Option<&'a CellValue> {
        self.index.get(column).and_then(|&i| self.cells.get(i))
    }

    pub fn text(&self, column: &str) -> Option<&'a str> {
        self.get(column).and_then(CellValue::as_text)
    }
}

/// Ordered, column-addressable table of records
#[derive(Debug, Clone, Default)]
pub struct RecordTable {
    columns: Vec<String>,
    index: HashMap<String, usize>,
    rows: Vec<Vec<CellValue>>,
}

impl RecordTable {
    pub fn new(columns: Vec<String>) -> Self {
        let index = build_index(&columns);
        Self {
            columns,
            index,
            rows: Vec::new(),
        }
    }

    /// Load a table from a CSV file with a header row
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        Self::from_csv_reader(file)
    }

    /// Load a table from any CSV source with a header row.
    /// Short rows are padded with nulls; a row longer than the header is an error.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .trim(Trim::Headers)
            .flexible(true)
            .from_reader(reader);

        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        let mut table = Self::new(columns);

        for record in reader.records() {
            let record = record?;
            if record.len() > table.columns.len() {
                return Err(CleanerError::TooManyFields {
                    line: record.position().map_or(0, |p| p.line()),
                    expected: table.columns.len(),
                    found: record.len(),
                });
            }
            table.push_row(record.iter().map(CellValue::from_raw).collect());
        }

        Ok(table)
    }

    /// Append a row, padding short rows with nulls. Extra fields are discarded.
    pub fn push_row(&mut self, mut cells: Vec<CellValue>) {
        cells.resize(self.columns.len(), CellValue::Null);
        self.rows.push(cells);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |cells| Row {
            index: &self.index,
            cells,
        })
    }

    /// Values of one column in row order, or `None` if the column is absent
    pub fn column(&self, column: &str) -> Option<impl Iterator<Item = &CellValue> + '_> {
        let idx = *self.index.get(column)?;
        Some(self.rows.iter().map(move |row| &row[idx]))
    }

    /// Coerce a column to integers; unconvertible values become null
    pub fn coerce_integer(&mut self, column: &str) -> Option<CoercionStats> {
        self.coerce_with(column, CellValue::to_integer)
    }

    /// Coerce a column to real numbers; unconvertible values become null
    pub fn coerce_numeric(&mut self, column: &str) -> Option<CoercionStats> {
        self.coerce_with(column, CellValue::to_numeric)
    }

    fn coerce_with(&mut self, column: &str, convert: fn(&CellValue) -> CellValue) -> Option<CoercionStats> {
        let idx = *self.index.get(column)?;
        let mut stats = CoercionStats::default();

        for row in &mut self.rows {
            let converted = convert(&row[idx]);
            if converted.is_null() {
                if !row[idx].is_null() {
                    stats.coerced_to_null += 1;
                }
                stats.null_count += 1;
            }
            row[idx] = converted;
        }

        Some(stats)
    }

    /// Keep only rows matching the predicate; returns the number removed
    pub fn retain_rows<F>(&mut self, mut keep: F) -> usize
    where
        F: FnMut(&Row<'_>) -> bool,
    {
        let before = self.rows.len();
        let index = &self.index;
        self.rows.retain(|cells| keep(&Row { index, cells }));
        before - self.rows.len()
    }

    /// Drop whichever of the named columns are present; returns the dropped names
    pub fn drop_columns(&mut self, names: &[String]) -> Vec<String> {
        let dropped: Vec<String> = self
            .columns
            .iter()
            .filter(|c| names.contains(c))
            .cloned()
            .collect();
        if dropped.is_empty() {
            return dropped;
        }

        let keep: Vec<bool> = self.columns.iter().map(|c| !dropped.contains(c)).collect();
        for row in &mut self.rows {
            let mut flags = keep.iter();
            row.retain(|_| *flags.next().unwrap_or(&true));
        }
        self.columns.retain(|c| !dropped.contains(c));
        self.index = build_index(&self.columns);

        dropped
    }

    /// Write the table as CSV with a header row; returns rows written
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let mut writer = WriterBuilder::new().from_writer(writer);
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(CellValue::to_field))?;
        }
        writer.flush()?;
        Ok(self.rows.len())
    }

    pub fn write_csv_path(&self, path: &Path) -> Result<usize> {
        let file = File::create(path)?;
        self.write_csv(file)
    }
}

fn build_index(columns: &[String]) -> HashMap<String, usize> {
    columns
        .iter()
        .enumerate()
        .map(|(i, name)| (name.clone(), i))
        .collect()
}
