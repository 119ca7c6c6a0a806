//! In-memory record table and its CSV representation
//!
//! The table is the unit every text stage works on. Cells are optional
//! strings: an empty CSV field (or one of the conventional NA spellings) is a
//! missing value. Stages add or overwrite whole columns and never touch the
//! row count.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::debug;

/// Field spellings read as a missing value
const NA_VALUES: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// A single cell value
pub type Cell = Option<String>;

/// Ordered rows of named, optional string cells
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordTable {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl RecordTable {
    /// Create a table, checking that every row matches the header width
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self> {
        if let Some((idx, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(Error::data(format!(
                "row {} has {} fields, expected {}",
                idx,
                row.len(),
                columns.len()
            )));
        }
        Ok(Self { columns, rows })
    }

    /// Parse a CSV document with a header row
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let columns: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
        if columns.is_empty() {
            return Err(Error::data("table has no header row"));
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(parse_cell).collect());
        }

        debug!(columns = columns.len(), rows = rows.len(), "Parsed record table");
        Self::new(columns, rows)
    }

    /// Load a CSV file from disk
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| Error::data(format!("cannot open {}: {}", path.display(), e)))?;
        Self::from_reader(BufReader::new(file))
    }

    /// Serialize as CSV with a header row; missing cells are written empty
    pub fn write_csv<W: Write>(&self, writer: W) -> Result<()> {
        let mut writer = csv::Writer::from_writer(writer);
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Write the table to a CSV file, replacing any existing file
    pub fn write_path(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = File::create(path.as_ref())?;
        self.write_csv(BufWriter::new(file))
    }

    /// Column names in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of the first column with this name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Iterate over one column's cells
    pub fn cells<'a>(&'a self, name: &str) -> Result<impl Iterator<Item = Option<&'a str>> + 'a> {
        let idx = self
            .column_index(name)
            .ok_or_else(|| Error::data(format!("missing column `{}`", name)))?;
        Ok(self.rows.iter().map(move |row| row[idx].as_deref()))
    }

    /// Collect one column, with missing cells as `None`
    pub fn column(&self, name: &str) -> Result<Vec<Option<&str>>> {
        Ok(self.cells(name)?.collect())
    }

    /// Add a column, or overwrite it if it already exists
    pub fn set_column(&mut self, name: &str, values: Vec<Cell>) -> Result<()> {
        if values.len() != self.rows.len() {
            return Err(Error::data(format!(
                "column `{}` has {} values for {} rows",
                name,
                values.len(),
                self.rows.len()
            )));
        }

        match self.column_index(name) {
            Some(idx) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[idx] = value;
                }
            }
            None => {
                self.columns.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(())
    }

    /// Derive `target` from `source` cell by cell
    pub fn map_column<F>(&mut self, source: &str, target: &str, mut f: F) -> Result<()>
    where
        F: FnMut(Option<&str>) -> Cell,
    {
        let values: Vec<Cell> = self.cells(source)?.map(&mut f).collect();
        self.set_column(target, values)
    }

    /// Strip surrounding whitespace from every column name
    pub fn trim_headers(&mut self) {
        for column in &mut self.columns {
            let trimmed = column.trim();
            if trimmed.len() != column.len() {
                *column = trimmed.to_string();
            }
        }
    }
}

fn parse_cell(field: &str) -> Cell {
    if NA_VALUES.contains(&field) {
        None
    } else {
        Some(field.to_string())
    }
}
