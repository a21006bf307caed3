// Bulk Column Parser
//
// Phase 1: Read the header row and allocate one column per header
// Phase 2: Walk the data rows, appending each cell straight into its column
//
// The whole buffer is in memory, so there is no carry-over or length
// tracking. Byte rules come from the same FieldState the streaming tokenizer
// uses, so both paths agree on boundaries and doubled-quote unescaping.

use crate::core::{Boundary, Dialect, FieldState, RowMismatch};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{debug, warn};

/// What to do with a data row whose width differs from the header row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MismatchPolicy {
    /// Pad short rows with `None`, drop surplus cells, record the row.
    #[default]
    Report,
    /// Stop at the first offending row.
    Fail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BulkOptions {
    pub dialect: Dialect,
    pub policy: MismatchPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BulkError {
    #[error("header {column} is not valid UTF-8")]
    InvalidHeader { column: usize },
    #[error("cell at row {row}, column {column} is not valid UTF-8")]
    InvalidCell { row: usize, column: usize },
    #[error(transparent)]
    ColumnMismatch(#[from] RowMismatch),
}

/// One header and its cells, top to bottom. Empty cells are `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    name: String,
    cells: Vec<Option<String>>,
}

impl Column {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn cells(&self) -> &[Option<String>] {
        &self.cells
    }
}

/// Column-major result of a bulk parse.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnTable {
    columns: Vec<Column>,
    rows: usize,
    mismatches: Vec<RowMismatch>,
}

impl ColumnTable {
    /// Header names in first-row order, duplicates included
    pub fn headers(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    /// Cells under `name`. With duplicate headers the last column wins,
    /// matching `into_map`.
    pub fn column(&self, name: &str) -> Option<&[Option<String>]> {
        self.columns
            .iter()
            .rev()
            .find(|c| c.name == name)
            .map(|c| c.cells.as_slice())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Number of data rows (the header row is not counted)
    pub fn row_count(&self) -> usize {
        self.rows
    }

    /// Rows that were padded or truncated under `MismatchPolicy::Report`
    pub fn mismatches(&self) -> &[RowMismatch] {
        &self.mismatches
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Header → cells mapping. A later duplicate header replaces an earlier one.
    pub fn into_map(self) -> HashMap<String, Vec<Option<String>>> {
        self.columns
            .into_iter()
            .map(|c| (c.name, c.cells))
            .collect()
    }
}

/// Phase 2 state: the columns being filled and where the next cell goes.
struct ColumnFill {
    columns: Vec<Column>,
    policy: MismatchPolicy,
    cursor: usize,
    row: usize,
    mismatches: Vec<RowMismatch>,
}

impl ColumnFill {
    fn push_cell(&mut self, cell: &[u8]) -> Result<(), BulkError> {
        // Surplus cells are decoded too, then dropped
        let text = std::str::from_utf8(cell).map_err(|_| BulkError::InvalidCell {
            row: self.row,
            column: self.cursor,
        })?;
        if let Some(column) = self.columns.get_mut(self.cursor) {
            let value = (!text.is_empty()).then(|| text.to_owned());
            column.cells.push(value);
        }
        self.cursor += 1;
        Ok(())
    }

    fn end_row(&mut self) -> Result<(), BulkError> {
        let expected = self.columns.len();
        if self.cursor != expected {
            let mismatch = RowMismatch {
                row: self.row,
                expected,
                found: self.cursor,
            };
            if self.policy == MismatchPolicy::Fail {
                return Err(mismatch.into());
            }
            debug!(%mismatch, "padding mismatched row");
            for column in self.columns.iter_mut().skip(self.cursor) {
                column.cells.push(None);
            }
            self.mismatches.push(mismatch);
        }
        self.cursor = 0;
        self.row += 1;
        Ok(())
    }

    fn into_table(self) -> ColumnTable {
        ColumnTable {
            columns: self.columns,
            rows: self.row,
            mismatches: self.mismatches,
        }
    }
}

fn new_column(cell: Vec<u8>, column: usize, capacity: usize) -> Result<Column, BulkError> {
    let name = String::from_utf8(cell).map_err(|_| BulkError::InvalidHeader { column })?;
    Ok(Column {
        name,
        cells: Vec::with_capacity(capacity),
    })
}

/// Parse a complete buffer into columns, reporting the first failure.
pub fn try_parse_columns(input: &[u8], options: &BulkOptions) -> Result<ColumnTable, BulkError> {
    let dialect = &options.dialect;
    let mut field = FieldState::new();
    // Counts the header line and misses quoted or CR-only breaks; only a hint
    let estimated_rows = memchr::memchr_iter(b'\n', input).count();

    // Phase 1: header row
    let mut columns = Vec::new();
    let mut pos = 0;
    let mut header_done = false;
    while pos < input.len() {
        let boundary = field.step(input[pos], dialect);
        pos += 1;
        if boundary == Boundary::None {
            continue;
        }
        columns.push(new_column(field.take_cell(), columns.len(), estimated_rows)?);
        if boundary == Boundary::Row {
            header_done = true;
            break;
        }
    }
    if !header_done && field.row_open() {
        columns.push(new_column(field.take_cell(), columns.len(), 0)?);
        field.close_row();
    }

    // Phase 2: data rows
    let mut fill = ColumnFill {
        columns,
        policy: options.policy,
        cursor: 0,
        row: 0,
        mismatches: Vec::new(),
    };
    for &byte in &input[pos..] {
        match field.step(byte, dialect) {
            Boundary::None => {}
            Boundary::Cell => {
                fill.push_cell(field.cell())?;
                field.clear_cell();
            }
            Boundary::Row => {
                fill.push_cell(field.cell())?;
                field.clear_cell();
                fill.end_row()?;
            }
        }
    }
    if field.row_open() {
        fill.push_cell(field.cell())?;
        fill.end_row()?;
    }

    Ok(fill.into_table())
}

/// Parse a complete buffer into columns.
///
/// Input that fails to decode as UTF-8 anywhere yields an empty table rather
/// than a partial one. Rows of the wrong width are padded or truncated and
/// listed in `ColumnTable::mismatches`.
pub fn parse_columns(input: &[u8], dialect: Dialect) -> ColumnTable {
    let options = BulkOptions {
        dialect,
        policy: MismatchPolicy::Report,
    };
    match try_parse_columns(input, &options) {
        Ok(table) => table,
        Err(err) => {
            warn!(%err, "bulk parse failed, returning an empty table");
            ColumnTable::default()
        }
    }
}
