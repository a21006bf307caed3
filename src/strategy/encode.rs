// CSV row encoding: field scanning, quoting and row assembly
//
// Cells are written as-is unless they contain a byte the tokenizer would
// treat as structural (delimiter, quote, CR, LF). Those are wrapped in the
// quote byte with inner quotes doubled, which the tokenizer undoes.
//
// Rows end with a bare LF.

use crate::core::{is_structural, Dialect, RowMismatch, LF};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// `row` is the index the row would have taken, header row included.
    #[error("row {row} has no cells")]
    EmptyRow { row: usize },
    #[error(transparent)]
    ColumnMismatch(#[from] RowMismatch),
}

/// Write a field that needs quoting: quote + field_with_doubled_quotes + quote
#[inline]
pub fn write_quoted_field(out: &mut Vec<u8>, field: &[u8], quote: u8) {
    out.reserve(field.len() + 2);
    out.push(quote);
    for &b in field {
        out.push(b);
        if b == quote {
            out.push(quote);
        }
    }
    out.push(quote);
}

/// True if the field cannot be written bare under this dialect.
#[inline]
pub fn field_needs_quoting(field: &[u8], dialect: &Dialect) -> bool {
    field.iter().any(|&b| is_structural(b, dialect))
}

/// Write one field, quoting only when required.
#[inline]
pub fn write_field(out: &mut Vec<u8>, field: &[u8], dialect: &Dialect) {
    if field_needs_quoting(field, dialect) {
        write_quoted_field(out, field, dialect.quote());
    } else {
        out.extend_from_slice(field);
    }
}

/// Append one row (cells joined by the delimiter, LF-terminated) to `out`.
/// Returns the number of cells written.
///
/// A row with no cells is written as a bare LF, which tokenizes back as a
/// single empty cell. `RowEncoder` refuses such rows.
pub fn encode_row<I, F>(out: &mut Vec<u8>, cells: I, dialect: &Dialect) -> usize
where
    I: IntoIterator<Item = F>,
    F: AsRef<[u8]>,
{
    let mut count = 0;
    for cell in cells {
        if count > 0 {
            out.push(dialect.delimiter());
        }
        write_field(out, cell.as_ref(), dialect);
        count += 1;
    }
    out.push(LF);
    count
}

/// Encode many rows into one buffer. No width checking; see `RowEncoder`.
pub fn encode_rows<R, I, F>(rows: R, dialect: &Dialect) -> Vec<u8>
where
    R: IntoIterator<Item = I>,
    I: IntoIterator<Item = F>,
    F: AsRef<[u8]>,
{
    let mut out = Vec::new();
    for row in rows {
        encode_row(&mut out, row, dialect);
    }
    out
}

/// Writes rows one at a time, holding every row to the width of the first.
#[derive(Debug, Clone)]
pub struct RowEncoder {
    dialect: Dialect,
    width: Option<usize>,
    rows: usize,
    out: Vec<u8>,
}

impl RowEncoder {
    pub fn new(dialect: Dialect) -> Self {
        RowEncoder {
            dialect,
            width: None,
            rows: 0,
            out: Vec::new(),
        }
    }

    /// Write one row. The first row (normally the header) fixes the width;
    /// a later row of a different width is rejected and nothing is written.
    /// Rows with no cells are always rejected.
    pub fn write_row<F: AsRef<[u8]>>(&mut self, cells: &[F]) -> Result<(), EncodeError> {
        if cells.is_empty() {
            return Err(EncodeError::EmptyRow { row: self.rows });
        }
        if let Some(expected) = self.width {
            if cells.len() != expected {
                return Err(RowMismatch {
                    // Data rows are counted from zero, after the header row
                    row: self.rows - 1,
                    expected,
                    found: cells.len(),
                }
                .into());
            }
        }
        let written = encode_row(&mut self.out, cells, &self.dialect);
        self.width.get_or_insert(written);
        self.rows += 1;
        Ok(())
    }

    /// Rows written so far, header included
    pub fn rows_written(&self) -> usize {
        self.rows
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.out
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.out
    }
}

// ==========================================================================
// Tests
// ==========================================================================
