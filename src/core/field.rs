// Cell accumulation and quote handling
//
// One byte at a time, no look-ahead. The two decisions that classically need
// the next byte are deferred into state instead:
// - a quote that closes a quoted run may turn out to be the first half of a
//   doubled quote, so `quote_closed` remembers it for one byte
// - an unquoted CR ends the row immediately, and `after_cr` swallows an LF
//   that directly follows it
// Because nothing peeks past the current byte, a chunk boundary can fall
// anywhere without changing the result.

use super::dialect::Dialect;
use super::scanner::{classify, ByteClass, LF};

/// What a single byte did to the cell being accumulated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    /// Content, a quote toggle, or the LF half of a CRLF.
    None,
    /// Unquoted delimiter: the cell is complete.
    Cell,
    /// Unquoted row terminator: the cell and the row are complete.
    Row,
}

/// Quote flag plus the carry buffer for the cell in progress.
#[derive(Debug, Clone, Default)]
pub struct FieldState {
    /// Unescaped bytes of the current cell
    cell: Vec<u8>,
    in_quotes: bool,
    /// Previous byte closed a quoted run
    quote_closed: bool,
    /// Previous byte was an unquoted CR
    after_cr: bool,
    /// Any byte other than a row terminator seen since the last row ended
    row_open: bool,
}

impl FieldState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume one byte and report whether it completed a cell or a row.
    ///
    /// On `Cell` and `Row` the finished content is available from `cell()`
    /// until the caller invokes `clear_cell()`.
    #[inline]
    pub fn step(&mut self, byte: u8, dialect: &Dialect) -> Boundary {
        if std::mem::take(&mut self.after_cr) && byte == LF {
            return Boundary::None;
        }
        let quote_closed = std::mem::take(&mut self.quote_closed);

        match classify(byte, dialect) {
            ByteClass::Quote => {
                self.row_open = true;
                if self.in_quotes {
                    self.in_quotes = false;
                    self.quote_closed = true;
                } else {
                    if quote_closed {
                        // Doubled quote: the closing quote was an escape
                        self.cell.push(byte);
                    }
                    self.in_quotes = true;
                }
                Boundary::None
            }
            _ if self.in_quotes => {
                self.row_open = true;
                self.cell.push(byte);
                Boundary::None
            }
            ByteClass::Delimiter => {
                self.row_open = true;
                Boundary::Cell
            }
            ByteClass::Cr => {
                self.after_cr = true;
                self.row_open = false;
                Boundary::Row
            }
            ByteClass::Lf => {
                self.row_open = false;
                Boundary::Row
            }
            ByteClass::Other => {
                self.row_open = true;
                self.cell.push(byte);
                Boundary::None
            }
        }
    }

    /// Content of the cell accumulated so far.
    #[inline]
    pub fn cell(&self) -> &[u8] {
        &self.cell
    }

    /// Drop the completed cell, keeping the allocation for the next one.
    #[inline]
    pub fn clear_cell(&mut self) {
        self.cell.clear();
    }

    /// Move the completed cell out, leaving an empty buffer behind.
    #[inline]
    pub fn take_cell(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.cell)
    }

    #[inline]
    pub fn in_quotes(&self) -> bool {
        self.in_quotes
    }

    /// True when the current row has content that no terminator has ended yet.
    #[inline]
    pub fn row_open(&self) -> bool {
        self.row_open
    }

    /// Mark the open row as ended without a terminator byte (end of input).
    pub fn close_row(&mut self) {
        self.row_open = false;
        self.in_quotes = false;
        self.quote_closed = false;
        self.after_cr = false;
    }

    pub fn reset(&mut self) {
        self.cell.clear();
        self.close_row();
    }
}
