// Streaming Tokenizer
//
// Stateful chunked tokenizer for input that arrives in pieces (socket reads,
// file blocks, chunked transfer). Header and cell tokens are pushed to a
// `TokenSink` the moment they complete.
//
// Key design:
// - Owns the carry buffer (Vec<u8>) because input chunks are temporary
// - Never peeks past the current byte, so chunk boundaries cannot change the
//   token sequence
// - With a declared total length, the last cell is flushed as soon as the
//   final byte arrives instead of waiting for `finish()`

use crate::core::{Boundary, Dialect, FieldState, RowMismatch, RowMode};
use thiserror::Error;
use tracing::{debug, trace, warn};

/// Receiver for tokens, invoked synchronously and in document order.
pub trait TokenSink {
    /// A header cell from the first row completed.
    fn on_header(&mut self, header: &[u8]);

    /// A data cell completed; `header` is the header of its column.
    fn on_cell(&mut self, header: &[u8], cell: &[u8]);

    /// A data row ended with a cell count different from the header count.
    /// Called after the row's cells have been delivered.
    fn on_mismatch(&mut self, mismatch: RowMismatch) {
        let _ = mismatch;
    }
}

impl<S: TokenSink + ?Sized> TokenSink for &mut S {
    fn on_header(&mut self, header: &[u8]) {
        (**self).on_header(header)
    }

    fn on_cell(&mut self, header: &[u8], cell: &[u8]) {
        (**self).on_cell(header, cell)
    }

    fn on_mismatch(&mut self, mismatch: RowMismatch) {
        (**self).on_mismatch(mismatch)
    }
}

/// Two closure slots acting as a sink. Mismatches are ignored.
pub struct Callbacks<H, C> {
    pub on_header: H,
    pub on_cell: C,
}

impl<H, C> TokenSink for Callbacks<H, C>
where
    H: FnMut(&[u8]),
    C: FnMut(&[u8], &[u8]),
{
    fn on_header(&mut self, header: &[u8]) {
        (self.on_header)(header)
    }

    fn on_cell(&mut self, header: &[u8], cell: &[u8]) {
        (self.on_cell)(header, cell)
    }
}

/// Owned token, for callers that would rather drain a queue than implement a sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Header(Vec<u8>),
    Cell { header: Vec<u8>, value: Vec<u8> },
    Mismatch(RowMismatch),
}

impl TokenSink for Vec<Token> {
    fn on_header(&mut self, header: &[u8]) {
        self.push(Token::Header(header.to_vec()));
    }

    fn on_cell(&mut self, header: &[u8], cell: &[u8]) {
        self.push(Token::Cell {
            header: header.to_vec(),
            value: cell.to_vec(),
        });
    }

    fn on_mismatch(&mut self, mismatch: RowMismatch) {
        self.push(Token::Mismatch(mismatch));
    }
}

/// Misuse of the chunk protocol. The rejected chunk is not consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenizeError {
    #[error("chunk of {chunk} bytes exceeds the declared length ({remaining} bytes left)")]
    LengthExceeded { chunk: usize, remaining: usize },
    #[error("total length {given} conflicts with the {declared} bytes declared earlier")]
    LengthConflict { declared: usize, given: usize },
    #[error("stream already finished")]
    Finished,
}

/// Whether the tokenizer will accept more input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    Open,
    Finished,
}

/// Resumable tokenizer for one logical stream.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    dialect: Dialect,
    /// Quote flag and carry buffer
    field: FieldState,
    headers: Vec<Vec<u8>>,
    mode: RowMode,
    /// Column the next completed data cell belongs to
    cursor: usize,
    /// Zero-based index of the data row being filled
    data_row: usize,
    /// Total stream length, if the caller declared one
    declared_len: Option<usize>,
    consumed: usize,
    finished: bool,
}

impl Tokenizer {
    /// Tokenizer with the default dialect (comma separator, double-quote quoting)
    pub fn new() -> Self {
        Self::with_dialect(Dialect::default())
    }

    pub fn with_dialect(dialect: Dialect) -> Self {
        Tokenizer {
            dialect,
            field: FieldState::new(),
            headers: Vec::new(),
            mode: RowMode::InHeader,
            cursor: 0,
            data_row: 0,
            declared_len: None,
            consumed: 0,
            finished: false,
        }
    }

    /// Feed the next chunk of the stream.
    ///
    /// `total_length` is the byte length of the whole stream. It only needs to
    /// be given once; repeating the same value is fine, a different one is an
    /// error. Without it, an unterminated trailing cell stays in the carry
    /// buffer until more input or `finish()` arrives. With it, the trailing
    /// cell is held while bytes remain and flushed as the final token once
    /// the last byte is consumed, after which the stream is finished.
    pub fn advance<S: TokenSink + ?Sized>(
        &mut self,
        chunk: &[u8],
        total_length: Option<usize>,
        sink: &mut S,
    ) -> Result<StreamState, TokenizeError> {
        if self.finished {
            if chunk.is_empty() {
                return Ok(StreamState::Finished);
            }
            warn!(chunk = chunk.len(), "chunk fed to a finished stream");
            return Err(TokenizeError::Finished);
        }

        let declared = match (self.declared_len, total_length) {
            (Some(declared), Some(given)) if declared != given => {
                warn!(declared, given, "chunk declares a different stream length");
                return Err(TokenizeError::LengthConflict { declared, given });
            }
            (Some(declared), _) => Some(declared),
            (None, given) => given,
        };
        if let Some(declared) = declared {
            let remaining = declared.saturating_sub(self.consumed);
            if chunk.len() > remaining {
                warn!(
                    chunk = chunk.len(),
                    remaining, "chunk overruns the declared stream length"
                );
                return Err(TokenizeError::LengthExceeded {
                    chunk: chunk.len(),
                    remaining,
                });
            }
        }
        self.declared_len = declared;

        for &byte in chunk {
            match self.field.step(byte, &self.dialect) {
                Boundary::None => {}
                Boundary::Cell => self.complete_cell(sink),
                Boundary::Row => {
                    self.complete_cell(sink);
                    self.complete_row(sink);
                }
            }
        }
        self.consumed += chunk.len();

        trace!(
            chunk = chunk.len(),
            consumed = self.consumed,
            carry = self.field.cell().len(),
            "chunk consumed"
        );

        if self.bytes_left() == Some(0) {
            // Nothing can extend the trailing cell any more
            self.finish(sink);
            return Ok(StreamState::Finished);
        }
        Ok(StreamState::Open)
    }

    /// End the stream, flushing an unterminated trailing row as if a row
    /// terminator had been seen. Calling it again is a no-op.
    pub fn finish<S: TokenSink + ?Sized>(&mut self, sink: &mut S) {
        if self.finished {
            return;
        }
        if self.field.row_open() {
            self.complete_cell(sink);
            self.complete_row(sink);
        }
        self.field.close_row();
        self.finished = true;
    }

    fn complete_cell<S: TokenSink + ?Sized>(&mut self, sink: &mut S) {
        match self.mode {
            RowMode::InHeader => {
                let header = self.field.take_cell();
                sink.on_header(&header);
                self.headers.push(header);
            }
            RowMode::InData => {
                // Surplus cells have no header; they are counted, not assigned
                if let Some(header) = self.headers.get(self.cursor) {
                    sink.on_cell(header, self.field.cell());
                }
                self.cursor += 1;
                self.field.clear_cell();
            }
        }
    }

    fn complete_row<S: TokenSink + ?Sized>(&mut self, sink: &mut S) {
        match self.mode {
            RowMode::InHeader => {
                self.mode = RowMode::InData;
                debug!(columns = self.headers.len(), "header row complete");
            }
            RowMode::InData => {
                let expected = self.headers.len();
                if self.cursor != expected {
                    let mismatch = RowMismatch {
                        row: self.data_row,
                        expected,
                        found: self.cursor,
                    };
                    debug!(%mismatch, "column count mismatch");
                    sink.on_mismatch(mismatch);
                }
                self.cursor = 0;
                self.data_row += 1;
            }
        }
    }

    /// Headers seen so far, in first-row order.
    pub fn headers(&self) -> &[Vec<u8>] {
        &self.headers
    }

    pub fn row_mode(&self) -> RowMode {
        self.mode
    }

    pub fn in_quotes(&self) -> bool {
        self.field.in_quotes()
    }

    /// Size of the carry buffer (unescaped bytes of the unfinished cell)
    pub fn carry_len(&self) -> usize {
        self.field.cell().len()
    }

    /// Bytes still expected, when a total length was declared
    pub fn bytes_left(&self) -> Option<usize> {
        self.declared_len
            .map(|declared| declared.saturating_sub(self.consumed))
    }

    pub fn bytes_consumed(&self) -> usize {
        self.consumed
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Reset all stream state; the dialect is preserved.
    pub fn reset(&mut self) {
        *self = Self::with_dialect(self.dialect);
    }
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Tokenize a complete buffer in one call.
pub fn tokenize(input: &[u8], dialect: Dialect) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut tokenizer = Tokenizer::with_dialect(dialect);
    // Without a declared length nothing can be rejected
    let _ = tokenizer.advance(input, None, &mut tokens);
    tokenizer.finish(&mut tokens);
    tokens
}
