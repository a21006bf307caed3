// Column Collector
//
// Runs a whole buffer through the streaming tokenizer and gathers the
// tokens into a header -> cells map. Unlike the bulk column parser this
// never gives up on bad bytes: the byte form does no decoding at all, and
// the text form drops only the cells that fail to decode.
//
// Duplicate headers share one entry. Seeing a header again resets its
// entry, and cells of both columns then append to it in document order.

use super::streaming::{TokenSink, Tokenizer};
use crate::core::Dialect;
use std::collections::HashMap;
use tracing::debug;

/// Sink that groups data cells under their header. Empty cells are `None`.
#[derive(Debug, Clone, Default)]
pub struct ColumnSink {
    columns: HashMap<Vec<u8>, Vec<Option<Vec<u8>>>>,
}

impl ColumnSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn columns(&self) -> &HashMap<Vec<u8>, Vec<Option<Vec<u8>>>> {
        &self.columns
    }

    pub fn into_map(self) -> HashMap<Vec<u8>, Vec<Option<Vec<u8>>>> {
        self.columns
    }
}

impl TokenSink for ColumnSink {
    fn on_header(&mut self, header: &[u8]) {
        self.columns.insert(header.to_vec(), Vec::new());
    }

    fn on_cell(&mut self, header: &[u8], cell: &[u8]) {
        let value = (!cell.is_empty()).then(|| cell.to_vec());
        match self.columns.get_mut(header) {
            Some(cells) => cells.push(value),
            None => {
                self.columns.insert(header.to_vec(), vec![value]);
            }
        }
    }
}

/// Same grouping as `ColumnSink`, keyed and valued by text.
/// Headers and cells that are not valid UTF-8 are skipped.
#[derive(Debug, Clone, Default)]
pub struct TextColumnSink {
    columns: HashMap<String, Vec<Option<String>>>,
    skipped: usize,
}

impl TextColumnSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Headers and cells dropped for failing to decode
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn into_map(self) -> HashMap<String, Vec<Option<String>>> {
        self.columns
    }
}

impl TokenSink for TextColumnSink {
    fn on_header(&mut self, header: &[u8]) {
        match std::str::from_utf8(header) {
            Ok(title) => {
                self.columns.insert(title.to_owned(), Vec::new());
            }
            Err(_) => self.skipped += 1,
        }
    }

    fn on_cell(&mut self, header: &[u8], cell: &[u8]) {
        let (Ok(title), Ok(contents)) = (std::str::from_utf8(header), std::str::from_utf8(cell))
        else {
            self.skipped += 1;
            return;
        };
        let value = (!contents.is_empty()).then(|| contents.to_owned());
        self.columns.entry(title.to_owned()).or_default().push(value);
    }
}

fn run<S: TokenSink>(input: &[u8], dialect: Dialect, sink: &mut S) {
    let mut tokenizer = Tokenizer::with_dialect(dialect);
    // Without a declared length nothing can be rejected
    let _ = tokenizer.advance(input, None, sink);
    tokenizer.finish(sink);
}

/// Collect a complete buffer into `header -> cells`, byte for byte.
pub fn collect_columns(input: &[u8], dialect: Dialect) -> HashMap<Vec<u8>, Vec<Option<Vec<u8>>>> {
    let mut sink = ColumnSink::new();
    run(input, dialect, &mut sink);
    sink.into_map()
}

/// Collect a complete buffer into `header -> cells` as text, skipping
/// whatever does not decode as UTF-8.
pub fn collect_text_columns(input: &[u8], dialect: Dialect) -> HashMap<String, Vec<Option<String>>> {
    let mut sink = TextColumnSink::new();
    run(input, dialect, &mut sink);
    if sink.skipped() > 0 {
        debug!(skipped = sink.skipped(), "skipped undecodable cells");
    }
    sink.into_map()
}
