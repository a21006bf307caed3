// Row-level bookkeeping shared by the tokenizer, the bulk parser and the encoder

use thiserror::Error;

/// Which row the tokenizer is currently filling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RowMode {
    /// First row: every completed cell is a header.
    #[default]
    InHeader,
    /// Every row after the first unquoted row terminator.
    InData,
}

/// A data row whose cell count differs from the header count.
///
/// `row` is zero-based and counts data rows only; the header row is not row 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("row {row} has {found} cells but the header declares {expected}")]
pub struct RowMismatch {
    pub row: usize,
    pub expected: usize,
    pub found: usize,
}

impl RowMismatch {
    /// More cells than headers; the surplus cells were not assigned.
    pub fn is_too_wide(&self) -> bool {
        self.found > self.expected
    }
}
