//! Delimiter and quote configuration shared by the tokenizer, the bulk
//! parser and the encoder.
//!
//! Row terminators are not part of the dialect: LF and CR (optionally
//! followed by LF) always end a row outside quotes.

use thiserror::Error;

/// Reasons a delimiter/quote pair cannot form a dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DialectError {
    #[error("delimiter and quote must differ (both are {0:#04x})")]
    SameByte(u8),
    #[error("{0:#04x} is a row terminator and cannot be a delimiter or quote")]
    Terminator(u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
    delimiter: u8,
    quote: u8,
}

impl Dialect {
    /// Build a dialect, rejecting pairs the classifier could not tell apart.
    pub fn new(delimiter: u8, quote: u8) -> Result<Self, DialectError> {
        for byte in [delimiter, quote] {
            if byte == b'\r' || byte == b'\n' {
                return Err(DialectError::Terminator(byte));
            }
        }
        if delimiter == quote {
            return Err(DialectError::SameByte(delimiter));
        }
        Ok(Dialect { delimiter, quote })
    }

    /// Comma delimiter, double-quote quoting.
    pub const fn rfc4180() -> Self {
        Dialect {
            delimiter: b',',
            quote: b'"',
        }
    }

    #[inline]
    pub fn delimiter(&self) -> u8 {
        self.delimiter
    }

    #[inline]
    pub fn quote(&self) -> u8 {
        self.quote
    }
}

impl Default for Dialect {
    fn default() -> Self {
        Self::rfc4180()
    }
}
