// Byte-level classification of the structurally significant CSV bytes.

use super::dialect::Dialect;

/// Carriage return. Always a row terminator candidate, never configurable.
pub const CR: u8 = b'\r';
/// Line feed. Always a row terminator, never configurable.
pub const LF: u8 = b'\n';

/// What a single input byte means to the tokenizer before quote state is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteClass {
    Quote,
    Delimiter,
    Cr,
    Lf,
    Other,
}

/// Classify one byte against the dialect.
///
/// The dialect guarantees the delimiter and quote are distinct and are never
/// CR or LF, so the match order below is unambiguous.
#[inline]
pub fn classify(byte: u8, dialect: &Dialect) -> ByteClass {
    if byte == dialect.quote() {
        ByteClass::Quote
    } else if byte == dialect.delimiter() {
        ByteClass::Delimiter
    } else {
        match byte {
            CR => ByteClass::Cr,
            LF => ByteClass::Lf,
            _ => ByteClass::Other,
        }
    }
}

/// True if the byte would end or alter a cell when written unquoted.
#[inline]
pub fn is_structural(byte: u8, dialect: &Dialect) -> bool {
    classify(byte, dialect) != ByteClass::Other
}
