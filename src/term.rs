// Term building utilities for converting tokens and tables to Elixir terms

use crate::strategy::{ColumnTable, StreamState, Token, TokenizeError};
use rustler::types::atom;
use rustler::{Encoder, Env, NewBinary, NifResult, Term};

pub mod atoms {
    rustler::atoms! {
        header,
        cell,
        mismatch,
        open,
        finished,
        length_exceeded,
        length_conflict,
    }
}

/// Copy bytes into a fresh Elixir binary
pub fn bytes_to_term<'a>(env: Env<'a>, bytes: &[u8]) -> Term<'a> {
    let mut binary = NewBinary::new(env, bytes.len());
    binary.as_mut_slice().copy_from_slice(bytes);
    binary.into()
}

/// `{:header, name}`, `{:cell, header, value}` or `{:mismatch, row, expected, found}`
fn token_to_term<'a>(env: Env<'a>, token: &Token) -> Term<'a> {
    match token {
        Token::Header(name) => (atoms::header(), bytes_to_term(env, name)).encode(env),
        Token::Cell { header, value } => (
            atoms::cell(),
            bytes_to_term(env, header),
            bytes_to_term(env, value),
        )
            .encode(env),
        Token::Mismatch(m) => (atoms::mismatch(), m.row, m.expected, m.found).encode(env),
    }
}

/// Convert tokens to an Elixir list, preserving document order
pub fn tokens_to_term<'a>(env: Env<'a>, tokens: &[Token]) -> Term<'a> {
    // Build list in reverse (efficient for cons lists)
    let mut list = Term::list_new_empty(env);

    for token in tokens.iter().rev() {
        list = list.list_prepend(token_to_term(env, token));
    }

    list
}

pub fn state_to_term<'a>(env: Env<'a>, state: StreamState) -> Term<'a> {
    match state {
        StreamState::Open => atoms::open().encode(env),
        StreamState::Finished => atoms::finished().encode(env),
    }
}

/// `{:error, reason}` for chunk protocol misuse
pub fn tokenize_error_to_term<'a>(env: Env<'a>, err: TokenizeError) -> Term<'a> {
    let reason = match err {
        TokenizeError::LengthExceeded { .. } => atoms::length_exceeded(),
        TokenizeError::LengthConflict { .. } => atoms::length_conflict(),
        TokenizeError::Finished => atoms::finished(),
    };
    (atom::error(), reason).encode(env)
}

/// Convert a column table to `%{header => [value | nil]}`.
/// A later duplicate header replaces an earlier one.
pub fn table_to_map<'a>(env: Env<'a>, table: &ColumnTable) -> NifResult<Term<'a>> {
    let mut map = Term::map_new(env);

    for column in table.columns() {
        let mut cells = Term::list_new_empty(env);
        for cell in column.cells().iter().rev() {
            let value = match cell {
                Some(text) => bytes_to_term(env, text.as_bytes()),
                None => atom::nil().encode(env),
            };
            cells = cells.list_prepend(value);
        }
        map = map.map_put(bytes_to_term(env, column.name().as_bytes()), cells)?;
    }

    Ok(map)
}
