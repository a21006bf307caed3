// ChunkCSV - CSV tokenizing for chunked and whole-buffer input
//
// Surfaces:
// Streaming: resumable tokenizer fed arbitrary chunks (tokenizer_*)
// Bulk: two-phase column-major parse of a complete buffer (parse_columns*)
// Encoding: quote-aware row writer (encode_rows)

use rustler::{Binary, Encoder, Env, Error, NifResult, ResourceArc, Term};

pub mod core;
pub mod resource;
pub mod strategy;
pub mod term;

use crate::core::Dialect;
use resource::{TokenizerRef, TokenizerResource};
use strategy::{encode_rows as encode_rows_with, parse_columns as parse_columns_with};
use term::{
    bytes_to_term, state_to_term, table_to_map, tokenize_error_to_term, tokens_to_term,
};

/// Decode a single structural byte from a Term.
/// Accepts: integer 44 or one-byte binary <<44>>
fn decode_byte(term: Term<'_>) -> NifResult<u8> {
    if let Ok(byte) = term.decode::<u8>() {
        return Ok(byte);
    }
    if let Ok(binary) = term.decode::<Binary>() {
        if let [byte] = binary.as_slice() {
            return Ok(*byte);
        }
    }
    Err(Error::BadArg)
}

/// Decode delimiter and quote Terms into a validated dialect
fn decode_dialect(sep_term: Term<'_>, quote_term: Term<'_>) -> NifResult<Dialect> {
    let delimiter = decode_byte(sep_term)?;
    let quote = decode_byte(quote_term)?;
    Dialect::new(delimiter, quote).map_err(|_| Error::BadArg)
}

// ============================================================================
// Allocator Configuration
// ============================================================================

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

// ============================================================================
// Streaming Tokenizer
// ============================================================================

/// Create a new tokenizer with default settings
#[rustler::nif]
fn tokenizer_new() -> TokenizerRef {
    ResourceArc::new(TokenizerResource::new())
}

/// Create a new tokenizer with configurable delimiter and quote
#[rustler::nif]
fn tokenizer_new_with_config<'a>(
    sep_term: Term<'a>,
    quote_term: Term<'a>,
) -> NifResult<TokenizerRef> {
    let dialect = decode_dialect(sep_term, quote_term)?;
    Ok(ResourceArc::new(TokenizerResource::with_dialect(dialect)))
}

/// Feed a chunk; returns `{:open | :finished, events}` or `{:error, reason}`
#[rustler::nif]
fn tokenizer_advance<'a>(
    env: Env<'a>,
    tokenizer: TokenizerRef,
    chunk: Binary<'a>,
    total_length: Option<usize>,
) -> NifResult<Term<'a>> {
    let mut inner = tokenizer.lock()?;
    let mut tokens = Vec::new();
    match inner.advance(chunk.as_slice(), total_length, &mut tokens) {
        Ok(state) => {
            let events = tokens_to_term(env, &tokens);
            Ok((state_to_term(env, state), events).encode(env))
        }
        Err(err) => Ok(tokenize_error_to_term(env, err)),
    }
}

/// End the stream, returning the events of the flushed trailing row
#[rustler::nif]
fn tokenizer_finish<'a>(env: Env<'a>, tokenizer: TokenizerRef) -> NifResult<Term<'a>> {
    let mut inner = tokenizer.lock()?;
    let mut tokens = Vec::new();
    inner.finish(&mut tokens);
    Ok(tokens_to_term(env, &tokens))
}

/// Get tokenizer status (header_count, carry_len, bytes_left, finished)
#[rustler::nif]
fn tokenizer_status(tokenizer: TokenizerRef) -> NifResult<(usize, usize, Option<usize>, bool)> {
    let inner = tokenizer.lock()?;
    Ok((
        inner.headers().len(),
        inner.carry_len(),
        inner.bytes_left(),
        inner.is_finished(),
    ))
}

// ============================================================================
// Bulk Column Parser
// ============================================================================

/// Parse a complete CSV binary into `%{header => [value | nil]}`.
/// Uses DirtyCpu scheduler since whole-file parses can take significant time
#[rustler::nif(schedule = "DirtyCpu")]
fn parse_columns<'a>(env: Env<'a>, input: Binary<'a>) -> NifResult<Term<'a>> {
    let table = parse_columns_with(input.as_slice(), Dialect::default());
    table_to_map(env, &table)
}

/// Parse a complete CSV binary with configurable delimiter and quote
#[rustler::nif(schedule = "DirtyCpu")]
fn parse_columns_with_config<'a>(
    env: Env<'a>,
    input: Binary<'a>,
    sep_term: Term<'a>,
    quote_term: Term<'a>,
) -> NifResult<Term<'a>> {
    let dialect = decode_dialect(sep_term, quote_term)?;
    let table = parse_columns_with(input.as_slice(), dialect);
    table_to_map(env, &table)
}

// ============================================================================
// Encoding
// ============================================================================

/// Encode a list of rows (lists of binaries) into one CSV binary
#[rustler::nif]
fn encode_rows<'a>(
    env: Env<'a>,
    rows: Vec<Vec<Binary<'a>>>,
    sep_term: Term<'a>,
    quote_term: Term<'a>,
) -> NifResult<Term<'a>> {
    let dialect = decode_dialect(sep_term, quote_term)?;
    let out = encode_rows_with(
        rows.iter().map(|row| row.iter().map(|cell| cell.as_slice())),
        &dialect,
    );
    Ok(bytes_to_term(env, &out))
}

// ============================================================================
// NIF Initialization
// ============================================================================

#[allow(non_local_definitions)]
fn load(env: Env, _info: Term) -> bool {
    let _ = rustler::resource!(TokenizerResource, env);
    true
}

rustler::init!("Elixir.ChunkCSV.Native", load = load);
