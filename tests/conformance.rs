// Cross-path conformance tests
//
// Each scenario runs through every path that can produce comparable output:
// streaming in one call, streaming over every 2-way and 3-way split,
// streaming one byte per call, streaming with a declared total length, and
// the bulk column parser.
// Failures pinpoint which path diverges.

use chunkcsv::core::Dialect;
use chunkcsv::strategy::columnar::parse_columns;
use chunkcsv::strategy::streaming::{tokenize, Token, Tokenizer};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Rebuild (headers, rows) from a well-formed token stream.
fn tokens_to_table(tokens: &[Token]) -> (Vec<String>, Vec<Vec<String>>) {
    let mut headers = Vec::new();
    let mut rows: Vec<Vec<String>> = Vec::new();
    for token in tokens {
        match token {
            Token::Header(h) => headers.push(String::from_utf8_lossy(h).to_string()),
            Token::Cell { value, .. } => {
                if rows.last().map_or(true, |r| r.len() == headers.len()) {
                    rows.push(Vec::new());
                }
                if let Some(row) = rows.last_mut() {
                    row.push(String::from_utf8_lossy(value).to_string());
                }
            }
            Token::Mismatch(m) => panic!("unexpected mismatch: {m}"),
        }
    }
    (headers, rows)
}

fn feed(input: &[u8], cuts: &[usize], total: Option<usize>) -> Vec<Token> {
    let mut tokenizer = Tokenizer::new();
    let mut tokens = Vec::new();
    let mut start = 0;
    for &cut in cuts.iter().chain(std::iter::once(&input.len())) {
        tokenizer
            .advance(&input[start..cut], total, &mut tokens)
            .unwrap();
        start = cut;
    }
    tokenizer.finish(&mut tokens);
    tokens
}

/// Assert every split into two or three chunks matches `expected`.
fn assert_all_splits(input: &[u8], expected: &[Token]) {
    for i in 0..=input.len() {
        assert_eq!(feed(input, &[i], None), expected, "FAILED: split at {i}");
        for j in i..=input.len() {
            let declared = feed(input, &[i, j], Some(input.len()));
            assert_eq!(declared, expected, "FAILED: split at {i}, {j} with length");
        }
    }
}

fn byte_at_a_time(input: &[u8]) -> Vec<Token> {
    let mut tokenizer = Tokenizer::new();
    let mut tokens = Vec::new();
    for byte in input.chunks(1) {
        tokenizer.advance(byte, None, &mut tokens).unwrap();
    }
    tokenizer.finish(&mut tokens);
    tokens
}

fn split_with_length(input: &[u8]) -> Vec<Token> {
    let mut tokenizer = Tokenizer::new();
    let mut tokens = Vec::new();
    let (a, b) = input.split_at(input.len() / 2);
    tokenizer.advance(a, Some(input.len()), &mut tokens).unwrap();
    tokenizer.advance(b, Some(input.len()), &mut tokens).unwrap();
    assert!(tokenizer.is_finished(), "declared length did not finish the stream");
    tokens
}

/// Transpose the bulk table back into rows; `None` cells become "".
fn bulk_to_table(input: &[u8]) -> (Vec<String>, Vec<Vec<String>>) {
    let table = parse_columns(input, Dialect::default());
    assert!(table.mismatches().is_empty(), "unexpected bulk mismatch");
    let headers: Vec<String> = table.headers().map(str::to_string).collect();
    let rows = (0..table.row_count())
        .map(|i| {
            table
                .columns()
                .iter()
                .map(|c| c.cells()[i].clone().unwrap_or_default())
                .collect()
        })
        .collect();
    (headers, rows)
}

// ---------------------------------------------------------------------------
// Conformance macro
// ---------------------------------------------------------------------------

/// Runs a scenario through all paths and asserts they all produce
/// `headers` and `rows`. Bulk output cannot tell "" from a missing value, so
/// empty expected cells compare as "".
macro_rules! conformance {
    ($name:ident, input: $input:expr, headers: $headers:expr, rows: $rows:expr) => {
        #[test]
        fn $name() {
            let input: &[u8] = $input;
            let headers: Vec<String> = $headers.iter().map(|s: &&str| s.to_string()).collect();
            let rows: Vec<Vec<String>> = $rows
                .iter()
                .map(|row: &Vec<&str>| row.iter().map(|s| s.to_string()).collect())
                .collect();
            let expected = (headers, rows);

            let one_call = tokenize(input, Dialect::default());
            assert_eq!(tokens_to_table(&one_call), expected, "FAILED: streaming one call");

            assert_all_splits(input, &one_call);

            let bytewise = byte_at_a_time(input);
            assert_eq!(bytewise, one_call, "FAILED: streaming byte at a time");

            if !input.is_empty() {
                let declared = split_with_length(input);
                assert_eq!(declared, one_call, "FAILED: streaming with declared length");
            }

            assert_eq!(bulk_to_table(input), expected, "FAILED: bulk");
        }
    };
}

// ---------------------------------------------------------------------------
// Scenarios
// ---------------------------------------------------------------------------

conformance!(
    simple_two_rows,
    input: b"name,age\nAda,36\nAlan,41\n",
    headers: ["name", "age"],
    rows: vec![vec!["Ada", "36"], vec!["Alan", "41"]]
);

conformance!(
    quoted_field_with_comma,
    input: b"a,b,c\n1,\"b,c\",d\n",
    headers: ["a", "b", "c"],
    rows: vec![vec!["1", "b,c", "d"]]
);

conformance!(
    crlf_line_endings,
    input: b"a,b\r\nc,d\r\n",
    headers: ["a", "b"],
    rows: vec![vec!["c", "d"]]
);

conformance!(
    bare_cr_line_endings,
    input: b"a,b\rc,d\r",
    headers: ["a", "b"],
    rows: vec![vec!["c", "d"]]
);

conformance!(
    no_trailing_newline,
    input: b"a,b\nc,d",
    headers: ["a", "b"],
    rows: vec![vec!["c", "d"]]
);

conformance!(
    escaped_doubled_quotes,
    input: b"quote\n\"He said \"\"hi\"\"\"\n",
    headers: ["quote"],
    rows: vec![vec!["He said \"hi\""]]
);

conformance!(
    multiline_quoted_field,
    input: b"a,b\n\"a,b\nc\",x\n",
    headers: ["a", "b"],
    rows: vec![vec!["a,b\nc", "x"]]
);

conformance!(
    quoted_crlf_is_content,
    input: b"a\n\"x\r\ny\"\n",
    headers: ["a"],
    rows: vec![vec!["x\r\ny"]]
);

conformance!(
    empty_cells,
    input: b"a,b,c\n,x,\n",
    headers: ["a", "b", "c"],
    rows: vec![vec!["", "x", ""]]
);

conformance!(
    quoted_header,
    input: b"\"first name\",\"a,b\"\n1,2\n",
    headers: ["first name", "a,b"],
    rows: vec![vec!["1", "2"]]
);

conformance!(
    header_only,
    input: b"a,b\n",
    headers: ["a", "b"],
    rows: Vec::<Vec<&str>>::new()
);

conformance!(
    empty_input,
    input: b"",
    headers: Vec::<&str>::new(),
    rows: Vec::<Vec<&str>>::new()
);

conformance!(
    single_column_blank_line,
    input: b"a\n1\n\n2\n",
    headers: ["a"],
    rows: vec![vec!["1"], vec![""], vec!["2"]]
);

conformance!(
    utf8_content,
    input: "firstName,tagLine\nCaleb,😜\nAnne,\"God's in His heaven,\nall's right with the world\"\n".as_bytes(),
    headers: ["firstName", "tagLine"],
    rows: vec![
        vec!["Caleb", "😜"],
        vec!["Anne", "God's in His heaven,\nall's right with the world"]
    ]
);

// ---------------------------------------------------------------------------
// Malformed rows
// ---------------------------------------------------------------------------

#[test]
fn too_wide_row_agrees_across_paths() {
    use chunkcsv::core::RowMismatch;

    let input: &[u8] = b"a,b\n1,2,3\n4,5\n";
    let mismatch = RowMismatch {
        row: 0,
        expected: 2,
        found: 3,
    };

    let tokens = tokenize(input, Dialect::default());
    assert_all_splits(input, &tokens);
    assert_eq!(
        tokens.iter().filter(|t| matches!(t, Token::Mismatch(_))).collect::<Vec<_>>(),
        vec![&Token::Mismatch(mismatch)]
    );
    // The surplus "3" is never attached to a header
    assert!(!tokens
        .iter()
        .any(|t| matches!(t, Token::Cell { value, .. } if value.as_slice() == b"3")));

    let table = parse_columns(input, Dialect::default());
    assert_eq!(table.mismatches(), &[mismatch]);
    assert_eq!(
        table.column("b"),
        Some([Some("2".to_string()), Some("5".to_string())].as_slice())
    );
}

// ---------------------------------------------------------------------------
// Terminator equivalence
// ---------------------------------------------------------------------------

#[test]
fn lf_and_crlf_tokenize_identically() {
    let lf = tokenize(b"a,b\nc,d", Dialect::default());
    let crlf = tokenize(b"a,b\r\nc,d", Dialect::default());
    assert_eq!(lf, crlf);
}

// ---------------------------------------------------------------------------
// Encoder round trip through the tokenizer
// ---------------------------------------------------------------------------

#[test]
fn encoded_rows_tokenize_back() {
    use chunkcsv::strategy::encode::RowEncoder;

    let rows: Vec<Vec<&str>> = vec![
        vec!["id", "note"],
        vec!["1", "plain"],
        vec!["2", "has,comma"],
        vec!["3", "say \"hi\""],
        vec!["4", "two\r\nlines"],
        vec!["5", ""],
    ];
    let mut encoder = RowEncoder::new(Dialect::default());
    for row in &rows {
        encoder.write_row(row).unwrap();
    }

    let (headers, data) = tokens_to_table(&tokenize(encoder.as_bytes(), Dialect::default()));
    assert_eq!(headers, vec!["id", "note"]);
    let expected: Vec<Vec<String>> = rows[1..]
        .iter()
        .map(|r| r.iter().map(|s| s.to_string()).collect())
        .collect();
    assert_eq!(data, expected);
}
