#![expect(missing_docs)]

mod common;

use core::fmt::Write;

use jsonrelay::{IncrementalReader, ReaderError, TreeDecoder};

use common::STREAM;

fn render_emissions(stream: &[&str]) -> String {
    let mut reader = IncrementalReader::streaming(TreeDecoder);
    let mut out = String::new();
    for (i, chunk) in stream.iter().enumerate() {
        for value in reader.feed(chunk.as_bytes()).expect("feed failed") {
            writeln!(out, "chunk {i}: {value}").unwrap();
        }
    }
    for value in reader.finish().expect("finish failed") {
        writeln!(out, "finish: {value}").unwrap();
    }
    out
}

fn render_error(stream: &[&str]) -> String {
    let reader = IncrementalReader::streaming(TreeDecoder);
    let err: ReaderError = reader
        .read_all(stream.iter().map(|chunk| chunk.as_bytes()))
        .unwrap_err();
    err.to_string()
}

#[test]
fn snapshot_emissions_per_chunk() {
    insta::assert_snapshot!(render_emissions(&STREAM), @r#"
    chunk 1: {"id":1,"type":"start"}
    chunk 2: {"id":1,"text":"Hel","type":"delta"}
    chunk 4: {"id":1,"text":"lo, \"world\"","type":"delta"}
    chunk 8: {"id":1,"type":"stop","usage":[12,0.5,null]}
    "#);
}

#[test]
fn snapshot_trailing_scalars_flush_at_finish() {
    insta::assert_snapshot!(render_emissions(&["[1]", " 2", " \"three\" 4"]), @r#"
    chunk 0: [1]
    chunk 2: 2
    chunk 2: "three"
    finish: 4
    "#);
}

#[test]
fn snapshot_errors() {
    insta::assert_snapshot!(
        render_error(&[r#"{"a": [1, "#, r#"2,]}"#]),
        @"malformed input: invalid character ']' at 1:13"
    );
    insta::assert_snapshot!(
        render_error(&[r#"{"a": tru"#]),
        @"incomplete input: unexpected end of input at 1:10"
    );
    insta::assert_snapshot!(
        render_error(&["[\"bad \\u", "d83d\\u0041\"]"]),
        @"malformed input: invalid unicode escape sequence \\uD83D at 1:19"
    );
}
