#![no_main]
use std::cell::RefCell;

use arbitrary::Arbitrary;
use jsonrelay::{
    CompletionPolicy, IncrementalReader, ReaderError, ReaderOptions, TreeDecoder, TypedDecoder,
    chunk_utils::split_at_offsets,
};
use libfuzzer_sys::{fuzz_mutator, fuzz_target, fuzzer_mutate};
use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};
use serde_json::{Map, Value};

const HEADER: usize = 5; // 1 flag byte + 4-byte split seed

thread_local! {
    static RNG: RefCell<SmallRng> =
        RefCell::new(SmallRng::from_os_rng());
}

static WS_TABLE: &[&[u8]] = &[b" ", b"\t", b"\n", b"\r"];

fn with_rng<F, R>(f: F) -> R
where
    F: FnOnce(&mut SmallRng) -> R,
{
    RNG.with(|cell| f(&mut cell.borrow_mut()))
}

/// Mostly feeds the reader well-formed value streams; libFuzzer's own
/// mutations take care of the malformed ones.
fn mutator(data: &mut [u8], size: usize, max_size: usize, seed: u32) -> usize {
    if size < HEADER || seed.is_multiple_of(10) {
        data[0] = with_rng(|rng| rng.next_u32() as u8);
        data[1..5].copy_from_slice(&with_rng(|rng| rng.next_u32().to_le_bytes()));

        let mut prefix = HEADER;
        while prefix < size.max(HEADER + 1) && prefix < max_size {
            let limit = max_size - prefix;
            prefix += append_value(&mut data[prefix..], size.max(2), limit);
            prefix += append_whitespace(&mut data[prefix..], max_size - prefix);
        }
        prefix
    } else {
        fuzzer_mutate(data, size, max_size)
    }
}

fn append_whitespace(buf: &mut [u8], limit: usize) -> usize {
    with_rng(|rng| {
        if limit == 0 {
            return 0;
        }
        let n = rng.random_range(1..=limit.min(4));
        for byte in &mut buf[..n] {
            *byte = WS_TABLE[rng.random_range(0..WS_TABLE.len())][0];
        }
        n
    })
}

fn append_value(data: &mut [u8], size: usize, limit: usize) -> usize {
    let value = loop {
        let s = with_rng(|rng| rng.random_range(size / 2..size * 2).min(limit));
        let bytes: Vec<u8> = with_rng(|rng| (0..s).map(|_| rng.random::<u8>()).collect());
        if let Ok(value) = ArbitraryValue::arbitrary(&mut arbitrary::Unstructured::new(&bytes)) {
            break value;
        }
    };

    let serialized = serde_json::to_vec(&value.0).expect("Failed to serialize arbitrary value");
    let len = serialized.len().min(limit);
    data[..len].copy_from_slice(&serialized[..len]);
    len
}

fuzz_mutator!(|data: &mut [u8], size: usize, max_size: usize, seed: u32| {
    mutator(data, size, max_size, seed)
});

#[derive(Debug)]
struct ArbitraryValue(Value);

impl<'a> Arbitrary<'a> for ArbitraryValue {
    fn arbitrary(u: &mut arbitrary::Unstructured<'_>) -> arbitrary::Result<Self> {
        let value = match u.choose_index(21)? {
            0 => Value::Null,
            1 => Value::Bool(u.arbitrary()?),
            2 => {
                let n: f64 = u.arbitrary()?;
                Value::Number(
                    serde_json::Number::from_f64(n).ok_or(arbitrary::Error::IncorrectFormat)?,
                )
            }
            3..=10 => Value::String(u.arbitrary()?),
            11..=15 => {
                let elems: Vec<ArbitraryValue> = u.arbitrary()?;
                Value::Array(elems.into_iter().map(|v| v.0).collect())
            }
            _ => {
                let m: Vec<(String, ArbitraryValue)> = u.arbitrary()?;
                Value::Object(Map::from_iter(m.into_iter().map(|(k, v)| (k, v.0))))
            }
        };
        Ok(ArbitraryValue(value))
    }
}

/// Reduces an outcome to what must not depend on chunking.
fn outcome<T: PartialEq + std::fmt::Debug>(
    result: Result<Vec<T>, ReaderError>,
) -> Result<Vec<T>, (bool, bool)> {
    result.map_err(|err| (err.is_malformed(), err.is_incomplete()))
}

fn reader(data: &[u8]) {
    if data.len() < HEADER {
        return;
    }

    let flags = data[0];
    let seed = u32::from_le_bytes([data[1], data[2], data[3], data[4]]);
    let data = &data[HEADER..];

    let policy = if flags & 1 == 0 {
        CompletionPolicy::Streaming
    } else {
        CompletionPolicy::SingleDocument
    };
    let options = ReaderOptions {
        policy,
        max_depth: (flags & 2 != 0).then_some(64),
    };

    // Offsets derived from the seed; the same bytes in one chunk and in many
    // must give the same answer.
    let offsets: Vec<usize> = (0..(flags >> 2) as usize)
        .map(|i| (seed as usize).wrapping_mul(i + 1).rotate_left(i as u32 * 7))
        .collect();
    let chunks = split_at_offsets(data, &offsets);

    let whole = IncrementalReader::with_options(TreeDecoder, options).read_all([data]);
    let chunked = IncrementalReader::with_options(TreeDecoder, options).read_all(&chunks);
    assert_eq!(outcome(whole), outcome(chunked));

    // Whatever serde_json accepts as one document, the reader accepts too.
    if options.max_depth.is_none() {
        if let Ok(expected) = serde_json::from_slice::<Value>(data) {
            let actual = IncrementalReader::single_document(TypedDecoder::<Value>::new())
                .read_all(&chunks)
                .expect("reader rejected a document serde_json accepts");
            assert_eq!(actual, vec![expected]);
        }
    }
}

fuzz_target!(|data: &[u8]| reader(data));
