use alloc::vec::Vec;

/// Split `payload` into approximately equal-sized chunks.
///
/// Chunk boundaries fall on arbitrary bytes, including inside multi-byte
/// UTF-8 sequences and escape sequences.
///
/// # Panics
///
/// Panics if `parts` is zero.
#[must_use]
pub fn produce_chunks(payload: &[u8], parts: usize) -> Vec<&[u8]> {
    assert!(parts > 0);
    let chunk_size = payload.len().div_ceil(parts).max(1);
    payload.chunks(chunk_size).collect()
}

/// Split `payload` at the given offsets.
///
/// Offsets are taken modulo `payload.len() + 1`, sorted and deduplicated, so
/// any sequence of numbers (e.g. from a property test) yields a valid split
/// into non-empty chunks.
#[must_use]
pub fn split_at_offsets<'a>(payload: &'a [u8], offsets: &[usize]) -> Vec<&'a [u8]> {
    let mut cuts: Vec<usize> = offsets
        .iter()
        .map(|offset| offset % (payload.len() + 1))
        .filter(|&cut| cut > 0 && cut < payload.len())
        .collect();
    cuts.sort_unstable();
    cuts.dedup();

    let mut chunks = Vec::with_capacity(cuts.len() + 1);
    let mut start = 0;
    for cut in cuts {
        chunks.push(&payload[start..cut]);
        start = cut;
    }
    if start < payload.len() {
        chunks.push(&payload[start..]);
    }
    chunks
}
