//! Decoding of JSON string escapes.
//!
//! The tokenizer validates escapes (including surrogate pairing) while it
//! lexes, so [`unescape`] only ever sees well-formed string content and has
//! no error path of its own. Anything it cannot decode is replaced with
//! U+FFFD rather than rejected.

use alloc::{borrow::Cow, string::String};

/// Convert a single ASCII hex digit into its 0..=15 value.
#[inline]
pub(crate) fn hex_val(b: u8) -> Option<u16> {
    match b {
        b'0'..=b'9' => Some(u16::from(b - b'0')),
        b'a'..=b'f' => Some(u16::from(b - b'a') + 10),
        b'A'..=b'F' => Some(u16::from(b - b'A') + 10),
        _ => None,
    }
}

/// Reads the four hex digits of a `\uXXXX` escape starting at `raw[at]`.
fn read_hex4(raw: &[u8], at: usize) -> Option<u16> {
    let digits = raw.get(at..at + 4)?;
    digits
        .iter()
        .try_fold(0u16, |acc, &b| Some((acc << 4) | hex_val(b)?))
}

/// Decodes the content of a JSON string (the bytes between the quotes).
///
/// Borrows when the content contains no escapes.
pub(crate) fn unescape(raw: &[u8]) -> Cow<'_, str> {
    let Some(first) = raw.iter().position(|&b| b == b'\\') else {
        return String::from_utf8_lossy(raw);
    };

    let mut out = String::with_capacity(raw.len());
    out.push_str(&String::from_utf8_lossy(&raw[..first]));
    let mut i = first;
    while i < raw.len() {
        if raw[i] != b'\\' {
            let run = raw[i..]
                .iter()
                .position(|&b| b == b'\\')
                .map_or(raw.len(), |n| i + n);
            out.push_str(&String::from_utf8_lossy(&raw[i..run]));
            i = run;
            continue;
        }

        let Some(&esc) = raw.get(i + 1) else {
            out.push(char::REPLACEMENT_CHARACTER);
            break;
        };
        i += 2;
        let ch = match esc {
            b'"' => '"',
            b'\\' => '\\',
            b'/' => '/',
            b'b' => '\u{0008}',
            b'f' => '\u{000C}',
            b'n' => '\n',
            b'r' => '\r',
            b't' => '\t',
            b'u' => {
                let Some(unit) = read_hex4(raw, i) else {
                    out.push(char::REPLACEMENT_CHARACTER);
                    break;
                };
                i += 4;
                if (0xD800..0xDC00).contains(&unit) && raw.get(i..i + 2) == Some(b"\\u") {
                    match read_hex4(raw, i + 2) {
                        Some(low @ 0xDC00..0xE000) => {
                            i += 6;
                            let code = 0x1_0000
                                + ((u32::from(unit) - 0xD800) << 10)
                                + (u32::from(low) - 0xDC00);
                            char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
                        }
                        _ => char::REPLACEMENT_CHARACTER,
                    }
                } else {
                    char::from_u32(u32::from(unit)).unwrap_or(char::REPLACEMENT_CHARACTER)
                }
            }
            _ => char::REPLACEMENT_CHARACTER,
        };
        out.push(ch);
    }
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::{hex_val, unescape};

    #[test]
    fn borrows_without_escapes() {
        let out = unescape(b"plain text");
        assert!(matches!(out, alloc::borrow::Cow::Borrowed("plain text")));
    }

    #[test]
    fn simple_escapes() {
        assert_eq!(unescape(br#"a\"b\\c\/d\be\ff\ng\rh\ti"#), "a\"b\\c/d\u{8}e\u{c}f\ng\rh\ti");
    }

    #[test]
    fn unicode_escapes() {
        assert_eq!(unescape(b"\\u0041\\u00e9"), "A\u{e9}");
        assert_eq!(unescape(b"x\\ud83d\\ude00y"), "x\u{1F600}y");
    }

    #[test]
    fn multibyte_runs_survive() {
        assert_eq!(unescape("héllo\\nwörld".as_bytes()), "héllo\nwörld");
    }

    #[test]
    fn mixed_case_hex() {
        assert_eq!(hex_val(b'A'), Some(10));
        assert_eq!(hex_val(b'f'), Some(15));
        assert_eq!(hex_val(b'G'), None);
        assert_eq!(unescape(b"\\uAbCd"), "\u{ABCD}");
    }
}
