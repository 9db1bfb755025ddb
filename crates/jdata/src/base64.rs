//! Base64 embedding of binary payloads into JSON strings.
//!
//! Encoding produces standard, padded base64. Decoding is lenient: it accepts
//! both the standard (`+`, `/`) and the URL-safe (`-`, `_`) alphabet, even
//! mixed within one string, treats `=` as optional padding, and skips every
//! other character, e.g. line breaks inserted by other encoders.

use ::base64::{Engine, engine::general_purpose::STANDARD};

/// Symbol value of characters outside the alphabet, including the padding.
const SKIP: u8 = 64;

#[allow(clippy::indexing_slicing)] // all indices are below 256
const DECODE_TABLE: [u8; 256] = {
    let mut table = [SKIP; 256];

    let mut i = 0;
    while i < 26 {
        #[allow(clippy::cast_possible_truncation)]
        let symbol = i as u8;
        table[(b'A' + symbol) as usize] = symbol;
        table[(b'a' + symbol) as usize] = symbol + 26;
        i += 1;
    }

    let mut i = 0;
    while i < 10 {
        #[allow(clippy::cast_possible_truncation)]
        let symbol = i as u8;
        table[(b'0' + symbol) as usize] = symbol + 52;
        i += 1;
    }

    table[b'+' as usize] = 62;
    table[b'/' as usize] = 63;
    table[b'-' as usize] = 62;
    table[b'_' as usize] = 63;

    table
};

#[must_use]
/// Encodes the `bytes` as standard, padded base64 text.
pub fn encode(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

#[must_use]
/// Decodes base64 `text` into bytes, skipping all non-alphabet characters.
///
/// A trailing single symbol, which cannot complete a byte, is dropped.
pub fn decode(text: &str) -> Vec<u8> {
    let symbols = text
        .bytes()
        .map(|c| DECODE_TABLE.get(usize::from(c)).copied().unwrap_or(SKIP))
        .filter(|symbol| *symbol < SKIP)
        .collect::<Vec<_>>();

    let mut bytes = Vec::with_capacity(symbols.len() / 4 * 3 + 2);

    for group in symbols.chunks(4) {
        let s = |i: usize| group.get(i).copied().unwrap_or(0);
        let decoded = [
            (s(0) << 2) | (s(1) >> 4),
            (s(1) << 4) | (s(2) >> 2),
            (s(2) << 6) | s(3),
        ];

        // a group of n symbols carries n * 6 bits, i.e. n - 1 complete bytes
        let complete = group.len().saturating_sub(1);
        bytes.extend_from_slice(decoded.get(..complete).unwrap_or(&decoded));
    }

    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard() {
        assert_eq!(encode(b""), "");
        assert_eq!(encode(b"f"), "Zg==");
        assert_eq!(encode(b"fo"), "Zm8=");
        assert_eq!(encode(b"foo"), "Zm9v");
        assert_eq!(encode(b"foobar"), "Zm9vYmFy");

        assert_eq!(decode("Zg=="), b"f");
        assert_eq!(decode("Zm8="), b"fo");
        assert_eq!(decode("Zm9v"), b"foo");
        assert_eq!(decode("Zm9vYmFy"), b"foobar");
    }

    #[test]
    fn missing_padding() {
        assert_eq!(decode("Zg"), b"f");
        assert_eq!(decode("Zm8"), b"fo");
    }

    #[test]
    fn url_safe_alphabet() {
        let bytes = [0xFB, 0xFF, 0xBF];
        assert_eq!(encode(&bytes), "+/+/");
        assert_eq!(decode("+/+/"), bytes);
        assert_eq!(decode("-_-_"), bytes);
        assert_eq!(decode("-/+_"), bytes);
    }

    #[test]
    fn skips_other_characters() {
        assert_eq!(decode("Zm9v\nYm Fy\r\n"), b"foobar");
        assert_eq!(decode("Z*m\u{e9}9v"), b"foo");
        assert_eq!(decode("Zm9vY"), b"foo");
    }

    #[test]
    fn roundtrip() {
        let bytes = (0..=255).collect::<Vec<u8>>();

        for len in 0..bytes.len() {
            let Some(bytes) = bytes.get(..len) else {
                continue;
            };
            assert_eq!(decode(&encode(bytes)), bytes);
        }
    }
}
