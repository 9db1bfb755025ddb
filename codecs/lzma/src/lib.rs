//! [![MSRV]][rust-version] [![Latest Version]][crates.io] [![Rust Doc Crate]][docs.rs]
//!
//! [MSRV]: https://img.shields.io/badge/MSRV-1.85.0-blue
//! [rust-version]: https://doc.rust-lang.org/cargo/reference/rust-version.html
//!
//! [Latest Version]: https://img.shields.io/crates/v/jdata-lzma
//! [crates.io]: https://crates.io/crates/jdata-lzma
//!
//! [Rust Doc Crate]: https://img.shields.io/docsrs/jdata-lzma
//! [docs.rs]: https://docs.rs/jdata-lzma/
//!
//! LZMA compression codec for [`jdata`] array annotations.
//!
//! Payloads are written in the legacy `.lzma` (LZMA-alone) format, with the
//! uncompressed size stored in the header.

#[cfg(test)]
use ::serde_json as _;

use std::io;

use jdata::{ByteCodec, ByteCodecError};
use lzma_rs::compress::{Options, UnpackedSize};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
/// Codec providing compression using LZMA
pub struct LzmaCodec {}

impl LzmaCodec {
    /// Name under which the codec is registered
    pub const NAME: &'static str = "lzma";
}

impl ByteCodec for LzmaCodec {
    fn encode(&self, data: &[u8]) -> Result<Vec<u8>, ByteCodecError> {
        compress(data).map_err(ByteCodecError::new)
    }

    fn decode(&self, encoded: &[u8]) -> Result<Vec<u8>, ByteCodecError> {
        decompress(encoded).map_err(ByteCodecError::new)
    }
}

#[derive(Debug, Error)]
/// Errors that may occur when applying the [`LzmaCodec`].
pub enum LzmaCodecError {
    /// [`LzmaCodec`] failed to encode the data
    #[error("Lzma failed to encode the data")]
    LzmaEncodeFailed {
        /// Opaque source error
        source: LzmaEncodeError,
    },
    /// [`LzmaCodec`] failed to decode the encoded data
    #[error("Lzma failed to decode the encoded data")]
    LzmaDecodeFailed {
        /// Opaque source error
        source: LzmaDecodeError,
    },
}

#[derive(Debug, Error)]
#[error(transparent)]
/// Opaque error for when encoding with LZMA fails
pub struct LzmaEncodeError(io::Error);

#[derive(Debug, Error)]
#[error(transparent)]
/// Opaque error for when decoding with LZMA fails
pub struct LzmaDecodeError(lzma_rs::error::Error);

/// Compress the `data` into an `.lzma` stream.
///
/// # Errors
///
/// Errors with [`LzmaCodecError::LzmaEncodeFailed`] if encoding failed.
pub fn compress(data: &[u8]) -> Result<Vec<u8>, LzmaCodecError> {
    let mut input = data;
    let mut encoded = Vec::with_capacity(data.len() / 2);

    let options = Options {
        unpacked_size: UnpackedSize::WriteToHeader(u64::try_from(data.len()).ok()),
    };

    lzma_rs::lzma_compress_with_options(&mut input, &mut encoded, &options).map_err(|err| {
        LzmaCodecError::LzmaEncodeFailed {
            source: LzmaEncodeError(err),
        }
    })?;

    Ok(encoded)
}

/// Decompress the `.lzma`-`encoded` data.
///
/// # Errors
///
/// Errors with [`LzmaCodecError::LzmaDecodeFailed`] if the encoded data is
/// not a valid `.lzma` stream.
pub fn decompress(encoded: &[u8]) -> Result<Vec<u8>, LzmaCodecError> {
    let mut input = encoded;
    let mut decoded = Vec::with_capacity(encoded.len().saturating_mul(3));

    lzma_rs::lzma_decompress(&mut input, &mut decoded).map_err(|err| {
        LzmaCodecError::LzmaDecodeFailed {
            source: LzmaDecodeError(err),
        }
    })?;

    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let data = (0..2048_u32).flat_map(|x| (x % 5).to_le_bytes()).collect::<Vec<u8>>();

        let Ok(encoded) = compress(&data) else {
            panic!("lzma encoding into a vector cannot fail");
        };
        assert_eq!(decompress(&encoded).ok(), Some(data));
    }

    #[test]
    fn header() {
        let Ok(encoded) = compress(b"jdata") else {
            panic!("lzma encoding into a vector cannot fail");
        };
        // lc=3, lp=0, pb=2 properties byte, followed by the dictionary size
        // and the unpacked size
        assert_eq!(encoded.first(), Some(&0x5D));
        assert_eq!(encoded.get(5..13), Some(&5_u64.to_le_bytes()[..]));
    }

    #[test]
    fn corrupted() {
        assert!(LzmaCodec::default().decode(&[0xFF; 4]).is_err());
    }
}
