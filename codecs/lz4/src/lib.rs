//! [![MSRV]][rust-version] [![Latest Version]][crates.io] [![Rust Doc Crate]][docs.rs]
//!
//! [MSRV]: https://img.shields.io/badge/MSRV-1.85.0-blue
//! [rust-version]: https://doc.rust-lang.org/cargo/reference/rust-version.html
//!
//! [Latest Version]: https://img.shields.io/crates/v/jdata-lz4
//! [crates.io]: https://crates.io/crates/jdata-lz4
//!
//! [Rust Doc Crate]: https://img.shields.io/docsrs/jdata-lz4
//! [docs.rs]: https://docs.rs/jdata-lz4/
//!
//! LZ4 compression codec for [`jdata`] array annotations.
//!
//! Payloads are written in the LZ4 frame format. The same codec is
//! registered for the `lz4hc` name, since any high-compression LZ4 stream is
//! a valid LZ4 frame and can be read by the same decoder.

#[cfg(test)]
use ::serde_json as _;

use std::io::{self, Read, Write};

use jdata::{ByteCodec, ByteCodecError};
use lz4_flex::frame::{BlockSize, FrameDecoder, FrameEncoder, FrameInfo};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
/// Codec providing compression using the LZ4 frame format
pub struct Lz4Codec {
    /// Append a checksum of the uncompressed content to every frame
    #[serde(default)]
    pub content_checksum: bool,
}

impl Lz4Codec {
    /// Name under which the codec is registered
    pub const NAME: &'static str = "lz4";
    /// Name under which the codec is registered for high-compression streams
    pub const HC_NAME: &'static str = "lz4hc";
}

impl ByteCodec for Lz4Codec {
    fn encode(&self, data: &[u8]) -> Result<Vec<u8>, ByteCodecError> {
        compress(data, self.content_checksum).map_err(ByteCodecError::new)
    }

    fn decode(&self, encoded: &[u8]) -> Result<Vec<u8>, ByteCodecError> {
        decompress(encoded).map_err(ByteCodecError::new)
    }
}

#[derive(Debug, Error)]
/// Errors that may occur when applying the [`Lz4Codec`].
pub enum Lz4CodecError {
    /// [`Lz4Codec`] failed to encode the data
    #[error("Lz4 failed to encode the data")]
    Lz4EncodeFailed {
        /// Opaque source error
        source: Lz4CodingError,
    },
    /// [`Lz4Codec`] failed to decode the encoded data
    #[error("Lz4 failed to decode the encoded data")]
    Lz4DecodeFailed {
        /// Opaque source error
        source: Lz4CodingError,
    },
}

#[derive(Debug, Error)]
#[error(transparent)]
/// Opaque error for when encoding or decoding with LZ4 fails
pub struct Lz4CodingError(io::Error);

/// Compress the `data` into a single LZ4 frame, optionally with a
/// `content_checksum`.
///
/// # Errors
///
/// Errors with [`Lz4CodecError::Lz4EncodeFailed`] if encoding failed.
pub fn compress(data: &[u8], content_checksum: bool) -> Result<Vec<u8>, Lz4CodecError> {
    let frame_info = FrameInfo::new()
        .block_size(BlockSize::Max4MB)
        .content_size(u64::try_from(data.len()).ok())
        .content_checksum(content_checksum);

    let mut encoder = FrameEncoder::with_frame_info(frame_info, Vec::with_capacity(data.len() / 2));

    encoder
        .write_all(data)
        .and_then(|()| encoder.finish().map_err(io::Error::from))
        .map_err(|err| Lz4CodecError::Lz4EncodeFailed {
            source: Lz4CodingError(err),
        })
}

/// Decompress the LZ4-`encoded` data, which may consist of several
/// concatenated frames.
///
/// # Errors
///
/// Errors with [`Lz4CodecError::Lz4DecodeFailed`] if the encoded data is
/// not a valid LZ4 frame.
pub fn decompress(encoded: &[u8]) -> Result<Vec<u8>, Lz4CodecError> {
    let mut decoded = Vec::with_capacity(encoded.len().saturating_mul(3));

    FrameDecoder::new(encoded)
        .read_to_end(&mut decoded)
        .map_err(|err| Lz4CodecError::Lz4DecodeFailed {
            source: Lz4CodingError(err),
        })?;

    Ok(decoded)
}
