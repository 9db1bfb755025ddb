//! [![MSRV]][rust-version] [![Latest Version]][crates.io] [![Rust Doc Crate]][docs.rs]
//!
//! [MSRV]: https://img.shields.io/badge/MSRV-1.85.0-blue
//! [rust-version]: https://doc.rust-lang.org/cargo/reference/rust-version.html
//!
//! [Latest Version]: https://img.shields.io/crates/v/jdata-zlib
//! [crates.io]: https://crates.io/crates/jdata-zlib
//!
//! [Rust Doc Crate]: https://img.shields.io/docsrs/jdata-zlib
//! [docs.rs]: https://docs.rs/jdata-zlib/
//!
//! Zlib compression codec for [`jdata`] array annotations.
//!
//! Payloads are written as zlib streams, i.e. raw deflate data with a zlib
//! header and an Adler-32 checksum.

#[cfg(test)]
use ::serde_json as _;

use jdata::{ByteCodec, ByteCodecError};
use schemars::{JsonSchema, JsonSchema_repr};
use serde::{Deserialize, Serialize};
use serde_repr::{Deserialize_repr, Serialize_repr};
use thiserror::Error;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
/// Codec providing compression using Zlib
pub struct ZlibCodec {
    /// Compression level
    #[serde(default)]
    pub level: ZlibLevel,
}

impl ZlibCodec {
    /// Name under which the codec is registered
    pub const NAME: &'static str = "zlib";
}

#[derive(
    Copy, Clone, Debug, Default, PartialEq, Eq, Serialize_repr, Deserialize_repr, JsonSchema_repr,
)]
#[repr(u8)]
/// Zlib compression level.
///
/// The level ranges from 0, no compression, to 9, best compression
/// (default: 6).
#[allow(missing_docs)]
pub enum ZlibLevel {
    ZNoCompression = 0,
    ZBestSpeed = 1,
    ZLevel2 = 2,
    ZLevel3 = 3,
    ZLevel4 = 4,
    ZLevel5 = 5,
    #[default]
    ZLevel6 = 6,
    ZLevel7 = 7,
    ZLevel8 = 8,
    ZBestCompression = 9,
}

impl ByteCodec for ZlibCodec {
    fn encode(&self, data: &[u8]) -> Result<Vec<u8>, ByteCodecError> {
        Ok(compress(data, self.level))
    }

    fn decode(&self, encoded: &[u8]) -> Result<Vec<u8>, ByteCodecError> {
        decompress(encoded).map_err(ByteCodecError::new)
    }
}

#[derive(Debug, Error)]
/// Errors that may occur when applying the [`ZlibCodec`].
pub enum ZlibCodecError {
    /// [`ZlibCodec`] failed to decode the encoded data
    #[error("Zlib failed to decode the encoded data")]
    ZlibDecodeFailed {
        /// Opaque source error
        source: ZlibDecodeError,
    },
}

#[derive(Debug, Error)]
#[error(transparent)]
/// Opaque error for when decoding with Zlib fails
pub struct ZlibDecodeError(miniz_oxide::inflate::DecompressError);

#[must_use]
/// Compress the `data` using Zlib with the provided `level`.
///
/// # Panics
///
/// Panics if the infallible encoding with Zlib fails.
pub fn compress(data: &[u8], level: ZlibLevel) -> Vec<u8> {
    let mut encoded = vec![0; (data.len() / 2).max(2)];

    let mut in_pos = 0;
    let mut out_pos = 0;

    // The comp flags function sets the zlib flag if the window_bits parameter
    //  is > 0.
    let flags =
        miniz_oxide::deflate::core::create_comp_flags_from_zip_params((level as u8).into(), 1, 0);
    let mut compressor = miniz_oxide::deflate::core::CompressorOxide::new(flags);

    loop {
        let (Some(data_left), Some(encoded_left)) =
            (data.get(in_pos..), encoded.get_mut(out_pos..))
        else {
            #[allow(clippy::panic)] // this would be a bug and cannot be user-caused
            {
                panic!("Zlib encode bug: input or output is out of bounds")
            }
        };

        let (status, bytes_in, bytes_out) = miniz_oxide::deflate::core::compress(
            &mut compressor,
            data_left,
            encoded_left,
            miniz_oxide::deflate::core::TDEFLFlush::Finish,
        );

        out_pos += bytes_out;
        in_pos += bytes_in;

        match status {
            miniz_oxide::deflate::core::TDEFLStatus::Okay => {
                // We need more space, so resize the vector.
                if encoded.len().saturating_sub(out_pos) < 30 {
                    encoded.resize(encoded.len() * 2, 0);
                }
            }
            miniz_oxide::deflate::core::TDEFLStatus::Done => {
                encoded.truncate(out_pos);

                assert!(
                    in_pos == data.len(),
                    "Zlib encode bug: consumed less input than expected"
                );

                return encoded;
            }
            #[allow(clippy::panic)] // this would be a bug and cannot be user-caused
            err => panic!("Zlib encode bug: {err:?}"),
        }
    }
}

/// Decompress the Zlib-`encoded` data.
///
/// # Errors
///
/// Errors with [`ZlibCodecError::ZlibDecodeFailed`] if the encoded data is
/// not a valid Zlib stream.
pub fn decompress(encoded: &[u8]) -> Result<Vec<u8>, ZlibCodecError> {
    miniz_oxide::inflate::decompress_to_vec_zlib(encoded).map_err(|err| {
        ZlibCodecError::ZlibDecodeFailed {
            source: ZlibDecodeError(err),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let data = (0..1000_u32).flat_map(|x| (x % 7).to_le_bytes()).collect::<Vec<u8>>();

        for level in [
            ZlibLevel::ZNoCompression,
            ZlibLevel::ZBestSpeed,
            ZlibLevel::ZLevel6,
            ZlibLevel::ZBestCompression,
        ] {
            let encoded = compress(&data, level);
            assert_eq!(decompress(&encoded).ok(), Some(data.clone()));
        }

        assert!(compress(&data, ZlibLevel::ZBestCompression).len() < data.len());
    }

    #[test]
    fn empty() {
        let encoded = compress(&[], ZlibLevel::default());
        assert_eq!(decompress(&encoded).ok(), Some(Vec::new()));
    }

    #[test]
    fn zlib_header() {
        let encoded = compress(b"jdata", ZlibLevel::default());
        // CMF byte of a deflate stream with a 32 KiB window
        assert_eq!(encoded.first(), Some(&0x78));
    }

    #[test]
    fn corrupted() {
        assert!(matches!(
            ZlibCodec::default().decode(b"not zlib"),
            Err(err) if err.to_string() == "Zlib failed to decode the encoded data"
        ));
    }
}
