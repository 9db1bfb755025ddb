//! [![MSRV]][rust-version] [![Latest Version]][crates.io] [![Rust Doc Crate]][docs.rs]
//!
//! [MSRV]: https://img.shields.io/badge/MSRV-1.85.0-blue
//! [rust-version]: https://doc.rust-lang.org/cargo/reference/rust-version.html
//!
//! [Latest Version]: https://img.shields.io/crates/v/jdata-gzip
//! [crates.io]: https://crates.io/crates/jdata-gzip
//!
//! [Rust Doc Crate]: https://img.shields.io/docsrs/jdata-gzip
//! [docs.rs]: https://docs.rs/jdata-gzip/
//!
//! Gzip compression codec for [`jdata`] array annotations.

#[cfg(test)]
use ::serde_json as _;

use std::io::{self, Read, Write};

use flate2::{Compression, read::GzDecoder, write::GzEncoder};
use jdata::{ByteCodec, ByteCodecError};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
/// Codec providing compression using Gzip
pub struct GzipCodec {
    /// Gzip compression level.
    ///
    /// The level ranges from 0, no compression, to 9, best compression
    /// (default: 6).
    #[serde(default)]
    pub level: GzipLevel,
}

impl GzipCodec {
    /// Name under which the codec is registered
    pub const NAME: &'static str = "gzip";
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, JsonSchema)]
#[schemars(transparent)]
/// Gzip compression level.
///
/// The level ranges from 0, no compression, to 9, best compression.
pub struct GzipLevel {
    level: u32,
}

impl GzipLevel {
    /// Creates a compression `level`, clamped to at most 9.
    #[must_use]
    pub fn new(level: u32) -> Self {
        Self {
            level: level.min(Compression::best().level()),
        }
    }

    /// Returns the numeric compression level.
    #[must_use]
    pub const fn level(self) -> u32 {
        self.level
    }
}

impl Default for GzipLevel {
    fn default() -> Self {
        Self {
            level: Compression::default().level(),
        }
    }
}

impl Serialize for GzipLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.level.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for GzipLevel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let level = u32::deserialize(deserializer)?;

        let best = Compression::best().level();

        if level > best {
            return Err(serde::de::Error::custom(format!(
                "level {level} is not in 0..={best}"
            )));
        }

        Ok(Self { level })
    }
}

impl ByteCodec for GzipCodec {
    fn encode(&self, data: &[u8]) -> Result<Vec<u8>, ByteCodecError> {
        compress(data, self.level).map_err(ByteCodecError::new)
    }

    fn decode(&self, encoded: &[u8]) -> Result<Vec<u8>, ByteCodecError> {
        decompress(encoded).map_err(ByteCodecError::new)
    }
}

#[derive(Debug, Error)]
/// Errors that may occur when applying the [`GzipCodec`].
pub enum GzipCodecError {
    /// [`GzipCodec`] failed to encode the data
    #[error("Gzip failed to encode the data")]
    GzipEncodeFailed {
        /// Opaque source error
        source: GzipCodingError,
    },
    /// [`GzipCodec`] failed to decode the encoded data
    #[error("Gzip failed to decode the encoded data")]
    GzipDecodeFailed {
        /// Opaque source error
        source: GzipCodingError,
    },
}

#[derive(Debug, Error)]
#[error(transparent)]
/// Opaque error for when encoding or decoding with Gzip fails
pub struct GzipCodingError(io::Error);

/// Compress the `data` into a single Gzip member with the provided `level`.
///
/// # Errors
///
/// Errors with [`GzipCodecError::GzipEncodeFailed`] if encoding failed.
pub fn compress(data: &[u8], level: GzipLevel) -> Result<Vec<u8>, GzipCodecError> {
    let mut encoder = GzEncoder::new(
        Vec::with_capacity(data.len() / 2),
        Compression::new(level.level()),
    );

    encoder
        .write_all(data)
        .and_then(|()| encoder.finish())
        .map_err(|err| GzipCodecError::GzipEncodeFailed {
            source: GzipCodingError(err),
        })
}

/// Decompress the Gzip-`encoded` data.
///
/// # Errors
///
/// Errors with [`GzipCodecError::GzipDecodeFailed`] if the encoded data is
/// not a valid Gzip stream.
pub fn decompress(encoded: &[u8]) -> Result<Vec<u8>, GzipCodecError> {
    let mut decoded = Vec::with_capacity(encoded.len().saturating_mul(3));

    GzDecoder::new(encoded)
        .read_to_end(&mut decoded)
        .map_err(|err| GzipCodecError::GzipDecodeFailed {
            source: GzipCodingError(err),
        })?;

    Ok(decoded)
}
