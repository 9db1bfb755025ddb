//! [![MSRV]][rust-version] [![Latest Version]][crates.io] [![Rust Doc Crate]][docs.rs]
//!
//! [MSRV]: https://img.shields.io/badge/MSRV-1.85.0-blue
//! [rust-version]: https://doc.rust-lang.org/cargo/reference/rust-version.html
//!
//! [Latest Version]: https://img.shields.io/crates/v/jdata-codecs
//! [crates.io]: https://crates.io/crates/jdata-codecs
//!
//! [Rust Doc Crate]: https://img.shields.io/docsrs/jdata-codecs
//! [docs.rs]: https://docs.rs/jdata-codecs/
//!
//! Registry of all built-in compression codecs for [`jdata`] array
//! annotations.
//!
//! | name    | codec                        |
//! |---------|------------------------------|
//! | `zlib`  | [`ZlibCodec`]                |
//! | `gzip`  | [`GzipCodec`]                |
//! | `lz4`   | [`Lz4Codec`]                 |
//! | `lz4hc` | [`Lz4Codec`], read and write |
//! | `lzma`  | [`LzmaCodec`]                |
//!
//! `lzip` is not provided, so annotations that request it fail with
//! [`jdata::JDataError::UnsupportedCompressionMethod`].

#[cfg(test)]
use ::{ndarray as _, num_complex as _, serde_json as _};

use jdata::CodecRegistry;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub use jdata_gzip::{GzipCodec, GzipLevel};
pub use jdata_lz4::Lz4Codec;
pub use jdata_lzma::LzmaCodec;
pub use jdata_zlib::{ZlibCodec, ZlibLevel};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
/// Configuration of every built-in compression codec
pub struct CodecsConfig {
    /// Configuration of the `zlib` codec
    #[serde(default)]
    pub zlib: ZlibCodec,
    /// Configuration of the `gzip` codec
    #[serde(default)]
    pub gzip: GzipCodec,
    /// Configuration of the `lz4` and `lz4hc` codecs
    #[serde(default)]
    pub lz4: Lz4Codec,
    /// Configuration of the `lzma` codec
    #[serde(default)]
    pub lzma: LzmaCodec,
}

impl CodecsConfig {
    #[must_use]
    /// Creates a registry with all built-in codecs, configured by `self`.
    pub fn into_registry(self) -> CodecRegistry {
        let registry = CodecRegistry::new()
            .with(ZlibCodec::NAME, self.zlib)
            .with(GzipCodec::NAME, self.gzip)
            .with(Lz4Codec::NAME, self.lz4.clone())
            .with(Lz4Codec::HC_NAME, self.lz4)
            .with(LzmaCodec::NAME, self.lzma);

        log::debug!("registered the compression codecs {:?}", registry.names());

        registry
    }
}

#[must_use]
/// Creates a registry with all built-in codecs in their default
/// configuration.
pub fn default_registry() -> CodecRegistry {
    CodecsConfig::default().into_registry()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names() {
        assert_eq!(
            default_registry().names(),
            ["gzip", "lz4", "lz4hc", "lzma", "zlib"]
        );
        assert!(!default_registry().contains("lzip"));
    }

    #[test]
    fn bytes_roundtrip() {
        let registry = default_registry();
        let data = (0..512_u16).flat_map(|x| (x % 3).to_le_bytes()).collect::<Vec<u8>>();

        for name in registry.names() {
            let Ok(encoded) = registry.encode(name, &data) else {
                panic!("{name} failed to encode");
            };
            assert_eq!(registry.decode(name, &encoded).ok(), Some(data.clone()));
        }
    }
}
