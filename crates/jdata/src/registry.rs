use std::{collections::HashMap, error::Error, fmt, sync::Arc};

use thiserror::Error;

use crate::JDataError;

/// Byte-stream compression codec that [`encode`][`ByteCodec::encode`]s and
/// [`decode`][`ByteCodec::decode`]s flat byte runs.
pub trait ByteCodec: 'static + Send + Sync {
    /// Compresses the `data` and returns the result.
    ///
    /// # Errors
    ///
    /// Errors if compressing the bytes fails.
    fn encode(&self, data: &[u8]) -> Result<Vec<u8>, ByteCodecError>;

    /// Decompresses the `encoded` data and returns the result.
    ///
    /// # Errors
    ///
    /// Errors if decompressing the bytes fails.
    fn decode(&self, encoded: &[u8]) -> Result<Vec<u8>, ByteCodecError>;
}

#[derive(Debug, Error)]
#[error(transparent)]
/// Opaque error for when a [`ByteCodec`] fails
pub struct ByteCodecError(Box<dyn Error + Send + Sync>);

impl ByteCodecError {
    #[must_use]
    /// Wraps the codec-specific `error`.
    pub fn new(error: impl Error + Send + Sync + 'static) -> Self {
        Self(Box::new(error))
    }
}

#[derive(Clone, Default)]
/// Registry of [`ByteCodec`]s, keyed by their lowercase names.
///
/// The registry is passed explicitly to the encoder and decoder. It starts
/// out empty; the `jdata-codecs` crate provides one with all built-in codecs.
pub struct CodecRegistry {
    codecs: HashMap<String, Arc<dyn ByteCodec>>,
}

impl CodecRegistry {
    #[must_use]
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the `codec` under the (case-insensitive) `name`.
    ///
    /// Returns the codec previously registered under the same name, if any.
    pub fn register(
        &mut self,
        name: &str,
        codec: impl ByteCodec,
    ) -> Option<Arc<dyn ByteCodec>> {
        self.codecs.insert(name.to_lowercase(), Arc::new(codec))
    }

    #[must_use]
    /// Builder-style variant of [`CodecRegistry::register`].
    pub fn with(mut self, name: &str, codec: impl ByteCodec) -> Self {
        self.register(name, codec);
        self
    }

    #[must_use]
    /// Returns the codec registered under `name`, if any.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn ByteCodec>> {
        self.codecs.get(&name.to_lowercase())
    }

    #[must_use]
    /// Returns whether a codec is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns the sorted names of all registered codecs.
    pub fn names(&self) -> Vec<&str> {
        let mut names = self.codecs.keys().map(String::as_str).collect::<Vec<_>>();
        names.sort_unstable();
        names
    }

    /// Compresses `data` with the codec registered under `name`.
    ///
    /// # Errors
    ///
    /// Errors with
    /// - [`JDataError::UnsupportedCompressionMethod`] if no codec is
    ///   registered under `name`
    /// - [`JDataError::CompressionFailed`] if the codec fails
    pub fn encode(&self, name: &str, data: &[u8]) -> Result<Vec<u8>, JDataError> {
        self.lookup(name)?
            .encode(data)
            .map_err(|source| JDataError::CompressionFailed {
                method: String::from(name),
                source,
            })
    }

    /// Decompresses `encoded` with the codec registered under `name`.
    ///
    /// # Errors
    ///
    /// Errors with
    /// - [`JDataError::UnsupportedCompressionMethod`] if no codec is
    ///   registered under `name`
    /// - [`JDataError::CompressionFailed`] if the codec fails
    pub fn decode(&self, name: &str, encoded: &[u8]) -> Result<Vec<u8>, JDataError> {
        self.lookup(name)?
            .decode(encoded)
            .map_err(|source| JDataError::CompressionFailed {
                method: String::from(name),
                source,
            })
    }

    fn lookup(&self, name: &str) -> Result<&Arc<dyn ByteCodec>, JDataError> {
        self.get(name)
            .ok_or_else(|| JDataError::UnsupportedCompressionMethod {
                method: String::from(name),
            })
    }
}

impl fmt::Debug for CodecRegistry {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("CodecRegistry")
            .field("codecs", &self.names())
            .finish()
    }
}
