use serde_json::Value;
use thiserror::Error;

use crate::{ByteCodecError, JDataDType};

#[derive(Debug, Error)]
/// Errors that may occur when encoding arrays into, or decoding them from,
/// JData annotations.
pub enum JDataError {
    /// the compression method is not registered in the codec registry
    #[error("compression method {method:?} is not supported")]
    UnsupportedCompressionMethod {
        /// The requested compression method name
        method: String,
    },
    /// a registered compression codec failed to encode or decode
    #[error("compression method {method:?} failed")]
    CompressionFailed {
        /// The compression method name
        method: String,
        /// Opaque source error
        source: ByteCodecError,
    },
    /// the array cannot be represented as a JData annotation
    #[error("invalid input array: {reason}")]
    InvalidInput {
        /// Why the input was rejected
        reason: String,
    },
    /// the JSON node is not a well-formed JData array annotation
    #[error("invalid JData array annotation: {reason}")]
    InvalidArrayAnnotation {
        /// Why the annotation was rejected
        reason: String,
    },
    /// the `_ArrayType_` does not name a supported dtype
    #[error("cannot cast to the unknown array type {dtype:?}")]
    TypeCastError {
        /// The unknown dtype name
        dtype: String,
    },
    /// a payload value cannot be represented in the declared dtype
    #[error("cannot cast the value {value} to the array type {dtype}")]
    ValueCastError {
        /// The declared dtype
        dtype: JDataDType,
        /// The value that could not be cast
        value: Value,
    },
    /// the declared size is inconsistent with the payload
    #[error("the declared size {expected:?} is inconsistent with the payload {found:?}")]
    DimensionMismatch {
        /// The declared size
        expected: Vec<usize>,
        /// The payload length, or the 1-based coordinate that lies outside
        /// the declared size
        found: Vec<usize>,
    },
}
