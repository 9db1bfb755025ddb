//! [![MSRV]][rust-version] [![Latest Version]][crates.io] [![Rust Doc Crate]][docs.rs]
//!
//! [MSRV]: https://img.shields.io/badge/MSRV-1.85.0-blue
//! [rust-version]: https://doc.rust-lang.org/cargo/reference/rust-version.html
//!
//! [Latest Version]: https://img.shields.io/crates/v/jdata
//! [crates.io]: https://crates.io/crates/jdata
//!
//! [Rust Doc Crate]: https://img.shields.io/docsrs/jdata
//! [docs.rs]: https://docs.rs/jdata/
//!
//! Lossless storage of typed, n-dimensional, sparse, and complex arrays in
//! plain JSON using [JData] array annotations.
//!
//! An annotated array is a JSON object with reserved keys, e.g.
//!
//! ```json
//! {
//!     "_ArrayType_": "uint8",
//!     "_ArraySize_": [2, 3],
//!     "_ArrayIsSparse_": true,
//!     "_ArrayData_": [[1, 1, 1], [2, 2, 1]]
//! }
//! ```
//!
//! The [`encode`]r decides whether an array can be written as a plain JSON
//! array or needs such an annotation, and the [`decode`]r reconstructs the
//! typed array from it. Large dense payloads can be compressed with any
//! [`ByteCodec`] from a [`CodecRegistry`] and are then embedded as
//! [`base64`] text.
//!
//! [JData]: https://github.com/NeuroJSON/jdata

mod annotation;
mod array;
pub mod base64;
mod decode;
mod dtype;
mod encode;
mod error;
mod options;
mod registry;
mod sparse;
mod tree;

pub use annotation::{
    ARRAY_COMPRESSED_DATA, ARRAY_COMPRESSION_METHOD, ARRAY_COMPRESSION_SIZE, ARRAY_DATA,
    ARRAY_IS_COMPLEX, ARRAY_IS_SPARSE, ARRAY_ORDER, ARRAY_SIZE, ARRAY_TYPE, ARRAY_ZIP_DATA,
    ARRAY_ZIP_SIZE, ARRAY_ZIP_TYPE, is_annotated,
};
pub use array::{AnyArray, ArrayKind, ComplexArray, TypedArray};
pub use decode::{Decoded, decode};
pub use dtype::{Element, JDataDType, NumberFormat};
pub use encode::encode;
pub use error::JDataError;
pub use options::{DecodeOptions, EncodeOptions, FormatVersion};
pub use registry::{ByteCodec, ByteCodecError, CodecRegistry};
pub use sparse::SparseMatrix;
pub use tree::{JDataValue, decode_tree, encode_tree};

mod sealed {
    pub trait Sealed {}
}
