//! Reserved keys of the JData array annotation and their recognition.

use serde_json::{Map, Value};

use crate::{JDataDType, JDataError};

/// Declared dtype name of the array
pub const ARRAY_TYPE: &str = "_ArrayType_";
/// Declared shape of the array
pub const ARRAY_SIZE: &str = "_ArraySize_";
/// Marks sparse triplet payloads
pub const ARRAY_IS_SPARSE: &str = "_ArrayIsSparse_";
/// Marks complex payloads
pub const ARRAY_IS_COMPLEX: &str = "_ArrayIsComplex_";
/// Size of the compressed byte run before compression
pub const ARRAY_ZIP_SIZE: &str = "_ArrayZipSize_";
/// Name of the compression codec
pub const ARRAY_ZIP_TYPE: &str = "_ArrayZipType_";
/// Compressed, usually base64-encoded, payload
pub const ARRAY_ZIP_DATA: &str = "_ArrayZipData_";
/// Uncompressed payload
pub const ARRAY_DATA: &str = "_ArrayData_";
/// Element order of the dense payload, only read by the decoder
pub const ARRAY_ORDER: &str = "_ArrayOrder_";

/// Legacy alias of [`ARRAY_ZIP_TYPE`], only read by the decoder
pub const ARRAY_COMPRESSION_METHOD: &str = "_ArrayCompressionMethod_";
/// Legacy alias of [`ARRAY_ZIP_SIZE`], only read by the decoder
pub const ARRAY_COMPRESSION_SIZE: &str = "_ArrayCompressionSize_";
/// Legacy alias of [`ARRAY_ZIP_DATA`], only read by the decoder
pub const ARRAY_COMPRESSED_DATA: &str = "_ArrayCompressedData_";

#[must_use]
/// Returns whether the JSON `object` is an annotated array, i.e. whether it
/// declares an `_ArrayType_` and carries a payload.
pub fn is_annotated(object: &Map<String, Value>) -> bool {
    object.contains_key(ARRAY_TYPE)
        && [ARRAY_DATA, ARRAY_ZIP_DATA, ARRAY_COMPRESSED_DATA]
            .iter()
            .any(|key| object.contains_key(*key))
}

/// Payload of an annotated array
#[derive(Clone, Debug)]
pub(crate) enum Payload<'a> {
    /// Plain JSON payload
    Data(&'a Value),
    /// Compressed payload
    Zip {
        method: &'a str,
        size: Option<Vec<usize>>,
        data: &'a Value,
    },
}

/// Borrowed, structurally validated view of an annotated array
#[derive(Clone, Debug)]
pub(crate) struct Annotation<'a> {
    pub dtype: JDataDType,
    pub size: Option<Vec<usize>>,
    pub is_sparse: bool,
    pub is_complex: bool,
    pub column_major: Option<bool>,
    pub payload: Payload<'a>,
}

impl<'a> Annotation<'a> {
    pub fn parse(object: &'a Map<String, Value>) -> Result<Self, JDataError> {
        let dtype = match object.get(ARRAY_TYPE) {
            Some(Value::String(dtype)) => dtype.parse()?,
            Some(dtype) => {
                return Err(JDataError::InvalidArrayAnnotation {
                    reason: format!("{ARRAY_TYPE} must be a string, found {dtype}"),
                });
            }
            None => {
                return Err(JDataError::InvalidArrayAnnotation {
                    reason: format!("missing {ARRAY_TYPE}"),
                });
            }
        };

        let size = object.get(ARRAY_SIZE).map(parse_size).transpose()?;
        let is_sparse = parse_flag(object, ARRAY_IS_SPARSE)?;
        let is_complex = parse_flag(object, ARRAY_IS_COMPLEX)?;

        let column_major = match object.get(ARRAY_ORDER) {
            None => None,
            Some(Value::String(order)) => match order.to_lowercase().as_str() {
                "r" | "row" => Some(false),
                "c" | "col" | "column" => Some(true),
                order => {
                    return Err(JDataError::InvalidArrayAnnotation {
                        reason: format!("unknown {ARRAY_ORDER} {order:?}"),
                    });
                }
            },
            Some(order) => {
                return Err(JDataError::InvalidArrayAnnotation {
                    reason: format!("{ARRAY_ORDER} must be a string, found {order}"),
                });
            }
        };

        let zip_data = object
            .get(ARRAY_ZIP_DATA)
            .or_else(|| object.get(ARRAY_COMPRESSED_DATA));

        let payload = match (zip_data, object.get(ARRAY_DATA)) {
            (Some(data), _) => {
                let method = match object
                    .get(ARRAY_ZIP_TYPE)
                    .or_else(|| object.get(ARRAY_COMPRESSION_METHOD))
                {
                    Some(Value::String(method)) => method.as_str(),
                    Some(method) => {
                        return Err(JDataError::InvalidArrayAnnotation {
                            reason: format!(
                                "{ARRAY_ZIP_TYPE} must be a string, found {method}"
                            ),
                        });
                    }
                    None => {
                        return Err(JDataError::InvalidArrayAnnotation {
                            reason: format!("compressed payload without {ARRAY_ZIP_TYPE}"),
                        });
                    }
                };
                let size = object
                    .get(ARRAY_ZIP_SIZE)
                    .or_else(|| object.get(ARRAY_COMPRESSION_SIZE))
                    .map(parse_size)
                    .transpose()?;

                Payload::Zip { method, size, data }
            }
            (None, Some(data)) => Payload::Data(data),
            (None, None) => {
                return Err(JDataError::InvalidArrayAnnotation {
                    reason: format!("missing {ARRAY_DATA} or {ARRAY_ZIP_DATA}"),
                });
            }
        };

        Ok(Self {
            dtype,
            size,
            is_sparse,
            is_complex,
            column_major,
            payload,
        })
    }
}

fn parse_size(size: &Value) -> Result<Vec<usize>, JDataError> {
    let invalid = || JDataError::InvalidArrayAnnotation {
        reason: format!("a size must be a list of non-negative integers, found {size}"),
    };

    match size {
        // some encoders write the size of vectors as a scalar
        Value::Number(n) => Ok(vec![number_to_usize(n).ok_or_else(invalid)?]),
        Value::Array(dims) => dims
            .iter()
            .map(|d| d.as_number().and_then(number_to_usize).ok_or_else(invalid))
            .collect(),
        _ => Err(invalid()),
    }
}

fn number_to_usize(n: &serde_json::Number) -> Option<usize> {
    if let Some(n) = n.as_u64() {
        return usize::try_from(n).ok();
    }

    let n = n.as_f64()?;
    if n.is_finite() && n >= 0.0 && n.fract() == 0.0 {
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let n = n as usize;
        Some(n)
    } else {
        None
    }
}

fn parse_flag(object: &Map<String, Value>, key: &str) -> Result<bool, JDataError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(flag)) => Ok(*flag),
        Some(Value::Number(flag)) => Ok(flag.as_f64().is_some_and(|x| x != 0.0)),
        Some(flag) => Err(JDataError::InvalidArrayAnnotation {
            reason: format!("{key} must be a boolean, found {flag}"),
        }),
    }
}
