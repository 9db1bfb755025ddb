use ndarray::{ArrayD, ArrayViewD};
use serde_json::{Map, Value};

use crate::{
    CodecRegistry, ComplexArray, Element, EncodeOptions, JDataError, NumberFormat, SparseMatrix,
    TypedArray,
    annotation::{
        ARRAY_DATA, ARRAY_IS_COMPLEX, ARRAY_IS_SPARSE, ARRAY_SIZE, ARRAY_TYPE, ARRAY_ZIP_DATA,
        ARRAY_ZIP_SIZE, ARRAY_ZIP_TYPE,
    },
    array::{map_any_array, with_element_type},
    base64,
};

/// Encodes the `array` into a JSON value.
///
/// Arrays that JSON can represent directly are written as plain (nested)
/// JSON arrays. All other arrays, i.e. arrays with more than two dimensions
/// (unless [`EncodeOptions::nested_array`] is set), sparse or complex arrays,
/// empty arrays with a non-zero dimension, and arrays that should be
/// compressed or are forced into an annotation with
/// [`EncodeOptions::array_to_struct`], are written as JData annotations.
///
/// Dense payloads with more than [`EncodeOptions::compress_array_size`]
/// elements are compressed with the [`EncodeOptions::compression`] codec,
/// which is looked up in the `registry`.
///
/// # Errors
///
/// Errors with
/// - [`JDataError::UnsupportedCompressionMethod`] if the requested
///   compression codec is not registered
/// - [`JDataError::CompressionFailed`] if the compression codec fails
/// - [`JDataError::InvalidInput`] if the array is internally inconsistent
pub fn encode(
    array: &TypedArray,
    options: &EncodeOptions,
    registry: &CodecRegistry,
) -> Result<Value, JDataError> {
    let format = options.number_format();

    let reason = annotation_reason(array, options);

    if let (TypedArray::Real(dense), None) = (array, reason) {
        log::trace!(
            "writing a {} array of shape {:?} as a plain JSON value",
            dense.dtype(),
            dense.shape()
        );
        return Ok(map_any_array!(dense, a => nested(a.view(), &format)));
    }

    log::debug!(
        "annotating a {} array of shape {:?} since {}",
        array.dtype(),
        array.shape(),
        reason.unwrap_or("it is not dense")
    );

    let mut object = Map::new();
    object.insert(String::from(ARRAY_TYPE), Value::from(array.dtype().name()));
    object.insert(String::from(ARRAY_SIZE), Value::from(array.shape().to_vec()));

    // sparse payloads are never compressed
    let compression = options
        .compression()
        .filter(|_| !array.is_sparse() && array.len() > options.compress_array_size);

    match array {
        TypedArray::Sparse(sparse) => {
            object.insert(String::from(ARRAY_IS_SPARSE), Value::Bool(true));
            if sparse.is_complex() {
                object.insert(String::from(ARRAY_IS_COMPLEX), Value::Bool(true));
            }

            let rows = map_any_array!(sparse.values(), values => sparse_rows(sparse, values, &format));
            object.insert(String::from(ARRAY_DATA), Value::Array(rows));
        }
        TypedArray::Complex(complex) => {
            object.insert(String::from(ARRAY_IS_COMPLEX), Value::Bool(true));

            let column_major = options.format_version.is_column_major();
            let (re, im) = with_element_type!(complex.dtype(), T => {
                let (re, im) = complex_planes::<T>(complex)?;
                (flatten(re, column_major), flatten(im, column_major))
            });

            match compression {
                Some(method) => {
                    let mut bytes = Vec::new();
                    re.extend_le_bytes(&mut bytes);
                    im.extend_le_bytes(&mut bytes);
                    insert_zip(&mut object, method, &bytes, registry)?;
                }
                None => {
                    object.insert(
                        String::from(ARRAY_DATA),
                        Value::Array(vec![re.to_json(&format), im.to_json(&format)]),
                    );
                }
            }
        }
        TypedArray::Real(dense) => {
            let column_major = options.format_version.is_column_major();
            let values = map_any_array!(dense, a => flatten(a, column_major));

            match compression {
                Some(method) => {
                    let mut bytes = Vec::new();
                    values.extend_le_bytes(&mut bytes);
                    insert_zip(&mut object, method, &bytes, registry)?;
                }
                None => {
                    object.insert(String::from(ARRAY_DATA), values.to_json(&format));
                }
            }
        }
    }

    Ok(Value::Object(object))
}

fn annotation_reason(array: &TypedArray, options: &EncodeOptions) -> Option<&'static str> {
    let shape = array.shape();

    if shape.len() > 2 && !options.nested_array {
        return Some("it has more than two dimensions");
    }

    if array.is_sparse() {
        return Some("it is sparse");
    }

    if array.is_complex() {
        return Some("it is complex");
    }

    if array.is_empty() && shape.iter().any(|d| *d != 0) {
        return Some("it is empty but has a non-zero dimension");
    }

    if options.array_to_struct {
        return Some("all arrays are annotated");
    }

    if options.compression().is_some() && array.len() > options.compress_array_size {
        return Some("it is compressed");
    }

    None
}

/// Flattened elements of a dense array, erased over their element type.
trait Flat {
    fn to_json(&self, format: &NumberFormat) -> Value;
    fn extend_le_bytes(&self, bytes: &mut Vec<u8>);
}

impl<T: Element> Flat for Vec<T> {
    fn to_json(&self, format: &NumberFormat) -> Value {
        Value::Array(self.iter().map(|x| x.to_json(format)).collect())
    }

    fn extend_le_bytes(&self, bytes: &mut Vec<u8>) {
        bytes.reserve(self.len() * T::DTYPE.size());
        for x in self {
            x.extend_le_bytes(bytes);
        }
    }
}

fn flatten<T: Element>(array: &ArrayD<T>, column_major: bool) -> Box<dyn Flat> {
    let values = if column_major {
        array.t().iter().copied().collect::<Vec<T>>()
    } else {
        array.iter().copied().collect::<Vec<T>>()
    };

    Box::new(values)
}

fn complex_planes<T: Element>(
    complex: &ComplexArray,
) -> Result<(&ArrayD<T>, &ArrayD<T>), JDataError> {
    match (complex.re().as_typed::<T>(), complex.im().as_typed::<T>()) {
        (Some(re), Some(im)) => Ok((re, im)),
        _ => Err(JDataError::InvalidInput {
            reason: String::from("complex planes must share one dtype"),
        }),
    }
}

fn insert_zip(
    object: &mut Map<String, Value>,
    method: &str,
    bytes: &[u8],
    registry: &CodecRegistry,
) -> Result<(), JDataError> {
    let encoded = registry.encode(method, bytes)?;

    log::debug!(
        "compressed {} bytes into {} bytes with {method}",
        bytes.len(),
        encoded.len()
    );

    object.insert(
        String::from(ARRAY_ZIP_SIZE),
        Value::from(vec![1, bytes.len()]),
    );
    object.insert(String::from(ARRAY_ZIP_TYPE), Value::from(method));
    object.insert(
        String::from(ARRAY_ZIP_DATA),
        Value::from(base64::encode(&encoded)),
    );

    Ok(())
}

fn nested<T: Element>(array: ArrayViewD<T>, format: &NumberFormat) -> Value {
    if array.ndim() == 0 {
        return array
            .iter()
            .next()
            .map_or(Value::Null, |x| x.to_json(format));
    }

    Value::Array(
        array
            .outer_iter()
            .map(|sub| nested(sub, format))
            .collect(),
    )
}

fn sparse_rows<T: Element>(
    sparse: &SparseMatrix,
    values: &ArrayD<T>,
    format: &NumberFormat,
) -> Vec<Value> {
    let mut imag = sparse.imag().and_then(T::as_typed).map(|im| im.iter());

    let entries = sparse
        .rows()
        .iter()
        .zip(sparse.cols())
        .zip(values)
        .map(|((&row, &col), &re)| {
            let im = imag.as_mut().and_then(Iterator::next).copied();
            (row, col, re, im)
        })
        .collect::<Vec<_>>();

    let width = match sparse.shape() {
        [1, _] => "(column, value)",
        [_, 1] => "(row, value)",
        _ => "(row, column, value)",
    };
    log::trace!(
        "writing {} sparse entries as {width} rows{}",
        entries.len(),
        if sparse.is_complex() { " with an imaginary part" } else { "" }
    );

    entries
        .into_iter()
        .map(|(row, col, re, im)| {
            let mut entry = match sparse.shape() {
                [1, _] => vec![Value::from(col + 1)],
                [_, 1] => vec![Value::from(row + 1)],
                _ => vec![Value::from(row + 1), Value::from(col + 1)],
            };
            entry.push(re.to_json(format));
            if let Some(im) = im {
                entry.push(im.to_json(format));
            }
            Value::Array(entry)
        })
        .collect()
}
