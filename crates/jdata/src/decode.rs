use std::marker::PhantomData;

use serde_json::{Map, Value};

use crate::{
    AnyArray, CodecRegistry, ComplexArray, DecodeOptions, Element, JDataDType, JDataError,
    NumberFormat, SparseMatrix, TypedArray,
    annotation::{Annotation, Payload, is_annotated},
    array::{checked_len, with_element_type},
    base64,
};

/// Arrays decoded from a JSON node
#[derive(Clone, Debug, PartialEq)]
pub enum Decoded {
    /// A single annotated object, or a batch of one
    One(TypedArray),
    /// A JSON array of annotated objects
    Many(Vec<TypedArray>),
}

impl Decoded {
    #[must_use]
    /// Returns all decoded arrays.
    pub fn into_vec(self) -> Vec<TypedArray> {
        match self {
            Self::One(array) => vec![array],
            Self::Many(arrays) => arrays,
        }
    }
}

/// Decodes the annotated array `node`, or the JSON array of annotated
/// arrays, into typed arrays.
///
/// Compressed payloads are decompressed with the codecs in the `registry`.
///
/// # Errors
///
/// Errors with
/// - [`JDataError::InvalidArrayAnnotation`] if the `node` is not a
///   well-formed annotated array
/// - [`JDataError::TypeCastError`] if the declared dtype is unknown
/// - [`JDataError::ValueCastError`] if a payload value cannot be represented
///   in the declared dtype
/// - [`JDataError::DimensionMismatch`] if the declared size is inconsistent
///   with the payload or a sparse index lies outside the declared size
/// - [`JDataError::UnsupportedCompressionMethod`] if the compression codec
///   is not registered
/// - [`JDataError::CompressionFailed`] if the compression codec fails
pub fn decode(
    node: &Value,
    options: &DecodeOptions,
    registry: &CodecRegistry,
) -> Result<Decoded, JDataError> {
    match node {
        Value::Object(object) => decode_object(object, options, registry).map(Decoded::One),
        Value::Array(items) if !items.is_empty() => {
            let mut arrays = items
                .iter()
                .map(|item| match item {
                    Value::Object(object) if is_annotated(object) => {
                        decode_object(object, options, registry)
                    }
                    item => Err(JDataError::InvalidArrayAnnotation {
                        reason: format!("batch item {item} is not an annotated array"),
                    }),
                })
                .collect::<Result<Vec<_>, _>>()?;

            match arrays.pop() {
                Some(array) if arrays.is_empty() => Ok(Decoded::One(array)),
                Some(array) => {
                    arrays.push(array);
                    Ok(Decoded::Many(arrays))
                }
                None => Ok(Decoded::Many(arrays)),
            }
        }
        node => Err(JDataError::InvalidArrayAnnotation {
            reason: format!("{node} is not an annotated array"),
        }),
    }
}

fn decode_object(
    object: &Map<String, Value>,
    options: &DecodeOptions,
    registry: &CodecRegistry,
) -> Result<TypedArray, JDataError> {
    let annotation = Annotation::parse(object)?;

    if annotation.is_complex && annotation.dtype == JDataDType::Bool {
        return Err(JDataError::InvalidArrayAnnotation {
            reason: String::from("logical arrays cannot be complex"),
        });
    }

    log::debug!(
        "decoding a {}{}{} array of size {:?}",
        if annotation.is_sparse { "sparse " } else { "" },
        if annotation.is_complex { "complex " } else { "" },
        annotation.dtype,
        annotation.size
    );

    with_element_type!(annotation.dtype, T => {
        Decoder::<T> {
            annotation: &annotation,
            format: options.number_format(),
            column_major: annotation
                .column_major
                .unwrap_or_else(|| options.format_version.is_column_major()),
            marker: PhantomData,
        }
        .decode(options, registry)
    })
}

/// Payload of an annotated array, read as the declared dtype
enum Values<'a, T> {
    /// Values of a plain JSON payload
    Json(&'a Value),
    /// Flat run of decompressed values
    Flat(Vec<T>),
}

struct Decoder<'a, T> {
    annotation: &'a Annotation<'a>,
    format: NumberFormat<'a>,
    column_major: bool,
    marker: PhantomData<T>,
}

impl<'a, T: Element> Decoder<'a, T> {
    fn decode(
        &self,
        options: &DecodeOptions,
        registry: &CodecRegistry,
    ) -> Result<TypedArray, JDataError> {
        let values = match &self.annotation.payload {
            Payload::Data(data) => Values::Json(data),
            Payload::Zip { method, size, data } => {
                Values::Flat(self.decompress(method, size.as_deref(), data, options, registry)?)
            }
        };

        match (self.annotation.is_sparse, self.annotation.is_complex) {
            (true, is_complex) => self.sparse(values, is_complex).map(TypedArray::Sparse),
            (false, true) => self.dense_complex(values).map(TypedArray::Complex),
            (false, false) => self.dense(values).map(TypedArray::Real),
        }
    }

    fn decompress(
        &self,
        method: &str,
        size: Option<&[usize]>,
        data: &Value,
        options: &DecodeOptions,
        registry: &CodecRegistry,
    ) -> Result<Vec<T>, JDataError> {
        let encoded = match data {
            Value::String(text) if options.base64 => base64::decode(text),
            Value::String(text) => text.as_bytes().to_vec(),
            Value::Array(bytes) => bytes
                .iter()
                .map(|byte| {
                    u8::from_json(byte, &self.format).ok_or_else(|| JDataError::ValueCastError {
                        dtype: JDataDType::U8,
                        value: byte.clone(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            data => {
                return Err(JDataError::InvalidArrayAnnotation {
                    reason: format!("compressed payload must be a string, found {data}"),
                });
            }
        };

        let bytes = registry.decode(method, &encoded)?;

        log::debug!(
            "decompressed {} bytes into {} bytes with {method}",
            encoded.len(),
            bytes.len()
        );

        let element_size = T::DTYPE.size();
        if bytes.len() % element_size != 0 {
            return Err(JDataError::InvalidArrayAnnotation {
                reason: format!(
                    "{} decompressed bytes do not hold a whole number of {} values",
                    bytes.len(),
                    T::DTYPE
                ),
            });
        }

        let values = bytes
            .chunks_exact(element_size)
            .filter_map(T::from_le_bytes)
            .collect::<Vec<_>>();

        if let Some(size) = size {
            let declared = checked_len(size);
            if declared != Some(bytes.len()) && declared != Some(values.len()) {
                return Err(JDataError::DimensionMismatch {
                    expected: size.to_vec(),
                    found: vec![bytes.len()],
                });
            }
        }

        Ok(values)
    }

    fn dense(&self, values: Values<T>) -> Result<AnyArray, JDataError> {
        let values = match values {
            Values::Json(data) => self.flat(data)?,
            Values::Flat(values) => values,
        };

        self.reshape(values)
    }

    fn dense_complex(&self, values: Values<T>) -> Result<ComplexArray, JDataError> {
        let (re, im) = match values {
            Values::Json(data) => self.complex_planes(data)?,
            Values::Flat(values) => self.split_planes(values)?,
        };

        ComplexArray::try_new(self.reshape(re)?, self.reshape(im)?)
    }

    fn sparse(&self, values: Values<T>, is_complex: bool) -> Result<SparseMatrix, JDataError> {
        let shape = match self.annotation.size.as_deref() {
            None => None,
            Some(&[nrows, ncols]) => Some([nrows, ncols]),
            Some(size) => {
                return Err(JDataError::InvalidArrayAnnotation {
                    reason: format!("sparse arrays must be two-dimensional, found size {size:?}"),
                });
            }
        };

        let num_indices = match shape {
            Some([1, _] | [_, 1]) => 1,
            _ => 2,
        };
        let width = num_indices + usize::from(is_complex) + 1;

        let cells = match values {
            Values::Json(data) => self.table(data, width)?,
            Values::Flat(values) => {
                let values = values
                    .into_iter()
                    .map(|x| x.to_json(&self.format))
                    .collect::<Vec<_>>();
                self.chunk(values, width)?
            }
        };

        log::trace!(
            "reading {} sparse entries with {width} columns each",
            cells.len()
        );

        if cells.is_empty() {
            return Ok(SparseMatrix::zeros(
                T::DTYPE,
                shape.unwrap_or_default(),
            ));
        }

        let mut rows = Vec::with_capacity(cells.len());
        let mut cols = Vec::with_capacity(cells.len());
        let mut re = Vec::with_capacity(cells.len());
        let mut im = Vec::with_capacity(cells.len());

        for entry in &cells {
            let (indices, values) = entry.split_at(num_indices.min(entry.len()));

            let indices = indices
                .iter()
                .map(|index| sparse_index(index, shape))
                .collect::<Result<Vec<_>, _>>()?;

            let (row, col) = match (shape, indices.as_slice()) {
                (Some([1, _]), &[col]) => (0, col),
                (_, &[row]) => (row, 0),
                (_, &[row, col]) => (row, col),
                _ => {
                    return Err(JDataError::InvalidArrayAnnotation {
                        reason: format!("sparse entry {entry:?} has too few columns"),
                    });
                }
            };
            rows.push(row);
            cols.push(col);

            match values {
                [value] if !is_complex => re.push(self.value(value)?),
                [value, imag] if is_complex => {
                    re.push(self.value(value)?);
                    im.push(self.value(imag)?);
                }
                _ => {
                    return Err(JDataError::InvalidArrayAnnotation {
                        reason: format!("sparse entry {entry:?} must have {width} columns"),
                    });
                }
            }
        }

        // legacy annotations without a size are sized to fit all entries
        let shape = shape.unwrap_or_else(|| {
            [
                rows.iter().max().map_or(0, |row| row + 1),
                cols.iter().max().map_or(0, |col| col + 1),
            ]
        });

        let values = T::into_any(ndarray::Array1::from_vec(re).into_dyn());
        let imag = is_complex.then(|| T::into_any(ndarray::Array1::from_vec(im).into_dyn()));

        SparseMatrix::try_new(shape, rows, cols, values, imag)
    }

    fn flat(&self, data: &Value) -> Result<Vec<T>, JDataError> {
        let mut values = Vec::new();
        self.push_flat(data, &mut values)?;
        Ok(values)
    }

    fn push_flat(&self, data: &Value, values: &mut Vec<T>) -> Result<(), JDataError> {
        match data {
            Value::Array(items) => {
                for item in items {
                    self.push_flat(item, values)?;
                }
            }
            value => values.push(self.value(value)?),
        }

        Ok(())
    }

    fn value(&self, value: &Value) -> Result<T, JDataError> {
        T::from_json(value, &self.format).ok_or_else(|| JDataError::ValueCastError {
            dtype: T::DTYPE,
            value: value.clone(),
        })
    }

    fn complex_planes(&self, data: &Value) -> Result<(Vec<T>, Vec<T>), JDataError> {
        let count = match &self.annotation.size {
            None => None,
            Some(size) => Some(checked_len(size).ok_or_else(|| {
                JDataError::DimensionMismatch {
                    expected: size.clone(),
                    found: vec![data.as_array().map_or(0, Vec::len)],
                }
            })?),
        };

        if let Value::Array(items) = data {
            if let [re @ Value::Array(_), im @ Value::Array(_)] = items.as_slice() {
                let (re, im) = (self.flat(re)?, self.flat(im)?);
                if re.len() == im.len() && count.is_none_or(|count| count == re.len()) {
                    return Ok((re, im));
                }
            }

            if !items.is_empty()
                && count.is_none_or(|count| count == items.len())
                && items
                    .iter()
                    .all(|item| matches!(item, Value::Array(pair) if pair.len() == 2))
            {
                let mut re = Vec::with_capacity(items.len());
                let mut im = Vec::with_capacity(items.len());
                for item in items {
                    if let Value::Array(pair) = item {
                        if let [x, y] = pair.as_slice() {
                            re.push(self.value(x)?);
                            im.push(self.value(y)?);
                        }
                    }
                }
                return Ok((re, im));
            }
        }

        self.split_planes(self.flat(data)?)
    }

    fn split_planes(&self, mut values: Vec<T>) -> Result<(Vec<T>, Vec<T>), JDataError> {
        if values.len() % 2 != 0 {
            return Err(JDataError::DimensionMismatch {
                expected: self.annotation.size.clone().unwrap_or_default(),
                found: vec![values.len()],
            });
        }

        let im = values.split_off(values.len() / 2);
        Ok((values, im))
    }

    fn reshape(&self, values: Vec<T>) -> Result<AnyArray, JDataError> {
        let shape = match (&self.annotation.size, &self.annotation.payload) {
            (Some(size), _) => size.clone(),
            // legacy annotations may only declare the pre-compression shape
            (None, Payload::Zip {
                size: Some(size), ..
            }) if checked_len(size) == Some(values.len()) => size.clone(),
            (None, _) => vec![values.len()],
        };

        AnyArray::from_shape_vec(&shape, values, self.column_major)
    }

    fn table(&self, data: &Value, width: usize) -> Result<Vec<Vec<Value>>, JDataError> {
        match data {
            Value::Array(items) if items.iter().all(Value::is_array) => Ok(items
                .iter()
                .map(|item| match item {
                    Value::Array(cells) => cells.clone(),
                    cell => vec![cell.clone()],
                })
                .collect()),
            Value::Array(items) => self.chunk(items.clone(), width),
            data => Err(JDataError::InvalidArrayAnnotation {
                reason: format!("sparse payload must be a list of entries, found {data}"),
            }),
        }
    }

    fn chunk(&self, cells: Vec<Value>, width: usize) -> Result<Vec<Vec<Value>>, JDataError> {
        if cells.len() % width != 0 {
            return Err(JDataError::InvalidArrayAnnotation {
                reason: format!(
                    "{} sparse payload values do not form entries with {width} columns",
                    cells.len()
                ),
            });
        }

        let nnz = cells.len() / width;

        if self.column_major {
            // column-major run of an nnz x width table
            let mut rows = vec![Vec::with_capacity(width); nnz];
            for (i, cell) in cells.into_iter().enumerate() {
                if let Some(row) = rows.get_mut(i % nnz.max(1)) {
                    row.push(cell);
                }
            }
            Ok(rows)
        } else {
            Ok(cells.chunks(width).map(<[Value]>::to_vec).collect())
        }
    }
}

fn sparse_index(index: &Value, shape: Option<[usize; 2]>) -> Result<usize, JDataError> {
    let position = index
        .as_u64()
        .or_else(|| {
            index
                .as_f64()
                .filter(|x| x.fract() == 0.0 && *x >= 1.0 && *x <= 2.0_f64.powi(53))
                .map(|x| {
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    let x = x as u64;
                    x
                })
        })
        .and_then(|x| usize::try_from(x).ok());

    match position {
        Some(position @ 1..) => Ok(position - 1),
        _ => Err(JDataError::DimensionMismatch {
            expected: shape.map(|shape| shape.to_vec()).unwrap_or_default(),
            found: vec![index.as_u64().and_then(|x| usize::try_from(x).ok()).unwrap_or(0)],
        }),
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use serde_json::json;

    use super::*;
    use crate::FormatVersion;

    fn decode_default(node: &Value) -> Result<TypedArray, JDataError> {
        match decode(node, &DecodeOptions::default(), &CodecRegistry::new())? {
            Decoded::One(array) => Ok(array),
            Decoded::Many(arrays) => panic!("expected one array, found {}", arrays.len()),
        }
    }

    #[test]
    fn dense() {
        let array = decode_default(&json!({
            "_ArrayType_": "uint8",
            "_ArraySize_": [2, 3],
            "_ArrayData_": [1, 2, 3, 4, 5, 6],
        }));
        assert_eq!(
            array.ok(),
            Some(TypedArray::Real(AnyArray::U8(
                array![[1, 2, 3], [4, 5, 6]].into_dyn()
            )))
        );

        let array = decode_default(&json!({
            "_ArrayType_": "double",
            "_ArrayData_": [1.5, "_NaN_", "-_Inf_"],
        }));
        let Ok(TypedArray::Real(AnyArray::F64(array))) = array else {
            panic!("doubles are decoded as doubles");
        };
        assert_eq!(array.shape(), &[3]);
        assert!(array.iter().nth(1).is_some_and(|x| x.is_nan()));
    }

    #[test]
    fn element_order() {
        let legacy = decode(
            &json!({
                "_ArrayType_": "int16",
                "_ArraySize_": [2, 3],
                "_ArrayData_": [1, 4, 2, 5, 3, 6],
            }),
            &DecodeOptions {
                format_version: FormatVersion::Legacy,
                ..DecodeOptions::default()
            },
            &CodecRegistry::new(),
        );
        let ordered = decode_default(&json!({
            "_ArrayType_": "int16",
            "_ArraySize_": [2, 3],
            "_ArrayOrder_": "c",
            "_ArrayData_": [1, 4, 2, 5, 3, 6],
        }));

        let expected = TypedArray::Real(AnyArray::I16(array![[1, 2, 3], [4, 5, 6]].into_dyn()));
        assert_eq!(legacy.ok(), Some(Decoded::One(expected.clone())));
        assert_eq!(ordered.ok(), Some(expected));
    }

    #[test]
    fn complex_layouts() {
        let Ok(expected) = ComplexArray::try_new(
            AnyArray::F64(array![1.0, 2.0].into_dyn()),
            AnyArray::F64(array![3.0, 4.0].into_dyn()),
        ) else {
            panic!("planes match");
        };

        for data in [
            json!([[1.0, 2.0], [3.0, 4.0]]),
            json!([1.0, 2.0, 3.0, 4.0]),
        ] {
            let array = decode_default(&json!({
                "_ArrayType_": "double",
                "_ArraySize_": [2],
                "_ArrayIsComplex_": true,
                "_ArrayData_": data,
            }));
            assert_eq!(array.ok(), Some(TypedArray::Complex(expected.clone())));
        }

        let array = decode_default(&json!({
            "_ArrayType_": "double",
            "_ArraySize_": [3],
            "_ArrayIsComplex_": true,
            "_ArrayData_": [[1, -1], [2, -2], [3, -3]],
        }));
        let Ok(TypedArray::Complex(complex)) = array else {
            panic!("complex rows are accepted");
        };
        assert_eq!(complex.im(), &AnyArray::F64(array![-1.0, -2.0, -3.0].into_dyn()));
    }

    #[test]
    fn sparse_widths() {
        let column = decode_default(&json!({
            "_ArrayType_": "double",
            "_ArraySize_": [5, 1],
            "_ArrayIsSparse_": true,
            "_ArrayData_": [[2, 1.5], [5, 2.5]],
        }));
        let Ok(TypedArray::Sparse(column)) = column else {
            panic!("sparse column vectors are accepted");
        };
        assert_eq!(column.rows(), &[1, 4]);
        assert_eq!(column.cols(), &[0, 0]);

        let row = decode_default(&json!({
            "_ArrayType_": "double",
            "_ArraySize_": [1, 5],
            "_ArrayIsSparse_": true,
            "_ArrayData_": [[3, 1.5]],
        }));
        let Ok(TypedArray::Sparse(row)) = row else {
            panic!("sparse row vectors are accepted");
        };
        assert_eq!(row.rows(), &[0]);
        assert_eq!(row.cols(), &[2]);
    }

    #[test]
    fn sparse_without_size() {
        let array = decode_default(&json!({
            "_ArrayType_": "int32",
            "_ArrayIsSparse_": true,
            "_ArrayData_": [[1, 1, 7], [3, 2, 8]],
        }));
        let Ok(TypedArray::Sparse(sparse)) = array else {
            panic!("legacy sparse triplets are accepted");
        };
        assert_eq!(sparse.shape(), &[3, 2]);
        assert_eq!(
            sparse.to_dense(),
            AnyArray::I32(array![[7, 0], [0, 0], [0, 8]].into_dyn())
        );
    }

    #[test]
    fn sparse_out_of_bounds() {
        assert!(matches!(
            decode_default(&json!({
                "_ArrayType_": "double",
                "_ArraySize_": [2, 2],
                "_ArrayIsSparse_": true,
                "_ArrayData_": [[3, 1, 1.0]],
            })),
            Err(JDataError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            decode_default(&json!({
                "_ArrayType_": "double",
                "_ArraySize_": [2, 2],
                "_ArrayIsSparse_": true,
                "_ArrayData_": [[0, 1, 1.0]],
            })),
            Err(JDataError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn errors() {
        assert!(matches!(
            decode_default(&json!({ "_ArrayType_": "char", "_ArrayData_": [1] })),
            Err(JDataError::TypeCastError { dtype }) if dtype == "char"
        ));
        assert!(matches!(
            decode_default(&json!({ "_ArrayType_": "uint8", "_ArrayData_": [256] })),
            Err(JDataError::ValueCastError { dtype: JDataDType::U8, .. })
        ));
        assert!(matches!(
            decode_default(&json!({
                "_ArrayType_": "uint8",
                "_ArraySize_": [2, 2],
                "_ArrayData_": [1, 2, 3],
            })),
            Err(JDataError::DimensionMismatch { expected, found })
                if expected == [2, 2] && found == [3]
        ));
        assert!(matches!(
            decode_default(&json!({
                "_ArrayType_": "uint8",
                "_ArrayZipType_": "bogus",
                "_ArrayZipSize_": [1, 3],
                "_ArrayZipData_": "AQID",
            })),
            Err(JDataError::UnsupportedCompressionMethod { method }) if method == "bogus"
        ));
        assert!(matches!(
            decode_default(&json!([1, 2, 3])),
            Err(JDataError::InvalidArrayAnnotation { .. })
        ));
    }

    #[test]
    fn size_overflow() {
        let huge = 1_usize << 32;

        assert!(matches!(
            decode_default(&json!({
                "_ArrayType_": "double",
                "_ArraySize_": [huge, huge, huge],
                "_ArrayIsComplex_": true,
                "_ArrayData_": [[1.0], [2.0]],
            })),
            Err(JDataError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            decode_default(&json!({
                "_ArrayType_": "double",
                "_ArraySize_": [huge, huge, huge],
                "_ArrayData_": [1.0, 2.0],
            })),
            Err(JDataError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn batches() {
        let item = json!({ "_ArrayType_": "uint8", "_ArrayData_": [1] });

        let one = decode(
            &json!([item.clone()]),
            &DecodeOptions::default(),
            &CodecRegistry::new(),
        );
        assert!(matches!(one, Ok(Decoded::One(_))));

        let many = decode(
            &json!([item.clone(), item]),
            &DecodeOptions::default(),
            &CodecRegistry::new(),
        );
        assert!(matches!(many, Ok(Decoded::Many(arrays)) if arrays.len() == 2));
    }
}
