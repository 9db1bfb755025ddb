#![expect(missing_docs)]
#![expect(clippy::unwrap_used)]

use ::{
    jdata_gzip as _, jdata_lz4 as _, jdata_lzma as _, jdata_zlib as _, log as _, schemars as _,
    serde as _,
};

use jdata::{
    AnyArray, ComplexArray, DecodeOptions, Decoded, EncodeOptions, JDataError, SparseMatrix,
    TypedArray, decode, encode,
};
use jdata_codecs::default_registry;
use ndarray::{Array2, array};
use num_complex::Complex;
use serde_json::json;

fn options_with_threshold(compression: &str, compress_array_size: usize) -> EncodeOptions {
    EncodeOptions {
        compression: Some(String::from(compression)),
        compress_array_size,
        ..EncodeOptions::default()
    }
}

#[test]
fn sparse_matrix() {
    let dense = AnyArray::U8(array![[1, 0, 0], [0, 1, 0]].into_dyn());
    let sparse = SparseMatrix::from_dense(&dense).unwrap();

    let encoded = encode(
        &TypedArray::from(sparse),
        &EncodeOptions::default(),
        &default_registry(),
    )
    .unwrap();

    assert_eq!(
        encoded,
        json!({
            "_ArrayType_": "uint8",
            "_ArraySize_": [2, 3],
            "_ArrayIsSparse_": true,
            "_ArrayData_": [[1, 1, 1], [2, 2, 1]],
        })
    );

    let Decoded::One(TypedArray::Sparse(decoded)) =
        decode(&encoded, &DecodeOptions::default(), &default_registry()).unwrap()
    else {
        panic!("sparse matrix decoded as another kind");
    };
    assert_eq!(decoded.to_dense(), dense);
}

#[test]
fn complex_scalar() {
    let scalar = array![[Complex::new(2.0_f32, 4.0)]].into_dyn();
    let complex = ComplexArray::from_complex(&scalar).unwrap();

    let encoded = encode(
        &TypedArray::from(complex),
        &EncodeOptions::default(),
        &default_registry(),
    )
    .unwrap();

    assert_eq!(
        encoded,
        json!({
            "_ArrayType_": "single",
            "_ArraySize_": [1, 1],
            "_ArrayIsComplex_": true,
            "_ArrayData_": [[2.0], [4.0]],
        })
    );

    let Decoded::One(TypedArray::Complex(decoded)) =
        decode(&encoded, &DecodeOptions::default(), &default_registry()).unwrap()
    else {
        panic!("complex scalar decoded as another kind");
    };
    assert_eq!(decoded.to_complex::<f32>(), Some(scalar));
}

#[test]
fn sparse_widths() {
    let registry = default_registry();

    let column = SparseMatrix::from_triplets([5, 1], [(1, 0, 7.0_f64), (4, 0, 9.0)]).unwrap();
    let encoded = encode(&TypedArray::from(column), &EncodeOptions::default(), &registry).unwrap();
    assert_eq!(encoded["_ArrayData_"], json!([[2, 7.0], [5, 9.0]]));

    let row = SparseMatrix::from_triplets([1, 5], [(0, 1, 7.0_f64), (0, 4, 9.0)]).unwrap();
    let encoded = encode(&TypedArray::from(row), &EncodeOptions::default(), &registry).unwrap();
    assert_eq!(encoded["_ArrayData_"], json!([[2, 7.0], [5, 9.0]]));

    let matrix =
        SparseMatrix::from_triplets([3, 4], [(2, 3, -1_i32), (0, 1, 5), (1, 1, 6)]).unwrap();
    let encoded = encode(&TypedArray::from(matrix), &EncodeOptions::default(), &registry).unwrap();
    assert_eq!(
        encoded["_ArrayData_"],
        json!([[1, 2, 5], [2, 2, 6], [3, 4, -1]])
    );
}

#[test]
fn empty_sparse() {
    let empty = SparseMatrix::zeros(jdata::JDataDType::F64, [2, 3]);

    let encoded = encode(
        &TypedArray::from(empty.clone()),
        &EncodeOptions::default(),
        &default_registry(),
    )
    .unwrap();
    assert_eq!(encoded["_ArrayData_"], json!([]));

    let decoded = decode(&encoded, &DecodeOptions::default(), &default_registry()).unwrap();
    let Decoded::One(TypedArray::Sparse(decoded)) = decoded else {
        panic!("empty sparse matrix decoded as another kind");
    };
    assert_eq!(decoded, empty);
    assert_eq!(
        decoded.to_dense(),
        AnyArray::F64(Array2::zeros((2, 3)).into_dyn())
    );
}

#[test]
fn compression_threshold() {
    let registry = default_registry();
    let array = TypedArray::from(AnyArray::I16(
        Array2::from_shape_fn((4, 5), |(i, j)| i16::try_from(i * j).unwrap()).into_dyn(),
    ));

    // exactly at the threshold
    let encoded = encode(&array, &options_with_threshold("zlib", 20), &registry).unwrap();
    assert_eq!(
        encoded,
        json!([
            [0, 0, 0, 0, 0],
            [0, 1, 2, 3, 4],
            [0, 2, 4, 6, 8],
            [0, 3, 6, 9, 12]
        ])
    );

    // one element below the threshold
    let encoded = encode(&array, &options_with_threshold("zlib", 19), &registry).unwrap();
    assert_eq!(encoded["_ArrayZipType_"], "zlib");
    assert_eq!(encoded["_ArrayZipSize_"], json!([1, 40]));
    assert!(encoded.get("_ArrayData_").is_none());

    let decoded = decode(&encoded, &DecodeOptions::default(), &registry).unwrap();
    assert_eq!(decoded, Decoded::One(array));
}

#[test]
fn sparse_is_never_compressed() {
    let sparse = SparseMatrix::from_triplets([20, 20], (0..20).map(|i| (i, i, 1_u32))).unwrap();

    let encoded = encode(
        &TypedArray::from(sparse),
        &options_with_threshold("zlib", 10),
        &default_registry(),
    )
    .unwrap();

    assert!(encoded.get("_ArrayZipType_").is_none());
    assert_eq!(encoded["_ArrayData_"].as_array().map(Vec::len), Some(20));
}

#[test]
fn unknown_codec() {
    let array = TypedArray::from(AnyArray::U8(array![[1, 2], [3, 4]].into_dyn()));

    assert!(matches!(
        encode(&array, &options_with_threshold("bogus", 0), &default_registry()),
        Err(JDataError::UnsupportedCompressionMethod { method }) if method == "bogus"
    ));

    let encoded = json!({
        "_ArrayType_": "uint8",
        "_ArraySize_": [2, 2],
        "_ArrayZipType_": "bogus",
        "_ArrayZipSize_": [1, 4],
        "_ArrayZipData_": "AQIDBA==",
    });
    assert!(matches!(
        decode(&encoded, &DecodeOptions::default(), &default_registry()),
        Err(JDataError::UnsupportedCompressionMethod { method }) if method == "bogus"
    ));
}

#[test]
fn lzip_is_unsupported() {
    let array = TypedArray::from(AnyArray::U8(array![[1, 2], [3, 4]].into_dyn()));

    assert!(matches!(
        encode(&array, &options_with_threshold("lzip", 0), &default_registry()),
        Err(JDataError::UnsupportedCompressionMethod { method }) if method == "lzip"
    ));
}

#[test]
fn corrupted_payload() {
    let encoded = json!({
        "_ArrayType_": "double",
        "_ArraySize_": [2, 2],
        "_ArrayZipType_": "zlib",
        "_ArrayZipSize_": [1, 32],
        "_ArrayZipData_": "bm90IHpsaWI=",
    });

    assert!(matches!(
        decode(&encoded, &DecodeOptions::default(), &default_registry()),
        Err(JDataError::CompressionFailed { method, .. }) if method == "zlib"
    ));
}

#[test]
fn legacy_compressed_keys() {
    let registry = default_registry();
    let values = (1..=6_u16).flat_map(u16::to_le_bytes).collect::<Vec<_>>();
    let codec = jdata_codecs::GzipCodec::default();
    let compressed = jdata::ByteCodec::encode(&codec, &values).unwrap();

    let node = json!({
        "_ArrayType_": "uint16",
        "_ArraySize_": [2, 3],
        "_ArrayCompressionMethod_": "gzip",
        "_ArrayCompressionSize_": [2, 3],
        "_ArrayCompressedData_": jdata::base64::encode(&compressed),
    });

    assert_eq!(
        decode(&node, &DecodeOptions::default(), &registry).unwrap(),
        Decoded::One(TypedArray::from(AnyArray::U16(
            array![[1, 2, 3], [4, 5, 6]].into_dyn()
        )))
    );
}

#[test]
fn unsorted_sparse_with_stored_zero() {
    let registry = default_registry();
    let sparse = SparseMatrix::from_triplets([2, 2], [(1, 1, 4.0_f64), (0, 0, 0.0)]).unwrap();
    assert_eq!(sparse.nnz(), 2);

    let encoded = encode(
        &TypedArray::from(sparse.clone()),
        &EncodeOptions::default(),
        &registry,
    )
    .unwrap();
    assert_eq!(encoded["_ArrayData_"], json!([[1, 1, 0.0], [2, 2, 4.0]]));

    let Decoded::One(TypedArray::Sparse(decoded)) =
        decode(&encoded, &DecodeOptions::default(), &registry).unwrap()
    else {
        panic!("sparse matrix decoded as another kind");
    };
    assert_eq!(decoded.nnz(), 2);
    assert_eq!(decoded, sparse);
}

#[test]
fn compressed_size_without_array_size() {
    let registry = default_registry();
    let values = (1..=6_u16).flat_map(u16::to_le_bytes).collect::<Vec<_>>();
    let codec = jdata_codecs::GzipCodec::default();
    let compressed = jdata::ByteCodec::encode(&codec, &values).unwrap();

    let node = json!({
        "_ArrayType_": "uint16",
        "_ArrayCompressionMethod_": "gzip",
        "_ArrayCompressionSize_": [2, 3],
        "_ArrayCompressedData_": jdata::base64::encode(&compressed),
    });

    assert_eq!(
        decode(&node, &DecodeOptions::default(), &registry).unwrap(),
        Decoded::One(TypedArray::from(AnyArray::U16(
            array![[1, 2, 3], [4, 5, 6]].into_dyn()
        )))
    );
}

#[test]
fn overflowing_size() {
    let huge = 1_u64 << 32;

    for node in [
        json!({
            "_ArrayType_": "double",
            "_ArraySize_": [huge, huge, huge],
            "_ArrayData_": [1.0, 2.0],
        }),
        json!({
            "_ArrayType_": "double",
            "_ArraySize_": [huge, huge, huge],
            "_ArrayIsComplex_": true,
            "_ArrayData_": [[1.0, 2.0], [0.0, 0.0]],
        }),
    ] {
        assert!(
            matches!(
                decode(&node, &DecodeOptions::default(), &default_registry()),
                Err(JDataError::DimensionMismatch { .. })
            ),
            "{node}"
        );
    }
}

#[test]
fn huge_sparse_with_compression() {
    let huge = 10_000_000_000_usize;
    let sparse = SparseMatrix::from_triplets([huge, huge], [(0, 0, 1.0_f64)]).unwrap();

    let encoded = encode(
        &TypedArray::from(sparse),
        &options_with_threshold("zlib", 0),
        &default_registry(),
    )
    .unwrap();

    assert!(encoded.get("_ArrayZipType_").is_none());
    assert_eq!(encoded["_ArraySize_"], json!([huge, huge]));
    assert_eq!(encoded["_ArrayData_"], json!([[1, 1, 1.0]]));
}
