//! Walking of heterogeneous value trees that contain typed arrays.

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::{
    CodecRegistry, DecodeOptions, Decoded, EncodeOptions, JDataError, TypedArray, decode, encode,
    is_annotated,
};

/// Heterogeneous value tree whose leaves are typed arrays or plain JSON
/// values.
#[derive(Clone, Debug, PartialEq)]
pub enum JDataValue {
    /// Typed array, stored as plain JSON or a JData annotation
    Array(TypedArray),
    /// Record of named values, in insertion order
    Record(IndexMap<String, Self>),
    /// List of values
    List(Vec<Self>),
    /// Any other JSON value, stored as is
    Json(Value),
}

impl JDataValue {
    #[must_use]
    /// Returns the typed array iff this value is an array.
    pub const fn as_array(&self) -> Option<&TypedArray> {
        match self {
            Self::Array(array) => Some(array),
            _ => None,
        }
    }

    #[must_use]
    /// Returns the value stored under `key` iff this value is a record.
    pub fn get(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Record(record) => record.get(key),
            _ => None,
        }
    }
}

impl From<TypedArray> for JDataValue {
    fn from(array: TypedArray) -> Self {
        Self::Array(array)
    }
}

impl From<Value> for JDataValue {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl FromIterator<(String, Self)> for JDataValue {
    fn from_iter<I: IntoIterator<Item = (String, Self)>>(iter: I) -> Self {
        Self::Record(iter.into_iter().collect())
    }
}

/// Encodes the value `tree` into a JSON value, [`encode`]ing every typed
/// array that it contains.
///
/// # Errors
///
/// Errors if [`encode`]ing any array fails.
pub fn encode_tree(
    tree: &JDataValue,
    options: &EncodeOptions,
    registry: &CodecRegistry,
) -> Result<Value, JDataError> {
    match tree {
        JDataValue::Array(array) => encode(array, options, registry),
        JDataValue::Record(record) => record
            .iter()
            .map(|(key, value)| Ok((key.clone(), encode_tree(value, options, registry)?)))
            .collect::<Result<Map<_, _>, _>>()
            .map(Value::Object),
        JDataValue::List(list) => list
            .iter()
            .map(|value| encode_tree(value, options, registry))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        JDataValue::Json(value) => Ok(value.clone()),
    }
}

/// Decodes the parsed JSON `tree` into a value tree, [`decode`]ing annotated
/// arrays.
///
/// With [`DecodeOptions::recursive`], annotated arrays are decoded wherever
/// they occur inside records and lists. Otherwise only an annotated root is
/// decoded, and any other root is returned as [`JDataValue::Json`].
///
/// # Errors
///
/// Errors if [`decode`]ing any annotated array fails.
pub fn decode_tree(
    tree: &Value,
    options: &DecodeOptions,
    registry: &CodecRegistry,
) -> Result<JDataValue, JDataError> {
    match tree {
        Value::Object(object) if is_annotated(object) => {
            match decode(tree, options, registry)? {
                Decoded::One(array) => Ok(JDataValue::Array(array)),
                Decoded::Many(arrays) => Ok(JDataValue::List(
                    arrays.into_iter().map(JDataValue::Array).collect(),
                )),
            }
        }
        tree if !options.recursive => Ok(JDataValue::Json(tree.clone())),
        Value::Object(object) => object
            .iter()
            .map(|(key, value)| Ok((key.clone(), decode_tree(value, options, registry)?)))
            .collect::<Result<IndexMap<_, _>, _>>()
            .map(JDataValue::Record),
        Value::Array(list) => list
            .iter()
            .map(|value| decode_tree(value, options, registry))
            .collect::<Result<Vec<_>, _>>()
            .map(JDataValue::List),
        tree => Ok(JDataValue::Json(tree.clone())),
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;
    use serde_json::json;

    use super::*;
    use crate::AnyArray;

    #[test]
    fn nested_arrays() {
        let tree = JDataValue::from_iter([
            (String::from("name"), JDataValue::Json(json!("grid"))),
            (
                String::from("cells"),
                JDataValue::List(vec![
                    TypedArray::Real(AnyArray::U8(array![[1, 2], [3, 4]].into_dyn())).into(),
                    TypedArray::Real(AnyArray::F32(
                        ndarray::ArrayD::zeros(vec![1, 1, 2]),
                    ))
                    .into(),
                ]),
            ),
        ]);

        let Ok(encoded) = encode_tree(&tree, &EncodeOptions::default(), &CodecRegistry::new())
        else {
            panic!("encoding the tree succeeds");
        };
        assert_eq!(
            encoded,
            json!({
                "name": "grid",
                "cells": [
                    [[1, 2], [3, 4]],
                    {
                        "_ArrayType_": "single",
                        "_ArraySize_": [1, 1, 2],
                        "_ArrayData_": [0.0, 0.0],
                    },
                ],
            })
        );

        let Ok(decoded) = decode_tree(&encoded, &DecodeOptions::default(), &CodecRegistry::new())
        else {
            panic!("decoding the tree succeeds");
        };
        let Some(JDataValue::List(cells)) = decoded.get("cells") else {
            panic!("the cells are a list");
        };
        assert_eq!(
            cells.get(1).and_then(JDataValue::as_array),
            tree.get("cells").and_then(|cells| match cells {
                JDataValue::List(cells) => cells.get(1).and_then(JDataValue::as_array),
                _ => None,
            })
        );
        assert_eq!(decoded.get("name"), Some(&JDataValue::Json(json!("grid"))));
    }

    #[test]
    fn root_only() {
        let tree = json!({
            "inner": { "_ArrayType_": "uint8", "_ArrayData_": [1, 2] },
        });
        let options = DecodeOptions {
            recursive: false,
            ..DecodeOptions::default()
        };

        let decoded = decode_tree(&tree, &options, &CodecRegistry::new());
        assert_eq!(decoded.ok(), Some(JDataValue::Json(tree.clone())));

        let root = json!({ "_ArrayType_": "uint8", "_ArrayData_": [1, 2] });
        let decoded = decode_tree(&root, &options, &CodecRegistry::new());
        assert_eq!(
            decoded.ok(),
            Some(JDataValue::Array(TypedArray::Real(AnyArray::U8(
                array![1, 2].into_dyn()
            ))))
        );
    }
}
