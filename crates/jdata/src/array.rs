use ndarray::{ArrayD, IxDyn, ShapeBuilder, Zip};
use num_complex::Complex;

use crate::{Element, JDataDType, JDataError, SparseMatrix};

/// Dispatches over all variants of an [`AnyArray`], binding the typed array
/// to `$array` in each arm.
macro_rules! map_any_array {
    ($any:expr, $array:ident => $body:expr) => {
        match $any {
            $crate::AnyArray::U8($array) => $body,
            $crate::AnyArray::U16($array) => $body,
            $crate::AnyArray::U32($array) => $body,
            $crate::AnyArray::U64($array) => $body,
            $crate::AnyArray::I8($array) => $body,
            $crate::AnyArray::I16($array) => $body,
            $crate::AnyArray::I32($array) => $body,
            $crate::AnyArray::I64($array) => $body,
            $crate::AnyArray::F32($array) => $body,
            $crate::AnyArray::F64($array) => $body,
            $crate::AnyArray::Bool($array) => $body,
        }
    };
}

/// Dispatches over all dtypes, binding the element type to `$ty` in each arm.
macro_rules! with_element_type {
    ($dtype:expr, $ty:ident => $body:expr) => {
        match $dtype {
            $crate::JDataDType::U8 => {
                type $ty = u8;
                $body
            }
            $crate::JDataDType::U16 => {
                type $ty = u16;
                $body
            }
            $crate::JDataDType::U32 => {
                type $ty = u32;
                $body
            }
            $crate::JDataDType::U64 => {
                type $ty = u64;
                $body
            }
            $crate::JDataDType::I8 => {
                type $ty = i8;
                $body
            }
            $crate::JDataDType::I16 => {
                type $ty = i16;
                $body
            }
            $crate::JDataDType::I32 => {
                type $ty = i32;
                $body
            }
            $crate::JDataDType::I64 => {
                type $ty = i64;
                $body
            }
            $crate::JDataDType::F32 => {
                type $ty = f32;
                $body
            }
            $crate::JDataDType::F64 => {
                type $ty = f64;
                $body
            }
            $crate::JDataDType::Bool => {
                type $ty = bool;
                $body
            }
        }
    };
}

pub(crate) use {map_any_array, with_element_type};

/// Returns the number of elements of an array of `shape`, or `None` if it
/// overflows.
pub(crate) fn checked_len(shape: &[usize]) -> Option<usize> {
    shape.iter().try_fold(1_usize, |len, d| len.checked_mul(*d))
}

/// Dense real n-dimensional array with a dynamic shape and dtype.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
#[expect(missing_docs)]
pub enum AnyArray {
    U8(ArrayD<u8>),
    U16(ArrayD<u16>),
    U32(ArrayD<u32>),
    U64(ArrayD<u64>),
    I8(ArrayD<i8>),
    I16(ArrayD<i16>),
    I32(ArrayD<i32>),
    I64(ArrayD<i64>),
    F32(ArrayD<f32>),
    F64(ArrayD<f64>),
    Bool(ArrayD<bool>),
}

impl AnyArray {
    /// Returns the total number of elements in the array.
    #[must_use]
    pub fn len(&self) -> usize {
        map_any_array!(self, a => a.len())
    }

    /// Returns whether the array has any elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        map_any_array!(self, a => a.is_empty())
    }

    /// Returns the dtype of the array.
    #[must_use]
    pub const fn dtype(&self) -> JDataDType {
        match self {
            Self::U8(_) => JDataDType::U8,
            Self::U16(_) => JDataDType::U16,
            Self::U32(_) => JDataDType::U32,
            Self::U64(_) => JDataDType::U64,
            Self::I8(_) => JDataDType::I8,
            Self::I16(_) => JDataDType::I16,
            Self::I32(_) => JDataDType::I32,
            Self::I64(_) => JDataDType::I64,
            Self::F32(_) => JDataDType::F32,
            Self::F64(_) => JDataDType::F64,
            Self::Bool(_) => JDataDType::Bool,
        }
    }

    /// Returns the shape of the array.
    #[must_use]
    pub fn shape(&self) -> &[usize] {
        map_any_array!(self, a => a.shape())
    }

    #[must_use]
    /// Returns the `T`-typed array in `Some(_)` iff the dtype of `T` matches
    /// the dtype of this array. Returns `None` otherwise.
    pub fn as_typed<T: Element>(&self) -> Option<&ArrayD<T>> {
        T::as_typed(self)
    }

    #[must_use]
    /// Create an array with zeros of `dtype` and shape `shape`.
    pub fn zeros(dtype: JDataDType, shape: &[usize]) -> Self {
        with_element_type!(dtype, T => T::into_any(ArrayD::<T>::default(shape)))
    }

    /// Create an array of `shape` from its `values`, which are given either
    /// in row-major (`column_major == false`) or in column-major order.
    ///
    /// # Errors
    ///
    /// Errors with [`JDataError::DimensionMismatch`] if the number of values
    /// does not match the shape.
    pub fn from_shape_vec<T: Element>(
        shape: &[usize],
        values: Vec<T>,
        column_major: bool,
    ) -> Result<Self, JDataError> {
        let found = values.len();
        let shape_builder = IxDyn(shape).set_f(column_major);

        ArrayD::from_shape_vec(shape_builder, values)
            .map(T::into_any)
            .map_err(|_| JDataError::DimensionMismatch {
                expected: shape.to_vec(),
                found: vec![found],
            })
    }
}

impl<T: Element> From<ArrayD<T>> for AnyArray {
    fn from(array: ArrayD<T>) -> Self {
        T::into_any(array)
    }
}

/// Dense complex n-dimensional array, stored as a real and an imaginary plane
/// of equal dtype and shape.
#[derive(Clone, Debug, PartialEq)]
pub struct ComplexArray {
    re: AnyArray,
    im: AnyArray,
}

impl ComplexArray {
    /// Combines the real plane `re` and the imaginary plane `im` into a
    /// complex array.
    ///
    /// # Errors
    ///
    /// Errors with [`JDataError::InvalidInput`] if the planes differ in dtype
    /// or shape, or if they are logical.
    pub fn try_new(re: AnyArray, im: AnyArray) -> Result<Self, JDataError> {
        if re.dtype() != im.dtype() {
            return Err(JDataError::InvalidInput {
                reason: format!(
                    "complex planes must share one dtype, found {} and {}",
                    re.dtype(),
                    im.dtype()
                ),
            });
        }

        if re.shape() != im.shape() {
            return Err(JDataError::InvalidInput {
                reason: format!(
                    "complex planes must share one shape, found {:?} and {:?}",
                    re.shape(),
                    im.shape()
                ),
            });
        }

        if re.dtype() == JDataDType::Bool {
            return Err(JDataError::InvalidInput {
                reason: String::from("logical arrays cannot be complex"),
            });
        }

        Ok(Self { re, im })
    }

    /// Splits an array of complex numbers into its two planes.
    ///
    /// # Errors
    ///
    /// Errors with [`JDataError::InvalidInput`] if `T` is logical.
    pub fn from_complex<T: Element>(array: &ArrayD<Complex<T>>) -> Result<Self, JDataError> {
        Self::try_new(
            T::into_any(array.mapv(|x| x.re)),
            T::into_any(array.mapv(|x| x.im)),
        )
    }

    #[must_use]
    /// Returns the array of complex numbers iff the dtype of `T` matches the
    /// dtype of this array.
    pub fn to_complex<T: Element>(&self) -> Option<ArrayD<Complex<T>>> {
        let (re, im) = (T::as_typed(&self.re)?, T::as_typed(&self.im)?);

        Some(Zip::from(re).and(im).map_collect(|&re, &im| Complex::new(re, im)))
    }

    #[must_use]
    /// Returns the real plane.
    pub const fn re(&self) -> &AnyArray {
        &self.re
    }

    #[must_use]
    /// Returns the imaginary plane.
    pub const fn im(&self) -> &AnyArray {
        &self.im
    }

    #[must_use]
    /// Returns the dtype shared by both planes.
    pub const fn dtype(&self) -> JDataDType {
        self.re.dtype()
    }

    #[must_use]
    /// Returns the shape shared by both planes.
    pub fn shape(&self) -> &[usize] {
        self.re.shape()
    }

    #[must_use]
    /// Returns the real and imaginary planes.
    pub fn into_parts(self) -> (AnyArray, AnyArray) {
        (self.re, self.im)
    }
}

/// Structural kind of a [`TypedArray`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ArrayKind {
    /// Dense real array
    Dense,
    /// Dense complex array
    DenseComplex,
    /// Sparse real matrix
    Sparse,
    /// Sparse complex matrix
    SparseComplex,
}

/// Native array value that can be stored in a JData annotation.
#[derive(Clone, Debug, PartialEq)]
pub enum TypedArray {
    /// Dense real array of any rank
    Real(AnyArray),
    /// Dense complex array of any rank
    Complex(ComplexArray),
    /// Sparse, optionally complex, matrix
    Sparse(SparseMatrix),
}

impl TypedArray {
    #[must_use]
    /// Returns the structural kind of the array.
    pub const fn kind(&self) -> ArrayKind {
        match self {
            Self::Real(_) => ArrayKind::Dense,
            Self::Complex(_) => ArrayKind::DenseComplex,
            Self::Sparse(sparse) if sparse.is_complex() => ArrayKind::SparseComplex,
            Self::Sparse(_) => ArrayKind::Sparse,
        }
    }

    #[must_use]
    /// Returns the dtype of the array.
    pub const fn dtype(&self) -> JDataDType {
        match self {
            Self::Real(array) => array.dtype(),
            Self::Complex(array) => array.dtype(),
            Self::Sparse(sparse) => sparse.dtype(),
        }
    }

    #[must_use]
    /// Returns the logical shape of the array.
    pub fn shape(&self) -> &[usize] {
        match self {
            Self::Real(array) => array.shape(),
            Self::Complex(array) => array.shape(),
            Self::Sparse(sparse) => sparse.shape(),
        }
    }

    #[must_use]
    /// Returns the logical number of elements, i.e. the product of the shape.
    ///
    /// The product saturates at [`usize::MAX`], which sparse matrices with a
    /// huge shape can reach.
    pub fn len(&self) -> usize {
        self.shape()
            .iter()
            .fold(1, |len: usize, d| len.saturating_mul(*d))
    }

    #[must_use]
    /// Returns whether the array has no logical elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    /// Returns whether the array is stored in sparse form.
    pub const fn is_sparse(&self) -> bool {
        matches!(self, Self::Sparse(_))
    }

    #[must_use]
    /// Returns whether the array holds complex values.
    pub const fn is_complex(&self) -> bool {
        matches!(
            self.kind(),
            ArrayKind::DenseComplex | ArrayKind::SparseComplex
        )
    }
}

impl From<AnyArray> for TypedArray {
    fn from(array: AnyArray) -> Self {
        Self::Real(array)
    }
}

impl From<ComplexArray> for TypedArray {
    fn from(array: ComplexArray) -> Self {
        Self::Complex(array)
    }
}

impl From<SparseMatrix> for TypedArray {
    fn from(sparse: SparseMatrix) -> Self {
        Self::Sparse(sparse)
    }
}
