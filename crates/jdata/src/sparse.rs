use ndarray::{Array1, Array2, ArrayD, ArrayView2, Axis, Ix2};

use crate::{
    AnyArray, ComplexArray, Element, JDataDType, JDataError,
    array::{map_any_array, with_element_type},
};

/// Two-dimensional sparse matrix in coordinate form.
///
/// Every stored entry has a 0-based `(row, column)` coordinate and a value.
/// Entries are kept in column-major order of their coordinates, and entries
/// with the same coordinate keep the order in which they were given, so
/// explicitly stored zeros and duplicate coordinates survive a JData round
/// trip.
#[derive(Clone, Debug, PartialEq)]
pub struct SparseMatrix {
    shape: [usize; 2],
    rows: Vec<usize>,
    cols: Vec<usize>,
    values: AnyArray,
    imag: Option<AnyArray>,
}

impl SparseMatrix {
    #[must_use]
    /// Creates a sparse matrix of `dtype` and `shape` without stored entries.
    pub fn zeros(dtype: JDataDType, shape: [usize; 2]) -> Self {
        Self {
            shape,
            rows: Vec::new(),
            cols: Vec::new(),
            values: AnyArray::zeros(dtype, &[0]),
            imag: None,
        }
    }

    /// Creates a sparse matrix from its stored entries.
    ///
    /// The `values` (and optional imaginary parts `imag`) must be
    /// one-dimensional and contain one element per `(rows, cols)` coordinate.
    /// The entries are stably sorted into column-major order.
    ///
    /// # Errors
    ///
    /// Errors with
    /// - [`JDataError::InvalidInput`] if the entries are inconsistent or
    ///   logical values are given an imaginary part
    /// - [`JDataError::DimensionMismatch`] if a coordinate lies outside
    ///   `shape`
    pub fn try_new(
        shape: [usize; 2],
        rows: Vec<usize>,
        cols: Vec<usize>,
        values: AnyArray,
        imag: Option<AnyArray>,
    ) -> Result<Self, JDataError> {
        if values.shape().len() != 1 || values.len() != rows.len() || rows.len() != cols.len() {
            return Err(JDataError::InvalidInput {
                reason: format!(
                    "sparse entries need one value per coordinate, found {} rows, {} columns, and values of shape {:?}",
                    rows.len(),
                    cols.len(),
                    values.shape()
                ),
            });
        }

        if let Some(imag) = &imag {
            ComplexArray::try_new(values.clone(), imag.clone())?;
        }

        let [nrows, ncols] = shape;
        if let Some((row, col)) = rows
            .iter()
            .zip(&cols)
            .find(|(row, col)| **row >= nrows || **col >= ncols)
        {
            return Err(JDataError::DimensionMismatch {
                expected: shape.to_vec(),
                found: vec![row + 1, col + 1],
            });
        }

        let mut order = (0..rows.len()).collect::<Vec<_>>();
        order.sort_by_key(|&i| (cols.get(i), rows.get(i)));

        if order.iter().enumerate().any(|(i, j)| i != *j) {
            let permute = |indices: &[usize]| {
                order
                    .iter()
                    .filter_map(|i| indices.get(*i).copied())
                    .collect::<Vec<_>>()
            };
            let select = |values: &AnyArray| {
                map_any_array!(values, a => Element::into_any(a.select(Axis(0), &order)))
            };

            return Ok(Self {
                shape,
                rows: permute(&rows),
                cols: permute(&cols),
                values: select(&values),
                imag: imag.as_ref().map(select),
            });
        }

        Ok(Self {
            shape,
            rows,
            cols,
            values,
            imag,
        })
    }

    /// Creates a sparse matrix from `(row, column, value)` triplets.
    ///
    /// # Errors
    ///
    /// Errors with [`JDataError::DimensionMismatch`] if a coordinate lies
    /// outside `shape`.
    pub fn from_triplets<T: Element>(
        shape: [usize; 2],
        triplets: impl IntoIterator<Item = (usize, usize, T)>,
    ) -> Result<Self, JDataError> {
        let mut rows = Vec::new();
        let mut cols = Vec::new();
        let mut values = Vec::new();

        for (row, col, value) in triplets {
            rows.push(row);
            cols.push(col);
            values.push(value);
        }

        Self::try_new(
            shape,
            rows,
            cols,
            T::into_any(Array1::from_vec(values).into_dyn()),
            None,
        )
    }

    /// Collects the non-zero entries of a dense matrix in column-major order.
    ///
    /// # Errors
    ///
    /// Errors with [`JDataError::InvalidInput`] if the array is not
    /// two-dimensional.
    pub fn from_dense(array: &AnyArray) -> Result<Self, JDataError> {
        map_any_array!(array, a => {
            let matrix = as_matrix(a)?;
            let (rows, cols, values) = collect_non_zero(matrix, |_, _| false);
            Self::try_new(
                [matrix.nrows(), matrix.ncols()],
                rows,
                cols,
                Element::into_any(Array1::from_vec(values).into_dyn()),
                None,
            )
        })
    }

    /// Collects the entries of a dense complex matrix, for which the real or
    /// imaginary part is non-zero, in column-major order.
    ///
    /// # Errors
    ///
    /// Errors with [`JDataError::InvalidInput`] if the array is not
    /// two-dimensional.
    pub fn from_dense_complex(array: &ComplexArray) -> Result<Self, JDataError> {
        with_element_type!(array.dtype(), T => {
            let (Some(re), Some(im)) = (array.re().as_typed::<T>(), array.im().as_typed::<T>()) else {
                return Err(JDataError::InvalidInput {
                    reason: String::from("complex planes must share one dtype"),
                });
            };
            let (re, im) = (as_matrix(re)?, as_matrix(im)?);

            let mut imag = Vec::new();
            let (rows, cols, values) = collect_non_zero(re, |row, col| {
                im.get((row, col)).is_some_and(|x| !x.is_zero())
            });
            for (row, col) in rows.iter().zip(&cols) {
                imag.push(im.get((*row, *col)).copied().unwrap_or_default());
            }

            Self::try_new(
                [re.nrows(), re.ncols()],
                rows,
                cols,
                T::into_any(Array1::from_vec(values).into_dyn()),
                Some(T::into_any(Array1::from_vec(imag).into_dyn())),
            )
        })
    }

    #[must_use]
    /// Returns the dtype of the stored values.
    pub const fn dtype(&self) -> JDataDType {
        self.values.dtype()
    }

    #[must_use]
    /// Returns the two-dimensional shape of the matrix.
    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    #[must_use]
    /// Returns the number of stored entries.
    pub fn nnz(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    /// Returns whether the stored values have imaginary parts.
    pub const fn is_complex(&self) -> bool {
        self.imag.is_some()
    }

    #[must_use]
    /// Returns the 0-based row of every stored entry.
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    #[must_use]
    /// Returns the 0-based column of every stored entry.
    pub fn cols(&self) -> &[usize] {
        &self.cols
    }

    #[must_use]
    /// Returns the one-dimensional array of stored (real) values.
    pub const fn values(&self) -> &AnyArray {
        &self.values
    }

    #[must_use]
    /// Returns the one-dimensional array of imaginary parts, if complex.
    pub const fn imag(&self) -> Option<&AnyArray> {
        self.imag.as_ref()
    }

    #[must_use]
    /// Scatters the real parts of the stored entries into a dense matrix.
    ///
    /// If a coordinate is stored more than once, the last entry wins.
    pub fn to_dense(&self) -> AnyArray {
        map_any_array!(&self.values, values => Element::into_any(self.scatter(values)))
    }

    #[must_use]
    /// Scatters the stored entries into a dense complex matrix, or returns
    /// `None` if the matrix is real.
    pub fn to_dense_complex(&self) -> Option<ComplexArray> {
        let imag = self.imag.as_ref()?;

        let im = map_any_array!(imag, values => Element::into_any(self.scatter(values)));

        ComplexArray::try_new(self.to_dense(), im).ok()
    }

    fn scatter<T: Element>(&self, values: &ArrayD<T>) -> ArrayD<T> {
        let [nrows, ncols] = self.shape;
        let mut dense = Array2::<T>::default((nrows, ncols));

        for ((row, col), value) in self.rows.iter().zip(&self.cols).zip(values) {
            if let Some(x) = dense.get_mut((*row, *col)) {
                *x = *value;
            }
        }

        dense.into_dyn()
    }
}

fn as_matrix<T>(array: &ArrayD<T>) -> Result<ArrayView2<'_, T>, JDataError> {
    array
        .view()
        .into_dimensionality::<Ix2>()
        .map_err(|_| JDataError::InvalidInput {
            reason: format!(
                "only two-dimensional arrays can be sparse, found shape {:?}",
                array.shape()
            ),
        })
}

fn collect_non_zero<T: Element>(
    matrix: ArrayView2<T>,
    also_stored: impl Fn(usize, usize) -> bool,
) -> (Vec<usize>, Vec<usize>, Vec<T>) {
    let mut rows = Vec::new();
    let mut cols = Vec::new();
    let mut values = Vec::new();

    for col in 0..matrix.ncols() {
        for row in 0..matrix.nrows() {
            let Some(&value) = matrix.get((row, col)) else {
                continue;
            };

            if !value.is_zero() || also_stored(row, col) {
                rows.push(row);
                cols.push(col);
                values.push(value);
            }
        }
    }

    (rows, cols, values)
}
