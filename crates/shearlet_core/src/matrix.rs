//! Dense row-major matrix container.
//!
//! A [`Matrix`] either owns an `ndarray::Array2` or wraps a caller-provided
//! buffer through a mutable view. The storage kind is fixed when the matrix
//! is created: borrowed buffers are never freed or reallocated, and cloning
//! always produces an owned deep copy. All arithmetic is dispatched through
//! the backend type parameter.

use std::fmt;
use std::marker::PhantomData;
use std::ops::{AddAssign, Index, IndexMut, MulAssign};

use ndarray::{Array2, ArrayView2, ArrayViewMut2, Axis};

use crate::backend::{Backend, Cpu};
use crate::error::Result;
use crate::float_trait::{Element, ShearletFloat};

/// A matrix that owns its storage.
pub type OwnedMatrix<T, B = Cpu> = Matrix<'static, T, B>;

enum Storage<'a, T> {
    Owned(Array2<T>),
    Borrowed(ArrayViewMut2<'a, T>),
}

/// Row-major 2-D buffer of real or complex elements.
pub struct Matrix<'a, T, B = Cpu> {
    storage: Storage<'a, T>,
    backend: PhantomData<B>,
}

impl<T: Element, B: Backend> Matrix<'static, T, B> {
    /// Zero-filled matrix.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::from_storage(Storage::Owned(Array2::zeros((rows, cols))))
    }

    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self::from_storage(Storage::Owned(Array2::from_elem((rows, cols), value)))
    }

    /// Take ownership of an array, re-laying it out row-major if needed.
    pub fn from_array(array: Array2<T>) -> Self {
        let array = if array.is_standard_layout() {
            array
        } else {
            array.as_standard_layout().into_owned()
        };
        Self::from_storage(Storage::Owned(array))
    }

    pub fn from_shape_vec(rows: usize, cols: usize, data: Vec<T>) -> Result<Self> {
        Ok(Self::from_storage(Storage::Owned(Array2::from_shape_vec(
            (rows, cols),
            data,
        )?)))
    }
}

impl<'a, T: Element, B: Backend> Matrix<'a, T, B> {
    /// Wrap an external row-major buffer without taking ownership.
    pub fn from_slice_mut(rows: usize, cols: usize, data: &'a mut [T]) -> Result<Self> {
        let view = ArrayViewMut2::from_shape((rows, cols), data)?;
        Ok(Self::from_storage(Storage::Borrowed(view)))
    }

    fn from_storage(storage: Storage<'a, T>) -> Self {
        Self {
            storage,
            backend: PhantomData,
        }
    }

    pub fn dims(&self) -> (usize, usize) {
        self.view().dim()
    }

    pub fn rows(&self) -> usize {
        self.dims().0
    }

    pub fn cols(&self) -> usize {
        self.dims().1
    }

    pub fn size(&self) -> usize {
        let (rows, cols) = self.dims();
        rows * cols
    }

    pub fn is_owned(&self) -> bool {
        matches!(self.storage, Storage::Owned(_))
    }

    pub fn view(&self) -> ArrayView2<'_, T> {
        match &self.storage {
            Storage::Owned(array) => array.view(),
            Storage::Borrowed(view) => view.view(),
        }
    }

    pub fn view_mut(&mut self) -> ArrayViewMut2<'_, T> {
        match &mut self.storage {
            Storage::Owned(array) => array.view_mut(),
            Storage::Borrowed(view) => view.view_mut(),
        }
    }

    pub fn as_slice(&self) -> &[T] {
        let slice = match &self.storage {
            Storage::Owned(array) => array.as_slice(),
            Storage::Borrowed(view) => view.as_slice(),
        };
        slice.expect("matrix storage is contiguous row-major")
    }

    pub fn as_slice_mut(&mut self) -> &mut [T] {
        let slice = match &mut self.storage {
            Storage::Owned(array) => array.as_slice_mut(),
            Storage::Borrowed(view) => view.as_slice_mut(),
        };
        slice.expect("matrix storage is contiguous row-major")
    }

    /// Owned `ndarray` copy of the contents.
    pub fn to_array(&self) -> Array2<T> {
        self.view().to_owned()
    }

    /// Deep copy into owned storage, detached from any borrowed buffer.
    pub fn to_owned_matrix(&self) -> OwnedMatrix<T, B> {
        let (rows, cols) = self.dims();
        let mut out = OwnedMatrix::<T, B>::new(rows, cols);
        B::copy(out.as_slice_mut(), self.as_slice());
        out
    }

    pub fn fill(&mut self, value: T) {
        B::fill(self.as_slice_mut(), value);
    }

    pub fn scale(&mut self, factor: T::Real) {
        B::scale_in_place(self.as_slice_mut(), factor);
    }

    pub fn div_scalar(&mut self, value: T) {
        B::div_scalar_in_place(self.as_slice_mut(), value);
    }

    /// Divide by the sum of element magnitudes.
    pub fn normalize(&mut self) {
        B::normalize(self.as_slice_mut());
    }

    /// Divide by `rows * cols`, the inverse FFT normalization.
    pub fn normalize_size(&mut self) {
        let size = <T::Real as ShearletFloat>::usize_as(self.size());
        self.scale(<T::Real as num_traits::One>::one() / size);
    }

    /// Reverse the order of rows (`Axis(0)`) or columns (`Axis(1)`).
    pub fn flip(&mut self, axis: Axis) {
        let (rows, cols) = self.dims();
        B::flip(self.as_slice_mut(), rows, cols, axis);
    }

    /// Zero every element with magnitude below `|threshold|`.
    pub fn apply_threshold(&mut self, threshold: T::Real) {
        B::threshold(self.as_slice_mut(), threshold);
    }
}

impl<T: Element, B: Backend> Clone for Matrix<'_, T, B> {
    fn clone(&self) -> Self {
        Self::from_storage(Storage::Owned(self.to_array()))
    }
}

impl<T: Element, B: Backend> PartialEq for Matrix<'_, T, B> {
    fn eq(&self, other: &Self) -> bool {
        self.dims() == other.dims() && self.as_slice() == other.as_slice()
    }
}

impl<T: Element, B: Backend> fmt::Debug for Matrix<'_, T, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Matrix")
            .field("dims", &self.dims())
            .field("owned", &self.is_owned())
            .field("backend", &B::NAME)
            .finish()
    }
}

impl<T: Element, B: Backend> Index<(usize, usize)> for Matrix<'_, T, B> {
    type Output = T;

    fn index(&self, (i, j): (usize, usize)) -> &T {
        let cols = self.cols();
        assert!(i < self.rows() && j < cols, "index ({i}, {j}) out of bounds");
        &self.as_slice()[i * cols + j]
    }
}

impl<T: Element, B: Backend> IndexMut<(usize, usize)> for Matrix<'_, T, B> {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut T {
        let cols = self.cols();
        assert!(i < self.rows() && j < cols, "index ({i}, {j}) out of bounds");
        &mut self.as_slice_mut()[i * cols + j]
    }
}

impl<T: Element, B: Backend> AddAssign<&Matrix<'_, T, B>> for Matrix<'_, T, B> {
    fn add_assign(&mut self, rhs: &Matrix<'_, T, B>) {
        assert_eq!(self.dims(), rhs.dims(), "matrix dimensions differ");
        B::add_in_place(self.as_slice_mut(), rhs.as_slice());
    }
}

impl<T: Element, B: Backend> MulAssign<&Matrix<'_, T, B>> for Matrix<'_, T, B> {
    fn mul_assign(&mut self, rhs: &Matrix<'_, T, B>) {
        assert_eq!(self.dims(), rhs.dims(), "matrix dimensions differ");
        B::mul_in_place(self.as_slice_mut(), rhs.as_slice());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustfft::num_complex::Complex;

    #[test]
    fn test_new_is_zero_filled() {
        let m = OwnedMatrix::<f64>::new(3, 4);
        assert_eq!(m.dims(), (3, 4));
        assert_eq!(m.size(), 12);
        assert!(m.is_owned());
        assert!(m.as_slice().iter().all(|&x| x == 0.0));
    }

    #[test]
    fn test_index_is_row_major() {
        let m = OwnedMatrix::<f32>::from_shape_vec(2, 3, (0..6).map(|x| x as f32).collect())
            .unwrap();
        assert_eq!(m[(0, 2)], 2.0);
        assert_eq!(m[(1, 0)], 3.0);
    }

    #[test]
    fn test_from_shape_vec_rejects_bad_length() {
        assert!(OwnedMatrix::<f64>::from_shape_vec(2, 3, vec![0.0; 5]).is_err());
    }

    #[test]
    fn test_from_array_transposed_layout() {
        let array = Array2::from_shape_vec((2, 3), vec![1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0])
            .unwrap()
            .reversed_axes();
        let m = OwnedMatrix::<f64>::from_array(array);
        assert_eq!(m.dims(), (3, 2));
        assert_eq!(m.as_slice(), &[1.0, 4.0, 2.0, 5.0, 3.0, 6.0]);
    }

    #[test]
    fn test_borrowed_writes_through() {
        let mut buffer = vec![1.0f64; 6];
        {
            let mut m = Matrix::<f64>::from_slice_mut(2, 3, &mut buffer).unwrap();
            assert!(!m.is_owned());
            m[(1, 1)] = 7.0;
            m.scale(2.0);
        }
        assert_eq!(buffer, vec![2.0, 2.0, 2.0, 2.0, 14.0, 2.0]);
    }

    #[test]
    fn test_clone_is_deep_and_owned() {
        let mut buffer = vec![3.0f32; 4];
        let borrowed = Matrix::<f32>::from_slice_mut(2, 2, &mut buffer).unwrap();
        let mut copy = borrowed.clone();
        assert!(copy.is_owned());
        copy[(0, 0)] = -1.0;
        assert_eq!(borrowed[(0, 0)], 3.0);
    }

    #[test]
    fn test_add_and_mul_assign() {
        let mut a = OwnedMatrix::<f64>::filled(4, 4, 2.0);
        let b = OwnedMatrix::<f64>::filled(4, 4, 3.0);
        a += &b;
        assert!(a.as_slice().iter().all(|&x| x == 5.0));
        a *= &b;
        assert!(a.as_slice().iter().all(|&x| x == 15.0));
    }

    #[test]
    #[should_panic(expected = "matrix dimensions differ")]
    fn test_add_assign_dimension_mismatch_panics() {
        let mut a = OwnedMatrix::<f64>::new(2, 2);
        let b = OwnedMatrix::<f64>::new(2, 3);
        a += &b;
    }

    #[test]
    fn test_normalize_size_complex() {
        let mut m = OwnedMatrix::<Complex<f64>>::filled(2, 4, Complex::new(8.0, -16.0));
        m.normalize_size();
        assert_eq!(m[(1, 3)], Complex::new(1.0, -2.0));
    }

    #[test]
    fn test_flip_and_threshold() {
        let mut m =
            OwnedMatrix::<f64>::from_shape_vec(2, 3, vec![0.1, 2.0, -3.0, 4.0, -0.2, 6.0])
                .unwrap();
        m.flip(Axis(1));
        assert_eq!(m.as_slice(), &[-3.0, 2.0, 0.1, 6.0, -0.2, 4.0]);
        m.flip(Axis(0));
        assert_eq!(m.as_slice(), &[6.0, -0.2, 4.0, -3.0, 2.0, 0.1]);
        m.apply_threshold(0.5);
        assert_eq!(m.as_slice(), &[6.0, 0.0, 4.0, -3.0, 2.0, 0.0]);
    }

    #[test]
    fn test_div_scalar_and_normalize() {
        let mut m = OwnedMatrix::<f64>::filled(2, 2, 6.0);
        m.div_scalar(3.0);
        assert_eq!(m[(1, 1)], 2.0);
        m.normalize();
        assert!((m.as_slice().iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }
}
