//! Exact-indexing matrix primitives used by the filter-bank builder.
//!
//! Every primitive comes as an `_into` variant that writes into a
//! caller-sized output and asserts the dimensions, plus an allocating
//! wrapper. The `_dims` helpers compute output sizes without doing any work.

use ndarray::{s, Axis, Slice};
use num_traits::{Float, Zero};
use rustfft::num_complex::Complex;

use crate::backend::Backend;
use crate::float_trait::{Element, ShearletFloat};
use crate::matrix::{Matrix, OwnedMatrix};

/// Side length of the square tiles used by the blocked transpose.
const TRANSPOSE_BLOCK: usize = 32;

fn check_axis(axis: Axis) {
    assert!(axis.index() < 2, "axis must be 0 or 1, got {}", axis.index());
}

// =============================================================================
// Resampling
// =============================================================================

/// Output size of keeping every `stride`-th row or column.
pub fn downsample_dims((rows, cols): (usize, usize), axis: Axis, stride: usize) -> (usize, usize) {
    check_axis(axis);
    assert!(stride > 0, "stride must be positive");
    if axis.index() == 0 {
        (rows.div_ceil(stride), cols)
    } else {
        (rows, cols.div_ceil(stride))
    }
}

pub fn downsample_into<T: Element, B: Backend>(
    input: &Matrix<'_, T, B>,
    out: &mut Matrix<'_, T, B>,
    axis: Axis,
    stride: usize,
) {
    assert_eq!(out.dims(), downsample_dims(input.dims(), axis, stride));
    let source = input.view();
    let kept = source.slice_axis(axis, Slice::new(0, None, stride as isize));
    out.view_mut().assign(&kept);
}

pub fn downsample<T: Element, B: Backend>(
    input: &Matrix<'_, T, B>,
    axis: Axis,
    stride: usize,
) -> OwnedMatrix<T, B> {
    let (rows, cols) = downsample_dims(input.dims(), axis, stride);
    let mut out = Matrix::new(rows, cols);
    downsample_into(input, &mut out, axis, stride);
    out
}

/// Output size of inserting `nzeros` zero lines between consecutive lines.
pub fn upsample_dims((rows, cols): (usize, usize), axis: Axis, nzeros: usize) -> (usize, usize) {
    check_axis(axis);
    let grow = |n: usize| if n == 0 { 0 } else { (n - 1) * nzeros + n };
    if axis.index() == 0 {
        (grow(rows), cols)
    } else {
        (rows, grow(cols))
    }
}

pub fn upsample_into<T: Element, B: Backend>(
    input: &Matrix<'_, T, B>,
    out: &mut Matrix<'_, T, B>,
    axis: Axis,
    nzeros: usize,
) {
    assert_eq!(out.dims(), upsample_dims(input.dims(), axis, nzeros));
    out.fill(T::zero());
    let mut target = out.view_mut();
    target
        .slice_axis_mut(axis, Slice::new(0, None, (nzeros + 1) as isize))
        .assign(&input.view());
}

pub fn upsample<T: Element, B: Backend>(
    input: &Matrix<'_, T, B>,
    axis: Axis,
    nzeros: usize,
) -> OwnedMatrix<T, B> {
    let (rows, cols) = upsample_dims(input.dims(), axis, nzeros);
    let mut out = Matrix::new(rows, cols);
    upsample_into(input, &mut out, axis, nzeros);
    out
}

// =============================================================================
// Padding and shearing
// =============================================================================

/// Offset of the content when centering `inner` inside `outer`. Odd extra
/// padding goes before the content.
pub fn pad_offset(inner: usize, outer: usize) -> usize {
    let diff = outer - inner;
    diff / 2 + diff % 2
}

/// Center `input` inside `out`, zeroing everything else.
pub fn pad_into<T: Element, B: Backend>(input: &Matrix<'_, T, B>, out: &mut Matrix<'_, T, B>) {
    let (rows, cols) = input.dims();
    let (out_rows, out_cols) = out.dims();
    assert!(
        rows <= out_rows && cols <= out_cols,
        "cannot pad {:?} into {:?}",
        (rows, cols),
        (out_rows, out_cols)
    );
    let r0 = pad_offset(rows, out_rows);
    let c0 = pad_offset(cols, out_cols);
    out.fill(T::zero());
    out.view_mut()
        .slice_mut(s![r0..r0 + rows, c0..c0 + cols])
        .assign(&input.view());
}

pub fn pad<T: Element, B: Backend>(
    input: &Matrix<'_, T, B>,
    rows: usize,
    cols: usize,
) -> OwnedMatrix<T, B> {
    let mut out = Matrix::new(rows, cols);
    pad_into(input, &mut out);
    out
}

/// Discrete shear with wraparound.
///
/// With `Axis(1)` row `i` is rotated along the columns by
/// `-k * (rows/2 - i)`; with `Axis(0)` column `j` is rotated along the rows
/// by `-k * (cols/2 - j)`. A positive shift moves element `p` to `p + s`.
pub fn dshear_into<T: Element, B: Backend>(
    input: &Matrix<'_, T, B>,
    out: &mut Matrix<'_, T, B>,
    k: isize,
    axis: Axis,
) {
    check_axis(axis);
    assert_eq!(out.dims(), input.dims());
    let (rows, cols) = input.dims();
    if rows == 0 || cols == 0 {
        return;
    }
    let src = input.as_slice();
    let dst = out.as_slice_mut();

    if axis.index() == 1 {
        let half = (rows / 2) as isize;
        for (i, (dst_row, src_row)) in dst
            .chunks_exact_mut(cols)
            .zip(src.chunks_exact(cols))
            .enumerate()
        {
            let shift = (-k * (half - i as isize)).rem_euclid(cols as isize) as usize;
            dst_row.copy_from_slice(src_row);
            dst_row.rotate_right(shift);
        }
    } else {
        let half = (cols / 2) as isize;
        for j in 0..cols {
            let shift = (-k * (half - j as isize)).rem_euclid(rows as isize) as usize;
            for i in 0..rows {
                dst[((i + shift) % rows) * cols + j] = src[i * cols + j];
            }
        }
    }
}

pub fn dshear<T: Element, B: Backend>(
    input: &Matrix<'_, T, B>,
    k: isize,
    axis: Axis,
) -> OwnedMatrix<T, B> {
    let (rows, cols) = input.dims();
    let mut out = Matrix::new(rows, cols);
    dshear_into(input, &mut out, k, axis);
    out
}

// =============================================================================
// Transpose
// =============================================================================

/// Blocked transpose of a `rows x cols` row-major buffer into `dst`.
pub(crate) fn transpose_slice<T: Copy>(src: &[T], dst: &mut [T], rows: usize, cols: usize) {
    debug_assert_eq!(src.len(), rows * cols);
    debug_assert_eq!(dst.len(), rows * cols);
    for r0 in (0..rows).step_by(TRANSPOSE_BLOCK) {
        let r1 = (r0 + TRANSPOSE_BLOCK).min(rows);
        for c0 in (0..cols).step_by(TRANSPOSE_BLOCK) {
            let c1 = (c0 + TRANSPOSE_BLOCK).min(cols);
            for r in r0..r1 {
                for c in c0..c1 {
                    dst[c * rows + r] = src[r * cols + c];
                }
            }
        }
    }
}

pub fn transpose_into<T: Element, B: Backend>(
    input: &Matrix<'_, T, B>,
    out: &mut Matrix<'_, T, B>,
) {
    let (rows, cols) = input.dims();
    assert_eq!(out.dims(), (cols, rows), "transpose output must swap dims");
    transpose_slice(input.as_slice(), out.as_slice_mut(), rows, cols);
}

pub fn transpose<T: Element, B: Backend>(input: &Matrix<'_, T, B>) -> OwnedMatrix<T, B> {
    let (rows, cols) = input.dims();
    let mut out = Matrix::new(cols, rows);
    transpose_into(input, &mut out);
    out
}

// =============================================================================
// Direct convolution and products
// =============================================================================

/// Size of the full 2-D convolution of two matrices.
pub fn convolve_dims(a: (usize, usize), b: (usize, usize)) -> (usize, usize) {
    assert!(a.0 > 0 && a.1 > 0 && b.0 > 0 && b.1 > 0, "empty convolution operand");
    (a.0 + b.0 - 1, a.1 + b.1 - 1)
}

/// Full 2-D convolution by direct summation. Meant for small filters.
pub fn convolve_into<T: Element, B: Backend>(
    a: &Matrix<'_, T, B>,
    b: &Matrix<'_, T, B>,
    out: &mut Matrix<'_, T, B>,
) {
    let (a_rows, a_cols) = a.dims();
    let (b_rows, b_cols) = b.dims();
    let (out_rows, out_cols) = convolve_dims(a.dims(), b.dims());
    assert_eq!(out.dims(), (out_rows, out_cols));

    let a_data = a.as_slice();
    let b_data = b.as_slice();
    out.fill(T::zero());
    let dst = out.as_slice_mut();
    for i1 in 0..a_rows {
        for j1 in 0..a_cols {
            let x = a_data[i1 * a_cols + j1];
            if x == T::zero() {
                continue;
            }
            for i2 in 0..b_rows {
                let out_row = &mut dst[(i1 + i2) * out_cols + j1..][..b_cols];
                let b_row = &b_data[i2 * b_cols..(i2 + 1) * b_cols];
                for (o, &y) in out_row.iter_mut().zip(b_row) {
                    *o += x * y;
                }
            }
        }
    }
}

pub fn convolve<T: Element, B: Backend>(
    a: &Matrix<'_, T, B>,
    b: &Matrix<'_, T, B>,
) -> OwnedMatrix<T, B> {
    let (rows, cols) = convolve_dims(a.dims(), b.dims());
    let mut out = Matrix::new(rows, cols);
    convolve_into(a, b, &mut out);
    out
}

/// Euclidean norm over all elements.
pub fn norm_l2<T: Element, B: Backend>(input: &Matrix<'_, T, B>) -> T::Real {
    input
        .as_slice()
        .iter()
        .fold(T::Real::zero(), |acc, &x| acc + x.magnitude_sqr())
        .sqrt()
}

/// Naive matrix product. Inner dimensions are not checked in release builds.
pub fn mat_mul_into<T: Element, B: Backend>(
    a: &Matrix<'_, T, B>,
    b: &Matrix<'_, T, B>,
    out: &mut Matrix<'_, T, B>,
) {
    let (n, inner) = a.dims();
    let m = b.cols();
    debug_assert_eq!(inner, b.rows());
    debug_assert_eq!(out.dims(), (n, m));
    let a_data = a.as_slice();
    let b_data = b.as_slice();
    let dst = out.as_slice_mut();
    for i in 0..n {
        for j in 0..m {
            let mut acc = T::zero();
            for p in 0..inner {
                acc += a_data[i * inner + p] * b_data[p * m + j];
            }
            dst[i * m + j] = acc;
        }
    }
}

pub fn mat_mul<T: Element, B: Backend>(
    a: &Matrix<'_, T, B>,
    b: &Matrix<'_, T, B>,
) -> OwnedMatrix<T, B> {
    let mut out = Matrix::new(a.rows(), b.cols());
    mat_mul_into(a, b, &mut out);
    out
}

// =============================================================================
// Real / complex
// =============================================================================

pub fn real_to_complex_into<F: ShearletFloat, B: Backend>(
    input: &Matrix<'_, F, B>,
    out: &mut Matrix<'_, Complex<F>, B>,
) {
    assert_eq!(out.dims(), input.dims());
    for (o, &x) in out.as_slice_mut().iter_mut().zip(input.as_slice()) {
        *o = Complex::<F>::from_real(x);
    }
}

pub fn real_to_complex<F: ShearletFloat, B: Backend>(
    input: &Matrix<'_, F, B>,
) -> OwnedMatrix<Complex<F>, B> {
    let (rows, cols) = input.dims();
    let mut out = Matrix::new(rows, cols);
    real_to_complex_into(input, &mut out);
    out
}

/// Keep the real part.
pub fn complex_to_real_into<F: ShearletFloat, B: Backend>(
    input: &Matrix<'_, Complex<F>, B>,
    out: &mut Matrix<'_, F, B>,
) {
    assert_eq!(out.dims(), input.dims());
    for (o, z) in out.as_slice_mut().iter_mut().zip(input.as_slice()) {
        *o = z.re;
    }
}

pub fn complex_to_real<F: ShearletFloat, B: Backend>(
    input: &Matrix<'_, Complex<F>, B>,
) -> OwnedMatrix<F, B> {
    let (rows, cols) = input.dims();
    let mut out = Matrix::new(rows, cols);
    complex_to_real_into(input, &mut out);
    out
}

/// `acc += Σ_k |inputs[k]|²` elementwise.
pub fn reduce_magnitude_sqr_into<F: ShearletFloat, B: Backend>(
    inputs: &[OwnedMatrix<Complex<F>, B>],
    acc: &mut Matrix<'_, F, B>,
) {
    for input in inputs {
        assert_eq!(input.dims(), acc.dims());
        B::accumulate_magnitude_sqr(acc.as_slice_mut(), input.as_slice());
    }
}

/// Elementwise sum of squared magnitudes. `inputs` must be non-empty.
pub fn reduce_magnitude_sqr<F: ShearletFloat, B: Backend>(
    inputs: &[OwnedMatrix<Complex<F>, B>],
) -> OwnedMatrix<F, B> {
    assert!(!inputs.is_empty(), "nothing to reduce");
    let (rows, cols) = inputs[0].dims();
    let mut acc = Matrix::new(rows, cols);
    reduce_magnitude_sqr_into(inputs, &mut acc);
    acc
}
