//! 2-D Fourier engine with centered-spectrum helpers.
//!
//! A [`FourierEngine`] is planned once for a `(rows, cols)` grid and reused
//! for every transform at that size. Rows are transformed in place in
//! parallel; columns go through a transposed scratch buffer so the column
//! plan also runs over contiguous memory.
//!
//! The composite operators are named `<a><b>2<out>` where each letter is
//! `d` (data domain) or `f` (frequency domain). `corr_ff2d(a, b, out)` for
//! instance multiplies two spectra as `a * conj(b)` and transforms the
//! product back to the data domain. All shifts are applied so that the
//! spectra are DC-centered.

use std::sync::Arc;

use num_traits::Zero;
use rayon::prelude::*;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};

use crate::backend::Backend;
use crate::float_trait::{Element, ShearletFloat};
use crate::matrix::{Matrix, OwnedMatrix};
use crate::transform::{pad_into, transpose_slice};

/// Domain of a composite operand or result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    Data,
    Frequency,
}

/// Pointwise product applied in the frequency domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Product {
    /// `a * b`
    Convolution,
    /// `a * conj(b)`
    Correlation,
}

/// Pre-planned forward and inverse 2-D FFT for one grid size.
pub struct FourierEngine<F: ShearletFloat> {
    rows: usize,
    cols: usize,
    fft_row: Arc<dyn Fft<F>>,
    fft_col: Arc<dyn Fft<F>>,
    ifft_row: Arc<dyn Fft<F>>,
    ifft_col: Arc<dyn Fft<F>>,
}

impl<F: ShearletFloat> std::fmt::Debug for FourierEngine<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FourierEngine")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .finish()
    }
}

impl<F: ShearletFloat> FourierEngine<F> {
    pub fn new(rows: usize, cols: usize) -> Self {
        assert!(rows > 0 && cols > 0, "cannot plan an empty transform");
        let mut planner = FftPlanner::new();
        Self {
            rows,
            cols,
            fft_row: planner.plan_fft_forward(cols),
            fft_col: planner.plan_fft_forward(rows),
            ifft_row: planner.plan_fft_inverse(cols),
            ifft_col: planner.plan_fft_inverse(rows),
        }
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn check<T: Element, B: Backend>(&self, m: &Matrix<'_, T, B>) {
        assert_eq!(
            m.dims(),
            (self.rows, self.cols),
            "operand does not match the engine size"
        );
    }

    fn transform_2d(
        &self,
        data: &mut [Complex<F>],
        row_plan: &Arc<dyn Fft<F>>,
        col_plan: &Arc<dyn Fft<F>>,
    ) {
        let (rows, cols) = (self.rows, self.cols);
        process_lines(data, row_plan, cols);

        let mut scratch = vec![Complex::zero(); rows * cols];
        transpose_slice(data, &mut scratch, rows, cols);
        process_lines(&mut scratch, col_plan, rows);
        transpose_slice(&scratch, data, cols, rows);
    }

    /// In-place unnormalized forward transform.
    pub fn fft<B: Backend>(&self, m: &mut Matrix<'_, Complex<F>, B>) {
        self.check(m);
        self.transform_2d(m.as_slice_mut(), &self.fft_row, &self.fft_col);
    }

    /// In-place inverse transform, divided by `rows * cols`.
    pub fn ifft<B: Backend>(&self, m: &mut Matrix<'_, Complex<F>, B>) {
        self.check(m);
        self.transform_2d(m.as_slice_mut(), &self.ifft_row, &self.ifft_col);
        m.normalize_size();
    }

    /// Move the zero frequency to `(rows/2, cols/2)`.
    pub fn fftshift<T: Element, B: Backend>(
        &self,
        input: &Matrix<'_, T, B>,
        out: &mut Matrix<'_, T, B>,
    ) {
        self.check(input);
        self.check(out);
        let (rows, cols) = (self.rows, self.cols);
        roll(input.as_slice(), out.as_slice_mut(), rows, cols, rows / 2, cols / 2);
    }

    /// Inverse of [`fftshift`](Self::fftshift), also for odd extents.
    pub fn ifftshift<T: Element, B: Backend>(
        &self,
        input: &Matrix<'_, T, B>,
        out: &mut Matrix<'_, T, B>,
    ) {
        self.check(input);
        self.check(out);
        let (rows, cols) = (self.rows, self.cols);
        let (dr, dc) = (rows - rows / 2, cols - cols / 2);
        roll(input.as_slice(), out.as_slice_mut(), rows, cols, dr, dc);
    }

    /// `fftshift(fft(ifftshift(input)))`
    pub fn fft_with_shifts<B: Backend>(
        &self,
        input: &Matrix<'_, Complex<F>, B>,
        out: &mut Matrix<'_, Complex<F>, B>,
    ) {
        let mut work = OwnedMatrix::<Complex<F>, B>::new(self.rows, self.cols);
        self.ifftshift(input, &mut work);
        self.fft(&mut work);
        self.fftshift(&work, out);
    }

    /// `fftshift(ifft(ifftshift(input)))`
    pub fn ifft_with_shifts<B: Backend>(
        &self,
        input: &Matrix<'_, Complex<F>, B>,
        out: &mut Matrix<'_, Complex<F>, B>,
    ) {
        let mut work = OwnedMatrix::<Complex<F>, B>::new(self.rows, self.cols);
        self.ifftshift(input, &mut work);
        self.ifft(&mut work);
        self.fftshift(&work, out);
    }

    /// Zero-pad a smaller kernel to the engine size, centered, then apply
    /// [`fft_with_shifts`](Self::fft_with_shifts).
    pub fn fft_with_shifts_padded<B: Backend>(
        &self,
        input: &Matrix<'_, Complex<F>, B>,
        out: &mut Matrix<'_, Complex<F>, B>,
    ) {
        let mut padded = OwnedMatrix::<Complex<F>, B>::new(self.rows, self.cols);
        pad_into(input, &mut padded);
        self.fft_with_shifts(&padded, out);
    }

    /// Frequency-domain product of two operands with explicit domain
    /// bookkeeping.
    #[allow(clippy::too_many_arguments)]
    pub fn combine<B: Backend>(
        &self,
        a: &Matrix<'_, Complex<F>, B>,
        a_domain: Domain,
        b: &Matrix<'_, Complex<F>, B>,
        b_domain: Domain,
        product: Product,
        out_domain: Domain,
        out: &mut Matrix<'_, Complex<F>, B>,
    ) {
        self.check(a);
        self.check(b);
        self.check(out);

        let a_spectrum = self.spectrum_of(a, a_domain);
        let b_spectrum = self.spectrum_of(b, b_domain);
        let a_data = a_spectrum.as_ref().map_or(a.as_slice(), |m| m.as_slice());
        let b_data = b_spectrum.as_ref().map_or(b.as_slice(), |m| m.as_slice());

        match out_domain {
            Domain::Frequency => {
                apply_product::<F, B>(product, a_data, b_data, out.as_slice_mut())
            }
            Domain::Data => {
                let mut spectrum = OwnedMatrix::<Complex<F>, B>::new(self.rows, self.cols);
                apply_product::<F, B>(product, a_data, b_data, spectrum.as_slice_mut());
                self.ifft_with_shifts(&spectrum, out);
            }
        }
    }

    fn spectrum_of<B: Backend>(
        &self,
        m: &Matrix<'_, Complex<F>, B>,
        domain: Domain,
    ) -> Option<OwnedMatrix<Complex<F>, B>> {
        match domain {
            Domain::Frequency => None,
            Domain::Data => {
                let mut spectrum = Matrix::new(self.rows, self.cols);
                self.fft_with_shifts(m, &mut spectrum);
                Some(spectrum)
            }
        }
    }

    pub fn corr_ff2f<B: Backend>(
        &self,
        a: &Matrix<'_, Complex<F>, B>,
        b: &Matrix<'_, Complex<F>, B>,
        out: &mut Matrix<'_, Complex<F>, B>,
    ) {
        self.combine(
            a,
            Domain::Frequency,
            b,
            Domain::Frequency,
            Product::Correlation,
            Domain::Frequency,
            out,
        );
    }

    pub fn corr_ff2d<B: Backend>(
        &self,
        a: &Matrix<'_, Complex<F>, B>,
        b: &Matrix<'_, Complex<F>, B>,
        out: &mut Matrix<'_, Complex<F>, B>,
    ) {
        self.combine(
            a,
            Domain::Frequency,
            b,
            Domain::Frequency,
            Product::Correlation,
            Domain::Data,
            out,
        );
    }

    pub fn corr_df2d<B: Backend>(
        &self,
        a: &Matrix<'_, Complex<F>, B>,
        b: &Matrix<'_, Complex<F>, B>,
        out: &mut Matrix<'_, Complex<F>, B>,
    ) {
        self.combine(
            a,
            Domain::Data,
            b,
            Domain::Frequency,
            Product::Correlation,
            Domain::Data,
            out,
        );
    }

    pub fn conv_ff2f<B: Backend>(
        &self,
        a: &Matrix<'_, Complex<F>, B>,
        b: &Matrix<'_, Complex<F>, B>,
        out: &mut Matrix<'_, Complex<F>, B>,
    ) {
        self.combine(
            a,
            Domain::Frequency,
            b,
            Domain::Frequency,
            Product::Convolution,
            Domain::Frequency,
            out,
        );
    }

    pub fn conv_ff2d<B: Backend>(
        &self,
        a: &Matrix<'_, Complex<F>, B>,
        b: &Matrix<'_, Complex<F>, B>,
        out: &mut Matrix<'_, Complex<F>, B>,
    ) {
        self.combine(
            a,
            Domain::Frequency,
            b,
            Domain::Frequency,
            Product::Convolution,
            Domain::Data,
            out,
        );
    }

    pub fn conv_df2f<B: Backend>(
        &self,
        a: &Matrix<'_, Complex<F>, B>,
        b: &Matrix<'_, Complex<F>, B>,
        out: &mut Matrix<'_, Complex<F>, B>,
    ) {
        self.combine(
            a,
            Domain::Data,
            b,
            Domain::Frequency,
            Product::Convolution,
            Domain::Frequency,
            out,
        );
    }

    pub fn conv_dd2f<B: Backend>(
        &self,
        a: &Matrix<'_, Complex<F>, B>,
        b: &Matrix<'_, Complex<F>, B>,
        out: &mut Matrix<'_, Complex<F>, B>,
    ) {
        self.combine(
            a,
            Domain::Data,
            b,
            Domain::Data,
            Product::Convolution,
            Domain::Frequency,
            out,
        );
    }

    pub fn conv_dd2d<B: Backend>(
        &self,
        a: &Matrix<'_, Complex<F>, B>,
        b: &Matrix<'_, Complex<F>, B>,
        out: &mut Matrix<'_, Complex<F>, B>,
    ) {
        self.combine(
            a,
            Domain::Data,
            b,
            Domain::Data,
            Product::Convolution,
            Domain::Data,
            out,
        );
    }
}

fn apply_product<F: ShearletFloat, B: Backend>(
    product: Product,
    a: &[Complex<F>],
    b: &[Complex<F>],
    out: &mut [Complex<F>],
) {
    match product {
        Product::Convolution => B::convolve_pointwise(a, b, out),
        Product::Correlation => B::correlate(a, b, out),
    }
}

/// Run `plan` over every contiguous line of length `len` in `data`.
fn process_lines<F: ShearletFloat>(data: &mut [Complex<F>], plan: &Arc<dyn Fft<F>>, len: usize) {
    let scratch_len = plan.get_inplace_scratch_len();
    data.par_chunks_mut(len).for_each_init(
        || vec![Complex::zero(); scratch_len],
        |scratch, line| plan.process_with_scratch(line, scratch),
    );
}

/// Circular shift: `dst[(i + dr) % rows][(j + dc) % cols] = src[i][j]`.
fn roll<T: Copy>(src: &[T], dst: &mut [T], rows: usize, cols: usize, dr: usize, dc: usize) {
    for (i, src_row) in src.chunks_exact(cols).enumerate() {
        let r = (i + dr) % rows;
        let dst_row = &mut dst[r * cols..(r + 1) * cols];
        dst_row.copy_from_slice(src_row);
        dst_row.rotate_right(dc % cols);
    }
}

/// Convenience for tests and benches: a unit impulse at the spectrum center.
pub fn centered_impulse<F: ShearletFloat, B: Backend>(
    rows: usize,
    cols: usize,
) -> OwnedMatrix<Complex<F>, B> {
    let mut m = Matrix::new(rows, cols);
    m[(rows / 2, cols / 2)] = Complex::<F>::from_real(F::one());
    m
}
