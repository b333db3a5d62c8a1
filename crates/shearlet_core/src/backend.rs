//! Execution backends.
//!
//! Every elementwise kernel the transform needs goes through [`Backend`], so
//! matrices and the shearlet system are generic over where the arithmetic
//! runs. [`Cpu`] is the host implementation; its kernels split work across
//! the rayon pool once a buffer is large enough to amortize the fork.

use ndarray::Axis;
use num_traits::{One, Zero};
use rayon::prelude::*;
use rustfft::num_complex::Complex;

use crate::float_trait::{Element, ShearletFloat};

/// Minimum number of elements handed to one rayon task.
const RAYON_MIN_CHUNK_LEN: usize = 4_096;

/// Capability set required from an execution backend.
///
/// All slices are contiguous row-major matrix buffers. Length preconditions
/// are asserted by the callers in [`crate::matrix`].
pub trait Backend: Send + Sync + 'static {
    /// Human readable backend name, used in log events.
    const NAME: &'static str;

    fn fill<T: Element>(data: &mut [T], value: T);

    fn copy<T: Element>(dst: &mut [T], src: &[T]);

    fn add_in_place<T: Element>(acc: &mut [T], other: &[T]);

    fn mul_in_place<T: Element>(acc: &mut [T], other: &[T]);

    fn scale_in_place<T: Element>(data: &mut [T], factor: T::Real);

    fn div_scalar_in_place<T: Element>(data: &mut [T], value: T);

    /// Divide every element by the sum of magnitudes.
    fn normalize<T: Element>(data: &mut [T]);

    /// Zero every element whose magnitude is below `|threshold|`.
    fn threshold<T: Element>(data: &mut [T], threshold: T::Real);

    /// `output[i] = (-1)^i * input[i]`.
    fn mirror<T: Element>(input: &[T], output: &mut [T]);

    /// Reverse the order of rows (`Axis(0)`) or of the columns inside each
    /// row (`Axis(1)`).
    fn flip<T: Element>(data: &mut [T], rows: usize, cols: usize, axis: Axis);

    /// Pointwise frequency-domain correlation `a * conj(b)`.
    fn correlate<F: ShearletFloat>(a: &[Complex<F>], b: &[Complex<F>], out: &mut [Complex<F>]);

    /// Pointwise frequency-domain convolution `a * b`.
    fn convolve_pointwise<F: ShearletFloat>(
        a: &[Complex<F>],
        b: &[Complex<F>],
        out: &mut [Complex<F>],
    );

    fn divide_by_real<F: ShearletFloat>(data: &mut [Complex<F>], divisor: &[F]);

    /// `acc[i] += |data[i]|^2`.
    fn accumulate_magnitude_sqr<F: ShearletFloat>(acc: &mut [F], data: &[Complex<F>]);
}

/// Host backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cpu;

impl Backend for Cpu {
    const NAME: &'static str = "cpu";

    fn fill<T: Element>(data: &mut [T], value: T) {
        data.par_iter_mut()
            .with_min_len(RAYON_MIN_CHUNK_LEN)
            .for_each(|x| *x = value);
    }

    fn copy<T: Element>(dst: &mut [T], src: &[T]) {
        dst.copy_from_slice(src);
    }

    fn add_in_place<T: Element>(acc: &mut [T], other: &[T]) {
        acc.par_iter_mut()
            .with_min_len(RAYON_MIN_CHUNK_LEN)
            .zip(other.par_iter())
            .for_each(|(a, &b)| *a += b);
    }

    fn mul_in_place<T: Element>(acc: &mut [T], other: &[T]) {
        acc.par_iter_mut()
            .with_min_len(RAYON_MIN_CHUNK_LEN)
            .zip(other.par_iter())
            .for_each(|(a, &b)| *a *= b);
    }

    fn scale_in_place<T: Element>(data: &mut [T], factor: T::Real) {
        data.par_iter_mut()
            .with_min_len(RAYON_MIN_CHUNK_LEN)
            .for_each(|x| *x = x.scale(factor));
    }

    fn div_scalar_in_place<T: Element>(data: &mut [T], value: T) {
        data.par_iter_mut()
            .with_min_len(RAYON_MIN_CHUNK_LEN)
            .for_each(|x| *x /= value);
    }

    fn normalize<T: Element>(data: &mut [T]) {
        let total = data
            .iter()
            .fold(T::Real::zero(), |acc, x| acc + x.magnitude());
        Self::scale_in_place(data, T::Real::one() / total);
    }

    fn threshold<T: Element>(data: &mut [T], threshold: T::Real) {
        let threshold = threshold.magnitude();
        data.par_iter_mut()
            .with_min_len(RAYON_MIN_CHUNK_LEN)
            .for_each(|x| {
                if x.magnitude() < threshold {
                    *x = T::zero();
                }
            });
    }

    fn mirror<T: Element>(input: &[T], output: &mut [T]) {
        for (i, (out, &x)) in output.iter_mut().zip(input.iter()).enumerate() {
            *out = if i % 2 == 0 { x } else { T::zero() - x };
        }
    }

    fn flip<T: Element>(data: &mut [T], rows: usize, cols: usize, axis: Axis) {
        assert!(axis.index() < 2, "flip axis must be 0 or 1");
        debug_assert_eq!(data.len(), rows * cols);
        if axis.index() == 0 {
            for i in 0..rows / 2 {
                let (head, tail) = data.split_at_mut((rows - 1 - i) * cols);
                head[i * cols..(i + 1) * cols].swap_with_slice(&mut tail[..cols]);
            }
        } else {
            data.par_chunks_mut(cols.max(1))
                .for_each(|row| row.reverse());
        }
    }

    fn correlate<F: ShearletFloat>(a: &[Complex<F>], b: &[Complex<F>], out: &mut [Complex<F>]) {
        out.par_iter_mut()
            .with_min_len(RAYON_MIN_CHUNK_LEN)
            .zip(a.par_iter().zip(b.par_iter()))
            .for_each(|(o, (&x, &y))| *o = x * y.conj());
    }

    fn convolve_pointwise<F: ShearletFloat>(
        a: &[Complex<F>],
        b: &[Complex<F>],
        out: &mut [Complex<F>],
    ) {
        out.par_iter_mut()
            .with_min_len(RAYON_MIN_CHUNK_LEN)
            .zip(a.par_iter().zip(b.par_iter()))
            .for_each(|(o, (&x, &y))| *o = x * y);
    }

    fn divide_by_real<F: ShearletFloat>(data: &mut [Complex<F>], divisor: &[F]) {
        data.par_iter_mut()
            .with_min_len(RAYON_MIN_CHUNK_LEN)
            .zip(divisor.par_iter())
            .for_each(|(x, &w)| *x = Complex::new(x.re / w, x.im / w));
    }

    fn accumulate_magnitude_sqr<F: ShearletFloat>(acc: &mut [F], data: &[Complex<F>]) {
        acc.par_iter_mut()
            .with_min_len(RAYON_MIN_CHUNK_LEN)
            .zip(data.par_iter())
            .for_each(|(a, z)| *a += z.norm_sqr());
    }
}
