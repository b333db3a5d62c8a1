//! Scalar kinds for shearlet matrices.
//!
//! `ShearletFloat` is the real element type (f32 or f64) and drives FFT
//! planning; `Element` covers every value a matrix can hold, real or
//! complex, so elementwise kernels can be written once for both kinds.

use num_traits::{Float, FromPrimitive, NumAssign, Zero};
use rustfft::num_complex::Complex;
use rustfft::FftNum;
use std::fmt::Debug;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Div, DivAssign, Mul, MulAssign, Sub};

/// A matrix element: either a real float or a complex number over one.
pub trait Element:
    Copy
    + Debug
    + PartialEq
    + Send
    + Sync
    + Zero
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + AddAssign
    + MulAssign
    + DivAssign
    + 'static
{
    /// The underlying real type.
    type Real: ShearletFloat;

    /// Absolute value (modulus for complex elements).
    fn magnitude(self) -> Self::Real;

    /// Squared absolute value.
    fn magnitude_sqr(self) -> Self::Real;

    /// Multiply by a real factor.
    fn scale(self, factor: Self::Real) -> Self;

    /// Embed a real value.
    fn from_real(value: Self::Real) -> Self;
}

/// Floating point types supported by the shearlet transform.
///
/// Combines the float arithmetic bounds with `rustfft` compatibility and
/// makes every real type a matrix element of itself.
pub trait ShearletFloat:
    Float + FftNum + FromPrimitive + NumAssign + Sum + Debug + Element<Real = Self>
{
    /// Create a value from an f64 constant.
    fn from_f64_c(val: f64) -> Self;

    /// Create a value from a usize constant.
    fn usize_as(val: usize) -> Self;
}

macro_rules! impl_real_kind {
    ($t:ty) => {
        impl Element for $t {
            type Real = $t;

            #[inline]
            fn magnitude(self) -> $t {
                self.abs()
            }

            #[inline]
            fn magnitude_sqr(self) -> $t {
                self * self
            }

            #[inline]
            fn scale(self, factor: $t) -> $t {
                self * factor
            }

            #[inline]
            fn from_real(value: $t) -> $t {
                value
            }
        }

        impl ShearletFloat for $t {
            #[inline]
            fn from_f64_c(val: f64) -> Self {
                val as $t
            }

            #[inline]
            fn usize_as(val: usize) -> Self {
                val as $t
            }
        }
    };
}

impl_real_kind!(f32);
impl_real_kind!(f64);

impl<F: ShearletFloat> Element for Complex<F> {
    type Real = F;

    #[inline]
    fn magnitude(self) -> F {
        self.norm()
    }

    #[inline]
    fn magnitude_sqr(self) -> F {
        self.norm_sqr()
    }

    #[inline]
    fn scale(self, factor: F) -> Self {
        Complex::new(self.re * factor, self.im * factor)
    }

    #[inline]
    fn from_real(value: F) -> Self {
        Complex::new(value, F::zero())
    }
}
