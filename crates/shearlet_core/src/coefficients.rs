//! Ordered shearlet coefficient bands.

use std::ops::Index;

use num_traits::Zero;
use rustfft::num_complex::Complex;

use crate::backend::{Backend, Cpu};
use crate::error::{Result, ShearletError};
use crate::float_trait::ShearletFloat;
use crate::matrix::{Matrix, OwnedMatrix};

/// One complex band per shearlet, in the order of the system's index list.
#[derive(Debug, Clone)]
pub struct ShearletCoefficients<F: ShearletFloat, B: Backend = Cpu> {
    bands: Vec<OwnedMatrix<Complex<F>, B>>,
}

impl<F: ShearletFloat, B: Backend> Default for ShearletCoefficients<F, B> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: ShearletFloat, B: Backend> ShearletCoefficients<F, B> {
    pub fn new() -> Self {
        Self { bands: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bands: Vec::with_capacity(capacity),
        }
    }

    /// Append a deep copy of `band`.
    pub fn add_element(&mut self, band: &Matrix<'_, Complex<F>, B>) {
        self.bands.push(band.to_owned_matrix());
    }

    pub fn push(&mut self, band: OwnedMatrix<Complex<F>, B>) {
        self.bands.push(band);
    }

    pub fn element(&self, index: usize) -> Option<&OwnedMatrix<Complex<F>, B>> {
        self.bands.get(index)
    }

    pub fn element_mut(&mut self, index: usize) -> Option<&mut OwnedMatrix<Complex<F>, B>> {
        self.bands.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.bands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OwnedMatrix<Complex<F>, B>> {
        self.bands.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, OwnedMatrix<Complex<F>, B>> {
        self.bands.iter_mut()
    }

    /// Zero every coefficient whose magnitude is below its band's threshold.
    ///
    /// `thresholds` must hold exactly one value per band.
    pub fn apply_threshold(&mut self, thresholds: &[F]) -> Result<()> {
        if thresholds.len() != self.bands.len() {
            return Err(ShearletError::CoefficientCountMismatch {
                expected: self.bands.len(),
                actual: thresholds.len(),
            });
        }
        for (band, &threshold) in self.bands.iter_mut().zip(thresholds) {
            band.apply_threshold(threshold);
        }
        Ok(())
    }

    /// Zero an entire band.
    pub fn mute_shearlet(&mut self, index: usize) -> Result<()> {
        let len = self.bands.len();
        let band = self
            .bands
            .get_mut(index)
            .ok_or(ShearletError::IndexOutOfRange { index, len })?;
        band.fill(Complex::zero());
        Ok(())
    }
}

impl<F: ShearletFloat, B: Backend> Index<usize> for ShearletCoefficients<F, B> {
    type Output = OwnedMatrix<Complex<F>, B>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.bands[index]
    }
}

impl<'c, F: ShearletFloat, B: Backend> IntoIterator for &'c ShearletCoefficients<F, B> {
    type Item = &'c OwnedMatrix<Complex<F>, B>;
    type IntoIter = std::slice::Iter<'c, OwnedMatrix<Complex<F>, B>>;

    fn into_iter(self) -> Self::IntoIter {
        self.bands.iter()
    }
}

impl<F: ShearletFloat, B: Backend> FromIterator<OwnedMatrix<Complex<F>, B>>
    for ShearletCoefficients<F, B>
{
    fn from_iter<I: IntoIterator<Item = OwnedMatrix<Complex<F>, B>>>(iter: I) -> Self {
        Self {
            bands: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type C = Complex<f64>;

    fn band(value: C) -> OwnedMatrix<C> {
        OwnedMatrix::filled(3, 3, value)
    }

    #[test]
    fn test_add_element_deep_copies() {
        let mut source = band(C::new(1.0, 0.0));
        let mut coeffs = ShearletCoefficients::<f64>::new();
        coeffs.add_element(&source);
        source.fill(C::new(9.0, 0.0));

        assert_eq!(coeffs.len(), 1);
        assert_eq!(coeffs[0][(1, 1)], C::new(1.0, 0.0));
    }

    #[test]
    fn test_element_bounds() {
        let mut coeffs = ShearletCoefficients::<f64>::with_capacity(2);
        assert!(coeffs.is_empty());
        coeffs.push(band(C::new(1.0, 1.0)));
        assert!(coeffs.element(0).is_some());
        assert!(coeffs.element(1).is_none());
        assert!(coeffs.element_mut(3).is_none());
    }

    #[test]
    fn test_apply_threshold_per_band() {
        let mut coeffs: ShearletCoefficients<f64> =
            [band(C::new(0.3, 0.4)), band(C::new(0.3, 0.4))].into_iter().collect();
        coeffs.apply_threshold(&[0.6, 0.4]).unwrap();
        assert!(coeffs[0].as_slice().iter().all(|z| z.is_zero()));
        assert!(coeffs[1].as_slice().iter().all(|z| *z == C::new(0.3, 0.4)));
    }

    #[test]
    fn test_apply_threshold_count_mismatch() {
        let mut coeffs: ShearletCoefficients<f64> = [band(C::new(1.0, 0.0))].into_iter().collect();
        let err = coeffs.apply_threshold(&[0.1, 0.2]).unwrap_err();
        assert!(matches!(
            err,
            ShearletError::CoefficientCountMismatch {
                expected: 1,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_mute_is_idempotent_and_local() {
        let mut coeffs: ShearletCoefficients<f64> = (0..3)
            .map(|i| band(C::new(i as f64 + 1.0, 0.0)))
            .collect();
        coeffs.mute_shearlet(1).unwrap();
        coeffs.mute_shearlet(1).unwrap();
        assert!(coeffs[1].as_slice().iter().all(|z| z.is_zero()));
        assert_eq!(coeffs[0][(0, 0)], C::new(1.0, 0.0));
        assert_eq!(coeffs[2][(2, 2)], C::new(3.0, 0.0));

        assert!(matches!(
            coeffs.mute_shearlet(3),
            Err(ShearletError::IndexOutOfRange { index: 3, len: 3 })
        ));
    }

    #[test]
    fn test_threshold_and_mute_commute_on_disjoint_bands() {
        let make = || -> ShearletCoefficients<f64> {
            [band(C::new(0.1, 0.0)), band(C::new(2.0, 0.0))].into_iter().collect()
        };
        let mut a = make();
        a.apply_threshold(&[0.5, 0.0]).unwrap();
        a.mute_shearlet(1).unwrap();

        let mut b = make();
        b.mute_shearlet(1).unwrap();
        b.apply_threshold(&[0.5, 0.0]).unwrap();

        for (x, y) in a.iter().zip(&b) {
            assert_eq!(x, y);
        }
    }
}
