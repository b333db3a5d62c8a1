//! Shearlet system: assembled shearlets, synthesis weights, decode and recover.

use std::time::Instant;

use rayon::prelude::*;
use rustfft::num_complex::Complex;
use tracing::{debug, info, trace};

use crate::backend::{Backend, Cpu};
use crate::coefficients::ShearletCoefficients;
use crate::config::{resolve_profile_timing, ShearletConfig};
use crate::error::{Result, ShearletError};
use crate::filter_bank::{build_filter_bundle, FilterBundle};
use crate::filters::PrototypeFilters;
use crate::float_trait::ShearletFloat;
use crate::fourier::FourierEngine;
use crate::index::{shearlet_indices, Cone, ShearLevels, ShearletIndex};
use crate::matrix::{Matrix, OwnedMatrix};
use crate::transform::{complex_to_real, real_to_complex, reduce_magnitude_sqr, transpose};

/// Discrete shearlet transform for one image size.
///
/// Construction builds every shearlet spectrum up front. Afterwards the
/// system is immutable, so `decode` and `recover` can run concurrently from
/// several threads on different images.
pub struct ShearletSystem<F: ShearletFloat, B: Backend = Cpu> {
    rows: usize,
    cols: usize,
    engine: FourierEngine<F>,
    levels: ShearLevels,
    wedge_levels: Vec<usize>,
    indices: Vec<ShearletIndex>,
    shearlets: Vec<OwnedMatrix<Complex<F>, B>>,
    weights: OwnedMatrix<F, B>,
    profile_timing: bool,
}

impl<F: ShearletFloat, B: Backend> std::fmt::Debug for ShearletSystem<F, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShearletSystem")
            .field("rows", &self.rows)
            .field("cols", &self.cols)
            .field("levels", &self.levels)
            .field("shearlets", &self.shearlets.len())
            .finish()
    }
}

impl<F: ShearletFloat, B: Backend> ShearletSystem<F, B> {
    /// System with the default prototypes and shear schedule.
    pub fn new(rows: usize, cols: usize, num_scales: usize) -> Result<Self> {
        Self::with_config(rows, cols, &ShearletConfig::with_scales(num_scales))
    }

    pub fn with_config(rows: usize, cols: usize, config: &ShearletConfig) -> Result<Self> {
        config.validate()?;
        if rows == 0 || cols == 0 {
            return Err(ShearletError::InvalidConfig(format!(
                "image size must be non-empty, got {rows}x{cols}"
            )));
        }
        let profile_timing = resolve_profile_timing();
        let started = profile_timing.then(Instant::now);

        let levels = match &config.shear_levels {
            Some(levels) => ShearLevels::from_levels(levels.clone())?,
            None => ShearLevels::for_scales(config.num_scales),
        };
        debug!(rows, cols, levels = ?levels.as_slice(), "shear level schedule");

        let prototypes = PrototypeFilters::<F, B>::from_config(config);
        let engine = FourierEngine::<F>::new(rows, cols);
        let transposed_engine = (rows != cols).then(|| FourierEngine::<F>::new(cols, rows));
        let horizontal = build_filter_bundle(&engine, &levels, &prototypes)?;
        debug!(rows, cols, "built horizontal cone filters");
        let vertical = match &transposed_engine {
            Some(transposed) => {
                let bundle = build_filter_bundle(transposed, &levels, &prototypes)?;
                debug!(rows = cols, cols = rows, "built vertical cone filters");
                Some(bundle)
            }
            None => None,
        };

        let indices = shearlet_indices(&levels);
        let shearlets = assemble(
            &engine,
            transposed_engine.as_ref().unwrap_or(&engine),
            &levels,
            &indices,
            &horizontal,
            vertical.as_ref().unwrap_or(&horizontal),
        )?;
        let weights = reduce_magnitude_sqr(&shearlets);
        debug!(count = shearlets.len(), "assembled shearlets");

        if let Some(t) = started {
            info!(
                rows,
                cols,
                num_scales = levels.len(),
                elapsed_ms = t.elapsed().as_secs_f64() * 1e3,
                "shearlet system constructed"
            );
        }

        Ok(Self {
            rows,
            cols,
            engine,
            wedge_levels: horizontal.levels.clone(),
            levels,
            indices,
            shearlets,
            weights,
            profile_timing,
        })
    }

    fn check_dims(&self, actual: (usize, usize)) -> Result<()> {
        if actual != (self.rows, self.cols) {
            return Err(ShearletError::DimensionMismatch {
                expected: (self.rows, self.cols),
                actual,
            });
        }
        Ok(())
    }

    /// Analysis: one complex coefficient band per shearlet.
    pub fn decode(&self, image: &Matrix<'_, F, B>) -> Result<ShearletCoefficients<F, B>> {
        self.check_dims(image.dims())?;
        let started = self.profile_timing.then(Instant::now);
        trace!(rows = self.rows, cols = self.cols, "decode");

        let mut spectrum = Matrix::new(self.rows, self.cols);
        self.engine.fft_with_shifts(&real_to_complex(image), &mut spectrum);

        let coeffs: ShearletCoefficients<F, B> = self
            .shearlets
            .par_iter()
            .map(|shearlet| {
                let mut band = Matrix::new(self.rows, self.cols);
                self.engine.corr_ff2d(&spectrum, shearlet, &mut band);
                band
            })
            .collect::<Vec<_>>()
            .into_iter()
            .collect();

        if let Some(t) = started {
            info!(
                bands = coeffs.len(),
                elapsed_ms = t.elapsed().as_secs_f64() * 1e3,
                "decode finished"
            );
        }
        Ok(coeffs)
    }

    /// Synthesis with dual-frame weighting.
    pub fn recover(&self, coeffs: &ShearletCoefficients<F, B>) -> Result<OwnedMatrix<F, B>> {
        if coeffs.len() != self.shearlets.len() {
            return Err(ShearletError::CoefficientCountMismatch {
                expected: self.shearlets.len(),
                actual: coeffs.len(),
            });
        }
        for band in coeffs {
            self.check_dims(band.dims())?;
        }
        let started = self.profile_timing.then(Instant::now);
        trace!(rows = self.rows, cols = self.cols, "recover");

        let (rows, cols) = (self.rows, self.cols);
        let mut accumulated = self
            .shearlets
            .par_iter()
            .zip(coeffs.iter().collect::<Vec<_>>())
            .fold(
                || {
                    (
                        OwnedMatrix::<Complex<F>, B>::new(rows, cols),
                        OwnedMatrix::<Complex<F>, B>::new(rows, cols),
                    )
                },
                |(mut acc, mut product), (shearlet, band)| {
                    self.engine.conv_df2f(band, shearlet, &mut product);
                    acc += &product;
                    (acc, product)
                },
            )
            .map(|(acc, _)| acc)
            .reduce(
                || OwnedMatrix::<Complex<F>, B>::new(rows, cols),
                |mut a, b| {
                    a += &b;
                    a
                },
            );

        B::divide_by_real(accumulated.as_slice_mut(), self.weights.as_slice());
        let mut image = Matrix::new(rows, cols);
        self.engine.ifft_with_shifts(&accumulated, &mut image);
        let recovered = complex_to_real(&image);

        if let Some(t) = started {
            info!(
                elapsed_ms = t.elapsed().as_secs_f64() * 1e3,
                "recover finished"
            );
        }
        Ok(recovered)
    }

    pub fn dims(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Number of shearlets, lowpass included.
    pub fn len(&self) -> usize {
        self.shearlets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shearlets.is_empty()
    }

    pub fn shear_levels(&self) -> &ShearLevels {
        &self.levels
    }

    pub fn indices(&self) -> &[ShearletIndex] {
        &self.indices
    }

    /// Frequency-domain shearlets, DC-centered, in index order.
    pub fn shearlets(&self) -> &[OwnedMatrix<Complex<F>, B>] {
        &self.shearlets
    }

    /// `Σ_k |ψ_k|²`, the synthesis normalization.
    pub fn weights(&self) -> &OwnedMatrix<F, B> {
        &self.weights
    }

    /// Slot of the wedge filters built for `level`, if any scale uses it.
    pub fn wedge_index(&self, level: usize) -> Option<usize> {
        self.wedge_levels.iter().position(|&l| l == level)
    }
}

/// Correlate wedge and band-pass spectra for every index. Vertical-cone
/// shearlets are built on the transposed grid and transposed back.
/// `transposed_engine` runs on the `(cols, rows)` grid of the vertical cone.
fn assemble<F: ShearletFloat, B: Backend>(
    engine: &FourierEngine<F>,
    transposed_engine: &FourierEngine<F>,
    levels: &ShearLevels,
    indices: &[ShearletIndex],
    horizontal: &FilterBundle<F, B>,
    vertical: &FilterBundle<F, B>,
) -> Result<Vec<OwnedMatrix<Complex<F>, B>>> {
    let (rows, cols) = engine.dims();
    indices
        .iter()
        .map(|index| {
            if index.cone == Cone::Lowpass {
                return Ok(horizontal.lowpass.clone());
            }
            let level = levels.level(index.scale);
            let span = 1isize << level;
            let (bundle, direction) = match index.cone {
                Cone::Vertical => (vertical, span + index.shearing),
                _ => (horizontal, span - index.shearing),
            };
            let slot = bundle.wedge_index(level).ok_or_else(|| {
                ShearletError::InvalidConfig(format!("no wedge filters for shear level {level}"))
            })?;
            let wedge = &bundle.wedge[slot][direction as usize];
            let bandpass = &bundle.bandpass[index.scale];

            if index.cone == Cone::Vertical {
                let mut shearlet = Matrix::new(cols, rows);
                transposed_engine.corr_ff2f(wedge, bandpass, &mut shearlet);
                Ok(transpose(&shearlet))
            } else {
                let mut shearlet = Matrix::new(rows, cols);
                engine.corr_ff2f(wedge, bandpass, &mut shearlet);
                Ok(shearlet)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::PrototypeFilter;
    use crate::test_utils::{random_matrix_f32, random_matrix_f64};
    use crate::transform::norm_l2;

    fn relative_error_f64(a: &OwnedMatrix<f64>, b: &OwnedMatrix<f64>) -> f64 {
        let diff: f64 = a
            .as_slice()
            .iter()
            .zip(b.as_slice())
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f64>()
            .sqrt();
        diff / norm_l2(a)
    }

    fn min_weight(system: &ShearletSystem<f64>) -> f64 {
        system
            .weights()
            .as_slice()
            .iter()
            .copied()
            .fold(f64::INFINITY, f64::min)
    }

    #[test]
    fn test_single_scale_96_has_eleven_shearlets() {
        let system = ShearletSystem::<f64>::new(96, 96, 1).unwrap();
        assert_eq!(system.len(), 11);
        assert_eq!(system.shearlets().len(), 11);
        assert_eq!(system.indices().len(), 11);
        assert_eq!(system.weights().dims(), (96, 96));
        assert_eq!(system.shear_levels().as_slice(), &[1]);
        assert_eq!(system.wedge_index(1), Some(0));
        assert_eq!(system.indices()[10].cone, Cone::Lowpass);
        assert!(system.shearlets().iter().all(|s| s.dims() == (96, 96)));
    }

    #[test]
    fn test_weights_match_shearlet_energy() {
        let system = ShearletSystem::<f64>::new(96, 96, 1).unwrap();
        for &(i, j) in &[(0, 0), (48, 48), (10, 70)] {
            let energy: f64 = system.shearlets().iter().map(|s| s[(i, j)].norm_sqr()).sum();
            assert!((system.weights()[(i, j)] - energy).abs() < 1e-12);
        }
    }

    #[test]
    fn test_weights_are_positive() {
        for (rows, cols, scales) in [(96, 96, 1), (96, 104, 1), (96, 96, 2)] {
            let system = ShearletSystem::<f64>::new(rows, cols, scales).unwrap();
            let min = min_weight(&system);
            assert!(min > 1e-3, "{rows}x{cols}/{scales}: min weight {min}");
        }
    }

    #[test]
    fn test_roundtrip_f64_square() {
        let system = ShearletSystem::<f64>::new(96, 96, 1).unwrap();
        let image = random_matrix_f64(96, 96, 2024);
        let coeffs = system.decode(&image).unwrap();
        assert_eq!(coeffs.len(), 11);
        let recovered = system.recover(&coeffs).unwrap();
        assert!(relative_error_f64(&image, &recovered) < 1e-9);
    }

    #[test]
    fn test_roundtrip_f64_odd_non_square() {
        let system = ShearletSystem::<f64>::new(97, 91, 1).unwrap();
        let image = random_matrix_f64(97, 91, 7);
        let recovered = system.recover(&system.decode(&image).unwrap()).unwrap();
        assert_eq!(recovered.dims(), (97, 91));
        assert!(relative_error_f64(&image, &recovered) < 1e-9);
    }

    #[test]
    fn test_roundtrip_two_scales() {
        let system = ShearletSystem::<f64>::new(96, 96, 2).unwrap();
        assert_eq!(system.len(), 21);
        let image = random_matrix_f64(96, 96, 99);
        let coeffs = system.decode(&image).unwrap();
        assert_eq!(coeffs.len(), 21);
        let recovered = system.recover(&coeffs).unwrap();
        assert!(relative_error_f64(&image, &recovered) < 1e-9);
    }

    #[test]
    fn test_roundtrip_f32() {
        let system = ShearletSystem::<f32>::new(96, 100, 1).unwrap();
        let image = random_matrix_f32(96, 100, 5);
        let recovered = system.recover(&system.decode(&image).unwrap()).unwrap();
        let diff: f32 = image
            .as_slice()
            .iter()
            .zip(recovered.as_slice())
            .map(|(x, y)| (x - y) * (x - y))
            .sum::<f32>()
            .sqrt();
        assert!(diff / norm_l2(&image) < 1e-4);
    }

    #[test]
    fn test_roundtrip_with_directional2_prototype() {
        let config = ShearletConfig {
            directional_filter: PrototypeFilter::Directional2,
            ..ShearletConfig::default()
        };
        let system = ShearletSystem::<f64>::with_config(64, 64, &config).unwrap();
        assert!(min_weight(&system) > 1e-3);
        let image = random_matrix_f64(64, 64, 31);
        let recovered = system.recover(&system.decode(&image).unwrap()).unwrap();
        assert!(relative_error_f64(&image, &recovered) < 1e-9);
    }

    #[test]
    fn test_zero_thresholds_keep_roundtrip() {
        let system = ShearletSystem::<f64>::new(96, 96, 1).unwrap();
        let image = random_matrix_f64(96, 96, 3);
        let mut coeffs = system.decode(&image).unwrap();
        coeffs.apply_threshold(&vec![0.0; system.len()]).unwrap();
        let recovered = system.recover(&coeffs).unwrap();
        assert!(relative_error_f64(&image, &recovered) < 1e-9);
    }

    #[test]
    fn test_constant_image_lives_in_lowpass() {
        let system = ShearletSystem::<f64>::new(96, 96, 1).unwrap();
        let image = OwnedMatrix::<f64>::filled(96, 96, 1.0);
        let coeffs = system.decode(&image).unwrap();
        let lowpass_energy = norm_l2(&coeffs[10]);
        let directional_energy: f64 = coeffs.iter().take(10).map(|band| norm_l2(band)).sum();
        assert!(directional_energy < 1e-6 * lowpass_energy);
    }

    #[test]
    fn test_decode_rejects_wrong_size() {
        let system = ShearletSystem::<f64>::new(96, 96, 1).unwrap();
        let image = OwnedMatrix::<f64>::new(96, 95);
        assert!(matches!(
            system.decode(&image),
            Err(ShearletError::DimensionMismatch {
                expected: (96, 96),
                actual: (96, 95)
            })
        ));
    }

    #[test]
    fn test_recover_rejects_bad_coefficients() {
        let system = ShearletSystem::<f64>::new(96, 96, 1).unwrap();
        let image = random_matrix_f64(96, 96, 1);
        let coeffs = system.decode(&image).unwrap();

        let truncated: ShearletCoefficients<f64> = coeffs.iter().take(10).cloned().collect();
        assert!(matches!(
            system.recover(&truncated),
            Err(ShearletError::CoefficientCountMismatch {
                expected: 11,
                actual: 10
            })
        ));

        let mut resized = coeffs.clone();
        *resized.element_mut(3).unwrap() = OwnedMatrix::new(96, 97);
        assert!(matches!(
            system.recover(&resized),
            Err(ShearletError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_construction_errors() {
        assert!(matches!(
            ShearletSystem::<f64>::new(96, 96, 0),
            Err(ShearletError::InvalidConfig(_))
        ));
        assert!(matches!(
            ShearletSystem::<f64>::new(64, 64, 1),
            Err(ShearletError::FilterDoesNotFit { .. })
        ));
        // The vertical cone is built on the transposed grid.
        assert!(matches!(
            ShearletSystem::<f64>::new(96, 64, 1),
            Err(ShearletError::FilterDoesNotFit { .. })
        ));
    }

    #[test]
    fn test_too_many_scales_fail_before_building_filters() {
        let started = Instant::now();
        let err = ShearletSystem::<f64>::new(96, 96, 40).unwrap_err();
        assert!(started.elapsed().as_secs_f64() < 2.0);
        assert!(matches!(
            err,
            ShearletError::FilterDoesNotFit {
                target: (96, 96),
                ..
            }
        ));

        let config = ShearletConfig {
            num_scales: 1,
            shear_levels: Some(vec![40]),
            ..ShearletConfig::default()
        };
        let started = Instant::now();
        let err = ShearletSystem::<f64>::with_config(96, 96, &config).unwrap_err();
        assert!(started.elapsed().as_secs_f64() < 2.0);
        assert!(matches!(err, ShearletError::FilterDoesNotFit { .. }));
    }

    #[test]
    fn test_vertical_cone_is_transposed_horizontal_cone() {
        let system = ShearletSystem::<f64>::new(96, 96, 1).unwrap();
        let indices = system.indices();
        let mut pairs = 0;
        for (h, index) in indices.iter().enumerate() {
            if index.cone != Cone::Horizontal {
                continue;
            }
            let v = indices
                .iter()
                .position(|other| {
                    other.cone == Cone::Vertical
                        && other.scale == index.scale
                        && other.shearing == -index.shearing
                })
                .unwrap();
            let transposed = transpose(&system.shearlets()[h]);
            let diff = transposed
                .as_slice()
                .iter()
                .zip(system.shearlets()[v].as_slice())
                .map(|(a, b)| (a - b).norm())
                .fold(0.0, f64::max);
            assert!(diff < 1e-12, "shearing {}: {diff}", index.shearing);
            pairs += 1;
        }
        assert_eq!(pairs, 5);
    }

    #[test]
    fn test_decode_from_borrowed_buffer() {
        let system = ShearletSystem::<f64>::new(96, 96, 1).unwrap();
        let image = random_matrix_f64(96, 96, 12);
        let mut buffer = image.as_slice().to_vec();
        let borrowed = Matrix::<f64>::from_slice_mut(96, 96, &mut buffer).unwrap();
        let from_owned = system.decode(&image).unwrap();
        let from_borrowed = system.decode(&borrowed).unwrap();
        for (a, b) in from_owned.iter().zip(&from_borrowed) {
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_concurrent_decode_is_consistent() {
        let system = ShearletSystem::<f64>::new(96, 96, 1).unwrap();
        let images: Vec<_> = (0..3).map(|s| random_matrix_f64(96, 96, 100 + s)).collect();
        let errors: Vec<f64> = std::thread::scope(|scope| {
            let handles: Vec<_> = images
                .iter()
                .map(|image| {
                    let system = &system;
                    scope.spawn(move || {
                        let coeffs = system.decode(image).unwrap();
                        relative_error_f64(image, &system.recover(&coeffs).unwrap())
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert!(errors.iter().all(|&e| e < 1e-9));
    }
}
