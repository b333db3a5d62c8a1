//! Prototype filters the filter bank is built from.

use crate::backend::Backend;
use crate::config::ShearletConfig;
use crate::float_trait::ShearletFloat;
use crate::matrix::{Matrix, OwnedMatrix};

/// Built-in prototype filter tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrototypeFilter {
    /// Symmetric 9-tap low-pass (1x9).
    Scaling,
    /// Coiflet low-pass (1x6).
    Coiflet,
    /// Fan filter (17x17).
    Directional1,
    /// Fan filter (9x9).
    Directional2,
    /// Fan filter (3x6).
    Directional3,
}

impl PrototypeFilter {
    pub fn dims(self) -> (usize, usize) {
        match self {
            Self::Scaling => (1, SCALING.len()),
            Self::Coiflet => (1, COIFLET.len()),
            Self::Directional1 => (DIRECTIONAL1.len(), DIRECTIONAL1[0].len()),
            Self::Directional2 => (DIRECTIONAL2.len(), DIRECTIONAL2[0].len()),
            Self::Directional3 => (DIRECTIONAL3.len(), DIRECTIONAL3[0].len()),
        }
    }

    /// Materialize the table as a real matrix.
    pub fn generate<F: ShearletFloat, B: Backend>(self) -> OwnedMatrix<F, B> {
        let values: Vec<F> = match self {
            Self::Scaling => SCALING.iter().map(|&v| F::from_f64_c(v)).collect(),
            Self::Coiflet => COIFLET.iter().map(|&v| F::from_f64_c(v)).collect(),
            Self::Directional1 => flatten(&DIRECTIONAL1),
            Self::Directional2 => flatten(&DIRECTIONAL2),
            Self::Directional3 => flatten(&DIRECTIONAL3),
        };
        let (rows, cols) = self.dims();
        let mut out = Matrix::new(rows, cols);
        B::copy(out.as_slice_mut(), &values);
        out
    }
}

fn flatten<F: ShearletFloat, const N: usize>(table: &[[f64; N]]) -> Vec<F> {
    table
        .iter()
        .flat_map(|row| row.iter().map(|&v| F::from_f64_c(v)))
        .collect()
}

/// Quadrature mirror of a low-pass filter, as a row:
/// `wavelet[i] = (-1)^i * filter[n - 1 - i]`.
pub fn mirror<F: ShearletFloat, B: Backend>(filter: &Matrix<'_, F, B>) -> OwnedMatrix<F, B> {
    let reversed: Vec<F> = filter.as_slice().iter().rev().copied().collect();
    let mut out = Matrix::new(1, reversed.len());
    B::mirror(&reversed, out.as_slice_mut());
    out
}

/// The four 1-D/2-D prototypes consumed by the filter-bank builder.
#[derive(Debug, Clone)]
pub struct PrototypeFilters<F: ShearletFloat, B: Backend> {
    /// Low-pass for the pyramid cascade.
    pub scaling: OwnedMatrix<F, B>,
    /// High-pass for the pyramid cascade.
    pub wavelet: OwnedMatrix<F, B>,
    /// Directional prototype with unit L1 mass.
    pub directional: OwnedMatrix<F, B>,
    /// Low-pass for the directional cascade.
    pub scaling2: OwnedMatrix<F, B>,
}

impl<F: ShearletFloat, B: Backend> PrototypeFilters<F, B> {
    pub fn from_config(config: &ShearletConfig) -> Self {
        let scaling = config.scaling_filter.generate::<F, B>();
        let wavelet = mirror(&scaling);
        let mut directional = config.directional_filter.generate::<F, B>();
        directional.normalize();
        let scaling2 = scaling.clone();
        Self {
            scaling,
            wavelet,
            directional,
            scaling2,
        }
    }
}

/// Symmetric 9-tap low-pass prototype.
const SCALING: [f64; 9] = [
    0.0104933261758410,
    -0.0263483047033631,
    -0.0517766952966370,
    0.276348304703363,
    0.582566738241592,
    0.276348304703363,
    -0.0517766952966369,
    -0.0263483047033631,
    0.0104933261758408,
];

/// 6-tap Coiflet low-pass prototype.
const COIFLET: [f64; 6] = [
    3.8580778e-02,
    -1.2696913e-01,
    -7.7161555e-02,
    6.0749164e-01,
    7.4568756e-01,
    2.2658427e-01,
];

/// 17x17 fan filter, symmetric in both axes.
#[rustfmt::skip]
const DIRECTIONAL1: [[f64; 17]; 17] = [
    [
        0.0, 0.0, -3.0861315e-07, 0.0, -3.7033578e-07, 0.0,
        -4.8143652e-07, 0.0, -8.3942778e-07, 0.0, -4.8143652e-07, 0.0,
        -3.7033578e-07, 0.0, -3.0861315e-07, 0.0, 0.0,
    ],
    [
        0.0, 6.1722631e-07, 0.0, -6.0488178e-06, 0.0, -7.6782952e-06,
        0.0, -1.2171703e-05, 0.0, -1.2171703e-05, 0.0, -7.6782952e-06,
        0.0, -6.0488178e-06, 0.0, 6.1722631e-07, 0.0,
    ],
    [
        -3.0861315e-07, 0.0, 1.2838307e-05, 0.0, -5.9401860e-05, 0.0,
        -8.7893026e-05, 0.0, -1.0969346e-04, 0.0, -8.7893026e-05, 0.0,
        -5.9401860e-05, 0.0, 1.2838307e-05, 0.0, -3.0861315e-07,
    ],
    [
        0.0, -6.0488178e-06, 0.0, 1.3512318e-04, 0.0, -4.3544081e-04,
        0.0, -5.7848918e-04, 0.0, -5.7848918e-04, 0.0, -4.3544081e-04,
        0.0, 1.3512318e-04, 0.0, -6.0488178e-06, 0.0,
    ],
    [
        -3.7033578e-07, 0.0, -5.9401860e-05, 0.0, 1.0726899e-03, 6.1035156e-04,
        -1.9615452e-03, 3.6621094e-04, -2.2362850e-03, 3.6621094e-04, -1.9615452e-03, 6.1035156e-04,
        1.0726899e-03, 0.0, -5.9401860e-05, 0.0, -3.7033578e-07,
    ],
    [
        0.0, -7.6782952e-06, 0.0, -4.3544081e-04, -6.1035156e-04, 5.3247620e-03,
        6.3476562e-03, -5.3114299e-03, 4.1503906e-03, -5.3114299e-03, 6.3476562e-03, 5.3247620e-03,
        -6.1035156e-04, -4.3544081e-04, 0.0, -7.6782952e-06, 0.0,
    ],
    [
        -4.8143652e-07, 0.0, -8.7893026e-05, 0.0, -1.9615452e-03, -6.3476562e-03,
        1.6444291e-02, 3.3691406e-02, -8.7910061e-03, 3.3691406e-02, 1.6444291e-02, -6.3476562e-03,
        -1.9615452e-03, 0.0, -8.7893026e-05, 0.0, -4.8143652e-07,
    ],
    [
        0.0, -1.2171703e-05, 0.0, -5.7848918e-04, -3.6621094e-04, -5.3114299e-03,
        -3.3691406e-02, 3.3130363e-02, 1.7749023e-01, 3.3130363e-02, -3.3691406e-02, -5.3114299e-03,
        -3.6621094e-04, -5.7848918e-04, 0.0, -1.2171703e-05, 0.0,
    ],
    [
        -8.3942778e-07, 0.0, -1.0969346e-04, 0.0, -2.2362850e-03, -4.1503906e-03,
        -8.7910061e-03, -1.7749023e-01, 5.9486541e-01, -1.7749023e-01, -8.7910061e-03,
        -4.1503906e-03, -2.2362850e-03, 0.0, -1.0969346e-04, 0.0, -8.3942778e-07,
    ],
    [
        0.0, -1.2171703e-05, 0.0, -5.7848918e-04, -3.6621094e-04, -5.3114299e-03,
        -3.3691406e-02, 3.3130363e-02, 1.7749023e-01, 3.3130363e-02, -3.3691406e-02, -5.3114299e-03,
        -3.6621094e-04, -5.7848918e-04, 0.0, -1.2171703e-05, 0.0,
    ],
    [
        -4.8143652e-07, 0.0, -8.7893026e-05, 0.0, -1.9615452e-03, -6.3476562e-03,
        1.6444291e-02, 3.3691406e-02, -8.7910061e-03, 3.3691406e-02, 1.6444291e-02, -6.3476562e-03,
        -1.9615452e-03, 0.0, -8.7893026e-05, 0.0, -4.8143652e-07,
    ],
    [
        0.0, -7.6782952e-06, 0.0, -4.3544081e-04, -6.1035156e-04, 5.3247620e-03,
        6.3476562e-03, -5.3114299e-03, 4.1503906e-03, -5.3114299e-03, 6.3476562e-03, 5.3247620e-03,
        -6.1035156e-04, -4.3544081e-04, 0.0, -7.6782952e-06, 0.0,
    ],
    [
        -3.7033578e-07, 0.0, -5.9401860e-05, 0.0, 1.0726899e-03, 6.1035156e-04,
        -1.9615452e-03, 3.6621094e-04, -2.2362850e-03, 3.6621094e-04, -1.9615452e-03, 6.1035156e-04,
        1.0726899e-03, 0.0, -5.9401860e-05, 0.0, -3.7033578e-07,
    ],
    [
        0.0, -6.0488178e-06, 0.0, 1.3512318e-04, 0.0, -4.3544081e-04,
        0.0, -5.7848918e-04, 0.0, -5.7848918e-04, 0.0, -4.3544081e-04,
        0.0, 1.3512318e-04, 0.0, -6.0488178e-06, 0.0,
    ],
    [
        -3.0861315e-07, 0.0, 1.2838307e-05, 0.0, -5.9401860e-05, 0.0,
        -8.7893026e-05, 0.0, -1.0969346e-04, 0.0, -8.7893026e-05, 0.0,
        -5.9401860e-05, 0.0, 1.2838307e-05, 0.0, -3.0861315e-07,
    ],
    [
        0.0, 6.1722631e-07, 0.0, -6.0488178e-06, 0.0, -7.6782952e-06,
        0.0, -1.2171703e-05, 0.0, -1.2171703e-05, 0.0, -7.6782952e-06,
        0.0, -6.0488178e-06, 0.0, 6.1722631e-07, 0.0,
    ],
    [
        0.0, 0.0, -3.0861315e-07, 0.0, -3.7033578e-07, 0.0,
        -4.8143652e-07, 0.0, -8.3942778e-07, 0.0, -4.8143652e-07, 0.0,
        -3.7033578e-07, 0.0, -3.0861315e-07, 0.0, 0.0,
    ],
];

/// 9x9 fan filter.
#[rustfmt::skip]
const DIRECTIONAL2: [[f64; 9]; 9] = [
    [
        0.0, 0.0, 0.0, 0.0, 1.6717973e-03, 0.0,
        0.0, 0.0, 0.0,
    ],
    [
        0.0, 0.0, 0.0, -6.6871894e-03, -2.1080148e-03, -6.6871894e-03,
        0.0, 0.0, 0.0,
    ],
    [
        0.0, 0.0, 1.0030784e-02, 6.3240444e-03, -1.9555817e-02, 6.3240444e-03,
        1.0030784e-02, 0.0, 0.0,
    ],
    [
        0.0, -6.6871894e-03, -6.3240444e-03, 5.2486012e-02, 1.3975610e-01, 5.2486012e-02,
        -6.3240444e-03, -6.6871894e-03, 0.0,
    ],
    [
        1.6717973e-03, 2.1080148e-03, -1.9555817e-02, -1.3975610e-01, 6.8785947e-01, -1.3975610e-01,
        -1.9555817e-02, 2.1080148e-03, 1.6717973e-03,
    ],
    [
        0.0, -6.6871894e-03, -6.3240444e-03, 5.2486012e-02, 1.3975610e-01, 5.2486012e-02,
        -6.3240444e-03, -6.6871894e-03, 0.0,
    ],
    [
        0.0, 0.0, 1.0030784e-02, 6.3240444e-03, -1.9555817e-02, 6.3240444e-03,
        1.0030784e-02, 0.0, 0.0,
    ],
    [
        0.0, 0.0, 0.0, -6.6871894e-03, -2.1080148e-03, -6.6871894e-03,
        0.0, 0.0, 0.0,
    ],
    [
        0.0, 0.0, 0.0, 0.0, 1.6717973e-03, 0.0,
        0.0, 0.0, 0.0,
    ],
];

/// 3x6 fan filter.
#[rustfmt::skip]
const DIRECTIONAL3: [[f64; 6]; 3] = [
    [-6.0515365e-02, 0.0, 1.2103073e-01, 0.0, -6.0515365e-02, 0.0],
    [4.6875000e-02, 7.8125000e-02, -4.6875000e-01, 4.6875000e-01, -7.8125000e-02, -4.6875000e-02],
    [0.0, -6.0515365e-02, 0.0, 1.2103073e-01, 0.0, -6.0515365e-02],
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Cpu;

    #[test]
    fn test_generated_dims_match_tables() {
        for filter in [
            PrototypeFilter::Scaling,
            PrototypeFilter::Coiflet,
            PrototypeFilter::Directional1,
            PrototypeFilter::Directional2,
            PrototypeFilter::Directional3,
        ] {
            let m = filter.generate::<f64, Cpu>();
            assert_eq!(m.dims(), filter.dims(), "{filter:?}");
        }
        assert_eq!(PrototypeFilter::Directional1.dims(), (17, 17));
        assert_eq!(PrototypeFilter::Directional3.dims(), (3, 6));
    }

    #[test]
    fn test_scaling_is_lowpass() {
        let m = PrototypeFilter::Scaling.generate::<f64, Cpu>();
        let dc: f64 = m.as_slice().iter().sum();
        assert!((dc - 1.0).abs() < 1e-12);

        let nyquist: f64 = mirror(&m).as_slice().iter().sum();
        assert!(nyquist.abs() < 1e-12);
    }

    #[test]
    fn test_coiflet_sums_to_sqrt2() {
        let m = PrototypeFilter::Coiflet.generate::<f32, Cpu>();
        let sum: f32 = m.as_slice().iter().sum();
        assert!((sum - std::f32::consts::SQRT_2).abs() < 1e-5);
    }

    #[test]
    fn test_directional_tables_are_symmetric() {
        for filter in [PrototypeFilter::Directional1, PrototypeFilter::Directional2] {
            let m = filter.generate::<f64, Cpu>();
            let (rows, cols) = m.dims();
            for i in 0..rows {
                for j in 0..cols {
                    assert_eq!(m[(i, j)], m[(rows - 1 - i, j)], "{filter:?} ({i}, {j})");
                    assert_eq!(m[(i, j)], m[(i, cols - 1 - j)], "{filter:?} ({i}, {j})");
                }
            }
        }
    }

    #[test]
    fn test_directional1_mass() {
        let m = PrototypeFilter::Directional1.generate::<f64, Cpu>();
        let sum: f64 = m.as_slice().iter().sum();
        assert!((sum - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-6);
    }

    #[test]
    fn test_mirror_reverses_and_alternates_sign() {
        let m = OwnedMatrix::<f64>::from_shape_vec(1, 4, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let w = mirror(&m);
        assert_eq!(w.dims(), (1, 4));
        assert_eq!(w.as_slice(), &[4.0, -3.0, 2.0, -1.0]);
    }

    #[test]
    fn test_coiflet_wavelet_is_time_reversed() {
        let config = ShearletConfig {
            scaling_filter: PrototypeFilter::Coiflet,
            ..ShearletConfig::default()
        };
        let set = PrototypeFilters::<f64, Cpu>::from_config(&config);
        let expected = [
            2.2658427e-01,
            -7.4568756e-01,
            6.0749164e-01,
            7.7161555e-02,
            -1.2696913e-01,
            -3.8580778e-02,
        ];
        assert_eq!(set.wavelet.dims(), (1, 6));
        for (w, e) in set.wavelet.as_slice().iter().zip(expected) {
            assert!((w - e).abs() < 1e-12, "{w} != {e}");
        }
        let dc: f64 = set.wavelet.as_slice().iter().sum();
        assert!(dc.abs() < 1e-6);
    }

    #[test]
    fn test_symmetric_scaling_mirror_matches_plain_alternation() {
        let m = PrototypeFilter::Scaling.generate::<f64, Cpu>();
        let w = mirror(&m);
        for (i, (&x, &y)) in m.as_slice().iter().zip(w.as_slice()).enumerate() {
            let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
            assert!((y - sign * x).abs() < 1e-15, "tap {i}");
        }
    }

    #[test]
    fn test_prototype_set_from_default_config() {
        let set = PrototypeFilters::<f64, Cpu>::from_config(&ShearletConfig::default());
        assert_eq!(set.scaling, set.scaling2);
        assert_eq!(set.wavelet.dims(), (1, 9));
        let mass: f64 = set.directional.as_slice().iter().map(|x| x.abs()).sum();
        assert!((mass - 1.0).abs() < 1e-12);
    }
}
