//! Frequency-domain filter bank for one cone.
//!
//! The builder turns the prototype filters into three families of
//! image-sized spectra:
//!
//! - a separable lowpass built from the finest pyramid low-pass stage,
//! - one band-pass per scale from the high-pass pyramid,
//! - one wedge set per distinct shear level, holding `2 * 2^L + 1`
//!   directional filters obtained by shearing an upsampled fan filter.
//!
//! The vertical cone reuses the same builder on the transposed grid.

use ndarray::Axis;
use rustfft::num_complex::Complex;
use tracing::debug;

use crate::backend::Backend;
use crate::error::{Result, ShearletError};
use crate::filters::PrototypeFilters;
use crate::float_trait::ShearletFloat;
use crate::fourier::FourierEngine;
use crate::index::ShearLevels;
use crate::matrix::{Matrix, OwnedMatrix};
use crate::transform::{
    convolve, downsample_into, dshear_into, mat_mul, pad, real_to_complex, transpose, upsample,
};

/// Spectra for one cone, sized `(rows, cols)` of the grid they were built on.
#[derive(Debug, Clone)]
pub struct FilterBundle<F: ShearletFloat, B: Backend> {
    pub lowpass: OwnedMatrix<Complex<F>, B>,
    /// One band-pass per scale.
    pub bandpass: Vec<OwnedMatrix<Complex<F>, B>>,
    /// `wedge[w][2^L - k]` is shearing `k` of the `w`-th distinct level.
    pub wedge: Vec<Vec<OwnedMatrix<Complex<F>, B>>>,
    /// Distinct shear levels, in the order of `wedge`.
    pub levels: Vec<usize>,
}

impl<F: ShearletFloat, B: Backend> FilterBundle<F, B> {
    /// Position of `level` in [`wedge`](Self::wedge).
    pub fn wedge_index(&self, level: usize) -> Option<usize> {
        self.levels.iter().position(|&l| l == level)
    }
}

fn ensure_fits(filter: (usize, usize), target: (usize, usize)) -> Result<()> {
    if filter.0 > target.0 || filter.1 > target.1 {
        return Err(ShearletError::FilterDoesNotFit { filter, target });
    }
    Ok(())
}

/// Length of the finest stage of a `stages`-deep cascade, saturating at
/// `usize::MAX`. Every stage maps `n` taps to `2n - 1 + prototype_len - 1`.
fn cascade_len(prototype_len: usize, seed_len: usize, stages: usize) -> usize {
    let mut len = seed_len;
    for _ in 1..stages {
        if len == usize::MAX {
            break;
        }
        len = len
            .saturating_mul(2)
            .saturating_sub(1)
            .saturating_add(prototype_len.saturating_sub(1));
    }
    len
}

/// Size of the fan filter for `level` before it is padded to the grid: the
/// directional prototype upsampled by `2^(level+1) - 1` zero rows and
/// convolved with a column of the directional cascade.
fn fan_dims(
    directional: (usize, usize),
    cascade_stage_len: usize,
    level: usize,
) -> (usize, usize) {
    let period = u32::try_from(level.saturating_add(1))
        .ok()
        .and_then(|shift| 1usize.checked_shl(shift))
        .unwrap_or(usize::MAX);
    let rows = (directional.0 - 1)
        .saturating_mul(period)
        .saturating_add(cascade_stage_len);
    (rows, directional.1)
}

/// Reject a bundle whose filters cannot be padded into the grid, using only
/// the stage sizes.
fn check_bundle_fits<F: ShearletFloat, B: Backend>(
    target: (usize, usize),
    levels: &ShearLevels,
    prototypes: &PrototypeFilters<F, B>,
) -> Result<()> {
    let num_scales = levels.len();
    let scaling_len = prototypes.scaling.cols();
    let bandpass_len = cascade_len(scaling_len, prototypes.wavelet.cols(), num_scales);
    ensure_fits((1, bandpass_len), target)?;
    let finest = cascade_len(scaling_len, scaling_len, num_scales);
    ensure_fits((finest, finest), target)?;

    let scaling2_len = prototypes.scaling2.cols();
    for level in levels.unique() {
        let stage_len = cascade_len(scaling2_len, scaling2_len, level.saturating_add(1));
        ensure_fits(fan_dims(prototypes.directional.dims(), stage_len, level), target)?;
    }
    Ok(())
}

/// `stages` filters, finest first. The coarsest entry is `seed`; every
/// finer entry is the next coarser one upsampled by one zero and convolved
/// with `prototype`.
fn cascade<F: ShearletFloat, B: Backend>(
    prototype: &Matrix<'_, F, B>,
    seed: &Matrix<'_, F, B>,
    stages: usize,
) -> Vec<OwnedMatrix<F, B>> {
    assert!(stages > 0, "a cascade needs at least one stage");
    let mut filters = vec![seed.to_owned_matrix()];
    for _ in 1..stages {
        let coarser = upsample(&filters[filters.len() - 1], Axis(1), 1);
        filters.push(convolve(prototype, &coarser));
    }
    filters.reverse();
    filters
}

/// Low-pass and high-pass 1-D pyramids, finest scale first.
pub fn pyramid_cascade<F: ShearletFloat, B: Backend>(
    scaling: &Matrix<'_, F, B>,
    wavelet: &Matrix<'_, F, B>,
    num_scales: usize,
) -> (Vec<OwnedMatrix<F, B>>, Vec<OwnedMatrix<F, B>>) {
    (
        cascade(scaling, scaling, num_scales),
        cascade(scaling, wavelet, num_scales),
    )
}

/// Low-pass cascade for the directional filters, finest first.
pub fn directional_cascade<F: ShearletFloat, B: Backend>(
    scaling2: &Matrix<'_, F, B>,
    stages: usize,
) -> Vec<OwnedMatrix<F, B>> {
    cascade(scaling2, scaling2, stages)
}

/// Build the lowpass, band-pass and wedge spectra on the grid of `engine`.
///
/// Sizes are checked before any cascade is built, so a request that cannot
/// fit fails with [`ShearletError::FilterDoesNotFit`] without allocating the
/// oversized filters.
pub fn build_filter_bundle<F: ShearletFloat, B: Backend>(
    engine: &FourierEngine<F>,
    levels: &ShearLevels,
    prototypes: &PrototypeFilters<F, B>,
) -> Result<FilterBundle<F, B>> {
    let (rows, cols) = engine.dims();
    check_bundle_fits((rows, cols), levels, prototypes)?;
    let num_scales = levels.len();
    let (low, high) = pyramid_cascade(&prototypes.scaling, &prototypes.wavelet, num_scales);
    let low2 = directional_cascade(&prototypes.scaling2, levels.max() + 1);
    debug!(
        rows,
        cols,
        num_scales,
        finest_len = low[0].cols(),
        "built pyramid cascades"
    );

    let mut bandpass = Vec::with_capacity(num_scales);
    for filter in &high {
        ensure_fits(filter.dims(), (rows, cols))?;
        let mut spectrum = Matrix::new(rows, cols);
        engine.fft_with_shifts_padded(&real_to_complex(filter), &mut spectrum);
        bandpass.push(spectrum);
    }

    let separable = mat_mul(&transpose(&low[0]), &low[0]);
    ensure_fits(separable.dims(), (rows, cols))?;
    let mut lowpass = Matrix::new(rows, cols);
    engine.fft_with_shifts_padded(&real_to_complex(&separable), &mut lowpass);

    let unique = levels.unique();
    let mut wedge = Vec::with_capacity(unique.len());
    for &level in &unique {
        wedge.push(build_wedge(engine, level, &low2, &prototypes.directional)?);
        debug!(rows, cols, level, "built wedge filters");
    }

    Ok(FilterBundle {
        lowpass,
        bandpass,
        wedge,
        levels: unique,
    })
}

/// Directional spectra for one shear level, indexed by `2^level - k`.
fn build_wedge<F: ShearletFloat, B: Backend>(
    engine: &FourierEngine<F>,
    level: usize,
    low2: &[OwnedMatrix<F, B>],
    directional: &Matrix<'_, F, B>,
) -> Result<Vec<OwnedMatrix<Complex<F>, B>>> {
    let (rows, cols) = engine.dims();
    let stages = low2.len();
    let stride = 1usize << level;

    let fan = upsample(directional, Axis(0), (stride << 1) - 1);
    let wedge_help = convolve(&fan, &transpose(&low2[stages - 1 - level]));
    ensure_fits(wedge_help.dims(), (rows, cols))?;
    let wedge_help = upsample(&pad(&wedge_help, rows, cols), Axis(1), stride - 1);
    let (up_rows, up_cols) = wedge_help.dims();

    let lowpass_stage = &low2[stages - 1 - level.saturating_sub(1)];
    ensure_fits(lowpass_stage.dims(), (up_rows, up_cols))?;
    let mut lowpass_help = real_to_complex(&pad(lowpass_stage, up_rows, up_cols));

    let helper = FourierEngine::<F>::new(up_rows, up_cols);
    let mut wedge_conv = Matrix::new(up_rows, up_cols);
    helper.conv_dd2d(&lowpass_help, &real_to_complex(&wedge_help), &mut wedge_conv);
    lowpass_help.flip(Axis(1));

    let span = stride as isize;
    let gain = F::usize_as(stride);
    let mut directions: Vec<OwnedMatrix<Complex<F>, B>> =
        (0..2 * stride + 1).map(|_| Matrix::new(rows, cols)).collect();
    let mut sheared = Matrix::new(up_rows, up_cols);
    let mut smoothed = Matrix::new(up_rows, up_cols);
    let mut decimated = Matrix::new(rows, cols);
    for k in -span..=span {
        dshear_into(&wedge_conv, &mut sheared, k, Axis(1));
        helper.conv_dd2d(&lowpass_help, &sheared, &mut smoothed);
        downsample_into(&smoothed, &mut decimated, Axis(1), stride);
        decimated.scale(gain);
        engine.fft_with_shifts(&decimated, &mut directions[(span - k) as usize]);
    }
    Ok(directions)
}
