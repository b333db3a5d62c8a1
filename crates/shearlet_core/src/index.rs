//! Shear-level schedule and the ordered shearlet index list.

use crate::error::{Result, ShearletError};

/// Shear level of every scale. Scale `s` has `2 * 2^L + 1` directions per
/// cone where `L` is its level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShearLevels(Vec<usize>);

impl ShearLevels {
    /// Default schedule `ceil((s + 1) / 2)` for `s = 0..num_scales`.
    pub fn for_scales(num_scales: usize) -> Self {
        Self((0..num_scales).map(|s| (s + 2) / 2).collect())
    }

    pub fn from_levels(levels: Vec<usize>) -> Result<Self> {
        if levels.is_empty() {
            return Err(ShearletError::InvalidConfig(
                "shear level schedule is empty".into(),
            ));
        }
        if levels.windows(2).any(|w| w[1] < w[0]) {
            return Err(ShearletError::InvalidConfig(format!(
                "shear levels must be non-decreasing, got {levels:?}"
            )));
        }
        Ok(Self(levels))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn level(&self, scale: usize) -> usize {
        self.0[scale]
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    pub fn max(&self) -> usize {
        self.0.iter().copied().max().unwrap_or(0)
    }

    /// Distinct levels in increasing order.
    pub fn unique(&self) -> Vec<usize> {
        let mut levels = self.0.clone();
        levels.dedup();
        levels
    }

    /// Number of shearings `2 * 2^L + 1` at level `L`.
    pub fn directions(level: usize) -> usize {
        2 * (1 << level) + 1
    }
}

/// Frequency-plane region a shearlet belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cone {
    Lowpass = 0,
    Horizontal = 1,
    Vertical = 2,
}

/// Position of one shearlet in the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShearletIndex {
    pub cone: Cone,
    pub scale: usize,
    pub shearing: isize,
}

/// Ordered index list: both directional cones scale by scale with
/// shearings from `-2^L` to `2^L`, then the single lowpass entry.
pub fn shearlet_indices(levels: &ShearLevels) -> Vec<ShearletIndex> {
    let mut indices = Vec::with_capacity(shearlet_count(levels));
    for cone in [Cone::Horizontal, Cone::Vertical] {
        for (scale, &level) in levels.as_slice().iter().enumerate() {
            let span = 1isize << level;
            indices.extend((-span..=span).map(|shearing| ShearletIndex {
                cone,
                scale,
                shearing,
            }));
        }
    }
    indices.push(ShearletIndex {
        cone: Cone::Lowpass,
        scale: 0,
        shearing: 0,
    });
    indices
}

/// `2 * Σ (2 * 2^L + 1) + 1`
pub fn shearlet_count(levels: &ShearLevels) -> usize {
    2 * levels
        .as_slice()
        .iter()
        .map(|&level| ShearLevels::directions(level))
        .sum::<usize>()
        + 1
}
