//! Construction parameters for a shearlet system.

use crate::error::{Result, ShearletError};
use crate::filters::PrototypeFilter;

const PROFILE_TIMING_ENV: &str = "SHEARLET_PROFILE_TIMING";

/// Parameters that, together with the image size, fully determine a
/// shearlet system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShearletConfig {
    /// Number of band-pass scales.
    pub num_scales: usize,
    /// Explicit shear level per scale. `None` uses `ceil((s+1)/2)`.
    pub shear_levels: Option<Vec<usize>>,
    /// 1-row low-pass prototype for the pyramid and directional cascades.
    pub scaling_filter: PrototypeFilter,
    /// 2-D directional prototype for the wedge filters.
    pub directional_filter: PrototypeFilter,
}

impl Default for ShearletConfig {
    fn default() -> Self {
        Self {
            num_scales: 1,
            shear_levels: None,
            scaling_filter: PrototypeFilter::Scaling,
            directional_filter: PrototypeFilter::Directional1,
        }
    }
}

impl ShearletConfig {
    /// Default prototypes with the given number of scales.
    pub fn with_scales(num_scales: usize) -> Self {
        Self {
            num_scales,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.num_scales == 0 {
            return Err(ShearletError::InvalidConfig(
                "num_scales must be at least 1".into(),
            ));
        }
        if let Some(levels) = &self.shear_levels {
            if levels.len() != self.num_scales {
                return Err(ShearletError::InvalidConfig(format!(
                    "expected {} shear levels, got {}",
                    self.num_scales,
                    levels.len()
                )));
            }
            if levels.windows(2).any(|w| w[1] < w[0]) {
                return Err(ShearletError::InvalidConfig(
                    "shear levels must be non-decreasing".into(),
                ));
            }
        }
        if self.scaling_filter.dims().0 != 1 {
            return Err(ShearletError::InvalidConfig(format!(
                "scaling prototype {:?} must be a single row",
                self.scaling_filter
            )));
        }
        if self.directional_filter.dims().0 < 2 {
            return Err(ShearletError::InvalidConfig(format!(
                "directional prototype {:?} must be two-dimensional",
                self.directional_filter
            )));
        }
        Ok(())
    }
}

/// Whether construction, decode and recover should report wall-clock timings.
pub fn resolve_profile_timing() -> bool {
    std::env::var(PROFILE_TIMING_ENV)
        .ok()
        .map(|value| {
            let v = value.trim();
            v == "1"
                || v.eq_ignore_ascii_case("true")
                || v.eq_ignore_ascii_case("yes")
                || v.eq_ignore_ascii_case("on")
        })
        .unwrap_or(false)
}
