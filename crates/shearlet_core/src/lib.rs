//! Shearlet Core Library
//!
//! Pure Rust implementation of the discrete shearlet transform for 2-D
//! images: prototype filters, frequency-domain filter-bank construction,
//! analysis (`decode`) and synthesis (`recover`) on top of `rustfft`.

pub mod backend;
pub mod coefficients;
pub mod config;
pub mod error;
pub mod filter_bank;
pub mod filters;
pub mod float_trait;
pub mod fourier;
pub mod index;
pub mod matrix;
pub mod system;
pub mod transform;

#[cfg(test)]
mod test_utils;

// Re-export commonly used types at the crate root
pub use backend::{Backend, Cpu};
pub use coefficients::ShearletCoefficients;
pub use config::ShearletConfig;
pub use error::{Result, ShearletError};
pub use filter_bank::{build_filter_bundle, FilterBundle};
pub use filters::{PrototypeFilter, PrototypeFilters};
pub use float_trait::{Element, ShearletFloat};
pub use fourier::{Domain, FourierEngine, Product};
pub use index::{shearlet_count, shearlet_indices, Cone, ShearLevels, ShearletIndex};
pub use matrix::{Matrix, OwnedMatrix};
pub use system::ShearletSystem;
