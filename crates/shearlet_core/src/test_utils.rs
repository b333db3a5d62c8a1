//! Deterministic inputs shared by the unit tests.

use rustfft::num_complex::Complex;

use crate::matrix::{Matrix, OwnedMatrix};

/// Linear congruential generator, reproducible across platforms.
pub struct SimpleLcg {
    state: u64,
}

impl SimpleLcg {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    pub fn next_u64(&mut self) -> u64 {
        self.state = self
            .state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1);
        self.state
    }

    /// Uniform in `[-1, 1)`.
    pub fn next_f32(&mut self) -> f32 {
        let u = self.next_u64();
        ((u >> 40) as f32 / (1u64 << 24) as f32) * 2.0 - 1.0
    }

    /// Uniform in `[-1, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        let u = self.next_u64();
        ((u >> 11) as f64 / (1u64 << 53) as f64) * 2.0 - 1.0
    }
}

pub fn random_matrix_f64(rows: usize, cols: usize, seed: u64) -> OwnedMatrix<f64> {
    let mut rng = SimpleLcg::new(seed);
    let data = (0..rows * cols).map(|_| rng.next_f64()).collect();
    Matrix::from_shape_vec(rows, cols, data).unwrap()
}

pub fn random_matrix_f32(rows: usize, cols: usize, seed: u64) -> OwnedMatrix<f32> {
    let mut rng = SimpleLcg::new(seed);
    let data = (0..rows * cols).map(|_| rng.next_f32()).collect();
    Matrix::from_shape_vec(rows, cols, data).unwrap()
}

pub fn random_complex_f64(rows: usize, cols: usize, seed: u64) -> OwnedMatrix<Complex<f64>> {
    let mut rng = SimpleLcg::new(seed);
    let data = (0..rows * cols)
        .map(|_| Complex::new(rng.next_f64(), rng.next_f64()))
        .collect();
    Matrix::from_shape_vec(rows, cols, data).unwrap()
}
