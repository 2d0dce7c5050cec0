//! Covariance matrix loading and inversion.
//!
//! The covariance of the observed moment vector is estimated from mock
//! catalogues and stored as a plain whitespace table (square). Construction
//! fails hard when the file is missing, the matrix is not square, or it is
//! not symmetric positive-definite; the fit cannot proceed without a usable
//! inverse.

use std::path::Path;

use nalgebra::{Cholesky, DMatrix, DVector};

use crate::error::AppError;

/// Relative tolerance for the symmetry check.
const SYMMETRY_RTOL: f64 = 1e-8;

/// A covariance matrix with its inverse cached at construction.
#[derive(Debug, Clone)]
pub struct Covariance {
    icov: DMatrix<f64>,
    dim: usize,
}

impl Covariance {
    /// Build from a dense matrix, verifying symmetry and positive
    /// definiteness (via Cholesky, which also yields the inverse).
    pub fn new(cov: DMatrix<f64>) -> Result<Self, AppError> {
        let dim = cov.nrows();
        if dim == 0 || cov.ncols() != dim {
            return Err(AppError::data(format!(
                "Covariance matrix must be square, got {}x{}.",
                cov.nrows(),
                cov.ncols()
            )));
        }

        let scale = cov.iter().fold(0.0f64, |m, v| m.max(v.abs())).max(1e-300);
        for i in 0..dim {
            for j in (i + 1)..dim {
                if (cov[(i, j)] - cov[(j, i)]).abs() > SYMMETRY_RTOL * scale {
                    return Err(AppError::new(4, "Covariance matrix is not symmetric."));
                }
            }
        }

        let chol = Cholesky::new(cov).ok_or_else(|| {
            AppError::new(4, "Covariance matrix is not positive-definite; cannot invert.")
        })?;

        Ok(Self {
            icov: chol.inverse(),
            dim,
        })
    }

    /// Load from a whitespace table of `dim` rows by `dim` columns.
    pub fn load(path: &Path) -> Result<Self, AppError> {
        if !path.is_file() {
            return Err(AppError::input(format!(
                "Covariance matrix not found: '{}'.",
                path.display()
            )));
        }
        let rows = crate::io::table::read_table(path)?;
        let dim = rows.len();
        let flat: Vec<f64> = rows.iter().flatten().copied().collect();
        if flat.len() != dim * dim {
            return Err(AppError::data(format!(
                "Covariance table '{}' is not square ({} rows, {} values).",
                path.display(),
                dim,
                flat.len()
            )));
        }
        Self::new(DMatrix::from_row_slice(dim, dim, &flat))
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Mahalanobis quadratic form `d^T C^-1 d`.
    pub fn chi2(&self, d: &DVector<f64>) -> f64 {
        (d.transpose() * &self.icov * d)[(0, 0)]
    }
}
