//! Legendre multipole projection of an angular correlation sample.
//!
//! Both the data reader and the theory evaluator reduce a per-angle
//! correlation sample to its monopole (l = 0) and quadrupole (l = 2)
//! moments the same way: fit a cubic interpolant over the angle cosine,
//! evaluate it on a dense uniform grid spanning [-1, 1], and integrate
//! against the normalized Legendre weights with Simpson's rule.
//!
//! The grid density is the dominant accuracy/speed knob of the whole fit
//! (the projection runs once per separation bin per likelihood call), so it
//! is a constructor argument rather than an inlined constant.

use crate::error::AppError;
use crate::math::integrate::{linspace, simpson_uniform};
use crate::math::spline::CubicSpline;

/// Second Legendre polynomial.
pub fn legendre_p2(mu: f64) -> f64 {
    (3.0 * mu * mu - 1.0) / 2.0
}

/// Monopole + quadrupole projector with a configurable quadrature grid.
#[derive(Debug, Clone)]
pub struct MultipoleBasis {
    grid: Vec<f64>,
    step: f64,
}

impl MultipoleBasis {
    /// Default dense-grid density.
    pub const DEFAULT_POINTS: usize = 1000;

    /// Build a projector integrating over `points` uniform samples of
    /// mu in [-1, 1].
    pub fn new(points: usize) -> Self {
        let points = points.max(8);
        let grid = linspace(-1.0, 1.0, points);
        let step = grid[1] - grid[0];
        Self { grid, step }
    }

    /// Project `(mu, xi)` samples onto (monopole, quadrupole).
    ///
    /// The samples may arrive unsorted (the theory evaluator produces them at
    /// the distorted angles); they are sorted here. Duplicate angles are an
    /// error because the interpolant needs a strictly increasing axis.
    pub fn project(&self, mu: &[f64], xi: &[f64]) -> Result<(f64, f64), AppError> {
        if mu.len() != xi.len() || mu.len() < 2 {
            return Err(AppError::new(4, "Multipole projection needs matching mu/xi samples."));
        }

        let mut pairs: Vec<(f64, f64)> = mu.iter().copied().zip(xi.iter().copied()).collect();
        pairs.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

        let mu_sorted: Vec<f64> = pairs.iter().map(|p| p.0).collect();
        let xi_sorted: Vec<f64> = pairs.iter().map(|p| p.1).collect();
        let spline = CubicSpline::new(mu_sorted, xi_sorted)?;

        let dense: Vec<f64> = self.grid.iter().map(|&m| spline.eval(m)).collect();

        let mono_y: Vec<f64> = dense.iter().map(|&v| v / 2.0).collect();
        let quad_y: Vec<f64> = dense
            .iter()
            .zip(self.grid.iter())
            .map(|(&v, &m)| v * 2.5 * legendre_p2(m))
            .collect();

        Ok((
            simpson_uniform(&mono_y, self.step),
            simpson_uniform(&quad_y, self.step),
        ))
    }
}

impl Default for MultipoleBasis {
    fn default() -> Self {
        Self::new(Self::DEFAULT_POINTS)
    }
}
