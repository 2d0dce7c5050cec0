//! Natural cubic spline interpolation with clamped extrapolation.
//!
//! Every tabulated radial profile in this project is turned into a smooth
//! interpolant with a "hold the boundary value" policy outside the sampled
//! domain: queries below the first knot return the first sample, queries
//! above the last knot return the last sample. Profiles describe physical
//! quantities that flatten at large radius, so clamping is both safer and
//! closer to the truth than letting the boundary cubic run off.
//!
//! The second-derivative table is computed once at construction with the
//! standard tridiagonal sweep (natural boundary conditions), so evaluation
//! is a binary search plus a cubic polynomial.

use crate::error::AppError;

/// A natural cubic spline over strictly increasing knots.
#[derive(Debug, Clone)]
pub struct CubicSpline {
    x: Vec<f64>,
    y: Vec<f64>,
    /// Second derivatives at the knots (zero at both ends).
    y2: Vec<f64>,
}

impl CubicSpline {
    /// Build a spline from knot positions and values.
    ///
    /// Fails if the inputs are shorter than two samples, have mismatched
    /// lengths, contain non-finite values, or are not strictly increasing
    /// in `x`.
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Self, AppError> {
        if x.len() != y.len() {
            return Err(AppError::new(
                4,
                format!("Spline knot/value length mismatch: {} vs {}.", x.len(), y.len()),
            ));
        }
        if x.len() < 2 {
            return Err(AppError::new(4, "Spline needs at least two samples."));
        }
        if x.iter().chain(y.iter()).any(|v| !v.is_finite()) {
            return Err(AppError::new(4, "Spline input contains non-finite values."));
        }
        if x.windows(2).any(|w| w[1] <= w[0]) {
            return Err(AppError::new(4, "Spline abscissa must be strictly increasing."));
        }

        let n = x.len();
        let mut y2 = vec![0.0; n];
        let mut u = vec![0.0; n];

        // Forward sweep of the tridiagonal system; natural boundaries keep
        // y2[0] = y2[n-1] = 0.
        for i in 1..n - 1 {
            let sig = (x[i] - x[i - 1]) / (x[i + 1] - x[i - 1]);
            let p = sig * y2[i - 1] + 2.0;
            y2[i] = (sig - 1.0) / p;
            let d1 = (y[i] - y[i - 1]) / (x[i] - x[i - 1]);
            let d2 = (y[i + 1] - y[i]) / (x[i + 1] - x[i]);
            u[i] = (6.0 * (d2 - d1) / (x[i + 1] - x[i - 1]) - sig * u[i - 1]) / p;
        }
        for i in (1..n - 1).rev() {
            y2[i] = y2[i] * y2[i + 1] + u[i];
        }

        Ok(Self { x, y, y2 })
    }

    /// First knot position.
    pub fn x_min(&self) -> f64 {
        self.x[0]
    }

    /// Last knot position.
    pub fn x_max(&self) -> f64 {
        *self.x.last().expect("spline has at least two knots")
    }

    /// Knot positions.
    pub fn knots(&self) -> &[f64] {
        &self.x
    }

    /// Evaluate the spline at `q`, clamping outside the sampled domain.
    pub fn eval(&self, q: f64) -> f64 {
        let n = self.x.len();
        if q <= self.x[0] {
            return self.y[0];
        }
        if q >= self.x[n - 1] {
            return self.y[n - 1];
        }

        // Index of the interval [x[klo], x[klo+1]] containing q.
        let khi = self.x.partition_point(|&xi| xi < q).min(n - 1).max(1);
        let klo = khi - 1;

        let h = self.x[khi] - self.x[klo];
        let a = (self.x[khi] - q) / h;
        let b = (q - self.x[klo]) / h;

        a * self.y[klo]
            + b * self.y[khi]
            + ((a * a * a - a) * self.y2[klo] + (b * b * b - b) * self.y2[khi]) * (h * h) / 6.0
    }
}
