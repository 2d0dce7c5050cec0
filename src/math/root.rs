//! Scalar root finding for the coherent-infall displacement equation.
//!
//! The solver is a damped Newton iteration with a numerical derivative and a
//! secant fallback when the derivative underflows. Unlike a best-effort
//! solver, non-convergence is reported explicitly so callers can decide what
//! a failed solve means (the likelihood rejects the proposal).

use crate::error::AppError;

/// Convergence settings for [`find_root`].
#[derive(Debug, Clone, Copy)]
pub struct RootOptions {
    /// Absolute tolerance on the residual.
    pub tol: f64,
    /// Maximum number of Newton steps.
    pub max_iter: usize,
    /// Relative step used for the numerical derivative.
    pub derivative_step: f64,
}

impl Default for RootOptions {
    fn default() -> Self {
        Self {
            tol: 1e-8,
            max_iter: 60,
            derivative_step: 1e-6,
        }
    }
}

/// Solve `f(x) = 0` starting from `x0`.
///
/// Returns the root estimate on convergence, or an error naming the residual
/// reached when the iteration budget is exhausted or the iterate turns
/// non-finite.
pub fn find_root<F: Fn(f64) -> f64>(f: F, x0: f64, opts: RootOptions) -> Result<f64, AppError> {
    let mut x = x0;
    let mut fx = f(x);

    for _ in 0..opts.max_iter {
        if !fx.is_finite() || !x.is_finite() {
            return Err(AppError::new(4, "Root finding produced a non-finite iterate."));
        }
        if fx.abs() <= opts.tol {
            return Ok(x);
        }

        let h = opts.derivative_step * x.abs().max(1.0);
        let dfx = (f(x + h) - f(x - h)) / (2.0 * h);

        let step = if dfx.abs() > 1e-14 {
            fx / dfx
        } else {
            // Flat derivative: fall back to a secant step against x0.
            let f0 = f(x0);
            let denom = fx - f0;
            if denom.abs() <= 1e-14 {
                return Err(AppError::new(4, "Root finding stalled on a flat residual."));
            }
            fx * (x - x0) / denom
        };

        // Damp oversized steps so the iterate cannot run away from the seed.
        let max_step = x.abs().max(1.0);
        let step = step.clamp(-max_step, max_step);

        x -= step;
        fx = f(x);
    }

    if fx.abs() <= opts.tol {
        Ok(x)
    } else {
        Err(AppError::new(
            4,
            format!("Root finding did not converge (residual {fx:.3e})."),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_root_of_shifted_cubic() {
        let r = find_root(|x| x * x * x - 8.0, 1.0, RootOptions::default()).unwrap();
        assert!((r - 2.0).abs() < 1e-6);
    }

    #[test]
    fn finds_root_seeded_near_solution() {
        // The displacement equation is a small perturbation of the identity;
        // mimic that shape.
        let r = find_root(|x| x - 30.0 + 0.5 * (x / 40.0).sin(), 30.0, RootOptions::default())
            .unwrap();
        assert!((r - 30.0 + 0.5 * (r / 40.0).sin()).abs() < 1e-8);
    }

    #[test]
    fn reports_failure_on_rootless_function() {
        let err = find_root(|x| x * x + 1.0, 0.5, RootOptions { max_iter: 20, ..Default::default() });
        assert!(err.is_err());
    }
}
