//! Quadrature rules used by the profile loader and the model evaluator.
//!
//! Three rules cover every integral in the project:
//!
//! - trapezoid on tabulated samples (profile rescaling, streaming kernels)
//! - composite Simpson on a uniform grid (multipole projection, growth factor)
//! - per-bin definite integration of a callable (cumulative density contrast)
//!
//! Simpson's rule needs an even number of intervals; when given an odd count
//! we close the last three intervals with the 3/8 rule so accuracy stays
//! fourth order for any grid length >= 2.

/// Trapezoid rule over tabulated `(x, y)` samples.
///
/// # Panics
/// Panics if the slices have different lengths. An empty or single-sample
/// input integrates to zero.
pub fn trapezoid(x: &[f64], y: &[f64]) -> f64 {
    assert_eq!(x.len(), y.len(), "trapezoid: mismatched sample lengths");
    let mut acc = 0.0;
    for i in 1..x.len() {
        acc += 0.5 * (x[i] - x[i - 1]) * (y[i] + y[i - 1]);
    }
    acc
}

/// Composite Simpson rule over uniformly spaced samples with spacing `h`.
///
/// Handles any sample count >= 2: an odd number of intervals is closed with
/// the Newton-Cotes 3/8 rule on the final three (falling back to a single
/// trapezoid when fewer than three intervals remain).
pub fn simpson_uniform(y: &[f64], h: f64) -> f64 {
    let n = y.len();
    if n < 2 {
        return 0.0;
    }
    let intervals = n - 1;

    if intervals == 1 {
        return 0.5 * h * (y[0] + y[1]);
    }

    // Largest even interval count we can cover with plain Simpson.
    let even = if intervals % 2 == 0 { intervals } else { intervals - 3 };

    let mut acc = 0.0;
    if even >= 2 {
        let mut sum = y[0] + y[even];
        for (i, yi) in y.iter().enumerate().take(even).skip(1) {
            sum += if i % 2 == 1 { 4.0 * yi } else { 2.0 * yi };
        }
        acc += sum * h / 3.0;
    }

    let rem = intervals - even;
    if rem == 3 {
        acc += 3.0 * h / 8.0 * (y[even] + 3.0 * y[even + 1] + 3.0 * y[even + 2] + y[even + 3]);
    } else if rem == 1 {
        // Only possible when intervals == 1, handled above; kept for safety.
        acc += 0.5 * h * (y[even] + y[even + 1]);
    }
    acc
}

/// Integrate `f` over `[a, b]` with composite Simpson on `steps` sub-intervals.
///
/// `steps` is rounded up to an even count.
pub fn simpson_fn<F: Fn(f64) -> f64>(f: F, a: f64, b: f64, steps: usize) -> f64 {
    if a == b {
        return 0.0;
    }
    let steps = {
        let s = steps.max(2);
        s + s % 2
    };
    let h = (b - a) / steps as f64;
    let y: Vec<f64> = (0..=steps).map(|i| f(a + h * i as f64)).collect();
    simpson_uniform(&y, h)
}

/// Cumulative definite integrals of `f` from `origin` to each of `upper`.
///
/// `upper` must be non-decreasing; each bin `[upper[i-1], upper[i]]` is
/// integrated once with `steps_per_bin` Simpson sub-intervals and accumulated,
/// so the cost is linear in the number of bins.
pub fn cumulative_integral<F: Fn(f64) -> f64>(
    f: &F,
    origin: f64,
    upper: &[f64],
    steps_per_bin: usize,
) -> Vec<f64> {
    let mut out = Vec::with_capacity(upper.len());
    let mut acc = 0.0;
    let mut lo = origin;
    for &hi in upper {
        acc += simpson_fn(f, lo, hi, steps_per_bin);
        out.push(acc);
        lo = hi;
    }
    out
}

/// Uniformly spaced grid of `n` samples spanning `[a, b]` inclusive.
pub fn linspace(a: f64, b: f64, n: usize) -> Vec<f64> {
    if n == 1 {
        return vec![a];
    }
    let step = (b - a) / (n as f64 - 1.0);
    (0..n).map(|i| a + step * i as f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trapezoid_integrates_linear_exactly() {
        let x = linspace(0.0, 2.0, 50);
        let y: Vec<f64> = x.iter().map(|v| 3.0 * v + 1.0).collect();
        // Integral of 3x+1 over [0,2] = 8.
        assert!((trapezoid(&x, &y) - 8.0).abs() < 1e-12);
    }

    #[test]
    fn simpson_integrates_cubic_exactly_on_even_intervals() {
        let x = linspace(0.0, 1.0, 101);
        let y: Vec<f64> = x.iter().map(|v| v.powi(3)).collect();
        let h = x[1] - x[0];
        assert!((simpson_uniform(&y, h) - 0.25).abs() < 1e-12);
    }

    #[test]
    fn simpson_handles_odd_interval_counts() {
        // 1000 samples = 999 intervals, the dense multipole-grid case.
        let x = linspace(-1.0, 1.0, 1000);
        let y: Vec<f64> = x.iter().map(|v| v * v).collect();
        let h = x[1] - x[0];
        assert!((simpson_uniform(&y, h) - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn simpson_fn_matches_analytic_sine() {
        let v = simpson_fn(|x| x.sin(), 0.0, std::f64::consts::PI, 200);
        assert!((v - 2.0).abs() < 1e-8);
    }

    #[test]
    fn cumulative_integral_matches_power_law() {
        // f(x) = x^2 integrated from 0: F(r) = r^3 / 3.
        let upper = linspace(0.5, 10.0, 20);
        let vals = cumulative_integral(&|x: f64| x * x, 0.0, &upper, 64);
        for (r, v) in upper.iter().zip(vals.iter()) {
            assert!((v - r.powi(3) / 3.0).abs() < 1e-8, "r={r} v={v}");
        }
    }
}
