//! Light smoothing and finite-difference helpers for tabulated profiles.

/// Window-3, degree-1 Savitzky-Golay smoothing.
///
/// For a three-sample window a degree-1 local fit reduces to the mean of the
/// window at interior points. At the two boundary points the local line is
/// fitted through the nearest three samples and evaluated at the endpoint,
/// which matches the "interp" boundary treatment of the usual filters.
///
/// Inputs shorter than three samples are returned unchanged.
pub fn savgol_3_1(y: &[f64]) -> Vec<f64> {
    let n = y.len();
    if n < 3 {
        return y.to_vec();
    }

    let mut out = vec![0.0; n];
    for i in 1..n - 1 {
        out[i] = (y[i - 1] + y[i] + y[i + 1]) / 3.0;
    }

    // Linear fit through (0,1,2) evaluated at 0, and through (n-3..n) at n-1.
    // For equally spaced samples: value = mean -/+ slope, slope = (y2 - y0)/2.
    out[0] = (y[0] + y[1] + y[2]) / 3.0 - (y[2] - y[0]) / 2.0;
    out[n - 1] = (y[n - 3] + y[n - 2] + y[n - 1]) / 3.0 + (y[n - 1] - y[n - 3]) / 2.0;
    out
}

/// Finite-difference gradient dy/dx on an arbitrary (increasing) grid.
///
/// Interior points use the spacing-weighted three-point stencil, which is
/// second-order accurate even when the grid is non-uniform (and reduces to
/// the plain central difference on a uniform one). The two ends are
/// one-sided.
///
/// # Panics
/// Panics if the slices have different lengths or fewer than two samples.
pub fn gradient(x: &[f64], y: &[f64]) -> Vec<f64> {
    assert_eq!(x.len(), y.len(), "gradient: mismatched sample lengths");
    assert!(x.len() >= 2, "gradient: need at least two samples");

    let n = x.len();
    let mut out = vec![0.0; n];
    out[0] = (y[1] - y[0]) / (x[1] - x[0]);
    for i in 1..n - 1 {
        let hd = x[i] - x[i - 1];
        let hs = x[i + 1] - x[i];
        out[i] =
            (hd * hd * y[i + 1] + (hs * hs - hd * hd) * y[i] - hs * hs * y[i - 1])
                / (hs * hd * (hd + hs));
    }
    out[n - 1] = (y[n - 1] - y[n - 2]) / (x[n - 1] - x[n - 2]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn savgol_preserves_linear_data() {
        let y: Vec<f64> = (0..8).map(|i| 2.0 * i as f64 + 1.0).collect();
        let s = savgol_3_1(&y);
        for (a, b) in y.iter().zip(s.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn savgol_averages_interior_noise() {
        let y = vec![0.0, 1.0, 0.0, 1.0, 0.0];
        let s = savgol_3_1(&y);
        assert!((s[2] - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn gradient_is_exact_on_linear_data() {
        let x: Vec<f64> = (0..10).map(|i| i as f64 * 0.5).collect();
        let y: Vec<f64> = x.iter().map(|v| -4.0 * v + 2.0).collect();
        for g in gradient(&x, &y) {
            assert!((g + 4.0).abs() < 1e-12);
        }
    }

    #[test]
    fn gradient_is_exact_on_quadratic_over_uneven_grid() {
        // The weighted stencil differentiates a parabola exactly at interior
        // points regardless of spacing.
        let x = vec![0.0, 1.0, 3.0, 4.0, 7.0, 7.5];
        let y: Vec<f64> = x.iter().map(|v| v * v - 2.0 * v).collect();
        let g = gradient(&x, &y);
        for i in 1..x.len() - 1 {
            assert!((g[i] - (2.0 * x[i] - 2.0)).abs() < 1e-12, "i={i}");
        }
    }
}
