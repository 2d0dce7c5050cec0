//! Observed redshift-space correlation function.
//!
//! The input table lists `(s, mu, ..., xi, _)` rows with mu iterating as the
//! outer loop and s as the inner loop. The reader recovers the unique sorted
//! axes, reshapes the flat xi column into a 2D grid, and projects each
//! separation row onto monopole/quadrupole moments with the shared
//! [`MultipoleBasis`] routine so data and theory moments are numerically
//! consistent.

use std::path::Path;

use crate::error::AppError;
use crate::math::multipole::MultipoleBasis;

/// Observed correlation amplitudes on an (s, mu) grid.
#[derive(Debug, Clone)]
pub struct CorrelationGrid {
    s: Vec<f64>,
    mu: Vec<f64>,
    /// Indexed `[s_index][mu_index]`.
    xi: Vec<Vec<f64>>,
}

impl CorrelationGrid {
    /// Build a grid from already-shaped axes and values.
    ///
    /// Axes must be strictly increasing and `xi` must have shape
    /// `(s.len(), mu.len())`.
    pub fn new(s: Vec<f64>, mu: Vec<f64>, xi: Vec<Vec<f64>>) -> Result<Self, AppError> {
        let increasing = |v: &[f64]| v.len() >= 2 && v.windows(2).all(|w| w[1] > w[0]);
        if !increasing(&s) || !increasing(&mu) {
            return Err(AppError::data("Correlation grid axes must be strictly increasing."));
        }
        if xi.len() != s.len() || xi.iter().any(|row| row.len() != mu.len()) {
            return Err(AppError::data("Correlation grid shape does not match its axes."));
        }
        Ok(Self { s, mu, xi })
    }

    pub fn s(&self) -> &[f64] {
        &self.s
    }

    pub fn mu(&self) -> &[f64] {
        &self.mu
    }

    pub fn xi(&self) -> &[Vec<f64>] {
        &self.xi
    }

    /// Monopole and quadrupole moment vectors, one entry per separation bin.
    pub fn multipoles(&self, basis: &MultipoleBasis) -> Result<(Vec<f64>, Vec<f64>), AppError> {
        let mut mono = Vec::with_capacity(self.s.len());
        let mut quad = Vec::with_capacity(self.s.len());
        for row in &self.xi {
            let (m, q) = basis.project(&self.mu, row)?;
            mono.push(m);
            quad.push(q);
        }
        Ok((mono, quad))
    }
}

/// Read a correlation-function table.
pub fn read_corr_file(path: &Path) -> Result<CorrelationGrid, AppError> {
    let rows = crate::io::table::read_table(path)?;
    let width = rows[0].len();
    if width < 3 {
        return Err(AppError::data(format!(
            "Correlation table '{}' needs at least (s, mu, xi) columns.",
            path.display()
        )));
    }

    let s = unique_sorted(rows.iter().map(|r| r[0]));
    let mu = unique_sorted(rows.iter().map(|r| r[1]));

    if s.len() * mu.len() != rows.len() {
        return Err(AppError::data(format!(
            "Correlation table '{}' is not a complete grid: {} rows for {} x {} axes.",
            path.display(),
            rows.len(),
            s.len(),
            mu.len()
        )));
    }

    // File layout: mu outer, s inner.
    let mut xi = vec![vec![0.0; mu.len()]; s.len()];
    let mut counter = 0;
    for i in 0..mu.len() {
        for j in 0..s.len() {
            xi[j][i] = rows[counter][width - 2];
            counter += 1;
        }
    }

    Ok(CorrelationGrid { s, mu, xi })
}

fn unique_sorted(values: impl Iterator<Item = f64>) -> Vec<f64> {
    let mut v: Vec<f64> = values.collect();
    v.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    v.dedup();
    v
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::multipole::legendre_p2;
    use std::io::Write;

    fn grid_file(s: &[f64], mu: &[f64], f: impl Fn(f64, f64) -> f64) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        for &m in mu {
            for &si in s {
                writeln!(file, "{si} {m} {} 0.0", f(si, m)).unwrap();
            }
        }
        file
    }

    #[test]
    fn reshapes_mu_major_layout() {
        let s = [10.0, 20.0];
        let mu = [-0.5, 0.5];
        // Encode the (s, mu) pair in the value so placement is checkable.
        let f = grid_file(&s, &mu, |si, m| si + m);
        let grid = read_corr_file(f.path()).unwrap();
        assert_eq!(grid.s(), &s);
        assert_eq!(grid.mu(), &mu);
        assert!((grid.xi()[0][0] - 9.5).abs() < 1e-12);
        assert!((grid.xi()[1][0] - 19.5).abs() < 1e-12);
        assert!((grid.xi()[0][1] - 10.5).abs() < 1e-12);
    }

    #[test]
    fn multipoles_recover_injected_moments() {
        let s = [10.0, 20.0, 30.0];
        let mu: Vec<f64> = crate::math::integrate::linspace(-1.0, 1.0, 80);
        // xi(s, mu) = A(s) + B(s) P2(mu) with s-dependent moments.
        let f = grid_file(&s, &mu, |si, m| 0.01 * si + (-0.002 * si) * legendre_p2(m));
        let grid = read_corr_file(f.path()).unwrap();

        let basis = MultipoleBasis::default();
        let (mono, quad) = grid.multipoles(&basis).unwrap();
        for (i, &si) in s.iter().enumerate() {
            assert!((mono[i] - 0.01 * si).abs() < 1e-4, "mono[{i}]");
            assert!((quad[i] + 0.002 * si).abs() < 1e-3, "quad[{i}]");
        }
    }

    #[test]
    fn rejects_incomplete_grid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "10.0 -0.5 0.1 0").unwrap();
        writeln!(file, "20.0 -0.5 0.1 0").unwrap();
        writeln!(file, "10.0 0.5 0.1 0").unwrap();
        assert!(read_corr_file(file.path()).is_err());
    }
}
