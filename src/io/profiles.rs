//! Radial profile loading.
//!
//! Each profile file is a whitespace table with the radius in the first
//! column and the quantity of interest in the second-to-last column (the
//! convention of the upstream void-finder outputs). A loaded profile keeps
//! both the raw samples (needed by the rescaling step, which relabels the
//! radius axis) and a clamped cubic interpolant.

use std::path::Path;

use crate::error::AppError;
use crate::math::integrate::cumulative_integral;
use crate::math::smooth::{gradient, savgol_3_1};
use crate::math::spline::CubicSpline;

/// Sub-intervals per radial bin for the cumulative density integral.
const CONTRAST_STEPS_PER_BIN: usize = 64;

/// An ordered radial sample set plus its smooth interpolant.
#[derive(Debug, Clone)]
pub struct RadialProfile {
    r: Vec<f64>,
    values: Vec<f64>,
    spline: CubicSpline,
}

impl RadialProfile {
    /// Build a profile from raw samples; `r` must be strictly increasing.
    pub fn new(r: Vec<f64>, values: Vec<f64>) -> Result<Self, AppError> {
        let spline = CubicSpline::new(r.clone(), values.clone())?;
        Ok(Self { r, values, spline })
    }

    /// Evaluate the interpolant, clamping outside the sampled range.
    pub fn eval(&self, r: f64) -> f64 {
        self.spline.eval(r)
    }

    pub fn radii(&self) -> &[f64] {
        &self.r
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

/// How the velocity-dispersion profile is treated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispersionMode {
    /// Use the measured profile, normalized by its outermost sample and
    /// lightly smoothed to suppress sampling noise.
    Measured,
    /// Constant 1.0 everywhere (fixed-width analyses).
    Uniform,
}

/// Load a plain radial profile (real-space correlation or density contrast).
pub fn load_profile(path: &Path) -> Result<RadialProfile, AppError> {
    let rows = crate::io::table::read_table(path)?;
    let (r, values) = split_profile_columns(&rows, path)?;
    RadialProfile::new(r, values)
}

/// Load the velocity-dispersion profile.
pub fn load_dispersion_profile(path: &Path, mode: DispersionMode) -> Result<RadialProfile, AppError> {
    let rows = crate::io::table::read_table(path)?;
    let (r, raw) = split_profile_columns(&rows, path)?;

    let values = match mode {
        DispersionMode::Uniform => vec![1.0; r.len()],
        DispersionMode::Measured => {
            let outer = *raw.last().expect("profile has at least two samples");
            if outer == 0.0 {
                return Err(AppError::data(format!(
                    "Dispersion profile '{}' has a zero outermost sample.",
                    path.display()
                )));
            }
            let normalized: Vec<f64> = raw.iter().map(|v| v / outer).collect();
            savgol_3_1(&normalized)
        }
    };

    RadialProfile::new(r, values)
}

/// Load the radial-velocity profile and derive its finite-difference
/// gradient (both needed by the coherent-infall variant).
pub fn load_velocity_profiles(path: &Path) -> Result<(RadialProfile, RadialProfile), AppError> {
    let rows = crate::io::table::read_table(path)?;
    let (r, vr) = split_profile_columns(&rows, path)?;
    let dvr = gradient(&r, &vr);

    Ok((
        RadialProfile::new(r.clone(), vr)?,
        RadialProfile::new(r, dvr)?,
    ))
}

/// Derive the integrated density contrast Delta(r) = (3/r^3) int_0^r d(x) x^2 dx
/// from the differential contrast profile.
///
/// The integral runs over the clamped interpolant, so the region below the
/// first sampled radius contributes the boundary value of delta.
pub fn integrated_contrast(delta: &RadialProfile) -> Result<RadialProfile, AppError> {
    let r = delta.radii().to_vec();
    let integrals = cumulative_integral(
        &|x: f64| delta.eval(x) * x * x,
        0.0,
        &r,
        CONTRAST_STEPS_PER_BIN,
    );

    let values: Vec<f64> = integrals
        .iter()
        .zip(r.iter())
        .map(|(int, ri)| 3.0 * int / ri.powi(3))
        .collect();

    if values.iter().any(|v| !v.is_finite()) {
        return Err(AppError::new(
            4,
            "Integrated density contrast is non-finite (zero radius in profile?).",
        ));
    }

    RadialProfile::new(r, values)
}

fn split_profile_columns(rows: &[Vec<f64>], path: &Path) -> Result<(Vec<f64>, Vec<f64>), AppError> {
    let width = rows[0].len();
    if width < 2 {
        return Err(AppError::data(format!(
            "Profile '{}' needs at least two columns, found {width}.",
            path.display()
        )));
    }
    let r = crate::io::table::column(rows, 0);
    let values = crate::io::table::column(rows, width - 2);
    Ok((r, values))
}
