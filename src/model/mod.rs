//! The RSD model evaluator.
//!
//! An [`RsdModel`] owns everything the likelihood needs: the loaded radial
//! profiles, the observed multipole vectors (restricted to the fitting
//! window), the inverse covariance, and the fiducial-cosmology scalars. It
//! is immutable after construction, so one instance can be shared by
//! reference across sampler workers.
//!
//! The physical prescription is fixed at construction by the
//! [`ModelVariant`]; each variant lives in its own submodule and shares the
//! rescaling step and multipole reduction.

use nalgebra::DVector;

use crate::cosmo::Cosmology;
use crate::domain::{FitConfig, FittingWindow, ModelVariant};
use crate::error::AppError;
use crate::io::corr::{read_corr_file, CorrelationGrid};
use crate::io::covariance::Covariance;
use crate::io::profiles::{
    integrated_contrast, load_dispersion_profile, load_profile, load_velocity_profiles,
    DispersionMode,
};
use crate::math::multipole::MultipoleBasis;

pub mod infall;
pub mod kaiser;
pub mod likelihood;
pub mod rescale;
pub mod streaming;

pub use rescale::{AlphaPair, ProfileSet};

/// Undistorted separation components for one observed (s, mu) pair.
#[derive(Debug, Clone, Copy)]
pub(crate) struct TruePoint {
    pub sperp: f64,
    pub spar: f64,
    pub s: f64,
    pub mu: f64,
}

/// Map an observed (s, mu) pair to true separation space.
///
/// The mu = +/-1 boundary is handled by the sqrt(1 - mu^2) factor vanishing;
/// s > 0 is guaranteed by construction (separation bins are positive), so
/// the division by the true separation is always defined.
pub(crate) fn true_point(s: f64, mu: f64, alphas: AlphaPair) -> TruePoint {
    let sperp = s * (1.0 - mu * mu).max(0.0).sqrt() * alphas.perp;
    let spar = s * mu * alphas.para;
    let true_s = (spar * spar + sperp * sperp).sqrt();
    TruePoint {
        sperp,
        spar,
        s: true_s,
        mu: spar / true_s,
    }
}

/// Read-only inputs shared by the variant evaluators for one proposal.
pub(crate) struct TheoryContext<'a> {
    /// Profiles rebuilt on the rescaled radius axis for this proposal.
    pub profiles: &'a ProfileSet,
    /// fs8 divided by the fiducial sigma8(z_eff).
    pub scaled_fs8: f64,
    /// Dispersion amplitude, already scaled by alpha_para (km/s).
    pub sigma_v: f64,
    pub alphas: AlphaPair,
    /// Inverse comoving Hubble distance at the effective redshift.
    pub iah: f64,
    pub basis: &'a MultipoleBasis,
}

/// Scalars and switches for model construction not tied to input files.
#[derive(Debug, Clone, Copy)]
pub struct ModelOptions {
    pub window: FittingWindow,
    /// Monopole + quadrupole (true) or quadrupole only.
    pub full_fit: bool,
    /// sigma8 scaled to the effective redshift.
    pub s8norm: f64,
    /// Inverse comoving Hubble distance at the effective redshift.
    pub iah: f64,
    /// Mock realizations behind the covariance estimate.
    pub nmocks: usize,
    /// Dense-grid density for the multipole projection.
    pub mu_points: usize,
}

/// The theoretical model plus the observed data it is fitted against.
#[derive(Debug)]
pub struct RsdModel {
    variant: ModelVariant,
    profiles: ProfileSet,
    /// Observed separation bins inside the fitting window.
    s_grid: Vec<f64>,
    /// Observed angle-cosine axis.
    mu_grid: Vec<f64>,
    /// Observed moment vector (concatenated or quadrupole-only).
    data_vec: DVector<f64>,
    cov: Covariance,
    basis: MultipoleBasis,
    full_fit: bool,
    s8norm: f64,
    iah: f64,
    nmocks: usize,
}

impl RsdModel {
    /// Load every input named by the CLI configuration and assemble the model.
    pub fn from_config(cfg: &FitConfig) -> Result<Self, AppError> {
        let cosmo = Cosmology::new(cfg.om_m, cfg.s8);

        let xi_r = load_profile(&cfg.xi_r_path)?;
        let delta_r = load_profile(&cfg.delta_r_path)?;
        let big_delta_r = integrated_contrast(&delta_r)?;

        let sv = if cfg.variant.needs_dispersion() {
            let path = cfg.sv_r_path.as_ref().ok_or_else(|| {
                AppError::input(format!(
                    "Model '{}' requires --sv-r.",
                    cfg.variant.display_name()
                ))
            })?;
            let mode = if cfg.uniform_sv {
                DispersionMode::Uniform
            } else {
                DispersionMode::Measured
            };
            Some(load_dispersion_profile(path, mode)?)
        } else {
            None
        };

        let (vr, dvr) = if cfg.variant.needs_velocity() {
            let path = cfg.vr_r_path.as_ref().ok_or_else(|| {
                AppError::input(format!(
                    "Model '{}' requires --vr-r.",
                    cfg.variant.display_name()
                ))
            })?;
            let (vr, dvr) = load_velocity_profiles(path)?;
            (Some(vr), Some(dvr))
        } else {
            (None, None)
        };

        let profiles = ProfileSet {
            xi_r,
            delta_r,
            big_delta_r,
            sv,
            vr,
            dvr,
        };

        let grid = read_corr_file(&cfg.xi_smu_path)?;
        let cov = Covariance::load(&cfg.covmat_path)?;

        Self::new(
            cfg.variant,
            profiles,
            &grid,
            cov,
            ModelOptions {
                window: cfg.window,
                full_fit: cfg.full_fit,
                s8norm: cosmo.s8norm(cfg.eff_z),
                iah: cosmo.inv_ahubble(cfg.eff_z),
                nmocks: cfg.nmocks,
                mu_points: cfg.mu_points,
            },
        )
    }

    /// Assemble a model from already-loaded parts.
    pub fn new(
        variant: ModelVariant,
        profiles: ProfileSet,
        grid: &CorrelationGrid,
        cov: Covariance,
        opts: ModelOptions,
    ) -> Result<Self, AppError> {
        if variant.needs_dispersion() && profiles.sv.is_none() {
            return Err(AppError::input("Missing dispersion profile for this model variant."));
        }
        if variant.needs_velocity() && (profiles.vr.is_none() || profiles.dvr.is_none()) {
            return Err(AppError::input("Missing velocity profile for this model variant."));
        }
        if opts.nmocks < 2 {
            return Err(AppError::input("nmocks must be at least 2."));
        }
        if !(opts.s8norm.is_finite() && opts.s8norm > 0.0) {
            return Err(AppError::input("s8norm must be positive."));
        }

        let basis = MultipoleBasis::new(opts.mu_points);
        let (mono, quad) = grid.multipoles(&basis)?;

        // Restrict measured vectors to the fitting window once; everything
        // downstream sees only the windowed bins.
        let mut s_grid = Vec::new();
        let mut mono_w = Vec::new();
        let mut quad_w = Vec::new();
        for (i, &s) in grid.s().iter().enumerate() {
            if opts.window.contains(s) {
                s_grid.push(s);
                mono_w.push(mono[i]);
                quad_w.push(quad[i]);
            }
        }
        if s_grid.is_empty() {
            return Err(AppError::data(format!(
                "No separation bins inside the fitting window [{}, {}].",
                opts.window.smin, opts.window.smax
            )));
        }
        if s_grid[0] <= 0.0 {
            return Err(AppError::data("Separation bins must be strictly positive."));
        }

        let data_vec = if opts.full_fit {
            DVector::from_iterator(2 * s_grid.len(), mono_w.into_iter().chain(quad_w))
        } else {
            DVector::from_vec(quad_w)
        };

        if cov.dim() != data_vec.len() {
            return Err(AppError::data(format!(
                "Covariance dimension {} does not match the data vector length {}.",
                cov.dim(),
                data_vec.len()
            )));
        }

        Ok(Self {
            variant,
            profiles,
            s_grid,
            mu_grid: grid.mu().to_vec(),
            data_vec,
            cov,
            basis,
            full_fit: opts.full_fit,
            s8norm: opts.s8norm,
            iah: opts.iah,
            nmocks: opts.nmocks,
        })
    }

    pub fn variant(&self) -> ModelVariant {
        self.variant
    }

    /// Windowed separation bins the model predicts on.
    pub fn s_grid(&self) -> &[f64] {
        &self.s_grid
    }

    /// Observed moment vector the likelihood compares against.
    pub fn data_vector(&self) -> &DVector<f64> {
        &self.data_vec
    }

    /// Evaluate the theory multipoles for one parameter vector.
    ///
    /// Returns the (monopole, quadrupole) vectors on [`Self::s_grid`].
    pub fn theory(&self, theta: &[f64]) -> Result<(Vec<f64>, Vec<f64>), AppError> {
        if theta.len() != self.variant.ndim() {
            return Err(AppError::data(format!(
                "Model '{}' expects {} parameters, got {}.",
                self.variant.display_name(),
                self.variant.ndim(),
                theta.len()
            )));
        }

        let fs8 = theta[0];
        let (sigma_v, epsilon) = match self.variant {
            ModelVariant::Streaming | ModelVariant::Infall => (theta[1], theta[2]),
            ModelVariant::Kaiser => (0.0, theta[1]),
        };

        let alphas = AlphaPair::from_epsilon(epsilon);
        let rescaled = rescale::rescale_profiles(&self.profiles, alphas)?;

        let ctx = TheoryContext {
            profiles: &rescaled,
            scaled_fs8: fs8 / self.s8norm,
            sigma_v: alphas.para * sigma_v,
            alphas,
            iah: self.iah,
            basis: &self.basis,
        };

        match self.variant {
            ModelVariant::Streaming => streaming::predict(&ctx, &self.s_grid, &self.mu_grid),
            ModelVariant::Kaiser => kaiser::predict(&ctx, &self.s_grid, &self.mu_grid),
            ModelVariant::Infall => infall::predict(&ctx, &self.s_grid, &self.mu_grid),
        }
    }

    pub(crate) fn cov(&self) -> &Covariance {
        &self.cov
    }

    pub(crate) fn full_fit(&self) -> bool {
        self.full_fit
    }

    pub(crate) fn nmocks(&self) -> usize {
        self.nmocks
    }
}
