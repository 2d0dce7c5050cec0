//! Shared domain types.
//!
//! These types are intentionally lightweight: they are built once from CLI
//! flags, then read concurrently by the model evaluator and the sampler.

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Physical prescription used to predict the redshift-space correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelVariant {
    /// Gaussian streaming model with a velocity-dispersion profile.
    Streaming,
    /// Linear (Kaiser-like) closed-form model, no dispersion.
    Kaiser,
    /// Streaming model with a coherent radial infall velocity profile.
    Infall,
}

impl ModelVariant {
    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelVariant::Streaming => "streaming + dispersion",
            ModelVariant::Kaiser => "linear (Kaiser)",
            ModelVariant::Infall => "streaming + coherent infall",
        }
    }

    /// Number of free parameters sampled for this variant.
    pub fn ndim(self) -> usize {
        match self {
            ModelVariant::Streaming | ModelVariant::Infall => 3,
            ModelVariant::Kaiser => 2,
        }
    }

    /// Whether the variant reads a velocity-dispersion profile.
    pub fn needs_dispersion(self) -> bool {
        matches!(self, ModelVariant::Streaming | ModelVariant::Infall)
    }

    /// Whether the variant reads a radial-velocity profile.
    pub fn needs_velocity(self) -> bool {
        matches!(self, ModelVariant::Infall)
    }

    /// Parameter names in sampling order.
    pub fn param_names(self) -> &'static [&'static str] {
        match self {
            ModelVariant::Streaming | ModelVariant::Infall => &["fs8", "sigma_v", "epsilon"],
            ModelVariant::Kaiser => &["fs8", "epsilon"],
        }
    }

    /// Flat-prior support per parameter, in sampling order.
    pub fn prior_bounds(self) -> &'static [(f64, f64)] {
        match self {
            ModelVariant::Streaming | ModelVariant::Infall => {
                &[(0.1, 2.0), (1.0, 500.0), (0.8, 1.2)]
            }
            ModelVariant::Kaiser => &[(0.1, 2.0), (0.8, 1.2)],
        }
    }

    /// Reference starting point for walker initialization.
    pub fn start_params(self) -> Vec<f64> {
        match self {
            ModelVariant::Streaming | ModelVariant::Infall => vec![0.472, 360.0, 1.0],
            ModelVariant::Kaiser => vec![0.472, 1.0],
        }
    }

    /// Per-parameter scales for the initial walker jitter.
    pub fn init_scales(self) -> Vec<f64> {
        match self {
            ModelVariant::Streaming | ModelVariant::Infall => vec![1.0, 1000.0, 1.0],
            ModelVariant::Kaiser => vec![1.0, 1.0],
        }
    }
}

/// Separation window applied once at model construction.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FittingWindow {
    pub smin: f64,
    pub smax: f64,
}

impl FittingWindow {
    pub fn contains(&self, s: f64) -> bool {
        s >= self.smin && s <= self.smax
    }
}

/// A full run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct FitConfig {
    pub variant: ModelVariant,

    pub xi_smu_path: PathBuf,
    pub xi_r_path: PathBuf,
    pub delta_r_path: PathBuf,
    pub sv_r_path: Option<PathBuf>,
    pub vr_r_path: Option<PathBuf>,
    pub covmat_path: PathBuf,

    pub window: FittingWindow,
    /// Fit monopole + quadrupole (true) or quadrupole only (false).
    pub full_fit: bool,
    /// Replace the measured dispersion profile with a constant 1.0.
    pub uniform_sv: bool,

    /// Matter density of the fiducial cosmology.
    pub om_m: f64,
    /// Fiducial sigma8.
    pub s8: f64,
    /// Effective redshift of the void sample.
    pub eff_z: f64,
    /// Number of mock realizations behind the covariance estimate.
    pub nmocks: usize,

    /// Dense-grid density for the multipole projection.
    pub mu_points: usize,

    pub walkers: usize,
    pub iterations: usize,
    /// Iterations discarded from the front of the chain when summarizing.
    pub burn_in: usize,
    pub seed: u64,

    /// Worker threads for parallel likelihood evaluation (None = all cores).
    pub threads: Option<usize>,

    /// Chain store path (append-only CSV).
    pub backend_path: PathBuf,
    /// Continue from the last complete iteration in the chain store.
    pub resume: bool,

    /// Optional posterior-summary JSON export.
    pub export_summary: Option<PathBuf>,
}
