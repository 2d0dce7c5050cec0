//! Command-line parsing for the void-galaxy RSD fitter.
//!
//! Argument parsing and defaults stay here; the modeling/math code never
//! sees clap types.

use std::path::PathBuf;

use clap::Parser;

use crate::domain::{FitConfig, FittingWindow, ModelVariant};
use crate::error::AppError;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(
    name = "voidfit",
    version,
    about = "MCMC fitter for the void-galaxy correlation function (RSD model)"
)]
pub struct Cli {
    /// Physical model variant.
    #[arg(long, value_enum, default_value_t = ModelVariant::Streaming)]
    pub model: ModelVariant,

    /// Observed redshift-space correlation table (s, mu, xi).
    #[arg(long)]
    pub xi_smu: PathBuf,

    /// Real-space correlation profile table.
    #[arg(long)]
    pub xi_r: PathBuf,

    /// Void-matter density contrast profile table.
    #[arg(long)]
    pub delta_r: PathBuf,

    /// Velocity-dispersion profile table (streaming/infall variants).
    #[arg(long)]
    pub sv_r: Option<PathBuf>,

    /// Radial-velocity profile table (infall variant).
    #[arg(long)]
    pub vr_r: Option<PathBuf>,

    /// Covariance matrix of the observed moment vector (square text table).
    #[arg(long)]
    pub covmat: PathBuf,

    /// Minimum separation of the fitting window.
    #[arg(long, default_value_t = 0.0)]
    pub smin: f64,

    /// Maximum separation of the fitting window.
    #[arg(long, default_value_t = 100.0)]
    pub smax: f64,

    /// Fit the quadrupole only (default fits monopole + quadrupole).
    #[arg(long)]
    pub quad_only: bool,

    /// Use a constant dispersion profile instead of the measured one.
    #[arg(long)]
    pub uniform_sv: bool,

    /// Matter density of the fiducial cosmology.
    #[arg(long, default_value_t = 0.285)]
    pub omega_m: f64,

    /// Fiducial sigma8.
    #[arg(long, default_value_t = 0.828)]
    pub sigma_8: f64,

    /// Effective redshift of the void sample.
    #[arg(long, default_value_t = 0.57)]
    pub eff_z: f64,

    /// Mock realizations behind the covariance estimate.
    #[arg(long, default_value_t = 300)]
    pub nmocks: usize,

    /// Dense-grid density for the multipole projection.
    #[arg(long, default_value_t = 1000)]
    pub mu_points: usize,

    /// Number of ensemble walkers (even, at least twice the parameter count).
    #[arg(long, default_value_t = 28)]
    pub walkers: usize,

    /// Number of sampler iterations.
    #[arg(long, default_value_t = 5000)]
    pub iterations: usize,

    /// Iterations discarded when summarizing the posterior.
    #[arg(long, default_value_t = 1000)]
    pub burn_in: usize,

    /// Random seed (walker init + stretch moves).
    #[arg(long, default_value_t = 42)]
    pub seed: u64,

    /// Chain store path (append-only CSV).
    #[arg(long, default_value = "chain.csv")]
    pub backend: PathBuf,

    /// Continue from the last complete iteration in the chain store.
    #[arg(long)]
    pub resume: bool,

    /// Export the posterior summary as JSON.
    #[arg(long)]
    pub export_summary: Option<PathBuf>,

    /// Rayon worker threads (defaults to the number of cores).
    #[arg(long)]
    pub threads: Option<usize>,
}

impl Cli {
    /// Validate flags and produce the pipeline configuration.
    pub fn into_config(self) -> Result<FitConfig, AppError> {
        if !(self.smin.is_finite() && self.smax.is_finite() && self.smin < self.smax) {
            return Err(AppError::input(format!(
                "Invalid fitting window [{}, {}].",
                self.smin, self.smax
            )));
        }
        if self.iterations == 0 {
            return Err(AppError::input("Iteration count must be positive."));
        }
        if !(self.omega_m > 0.0 && self.omega_m <= 1.0) {
            return Err(AppError::input(format!("Invalid omega_m {}.", self.omega_m)));
        }
        if !(self.sigma_8 > 0.0) {
            return Err(AppError::input(format!("Invalid sigma_8 {}.", self.sigma_8)));
        }
        if self.eff_z < 0.0 {
            return Err(AppError::input(format!("Invalid effective redshift {}.", self.eff_z)));
        }

        Ok(FitConfig {
            variant: self.model,
            xi_smu_path: self.xi_smu,
            xi_r_path: self.xi_r,
            delta_r_path: self.delta_r,
            sv_r_path: self.sv_r,
            vr_r_path: self.vr_r,
            covmat_path: self.covmat,
            window: FittingWindow {
                smin: self.smin,
                smax: self.smax,
            },
            full_fit: !self.quad_only,
            uniform_sv: self.uniform_sv,
            om_m: self.omega_m,
            s8: self.sigma_8,
            eff_z: self.eff_z,
            nmocks: self.nmocks,
            mu_points: self.mu_points,
            walkers: self.walkers,
            iterations: self.iterations,
            burn_in: self.burn_in,
            seed: self.seed,
            threads: self.threads,
            backend_path: self.backend,
            resume: self.resume,
            export_summary: self.export_summary,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Vec<&'static str> {
        vec![
            "voidfit",
            "--xi-smu", "xi_smu.txt",
            "--xi-r", "xi_r.txt",
            "--delta-r", "delta_r.txt",
            "--covmat", "cov.txt",
        ]
    }

    #[test]
    fn parses_defaults() {
        let cli = Cli::parse_from(base_args());
        let cfg = cli.into_config().unwrap();
        assert_eq!(cfg.variant, ModelVariant::Streaming);
        assert!(cfg.full_fit);
        assert_eq!(cfg.walkers, 28);
        assert!((cfg.om_m - 0.285).abs() < 1e-12);
    }

    #[test]
    fn quad_only_disables_full_fit() {
        let mut args = base_args();
        args.push("--quad-only");
        let cfg = Cli::parse_from(args).into_config().unwrap();
        assert!(!cfg.full_fit);
    }

    #[test]
    fn rejects_inverted_window() {
        let mut args = base_args();
        args.extend(["--smin", "80", "--smax", "20"]);
        assert!(Cli::parse_from(args).into_config().is_err());
    }
}
