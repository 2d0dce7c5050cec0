//! The full fit pipeline: model construction -> sampling -> summary.
//!
//! Kept separate from CLI handling so the workflow is reusable from tests
//! without spawning processes.

use crate::domain::FitConfig;
use crate::error::AppError;
use crate::model::RsdModel;
use crate::report::{summarize_chain, FitSummary};
use crate::sampler::backend::{read_chain, resume_state, ChainStore};
use crate::sampler::{init_ensemble, run, Ensemble, RunStats, SamplerOptions};

/// All computed outputs of a single fit run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub summary: FitSummary,
    pub stats: RunStats,
}

/// Execute the full fitting pipeline and return the computed outputs.
pub fn run_fit(config: &FitConfig) -> Result<RunOutput, AppError> {
    let model = RsdModel::from_config(config)?;
    run_fit_with_model(config, &model)
}

/// Execute the pipeline with an already-constructed model.
///
/// The log-probability closure captures the model by immutable reference;
/// the model is never mutated after construction, so sampler workers can
/// evaluate it concurrently.
pub fn run_fit_with_model(config: &FitConfig, model: &RsdModel) -> Result<RunOutput, AppError> {
    let log_prob = |theta: &[f64]| model.log_probability(theta);
    let names = config.variant.param_names();

    // Resume from the chain store when asked and possible, otherwise start a
    // fresh ensemble around the reference point.
    let (mut store, ensemble) = if config.resume {
        match resume_state(&config.backend_path, config.walkers)? {
            Some(state) => (
                ChainStore::open_append(&config.backend_path)?,
                Ensemble {
                    positions: state.positions,
                    log_probs: state.log_probs,
                    next_iteration: state.last_iteration + 1,
                },
            ),
            None => fresh_ensemble(config, &log_prob)?,
        }
    } else {
        fresh_ensemble(config, &log_prob)?
    };

    let opts = SamplerOptions {
        iterations: config.iterations,
        seed: config.seed,
    };
    let (_, stats) = run(&log_prob, ensemble, &opts, &mut store)?;

    let records = read_chain(&config.backend_path)?;
    let summary = summarize_chain(
        &records,
        names,
        config.burn_in,
        config.variant.display_name(),
        stats.acceptance_fraction(),
    )?;

    Ok(RunOutput { summary, stats })
}

fn fresh_ensemble<F>(config: &FitConfig, log_prob: &F) -> Result<(ChainStore, Ensemble), AppError>
where
    F: Fn(&[f64]) -> f64 + Sync,
{
    let store = ChainStore::create(&config.backend_path, config.variant.param_names())?;
    let ensemble = init_ensemble(
        log_prob,
        &config.variant.start_params(),
        &config.variant.init_scales(),
        config.walkers,
        config.seed,
    )?;
    Ok((store, ensemble))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FittingWindow, ModelVariant};
    use crate::math::integrate::linspace;
    use crate::sampler::backend::read_chain;
    use std::fmt::Write as _;
    use std::path::{Path, PathBuf};

    fn write_profile(dir: &Path, name: &str, f: impl Fn(f64) -> f64) -> PathBuf {
        let mut text = String::new();
        for i in 1..=60 {
            let r = 2.0 * i as f64;
            writeln!(text, "{r} {} 0.0", f(r)).unwrap();
        }
        let path = dir.join(name);
        std::fs::write(&path, text).unwrap();
        path
    }

    fn write_corr_grid(dir: &Path, s: &[f64], mu: &[f64]) -> PathBuf {
        // mu outer, s inner, value in the second-to-last column.
        let mut text = String::new();
        for &m in mu {
            for &si in s {
                let xi = -0.5 * (-si / 30.0).exp() * (1.0 + 0.1 * m * m);
                writeln!(text, "{si} {m} {xi} 0.0").unwrap();
            }
        }
        let path = dir.join("xi_smu.txt");
        std::fs::write(&path, text).unwrap();
        path
    }

    fn write_identity_cov(dir: &Path, dim: usize) -> PathBuf {
        let mut text = String::new();
        for i in 0..dim {
            let row: Vec<String> = (0..dim)
                .map(|j| if i == j { "1e-4".to_string() } else { "0.0".to_string() })
                .collect();
            writeln!(text, "{}", row.join(" ")).unwrap();
        }
        let path = dir.join("cov.txt");
        std::fs::write(&path, text).unwrap();
        path
    }

    fn kaiser_config(dir: &Path) -> FitConfig {
        let s: Vec<f64> = vec![10.0, 20.0, 30.0, 40.0];
        let mu = linspace(-1.0, 1.0, 40);
        FitConfig {
            variant: ModelVariant::Kaiser,
            xi_smu_path: write_corr_grid(dir, &s, &mu),
            xi_r_path: write_profile(dir, "xi_r.txt", |r| -0.8 * (-r / 30.0).exp()),
            delta_r_path: write_profile(dir, "delta_r.txt", |r| -0.6 * (-(r / 25.0).powi(2)).exp()),
            sv_r_path: None,
            vr_r_path: None,
            covmat_path: write_identity_cov(dir, 2 * s.len()),
            window: FittingWindow { smin: 5.0, smax: 60.0 },
            full_fit: true,
            uniform_sv: false,
            om_m: 0.285,
            s8: 0.828,
            eff_z: 0.57,
            nmocks: 300,
            mu_points: 200,
            walkers: 8,
            iterations: 20,
            burn_in: 5,
            seed: 1,
            threads: None,
            backend_path: dir.join("chain.csv"),
            resume: false,
            export_summary: None,
        }
    }

    #[test]
    fn kaiser_fit_runs_end_to_end() {
        let dir = tempfile::tempdir().unwrap();
        let config = kaiser_config(dir.path());

        let output = run_fit(&config).unwrap();
        assert_eq!(output.summary.params.len(), 2);
        assert_eq!(output.summary.params[0].name, "fs8");
        assert_eq!(output.summary.params[1].name, "epsilon");
        assert!(output.summary.samples_used > 0);
        assert!(output.summary.best_log_prob.is_finite());
        assert_eq!(output.stats.iterations_run, 20);

        let records = read_chain(&config.backend_path).unwrap();
        assert_eq!(records.len(), 20 * config.walkers);
        // Every recorded sample sits inside the prior support.
        for r in &records {
            assert!(r.theta[0] > 0.1 && r.theta[0] < 2.0);
            assert!(r.theta[1] > 0.8 && r.theta[1] < 1.2);
        }
    }

    #[test]
    fn resumed_fit_extends_the_chain() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = kaiser_config(dir.path());
        run_fit(&config).unwrap();

        config.resume = true;
        config.iterations = 5;
        let output = run_fit(&config).unwrap();
        assert_eq!(output.stats.iterations_run, 5);

        let records = read_chain(&config.backend_path).unwrap();
        assert_eq!(records.iter().map(|r| r.iteration).max(), Some(24));
        assert_eq!(records.len(), 25 * config.walkers);
    }

    #[test]
    fn streaming_without_dispersion_profile_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = kaiser_config(dir.path());
        config.variant = ModelVariant::Streaming;
        let err = run_fit(&config).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}
