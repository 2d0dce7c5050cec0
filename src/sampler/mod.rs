//! Affine-invariant ensemble sampler (Goodman-Weare stretch move).
//!
//! This is a purpose-built driver for the void-galaxy fit, not a general
//! sampling framework: it needs only the two pure functions the model
//! exposes (`log_prior`/`log_likelihood` combined into a log-probability
//! closure) and never inspects the model itself.
//!
//! Each iteration updates the ensemble in two half-steps (red-black): every
//! walker in one half proposes against a random partner from the other
//! half, so all proposals of a half-step are independent and their
//! log-probabilities are evaluated in parallel with rayon. Random draws are
//! made sequentially from one seeded generator before the parallel
//! evaluation, so runs are reproducible for a fixed seed regardless of
//! thread scheduling.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;
use rayon::prelude::*;

use crate::error::AppError;

pub mod backend;

use backend::ChainStore;

/// Stretch-move scale parameter; 2.0 is the standard choice.
const STRETCH_SCALE: f64 = 2.0;

/// Sampler run settings.
#[derive(Debug, Clone, Copy)]
pub struct SamplerOptions {
    pub iterations: usize,
    pub seed: u64,
}

/// The walker ensemble at one iteration.
#[derive(Debug, Clone)]
pub struct Ensemble {
    pub positions: Vec<Vec<f64>>,
    pub log_probs: Vec<f64>,
    /// Iteration index the next step will be recorded as.
    pub next_iteration: usize,
}

/// Statistics of a completed run.
#[derive(Debug, Clone, Copy)]
pub struct RunStats {
    pub iterations_run: usize,
    pub accepted: usize,
    pub proposed: usize,
}

impl RunStats {
    pub fn acceptance_fraction(&self) -> f64 {
        if self.proposed == 0 {
            0.0
        } else {
            self.accepted as f64 / self.proposed as f64
        }
    }
}

/// Initialize walkers as a Gaussian ball around `start`.
///
/// Matches the usual ensemble initialization: `start + 1e-2 * N(0,1) * scale`
/// per dimension. Initial log-probabilities are evaluated in parallel.
pub fn init_ensemble<F>(
    log_prob: &F,
    start: &[f64],
    scales: &[f64],
    walkers: usize,
    seed: u64,
) -> Result<Ensemble, AppError>
where
    F: Fn(&[f64]) -> f64 + Sync,
{
    let ndim = start.len();
    validate_ensemble_shape(walkers, ndim)?;

    let mut rng = StdRng::seed_from_u64(seed);
    let normal = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::new(4, format!("Walker init distribution error: {e}")))?;

    let positions: Vec<Vec<f64>> = (0..walkers)
        .map(|_| {
            start
                .iter()
                .zip(scales.iter())
                .map(|(&p, &s)| p + 1e-2 * normal.sample(&mut rng) * s)
                .collect()
        })
        .collect();

    let log_probs: Vec<f64> = positions.par_iter().map(|p| log_prob(p)).collect();
    if log_probs.iter().all(|lp| !lp.is_finite()) {
        return Err(AppError::new(
            4,
            "Every initial walker has zero probability; check starting point and priors.",
        ));
    }

    Ok(Ensemble {
        positions,
        log_probs,
        next_iteration: 0,
    })
}

/// Run the sampler, appending each completed iteration to the chain store.
pub fn run<F>(
    log_prob: &F,
    mut ensemble: Ensemble,
    opts: &SamplerOptions,
    store: &mut ChainStore,
) -> Result<(Ensemble, RunStats), AppError>
where
    F: Fn(&[f64]) -> f64 + Sync,
{
    let walkers = ensemble.positions.len();
    let ndim = ensemble.positions[0].len();
    validate_ensemble_shape(walkers, ndim)?;

    // Offset the RNG stream from the init seed so resumed runs do not replay
    // the initialization draws.
    let mut rng = StdRng::seed_from_u64(opts.seed.wrapping_add(ensemble.next_iteration as u64));

    let mut stats = RunStats {
        iterations_run: 0,
        accepted: 0,
        proposed: 0,
    };

    let half = walkers / 2;
    for step in 0..opts.iterations {
        let iteration = ensemble.next_iteration + step;

        for (lo, hi, other_lo, other_hi) in [(0, half, half, walkers), (half, walkers, 0, half)] {
            // Draw everything sequentially for determinism.
            let draws: Vec<(usize, f64, f64)> = (lo..hi)
                .map(|_| {
                    let partner = rng.gen_range(other_lo..other_hi);
                    let u: f64 = rng.r#gen();
                    let z = ((STRETCH_SCALE - 1.0) * u + 1.0).powi(2) / STRETCH_SCALE;
                    let accept_u: f64 = rng.r#gen();
                    (partner, z, accept_u)
                })
                .collect();

            let proposals: Vec<Vec<f64>> = (lo..hi)
                .zip(draws.iter())
                .map(|(k, &(partner, z, _))| {
                    let xk = &ensemble.positions[k];
                    let xj = &ensemble.positions[partner];
                    xk.iter()
                        .zip(xj.iter())
                        .map(|(&a, &b)| b + z * (a - b))
                        .collect()
                })
                .collect();

            // The expensive part: model evaluations, in parallel.
            let new_log_probs: Vec<f64> = proposals.par_iter().map(|p| log_prob(p)).collect();

            for ((k, proposal), (lp_new, &(_, z, accept_u))) in (lo..hi)
                .zip(proposals)
                .zip(new_log_probs.into_iter().zip(draws.iter()))
            {
                stats.proposed += 1;
                let ln_ratio =
                    (ndim as f64 - 1.0) * z.ln() + lp_new - ensemble.log_probs[k];
                if lp_new.is_finite() && accept_u.ln() < ln_ratio {
                    ensemble.positions[k] = proposal;
                    ensemble.log_probs[k] = lp_new;
                    stats.accepted += 1;
                }
            }
        }

        store.append_iteration(iteration, &ensemble.positions, &ensemble.log_probs)?;
        stats.iterations_run += 1;
    }

    ensemble.next_iteration += opts.iterations;
    Ok((ensemble, stats))
}

fn validate_ensemble_shape(walkers: usize, ndim: usize) -> Result<(), AppError> {
    if ndim == 0 {
        return Err(AppError::input("Sampler needs at least one parameter."));
    }
    if walkers < 2 * ndim || walkers % 2 != 0 {
        return Err(AppError::input(format!(
            "Walker count must be even and at least {} for {ndim} parameters, got {walkers}.",
            2 * ndim
        )));
    }
    Ok(())
}
