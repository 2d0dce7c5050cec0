//! Posterior reporting: chain summaries and formatted terminal output.
//!
//! Formatting lives in one place so the sampler and model code stay clean
//! and testable.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::sampler::backend::ChainRecord;

/// Marginal posterior summary for one parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSummary {
    pub name: String,
    pub median: f64,
    /// 16th percentile.
    pub p16: f64,
    /// 84th percentile.
    pub p84: f64,
}

/// Posterior summary for a completed (or resumed) run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FitSummary {
    pub model: String,
    pub params: Vec<ParamSummary>,
    pub samples_used: usize,
    pub burn_in: usize,
    pub acceptance_fraction: f64,
    pub best_log_prob: f64,
}

/// Summarize a chain, discarding iterations below `burn_in`.
pub fn summarize_chain(
    records: &[ChainRecord],
    param_names: &[&str],
    burn_in: usize,
    model: &str,
    acceptance_fraction: f64,
) -> Result<FitSummary, AppError> {
    let kept: Vec<&ChainRecord> = records
        .iter()
        .filter(|r| r.iteration >= burn_in && r.log_prob.is_finite())
        .collect();
    if kept.is_empty() {
        return Err(AppError::data(
            "No finite chain samples after burn-in; nothing to summarize.",
        ));
    }

    let mut params = Vec::with_capacity(param_names.len());
    for (i, name) in param_names.iter().enumerate() {
        let mut values: Vec<f64> = kept
            .iter()
            .map(|r| {
                r.theta.get(i).copied().ok_or_else(|| {
                    AppError::data(format!("Chain rows are missing parameter '{name}'."))
                })
            })
            .collect::<Result<_, _>>()?;
        values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        params.push(ParamSummary {
            name: (*name).to_string(),
            median: percentile(&values, 0.50),
            p16: percentile(&values, 0.16),
            p84: percentile(&values, 0.84),
        });
    }

    let best_log_prob = kept
        .iter()
        .map(|r| r.log_prob)
        .fold(f64::NEG_INFINITY, f64::max);

    Ok(FitSummary {
        model: model.to_string(),
        params,
        samples_used: kept.len(),
        burn_in,
        acceptance_fraction,
        best_log_prob,
    })
}

/// Linear-interpolated percentile of sorted values, q in [0, 1].
fn percentile(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let pos = q * (n as f64 - 1.0);
    let lo = pos.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = pos - lo as f64;
    sorted[lo] * (1.0 - frac) + sorted[hi] * frac
}

/// Format the run summary for the terminal.
pub fn format_summary(summary: &FitSummary) -> String {
    let mut out = String::new();
    out.push_str("=== voidfit - void-galaxy RSD fit ===\n");
    out.push_str(&format!("Model: {}\n", summary.model));
    out.push_str(&format!(
        "Samples: {} (burn-in {} iterations discarded)\n",
        summary.samples_used, summary.burn_in
    ));
    out.push_str(&format!(
        "Acceptance fraction: {:.3}\n",
        summary.acceptance_fraction
    ));
    out.push_str(&format!("Best log-probability: {:.4}\n", summary.best_log_prob));
    out.push_str("Posterior (median, +84th / -16th percentile):\n");
    for p in &summary.params {
        out.push_str(&format!(
            "  {:<8} = {:.4}  (+{:.4} / -{:.4})\n",
            p.name,
            p.median,
            p.p84 - p.median,
            p.median - p.p16
        ));
    }
    out
}

/// Export the summary as JSON.
pub fn write_summary_json(path: &Path, summary: &FitSummary) -> Result<(), AppError> {
    let json = serde_json::to_string_pretty(summary)
        .map_err(|e| AppError::input(format!("Failed to serialize summary: {e}")))?;
    std::fs::write(path, json).map_err(|e| {
        AppError::input(format!("Failed to write summary '{}': {e}", path.display()))
    })
}
