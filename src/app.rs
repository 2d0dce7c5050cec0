//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - builds the RSD model (loads every input once)
//! - runs the ensemble sampler
//! - prints the posterior summary and writes optional exports

use clap::Parser;

use crate::cli::Cli;
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `voidfit` binary.
pub fn run() -> Result<(), AppError> {
    let config = Cli::parse().into_config()?;

    if let Some(threads) = config.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .map_err(|e| AppError::input(format!("Failed to configure worker pool: {e}")))?;
    }

    println!("Setting up RSD model: {}.", config.variant.display_name());
    let model = crate::model::RsdModel::from_config(&config)?;
    println!(
        "Fitting {} separation bins ({}).",
        model.s_grid().len(),
        if config.full_fit {
            "monopole + quadrupole"
        } else {
            "quadrupole only"
        }
    );
    println!(
        "Running sampler: {} walkers, {} iterations, backend '{}'.",
        config.walkers,
        config.iterations,
        config.backend_path.display()
    );

    let output = pipeline::run_fit_with_model(&config, &model)?;

    println!("{}", crate::report::format_summary(&output.summary));

    if let Some(path) = &config.export_summary {
        crate::report::write_summary_json(path, &output.summary)?;
        println!("Summary written to '{}'.", path.display());
    }

    Ok(())
}
