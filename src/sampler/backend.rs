//! Append-only chain store.
//!
//! One CSV row per (iteration, walker) holding the parameter vector and its
//! log-probability. Rows are flushed after every iteration so an interrupted
//! fit can resume from the last complete iteration.

use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::AppError;

/// One persisted sample.
#[derive(Debug, Clone)]
pub struct ChainRecord {
    pub iteration: usize,
    pub walker: usize,
    pub theta: Vec<f64>,
    pub log_prob: f64,
}

/// Walker state recovered from an existing chain file.
#[derive(Debug, Clone)]
pub struct ResumeState {
    /// Index of the last complete iteration in the file.
    pub last_iteration: usize,
    /// Position of each walker at that iteration.
    pub positions: Vec<Vec<f64>>,
    /// Log-probability of each walker at that iteration.
    pub log_probs: Vec<f64>,
}

/// Append-only writer for chain samples.
pub struct ChainStore {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl ChainStore {
    /// Create a fresh store, truncating any existing file.
    pub fn create(path: &Path, param_names: &[&str]) -> Result<Self, AppError> {
        let file = File::create(path).map_err(|e| {
            AppError::input(format!("Failed to create chain store '{}': {e}", path.display()))
        })?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "iteration,walker,{},log_prob", param_names.join(","))
            .map_err(|e| AppError::input(format!("Failed to write chain header: {e}")))?;
        writer
            .flush()
            .map_err(|e| AppError::input(format!("Failed to flush chain store: {e}")))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer,
        })
    }

    /// Open an existing store for appending (resume).
    pub fn open_append(path: &Path) -> Result<Self, AppError> {
        let file = OpenOptions::new().append(true).open(path).map_err(|e| {
            AppError::input(format!("Failed to open chain store '{}': {e}", path.display()))
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one complete iteration and flush it to disk.
    pub fn append_iteration(
        &mut self,
        iteration: usize,
        positions: &[Vec<f64>],
        log_probs: &[f64],
    ) -> Result<(), AppError> {
        for (walker, (theta, lp)) in positions.iter().zip(log_probs.iter()).enumerate() {
            let params: Vec<String> = theta.iter().map(|v| format!("{v:.10e}")).collect();
            writeln!(self.writer, "{iteration},{walker},{},{lp:.10e}", params.join(","))
                .map_err(|e| AppError::input(format!("Failed to append chain row: {e}")))?;
        }
        self.writer
            .flush()
            .map_err(|e| AppError::input(format!("Failed to flush chain store: {e}")))
    }
}

/// Read every record of a chain file.
pub fn read_chain(path: &Path) -> Result<Vec<ChainRecord>, AppError> {
    let text = std::fs::read_to_string(path).map_err(|e| {
        AppError::input(format!("Failed to read chain store '{}': {e}", path.display()))
    })?;

    let mut records = Vec::new();
    for (lineno, line) in text.lines().enumerate().skip(1) {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() < 4 {
            return Err(AppError::data(format!(
                "Malformed chain row at {}:{}.",
                path.display(),
                lineno + 1
            )));
        }
        let parse = |s: &str| -> Result<f64, AppError> {
            s.parse().map_err(|_| {
                AppError::data(format!("Bad chain value '{s}' at {}:{}.", path.display(), lineno + 1))
            })
        };
        let iteration: usize = fields[0].parse().map_err(|_| {
            AppError::data(format!("Bad iteration at {}:{}.", path.display(), lineno + 1))
        })?;
        let walker: usize = fields[1].parse().map_err(|_| {
            AppError::data(format!("Bad walker index at {}:{}.", path.display(), lineno + 1))
        })?;
        let theta = fields[2..fields.len() - 1]
            .iter()
            .map(|s| parse(s))
            .collect::<Result<Vec<f64>, _>>()?;
        let log_prob = parse(fields[fields.len() - 1])?;

        records.push(ChainRecord {
            iteration,
            walker,
            theta,
            log_prob,
        });
    }
    Ok(records)
}

/// Recover the walker ensemble at the last complete iteration, if any.
pub fn resume_state(path: &Path, walkers: usize) -> Result<Option<ResumeState>, AppError> {
    if !path.is_file() {
        return Ok(None);
    }
    let records = read_chain(path)?;
    let Some(last_iteration) = records.iter().map(|r| r.iteration).max() else {
        return Ok(None);
    };

    let last: Vec<&ChainRecord> = records
        .iter()
        .filter(|r| r.iteration == last_iteration)
        .collect();
    if last.len() != walkers {
        return Err(AppError::data(format!(
            "Chain store '{}' holds {} walkers at iteration {last_iteration}, expected {walkers}.",
            path.display(),
            last.len()
        )));
    }

    let mut positions = vec![Vec::new(); walkers];
    let mut log_probs = vec![0.0; walkers];
    for r in last {
        if r.walker >= walkers {
            return Err(AppError::data(format!(
                "Chain store '{}' names walker {} out of {walkers}.",
                path.display(),
                r.walker
            )));
        }
        positions[r.walker] = r.theta.clone();
        log_probs[r.walker] = r.log_prob;
    }

    Ok(Some(ResumeState {
        last_iteration,
        positions,
        log_probs,
    }))
}
