//! `void-rsd` library crate.
//!
//! The binary (`voidfit`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - modules are reusable (e.g., future batch drivers, notebooks, etc.)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cli;
pub mod cosmo;
pub mod domain;
pub mod error;
pub mod io;
pub mod math;
pub mod model;
pub mod report;
pub mod sampler;
