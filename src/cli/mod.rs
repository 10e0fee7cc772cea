//! Command line interface module
//!
//! This module provides argument parsing and the runner that wires one
//! registry check to the process: settings, state file and report output.

pub mod args;
pub mod runner;

pub use args::Args;
pub use runner::Runner;
