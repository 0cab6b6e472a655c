//! CLI module for the plan checker.
//!
//! This module provides the command-line interface for inspecting plans and
//! checking recorded runs against them.

mod commands;
mod output;

pub use commands::{Cli, Commands};
pub use output::OutputFormatter;
