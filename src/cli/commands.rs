//! CLI command definitions.
//!
//! This module defines all CLI commands and their arguments using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::OutputFormat;

/// plancheck - verify deployment runs against a recorded plan.
#[derive(Parser, Debug)]
#[command(name = "plancheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the settings file (searched upward from the working
    /// directory when omitted).
    #[arg(short, long, global = true, env = "PLANCHECK_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json). Overrides the settings file.
    #[arg(long, global = true)]
    pub output: Option<OutputFormat>,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check a recorded run against a plan.
    Check {
        /// Plan document (.json, .yaml or .yml).
        #[arg(short, long)]
        plan: PathBuf,

        /// Run snapshot document (.json, .yaml or .yml).
        #[arg(short, long)]
        run: PathBuf,

        /// Fail when planned resources reference unknown resources.
        #[arg(long)]
        fail_on_unresolved: bool,
    },

    /// Show the resources and operations in a plan.
    Show {
        /// Plan document.
        #[arg(short, long)]
        plan: PathBuf,

        /// Show per-resource property constraints.
        #[arg(short, long)]
        detailed: bool,
    },

    /// Show and verify a plan's manifest.
    Manifest {
        /// Plan document.
        #[arg(short, long)]
        plan: PathBuf,
    },
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
