//! CLI interface for Skillforge
//!
//! This module provides the command-line interface using clap's derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Skillforge skill-driven tool-calling engine
///
/// Lets a language model discover skills, load one on demand, and run the
/// code it writes in a sandbox to produce files.
#[derive(Parser, Debug)]
#[command(name = "skillforge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a full tool-calling orchestration for a message
    Run {
        /// The user message
        message: String,
    },

    /// Ask the model once, without tools
    Chat {
        /// The user message
        message: String,
    },

    /// Execute a code file in the sandbox
    Exec {
        /// File containing the code
        file: PathBuf,

        /// Time limit in seconds (defaults to sandbox.timeout_secs)
        #[arg(short, long)]
        timeout: Option<u64>,
    },

    /// Manage skills
    Skill {
        #[command(subcommand)]
        action: SkillAction,
    },

    /// Run system diagnostics
    Doctor,
}

/// Skill management actions
#[derive(Subcommand, Debug)]
pub enum SkillAction {
    /// List installed skills with their source
    List,

    /// Show the catalog exactly as the model sees it
    Catalog,

    /// Print a skill's full content
    Show {
        /// Skill name
        name: String,
    },

    /// Install a skill document (.md)
    Add {
        /// Path to the document
        file: PathBuf,

        /// Name to install under (defaults to the file stem)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Remove an installed skill
    Remove {
        /// Skill name
        name: String,
    },
}
