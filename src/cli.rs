//! CLI definitions for ShadowPilot.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// ShadowPilot CLI.
#[derive(Parser)]
#[command(name = "shadowpilot")]
#[command(about = "Shadow assistant for admin console configuration workflows")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config/default.toml", global = true, env = "SHADOWPILOT_CONFIG")]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Replay a recorded page session through the page and panel agents
    Replay {
        /// Path to the recorded session (JSON)
        session: PathBuf,

        /// Skip the backend sign-in check
        #[arg(long)]
        assume_authenticated: bool,
    },

    /// Show what the observer sees on a recorded page
    Inspect {
        /// Path to the page snapshot (JSON)
        page: PathBuf,

        /// Selector of a control to resolve a label for
        #[arg(long)]
        focus: Option<String>,
    },

    /// Validate the configuration file
    CheckConfig,
}
