//! CLI module - Command-line interface for snapshop
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub use commands::{cmd_clear, cmd_detect, cmd_list, cmd_search};

/// snapshop - photograph a product, get links to buy it
#[derive(Parser)]
#[command(name = "snapshop")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server (default)
    #[command(alias = "daemon", alias = "web")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// Identify the product in an image file
    #[command(alias = "d")]
    Detect {
        /// Path to the image
        image: PathBuf,
    },

    /// Look up purchase links for a product label
    #[command(alias = "s")]
    Search {
        /// Product label
        #[arg(required = true)]
        label: Vec<String>,
    },

    /// Show the stored results
    #[command(alias = "ls", alias = "l")]
    List,

    /// Delete all stored results
    Clear,
}

impl Commands {
    /// Whether the command needs a log subscriber writing to stdout.
    #[must_use]
    pub const fn is_server(&self) -> bool {
        matches!(self, Self::Serve)
    }
}
