//! Defines the command-line arguments and subcommands for the IPL CLI.
//!
//! This module uses the `clap` crate with its "derive" feature to create a
//! declarative and type-safe argument parsing structure.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// The main CLI argument structure.
#[derive(Debug, Parser)]
#[command(
    name = "ipl",
    version,
    about = "Front end for the IPL scripting language."
)]
pub struct IplArgs {
    #[command(subcommand)]
    pub command: Command,
}

/// An enumeration of all available CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Parse a script and walk the resulting tree.
    Run {
        /// The path to the IPL script file to run.
        #[arg(required = true)]
        file: PathBuf,
    },
    /// Show the abstract syntax tree for a script.
    Ast {
        /// The path to the IPL script file to parse.
        #[arg(required = true)]
        file: PathBuf,
        /// Emit the tree as JSON instead of the indented rendering.
        #[arg(long)]
        json: bool,
    },
    /// Run the built-in parser cases, plus any *.good.ipl / *.bad.ipl
    /// files found under a directory.
    Test {
        /// Directory to search for test scripts.
        path: Option<PathBuf>,
    },
}
