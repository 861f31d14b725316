//! The IPL Command-Line Interface.
//!
//! This module is the main entry point for all CLI commands and orchestrates
//! the core library functions.

use crate::cli::args::{Command, IplArgs};
use crate::errors::print_error;
use crate::runtime::{eval_program, EvalState};
use crate::syntax;
use crate::test_harness::{run_all_tests, TestConfig};
use clap::Parser;
use std::error::Error;
use std::path::Path;
use std::{fs, process};

pub mod args;
pub mod output;

/// The main entry point for the CLI.
pub fn run() {
    let args = IplArgs::parse();

    // Dispatch to the appropriate subcommand handler.
    let result = match args.command {
        Command::Run { file } => handle_run(&file),
        Command::Ast { file, json } => handle_ast(&file, json),
        Command::Test { path } => handle_test(path.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn read_source(path: &Path) -> Result<(String, String), Box<dyn Error>> {
    let name = path.display().to_string();
    let source = fs::read_to_string(path)?;
    Ok((name, source))
}

/// Handles the `run` subcommand: parse, then walk the tree.
fn handle_run(path: &Path) -> Result<(), Box<dyn Error>> {
    let (name, source) = read_source(path)?;
    let root = match syntax::parse(&name, &source) {
        Ok(root) => root,
        Err(e) => {
            print_error(e);
            return Err("parse failed".into());
        }
    };
    let mut state = EvalState::new();
    if let Err(e) = eval_program(&root, &mut state) {
        print_error(e);
        return Err("evaluation failed".into());
    }
    println!("{}: ok ({} nodes)", name, state.visited());
    Ok(())
}

/// Handles the `ast` subcommand.
fn handle_ast(path: &Path, json: bool) -> Result<(), Box<dyn Error>> {
    let (name, source) = read_source(path)?;
    let root = match syntax::parse(&name, &source) {
        Ok(root) => root,
        Err(e) => {
            print_error(e);
            return Err("parse failed".into());
        }
    };
    if json {
        output::print_tree_json(&root)?;
    } else {
        output::print_tree(&root);
    }
    Ok(())
}

/// Handles the `test` subcommand.
fn handle_test(dir: Option<&Path>) -> Result<(), Box<dyn Error>> {
    let config = TestConfig::default();
    let (_passed, failed) = run_all_tests(dir, &config);
    if failed > 0 {
        return Err(format!("{} test(s) failed", failed).into());
    }
    Ok(())
}
