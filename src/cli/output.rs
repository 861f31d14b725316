//! Handles all user-facing output for the CLI.
//!
//! This module is responsible for rendering parse trees, both as the
//! human-oriented indented form and as JSON for tooling. Centralizing
//! output logic here keeps the command handlers free of formatting.

use crate::syntax::Node;

/// Prints the indented tree rendering to stdout.
pub fn print_tree(root: &Node) {
    print!("{}", root.render());
}

/// Prints the tree as pretty-printed JSON to stdout.
pub fn print_tree_json(root: &Node) -> Result<(), serde_json::Error> {
    let rendered = serde_json::to_string_pretty(root)?;
    println!("{}", rendered);
    Ok(())
}
