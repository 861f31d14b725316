//! IPL: a front end for a small statically-typed, class-based scripting
//! language. The parser turns source text into a uniform tree and reports
//! how far it got on failure; the runtime module demonstrates how a
//! consumer walks the result.

pub use crate::errors::{print_error, ParseError, SourceContext};
pub use crate::runtime::{eval_program, EvalState, RuntimeError};
pub use crate::syntax::{parse, Node, NodeKind, Outcome, Parser, Position, Span};

pub mod cli;
pub mod errors;
pub mod runtime;
pub mod syntax;
pub mod test_harness;
