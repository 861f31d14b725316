//! IPL Runtime Scaffolding
//!
//! A deliberately thin evaluation layer: it demonstrates how a consumer
//! walks the parse tree (exhaustive dispatch on the node kind, lexical
//! scope tracking) without implementing language semantics. The parser
//! stays useful on its own; this module is the consumption contract.

pub mod eval;

pub use eval::{eval_program, EvalState};

use miette::Diagnostic;
use thiserror::Error;

/// Failure while walking a parse tree. The stub evaluator only produces
/// these for structurally unusable input, never for language semantics.
#[derive(Debug, Error, Diagnostic)]
#[error("runtime error: {message}")]
#[diagnostic(code(ipl::runtime::walk))]
pub struct RuntimeError {
    pub message: String,
    #[label("while evaluating this")]
    pub span: miette::SourceSpan,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>, span: miette::SourceSpan) -> Self {
        RuntimeError {
            message: message.into(),
            span,
        }
    }
}
