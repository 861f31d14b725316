//! IPL Error Handling
//!
//! A parse failure is reported as a single diagnostic carrying both
//! high-water marks of the failed attempt: where the last fully-parsed
//! top-level statement ended, and the deepest position any rule attempt
//! reached. Rule-level failure inside the parser is ordinary control flow;
//! only the public entry points construct one of these.

use std::fmt;
use std::sync::Arc;

use miette::{Diagnostic, LabeledSpan, NamedSource, SourceSpan};
use thiserror::Error;

use crate::syntax::{Parser, Position, Span};

// ============================================================================
// SOURCE CONTEXT - Error reporting infrastructure
// ============================================================================

/// Named source text handed to diagnostics, preferring real file content
/// over fallbacks.
#[derive(Debug, Clone)]
pub struct SourceContext {
    pub name: String,
    pub content: String,
}

impl SourceContext {
    /// Create a source context from real file content.
    pub fn from_file(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }

    /// Create a fallback when real source is unavailable.
    pub fn fallback(context: &str) -> Self {
        Self {
            name: "fallback".to_string(),
            content: format!("# {}", context),
        }
    }

    /// Convert to NamedSource for use with miette error reporting.
    pub fn to_named_source(&self) -> Arc<NamedSource<String>> {
        Arc::new(NamedSource::new(self.name.clone(), self.content.clone()))
    }
}

impl Default for SourceContext {
    fn default() -> Self {
        Self::fallback("default context")
    }
}

// ============================================================================
// PARSE ERROR
// ============================================================================

/// The parse failure diagnostic. Both marks are in source order:
/// `complete` never lies past `attempt`.
#[derive(Debug, Error)]
#[error("syntax error in {name}: complete statements end at {complete}, parsing stopped at {attempt}")]
pub struct ParseError {
    name: String,
    named: Arc<NamedSource<String>>,
    /// End of the last fully-parsed top-level statement.
    pub complete: Position,
    /// Deepest position any rule attempt reached.
    pub attempt: Position,
    source_len: usize,
}

impl ParseError {
    pub fn new(context: SourceContext, parser: &Parser) -> Self {
        ParseError {
            name: context.name.clone(),
            named: context.to_named_source(),
            complete: parser.complete_mark(),
            attempt: parser.high_water(),
            source_len: parser.len(),
        }
    }

    /// 1-based line of the deepest attempt, the position a user most wants.
    pub fn line(&self) -> u32 {
        self.attempt.line
    }

    pub fn column(&self) -> u32 {
        self.attempt.column
    }

    fn point_span(&self, pos: Position) -> SourceSpan {
        // A one-character window when there is a character to point at.
        let len = if pos.offset < self.source_len { 1 } else { 0 };
        SourceSpan::new(pos.offset.into(), len)
    }
}

impl Diagnostic for ParseError {
    fn code<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new("ipl::parse::syntax_error"))
    }

    fn help<'a>(&'a self) -> Option<Box<dyn fmt::Display + 'a>> {
        Some(Box::new(
            "everything before the first label parsed as complete statements; \
             the construct after it could not be finished",
        ))
    }

    fn labels(&self) -> Option<Box<dyn Iterator<Item = LabeledSpan> + '_>> {
        let mut labels = vec![LabeledSpan::new_with_span(
            Some(format!(
                "last complete statement ends here ({})",
                self.complete
            )),
            self.point_span(self.complete),
        )];
        if self.attempt.offset > self.complete.offset {
            labels.push(LabeledSpan::new_with_span(
                Some(format!(
                    "deepest parse attempt reached here ({})",
                    self.attempt
                )),
                self.point_span(self.attempt),
            ));
        }
        Some(Box::new(labels.into_iter()))
    }

    fn source_code(&self) -> Option<&dyn miette::SourceCode> {
        Some(&*self.named)
    }
}

/// Converts an AST byte span into miette's span representation.
pub fn to_source_span(span: Span) -> SourceSpan {
    SourceSpan::from(span.start..span.end)
}

// ============================================================================
// ERROR FORMATTING UTILITIES
// ============================================================================

/// Prints a diagnostic with full miette rendering (source excerpt, labels,
/// help). For user-facing CLI output.
pub fn print_error(error: impl Diagnostic + Send + Sync + 'static) {
    use miette::Report;
    let report = Report::new(error);
    eprintln!("{report:?}");
}
