//! Syntax module for the IPL language
//!
//! Provides the lexical scanner, the AST node model, and the grammar engine
//! that turns IPL source text into a tree with source location tracking.

use serde::{Deserialize, Serialize};

pub mod ast;
pub mod lexer;
pub mod parser;

pub use ast::{Node, NodeKind};
pub use lexer::{LexMode, Lexer, Token, TokenKind};
pub use parser::{parse, Outcome, Parser};

/// Represents a byte range in the source code.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// Extends this span to cover `other` as well.
    pub fn cover(&mut self, other: Span) {
        if other.start < self.start {
            self.start = other.start;
        }
        if other.end > self.end {
            self.end = other.end;
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// A cursor into the source buffer: byte offset plus the 1-based line and
/// column of the character at that offset. The scanner is the sole producer;
/// everything downstream (AST nodes, high-water marks) copies these values.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub offset: usize,
    pub line: u32,
    pub column: u32,
}

impl Position {
    /// The start of any source buffer.
    pub fn start() -> Self {
        Position {
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// Advances past a single character.
    pub fn advance(&mut self, ch: char) {
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::start()
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}
