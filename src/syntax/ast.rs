//! IPL AST Node Model
//!
//! A single uniform node type: every node carries the grammar production that
//! created it, the position where the construct begins, the covered byte
//! span, the raw matched text for leaves, and an ordered sequence of owned
//! children. Trees are built bottom-up during a rule match and are immutable
//! once attached; ownership is strictly tree-shaped.

use serde::{Deserialize, Serialize};

use crate::syntax::{Position, Span};

/// The grammar production a node was created by. This is a closed set: the
/// evaluator dispatches on it with a single exhaustive match.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Caller-supplied root; gains exactly one `Program` child on success.
    Root,
    Program,

    // Literals and names
    IntegerLit,
    FloatLit,
    StringLit,
    BoolLit,
    Identifier,
    RegexLit,

    // Expressions
    UnaryExpr,
    BinaryExpr,
    AssignExpr,
    MatchExpr,
    CallExpr,
    MemberAccess,
    ArgList,
    VectorLit,
    MapLit,
    MapEntry,

    // Types
    TypeName,
    VectorType,
    MapType,

    // Statements
    ExprStmt,
    Declaration,
    Declarator,
    LoopStmt,
    LoopInit,
    LoopCond,
    LoopUpdate,
    BreakStmt,
    ContinueStmt,
    ReturnStmt,
    Block,

    // Definitions
    FunctionDecl,
    ParamList,
    Param,
    ClassDecl,
    Inherit,
    AccessSpec,
    MemberVar,
    MemberMethod,
}

/// The single structural unit of the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub kind: NodeKind,
    pub pos: Position,
    pub span: Span,
    /// Raw matched text; populated for leaves (literals, identifiers) and
    /// for the operator of expression nodes. Empty otherwise.
    pub text: String,
    children: Vec<Node>,
}

impl Node {
    /// An interior node starting at `pos` with no text of its own.
    pub fn new(kind: NodeKind, pos: Position) -> Self {
        Node {
            kind,
            pos,
            span: Span::new(pos.offset, pos.offset),
            text: String::new(),
            children: Vec::new(),
        }
    }

    /// A leaf node carrying its raw matched text.
    pub fn leaf(kind: NodeKind, pos: Position, span: Span, text: impl Into<String>) -> Self {
        Node {
            kind,
            pos,
            span,
            text: text.into(),
            children: Vec::new(),
        }
    }

    /// A fresh caller-owned root, as handed to [`crate::syntax::Parser::parse`].
    pub fn root() -> Self {
        Node::new(NodeKind::Root, Position::start())
    }

    /// Appends an owned child, extending this node's span to cover it.
    /// Children appear in left-to-right source order.
    pub fn push(&mut self, child: Node) {
        self.span.cover(child.span);
        self.children.push(child);
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    pub fn child(&self, index: usize) -> Option<&Node> {
        self.children.get(index)
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Renders the tree with one indented line per node, for diagnostics.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.render_into(&mut out, 0);
        out
    }

    fn render_into(&self, out: &mut String, depth: usize) {
        for _ in 0..depth {
            out.push_str("  ");
        }
        out.push_str(&format!("{:?}", self.kind));
        if !self.text.is_empty() {
            out.push_str(&format!(" '{}'", self.text));
        }
        out.push_str(&format!(" @{}\n", self.pos));
        for child in &self.children {
            child.render_into(out, depth + 1);
        }
    }
}

impl std::fmt::Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.render())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(offset: usize) -> Position {
        Position {
            offset,
            line: 1,
            column: offset as u32 + 1,
        }
    }

    #[test]
    fn push_keeps_order_and_covers_spans() {
        let mut parent = Node::new(NodeKind::BinaryExpr, at(0));
        parent.text = "+".into();
        parent.push(Node::leaf(NodeKind::IntegerLit, at(0), Span::new(0, 1), "1"));
        parent.push(Node::leaf(NodeKind::IntegerLit, at(4), Span::new(4, 5), "2"));

        assert_eq!(parent.child_count(), 2);
        assert_eq!(parent.child(0).unwrap().text, "1");
        assert_eq!(parent.child(1).unwrap().text, "2");
        assert_eq!(parent.span, Span::new(0, 5));
    }

    #[test]
    fn leaves_have_no_children() {
        let leaf = Node::leaf(NodeKind::Identifier, at(0), Span::new(0, 3), "foo");
        assert!(leaf.is_leaf());
        assert_eq!(leaf.text, "foo");
    }

    #[test]
    fn render_shows_kind_text_and_position() {
        let mut root = Node::root();
        root.push(Node::leaf(NodeKind::Identifier, at(0), Span::new(0, 1), "a"));
        let rendered = root.render();
        assert!(rendered.starts_with("Root @1:1\n"));
        assert!(rendered.contains("  Identifier 'a' @1:1\n"));
    }
}
