//! Tree-Walking Evaluator (stub semantics)
//!
//! Walks every node of a parse tree exactly once, dispatching on the node
//! kind with a single exhaustive match. Declarations register names in the
//! current scope and block-like constructs open a fresh scope, which is
//! enough to demonstrate the consumer contract; expression values are not
//! computed.

use crate::errors::to_source_span;
use crate::runtime::RuntimeError;
use crate::syntax::{Node, NodeKind};

/// Evaluation state: a lexical scope stack plus a visit trace counter.
#[derive(Debug)]
pub struct EvalState {
    scopes: Vec<Vec<String>>,
    visited: usize,
}

impl EvalState {
    pub fn new() -> Self {
        EvalState {
            scopes: vec![Vec::new()],
            visited: 0,
        }
    }

    fn enter_scope(&mut self) {
        self.scopes.push(Vec::new());
    }

    fn leave_scope(&mut self) {
        // The global scope is never popped.
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    fn declare(&mut self, name: &str) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.push(name.to_string());
        }
    }

    /// Whether `name` is declared in any live scope.
    pub fn is_declared(&self, name: &str) -> bool {
        self.scopes
            .iter()
            .any(|scope| scope.iter().any(|n| n == name))
    }

    pub fn scope_depth(&self) -> usize {
        self.scopes.len()
    }

    /// Total nodes visited so far.
    pub fn visited(&self) -> usize {
        self.visited
    }
}

impl Default for EvalState {
    fn default() -> Self {
        EvalState::new()
    }
}

/// Walks a full parse tree from its root. The root must be the caller-owned
/// `Root` node populated by a successful parse.
pub fn eval_program(root: &Node, state: &mut EvalState) -> Result<(), RuntimeError> {
    if root.kind != NodeKind::Root {
        return Err(RuntimeError::new(
            "evaluation must start at a parse root",
            to_source_span(root.span),
        ));
    }
    let Some(program) = root.child(0) else {
        return Err(RuntimeError::new(
            "parse root has no program (was the parse successful?)",
            to_source_span(root.span),
        ));
    };
    eval_node(program, state)
}

fn eval_node(node: &Node, state: &mut EvalState) -> Result<(), RuntimeError> {
    state.visited += 1;
    match node.kind {
        NodeKind::Root => {
            return Err(RuntimeError::new(
                "nested parse root",
                to_source_span(node.span),
            ));
        }

        // Scope-opening constructs.
        NodeKind::Block
        | NodeKind::FunctionDecl
        | NodeKind::ClassDecl
        | NodeKind::MemberMethod => {
            state.enter_scope();
            eval_children(node, state)?;
            state.leave_scope();
        }

        // Declarations register their declarator names.
        NodeKind::Declaration => {
            for child in node.children() {
                if child.kind == NodeKind::Declarator {
                    state.declare(&child.text);
                }
            }
            eval_children(node, state)?;
        }
        NodeKind::Param => {
            state.declare(&node.text);
            eval_children(node, state)?;
        }

        // Everything else is a plain traversal; listed exhaustively so a
        // new node kind cannot be added without deciding its handling here.
        NodeKind::Program
        | NodeKind::IntegerLit
        | NodeKind::FloatLit
        | NodeKind::StringLit
        | NodeKind::BoolLit
        | NodeKind::Identifier
        | NodeKind::RegexLit
        | NodeKind::UnaryExpr
        | NodeKind::BinaryExpr
        | NodeKind::AssignExpr
        | NodeKind::MatchExpr
        | NodeKind::CallExpr
        | NodeKind::MemberAccess
        | NodeKind::ArgList
        | NodeKind::VectorLit
        | NodeKind::MapLit
        | NodeKind::MapEntry
        | NodeKind::TypeName
        | NodeKind::VectorType
        | NodeKind::MapType
        | NodeKind::ExprStmt
        | NodeKind::Declarator
        | NodeKind::LoopStmt
        | NodeKind::LoopInit
        | NodeKind::LoopCond
        | NodeKind::LoopUpdate
        | NodeKind::BreakStmt
        | NodeKind::ContinueStmt
        | NodeKind::ReturnStmt
        | NodeKind::ParamList
        | NodeKind::Inherit
        | NodeKind::AccessSpec
        | NodeKind::MemberVar => {
            eval_children(node, state)?;
        }
    }
    Ok(())
}

fn eval_children(node: &Node, state: &mut EvalState) -> Result<(), RuntimeError> {
    for child in node.children() {
        eval_node(child, state)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse;

    #[test]
    fn walks_every_node_once() {
        let root = parse("test", "int32 a = 1;\na = a + 2;").expect("parse");
        let mut state = EvalState::new();
        eval_program(&root, &mut state).expect("eval");
        assert!(state.visited() > 5);
        assert!(state.is_declared("a"));
    }

    #[test]
    fn block_scopes_are_discarded() {
        let src = "loop { int32 inner = 1; }\nint32 outer = 2;";
        let root = parse("test", src).expect("parse");
        let mut state = EvalState::new();
        eval_program(&root, &mut state).expect("eval");
        assert!(state.is_declared("outer"));
        assert!(!state.is_declared("inner"));
        assert_eq!(state.scope_depth(), 1);
    }

    #[test]
    fn unpopulated_root_is_a_runtime_error() {
        let root = Node::root();
        let mut state = EvalState::new();
        let err = eval_program(&root, &mut state).unwrap_err();
        assert!(err.message.contains("no program"));
    }
}
