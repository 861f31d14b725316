//! IPL Grammar Engine
//!
//! One matching procedure per grammar production, composed from sequencing,
//! ordered alternation, repetition, and optional attempts. Every rule either
//! returns an owned, fully-formed subtree together with the advanced cursor,
//! or `None` and the caller keeps its original cursor. Backtracking is
//! cursor restoration; partially-built children are simply dropped. Rule
//! failure is ordinary control flow, never an error value: only the public
//! entry point reports a diagnostic.
//!
//! The parser also maintains the two high-water marks callers use to report
//! where a failed parse got to: the end of the furthest fully-reduced
//! top-level statement, and the furthest position any rule attempt advanced
//! to before being rolled back.

use crate::errors::{ParseError, SourceContext};
use crate::syntax::ast::{Node, NodeKind};
use crate::syntax::lexer::{LexMode, Lexer, Token, TokenKind};
use crate::syntax::Position;

/// Top-level parse outcome. There is no partial success: either the whole
/// input was consumed as one well-formed program, or the parse failed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ok,
    Fail,
}

/// The result of one rule attempt: an owned subtree plus the cursor past it.
type Step = Option<(Node, Position)>;

/// A single-use parser over one source buffer. Two parses never share
/// state: each `Parser` value owns its own cursor and high-water marks.
#[derive(Debug)]
pub struct Parser<'src> {
    lexer: Lexer<'src>,
    /// End of the furthest fully-parsed top-level statement.
    complete: Position,
    /// Furthest position any rule attempt reached, rolled back or not.
    attempt: Position,
}

/// Parses `source` into a fresh tree, reporting failure as a rich
/// diagnostic. Convenience wrapper over [`Parser::parse`] for callers that
/// do not supply their own root.
pub fn parse(name: &str, source: &str) -> Result<Node, ParseError> {
    let mut root = Node::root();
    let mut parser = Parser::new(source);
    match parser.parse(&mut root) {
        Outcome::Ok => Ok(root),
        Outcome::Fail => Err(ParseError::new(
            SourceContext::from_file(name, source),
            &parser,
        )),
    }
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        Parser {
            lexer: Lexer::new(source),
            complete: Position::start(),
            attempt: Position::start(),
        }
    }

    /// Populates the caller-supplied root with exactly one program child on
    /// success. On failure the root is left without a program child and the
    /// high-water marks describe how far the attempt got.
    pub fn parse(&mut self, root: &mut Node) -> Outcome {
        match self.program(Position::start()) {
            Some((program, end)) => {
                self.complete = end;
                self.note(end);
                root.push(program);
                Outcome::Ok
            }
            None => Outcome::Fail,
        }
    }

    // ------------------------------------------------------------------
    // Position accessors (valid after any parse attempt)
    // ------------------------------------------------------------------

    /// Byte offset of the fully-parsed prefix.
    pub fn pos(&self) -> usize {
        self.complete.offset
    }

    pub fn len(&self) -> usize {
        self.lexer.source_len()
    }

    pub fn line(&self) -> u32 {
        self.complete.line
    }

    pub fn column(&self) -> u32 {
        self.complete.column
    }

    /// End of the last fully-parsed top-level statement.
    pub fn complete_mark(&self) -> Position {
        self.complete
    }

    /// Deepest point any rule attempt reached. Never precedes
    /// [`Parser::complete_mark`] in source order.
    pub fn high_water(&self) -> Position {
        self.attempt
    }

    // ------------------------------------------------------------------
    // Token plumbing
    // ------------------------------------------------------------------

    fn note(&mut self, pos: Position) {
        if pos.offset > self.attempt.offset {
            self.attempt = pos;
        }
    }

    fn peek(&self, cur: Position) -> Token<'src> {
        self.lexer.token_at(cur, LexMode::Normal)
    }

    /// Consumes one token of the given kind, recording the attempt mark.
    fn eat(&mut self, cur: Position, kind: TokenKind) -> Option<(Token<'src>, Position)> {
        let tok = self.lexer.token_at(cur, LexMode::Normal);
        if tok.kind != kind {
            return None;
        }
        self.note(tok.end);
        Some((tok, tok.end))
    }

    // ------------------------------------------------------------------
    // Program and statements
    // ------------------------------------------------------------------

    fn program(&mut self, cur: Position) -> Step {
        let mut node = Node::new(NodeKind::Program, cur);
        let mut cur = cur;
        while let Some((stmt, next)) = self.statement(cur) {
            node.push(stmt);
            cur = next;
            // A complete top-level construct now exists up to here.
            self.complete = next;
            self.note(next);
        }
        let tok = self.peek(cur);
        if tok.kind != TokenKind::Eof {
            return None;
        }
        Some((node, tok.end))
    }

    fn statement(&mut self, cur: Position) -> Step {
        if let Some(found) = self.class_decl(cur) {
            return Some(found);
        }
        if let Some(found) = self.function_decl(cur) {
            return Some(found);
        }
        if let Some(found) = self.declaration(cur) {
            return Some(found);
        }
        if let Some(found) = self.loop_stmt(cur) {
            return Some(found);
        }
        if let Some(found) = self.jump_stmt(cur) {
            return Some(found);
        }
        self.expr_stmt(cur)
    }

    fn jump_stmt(&mut self, cur: Position) -> Step {
        let tok = self.peek(cur);
        let kind = match tok.kind {
            TokenKind::KwBreak => NodeKind::BreakStmt,
            TokenKind::KwContinue => NodeKind::ContinueStmt,
            TokenKind::KwReturn => NodeKind::ReturnStmt,
            _ => return None,
        };
        let (kw, mut cur) = self.eat(cur, tok.kind)?;
        let mut node = Node::new(kind, kw.pos);
        node.span.cover(kw.span());
        if kind == NodeKind::ReturnStmt {
            if let Some((value, next)) = self.expression(cur) {
                node.push(value);
                cur = next;
            }
        }
        let (semi, end) = self.eat(cur, TokenKind::Semi)?;
        node.span.cover(semi.span());
        Some((node, end))
    }

    fn expr_stmt(&mut self, cur: Position) -> Step {
        let (expr, after) = self.assign_or_expr(cur)?;
        let (semi, end) = self.eat(after, TokenKind::Semi)?;
        let mut node = Node::new(NodeKind::ExprStmt, expr.pos);
        node.push(expr);
        node.span.cover(semi.span());
        Some((node, end))
    }

    fn block(&mut self, cur: Position) -> Step {
        let (open, mut cur) = self.eat(cur, TokenKind::LBrace)?;
        let mut node = Node::new(NodeKind::Block, open.pos);
        node.span.cover(open.span());
        while let Some((stmt, next)) = self.statement(cur) {
            node.push(stmt);
            cur = next;
        }
        let (close, end) = self.eat(cur, TokenKind::RBrace)?;
        node.span.cover(close.span());
        Some((node, end))
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    fn declaration(&mut self, cur: Position) -> Step {
        let (mut node, after) = self.declaration_body(cur, false, true)?;
        let (semi, end) = self.eat(after, TokenKind::Semi)?;
        node.span.cover(semi.span());
        Some((node, end))
    }

    /// `Type ident init (, ident = expr)*` without the terminator, shared by
    /// declaration statements, loop init clauses, and class variable
    /// members. Only the first declarator may take a `=~ regex` initializer,
    /// and only where `allow_match` says so.
    fn declaration_body(&mut self, cur: Position, trailing_comma: bool, allow_match: bool) -> Step {
        let (ty, after_ty) = self.type_spec(cur)?;
        let mut node = Node::new(NodeKind::Declaration, ty.pos);
        node.push(ty);
        let (first, mut cur) = self.declarator(after_ty, allow_match)?;
        node.push(first);
        loop {
            let Some((_, after_comma)) = self.eat(cur, TokenKind::Comma) else {
                break;
            };
            match self.declarator(after_comma, false) {
                Some((decl, next)) => {
                    node.push(decl);
                    cur = next;
                }
                None => {
                    if trailing_comma {
                        cur = after_comma;
                    }
                    break;
                }
            }
        }
        Some((node, cur))
    }

    fn declarator(&mut self, cur: Position, allow_match: bool) -> Step {
        let (name, after_name) = self.eat(cur, TokenKind::Identifier)?;
        let mut node = Node::new(NodeKind::Declarator, name.pos);
        node.text = name.text.to_string();
        node.span.cover(name.span());
        if allow_match {
            if let Some((op, after_op)) = self.eat(after_name, TokenKind::EqTilde) {
                let (regex, end) = self.regex_literal(after_op)?;
                let mut matcher = Node::new(NodeKind::MatchExpr, op.pos);
                matcher.text = op.text.to_string();
                matcher.span.cover(op.span());
                matcher.push(regex);
                node.push(matcher);
                return Some((node, end));
            }
        }
        let (_, after_eq) = self.eat(after_name, TokenKind::Eq)?;
        let (value, end) = self.expression(after_eq)?;
        node.push(value);
        Some((node, end))
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    fn type_spec(&mut self, cur: Position) -> Step {
        let tok = self.peek(cur);
        match tok.kind {
            TokenKind::KwVector => {
                let (kw, after_kw) = self.eat(cur, TokenKind::KwVector)?;
                let (_, after_lt) = self.eat(after_kw, TokenKind::Lt)?;
                let (element, after_elem) = self.type_spec(after_lt)?;
                let end = self.close_angle(after_elem)?;
                let mut node = Node::new(NodeKind::VectorType, kw.pos);
                node.span.cover(kw.span());
                node.push(element);
                node.span.end = node.span.end.max(end.offset);
                Some((node, end))
            }
            TokenKind::KwMap => {
                let (kw, after_kw) = self.eat(cur, TokenKind::KwMap)?;
                let (_, after_lt) = self.eat(after_kw, TokenKind::Lt)?;
                let (key, after_key) = self.type_spec(after_lt)?;
                let (_, after_comma) = self.eat(after_key, TokenKind::Comma)?;
                let (value, after_value) = self.type_spec(after_comma)?;
                let end = self.close_angle(after_value)?;
                let mut node = Node::new(NodeKind::MapType, kw.pos);
                node.span.cover(kw.span());
                node.push(key);
                node.push(value);
                node.span.end = node.span.end.max(end.offset);
                Some((node, end))
            }
            TokenKind::TypeName | TokenKind::Identifier => {
                let (name, end) = self.eat(cur, tok.kind)?;
                Some((
                    Node::leaf(NodeKind::TypeName, name.pos, name.span(), name.text),
                    end,
                ))
            }
            _ => None,
        }
    }

    /// Closes a type-argument list. A `>>` closing two nested generics is
    /// split by consuming a single `>` out of it, C-family style.
    fn close_angle(&mut self, cur: Position) -> Option<Position> {
        let tok = self.peek(cur);
        match tok.kind {
            TokenKind::Gt => {
                self.note(tok.end);
                Some(tok.end)
            }
            TokenKind::Shr | TokenKind::ShrEq => {
                let mut split = tok.pos;
                split.advance('>');
                self.note(split);
                Some(split)
            }
            _ => None,
        }
    }

    // ------------------------------------------------------------------
    // Loop statement
    // ------------------------------------------------------------------

    fn loop_stmt(&mut self, cur: Position) -> Step {
        let (kw, mut cur) = self.eat(cur, TokenKind::KwLoop)?;
        let mut node = Node::new(NodeKind::LoopStmt, kw.pos);
        node.span.cover(kw.span());
        if let Some((post, next)) = self.eat(cur, TokenKind::KwPost) {
            node.text = post.text.to_string();
            node.span.cover(post.span());
            cur = next;
        }
        // The parenthesized clause is fully optional; once present, both
        // semicolons are mandatory while each clause stays optional.
        if let Some((_, mut inner)) = self.eat(cur, TokenKind::LParen) {
            if let Some((init, next)) = self.loop_clause(inner, NodeKind::LoopInit) {
                node.push(init);
                inner = next;
            }
            let (_, after_semi) = self.eat(inner, TokenKind::Semi)?;
            inner = after_semi;
            if let Some((cond_expr, next)) = self.expression(inner) {
                let mut cond = Node::new(NodeKind::LoopCond, cond_expr.pos);
                cond.push(cond_expr);
                node.push(cond);
                inner = next;
            }
            let (_, after_semi) = self.eat(inner, TokenKind::Semi)?;
            inner = after_semi;
            if let Some((update, next)) = self.loop_clause(inner, NodeKind::LoopUpdate) {
                node.push(update);
                inner = next;
            }
            let (close, after_close) = self.eat(inner, TokenKind::RParen)?;
            node.span.cover(close.span());
            cur = after_close;
        }
        let (body, end) = self.block(cur)?;
        node.push(body);
        Some((node, end))
    }

    /// A loop init or update clause: either one declaration with multiple
    /// declarators, or a comma-separated assignment list.
    fn loop_clause(&mut self, cur: Position, kind: NodeKind) -> Step {
        if let Some((decl, end)) = self.declaration_body(cur, true, false) {
            let mut node = Node::new(kind, decl.pos);
            node.push(decl);
            return Some((node, end));
        }
        let (first, after_first) = self.assignment(cur)?;
        let mut node = Node::new(kind, first.pos);
        node.push(first);
        let end = self.comma_separated_rest(after_first, &mut node, true, Self::assignment);
        Some((node, end))
    }

    // ------------------------------------------------------------------
    // Functions and classes
    // ------------------------------------------------------------------

    fn function_decl(&mut self, cur: Position) -> Step {
        let (ty, after_ty) = self.type_spec(cur)?;
        let (name, after_name) = self.eat(after_ty, TokenKind::Identifier)?;
        let (params, after_params) = self.param_list(after_name)?;
        // A body in braces is mandatory; there are no forward declarations.
        let (body, end) = self.block(after_params)?;
        let mut node = Node::new(NodeKind::FunctionDecl, ty.pos);
        node.text = name.text.to_string();
        node.push(ty);
        node.push(params);
        node.push(body);
        Some((node, end))
    }

    fn param_list(&mut self, cur: Position) -> Step {
        let (open, after_open) = self.eat(cur, TokenKind::LParen)?;
        let mut node = Node::new(NodeKind::ParamList, open.pos);
        node.span.cover(open.span());
        let cur = self.comma_separated(after_open, &mut node, true, Self::param);
        let (close, end) = self.eat(cur, TokenKind::RParen)?;
        node.span.cover(close.span());
        Some((node, end))
    }

    fn param(&mut self, cur: Position) -> Step {
        let (ty, after_ty) = self.type_spec(cur)?;
        let (name, end) = self.eat(after_ty, TokenKind::Identifier)?;
        let mut node = Node::new(NodeKind::Param, ty.pos);
        node.text = name.text.to_string();
        node.push(ty);
        node.span.cover(name.span());
        Some((node, end))
    }

    fn class_decl(&mut self, cur: Position) -> Step {
        let (kw, after_kw) = self.eat(cur, TokenKind::KwClass)?;
        let (name, mut cur) = self.eat(after_kw, TokenKind::Identifier)?;
        let mut node = Node::new(NodeKind::ClassDecl, kw.pos);
        node.text = name.text.to_string();
        node.span.cover(kw.span());
        node.span.cover(name.span());
        if let Some((_, after_colon)) = self.eat(cur, TokenKind::Colon) {
            let (parent, next) = self.eat(after_colon, TokenKind::Identifier)?;
            node.push(Node::leaf(
                NodeKind::Inherit,
                parent.pos,
                parent.span(),
                parent.text,
            ));
            cur = next;
        }
        let (_, mut cur) = self.eat(cur, TokenKind::LBrace)?;
        while let Some((member, next)) = self.class_member(cur) {
            node.push(member);
            cur = next;
        }
        let (close, end) = self.eat(cur, TokenKind::RBrace)?;
        node.span.cover(close.span());
        Some((node, end))
    }

    /// A class member always begins with an explicit access specifier; a
    /// method member additionally requires an explicit return type.
    fn class_member(&mut self, cur: Position) -> Step {
        let tok = self.peek(cur);
        if !matches!(
            tok.kind,
            TokenKind::KwPublic | TokenKind::KwProtected | TokenKind::KwPrivate
        ) {
            return None;
        }
        let (access, after_access) = self.eat(cur, tok.kind)?;
        if let Some(found) = self.member_method(access, after_access) {
            return Some(found);
        }
        self.member_var(access, after_access)
    }

    fn member_method(&mut self, access: Token<'src>, cur: Position) -> Step {
        let (ty, after_ty) = self.type_spec(cur)?;
        let (name, after_name) = self.eat(after_ty, TokenKind::Identifier)?;
        let (params, after_params) = self.param_list(after_name)?;
        let (body, end) = self.block(after_params)?;
        let mut node = Node::new(NodeKind::MemberMethod, access.pos);
        node.text = name.text.to_string();
        node.push(Node::leaf(
            NodeKind::AccessSpec,
            access.pos,
            access.span(),
            access.text,
        ));
        node.push(ty);
        node.push(params);
        node.push(body);
        Some((node, end))
    }

    fn member_var(&mut self, access: Token<'src>, cur: Position) -> Step {
        let (decl, after_decl) = self.declaration_body(cur, false, false)?;
        let (semi, end) = self.eat(after_decl, TokenKind::Semi)?;
        let mut node = Node::new(NodeKind::MemberVar, access.pos);
        node.push(Node::leaf(
            NodeKind::AccessSpec,
            access.pos,
            access.span(),
            access.text,
        ));
        node.push(decl);
        node.span.cover(semi.span());
        Some((node, end))
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    /// An assignment is only recognized directly inside a statement; it is
    /// never a valid group interior or argument.
    fn assign_or_expr(&mut self, cur: Position) -> Step {
        if let Some(found) = self.assignment(cur) {
            return Some(found);
        }
        self.expression(cur)
    }

    fn assignment(&mut self, cur: Position) -> Step {
        let (target, after_target) = self.postfix(cur)?;
        let op_tok = self.peek(after_target);
        if !is_assign_op(op_tok.kind) {
            return None;
        }
        let (op, after_op) = self.eat(after_target, op_tok.kind)?;
        // Right-associative: `a = b = c` nests to the right.
        let (value, end) = self.assign_or_expr(after_op)?;
        let mut node = Node::new(NodeKind::AssignExpr, target.pos);
        node.text = op.text.to_string();
        node.push(target);
        node.push(value);
        Some((node, end))
    }

    /// Full (non-assignment) expression: a binary-operator ladder with an
    /// optional `=~ regex` match at the top.
    fn expression(&mut self, cur: Position) -> Step {
        let (lhs, after_lhs) = self.logical_or(cur)?;
        if let Some((op, after_op)) = self.eat(after_lhs, TokenKind::EqTilde) {
            let (regex, end) = self.regex_literal(after_op)?;
            let mut node = Node::new(NodeKind::MatchExpr, lhs.pos);
            node.text = op.text.to_string();
            node.push(lhs);
            node.push(regex);
            return Some((node, end));
        }
        Some((lhs, after_lhs))
    }

    fn logical_or(&mut self, cur: Position) -> Step {
        self.binary_chain(cur, &[TokenKind::OrOr], Self::logical_and)
    }

    fn logical_and(&mut self, cur: Position) -> Step {
        self.binary_chain(cur, &[TokenKind::AndAnd], Self::equality)
    }

    fn equality(&mut self, cur: Position) -> Step {
        self.binary_chain(cur, &[TokenKind::EqEq], Self::relational)
    }

    fn relational(&mut self, cur: Position) -> Step {
        self.binary_chain(cur, &[TokenKind::Lt], Self::bit_or)
    }

    fn bit_or(&mut self, cur: Position) -> Step {
        self.binary_chain(cur, &[TokenKind::Pipe], Self::bit_xor)
    }

    fn bit_xor(&mut self, cur: Position) -> Step {
        self.binary_chain(cur, &[TokenKind::Caret], Self::bit_and)
    }

    fn bit_and(&mut self, cur: Position) -> Step {
        self.binary_chain(cur, &[TokenKind::Amp], Self::shift)
    }

    fn shift(&mut self, cur: Position) -> Step {
        self.binary_chain(cur, &[TokenKind::Shl, TokenKind::Shr], Self::additive)
    }

    fn additive(&mut self, cur: Position) -> Step {
        self.binary_chain(
            cur,
            &[TokenKind::Plus, TokenKind::Minus],
            Self::multiplicative,
        )
    }

    fn multiplicative(&mut self, cur: Position) -> Step {
        self.binary_chain(
            cur,
            &[TokenKind::Star, TokenKind::Slash, TokenKind::Percent],
            Self::unary,
        )
    }

    /// Left-associative binary level: `next (op next)*`. A dangling
    /// operator with no right operand is rolled back, leaving the operator
    /// for the caller to reject.
    fn binary_chain(
        &mut self,
        cur: Position,
        ops: &[TokenKind],
        next: fn(&mut Self, Position) -> Step,
    ) -> Step {
        let (mut lhs, mut cur) = next(self, cur)?;
        loop {
            let tok = self.peek(cur);
            if !ops.contains(&tok.kind) {
                break;
            }
            let Some((op, after_op)) = self.eat(cur, tok.kind) else {
                break;
            };
            let Some((rhs, end)) = next(self, after_op) else {
                break;
            };
            let mut node = Node::new(NodeKind::BinaryExpr, lhs.pos);
            node.text = op.text.to_string();
            node.push(lhs);
            node.push(rhs);
            lhs = node;
            cur = end;
        }
        Some((lhs, cur))
    }

    fn unary(&mut self, cur: Position) -> Step {
        let tok = self.peek(cur);
        if !matches!(
            tok.kind,
            TokenKind::Bang | TokenKind::Tilde | TokenKind::Minus
        ) {
            return self.postfix(cur);
        }
        let (op, after_op) = self.eat(cur, tok.kind)?;
        let (operand, end) = self.unary(after_op)?;
        let mut node = Node::new(NodeKind::UnaryExpr, op.pos);
        node.text = op.text.to_string();
        node.span.cover(op.span());
        node.push(operand);
        Some((node, end))
    }

    /// Postfix chain over a primary: member access via `.` and calls via
    /// `(...)`, at arbitrary depth.
    fn postfix(&mut self, cur: Position) -> Step {
        let (mut expr, mut cur) = self.primary(cur)?;
        loop {
            if let Some((_, after_dot)) = self.eat(cur, TokenKind::Dot) {
                let Some((name, end)) = self.eat(after_dot, TokenKind::Identifier) else {
                    break;
                };
                let mut node = Node::new(NodeKind::MemberAccess, expr.pos);
                node.text = name.text.to_string();
                node.push(expr);
                node.span.cover(name.span());
                expr = node;
                cur = end;
            } else if self.peek(cur).kind == TokenKind::LParen {
                let Some((args, end)) = self.arg_list(cur) else {
                    break;
                };
                let mut node = Node::new(NodeKind::CallExpr, expr.pos);
                node.push(expr);
                node.push(args);
                expr = node;
                cur = end;
            } else {
                break;
            }
        }
        Some((expr, cur))
    }

    fn arg_list(&mut self, cur: Position) -> Step {
        let (open, after_open) = self.eat(cur, TokenKind::LParen)?;
        let mut node = Node::new(NodeKind::ArgList, open.pos);
        node.span.cover(open.span());
        let cur = self.comma_separated(after_open, &mut node, true, Self::expression);
        let (close, end) = self.eat(cur, TokenKind::RParen)?;
        node.span.cover(close.span());
        Some((node, end))
    }

    fn primary(&mut self, cur: Position) -> Step {
        let tok = self.peek(cur);
        match tok.kind {
            TokenKind::KwTrue | TokenKind::KwFalse => {
                let (lit, end) = self.eat(cur, tok.kind)?;
                Some((
                    Node::leaf(NodeKind::BoolLit, lit.pos, lit.span(), lit.text),
                    end,
                ))
            }
            TokenKind::Integer => {
                let (lit, end) = self.eat(cur, tok.kind)?;
                Some((
                    Node::leaf(NodeKind::IntegerLit, lit.pos, lit.span(), lit.text),
                    end,
                ))
            }
            TokenKind::Float => {
                let (lit, end) = self.eat(cur, tok.kind)?;
                Some((
                    Node::leaf(NodeKind::FloatLit, lit.pos, lit.span(), lit.text),
                    end,
                ))
            }
            TokenKind::Str => self.string_literal(cur),
            TokenKind::Identifier => {
                let (name, end) = self.eat(cur, tok.kind)?;
                Some((
                    Node::leaf(NodeKind::Identifier, name.pos, name.span(), name.text),
                    end,
                ))
            }
            TokenKind::LParen => self.group(cur),
            TokenKind::LBracket => {
                if let Some(found) = self.vector_literal(cur) {
                    return Some(found);
                }
                self.map_literal(cur)
            }
            _ => self.regex_literal(cur),
        }
    }

    /// One or more adjacent string literals concatenated into a single
    /// string-literal node.
    fn string_literal(&mut self, cur: Position) -> Step {
        let (first, mut cur) = self.eat(cur, TokenKind::Str)?;
        let mut node = Node::leaf(
            NodeKind::StringLit,
            first.pos,
            first.span(),
            unquote(first.text),
        );
        while let Some((next, end)) = self.eat(cur, TokenKind::Str) {
            node.text.push_str(unquote(next.text));
            node.span.cover(next.span());
            cur = end;
        }
        Some((node, cur))
    }

    /// `( expr )` — requires a non-empty interior and balanced delimiters;
    /// an assignment is not a valid interior. Grouping is transparent in
    /// the tree: the interior expression is returned directly.
    fn group(&mut self, cur: Position) -> Step {
        let (_, after_open) = self.eat(cur, TokenKind::LParen)?;
        let (inner, after_inner) = self.expression(after_open)?;
        let (_, end) = self.eat(after_inner, TokenKind::RParen)?;
        Some((inner, end))
    }

    fn vector_literal(&mut self, cur: Position) -> Step {
        let (open, after_open) = self.eat(cur, TokenKind::LBracket)?;
        let mut node = Node::new(NodeKind::VectorLit, open.pos);
        node.span.cover(open.span());
        let cur = self.comma_separated(after_open, &mut node, true, Self::expression);
        let (close, end) = self.eat(cur, TokenKind::RBracket)?;
        node.span.cover(close.span());
        Some((node, end))
    }

    fn map_literal(&mut self, cur: Position) -> Step {
        let (open, after_open) = self.eat(cur, TokenKind::LBracket)?;
        let mut node = Node::new(NodeKind::MapLit, open.pos);
        node.span.cover(open.span());
        let cur = self.comma_separated(after_open, &mut node, true, Self::map_entry);
        let (close, end) = self.eat(cur, TokenKind::RBracket)?;
        node.span.cover(close.span());
        Some((node, end))
    }

    fn map_entry(&mut self, cur: Position) -> Step {
        let (key, after_key) = self.expression(cur)?;
        let (_, after_colon) = self.eat(after_key, TokenKind::Colon)?;
        let (value, end) = self.expression(after_colon)?;
        let mut node = Node::new(NodeKind::MapEntry, key.pos);
        node.push(key);
        node.push(value);
        Some((node, end))
    }

    /// A non-empty `/pattern/` literal with a structurally valid pattern.
    fn regex_literal(&mut self, cur: Position) -> Step {
        let tok = self.lexer.token_at(cur, LexMode::Regex);
        if tok.kind != TokenKind::Regex {
            return None;
        }
        let pattern = &tok.text[1..tok.text.len() - 1];
        if pattern.is_empty() || !regex_pattern_is_valid(pattern) {
            return None;
        }
        self.note(tok.end);
        Some((
            Node::leaf(NodeKind::RegexLit, tok.pos, tok.span(), tok.text),
            tok.end,
        ))
    }

    // ------------------------------------------------------------------
    // Repetition helpers
    // ------------------------------------------------------------------

    /// Zero-or-more items separated by commas, pushed onto `node`. With
    /// `trailing_comma`, a comma after the last item is consumed; without
    /// it, the comma is rolled back for the caller to reject.
    fn comma_separated(
        &mut self,
        cur: Position,
        node: &mut Node,
        trailing_comma: bool,
        item: fn(&mut Self, Position) -> Step,
    ) -> Position {
        let Some((first, after_first)) = item(self, cur) else {
            return cur;
        };
        node.push(first);
        self.comma_separated_rest(after_first, node, trailing_comma, item)
    }

    fn comma_separated_rest(
        &mut self,
        mut cur: Position,
        node: &mut Node,
        trailing_comma: bool,
        item: fn(&mut Self, Position) -> Step,
    ) -> Position {
        loop {
            let Some((_, after_comma)) = self.eat(cur, TokenKind::Comma) else {
                break;
            };
            match item(self, after_comma) {
                Some((next, end)) => {
                    node.push(next);
                    cur = end;
                }
                None => {
                    if trailing_comma {
                        cur = after_comma;
                    }
                    break;
                }
            }
        }
        cur
    }
}

fn is_assign_op(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Eq
            | TokenKind::PlusEq
            | TokenKind::MinusEq
            | TokenKind::StarEq
            | TokenKind::SlashEq
            | TokenKind::PercentEq
            | TokenKind::AmpEq
            | TokenKind::PipeEq
            | TokenKind::CaretEq
            | TokenKind::ShlEq
            | TokenKind::ShrEq
    )
}

fn unquote(text: &str) -> &str {
    &text[1..text.len() - 1]
}

// ----------------------------------------------------------------------
// Regex pattern structure
//
// Patterns are validated, not compiled: alternation of non-empty
// sequences, terms with an optional * + ? quantifier, atoms that are
// groups, character classes (with ranges), escapes, or literal characters.
// ----------------------------------------------------------------------

fn regex_pattern_is_valid(pattern: &str) -> bool {
    let bytes = pattern.as_bytes();
    matches!(re_alternation(bytes, 0), Some(end) if end == bytes.len())
}

fn re_alternation(bytes: &[u8], mut i: usize) -> Option<usize> {
    i = re_sequence(bytes, i)?;
    while i < bytes.len() && bytes[i] == b'|' {
        i = re_sequence(bytes, i + 1)?;
    }
    Some(i)
}

fn re_sequence(bytes: &[u8], i: usize) -> Option<usize> {
    let mut i = re_term(bytes, i)?;
    while let Some(next) = re_term(bytes, i) {
        i = next;
    }
    Some(i)
}

fn re_term(bytes: &[u8], i: usize) -> Option<usize> {
    let mut i = re_atom(bytes, i)?;
    if i < bytes.len() && matches!(bytes[i], b'*' | b'+' | b'?') {
        i += 1;
    }
    Some(i)
}

fn re_atom(bytes: &[u8], i: usize) -> Option<usize> {
    if i >= bytes.len() {
        return None;
    }
    match bytes[i] {
        b'(' => {
            let end = re_alternation(bytes, i + 1)?;
            if end < bytes.len() && bytes[end] == b')' {
                Some(end + 1)
            } else {
                None
            }
        }
        b'[' => re_class(bytes, i + 1),
        b'\\' => {
            if i + 1 < bytes.len() {
                Some(i + 2)
            } else {
                None
            }
        }
        b')' | b'|' | b'*' | b'+' | b'?' => None,
        _ => Some(i + 1),
    }
}

fn re_class(bytes: &[u8], mut i: usize) -> Option<usize> {
    if i < bytes.len() && bytes[i] == b'^' {
        i += 1;
    }
    let mut items = 0usize;
    while i < bytes.len() && bytes[i] != b']' {
        i = re_class_char(bytes, i)?;
        // A range `a-z`, unless the dash closes the class.
        if i + 1 < bytes.len() && bytes[i] == b'-' && bytes[i + 1] != b']' {
            i = re_class_char(bytes, i + 1)?;
        }
        items += 1;
    }
    if items > 0 && i < bytes.len() && bytes[i] == b']' {
        Some(i + 1)
    } else {
        None
    }
}

fn re_class_char(bytes: &[u8], i: usize) -> Option<usize> {
    if i >= bytes.len() {
        return None;
    }
    if bytes[i] == b'\\' {
        if i + 1 < bytes.len() {
            Some(i + 2)
        } else {
            None
        }
    } else {
        Some(i + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(src: &str) -> Outcome {
        let mut root = Node::root();
        Parser::new(src).parse(&mut root)
    }

    #[test]
    fn empty_and_comment_only_input_parse_to_empty_program() {
        for src in ["", "   \n\t ", "# just a comment", "# one\n# two\n"] {
            let mut root = Node::root();
            let mut parser = Parser::new(src);
            assert_eq!(parser.parse(&mut root), Outcome::Ok, "{src:?}");
            let program = root.child(0).expect("program child");
            assert_eq!(program.kind, NodeKind::Program);
            assert_eq!(program.child_count(), 0, "{src:?}");
        }
    }

    #[test]
    fn root_gains_exactly_one_program_child() {
        let mut root = Node::root();
        assert_eq!(Parser::new("a = 1; b = 2;").parse(&mut root), Outcome::Ok);
        assert_eq!(root.child_count(), 1);
        assert_eq!(root.child(0).unwrap().child_count(), 2);
    }

    #[test]
    fn assignment_is_rejected_inside_a_group() {
        assert_eq!(outcome("(a = b + c);"), Outcome::Fail);
        assert_eq!(outcome("a = (1);"), Outcome::Ok);
    }

    #[test]
    fn high_water_marks_never_cross() {
        let mut root = Node::root();
        let mut parser = Parser::new("a = 1; b = ;");
        assert_eq!(parser.parse(&mut root), Outcome::Fail);
        assert!(parser.complete_mark().offset <= parser.high_water().offset);
        // The first statement parsed completely.
        assert_eq!(parser.pos(), 6);
        // The failed attempt probed past the second `=`.
        assert!(parser.high_water().offset > 6);
    }

    #[test]
    fn reparsing_is_deterministic() {
        let src = "vector<sint32> foo = [1, 2 + 3];\nloop (int32 i = 0; i < 10; i += 1) { foo.push(i); }";
        let mut first = Node::root();
        let mut second = Node::root();
        assert_eq!(Parser::new(src).parse(&mut first), Outcome::Ok);
        assert_eq!(Parser::new(src).parse(&mut second), Outcome::Ok);
        assert_eq!(first, second);
    }

    #[test]
    fn declaration_tree_shape() {
        let root = parse("test", "int32 a = 1, b = 2;").expect("parse");
        let program = root.child(0).unwrap();
        let decl = program.child(0).unwrap();
        assert_eq!(decl.kind, NodeKind::Declaration);
        assert_eq!(decl.child(0).unwrap().kind, NodeKind::TypeName);
        assert_eq!(decl.child(1).unwrap().kind, NodeKind::Declarator);
        assert_eq!(decl.child(1).unwrap().text, "a");
        assert_eq!(decl.child(2).unwrap().text, "b");
    }

    #[test]
    fn match_declaration_produces_match_node() {
        let root = parse("test", "bool found =~ /[_A-Za-z][0-9_A-Za-z]*/;").expect("parse");
        let decl = root.child(0).unwrap().child(0).unwrap();
        let declarator = decl.child(1).unwrap();
        let matcher = declarator.child(0).unwrap();
        assert_eq!(matcher.kind, NodeKind::MatchExpr);
        assert_eq!(matcher.child(0).unwrap().kind, NodeKind::RegexLit);
    }

    #[test]
    fn spans_cover_full_statements() {
        let src = "a = (b % c + d / e) - x * -y;";
        let root = parse("test", src).expect("parse");
        let stmt = root.child(0).unwrap().child(0).unwrap();
        assert_eq!(stmt.span.start, 0);
        assert_eq!(stmt.span.end, src.len());
    }

    #[test]
    fn regex_pattern_structure() {
        assert!(regex_pattern_is_valid("1"));
        assert!(regex_pattern_is_valid("[a-z]+|[0-9]+"));
        assert!(regex_pattern_is_valid("ab+(c|[de])*"));
        assert!(regex_pattern_is_valid(r"x(([_A-Za-z])[0-9_A-Za-z]*)y"));
        assert!(!regex_pattern_is_valid("("));
        assert!(!regex_pattern_is_valid("a("));
        assert!(!regex_pattern_is_valid("[]"));
        assert!(!regex_pattern_is_valid("*a"));
        assert!(!regex_pattern_is_valid("a|"));
    }
}
