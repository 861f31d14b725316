//! IPL Lexical Scanner
//!
//! Classifies raw source text into tokens on demand. The scanner holds no
//! mutable state: `token_at` is a pure function of a cursor position, so the
//! grammar engine backtracks simply by re-lexing from an earlier cursor.

use crate::syntax::{Position, Span};

/// The classification of a single lexeme.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TokenKind {
    // Literals and names
    Integer,
    Float,
    Str,
    Regex,
    Identifier,
    /// Primitive type keyword (`void`, `bool`, `int32`, `string`, ...).
    TypeName,

    // Keywords
    KwClass,
    KwLoop,
    KwPost,
    KwBreak,
    KwContinue,
    KwReturn,
    KwTrue,
    KwFalse,
    KwPublic,
    KwProtected,
    KwPrivate,
    KwVector,
    KwMap,

    // Multi-character operators
    OrOr,
    AndAnd,
    EqEq,
    EqTilde,
    Shl,
    Shr,
    ShlEq,
    ShrEq,
    PlusEq,
    MinusEq,
    StarEq,
    SlashEq,
    PercentEq,
    AmpEq,
    PipeEq,
    CaretEq,

    // Single-character operators and punctuation
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Lt,
    Gt,
    Comma,
    Semi,
    Colon,
    Dot,
    Eq,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Tilde,
    Amp,
    Pipe,
    Caret,

    /// End of input.
    Eof,
    /// A byte sequence no rule accepts (also unterminated strings/regexes).
    Unknown,
}

/// How `/` should be read at the requested position: as the division
/// operator, or as the opening delimiter of a regex literal. The grammar
/// requests `Regex` mode only where a regex literal may appear.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LexMode {
    Normal,
    Regex,
}

/// An immutable lexeme: classification, raw text, and the exact positions of
/// its first character and of the character just past it.
#[derive(Debug, Copy, Clone)]
pub struct Token<'src> {
    pub kind: TokenKind,
    pub text: &'src str,
    pub pos: Position,
    pub end: Position,
}

/// The scanner. Borrows the whole source buffer for the duration of a parse.
#[derive(Debug)]
pub struct Lexer<'src> {
    src: &'src str,
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src str) -> Self {
        Lexer { src }
    }

    pub fn source_len(&self) -> usize {
        self.src.len()
    }

    /// Produces the token starting at `cursor`, skipping any whitespace and
    /// `#` line comments first.
    pub fn token_at(&self, cursor: Position, mode: LexMode) -> Token<'src> {
        let start = self.skip_trivia(cursor);
        let Some(first) = self.char_at(start.offset) else {
            return self.make(TokenKind::Eof, start, start);
        };

        if mode == LexMode::Regex && first == '/' {
            return self.lex_regex(start);
        }
        if first.is_ascii_digit() || (first == '.' && self.digit_follows(start.offset + 1)) {
            return self.lex_number(start);
        }
        if first == '"' {
            return self.lex_string(start);
        }
        if first.is_ascii_alphabetic() || first == '_' {
            return self.lex_word(start);
        }
        self.lex_operator(start, first)
    }

    // ------------------------------------------------------------------
    // Trivia
    // ------------------------------------------------------------------

    fn skip_trivia(&self, mut cur: Position) -> Position {
        while let Some(ch) = self.char_at(cur.offset) {
            if ch.is_whitespace() {
                cur.advance(ch);
            } else if ch == '#' {
                while let Some(c) = self.char_at(cur.offset) {
                    cur.advance(c);
                    if c == '\n' {
                        break;
                    }
                }
            } else {
                break;
            }
        }
        cur
    }

    // ------------------------------------------------------------------
    // Literal classes
    // ------------------------------------------------------------------

    fn lex_number(&self, start: Position) -> Token<'src> {
        let mut cur = start;

        // Hexadecimal: 0x / 0X followed by at least one hex digit.
        if self.char_at(cur.offset) == Some('0') {
            let marker = self.char_at(cur.offset + 1);
            if matches!(marker, Some('x') | Some('X'))
                && self
                    .char_at(cur.offset + 2)
                    .is_some_and(|c| c.is_ascii_hexdigit())
            {
                cur.advance('0');
                cur.advance('x');
                while let Some(c) = self.char_at(cur.offset) {
                    if !c.is_ascii_hexdigit() {
                        break;
                    }
                    cur.advance(c);
                }
                return self.make(TokenKind::Integer, start, cur);
            }
        }

        let mut is_float = false;
        while let Some(c) = self.char_at(cur.offset) {
            if !c.is_ascii_digit() {
                break;
            }
            cur.advance(c);
        }
        // Fractional part: a bare trailing dot is still a float (`123.`).
        if self.char_at(cur.offset) == Some('.') {
            is_float = true;
            cur.advance('.');
            while let Some(c) = self.char_at(cur.offset) {
                if !c.is_ascii_digit() {
                    break;
                }
                cur.advance(c);
            }
        }
        // Exponent: only consumed when a digit actually follows the marker
        // (and an optional sign), otherwise `e` is left for the next token.
        if matches!(self.char_at(cur.offset), Some('e') | Some('E')) {
            let mut probe = cur.offset + 1;
            if matches!(self.char_at(probe), Some('+') | Some('-')) {
                probe += 1;
            }
            if self.char_at(probe).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                cur.advance('e');
                if let Some(sign @ ('+' | '-')) = self.char_at(cur.offset) {
                    cur.advance(sign);
                }
                while let Some(c) = self.char_at(cur.offset) {
                    if !c.is_ascii_digit() {
                        break;
                    }
                    cur.advance(c);
                }
            }
        }

        let kind = if is_float {
            TokenKind::Float
        } else {
            TokenKind::Integer
        };
        self.make(kind, start, cur)
    }

    fn lex_string(&self, start: Position) -> Token<'src> {
        let mut cur = start;
        cur.advance('"');
        while let Some(c) = self.char_at(cur.offset) {
            cur.advance(c);
            if c == '\\' {
                if let Some(escaped) = self.char_at(cur.offset) {
                    cur.advance(escaped);
                }
            } else if c == '"' {
                return self.make(TokenKind::Str, start, cur);
            }
        }
        self.make(TokenKind::Unknown, start, cur)
    }

    fn lex_regex(&self, start: Position) -> Token<'src> {
        let mut cur = start;
        cur.advance('/');
        while let Some(c) = self.char_at(cur.offset) {
            if c == '\n' {
                break;
            }
            cur.advance(c);
            if c == '\\' {
                if let Some(escaped) = self.char_at(cur.offset) {
                    cur.advance(escaped);
                }
            } else if c == '/' {
                return self.make(TokenKind::Regex, start, cur);
            }
        }
        self.make(TokenKind::Unknown, start, cur)
    }

    fn lex_word(&self, start: Position) -> Token<'src> {
        let mut cur = start;
        while let Some(c) = self.char_at(cur.offset) {
            if !c.is_ascii_alphanumeric() && c != '_' {
                break;
            }
            cur.advance(c);
        }
        let text = &self.src[start.offset..cur.offset];
        self.make(keyword_kind(text), start, cur)
    }

    // ------------------------------------------------------------------
    // Operators and punctuation (maximal munch)
    // ------------------------------------------------------------------

    fn lex_operator(&self, start: Position, first: char) -> Token<'src> {
        use TokenKind::*;
        let second = self.char_at(start.offset + 1);
        let third = self.char_at(start.offset + 2);

        let (kind, len) = match (first, second, third) {
            ('<', Some('<'), Some('=')) => (ShlEq, 3),
            ('>', Some('>'), Some('=')) => (ShrEq, 3),
            ('|', Some('|'), _) => (OrOr, 2),
            ('&', Some('&'), _) => (AndAnd, 2),
            ('=', Some('='), _) => (EqEq, 2),
            ('=', Some('~'), _) => (EqTilde, 2),
            ('<', Some('<'), _) => (Shl, 2),
            ('>', Some('>'), _) => (Shr, 2),
            ('+', Some('='), _) => (PlusEq, 2),
            ('-', Some('='), _) => (MinusEq, 2),
            ('*', Some('='), _) => (StarEq, 2),
            ('/', Some('='), _) => (SlashEq, 2),
            ('%', Some('='), _) => (PercentEq, 2),
            ('&', Some('='), _) => (AmpEq, 2),
            ('|', Some('='), _) => (PipeEq, 2),
            ('^', Some('='), _) => (CaretEq, 2),
            ('{', ..) => (LBrace, 1),
            ('}', ..) => (RBrace, 1),
            ('(', ..) => (LParen, 1),
            (')', ..) => (RParen, 1),
            ('[', ..) => (LBracket, 1),
            (']', ..) => (RBracket, 1),
            ('<', ..) => (Lt, 1),
            ('>', ..) => (Gt, 1),
            (',', ..) => (Comma, 1),
            (';', ..) => (Semi, 1),
            (':', ..) => (Colon, 1),
            ('.', ..) => (Dot, 1),
            ('=', ..) => (Eq, 1),
            ('+', ..) => (Plus, 1),
            ('-', ..) => (Minus, 1),
            ('*', ..) => (Star, 1),
            ('/', ..) => (Slash, 1),
            ('%', ..) => (Percent, 1),
            ('!', ..) => (Bang, 1),
            ('~', ..) => (Tilde, 1),
            ('&', ..) => (Amp, 1),
            ('|', ..) => (Pipe, 1),
            ('^', ..) => (Caret, 1),
            _ => (Unknown, 1),
        };

        let mut cur = start;
        for _ in 0..len {
            if let Some(c) = self.char_at(cur.offset) {
                cur.advance(c);
            }
        }
        self.make(kind, start, cur)
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn char_at(&self, offset: usize) -> Option<char> {
        if offset >= self.src.len() || !self.src.is_char_boundary(offset) {
            return None;
        }
        self.src[offset..].chars().next()
    }

    fn digit_follows(&self, offset: usize) -> bool {
        self.char_at(offset).is_some_and(|c| c.is_ascii_digit())
    }

    fn make(&self, kind: TokenKind, start: Position, end: Position) -> Token<'src> {
        Token {
            kind,
            text: &self.src[start.offset..end.offset],
            pos: start,
            end,
        }
    }
}

impl<'src> Token<'src> {
    pub fn span(&self) -> Span {
        Span::new(self.pos.offset, self.end.offset)
    }
}

/// Maps an identifier-shaped lexeme to its keyword classification, or leaves
/// it as an ordinary identifier.
fn keyword_kind(text: &str) -> TokenKind {
    use TokenKind::*;
    match text {
        "class" => KwClass,
        "loop" => KwLoop,
        "post" => KwPost,
        "break" => KwBreak,
        "continue" => KwContinue,
        "return" => KwReturn,
        "true" => KwTrue,
        "false" => KwFalse,
        "public" => KwPublic,
        "protected" => KwProtected,
        "private" => KwPrivate,
        "vector" => KwVector,
        "map" => KwMap,
        "void" | "bool" | "int" | "float" | "string" => TypeName,
        "int8" | "int16" | "int32" | "int64" => TypeName,
        "uint8" | "uint16" | "uint32" | "uint64" => TypeName,
        "sint8" | "sint16" | "sint32" | "sint64" => TypeName,
        _ => Identifier,
    }
}
