use std::fmt;

#[derive(Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
    /// Literal text. For string literals, the unescaped contents without the
    /// surrounding quotes.
    pub text: String,
}

impl Token {
    pub fn new(kind: TokenKind, position: Position, text: impl Into<String>) -> Token {
        Token {
            kind,
            position,
            text: text.into(),
        }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({:?}, {:?}, {})", self.kind, self.text, self.position)
    }
}

/// Short form used by diagnostics, such as ``Integer `2` `` or `Eof`.
impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof | TokenKind::NewLine => write!(f, "{:?}", self.kind),
            kind => write!(f, "{kind:?} `{}`", self.text),
        }
    }
}

/// A 1-based line and column. Columns count characters, not bytes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Position {
    pub line: u32,
    pub column: u32,
}

impl Position {
    /// The position of the first character of a file.
    pub const START: Position = Position { line: 1, column: 1 };

    pub const fn new(line: u32, column: u32) -> Position {
        Position { line, column }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TokenKind {
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Comma,
    Colon,
    Semicolon,
    Dot,
    /// `=`
    Assign,
    /// `==`
    Equals,
    /// Separator synthesized by the scanner at the end of a line.
    NewLine,

    Integer,
    Decimal,
    String,

    /// Lower-case leading word, or a word made only of upper-case letters.
    Identifier,
    /// Upper-case leading word, such as `Int`.
    TypeIdentifier,
    /// A run without letters, such as `+`, `->` or `<=`.
    SymbolicIdentifier,

    Break,
    Continue,
    Return,

    Illegal,
    Eof,
}

impl TokenKind {
    /// Whether a line break after a token of this kind is a separator.
    pub fn ends_expression(self) -> bool {
        use TokenKind::*;
        matches!(
            self,
            Identifier
                | TypeIdentifier
                | SymbolicIdentifier
                | Integer
                | Decimal
                | String
                | RParen
                | RBracket
                | RBrace
        )
    }

    pub fn is_separator(self) -> bool {
        matches!(self, TokenKind::Comma | TokenKind::NewLine)
    }
}

/// Runs whose exact text overrides the identifier classification.
pub static RESERVED: phf::Map<&'static str, TokenKind> = phf::phf_map! {
    "break" => TokenKind::Break,
    "continue" => TokenKind::Continue,
    "return" => TokenKind::Return,
    "=" => TokenKind::Assign,
    "==" => TokenKind::Equals,
};
