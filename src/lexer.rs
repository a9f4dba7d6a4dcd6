use std::{iter::Peekable, str::Chars};

use log::{debug, trace};

use crate::token::{Position, Token, TokenKind, RESERVED};

pub const SUGGESTED_TOKENS_CAPACITY: usize = 1_024;

pub type ScanResult = Result<Vec<Token>, (Vec<Token>, Error)>;

/// Scans the provided string, producing the tokens into the provided buffer.
///
/// The buffer always ends with an [`TokenKind::Eof`] token, even on failure.
/// On failure, the offending text is pushed as an [`TokenKind::Illegal`]
/// token right before it.
pub fn scan(src: &str, tokens: &mut Vec<Token>) -> Result<(), Error> {
    Scanner::new(src, tokens).scan()
}

/// A convenience function that allocates a new buffer per scanned input and
/// returns it, along with the error, if any.
pub fn scan_in_new(src: &str) -> ScanResult {
    let mut tokens = Vec::with_capacity(SUGGESTED_TOKENS_CAPACITY);
    match scan(src, &mut tokens) {
        Ok(()) => Ok(tokens),
        Err(error) => Err((tokens, error)),
    }
}

/// The yz scanner
struct Scanner<'src, 'tok> {
    src: &'src str,
    iter: Peekable<Chars<'src>>,
    cursor: usize,
    current_lo: usize,
    line: u32,
    /// Characters consumed in the current line.
    column: u32,
    mark: Position,
    tokens: &'tok mut Vec<Token>,
}

impl Scanner<'_, '_> {
    /// Scans the source string until the input is exhausted or an error is
    /// found.
    fn scan(mut self) -> Result<(), Error> {
        assert_eq!(self.tokens.len(), 0, "must pass clean tokens buffer");
        let result = self.scan_tokens();
        if let Err(ref error) = result {
            let illegal = Token::new(TokenKind::Illegal, error.position, error.text.clone());
            self.tokens.push(illegal);
        }
        let eof = Token::new(TokenKind::Eof, self.next_position(), "");
        self.tokens.push(eof);
        debug!("scanned {} tokens", self.tokens.len());
        result
    }

    fn scan_tokens(&mut self) -> Result<(), Error> {
        while let Some(c) = self.mark_advance() {
            self.scan_token(c)?;
        }
        Ok(())
    }

    /// Tries to scan a token that starts with the current character.
    fn scan_token(&mut self, c: char) -> Result<(), Error> {
        use TokenKind::*;
        let kind = match c {
            '\n' => {
                self.line_break();
                return Ok(());
            }
            c if c.is_whitespace() => return Ok(()),
            '/' if self.peek() == Some('/') => {
                self.inline_comment();
                return Ok(());
            }
            '/' if self.peek() == Some('*') => return self.block_comment(),
            '(' => LParen,
            ')' => RParen,
            '{' => LBrace,
            '}' => RBrace,
            '[' => LBracket,
            ']' => RBracket,
            ',' => Comma,
            ':' => Colon,
            ';' => Semicolon,
            '.' => Dot,
            '=' if self.peek() == Some('=') => {
                self.advance();
                Equals
            }
            '=' if !self.peek().is_some_and(is_symbol_char) => Assign,
            '"' | '\'' => {
                let text = self.string(c)?;
                self.produce_text(String, text);
                return Ok(());
            }
            c if is_unsupported_quote(c) => {
                return Err(self.error(ErrorKind::UnsupportedQuote(c)));
            }
            c if c.is_ascii_digit() => self.number(),
            '-' if self.peek().is_some_and(|c| c.is_ascii_digit()) => self.number(),
            c if is_word_char(c) => self.identifier_or_reserved(),
            c => return Err(self.error(ErrorKind::UnexpectedChar(c))),
        };
        self.produce(kind);
        Ok(())
    }

    /// Emits a separator if the line ends an expression.
    fn line_break(&mut self) {
        self.separate_at(self.mark);
    }

    fn separate_at(&mut self, position: Position) {
        let ends_expression = self
            .tokens
            .last()
            .is_some_and(|token| token.kind.ends_expression());
        if ends_expression {
            let token = Token::new(TokenKind::NewLine, position, "\n");
            trace!("{token:?}");
            self.tokens.push(token);
        }
    }

    /// Tries to scan a string token. Escapes are only resolved once the whole
    /// token has been scanned, and only if any were seen, which avoids a
    /// growing buffer for the common case.
    fn string(&mut self, quote: char) -> Result<String, Error> {
        let lo = self.cursor;
        let mut has_escaped = false;
        let mut is_escaping = false;
        loop {
            let hi = self.cursor;
            match (is_escaping, self.advance()) {
                (_, None) => return Err(self.error(ErrorKind::UnclosedString)),
                (false, Some(c)) if c == quote => {
                    let raw = &self.src[lo..hi];
                    return Ok(if has_escaped {
                        perform_escape(raw)
                    } else {
                        raw.to_owned()
                    });
                }
                (false, Some('\\')) => {
                    has_escaped = true;
                    is_escaping = true;
                }
                (_, Some(_)) => is_escaping = false,
            }
        }
    }

    /// Scans a word run. Once the run holds a letter or digit, `=` ends it,
    /// so `x=1` is `x`, `=` and `1` while `<=` stays one run.
    fn identifier_or_reserved(&mut self) -> TokenKind {
        let mut is_alphanumeric = self.substr().chars().any(char::is_alphanumeric);
        while let Some(c) = self.peek() {
            if !is_word_char(c)
                || (c == '/' && matches!(self.peek_second(), Some('/' | '*')))
                || (c == '=' && is_alphanumeric)
            {
                break;
            }
            is_alphanumeric |= c.is_alphanumeric();
            self.advance();
        }
        let word = self.substr();
        if let Some(reserved) = RESERVED.get(word) {
            return *reserved;
        }
        classify_word(word)
    }

    /// Scans digits with at most one `.`. A second dot ends the literal, so
    /// `1.2.3` is `1.2`, `.` and `3`, and `1.` is a decimal.
    fn number(&mut self) -> TokenKind {
        let mut is_decimal = false;
        loop {
            match self.peek() {
                Some(c) if c.is_ascii_digit() => {}
                Some('.') if !is_decimal => is_decimal = true,
                _ => break,
            }
            self.advance();
        }
        if is_decimal {
            TokenKind::Decimal
        } else {
            TokenKind::Integer
        }
    }

    /// Skips through the end of the line. The line break itself is left for
    /// the main loop, so it can still act as a separator.
    fn inline_comment(&mut self) {
        while !matches!(self.peek(), Some('\n') | None) {
            self.advance();
        }
    }

    /// Skips a (possibly nested) `/* ... */` comment. A comment spanning lines
    /// separates like its first line break would.
    fn block_comment(&mut self) -> Result<(), Error> {
        assert_eq!(self.advance(), Some('*'));
        let mut depth = 1_u32;
        let mut line_break = None;
        while depth > 0 {
            let position = self.next_position();
            match self.advance() {
                Some('\n') if line_break.is_none() => line_break = Some(position),
                Some('*') if self.peek() == Some('/') => {
                    self.advance();
                    depth -= 1;
                }
                Some('/') if self.peek() == Some('*') => {
                    self.advance();
                    depth += 1;
                }
                Some(_) => continue,
                None => return Err(self.error(ErrorKind::UnclosedComment)),
            }
        }
        if let Some(position) = line_break {
            self.separate_at(position);
        }
        Ok(())
    }
}

impl Scanner<'_, '_> {
    /// Constructs a new scanner with the default state.
    fn new<'src, 'tok>(src: &'src str, tokens: &'tok mut Vec<Token>) -> Scanner<'src, 'tok> {
        Scanner {
            src,
            iter: src.chars().peekable(),
            cursor: 0,
            current_lo: 0,
            line: 1,
            column: 0,
            mark: Position::START,
            tokens,
        }
    }

    /// Starts a new token "mark" and advances the iterator.
    fn mark_advance(&mut self) -> Option<char> {
        self.current_lo = self.cursor;
        self.mark = self.next_position();
        self.advance()
    }

    /// Returns the next character and advances the iterator, keeping track of
    /// lines and columns.
    fn advance(&mut self) -> Option<char> {
        let c = self.iter.next()?;
        self.cursor += c.len_utf8();
        if c == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    /// Returns the next character without advancing the iterator.
    fn peek(&mut self) -> Option<char> {
        self.iter.peek().copied()
    }

    /// Returns the character after the next one without advancing.
    fn peek_second(&self) -> Option<char> {
        let mut iter = self.iter.clone();
        iter.next();
        iter.next()
    }

    /// Position of the character that would be consumed next.
    fn next_position(&self) -> Position {
        Position::new(self.line, self.column + 1)
    }

    /// Returns the substring of the current marked bounds.
    fn substr(&self) -> &str {
        &self.src[self.current_lo..self.cursor]
    }

    /// Produces a token using the marked bounds as its text.
    fn produce(&mut self, kind: TokenKind) {
        let text = self.substr().to_owned();
        self.produce_text(kind, text);
    }

    fn produce_text(&mut self, kind: TokenKind, text: String) {
        let token = Token::new(kind, self.mark, text);
        trace!("{token:?}");
        self.tokens.push(token);
    }

    /// Builds an error at the current mark, holding the text scanned so far.
    fn error(&self, kind: ErrorKind) -> Error {
        Error {
            position: self.mark,
            kind,
            text: self.substr().to_owned(),
        }
    }
}

fn is_delimiter(c: char) -> bool {
    matches!(c, '(' | ')' | '{' | '}' | '[' | ']' | ',' | ':' | ';' | '.')
}

/// Characters that continue a symbolic run after a leading `=`, as in `=>`.
fn is_symbol_char(c: char) -> bool {
    is_word_char(c) && !c.is_alphanumeric() && c != '='
}

fn is_unsupported_quote(c: char) -> bool {
    c == '`'
}

/// Whether the character can be part of an identifier run.
fn is_word_char(c: char) -> bool {
    !c.is_whitespace()
        && !c.is_control()
        && !is_delimiter(c)
        && !matches!(c, '"' | '\'')
        && !is_unsupported_quote(c)
}

fn classify_word(word: &str) -> TokenKind {
    let first_upper = word.chars().next().is_some_and(char::is_uppercase);
    if word.chars().all(char::is_uppercase) {
        TokenKind::Identifier
    } else if first_upper {
        TokenKind::TypeIdentifier
    } else if !word.chars().any(char::is_alphabetic) {
        TokenKind::SymbolicIdentifier
    } else {
        TokenKind::Identifier
    }
}

fn perform_escape(raw: &str) -> String {
    let mut buf = String::with_capacity(raw.len());
    let mut escaped = false;
    for char in raw.chars() {
        let char = match (escaped, char) {
            (true, 'n') => '\n',
            (true, 't') => '\t',
            (true, c @ ('\\' | '"' | '\'')) => c,
            (true, other) => {
                // Unknown escapes are kept as written.
                buf.push('\\');
                other
            }
            (false, '\\') => {
                escaped = true;
                continue;
            }
            (false, char) => char,
        };
        escaped = false;
        buf.push(char);
    }
    buf.shrink_to_fit();
    buf
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{position}: {kind}")]
pub struct Error {
    pub position: Position,
    pub kind: ErrorKind,
    /// The offending text, starting at `position`.
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    #[error("unexpected character {0:?}")]
    UnexpectedChar(char),
    #[error("unsupported quote character {0:?}")]
    UnsupportedQuote(char),
    #[error("unclosed string literal")]
    UnclosedString,
    #[error("unclosed block comment")]
    UnclosedComment,
}
