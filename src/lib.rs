/// The lexer takes the source input, mapping it into a sequence of tokens.
pub mod lexer;

/// The parser takes a sequence of tokens, mapping it into a block of code
/// whose nodes carry their inferred types.
pub mod parser;

/// Placeholder backend for parsed units.
pub mod codegen;

pub mod ast;
pub mod source;
pub mod token;
pub mod types;

pub mod util {
    pub mod fmt;
    #[cfg(test)]
    pub(crate) mod test_utils;
}

use ast::Boc;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("lexical error: {0}")]
    Lexer(#[from] lexer::Error),
    #[error("syntax error: {0}")]
    Parser(#[from] parser::Error),
    #[error(transparent)]
    Source(#[from] source::Error),
}

/// Scans and parses a single file.
pub fn parse_source<S: AsRef<str>>(path_segments: &[S], src: &str) -> Result<Boc, Error> {
    let tokens = lexer::scan_in_new(src).map_err(|(_, error)| error)?;
    let boc = parser::parse(path_segments, &tokens)?;
    Ok(boc)
}
