use log::{debug, trace};

use crate::{
    ast::{ArrayLit, BasicLit, Boc, DictLit, Node, ShortDeclaration, Variable},
    token::{Position, Token, TokenKind},
    types::Type,
};

type Result<T, E = Error> = std::result::Result<T, E>;

/// How deep expressions may nest before parsing gives up.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Parses a scanned file into its block of code.
///
/// The body becomes the innermost block. It is then wrapped once per path
/// segment, last to first, so `["parent", "child.yz"]` yields
/// `{parent: {child: <body>}}`.
pub fn parse<S: AsRef<str>>(path_segments: &[S], tokens: &[Token]) -> Result<Boc> {
    let file = path_segments
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<_>>()
        .join("/");
    let mut p = Parser {
        file,
        tokens,
        cursor: 0,
        depth: 0,
    };
    let mut boc = p.parse_file()?;
    debug!("parsed {:?} into {}", p.file, boc.ty);

    let last = path_segments.len().saturating_sub(1);
    for (i, segment) in path_segments.iter().enumerate().rev() {
        let segment = segment.as_ref();
        let name = if i == last {
            strip_extension(segment)
        } else {
            segment
        };
        boc = Boc::wrap(name, boc);
    }
    Ok(boc)
}

fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(i) if i > 0 => &name[..i],
        _ => name,
    }
}

struct Parser<'tok> {
    /// Path of the file, only used in diagnostics.
    file: String,
    tokens: &'tok [Token],
    cursor: usize,
    /// Expressions currently being parsed.
    depth: usize,
}

/// One entry of a bracketed literal.
enum Entry {
    Element(Node),
    Pair(Node, Node),
}

impl Parser<'_> {
    fn parse_file(&mut self) -> Result<Boc> {
        let expressions = self.parse_list(TokenKind::Eof, Parser::parse_expr)?;
        self.consume(TokenKind::Eof)?;
        Ok(Boc::from_expressions(Position::START, expressions))
    }

    fn parse_expr(&mut self) -> Result<Node> {
        if self.depth == MAX_NESTING_DEPTH {
            let actual = self.peek();
            return Err(self.error(actual, ErrorKind::TooDeep { actual: actual.clone() }));
        }
        self.depth += 1;
        let node = self.parse_term();
        self.depth -= 1;
        node
    }

    fn parse_term(&mut self) -> Result<Node> {
        let token = self.advance();
        let node = match token.kind {
            TokenKind::Integer | TokenKind::Decimal | TokenKind::String => {
                Node::BasicLit(BasicLit::new(token))
            }

            // Variable, or short declaration: ID : expr
            TokenKind::Identifier => {
                let variable = Variable::new(token.position, token.text.as_str());
                if self.take(TokenKind::Colon) {
                    let value = self.parse_expr()?;
                    Node::ShortDeclaration(ShortDeclaration::new(variable, value))
                } else {
                    Node::Variable(variable)
                }
            }

            // Nested block: { body }
            TokenKind::LBrace => {
                let expressions = self.parse_list(TokenKind::RBrace, Parser::parse_expr)?;
                self.consume(TokenKind::RBrace)?;
                Node::Boc(Boc::from_expressions(token.position, expressions))
            }

            TokenKind::LBracket => self.parse_bracketed(token)?,

            TokenKind::Break | TokenKind::Continue | TokenKind::Return => {
                return self.parse_statement(token);
            }

            _ => {
                let actual = token.clone();
                return Err(self.error(token, ErrorKind::UnexpectedTokenInExpr { actual }));
            }
        };
        trace!("{} at {}", node.ty(), node.position());
        Ok(node)
    }

    /// Parses what follows a `[`: a typed empty array, a typed empty
    /// dictionary, or a list of elements.
    fn parse_bracketed(&mut self, open: &Token) -> Result<Node> {
        let position = open.position;

        // []T
        if self.take(TokenKind::RBracket) {
            let element = self.parse_type_name()?;
            return Ok(Node::ArrayLit(ArrayLit::typed_empty(position, element)));
        }

        // [K]V
        let first = self.advance();
        if first.kind == TokenKind::TypeIdentifier && self.take(TokenKind::RBracket) {
            let key = Type::from_name(&first.text);
            let value = self.parse_type_name()?;
            return Ok(Node::DictLit(DictLit::typed_empty(position, key, value)));
        }
        self.rewind(1);

        let mut is_dict = None;
        let entries = self.parse_list(TokenKind::RBracket, |p| p.parse_entry(&mut is_dict))?;
        self.consume(TokenKind::RBracket)?;

        if is_dict == Some(true) {
            let mut keys = Vec::with_capacity(entries.len());
            let mut values = Vec::with_capacity(entries.len());
            for entry in entries {
                if let Entry::Pair(key, value) = entry {
                    keys.push(key);
                    values.push(value);
                }
            }
            Ok(Node::DictLit(DictLit::new(position, keys, values)))
        } else {
            let elements = entries
                .into_iter()
                .filter_map(|entry| match entry {
                    Entry::Element(element) => Some(element),
                    Entry::Pair(..) => None,
                })
                .collect();
            Ok(Node::ArrayLit(ArrayLit::new(position, elements)))
        }
    }

    /// The first entry commits the whole literal: a `key: value` pair makes
    /// it a dictionary, anything else an array.
    fn parse_entry(&mut self, is_dict: &mut Option<bool>) -> Result<Entry> {
        let expr = self.parse_expr()?;
        let is_dict = *is_dict.get_or_insert_with(|| {
            matches!(expr, Node::ShortDeclaration(_)) || self.is(TokenKind::Colon)
        });
        if !is_dict {
            return Ok(Entry::Element(expr));
        }
        match expr {
            Node::ShortDeclaration(decl) => {
                // The key is a name, not a binding.
                let ShortDeclaration {
                    variable, value, ..
                } = decl;
                let key = Variable::new(variable.position, variable.name);
                Ok(Entry::Pair(Node::Variable(key), *value))
            }
            key => {
                self.consume(TokenKind::Colon)?;
                let value = self.parse_expr()?;
                Ok(Entry::Pair(key, value))
            }
        }
    }

    fn parse_type_name(&mut self) -> Result<Type> {
        let token = self.consume(TokenKind::TypeIdentifier)?;
        Ok(Type::from_name(&token.text))
    }

    /// Statements have no grammar yet.
    fn parse_statement(&mut self, token: &Token) -> Result<Node> {
        let actual = token.clone();
        Err(self.error(token, ErrorKind::StatementNotImplemented { actual }))
    }

    /// Parses `item (SEP item)* [SEP]` until `end_delim` (or the end of input)
    /// is found, where SEP is a comma or a line break. Does **NOT** consume
    /// the end delimiter.
    fn parse_list<T>(
        &mut self,
        end_delim: TokenKind,
        mut parse_item: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        let mut items = Vec::new();
        while self.except([end_delim]) {
            items.push(parse_item(self)?);

            // After an item we must see a separator or the end of the list.
            if !self.take_separator() {
                if self.is(end_delim) || self.is(TokenKind::Eof) {
                    break;
                }
                let c = self.peek();
                return Err(self.error(
                    c,
                    ErrorKind::UnexpectedAny {
                        actual: c.clone(),
                        expected: Box::from([TokenKind::Comma, TokenKind::NewLine, end_delim]),
                    },
                ));
            }
        }
        Ok(items)
    }
}

impl<'tok> Parser<'tok> {
    /// Returns the current token. Past the end of the buffer this is a
    /// synthetic end-of-input token.
    #[inline]
    fn peek(&self) -> &'tok Token {
        static EOF: Token = Token {
            kind: TokenKind::Eof,
            position: Position::new(0, 0),
            text: String::new(),
        };
        self.tokens.get(self.cursor).unwrap_or(&EOF)
    }

    /// Returns the current token and advances.
    fn advance(&mut self) -> &'tok Token {
        let c = self.peek();
        self.cursor += 1;
        c
    }

    /// Moves the cursor back by `n` tokens.
    fn rewind(&mut self, n: usize) {
        debug_assert!(n <= self.cursor, "rewind past the first token");
        self.cursor -= n;
    }

    /// Checks whether the current token matches the given one.
    fn is(&self, expect: TokenKind) -> bool {
        self.peek().kind == expect
    }

    /// Advances if the current token matches the provided one, returning true.
    /// If not, returns false and doesn't advance.
    fn take(&mut self, expect: TokenKind) -> bool {
        if self.is(expect) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn take_separator(&mut self) -> bool {
        if self.peek().kind.is_separator() {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Advances if the current token matches the provided one. If not, fails.
    fn consume(&mut self, expect: TokenKind) -> Result<&'tok Token> {
        let c = self.peek();
        if c.kind == expect {
            self.advance();
            Ok(c)
        } else {
            Err(self.error(
                c,
                ErrorKind::Unexpected {
                    actual: c.clone(),
                    expected: expect,
                },
            ))
        }
    }

    /// Returns true while the current token does *not* match one of the
    /// provided ones. [`TokenKind::Eof`] is implicitly included in the list.
    ///
    /// This won't advance the cursor.
    fn except(&self, except: impl IntoIterator<Item = TokenKind>) -> bool {
        let c = self.peek();
        c.kind != TokenKind::Eof && except.into_iter().all(|e| c.kind != e)
    }

    fn error(&self, at: &Token, kind: ErrorKind) -> Error {
        Error {
            file: self.file.clone(),
            position: at.position,
            kind,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{file}:{position}: {kind}")]
pub struct Error {
    pub file: String,
    pub position: Position,
    pub kind: ErrorKind,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    #[error("expected {expected:?}, got {actual}")]
    Unexpected { actual: Token, expected: TokenKind },
    #[error("expected one of {expected:?}, got {actual}")]
    UnexpectedAny {
        actual: Token,
        expected: Box<[TokenKind]>,
    },
    #[error("unexpected {actual} in expression")]
    UnexpectedTokenInExpr { actual: Token },
    #[error("statements are not implemented, found {actual}")]
    StatementNotImplemented { actual: Token },
    #[error("expressions nest deeper than {} levels at {actual}", MAX_NESTING_DEPTH)]
    TooDeep { actual: Token },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::{fmt::tree, test_utils::tree_tests};
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    tree_tests!(
        fn test_integer_literal() {
            let source = "1";
            let tree_ok = "
                boc (1:1 %: {})
                  int 1 (1:1 %: Int)
            ";
        }

        fn test_decimal_literal() {
            let source = "1.0";
            let tree_ok = "
                boc (1:1 %: {})
                  decimal 1.0 (1:1 %: Decimal)
            ";
        }

        fn test_string_literal() {
            let source = r#""x""#;
            let tree_ok = r#"
                boc (1:1 %: {})
                  string "x" (1:1 %: String)
            "#;
        }

        fn test_boolean_like_identifier() {
            let source = "false";
            let tree_ok = "
                boc (1:1 %: {})
                  variable false (1:1 %: TBD)
            ";
        }

        fn test_empty_file() {
            let source = "  // nothing here\n";
            let tree_ok = "boc (1:1 %: {})";
        }

        fn test_short_declaration() {
            let source = "a: 1";
            let tree_ok = "
                boc (1:1 %: {a: Int})
                  declaration a (1:1 %: Int)
                    int 1 (1:4 %: Int)
            ";
        }

        fn test_declaration_of_variable() {
            let source = "a: b";
            let tree_ok = "
                boc (1:1 %: {a: TBD})
                  declaration a (1:1 %: TBD)
                    variable b (1:4 %: TBD)
            ";
        }

        fn test_separators() {
            let source = "a: 1, b: 2.5\nc: 'x'\n";
            let tree_ok = r#"
                boc (1:1 %: {a: Int, b: Decimal, c: String})
                  declaration a (1:1 %: Int)
                    int 1 (1:4 %: Int)
                  declaration b (1:7 %: Decimal)
                    decimal 2.5 (1:10 %: Decimal)
                  declaration c (2:1 %: String)
                    string "x" (2:4 %: String)
            "#;
        }

        fn test_duplicate_declarations_are_kept() {
            let source = "a: 1\na: \"x\"";
            let tree_ok = r#"
                boc (1:1 %: {a: Int, a: String})
                  declaration a (1:1 %: Int)
                    int 1 (1:4 %: Int)
                  declaration a (2:1 %: String)
                    string "x" (2:4 %: String)
            "#;
        }

        fn test_array_literal() {
            let source = "[1, 2, 3]";
            let tree_ok = "
                boc (1:1 %: {})
                  array (1:1 %: []Int)
                    int 1 (1:2 %: Int)
                    int 2 (1:5 %: Int)
                    int 3 (1:8 %: Int)
            ";
        }

        fn test_array_element_type_from_first() {
            let source = r#"[1.5, "x", y]"#;
            let tree_ok = r#"
                boc (1:1 %: {})
                  array (1:1 %: []Decimal)
                    decimal 1.5 (1:2 %: Decimal)
                    string "x" (1:7 %: String)
                    variable y (1:12 %: TBD)
            "#;
        }

        fn test_array_one_per_line() {
            let source = "[\n  1\n  2,\n  3\n]";
            let tree_ok = "
                boc (1:1 %: {})
                  array (1:1 %: []Int)
                    int 1 (2:3 %: Int)
                    int 2 (3:3 %: Int)
                    int 3 (4:3 %: Int)
            ";
        }

        fn test_array_trailing_comma() {
            let source = "[1, 2,]";
            let tree_ok = "
                boc (1:1 %: {})
                  array (1:1 %: []Int)
                    int 1 (1:2 %: Int)
                    int 2 (1:5 %: Int)
            ";
        }

        fn test_nested_arrays() {
            let source = "[[1], []Int]";
            let tree_ok = "
                boc (1:1 %: {})
                  array (1:1 %: [][]Int)
                    array (1:2 %: []Int)
                      int 1 (1:3 %: Int)
                    array (1:7 %: []Int)
            ";
        }

        fn test_typed_empty_array() {
            let source = "[]Int";
            let tree_ok = "
                boc (1:1 %: {})
                  array (1:1 %: []Int)
            ";
        }

        fn test_typed_empty_array_of_user_type() {
            let source = "[]Person";
            let tree_ok = "
                boc (1:1 %: {})
                  array (1:1 %: []TBD)
            ";
        }

        fn test_dict_literal() {
            let source = "[k1:v1, k2:v2]";
            let tree_ok = "
                boc (1:1 %: {})
                  dict (1:1 %: [TBD]TBD)
                    entry
                      variable k1 (1:2 %: TBD)
                      variable v1 (1:5 %: TBD)
                    entry
                      variable k2 (1:9 %: TBD)
                      variable v2 (1:12 %: TBD)
            ";
        }

        fn test_dict_with_literal_keys() {
            let source = r#"["a": 1, "b": 2]"#;
            let tree_ok = r#"
                boc (1:1 %: {})
                  dict (1:1 %: [String]Int)
                    entry
                      string "a" (1:2 %: String)
                      int 1 (1:7 %: Int)
                    entry
                      string "b" (1:10 %: String)
                      int 2 (1:15 %: Int)
            "#;
        }

        fn test_dict_mixed_key_forms() {
            let source = r#"[a: 1, "b": 2]"#;
            let tree_ok = r#"
                boc (1:1 %: {})
                  dict (1:1 %: [TBD]Int)
                    entry
                      variable a (1:2 %: TBD)
                      int 1 (1:5 %: Int)
                    entry
                      string "b" (1:8 %: String)
                      int 2 (1:13 %: Int)
            "#;
        }

        fn test_typed_empty_dict() {
            let source = "[String]Int";
            let tree_ok = "
                boc (1:1 %: {})
                  dict (1:1 %: [String]Int)
            ";
        }

        fn test_declared_containers() {
            let source = "xs: [1]\nm: [String]Decimal";
            let tree_ok = "
                boc (1:1 %: {xs: []Int, m: [String]Decimal})
                  declaration xs (1:1 %: []Int)
                    array (1:5 %: []Int)
                      int 1 (1:6 %: Int)
                  declaration m (2:1 %: [String]Decimal)
                    dict (2:4 %: [String]Decimal)
            ";
        }

        fn test_nested_boc() {
            let source = "{\n  a: 1\n  b: \"x\"\n}";
            let tree_ok = r#"
                boc (1:1 %: {})
                  boc (1:1 %: {a: Int, b: String})
                    declaration a (2:3 %: Int)
                      int 1 (2:6 %: Int)
                    declaration b (3:3 %: String)
                      string "x" (3:6 %: String)
            "#;
        }

        fn test_declared_boc() {
            let source = "point: { x: 1, y: 2 }";
            let tree_ok = "
                boc (1:1 %: {point: {x: Int, y: Int}})
                  declaration point (1:1 %: {x: Int, y: Int})
                    boc (1:8 %: {x: Int, y: Int})
                      declaration x (1:10 %: Int)
                        int 1 (1:13 %: Int)
                      declaration y (1:16 %: Int)
                        int 2 (1:19 %: Int)
            ";
        }

        fn test_empty_boc() {
            let source = "{}";
            let tree_ok = "
                boc (1:1 %: {})
                  boc (1:1 %: {})
            ";
        }

        fn test_multiline_comment_separates() {
            let source = "a: 1 /* c\n */ b: 2";
            let tree_ok = "
                boc (1:1 %: {a: Int, b: Int})
                  declaration a (1:1 %: Int)
                    int 1 (1:4 %: Int)
                  declaration b (2:5 %: Int)
                    int 2 (2:8 %: Int)
            ";
        }

        fn test_unspaced_assign_is_not_an_expression() {
            let source = "x=1";
            let expected_errors = &["1:2: expected one of [Comma, NewLine, Eof], got Assign `=`"];
        }

        fn test_trailing_dot_decimal() {
            let source = "r: 1.";
            let tree_ok = "
                boc (1:1 %: {r: Decimal})
                  declaration r (1:1 %: Decimal)
                    decimal 1. (1:4 %: Decimal)
            ";
        }

        fn test_comments_between_expressions() {
            let source = "1 // one\n/* two\n three */ 2";
            let tree_ok = "
                boc (1:1 %: {})
                  int 1 (1:1 %: Int)
                  int 2 (3:11 %: Int)
            ";
        }

        fn test_error_missing_separator() {
            let source = "1 2";
            let expected_errors = &["1:3: expected one of [Comma, NewLine, Eof], got Integer `2`"];
        }

        fn test_error_unclosed_boc() {
            let source = "{1";
            let expected_errors = &["1:3: expected RBrace, got Eof"];
        }

        fn test_error_unclosed_array() {
            let source = "[1, 2";
            let expected_errors = &["1:6: expected RBracket, got Eof"];
        }

        fn test_error_empty_array_without_type() {
            let source = "[]";
            let expected_errors = &["1:3: expected TypeIdentifier, got Eof"];
        }

        fn test_error_empty_dict_without_value_type() {
            let source = "[String]";
            let expected_errors = &["1:9: expected TypeIdentifier, got Eof"];
        }

        fn test_error_dict_entry_without_value() {
            let source = "[a: 1, 2]";
            let expected_errors = &["1:9: expected Colon, got RBracket `]`"];
        }

        fn test_error_array_with_pair() {
            let source = r#"[1, "a": 2]"#;
            let expected_errors = &["1:8: expected one of [Comma, NewLine, RBracket], got Colon `:`"];
        }

        fn test_error_unexpected_token() {
            let source = "}";
            let expected_errors = &["1:1: unexpected RBrace `}` in expression"];
        }

        fn test_error_type_name_in_expression() {
            let source = "Int";
            let expected_errors = &["1:1: unexpected TypeIdentifier `Int` in expression"];
        }

        fn test_error_double_separator() {
            let source = "[1,,2]";
            let expected_errors = &["1:4: unexpected Comma `,` in expression"];
        }

        fn test_error_statement() {
            let source = "return";
            let expected_errors = &["1:1: statements are not implemented, found Return `return`"];
        }

        fn test_error_declaration_without_value() {
            let source = "a:";
            let expected_errors = &["1:3: unexpected Eof in expression"];
        }

        fn test_error_lexical() {
            let source = "a: `b`";
            let expected_errors = &["1:4: unsupported quote character '`'"];
        }
    );

    #[test]
    fn test_deep_nesting_is_an_error() {
        let src = "[".repeat(100_000);
        let tokens = crate::lexer::scan_in_new(&src).expect("scans");
        let error = parse(&["deep.yz"], &tokens).expect_err("too deep");
        assert!(matches!(error.kind, ErrorKind::TooDeep { .. }), "{error}");
        assert_eq!(error.position, Position::new(1, 257));

        let src = format!("{}1{}", "[".repeat(100), "]".repeat(100));
        let tokens = crate::lexer::scan_in_new(&src).expect("scans");
        let boc = parse(&["deep.yz"], &tokens).expect("within the limit");
        assert!(boc.ty.to_string().contains("[]Int"));
    }

    fn eof() -> Vec<Token> {
        vec![Token::new(TokenKind::Eof, Position::START, "")]
    }

    #[test]
    fn test_path_nesting() {
        let boc = parse(&["parent", "simple"], &eof()).expect("empty input parses");
        assert_eq!(
            tree::print_boc_string(&boc),
            indoc! {"
                boc (1:1 %: {parent: {simple: {}}})
                  declaration parent (1:1 %: {simple: {}})
                    boc (1:1 %: {simple: {}})
                      declaration simple (1:1 %: {})
                        boc (1:1 %: {})
            "}
        );
    }

    #[test]
    fn test_path_nesting_three_levels() {
        let boc = parse(&["a", "b", "c.yz"], &eof()).expect("empty input parses");
        assert_eq!(boc.ty.to_string(), "{a: {b: {c: {}}}}");

        let mut depth = 0;
        let mut current = &boc;
        while let [Node::ShortDeclaration(decl)] = current.expressions.as_slice() {
            let Node::Boc(inner) = decl.value.as_ref() else {
                panic!("wrapped value must be a block");
            };
            depth += 1;
            current = inner;
        }
        assert_eq!(depth, 3);
        assert!(current.is_empty());
    }

    #[test]
    fn test_path_keeps_leaf_content() {
        let tokens = crate::lexer::scan_in_new("x: 1").expect("scans");
        let boc = parse(&["dir", "file.yz"], &tokens).expect("parses");
        assert_eq!(boc.ty.to_string(), "{dir: {file: {x: Int}}}");
    }

    #[test]
    fn test_strip_extension() {
        assert_eq!(strip_extension("main.yz"), "main");
        assert_eq!(strip_extension("a.b.yz"), "a.b");
        assert_eq!(strip_extension(".hidden"), ".hidden");
        assert_eq!(strip_extension("plain"), "plain");
    }

    #[test]
    fn test_error_names_file() {
        let tokens = crate::lexer::scan_in_new("1 2").expect("scans");
        let error = parse(&["src", "main.yz"], &tokens).expect_err("missing separator");
        assert_eq!(error.file, "src/main.yz");
        assert_eq!(
            error.to_string(),
            "src/main.yz:1:3: expected one of [Comma, NewLine, Eof], got Integer `2`"
        );
    }

    #[test]
    fn test_printing_is_idempotent() {
        let src = include_str!("../demos/sample.yz");
        let tokens = crate::lexer::scan_in_new(src).expect("sample scans");
        let boc = parse(&["sample.yz"], &tokens).expect("sample parses");
        let first = tree::print_boc_string(&boc);
        let second = tree::print_boc_string(&boc);
        assert!(!first.is_empty());
        assert_eq!(first, second);
    }
}
