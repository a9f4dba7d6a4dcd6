use std::io::Write;

use crate::{ast::*, token::TokenKind};

const INDENT_WIDTH: usize = 2;

pub fn print_boc_string(boc: &Boc) -> String {
    let mut buf = Vec::with_capacity(1024);
    print_boc(&mut buf, 0, boc).unwrap();
    String::from_utf8(buf).unwrap()
}

pub fn print_node_string(node: &Node) -> String {
    let mut buf = Vec::with_capacity(512);
    print_node(&mut buf, 0, node).unwrap();
    String::from_utf8(buf).unwrap()
}

pub fn print_boc(w: &mut impl Write, i: usize, boc: &Boc) -> std::io::Result<()> {
    sp(w, i)?;
    writeln!(w, "boc ({} %: {})", boc.position, boc.ty)?;
    for expr in &boc.expressions {
        print_node(w, i + 1, expr)?;
    }
    for stmt in &boc.statements {
        print_node(w, i + 1, stmt)?;
    }
    Ok(())
}

pub fn print_node(w: &mut impl Write, i: usize, node: &Node) -> std::io::Result<()> {
    let info = Info(node);
    match node {
        Node::BasicLit(BasicLit { kind, text, .. }) => {
            sp(w, i)?;
            match kind {
                TokenKind::Integer => writeln!(w, "int {text} ({info})")?,
                TokenKind::Decimal => writeln!(w, "decimal {text} ({info})")?,
                TokenKind::String => writeln!(w, "string {text:?} ({info})")?,
                other => writeln!(w, "literal {other:?} {text:?} ({info})")?,
            }
        }
        Node::Variable(Variable { name, .. }) => {
            sp(w, i)?;
            writeln!(w, "variable {name} ({info})")?;
        }
        Node::ShortDeclaration(ShortDeclaration {
            variable, value, ..
        }) => {
            sp(w, i)?;
            writeln!(w, "declaration {} ({info})", variable.name)?;
            print_node(w, i + 1, value)?;
        }
        Node::ArrayLit(ArrayLit { elements, .. }) => {
            sp(w, i)?;
            writeln!(w, "array ({info})")?;
            for element in elements {
                print_node(w, i + 1, element)?;
            }
        }
        Node::DictLit(dict) => {
            sp(w, i)?;
            writeln!(w, "dict ({info})")?;
            for (key, value) in dict.entries() {
                sp(w, i + 1)?;
                writeln!(w, "entry")?;
                print_node(w, i + 2, key)?;
                print_node(w, i + 2, value)?;
            }
        }
        Node::Boc(boc) => print_boc(w, i, boc)?,
    }
    Ok(())
}

fn sp(w: &mut impl Write, i: usize) -> std::io::Result<()> {
    write!(w, "{:width$}", "", width = i * INDENT_WIDTH)
}

/// Writes `position %: type`.
struct Info<'a>(&'a Node);

impl std::fmt::Display for Info<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} %: {}", self.0.position(), self.0.ty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{token::Position, types::Type};
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_print_every_variant() {
        let lit = |kind: TokenKind, text: &str, line: u32, column: u32| {
            Node::BasicLit(BasicLit {
                position: Position::new(line, column),
                kind,
                text: text.to_owned(),
                ty: match kind {
                    TokenKind::Integer => Type::Int,
                    TokenKind::Decimal => Type::Decimal,
                    _ => Type::String,
                },
            })
        };
        let dict = DictLit::new(
            Position::new(2, 1),
            vec![lit(TokenKind::String, "k", 2, 2)],
            vec![lit(TokenKind::Decimal, "0.5", 2, 7)],
        );
        let array = ArrayLit::new(
            Position::new(3, 1),
            vec![Node::Variable(Variable::new(Position::new(3, 2), "x"))],
        );
        let decl = ShortDeclaration::new(
            Variable::new(Position::new(1, 1), "n"),
            lit(TokenKind::Integer, "1", 1, 4),
        );
        let boc = Boc::from_expressions(
            Position::START,
            vec![
                Node::ShortDeclaration(decl),
                Node::DictLit(dict),
                Node::ArrayLit(array),
                Node::Boc(Boc::new(Position::new(4, 1))),
            ],
        );

        assert_eq!(
            print_boc_string(&boc),
            indoc! {r#"
                boc (1:1 %: {n: Int})
                  declaration n (1:1 %: Int)
                    int 1 (1:4 %: Int)
                  dict (2:1 %: [String]Decimal)
                    entry
                      string "k" (2:2 %: String)
                      decimal 0.5 (2:7 %: Decimal)
                  array (3:1 %: []TBD)
                    variable x (3:2 %: TBD)
                  boc (4:1 %: {})
            "#}
        );
    }

    #[test]
    fn test_print_node_escapes_strings() {
        let node = Node::BasicLit(BasicLit {
            position: Position::START,
            kind: TokenKind::String,
            text: "a\n\"b\"".to_owned(),
            ty: Type::String,
        });
        assert_eq!(
            print_node_string(&node),
            "string \"a\\n\\\"b\\\"\" (1:1 %: String)\n"
        );
    }
}
