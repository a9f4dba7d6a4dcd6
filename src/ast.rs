// boc ::= block_body
// block_body ::= [expr (SEP expr)* [SEP]]
// expr ::= literal
//        | ID [':' expr]
//        | '{' block_body '}'
//        | '[' ']' TYPE
//        | '[' TYPE ']' TYPE
//        | '[' expr (SEP expr)* [SEP] ']'
// literal ::= integer | decimal | string
//
// SEP is either a comma or a line break after a token that can end an
// expression.

use crate::{
    token::{Position, Token, TokenKind},
    types::{Field, Type},
};

#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    BasicLit(BasicLit),
    Variable(Variable),
    ArrayLit(ArrayLit),
    DictLit(DictLit),
    ShortDeclaration(ShortDeclaration),
    Boc(Boc),
}

impl Node {
    pub fn ty(&self) -> &Type {
        match self {
            Node::BasicLit(lit) => &lit.ty,
            Node::Variable(var) => &var.ty,
            Node::ArrayLit(array) => &array.ty,
            Node::DictLit(dict) => &dict.ty,
            Node::ShortDeclaration(decl) => &decl.variable.ty,
            Node::Boc(boc) => &boc.ty,
        }
    }

    pub fn position(&self) -> Position {
        match self {
            Node::BasicLit(lit) => lit.position,
            Node::Variable(var) => var.position,
            Node::ArrayLit(array) => array.position,
            Node::DictLit(dict) => dict.position,
            Node::ShortDeclaration(decl) => decl.position,
            Node::Boc(boc) => boc.position,
        }
    }
}

/// A scalar literal. The type follows from the token kind.
#[derive(Clone, Debug, PartialEq)]
pub struct BasicLit {
    pub position: Position,
    pub kind: TokenKind,
    pub text: String,
    pub ty: Type,
}

impl BasicLit {
    pub fn new(token: &Token) -> BasicLit {
        let ty = match token.kind {
            TokenKind::Integer => Type::Int,
            TokenKind::Decimal => Type::Decimal,
            TokenKind::String => Type::String,
            _ => Type::Tbd,
        };
        BasicLit {
            position: token.position,
            kind: token.kind,
            text: token.text.clone(),
            ty,
        }
    }
}

/// A bare name reference.
#[derive(Clone, Debug, PartialEq)]
pub struct Variable {
    pub position: Position,
    pub name: String,
    pub ty: Type,
}

impl Variable {
    pub fn new(position: Position, name: impl Into<String>) -> Variable {
        Variable {
            position,
            name: name.into(),
            ty: Type::Tbd,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ArrayLit {
    pub position: Position,
    pub elements: Vec<Node>,
    /// Always a [`Type::Array`].
    pub ty: Type,
}

impl ArrayLit {
    /// The element type comes from the first element. Later elements are not
    /// checked against it.
    pub fn new(position: Position, elements: Vec<Node>) -> ArrayLit {
        let element = elements.first().map(Node::ty).cloned().unwrap_or_default();
        ArrayLit {
            position,
            elements,
            ty: Type::array(element),
        }
    }

    pub fn typed_empty(position: Position, element: Type) -> ArrayLit {
        ArrayLit {
            position,
            elements: Vec::new(),
            ty: Type::array(element),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DictLit {
    pub position: Position,
    /// `keys[i]` pairs with `values[i]`, in source order.
    pub keys: Vec<Node>,
    pub values: Vec<Node>,
    /// Always a [`Type::Dict`].
    pub ty: Type,
}

impl DictLit {
    /// Key and value types come from the first pair.
    pub fn new(position: Position, keys: Vec<Node>, values: Vec<Node>) -> DictLit {
        debug_assert_eq!(keys.len(), values.len());
        let mut ty = Type::empty_dict();
        if let (Some(key), Some(value)) = (keys.first(), values.first()) {
            ty = Type::dict(key.ty().clone(), value.ty().clone());
        }
        DictLit {
            position,
            keys,
            values,
            ty,
        }
    }

    pub fn typed_empty(position: Position, key: Type, value: Type) -> DictLit {
        DictLit {
            position,
            keys: Vec::new(),
            values: Vec::new(),
            ty: Type::dict(key, value),
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = (&Node, &Node)> {
        self.keys.iter().zip(&self.values)
    }
}

/// `name : value`
#[derive(Clone, Debug, PartialEq)]
pub struct ShortDeclaration {
    pub position: Position,
    pub variable: Variable,
    pub value: Box<Node>,
}

impl ShortDeclaration {
    /// Binds the variable to the value. A variable whose type is still unknown
    /// takes the value's type.
    pub fn new(mut variable: Variable, value: Node) -> ShortDeclaration {
        if variable.ty.is_tbd() {
            variable.ty = value.ty().clone();
        }
        ShortDeclaration {
            position: variable.position,
            variable,
            value: Box::new(value),
        }
    }
}

/// A block of code: the scope that both a whole file and a `{ ... }` literal
/// produce.
#[derive(Clone, Debug, PartialEq)]
pub struct Boc {
    pub position: Position,
    pub expressions: Vec<Node>,
    /// Reserved. The grammar has no statements yet.
    pub statements: Vec<Node>,
    /// Always a [`Type::Boc`], with one field per short declaration.
    pub ty: Type,
}

impl Boc {
    pub fn new(position: Position) -> Boc {
        Boc {
            position,
            expressions: Vec::new(),
            statements: Vec::new(),
            ty: Type::empty_boc(),
        }
    }

    pub fn from_expressions(position: Position, expressions: Vec<Node>) -> Boc {
        let mut boc = Boc::new(position);
        for expr in expressions {
            boc.push(expr);
        }
        boc
    }

    /// Wraps `inner` in a new block holding a single `name : inner`
    /// declaration.
    pub fn wrap(name: &str, inner: Boc) -> Boc {
        let variable = Variable::new(Position::START, name);
        let decl = ShortDeclaration::new(variable, Node::Boc(inner));
        Boc::from_expressions(Position::START, vec![Node::ShortDeclaration(decl)])
    }

    /// Appends an expression, recording a field for short declarations.
    pub fn push(&mut self, expr: Node) {
        if let (Node::ShortDeclaration(decl), Type::Boc(fields)) = (&expr, &mut self.ty) {
            fields.push(Field {
                name: decl.variable.name.clone(),
                ty: decl.variable.ty.clone(),
            });
        }
        self.expressions.push(expr);
    }

    pub fn fields(&self) -> &[Field] {
        match &self.ty {
            Type::Boc(fields) => fields,
            _ => &[],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.expressions.is_empty() && self.statements.is_empty()
    }
}
