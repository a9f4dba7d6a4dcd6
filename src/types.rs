use std::fmt;

/// A structural type. Types are compared by shape, never by identity.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Decimal,
    String,
    Array(Box<Type>),
    Dict { key: Box<Type>, value: Box<Type> },
    /// The type of a block of code, listing the names it declares.
    Boc(Vec<Field>),
    /// Not determinable from local information.
    #[default]
    Tbd,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: String,
    pub ty: Type,
}

impl Type {
    pub fn array(element: Type) -> Type {
        Type::Array(Box::new(element))
    }

    pub fn dict(key: Type, value: Type) -> Type {
        Type::Dict {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    /// A dictionary whose key and value types are yet to be refined.
    pub fn empty_dict() -> Type {
        Type::dict(Type::Tbd, Type::Tbd)
    }

    pub fn empty_boc() -> Type {
        Type::Boc(Vec::new())
    }

    /// Resolves a built-in type name. Names the lattice doesn't know about are
    /// left as [`Type::Tbd`].
    pub fn from_name(name: &str) -> Type {
        match name {
            "Int" => Type::Int,
            "Decimal" => Type::Decimal,
            "String" => Type::String,
            _ => Type::Tbd,
        }
    }

    pub fn is_tbd(&self) -> bool {
        matches!(self, Type::Tbd)
    }
}

/// Renders types the way they are spelled in source: `[]Int`, `[String]Int`,
/// and `{name: Type}` for blocks.
impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Int => f.write_str("Int"),
            Type::Decimal => f.write_str("Decimal"),
            Type::String => f.write_str("String"),
            Type::Array(element) => write!(f, "[]{element}"),
            Type::Dict { key, value } => write!(f, "[{key}]{value}"),
            Type::Boc(fields) => {
                f.write_str("{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", field.name, field.ty)?;
                }
                f.write_str("}")
            }
            Type::Tbd => f.write_str("TBD"),
        }
    }
}
