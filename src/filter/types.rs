use std::collections::HashMap;
use std::fmt;

use super::expression::Expression;

/// Static types a filter expression can have
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Type {
    Int,
    Bool,
    String,
    /// A list whose elements are all strings
    StringList,
    /// A list with elements of mixed types
    List,
    Map,
    Color,
    RegularExpression,
    /// A `{regex, capture group}` pair accepted by `match`
    MatchingSpecifier,
}

impl Type {
    pub fn name(&self) -> &'static str {
        match self {
            Type::Int => "Int",
            Type::Bool => "Bool",
            Type::String => "String",
            Type::StringList => "StringList",
            Type::List => "List",
            Type::Map => "Map",
            Type::Color => "Color",
            Type::RegularExpression => "RegularExpression",
            Type::MatchingSpecifier => "MatchingSpecifier",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// True for both list flavours.
pub fn is_list(ty: Type) -> bool {
    matches!(ty, Type::List | Type::StringList)
}

/// Maps identifier names to their static types.
pub type TypingContext = HashMap<String, Type>;

/// A subexpression that could not be assigned a type.
#[derive(Debug, Clone)]
pub struct IllTyped<'a> {
    pub expr: &'a Expression,
    pub message: String,
}

impl IllTyped<'_> {
    /// Human readable explanation including where the problem occurred.
    pub fn explain(&self) -> String {
        format!(
            "{}\n\nProblem occurred here:\n{}",
            self.message,
            self.expr.filter_string()
        )
    }
}

impl PartialEq for IllTyped<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.expr, other.expr) && self.message == other.message
    }
}

/// Result of type synthesis: either a type or the first ill-typed subexpression.
#[derive(Debug, Clone, PartialEq)]
pub enum PossibleType<'a> {
    TypeClass(Type),
    IllTyped(IllTyped<'a>),
}

impl<'a> PossibleType<'a> {
    pub fn ill(expr: &'a Expression, message: impl Into<String>) -> Self {
        PossibleType::IllTyped(IllTyped {
            expr,
            message: message.into(),
        })
    }

    pub fn is_ill_typed(&self) -> bool {
        matches!(self, PossibleType::IllTyped(_))
    }

    pub fn type_class(&self) -> Option<Type> {
        match self {
            PossibleType::TypeClass(ty) => Some(*ty),
            PossibleType::IllTyped(_) => None,
        }
    }
}

impl From<Type> for PossibleType<'_> {
    fn from(ty: Type) -> Self {
        PossibleType::TypeClass(ty)
    }
}

impl fmt::Display for PossibleType<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PossibleType::TypeClass(ty) => ty.fmt(f),
            PossibleType::IllTyped(_) => f.write_str("IllTyped"),
        }
    }
}

/// Free-standing form of [`PossibleType::is_ill_typed`].
pub fn is_ill_typed(possible: &PossibleType<'_>) -> bool {
    possible.is_ill_typed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_list_accepts_both_list_types() {
        assert!(is_list(Type::List));
        assert!(is_list(Type::StringList));
        assert!(!is_list(Type::String));
        assert!(!is_list(Type::Map));
    }

    #[test]
    fn test_possible_type_display() {
        assert_eq!(PossibleType::from(Type::StringList).to_string(), "StringList");
        let expr = Expression::int(1);
        assert_eq!(PossibleType::ill(&expr, "nope").to_string(), "IllTyped");
    }
}
