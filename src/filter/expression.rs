//! Expression tree nodes.
//!
//! Every node supports four operations: evaluation against a [`ContextMap`],
//! type synthesis against a [`TypingContext`], rendering back to filter source
//! and rendering a typed debug string.

use std::fmt;

use regex::{Regex, RegexBuilder};

use super::tokenizer::TokenKind;
use super::types::{PossibleType, Type, TypingContext, is_list};
use super::value::{ContextMap, DynValue};

/// Return early with the ill-typed result, otherwise yield the type.
macro_rules! well_typed {
    ($possible:expr) => {
        match $possible {
            PossibleType::TypeClass(ty) => ty,
            ill @ PossibleType::IllTyped(_) => return ill,
        }
    };
}

#[derive(Debug, Clone)]
pub enum Expression {
    Binary(BinaryOperation),
    Unary(UnaryOperation),
    Value(ValueExpression),
    List(ListExpression),
    Regex(RegexExpression),
}

impl Expression {
    pub fn int(value: i64) -> Self {
        Expression::Value(ValueExpression::Int(value))
    }

    pub fn string(value: impl Into<String>) -> Self {
        Expression::Value(ValueExpression::String(value.into()))
    }

    pub fn identifier(name: impl Into<String>) -> Self {
        Expression::Value(ValueExpression::Identifier(name.into()))
    }

    pub fn binary(op: TokenKind, left: Expression, right: Expression) -> Self {
        Expression::Binary(BinaryOperation {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn unary(op: TokenKind, operand: Expression) -> Self {
        Expression::Unary(UnaryOperation {
            op,
            operand: Box::new(operand),
        })
    }

    pub fn list(items: Vec<Expression>) -> Self {
        Expression::List(ListExpression { items })
    }

    /// Compile a regular expression literal.
    pub fn regex(pattern: &str, case_insensitive: bool) -> Result<Self, regex::Error> {
        RegexExpression::new(pattern, case_insensitive).map(Expression::Regex)
    }

    pub fn execute(&self, context: &ContextMap) -> DynValue {
        match self {
            Expression::Binary(e) => e.execute(context),
            Expression::Unary(e) => e.execute(context),
            Expression::Value(e) => e.execute(context),
            Expression::List(e) => e.execute(context),
            Expression::Regex(e) => e.execute(),
        }
    }

    pub fn synthesize_type<'a>(&'a self, context: &TypingContext) -> PossibleType<'a> {
        match self {
            Expression::Binary(e) => e.synthesize_type(self, context),
            Expression::Unary(e) => e.synthesize_type(self, context),
            Expression::Value(e) => e.synthesize_type(self, context),
            Expression::List(e) => e.synthesize_type(context),
            Expression::Regex(_) => Type::RegularExpression.into(),
        }
    }

    /// Render back to filter source. Re-parsing the result yields an
    /// equivalent tree.
    pub fn filter_string(&self) -> String {
        match self {
            Expression::Binary(e) => e.filter_string(),
            Expression::Unary(e) => e.filter_string(),
            Expression::Value(e) => e.filter_string(),
            Expression::List(e) => e.filter_string(),
            Expression::Regex(e) => e.filter_string(),
        }
    }

    pub fn debug(&self, context: &TypingContext) -> String {
        match self {
            Expression::Binary(e) => e.debug(context),
            Expression::Unary(e) => e.debug(context),
            Expression::Value(e) => e.debug(),
            Expression::List(e) => e.debug(context),
            Expression::Regex(e) => e.debug(),
        }
    }

    /// `debug()` followed by the synthesized type, as used for operands
    fn typed_debug(&self, context: &TypingContext) -> String {
        format!(
            "{} : {}",
            self.debug(context),
            self.synthesize_type(context)
        )
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.filter_string())
    }
}

/// Integer, string or identifier literal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueExpression {
    Int(i64),
    String(String),
    Identifier(String),
}

impl ValueExpression {
    fn execute(&self, context: &ContextMap) -> DynValue {
        match self {
            ValueExpression::Int(v) => DynValue::Int(*v),
            ValueExpression::String(s) => DynValue::String(s.clone()),
            ValueExpression::Identifier(name) => context.get(name).cloned().unwrap_or_default(),
        }
    }

    fn synthesize_type<'a>(
        &self,
        node: &'a Expression,
        context: &TypingContext,
    ) -> PossibleType<'a> {
        match self {
            ValueExpression::Int(_) => Type::Int.into(),
            ValueExpression::String(_) => Type::String.into(),
            ValueExpression::Identifier(name) => match context.get(name) {
                Some(ty) => (*ty).into(),
                None => PossibleType::ill(node, format!("Unknown identifier {name}")),
            },
        }
    }

    fn filter_string(&self) -> String {
        match self {
            ValueExpression::Int(v) => v.to_string(),
            ValueExpression::String(s) => format!("\"{}\"", escape_quotes(s)),
            ValueExpression::Identifier(name) => name.clone(),
        }
    }

    fn debug(&self) -> String {
        match self {
            ValueExpression::Int(v) => format!("Val({v})"),
            ValueExpression::String(s) | ValueExpression::Identifier(s) => format!("Val({s})"),
        }
    }
}

/// Compiled `r"..."` or `ri"..."` literal
#[derive(Debug, Clone)]
pub struct RegexExpression {
    pattern: String,
    case_insensitive: bool,
    regex: Regex,
}

impl RegexExpression {
    pub fn new(pattern: &str, case_insensitive: bool) -> Result<Self, regex::Error> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(case_insensitive)
            .build()?;
        Ok(Self {
            pattern: pattern.to_string(),
            case_insensitive,
            regex,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn is_case_insensitive(&self) -> bool {
        self.case_insensitive
    }

    fn execute(&self) -> DynValue {
        DynValue::Regex(self.regex.clone())
    }

    fn filter_string(&self) -> String {
        let prefix = if self.case_insensitive { "ri" } else { "r" };
        format!("{prefix}\"{}\"", escape_quotes(&self.pattern))
    }

    fn debug(&self) -> String {
        format!("RegEx({})", self.pattern)
    }
}

/// `{a, b, ...}` literal
#[derive(Debug, Clone)]
pub struct ListExpression {
    pub items: Vec<Expression>,
}

impl ListExpression {
    fn execute(&self, context: &ContextMap) -> DynValue {
        let values: Vec<DynValue> = self.items.iter().map(|e| e.execute(context)).collect();

        if values.iter().all(|v| matches!(v, DynValue::String(_))) {
            let strings = values
                .into_iter()
                .filter_map(|v| match v {
                    DynValue::String(s) => Some(s),
                    _ => None,
                })
                .collect();
            DynValue::StringList(strings)
        } else {
            DynValue::List(values)
        }
    }

    fn synthesize_type<'a>(&'a self, context: &TypingContext) -> PossibleType<'a> {
        let mut types = Vec::with_capacity(self.items.len());
        for item in &self.items {
            types.push(well_typed!(item.synthesize_type(context)));
        }

        match types.as_slice() {
            [Type::RegularExpression, Type::Int] => Type::MatchingSpecifier.into(),
            _ if types.iter().all(|t| *t == Type::String) => Type::StringList.into(),
            _ => Type::List.into(),
        }
    }

    fn filter_string(&self) -> String {
        let items: Vec<String> = self.items.iter().map(Expression::filter_string).collect();
        format!("{{{}}}", items.join(", "))
    }

    fn debug(&self, context: &TypingContext) -> String {
        let items: Vec<String> = self
            .items
            .iter()
            .map(|e| e.typed_debug(context))
            .collect();
        format!("List({})", items.join(", "))
    }
}

/// Prefix operator; only `!` is defined
#[derive(Debug, Clone)]
pub struct UnaryOperation {
    pub op: TokenKind,
    pub operand: Box<Expression>,
}

impl UnaryOperation {
    fn execute(&self, context: &ContextMap) -> DynValue {
        let operand = self.operand.execute(context);
        match self.op {
            TokenKind::Not => DynValue::Bool(operand.to_bool().is_some_and(|b| !b)),
            _ => DynValue::Bool(false),
        }
    }

    fn synthesize_type<'a>(
        &'a self,
        node: &'a Expression,
        context: &TypingContext,
    ) -> PossibleType<'a> {
        let operand = well_typed!(self.operand.synthesize_type(context));

        match self.op {
            TokenKind::Not if operand == Type::Bool => Type::Bool.into(),
            TokenKind::Not => PossibleType::ill(node, "Can only negate boolean values"),
            _ => PossibleType::ill(node, "Not implemented"),
        }
    }

    fn filter_string(&self) -> String {
        format!(
            "({}{})",
            self.op.operator_text().unwrap_or_default(),
            self.operand.filter_string()
        )
    }

    fn debug(&self, context: &TypingContext) -> String {
        format!(
            "UnaryOp[{}]({})",
            self.op.info(),
            self.operand.typed_debug(context)
        )
    }
}

/// Infix operator: logical, comparison or arithmetic
#[derive(Debug, Clone)]
pub struct BinaryOperation {
    pub op: TokenKind,
    pub left: Box<Expression>,
    pub right: Box<Expression>,
}

impl BinaryOperation {
    fn execute(&self, context: &ContextMap) -> DynValue {
        let left = self.left.execute(context);
        let right = self.right.execute(context);

        match self.op {
            TokenKind::Plus => {
                if let DynValue::String(l) = &left {
                    if let Some(r) = right.to_string_value() {
                        return DynValue::String(format!("{l}{r}"));
                    }
                }
                DynValue::Int(int_op(&left, &right, |l, r| Some(l.wrapping_add(r))))
            }
            TokenKind::Minus => DynValue::Int(int_op(&left, &right, |l, r| Some(l.wrapping_sub(r)))),
            TokenKind::Multiply => {
                DynValue::Int(int_op(&left, &right, |l, r| Some(l.wrapping_mul(r))))
            }
            TokenKind::Divide => DynValue::Int(int_op(&left, &right, i64::checked_div)),
            TokenKind::Mod => DynValue::Int(int_op(&left, &right, i64::checked_rem)),

            TokenKind::And => DynValue::Bool(bool_op(&left, &right, |l, r| l && r)),
            TokenKind::Or => DynValue::Bool(bool_op(&left, &right, |l, r| l || r)),

            TokenKind::Eq => DynValue::Bool(equals(&left, &right)),
            TokenKind::Neq => DynValue::Bool(!equals(&left, &right)),

            TokenKind::Lt => DynValue::Bool(compare(&left, &right, |l, r| l < r)),
            TokenKind::Gt => DynValue::Bool(compare(&left, &right, |l, r| l > r)),
            TokenKind::Lte => DynValue::Bool(compare(&left, &right, |l, r| l <= r)),
            TokenKind::Gte => DynValue::Bool(compare(&left, &right, |l, r| l >= r)),

            TokenKind::Contains => DynValue::Bool(contains(&left, &right)),
            TokenKind::StartsWith => DynValue::Bool(starts_with(&left, &right)),
            TokenKind::EndsWith => DynValue::Bool(ends_with(&left, &right)),
            TokenKind::Match => match_regex(&left, &right),

            _ => DynValue::Bool(false),
        }
    }

    fn synthesize_type<'a>(
        &'a self,
        node: &'a Expression,
        context: &TypingContext,
    ) -> PossibleType<'a> {
        let left = well_typed!(self.left.synthesize_type(context));
        let right = well_typed!(self.right.synthesize_type(context));
        let op = self.op.info();

        match self.op {
            TokenKind::Plus => {
                if left == Type::String {
                    Type::String.into()
                } else if left == Type::Int && right == Type::Int {
                    Type::Int.into()
                } else {
                    PossibleType::ill(node, "Can only add Ints or concatenate a String")
                }
            }
            TokenKind::Minus | TokenKind::Multiply | TokenKind::Divide | TokenKind::Mod => {
                if left == Type::Int && right == Type::Int {
                    Type::Int.into()
                } else {
                    PossibleType::ill(node, format!("Can only perform {op} with Ints"))
                }
            }
            TokenKind::And | TokenKind::Or => {
                if left == Type::Bool && right == Type::Bool {
                    Type::Bool.into()
                } else {
                    PossibleType::ill(node, format!("Can only perform {op} with Bools"))
                }
            }
            // equality always produces a usable result
            TokenKind::Eq | TokenKind::Neq => Type::Bool.into(),
            TokenKind::Lt | TokenKind::Gt | TokenKind::Lte | TokenKind::Gte => {
                if left == Type::Int && right == Type::Int {
                    Type::Bool.into()
                } else {
                    PossibleType::ill(node, format!("Can only perform {op} with Ints"))
                }
            }
            TokenKind::StartsWith | TokenKind::EndsWith => {
                if is_list(left) || (left == Type::String && right == Type::String) {
                    Type::Bool.into()
                } else {
                    PossibleType::ill(
                        node,
                        format!("Can only perform {op} with a List or two Strings"),
                    )
                }
            }
            TokenKind::Contains => {
                if is_list(left) || left == Type::Map || (left == Type::String && right == Type::String)
                {
                    Type::Bool.into()
                } else {
                    PossibleType::ill(
                        node,
                        format!("Can only perform {op} with a List, a Map, or two Strings"),
                    )
                }
            }
            TokenKind::Match => {
                if left != Type::String {
                    return PossibleType::ill(node, "Left argument of Match must be a String");
                }
                match right {
                    Type::RegularExpression => Type::Bool.into(),
                    // capture group extraction
                    Type::MatchingSpecifier => Type::String.into(),
                    _ => PossibleType::ill(
                        node,
                        "Can only match on a RegularExpression or a MatchingSpecifier",
                    ),
                }
            }
            _ => PossibleType::ill(node, "Not implemented"),
        }
    }

    fn filter_string(&self) -> String {
        format!(
            "({} {} {})",
            self.left.filter_string(),
            self.op.operator_text().unwrap_or_default(),
            self.right.filter_string()
        )
    }

    fn debug(&self, context: &TypingContext) -> String {
        format!(
            "BinaryOp[{}]({}, {})",
            self.op.info(),
            self.left.typed_debug(context),
            self.right.typed_debug(context)
        )
    }
}

fn escape_quotes(s: &str) -> String {
    s.replace('"', "\\\"")
}

fn eq_ignore_case(a: &str, b: &str) -> bool {
    a == b || a.to_lowercase() == b.to_lowercase()
}

fn int_op(left: &DynValue, right: &DynValue, op: impl Fn(i64, i64) -> Option<i64>) -> i64 {
    match (left.to_int(), right.to_int()) {
        (Some(l), Some(r)) => op(l, r).unwrap_or(0),
        _ => 0,
    }
}

fn bool_op(left: &DynValue, right: &DynValue, op: impl Fn(bool, bool) -> bool) -> bool {
    match (left.to_bool(), right.to_bool()) {
        (Some(l), Some(r)) => op(l, r),
        _ => false,
    }
}

fn compare(left: &DynValue, right: &DynValue, op: impl Fn(i64, i64) -> bool) -> bool {
    match (left.to_int(), right.to_int()) {
        (Some(l), Some(r)) => op(l, r),
        _ => false,
    }
}

fn equals(left: &DynValue, right: &DynValue) -> bool {
    match (left, right) {
        (DynValue::String(l), DynValue::String(r)) => eq_ignore_case(l, r),
        _ => left.loosely_equals(right),
    }
}

fn contains(left: &DynValue, right: &DynValue) -> bool {
    match left {
        DynValue::StringList(list) => {
            if let Some(needle) = right.to_string_value() {
                return list.iter().any(|item| eq_ignore_case(item, &needle));
            }
        }
        DynValue::Map(map) => {
            if let Some(key) = right.to_string_value() {
                return map.contains_key(&key);
            }
        }
        DynValue::List(list) => return list.iter().any(|item| item.loosely_equals(right)),
        _ => {}
    }

    match (left.to_string_value(), right.to_string_value()) {
        (Some(haystack), Some(needle)) => haystack.to_lowercase().contains(&needle.to_lowercase()),
        _ => false,
    }
}

fn starts_with(left: &DynValue, right: &DynValue) -> bool {
    edge_matches(left, right, <[String]>::first, <[DynValue]>::first, |s, p| {
        s.starts_with(p)
    })
}

fn ends_with(left: &DynValue, right: &DynValue) -> bool {
    edge_matches(left, right, <[String]>::last, <[DynValue]>::last, |s, p| {
        s.ends_with(p)
    })
}

/// Shared body of `startswith` / `endswith`: compare the first or last list
/// element, or the string prefix or suffix.
fn edge_matches(
    left: &DynValue,
    right: &DynValue,
    string_edge: fn(&[String]) -> Option<&String>,
    value_edge: fn(&[DynValue]) -> Option<&DynValue>,
    text_edge: fn(&str, &str) -> bool,
) -> bool {
    match left {
        DynValue::StringList(list) => {
            if let Some(needle) = right.to_string_value() {
                return string_edge(list).is_some_and(|item| eq_ignore_case(item, &needle));
            }
        }
        DynValue::List(list) => {
            return value_edge(list).is_some_and(|item| item.loosely_equals(right));
        }
        _ => {}
    }

    match (left.to_string_value(), right.to_string_value()) {
        (Some(text), Some(affix)) => text_edge(&text.to_lowercase(), &affix.to_lowercase()),
        _ => false,
    }
}

fn match_regex(left: &DynValue, right: &DynValue) -> DynValue {
    let Some(subject) = left.to_string_value() else {
        return DynValue::Bool(false);
    };

    match right {
        DynValue::Regex(regex) => DynValue::Bool(regex.is_match(&subject)),
        DynValue::List(spec) => match spec.as_slice() {
            [DynValue::Regex(regex), DynValue::Int(group)] => {
                DynValue::String(capture_group(regex, &subject, *group).unwrap_or_default())
            }
            _ => DynValue::Bool(false),
        },
        _ => DynValue::Bool(false),
    }
}

fn capture_group(regex: &Regex, subject: &str, group: i64) -> Option<String> {
    let group = usize::try_from(group).ok()?;
    let captures = regex.captures(subject)?;
    captures.get(group).map(|m| m.as_str().to_string())
}
