use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// Per-message values keyed by identifier, e.g. `"author.name"`.
pub type ContextMap = HashMap<String, DynValue>;

/// RGBA colour value, as used for `author.color`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Default for Color {
    fn default() -> Self {
        Self::rgb(0, 0, 0)
    }
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

impl FromStr for Color {
    type Err = ();

    /// Accepts `#rgb`, `#rrggbb` and `#aarrggbb`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().strip_prefix('#').ok_or(())?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(());
        }
        let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| ());
        match hex.len() {
            3 => {
                let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).map_err(|_| ());
                Ok(Color::rgb(nibble(0)? * 17, nibble(1)? * 17, nibble(2)? * 17))
            }
            6 => Ok(Color::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Color {
                a: byte(0)?,
                r: byte(2)?,
                g: byte(4)?,
                b: byte(6)?,
            }),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Runtime value produced by evaluating a filter.
///
/// Conversions between variants are total: every `to_*` helper returns `None`
/// when a value cannot be coerced, and callers fall back to a default.
#[derive(Debug, Clone, Default)]
pub enum DynValue {
    /// Identifier absent from the context map
    #[default]
    Null,
    Int(i64),
    Bool(bool),
    String(String),
    StringList(Vec<String>),
    List(Vec<DynValue>),
    Map(BTreeMap<String, DynValue>),
    Color(Color),
    Regex(Regex),
}

impl DynValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            DynValue::Null => "Null",
            DynValue::Int(_) => "Int",
            DynValue::Bool(_) => "Bool",
            DynValue::String(_) => "String",
            DynValue::StringList(_) => "StringList",
            DynValue::List(_) => "List",
            DynValue::Map(_) => "Map",
            DynValue::Color(_) => "Color",
            DynValue::Regex(_) => "RegularExpression",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, DynValue::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            DynValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn to_int(&self) -> Option<i64> {
        match self {
            DynValue::Int(v) => Some(*v),
            DynValue::Bool(b) => Some(i64::from(*b)),
            DynValue::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn to_bool(&self) -> Option<bool> {
        match self {
            DynValue::Bool(b) => Some(*b),
            DynValue::Int(v) => Some(*v != 0),
            DynValue::String(s) => {
                Some(!(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false")))
            }
            _ => None,
        }
    }

    pub fn to_string_value(&self) -> Option<String> {
        match self {
            DynValue::String(s) => Some(s.clone()),
            DynValue::Int(v) => Some(v.to_string()),
            DynValue::Bool(b) => Some(b.to_string()),
            DynValue::Color(c) => Some(c.to_string()),
            _ => None,
        }
    }

    pub fn to_color(&self) -> Option<Color> {
        match self {
            DynValue::Color(c) => Some(*c),
            DynValue::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    fn to_string_list(&self) -> Option<Vec<String>> {
        match self {
            DynValue::StringList(list) => Some(list.clone()),
            DynValue::List(list) => list.iter().map(|v| v.as_str().map(String::from)).collect(),
            _ => None,
        }
    }

    fn to_list(&self) -> Option<Vec<DynValue>> {
        match self {
            DynValue::List(list) => Some(list.clone()),
            DynValue::StringList(list) => {
                Some(list.iter().cloned().map(DynValue::String).collect())
            }
            _ => None,
        }
    }

    /// Convert `self` into the variant of `like`, if possible.
    fn convert_like(&self, like: &DynValue) -> Option<DynValue> {
        match like {
            DynValue::Int(_) => self.to_int().map(DynValue::Int),
            DynValue::Bool(_) => self.to_bool().map(DynValue::Bool),
            DynValue::String(_) => self.to_string_value().map(DynValue::String),
            DynValue::Color(_) => self.to_color().map(DynValue::Color),
            DynValue::StringList(_) => self.to_string_list().map(DynValue::StringList),
            DynValue::List(_) => self.to_list().map(DynValue::List),
            _ => None,
        }
    }

    fn same_variant(&self, other: &DynValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }

    /// Loose equality: values of different variants are compared after
    /// converting the right operand to the left's variant, or failing that,
    /// the left operand to the right's. Incomparable values are unequal.
    /// String comparison is case-sensitive here.
    pub fn loosely_equals(&self, other: &DynValue) -> bool {
        if self.same_variant(other) {
            return self == other;
        }
        if let Some(converted) = other.convert_like(self) {
            return *self == converted;
        }
        if let Some(converted) = self.convert_like(other) {
            return converted == *other;
        }
        false
    }
}

impl PartialEq for DynValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DynValue::Null, DynValue::Null) => true,
            (DynValue::Int(a), DynValue::Int(b)) => a == b,
            (DynValue::Bool(a), DynValue::Bool(b)) => a == b,
            (DynValue::String(a), DynValue::String(b)) => a == b,
            (DynValue::StringList(a), DynValue::StringList(b)) => a == b,
            (DynValue::List(a), DynValue::List(b)) => a == b,
            (DynValue::Map(a), DynValue::Map(b)) => a == b,
            (DynValue::Color(a), DynValue::Color(b)) => a == b,
            (DynValue::Regex(a), DynValue::Regex(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl fmt::Display for DynValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DynValue::Null => f.write_str("null"),
            DynValue::Int(v) => write!(f, "{v}"),
            DynValue::Bool(b) => write!(f, "{b}"),
            DynValue::String(s) => f.write_str(s),
            DynValue::StringList(list) => write!(f, "{{{}}}", list.join(", ")),
            DynValue::List(list) => {
                let items: Vec<String> = list.iter().map(ToString::to_string).collect();
                write!(f, "{{{}}}", items.join(", "))
            }
            DynValue::Map(map) => {
                let items: Vec<String> = map.iter().map(|(k, v)| format!("{k}: {v}")).collect();
                write!(f, "{{{}}}", items.join(", "))
            }
            DynValue::Color(c) => c.fmt(f),
            DynValue::Regex(re) => write!(f, "/{}/", re.as_str()),
        }
    }
}

impl Serialize for DynValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DynValue::Null => serializer.serialize_none(),
            DynValue::Int(v) => serializer.serialize_i64(*v),
            DynValue::Bool(b) => serializer.serialize_bool(*b),
            DynValue::String(s) => serializer.serialize_str(s),
            DynValue::StringList(list) => {
                let mut seq = serializer.serialize_seq(Some(list.len()))?;
                for item in list {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            DynValue::List(list) => {
                let mut seq = serializer.serialize_seq(Some(list.len()))?;
                for item in list {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            DynValue::Map(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
            DynValue::Color(c) => serializer.collect_str(c),
            DynValue::Regex(re) => serializer.serialize_str(re.as_str()),
        }
    }
}

impl From<i64> for DynValue {
    fn from(v: i64) -> Self {
        DynValue::Int(v)
    }
}

impl From<bool> for DynValue {
    fn from(b: bool) -> Self {
        DynValue::Bool(b)
    }
}

impl From<&str> for DynValue {
    fn from(s: &str) -> Self {
        DynValue::String(s.to_string())
    }
}

impl From<String> for DynValue {
    fn from(s: String) -> Self {
        DynValue::String(s)
    }
}

impl From<Vec<String>> for DynValue {
    fn from(list: Vec<String>) -> Self {
        DynValue::StringList(list)
    }
}

impl From<Color> for DynValue {
    fn from(c: Color) -> Self {
        DynValue::Color(c)
    }
}
