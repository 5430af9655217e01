//! Message filter expression language
//!
//! Filters are boolean expressions over the attributes of a chat message. A
//! filter string is tokenized, parsed into an expression tree and type checked
//! once; the resulting [`Filter`] is then evaluated against a [`ContextMap`]
//! for every message.
//!
//! # Syntax
//!
//! ```text
//! expression := and ( "||" and )*
//! and        := unary ( "&&" unary )*
//! unary      := "!"? condition
//! condition  := ( value | "(" expression ")" ) ( (binaryOp value) | (mathOp value)* )
//! value      := INT | STRING | IDENTIFIER | REGEX | "(" expression ")" | "{" list "}"
//! list       := value ( "," value )*
//! ```
//!
//! - Comparison operators: `==`, `!=`, `<`, `>`, `<=`, `>=`, `contains`,
//!   `startswith`, `endswith`, `match`. They bind once per condition.
//! - Arithmetic operators: `+`, `-`, `*`, `/`, `%`. All share one precedence
//!   level and associate to the left.
//! - Literals: `123`, `"text"`, `r"regex"`, `ri"case insensitive regex"`,
//!   `{list, of, values}`.
//!
//! # Examples
//!
//! ```text
//! author.badges contains "moderator"
//! channel.name == "forsen" && !flags.automod
//! message.content match ri"^!command"
//! message.content match {r"(\d\d\d\d)-(\d\d)", 2}     # extracts the month
//! reward.cost >= 5000 || flags.first_message
//! ```

pub mod compiled;
pub mod error;
pub mod expression;
pub mod identifiers;
pub mod parser;
pub mod tokenizer;
pub mod types;
pub mod value;

pub use compiled::{Filter, FilterResult};
pub use error::FilterError;
pub use expression::Expression;
pub use identifiers::{Identifier, message_typing_context};
pub use parser::{FilterParser, MAX_NESTING_DEPTH};
pub use tokenizer::{Token, TokenKind, Tokenizer};
pub use types::{IllTyped, PossibleType, Type, TypingContext, is_ill_typed, is_list};
pub use value::{Color, ContextMap, DynValue};
