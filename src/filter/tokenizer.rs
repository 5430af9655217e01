use regex::Regex;
use std::sync::LazyLock;

use super::identifiers::message_typing_context;
use super::types::TypingContext;

// Alternatives are tried in order: quoted string or regex literal, identifier or
// keyword, runs of operator characters, parentheses, list punctuation, and any
// other single character so nothing is silently dropped.
static TOKEN_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?:ri?)?"(?:\\"|[^"])*"|[\w.]+|(?:<=?|>=?|!=?|==|\|\||&&|\+|-|\*|/|%)+|[()]|[{},]|\S"#,
    )
    .expect("valid token regex")
});

/// Kinds of tokens produced by the [`Tokenizer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    And,
    Or,

    Eq,
    Neq,
    Lt,
    Gt,
    Lte,
    Gte,
    Contains,
    StartsWith,
    EndsWith,
    Match,

    Not,

    Plus,
    Minus,
    Multiply,
    Divide,
    Mod,

    Lp,
    Rp,
    ListStart,
    ListEnd,
    Comma,

    Int,
    String,
    RegularExpression,
    Identifier,

    /// Unrecognized lexeme
    None,
}

impl TokenKind {
    /// Comparison operators; these bind once per condition.
    pub fn is_binary_op(self) -> bool {
        matches!(
            self,
            TokenKind::Eq
                | TokenKind::Neq
                | TokenKind::Lt
                | TokenKind::Gt
                | TokenKind::Lte
                | TokenKind::Gte
                | TokenKind::Contains
                | TokenKind::StartsWith
                | TokenKind::EndsWith
                | TokenKind::Match
        )
    }

    pub fn is_unary_op(self) -> bool {
        self == TokenKind::Not
    }

    pub fn is_math_op(self) -> bool {
        matches!(
            self,
            TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Multiply
                | TokenKind::Divide
                | TokenKind::Mod
        )
    }

    pub fn is_op(self) -> bool {
        self.is_binary_op()
            || self.is_unary_op()
            || self.is_math_op()
            || matches!(self, TokenKind::And | TokenKind::Or)
    }

    /// Human readable name used in debug output and error messages
    pub fn info(self) -> &'static str {
        match self {
            TokenKind::And => "And",
            TokenKind::Or => "Or",
            TokenKind::Lp => "<left parenthesis>",
            TokenKind::Rp => "<right parenthesis>",
            TokenKind::ListStart => "<list start>",
            TokenKind::ListEnd => "<list end>",
            TokenKind::Comma => "<comma>",
            TokenKind::Plus => "Plus",
            TokenKind::Minus => "Minus",
            TokenKind::Multiply => "Multiply",
            TokenKind::Divide => "Divide",
            TokenKind::Mod => "Mod",
            TokenKind::Eq => "Eq",
            TokenKind::Neq => "NotEq",
            TokenKind::Lt => "LessThan",
            TokenKind::Gt => "GreaterThan",
            TokenKind::Lte => "LessThanEq",
            TokenKind::Gte => "GreaterThanEq",
            TokenKind::Contains => "Contains",
            TokenKind::StartsWith => "StartsWith",
            TokenKind::EndsWith => "EndsWith",
            TokenKind::Match => "Match",
            TokenKind::Not => "Not",
            TokenKind::String => "<string>",
            TokenKind::Int => "<int>",
            TokenKind::RegularExpression => "<regular expression>",
            TokenKind::Identifier => "<identifier>",
            TokenKind::None => "<unknown>",
        }
    }

    /// Source text of an operator, if this kind is one
    pub fn operator_text(self) -> Option<&'static str> {
        let text = match self {
            TokenKind::And => "&&",
            TokenKind::Or => "||",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Multiply => "*",
            TokenKind::Divide => "/",
            TokenKind::Mod => "%",
            TokenKind::Eq => "==",
            TokenKind::Neq => "!=",
            TokenKind::Lt => "<",
            TokenKind::Gt => ">",
            TokenKind::Lte => "<=",
            TokenKind::Gte => ">=",
            TokenKind::Contains => "contains",
            TokenKind::StartsWith => "startswith",
            TokenKind::EndsWith => "endswith",
            TokenKind::Match => "match",
            TokenKind::Not => "!",
            _ => return None,
        };
        Some(text)
    }

    /// Classify a single lexeme against the message identifiers
    pub fn classify(text: &str) -> TokenKind {
        Self::classify_with(text, message_typing_context())
    }

    /// Classify a single lexeme; words count as identifiers when `context`
    /// declares them.
    pub fn classify_with(text: &str, context: &TypingContext) -> TokenKind {
        match text {
            "&&" => TokenKind::And,
            "||" => TokenKind::Or,
            "(" => TokenKind::Lp,
            ")" => TokenKind::Rp,
            "{" => TokenKind::ListStart,
            "}" => TokenKind::ListEnd,
            "," => TokenKind::Comma,
            "+" => TokenKind::Plus,
            "-" => TokenKind::Minus,
            "*" => TokenKind::Multiply,
            "/" => TokenKind::Divide,
            "%" => TokenKind::Mod,
            "==" => TokenKind::Eq,
            "!=" => TokenKind::Neq,
            "<" => TokenKind::Lt,
            ">" => TokenKind::Gt,
            "<=" => TokenKind::Lte,
            ">=" => TokenKind::Gte,
            "contains" => TokenKind::Contains,
            "startswith" => TokenKind::StartsWith,
            "endswith" => TokenKind::EndsWith,
            "match" => TokenKind::Match,
            "!" => TokenKind::Not,
            _ => Self::classify_literal(text, context),
        }
    }

    fn classify_literal(text: &str, context: &TypingContext) -> TokenKind {
        let quoted = |body: &str| body.len() >= 2 && body.starts_with('"') && body.ends_with('"');

        if let Some(rest) = text.strip_prefix("ri").or_else(|| text.strip_prefix('r')) {
            if quoted(rest) {
                return TokenKind::RegularExpression;
            }
        }
        if quoted(text) {
            return TokenKind::String;
        }
        if context.contains_key(text) {
            return TokenKind::Identifier;
        }
        if text.parse::<i64>().is_ok() {
            return TokenKind::Int;
        }
        TokenKind::None
    }
}

/// A lexeme together with its classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

/// Forward-only cursor over the tokens of a filter string
#[derive(Debug, Clone)]
pub struct Tokenizer {
    tokens: Vec<Token>,
    pos: usize,
}

impl Tokenizer {
    pub fn new(text: &str) -> Self {
        Self::with_context(text, message_typing_context())
    }

    /// Tokenize `text`, recognizing the identifiers declared in `context`.
    pub fn with_context(text: &str, context: &TypingContext) -> Self {
        let tokens: Vec<Token> = TOKEN_RE
            .find_iter(text)
            .map(|m| Token {
                kind: TokenKind::classify_with(m.as_str(), context),
                text: m.as_str().to_string(),
            })
            .collect();

        tracing::trace!(
            tokens = ?tokens.iter().map(|t| t.text.as_str()).collect::<Vec<_>>(),
            "tokenized filter"
        );

        Self { tokens, pos: 0 }
    }

    pub fn has_next(&self) -> bool {
        self.pos < self.tokens.len()
    }

    /// Consume and return the next token
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<&Token> {
        let token = self.tokens.get(self.pos)?;
        self.pos += 1;
        Some(token)
    }

    /// The most recently consumed token
    pub fn current(&self) -> Option<&Token> {
        self.pos.checked_sub(1).and_then(|i| self.tokens.get(i))
    }

    /// Text of the next token, or an empty string at the end
    pub fn preview(&self) -> &str {
        self.tokens
            .get(self.pos)
            .map(|t| t.text.as_str())
            .unwrap_or("")
    }

    pub fn next_token_kind(&self) -> Option<TokenKind> {
        self.tokens.get(self.pos).map(|t| t.kind)
    }

    /// Kind of the most recently consumed token
    pub fn token_kind(&self) -> Option<TokenKind> {
        self.current().map(|t| t.kind)
    }

    pub fn next_token_is(&self, kind: TokenKind) -> bool {
        self.next_token_kind() == Some(kind)
    }

    pub fn next_token_is_op(&self) -> bool {
        self.next_token_kind().is_some_and(TokenKind::is_op)
    }

    pub fn next_token_is_binary_op(&self) -> bool {
        self.next_token_kind().is_some_and(TokenKind::is_binary_op)
    }

    pub fn next_token_is_unary_op(&self) -> bool {
        self.next_token_kind().is_some_and(TokenKind::is_unary_op)
    }

    pub fn next_token_is_math_op(&self) -> bool {
        self.next_token_kind().is_some_and(TokenKind::is_math_op)
    }

    pub fn all_tokens(&self) -> &[Token] {
        &self.tokens
    }
}
