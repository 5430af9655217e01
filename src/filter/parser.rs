use super::error::FilterError;
use super::expression::Expression;
use super::identifiers::message_typing_context;
use super::tokenizer::{TokenKind, Tokenizer};
use super::types::{PossibleType, Type, TypingContext};

/// Deepest tree the parser builds. Every parenthesized group, list literal
/// and chained `&&`, `||` or arithmetic operator adds one level. Evaluation,
/// rendering and dropping all recurse over the tree, so the bound keeps them
/// within the stack.
pub const MAX_NESTING_DEPTH: usize = 256;

/// Recursive-descent parser for filter strings.
///
/// Parsing never aborts: the first structural problem is recorded and the
/// parser keeps building a best-effort tree so it can still be rendered for
/// diagnostics. A tree that parsed cleanly is type checked once.
pub struct FilterParser<'a> {
    tokenizer: Tokenizer,
    context: &'a TypingContext,
    depth: usize,
    errors: Vec<String>,
    expression: Expression,
    return_type: Option<Type>,
}

impl FilterParser<'static> {
    pub fn new(text: &str) -> Self {
        Self::with_context(text, message_typing_context())
    }
}

impl<'a> FilterParser<'a> {
    /// Parse `text`, recognizing and type checking the identifiers of `context`.
    pub fn with_context(text: &str, context: &'a TypingContext) -> Self {
        let mut parser = Self {
            tokenizer: Tokenizer::with_context(text, context),
            context,
            depth: 0,
            errors: Vec::new(),
            expression: Expression::int(0),
            return_type: None,
        };
        parser.expression = parser.parse_expression(true);

        if parser.valid() {
            let synthesized = match parser.expression.synthesize_type(context) {
                PossibleType::TypeClass(ty) => Ok(ty),
                PossibleType::IllTyped(ill) => Err(ill.explain()),
            };
            match synthesized {
                Ok(ty) => parser.return_type = Some(ty),
                Err(explanation) => parser.error_log(explanation),
            }
        }

        parser
    }

    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Synthesized type of a valid filter
    pub fn return_type(&self) -> Option<Type> {
        self.return_type
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// The parsed tree, possibly partial when the parse failed
    pub fn expression(&self) -> &Expression {
        &self.expression
    }

    /// Split into the tree and its type, or the first error
    pub fn finish(self) -> Result<(Expression, Type), FilterError> {
        match (self.errors.into_iter().next(), self.return_type) {
            (None, Some(ty)) => Ok((self.expression, ty)),
            (Some(message), _) => Err(FilterError::new(message)),
            (None, None) => Err(FilterError::new("Filter was not type checked")),
        }
    }

    /// Typed debug rendering against the context the parser was built with
    pub fn debug_string(&self) -> String {
        self.expression.debug(self.context)
    }

    fn parse_expression(&mut self, top: bool) -> Expression {
        let depth = self.depth;
        let mut expr = self.parse_and();
        while self.tokenizer.next_token_is(TokenKind::Or) && self.descend() {
            self.tokenizer.next();
            let next_and = self.parse_and();
            expr = Expression::binary(TokenKind::Or, expr, next_and);
        }
        self.depth = depth;

        if top && self.tokenizer.has_next() {
            let message = format!("Unexpected token at end: {}", self.tokenizer.preview());
            self.error_log(message);
        }

        expr
    }

    fn parse_and(&mut self) -> Expression {
        let depth = self.depth;
        let mut expr = self.parse_unary();
        while self.tokenizer.next_token_is(TokenKind::And) && self.descend() {
            self.tokenizer.next();
            let next_unary = self.parse_unary();
            expr = Expression::binary(TokenKind::And, expr, next_unary);
        }
        self.depth = depth;
        expr
    }

    fn parse_unary(&mut self) -> Expression {
        if self.tokenizer.next_token_is_unary_op() {
            self.tokenizer.next();
            let op = self.tokenizer.token_kind().unwrap_or(TokenKind::Not);
            let condition = self.parse_condition();
            Expression::unary(op, condition)
        } else {
            self.parse_condition()
        }
    }

    /// Expects the next token to be `(`.
    fn parse_parentheses(&mut self) -> Expression {
        self.tokenizer.next();
        if !self.descend() {
            return Expression::int(0);
        }
        let expr = self.parse_expression(false);
        self.depth -= 1;

        if self.tokenizer.next_token_is(TokenKind::Rp) {
            self.tokenizer.next();
        } else if self.tokenizer.has_next() {
            let message = format!(
                "Missing closing parentheses: got {}",
                self.tokenizer.preview()
            );
            self.error_log(message);
        } else {
            self.error_log("Missing closing parentheses at end of statement");
        }

        expr
    }

    fn parse_condition(&mut self) -> Expression {
        let depth = self.depth;
        let mut value = if self.tokenizer.next_token_is(TokenKind::Lp) {
            self.parse_parentheses()
        } else {
            self.parse_value()
        };

        while let Some(kind) = self.tokenizer.next_token_kind() {
            if kind.is_binary_op() {
                self.tokenizer.next();
                let right = self.parse_value();
                let condition = Expression::binary(kind, value, right);

                // comparisons do not chain: `a == b == c`
                if self.tokenizer.next_token_is_binary_op() {
                    self.expected_operator();
                }
                self.depth = depth;
                return condition;
            } else if kind.is_math_op() {
                if !self.descend() {
                    break;
                }
                self.tokenizer.next();
                let right = self.parse_value();
                value = Expression::binary(kind, value, right);
            } else if kind == TokenKind::Rp || kind.is_op() {
                break;
            } else {
                self.expected_operator();
                break;
            }
        }

        self.depth = depth;
        value
    }

    fn expected_operator(&mut self) {
        let message = format!(
            "Expected an operator but got {} {}",
            self.tokenizer.preview(),
            self.tokenizer
                .next_token_kind()
                .unwrap_or(TokenKind::None)
                .info()
        );
        self.error_log(message);
    }

    fn parse_value(&mut self) -> Expression {
        let Some(kind) = self.tokenizer.next_token_kind() else {
            self.error_log("Unexpected end of statement");
            return Expression::int(0);
        };

        match kind {
            TokenKind::Lp => return self.parse_parentheses(),
            TokenKind::ListStart => return self.parse_list(),
            _ => {}
        }

        let text = match self.tokenizer.next() {
            Some(token) => token.text.clone(),
            None => return Expression::int(0),
        };

        match kind {
            TokenKind::Int => match text.parse() {
                Ok(value) => Expression::int(value),
                Err(_) => {
                    self.error_log(format!("Invalid integer {text}"));
                    Expression::int(0)
                }
            },
            TokenKind::String => Expression::string(unquote(&text)),
            TokenKind::Identifier => Expression::identifier(text),
            TokenKind::RegularExpression => {
                let case_insensitive = text.starts_with("ri");
                let pattern = unquote(&text[if case_insensitive { 2 } else { 1 }..]);
                match Expression::regex(&pattern, case_insensitive) {
                    Ok(expr) => expr,
                    Err(err) => {
                        self.error_log(format!("Invalid regular expression {text}: {err}"));
                        Expression::int(0)
                    }
                }
            }
            _ => {
                self.error_log(format!("Expected value but got {text} {}", kind.info()));
                Expression::int(0)
            }
        }
    }

    /// Expects the next token to be `{`.
    fn parse_list(&mut self) -> Expression {
        self.tokenizer.next();
        if !self.descend() {
            return Expression::list(Vec::new());
        }
        let depth = self.depth - 1;

        let mut items = Vec::new();
        let mut first = true;

        while let Some(kind) = self.tokenizer.next_token_kind() {
            if kind == TokenKind::ListEnd {
                self.tokenizer.next();
                self.depth = depth;
                return Expression::list(items);
            } else if kind == TokenKind::Comma && !first {
                self.tokenizer.next();
                items.push(self.parse_value());
            } else if first {
                items.push(self.parse_value());
                first = false;
            } else {
                break;
            }
        }

        let message = if self.tokenizer.has_next() {
            format!("Missing closing list braces: got {}", self.tokenizer.preview())
        } else {
            "Missing closing list braces at end of statement".to_string()
        };
        self.error_log(message);
        self.depth = depth;
        Expression::list(Vec::new())
    }

    /// Enter one more tree level, failing once the nesting limit is reached.
    fn descend(&mut self) -> bool {
        if self.depth >= MAX_NESTING_DEPTH {
            self.error_log("Expression is nested too deeply");
            return false;
        }
        self.depth += 1;
        true
    }

    /// Record an error. Only the first one is kept.
    fn error_log(&mut self, text: impl Into<String>) {
        if self.errors.is_empty() {
            let text = text.into();
            tracing::debug!(error = %text, "filter parse error");
            self.errors.push(text);
        }
    }
}

/// Strip the surrounding quotes of a literal body (`"..."`) and unescape `\"`.
fn unquote(quoted: &str) -> String {
    let inner = quoted
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(quoted);
    inner.replace("\\\"", "\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_error(text: &str) -> String {
        let parser = FilterParser::new(text);
        assert!(!parser.valid(), "{text} should be invalid");
        parser.errors()[0].clone()
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(first_error(""), "Unexpected end of statement");
    }

    #[test]
    fn test_trailing_token() {
        assert_eq!(first_error("1 + 1)"), "Unexpected token at end: )");
    }

    #[test]
    fn test_missing_parenthesis() {
        assert_eq!(
            first_error("(1 + 1"),
            "Missing closing parentheses at end of statement"
        );
    }

    #[test]
    fn test_missing_list_brace() {
        assert_eq!(
            first_error(r#"{"a", "b" "c"}"#),
            "Missing closing list braces: got \"c\""
        );
        assert_eq!(
            first_error(r#"{"a", "b""#),
            "Missing closing list braces at end of statement"
        );
    }

    #[test]
    fn test_unknown_token() {
        assert_eq!(
            first_error("unknown.identifier"),
            "Expected value but got unknown.identifier <unknown>"
        );
    }

    #[test]
    fn test_chained_comparison() {
        assert_eq!(first_error("1 == 1 == 1"), "Expected an operator but got == Eq");
        assert_eq!(
            first_error("(1 == 1 == 1)"),
            "Expected an operator but got == Eq"
        );
    }

    #[test]
    fn test_only_first_error_is_kept() {
        let parser = FilterParser::new("(1 + ) )");
        assert_eq!(parser.errors().len(), 1);
    }

    #[test]
    fn test_invalid_regex() {
        let message = first_error(r#"message.content match r"(unclosed""#);
        assert!(message.starts_with("Invalid regular expression"), "{message}");
    }

    #[test]
    fn test_partial_tree_is_renderable() {
        let parser = FilterParser::new("(1 + 2");
        assert!(!parser.valid());
        assert_eq!(parser.expression().filter_string(), "(1 + 2)");
        assert!(!parser.debug_string().is_empty());
    }

    #[test]
    fn test_type_error_mentions_subexpression() {
        let message = first_error("author.name - 5");
        assert_eq!(
            message,
            "Can only perform Minus with Ints\n\nProblem occurred here:\n(author.name - 5)"
        );
    }

    #[test]
    fn test_nested_parentheses() {
        let parser = FilterParser::new("((((1 + 2))))");
        assert!(parser.valid());
        assert_eq!(parser.return_type(), Some(Type::Int));
    }

    fn nested(depth: usize, inner: &str) -> String {
        format!("{}{inner}{}", "(".repeat(depth), ")".repeat(depth))
    }

    #[test]
    fn test_nesting_up_to_the_limit() {
        let parser = FilterParser::new(&nested(MAX_NESTING_DEPTH, "1"));
        assert!(parser.valid(), "{:?}", parser.errors());
        assert_eq!(parser.return_type(), Some(Type::Int));

        let list = format!("{{{}}}", nested(MAX_NESTING_DEPTH - 1, r#""a""#));
        assert!(FilterParser::new(&list).valid());
    }

    #[test]
    fn test_nesting_past_the_limit() {
        assert_eq!(
            first_error(&nested(MAX_NESTING_DEPTH + 1, "1")),
            "Expression is nested too deeply"
        );
        assert_eq!(
            first_error(&nested(100_000, "1 + 1")),
            "Expression is nested too deeply"
        );
    }

    #[test]
    fn test_long_operator_chains_are_bounded() {
        let sum = format!("1{}", " + 1".repeat(MAX_NESTING_DEPTH));
        assert!(FilterParser::new(&sum).valid());

        let sum = format!("1{}", " + 1".repeat(50_000));
        assert_eq!(first_error(&sum), "Expression is nested too deeply");

        let flags = format!("flags.reply{}", " && flags.reply".repeat(50_000));
        assert_eq!(first_error(&flags), "Expression is nested too deeply");
    }

    #[test]
    fn test_debug_string_uses_parser_context() {
        let context = TypingContext::from([("user.points".to_string(), Type::Int)]);
        let parser = FilterParser::with_context("user.points > 3", &context);
        assert!(parser.valid(), "{:?}", parser.errors());
        assert_eq!(
            parser.debug_string(),
            "BinaryOp[GreaterThan](Val(user.points) : Int, Val(3) : Int)"
        );
    }

    #[test]
    fn test_unquote() {
        assert_eq!(unquote(r#""a \"b\"""#), r#"a "b""#);
    }
}
