use super::error::FilterError;
use super::expression::Expression;
use super::identifiers::message_typing_context;
use super::parser::FilterParser;
use super::types::{Type, TypingContext};
use super::value::{ContextMap, DynValue};

/// Outcome of compiling a filter string
pub type FilterResult = Result<Filter, FilterError>;

/// A parsed and type-checked filter.
///
/// Immutable after construction. Evaluation only reads the tree, so a
/// `Filter` can be shared across threads as long as every call passes its own
/// [`ContextMap`].
#[derive(Debug, Clone)]
pub struct Filter {
    expression: Expression,
    return_type: Type,
}

impl Filter {
    /// Parse and type check `text` against the message identifiers.
    pub fn from_string(text: &str) -> FilterResult {
        Self::from_string_with_context(text, message_typing_context())
    }

    /// Parse and type check `text` against a custom typing context. Only the
    /// identifiers declared in `context` are recognized.
    pub fn from_string_with_context(text: &str, context: &TypingContext) -> FilterResult {
        let result = FilterParser::with_context(text, context)
            .finish()
            .map(|(expression, return_type)| Filter {
                expression,
                return_type,
            });

        match &result {
            Ok(filter) => tracing::debug!(
                filter = %filter.filter_string(),
                return_type = %filter.return_type,
                "compiled filter"
            ),
            Err(err) => tracing::debug!(filter = text, error = %err, "rejected filter"),
        }

        result
    }

    pub fn return_type(&self) -> Type {
        self.return_type
    }

    pub fn execute(&self, context: &ContextMap) -> DynValue {
        self.expression.execute(context)
    }

    /// Evaluate and coerce the result to a show/hide decision.
    ///
    /// Results that are not boolean-coercible count as `false`.
    pub fn matches(&self, context: &ContextMap) -> bool {
        self.execute(context).to_bool().unwrap_or(false)
    }

    /// Canonical, fully parenthesized source of this filter
    pub fn filter_string(&self) -> String {
        self.expression.filter_string()
    }

    /// Typed debug rendering against the message identifiers
    pub fn debug_string(&self) -> String {
        self.debug_string_with_context(message_typing_context())
    }

    pub fn debug_string_with_context(&self, context: &TypingContext) -> String {
        self.expression.debug(context)
    }

    pub fn expression(&self) -> &Expression {
        &self.expression
    }
}

impl std::str::FromStr for Filter {
    type Err = FilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Filter::from_string(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_filter_is_shareable() {
        assert_send_sync::<Filter>();
    }

    #[test]
    fn test_concurrent_evaluation() {
        let filter = Filter::from_string("message.length > 3").expect("valid filter");

        std::thread::scope(|scope| {
            for len in 0..8i64 {
                let filter = &filter;
                scope.spawn(move || {
                    let context =
                        ContextMap::from([("message.length".to_string(), DynValue::Int(len))]);
                    assert_eq!(filter.matches(&context), len > 3);
                });
            }
        });
    }

    #[test]
    fn test_custom_typing_context() {
        let context = TypingContext::from([("author.name".to_string(), Type::String)]);
        let filter = Filter::from_string_with_context(r#"author.name + "!""#, &context)
            .expect("valid filter");
        assert_eq!(filter.return_type(), Type::String);

        let err = Filter::from_string_with_context("author.subbed", &context)
            .expect_err("identifier missing from the typing context");
        assert_eq!(err.message, "Expected value but got author.subbed <unknown>");
    }

    #[test]
    fn test_context_only_identifier() {
        let context = TypingContext::from([
            ("user.points".to_string(), Type::Int),
            ("user.name".to_string(), Type::String),
        ]);
        let filter = Filter::from_string_with_context(
            r#"user.points > 3 && user.name startswith "ice""#,
            &context,
        )
        .expect("valid filter");
        assert_eq!(filter.return_type(), Type::Bool);
        assert_eq!(
            filter.debug_string_with_context(&context),
            "BinaryOp[And](BinaryOp[GreaterThan](Val(user.points) : Int, Val(3) : Int) : Bool, \
BinaryOp[StartsWith](Val(user.name) : String, Val(ice) : String) : Bool)"
        );

        let vars = ContextMap::from([
            ("user.points".to_string(), DynValue::Int(10)),
            ("user.name".to_string(), DynValue::from("icelys")),
        ]);
        assert!(filter.matches(&vars));

        assert!(Filter::from_string("user.points > 3").is_err());
    }

    #[test]
    fn test_from_str() {
        let filter: Filter = "flags.reply && flags.automod".parse().expect("valid filter");
        assert_eq!(filter.return_type(), Type::Bool);
        assert!("1 +".parse::<Filter>().is_err());
    }
}
