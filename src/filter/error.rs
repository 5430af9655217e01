use thiserror::Error;

/// Error returned when a filter string cannot be turned into a [`Filter`].
///
/// Parse errors carry the first structural problem found; type errors carry
/// the reason followed by the rendered source of the offending subexpression.
///
/// [`Filter`]: super::Filter
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct FilterError {
    pub message: String,
}

impl FilterError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
