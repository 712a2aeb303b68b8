use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    #[error("syntax error in '{expression}' while parsing '{query}': {message}")]
    Syntax {
        /// The offending sub-expression.
        expression: String,
        /// The full original query.
        query: String,
        message: String,
    },

    #[error("selector query is empty")]
    EmptyQuery,
}

impl SelectorError {
    pub(crate) fn syntax(
        expression: impl Into<String>,
        query: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        SelectorError::Syntax {
            expression: expression.into(),
            query: query.into(),
            message: message.into(),
        }
    }
}
