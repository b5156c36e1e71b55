use std::fmt;
use thiserror::Error;

/// Boxed error type used as the source of a [`TransformError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Errors produced while parsing a `Content-Type` header value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The header value is empty.
    #[error("empty media type")]
    Empty,

    /// The header value contains bytes that are not visible ASCII.
    #[error("media type is not valid text")]
    NotText,

    /// No `/` separates the type from the subtype.
    #[error("expected slash after first token")]
    MissingSlash,

    /// The type or subtype contains characters outside the token grammar.
    #[error("invalid media type token: {0:?}")]
    InvalidToken(String),

    /// A parameter is malformed.
    #[error("invalid media parameter: {0:?}")]
    InvalidParameter(String),

    /// The same parameter appears twice.
    #[error("duplicate parameter name: {0:?}")]
    DuplicateParameter(String),
}

/// Error returned by a [`Transformer`](crate::Transformer) that could not
/// rewrite its input.
#[derive(Debug, Error)]
pub struct TransformError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl TransformError {
    /// Creates an error with a message and no underlying cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Creates an error wrapping an underlying cause.
    pub fn with_source(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    /// Returns the error message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            Some(source) => write!(f, "{}: {}", self.message, source),
            None => f.write_str(&self.message),
        }
    }
}

impl From<std::str::Utf8Error> for TransformError {
    fn from(err: std::str::Utf8Error) -> Self {
        Self::with_source("input is not valid UTF-8", err)
    }
}
