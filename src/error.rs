//! Errors produced while setting up operators and residual schedules.
use std::error;
use std::fmt;

/// Library-wide error type.
///
/// Every failure is deterministic and derived from configuration, so none of them are worth
/// retrying.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A configuration value is missing, malformed or inconsistent.
    InvalidConfiguration(String),
    /// An operator matrix expression was rejected.
    InvalidExpression(String),
    /// The requested scheme has no kernel path.
    UnsupportedScheme(String),
}

impl Error {
    pub(crate) fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    pub(crate) fn expression(msg: impl Into<String>) -> Self {
        Self::InvalidExpression(msg.into())
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidConfiguration(msg) => write!(f, "Invalid configuration: {}", msg),
            Self::InvalidExpression(msg) => write!(f, "Invalid operator matrix expression: {}", msg),
            Self::UnsupportedScheme(msg) => write!(f, "Unsupported scheme: {}", msg),
        }
    }
}

impl error::Error for Error {}
